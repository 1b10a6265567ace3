//! Sable module-definition subsystem
//!
//! Compile-time state for one module unit: attribute storage, the
//! definition table, the hook registry and the lifecycle state machine that
//! drives them through emission. The `binary` module holds the artifact
//! container format; `loader` holds the post-compile trigger points.

pub mod attrs;
pub mod binary;
pub mod defs;
pub mod error;
pub mod hooks;
pub mod loader;
pub mod tracker;
pub mod unit;
pub mod value;

pub use attrs::AttributeStore;
pub use binary::{
    Artifact, ArtifactEmitter, ArtifactReader, BinaryEmitter, DebugChunk, DefRecord, EmitError,
    EmitRequest, ReadError,
};
pub use defs::{Clause, DefKey, DefKind, Definition, DefinitionTable};
pub use error::ModuleError;
pub use hooks::{DefinitionEvent, HookKind, HookRegistry};
pub use loader::{load_unit, LoadedUnit};
pub use unit::{FinalizedUnit, ModuleUnit, Phase, RESERVED_ROOT};
pub use value::Value;
