//! Artifact binary format
//!
//! Container layout: fixed file header, 8-byte aligned sections, section
//! directory at the tail. The definition table is encoded in sorted
//! `(name, arity)` order so identical module content produces identical
//! bytes and therefore an identical content-derived version identifier.

pub mod data;
pub mod emitter;
pub mod header;
pub mod reader;
pub mod section;
pub mod writer;

pub use data::{DebugChunk, DebugDefinition, DecodeError, DefRecord, LoweredSymbol};
pub use emitter::{Artifact, ArtifactEmitter, BinaryEmitter, EmitError, EmitRequest};
pub use header::{FeatureFlags, FileHeader, HEADER_SIZE, MAGIC};
pub use reader::{ArtifactReader, ReadError};
pub use section::{SectionDirectory, SectionEntry, SectionError, SectionKind};
pub use writer::ArtifactWriter;
