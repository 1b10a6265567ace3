//! Tooling introspection surface
//!
//! Live units are queried through their handle; once a unit finishes, its
//! name leaves the process-wide tracker and name-based queries answer
//! `AlreadyFinalized` - finished modules are introspected through
//! `ArtifactReader` instead.

use crate::error::SableError;
use sable_module::defs::{DefKey, DefKind, Definition};
use sable_module::{tracker, ModuleUnit, Phase};

/// Present attribute keys in stable (first-touch) order
pub fn attributes_of(unit: &ModuleUnit) -> Vec<String> {
    unit.attribute_keys()
}

pub fn has_attribute(unit: &ModuleUnit, key: &str) -> bool {
    unit.has_attribute(key)
}

/// `(name, arity)` pairs in declaration order, optionally kind-filtered
pub fn definitions_of(unit: &ModuleUnit, filter: Option<DefKind>) -> Vec<DefKey> {
    unit.definitions_in(filter)
}

pub fn get_definition(
    unit: &ModuleUnit,
    name: &str,
    arity: u8,
    skip_clauses: bool,
) -> Option<Definition> {
    unit.get_definition(name, arity, skip_clauses)
}

/// Phase of an in-flight unit by name; `AlreadyFinalized` once the unit
/// completed and its compile-time state was discarded
pub fn unit_phase(name: &str) -> Result<Phase, SableError> {
    Ok(tracker::ensure_tracked(name)?)
}

/// Whether the named unit is still accepting mutations
pub fn is_unit_compiling(name: &str) -> bool {
    tracker::is_compiling(name)
}
