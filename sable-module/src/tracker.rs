//! Process-wide compile-unit tracker
//!
//! Maps unit names to their current lifecycle phase while compilation is in
//! flight. Entries are inserted when a unit opens, updated on every phase
//! transition and removed once the unit is discarded after emission, so
//! name-based introspection can distinguish "being compiled" from "already
//! compiled".

use crate::error::ModuleError;
use crate::unit::Phase;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;

static UNITS: Lazy<Mutex<HashMap<String, Phase>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Start tracking a unit. Duplicate in-flight names are rejected.
pub fn track(name: &str) -> Result<(), ModuleError> {
    let mut units = UNITS.lock().expect("unit tracker poisoned");
    if units.contains_key(name) {
        return Err(ModuleError::AlreadyCompiling {
            unit: name.to_string(),
        });
    }
    units.insert(name.to_string(), Phase::Open);
    Ok(())
}

/// Record a phase transition for a tracked unit
pub fn update(name: &str, phase: Phase) {
    let mut units = UNITS.lock().expect("unit tracker poisoned");
    if let Some(entry) = units.get_mut(name) {
        *entry = phase;
    }
}

/// Current phase of a tracked unit, if any
pub fn phase_of(name: &str) -> Option<Phase> {
    UNITS.lock().expect("unit tracker poisoned").get(name).copied()
}

/// Whether the unit is tracked and still accepting mutations
pub fn is_compiling(name: &str) -> bool {
    matches!(
        phase_of(name),
        Some(Phase::Open) | Some(Phase::BeforeCompileRunning)
    )
}

/// Phase of a tracked unit, or `AlreadyFinalized` when the name left the
/// tracker
pub fn ensure_tracked(name: &str) -> Result<Phase, ModuleError> {
    phase_of(name).ok_or_else(|| ModuleError::AlreadyFinalized {
        unit: name.to_string(),
    })
}

/// Stop tracking a unit (discard after emission, or abort)
pub fn untrack(name: &str) {
    UNITS.lock().expect("unit tracker poisoned").remove(name);
}
