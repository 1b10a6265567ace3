//! Statement events
//!
//! The expansion front end (out of scope here) reduces a module body to a
//! source-ordered stream of these events; the driver replays them against an
//! open unit.

use sable_module::{DefKind, Value};

/// One module-body statement, already expanded
#[derive(Debug, Clone)]
pub enum StatementEvent {
    /// One definition clause
    Definition {
        kind: DefKind,
        name: String,
        params: Vec<Value>,
        guard: Option<Value>,
        body: Value,
        /// Line relative to the unit's source anchor
        line: u32,
        column: u32,
    },
    /// `@key value`
    AttributeWrite { key: String, value: Value },
    /// `register_attribute key, accumulate: ..., persist: ...`
    AttributeRegister {
        key: String,
        accumulate: bool,
        persist: bool,
    },
}
