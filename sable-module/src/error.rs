//! Module subsystem error types

use crate::hooks::HookKind;
use crate::value::Value;
use thiserror::Error;

/// Errors raised by the module-definition subsystem.
///
/// These are local, synchronous, non-retriable failures surfaced to the
/// caller that performed the invalid operation.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A mutation was attempted against a unit that is past its writable
    /// phases. The message cites the literal trigger.
    #[error("cannot {operation} because the module {unit} is in read-only mode ({cause})")]
    ReadOnlyViolation {
        unit: String,
        operation: String,
        cause: &'static str,
    },

    /// An attribute was registered after values were already recorded for it
    #[error("cannot register attribute @{key} of module {unit} because it already has recorded values")]
    AlreadyRegistered { unit: String, key: String },

    /// The named unit finished compilation and its compile-time state was
    /// discarded; only the emitted artifact can be queried.
    #[error("module {unit} is already compiled; compile-time introspection is no longer available")]
    AlreadyFinalized { unit: String },

    /// A unit with this name is already being compiled in this process
    #[error("module {unit} is already being compiled")]
    AlreadyCompiling { unit: String },

    /// Definition arity outside the representable range
    #[error("invalid arity for {name}/{arity}: arity must be at most {max}")]
    InvalidArity { name: String, arity: u32, max: usize },

    /// A clause list grew past the configured limit
    #[error("definition {name}/{arity} exceeds the clause limit of {max}")]
    TooManyClauses { name: String, arity: u8, max: usize },

    /// An operation named a definition that does not exist
    #[error("cannot make {name}/{arity} overridable because it was not defined")]
    UndefinedDefinition { name: String, arity: u32 },

    /// Unit name collides with the reserved namespace root
    #[error("module name {unit} collides with the reserved namespace root `{root}`")]
    ReservedNameConflict { unit: String, root: &'static str },

    /// A compile-time hook returned an error; finalization is aborted
    #[error("{kind} hook of module {unit} failed: {source}")]
    HookFailed {
        kind: HookKind,
        unit: String,
        #[source]
        source: Box<ModuleError>,
    },

    /// An on-load callback rejected the unit
    #[error("on_load callback of module {unit} failed with {returned}")]
    LoadCallbackFailed { unit: String, returned: Value },

    /// Free-form failure raised from inside a user callback
    #[error("{0}")]
    Callback(String),

    /// Artifact emission failure
    #[error("emit failed: {0}")]
    Emit(#[from] crate::binary::EmitError),

    /// Artifact decode failure at the loader boundary
    #[error("artifact read failed: {0}")]
    Read(#[from] crate::binary::ReadError),
}

impl ModuleError {
    /// Wrap an error produced by a hook, recording which hook kind and unit
    pub fn hook_failed(kind: HookKind, unit: &str, source: ModuleError) -> Self {
        ModuleError::HookFailed {
            kind,
            unit: unit.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_message_cites_trigger() {
        let err = ModuleError::ReadOnlyViolation {
            unit: "Sample".to_string(),
            operation: "put attribute @doc".to_string(),
            cause: "@after_compile",
        };
        let msg = err.to_string();
        assert!(msg.contains("because the module Sample is in read-only mode (@after_compile)"));
    }

    #[test]
    fn test_hook_failed_preserves_source() {
        let inner = ModuleError::Callback("boom".to_string());
        let err = ModuleError::hook_failed(HookKind::BeforeCompile, "Sample", inner);
        let msg = err.to_string();
        assert!(msg.contains("before_compile hook of module Sample failed"));
        assert!(msg.contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_arity_names_the_pair() {
        let err = ModuleError::InvalidArity {
            name: "hook".to_string(),
            arity: 300,
            max: 255,
        };
        assert!(err.to_string().contains("hook/300"));
    }
}
