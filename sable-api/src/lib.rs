//! Sable orchestration API
//!
//! Replays a source-ordered stream of statement events against a module
//! unit and drives it through finalization. This is the embedder-facing
//! surface; the core semantics live in `sable-module`.

pub mod config;
pub mod error;
pub mod events;
pub mod introspect;

pub use config::{config, init, is_initialized, CompileOptions};
pub use error::{ErrorReport, SableError};
pub use events::StatementEvent;
pub use sable_config::{CompilerConfig, LimitConfig, Subsystem};
pub use sable_module::{
    load_unit, Artifact, ArtifactEmitter, ArtifactReader, BinaryEmitter, DefKind, FinalizedUnit,
    HookKind, LoadedUnit, ModuleError, ModuleUnit, Phase, Value,
};

/// Open a unit with the given options
pub fn open_unit(
    name: &str,
    source_file: &str,
    source_line: u32,
    options: &CompileOptions,
) -> Result<ModuleUnit, SableError> {
    Ok(ModuleUnit::open(
        name,
        source_file,
        source_line,
        options.limits.clone(),
    )?)
}

/// Replay statement events against an open unit in source order
pub fn apply_events(
    unit: &mut ModuleUnit,
    events: Vec<StatementEvent>,
) -> Result<(), SableError> {
    let count = events.len();
    for event in events {
        match event {
            StatementEvent::AttributeRegister {
                key,
                accumulate,
                persist,
            } => unit.register_attribute(&key, accumulate, persist)?,
            StatementEvent::AttributeWrite { key, value } => unit.put_attribute(&key, value)?,
            StatementEvent::Definition {
                kind,
                name,
                params,
                guard,
                body,
                line,
                column,
            } => unit.define(kind, &name, params, guard, body, line, column)?,
        }
    }
    tracing::debug!(
        target: "sable::lifecycle",
        unit = unit.name(),
        events = count,
        "module body replayed"
    );
    Ok(())
}

/// Compile one unit end to end.
///
/// `setup` runs against the open unit before the body replays; it is where
/// embedders register hooks.
pub fn compile_unit(
    name: &str,
    source_file: &str,
    source_line: u32,
    events: Vec<StatementEvent>,
    setup: impl FnOnce(&mut ModuleUnit) -> Result<(), ModuleError>,
    options: &CompileOptions,
    emitter: &dyn ArtifactEmitter,
) -> Result<FinalizedUnit, SableError> {
    let mut unit = open_unit(name, source_file, source_line, options)?;
    setup(&mut unit)?;
    apply_events(&mut unit, events)?;
    Ok(unit.finalize(emitter, &options.compiler)?)
}

// ==================== Convenience API ====================

/// Compile with the global config and the default binary emitter
pub fn compile(
    name: &str,
    source_file: &str,
    source_line: u32,
    events: Vec<StatementEvent>,
    setup: impl FnOnce(&mut ModuleUnit) -> Result<(), ModuleError>,
) -> Result<FinalizedUnit, SableError> {
    compile_unit(
        name,
        source_file,
        source_line,
        events,
        setup,
        config(),
        &BinaryEmitter::new(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_empty_body() {
        let finalized = compile("api.Empty", "empty.sbl", 1, vec![], |_| Ok(())).unwrap();
        assert_eq!(finalized.name(), "api.Empty");
        let reader = ArtifactReader::from_bytes(finalized.artifact().bytes().to_vec()).unwrap();
        let (unit, records) = reader.definitions().unwrap();
        assert_eq!(unit, "api.Empty");
        assert!(records.is_empty());
        assert!(reader.persisted_attributes().unwrap().is_empty());
    }

    #[test]
    fn test_events_replay_in_source_order() {
        let events = vec![
            StatementEvent::AttributeRegister {
                key: "tags".to_string(),
                accumulate: true,
                persist: true,
            },
            StatementEvent::AttributeWrite {
                key: "tags".to_string(),
                value: Value::atom("a"),
            },
            StatementEvent::Definition {
                kind: DefKind::PublicFunction,
                name: "go".to_string(),
                params: vec![],
                guard: None,
                body: Value::Nil,
                line: 3,
                column: 1,
            },
            StatementEvent::AttributeWrite {
                key: "tags".to_string(),
                value: Value::atom("b"),
            },
        ];
        let finalized = compile("api.Order", "order.sbl", 1, events, |_| Ok(())).unwrap();
        let reader = ArtifactReader::from_bytes(finalized.artifact().bytes().to_vec()).unwrap();
        let attrs = reader.persisted_attributes().unwrap();
        assert_eq!(
            attrs,
            vec![(
                "tags".to_string(),
                vec![Value::atom("a"), Value::atom("b")]
            )]
        );
    }

    #[test]
    fn test_failed_compile_releases_unit_name() {
        let events = vec![StatementEvent::AttributeWrite {
            key: "x".to_string(),
            value: Value::Nil,
        }];
        let err = compile("api.Retry", "retry.sbl", 1, events.clone(), |unit| {
            unit.hooks_mut()
                .add_before_compile(std::sync::Arc::new(|_| {
                    Err(ModuleError::Callback("first attempt fails".to_string()))
                }));
            Ok(())
        })
        .unwrap_err();
        assert_eq!(err.phase(), "hooks");

        // Second attempt with the same name must not see AlreadyCompiling
        compile("api.Retry", "retry.sbl", 1, events, |_| Ok(())).unwrap();
    }
}
