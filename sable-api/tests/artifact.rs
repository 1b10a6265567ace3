//! Artifact container behavior through the public API

use sable_api::{
    compile_unit, ArtifactReader, BinaryEmitter, CompileOptions, DefKind, StatementEvent, Value,
};
use sable_module::binary::{ReadError, SectionKind};

fn events() -> Vec<StatementEvent> {
    vec![
        StatementEvent::AttributeRegister {
            key: "vsn".to_string(),
            accumulate: false,
            persist: true,
        },
        StatementEvent::AttributeWrite {
            key: "vsn".to_string(),
            value: Value::Int(3),
        },
        StatementEvent::Definition {
            kind: DefKind::PublicFunction,
            name: "identity".to_string(),
            params: vec![Value::atom("x")],
            guard: Some(Value::atom("is_term")),
            body: Value::atom("x"),
            line: 4,
            column: 3,
        },
    ]
}

fn compile_with(name: &str, debug_public: bool) -> Vec<u8> {
    let mut options = CompileOptions::default();
    options.compiler.debug_public = debug_public;
    compile_unit(
        name,
        "artifact.sbl",
        1,
        events(),
        |_| Ok(()),
        &options,
        &BinaryEmitter::new(),
    )
    .unwrap()
    .into_artifact()
    .into_bytes()
}

#[test]
fn all_four_sections_are_present() {
    let reader = ArtifactReader::from_bytes(compile_with("art.Sections", true)).unwrap();
    for kind in [
        SectionKind::DefTable,
        SectionKind::PersistedAttrs,
        SectionKind::DebugInfo,
        SectionKind::LoweredForm,
    ] {
        assert!(reader.has_section(kind), "missing {kind}");
    }
    assert_eq!(reader.unit_name().unwrap(), "art.Sections");
}

#[test]
fn debug_chunk_reconstructs_clause_structure() {
    let reader = ArtifactReader::from_bytes(compile_with("art.Debug", true)).unwrap();
    let chunk = reader.debug_chunk().unwrap();
    assert_eq!(chunk.unit, "art.Debug");
    assert_eq!(chunk.definitions.len(), 1);
    let def = &chunk.definitions[0];
    assert_eq!(def.name, "identity");
    assert_eq!(def.arity, 1);
    let clause = &def.clauses[0];
    assert_eq!(clause.params, vec![Value::atom("x")]);
    assert_eq!(clause.guard, Some(Value::atom("is_term")));
    assert_eq!(clause.body, Value::atom("x"));
    // Relative line 4 resolved against source anchor 1
    assert_eq!(clause.line, 5);
    assert_eq!(clause.column, 3);
}

#[test]
fn hidden_debug_chunk_is_privileged_only() {
    let reader = ArtifactReader::from_bytes(compile_with("art.Hidden", false)).unwrap();
    assert!(matches!(
        reader.debug_chunk().unwrap_err(),
        ReadError::ChunkUnavailable
    ));
    // Still embedded, still decodable for trusted tooling
    let chunk = reader.debug_chunk_privileged().unwrap();
    assert_eq!(chunk.definitions.len(), 1);
}

#[test]
fn debug_visibility_does_not_change_version_id() {
    let public = ArtifactReader::from_bytes(compile_with("art.VisA", true)).unwrap();
    let hidden = ArtifactReader::from_bytes(compile_with("art.VisB", false)).unwrap();
    assert_eq!(public.version_id(), hidden.version_id());
}

#[test]
fn lowered_form_mirrors_def_table() {
    let reader = ArtifactReader::from_bytes(compile_with("art.Lowered", true)).unwrap();
    let (_, records) = reader.definitions().unwrap();
    let lowered = reader.lowered_form().unwrap();
    assert_eq!(lowered.len(), records.len());
    assert_eq!(lowered[0].name, records[0].name);
    assert_eq!(lowered[0].clause_count, records[0].clause_count);
}

#[test]
fn tampered_bytes_fail_checksum() {
    let mut bytes = compile_with("art.Tamper", true);
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x40;
    assert!(matches!(
        ArtifactReader::from_bytes(bytes).unwrap_err(),
        ReadError::ChecksumMismatch
    ));
}

#[test]
fn persisted_scalar_round_trips() {
    let reader = ArtifactReader::from_bytes(compile_with("art.Persist", true)).unwrap();
    assert_eq!(
        reader.persisted_attributes().unwrap(),
        vec![("vsn".to_string(), vec![Value::Int(3)])]
    );
}
