//! Artifact emitter boundary
//!
//! The lifecycle hands the emitter a fully structured request (sorted
//! definitions, persisted attribute snapshot, debug chunk, lowered symbols)
//! and receives opaque bytes plus the content-derived version identifier.
//! Alternative backends implement `ArtifactEmitter`; `BinaryEmitter` is the
//! default container format.

use super::data::{
    encode_debug_chunk, encode_def_table, encode_lowered, encode_persisted_attrs,
    encode_version_input, DebugChunk, DefRecord, LoweredSymbol,
};
use super::header::FeatureFlags;
use super::section::SectionKind;
use super::writer::ArtifactWriter;
use crate::value::Value;
use thiserror::Error;

/// Emitted artifact: final bytes plus the version id also stored in the
/// header
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Vec<u8>,
    version_id: [u8; 32],
}

impl Artifact {
    pub fn new(bytes: Vec<u8>, version_id: [u8; 32]) -> Self {
        Self { bytes, version_id }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Deterministic identifier derived from the sorted definition content
    pub fn version_id(&self) -> &[u8; 32] {
        &self.version_id
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything an emitter needs, already ordered and snapshotted
#[derive(Debug, Clone)]
pub struct EmitRequest {
    pub unit: String,
    /// Sorted by `(name, arity)`
    pub definitions: Vec<DefRecord>,
    /// Oldest-first value order per key
    pub persisted: Vec<(String, Vec<Value>)>,
    pub debug: DebugChunk,
    pub lowered: Vec<LoweredSymbol>,
    /// Whether the debug chunk is readable through the public reader API
    pub debug_public: bool,
}

/// Emission failures
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to encode {section} section: {detail}")]
    Encode {
        section: &'static str,
        detail: String,
    },
}

/// Pluggable artifact backend
pub trait ArtifactEmitter {
    fn emit(&self, request: &EmitRequest) -> Result<Artifact, EmitError>;
}

/// Default binary container emitter
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryEmitter;

impl BinaryEmitter {
    pub fn new() -> Self {
        BinaryEmitter
    }
}

impl ArtifactEmitter for BinaryEmitter {
    fn emit(&self, request: &EmitRequest) -> Result<Artifact, EmitError> {
        let def_table = encode_def_table(&request.unit, &request.definitions);
        // The version id hashes the sorted records minus unit name and
        // source locations, so identical definition content always maps to
        // the same id
        let version_id = *blake3::hash(&encode_version_input(&request.definitions)).as_bytes();

        let persisted =
            encode_persisted_attrs(&request.persisted).map_err(|e| EmitError::Encode {
                section: "persisted_attrs",
                detail: e.to_string(),
            })?;
        let debug = encode_debug_chunk(&request.debug).map_err(|e| EmitError::Encode {
            section: "debug_info",
            detail: e.to_string(),
        })?;
        let lowered = encode_lowered(&request.lowered);

        let mut flags = FeatureFlags::empty();
        flags.insert(FeatureFlags::HAS_DEBUG_INFO);
        flags.insert(FeatureFlags::HAS_LOWERED);
        if request.debug_public {
            flags.insert(FeatureFlags::DEBUG_PUBLIC);
        }

        let mut writer = ArtifactWriter::new(flags);
        writer.write_section(SectionKind::DefTable, &def_table);
        writer.write_section(SectionKind::PersistedAttrs, &persisted);
        writer.write_section(SectionKind::DebugInfo, &debug);
        writer.write_section(SectionKind::LoweredForm, &lowered);
        writer.set_version_id(version_id);

        tracing::debug!(
            target: "sable::emit",
            unit = %request.unit,
            definitions = request.definitions.len(),
            persisted = request.persisted.len(),
            debug_public = request.debug_public,
            "artifact emitted"
        );
        Ok(Artifact::new(writer.finish(), version_id))
    }
}
