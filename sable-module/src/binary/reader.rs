//! Artifact reader and introspection
//!
//! Validates the container (magic, version, checksum) up front, then
//! decodes sections on demand. The debug chunk has two access paths: the
//! public one honors the `DEBUG_PUBLIC` flag, the privileged one is for
//! trusted tooling and ignores it.

use super::data::{
    decode_debug_chunk, decode_def_table, decode_lowered, decode_persisted_attrs, DebugChunk,
    DecodeError, DefRecord, LoweredSymbol,
};
use super::header::{FeatureFlags, FileHeader, HEADER_SIZE, MAGIC, VERSION_MAJOR};
use super::section::{SectionDirectory, SectionError, SectionKind};
use super::writer::checksum_skipping_field;
use crate::value::Value;
use thiserror::Error;

/// Artifact read/validation failures
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("artifact too short: {actual} bytes, header needs {expected}")]
    TooShort { expected: usize, actual: usize },

    #[error("bad magic number: {0:02x?}")]
    BadMagic([u8; 4]),

    #[error("unsupported artifact version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("artifact checksum mismatch")]
    ChecksumMismatch,

    #[error("missing required section: {0}")]
    MissingSection(SectionKind),

    #[error("section out of bounds: {0}")]
    SectionOutOfBounds(SectionKind),

    #[error("debug chunk is not public in this artifact")]
    ChunkUnavailable,

    #[error("section directory error: {0}")]
    Section(#[from] SectionError),

    #[error("payload decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Validated artifact view
pub struct ArtifactReader {
    bytes: Vec<u8>,
    header: FileHeader,
    sections: SectionDirectory,
}

impl std::fmt::Debug for ArtifactReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactReader")
            .field("bytes", &self.bytes.len())
            .field("sections", &self.sections.count())
            .finish()
    }
}

impl ArtifactReader {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ReadError> {
        let header = FileHeader::from_bytes(&bytes).ok_or(ReadError::TooShort {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        })?;

        if header.magic != MAGIC {
            return Err(ReadError::BadMagic(header.magic));
        }
        if header.version_major != VERSION_MAJOR {
            return Err(ReadError::UnsupportedVersion {
                major: header.version_major,
                minor: header.version_minor,
            });
        }
        if checksum_skipping_field(&bytes) != header.checksum {
            return Err(ReadError::ChecksumMismatch);
        }

        let dir_start = header.section_dir_offset as usize;
        let dir_end = dir_start + header.section_dir_size as usize;
        if dir_end > bytes.len() {
            return Err(ReadError::TooShort {
                expected: dir_end,
                actual: bytes.len(),
            });
        }
        let sections = SectionDirectory::from_bytes(&bytes[dir_start..dir_end])?;

        let reader = Self {
            bytes,
            header,
            sections,
        };
        // Both are required even when logically empty
        reader.section_bytes(SectionKind::DefTable)?;
        reader.section_bytes(SectionKind::PersistedAttrs)?;
        Ok(reader)
    }

    pub fn flags(&self) -> FeatureFlags {
        self.header.flags
    }

    pub fn version_id(&self) -> &[u8; 32] {
        &self.header.version_id
    }

    fn section_bytes(&self, kind: SectionKind) -> Result<&[u8], ReadError> {
        let entry = self
            .sections
            .find(kind)
            .ok_or(ReadError::MissingSection(kind))?;
        let start = entry.offset as usize;
        let end = start + entry.size as usize;
        if end > self.bytes.len() {
            return Err(ReadError::SectionOutOfBounds(kind));
        }
        Ok(&self.bytes[start..end])
    }

    pub fn has_section(&self, kind: SectionKind) -> bool {
        self.sections.find(kind).is_some()
    }

    /// Unit name recorded in the definition table
    pub fn unit_name(&self) -> Result<String, ReadError> {
        Ok(self.definitions()?.0)
    }

    /// Decoded definition table in stored (sorted) order
    pub fn definitions(&self) -> Result<(String, Vec<DefRecord>), ReadError> {
        Ok(decode_def_table(self.section_bytes(SectionKind::DefTable)?)?)
    }

    /// Persisted attribute snapshot, values oldest first
    pub fn persisted_attributes(&self) -> Result<Vec<(String, Vec<Value>)>, ReadError> {
        Ok(decode_persisted_attrs(
            self.section_bytes(SectionKind::PersistedAttrs)?,
        )?)
    }

    /// Public debug chunk access; gated by the `DEBUG_PUBLIC` flag
    pub fn debug_chunk(&self) -> Result<DebugChunk, ReadError> {
        if !self.header.flags.contains(FeatureFlags::DEBUG_PUBLIC) {
            return Err(ReadError::ChunkUnavailable);
        }
        self.debug_chunk_privileged()
    }

    /// Privileged debug chunk access for trusted tooling; the chunk is
    /// always embedded, so this succeeds on any well-formed artifact
    pub fn debug_chunk_privileged(&self) -> Result<DebugChunk, ReadError> {
        Ok(decode_debug_chunk(
            self.section_bytes(SectionKind::DebugInfo)?,
        )?)
    }

    /// Lowered symbol table (privileged surface, no public gate by flags
    /// because it carries no source-level content)
    pub fn lowered_form(&self) -> Result<Vec<LoweredSymbol>, ReadError> {
        Ok(decode_lowered(self.section_bytes(SectionKind::LoweredForm)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::data::DebugDefinition;
    use crate::binary::emitter::{ArtifactEmitter, BinaryEmitter, EmitRequest};
    use crate::defs::{Clause, DefKind};

    fn sample_request(debug_public: bool) -> EmitRequest {
        EmitRequest {
            unit: "reader.Sample".to_string(),
            definitions: vec![DefRecord {
                name: "run".to_string(),
                arity: 1,
                kind: DefKind::PublicFunction,
                clause_count: 1,
                line: 2,
                column: 1,
            }],
            persisted: vec![("vsn".to_string(), vec![Value::Int(1)])],
            debug: DebugChunk {
                unit: "reader.Sample".to_string(),
                definitions: vec![DebugDefinition {
                    name: "run".to_string(),
                    arity: 1,
                    kind: DefKind::PublicFunction,
                    clauses: vec![Clause {
                        params: vec![Value::atom("x")],
                        guard: None,
                        body: Value::Nil,
                        line: 2,
                        column: 1,
                    }],
                }],
            },
            lowered: vec![LoweredSymbol {
                name: "run".to_string(),
                arity: 1,
                kind: DefKind::PublicFunction,
                clause_count: 1,
            }],
            debug_public,
        }
    }

    fn emit(debug_public: bool) -> Vec<u8> {
        BinaryEmitter::new()
            .emit(&sample_request(debug_public))
            .unwrap()
            .into_bytes()
    }

    #[test]
    fn test_roundtrip_through_reader() {
        let reader = ArtifactReader::from_bytes(emit(true)).unwrap();
        let (unit, records) = reader.definitions().unwrap();
        assert_eq!(unit, "reader.Sample");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "run");

        let attrs = reader.persisted_attributes().unwrap();
        assert_eq!(attrs, vec![("vsn".to_string(), vec![Value::Int(1)])]);

        let lowered = reader.lowered_form().unwrap();
        assert_eq!(lowered[0].clause_count, 1);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = emit(true);
        bytes[0] = b'X';
        let err = ArtifactReader::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, ReadError::BadMagic(_)));
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let mut bytes = emit(true);
        let payload_pos = HEADER_SIZE + 4;
        bytes[payload_pos] ^= 0xFF;
        let err = ArtifactReader::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, ReadError::ChecksumMismatch));
    }

    #[test]
    fn test_debug_chunk_visibility_gate() {
        let public = ArtifactReader::from_bytes(emit(true)).unwrap();
        assert!(public.debug_chunk().is_ok());

        let hidden = ArtifactReader::from_bytes(emit(false)).unwrap();
        let err = hidden.debug_chunk().unwrap_err();
        assert!(matches!(err, ReadError::ChunkUnavailable));
        // Privileged access still works: the chunk is embedded either way
        let chunk = hidden.debug_chunk_privileged().unwrap();
        assert_eq!(chunk.unit, "reader.Sample");
    }

    #[test]
    fn test_too_short() {
        let err = ArtifactReader::from_bytes(vec![0u8; 12]).unwrap_err();
        assert!(matches!(err, ReadError::TooShort { .. }));
    }
}
