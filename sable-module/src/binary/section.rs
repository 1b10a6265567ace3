//! Section kinds and the section directory

use std::fmt;

/// Section kind identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SectionKind {
    /// Sorted definition table (required)
    DefTable = 0x01,
    /// Persisted attribute snapshot (required, may be empty)
    PersistedAttrs = 0x02,
    /// Debug chunk (always embedded; public visibility is flag-gated)
    DebugInfo = 0x03,
    /// Lowered-form symbol table (always embedded; privileged surface)
    LoweredForm = 0x04,
}

impl SectionKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(SectionKind::DefTable),
            0x02 => Some(SectionKind::PersistedAttrs),
            0x03 => Some(SectionKind::DebugInfo),
            0x04 => Some(SectionKind::LoweredForm),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::DefTable => "def_table",
            SectionKind::PersistedAttrs => "persisted_attrs",
            SectionKind::DebugInfo => "debug_info",
            SectionKind::LoweredForm => "lowered_form",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size of one encoded directory entry
pub const ENTRY_SIZE: usize = 16;

/// One section directory entry
///
/// Encoded layout (16 bytes): kind u8, flags u8, reserved u16,
/// offset u32 LE, size u32 LE, reserved u32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    pub kind: SectionKind,
    pub flags: u8,
    pub offset: u32,
    pub size: u32,
}

impl SectionEntry {
    pub fn new(kind: SectionKind, offset: u32, size: u32) -> Self {
        Self {
            kind,
            flags: 0,
            offset,
            size,
        }
    }

    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut buf = [0u8; ENTRY_SIZE];
        buf[0] = self.kind as u8;
        buf[1] = self.flags;
        buf[4..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..12].copy_from_slice(&self.size.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SectionError> {
        if bytes.len() < ENTRY_SIZE {
            return Err(SectionError::TooShort {
                expected: ENTRY_SIZE,
                actual: bytes.len(),
            });
        }
        let kind = SectionKind::from_u8(bytes[0]).ok_or(SectionError::UnknownKind(bytes[0]))?;
        Ok(Self {
            kind,
            flags: bytes[1],
            offset: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            size: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// Ordered collection of section entries
#[derive(Debug, Clone, Default)]
pub struct SectionDirectory {
    entries: Vec<SectionEntry>,
}

impl SectionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: SectionEntry) {
        self.entries.push(entry);
    }

    pub fn find(&self, kind: SectionKind) -> Option<&SectionEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.entries.len() * ENTRY_SIZE);
        for entry in &self.entries {
            buf.extend_from_slice(&entry.to_bytes());
        }
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SectionError> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(SectionError::TooShort {
                expected: bytes.len().next_multiple_of(ENTRY_SIZE),
                actual: bytes.len(),
            });
        }
        let mut entries = Vec::with_capacity(bytes.len() / ENTRY_SIZE);
        for chunk in bytes.chunks_exact(ENTRY_SIZE) {
            entries.push(SectionEntry::from_bytes(chunk)?);
        }
        Ok(Self { entries })
    }
}

/// Section directory decode errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    TooShort { expected: usize, actual: usize },
    UnknownKind(u8),
}

impl fmt::Display for SectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionError::TooShort { expected, actual } => {
                write!(
                    f,
                    "section directory too short: expected {} bytes, got {}",
                    expected, actual
                )
            }
            SectionError::UnknownKind(value) => {
                write!(f, "unknown section kind: 0x{:02x}", value)
            }
        }
    }
}

impl std::error::Error for SectionError {}
