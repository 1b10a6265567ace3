//! Artifact byte-stream writer

use super::header::{FeatureFlags, FileHeader, CHECKSUM_OFFSET, HEADER_SIZE};
use super::section::{SectionDirectory, SectionEntry, SectionKind};

/// Accumulates sections into a single artifact byte stream.
///
/// Sections are 8-byte aligned; the directory is appended by `finish`,
/// which also patches the header and the whole-file Blake3 checksum.
pub struct ArtifactWriter {
    header: FileHeader,
    sections: SectionDirectory,
    current_offset: u32,
    buffer: Vec<u8>,
}

impl ArtifactWriter {
    pub fn new(flags: FeatureFlags) -> Self {
        let mut buffer = Vec::with_capacity(4096);
        buffer.resize(HEADER_SIZE, 0);
        Self {
            header: FileHeader::new(flags),
            sections: SectionDirectory::new(),
            current_offset: HEADER_SIZE as u32,
            buffer,
        }
    }

    pub fn current_offset(&self) -> u32 {
        self.current_offset
    }

    fn align_to(&mut self, alignment: u32) {
        let rem = self.current_offset % alignment;
        if rem != 0 {
            let padding = alignment - rem;
            self.buffer.resize(self.buffer.len() + padding as usize, 0);
            self.current_offset += padding;
        }
    }

    /// Append a section payload; returns its file offset
    pub fn write_section(&mut self, kind: SectionKind, data: &[u8]) -> u32 {
        self.align_to(8);

        let offset = self.current_offset;
        let size = data.len() as u32;
        self.sections.add(SectionEntry::new(kind, offset, size));
        self.buffer.extend_from_slice(data);
        self.current_offset += size;
        offset
    }

    /// Set the content-derived version identifier stored in the header
    pub fn set_version_id(&mut self, version_id: [u8; 32]) {
        self.header.version_id = version_id;
    }

    /// Finish the stream: append the directory, patch the header and
    /// compute the checksum over everything except the checksum field.
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to(8);
        let section_dir_offset = self.current_offset;
        let section_dir_data = self.sections.to_bytes();
        self.buffer.extend_from_slice(&section_dir_data);

        self.header.section_count = self.sections.count() as u16;
        self.header.section_dir_offset = section_dir_offset;
        self.header.section_dir_size = section_dir_data.len() as u32;

        // Write the header with a zeroed checksum field, hash, then patch
        self.header.checksum = [0u8; 32];
        self.buffer[..HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        let checksum = checksum_skipping_field(&self.buffer);
        self.buffer[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 32].copy_from_slice(&checksum);

        self.buffer
    }

    pub fn sections(&self) -> &SectionDirectory {
        &self.sections
    }
}

/// Blake3 over the whole stream, skipping the 32-byte checksum field
pub fn checksum_skipping_field(data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&data[..CHECKSUM_OFFSET]);
    if data.len() > CHECKSUM_OFFSET + 32 {
        hasher.update(&data[CHECKSUM_OFFSET + 32..]);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::header::MAGIC;

    #[test]
    fn test_writer_basic() {
        let mut writer = ArtifactWriter::new(FeatureFlags::HAS_DEBUG_INFO);
        writer.write_section(SectionKind::DefTable, b"definition data");
        writer.write_section(SectionKind::PersistedAttrs, &[0x01, 0x02]);

        let data = writer.finish();
        assert!(data.len() >= HEADER_SIZE);
        assert_eq!(&data[0..4], &MAGIC);
    }

    #[test]
    fn test_writer_sections_aligned() {
        let mut writer = ArtifactWriter::new(FeatureFlags::empty());
        let offset1 = writer.write_section(SectionKind::DefTable, b"12345");
        let offset2 = writer.write_section(SectionKind::PersistedAttrs, b"xy");

        assert_eq!(offset1 % 8, 0);
        assert_eq!(offset2 % 8, 0);
        assert!(offset2 > offset1);
        assert_eq!(writer.sections().count(), 2);
    }

    #[test]
    fn test_checksum_is_stable_and_tamper_sensitive() {
        let build = || {
            let mut writer = ArtifactWriter::new(FeatureFlags::HAS_DEBUG_INFO);
            writer.write_section(SectionKind::DefTable, b"payload");
            writer.finish()
        };
        let a = build();
        let b = build();
        assert_eq!(a, b);

        let mut tampered = a.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xFF;
        assert_ne!(
            checksum_skipping_field(&a),
            checksum_skipping_field(&tampered)
        );
    }
}
