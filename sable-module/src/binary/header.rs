//! Artifact file header
//!
//! Fixed 96-byte layout:
//!
//! | Offset | Size | Field               |
//! |--------|------|---------------------|
//! | 0      | 4    | magic `SBLM`        |
//! | 4      | 1    | version major       |
//! | 5      | 1    | version minor       |
//! | 6      | 1    | version patch       |
//! | 7      | 1    | reserved            |
//! | 8      | 4    | feature flags (LE)  |
//! | 12     | 2    | section count (LE)  |
//! | 14     | 2    | reserved            |
//! | 16     | 4    | section dir offset  |
//! | 20     | 4    | section dir size    |
//! | 24     | 8    | reserved            |
//! | 32     | 32   | version id (blake3) |
//! | 64     | 32   | file checksum       |

/// Artifact magic number
pub const MAGIC: [u8; 4] = *b"SBLM";

pub const VERSION_MAJOR: u8 = 0;
pub const VERSION_MINOR: u8 = 1;
pub const VERSION_PATCH: u8 = 0;

/// Total header size in bytes
pub const HEADER_SIZE: usize = 96;

/// Byte offset of the checksum field (the checksum itself skips this range)
pub const CHECKSUM_OFFSET: usize = 64;

/// Feature flag bitset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags(pub u32);

impl FeatureFlags {
    /// Debug chunk embedded (always set by the default emitter)
    pub const HAS_DEBUG_INFO: FeatureFlags = FeatureFlags(0x0001);
    /// Debug chunk readable through the public reader API
    pub const DEBUG_PUBLIC: FeatureFlags = FeatureFlags(0x0002);
    /// Lowered-form section embedded
    pub const HAS_LOWERED: FeatureFlags = FeatureFlags(0x0004);
    /// Section payloads compressed (reserved)
    pub const COMPRESSED: FeatureFlags = FeatureFlags(0x0008);

    pub fn empty() -> Self {
        FeatureFlags(0)
    }

    pub fn contains(&self, flag: FeatureFlags) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn insert(&mut self, flag: FeatureFlags) {
        self.0 |= flag.0;
    }

    pub fn remove(&mut self, flag: FeatureFlags) {
        self.0 &= !flag.0;
    }
}

/// Parsed artifact file header
#[derive(Debug, Clone)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version_major: u8,
    pub version_minor: u8,
    pub version_patch: u8,
    pub flags: FeatureFlags,
    pub section_count: u16,
    pub section_dir_offset: u32,
    pub section_dir_size: u32,
    pub version_id: [u8; 32],
    pub checksum: [u8; 32],
}

impl FileHeader {
    pub fn new(flags: FeatureFlags) -> Self {
        Self {
            magic: MAGIC,
            version_major: VERSION_MAJOR,
            version_minor: VERSION_MINOR,
            version_patch: VERSION_PATCH,
            flags,
            section_count: 0,
            section_dir_offset: 0,
            section_dir_size: 0,
            version_id: [0u8; 32],
            checksum: [0u8; 32],
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4] = self.version_major;
        buf[5] = self.version_minor;
        buf[6] = self.version_patch;
        buf[8..12].copy_from_slice(&self.flags.0.to_le_bytes());
        buf[12..14].copy_from_slice(&self.section_count.to_le_bytes());
        buf[16..20].copy_from_slice(&self.section_dir_offset.to_le_bytes());
        buf[20..24].copy_from_slice(&self.section_dir_size.to_le_bytes());
        buf[32..64].copy_from_slice(&self.version_id);
        buf[64..96].copy_from_slice(&self.checksum);
        buf
    }

    /// Raw parse; validation (magic, version, checksum) is the reader's job
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_SIZE {
            return None;
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        let mut version_id = [0u8; 32];
        version_id.copy_from_slice(&bytes[32..64]);
        let mut checksum = [0u8; 32];
        checksum.copy_from_slice(&bytes[64..96]);
        Some(Self {
            magic,
            version_major: bytes[4],
            version_minor: bytes[5],
            version_patch: bytes[6],
            flags: FeatureFlags(u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]])),
            section_count: u16::from_le_bytes([bytes[12], bytes[13]]),
            section_dir_offset: u32::from_le_bytes([
                bytes[16], bytes[17], bytes[18], bytes[19],
            ]),
            section_dir_size: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
            version_id,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut header = FileHeader::new(FeatureFlags::HAS_DEBUG_INFO);
        header.section_count = 4;
        header.section_dir_offset = 128;
        header.section_dir_size = 64;
        header.version_id = [7u8; 32];

        let bytes = header.to_bytes();
        let parsed = FileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.magic, MAGIC);
        assert_eq!(parsed.version_major, VERSION_MAJOR);
        assert_eq!(parsed.section_count, 4);
        assert_eq!(parsed.section_dir_offset, 128);
        assert_eq!(parsed.version_id, [7u8; 32]);
        assert!(parsed.flags.contains(FeatureFlags::HAS_DEBUG_INFO));
        assert!(!parsed.flags.contains(FeatureFlags::DEBUG_PUBLIC));
    }

    #[test]
    fn test_header_too_short() {
        assert!(FileHeader::from_bytes(&[0u8; 10]).is_none());
    }

    #[test]
    fn test_feature_flags() {
        let mut flags = FeatureFlags::empty();
        flags.insert(FeatureFlags::HAS_DEBUG_INFO);
        flags.insert(FeatureFlags::DEBUG_PUBLIC);
        assert!(flags.contains(FeatureFlags::DEBUG_PUBLIC));
        flags.remove(FeatureFlags::DEBUG_PUBLIC);
        assert!(!flags.contains(FeatureFlags::DEBUG_PUBLIC));
        assert!(flags.contains(FeatureFlags::HAS_DEBUG_INFO));
    }
}
