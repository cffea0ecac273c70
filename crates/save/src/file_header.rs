// ---------------------------------------------------------------------------
// file_header – save file header with magic bytes, version, and checksum
// ---------------------------------------------------------------------------
//
// Header format (28 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "SQLL"
//   [4..8]   Format version (u32)
//   [8..12]  Flags (u32: bit 0 = LZ4-compressed payload)
//   [12..20] Timestamp (Unix epoch, u64)
//   [20..24] Uncompressed payload size (u32)
//   [24..28] xxHash32 checksum of the payload (everything after the header)
//
// On save: encode payload -> prepend header (checksum over the stored bytes).
// On load: check magic -> check version -> validate checksum -> strip header.

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying a weather save file.
pub const MAGIC: [u8; 4] = *b"SQLL";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 28;

/// Current header format version. Bumped only when the header layout itself
/// changes; payload schema changes are the codec's concern.
pub const HEADER_FORMAT_VERSION: u32 = 1;

/// Flag bit: the payload is LZ4-compressed.
pub const FLAG_COMPRESSED: u32 = 1;

/// Seed for the xxHash32 checksum.
const XXHASH_SEED: u32 = 0;

/// Parsed file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub flags: u32,
    pub timestamp: u64,
    pub uncompressed_size: u32,
    pub checksum: u32,
}

impl FileHeader {
    /// Whether the payload behind this header is LZ4-compressed.
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }
}

/// Wrap a payload with a file header.
///
/// `uncompressed_size` is recorded for diagnostics; the checksum covers the
/// payload exactly as stored (i.e. after compression).
pub fn wrap_with_header(payload: &[u8], flags: u32, uncompressed_size: u32) -> Vec<u8> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&HEADER_FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(&uncompressed_size.to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Parse and validate the header, returning it together with the payload
/// bytes that follow.
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::Truncated);
    }
    if bytes[0..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }

    // All fields are little-endian at fixed offsets.
    let header = FileHeader {
        format_version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        flags: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        timestamp: u64::from_le_bytes([
            bytes[12], bytes[13], bytes[14], bytes[15], bytes[16], bytes[17], bytes[18],
            bytes[19],
        ]),
        uncompressed_size: u32::from_le_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]),
        checksum: u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]),
    };

    if header.format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: header.format_version,
        });
    }

    let payload = &bytes[HEADER_SIZE..];
    let found = xxh32(payload, XXHASH_SEED);
    if found != header.checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: header.checksum,
            found,
        });
    }

    Ok((header, payload))
}
