// ---------------------------------------------------------------------------
// SaveError: typed errors for save/load operations
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while persisting or recovering the weather state.
///
/// Every variant is recoverable: the simulation keeps running in-memory and
/// the store either retries the flush or falls back to defaults.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// The file does not start with the expected magic bytes.
    BadMagic,
    /// The file is too short to contain a complete header.
    Truncated,
    /// Payload checksum does not match the header.
    ChecksumMismatch { expected: u32, found: u32 },
    /// Save file format is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Payload decompression failed (corrupt data).
    Decompress(String),
    /// Bitcode decoding failed (corrupt or invalid save data).
    Decode(String),
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::BadMagic => write!(f, "not a weather save file (bad magic bytes)"),
            SaveError::Truncated => write!(f, "save file is truncated"),
            SaveError::ChecksumMismatch { expected, found } => write!(
                f,
                "checksum mismatch: header says {expected:#010x}, payload hashes to {found:#010x}"
            ),
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "version mismatch: save is v{found}, but this build only supports up to v{expected_max}"
            ),
            SaveError::Decompress(msg) => write!(f, "decompression error: {msg}"),
            SaveError::Decode(msg) => write!(f, "decoding error: {msg}"),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}
