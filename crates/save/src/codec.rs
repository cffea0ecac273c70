//! Payload codec: the bridge between the `SaveableRegistry` extension map
//! and the bytes on disk.
//!
//! Pipeline on save: `bitcode` encode -> LZ4 compress -> file header.
//! Pipeline on load: header validation -> LZ4 decompress -> `bitcode` decode.
//! Each registered resource owns its own entry in the map, so the file
//! format is stable under features being added or removed.

use std::collections::BTreeMap;

use crate::file_header::{unwrap_header, wrap_with_header, FLAG_COMPRESSED};
use crate::save_error::SaveError;

/// Extension map as produced by `SaveableRegistry::save_all`.
pub type ExtensionMap = BTreeMap<String, Vec<u8>>;

/// Encode an extension map into complete save-file bytes.
pub fn encode_save(extensions: &ExtensionMap) -> Vec<u8> {
    let raw = bitcode::encode(extensions);
    let compressed = lz4_flex::compress_prepend_size(&raw);
    wrap_with_header(&compressed, FLAG_COMPRESSED, raw.len() as u32)
}

/// Decode save-file bytes back into an extension map.
pub fn decode_save(bytes: &[u8]) -> Result<ExtensionMap, SaveError> {
    let (header, payload) = unwrap_header(bytes)?;
    let raw = if header.is_compressed() {
        lz4_flex::decompress_size_prepended(payload)
            .map_err(|e| SaveError::Decompress(e.to_string()))?
    } else {
        payload.to_vec()
    };
    Ok(bitcode::decode(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> ExtensionMap {
        let mut map = ExtensionMap::new();
        map.insert("storms".to_string(), vec![1, 2, 3, 4]);
        map.insert("sim_rng".to_string(), vec![9; 40]);
        map
    }

    #[test]
    fn roundtrip() {
        let map = sample_map();
        let bytes = encode_save(&map);
        let decoded = decode_save(&bytes).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn empty_map_roundtrip() {
        let map = ExtensionMap::new();
        let decoded = decode_save(&encode_save(&map)).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn compression_pays_off_on_repetitive_payloads() {
        let mut map = ExtensionMap::new();
        map.insert("big".to_string(), vec![0xAB; 64 * 1024]);

        let bytes = encode_save(&map);
        assert!(
            bytes.len() < 8 * 1024,
            "64 KiB of repeated bytes should compress well, got {} bytes",
            bytes.len()
        );
    }

    #[test]
    fn corrupt_compressed_payload_is_an_error() {
        let bytes = encode_save(&sample_map());
        // Rebuild the file with a valid checksum over a garbage payload, so
        // the failure surfaces at the decompression stage.
        let garbage = wrap_with_header(&[0xFF; 16], FLAG_COMPRESSED, 16);
        assert!(matches!(
            decode_save(&garbage),
            Err(SaveError::Decompress(_) | SaveError::Decode(_))
        ));
        // The intact bytes still decode.
        assert!(decode_save(&bytes).is_ok());
    }

    #[test]
    fn random_bytes_are_rejected() {
        assert!(decode_save(&[0u8; 64]).is_err());
        assert!(decode_save(b"SQLL").is_err());
    }
}
