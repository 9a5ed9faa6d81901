//! BLAKE3 content hashing.
//!
//! Used to verify downloaded model files and to key the label-bank
//! cache on the classifier vocabulary.

use blake3::Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Hash a file's contents, streaming so large model files never load
/// fully into memory.
pub fn content_hash(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Hasher::new();

    let mut buffer = [0u8; 65536];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash an in-memory byte buffer.
pub fn content_hash_from_bytes(data: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_and_bytes_hashes_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"prism test data").unwrap();

        let from_file = content_hash(&path).unwrap();
        let from_bytes = content_hash_from_bytes(b"prism test data");
        assert_eq!(from_file, from_bytes);
    }

    #[test]
    fn test_hash_is_hex_of_expected_length() {
        let hash = content_hash_from_bytes(b"x");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(
            content_hash_from_bytes(b"a"),
            content_hash_from_bytes(b"b")
        );
    }
}
