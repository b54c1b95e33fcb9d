// src/compile/fingerprint.rs

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Fingerprint of the compile inputs: the compile argv plus every source
/// file (path and contents).
///
/// Order of `sources` does not matter; paths are sorted before hashing.
pub fn compute_fingerprint(fs: &dyn FileSystem, argv: &[String], sources: &[PathBuf]) -> Result<String> {
    let mut hasher = Hasher::new();

    for token in argv {
        hasher.update(token.as_bytes());
        hasher.update(&[0]);
    }

    let mut sorted: Vec<&PathBuf> = sources.iter().collect();
    sorted.sort();

    for path in sorted {
        let file_hash = compute_file_hash(fs, path)?;
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update(&[0]);
        hasher.update(file_hash.as_bytes());
    }

    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, files = sources.len(), "computed compile fingerprint");
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn file_hash_matches_blake3_reference() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", b"hello world".to_vec());

        let hash = compute_file_hash(&fs, Path::new("test.txt")).unwrap();
        assert_eq!(hash, "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24");
    }

    #[test]
    fn fingerprint_ignores_order_but_not_contents() {
        let fs = MockFileSystem::new();
        fs.add_file("src/A.java", "class A {}");
        fs.add_file("src/B.java", "class B {}");
        let argv = vec!["make".to_string()];
        let a = PathBuf::from("src/A.java");
        let b = PathBuf::from("src/B.java");

        let first = compute_fingerprint(&fs, &argv, &[a.clone(), b.clone()]).unwrap();
        let swapped = compute_fingerprint(&fs, &argv, &[b.clone(), a.clone()]).unwrap();
        assert_eq!(first, swapped);

        fs.add_file("src/B.java", "class B { int x; }");
        let edited = compute_fingerprint(&fs, &argv, &[a, b]).unwrap();
        assert_ne!(first, edited);
    }
}
