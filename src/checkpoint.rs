//! Resumable state for the BP-CRT `kp` sweep.
//!
//! Checkpoint files are JSON with a SHA-256 integrity checksum and rotating
//! generations, written atomically (temp file + rename), narrowed to the
//! one piece of BP-CRT state that benefits from resumability: how far the
//! `kp` sweep has progressed.
//!
//! BP-PQ has no checkpoint — its search is a single DFS over a fixed bit
//! length, not an outer sweep, and in practice completes well within one run.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const GENERATIONS: usize = 3;

/// Progress through the `kp ∈ [1, e)` sweep for one `(n, e)` factoring run.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checkpoint {
    pub n: String,
    pub e: u64,
    pub next_kp: u64,
}

#[derive(Serialize, Deserialize)]
struct CheckpointEnvelope {
    checksum: String,
    data: serde_json::Value,
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generation_path(base: &Path, gen: usize) -> PathBuf {
    if gen == 0 {
        base.to_path_buf()
    } else {
        let mut p = base.as_os_str().to_os_string();
        p.push(format!(".{}", gen));
        PathBuf::from(p)
    }
}

/// Save a checkpoint with integrity checksum and rotating generations.
///
/// Rotation: current → .1 → .2 (oldest .2 is discarded). The new checkpoint
/// is written atomically via a .tmp file.
pub fn save(path: &Path, checkpoint: &Checkpoint) -> Result<()> {
    for gen in (1..GENERATIONS).rev() {
        let src = generation_path(path, gen - 1);
        let dst = generation_path(path, gen);
        if src.exists() {
            let _ = fs::rename(&src, &dst);
        }
    }

    let data = serde_json::to_value(checkpoint)?;
    let data_str = serde_json::to_string_pretty(&data)?;
    let checksum = sha256_hex(&data_str);

    let envelope = CheckpointEnvelope { checksum, data };
    let json = serde_json::to_string_pretty(&envelope)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;

    Ok(())
}

/// Load the newest valid checkpoint, falling back to older generations on
/// checksum failure.
pub fn load(path: &Path) -> Option<Checkpoint> {
    for gen in 0..GENERATIONS {
        let p = generation_path(path, gen);
        if let Some(cp) = load_single(&p) {
            if gen > 0 {
                eprintln!(
                    "Warning: recovered checkpoint from generation {} ({})",
                    gen,
                    p.display()
                );
            }
            return Some(cp);
        }
    }
    None
}

fn load_single(path: &Path) -> Option<Checkpoint> {
    let raw = fs::read_to_string(path).ok()?;
    let envelope: CheckpointEnvelope = serde_json::from_str(&raw).ok()?;

    let data_str = serde_json::to_string_pretty(&envelope.data).ok()?;
    let expected = sha256_hex(&data_str);
    if expected != envelope.checksum {
        eprintln!(
            "Checkpoint integrity check failed: {} (expected {}, got {})",
            path.display(),
            &expected[..12],
            &envelope.checksum[..12.min(envelope.checksum.len())]
        );
        return None;
    }

    serde_json::from_value(envelope.data).ok()
}

/// Remove all generations plus any leftover `.tmp` file.
pub fn clear(path: &Path) {
    for gen in 0..GENERATIONS {
        let _ = fs::remove_file(generation_path(path, gen));
    }
    let _ = fs::remove_file(path.with_extension("tmp"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cp(next_kp: u64) -> Checkpoint {
        Checkpoint {
            n: "899".to_string(),
            e: 17,
            next_kp,
        }
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        save(&path, &cp(5)).unwrap();
        assert_eq!(load(&path).unwrap(), cp(5));
    }

    #[test]
    fn rotation_keeps_generations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        for kp in 1..=3u64 {
            save(&path, &cp(kp)).unwrap();
        }

        assert!(path.exists());
        assert!(generation_path(&path, 1).exists());
        assert!(generation_path(&path, 2).exists());

        assert_eq!(load_single(&path).unwrap(), cp(3));
        assert_eq!(load_single(&generation_path(&path, 1)).unwrap(), cp(2));
        assert_eq!(load_single(&generation_path(&path, 2)).unwrap(), cp(1));
    }

    #[test]
    fn fallback_on_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        save(&path, &cp(1)).unwrap();
        save(&path, &cp(2)).unwrap();

        {
            let mut f = fs::File::create(&path).unwrap();
            f.write_all(b"corrupted data!!!").unwrap();
        }

        assert_eq!(load(&path).unwrap(), cp(1));
    }

    #[test]
    fn checksum_detects_tampering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.json");

        save(&path, &cp(7)).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let tampered = raw.replace("7", "9");
        fs::write(&path, &tampered).unwrap();

        assert!(load_single(&path).is_none());
    }

    #[test]
    fn clear_removes_all() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        for kp in 0..4u64 {
            save(&path, &cp(kp)).unwrap();
        }
        clear(&path);

        assert!(!path.exists());
        assert!(!generation_path(&path, 1).exists());
        assert!(!generation_path(&path, 2).exists());
    }
}
