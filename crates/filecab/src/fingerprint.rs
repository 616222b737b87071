//! Content fingerprinting and collision-free stored-name generation.
//!
//! Hashing streams the input in bounded chunks so arbitrarily large files
//! never sit in memory whole. Stored names combine a UTC microsecond stamp
//! with the sanitized original basename; the stamp is forced strictly
//! monotonic per process, so two ingestions in the same tick still get
//! distinct, sortable names even when they race.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::sanitize::sanitize_filename;

/// Read size for streaming hashes.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Last stamp handed out by `next_stamp`.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Computes the SHA-256 digest of a file as 64 lowercase hex characters.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Computes the SHA-256 digest of an in-memory buffer.
pub fn sha256_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Returns a UTC microsecond timestamp that is strictly greater than any
/// previously returned in this process.
fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_micros();
    loop {
        let last = LAST_STAMP.load(Ordering::Relaxed);
        let candidate = now.max(last + 1);
        if LAST_STAMP
            .compare_exchange(last, candidate, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            return candidate;
        }
    }
}

/// Builds a unique stored filename: `<stamp>_<sanitized-basename>`.
///
/// Names produced by one process never collide and sort in ingestion order.
pub fn unique_stored_name(original_name: &str) -> String {
    format!("{}_{}", next_stamp(), sanitize_filename(original_name))
}
