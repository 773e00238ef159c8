// src/core/cache.rs

//! Last-good alias cache.
//!
//! After every successful refresh the fetched definitions are written to disk so that a
//! restart during an outage of the alias source still comes up with usable patterns.
//!
//! On-disk layout: an lz4 block (size prepended) around a `bincode` envelope. The alias
//! definitions travel inside the envelope as JSON text because their `formats` are
//! free-form JSON values, which a non-self-describing format cannot round-trip.

use crate::models::AliasDefinition;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

const HASH_TRUNCATE_LENGTH: usize = 16; // 16 bytes = 32 hex characters

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("No alias cache at '{0}'")]
    Missing(PathBuf),
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Alias cache is corrupt: {0}")]
    Corrupt(String),
    #[error("Failed to decode from binary format: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),
    #[error("Failed to encode to binary format: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),
    #[error("Failed to (de)serialize alias definitions: {0}")]
    Json(#[from] serde_json::Error),
}

/// A set of alias definitions as last fetched from the alias source.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedAliases {
    pub fingerprint: String,
    /// Seconds since the Unix epoch.
    pub fetched_at: u64,
    pub definitions: Vec<AliasDefinition>,
}

impl CachedAliases {
    /// Wraps freshly fetched definitions, stamping them with the current time.
    pub fn new(definitions: Vec<AliasDefinition>) -> Result<Self, CacheError> {
        let fetched_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Ok(Self {
            fingerprint: fingerprint(&definitions)?,
            fetched_at,
            definitions,
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct CacheEnvelope {
    fingerprint: String,
    fetched_at: u64,
    payload: String,
}

/// Computes the content hash of a definition set.
///
/// Two fetches that return the same definitions in the same order hash identically.
pub fn fingerprint(definitions: &[AliasDefinition]) -> Result<String, CacheError> {
    let bytes = serde_json::to_vec(definitions)?;
    let hash = blake3::hash(&bytes);
    Ok(hex::encode(&hash.as_bytes()[..HASH_TRUNCATE_LENGTH]))
}

/// Writes the cache file, creating its parent directory if needed.
pub fn write_cache(path: &Path, cached: &CachedAliases) -> Result<(), CacheError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }

    let envelope = CacheEnvelope {
        fingerprint: cached.fingerprint.clone(),
        fetched_at: cached.fetched_at,
        payload: serde_json::to_string(&cached.definitions)?,
    };
    let bytes = bincode::serde::encode_to_vec(&envelope, bincode::config::standard())?;
    let compressed = lz4_flex::compress_prepend_size(&bytes);
    fs::write(path, compressed)?;

    log::debug!(
        "Wrote {} alias definition(s) to cache '{}'",
        cached.definitions.len(),
        path.display()
    );
    Ok(())
}

/// Reads the cache file back. A file whose content no longer matches its recorded
/// fingerprint is reported as corrupt.
pub fn read_cache(path: &Path) -> Result<CachedAliases, CacheError> {
    let compressed = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CacheError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let bytes = lz4_flex::decompress_size_prepended(&compressed)
        .map_err(|e| CacheError::Corrupt(e.to_string()))?;
    let (envelope, _): (CacheEnvelope, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    let definitions: Vec<AliasDefinition> = serde_json::from_str(&envelope.payload)?;

    let actual = fingerprint(&definitions)?;
    if actual != envelope.fingerprint {
        return Err(CacheError::Corrupt(format!(
            "fingerprint mismatch (recorded {}, computed {})",
            envelope.fingerprint, actual
        )));
    }

    Ok(CachedAliases {
        fingerprint: envelope.fingerprint,
        fetched_at: envelope.fetched_at,
        definitions,
    })
}
