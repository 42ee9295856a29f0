//! Flat-file persistence for registration records.
//!
//! The whole collection lives in one JSON array. Every append reads the
//! array, pushes the new record and rewrites the file through a temp file
//! in the same directory, so a reader sees either the old or the new
//! collection and never a partial one. Appends are serialized by a mutex
//! held across the read-modify-write cycle.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::task;
use tracing::{debug, info};

use crate::models::{Registration, RegistrationRecord};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("no identifier left after {0}")]
    IdsExhausted(u64),
    #[error("failed to hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("background task failed: {0}")]
    Join(#[from] task::JoinError),
}

pub struct RecordStore {
    path: PathBuf,
    bcrypt_cost: u32,
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    pub fn open(path: impl Into<PathBuf>, bcrypt_cost: u32) -> Self {
        Self {
            path: path.into(),
            bcrypt_cost,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current collection. A missing or blank file is an empty
    /// collection.
    pub async fn load(&self) -> StoreResult<Vec<RegistrationRecord>> {
        let path = self.path.clone();
        task::spawn_blocking(move || load_records(&path)).await?
    }

    /// Persists a validated registration under the next free identifier and
    /// returns the stored record.
    ///
    /// The locked read-modify-write runs as one blocking task, so it finishes
    /// and releases the lock even when the caller stops waiting.
    pub async fn append(&self, registration: Registration) -> StoreResult<RegistrationRecord> {
        let Registration {
            full_name,
            email,
            password,
            gender,
            subscription,
            country,
            terms,
        } = registration;

        let cost = self.bcrypt_cost;
        let password_hash = task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let path = self.path.clone();
        let write_lock = Arc::clone(&self.write_lock);
        task::spawn_blocking(move || -> StoreResult<RegistrationRecord> {
            let _guard = write_lock.lock().unwrap_or_else(PoisonError::into_inner);

            let mut records = load_records(&path)?;
            let record = RegistrationRecord {
                id: next_id(&records)?,
                full_name,
                email,
                password_hash,
                gender,
                subscription,
                country,
                terms,
                registered_at: Utc::now(),
            };
            records.push(record.clone());

            let bytes = serde_json::to_vec_pretty(&records)?;
            atomic_write(&path, &bytes)?;

            info!(
                id = record.id,
                total = records.len(),
                path = %path.display(),
                "registration persisted"
            );
            Ok(record)
        })
        .await?
    }
}

/// One past the largest identifier in use, or 1 for an empty collection.
pub fn next_id(records: &[RegistrationRecord]) -> StoreResult<u64> {
    match records.iter().map(|record| record.id).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted(max)),
    }
}

fn load_records(path: &Path) -> StoreResult<Vec<RegistrationRecord>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "details file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(&raw).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn atomic_write(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let write_error = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_error)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_error)?;
    tmp.write_all(bytes).map_err(write_error)?;
    tmp.write_all(b"\n").map_err(write_error)?;
    tmp.as_file().sync_all().map_err(write_error)?;
    tmp.persist(path).map_err(|err| write_error(err.error))?;
    Ok(())
}
