//! Temporary storage for uploaded files.
//!
//! The binder never holds file bytes. During pre-parse the upload widget
//! hands content to a [`FileStore`] and keeps only the returned key in the
//! request data, so submitted-but-invalid forms can redisplay the upload
//! without resubmission. Durable persistence is the host application's
//! concern; this module only covers the request-scoped staging area.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::SystemTime;

use uuid::Uuid;

/// Storage for uploaded file content, addressed by opaque keys.
pub trait FileStore: Send + Sync + fmt::Debug {
    /// Stores content under a fresh key and returns the key.
    fn store(&self, bytes: &[u8], original_name: &str) -> io::Result<String>;

    /// Reads the content stored under a key.
    fn get(&self, key: &str) -> io::Result<Vec<u8>>;

    /// The filesystem path of a stored file.
    fn path(&self, key: &str) -> io::Result<PathBuf>;

    /// Removes a stored file.
    fn delete(&self, key: &str) -> io::Result<()>;

    /// The last-modified time of a stored file.
    fn mtime(&self, key: &str) -> io::Result<SystemTime>;
}

/// A [`FileStore`] backed by a temporary directory that is removed when
/// the store is dropped.
#[derive(Debug)]
pub struct TempFileStore {
    root: tempfile::TempDir,
}

impl TempFileStore {
    /// Creates a store in a fresh temporary directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            root: tempfile::tempdir()?,
        })
    }

    fn resolve(&self, key: &str) -> io::Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file store key {key:?}"),
            ));
        }
        Ok(self.root.path().join(key))
    }
}

impl FileStore for TempFileStore {
    fn store(&self, bytes: &[u8], original_name: &str) -> io::Result<String> {
        let key = format!("{}-{}", Uuid::new_v4().simple(), safe_filename(original_name));
        let path = self.resolve(&key)?;
        fs::write(&path, bytes)?;
        tracing::debug!(key = %key, size = bytes.len(), "stored uploaded file");
        Ok(key)
    }

    fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(key)?)
    }

    fn path(&self, key: &str) -> io::Result<PathBuf> {
        let path = self.resolve(key)?;
        if path.exists() {
            Ok(path)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no stored file for key {key:?}"),
            ))
        }
    }

    fn delete(&self, key: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(key)?)?;
        tracing::debug!(key = %key, "deleted uploaded file");
        Ok(())
    }

    fn mtime(&self, key: &str) -> io::Result<SystemTime> {
        fs::metadata(self.resolve(key)?)?.modified()
    }
}

/// Reduces a client-supplied filename to a safe single path component.
fn safe_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim_matches('.');
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
