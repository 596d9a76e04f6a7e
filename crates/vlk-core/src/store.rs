//! Secret store: persistence for long-lived secrets between runs.
//!
//! The engine only needs two operations — load and save by name. The
//! credential record, the wrapped master key and session material all go
//! through this trait; how the bytes are kept (files, keychain, remote
//! vault) is the caller's concern.

use std::path::PathBuf;

use crate::error::{VlkError, VlkResult};

pub trait SecretStore: Send + Sync {
    /// Fetch a named secret. `None` if it has never been saved.
    fn load_secret(&self, name: &str) -> VlkResult<Option<Vec<u8>>>;

    /// Persist a named secret, replacing any previous value.
    fn save_secret(&self, name: &str, bytes: &[u8]) -> VlkResult<()>;
}

/// Filesystem-backed store: one file per secret under a base directory.
#[derive(Debug, Clone)]
pub struct FsSecretStore {
    dir: PathBuf,
}

impl FsSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn secret_path(&self, name: &str) -> VlkResult<PathBuf> {
        // Names are identifiers, not paths
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(VlkError::Store(format!("invalid secret name: {name:?}")));
        }
        Ok(self.dir.join(name))
    }
}

impl SecretStore for FsSecretStore {
    fn load_secret(&self, name: &str) -> VlkResult<Option<Vec<u8>>> {
        let path = self.secret_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        Ok(Some(bytes))
    }

    fn save_secret(&self, name: &str, bytes: &[u8]) -> VlkResult<()> {
        let path = self.secret_path(name)?;
        std::fs::create_dir_all(&self.dir)?;

        // Atomic replace so a crash mid-write never truncates a secret
        let tmp = path.with_extension("vlk_tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        tracing::debug!(name, len = bytes.len(), "secret saved");
        Ok(())
    }
}
