// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{ClientError, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::info;
use zeroize::Zeroizing;

/// Persistence of the keyholder's serialized secret context
pub trait SecretStore: Send + Sync {
    fn save(&self, secret: &[u8]) -> Result<()>;
    /// `ClientError::LocalContextMissing` when nothing was saved
    fn load(&self) -> Result<Zeroizing<Vec<u8>>>;
    /// Human readable location for messages
    fn location(&self) -> PathBuf;
}

/// Keeps the secret in a single file readable only by its owner
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SecretStore for FileSecretStore {
    fn save(&self, secret: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        {
            let mut file = options.open(&self.path)?;
            // An existing file keeps its old mode on open
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                file.set_permissions(fs::Permissions::from_mode(0o600))?;
            }
            file.write_all(secret)?;
            file.sync_all()?;
        }

        info!(path = ?self.path, "Saved secret context");
        Ok(())
    }

    fn load(&self) -> Result<Zeroizing<Vec<u8>>> {
        let mut file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ClientError::LocalContextMissing(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Zeroizing::new(Vec::new());
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn location(&self) -> PathBuf {
        self.path.clone()
    }
}

/// In-process store for tests and embedding
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secret: Mutex<Option<Zeroizing<Vec<u8>>>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecretStore for MemorySecretStore {
    fn save(&self, secret: &[u8]) -> Result<()> {
        *self.secret.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(Zeroizing::new(secret.to_vec()));
        Ok(())
    }

    fn load(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.secret
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| ClientError::LocalContextMissing(self.location()))
    }

    fn location(&self) -> PathBuf {
        PathBuf::from("<memory>")
    }
}
