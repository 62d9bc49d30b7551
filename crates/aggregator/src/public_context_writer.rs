// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::AggregatorError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

/// Mirrors every stored public context to a file
#[derive(Debug, Clone)]
pub struct PublicContextWriter {
    path: PathBuf,
    order: Arc<Mutex<()>>,
}

impl PublicContextWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            order: Arc::new(Mutex::new(())),
        }
    }

    /// Held from storing a context until its mirror is written. Clones share the lock.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.order.lock().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn write(&self, context: &[u8]) -> Result<(), AggregatorError> {
        let to_error = |source| AggregatorError::ContextWrite {
            path: self.path.clone(),
            source,
        };

        // Ensure the directory structure exists
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(to_error)?;
        }
        fs::write(&self.path, context).await.map_err(to_error)?;

        info!(path = ?&self.path, "Wrote public context to path");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_into_missing_folders() {
        let dir = tempdir().unwrap();
        let writer = PublicContextWriter::new(dir.path().join("nested/public_context.ctx"));
        writer.write(b"first").await.unwrap();
        writer.write(b"second").await.unwrap();
        assert_eq!(std::fs::read(writer.path()).unwrap(), b"second");
    }
}
