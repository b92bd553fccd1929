use crate::domain::ports::Storage;
use crate::utils::error::{LendingError, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

/// Exclusive advisory lock on a file under the storage root. Released when
/// dropped, or when the holding process exits.
#[derive(Debug)]
pub struct StorageLock {
    _file: File,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    /// Blocks until no other process holds the lock on `name`.
    pub async fn lock_exclusive(&self, name: &str) -> Result<StorageLock> {
        let path = Path::new(&self.base_path).join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        tracing::debug!("Waiting for lock on {}", path.display());
        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&path)?;
            FileExt::lock_exclusive(&file)?;
            Ok(file)
        })
        .await
        .map_err(|e| LendingError::state(format!("lock task failed: {e}")))??;

        Ok(StorageLock { _file: file })
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // readers never observe a partial file; writers never share a temp file
        let tmp_path = full_path.with_extension(format!("{}.tmp", Uuid::new_v4()));
        let written = match fs::write(&tmp_path, data).await {
            Ok(()) => fs::rename(&tmp_path, &full_path).await,
            Err(e) => Err(e),
        };
        if written.is_err() {
            let _ = fs::remove_file(&tmp_path).await;
        }
        Ok(written?)
    }

    async fn exists(&self, path: &str) -> bool {
        fs::try_exists(Path::new(&self.base_path).join(path))
            .await
            .unwrap_or(false)
    }
}
