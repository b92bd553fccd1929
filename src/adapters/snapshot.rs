use crate::adapters::memory::LibrarySnapshot;
use crate::domain::ports::Storage;
use crate::utils::error::Result;

/// Reads and writes the whole library as one JSON document.
pub struct SnapshotStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> SnapshotStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    /// `None` when no snapshot has been written yet.
    pub async fn load(&self) -> Result<Option<LibrarySnapshot>> {
        if !self.storage.exists(&self.file_name).await {
            tracing::debug!("No snapshot at {}", self.file_name);
            return Ok(None);
        }
        let data = self.storage.read_file(&self.file_name).await?;
        let snapshot: LibrarySnapshot = serde_json::from_slice(&data)?;
        tracing::debug!(
            books = snapshot.books.len(),
            members = snapshot.members.len(),
            borrowings = snapshot.borrowings.len(),
            "Loaded snapshot"
        );
        Ok(Some(snapshot))
    }

    pub async fn save(&self, snapshot: &LibrarySnapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        self.storage.write_file(&self.file_name, &data).await?;
        tracing::debug!("Snapshot written to {}", self.file_name);
        Ok(())
    }
}
