use crate::memory::{MemoryDocumentStore, MemoryState};
use crate::store::{BlobStore, DocumentStore, StoreError, StoreResult};
use crate::types::{
    BlobHash, DocumentFilter, DocumentId, InsertDocumentRequest, ReplaceDocumentRequest,
    StoredDocument,
};
use std::fs;
use std::path::{Path, PathBuf};

const STATE_FILE_NAME: &str = "formforge-store.json";

/// Filesystem-backed store: the whole state is one JSON file rewritten
/// atomically after every mutation.
#[derive(Clone, Debug)]
pub struct FsDocumentStore {
    state_file: PathBuf,
    inner: MemoryDocumentStore,
}

impl FsDocumentStore {
    pub fn new<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        fs::create_dir_all(root.as_ref())
            .map_err(|err| StoreError::Backend(format!("create fs store root failed: {err}")))?;
        let state_file = root.as_ref().join(STATE_FILE_NAME);
        let state = if state_file.exists() {
            let raw = fs::read(&state_file)
                .map_err(|err| StoreError::Backend(format!("read state file failed: {err}")))?;
            serde_json::from_slice::<MemoryState>(&raw)
                .map_err(|err| StoreError::Serialization(err.to_string()))?
        } else {
            MemoryState::default()
        };

        tracing::debug!(path = %state_file.display(), "opened fs document store");
        Ok(Self {
            state_file,
            inner: MemoryDocumentStore::from_state(state),
        })
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    fn persist(&self) -> StoreResult<()> {
        let snapshot = self.inner.snapshot()?;
        let raw = serde_json::to_vec_pretty(&snapshot)
            .map_err(|err| StoreError::Serialization(err.to_string()))?;
        let tmp = self.state_file.with_extension("json.tmp");
        fs::write(&tmp, raw)
            .map_err(|err| StoreError::Backend(format!("write state file failed: {err}")))?;
        fs::rename(&tmp, &self.state_file)
            .map_err(|err| StoreError::Backend(format!("rename state file failed: {err}")))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FsDocumentStore {
    async fn insert_document(
        &self,
        request: InsertDocumentRequest,
    ) -> StoreResult<StoredDocument> {
        let document = self.inner.insert_document(request).await?;
        self.persist()?;
        Ok(document)
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<StoredDocument> {
        self.inner.get_document(collection, id).await
    }

    async fn replace_document(
        &self,
        request: ReplaceDocumentRequest,
    ) -> StoreResult<StoredDocument> {
        let document = self.inner.replace_document(request).await?;
        self.persist()?;
        Ok(document)
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        self.inner.delete_document(collection, id).await?;
        self.persist()
    }

    async fn list_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.inner.list_documents(collection, filter).await
    }
}

#[async_trait::async_trait]
impl BlobStore for FsDocumentStore {
    async fn put_blob(&self, raw_bytes: &[u8]) -> StoreResult<BlobHash> {
        let hash = self.inner.put_blob(raw_bytes).await?;
        self.persist()?;
        Ok(hash)
    }

    async fn get_blob(&self, content_hash: &BlobHash) -> StoreResult<Option<Vec<u8>>> {
        self.inner.get_blob(content_hash).await
    }

    async fn delete_blob(&self, content_hash: &BlobHash) -> StoreResult<bool> {
        let removed = self.inner.delete_blob(content_hash).await?;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn fs_store_reopen_restores_documents() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let store = FsDocumentStore::new(tmp.path()).expect("fs store should initialize");

        let inserted = store
            .insert_document(InsertDocumentRequest {
                collection: "forms".to_string(),
                owner_id: Some("user-1".to_string()),
                payload: b"{\"name\":\"Survey\"}".to_vec(),
            })
            .await
            .expect("insert should succeed");
        drop(store);

        let reopened = FsDocumentStore::new(tmp.path()).expect("fs store should reopen");
        let fetched = reopened
            .get_document("forms", &inserted.id)
            .await
            .expect("document should survive reopen");
        assert_eq!(fetched, inserted);
        assert!(reopened.state_file().exists());
    }
}
