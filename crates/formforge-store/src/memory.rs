use crate::store::{BlobStore, DocumentStore, StoreError, StoreResult};
use crate::types::{
    BlobHash, DocumentFilter, DocumentId, InsertDocumentRequest, ReplaceDocumentRequest,
    StoredDocument, content_hash,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub(crate) struct MemoryState {
    pub next_sequence_no: u64,
    pub collections: BTreeMap<String, BTreeMap<DocumentId, StoredDocument>>,
    pub blobs: BTreeMap<BlobHash, Vec<u8>>,
}

impl MemoryState {
    fn allocate_sequence_no(&mut self) -> u64 {
        if self.next_sequence_no == 0 {
            self.next_sequence_no = 1;
        }
        let sequence_no = self.next_sequence_no;
        self.next_sequence_no += 1;
        sequence_no
    }

    fn allocate_document_id(&self, collection: &str) -> DocumentId {
        loop {
            let id = uuid::Uuid::new_v4().simple().to_string();
            let taken = self
                .collections
                .get(collection)
                .is_some_and(|documents| documents.contains_key(&id));
            if !taken {
                return id;
            }
        }
    }
}

fn not_found(collection: &str, id: &str) -> StoreError {
    StoreError::NotFound {
        resource: "document",
        id: format!("{collection}/{id}"),
    }
}

fn validate_collection(collection: &str) -> StoreResult<()> {
    if collection.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "collection name must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: MemoryState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub(crate) fn snapshot(&self) -> StoreResult<MemoryState> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store mutex poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert_document(
        &self,
        request: InsertDocumentRequest,
    ) -> StoreResult<StoredDocument> {
        validate_collection(&request.collection)?;
        let mut state = self.lock()?;

        let id = state.allocate_document_id(&request.collection);
        let sequence_no = state.allocate_sequence_no();
        let document = StoredDocument {
            collection: request.collection.clone(),
            id: id.clone(),
            owner_id: request.owner_id,
            sequence_no,
            revision: 1,
            content_hash: content_hash(&request.payload),
            payload: request.payload,
        };
        state
            .collections
            .entry(request.collection)
            .or_default()
            .insert(id, document.clone());

        tracing::debug!(
            collection = %document.collection,
            id = %document.id,
            "document inserted"
        );
        Ok(document)
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<StoredDocument> {
        let state = self.lock()?;
        state
            .collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    async fn replace_document(
        &self,
        request: ReplaceDocumentRequest,
    ) -> StoreResult<StoredDocument> {
        let mut state = self.lock()?;
        let document = state
            .collections
            .get_mut(&request.collection)
            .and_then(|documents| documents.get_mut(&request.id))
            .ok_or_else(|| not_found(&request.collection, &request.id))?;

        document.revision += 1;
        document.content_hash = content_hash(&request.payload);
        document.payload = request.payload;

        tracing::debug!(
            collection = %document.collection,
            id = %document.id,
            revision = document.revision,
            "document replaced"
        );
        Ok(document.clone())
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        let mut state = self.lock()?;
        let removed = state
            .collections
            .get_mut(collection)
            .and_then(|documents| documents.remove(id));
        match removed {
            Some(_) => {
                tracing::debug!(collection, id = %id, "document deleted");
                Ok(())
            }
            None => Err(not_found(collection, id)),
        }
    }

    async fn list_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<StoredDocument>> {
        let state = self.lock()?;
        let Some(documents) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matching: Vec<StoredDocument> = documents
            .values()
            .filter(|document| filter.matches(document))
            .cloned()
            .collect();
        matching.sort_by_key(|document| document.sequence_no);
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryDocumentStore {
    async fn put_blob(&self, raw_bytes: &[u8]) -> StoreResult<BlobHash> {
        let hash = content_hash(raw_bytes);
        let mut state = self.lock()?;
        state
            .blobs
            .entry(hash.clone())
            .or_insert_with(|| raw_bytes.to_vec());
        Ok(hash)
    }

    async fn get_blob(&self, content_hash: &BlobHash) -> StoreResult<Option<Vec<u8>>> {
        let state = self.lock()?;
        Ok(state.blobs.get(content_hash).cloned())
    }

    async fn delete_blob(&self, content_hash: &BlobHash) -> StoreResult<bool> {
        let mut state = self.lock()?;
        Ok(state.blobs.remove(content_hash).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_request(owner_id: &str, payload: &[u8]) -> InsertDocumentRequest {
        InsertDocumentRequest {
            collection: "forms".to_string(),
            owner_id: Some(owner_id.to_string()),
            payload: payload.to_vec(),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn insert_document_expected_distinct_opaque_ids() {
        let store = MemoryDocumentStore::new();
        let first = store
            .insert_document(insert_request("user-1", b"a"))
            .await
            .expect("insert should succeed");
        let second = store
            .insert_document(insert_request("user-1", b"b"))
            .await
            .expect("insert should succeed");

        assert_ne!(first.id, second.id);
        assert!(first.sequence_no < second.sequence_no);
        assert_eq!(first.revision, 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn insert_document_empty_collection_expected_invalid_input() {
        let store = MemoryDocumentStore::new();
        let error = store
            .insert_document(InsertDocumentRequest {
                collection: " ".to_string(),
                owner_id: None,
                payload: Vec::new(),
            })
            .await
            .expect_err("empty collection should be rejected");

        assert!(matches!(error, StoreError::InvalidInput(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn replace_document_expected_revision_bump_and_new_hash() {
        let store = MemoryDocumentStore::new();
        let inserted = store
            .insert_document(insert_request("user-1", b"v1"))
            .await
            .expect("insert should succeed");

        let replaced = store
            .replace_document(ReplaceDocumentRequest {
                collection: "forms".to_string(),
                id: inserted.id.clone(),
                payload: b"v2".to_vec(),
            })
            .await
            .expect("replace should succeed");

        assert_eq!(replaced.revision, 2);
        assert_eq!(replaced.payload, b"v2".to_vec());
        assert_ne!(replaced.content_hash, inserted.content_hash);
        assert_eq!(replaced.owner_id, inserted.owner_id);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn delete_document_missing_expected_not_found() {
        let store = MemoryDocumentStore::new();
        let error = store
            .delete_document("forms", &"missing".to_string())
            .await
            .expect_err("delete should fail");

        assert!(error.is_not_found());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn put_blob_same_bytes_expected_same_hash() {
        let store = MemoryDocumentStore::new();
        let first = store.put_blob(b"image").await.expect("put should succeed");
        let second = store.put_blob(b"image").await.expect("put should succeed");

        assert_eq!(first, second);
        assert!(store.delete_blob(&first).await.expect("delete should succeed"));
        assert_eq!(store.get_blob(&first).await.expect("get should succeed"), None);
    }
}
