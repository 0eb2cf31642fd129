use crate::types::{
    BlobHash, DocumentFilter, DocumentId, InsertDocumentRequest, ReplaceDocumentRequest,
    StoredDocument,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("resource not found: {resource} ({id})")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and assigns it an opaque ID.
    async fn insert_document(
        &self,
        request: InsertDocumentRequest,
    ) -> StoreResult<StoredDocument>;

    async fn get_document(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> StoreResult<StoredDocument>;

    /// Replaces the whole payload of an existing document.
    async fn replace_document(
        &self,
        request: ReplaceDocumentRequest,
    ) -> StoreResult<StoredDocument>;

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()>;

    /// Lists documents of a collection in insertion order.
    async fn list_documents(
        &self,
        collection: &str,
        filter: &DocumentFilter,
    ) -> StoreResult<Vec<StoredDocument>>;
}

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    async fn put_blob(&self, raw_bytes: &[u8]) -> StoreResult<BlobHash>;

    async fn get_blob(&self, content_hash: &BlobHash) -> StoreResult<Option<Vec<u8>>>;

    /// Returns whether a blob was removed.
    async fn delete_blob(&self, content_hash: &BlobHash) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_not_found_expected_metadata() {
        let error = StoreError::NotFound {
            resource: "form",
            id: "f-1".to_string(),
        };

        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "resource not found: form (f-1)");
        assert!(!StoreError::Backend("disk".to_string()).is_not_found());
    }
}
