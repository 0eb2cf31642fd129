use serde::{Deserialize, Serialize};

pub type DocumentId = String;
pub type OwnerId = String;
pub type BlobHash = String;

/// A stored document. `owner_id` names the entity owning the document: the
/// user for a form, the form for a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub collection: String,
    pub id: DocumentId,
    pub owner_id: Option<OwnerId>,
    pub sequence_no: u64,
    pub revision: u32,
    pub payload: Vec<u8>,
    pub content_hash: BlobHash,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertDocumentRequest {
    pub collection: String,
    pub owner_id: Option<OwnerId>,
    pub payload: Vec<u8>,
}

/// Full-document replacement. There is no revision check: the last write wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceDocumentRequest {
    pub collection: String,
    pub id: DocumentId,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    pub owner_id: Option<OwnerId>,
    pub limit: Option<usize>,
}

impl DocumentFilter {
    pub fn owned_by(owner_id: impl Into<OwnerId>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, document: &StoredDocument) -> bool {
        match &self.owner_id {
            Some(owner_id) => document.owner_id.as_deref() == Some(owner_id.as_str()),
            None => true,
        }
    }
}

pub fn content_hash(payload: &[u8]) -> BlobHash {
    blake3::hash(payload).to_hex().to_string()
}
