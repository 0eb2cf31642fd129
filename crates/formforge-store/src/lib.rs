//! Document and blob storage collaborators for Formforge.
//!
//! Forms and submissions are opaque JSON documents grouped by collection and
//! keyed by store-assigned IDs. Uploaded images live in a content-addressed
//! blob store.

pub mod fs;
pub mod memory;
pub mod store;
pub mod types;

pub use fs::FsDocumentStore;
pub use memory::MemoryDocumentStore;
pub use store::{BlobStore, DocumentStore, StoreError, StoreResult};
pub use types::{
    BlobHash, DocumentFilter, DocumentId, InsertDocumentRequest, OwnerId, ReplaceDocumentRequest,
    StoredDocument, content_hash,
};
