//! Form persistence on top of `formforge-store`.
//!
//! Forms are stored as JSON documents owned by their user, submissions as
//! JSON documents owned by their form, and uploaded images as blobs keyed by
//! content hash. Every form is repaired before it is written.

use crate::{
    CandidateForm, Form, FormError, RepairOptions, Submission, SubmittedAnswer, repair_with,
    validate_submission,
};
use formforge_store::{
    BlobHash, BlobStore, DocumentFilter, DocumentStore, InsertDocumentRequest,
    ReplaceDocumentRequest, StoreError, StoredDocument,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const FORMS_COLLECTION: &str = "forms";
pub const SUBMISSIONS_COLLECTION: &str = "submissions";

pub const MIN_IMAGE_BYTES: usize = 1 << 10;
pub const MAX_IMAGE_BYTES: usize = 10 << 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub id: BlobHash,
    pub content_type: String,
    pub size: usize,
}

/// Content type from the leading magic bytes, for the formats accepted as
/// question images.
pub fn sniff_image_type(raw_bytes: &[u8]) -> Option<&'static str> {
    if raw_bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if raw_bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if raw_bytes.starts_with(b"GIF87a") || raw_bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if raw_bytes.len() >= 12 && &raw_bytes[..4] == b"RIFF" && &raw_bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

#[derive(Clone, Debug)]
pub struct FormService<S, B> {
    documents: S,
    blobs: B,
    repair_options: RepairOptions,
}

impl<S, B> FormService<S, B>
where
    S: DocumentStore,
    B: BlobStore,
{
    pub fn new(documents: S, blobs: B) -> Self {
        Self {
            documents,
            blobs,
            repair_options: RepairOptions::default(),
        }
    }

    /// Options used for every save. Empty drafts are always allowed.
    pub fn with_repair_options(mut self, options: RepairOptions) -> Self {
        self.repair_options = options;
        self
    }

    pub fn documents(&self) -> &S {
        &self.documents
    }

    fn save_options(&self) -> RepairOptions {
        self.repair_options.clone().allow_empty_draft(true)
    }

    /// Repairs and stores a new form. New forms always start as drafts owned
    /// by `owner_id`.
    pub async fn create_form(
        &self,
        owner_id: &str,
        mut candidate: CandidateForm,
    ) -> Result<Form, FormError> {
        candidate.id = None;
        candidate.owner_id = owner_id.to_string();
        candidate.is_draft = true;
        let mut form = repair_with(candidate, &self.save_options())?;

        let stored = self
            .documents
            .insert_document(InsertDocumentRequest {
                collection: FORMS_COLLECTION.to_string(),
                owner_id: Some(owner_id.to_string()),
                payload: encode(&form)?,
            })
            .await?;
        form.id = Some(stored.id.clone());
        tracing::info!(form_id = %stored.id, owner_id, "form created");
        Ok(form)
    }

    pub async fn get_form(&self, form_id: &str) -> Result<Form, FormError> {
        let stored = self
            .documents
            .get_document(FORMS_COLLECTION, &form_id.to_string())
            .await?;
        decode_form(&stored)
    }

    pub async fn list_forms(&self, owner_id: &str) -> Result<Vec<Form>, FormError> {
        self.documents
            .list_documents(FORMS_COLLECTION, &DocumentFilter::owned_by(owner_id))
            .await?
            .iter()
            .map(decode_form)
            .collect()
    }

    /// Replaces the whole form. The ID, owner and draft flag of the stored
    /// form are kept; the draft flag only changes through `toggle_draft`.
    pub async fn update_form(
        &self,
        form_id: &str,
        owner_id: &str,
        mut candidate: CandidateForm,
    ) -> Result<Form, FormError> {
        let current = self.owned_form(form_id, owner_id).await?;
        candidate.id = Some(form_id.to_string());
        candidate.owner_id = owner_id.to_string();
        candidate.is_draft = current.is_draft;
        let form = repair_with(candidate, &self.save_options())?;

        self.replace(form_id, &form).await?;
        tracing::info!(form_id, owner_id, "form updated");
        Ok(form)
    }

    pub async fn delete_form(&self, form_id: &str, owner_id: &str) -> Result<(), FormError> {
        self.owned_form(form_id, owner_id).await?;
        self.documents
            .delete_document(FORMS_COLLECTION, &form_id.to_string())
            .await?;
        tracing::info!(form_id, owner_id, "form deleted");
        Ok(())
    }

    /// Flips draft and published. Only the owner can toggle.
    pub async fn toggle_draft(&self, form_id: &str, owner_id: &str) -> Result<Form, FormError> {
        let mut form = self.owned_form(form_id, owner_id).await?;
        let state = form.toggle_state();
        self.replace(form_id, &form).await?;
        tracing::info!(form_id, owner_id, %state, "form state toggled");
        Ok(form)
    }

    pub async fn submit(
        &self,
        form_id: &str,
        answers: Vec<SubmittedAnswer>,
    ) -> Result<Submission, FormError> {
        let form = self.get_form(form_id).await?;
        validate_submission(&form, &answers)?;

        let mut submission = Submission::new(form_id, answers);
        let stored = self
            .documents
            .insert_document(InsertDocumentRequest {
                collection: SUBMISSIONS_COLLECTION.to_string(),
                owner_id: Some(form_id.to_string()),
                payload: encode(&submission)?,
            })
            .await?;
        submission.id = Some(stored.id);
        tracing::info!(form_id, answers = submission.answers.len(), "submission stored");
        Ok(submission)
    }

    /// Submissions of a form, readable only by the form's owner.
    pub async fn list_submissions(
        &self,
        form_id: &str,
        owner_id: &str,
    ) -> Result<Vec<Submission>, FormError> {
        self.owned_form(form_id, owner_id).await?;
        self.documents
            .list_documents(SUBMISSIONS_COLLECTION, &DocumentFilter::owned_by(form_id))
            .await?
            .iter()
            .map(|stored| -> Result<Submission, FormError> {
                let mut submission: Submission = decode(stored)?;
                submission.id = Some(stored.id.clone());
                Ok(submission)
            })
            .collect()
    }

    pub async fn put_image(&self, raw_bytes: &[u8]) -> Result<ImageRef, FormError> {
        if raw_bytes.len() < MIN_IMAGE_BYTES || raw_bytes.len() > MAX_IMAGE_BYTES {
            return Err(FormError::InvalidImage(format!(
                "image size {} is outside {MIN_IMAGE_BYTES}..={MAX_IMAGE_BYTES} bytes",
                raw_bytes.len()
            )));
        }
        let content_type = sniff_image_type(raw_bytes).ok_or_else(|| {
            FormError::InvalidImage("only jpeg, png, gif and webp images are accepted".to_string())
        })?;

        let id = self.blobs.put_blob(raw_bytes).await?;
        tracing::debug!(image_id = %id, content_type, size = raw_bytes.len(), "image stored");
        Ok(ImageRef {
            id,
            content_type: content_type.to_string(),
            size: raw_bytes.len(),
        })
    }

    pub async fn get_image(&self, image_id: &str) -> Result<Option<Vec<u8>>, FormError> {
        Ok(self.blobs.get_blob(&image_id.to_string()).await?)
    }

    async fn owned_form(&self, form_id: &str, owner_id: &str) -> Result<Form, FormError> {
        let form = self.get_form(form_id).await?;
        if form.owner_id != owner_id {
            // Someone else's form is indistinguishable from a missing one.
            return Err(form_not_found(form_id));
        }
        Ok(form)
    }

    async fn replace(&self, form_id: &str, form: &Form) -> Result<(), FormError> {
        self.documents
            .replace_document(ReplaceDocumentRequest {
                collection: FORMS_COLLECTION.to_string(),
                id: form_id.to_string(),
                payload: encode(form)?,
            })
            .await?;
        Ok(())
    }
}

fn form_not_found(form_id: &str) -> FormError {
    FormError::Storage(StoreError::NotFound {
        resource: "form",
        id: form_id.to_string(),
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, FormError> {
    serde_json::to_vec(value).map_err(|err| StoreError::Serialization(err.to_string()).into())
}

fn decode<T: DeserializeOwned>(stored: &StoredDocument) -> Result<T, FormError> {
    serde_json::from_slice(&stored.payload)
        .map_err(|err| StoreError::Serialization(err.to_string()).into())
}

fn decode_form(stored: &StoredDocument) -> Result<Form, FormError> {
    let mut form: Form = decode(stored)?;
    form.id = Some(stored.id.clone());
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut raw = b"\x89PNG\r\n\x1a\n".to_vec();
        raw.resize(MIN_IMAGE_BYTES, 0);
        raw
    }

    #[test]
    fn sniff_image_type_known_magic_expected_content_type() {
        assert_eq!(sniff_image_type(&png_bytes()), Some("image/png"));
        assert_eq!(sniff_image_type(b"\xFF\xD8\xFF\xE0rest"), Some("image/jpeg"));
        assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_type(b"%PDF-1.7"), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn put_image_expected_blob_roundtrip_and_size_checks() {
        let store = formforge_store::MemoryDocumentStore::new();
        let service = FormService::new(store.clone(), store);

        let image = service
            .put_image(&png_bytes())
            .await
            .expect("image should be stored");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(
            service.get_image(&image.id).await.expect("get should succeed"),
            Some(png_bytes())
        );

        let small = service.put_image(b"\x89PNG\r\n\x1a\n").await;
        assert!(matches!(small, Err(FormError::InvalidImage(_))));
        let unknown = service.put_image(&vec![0u8; MIN_IMAGE_BYTES]).await;
        assert!(matches!(unknown, Err(FormError::InvalidImage(_))));
    }
}
