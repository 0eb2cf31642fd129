use crate::Diagnostic;
use formforge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("invalid form: {0}")]
    InvalidForm(InvalidFormReason),
    #[error("invalid submission: {0}")]
    InvalidSubmission(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("form parse error: {0}")]
    Parse(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl FormError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_not_found())
    }
}

/// The two defects repair refuses to fix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvalidFormReason {
    #[error("form name is required")]
    MissingName,
    #[error("form must contain at least one question")]
    NoQuestions,
}

#[derive(Debug, Error, Clone)]
#[error("validation failed with {errors_count} error(s)")]
pub struct ValidationError {
    pub diagnostics: Vec<Diagnostic>,
    pub errors_count: usize,
}

impl ValidationError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        let errors_count = diagnostics.iter().filter(|d| d.is_error()).count();
        Self {
            diagnostics,
            errors_count,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }
}
