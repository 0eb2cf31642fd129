use formforge_graph::FormError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid generation request: {0}")]
    InvalidRequest(String),
    #[error("generator configuration error: {0}")]
    Configuration(String),
    #[error("generator http error: {0}")]
    Http(String),
    #[error("generator returned an empty completion")]
    EmptyCompletion,
    #[error(transparent)]
    Form(#[from] FormError),
}
