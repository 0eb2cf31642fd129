//! Form generation through a text-completion service.
//!
//! A [`GenerateFormRequest`] becomes a prompt, the completion text is parsed
//! defensively into a candidate and repaired into a well-formed draft.

pub mod completion;
pub mod errors;
pub mod generator;
pub mod http;
pub mod prompt;
pub mod request;

pub use completion::*;
pub use errors::*;
pub use generator::*;
pub use http::*;
pub use prompt::*;
pub use request::*;
