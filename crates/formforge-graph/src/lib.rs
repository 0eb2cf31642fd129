//! Branching form definitions for Formforge.
//!
//! A form is a directed graph of questions joined by answer-conditioned
//! transitions. Candidates from editors or text generators go through
//! parse -> repair -> validate before they are stored or navigated.

pub mod candidate;
pub mod diagnostics;
pub mod errors;
pub mod fallback;
pub mod lifecycle;
pub mod lint;
pub mod model;
pub mod parse;
pub mod repair;
pub mod routing;
pub mod storage;
pub mod submission;

pub use candidate::*;
pub use diagnostics::*;
pub use errors::*;
pub use fallback::*;
pub use lifecycle::*;
pub use lint::*;
pub use model::*;
pub use parse::*;
pub use repair::*;
pub use routing::*;
pub use storage::*;
pub use submission::*;
