use crate::Form;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a form. New forms start as drafts; the only transition is
/// an explicit toggle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormState {
    #[default]
    Draft,
    Published,
}

impl FormState {
    pub fn from_draft_flag(is_draft: bool) -> Self {
        if is_draft { Self::Draft } else { Self::Published }
    }

    pub fn is_draft(self) -> bool {
        self == Self::Draft
    }

    pub fn toggle(self) -> Self {
        match self {
            Self::Draft => Self::Published,
            Self::Published => Self::Draft,
        }
    }
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Draft => "draft",
            Self::Published => "published",
        })
    }
}

impl Form {
    pub fn state(&self) -> FormState {
        FormState::from_draft_flag(self.is_draft)
    }

    /// Flips draft and published, returning the new state.
    pub fn toggle_state(&mut self) -> FormState {
        let next = self.state().toggle();
        self.is_draft = next.is_draft();
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_state_default_expected_draft() {
        assert_eq!(FormState::default(), FormState::Draft);
    }

    #[test]
    fn form_state_toggle_twice_expected_original() {
        let state = FormState::Draft;
        assert_eq!(state.toggle(), FormState::Published);
        assert_eq!(state.toggle().toggle(), FormState::Draft);
        assert_eq!(FormState::Published.to_string(), "published");
    }
}
