use serde::{Deserialize, Serialize};
use std::fmt;

pub type FormId = String;
pub type OwnerId = String;
pub type QuestionId = u32;

/// Transition target meaning "no further question".
pub const END_OF_FORM: QuestionId = 0;

/// Values substituted for missing or placeholder fields during repair.
pub mod defaults {
    pub const THEME: &str = "default";
    pub const FLOATING_SHAPES_THEME: &str = "default";
    pub const SUBTEXT: &str = "Please provide your answer";
    /// Image path the generator is prompted with; treated as "no image".
    pub const PLACEHOLDER_IMAGE: &str = "/img/demo.jpg";
    pub const INPUT_TYPE: &str = "text";
    pub const INPUT_PLACEHOLDER: &str = "Enter your answer here";
    pub const INPUT_VALIDATION: &str = "/.+/";
    pub const PLACEHOLDER_OPTIONS: [(&str, &str); 2] = [("Option 1", "✨"), ("Option 2", "🌟")];
    pub const RATING_MIN: i64 = 1;
    pub const RATING_MAX: i64 = 5;
    pub const RATING_STEP: i64 = 1;
    pub const RATING_ICON: &str = "⭐️";
    pub const CLOSING_TITLE: &str = "Thank You!";
    pub const CLOSING_SUBTITLE: &str = "We appreciate your feedback";
    pub const CLOSING_ICON: &str = "✨";
    pub const CLOSING_BUTTON_TEXT: &str = "Continue";
    pub const CLOSING_BUTTON_URL: &str = "/";

    pub fn image_for(question_type: &str) -> String {
        format!("/img/default/{question_type}.jpg")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    SingleChoice,
    MultipleChoice,
    Input,
    Rating,
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        Self::SingleChoice,
        Self::MultipleChoice,
        Self::Input,
        Self::Rating,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleChoice => "single-choice",
            Self::MultipleChoice => "multiple-choice",
            Self::Input => "input",
            Self::Rating => "rating",
        }
    }

    /// Accepts the canonical tag, ignoring case, surrounding whitespace and
    /// `_` versus `-`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
    }

    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub text: String,
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ChoiceOption {
    pub fn new(text: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            icon: icon.into(),
            color: None,
            image: None,
        }
    }

    pub fn placeholders() -> Vec<ChoiceOption> {
        defaults::PLACEHOLDER_OPTIONS
            .iter()
            .map(|(text, icon)| ChoiceOption::new(*text, *icon))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingScale {
    pub min_value: i64,
    pub max_value: i64,
    pub step: i64,
    pub show_labels: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_label: Option<String>,
    pub icon: String,
}

impl Default for RatingScale {
    fn default() -> Self {
        Self {
            min_value: defaults::RATING_MIN,
            max_value: defaults::RATING_MAX,
            step: defaults::RATING_STEP,
            show_labels: true,
            min_label: None,
            max_label: None,
            icon: defaults::RATING_ICON.to_string(),
        }
    }
}

/// Type-specific question payload, tagged by `type` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum QuestionKind {
    SingleChoice {
        options: Vec<ChoiceOption>,
    },
    MultipleChoice {
        options: Vec<ChoiceOption>,
        max_selections: u32,
    },
    Input {
        input_type: String,
        placeholder: String,
        validation: String,
    },
    Rating(RatingScale),
}

impl QuestionKind {
    pub fn question_type(&self) -> QuestionType {
        match self {
            Self::SingleChoice { .. } => QuestionType::SingleChoice,
            Self::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Self::Input { .. } => QuestionType::Input,
            Self::Rating(_) => QuestionType::Rating,
        }
    }

    pub fn options(&self) -> &[ChoiceOption] {
        match self {
            Self::SingleChoice { options } | Self::MultipleChoice { options, .. } => {
                options.as_slice()
            }
            Self::Input { .. } | Self::Rating(_) => &[],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub answer: String,
    pub next_id: QuestionId,
}

impl Condition {
    pub fn new(answer: impl Into<String>, next_id: QuestionId) -> Self {
        Self {
            answer: answer.into(),
            next_id,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub default: QuestionId,
}

impl TransitionRule {
    pub fn to(default: QuestionId) -> Self {
        Self {
            conditions: Vec::new(),
            default,
        }
    }

    pub fn with_condition(mut self, answer: impl Into<String>, next_id: QuestionId) -> Self {
        self.conditions.push(Condition::new(answer, next_id));
        self
    }

    pub fn targets(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.conditions
            .iter()
            .map(|condition| condition.next_id)
            .chain(std::iter::once(self.default))
            .filter(|target| *target != END_OF_FORM)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub question: String,
    pub subtext: String,
    pub image: String,
    pub next_question: TransitionRule,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonConfig {
    pub text: String,
    pub url: String,
    #[serde(rename = "newTab", alias = "new_tab", default)]
    pub new_tab: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingMessage {
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub button: ButtonConfig,
}

impl ClosingMessage {
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty()
            && !self.subtitle.is_empty()
            && !self.icon.is_empty()
            && !self.button.text.is_empty()
            && !self.button.url.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FormId>,
    #[serde(rename = "userId", default)]
    pub owner_id: OwnerId,
    pub is_draft: bool,
    pub name: String,
    pub theme: String,
    pub floating_shapes_theme: String,
    pub questions: Vec<Question>,
    pub thank_you_message: ClosingMessage,
}

impl Form {
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn first_question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn contains_question(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }
}
