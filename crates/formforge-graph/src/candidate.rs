//! Untrusted form records.
//!
//! Candidates come from editors, stored documents and text generators. Every
//! field is optional, integers may arrive as strings, options may arrive as
//! bare strings, and `null` means "absent". Repair turns a candidate into a
//! [`Form`].

use crate::{
    ButtonConfig, ChoiceOption, ClosingMessage, Condition, Diagnostic, Form, FormError, Question,
    QuestionKind, QuestionType, RatingScale, Severity, TransitionRule, ValidationError,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateForm {
    #[serde(
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(rename = "userId", deserialize_with = "lenient_string")]
    pub owner_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_draft: bool,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub theme: String,
    #[serde(deserialize_with = "lenient_string")]
    pub floating_shapes_theme: String,
    #[serde(deserialize_with = "null_as_default")]
    pub questions: Vec<CandidateQuestion>,
    #[serde(deserialize_with = "null_as_default")]
    pub thank_you_message: CandidateClosingMessage,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateQuestion {
    #[serde(deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(rename = "type", deserialize_with = "lenient_string")]
    pub question_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub question: String,
    #[serde(deserialize_with = "lenient_string")]
    pub subtext: String,
    #[serde(deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(deserialize_with = "null_as_default")]
    pub options: Vec<CandidateOption>,
    #[serde(deserialize_with = "lenient_i64")]
    pub max_selections: i64,
    #[serde(deserialize_with = "lenient_string")]
    pub input_type: String,
    #[serde(deserialize_with = "lenient_string")]
    pub placeholder: String,
    #[serde(deserialize_with = "lenient_string")]
    pub validation: String,
    #[serde(deserialize_with = "lenient_opt_i64", skip_serializing_if = "Option::is_none")]
    pub min_value: Option<i64>,
    #[serde(deserialize_with = "lenient_opt_i64", skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
    #[serde(deserialize_with = "lenient_opt_i64", skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Option::is_none")]
    pub show_labels: Option<bool>,
    #[serde(deserialize_with = "lenient_string")]
    pub min_label: String,
    #[serde(deserialize_with = "lenient_string")]
    pub max_label: String,
    #[serde(deserialize_with = "lenient_string")]
    pub icon: String,
    #[serde(deserialize_with = "null_as_default")]
    pub next_question: CandidateTransition,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CandidateOption {
    pub text: String,
    pub icon: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    Full {
        #[serde(default, deserialize_with = "lenient_string")]
        text: String,
        #[serde(default, deserialize_with = "lenient_string")]
        icon: String,
        #[serde(default, deserialize_with = "lenient_string")]
        color: String,
        #[serde(default, deserialize_with = "lenient_string")]
        image: String,
    },
}

impl<'de> Deserialize<'de> for CandidateOption {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match RawOption::deserialize(deserializer)? {
            RawOption::Text(text) => CandidateOption {
                text,
                ..CandidateOption::default()
            },
            RawOption::Number(number) => CandidateOption {
                text: number.to_string(),
                ..CandidateOption::default()
            },
            RawOption::Flag(flag) => CandidateOption {
                text: flag.to_string(),
                ..CandidateOption::default()
            },
            RawOption::Full {
                text,
                icon,
                color,
                image,
            } => CandidateOption {
                text,
                icon,
                color,
                image,
            },
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateTransition {
    #[serde(deserialize_with = "null_as_default")]
    pub conditions: Vec<CandidateCondition>,
    #[serde(deserialize_with = "lenient_i64")]
    pub default: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateCondition {
    #[serde(deserialize_with = "lenient_string")]
    pub answer: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub next_id: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateClosingMessage {
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub subtitle: String,
    #[serde(deserialize_with = "lenient_string")]
    pub icon: String,
    #[serde(deserialize_with = "null_as_default")]
    pub button: CandidateButton,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateButton {
    #[serde(deserialize_with = "lenient_string")]
    pub text: String,
    #[serde(deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(rename = "newTab", alias = "new_tab", deserialize_with = "null_as_default")]
    pub new_tab: bool,
}

impl CandidateForm {
    pub fn from_json_str(raw: &str) -> Result<Self, FormError> {
        serde_json::from_str(raw).map_err(|err| FormError::Parse(err.to_string()))
    }

    pub fn from_json_value(value: Value) -> Result<Self, FormError> {
        serde_json::from_value(value).map_err(|err| FormError::Parse(err.to_string()))
    }
}

fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integer_from_value).unwrap_or(0))
}

fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(integer_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Array(_) | Value::Object(_)) => String::new(),
    })
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = lenient_string(deserializer)?;
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl From<&ChoiceOption> for CandidateOption {
    fn from(option: &ChoiceOption) -> Self {
        Self {
            text: option.text.clone(),
            icon: option.icon.clone(),
            color: option.color.clone().unwrap_or_default(),
            image: option.image.clone().unwrap_or_default(),
        }
    }
}

impl From<&TransitionRule> for CandidateTransition {
    fn from(rule: &TransitionRule) -> Self {
        Self {
            conditions: rule
                .conditions
                .iter()
                .map(|condition| CandidateCondition {
                    answer: condition.answer.clone(),
                    next_id: i64::from(condition.next_id),
                })
                .collect(),
            default: i64::from(rule.default),
        }
    }
}

impl From<&Question> for CandidateQuestion {
    fn from(question: &Question) -> Self {
        let mut candidate = CandidateQuestion {
            id: i64::from(question.id),
            question_type: question.question_type().as_str().to_string(),
            question: question.question.clone(),
            subtext: question.subtext.clone(),
            image: question.image.clone(),
            next_question: CandidateTransition::from(&question.next_question),
            ..CandidateQuestion::default()
        };

        match &question.kind {
            QuestionKind::SingleChoice { options } => {
                candidate.options = options.iter().map(CandidateOption::from).collect();
            }
            QuestionKind::MultipleChoice {
                options,
                max_selections,
            } => {
                candidate.options = options.iter().map(CandidateOption::from).collect();
                candidate.max_selections = i64::from(*max_selections);
            }
            QuestionKind::Input {
                input_type,
                placeholder,
                validation,
            } => {
                candidate.input_type = input_type.clone();
                candidate.placeholder = placeholder.clone();
                candidate.validation = validation.clone();
            }
            QuestionKind::Rating(scale) => {
                candidate.min_value = Some(scale.min_value);
                candidate.max_value = Some(scale.max_value);
                candidate.step = Some(scale.step);
                candidate.show_labels = Some(scale.show_labels);
                candidate.min_label = scale.min_label.clone().unwrap_or_default();
                candidate.max_label = scale.max_label.clone().unwrap_or_default();
                candidate.icon = scale.icon.clone();
            }
        }
        candidate
    }
}

impl From<&Form> for CandidateForm {
    fn from(form: &Form) -> Self {
        let message = &form.thank_you_message;
        Self {
            id: form.id.clone(),
            owner_id: form.owner_id.clone(),
            is_draft: form.is_draft,
            name: form.name.clone(),
            theme: form.theme.clone(),
            floating_shapes_theme: form.floating_shapes_theme.clone(),
            questions: form.questions.iter().map(CandidateQuestion::from).collect(),
            thank_you_message: CandidateClosingMessage {
                title: message.title.clone(),
                subtitle: message.subtitle.clone(),
                icon: message.icon.clone(),
                button: CandidateButton {
                    text: message.button.text.clone(),
                    url: message.button.url.clone(),
                    new_tab: message.button.new_tab,
                },
            },
        }
    }
}

impl From<Form> for CandidateForm {
    fn from(form: Form) -> Self {
        Self::from(&form)
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

fn conversion_error(question_id: i64, message: String) -> FormError {
    let mut diagnostic = Diagnostic::new("candidate_conversion", Severity::Error, message);
    if let Ok(id) = u32::try_from(question_id) {
        diagnostic = diagnostic.with_question_id(id);
    }
    FormError::Validation(ValidationError::new(vec![diagnostic]))
}

fn question_id(raw: i64, context: &str) -> Result<u32, FormError> {
    u32::try_from(raw)
        .map_err(|_| conversion_error(raw, format!("{context} {raw} is not a valid question id")))
}

impl TryFrom<CandidateQuestion> for Question {
    type Error = FormError;

    /// Converts an already repaired candidate. Payload fields that do not
    /// belong to the question type are dropped.
    fn try_from(candidate: CandidateQuestion) -> Result<Self, Self::Error> {
        let id = question_id(candidate.id, "question id")?;
        let question_type = QuestionType::parse(&candidate.question_type).ok_or_else(|| {
            conversion_error(
                candidate.id,
                format!("unknown question type '{}'", candidate.question_type),
            )
        })?;

        let options: Vec<ChoiceOption> = candidate
            .options
            .into_iter()
            .map(|option| ChoiceOption {
                text: option.text,
                icon: option.icon,
                color: non_empty(option.color),
                image: non_empty(option.image),
            })
            .collect();

        let kind = match question_type {
            QuestionType::SingleChoice => QuestionKind::SingleChoice { options },
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice {
                options,
                max_selections: u32::try_from(candidate.max_selections).map_err(|_| {
                    conversion_error(
                        candidate.id,
                        format!("maxSelections {} is out of range", candidate.max_selections),
                    )
                })?,
            },
            QuestionType::Input => QuestionKind::Input {
                input_type: candidate.input_type,
                placeholder: candidate.placeholder,
                validation: candidate.validation,
            },
            QuestionType::Rating => {
                let fallback = RatingScale::default();
                QuestionKind::Rating(RatingScale {
                    min_value: candidate.min_value.unwrap_or(fallback.min_value),
                    max_value: candidate.max_value.unwrap_or(fallback.max_value),
                    step: candidate.step.unwrap_or(fallback.step),
                    show_labels: candidate.show_labels.unwrap_or(fallback.show_labels),
                    min_label: non_empty(candidate.min_label),
                    max_label: non_empty(candidate.max_label),
                    icon: candidate.icon,
                })
            }
        };

        let mut conditions = Vec::with_capacity(candidate.next_question.conditions.len());
        for condition in candidate.next_question.conditions {
            conditions.push(Condition {
                next_id: question_id(condition.next_id, "condition target")?,
                answer: condition.answer,
            });
        }

        Ok(Question {
            id,
            kind,
            question: candidate.question,
            subtext: candidate.subtext,
            image: candidate.image,
            next_question: TransitionRule {
                conditions,
                default: question_id(candidate.next_question.default, "default target")?,
            },
        })
    }
}

impl TryFrom<CandidateForm> for Form {
    type Error = FormError;

    fn try_from(candidate: CandidateForm) -> Result<Self, Self::Error> {
        let questions = candidate
            .questions
            .into_iter()
            .map(Question::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let message = candidate.thank_you_message;

        Ok(Form {
            id: candidate.id,
            owner_id: candidate.owner_id,
            is_draft: candidate.is_draft,
            name: candidate.name,
            theme: candidate.theme,
            floating_shapes_theme: candidate.floating_shapes_theme,
            questions,
            thank_you_message: ClosingMessage {
                title: message.title,
                subtitle: message.subtitle,
                icon: message.icon,
                button: ButtonConfig {
                    text: message.button.text,
                    url: message.button.url,
                    new_tab: message.button.new_tab,
                },
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn candidate_deserialize_loose_generator_values_expected_defaults() {
        let candidate = CandidateForm::from_json_value(json!({
            "name": "Survey",
            "theme": null,
            "questions": [
                {
                    "id": "2",
                    "type": "single-choice",
                    "question": "Pick one",
                    "options": ["Red", { "text": "Blue", "icon": "🔵" }],
                    "nextQuestion": { "conditions": [{ "answer": 5, "nextId": "3" }] }
                },
                { "id": 7.0, "type": "rating", "minValue": "1", "maxValue": null },
                { "id": 8, "type": "single-choice", "options": [1, 2.5, true] }
            ],
            "thankYouMessage": null
        }))
        .expect("candidate should deserialize");

        assert_eq!(candidate.name, "Survey");
        assert_eq!(candidate.theme, "");
        assert_eq!(candidate.questions[0].id, 2);
        assert_eq!(candidate.questions[0].options[0].text, "Red");
        assert_eq!(candidate.questions[0].options[1].icon, "🔵");
        assert_eq!(candidate.questions[0].next_question.conditions[0].answer, "5");
        assert_eq!(candidate.questions[0].next_question.conditions[0].next_id, 3);
        assert_eq!(candidate.questions[0].next_question.default, 0);
        assert_eq!(candidate.questions[1].id, 7);
        assert_eq!(candidate.questions[1].min_value, Some(1));
        assert_eq!(candidate.questions[1].max_value, None);
        let numeric: Vec<&str> = candidate.questions[2]
            .options
            .iter()
            .map(|option| option.text.as_str())
            .collect();
        assert_eq!(numeric, vec!["1", "2.5", "true"]);
        assert_eq!(candidate.thank_you_message, CandidateClosingMessage::default());
    }

    #[test]
    fn candidate_from_invalid_json_expected_parse_error() {
        let error = CandidateForm::from_json_str("{\"name\": ").expect_err("parse should fail");
        assert!(matches!(error, FormError::Parse(_)));
    }

    #[test]
    fn question_try_from_unknown_type_expected_validation_error() {
        let candidate = CandidateQuestion {
            id: 1,
            question_type: "slider".to_string(),
            ..CandidateQuestion::default()
        };

        let error = Question::try_from(candidate).expect_err("unknown type should fail");
        assert!(matches!(error, FormError::Validation(_)));
    }

    #[test]
    fn question_try_from_negative_target_expected_validation_error() {
        let mut candidate = CandidateQuestion {
            id: 1,
            question_type: "input".to_string(),
            ..CandidateQuestion::default()
        };
        candidate.next_question.default = -4;

        assert!(Question::try_from(candidate).is_err());
    }
}
