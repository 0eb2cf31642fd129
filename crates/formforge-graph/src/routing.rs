use crate::{END_OF_FORM, Form, Question, QuestionId, QuestionType};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Next question for a literal answer; `END_OF_FORM` ends the form.
///
/// The first condition, in authoring order, whose answer equals `answer`
/// exactly wins. Otherwise the default target is returned. Targets are not
/// re-validated.
pub fn next(question: &Question, answer: &str) -> QuestionId {
    question
        .next_question
        .conditions
        .iter()
        .find(|condition| condition.answer == answer)
        .map(|condition| condition.next_id)
        .unwrap_or(question.next_question.default)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Selections(Vec<String>),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn selections<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Selections(values.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(value) => value.is_empty(),
            Self::Selections(values) => values.is_empty(),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Text(value) => vec![value.as_str()],
            Self::Selections(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl<'de> Deserialize<'de> for Answer {
    /// Scalars become `Text`, arrays of scalars become `Selections`.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| {
                    scalar_text(item).ok_or_else(|| D::Error::custom("selection must be a scalar"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Answer::Selections),
            other => scalar_text(other)
                .map(Answer::Text)
                .ok_or_else(|| D::Error::custom("answer must be a scalar or an array")),
        }
    }
}

/// How a multiple-choice answer interacts with transition conditions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiSelectPolicy {
    /// Conditions are ignored; the default target is used.
    #[default]
    DefaultOnly,
    /// Selected values are tried in order; the first that matches a
    /// condition decides.
    FirstSelectedMatch,
}

pub fn next_for_answer(question: &Question, answer: &Answer, policy: MultiSelectPolicy) -> QuestionId {
    let default = question.next_question.default;
    if question.question_type() == QuestionType::MultipleChoice {
        return match policy {
            MultiSelectPolicy::DefaultOnly => default,
            MultiSelectPolicy::FirstSelectedMatch => answer
                .values()
                .into_iter()
                .find_map(|value| {
                    question
                        .next_question
                        .conditions
                        .iter()
                        .find(|condition| condition.answer == value)
                        .map(|condition| condition.next_id)
                })
                .unwrap_or(default),
        };
    }

    match answer {
        Answer::Text(value) => next(question, value),
        Answer::Selections(values) => values
            .first()
            .map(|value| next(question, value))
            .unwrap_or(default),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "questionId", rename_all = "kebab-case")]
pub enum WalkOutcome {
    Completed,
    AwaitingAnswer(QuestionId),
    Cycle(QuestionId),
    DanglingTarget(QuestionId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Walk {
    pub visited: Vec<QuestionId>,
    pub outcome: WalkOutcome,
}

/// Follows the form from its first question using `answers`.
///
/// Stops at the end of the form, at the first question without an answer,
/// at a target that names no question, or when a question would be visited
/// twice.
pub fn walk(form: &Form, answers: &BTreeMap<QuestionId, Answer>, policy: MultiSelectPolicy) -> Walk {
    let mut visited = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = form.first_question().map_or(END_OF_FORM, |question| question.id);

    let outcome = loop {
        if current == END_OF_FORM {
            break WalkOutcome::Completed;
        }
        let Some(question) = form.question(current) else {
            break WalkOutcome::DanglingTarget(current);
        };
        if !seen.insert(current) {
            break WalkOutcome::Cycle(current);
        }
        visited.push(current);

        let Some(answer) = answers.get(&current) else {
            break WalkOutcome::AwaitingAnswer(current);
        };
        let target = next_for_answer(question, answer, policy);
        tracing::trace!(from = current, to = target, "navigated");
        current = target;
    };

    Walk { visited, outcome }
}
