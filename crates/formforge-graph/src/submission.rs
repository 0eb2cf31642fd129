use crate::{Answer, Form, FormError, FormId, QuestionId, QuestionKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub answer: Answer,
}

impl SubmittedAnswer {
    pub fn new(question_id: QuestionId, answer: Answer) -> Self {
        Self {
            question_id,
            answer,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub form_id: FormId,
    pub answers: Vec<SubmittedAnswer>,
    pub submitted_at_ms: u64,
}

impl Submission {
    pub fn new(form_id: impl Into<FormId>, answers: Vec<SubmittedAnswer>) -> Self {
        Self {
            id: None,
            form_id: form_id.into(),
            answers,
            submitted_at_ms: now_unix_ms(),
        }
    }

    /// Answers keyed by question, ready for [`crate::walk`].
    pub fn answer_map(&self) -> BTreeMap<QuestionId, Answer> {
        self.answers
            .iter()
            .map(|entry| (entry.question_id, entry.answer.clone()))
            .collect()
    }
}

pub(crate) fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

fn invalid(message: impl Into<String>) -> FormError {
    FormError::InvalidSubmission(message.into())
}

/// Checks answers against a published form.
///
/// Each answer must name an existing question at most once. Choice answers
/// must pick option texts (one for single-choice, up to `maxSelections` for
/// multiple-choice) and rating answers must be integers on the scale.
pub fn validate_submission(form: &Form, answers: &[SubmittedAnswer]) -> Result<(), FormError> {
    if form.is_draft {
        return Err(invalid("form is a draft and does not accept submissions"));
    }

    let mut answered = BTreeSet::new();
    for entry in answers {
        let Some(question) = form.question(entry.question_id) else {
            return Err(invalid(format!("question {} does not exist", entry.question_id)));
        };
        if !answered.insert(entry.question_id) {
            return Err(invalid(format!(
                "question {} is answered more than once",
                entry.question_id
            )));
        }
        if entry.answer.is_empty() {
            return Err(invalid(format!("answer to question {} is empty", question.id)));
        }

        let values = entry.answer.values();
        match &question.kind {
            QuestionKind::SingleChoice { options } | QuestionKind::MultipleChoice { options, .. } => {
                if let Some(unknown) = values
                    .iter()
                    .find(|value| !options.iter().any(|option| option.text == **value))
                {
                    return Err(invalid(format!(
                        "'{unknown}' is not an option of question {}",
                        question.id
                    )));
                }
                let limit = match &question.kind {
                    QuestionKind::MultipleChoice { max_selections, .. } => *max_selections as usize,
                    _ => 1,
                };
                if values.len() > limit {
                    return Err(invalid(format!(
                        "question {} accepts at most {limit} selection(s)",
                        question.id
                    )));
                }
            }
            QuestionKind::Rating(scale) => {
                let [value] = values.as_slice() else {
                    return Err(invalid(format!("question {} takes one rating", question.id)));
                };
                let rating = value.trim().parse::<i64>().map_err(|_| {
                    invalid(format!("rating '{value}' for question {} is not an integer", question.id))
                })?;
                if rating < scale.min_value || rating > scale.max_value {
                    return Err(invalid(format!(
                        "rating {rating} for question {} is outside {}..={}",
                        question.id, scale.min_value, scale.max_value
                    )));
                }
            }
            QuestionKind::Input { .. } => {
                if values.len() != 1 {
                    return Err(invalid(format!("question {} takes one text answer", question.id)));
                }
            }
        }
    }
    Ok(())
}
