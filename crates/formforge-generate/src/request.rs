use crate::GenerateError;
use serde::{Deserialize, Serialize};

pub const MIN_QUESTIONS: u32 = 1;
pub const MAX_QUESTIONS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFormRequest {
    pub topic: String,
    pub form_type: String,
    pub num_questions: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferences: Vec<String>,
}

impl GenerateFormRequest {
    pub fn new(topic: impl Into<String>, form_type: impl Into<String>, num_questions: u32) -> Self {
        Self {
            topic: topic.into(),
            form_type: form_type.into(),
            num_questions,
            preferences: Vec::new(),
        }
    }

    pub fn with_preference(mut self, preference: impl Into<String>) -> Self {
        self.preferences.push(preference.into());
        self
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.topic.trim().is_empty() {
            return Err(GenerateError::InvalidRequest("topic is required".to_string()));
        }
        if self.form_type.trim().is_empty() {
            return Err(GenerateError::InvalidRequest(
                "form type is required".to_string(),
            ));
        }
        if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&self.num_questions) {
            return Err(GenerateError::InvalidRequest(format!(
                "numQuestions must be between {MIN_QUESTIONS} and {MAX_QUESTIONS}, got {}",
                self.num_questions
            )));
        }
        Ok(())
    }
}
