use crate::QuestionId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub question_id: Option<QuestionId>,
    pub target: Option<QuestionId>,
    pub fix: Option<String>,
}

impl Diagnostic {
    pub fn new(rule: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity,
            message: message.into(),
            question_id: None,
            target: None,
            fix: None,
        }
    }

    pub fn with_question_id(mut self, question_id: QuestionId) -> Self {
        self.question_id = Some(question_id);
        self
    }

    pub fn with_target(mut self, target: QuestionId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = Some(fix.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
