use crate::{END_OF_FORM, QuestionId};

/// Chooses the default next target for a question whose own default is
/// missing or out of range.
pub trait FallbackPolicy: Send + Sync {
    fn name(&self) -> &str;
    /// `total` is the final question count; IDs are already `1..=total`.
    fn default_target(&self, question_id: QuestionId, total: usize) -> QuestionId;
}

/// The successor in authoring order, or end of form for the last question.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequentialFallback;

impl FallbackPolicy for SequentialFallback {
    fn name(&self) -> &str {
        "sequential"
    }

    fn default_target(&self, question_id: QuestionId, total: usize) -> QuestionId {
        if (question_id as usize) < total {
            question_id + 1
        } else {
            END_OF_FORM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_fallback_expected_successor_then_end() {
        let policy = SequentialFallback;
        assert_eq!(policy.default_target(1, 3), 2);
        assert_eq!(policy.default_target(2, 3), 3);
        assert_eq!(policy.default_target(3, 3), END_OF_FORM);
        assert_eq!(policy.default_target(1, 1), END_OF_FORM);
    }
}
