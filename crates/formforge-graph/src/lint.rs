use crate::{Diagnostic, END_OF_FORM, Form, QuestionKind, Severity, ValidationError};
use std::collections::{BTreeSet, VecDeque};

pub trait LintRule {
    fn name(&self) -> &str;
    fn apply(&self, form: &Form) -> Vec<Diagnostic>;
}

pub fn validate(form: &Form, extra_rules: &[&dyn LintRule]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    diagnostics.extend(rule_name_present(form));
    diagnostics.extend(rule_questions_present(form));
    diagnostics.extend(rule_ids_dense(form));
    diagnostics.extend(rule_transition_target_exists(form));
    diagnostics.extend(rule_default_chain(form));
    diagnostics.extend(rule_choice_options_present(form));
    diagnostics.extend(rule_max_selections_valid(form));
    diagnostics.extend(rule_input_fields_present(form));
    diagnostics.extend(rule_rating_bounds_valid(form));
    diagnostics.extend(rule_styles_present(form));
    diagnostics.extend(rule_closing_message_complete(form));
    diagnostics.extend(rule_question_text_present(form));
    diagnostics.extend(rule_condition_answer_known(form));
    diagnostics.extend(rule_reachability(form));

    for rule in extra_rules {
        diagnostics.extend(rule.apply(form));
    }

    diagnostics
}

pub fn validate_or_raise(
    form: &Form,
    extra_rules: &[&dyn LintRule],
) -> Result<Vec<Diagnostic>, ValidationError> {
    let diagnostics = validate(form, extra_rules);
    if diagnostics.iter().any(Diagnostic::is_error) {
        return Err(ValidationError::new(diagnostics));
    }
    Ok(diagnostics)
}

/// True when the built-in rules report no errors.
pub fn is_well_formed(form: &Form) -> bool {
    !validate(form, &[]).iter().any(Diagnostic::is_error)
}

fn rule_name_present(form: &Form) -> Vec<Diagnostic> {
    if form.name.is_empty() {
        vec![
            Diagnostic::new("name_present", Severity::Error, "form name is required")
                .with_fix("give the form a display name"),
        ]
    } else {
        Vec::new()
    }
}

fn rule_questions_present(form: &Form) -> Vec<Diagnostic> {
    if !form.questions.is_empty() {
        return Vec::new();
    }
    let severity = if form.is_draft {
        Severity::Warning
    } else {
        Severity::Error
    };
    vec![Diagnostic::new(
        "questions_present",
        severity,
        "form must contain at least one question",
    )]
}

fn rule_ids_dense(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (index, question) in form.questions.iter().enumerate() {
        let expected = index as u32 + 1;
        if question.id != expected {
            diagnostics.push(
                Diagnostic::new(
                    "ids_dense",
                    Severity::Error,
                    format!(
                        "question at position {expected} has id {}; ids must be 1..=N in authoring order",
                        question.id
                    ),
                )
                .with_question_id(question.id)
                .with_fix(format!("renumber the question to {expected}")),
            );
        }
    }
    diagnostics
}

fn rule_transition_target_exists(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for question in &form.questions {
        for target in question.next_question.targets() {
            if !form.contains_question(target) {
                diagnostics.push(
                    Diagnostic::new(
                        "transition_target_exists",
                        Severity::Error,
                        format!("transition target {target} does not exist"),
                    )
                    .with_question_id(question.id)
                    .with_target(target),
                );
            }
        }
    }
    diagnostics
}

fn rule_default_chain(form: &Form) -> Vec<Diagnostic> {
    let last_index = form.questions.len().saturating_sub(1);
    let mut diagnostics = Vec::new();
    for (index, question) in form.questions.iter().enumerate() {
        if index != last_index && question.next_question.default == END_OF_FORM {
            diagnostics.push(
                Diagnostic::new(
                    "default_chain",
                    Severity::Error,
                    "only the last question may end the form by default",
                )
                .with_question_id(question.id)
                .with_fix("point the default at the next question"),
            );
        }
    }
    diagnostics
}

fn rule_choice_options_present(form: &Form) -> Vec<Diagnostic> {
    form.questions
        .iter()
        .filter(|question| question.question_type().is_choice())
        .filter(|question| question.kind.options().is_empty())
        .map(|question| {
            Diagnostic::new(
                "choice_options_present",
                Severity::Error,
                "choice question has no options",
            )
            .with_question_id(question.id)
        })
        .collect()
}

fn rule_max_selections_valid(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for question in &form.questions {
        if let QuestionKind::MultipleChoice { max_selections, .. } = &question.kind {
            if *max_selections < 1 {
                diagnostics.push(
                    Diagnostic::new(
                        "max_selections_valid",
                        Severity::Error,
                        "maxSelections must be at least 1",
                    )
                    .with_question_id(question.id),
                );
            }
        }
    }
    diagnostics
}

fn rule_input_fields_present(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for question in &form.questions {
        let QuestionKind::Input {
            input_type,
            placeholder,
            validation,
        } = &question.kind
        else {
            continue;
        };
        for (field, value) in [
            ("inputType", input_type),
            ("placeholder", placeholder),
            ("validation", validation),
        ] {
            if value.is_empty() {
                diagnostics.push(
                    Diagnostic::new(
                        "input_fields_present",
                        Severity::Error,
                        format!("input question is missing {field}"),
                    )
                    .with_question_id(question.id),
                );
            }
        }
    }
    diagnostics
}

fn rule_rating_bounds_valid(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for question in &form.questions {
        let QuestionKind::Rating(scale) = &question.kind else {
            continue;
        };
        if scale.min_value >= scale.max_value {
            diagnostics.push(
                Diagnostic::new(
                    "rating_bounds_valid",
                    Severity::Error,
                    format!(
                        "rating minValue {} must be below maxValue {}",
                        scale.min_value, scale.max_value
                    ),
                )
                .with_question_id(question.id),
            );
        }
        if scale.step <= 0 {
            diagnostics.push(
                Diagnostic::new(
                    "rating_bounds_valid",
                    Severity::Error,
                    "rating step must be positive",
                )
                .with_question_id(question.id),
            );
        }
    }
    diagnostics
}

fn rule_styles_present(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    if form.theme.is_empty() {
        diagnostics.push(Diagnostic::new(
            "styles_present",
            Severity::Error,
            "theme is empty",
        ));
    }
    if form.floating_shapes_theme.is_empty() {
        diagnostics.push(Diagnostic::new(
            "styles_present",
            Severity::Error,
            "floatingShapesTheme is empty",
        ));
    }
    diagnostics
}

fn rule_closing_message_complete(form: &Form) -> Vec<Diagnostic> {
    if form.thank_you_message.is_complete() {
        Vec::new()
    } else {
        vec![Diagnostic::new(
            "closing_message_complete",
            Severity::Error,
            "thank-you message has empty fields",
        )]
    }
}

fn rule_question_text_present(form: &Form) -> Vec<Diagnostic> {
    form.questions
        .iter()
        .filter(|question| question.question.trim().is_empty())
        .map(|question| {
            Diagnostic::new(
                "question_text_present",
                Severity::Warning,
                "question text is empty",
            )
            .with_question_id(question.id)
        })
        .collect()
}

fn rule_condition_answer_known(form: &Form) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for question in &form.questions {
        if !question.question_type().is_choice() {
            continue;
        }
        let options = question.kind.options();
        for condition in &question.next_question.conditions {
            if !options.iter().any(|option| option.text == condition.answer) {
                diagnostics.push(
                    Diagnostic::new(
                        "condition_answer_known",
                        Severity::Warning,
                        format!(
                            "condition answer '{}' matches no option text",
                            condition.answer
                        ),
                    )
                    .with_question_id(question.id)
                    .with_target(condition.next_id),
                );
            }
        }
    }
    diagnostics
}

fn rule_reachability(form: &Form) -> Vec<Diagnostic> {
    let Some(first) = form.first_question() else {
        return Vec::new();
    };

    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(first.id);
    queue.push_back(first.id);

    while let Some(question_id) = queue.pop_front() {
        let Some(question) = form.question(question_id) else {
            continue;
        };
        for target in question.next_question.targets() {
            if visited.insert(target) {
                queue.push_back(target);
            }
        }
    }

    form.questions
        .iter()
        .filter(|question| !visited.contains(&question.id))
        .map(|question| {
            Diagnostic::new(
                "reachability",
                Severity::Warning,
                "question is unreachable from the first question",
            )
            .with_question_id(question.id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_form() -> Form {
        serde_json::from_value(json!({
            "isDraft": false,
            "name": "Coffee",
            "theme": "default",
            "floatingShapesTheme": "default",
            "questions": [
                {
                    "id": 1, "type": "single-choice", "question": "Coffee or tea?",
                    "subtext": "s", "image": "i",
                    "options": [{ "text": "Coffee", "icon": "☕" }, { "text": "Tea", "icon": "🍵" }],
                    "nextQuestion": { "conditions": [{ "answer": "Tea", "nextId": 3 }], "default": 2 }
                },
                {
                    "id": 2, "type": "rating", "question": "How strong?", "subtext": "s", "image": "i",
                    "minValue": 1, "maxValue": 5, "step": 1, "showLabels": true, "icon": "⭐️",
                    "nextQuestion": { "conditions": [], "default": 3 }
                },
                {
                    "id": 3, "type": "input", "question": "Anything else?", "subtext": "s", "image": "i",
                    "inputType": "text", "placeholder": "p", "validation": "/.+/",
                    "nextQuestion": { "conditions": [], "default": 0 }
                }
            ],
            "thankYouMessage": {
                "title": "t", "subtitle": "s", "icon": "✨",
                "button": { "text": "Continue", "url": "/", "newTab": false }
            }
        }))
        .expect("sample form should deserialize")
    }

    fn has_rule(diagnostics: &[Diagnostic], rule: &str, severity: Severity) -> bool {
        diagnostics
            .iter()
            .any(|d| d.rule == rule && d.severity == severity)
    }

    #[test]
    fn validate_well_formed_form_expected_no_diagnostics() {
        let form = sample_form();
        assert_eq!(validate(&form, &[]), Vec::new());
        assert!(is_well_formed(&form));
    }

    #[test]
    fn validate_dangling_target_expected_error() {
        let mut form = sample_form();
        form.questions[0].next_question.conditions[0].next_id = 9;

        let diagnostics = validate(&form, &[]);
        let dangling = diagnostics
            .iter()
            .find(|d| d.rule == "transition_target_exists")
            .expect("dangling target should be reported");
        assert_eq!(dangling.question_id, Some(1));
        assert_eq!(dangling.target, Some(9));
        assert!(!is_well_formed(&form));
    }

    #[test]
    fn validate_middle_question_ending_form_expected_default_chain_error() {
        let mut form = sample_form();
        form.questions[1].next_question.default = END_OF_FORM;

        assert!(has_rule(&validate(&form, &[]), "default_chain", Severity::Error));
    }

    #[test]
    fn validate_duplicate_ids_expected_density_error() {
        let mut form = sample_form();
        form.questions[2].id = 2;

        assert!(has_rule(&validate(&form, &[]), "ids_dense", Severity::Error));
    }

    #[test]
    fn validate_empty_questions_expected_warning_only_for_drafts() {
        let mut form = sample_form();
        form.questions.clear();
        assert!(has_rule(
            &validate(&form, &[]),
            "questions_present",
            Severity::Error
        ));

        form.is_draft = true;
        assert!(has_rule(
            &validate(&form, &[]),
            "questions_present",
            Severity::Warning
        ));
        assert!(is_well_formed(&form));
    }

    #[test]
    fn validate_unknown_condition_answer_expected_warning() {
        let mut form = sample_form();
        form.questions[0].next_question.conditions[0].answer = "Juice".to_string();

        let diagnostics = validate(&form, &[]);
        assert!(has_rule(
            &diagnostics,
            "condition_answer_known",
            Severity::Warning
        ));
        assert!(validate_or_raise(&form, &[]).is_ok());
    }

    #[test]
    fn validate_unreachable_question_expected_warning() {
        let mut form = sample_form();
        form.questions[0].next_question.conditions.clear();
        form.questions[0].next_question.default = 3;

        let diagnostics = validate(&form, &[]);
        let unreachable: Vec<_> = diagnostics
            .iter()
            .filter(|d| d.rule == "reachability")
            .filter_map(|d| d.question_id)
            .collect();
        assert_eq!(unreachable, vec![2]);
    }

    #[test]
    fn validate_or_raise_inverted_rating_expected_validation_error() {
        let mut form = sample_form();
        if let QuestionKind::Rating(scale) = &mut form.questions[1].kind {
            scale.min_value = 5;
            scale.max_value = 1;
        }

        let error = validate_or_raise(&form, &[]).expect_err("inverted scale should fail");
        assert_eq!(error.errors_count, 1);
    }

    struct RequireThreeQuestions;

    impl LintRule for RequireThreeQuestions {
        fn name(&self) -> &str {
            "require_three_questions"
        }

        fn apply(&self, form: &Form) -> Vec<Diagnostic> {
            if form.question_count() >= 3 {
                Vec::new()
            } else {
                vec![Diagnostic::new(
                    self.name(),
                    Severity::Error,
                    "form needs three questions",
                )]
            }
        }
    }

    #[test]
    fn validate_extra_rule_expected_custom_diagnostic() {
        let mut form = sample_form();
        form.questions.truncate(2);
        form.questions[1].next_question.default = END_OF_FORM;
        form.questions[0].next_question.conditions.clear();

        let diagnostics = validate(&form, &[&RequireThreeQuestions]);
        assert!(has_rule(
            &diagnostics,
            "require_three_questions",
            Severity::Error
        ));
    }
}
