//! Deterministic repair of candidate forms.
//!
//! Repair never rejects a candidate except for the two critical checks
//! (missing name, no questions). Every other defect is fixed in place, one
//! step at a time, and each step is idempotent over the output of the steps
//! before it.

use crate::{
    CandidateForm, CandidateOption, FallbackPolicy, Form, FormError, InvalidFormReason,
    QuestionType, SequentialFallback, defaults, validate_or_raise,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub trait RepairStep: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, candidate: &mut CandidateForm) -> Result<(), FormError>;
}

#[derive(Clone)]
pub struct RepairOptions {
    pub allow_empty_draft: bool,
    pub fallback: Arc<dyn FallbackPolicy>,
    pub extra_steps: Vec<Arc<dyn RepairStep>>,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            allow_empty_draft: false,
            fallback: Arc::new(SequentialFallback),
            extra_steps: Vec::new(),
        }
    }
}

impl fmt::Debug for RepairOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepairOptions")
            .field("allow_empty_draft", &self.allow_empty_draft)
            .field("fallback", &self.fallback.name())
            .field(
                "extra_steps",
                &self
                    .extra_steps
                    .iter()
                    .map(|step| step.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl RepairOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets a draft with zero questions through the critical checks.
    pub fn allow_empty_draft(mut self, allow: bool) -> Self {
        self.allow_empty_draft = allow;
        self
    }

    pub fn with_fallback(mut self, fallback: impl FallbackPolicy + 'static) -> Self {
        self.fallback = Arc::new(fallback);
        self
    }

    pub fn with_step(mut self, step: impl RepairStep + 'static) -> Self {
        self.extra_steps.push(Arc::new(step));
        self
    }

    fn builtin_steps(&self) -> Vec<Arc<dyn RepairStep>> {
        vec![
            Arc::new(FormDefaults),
            Arc::new(SequentialIds),
            Arc::new(QuestionTypeRepair),
            Arc::new(TransitionRepair {
                fallback: Arc::clone(&self.fallback),
            }),
            Arc::new(ClosingMessageDefaults),
        ]
    }
}

pub fn repair(candidate: CandidateForm) -> Result<Form, FormError> {
    repair_with(candidate, &RepairOptions::default())
}

pub fn repair_with(mut candidate: CandidateForm, options: &RepairOptions) -> Result<Form, FormError> {
    check_critical(&candidate, options.allow_empty_draft)?;

    for step in options.builtin_steps().iter().chain(&options.extra_steps) {
        step.apply(&mut candidate)?;
        tracing::trace!(step = step.name(), "repair step applied");
    }

    let form = Form::try_from(candidate)?;
    validate_or_raise(&form, &[])?;
    tracing::debug!(
        name = %form.name,
        questions = form.question_count(),
        "form repaired"
    );
    Ok(form)
}

pub fn check_critical(candidate: &CandidateForm, allow_empty_draft: bool) -> Result<(), FormError> {
    if candidate.name.is_empty() {
        return Err(FormError::InvalidForm(InvalidFormReason::MissingName));
    }
    if candidate.questions.is_empty() && !(allow_empty_draft && candidate.is_draft) {
        return Err(FormError::InvalidForm(InvalidFormReason::NoQuestions));
    }
    Ok(())
}

fn fill(field: &mut String, default: &str) -> bool {
    if field.is_empty() {
        *field = default.to_string();
        true
    } else {
        false
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FormDefaults;

impl RepairStep for FormDefaults {
    fn name(&self) -> &str {
        "form_defaults"
    }

    fn apply(&self, candidate: &mut CandidateForm) -> Result<(), FormError> {
        if fill(&mut candidate.theme, defaults::THEME) {
            tracing::debug!("theme defaulted");
        }
        if fill(
            &mut candidate.floating_shapes_theme,
            defaults::FLOATING_SHAPES_THEME,
        ) {
            tracing::debug!("floating shapes theme defaulted");
        }
        Ok(())
    }
}

/// Renumbers questions to `1..=N` in authoring order.
///
/// Every question is renumbered, including unique positive IDs that a
/// keep-if-unique pass would leave alone, so a permuted form such as `[2, 1]`
/// comes out as `[1, 2]`. This keeps the output dense and ordered, which is
/// what `ids_dense` checks.
///
/// A positive candidate ID carried by exactly one question is an unambiguous
/// alias for that question, so transition targets naming it follow the
/// question to its new ID. Targets naming duplicated or unknown IDs are left
/// alone for transition repair.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialIds;

impl RepairStep for SequentialIds {
    fn name(&self) -> &str {
        "sequential_ids"
    }

    fn apply(&self, candidate: &mut CandidateForm) -> Result<(), FormError> {
        let mut occurrences: BTreeMap<i64, usize> = BTreeMap::new();
        for question in &candidate.questions {
            *occurrences.entry(question.id).or_default() += 1;
        }

        let mut aliases: BTreeMap<i64, i64> = BTreeMap::new();
        for (index, question) in candidate.questions.iter_mut().enumerate() {
            let new_id = index as i64 + 1;
            if question.id > 0 && occurrences.get(&question.id) == Some(&1) {
                aliases.insert(question.id, new_id);
            }
            if question.id != new_id {
                tracing::debug!(from = question.id, to = new_id, "question id reassigned");
                question.id = new_id;
            }
        }

        let remap = |target: &mut i64| {
            if let Some(new_target) = aliases.get(target) {
                *target = *new_target;
            }
        };
        for question in &mut candidate.questions {
            for condition in &mut question.next_question.conditions {
                remap(&mut condition.next_id);
            }
            remap(&mut question.next_question.default);
        }
        Ok(())
    }
}

/// Coerces each question to a known type and fills its payload defaults.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuestionTypeRepair;

impl RepairStep for QuestionTypeRepair {
    fn name(&self) -> &str {
        "question_type"
    }

    fn apply(&self, candidate: &mut CandidateForm) -> Result<(), FormError> {
        for question in &mut candidate.questions {
            let question_type = match QuestionType::parse(&question.question_type) {
                Some(question_type) => question_type,
                None => {
                    tracing::debug!(
                        question_id = question.id,
                        original = %question.question_type,
                        "unknown question type coerced to single-choice"
                    );
                    question.options.clear();
                    question.max_selections = 0;
                    question.input_type.clear();
                    question.placeholder.clear();
                    question.validation.clear();
                    question.min_value = None;
                    question.max_value = None;
                    question.step = None;
                    question.show_labels = None;
                    question.min_label.clear();
                    question.max_label.clear();
                    question.icon.clear();
                    QuestionType::SingleChoice
                }
            };
            question.question_type = question_type.as_str().to_string();

            match question_type {
                QuestionType::SingleChoice | QuestionType::MultipleChoice => {
                    if question.options.is_empty() {
                        tracing::debug!(question_id = question.id, "placeholder options added");
                        question.options = defaults::PLACEHOLDER_OPTIONS
                            .iter()
                            .map(|(text, icon)| CandidateOption {
                                text: (*text).to_string(),
                                icon: (*icon).to_string(),
                                ..CandidateOption::default()
                            })
                            .collect();
                    }
                    let option_count = question.options.len() as i64;
                    if question_type == QuestionType::MultipleChoice
                        && (question.max_selections <= 0 || question.max_selections > option_count)
                    {
                        tracing::debug!(
                            question_id = question.id,
                            from = question.max_selections,
                            to = option_count,
                            "max selections clamped to option count"
                        );
                        question.max_selections = option_count;
                    }
                }
                QuestionType::Input => {
                    fill(&mut question.input_type, defaults::INPUT_TYPE);
                    fill(&mut question.placeholder, defaults::INPUT_PLACEHOLDER);
                    fill(&mut question.validation, defaults::INPUT_VALIDATION);
                }
                QuestionType::Rating => {
                    let min_value = question.min_value.unwrap_or(defaults::RATING_MIN);
                    let max_value = question.max_value.unwrap_or(defaults::RATING_MAX);
                    if min_value < max_value {
                        question.min_value = Some(min_value);
                        question.max_value = Some(max_value);
                    } else {
                        tracing::debug!(
                            question_id = question.id,
                            min_value,
                            max_value,
                            "inverted rating bounds reset"
                        );
                        question.min_value = Some(defaults::RATING_MIN);
                        question.max_value = Some(defaults::RATING_MAX);
                    }
                    if question.step.is_none_or(|step| step <= 0) {
                        question.step = Some(defaults::RATING_STEP);
                    }
                    question.show_labels.get_or_insert(true);
                    fill(&mut question.icon, defaults::RATING_ICON);
                }
            }

            if question.image.is_empty() || question.image == defaults::PLACEHOLDER_IMAGE {
                question.image = defaults::image_for(question_type.as_str());
            }
            fill(&mut question.subtext, defaults::SUBTEXT);
        }
        Ok(())
    }
}

/// Drops out-of-range conditions and replaces invalid defaults through a
/// [`FallbackPolicy`]. Expects IDs to be `1..=N` already.
#[derive(Clone)]
pub struct TransitionRepair {
    pub fallback: Arc<dyn FallbackPolicy>,
}

impl Default for TransitionRepair {
    fn default() -> Self {
        Self {
            fallback: Arc::new(SequentialFallback),
        }
    }
}

impl RepairStep for TransitionRepair {
    fn name(&self) -> &str {
        "transitions"
    }

    fn apply(&self, candidate: &mut CandidateForm) -> Result<(), FormError> {
        let total = candidate.questions.len();
        let in_range = |target: i64| target > 0 && target <= total as i64;

        for question in &mut candidate.questions {
            let rule = &mut question.next_question;
            let before = rule.conditions.len();
            rule.conditions.retain(|condition| in_range(condition.next_id));
            if rule.conditions.len() != before {
                tracing::debug!(
                    question_id = question.id,
                    dropped = before - rule.conditions.len(),
                    "dangling conditions dropped"
                );
            }

            if !in_range(rule.default) {
                let question_id = u32::try_from(question.id).unwrap_or_default();
                let target = self.fallback.default_target(question_id, total);
                tracing::debug!(
                    question_id = question.id,
                    from = rule.default,
                    to = target,
                    policy = self.fallback.name(),
                    "default target replaced"
                );
                rule.default = i64::from(target);
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ClosingMessageDefaults;

impl RepairStep for ClosingMessageDefaults {
    fn name(&self) -> &str {
        "closing_message"
    }

    fn apply(&self, candidate: &mut CandidateForm) -> Result<(), FormError> {
        let message = &mut candidate.thank_you_message;
        fill(&mut message.title, defaults::CLOSING_TITLE);
        fill(&mut message.subtitle, defaults::CLOSING_SUBTITLE);
        fill(&mut message.icon, defaults::CLOSING_ICON);
        fill(&mut message.button.text, defaults::CLOSING_BUTTON_TEXT);
        fill(&mut message.button.url, defaults::CLOSING_BUTTON_URL);
        Ok(())
    }
}
