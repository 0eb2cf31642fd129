use formforge_graph::{
    CandidateForm, END_OF_FORM, FormError, InvalidFormReason, QuestionKind, QuestionType, next,
    repair, validate,
};
use serde_json::{Value, json};

fn candidate(value: Value) -> CandidateForm {
    CandidateForm::from_json_value(value).expect("candidate should deserialize")
}

fn messy_candidates() -> Vec<CandidateForm> {
    vec![
        candidate(json!({
            "name": "Duplicates",
            "questions": [
                { "id": 3, "type": "input" },
                { "id": 3, "type": "single-choice", "options": [] },
                { "id": -1, "type": "multiple-choice", "maxSelections": -2 }
            ]
        })),
        candidate(json!({
            "name": "Aliases",
            "theme": "sunset",
            "questions": [
                { "id": "10", "type": "Single_Choice", "options": ["Yes", "No"],
                  "nextQuestion": { "conditions": [{ "answer": "No", "nextId": 30 }], "default": 20 } },
                { "id": 20, "type": "rating", "minValue": 9, "maxValue": 3 },
                { "id": 30, "type": "dropdown", "image": "/img/demo.jpg",
                  "nextQuestion": { "conditions": [{ "answer": "x", "nextId": 0 }], "default": 99 } }
            ],
            "thankYouMessage": { "title": "Bye", "button": { "url": "https://example.com" } }
        })),
        candidate(json!({
            "name": "Loops",
            "questions": [
                { "id": 1, "type": "input", "nextQuestion": { "default": 2 } },
                { "id": 2, "type": "input", "nextQuestion": { "default": 1 } }
            ]
        })),
    ]
}

#[test]
fn repair_scenario_a_duplicate_and_invalid_ids_expected_dense_in_order() {
    let form = repair(candidate(json!({
        "name": "Scenario A",
        "questions": [
            { "id": 3, "type": "input", "question": "first" },
            { "id": 3, "type": "input", "question": "second" },
            { "id": -1, "type": "input", "question": "third" }
        ]
    })))
    .expect("repair should succeed");

    let ids: Vec<(u32, &str)> = form
        .questions
        .iter()
        .map(|question| (question.id, question.question.as_str()))
        .collect();
    assert_eq!(ids, vec![(1, "first"), (2, "second"), (3, "third")]);
}

#[test]
fn repair_scenario_b_multiple_choice_without_options_expected_two_placeholders() {
    let form = repair(candidate(json!({
        "name": "Scenario B",
        "questions": [{ "id": 1, "type": "multiple-choice", "options": [], "maxSelections": 0 }]
    })))
    .expect("repair should succeed");

    let QuestionKind::MultipleChoice {
        options,
        max_selections,
    } = &form.questions[0].kind
    else {
        panic!("question should stay multiple-choice");
    };
    assert_eq!(options.len(), 2);
    assert_eq!(*max_selections, 2);
}

#[test]
fn repair_scenario_c_dangling_condition_expected_dropped_and_successor_default() {
    let form = repair(candidate(json!({
        "name": "Scenario C",
        "questions": [
            { "id": 1, "type": "single-choice", "options": ["X", "Y"],
              "nextQuestion": { "conditions": [{ "answer": "X", "nextId": 5 }] } },
            { "id": 2, "type": "input", "nextQuestion": { "default": 3 } },
            { "id": 3, "type": "input" }
        ]
    })))
    .expect("repair should succeed");

    let first = &form.questions[0].next_question;
    assert!(first.conditions.is_empty());
    assert_eq!(first.default, 2);
}

#[test]
fn repair_scenario_e_last_question_expected_end_of_form() {
    let form = repair(candidate(json!({
        "name": "Scenario E",
        "questions": [
            { "id": 1, "type": "input" },
            { "id": 2, "type": "input" },
            { "id": 3, "type": "rating" }
        ]
    })))
    .expect("repair should succeed");

    let last = &form.questions[2];
    assert_eq!(last.next_question.default, END_OF_FORM);
    for answer in ["1", "5", "anything", ""] {
        assert_eq!(next(last, answer), END_OF_FORM);
    }
}

#[test]
fn repair_twice_expected_identical_output() {
    for messy in messy_candidates() {
        let once = repair(messy).expect("first repair should succeed");
        let twice = repair(CandidateForm::from(&once)).expect("second repair should succeed");
        assert_eq!(twice, once);
    }
}

#[test]
fn repair_output_expected_dense_ids_and_sound_transitions() {
    for messy in messy_candidates() {
        let form = repair(messy).expect("repair should succeed");
        let total = form.questions.len() as u32;

        let ids: Vec<u32> = form.questions.iter().map(|question| question.id).collect();
        assert_eq!(ids, (1..=total).collect::<Vec<_>>());

        for question in &form.questions {
            for target in question.next_question.targets() {
                assert!(form.contains_question(target), "target {target} should exist");
            }
        }
        assert!(!validate(&form, &[]).iter().any(|d| d.is_error()));
    }
}

#[test]
fn repair_unset_defaults_expected_sequential_chain() {
    let form = repair(candidate(json!({
        "name": "Chain",
        "questions": [
            { "id": 1, "type": "input" },
            { "id": 2, "type": "input", "nextQuestion": { "default": -3 } },
            { "id": 3, "type": "input", "nextQuestion": { "default": 42 } },
            { "id": 4, "type": "input" }
        ]
    })))
    .expect("repair should succeed");

    let defaults: Vec<u32> = form
        .questions
        .iter()
        .map(|question| question.next_question.default)
        .collect();
    assert_eq!(defaults, vec![2, 3, 4, END_OF_FORM]);
}

#[test]
fn repair_aliased_candidate_expected_types_and_targets_repaired() {
    let form = repair(messy_candidates().remove(1)).expect("repair should succeed");

    assert_eq!(form.theme, "sunset");
    assert_eq!(form.floating_shapes_theme, "default");
    assert_eq!(form.questions[0].question_type(), QuestionType::SingleChoice);
    assert_eq!(form.questions[0].next_question.conditions[0].next_id, 3);
    assert_eq!(form.questions[0].next_question.default, 2);
    assert_eq!(form.questions[2].question_type(), QuestionType::SingleChoice);
    assert_eq!(form.questions[2].image, "/img/default/single-choice.jpg");
    assert!(form.questions[2].next_question.conditions.is_empty());
    assert_eq!(form.questions[2].next_question.default, END_OF_FORM);
    assert_eq!(form.thank_you_message.title, "Bye");
    assert_eq!(form.thank_you_message.button.text, "Continue");
    assert_eq!(form.thank_you_message.button.url, "https://example.com");
}

#[test]
fn repair_missing_name_or_questions_expected_invalid_form() {
    let nameless = repair(candidate(json!({
        "questions": [{ "id": 1, "type": "input" }]
    })));
    assert!(matches!(
        nameless,
        Err(FormError::InvalidForm(InvalidFormReason::MissingName))
    ));

    let empty = repair(candidate(json!({ "name": "Empty", "questions": [] })));
    let error = empty.expect_err("empty form should be rejected");
    assert_eq!(
        error.to_string(),
        "invalid form: form must contain at least one question"
    );
}

#[test]
fn repair_oversized_max_selections_expected_clamped_to_option_count() {
    let form = repair(candidate(json!({
        "name": "Picks",
        "questions": [
            { "id": 1, "type": "multiple-choice", "options": ["A", "B"], "maxSelections": 5000000000i64 },
            { "id": 2, "type": "multiple-choice", "options": ["A", "B", "C"], "maxSelections": 7 }
        ]
    })))
    .expect("oversized maxSelections should be repaired");

    for (question, expected) in form.questions.iter().zip([2, 3]) {
        let QuestionKind::MultipleChoice { max_selections, .. } = &question.kind else {
            panic!("question {} should stay multiple-choice", question.id);
        };
        assert_eq!(*max_selections, expected);
    }
}

#[test]
fn repair_permuted_unique_ids_expected_renumbered_with_targets_followed() {
    let form = repair(candidate(json!({
        "name": "Permuted",
        "questions": [
            { "id": 2, "type": "input", "question": "First", "nextQuestion": { "default": 1 } },
            { "id": 1, "type": "input", "question": "Second", "nextQuestion": { "default": 0 } }
        ]
    })))
    .expect("permuted ids should be repaired");

    let edges: Vec<(u32, u32)> = form
        .questions
        .iter()
        .map(|question| (question.id, question.next_question.default))
        .collect();
    assert_eq!(edges, vec![(1, 2), (2, END_OF_FORM)]);
    assert_eq!(form.questions[0].question, "First");
    assert_eq!(
        repair(CandidateForm::from(form.clone())).expect("repair should be idempotent"),
        form
    );
}
