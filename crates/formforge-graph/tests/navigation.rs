use formforge_graph::{
    Answer, CandidateForm, MultiSelectPolicy, WalkOutcome, next, next_for_answer, repair, walk,
};
use serde_json::json;
use std::collections::BTreeMap;

fn onboarding_form() -> formforge_graph::Form {
    let candidate = CandidateForm::from_json_value(json!({
        "name": "Onboarding",
        "questions": [
            { "id": 1, "type": "single-choice", "question": "Role?",
              "options": ["Developer", "Designer", "Manager"],
              "nextQuestion": {
                  "conditions": [
                      { "answer": "Designer", "nextId": 3 },
                      { "answer": "Manager", "nextId": 4 }
                  ],
                  "default": 2
              } },
            { "id": 2, "type": "multiple-choice", "question": "Languages?",
              "options": ["Rust", "Go", "Python"],
              "nextQuestion": { "conditions": [{ "answer": "Rust", "nextId": 4 }], "default": 3 } },
            { "id": 3, "type": "input", "question": "Favourite tool?" },
            { "id": 4, "type": "rating", "question": "Satisfaction?" }
        ]
    }))
    .expect("candidate should deserialize");
    repair(candidate).expect("repair should succeed")
}

#[test]
fn next_scenario_d_expected_condition_then_default() {
    let candidate = CandidateForm::from_json_value(json!({
        "name": "Scenario D",
        "questions": [
            { "id": 1, "type": "single-choice", "options": ["X", "Y", "Z"],
              "nextQuestion": {
                  "conditions": [{ "answer": "X", "nextId": 3 }, { "answer": "Y", "nextId": 2 }],
                  "default": 2
              } },
            { "id": 2, "type": "input" },
            { "id": 3, "type": "input" }
        ]
    }))
    .expect("candidate should deserialize");
    let form = repair(candidate).expect("repair should succeed");
    let first = &form.questions[0];

    assert_eq!(next(first, "X"), 3);
    assert_eq!(next(first, "Y"), 2);
    assert_eq!(next(first, "Z"), 2);
}

#[test]
fn walk_designer_path_expected_skips_languages() {
    let form = onboarding_form();
    let answers = BTreeMap::from([
        (1, Answer::text("Designer")),
        (3, Answer::text("Figma")),
        (4, Answer::text("5")),
    ]);

    let result = walk(&form, &answers, MultiSelectPolicy::default());
    assert_eq!(result.visited, vec![1, 3, 4]);
    assert_eq!(result.outcome, WalkOutcome::Completed);
}

#[test]
fn walk_missing_answer_expected_awaiting_question() {
    let form = onboarding_form();
    let answers = BTreeMap::from([(1, Answer::text("Developer"))]);

    let result = walk(&form, &answers, MultiSelectPolicy::default());
    assert_eq!(result.visited, vec![1, 2]);
    assert_eq!(result.outcome, WalkOutcome::AwaitingAnswer(2));
}

#[test]
fn walk_multi_select_policies_expected_different_paths() {
    let form = onboarding_form();
    let answers = BTreeMap::from([
        (1, Answer::text("Developer")),
        (2, Answer::selections(["Go", "Rust"])),
        (3, Answer::text("vim")),
        (4, Answer::text("4")),
    ]);

    let default_only = walk(&form, &answers, MultiSelectPolicy::DefaultOnly);
    assert_eq!(default_only.visited, vec![1, 2, 3, 4]);

    let first_match = walk(&form, &answers, MultiSelectPolicy::FirstSelectedMatch);
    assert_eq!(first_match.visited, vec![1, 2, 4]);
    assert_eq!(first_match.outcome, WalkOutcome::Completed);
}

#[test]
fn next_for_answer_text_on_rating_expected_default() {
    let form = onboarding_form();
    let rating = &form.questions[3];

    assert_eq!(
        next_for_answer(rating, &Answer::text("3"), MultiSelectPolicy::default()),
        0
    );
}
