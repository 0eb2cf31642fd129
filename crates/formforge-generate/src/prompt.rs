use crate::GenerateFormRequest;

/// Instructions sent as the system message of every generation request.
pub const SYSTEM_PROMPT: &str = r#"You generate questionnaire forms as JSON.
Rules:
1. Return a single JSON object and nothing else.
2. Number questions 1, 2, 3, ... in the order they appear.
3. Question "type" is one of: "single-choice", "multiple-choice", "input", "rating".
4. Choice questions list "options" as objects with "text" and "icon".
5. "nextQuestion.conditions" map an exact option text ("answer") to a question id ("nextId"); "nextQuestion.default" is used otherwise. Use 0 only to end the form after the last question.
6. Input questions set "inputType" and "validation" to one of "text", "email", "phone".
7. "theme" is one of "tech", "flat", "dark", "light"; "floatingShapesTheme" is one of "spring", "summer", "autumn", "winter".
Shape:
{
  "name": "Product feedback",
  "theme": "light",
  "floatingShapesTheme": "summer",
  "questions": [
    {
      "id": 1,
      "type": "single-choice",
      "question": "How did you hear about us?",
      "subtext": "Pick the closest match",
      "image": "/img/demo.jpg",
      "options": [
        { "text": "Search", "icon": "🔍" },
        { "text": "A friend", "icon": "🤝" }
      ],
      "nextQuestion": { "conditions": [{ "answer": "A friend", "nextId": 2 }], "default": 3 }
    },
    {
      "id": 2,
      "type": "input",
      "question": "Who can we thank?",
      "subtext": "Optional",
      "image": "/img/demo.jpg",
      "inputType": "email",
      "placeholder": "friend@example.com",
      "validation": "email",
      "nextQuestion": { "conditions": [], "default": 3 }
    },
    {
      "id": 3,
      "type": "rating",
      "question": "How likely are you to recommend us?",
      "subtext": "",
      "image": "",
      "minValue": 1,
      "maxValue": 5,
      "step": 1,
      "showLabels": true,
      "minLabel": "Unlikely",
      "maxLabel": "Very likely",
      "icon": "⭐️",
      "nextQuestion": { "conditions": [], "default": 0 }
    }
  ],
  "thankYouMessage": {
    "title": "Thanks!",
    "subtitle": "Your answers help us improve.",
    "icon": "✨",
    "button": { "text": "Back to site", "url": "/", "newTab": false }
  }
}"#;

pub fn build_prompt(request: &GenerateFormRequest) -> String {
    let preferences = if request.preferences.is_empty() {
        "none".to_string()
    } else {
        request.preferences.join(", ")
    };
    format!(
        "Generate a form with these parameters:\n\
         - Topic: {}\n\
         - Form type: {}\n\
         - Number of questions: {}\n\
         - Preferences: {preferences}\n\
         The form needs a meaningful name and theme, a logical question flow with \
         navigation, validation for input questions, a thank-you message, and icons \
         for options. Return the complete form JSON.",
        request.topic.trim(),
        request.form_type.trim(),
        request.num_questions,
    )
}
