use crate::{
    CompletionRequest, GenerateError, GenerateFormRequest, SYSTEM_PROMPT, SharedTextGenerator,
    build_prompt,
};
use formforge_graph::{CandidateForm, Form, FormService, RepairOptions, parse_candidate, repair_with};
use formforge_store::{BlobStore, DocumentStore};

/// Prompt, complete, parse and repair. Generated forms are drafts owned by
/// the requesting user.
#[derive(Clone)]
pub struct FormGenerator {
    text_generator: SharedTextGenerator,
    repair_options: RepairOptions,
}

impl FormGenerator {
    pub fn new(text_generator: SharedTextGenerator) -> Self {
        Self {
            text_generator,
            repair_options: RepairOptions::default(),
        }
    }

    pub fn with_repair_options(mut self, options: RepairOptions) -> Self {
        self.repair_options = options;
        self
    }

    pub async fn generate(
        &self,
        request: &GenerateFormRequest,
        owner_id: &str,
    ) -> Result<Form, GenerateError> {
        request.validate()?;
        tracing::info!(
            topic = %request.topic,
            form_type = %request.form_type,
            num_questions = request.num_questions,
            "generating form"
        );

        let completion = self
            .text_generator
            .complete(CompletionRequest::new(SYSTEM_PROMPT, build_prompt(request)))
            .await?;
        if completion.trim().is_empty() {
            return Err(GenerateError::EmptyCompletion);
        }

        let mut candidate = parse_candidate(&completion)?;
        if candidate.questions.len() != request.num_questions as usize {
            tracing::warn!(
                requested = request.num_questions,
                generated = candidate.questions.len(),
                "generator returned a different number of questions"
            );
        }
        candidate.id = None;
        candidate.owner_id = owner_id.to_string();
        candidate.is_draft = true;

        let form = repair_with(candidate, &self.repair_options)?;
        tracing::info!(name = %form.name, questions = form.question_count(), "form generated");
        Ok(form)
    }

    /// Generates a form and stores it as a new draft.
    pub async fn generate_and_store<S, B>(
        &self,
        request: &GenerateFormRequest,
        owner_id: &str,
        service: &FormService<S, B>,
    ) -> Result<Form, GenerateError>
    where
        S: DocumentStore,
        B: BlobStore,
    {
        let form = self.generate(request, owner_id).await?;
        Ok(service
            .create_form(owner_id, CandidateForm::from(form))
            .await?)
    }
}
