//! Cover-letter generation over the LLM client.
//!
//! `AppState` holds an `Arc<dyn TextGenerator>` so the pipeline can run
//! against a stub in tests.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Settings;
use crate::errors::AppError;
use crate::generation::filename::{sanitize_filename, DEFAULT_FILENAME_STEM};
use crate::generation::prompts::{
    COVER_LETTER_INSTRUCTIONS, COVER_LETTER_SYSTEM, DRAFT_INSTRUCTION, FILENAME_PROMPT_TEMPLATE,
    FILENAME_SYSTEM, SAMPLE_NOTE,
};
use crate::llm_client::{CompletionRequest, LlmClient};

/// Characters of the job description sent to the filename call.
const FILENAME_JD_CHARS: usize = 1000;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produces the full letter text. Never empty on success.
    async fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        sample_text: Option<&str>,
    ) -> Result<String, AppError>;

    /// Produces a filename stem for the letter. Infallible: any failure
    /// yields the default stem.
    async fn generate_filename(&self, job_description: &str) -> String;
}

// ────────────────────────────────────────────────────────────────────────────
// Prompt construction
// ────────────────────────────────────────────────────────────────────────────

/// Assembles the cover-letter prompt. All inputs are trimmed; the sample
/// section is omitted when there is no (or only blank) sample text.
pub fn build_prompt(resume_text: &str, job_description: &str, sample_text: Option<&str>) -> String {
    let sample_section = sample_text
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|sample| {
            format!("<cover_letter_sample>\n{sample}\n</cover_letter_sample>\n\n{SAMPLE_NOTE}\n\n")
        })
        .unwrap_or_default();

    format!(
        "{COVER_LETTER_INSTRUCTIONS}\n\n\
         <resume>\n{resume}\n</resume>\n\n\
         {sample_section}\
         <job_description>\n{jd}\n</job_description>\n\n\
         {DRAFT_INSTRUCTION}",
        resume = resume_text.trim(),
        jd = job_description.trim(),
    )
}

fn build_filename_prompt(job_description: &str) -> String {
    let excerpt: String = job_description.chars().take(FILENAME_JD_CHARS).collect();
    FILENAME_PROMPT_TEMPLATE.replace("{job_description}", &excerpt)
}

// ────────────────────────────────────────────────────────────────────────────
// CoverLetterGenerator
// ────────────────────────────────────────────────────────────────────────────

/// The production generator: two LLM calls configured from `Settings`.
pub struct CoverLetterGenerator {
    llm: LlmClient,
    settings: Settings,
}

impl CoverLetterGenerator {
    pub fn new(llm: LlmClient, settings: Settings) -> Self {
        Self { llm, settings }
    }

    fn letter_request<'a>(&'a self, prompt: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.settings.cover_letter_model,
            system: COVER_LETTER_SYSTEM,
            prompt,
            max_output_tokens: self.settings.max_tokens,
            temperature: Some(self.settings.temperature),
            top_p: Some(self.settings.top_p),
        }
    }

    /// The filename call always uses the model's default sampling.
    fn filename_request<'a>(&'a self, prompt: &'a str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.settings.filename_model,
            system: FILENAME_SYSTEM,
            prompt,
            max_output_tokens: self.settings.filename_max_tokens,
            temperature: None,
            top_p: None,
        }
    }
}

#[async_trait]
impl TextGenerator for CoverLetterGenerator {
    async fn generate(
        &self,
        resume_text: &str,
        job_description: &str,
        sample_text: Option<&str>,
    ) -> Result<String, AppError> {
        if resume_text.trim().is_empty() {
            return Err(AppError::Input("Resume text is empty".to_string()));
        }
        if job_description.trim().is_empty() {
            return Err(AppError::Input("Job description is empty".to_string()));
        }

        let prompt = build_prompt(resume_text, job_description, sample_text);
        let request = self.letter_request(&prompt);

        info!("Calling OpenAI API with model {}", request.model);
        let letter = self.llm.complete(&request).await?;
        info!("Cover letter generated ({} chars)", letter.chars().count());
        Ok(letter)
    }

    async fn generate_filename(&self, job_description: &str) -> String {
        if job_description.trim().is_empty() {
            return DEFAULT_FILENAME_STEM.to_string();
        }

        let prompt = build_filename_prompt(job_description);
        let request = self.filename_request(&prompt);

        match self.llm.complete(&request).await {
            Ok(raw) => {
                let stem = sanitize_filename(&raw);
                info!("Generated filename: '{stem}'");
                stem
            }
            Err(e) => {
                warn!("Filename generation failed, using default: {e}");
                DEFAULT_FILENAME_STEM.to_string()
            }
        }
    }
}
