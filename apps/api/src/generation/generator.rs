//! Generation Invoker — assembles the prompt and forwards it to the model.
//!
//! Returns the model's text verbatim. The "under 400 words" instruction is advisory
//! and is not checked here. Applying the entitlement post-action is the caller's job.

use serde::Deserialize;

use crate::errors::AppError;
use crate::generation::prompts::{COVER_LETTER_CLOSING, COVER_LETTER_OPENING, COVER_LETTER_SYSTEM};
use crate::llm_client::TextCompletion;

/// The job details the applicant submitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterInput {
    pub company_name: String,
    pub location: String,
    pub job_requirements: String,
    pub emphasis: String,
}

/// Builds the prompt. Deterministic: same input, same prompt.
/// The resume section is present only when `resume` is non-blank.
pub fn build_prompt(input: &CoverLetterInput, resume: Option<&str>) -> String {
    let mut prompt = format!(
        "{COVER_LETTER_OPENING}\n\n\
        Company: {}\n\
        Location: {}\n\n\
        Job requirements:\n{}\n\n\
        What the applicant wants to emphasize:\n{}\n\n",
        input.company_name.trim(),
        input.location.trim(),
        input.job_requirements.trim(),
        input.emphasis.trim(),
    );

    if let Some(resume) = resume.map(str::trim).filter(|r| !r.is_empty()) {
        prompt.push_str("Applicant resume:\n");
        prompt.push_str(resume);
        prompt.push_str("\n\n");
    }

    prompt.push_str(COVER_LETTER_CLOSING);
    prompt
}

/// Generates one cover letter. Any model failure becomes `AppError::Generation`.
pub async fn generate_cover_letter(
    model: &dyn TextCompletion,
    input: &CoverLetterInput,
    resume: Option<&str>,
) -> Result<String, AppError> {
    let prompt = build_prompt(input, resume);
    model
        .complete(&prompt, COVER_LETTER_SYSTEM)
        .await
        .map_err(|e| AppError::Generation(format!("Cover letter LLM call failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeModel;

    fn input() -> CoverLetterInput {
        CoverLetterInput {
            company_name: "Ferrous Systems".to_string(),
            location: "Berlin".to_string(),
            job_requirements: "3+ years Rust\nAsync networking".to_string(),
            emphasis: "Open-source maintenance work".to_string(),
        }
    }

    #[test]
    fn test_prompt_embeds_every_field() {
        let prompt = build_prompt(&input(), None);
        assert!(prompt.contains("Company: Ferrous Systems"));
        assert!(prompt.contains("Location: Berlin"));
        assert!(prompt.contains("3+ years Rust\nAsync networking"));
        assert!(prompt.contains("Open-source maintenance work"));
        assert!(prompt.contains("under 400 words"));
    }

    #[test]
    fn test_resume_section_only_when_present() {
        assert!(!build_prompt(&input(), None).contains("Applicant resume"));
        assert!(!build_prompt(&input(), Some("   \n")).contains("Applicant resume"));

        let prompt = build_prompt(&input(), Some("Maintainer of tokio-util."));
        assert!(prompt.contains("Applicant resume:\nMaintainer of tokio-util."));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(
            build_prompt(&input(), Some("resume")),
            build_prompt(&input(), Some("resume"))
        );
    }

    #[test]
    fn test_braces_in_fields_are_not_treated_as_placeholders() {
        let mut tricky = input();
        tricky.company_name = "{location}".to_string();
        let prompt = build_prompt(&tricky, None);
        assert!(prompt.contains("Company: {location}"));
    }

    #[test]
    fn test_input_deserializes_from_camel_case() {
        let parsed: CoverLetterInput = serde_json::from_value(serde_json::json!({
            "companyName": "Acme",
            "location": "Remote",
            "jobRequirements": "Rust",
            "emphasis": "Shipping"
        }))
        .unwrap();
        assert_eq!(parsed.company_name, "Acme");
        assert_eq!(parsed.job_requirements, "Rust");
    }

    #[tokio::test]
    async fn test_generate_returns_model_text_verbatim() {
        let model = FakeModel::replying("  Dear Hiring Manager,\n\nThanks.  ");
        let letter = generate_cover_letter(&model, &input(), None).await.unwrap();
        assert_eq!(letter, "  Dear Hiring Manager,\n\nThanks.  ");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_maps_model_failure() {
        let model = FakeModel::failing();
        let result = generate_cover_letter(&model, &input(), None).await;
        assert!(matches!(result, Err(AppError::Generation(_))));
        assert_eq!(model.calls(), 1, "no retry on failure");
    }
}
