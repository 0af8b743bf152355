//! Requirement extraction - turn free text into the fixed ten-field schema

use crate::config::PlannerConfig;
use crate::json_repair::extract_json_as;
use crate::oracle::{TextGenerator, TokenCounter};
use crate::types::Requirements;
use std::sync::Arc;

const JSON_REPROMPT: &str =
    "\n\nReturn only one valid JSON object with double-quoted keys and values.";

/// Extracts [`Requirements`] from a user's problem description
#[derive(Debug, Clone)]
pub struct RequirementExtractor {
    oracle: Arc<dyn TextGenerator>,
    tokens: Arc<dyn TokenCounter>,
    config: PlannerConfig,
}

impl RequirementExtractor {
    pub fn new(
        oracle: Arc<dyn TextGenerator>,
        tokens: Arc<dyn TokenCounter>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            oracle,
            tokens,
            config,
        }
    }

    /// Summarize the text when it exceeds the token threshold.
    ///
    /// Exactly one oracle call is made for long inputs and none for short
    /// ones. A failed or empty summary leaves the text unchanged.
    pub async fn summarize_if_long(&self, text: &str) -> String {
        let token_count = self.tokens.token_count(text);
        if token_count <= self.config.summarize_threshold_tokens {
            return text.to_string();
        }

        tracing::info!(
            "Input is {} tokens (threshold {}), summarizing",
            token_count,
            self.config.summarize_threshold_tokens
        );

        let prompt = format!(
            "Summarize the following technical user problem into one concise paragraph \
             suitable for troubleshooting context:\n\n{}\n\nSummary:",
            text
        );

        match self
            .oracle
            .generate(&prompt, &self.config.summary_params)
            .await
        {
            Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Summarization returned nothing, using raw text");
                text.to_string()
            }
            Err(e) => {
                tracing::warn!("Summarization failed, using raw text: {}", e);
                text.to_string()
            }
        }
    }

    /// Extract requirements. Never fails: oracle or parse failures yield
    /// [`Requirements::fallback`] built from the original input.
    pub async fn extract(&self, user_text: &str) -> Requirements {
        let text = self.summarize_if_long(user_text).await;
        let prompt = build_prompt(&text);

        let parsed = self
            .config
            .retry
            .run(
                self.oracle.as_ref(),
                "extract_requirements",
                &prompt,
                &self.config.extraction_params,
                JSON_REPROMPT,
                parse_requirements,
            )
            .await;

        match parsed {
            Some(requirements) => requirements,
            None => {
                tracing::warn!("Requirement extraction fell back to raw text");
                Requirements::fallback(user_text, self.config.max_summary_chars)
            }
        }
    }
}

/// A usable record must at least carry a problem summary
fn parse_requirements(raw: &str) -> Option<Requirements> {
    extract_json_as::<Requirements>(raw).filter(|reqs| {
        reqs.problem_summary
            .as_deref()
            .is_some_and(|summary| !summary.trim().is_empty())
    })
}

pub(crate) fn build_prompt(text: &str) -> String {
    format!(
        r#"You are a requirements extractor. Read the user problem below and produce a JSON object with EXACT keys:
{{
  "problem_summary": string,
  "os": string or null,
  "hardware": string or null,
  "symptoms": string or null,
  "frequency": string or null,
  "triggers": string or null,
  "recent_changes": string or null,
  "constraints": string or null,
  "desired_outcome": string or null,
  "urgency": string or null
}}

Don't add any extra commentary, only output the JSON object.

User problem:
{}

JSON:"#,
        text
    )
}
