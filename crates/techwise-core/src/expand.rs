//! Step expansion - one detailed operator guide per plan step

use crate::config::PlannerConfig;
use crate::json_repair::extract_json_as;
use crate::oracle::TextGenerator;
use crate::types::{lenient, ExpandedStep, Requirements, Step};
use serde::Deserialize;
use std::sync::Arc;

const JSON_REPROMPT: &str =
    "\n\nReturn only one valid JSON object with the keys guide, commands, verification and rollback.";

/// Fields the oracle is asked to fill. `id` and `title` are always taken from
/// the source step, whatever the oracle echoed back.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExpansionDraft {
    #[serde(deserialize_with = "lenient::string")]
    guide: String,
    #[serde(deserialize_with = "lenient::opt_string_list")]
    commands: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient::string")]
    verification: String,
    #[serde(deserialize_with = "lenient::string")]
    rollback: String,
}

impl ExpansionDraft {
    /// Fill gaps from the source step so a partially answered object is still
    /// a complete guide.
    fn complete(self, step: &Step) -> ExpandedStep {
        fn or_default(value: String, default: &str) -> String {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value
            }
        }

        ExpandedStep {
            id: step.id,
            title: step.title.clone(),
            guide: or_default(self.guide, &step.description),
            commands: self.commands.unwrap_or_else(|| step.commands.clone()),
            verification: or_default(self.verification, ExpandedStep::FALLBACK_VERIFICATION),
            rollback: or_default(self.rollback, ExpandedStep::FALLBACK_ROLLBACK),
        }
    }
}

/// Expands plan steps into detailed guides, one oracle call chain per step
#[derive(Debug, Clone)]
pub struct StepExpander {
    oracle: Arc<dyn TextGenerator>,
    config: PlannerConfig,
}

impl StepExpander {
    pub fn new(oracle: Arc<dyn TextGenerator>, config: PlannerConfig) -> Self {
        Self { oracle, config }
    }

    /// Expand every step in order. The output has the same length and order as
    /// `steps`; nothing is deduplicated or reordered.
    pub async fn expand(&self, steps: &[Step], requirements: &Requirements) -> Vec<ExpandedStep> {
        let context = requirements.to_compact_json();
        let mut expanded = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            tracing::info!(
                "Expanding step {}/{}: {}",
                index + 1,
                steps.len(),
                step.title
            );
            expanded.push(self.expand_step(step, &context).await);
        }

        expanded
    }

    /// Expand a single step given the requirements as compact JSON
    pub async fn expand_step(&self, step: &Step, requirements_json: &str) -> ExpandedStep {
        let prompt = build_prompt(step, requirements_json);

        let draft = self
            .config
            .retry
            .run(
                self.oracle.as_ref(),
                "expand_step",
                &prompt,
                &self.config.expansion_params,
                JSON_REPROMPT,
                extract_json_as::<ExpansionDraft>,
            )
            .await;

        match draft {
            Some(draft) => draft.complete(step),
            None => {
                tracing::warn!("Step {} expansion fell back to its description", step.id);
                ExpandedStep::fallback(step)
            }
        }
    }
}

pub(crate) fn build_prompt(step: &Step, requirements_json: &str) -> String {
    let title_json = serde_json::to_string(&step.title).unwrap_or_else(|_| "\"\"".to_string());

    format!(
        r#"You are TechWISE Advisor. Expand this troubleshooting step into a full actionable guide.

Step title: {title}
Short description: {description}
Context / Requirements: {requirements}

Output a JSON object with keys:
{{
  "id": {id},
  "title": {title_json},
  "guide": string,
  "commands": [string],
  "verification": string,
  "rollback": string
}}

guide: user-friendly step-by-step guide (2-6 paragraphs)
commands: zero or more exact commands (Windows shell) to run as examples
verification: how to verify success
rollback: how to revert the step if it makes things worse (short)"#,
        title = step.title,
        description = step.description,
        requirements = requirements_json,
        id = step.id,
        title_json = title_json,
    )
}
