//! Plan generation - requirements in, prioritized remediation steps out

use crate::config::PlannerConfig;
use crate::json_repair::extract_json_as;
use crate::oracle::TextGenerator;
use crate::types::{Plan, Requirements};
use std::sync::Arc;

const JSON_REPROMPT: &str = "\n\nReturn only one valid JSON object with a non-empty \"steps\" array.";

/// Asks the oracle for a troubleshooting plan
#[derive(Debug, Clone)]
pub struct PlanGenerator {
    oracle: Arc<dyn TextGenerator>,
    config: PlannerConfig,
}

impl PlanGenerator {
    pub fn new(oracle: Arc<dyn TextGenerator>, config: PlannerConfig) -> Self {
        Self { oracle, config }
    }

    /// Generate a plan. Never fails: unusable output yields [`Plan::fallback`].
    ///
    /// Step ids are passed through as the oracle emitted them, duplicates
    /// included.
    pub async fn generate(&self, requirements: &Requirements) -> Plan {
        let prompt = build_prompt(requirements);

        let parsed = self
            .config
            .retry
            .run(
                self.oracle.as_ref(),
                "generate_plan",
                &prompt,
                &self.config.plan_params,
                JSON_REPROMPT,
                parse_plan,
            )
            .await;

        match parsed {
            Some(plan) => {
                tracing::info!(
                    "Plan generated: {} steps, confidence {}",
                    plan.steps.len(),
                    plan.confidence
                );
                plan
            }
            None => {
                tracing::warn!("Plan generation fell back to the minimal plan");
                Plan::fallback()
            }
        }
    }
}

/// A plan with no steps gives the user nothing to do, so it counts as a failure
fn parse_plan(raw: &str) -> Option<Plan> {
    extract_json_as::<Plan>(raw).filter(|plan| !plan.steps.is_empty())
}

pub(crate) fn build_prompt(requirements: &Requirements) -> String {
    format!(
        r#"You are a senior systems engineer. Based on this extracted requirements JSON, produce a prioritized troubleshooting plan.
Output valid JSON with keys:
{{
  "confidence": integer (1-10),
  "steps": [
    {{
      "id": integer,
      "title": string,
      "description": string,
      "prechecks": [string],
      "commands": [string],
      "estimated_minutes": integer,
      "risk": "low"|"medium"|"high"
    }}
  ]
}}

Requirements:
{}

Provide steps from safest/lowest-risk to more invasive. Aim for 3-8 steps."#,
        requirements.to_canonical_json()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    fn requirements() -> Requirements {
        Requirements {
            os: Some("Windows 11".to_string()),
            ..Requirements::fallback("Wi-Fi disconnects after sleep", 1000)
        }
    }

    #[test]
    fn test_prompt_embeds_requirements() {
        let prompt = build_prompt(&requirements());
        assert!(prompt.contains("\"os\": \"Windows 11\""));
        assert!(prompt.contains("Aim for 3-8 steps"));
        assert!(prompt.contains("safest/lowest-risk"));
    }

    #[tokio::test]
    async fn test_parses_plan_and_keeps_order() {
        let oracle = Arc::new(ScriptedGenerator::repeating(
            r#"{"confidence": 8, "steps": [
                {"id": 1, "title": "Restart router", "description": "Power cycle", "risk": "low", "estimated_minutes": 5},
                {"id": 2, "title": "Update driver", "description": "Vendor driver", "risk": "medium", "commands": ["devmgmt.msc"]},
                {"id": 3, "title": "Reset network", "description": "netsh reset", "risk": "high"}
            ]}"#,
        ));
        let plan = PlanGenerator::new(oracle.clone(), PlannerConfig::default())
            .generate(&requirements())
            .await;

        assert_eq!(plan.confidence, 8);
        let titles: Vec<_> = plan.steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Restart router", "Update driver", "Reset network"]);
        assert_eq!(plan.steps[1].commands, vec!["devmgmt.msc"]);

        let calls = oracle.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.temperature, 0.45);
        assert_eq!(calls[0].1.max_new_tokens, 512);
    }

    #[tokio::test]
    async fn test_duplicate_ids_pass_through() {
        let oracle = Arc::new(ScriptedGenerator::repeating(
            r#"{"confidence": 5, "steps": [{"id": 1, "title": "A"}, {"id": 1, "title": "B"}]}"#,
        ));
        let plan = PlanGenerator::new(oracle, PlannerConfig::default())
            .generate(&requirements())
            .await;

        assert_eq!(plan.steps.len(), 2);
        assert!(plan.steps.iter().all(|s| s.id == 1));
    }

    #[tokio::test]
    async fn test_empty_steps_fall_back() {
        let oracle = Arc::new(ScriptedGenerator::repeating(r#"{"confidence": 9, "steps": []}"#));
        let plan = PlanGenerator::new(oracle.clone(), PlannerConfig::default())
            .generate(&requirements())
            .await;

        assert_eq!(plan, Plan::fallback());
        assert_eq!(oracle.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers_plan() {
        let oracle = Arc::new(ScriptedGenerator::new(vec![
            Ok("I think you should restart.".to_string()),
            Ok("{'confidence': 7, 'steps': [{'id': 1, 'title': 'Restart',},],}".to_string()),
        ]));
        let plan = PlanGenerator::new(oracle.clone(), PlannerConfig::default())
            .generate(&requirements())
            .await;

        assert_eq!(plan.confidence, 7);
        assert_eq!(plan.steps[0].title, "Restart");
        assert!(oracle.calls()[1].0.ends_with("non-empty \"steps\" array."));
    }
}
