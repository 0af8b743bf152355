//! End-to-end pipeline tests against stub oracles

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use techwise_core::report::to_human_report;
use techwise_core::{
    ExpandedStep, GenerationParams, OracleError, Plan, PlannerConfig, RequirementPlanner,
    Requirements, TextGenerator, WhitespaceTokenCounter,
};

/// Returns the same text for every prompt and counts calls by stage
#[derive(Debug, Default)]
struct FixedOracle {
    output: String,
    summary_calls: AtomicUsize,
    total_calls: AtomicUsize,
}

impl FixedOracle {
    fn new(output: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            output: output.into(),
            ..Self::default()
        })
    }
}

#[async_trait]
impl TextGenerator for FixedOracle {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, OracleError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if prompt.starts_with("Summarize") {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.output.clone())
    }
}

/// Answers each stage with well-formed JSON
#[derive(Debug)]
struct StagedOracle;

#[async_trait]
impl TextGenerator for StagedOracle {
    fn name(&self) -> &str {
        "staged"
    }

    async fn generate(
        &self,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, OracleError> {
        let out = if prompt.starts_with("You are a requirements extractor") {
            r#"{"problem_summary": "VPN drops on hotel Wi-Fi", "os": "Windows 10", "urgency": "high"}"#
        } else if prompt.starts_with("You are a senior systems engineer") {
            r#"Here is the plan:
            {"confidence": 7, "steps": [
              {"id": 1, "title": "Check captive portal", "description": "Log in to the hotel portal first", "risk": "low", "estimated_minutes": 2},
              {"id": 2, "title": "Switch VPN protocol", "description": "Use TCP 443", "risk": "low", "estimated_minutes": 5, "commands": ["vpncli set-protocol tcp"]},
              {"id": 3, "title": "Lower MTU", "description": "Set MTU to 1400", "risk": "medium", "estimated_minutes": 10}
            ]}
            Let me know if you need more."#
        } else {
            r#"{'guide': 'Follow the description.', 'verification': 'VPN stays up for an hour', 'rollback': 'Revert the setting',}"#
        };
        Ok(out.to_string())
    }
}

/// Always fails
#[derive(Debug)]
struct BrokenOracle;

#[async_trait]
impl TextGenerator for BrokenOracle {
    fn name(&self) -> &str {
        "broken"
    }

    async fn generate(
        &self,
        _prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, OracleError> {
        Err(OracleError::Transport("connection refused".to_string()))
    }
}

fn planner(oracle: Arc<dyn TextGenerator>) -> RequirementPlanner {
    RequirementPlanner::new(oracle, Arc::new(WhitespaceTokenCounter), PlannerConfig::default())
}

fn assert_well_formed(result: &techwise_core::PlanningResult) {
    assert!(result.requirements.problem_summary.is_some());
    assert!(!result.plan.steps.is_empty());
    assert_eq!(result.expanded_steps.len(), result.plan.steps.len());
    for (step, expanded) in result.plan.steps.iter().zip(&result.expanded_steps) {
        assert_eq!(step.id, expanded.id);
        assert_eq!(step.title, expanded.title);
    }
}

#[tokio::test]
async fn test_full_pipeline_with_well_behaved_oracle() {
    let result = planner(Arc::new(StagedOracle))
        .plan_and_generate("My VPN keeps dropping whenever I'm on hotel Wi-Fi")
        .await;

    assert_well_formed(&result);
    assert_eq!(result.requirements.urgency.as_deref(), Some("high"));
    assert_eq!(result.plan.confidence, 7);
    assert_eq!(result.plan.steps.len(), 3);

    let switch = &result.expanded_steps[1];
    assert_eq!(switch.title, "Switch VPN protocol");
    assert_eq!(switch.guide, "Follow the description.");
    // the draft had no commands key, so the plan's commands carry over
    assert_eq!(switch.commands, vec!["vpncli set-protocol tcp"]);

    let report = to_human_report(&result);
    assert!(report.contains("- os: Windows 10"));
    assert!(report.contains("3. Lower MTU  (risk: medium, ~10m)"));
    assert!(report.contains("Verification: VPN stays up for an hour"));
}

#[tokio::test]
async fn test_garbage_oracle_gives_exact_fallbacks() {
    let result = planner(FixedOracle::new("I cannot help with that."))
        .plan_and_generate("Outlook crashes on start")
        .await;

    assert_eq!(
        result.requirements,
        Requirements::fallback("Outlook crashes on start", 1000)
    );
    assert_eq!(result.plan, Plan::fallback());
    for (step, expanded) in result.plan.steps.iter().zip(&result.expanded_steps) {
        assert_eq!(expanded, &ExpandedStep::fallback(step));
    }
}

#[tokio::test]
async fn test_failing_oracle_never_fails_the_pipeline() {
    let result = planner(Arc::new(BrokenOracle))
        .plan_and_generate("Printer queue stuck")
        .await;
    assert_well_formed(&result);
    assert_eq!(result.plan, Plan::fallback());
}

#[tokio::test]
async fn test_fallback_plan_is_byte_identical_across_runs() {
    let first = planner(FixedOracle::new("nope")).plan_and_generate("disk full").await;
    let second = planner(FixedOracle::new("nope")).plan_and_generate("disk full").await;

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(to_human_report(&first), to_human_report(&second));
}

#[tokio::test]
async fn test_summarization_threshold() {
    let at_threshold = "word ".repeat(900);
    let oracle = FixedOracle::new("garbage");
    planner(oracle.clone()).plan_and_generate(&at_threshold).await;
    assert_eq!(oracle.summary_calls.load(Ordering::SeqCst), 0);

    let over_threshold = "word ".repeat(901);
    let oracle = FixedOracle::new("garbage");
    planner(oracle.clone()).plan_and_generate(&over_threshold).await;
    assert_eq!(oracle.summary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_oracle_call_budget_with_garbage() {
    // extraction x2, plan x2, two fallback steps x2 each
    let oracle = FixedOracle::new("garbage");
    planner(oracle.clone()).plan_and_generate("short").await;
    assert_eq!(oracle.total_calls.load(Ordering::SeqCst), 8);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_pipeline_is_total(user_text in ".{0,300}", oracle_output in ".{0,300}") {
        let result = tokio_test::block_on(
            planner(FixedOracle::new(oracle_output)).plan_and_generate(&user_text),
        );

        prop_assert!(result.requirements.problem_summary.is_some());
        prop_assert!(!result.plan.steps.is_empty());
        prop_assert_eq!(result.expanded_steps.len(), result.plan.steps.len());
        for (step, expanded) in result.plan.steps.iter().zip(&result.expanded_steps) {
            prop_assert_eq!(step.id, expanded.id);
            prop_assert_eq!(&step.title, &expanded.title);
        }
        prop_assert!(to_human_report(&result).contains("=== Detailed Steps ==="));
    }

    #[test]
    fn prop_steps_survive_in_order(titles in prop::collection::vec("[A-Za-z ]{1,20}", 1..6)) {
        let steps: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| serde_json::json!({"id": i + 1, "title": t, "description": "d"}))
            .collect();
        let output = serde_json::json!({"confidence": 5, "steps": steps}).to_string();

        let result = tokio_test::block_on(
            planner(FixedOracle::new(output)).plan_and_generate("anything"),
        );

        let got: Vec<_> = result.expanded_steps.iter().map(|s| s.title.clone()).collect();
        prop_assert_eq!(got, titles);
    }
}
