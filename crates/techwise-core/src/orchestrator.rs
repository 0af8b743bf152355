//! Pipeline orchestrator
//!
//! Runs extraction, planning and expansion in sequence. Each stage is total,
//! so the orchestrator is too: whatever the oracle does, the caller gets a
//! complete [`PlanningResult`].

use crate::config::PlannerConfig;
use crate::expand::StepExpander;
use crate::oracle::{TextGenerator, TokenCounter};
use crate::plan::PlanGenerator;
use crate::requirements::RequirementExtractor;
use crate::types::PlanningResult;
use std::sync::Arc;
use std::time::Instant;

/// End-to-end requirement planner
#[derive(Debug, Clone)]
pub struct RequirementPlanner {
    extractor: RequirementExtractor,
    planner: PlanGenerator,
    expander: StepExpander,
}

impl RequirementPlanner {
    pub fn new(
        oracle: Arc<dyn TextGenerator>,
        tokens: Arc<dyn TokenCounter>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            extractor: RequirementExtractor::new(oracle.clone(), tokens, config.clone()),
            planner: PlanGenerator::new(oracle.clone(), config.clone()),
            expander: StepExpander::new(oracle, config),
        }
    }

    /// Run the full pipeline for one problem description
    pub async fn plan_and_generate(&self, user_text: &str) -> PlanningResult {
        let started = Instant::now();

        tracing::info!("Step 1/3: extracting requirements");
        let requirements = self.extractor.extract(user_text).await;

        tracing::info!("Step 2/3: generating plan");
        let plan = self.planner.generate(&requirements).await;

        tracing::info!("Step 3/3: expanding {} steps", plan.steps.len());
        let expanded_steps = self.expander.expand(&plan.steps, &requirements).await;

        tracing::info!(
            "Planning finished in {:.2}s",
            started.elapsed().as_secs_f64()
        );

        PlanningResult {
            requirements,
            plan,
            expanded_steps,
        }
    }

    pub fn extractor(&self) -> &RequirementExtractor {
        &self.extractor
    }

    pub fn planner(&self) -> &PlanGenerator {
        &self.planner
    }

    pub fn expander(&self) -> &StepExpander {
        &self.expander
    }
}
