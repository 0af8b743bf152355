//! Free-form project advisor
//!
//! Answers open questions ("how do I build a support chatbot?") with a
//! sectioned plan. The prompt carries a short style example that the model
//! must not echo, so every answer goes through [`AdviceQualityGate`] and a
//! rule-based plan is returned when both attempts are rejected.

use crate::config::PlannerConfig;
use crate::input::{clean_text, normalize_text};
use crate::oracle::TextGenerator;
use crate::retry::QualityGate;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"\w+").unwrap();
}

const EXAMPLE_QUESTION: &str = "How can I automate file backups on Windows?";

const EXAMPLE_ANSWER: &str = "Goal: Automate file backups.\n\
Tech Stack: Python (shutil), Task Scheduler.\n\
Plan:\n1. Identify folders.\n2. Write copy script.\n3. Test locally.\n4. Schedule job.\n\
Notes: Use logging.";

/// Condensed form of the style example; answers too close to it are rejected
pub const BANNED_TEMPLATE: &str = "Goal: Automate file backups.\n\
Tech Stack: Python (shutil), Task Scheduler.\n\
Plan: 1. Identify folders. 2. Write script. 3. Test. 4. Schedule.";

pub const FALLBACK_NOTICE: &str =
    "(Automatic fallback: model output failed quality checks; here's a deterministic plan.)";

const EXPAND_REPROMPT: &str =
    "\n\nExpand your response: give concrete detail for every section.";

/// Acceptance rules for a generated answer
#[derive(Debug, Clone)]
pub struct AdviceQualityGate {
    query_tokens: BTreeSet<String>,
    banned: String,
    min_chars: usize,
    min_words: usize,
    max_similarity: f64,
}

impl AdviceQualityGate {
    pub fn new(query: &str) -> Self {
        let query_tokens = WORD
            .find_iter(&query.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect();

        Self {
            query_tokens,
            banned: normalize_text(BANNED_TEMPLATE),
            min_chars: 120,
            min_words: 40,
            max_similarity: 0.75,
        }
    }

    /// Number of query tokens the answer has to mention
    pub fn required_mentions(&self) -> usize {
        (self.query_tokens.len() / 4).clamp(1, 3)
    }
}

impl QualityGate for AdviceQualityGate {
    fn passes(&self, output: &str) -> bool {
        let output = output.trim();
        if output.chars().count() < self.min_chars {
            return false;
        }
        if output.split_whitespace().count() < self.min_words {
            return false;
        }

        let lowered = output.to_lowercase();
        let mentioned = self
            .query_tokens
            .iter()
            .filter(|token| lowered.contains(token.as_str()))
            .count();
        if mentioned < self.required_mentions() {
            return false;
        }

        similarity(&normalize_text(output), &self.banned) <= self.max_similarity
    }
}

/// Generates free-form advice with a validated retry and a rule-based fallback
#[derive(Debug, Clone)]
pub struct Advisor {
    oracle: Arc<dyn TextGenerator>,
    config: PlannerConfig,
}

impl Advisor {
    pub fn new(oracle: Arc<dyn TextGenerator>, config: PlannerConfig) -> Self {
        Self { oracle, config }
    }

    /// Answer `query`, optionally grounded in `context_summary`. Never fails.
    pub async fn generate_advice(&self, query: &str, context_summary: &str) -> String {
        let query = clean_text(query);
        let gate = AdviceQualityGate::new(&query);
        let prompt = build_prompt(&query, context_summary);

        tracing::info!("Generating advice ({} query tokens)", gate.query_tokens.len());

        let answer = self
            .config
            .advice_retry
            .run(
                self.oracle.as_ref(),
                "advice",
                &prompt,
                &self.config.advice_params,
                EXPAND_REPROMPT,
                |raw| gate.passes(raw).then(|| raw.trim().to_string()),
            )
            .await;

        answer.unwrap_or_else(|| {
            tracing::warn!("Advice failed quality checks, returning rule-based plan");
            format!("{}\n\n{}", rule_based_plan(&query), FALLBACK_NOTICE)
        })
    }
}

pub(crate) fn build_prompt(query: &str, context_summary: &str) -> String {
    format!(
        r#"You are TechWISE Advisor, an expert IT project planner.

INSTRUCTIONS:
- Produce a fresh, original plan tailored to the user's question.
- Output must include these sections (in this order): Goal, Recommended Tech Stack, Step-by-Step Plan, Testing & Deployment, Notes & Reasoning.
- Do NOT copy the example below; it is provided for style only and must NOT be repeated verbatim.

=== EXAMPLE (STYLE ONLY) ===
Question: {example_question}
Answer:
{example_answer}
=== END EXAMPLE ===

User Question: {query}
Web Context Summary: {context}

Now produce a unique, detailed answer that follows the section order exactly."#,
        example_question = EXAMPLE_QUESTION,
        example_answer = EXAMPLE_ANSWER,
        query = query,
        context = context_summary,
    )
}

/// Deterministic project plan keyed on a coarse domain guess
pub fn rule_based_plan(query: &str) -> String {
    let lowered = query.to_lowercase();
    let domain = if lowered.contains("bot") {
        "Chatbot"
    } else if lowered.contains("web") {
        "Web application"
    } else {
        "General IT project"
    };

    [
        format!("**Goal:** Build a {} to satisfy: {}", domain, query),
        "**Recommended Tech Stack:** Python, Flask, SQLite (start), simple frontend (HTML/CSS/JS)."
            .to_string(),
        "**Step-by-Step Plan:**".to_string(),
        "1) Clarify requirements: users, example dialogues, must-have features.".to_string(),
        "2) Design minimal data model and endpoints.".to_string(),
        "3) Implement MVP: core functionality only.".to_string(),
        "4) Add tests and logging.".to_string(),
        "5) Deploy locally or on small host.".to_string(),
        "**Testing & Deployment:** Unit tests + manual end-to-end checks. Deploy to a small VM or PaaS."
            .to_string(),
        "**Notes & Reasoning:** Start simple; iterate once you have real user interactions."
            .to_string(),
    ]
    .join("\n")
}

/// Ratcliff/Obershelp similarity in `[0, 1]`: twice the matched characters
/// over the combined length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * matching_chars(&a, &b)) as f64 / total as f64
}

/// Sum of the recursively found longest common blocks
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, len) = longest_match(a, b, alo, ahi, blo, bhi);
        if len == 0 {
            continue;
        }
        matched += len;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + len < ahi && j + len < bhi {
            pending.push((i + len, ahi, j + len, bhi));
        }
    }

    matched
}

/// Longest common run within `a[alo..ahi]` and `b[blo..bhi]`, earliest first
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);

    for i in alo..ahi {
        for j in blo..bhi {
            let k = j - blo;
            curr[k + 1] = if a[i] == b[j] { prev[k] + 1 } else { 0 };
            if curr[k + 1] > best_len {
                best_len = curr[k + 1];
                best_i = i + 1 - best_len;
                best_j = j + 1 - best_len;
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    (best_i, best_j, best_len)
}
