//! Pipeline data model
//!
//! Every record is produced once by the stage that owns it and handed
//! downstream by reference. Deserialization is lenient because the values come
//! from a generative model: wrong scalar types are coerced and missing fields
//! take neutral defaults instead of failing the whole object.

use serde::{Deserialize, Serialize};

/// Structured description of the user's problem
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub problem_summary: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub os: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub hardware: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub symptoms: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub frequency: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub triggers: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub recent_changes: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub constraints: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub desired_outcome: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub urgency: Option<String>,
}

impl Requirements {
    /// Field names in schema order
    pub const FIELDS: [&'static str; 10] = [
        "problem_summary",
        "os",
        "hardware",
        "symptoms",
        "frequency",
        "triggers",
        "recent_changes",
        "constraints",
        "desired_outcome",
        "urgency",
    ];

    /// Record used when extraction fails: the raw text, truncated to
    /// `max_chars` characters with `...` appended, and nothing else.
    pub fn fallback(user_text: &str, max_chars: usize) -> Self {
        let summary = if user_text.chars().count() > max_chars {
            let truncated: String = user_text.chars().take(max_chars).collect();
            format!("{}...", truncated)
        } else {
            user_text.to_string()
        };

        Self {
            problem_summary: Some(summary),
            ..Self::default()
        }
    }

    /// `(name, value)` pairs in schema order
    pub fn fields(&self) -> [(&'static str, Option<&str>); 10] {
        let values = [
            &self.problem_summary,
            &self.os,
            &self.hardware,
            &self.symptoms,
            &self.frequency,
            &self.triggers,
            &self.recent_changes,
            &self.constraints,
            &self.desired_outcome,
            &self.urgency,
        ];

        let mut out = [("", None); 10];
        for (slot, (name, value)) in out.iter_mut().zip(Self::FIELDS.iter().zip(values)) {
            *slot = (*name, value.as_deref());
        }
        out
    }

    /// Canonical JSON (schema order, nulls included) embedded in prompts
    pub fn to_canonical_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Single-line JSON variant for per-step prompts
    pub fn to_compact_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Prioritized remediation plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Model's self-reported confidence, intended 1-10 (not validated)
    #[serde(default, deserialize_with = "lenient::int")]
    pub confidence: i64,

    /// Steps, safest first
    pub steps: Vec<Step>,
}

impl Plan {
    /// Minimal two-step plan used when plan generation fails
    pub fn fallback() -> Self {
        Self {
            confidence: 6,
            steps: vec![
                Step {
                    id: 1,
                    title: "Check drivers".to_string(),
                    description: "Update or reinstall Wi-Fi drivers from vendor.".to_string(),
                    prechecks: vec![
                        "Identify adapter model".to_string(),
                        "Backup current driver".to_string(),
                    ],
                    commands: Vec::new(),
                    estimated_minutes: 15,
                    risk: "low".to_string(),
                },
                Step {
                    id: 2,
                    title: "Power settings".to_string(),
                    description: "Disable power saving for adapter".to_string(),
                    prechecks: Vec::new(),
                    commands: Vec::new(),
                    estimated_minutes: 5,
                    risk: "low".to_string(),
                },
            ],
        }
    }
}

/// One atomic remediation action
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    #[serde(deserialize_with = "lenient::int")]
    pub id: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string_list")]
    pub prechecks: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub commands: Vec<String>,
    #[serde(deserialize_with = "lenient::int")]
    pub estimated_minutes: i64,
    /// Expected `low`/`medium`/`high`; any string is accepted
    #[serde(deserialize_with = "lenient::string")]
    pub risk: String,
}

/// A step expanded into full operator guidance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedStep {
    pub id: i64,
    pub title: String,
    pub guide: String,
    pub commands: Vec<String>,
    pub verification: String,
    pub rollback: String,
}

impl ExpandedStep {
    pub const FALLBACK_VERIFICATION: &'static str = "Check connectivity and logs.";
    pub const FALLBACK_ROLLBACK: &'static str = "Reinstall previous driver or undo changes.";

    /// Package the step's own description as its guide
    pub fn fallback(step: &Step) -> Self {
        Self {
            id: step.id,
            title: step.title.clone(),
            guide: step.description.clone(),
            commands: step.commands.clone(),
            verification: Self::FALLBACK_VERIFICATION.to_string(),
            rollback: Self::FALLBACK_ROLLBACK.to_string(),
        }
    }
}

/// Everything the pipeline produced for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningResult {
    pub requirements: Requirements,
    pub plan: Plan,
    pub expanded_steps: Vec<ExpandedStep>,
}

/// Deserializers that coerce whatever the model produced into the field type
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(value_to_string(Value::deserialize(d)?))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(value_to_string(Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        let parsed = match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let digits: String = s
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '-')
                    .collect();
                digits.parse().ok()
            }
            _ => None,
        };
        Ok(parsed.unwrap_or_default())
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(value_to_string).collect(),
            Value::Null => Vec::new(),
            other => value_to_string(other).into_iter().collect(),
        })
    }

    pub fn opt_string_list<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Null => None,
            Value::Array(items) => Some(items.into_iter().filter_map(value_to_string).collect()),
            other => Some(value_to_string(other).into_iter().collect()),
        })
    }
}
