//! Plain-text rendering of a [`PlanningResult`]

use crate::types::PlanningResult;
use std::fmt::Write;

/// Placeholder for requirement fields the extractor could not fill
pub const MISSING: &str = "—";

/// Placeholder for an unknown step risk or time estimate
pub const UNKNOWN: &str = "?";

/// Render the human-readable report.
///
/// Sections: extracted requirements, plan summary, detailed steps. The report
/// only reads the result, so rendering the same result twice gives the same
/// text.
pub fn to_human_report(result: &PlanningResult) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    render(&mut out, result).ok();
    out
}

fn render(out: &mut String, result: &PlanningResult) -> std::fmt::Result {
    write_requirements(out, result)?;
    write_plan(out, result)?;
    write_steps(out, result)
}

fn write_requirements(out: &mut String, result: &PlanningResult) -> std::fmt::Result {
    writeln!(out, "=== Extracted Requirements ===")?;
    for (name, value) in result.requirements.fields() {
        let value = value.filter(|v| !v.trim().is_empty()).unwrap_or(MISSING);
        writeln!(out, "- {}: {}", name, value)?;
    }
    Ok(())
}

fn write_plan(out: &mut String, result: &PlanningResult) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "=== Plan (summary) ===")?;
    writeln!(out, "Confidence: {}/10", result.plan.confidence)?;
    for step in &result.plan.steps {
        let risk = match step.risk.trim() {
            "" => UNKNOWN,
            risk => risk,
        };
        let minutes = if step.estimated_minutes > 0 {
            step.estimated_minutes.to_string()
        } else {
            UNKNOWN.to_string()
        };
        writeln!(out, "{}. {}  (risk: {}, ~{}m)", step.id, step.title, risk, minutes)?;
        if !step.prechecks.is_empty() {
            writeln!(out, "   Prechecks: {}", step.prechecks.join("; "))?;
        }
    }
    Ok(())
}

fn write_steps(out: &mut String, result: &PlanningResult) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "=== Detailed Steps ===")?;
    for step in &result.expanded_steps {
        writeln!(out)?;
        writeln!(out, "{}. {}", step.id, step.title)?;
        writeln!(out)?;
        writeln!(out, "{}", step.guide)?;
        if !step.commands.is_empty() {
            writeln!(out, "Commands / Examples:")?;
            for command in &step.commands {
                writeln!(out, "  {}", command)?;
            }
        }
        writeln!(out, "Verification: {}", step.verification)?;
        writeln!(out, "Rollback: {}", step.rollback)?;
    }
    Ok(())
}
