use std::{io::Write, path::Path};

use anyhow::anyhow;
use coachplan_conflict::{classify as classify_food, resolve_substitutes};
use serde::Serialize;

use super::OutputFormat;
use crate::plan_file::PlanFile;

#[derive(Serialize)]
struct Classification<'a> {
    food_id: &'a str,
    verdict: coachplan_conflict::ConflictVerdict,
    substitutes: Vec<&'a str>,
    warnings: Vec<String>,
}

/// Classify a single catalog food against the plan's profile and list its safe
/// substitutes when the verdict is critical.
#[tracing::instrument(skip(plan, out), fields(plan = %plan.display()))]
pub fn classify(
    plan: &Path,
    food_id: &str,
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let plan = PlanFile::load(plan)?;
    let catalog = plan.catalog()?;
    let food = catalog
        .food(food_id)
        .ok_or_else(|| anyhow!("food {food_id} is not in the plan's catalog"))?;

    let verdict = classify_food(food, &plan.profile);
    let substitutes = if verdict.is_critical() {
        resolve_substitutes(food, &plan.profile, &catalog)
    } else {
        Default::default()
    };

    match format {
        OutputFormat::Json => {
            let classification = Classification {
                food_id,
                verdict,
                substitutes: substitutes.candidates.iter().map(|f| f.id.as_str()).collect(),
                warnings: substitutes.warnings.iter().map(ToString::to_string).collect(),
            };
            serde_json::to_writer_pretty(&mut *out, &classification)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            match verdict.trigger() {
                Some(trigger) => writeln!(
                    out,
                    "{}: {} ({})",
                    food.name,
                    verdict.kind(),
                    trigger.name
                )?,
                None => writeln!(out, "{}: {}", food.name, verdict.kind())?,
            }
            for candidate in &substitutes.candidates {
                writeln!(out, "  substitute: {}", candidate.name)?;
            }
            for warning in &substitutes.warnings {
                writeln!(out, "  warning: {warning}")?;
            }
        }
    }

    Ok(())
}
