use std::{io::Write, path::Path, str::FromStr};

use anyhow::Context;
use coachplan_conflict::{
    BucketEntry, Buckets, Command, QuantityScaling, ResolutionAggregator, ResolutionSummary,
};
use coachplan_shared::Recipe;
use serde::Serialize;

use super::OutputFormat;
use crate::{config::Config, plan_file::PlanFile};

/// A `RECIPE:INGREDIENT:FOOD` choice for a pending ingredient. Recipe and
/// ingredient ids end at the first and second colon; the food id takes the rest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub recipe_id: String,
    pub ingredient_id: String,
    pub food_id: String,
}

impl FromStr for Confirmation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(3, ':').collect();
        let [recipe_id, ingredient_id, food_id] = parts.as_slice() else {
            return Err(format!("expected RECIPE:INGREDIENT:FOOD, got '{s}'"));
        };

        if [recipe_id, ingredient_id, food_id].iter().any(|p| p.is_empty()) {
            return Err(format!("empty segment in '{s}'"));
        }

        Ok(Self {
            recipe_id: recipe_id.to_string(),
            ingredient_id: ingredient_id.to_string(),
            food_id: food_id.to_string(),
        })
    }
}

impl From<Confirmation> for Command {
    fn from(value: Confirmation) -> Self {
        Command::Confirm {
            recipe_id: value.recipe_id,
            ingredient_id: value.ingredient_id,
            chosen_food_id: value.food_id,
        }
    }
}

#[derive(Serialize)]
struct ReviewReport<'a> {
    version: u64,
    summary: ResolutionSummary,
    buckets: &'a Buckets,
    warnings: Vec<String>,
    resolved_recipes: Option<Vec<Recipe>>,
}

/// Analyze a plan file, apply the given confirmations and write the review.
///
/// Returns whether the plan ended up free of pending and manual conflicts. With
/// `review.fail_on_unresolved` set, an unresolved plan is an error once the
/// review has been written.
#[tracing::instrument(skip(config, plan, confirmations, out), fields(plan = %plan.display()))]
pub fn review(
    config: &Config,
    plan: &Path,
    confirmations: &[Confirmation],
    format: OutputFormat,
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let mut aggregator = PlanFile::load(plan)?.into_aggregator()?;

    for confirmation in confirmations {
        aggregator
            .handle(confirmation.clone().into())
            .with_context(|| {
                format!(
                    "failed to confirm {} for {}/{}",
                    confirmation.food_id, confirmation.recipe_id, confirmation.ingredient_id
                )
            })?;
    }

    let scaling = if config.review.apply_quantity_ratio {
        QuantityScaling::ApplyRatio
    } else {
        QuantityScaling::Keep
    };

    let snapshot = aggregator.snapshot();
    let conflict_free = snapshot.is_conflict_free();

    tracing::info!(
        version = snapshot.version(),
        pending = snapshot.pending().len(),
        manual = snapshot.manual().len(),
        "plan reviewed"
    );

    match format {
        OutputFormat::Json => {
            let report = ReviewReport {
                version: snapshot.version(),
                summary: snapshot.summary(),
                buckets: snapshot.buckets(),
                warnings: snapshot.warnings().map(ToString::to_string).collect(),
                resolved_recipes: aggregator.finalize(scaling).ok(),
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => write_text(&aggregator, scaling, out)?,
    }

    if !conflict_free && config.review.fail_on_unresolved {
        anyhow::bail!(
            "plan still has unresolved conflicts: {} pending, {} manual",
            snapshot.pending().len(),
            snapshot.manual().len()
        );
    }

    Ok(conflict_free)
}

fn write_text(
    aggregator: &ResolutionAggregator,
    scaling: QuantityScaling,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let snapshot = aggregator.snapshot();
    let summary = snapshot.summary();

    writeln!(
        out,
        "{} recipes, {} ingredients: {} auto-resolved, {} confirmed, {} pending, {} manual",
        summary.recipes,
        summary.ingredients,
        summary.auto_resolved,
        summary.user_resolved,
        summary.pending,
        summary.manual
    )?;

    write_bucket(out, "Resolved", &snapshot.buckets().auto_resolved)?;
    write_bucket(out, "Pending", &snapshot.buckets().pending)?;
    write_bucket(out, "Manual", &snapshot.buckets().manual)?;

    let warnings: Vec<String> = snapshot.warnings().map(ToString::to_string).collect();
    if !warnings.is_empty() {
        writeln!(out, "\nWarnings")?;
        for warning in warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    let Ok(recipes) = aggregator.finalize(scaling) else {
        return Ok(());
    };

    writeln!(out, "\nFinal plan")?;
    for recipe in recipes {
        writeln!(out, "  {}", recipe.name)?;
        for ingredient in recipe.ingredients {
            match aggregator.catalog().food(&ingredient.food_id) {
                Some(food) => writeln!(
                    out,
                    "    {} {}",
                    food.unit.format(ingredient.quantity),
                    food.name
                )?,
                None => writeln!(out, "    {} {}", ingredient.quantity, ingredient.food_id)?,
            }
        }
    }

    Ok(())
}

fn write_bucket(out: &mut impl Write, title: &str, entries: &[BucketEntry]) -> anyhow::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n{title}")?;
    for entry in entries {
        let record = &entry.record;
        let reason = record
            .verdict
            .trigger()
            .map(|t| format!("{} ({})", record.verdict.kind(), t.name))
            .unwrap_or_else(|| record.verdict.kind().to_string());

        write!(
            out,
            "  {} / {}: {} [{}]",
            entry.recipe_name,
            record.ingredient_id(),
            record.food_name(),
            reason
        )?;

        match record.chosen_substitute() {
            Some(chosen) => writeln!(out, " -> {}", chosen.name)?,
            None if record.candidate_substitutes.is_empty() => {
                writeln!(out, " -> no safe substitute")?
            }
            None => {
                let names: Vec<&str> = record
                    .candidate_substitutes
                    .iter()
                    .map(|f| f.id.as_str())
                    .collect();
                writeln!(out, " -> choose one of {}", names.join(", "))?
            }
        }
    }

    Ok(())
}
