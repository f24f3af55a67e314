use std::{path::Path, sync::Arc};

use anyhow::Context;
use coachplan_conflict::{ResolutionAggregator, SubstitutionCatalog, SubstitutionRule};
use coachplan_shared::{Food, Recipe, RestrictionProfile};
use serde::Deserialize;
use validator::Validate;

/// A client's weekly plan together with the food data needed to review it.
#[derive(Validate, Debug, Default, Deserialize)]
pub struct PlanFile {
    #[validate(nested)]
    #[serde(default)]
    pub foods: Vec<Food>,
    #[serde(default)]
    pub substitutions: Vec<SubstitutionRule>,
    #[serde(default)]
    pub profile: RestrictionProfile,
    #[validate(nested)]
    #[serde(default)]
    pub recipes: Vec<Recipe>,
}

impl PlanFile {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read plan file {}", path.display()))?;

        Self::from_json(&content).with_context(|| format!("invalid plan file {}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let plan: PlanFile = serde_json::from_str(content)?;
        plan.validate()?;

        Ok(plan)
    }

    pub fn catalog(&self) -> anyhow::Result<SubstitutionCatalog> {
        Ok(SubstitutionCatalog::new(
            self.foods.clone(),
            self.substitutions.clone(),
        )?)
    }

    pub fn into_aggregator(self) -> anyhow::Result<ResolutionAggregator> {
        let catalog = SubstitutionCatalog::new(self.foods, self.substitutions)?;

        Ok(ResolutionAggregator::analyze_all(
            &self.recipes,
            Arc::new(self.profile),
            Arc::new(catalog),
        ))
    }
}
