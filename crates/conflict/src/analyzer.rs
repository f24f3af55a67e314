use std::fmt;

use coachplan_shared::{Food, Ingredient, Recipe, RestrictionProfile};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString, VariantArray};

use crate::catalog::SubstitutionCatalog;
use crate::classifier::{classify, ConflictVerdict};
use crate::substitution::resolve_substitutes;

#[derive(
    EnumString,
    Display,
    AsRefStr,
    VariantArray,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionState {
    /// Verdict is informational or none.
    NoAction,
    /// Exactly one safe substitute, applied without user input.
    AutoResolved,
    /// A pending choice confirmed by the user.
    UserResolved,
    /// Two or more safe substitutes, none chosen yet.
    Pending,
    /// No safe substitute: the recipe has to be edited by hand.
    Manual,
}

/// Reference data gap met during analysis. Never fatal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    UnknownFood {
        recipe_id: String,
        ingredient_id: String,
        food_id: String,
    },
    UnknownSubstitute {
        source_food_id: String,
        target_food_id: String,
    },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::UnknownFood {
                recipe_id,
                ingredient_id,
                food_id,
            } => write!(
                f,
                "ingredient {ingredient_id} of recipe {recipe_id} references unknown food {food_id}"
            ),
            DataWarning::UnknownSubstitute {
                source_food_id,
                target_food_id,
            } => write!(
                f,
                "substitution {source_food_id} -> {target_food_id} references unknown food {target_food_id}"
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolutionRecord {
    pub recipe_id: String,
    pub ingredient: Ingredient,
    /// `None` when the ingredient's food is missing from the catalog.
    pub food: Option<Food>,
    pub verdict: ConflictVerdict,
    pub candidate_substitutes: Vec<Food>,
    pub chosen_substitute_id: Option<String>,
    pub state: ResolutionState,
    pub warnings: Vec<DataWarning>,
}

impl ResolutionRecord {
    pub fn ingredient_id(&self) -> &str {
        &self.ingredient.id
    }

    pub fn food_name(&self) -> &str {
        self.food
            .as_ref()
            .map(|f| f.name.as_str())
            .unwrap_or(self.ingredient.food_id.as_str())
    }

    pub fn chosen_substitute(&self) -> Option<&Food> {
        let chosen = self.chosen_substitute_id.as_deref()?;
        self.candidate_substitutes.iter().find(|f| f.id == chosen)
    }

    pub fn is_candidate(&self, food_id: &str) -> bool {
        self.candidate_substitutes.iter().any(|f| f.id == food_id)
    }

    pub(crate) fn choose(&mut self, food_id: &str) {
        self.chosen_substitute_id = Some(food_id.to_owned());
        self.state = ResolutionState::UserResolved;
    }
}

/// Resolution records for every ingredient of `recipe`, in ingredient order.
#[tracing::instrument(skip_all, fields(recipe_id = %recipe.id))]
pub fn analyze(
    recipe: &Recipe,
    profile: &RestrictionProfile,
    catalog: &SubstitutionCatalog,
) -> Vec<ResolutionRecord> {
    recipe
        .ingredients
        .iter()
        .map(|ingredient| analyze_ingredient(&recipe.id, ingredient, profile, catalog))
        .collect()
}

fn analyze_ingredient(
    recipe_id: &str,
    ingredient: &Ingredient,
    profile: &RestrictionProfile,
    catalog: &SubstitutionCatalog,
) -> ResolutionRecord {
    let mut record = ResolutionRecord {
        recipe_id: recipe_id.to_owned(),
        ingredient: ingredient.clone(),
        food: None,
        verdict: ConflictVerdict::None,
        candidate_substitutes: vec![],
        chosen_substitute_id: None,
        state: ResolutionState::NoAction,
        warnings: vec![],
    };

    // An unrecognised ingredient cannot be asserted unsafe.
    let Some(food) = catalog.food(&ingredient.food_id) else {
        tracing::warn!(
            recipe_id,
            ingredient_id = %ingredient.id,
            food_id = %ingredient.food_id,
            "ingredient references unknown food, treating as unrestricted"
        );
        record.warnings.push(DataWarning::UnknownFood {
            recipe_id: recipe_id.to_owned(),
            ingredient_id: ingredient.id.to_owned(),
            food_id: ingredient.food_id.to_owned(),
        });
        return record;
    };

    record.food = Some(food.clone());
    record.verdict = classify(food, profile);

    if !record.verdict.is_critical() {
        return record;
    }

    let substitutes = resolve_substitutes(food, profile, catalog);
    record.warnings = substitutes.warnings;
    record.candidate_substitutes = substitutes.candidates;

    match record.candidate_substitutes.as_slice() {
        [] => record.state = ResolutionState::Manual,
        [only] => {
            record.chosen_substitute_id = Some(only.id.to_owned());
            record.state = ResolutionState::AutoResolved;
        }
        _ => record.state = ResolutionState::Pending,
    }

    tracing::debug!(
        recipe_id,
        ingredient_id = %ingredient.id,
        verdict = %record.verdict.kind(),
        candidates = record.candidate_substitutes.len(),
        state = %record.state,
        "critical ingredient analysed"
    );

    record
}
