use std::collections::HashSet;
use std::sync::Arc;

use coachplan_shared::{Ingredient, Recipe, RestrictionProfile};
use serde::Serialize;
use validator::Validate;

use crate::analyzer::{analyze, DataWarning, ResolutionRecord, ResolutionState};
use crate::catalog::SubstitutionCatalog;
use crate::classifier::VerdictKind;
use crate::error::{ConflictError, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecipeResolution {
    pub recipe: Recipe,
    pub records: Vec<ResolutionRecord>,
}

impl RecipeResolution {
    fn analyze(
        recipe: Recipe,
        profile: &RestrictionProfile,
        catalog: &SubstitutionCatalog,
    ) -> Self {
        let records = analyze(&recipe, profile, catalog);
        Self { recipe, records }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BucketEntry {
    pub recipe_id: String,
    pub recipe_name: String,
    pub record: ResolutionRecord,
}

/// Critical records partitioned by state. Every critical record lands in
/// exactly one bucket; `NoAction` records are left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Buckets {
    pub auto_resolved: Vec<BucketEntry>,
    pub pending: Vec<BucketEntry>,
    pub manual: Vec<BucketEntry>,
}

impl Buckets {
    fn partition(recipes: &[RecipeResolution]) -> Self {
        let mut buckets = Buckets::default();

        for resolution in recipes {
            for record in &resolution.records {
                let bucket = match record.state {
                    ResolutionState::NoAction => continue,
                    ResolutionState::AutoResolved | ResolutionState::UserResolved => {
                        &mut buckets.auto_resolved
                    }
                    ResolutionState::Pending => &mut buckets.pending,
                    ResolutionState::Manual => &mut buckets.manual,
                };

                bucket.push(BucketEntry {
                    recipe_id: resolution.recipe.id.to_owned(),
                    recipe_name: resolution.recipe.name.to_owned(),
                    record: record.clone(),
                });
            }
        }

        buckets
    }

    pub fn is_conflict_free(&self) -> bool {
        self.pending.is_empty() && self.manual.is_empty()
    }

    pub fn len(&self) -> usize {
        self.auto_resolved.len() + self.pending.len() + self.manual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub recipes: usize,
    pub ingredients: usize,
    pub auto_resolved: usize,
    pub user_resolved: usize,
    pub pending: usize,
    pub manual: usize,
    pub recommended: usize,
    pub preferred: usize,
    pub warnings: usize,
}

/// Immutable view of a plan's resolution state. Commands produce a new
/// snapshot; holders of an older one keep seeing it unchanged.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolutionSnapshot {
    version: u64,
    recipes: Vec<RecipeResolution>,
    buckets: Buckets,
}

impl ResolutionSnapshot {
    fn new(version: u64, recipes: Vec<RecipeResolution>) -> Self {
        let buckets = Buckets::partition(&recipes);
        Self {
            version,
            recipes,
            buckets,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn recipes(&self) -> &[RecipeResolution] {
        &self.recipes
    }

    pub fn recipe(&self, recipe_id: &str) -> Option<&RecipeResolution> {
        self.recipes.iter().find(|r| r.recipe.id == recipe_id)
    }

    pub fn record(&self, recipe_id: &str, ingredient_id: &str) -> Option<&ResolutionRecord> {
        self.recipe(recipe_id)?
            .records
            .iter()
            .find(|r| r.ingredient.id == ingredient_id)
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn auto_resolved(&self) -> &[BucketEntry] {
        &self.buckets.auto_resolved
    }

    pub fn pending(&self) -> &[BucketEntry] {
        &self.buckets.pending
    }

    pub fn manual(&self) -> &[BucketEntry] {
        &self.buckets.manual
    }

    /// A plan can be finalized only with no pending and no manual records.
    pub fn is_conflict_free(&self) -> bool {
        self.buckets.is_conflict_free()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DataWarning> {
        self.recipes
            .iter()
            .flat_map(|r| &r.records)
            .flat_map(|record| &record.warnings)
    }

    pub fn summary(&self) -> ResolutionSummary {
        let mut summary = ResolutionSummary {
            recipes: self.recipes.len(),
            ..Default::default()
        };

        for record in self.recipes.iter().flat_map(|r| &r.records) {
            summary.ingredients += 1;
            summary.warnings += record.warnings.len();

            match record.state {
                ResolutionState::AutoResolved => summary.auto_resolved += 1,
                ResolutionState::UserResolved => summary.user_resolved += 1,
                ResolutionState::Pending => summary.pending += 1,
                ResolutionState::Manual => summary.manual += 1,
                ResolutionState::NoAction => match record.verdict.kind() {
                    VerdictKind::ConditionRecommend => summary.recommended += 1,
                    VerdictKind::Preferred => summary.preferred += 1,
                    _ => {}
                },
            }
        }

        summary
    }
}

/// Analyze every recipe of a plan and bucket the critical records.
#[tracing::instrument(skip_all, fields(recipes = recipes.len()))]
pub fn analyze_all(
    recipes: &[Recipe],
    profile: &RestrictionProfile,
    catalog: &SubstitutionCatalog,
) -> ResolutionSnapshot {
    let mut seen = HashSet::new();
    for recipe in recipes {
        if !seen.insert(recipe.id.as_str()) {
            tracing::warn!(
                recipe_id = %recipe.id,
                "duplicate recipe id, commands will address the first occurrence"
            );
        }
    }

    let resolutions = recipes
        .iter()
        .cloned()
        .map(|recipe| RecipeResolution::analyze(recipe, profile, catalog))
        .collect();

    ResolutionSnapshot::new(0, resolutions)
}

/// Messages a review session sends to its aggregator.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Confirm {
        recipe_id: String,
        ingredient_id: String,
        chosen_food_id: String,
    },
    Override {
        recipe_id: String,
        ingredients: Vec<Ingredient>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuantityScaling {
    #[default]
    Keep,
    /// Multiply by the substitution rule's ratio.
    ApplyRatio,
}

/// Owns one client's review session.
///
/// Profile and catalog are shared read-only data; the current snapshot is
/// replaced wholesale on each successful command and left untouched when a
/// command is rejected. Calls against one aggregator must be serialized by the
/// caller.
#[derive(Clone, Debug)]
pub struct ResolutionAggregator {
    profile: Arc<RestrictionProfile>,
    catalog: Arc<SubstitutionCatalog>,
    snapshot: Arc<ResolutionSnapshot>,
}

impl ResolutionAggregator {
    pub fn analyze_all(
        recipes: &[Recipe],
        profile: Arc<RestrictionProfile>,
        catalog: Arc<SubstitutionCatalog>,
    ) -> Self {
        let snapshot = Arc::new(analyze_all(recipes, &profile, &catalog));
        Self {
            profile,
            catalog,
            snapshot,
        }
    }

    pub fn snapshot(&self) -> Arc<ResolutionSnapshot> {
        self.snapshot.clone()
    }

    pub fn profile(&self) -> &RestrictionProfile {
        &self.profile
    }

    pub fn catalog(&self) -> &SubstitutionCatalog {
        &self.catalog
    }

    pub fn handle(&mut self, command: Command) -> Result<Arc<ResolutionSnapshot>> {
        match command {
            Command::Confirm {
                recipe_id,
                ingredient_id,
                chosen_food_id,
            } => self.confirm_substitution(&recipe_id, &ingredient_id, &chosen_food_id),
            Command::Override {
                recipe_id,
                ingredients,
            } => self.override_manual(&recipe_id, ingredients),
        }
    }

    /// Record the user's choice for a pending ingredient.
    ///
    /// A user-resolved record may be confirmed again to change its choice. A
    /// manual record cannot be confirmed away: only an ingredient edit fixes it.
    #[tracing::instrument(skip(self))]
    pub fn confirm_substitution(
        &mut self,
        recipe_id: &str,
        ingredient_id: &str,
        chosen_food_id: &str,
    ) -> Result<Arc<ResolutionSnapshot>> {
        let recipe_index = self.recipe_index(recipe_id)?;
        let record_index = self.snapshot.recipes[recipe_index]
            .records
            .iter()
            .position(|r| r.ingredient.id == ingredient_id)
            .ok_or_else(|| ConflictError::IngredientNotFound {
                recipe_id: recipe_id.to_owned(),
                ingredient_id: ingredient_id.to_owned(),
            })?;

        let record = &self.snapshot.recipes[recipe_index].records[record_index];

        if !matches!(
            record.state,
            ResolutionState::Pending | ResolutionState::UserResolved
        ) {
            return Err(ConflictError::NotPending {
                recipe_id: recipe_id.to_owned(),
                ingredient_id: ingredient_id.to_owned(),
                state: record.state,
            });
        }

        if !record.is_candidate(chosen_food_id) {
            return Err(ConflictError::InvalidSelection {
                recipe_id: recipe_id.to_owned(),
                ingredient_id: ingredient_id.to_owned(),
                food_id: chosen_food_id.to_owned(),
            });
        }

        let mut recipes = self.snapshot.recipes.clone();
        recipes[recipe_index].records[record_index].choose(chosen_food_id);

        tracing::info!(recipe_id, ingredient_id, chosen_food_id, "substitution confirmed");

        Ok(self.commit(recipes))
    }

    /// Replace a recipe's ingredient list after a hand edit and re-analyze that
    /// recipe only. Earlier choices survive for ingredients whose id and food
    /// are unchanged and whose chosen substitute is still a candidate.
    #[tracing::instrument(skip(self, ingredients), fields(ingredients = ingredients.len()))]
    pub fn override_manual(
        &mut self,
        recipe_id: &str,
        ingredients: Vec<Ingredient>,
    ) -> Result<Arc<ResolutionSnapshot>> {
        let recipe_index = self.recipe_index(recipe_id)?;
        let previous = &self.snapshot.recipes[recipe_index];

        let recipe = Recipe {
            ingredients,
            ..previous.recipe.clone()
        };
        recipe.validate()?;

        let mut resolution = RecipeResolution::analyze(recipe, &self.profile, &self.catalog);
        carry_over_choices(&previous.records, &mut resolution.records);

        let mut recipes = self.snapshot.recipes.clone();
        recipes[recipe_index] = resolution;

        tracing::info!(recipe_id, "recipe ingredients overridden");

        Ok(self.commit(recipes))
    }

    /// Recipes with every chosen substitute swapped in. Pending and manual
    /// ingredients are left as they are.
    pub fn resolved_recipes(&self, scaling: QuantityScaling) -> Vec<Recipe> {
        self.snapshot
            .recipes
            .iter()
            .map(|resolution| Recipe {
                ingredients: resolution
                    .records
                    .iter()
                    .map(|record| self.resolved_ingredient(record, scaling))
                    .collect(),
                ..resolution.recipe.clone()
            })
            .collect()
    }

    pub fn finalize(&self, scaling: QuantityScaling) -> Result<Vec<Recipe>> {
        let buckets = self.snapshot.buckets();
        if !buckets.is_conflict_free() {
            return Err(ConflictError::Unresolved {
                pending: buckets.pending.len(),
                manual: buckets.manual.len(),
            });
        }

        Ok(self.resolved_recipes(scaling))
    }

    fn resolved_ingredient(
        &self,
        record: &ResolutionRecord,
        scaling: QuantityScaling,
    ) -> Ingredient {
        let Some(chosen) = record.chosen_substitute_id.as_deref() else {
            return record.ingredient.clone();
        };

        let ratio = match scaling {
            QuantityScaling::Keep => 1.0,
            QuantityScaling::ApplyRatio => self
                .catalog
                .rule(&record.ingredient.food_id, chosen)
                .map(|rule| rule.ratio)
                .unwrap_or(1.0),
        };

        Ingredient {
            food_id: chosen.to_owned(),
            quantity: record.ingredient.quantity * ratio,
            ..record.ingredient.clone()
        }
    }

    fn recipe_index(&self, recipe_id: &str) -> Result<usize> {
        self.snapshot
            .recipes
            .iter()
            .position(|r| r.recipe.id == recipe_id)
            .ok_or_else(|| ConflictError::RecipeNotFound(recipe_id.to_owned()))
    }

    fn commit(&mut self, recipes: Vec<RecipeResolution>) -> Arc<ResolutionSnapshot> {
        self.snapshot = Arc::new(ResolutionSnapshot::new(self.snapshot.version + 1, recipes));
        self.snapshot.clone()
    }
}

fn carry_over_choices(previous: &[ResolutionRecord], current: &mut [ResolutionRecord]) {
    for record in current
        .iter_mut()
        .filter(|r| r.state == ResolutionState::Pending)
    {
        let kept = previous.iter().find(|old| {
            old.state == ResolutionState::UserResolved
                && old.ingredient.id == record.ingredient.id
                && old.ingredient.food_id == record.ingredient.food_id
        });

        let chosen = kept
            .and_then(|old| old.chosen_substitute_id.as_deref())
            .filter(|chosen| record.is_candidate(chosen));

        if let Some(chosen) = chosen {
            record.choose(chosen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SubstitutionRule;
    use coachplan_shared::Food;

    fn catalog() -> Arc<SubstitutionCatalog> {
        Arc::new(
            SubstitutionCatalog::new(
                vec![
                    Food::new("milk", "Whole Milk").avoid_for("lactose"),
                    Food::new("almond_milk", "Almond Milk"),
                    Food::new("rice", "White Rice").avoid_for("diabetes"),
                    Food::new("brown_rice", "Brown Rice"),
                    Food::new("quinoa", "Quinoa"),
                    Food::new("peanut", "Peanut").sensitivity("S1"),
                    Food::new("banana", "Banana"),
                ],
                vec![
                    SubstitutionRule::new("milk", "almond_milk").ratio(1.5),
                    SubstitutionRule::new("rice", "brown_rice"),
                    SubstitutionRule::new("rice", "quinoa").ratio(0.8),
                ],
            )
            .expect("catalog should build"),
        )
    }

    fn profile() -> Arc<RestrictionProfile> {
        Arc::new(
            RestrictionProfile::builder()
                .condition("lactose", "Lactose intolerance")
                .condition("diabetes", "Type 2 diabetes")
                .sensitivity("S1", "Peanut allergy")
                .build(),
        )
    }

    fn recipes() -> Vec<Recipe> {
        vec![
            Recipe::new("r1", "Rice bowl")
                .ingredient(Ingredient::new("i1", "rice", 100.0))
                .ingredient(Ingredient::new("i2", "peanut", 15.0)),
            Recipe::new("r2", "Smoothie")
                .ingredient(Ingredient::new("i1", "milk", 200.0))
                .ingredient(Ingredient::new("i2", "banana", 1.0)),
        ]
    }

    fn aggregator() -> ResolutionAggregator {
        ResolutionAggregator::analyze_all(&recipes(), profile(), catalog())
    }

    #[test]
    fn test_partition() {
        let snapshot = aggregator().snapshot();

        assert_eq!(snapshot.version(), 0);
        assert_eq!(snapshot.auto_resolved().len(), 1);
        assert_eq!(snapshot.pending().len(), 1);
        assert_eq!(snapshot.manual().len(), 1);
        assert_eq!(snapshot.buckets().len(), 3);
        assert_eq!(snapshot.auto_resolved()[0].recipe_name, "Smoothie");
        assert!(!snapshot.is_conflict_free());
    }

    #[test]
    fn test_confirm_moves_pending_to_auto_resolved() {
        let mut aggregator = aggregator();
        let snapshot = aggregator
            .confirm_substitution("r1", "i1", "quinoa")
            .expect("confirm should succeed");

        assert_eq!(snapshot.version(), 1);
        assert!(snapshot.pending().is_empty());
        assert_eq!(snapshot.auto_resolved().len(), 2);

        let record = snapshot.record("r1", "i1").expect("record");
        assert_eq!(record.state, ResolutionState::UserResolved);
        assert_eq!(record.chosen_substitute_id.as_deref(), Some("quinoa"));
    }

    #[test]
    fn test_old_snapshot_is_not_mutated() {
        let mut aggregator = aggregator();
        let before = aggregator.snapshot();
        aggregator
            .confirm_substitution("r1", "i1", "brown_rice")
            .expect("confirm should succeed");

        assert_eq!(before.pending().len(), 1);
        assert_eq!(
            before.record("r1", "i1").map(|r| r.state),
            Some(ResolutionState::Pending)
        );
    }

    #[test]
    fn test_confirm_can_change_choice() {
        let mut aggregator = aggregator();
        aggregator
            .confirm_substitution("r1", "i1", "brown_rice")
            .expect("first confirm");
        let snapshot = aggregator
            .confirm_substitution("r1", "i1", "quinoa")
            .expect("second confirm");

        assert_eq!(
            snapshot
                .record("r1", "i1")
                .and_then(|r| r.chosen_substitute_id.as_deref()),
            Some("quinoa")
        );
    }

    #[test]
    fn test_confirm_rejections_leave_state_unchanged() {
        let mut aggregator = aggregator();
        let before = aggregator.snapshot();

        assert!(matches!(
            aggregator.confirm_substitution("r1", "i1", "almond_milk"),
            Err(ConflictError::InvalidSelection { .. })
        ));
        assert!(matches!(
            aggregator.confirm_substitution("r1", "i2", "banana"),
            Err(ConflictError::NotPending {
                state: ResolutionState::Manual,
                ..
            })
        ));
        assert!(matches!(
            aggregator.confirm_substitution("r2", "i2", "banana"),
            Err(ConflictError::NotPending {
                state: ResolutionState::NoAction,
                ..
            })
        ));
        assert!(matches!(
            aggregator.confirm_substitution("r9", "i1", "quinoa"),
            Err(ConflictError::RecipeNotFound(_))
        ));
        assert!(matches!(
            aggregator.confirm_substitution("r1", "i9", "quinoa"),
            Err(ConflictError::IngredientNotFound { .. })
        ));

        assert_eq!(*aggregator.snapshot(), *before);
    }

    #[test]
    fn test_override_reanalyzes_one_recipe() {
        let mut aggregator = aggregator();
        let r2_before = aggregator.snapshot().recipe("r2").cloned();

        let snapshot = aggregator
            .override_manual(
                "r1",
                vec![
                    Ingredient::new("i1", "rice", 100.0),
                    Ingredient::new("i3", "banana", 1.0),
                ],
            )
            .expect("override should succeed");

        assert!(snapshot.manual().is_empty());
        assert_eq!(snapshot.pending().len(), 1);
        assert_eq!(snapshot.recipe("r2").cloned(), r2_before);
        assert_eq!(
            snapshot.recipe("r1").map(|r| r.recipe.name.as_str()),
            Some("Rice bowl")
        );
    }

    #[test]
    fn test_override_keeps_confirmed_choice() {
        let mut aggregator = aggregator();
        aggregator
            .confirm_substitution("r1", "i1", "quinoa")
            .expect("confirm");

        let snapshot = aggregator
            .override_manual("r1", vec![Ingredient::new("i1", "rice", 120.0)])
            .expect("override");

        let record = snapshot.record("r1", "i1").expect("record");
        assert_eq!(record.state, ResolutionState::UserResolved);
        assert_eq!(record.chosen_substitute_id.as_deref(), Some("quinoa"));
        assert!(snapshot.is_conflict_free());
    }

    #[test]
    fn test_override_drops_choice_when_food_changes() {
        let mut aggregator = aggregator();
        aggregator
            .confirm_substitution("r1", "i1", "quinoa")
            .expect("confirm");

        let snapshot = aggregator
            .override_manual("r1", vec![Ingredient::new("i1", "milk", 100.0)])
            .expect("override");

        let record = snapshot.record("r1", "i1").expect("record");
        assert_eq!(record.state, ResolutionState::AutoResolved);
        assert_eq!(record.chosen_substitute_id.as_deref(), Some("almond_milk"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut aggregator = aggregator();
        let before = aggregator.snapshot();

        let result = aggregator.override_manual(
            "r1",
            vec![
                Ingredient::new("i1", "rice", 100.0),
                Ingredient::new("i1", "banana", 1.0),
            ],
        );
        assert!(matches!(result, Err(ConflictError::Validate(_))));

        let result = aggregator.override_manual("r1", vec![Ingredient::new("i1", "rice", -1.0)]);
        assert!(matches!(result, Err(ConflictError::Validate(_))));

        let result =
            aggregator.override_manual("r1", vec![Ingredient::new("i1", "rice", f64::INFINITY)]);
        assert!(matches!(result, Err(ConflictError::Validate(_))));

        assert_eq!(*aggregator.snapshot(), *before);
    }

    #[test]
    fn test_handle_dispatches_commands() {
        let mut aggregator = aggregator();
        aggregator
            .handle(Command::Confirm {
                recipe_id: "r1".to_string(),
                ingredient_id: "i1".to_string(),
                chosen_food_id: "brown_rice".to_string(),
            })
            .expect("confirm");
        let snapshot = aggregator
            .handle(Command::Override {
                recipe_id: "r1".to_string(),
                ingredients: vec![Ingredient::new("i1", "rice", 100.0)],
            })
            .expect("override");

        assert_eq!(snapshot.version(), 2);
        assert!(snapshot.is_conflict_free());
    }

    #[test]
    fn test_finalize_requires_conflict_free_plan() {
        let mut aggregator = aggregator();
        assert!(matches!(
            aggregator.finalize(QuantityScaling::Keep),
            Err(ConflictError::Unresolved {
                pending: 1,
                manual: 1
            })
        ));

        aggregator
            .confirm_substitution("r1", "i1", "quinoa")
            .expect("confirm");
        aggregator
            .override_manual("r1", vec![Ingredient::new("i1", "rice", 100.0)])
            .expect("override");

        let recipes = aggregator
            .finalize(QuantityScaling::ApplyRatio)
            .expect("plan should finalize");

        let bowl = &recipes[0];
        assert_eq!(bowl.ingredients[0].food_id, "quinoa");
        assert!((bowl.ingredients[0].quantity - 80.0).abs() < 1e-9);

        let smoothie = &recipes[1];
        assert_eq!(smoothie.ingredients[0].food_id, "almond_milk");
        assert!((smoothie.ingredients[0].quantity - 300.0).abs() < 1e-9);
        assert_eq!(smoothie.ingredients[1].food_id, "banana");
    }

    #[test]
    fn test_resolved_recipes_keep_quantities() {
        let recipes = aggregator().resolved_recipes(QuantityScaling::Keep);
        let smoothie = &recipes[1];

        assert_eq!(smoothie.ingredients[0].food_id, "almond_milk");
        assert!((smoothie.ingredients[0].quantity - 200.0).abs() < 1e-9);
        // Pending rice is untouched.
        assert_eq!(recipes[0].ingredients[0].food_id, "rice");
    }

    #[test]
    fn test_summary() {
        let summary = aggregator().snapshot().summary();

        assert_eq!(
            summary,
            ResolutionSummary {
                recipes: 2,
                ingredients: 4,
                auto_resolved: 1,
                user_resolved: 0,
                pending: 1,
                manual: 1,
                recommended: 0,
                preferred: 0,
                warnings: 0,
            }
        );
    }
}
