use coachplan_shared::{Food, RestrictionProfile};

use crate::analyzer::DataWarning;
use crate::catalog::SubstitutionCatalog;
use crate::classifier::classify;

/// Safe replacements for a conflicting food, plus any catalog gaps met on the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Substitutes {
    pub candidates: Vec<Food>,
    pub warnings: Vec<DataWarning>,
}

/// Candidate replacements for `conflicting`, in catalog order.
///
/// A candidate survives only if it is not itself critical for the profile, so a
/// swap never reintroduces a conflict. Rules are one hop: a rejected candidate
/// is dropped, not substituted again.
pub fn find_substitutes(
    conflicting: &Food,
    profile: &RestrictionProfile,
    catalog: &SubstitutionCatalog,
) -> Vec<Food> {
    resolve_substitutes(conflicting, profile, catalog).candidates
}

pub fn resolve_substitutes(
    conflicting: &Food,
    profile: &RestrictionProfile,
    catalog: &SubstitutionCatalog,
) -> Substitutes {
    let mut substitutes = Substitutes::default();

    for rule in catalog
        .rules_for(&conflicting.id)
        .filter(|rule| rule.applicability.holds(conflicting, profile))
    {
        let Some(target) = catalog.food(&rule.target_food_id) else {
            tracing::warn!(
                source = %rule.source_food_id,
                target = %rule.target_food_id,
                "substitution target not found in food catalog"
            );
            substitutes.warnings.push(DataWarning::UnknownSubstitute {
                source_food_id: rule.source_food_id.to_owned(),
                target_food_id: rule.target_food_id.to_owned(),
            });
            continue;
        };

        let verdict = classify(target, profile);
        if verdict.is_critical() {
            tracing::debug!(
                source = %conflicting.id,
                target = %target.id,
                verdict = %verdict.kind(),
                "substitute rejected"
            );
            continue;
        }

        substitutes.candidates.push(target.clone());
    }

    substitutes
}
