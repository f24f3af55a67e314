use std::collections::{HashMap, HashSet};

use coachplan_shared::{Food, RestrictionProfile};
use serde::{Deserialize, Serialize};

use crate::error::{ConflictError, Result};

/// Scope in which a substitution rule may be used.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Applicability {
    #[default]
    Always,
    /// Only when the source food belongs to this classification.
    WithinClassification(String),
    /// Only for clients avoiding this condition.
    ForCondition(String),
    /// Only for clients with this sensitivity.
    ForSensitivity(String),
}

impl Applicability {
    pub fn holds(&self, source: &Food, profile: &RestrictionProfile) -> bool {
        match self {
            Applicability::Always => true,
            Applicability::WithinClassification(classification) => {
                source.is_in_classification(classification)
            }
            Applicability::ForCondition(condition_id) => {
                profile.avoid_condition_ids.contains(condition_id)
            }
            Applicability::ForSensitivity(sensitivity_id) => {
                profile.sensitivity_ids.contains(sensitivity_id)
            }
        }
    }
}

fn default_ratio() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubstitutionRule {
    pub source_food_id: String,
    pub target_food_id: String,
    #[serde(default)]
    pub applicability: Applicability,
    /// Quantity multiplier applied when the target replaces the source.
    #[serde(default = "default_ratio")]
    pub ratio: f64,
}

impl SubstitutionRule {
    pub fn new(source_food_id: impl Into<String>, target_food_id: impl Into<String>) -> Self {
        Self {
            source_food_id: source_food_id.into(),
            target_food_id: target_food_id.into(),
            applicability: Applicability::Always,
            ratio: default_ratio(),
        }
    }

    pub fn when(mut self, applicability: Applicability) -> Self {
        self.applicability = applicability;
        self
    }

    pub fn ratio(mut self, ratio: f64) -> Self {
        self.ratio = ratio;
        self
    }
}

/// Food reference data plus the source→target substitution table.
///
/// Rules keep their declared order per source food: the table encodes a
/// preference (nutritionally closest first) and lookups never re-sort it.
#[derive(Clone, Debug, Default)]
pub struct SubstitutionCatalog {
    foods: HashMap<String, Food>,
    rules: Vec<SubstitutionRule>,
    by_source: HashMap<String, Vec<usize>>,
}

impl SubstitutionCatalog {
    pub fn new(
        foods: impl IntoIterator<Item = Food>,
        rules: impl IntoIterator<Item = SubstitutionRule>,
    ) -> Result<Self> {
        let mut catalog = Self::default();

        for food in foods {
            if catalog.foods.contains_key(&food.id) {
                return Err(ConflictError::MalformedCatalog(format!(
                    "duplicate food id {}",
                    food.id
                )));
            }
            catalog.foods.insert(food.id.to_owned(), food);
        }

        let mut pairs = HashSet::new();
        for rule in rules {
            if rule.source_food_id == rule.target_food_id {
                return Err(ConflictError::MalformedCatalog(format!(
                    "rule substitutes {} with itself",
                    rule.source_food_id
                )));
            }

            if !rule.ratio.is_finite() || rule.ratio <= 0.0 {
                return Err(ConflictError::MalformedCatalog(format!(
                    "rule {} -> {} has invalid ratio {}",
                    rule.source_food_id, rule.target_food_id, rule.ratio
                )));
            }

            if !pairs.insert((rule.source_food_id.to_owned(), rule.target_food_id.to_owned())) {
                return Err(ConflictError::MalformedCatalog(format!(
                    "duplicate rule {} -> {}",
                    rule.source_food_id, rule.target_food_id
                )));
            }

            catalog
                .by_source
                .entry(rule.source_food_id.to_owned())
                .or_default()
                .push(catalog.rules.len());
            catalog.rules.push(rule);
        }

        Ok(catalog)
    }

    pub fn food(&self, food_id: &str) -> Option<&Food> {
        self.foods.get(food_id)
    }

    pub fn foods(&self) -> impl Iterator<Item = &Food> {
        self.foods.values()
    }

    /// Rules whose source is `source_food_id`, in declared order.
    pub fn rules_for(&self, source_food_id: &str) -> impl Iterator<Item = &SubstitutionRule> {
        self.by_source
            .get(source_food_id)
            .into_iter()
            .flatten()
            .map(|index| &self.rules[*index])
    }

    pub fn rule(&self, source_food_id: &str, target_food_id: &str) -> Option<&SubstitutionRule> {
        self.rules_for(source_food_id)
            .find(|rule| rule.target_food_id == target_food_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foods() -> Vec<Food> {
        vec![
            Food::new("rice", "White Rice").classification("Cereals"),
            Food::new("brown_rice", "Brown Rice").classification("Cereals"),
            Food::new("quinoa", "Quinoa").classification("Cereals"),
        ]
    }

    #[test]
    fn test_rules_keep_declared_order() {
        let catalog = SubstitutionCatalog::new(
            foods(),
            vec![
                SubstitutionRule::new("rice", "quinoa"),
                SubstitutionRule::new("brown_rice", "quinoa"),
                SubstitutionRule::new("rice", "brown_rice"),
            ],
        )
        .expect("catalog should build");

        let targets: Vec<_> = catalog
            .rules_for("rice")
            .map(|r| r.target_food_id.as_str())
            .collect();
        assert_eq!(targets, vec!["quinoa", "brown_rice"]);
        assert_eq!(catalog.rules_for("quinoa").count(), 0);
        assert!(catalog.rule("rice", "brown_rice").is_some());
        assert!(catalog.rule("brown_rice", "rice").is_none());
    }

    #[test]
    fn test_self_substitution_rejected() {
        let result = SubstitutionCatalog::new(foods(), vec![SubstitutionRule::new("rice", "rice")]);
        assert!(matches!(result, Err(ConflictError::MalformedCatalog(_))));
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let result = SubstitutionCatalog::new(
            foods(),
            vec![
                SubstitutionRule::new("rice", "quinoa"),
                SubstitutionRule::new("rice", "quinoa")
                    .when(Applicability::WithinClassification("Cereals".to_string())),
            ],
        );
        assert!(matches!(result, Err(ConflictError::MalformedCatalog(_))));
    }

    #[test]
    fn test_duplicate_food_rejected() {
        let mut foods = foods();
        foods.push(Food::new("rice", "Jasmine Rice"));
        let result = SubstitutionCatalog::new(foods, vec![]);
        assert!(matches!(result, Err(ConflictError::MalformedCatalog(_))));
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let result = SubstitutionCatalog::new(
            foods(),
            vec![SubstitutionRule::new("rice", "quinoa").ratio(0.0)],
        );
        assert!(matches!(result, Err(ConflictError::MalformedCatalog(_))));
    }

    #[test]
    fn test_applicability() {
        let rice = Food::new("rice", "White Rice").classification("Cereals");
        let profile = RestrictionProfile::builder()
            .avoid_condition("diabetes", "Diabetes")
            .sensitivity("S1", "Gluten")
            .build();

        assert!(Applicability::Always.holds(&rice, &profile));
        assert!(Applicability::WithinClassification("cereals".into()).holds(&rice, &profile));
        assert!(!Applicability::WithinClassification("Dairy".into()).holds(&rice, &profile));
        assert!(Applicability::ForCondition("diabetes".into()).holds(&rice, &profile));
        assert!(!Applicability::ForCondition("celiac".into()).holds(&rice, &profile));
        assert!(Applicability::ForSensitivity("S1".into()).holds(&rice, &profile));
        assert!(!Applicability::ForSensitivity("S2".into()).holds(&rice, &profile));
    }

    #[test]
    fn test_rule_deserialize_defaults() {
        let rule: SubstitutionRule = serde_json::from_str(
            r#"{"source_food_id":"milk","target_food_id":"almond_milk"}"#,
        )
        .expect("rule should parse");
        assert_eq!(rule.applicability, Applicability::Always);
        assert_eq!(rule.ratio, 1.0);

        let scoped: SubstitutionRule = serde_json::from_str(
            r#"{"source_food_id":"milk","target_food_id":"oat_milk",
                "applicability":{"kind":"for_condition","value":"lactose"},"ratio":1.2}"#,
        )
        .expect("scoped rule should parse");
        assert_eq!(
            scoped.applicability,
            Applicability::ForCondition("lactose".to_string())
        );
    }
}
