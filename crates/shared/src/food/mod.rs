use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantArray};
use validator::Validate;

#[derive(
    EnumString,
    Display,
    VariantArray,
    AsRefStr,
    Default,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FoodUnit {
    #[default]
    Gram,
    Milliliter,
    Piece,
}

impl FoodUnit {
    pub fn format(&self, quantity: f64) -> String {
        match self {
            FoodUnit::Milliliter if quantity >= 1000.0 => {
                format!("{} L", trim_decimal(quantity / 1000.0))
            }
            FoodUnit::Milliliter => format!("{} ml", trim_decimal(quantity)),
            FoodUnit::Gram if quantity >= 1000.0 => {
                format!("{} kg", trim_decimal(quantity / 1000.0))
            }
            FoodUnit::Gram => format!("{} g", trim_decimal(quantity)),
            FoodUnit::Piece => trim_decimal(quantity),
        }
    }
}

fn trim_decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        let rounded = format!("{:.2}", value);
        rounded.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[derive(
    EnumString,
    Display,
    VariantArray,
    AsRefStr,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Avoid,
    Recommend,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRelation {
    pub condition_id: String,
    pub relation: Relation,
}

/// Immutable reference data for one food, tagged with the sensitivities it
/// triggers and the medical conditions it relates to.
#[derive(Validate, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Food {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub unit: FoodUnit,
    /// Food group used by classification-scoped substitution rules.
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub sensitivity_ids: BTreeSet<String>,
    #[serde(default)]
    pub condition_relations: Vec<ConditionRelation>,
}

impl Food {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn unit(mut self, unit: FoodUnit) -> Self {
        self.unit = unit;
        self
    }

    pub fn classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    pub fn sensitivity(mut self, sensitivity_id: impl Into<String>) -> Self {
        self.sensitivity_ids.insert(sensitivity_id.into());
        self
    }

    pub fn avoid_for(self, condition_id: impl Into<String>) -> Self {
        self.relation(condition_id, Relation::Avoid)
    }

    pub fn recommend_for(self, condition_id: impl Into<String>) -> Self {
        self.relation(condition_id, Relation::Recommend)
    }

    fn relation(mut self, condition_id: impl Into<String>, relation: Relation) -> Self {
        self.condition_relations.push(ConditionRelation {
            condition_id: condition_id.into(),
            relation,
        });
        self
    }

    /// Condition ids tagged with the given relation, in declaration order.
    pub fn conditions(&self, relation: Relation) -> impl Iterator<Item = &str> {
        self.condition_relations
            .iter()
            .filter(move |r| r.relation == relation)
            .map(|r| r.condition_id.as_str())
    }

    pub fn is_in_classification(&self, classification: &str) -> bool {
        self.classification
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(classification))
    }
}
