use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Normalized restrictions of one client, assembled by the host from the
/// client's sensitivity, condition and preference records.
///
/// A condition id may sit in both `avoid_condition_ids` and
/// `recommend_condition_ids`: the same diagnosis can rule one food out and
/// recommend another.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RestrictionProfile {
    #[serde(default)]
    pub sensitivity_ids: BTreeSet<String>,
    #[serde(default)]
    pub avoid_condition_ids: BTreeSet<String>,
    #[serde(default)]
    pub recommend_condition_ids: BTreeSet<String>,
    #[serde(default)]
    pub non_preferred_food_ids: BTreeSet<String>,
    #[serde(default)]
    pub preferred_food_ids: BTreeSet<String>,
    #[serde(default)]
    pub individually_restricted_food_ids: BTreeSet<String>,
    /// Display names for sensitivity and condition ids.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl RestrictionProfile {
    pub fn builder() -> RestrictionProfileBuilder {
        RestrictionProfileBuilder::default()
    }

    /// Display name for a sensitivity or condition id, falling back to the id.
    pub fn label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }
}

#[derive(Default)]
pub struct RestrictionProfileBuilder {
    profile: RestrictionProfile,
}

impl RestrictionProfileBuilder {
    pub fn sensitivity(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        self.profile.labels.insert(id.to_owned(), name.into());
        self.profile.sensitivity_ids.insert(id);
        self
    }

    pub fn avoid_condition(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        self.profile.labels.insert(id.to_owned(), name.into());
        self.profile.avoid_condition_ids.insert(id);
        self
    }

    pub fn recommend_condition(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        self.profile.labels.insert(id.to_owned(), name.into());
        self.profile.recommend_condition_ids.insert(id);
        self
    }

    /// A diagnosed condition drives both its avoid and its recommend relations.
    pub fn condition(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        let name = name.into();
        self.avoid_condition(id.to_owned(), name.to_owned())
            .recommend_condition(id, name)
    }

    pub fn non_preferred(mut self, food_id: impl Into<String>) -> Self {
        self.profile.non_preferred_food_ids.insert(food_id.into());
        self
    }

    pub fn preferred(mut self, food_id: impl Into<String>) -> Self {
        self.profile.preferred_food_ids.insert(food_id.into());
        self
    }

    pub fn individually_restricted(mut self, food_id: impl Into<String>) -> Self {
        self.profile
            .individually_restricted_food_ids
            .insert(food_id.into());
        self
    }

    pub fn build(self) -> RestrictionProfile {
        self.profile
    }
}
