use coachplan_shared::{Food, Relation, RestrictionProfile};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString, VariantArray};

/// The restriction that produced a verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Trigger {
    pub id: String,
    pub name: String,
}

impl Trigger {
    fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

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
pub enum VerdictKind {
    None,
    Sensitivity,
    ConditionAvoid,
    NonPreferred,
    ConditionRecommend,
    Preferred,
}

impl VerdictKind {
    /// Critical verdicts block plan finalization until resolved.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            VerdictKind::Sensitivity | VerdictKind::ConditionAvoid | VerdictKind::NonPreferred
        )
    }

    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            VerdictKind::ConditionRecommend | VerdictKind::Preferred
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "trigger", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictVerdict {
    None,
    Sensitivity(Trigger),
    ConditionAvoid(Trigger),
    NonPreferred(Trigger),
    ConditionRecommend(Trigger),
    Preferred(Trigger),
}

impl ConflictVerdict {
    fn new(kind: VerdictKind, trigger: Trigger) -> Self {
        match kind {
            VerdictKind::None => ConflictVerdict::None,
            VerdictKind::Sensitivity => ConflictVerdict::Sensitivity(trigger),
            VerdictKind::ConditionAvoid => ConflictVerdict::ConditionAvoid(trigger),
            VerdictKind::NonPreferred => ConflictVerdict::NonPreferred(trigger),
            VerdictKind::ConditionRecommend => ConflictVerdict::ConditionRecommend(trigger),
            VerdictKind::Preferred => ConflictVerdict::Preferred(trigger),
        }
    }

    pub fn kind(&self) -> VerdictKind {
        match self {
            ConflictVerdict::None => VerdictKind::None,
            ConflictVerdict::Sensitivity(_) => VerdictKind::Sensitivity,
            ConflictVerdict::ConditionAvoid(_) => VerdictKind::ConditionAvoid,
            ConflictVerdict::NonPreferred(_) => VerdictKind::NonPreferred,
            ConflictVerdict::ConditionRecommend(_) => VerdictKind::ConditionRecommend,
            ConflictVerdict::Preferred(_) => VerdictKind::Preferred,
        }
    }

    pub fn trigger(&self) -> Option<&Trigger> {
        match self {
            ConflictVerdict::None => None,
            ConflictVerdict::Sensitivity(t)
            | ConflictVerdict::ConditionAvoid(t)
            | ConflictVerdict::NonPreferred(t)
            | ConflictVerdict::ConditionRecommend(t)
            | ConflictVerdict::Preferred(t) => Some(t),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.kind().is_critical()
    }

    pub fn is_informational(&self) -> bool {
        self.kind().is_informational()
    }
}

type Matcher = fn(&Food, &RestrictionProfile) -> Option<Trigger>;

/// Evaluated top-down, first match wins. Every critical check precedes the
/// informational ones.
const PRECEDENCE: [(VerdictKind, Matcher); 6] = [
    (VerdictKind::NonPreferred, individually_restricted),
    (VerdictKind::ConditionAvoid, avoided_condition),
    (VerdictKind::Sensitivity, shared_sensitivity),
    (VerdictKind::NonPreferred, non_preferred),
    (VerdictKind::ConditionRecommend, recommended_condition),
    (VerdictKind::Preferred, preferred),
];

/// Classify one food against a client's restrictions. Total and side-effect free.
pub fn classify(food: &Food, profile: &RestrictionProfile) -> ConflictVerdict {
    PRECEDENCE
        .iter()
        .find_map(|(kind, matcher)| {
            matcher(food, profile).map(|trigger| ConflictVerdict::new(*kind, trigger))
        })
        .unwrap_or(ConflictVerdict::None)
}

fn food_trigger(food: &Food) -> Trigger {
    Trigger::new(food.id.to_owned(), food.name.to_owned())
}

fn individually_restricted(food: &Food, profile: &RestrictionProfile) -> Option<Trigger> {
    profile
        .individually_restricted_food_ids
        .contains(&food.id)
        .then(|| food_trigger(food))
}

fn avoided_condition(food: &Food, profile: &RestrictionProfile) -> Option<Trigger> {
    food.conditions(Relation::Avoid)
        .find(|id| profile.avoid_condition_ids.contains(*id))
        .map(|id| Trigger::new(id, profile.label(id)))
}

fn shared_sensitivity(food: &Food, profile: &RestrictionProfile) -> Option<Trigger> {
    food.sensitivity_ids
        .intersection(&profile.sensitivity_ids)
        .next()
        .map(|id| Trigger::new(id.as_str(), profile.label(id)))
}

fn non_preferred(food: &Food, profile: &RestrictionProfile) -> Option<Trigger> {
    profile
        .non_preferred_food_ids
        .contains(&food.id)
        .then(|| food_trigger(food))
}

fn recommended_condition(food: &Food, profile: &RestrictionProfile) -> Option<Trigger> {
    food.conditions(Relation::Recommend)
        .find(|id| profile.recommend_condition_ids.contains(*id))
        .map(|id| Trigger::new(id, profile.label(id)))
}

fn preferred(food: &Food, profile: &RestrictionProfile) -> Option<Trigger> {
    profile
        .preferred_food_ids
        .contains(&food.id)
        .then(|| food_trigger(food))
}
