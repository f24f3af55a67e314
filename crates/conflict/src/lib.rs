//! Dietary restriction conflict resolution.
//!
//! Ingredients are classified against a client's [`RestrictionProfile`], critical
//! conflicts are matched against a [`SubstitutionCatalog`], and the outcome of a
//! whole plan is bucketed by [`ResolutionAggregator`] into auto-resolved, pending
//! and manual records.
//!
//! [`RestrictionProfile`]: coachplan_shared::RestrictionProfile

pub mod aggregator;
pub mod analyzer;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod substitution;

pub use aggregator::{
    analyze_all, BucketEntry, Buckets, Command, QuantityScaling, RecipeResolution,
    ResolutionAggregator, ResolutionSnapshot, ResolutionSummary,
};
pub use analyzer::{analyze, DataWarning, ResolutionRecord, ResolutionState};
pub use catalog::{Applicability, SubstitutionCatalog, SubstitutionRule};
pub use classifier::{classify, ConflictVerdict, Trigger, VerdictKind};
pub use error::{ConflictError, Result};
pub use substitution::{find_substitutes, resolve_substitutes, Substitutes};
