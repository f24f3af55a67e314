use thiserror::Error;

use crate::analyzer::ResolutionState;

#[derive(Error, Debug)]
pub enum ConflictError {
    #[error(
        "Invalid selection: {food_id} is not a candidate substitute for ingredient {ingredient_id} of recipe {recipe_id}"
    )]
    InvalidSelection {
        recipe_id: String,
        ingredient_id: String,
        food_id: String,
    },

    #[error("Recipe not found: {0}")]
    RecipeNotFound(String),

    #[error("Ingredient {ingredient_id} not found in recipe {recipe_id}")]
    IngredientNotFound {
        recipe_id: String,
        ingredient_id: String,
    },

    #[error(
        "Ingredient {ingredient_id} of recipe {recipe_id} is {state} and has no substitute to confirm"
    )]
    NotPending {
        recipe_id: String,
        ingredient_id: String,
        state: ResolutionState,
    },

    #[error("Malformed substitution catalog: {0}")]
    MalformedCatalog(String),

    #[error("Plan has unresolved conflicts: {pending} pending, {manual} manual")]
    Unresolved { pending: usize, manual: usize },

    #[error("{0}")]
    Validate(#[from] validator::ValidationErrors),
}

pub type Result<T> = std::result::Result<T, ConflictError>;
