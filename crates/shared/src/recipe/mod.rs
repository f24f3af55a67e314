use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Validate, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub food_id: String,
    #[validate(custom(function = "positive_quantity"))]
    pub quantity: f64,
}

impl Ingredient {
    pub fn new(id: impl Into<String>, food_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            id: id.into(),
            food_id: food_id.into(),
            quantity,
        }
    }
}

#[derive(Validate, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[validate(schema(function = "validate_recipe_ingredients"))]
pub struct Recipe {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[validate(nested)]
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

impl Recipe {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ingredients: vec![],
        }
    }

    pub fn ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }
}

fn positive_quantity(quantity: f64) -> Result<(), ValidationError> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ValidationError::new("quantity_range")
            .with_message("Quantity must be a finite number greater than 0".into()));
    }
    Ok(())
}

fn validate_recipe_ingredients(recipe: &Recipe) -> Result<(), ValidationError> {
    unique_ingredient_ids(&recipe.ingredients)
}

/// Ingredient ids address records inside a recipe and must not repeat.
pub fn unique_ingredient_ids(ingredients: &[Ingredient]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for ingredient in ingredients {
        if !seen.insert(ingredient.id.as_str()) {
            let mut err = ValidationError::new("duplicate_ingredient_id");
            err.add_param("id".into(), &ingredient.id);
            return Err(err);
        }
    }

    Ok(())
}
