//! Shared fixtures for the conflict integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use coachplan_conflict::{SubstitutionCatalog, SubstitutionRule};
use coachplan_shared::{Food, FoodUnit, Ingredient, Recipe, RestrictionProfile};

pub const PEANUT_ALLERGY: &str = "S1";
pub const LACTOSE: &str = "lactose";
pub const GLYCEMIC: &str = "glycemic";
pub const ANEMIA: &str = "anemia";

pub fn foods() -> Vec<Food> {
    vec![
        Food::new("peanut", "Peanut").sensitivity(PEANUT_ALLERGY),
        Food::new("whole_milk", "Whole Milk")
            .unit(FoodUnit::Milliliter)
            .classification("Dairy")
            .avoid_for(LACTOSE),
        Food::new("almond_milk", "Almond Milk").unit(FoodUnit::Milliliter),
        Food::new("white_rice", "White Rice")
            .classification("Cereals")
            .avoid_for(GLYCEMIC),
        Food::new("brown_rice", "Brown Rice").classification("Cereals"),
        Food::new("quinoa", "Quinoa").classification("Cereals"),
        Food::new("spinach", "Spinach").recommend_for(ANEMIA),
        Food::new("egg", "Egg").unit(FoodUnit::Piece),
        Food::new("banana", "Banana").unit(FoodUnit::Piece),
    ]
}

pub fn rules() -> Vec<SubstitutionRule> {
    vec![
        SubstitutionRule::new("whole_milk", "almond_milk"),
        SubstitutionRule::new("white_rice", "brown_rice"),
        SubstitutionRule::new("white_rice", "quinoa"),
    ]
}

pub fn catalog() -> Arc<SubstitutionCatalog> {
    Arc::new(SubstitutionCatalog::new(foods(), rules()).expect("fixture catalog is valid"))
}

pub fn profile() -> Arc<RestrictionProfile> {
    Arc::new(
        RestrictionProfile::builder()
            .sensitivity(PEANUT_ALLERGY, "Peanut allergy")
            .avoid_condition(LACTOSE, "Lactose intolerance")
            .avoid_condition(GLYCEMIC, "Insulin resistance")
            .recommend_condition(ANEMIA, "Anemia")
            .preferred("banana")
            .build(),
    )
}

pub fn satay() -> Recipe {
    Recipe::new("satay", "Peanut satay")
        .ingredient(Ingredient::new("satay-1", "peanut", 40.0))
        .ingredient(Ingredient::new("satay-2", "egg", 1.0))
}

pub fn latte() -> Recipe {
    Recipe::new("latte", "Morning latte")
        .ingredient(Ingredient::new("latte-1", "whole_milk", 250.0))
}

pub fn rice_bowl() -> Recipe {
    Recipe::new("bowl", "Rice bowl")
        .ingredient(Ingredient::new("bowl-1", "white_rice", 90.0))
        .ingredient(Ingredient::new("bowl-2", "spinach", 50.0))
}

pub fn fruit_plate() -> Recipe {
    Recipe::new("fruit", "Fruit plate")
        .ingredient(Ingredient::new("fruit-1", "banana", 2.0))
        .ingredient(Ingredient::new("fruit-2", "spinach", 20.0))
}

pub fn plan() -> Vec<Recipe> {
    vec![satay(), latte(), rice_bowl(), fruit_plate()]
}
