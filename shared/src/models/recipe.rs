//! Recipe Requirement Model

use serde::{Deserialize, Serialize};

/// Ingredient quantity consumed by one unit of a menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecipeRequirement {
    pub menu_item_id: i64,
    pub ingredient_id: i64,
    pub quantity_per_unit: f64,
}
