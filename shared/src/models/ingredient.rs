//! Ingredient Model (库存原料)

use serde::{Deserialize, Serialize};

/// A stock-tracked raw material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    /// Unit of measure (g, ml, pcs, ...)
    pub unit: String,
    /// Current stock level, never negative
    pub stock_level: f64,
    /// Level at or below which the ingredient should be reordered
    pub reorder_threshold: f64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Ingredient {
    pub fn is_low_stock(&self) -> bool {
        self.stock_level <= self.reorder_threshold
    }
}

/// Create ingredient payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngredientCreate {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub reorder_threshold: f64,
    /// Opening stock, booked as a restock entry
    #[serde(default)]
    pub opening_stock: f64,
}

/// Update ingredient payload; stock level is not editable here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub reorder_threshold: Option<f64>,
}
