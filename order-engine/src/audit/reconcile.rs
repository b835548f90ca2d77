//! Replay the stock change log against current stock levels

use super::AuditLog;
use crate::core::EngineResult;
use crate::db::repository::{ingredient, stock_log};
use crate::order_money::{quantity_to_f64, round_quantity, to_quantity};
use rust_decimal::Decimal;
use shared::models::{ReconciliationReport, StockDrift};
use std::collections::HashMap;

impl AuditLog {
    /// Sum every logged change per ingredient from zero and compare the
    /// result with the stored stock level.
    ///
    /// Both reads happen in one transaction, so the check sees a single
    /// consistent snapshot even while orders are being processed.
    pub async fn reconcile(&self) -> EngineResult<ReconciliationReport> {
        let mut tx = self.pool().begin().await?;
        let ingredients = ingredient::find_all(&mut tx).await?;
        let changes = stock_log::all_changes(&mut tx).await?;
        tx.commit().await?;

        let mut replayed: HashMap<i64, Decimal> = HashMap::new();
        for (ingredient_id, change) in &changes {
            *replayed.entry(*ingredient_id).or_default() += to_quantity(*change);
        }

        let drifts: Vec<StockDrift> = ingredients
            .iter()
            .filter_map(|ing| {
                let stored = to_quantity(ing.stock_level);
                let replayed_level =
                    round_quantity(replayed.get(&ing.id).copied().unwrap_or_default());
                (stored != replayed_level).then(|| StockDrift {
                    ingredient_id: ing.id,
                    name: ing.name.clone(),
                    stock_level: ing.stock_level,
                    replayed_level: quantity_to_f64(replayed_level),
                })
            })
            .collect();

        for drift in &drifts {
            tracing::warn!(
                ingredient_id = drift.ingredient_id,
                name = %drift.name,
                stock_level = drift.stock_level,
                replayed_level = drift.replayed_level,
                "Stock level does not match its change log"
            );
        }

        let report = ReconciliationReport {
            ingredients_checked: ingredients.len(),
            entries_replayed: changes.len(),
            drifts,
        };
        tracing::info!(
            ingredients = report.ingredients_checked,
            entries = report.entries_replayed,
            drifts = report.drifts.len(),
            "Stock reconciliation finished"
        );
        Ok(report)
    }
}
