use super::*;
use shared::ErrorCode;
use shared::models::{IngredientUpdate, StockAdjustment};

fn adjustment(ingredient_id: i64, action: StockAction, quantity: f64) -> StockAdjustment {
    StockAdjustment {
        ingredient_id,
        action,
        quantity,
        staff_id: STAFF,
        note: Some("delivery #12".into()),
    }
}

#[tokio::test]
async fn test_opening_stock_is_logged_as_restock() {
    let fx = setup().await;
    let beef = fx.ingredient("Beef", "g", 1000.0).await;

    let (entries, total) = fx
        .state
        .audit
        .query(&StockLogQuery {
            ingredient_id: Some(beef.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(entries[0].action, StockAction::Restock);
    assert_eq!(entries[0].quantity_change, 1000.0);
    assert_eq!(entries[0].order_id, None);
    fx.assert_reconciled().await;
}

#[tokio::test]
async fn test_manual_restock_and_waste() {
    let fx = setup().await;
    let milk = fx.ingredient("Milk", "ml", 2000.0).await;

    let entry = fx
        .state
        .inventory
        .manual_adjust(adjustment(milk.id, StockAction::Restock, 500.0))
        .await
        .unwrap();
    assert_eq!(entry.quantity_change, 500.0);
    assert_eq!(entry.resulting_level, 2500.0);
    assert_eq!(entry.note.as_deref(), Some("delivery #12"));

    let entry = fx
        .state
        .inventory
        .manual_adjust(adjustment(milk.id, StockAction::Waste, 250.5))
        .await
        .unwrap();
    assert_eq!(entry.quantity_change, -250.5);
    assert_eq!(fx.stock(milk.id).await, 2249.5);

    fx.assert_reconciled().await;
}

#[tokio::test]
async fn test_waste_cannot_go_negative() {
    let fx = setup().await;
    let eggs = fx.ingredient("Eggs", "pcs", 6.0).await;

    let err = fx
        .state
        .inventory
        .manual_adjust(adjustment(eggs.id, StockAction::Waste, 7.0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock(_)));
    assert_eq!(fx.stock(eggs.id).await, 6.0);
}

#[tokio::test]
async fn test_manual_adjust_rejects_order_actions_and_unknown_ingredient() {
    let fx = setup().await;
    let eggs = fx.ingredient("Eggs", "pcs", 6.0).await;

    let err = fx
        .state
        .inventory
        .manual_adjust(adjustment(eggs.id, StockAction::OrderRestore, 1.0))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidRequest);

    let err = fx
        .state
        .inventory
        .manual_adjust(adjustment(999, StockAction::Restock, 1.0))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::IngredientNotFound);
}

#[tokio::test]
async fn test_duplicate_ingredient_name() {
    let fx = setup().await;
    fx.ingredient("Beef", "g", 0.0).await;

    let err = fx
        .state
        .inventory
        .create_ingredient(
            IngredientCreate {
                name: "Beef".into(),
                unit: "kg".into(),
                reorder_threshold: 0.0,
                opening_stock: 5.0,
            },
            STAFF,
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::AlreadyExists);
    assert_eq!(err.to_string(), "Ingredient name already exists");
    let app = shared::AppError::from(err);
    assert!(!app.message.contains("UNIQUE"));
    assert_eq!(fx.state.inventory.list_ingredients().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_low_stock_after_accept() {
    let fx = setup().await;
    let beef = fx
        .state
        .inventory
        .create_ingredient(
            IngredientCreate {
                name: "Beef".into(),
                unit: "g".into(),
                reorder_threshold: 500.0,
                opening_stock: 1000.0,
            },
            STAFF,
        )
        .await
        .unwrap();
    let burger = fx.menu_item("Burger", 12.50, &[(beef.id, 150.0)]).await;
    assert!(fx.state.inventory.low_stock().await.unwrap().is_empty());

    let order_id = fx.order(&[(burger.id, 4)]).await;
    fx.transition(order_id, OrderStatus::Preparing).await.unwrap();

    let low = fx.state.inventory.low_stock().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, beef.id);
    assert!(low[0].is_low_stock());
}

#[tokio::test]
async fn test_log_query_filters_and_pages() {
    let (fx, beef, burger) = burger_setup().await;
    let first = fx.order(&[(burger.id, 1)]).await;
    let second = fx.order(&[(burger.id, 1)]).await;
    fx.transition(first, OrderStatus::Preparing).await.unwrap();
    fx.transition(second, OrderStatus::Preparing).await.unwrap();
    fx.transition(first, OrderStatus::Cancelled).await.unwrap();

    let (entries, total) = fx
        .state
        .audit
        .query(&StockLogQuery {
            ingredient_id: Some(beef.id),
            ..Default::default()
        })
        .await
        .unwrap();
    // opening restock + 2 deducts + 1 restore, newest first
    assert_eq!(total, 4);
    assert_eq!(entries[0].action, StockAction::OrderRestore);
    assert_eq!(entries[3].action, StockAction::Restock);

    let (deducts, total) = fx
        .state
        .audit
        .query(&StockLogQuery {
            action: Some(StockAction::OrderDeduct),
            limit: 1,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert_eq!(deducts.len(), 1);
    assert_eq!(deducts[0].order_id, Some(second));

    let movements = fx.state.audit.entries_for_order(first).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(
        movements.iter().map(|e| e.quantity_change).sum::<f64>(),
        0.0
    );
}

#[tokio::test]
async fn test_stock_log_is_append_only() {
    let (fx, _beef, _burger) = burger_setup().await;

    let update = sqlx::query("UPDATE stock_change_log SET quantity_change = 0")
        .execute(&fx.state.db.pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM stock_change_log")
        .execute(&fx.state.db.pool)
        .await;
    assert!(delete.is_err());

    fx.assert_reconciled().await;
}

#[tokio::test]
async fn test_reconcile_detects_out_of_band_writes() {
    let (fx, beef, burger) = burger_setup().await;
    let order_id = fx.order(&[(burger.id, 2)]).await;
    fx.transition(order_id, OrderStatus::Preparing).await.unwrap();
    fx.assert_reconciled().await;

    sqlx::query("UPDATE ingredients SET stock_level = 650 WHERE id = ?")
        .bind(beef.id)
        .execute(&fx.state.db.pool)
        .await
        .unwrap();

    let report = fx.state.audit.reconcile().await.unwrap();
    assert!(!report.is_consistent());
    assert_eq!(report.ingredients_checked, 1);
    assert_eq!(report.entries_replayed, 2);
    assert_eq!(report.drifts.len(), 1);
    assert_eq!(report.drifts[0].ingredient_id, beef.id);
    assert_eq!(report.drifts[0].stock_level, 650.0);
    assert_eq!(report.drifts[0].replayed_level, 700.0);
}

#[tokio::test]
async fn test_set_recipe_validates_references() {
    let fx = setup().await;
    let beef = fx.ingredient("Beef", "g", 100.0).await;
    let burger = fx.menu_item("Burger", 12.50, &[]).await;

    let err = fx
        .state
        .catalog
        .set_recipe(burger.id, &[(beef.id, 150.0), (999, 1.0)])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::IngredientNotFound);
    assert!(fx.state.catalog.recipe_for(burger.id).await.unwrap().is_empty());

    let err = fx
        .state
        .catalog
        .set_recipe(burger.id, &[(beef.id, 0.0)])
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidStockQuantity);

    let stored = fx
        .state
        .catalog
        .set_recipe(burger.id, &[(beef.id, 100.0), (beef.id, 50.0)])
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].quantity_per_unit, 150.0);
}

#[tokio::test]
async fn test_update_ingredient_details_keeps_stock() {
    let (fx, beef, burger) = burger_setup().await;
    let order_id = fx.order(&[(burger.id, 2)]).await;
    fx.transition(order_id, OrderStatus::Preparing).await.unwrap();
    assert!(fx.state.inventory.low_stock().await.unwrap().is_empty());

    let updated = fx
        .state
        .inventory
        .update_ingredient(
            beef.id,
            IngredientUpdate {
                name: Some("  Ground beef ".into()),
                reorder_threshold: Some(800.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Ground beef");
    assert_eq!(updated.unit, "g");
    assert_eq!(updated.reorder_threshold, 800.0);
    assert_eq!(updated.stock_level, 700.0);

    // the new threshold drives low-stock reporting
    let low = fx.state.inventory.low_stock().await.unwrap();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].id, beef.id);

    // renaming books nothing
    let (_, total) = fx
        .state
        .audit
        .query(&StockLogQuery {
            ingredient_id: Some(beef.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 2);
    fx.assert_reconciled().await;
}

#[tokio::test]
async fn test_update_ingredient_rejects_bad_input() {
    let fx = setup().await;
    let beef = fx.ingredient("Beef", "g", 100.0).await;
    fx.ingredient("Milk", "ml", 100.0).await;
    let inventory = &fx.state.inventory;

    let err = inventory
        .update_ingredient(
            beef.id,
            IngredientUpdate {
                reorder_threshold: Some(-5.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::InvalidStockQuantity);

    let err = inventory
        .update_ingredient(
            beef.id,
            IngredientUpdate {
                unit: Some(" ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::RequiredField);

    let err = inventory
        .update_ingredient(
            beef.id,
            IngredientUpdate {
                name: Some("Milk".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::AlreadyExists);

    let err = inventory
        .update_ingredient(999, IngredientUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), ErrorCode::IngredientNotFound);

    let stored = inventory.get_ingredient(beef.id).await.unwrap();
    assert_eq!(stored.name, "Beef");
    assert_eq!(stored.reorder_threshold, 0.0);
}
