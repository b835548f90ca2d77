use super::*;
use crate::core::{EngineConfig, EngineError, EngineResult, EngineState};
use shared::models::{
    CreateOrderRequest, Ingredient, IngredientCreate, LineItemRequest, MenuItem, MenuItemCreate,
    OrderKind, OrderStatus, Payment, PaymentCreate, StockAction, StockChangeLogEntry,
    StockLogQuery, TransitionOutcome, TransitionRequest,
};
use tempfile::TempDir;

const STAFF: i64 = 7;

/// Engine on a fresh on-disk database; the directory lives as long as the fixture
struct Fixture {
    state: EngineState,
    _dir: TempDir,
}

async fn setup() -> Fixture {
    setup_with(|_| {}).await
}

async fn setup_with(configure: impl FnOnce(&mut EngineConfig)) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EngineConfig::with_work_dir(dir.path());
    configure(&mut config);
    let state = EngineState::initialize(&config).await.unwrap();
    Fixture { state, _dir: dir }
}

impl Fixture {
    fn orders(&self) -> &OrderService {
        &self.state.orders
    }

    async fn ingredient(&self, name: &str, unit: &str, opening_stock: f64) -> Ingredient {
        self.state
            .inventory
            .create_ingredient(
                IngredientCreate {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    reorder_threshold: 0.0,
                    opening_stock,
                },
                STAFF,
            )
            .await
            .unwrap()
    }

    async fn menu_item(&self, name: &str, price: f64, recipe: &[(i64, f64)]) -> MenuItem {
        let item = self
            .state
            .catalog
            .create_menu_item(MenuItemCreate {
                name: name.to_string(),
                price,
            })
            .await
            .unwrap();
        if !recipe.is_empty() {
            self.state
                .catalog
                .set_recipe(item.id, recipe)
                .await
                .unwrap();
        }
        item
    }

    /// Create a dine-in order from `(menu_item_id, quantity)` pairs
    async fn order(&self, lines: &[(i64, i32)]) -> i64 {
        self.orders()
            .create_order(order_request(lines))
            .await
            .unwrap()
            .order_id
    }

    async fn transition(
        &self,
        order_id: i64,
        target: OrderStatus,
    ) -> EngineResult<TransitionOutcome> {
        self.orders()
            .transition_status(TransitionRequest {
                order_id,
                target_status: target,
                staff_id: STAFF,
            })
            .await
    }

    async fn status(&self, order_id: i64) -> OrderStatus {
        self.orders()
            .get_order(order_id)
            .await
            .unwrap()
            .order
            .status
    }

    async fn stock(&self, ingredient_id: i64) -> f64 {
        self.state
            .inventory
            .get_ingredient(ingredient_id)
            .await
            .unwrap()
            .stock_level
    }

    async fn pay(&self, order_id: i64, amount: f64) -> Payment {
        self.orders()
            .record_payment(PaymentCreate {
                order_id,
                method: "CASH".into(),
                amount,
                tendered: None,
            })
            .await
            .unwrap()
    }

    /// Stock log entries of one order, oldest first
    async fn order_entries(&self, order_id: i64) -> Vec<StockChangeLogEntry> {
        let (mut entries, _) = self
            .state
            .audit
            .query(&StockLogQuery {
                order_id: Some(order_id),
                ..Default::default()
            })
            .await
            .unwrap();
        entries.reverse();
        entries
    }

    async fn assert_reconciled(&self) {
        let report = self.state.audit.reconcile().await.unwrap();
        assert!(report.is_consistent(), "drift: {:?}", report.drifts);
    }
}

fn order_request(lines: &[(i64, i32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        customer_id: Some(1),
        kind: OrderKind::DineIn,
        destination: "Table 4".into(),
        instructions: None,
        items: lines
            .iter()
            .map(|(menu_item_id, quantity)| LineItemRequest {
                menu_item_id: *menu_item_id,
                quantity: *quantity,
                instructions: None,
            })
            .collect(),
    }
}

/// 1000 g beef; burger uses 150 g per unit
async fn burger_setup() -> (Fixture, Ingredient, MenuItem) {
    let fx = setup().await;
    let beef = fx.ingredient("Beef", "g", 1000.0).await;
    let burger = fx.menu_item("Burger", 12.50, &[(beef.id, 150.0)]).await;
    (fx, beef, burger)
}

mod test_concurrency;
mod test_inventory;
