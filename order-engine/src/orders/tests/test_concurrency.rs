use super::*;
use crate::db::TransactionManager;
use futures::future::join_all;

/// Retry a transition while it fails with a retryable conflict
async fn transition_with_retry(
    fx: &Fixture,
    order_id: i64,
    target: OrderStatus,
) -> EngineResult<TransitionOutcome> {
    loop {
        match fx.transition(order_id, target).await {
            Err(e) if e.is_retryable() => tokio::task::yield_now().await,
            other => return other,
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_of_same_order_deduct_once() {
    let (fx, beef, burger) = burger_setup().await;
    let order_id = fx.order(&[(burger.id, 2)]).await;

    let (a, b) = tokio::join!(
        transition_with_retry(&fx, order_id, OrderStatus::Preparing),
        transition_with_retry(&fx, order_id, OrderStatus::Preparing),
    );

    let results = [a, b];
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(EngineError::InvalidTransition {
            from: OrderStatus::Preparing,
            to: OrderStatus::Preparing,
            ..
        })
    )));

    assert_eq!(fx.stock(beef.id).await, 700.0);
    assert_eq!(fx.order_entries(order_id).await.len(), 1);
    fx.assert_reconciled().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_competing_orders_never_oversell() {
    let (fx, beef, burger) = burger_setup().await;
    // 600 g each against 1000 g
    let first = fx.order(&[(burger.id, 4)]).await;
    let second = fx.order(&[(burger.id, 4)]).await;

    let (a, b) = tokio::join!(
        transition_with_retry(&fx, first, OrderStatus::Preparing),
        transition_with_retry(&fx, second, OrderStatus::Preparing),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(EngineError::InsufficientStock(_))))
    );

    assert_eq!(fx.stock(beef.id).await, 400.0);
    let statuses = [fx.status(first).await, fx.status(second).await];
    assert!(statuses.contains(&OrderStatus::Preparing));
    assert!(statuses.contains(&OrderStatus::Pending));
    fx.assert_reconciled().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_orders_drain_stock_exactly() {
    let (fx, beef, burger) = burger_setup().await;
    let mut order_ids = Vec::new();
    for _ in 0..10 {
        order_ids.push(fx.order(&[(burger.id, 1)]).await);
    }

    let results = join_all(
        order_ids
            .iter()
            .map(|id| transition_with_retry(&fx, *id, OrderStatus::Preparing)),
    )
    .await;

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let short = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::InsufficientStock(_))))
        .count();
    // floor(1000 / 150) = 6
    assert_eq!(accepted, 6);
    assert_eq!(short, 4);
    assert_eq!(fx.stock(beef.id).await, 100.0);

    let (deducts, total) = fx
        .state
        .audit
        .query(&StockLogQuery {
            action: Some(StockAction::OrderDeduct),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 6);
    assert!(deducts.iter().all(|e| e.resulting_level >= 0.0));
    fx.assert_reconciled().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancel_and_payment_are_serialized() {
    let (fx, beef, burger) = burger_setup().await;
    let order_id = fx.order(&[(burger.id, 2)]).await;
    fx.transition(order_id, OrderStatus::Preparing).await.unwrap();

    let (cancel, payment) = tokio::join!(
        transition_with_retry(&fx, order_id, OrderStatus::Cancelled),
        fx.orders().record_payment(PaymentCreate {
            order_id,
            method: "CARD".into(),
            amount: 10.0,
            tendered: None,
        }),
    );
    cancel.unwrap();
    payment.unwrap();

    // Either order is valid; the stock must match whichever ran first
    let restored = fx.order_entries(order_id).await.len() == 2;
    let expected = if restored { 1000.0 } else { 700.0 };
    assert_eq!(fx.stock(beef.id).await, expected);
    assert_eq!(fx.status(order_id).await, OrderStatus::Cancelled);
    fx.assert_reconciled().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_wait_times_out_as_retryable() {
    let fx = setup_with(|config| config.lock_timeout_ms = 200).await;
    let beef = fx.ingredient("Beef", "g", 1000.0).await;
    let burger = fx.menu_item("Burger", 12.50, &[(beef.id, 150.0)]).await;
    let order_id = fx.order(&[(burger.id, 1)]).await;

    let held = TransactionManager::new(fx.state.db.pool.clone())
        .lock_order(order_id)
        .await
        .unwrap();
    assert_eq!(held.order().status, OrderStatus::Pending);

    let err = fx
        .transition(order_id, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Concurrency(_)));
    assert!(err.is_retryable());
    let app = shared::AppError::from(err);
    assert_eq!(app.code, shared::ErrorCode::SystemBusy);
    assert!(!app.message.contains("database"));

    // Readers are not blocked by the lock
    assert_eq!(fx.status(order_id).await, OrderStatus::Pending);
    assert_eq!(fx.stock(beef.id).await, 1000.0);

    held.rollback().await.unwrap();

    let outcome = fx.transition(order_id, OrderStatus::Preparing).await.unwrap();
    assert_eq!(outcome.new_status, OrderStatus::Preparing);
    assert_eq!(fx.stock(beef.id).await, 850.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_order_lock_blocks_every_writer() {
    // SQLite has a single writer: holding one order's lock also holds up
    // transitions of other orders and order creation until release
    let fx = setup_with(|config| config.lock_timeout_ms = 200).await;
    let tea = fx.menu_item("Tea", 2.00, &[]).await;
    let held_order = fx.order(&[(tea.id, 1)]).await;
    let other_order = fx.order(&[(tea.id, 1)]).await;

    let held = TransactionManager::new(fx.state.db.pool.clone())
        .lock_order(held_order)
        .await
        .unwrap();

    let err = fx
        .transition(other_order, OrderStatus::Preparing)
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    let err = fx
        .orders()
        .create_order(order_request(&[(tea.id, 1)]))
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    held.commit().await.unwrap();

    fx.transition(other_order, OrderStatus::Preparing)
        .await
        .unwrap();
    fx.order(&[(tea.id, 1)]).await;
    assert_eq!(fx.status(held_order).await, OrderStatus::Pending);
}
