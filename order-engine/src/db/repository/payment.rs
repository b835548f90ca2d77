//! Payment Repository

use super::{RepoResult, parse_column};
use shared::models::{Payment, PaymentStatus};
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, order_id, method, amount, tendered, change_amount, status, created_at";

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: i64,
    order_id: i64,
    method: String,
    amount: f64,
    tendered: Option<f64>,
    change_amount: f64,
    status: String,
    created_at: i64,
}

impl PaymentRow {
    fn into_payment(self) -> RepoResult<Payment> {
        Ok(Payment {
            id: self.id,
            order_id: self.order_id,
            method: self.method,
            amount: self.amount,
            tendered: self.tendered,
            change_amount: self.change_amount,
            status: parse_column::<PaymentStatus>("payments.status", &self.status)?,
            created_at: self.created_at,
        })
    }
}

pub struct NewPayment<'a> {
    pub order_id: i64,
    pub method: &'a str,
    pub amount: f64,
    pub tendered: Option<f64>,
    pub change_amount: f64,
    pub status: PaymentStatus,
}

pub async fn insert(conn: &mut SqliteConnection, data: &NewPayment<'_>) -> RepoResult<Payment> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO payments (order_id, method, amount, tendered, change_amount, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(data.order_id)
        .bind(data.method)
        .bind(data.amount)
        .bind(data.tendered)
        .bind(data.change_amount)
        .bind(data.status.as_str())
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    row.into_payment()
}

pub async fn find_by_order(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Vec<Payment>> {
    let sql = format!("SELECT {COLUMNS} FROM payments WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, PaymentRow>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    rows.into_iter().map(PaymentRow::into_payment).collect()
}

/// Whether any payment for the order has been captured
pub async fn has_paid(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<bool> {
    let paid: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM payments WHERE order_id = ? AND status = 'PAID')",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(paid != 0)
}
