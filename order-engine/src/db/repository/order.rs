//! Order Repository

use super::{RepoResult, parse_column};
use shared::models::{Order, OrderKind, OrderLineItem, OrderQuery, OrderStatus, OrderTotals};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

const ORDER_COLUMNS: &str = "id, customer_id, kind, destination, status, instructions, items_subtotal, service_charge, tax, grand_total, staff_id, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, menu_item_id, name, quantity, unit_price, subtotal, instructions";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i64,
    customer_id: Option<i64>,
    kind: String,
    destination: String,
    status: String,
    instructions: Option<String>,
    items_subtotal: Option<f64>,
    service_charge: Option<f64>,
    tax: Option<f64>,
    grand_total: Option<f64>,
    staff_id: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl OrderRow {
    fn into_order(self) -> RepoResult<Order> {
        let totals = match (
            self.items_subtotal,
            self.service_charge,
            self.tax,
            self.grand_total,
        ) {
            (Some(items_subtotal), Some(service_charge), Some(tax), Some(grand_total)) => {
                Some(OrderTotals {
                    items_subtotal,
                    service_charge,
                    tax,
                    grand_total,
                })
            }
            _ => None,
        };
        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            kind: parse_column::<OrderKind>("orders.kind", &self.kind)?,
            destination: self.destination,
            status: parse_column::<OrderStatus>("orders.status", &self.status)?,
            instructions: self.instructions,
            totals,
            staff_id: self.staff_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> RepoResult<Vec<Order>> {
    rows.into_iter().map(OrderRow::into_order).collect()
}

/// Header fields of a new order; totals are filled in once line items exist
pub struct NewOrder<'a> {
    pub customer_id: Option<i64>,
    pub kind: OrderKind,
    pub destination: &'a str,
    pub instructions: Option<&'a str>,
}

/// Line item with its price captured at creation time
pub struct NewLineItem<'a> {
    pub menu_item_id: i64,
    pub name: &'a str,
    pub quantity: i32,
    pub unit_price: f64,
    pub subtotal: f64,
    pub instructions: Option<&'a str>,
}

/// Insert a PENDING order header and return its id
pub async fn insert(conn: &mut SqliteConnection, data: &NewOrder<'_>) -> RepoResult<i64> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO orders (customer_id, kind, destination, status, instructions, created_at, updated_at) VALUES (?1, ?2, ?3, 'PENDING', ?4, ?5, ?5) RETURNING id",
    )
    .bind(data.customer_id)
    .bind(data.kind.as_str())
    .bind(data.destination)
    .bind(data.instructions)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item: &NewLineItem<'_>,
) -> RepoResult<OrderLineItem> {
    let sql = format!(
        "INSERT INTO order_items (order_id, menu_item_id, name, quantity, unit_price, subtotal, instructions) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING {ITEM_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderLineItem>(&sql)
        .bind(order_id)
        .bind(item.menu_item_id)
        .bind(item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.subtotal)
        .bind(item.instructions)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn set_totals(
    conn: &mut SqliteConnection,
    order_id: i64,
    totals: &OrderTotals,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE orders SET items_subtotal = ?1, service_charge = ?2, tax = ?3, grand_total = ?4 WHERE id = ?5",
    )
    .bind(totals.items_subtotal)
    .bind(totals.service_charge)
    .bind(totals.tax)
    .bind(totals.grand_total)
    .bind(order_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Claim the order row for the rest of the transaction.
///
/// The write makes SQLite take its RESERVED lock before anything is read, so
/// a competing writer blocks here (up to `busy_timeout`) instead of acting on
/// a stale status. Returns `None` when the order does not exist.
pub async fn lock(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Option<Order>> {
    let sql = format!(
        "UPDATE orders SET lock_version = lock_version + 1 WHERE id = ? RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(OrderRow::into_order).transpose()
}

pub async fn update_status(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
    staff_id: i64,
) -> RepoResult<Order> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE orders SET status = ?1, staff_id = ?2, updated_at = ?3 WHERE id = ?4 RETURNING {ORDER_COLUMNS}"
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(status.as_str())
        .bind(staff_id)
        .bind(now)
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;
    row.into_order()
}

pub async fn find_by_id(conn: &mut SqliteConnection, order_id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let row = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(OrderRow::into_order).transpose()
}

/// Newest first, optionally narrowed by customer and status
pub async fn find_many(conn: &mut SqliteConnection, query: &OrderQuery) -> RepoResult<Vec<Order>> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE (?1 IS NULL OR customer_id = ?1) AND (?2 IS NULL OR status = ?2) ORDER BY created_at DESC, id DESC LIMIT ?3 OFFSET ?4"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(query.customer_id)
        .bind(query.status.map(|s| s.as_str()))
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&mut *conn)
        .await?;
    into_orders(rows)
}

/// Orders the kitchen still has to act on, oldest first
pub async fn find_active(conn: &mut SqliteConnection) -> RepoResult<Vec<Order>> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
    builder.push(ORDER_COLUMNS);
    builder.push(" FROM orders WHERE status IN (");
    let mut separated = builder.separated(", ");
    for status in OrderStatus::ACTIVE {
        separated.push_bind(status.as_str());
    }
    separated.push_unseparated(") ORDER BY created_at ASC, id ASC");
    let rows = builder
        .build_query_as::<OrderRow>()
        .fetch_all(&mut *conn)
        .await?;
    into_orders(rows)
}

pub async fn items_for_order(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<OrderLineItem>> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY id");
    let rows = sqlx::query_as::<_, OrderLineItem>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub async fn items_for_orders(
    conn: &mut SqliteConnection,
    order_ids: &[i64],
) -> RepoResult<Vec<OrderLineItem>> {
    if order_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
    builder.push(ITEM_COLUMNS);
    builder.push(" FROM order_items WHERE order_id IN (");
    let mut separated = builder.separated(", ");
    for id in order_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY order_id, id");
    let rows = builder
        .build_query_as::<OrderLineItem>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}
