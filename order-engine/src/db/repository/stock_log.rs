//! Stock Change Log Repository
//!
//! Insert and select only; the schema rejects UPDATE and DELETE.

use super::{RepoResult, parse_column};
use shared::models::{StockAction, StockChangeLogEntry, StockLogQuery};
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, ingredient_id, order_id, action, quantity_change, resulting_level, staff_id, note, created_at";

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: i64,
    ingredient_id: i64,
    order_id: Option<i64>,
    action: String,
    quantity_change: f64,
    resulting_level: f64,
    staff_id: i64,
    note: Option<String>,
    created_at: i64,
}

impl EntryRow {
    fn into_entry(self) -> RepoResult<StockChangeLogEntry> {
        Ok(StockChangeLogEntry {
            id: self.id,
            ingredient_id: self.ingredient_id,
            order_id: self.order_id,
            action: parse_column::<StockAction>("stock_change_log.action", &self.action)?,
            quantity_change: self.quantity_change,
            resulting_level: self.resulting_level,
            staff_id: self.staff_id,
            note: self.note,
            created_at: self.created_at,
        })
    }
}

fn into_entries(rows: Vec<EntryRow>) -> RepoResult<Vec<StockChangeLogEntry>> {
    rows.into_iter().map(EntryRow::into_entry).collect()
}

pub struct NewEntry<'a> {
    pub ingredient_id: i64,
    pub order_id: Option<i64>,
    pub action: StockAction,
    pub quantity_change: f64,
    pub resulting_level: f64,
    pub staff_id: i64,
    pub note: Option<&'a str>,
}

pub async fn insert(
    conn: &mut SqliteConnection,
    entry: &NewEntry<'_>,
) -> RepoResult<StockChangeLogEntry> {
    let now = shared::util::now_millis();
    let sql = format!(
        "INSERT INTO stock_change_log (ingredient_id, order_id, action, quantity_change, resulting_level, staff_id, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(entry.ingredient_id)
        .bind(entry.order_id)
        .bind(entry.action.as_str())
        .bind(entry.quantity_change)
        .bind(entry.resulting_level)
        .bind(entry.staff_id)
        .bind(entry.note)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    row.into_entry()
}

/// Newest first, filtered by any combination of ingredient, order and action
pub async fn find_many(
    conn: &mut SqliteConnection,
    query: &StockLogQuery,
) -> RepoResult<Vec<StockChangeLogEntry>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM stock_change_log WHERE (?1 IS NULL OR ingredient_id = ?1) AND (?2 IS NULL OR order_id = ?2) AND (?3 IS NULL OR action = ?3) ORDER BY id DESC LIMIT ?4 OFFSET ?5"
    );
    let rows = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(query.ingredient_id)
        .bind(query.order_id)
        .bind(query.action.map(|a| a.as_str()))
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&mut *conn)
        .await?;
    into_entries(rows)
}

/// Total entries matching the filter (ignoring pagination)
pub async fn count(conn: &mut SqliteConnection, query: &StockLogQuery) -> RepoResult<i64> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM stock_change_log WHERE (?1 IS NULL OR ingredient_id = ?1) AND (?2 IS NULL OR order_id = ?2) AND (?3 IS NULL OR action = ?3)",
    )
    .bind(query.ingredient_id)
    .bind(query.order_id)
    .bind(query.action.map(|a| a.as_str()))
    .fetch_one(&mut *conn)
    .await?;
    Ok(total)
}

/// Order-driven entries of one order, in insertion order
pub async fn find_order_movements(
    conn: &mut SqliteConnection,
    order_id: i64,
) -> RepoResult<Vec<StockChangeLogEntry>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM stock_change_log WHERE order_id = ?1 AND action IN ('ORDER_DEDUCT', 'ORDER_RESTORE') ORDER BY id ASC"
    );
    let rows = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    into_entries(rows)
}

/// `(ingredient_id, quantity_change)` for every entry, in insertion order
pub async fn all_changes(conn: &mut SqliteConnection) -> RepoResult<Vec<(i64, f64)>> {
    let rows = sqlx::query_as::<_, (i64, f64)>(
        "SELECT ingredient_id, quantity_change FROM stock_change_log ORDER BY id ASC",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}
