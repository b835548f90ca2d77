//! Ingredient Repository

use super::{RepoError, RepoResult};
use shared::models::Ingredient;
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, name, unit, stock_level, reorder_threshold, created_at, updated_at";

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients WHERE id = ?");
    let row = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_all(conn: &mut SqliteConnection) -> RepoResult<Vec<Ingredient>> {
    let sql = format!("SELECT {COLUMNS} FROM ingredients ORDER BY id");
    let rows = sqlx::query_as::<_, Ingredient>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Ingredients at or below their reorder threshold
pub async fn find_low_stock(conn: &mut SqliteConnection) -> RepoResult<Vec<Ingredient>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM ingredients WHERE stock_level <= reorder_threshold ORDER BY stock_level ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, Ingredient>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Insert with zero stock; opening stock is booked separately as a restock
pub async fn insert(
    conn: &mut SqliteConnection,
    name: &str,
    unit: &str,
    reorder_threshold: f64,
) -> RepoResult<Ingredient> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO ingredients (name, unit, stock_level, reorder_threshold, created_at, updated_at) VALUES (?1, ?2, 0, ?3, ?4, ?4) RETURNING id",
    )
    .bind(name)
    .bind(unit)
    .bind(reorder_threshold)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create ingredient".into()))
}

/// Update descriptive fields; `None` keeps the stored value.
/// Returns `None` if the ingredient does not exist.
pub async fn update_details(
    conn: &mut SqliteConnection,
    id: i64,
    name: Option<&str>,
    unit: Option<&str>,
    reorder_threshold: Option<f64>,
) -> RepoResult<Option<Ingredient>> {
    let now = shared::util::now_millis();
    let sql = format!(
        "UPDATE ingredients SET name = COALESCE(?1, name), unit = COALESCE(?2, unit), reorder_threshold = COALESCE(?3, reorder_threshold), updated_at = ?4 WHERE id = ?5 RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(name)
        .bind(unit)
        .bind(reorder_threshold)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Claim the ingredient row for the rest of the transaction (see `order::lock`)
pub async fn lock(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Ingredient>> {
    let sql = format!(
        "UPDATE ingredients SET updated_at = updated_at WHERE id = ? RETURNING {COLUMNS}"
    );
    let row = sqlx::query_as::<_, Ingredient>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Compare-and-set the stock level.
///
/// Only writes when the stored level still equals `expected`; returns whether
/// the write happened.
pub async fn compare_and_set_level(
    conn: &mut SqliteConnection,
    id: i64,
    expected: f64,
    new_level: f64,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE ingredients SET stock_level = ?1, updated_at = ?2 WHERE id = ?3 AND stock_level = ?4",
    )
    .bind(new_level)
    .bind(now)
    .bind(id)
    .bind(expected)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}
