//! Menu Item Repository

use super::{RepoError, RepoResult};
use shared::models::{MenuItem, MenuItemCreate};
use sqlx::SqliteConnection;

const COLUMNS: &str = "id, name, price, is_available";

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<MenuItem>> {
    let sql = format!("SELECT {COLUMNS} FROM menu_items WHERE id = ?");
    let row = sqlx::query_as::<_, MenuItem>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

pub async fn find_all(conn: &mut SqliteConnection) -> RepoResult<Vec<MenuItem>> {
    let sql = format!("SELECT {COLUMNS} FROM menu_items ORDER BY id");
    let rows = sqlx::query_as::<_, MenuItem>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

pub async fn create(conn: &mut SqliteConnection, data: &MenuItemCreate) -> RepoResult<MenuItem> {
    let now = shared::util::now_millis();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO menu_items (name, price, is_available, created_at, updated_at) VALUES (?1, ?2, 1, ?3, ?3) RETURNING id",
    )
    .bind(&data.name)
    .bind(data.price)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create menu item".into()))
}

/// Change the catalog price; existing line items keep the price they captured
pub async fn update_price(conn: &mut SqliteConnection, id: i64, price: f64) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE menu_items SET price = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(price)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn set_available(
    conn: &mut SqliteConnection,
    id: i64,
    is_available: bool,
) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows =
        sqlx::query("UPDATE menu_items SET is_available = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(is_available)
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    Ok(rows.rows_affected() > 0)
}
