//! Recipe Requirement Repository

use super::RepoResult;
use shared::models::RecipeRequirement;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Replace the full recipe of a menu item
pub async fn replace_for_menu_item(
    conn: &mut SqliteConnection,
    menu_item_id: i64,
    requirements: &[(i64, f64)],
) -> RepoResult<()> {
    sqlx::query("DELETE FROM recipe_requirements WHERE menu_item_id = ?")
        .bind(menu_item_id)
        .execute(&mut *conn)
        .await?;

    if requirements.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO recipe_requirements (menu_item_id, ingredient_id, quantity_per_unit) ",
    );
    builder.push_values(requirements, |mut b, (ingredient_id, quantity)| {
        b.push_bind(menu_item_id)
            .push_bind(*ingredient_id)
            .push_bind(*quantity);
    });
    builder.build().execute(&mut *conn).await?;
    Ok(())
}

pub async fn find_by_menu_item(
    conn: &mut SqliteConnection,
    menu_item_id: i64,
) -> RepoResult<Vec<RecipeRequirement>> {
    let rows = sqlx::query_as::<_, RecipeRequirement>(
        "SELECT menu_item_id, ingredient_id, quantity_per_unit FROM recipe_requirements WHERE menu_item_id = ? ORDER BY ingredient_id",
    )
    .bind(menu_item_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Recipe rows for a set of menu items, in one round trip
pub async fn find_by_menu_items(
    conn: &mut SqliteConnection,
    menu_item_ids: &[i64],
) -> RepoResult<Vec<RecipeRequirement>> {
    if menu_item_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT menu_item_id, ingredient_id, quantity_per_unit FROM recipe_requirements WHERE menu_item_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in menu_item_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY ingredient_id, menu_item_id");
    let rows = builder
        .build_query_as::<RecipeRequirement>()
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}
