use std::collections::HashSet;

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect, Set,
};

use crate::db::InsertOutcome;
use crate::entities::{favorites, shopping_carts};

/// Favorites and shopping-cart membership. Both relations are plain
/// (user, recipe) sets with identical toggle semantics; the composite
/// primary key settles concurrent duplicate adds.
pub struct MarkRepository {
    conn: DatabaseConnection,
}

impl MarkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add_favorite(&self, user_id: i32, recipe_id: i32) -> Result<InsertOutcome> {
        let exists = favorites::Entity::find_by_id((user_id, recipe_id))
            .count(&self.conn)
            .await
            .context("Failed to check favorite membership")?
            > 0;
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }

        let active = favorites::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
        };

        match favorites::Entity::insert(active)
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) => {
                if matches!(
                    err.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    Ok(InsertOutcome::Duplicate)
                } else {
                    Err(err).context("Failed to insert favorite")
                }
            }
        }
    }

    pub async fn remove_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let res = favorites::Entity::delete_many()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::RecipeId.eq(recipe_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete favorite")?;

        Ok(res.rows_affected > 0)
    }

    /// Which of `recipe_ids` the user has favorited. Batch lookup for
    /// annotating a page of recipes without a query per row.
    pub async fn favorited_among(&self, user_id: i32, recipe_ids: &[i32]) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = favorites::Entity::find()
            .select_only()
            .column(favorites::Column::RecipeId)
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query favorited recipes")?;

        Ok(ids.into_iter().collect())
    }

    pub async fn favorited_recipe_ids_for(&self, user_id: i32) -> Result<Vec<i32>> {
        let ids: Vec<i32> = favorites::Entity::find()
            .select_only()
            .column(favorites::Column::RecipeId)
            .filter(favorites::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query favorite recipe IDs")?;

        Ok(ids)
    }

    pub async fn add_cart_recipe(&self, user_id: i32, recipe_id: i32) -> Result<InsertOutcome> {
        let exists = shopping_carts::Entity::find_by_id((user_id, recipe_id))
            .count(&self.conn)
            .await
            .context("Failed to check cart membership")?
            > 0;
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }

        let active = shopping_carts::ActiveModel {
            user_id: Set(user_id),
            recipe_id: Set(recipe_id),
        };

        match shopping_carts::Entity::insert(active)
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) => {
                if matches!(
                    err.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    Ok(InsertOutcome::Duplicate)
                } else {
                    Err(err).context("Failed to insert cart recipe")
                }
            }
        }
    }

    pub async fn remove_cart_recipe(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        let res = shopping_carts::Entity::delete_many()
            .filter(shopping_carts::Column::UserId.eq(user_id))
            .filter(shopping_carts::Column::RecipeId.eq(recipe_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete cart recipe")?;

        Ok(res.rows_affected > 0)
    }

    pub async fn in_cart_among(&self, user_id: i32, recipe_ids: &[i32]) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = shopping_carts::Entity::find()
            .select_only()
            .column(shopping_carts::Column::RecipeId)
            .filter(shopping_carts::Column::UserId.eq(user_id))
            .filter(shopping_carts::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query cart recipes")?;

        Ok(ids.into_iter().collect())
    }

    /// Every recipe id in the user's cart, for listing filters and the
    /// shopping-list aggregation.
    pub async fn cart_recipe_ids_for(&self, user_id: i32) -> Result<Vec<i32>> {
        let ids: Vec<i32> = shopping_carts::Entity::find()
            .select_only()
            .column(shopping_carts::Column::RecipeId)
            .filter(shopping_carts::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query cart recipe IDs")?;

        Ok(ids)
    }
}
