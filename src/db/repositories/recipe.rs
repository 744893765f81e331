use std::collections::HashMap;

use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::entities::{ingredients, recipe_ingredients, recipes, users};
use crate::models::recipe::{IngredientAmount, NewRecipe, NewRecipeIngredient, Recipe, RecipeUpdate};

/// Aggregated shopping-list line: total amount per (name, unit) pair.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ShoppingListRow {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// A cart recipe with its author, for the export footer.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CartRecipeRow {
    pub name: String,
    pub author: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecipePageFilter {
    pub author_id: Option<i32>,
    /// When set, restrict the listing to these ids (favorite/cart filters).
    /// An empty vec matches nothing.
    pub id_in: Option<Vec<i32>>,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone, FromQueryResult)]
struct AmountRow {
    recipe_id: i32,
    ingredient_id: i32,
    name: String,
    measurement_unit: String,
    amount: i32,
}

pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a recipe and its ingredient rows in one transaction.
    pub async fn create(&self, new: NewRecipe) -> Result<i32> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let now = chrono::Utc::now().to_rfc3339();
        let model = recipes::ActiveModel {
            author_id: Set(new.author_id),
            name: Set(new.name),
            image: Set(new.image),
            text: Set(new.text),
            cooking_time: Set(new.cooking_time),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        insert_amounts(&txn, model.id, &new.ingredients).await?;

        txn.commit().await.context("Failed to commit recipe")?;

        Ok(model.id)
    }

    /// Apply an update; provided ingredients replace the prior set
    /// atomically. Returns false when the recipe does not exist.
    pub async fn update(&self, id: i32, update: RecipeUpdate) -> Result<bool> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let Some(model) = recipes::Entity::find_by_id(id)
            .one(&txn)
            .await
            .context("Failed to query recipe for update")?
        else {
            return Ok(false);
        };

        let mut active: recipes::ActiveModel = model.into();
        let mut changed = false;
        if let Some(name) = update.name {
            active.name = Set(name);
            changed = true;
        }
        if let Some(image) = update.image {
            active.image = Set(image);
            changed = true;
        }
        if let Some(text) = update.text {
            active.text = Set(text);
            changed = true;
        }
        if let Some(cooking_time) = update.cooking_time {
            active.cooking_time = Set(cooking_time);
            changed = true;
        }
        // An update that only replaces ingredients has no dirty columns;
        // issuing an empty UPDATE is an error at the ORM layer.
        if changed {
            active.update(&txn).await.context("Failed to update recipe")?;
        }

        if let Some(ingredients) = update.ingredients {
            recipe_ingredients::Entity::delete_many()
                .filter(recipe_ingredients::Column::RecipeId.eq(id))
                .exec(&txn)
                .await
                .context("Failed to clear recipe ingredients")?;

            insert_amounts(&txn, id, &ingredients).await?;
        }

        txn.commit().await.context("Failed to commit recipe update")?;

        Ok(true)
    }

    pub async fn get_model(&self, id: i32) -> Result<Option<recipes::Model>> {
        recipes::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query recipe by ID")
    }

    pub async fn get(&self, id: i32) -> Result<Option<Recipe>> {
        let Some(model) = self.get_model(id).await? else {
            return Ok(None);
        };

        let mut amounts = self.ingredient_amounts_for(&[id]).await?;
        let ingredients = amounts.remove(&id).unwrap_or_default();

        Ok(Some(Recipe::from_parts(model, ingredients)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let res = recipes::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete recipe")?;

        Ok(res.rows_affected > 0)
    }

    /// Filtered listing with the recipe authors, newest first.
    pub async fn page(
        &self,
        filter: &RecipePageFilter,
    ) -> Result<(u64, Vec<(recipes::Model, users::Model)>)> {
        let mut query = recipes::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id);

        if let Some(author_id) = filter.author_id {
            query = query.filter(recipes::Column::AuthorId.eq(author_id));
        }
        if let Some(ids) = &filter.id_in {
            query = query.filter(recipes::Column::Id.is_in(ids.clone()));
        }

        let paginator = query.paginate(&self.conn, filter.per_page);
        let count = paginator
            .num_items()
            .await
            .context("Failed to count recipes")?;
        let rows = paginator
            .fetch_page(filter.page.saturating_sub(1))
            .await
            .context("Failed to fetch recipe page")?;

        let mut out = Vec::with_capacity(rows.len());
        for (recipe, author) in rows {
            let author = author.context("Recipe author row missing")?;
            out.push((recipe, author));
        }

        Ok((count, out))
    }

    /// Ingredient rows for a batch of recipes, joined with the catalog,
    /// keyed by recipe id.
    pub async fn ingredient_amounts_for(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<IngredientAmount>>> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = recipe_ingredients::Entity::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredients.def(),
            )
            .select_only()
            .column(recipe_ingredients::Column::RecipeId)
            .column(recipe_ingredients::Column::IngredientId)
            .column(ingredients::Column::Name)
            .column(ingredients::Column::MeasurementUnit)
            .column(recipe_ingredients::Column::Amount)
            .order_by_asc(recipe_ingredients::Column::IngredientId)
            .into_model::<AmountRow>()
            .all(&self.conn)
            .await
            .context("Failed to query recipe ingredients")?;

        let mut map: HashMap<i32, Vec<IngredientAmount>> = HashMap::new();
        for row in rows {
            map.entry(row.recipe_id).or_default().push(IngredientAmount {
                ingredient_id: row.ingredient_id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                amount: row.amount,
            });
        }

        Ok(map)
    }

    pub async fn exists_for_author_with_name(&self, author_id: i32, name: &str) -> Result<bool> {
        let count = recipes::Entity::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .filter(recipes::Column::Name.eq(name))
            .count(&self.conn)
            .await
            .context("Failed to count recipes by author and name")?;

        Ok(count > 0)
    }

    /// Recipe counts per author, for annotating subscription listings.
    pub async fn count_by_authors(&self, author_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = recipes::Entity::find()
            .select_only()
            .column(recipes::Column::AuthorId)
            .column_as(recipes::Column::Id.count(), "count")
            .filter(recipes::Column::AuthorId.is_in(author_ids.to_vec()))
            .group_by(recipes::Column::AuthorId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count recipes per author")?;

        Ok(rows.into_iter().collect())
    }

    /// Newest recipes of one author, optionally truncated.
    pub async fn recent_for_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipes::Model>> {
        let mut query = recipes::Entity::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .order_by_desc(recipes::Column::CreatedAt)
            .order_by_desc(recipes::Column::Id);

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to query recipes for author")
    }

    /// The shopping-list aggregation: union of ingredient amounts across the
    /// given recipes, grouped and summed per (name, unit), name ascending.
    pub async fn aggregate_cart_ingredients(
        &self,
        recipe_ids: &[i32],
    ) -> Result<Vec<ShoppingListRow>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        recipe_ingredients::Entity::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.to_vec()))
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredients.def(),
            )
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount.sum(), "total")
            .group_by(ingredients::Column::Name)
            .group_by(ingredients::Column::MeasurementUnit)
            .order_by_asc(ingredients::Column::Name)
            .into_model::<ShoppingListRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate shopping list")
    }

    /// Names and authors of the given recipes, name ascending, for the
    /// export footer.
    pub async fn cart_recipe_briefs(&self, recipe_ids: &[i32]) -> Result<Vec<CartRecipeRow>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        recipes::Entity::find()
            .filter(recipes::Column::Id.is_in(recipe_ids.to_vec()))
            .join(JoinType::InnerJoin, recipes::Relation::Users.def())
            .select_only()
            .column_as(recipes::Column::Name, "name")
            .column_as(users::Column::Username, "author")
            .order_by_asc(recipes::Column::Name)
            .into_model::<CartRecipeRow>()
            .all(&self.conn)
            .await
            .context("Failed to query cart recipe briefs")
    }
}

async fn insert_amounts(
    txn: &sea_orm::DatabaseTransaction,
    recipe_id: i32,
    amounts: &[NewRecipeIngredient],
) -> Result<()> {
    if amounts.is_empty() {
        return Ok(());
    }

    let rows = amounts.iter().map(|item| recipe_ingredients::ActiveModel {
        recipe_id: Set(recipe_id),
        ingredient_id: Set(item.ingredient_id),
        amount: Set(item.amount),
    });

    recipe_ingredients::Entity::insert_many(rows)
        .exec_without_returning(txn)
        .await
        .context("Failed to insert recipe ingredients")?;

    Ok(())
}
