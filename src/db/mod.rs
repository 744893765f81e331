use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{ingredients, recipes};
use crate::models::recipe::{NewRecipe, Recipe, RecipeUpdate};
use crate::models::user::{NewUser, User};

pub mod migrator;
pub mod repositories;

pub use repositories::recipe::{CartRecipeRow, RecipePageFilter, ShoppingListRow};

/// Outcome of inserting a row guarded by a uniqueness constraint. Racing
/// duplicate inserts are settled by the constraint itself, so callers see
/// exactly one `Inserted` and the rest `Duplicate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn mark_repo(&self) -> repositories::marks::MarkRepository {
        repositories::marks::MarkRepository::new(self.conn.clone())
    }

    fn subscription_repo(&self) -> repositories::subscription::SubscriptionRepository {
        repositories::subscription::SubscriptionRepository::new(self.conn.clone())
    }

    // Users & tokens

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.user_repo().email_taken(email).await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.user_repo().username_taken(username).await
    }

    pub async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
        self.user_repo().create(input).await
    }

    pub async fn page_users(&self, page: u64, per_page: u64) -> Result<(u64, Vec<User>)> {
        self.user_repo().page(page, per_page).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn set_user_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .set_password(user_id, new_password, config)
            .await
    }

    pub async fn set_user_avatar(
        &self,
        user_id: i32,
        avatar: Option<String>,
    ) -> Result<Option<String>> {
        self.user_repo().set_avatar(user_id, avatar).await
    }

    pub async fn create_auth_token(&self, user_id: i32) -> Result<String> {
        self.user_repo().create_token(user_id).await
    }

    pub async fn user_by_token(&self, key: &str) -> Result<Option<User>> {
        self.user_repo().user_by_token(key).await
    }

    pub async fn delete_auth_token(&self, key: &str) -> Result<bool> {
        self.user_repo().delete_token(key).await
    }

    // Ingredient catalog

    pub async fn list_ingredients(
        &self,
        name_prefix: Option<&str>,
    ) -> Result<Vec<ingredients::Model>> {
        self.ingredient_repo().list(name_prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<ingredients::Model>> {
        self.ingredient_repo().get(id).await
    }

    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<Vec<i32>> {
        self.ingredient_repo().filter_existing(ids).await
    }

    pub async fn get_or_create_ingredient(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<(ingredients::Model, bool)> {
        self.ingredient_repo()
            .get_or_create(name, measurement_unit)
            .await
    }

    // Recipes

    pub async fn create_recipe(&self, new: NewRecipe) -> Result<i32> {
        self.recipe_repo().create(new).await
    }

    pub async fn update_recipe(&self, id: i32, update: RecipeUpdate) -> Result<bool> {
        self.recipe_repo().update(id, update).await
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn get_recipe_model(&self, id: i32) -> Result<Option<recipes::Model>> {
        self.recipe_repo().get_model(id).await
    }

    pub async fn delete_recipe(&self, id: i32) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }

    pub async fn page_recipes(
        &self,
        filter: &RecipePageFilter,
    ) -> Result<(u64, Vec<(recipes::Model, crate::entities::users::Model)>)> {
        self.recipe_repo().page(filter).await
    }

    pub async fn recipe_ingredient_amounts(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<crate::models::recipe::IngredientAmount>>> {
        self.recipe_repo().ingredient_amounts_for(recipe_ids).await
    }

    pub async fn recipe_exists_for_author(&self, author_id: i32, name: &str) -> Result<bool> {
        self.recipe_repo()
            .exists_for_author_with_name(author_id, name)
            .await
    }

    pub async fn recipe_counts_by_authors(&self, author_ids: &[i32]) -> Result<HashMap<i32, i64>> {
        self.recipe_repo().count_by_authors(author_ids).await
    }

    pub async fn recent_recipes_for_author(
        &self,
        author_id: i32,
        limit: Option<u64>,
    ) -> Result<Vec<recipes::Model>> {
        self.recipe_repo().recent_for_author(author_id, limit).await
    }

    pub async fn aggregate_cart_ingredients(
        &self,
        recipe_ids: &[i32],
    ) -> Result<Vec<ShoppingListRow>> {
        self.recipe_repo()
            .aggregate_cart_ingredients(recipe_ids)
            .await
    }

    pub async fn cart_recipe_briefs(&self, recipe_ids: &[i32]) -> Result<Vec<CartRecipeRow>> {
        self.recipe_repo().cart_recipe_briefs(recipe_ids).await
    }

    // Favorites & shopping cart

    pub async fn add_favorite(&self, user_id: i32, recipe_id: i32) -> Result<InsertOutcome> {
        self.mark_repo().add_favorite(user_id, recipe_id).await
    }

    pub async fn remove_favorite(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.mark_repo().remove_favorite(user_id, recipe_id).await
    }

    pub async fn favorited_among(&self, user_id: i32, recipe_ids: &[i32]) -> Result<HashSet<i32>> {
        self.mark_repo().favorited_among(user_id, recipe_ids).await
    }

    pub async fn favorited_recipe_ids_for(&self, user_id: i32) -> Result<Vec<i32>> {
        self.mark_repo().favorited_recipe_ids_for(user_id).await
    }

    pub async fn add_cart_recipe(&self, user_id: i32, recipe_id: i32) -> Result<InsertOutcome> {
        self.mark_repo().add_cart_recipe(user_id, recipe_id).await
    }

    pub async fn remove_cart_recipe(&self, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.mark_repo().remove_cart_recipe(user_id, recipe_id).await
    }

    pub async fn in_cart_among(&self, user_id: i32, recipe_ids: &[i32]) -> Result<HashSet<i32>> {
        self.mark_repo().in_cart_among(user_id, recipe_ids).await
    }

    pub async fn cart_recipe_ids_for(&self, user_id: i32) -> Result<Vec<i32>> {
        self.mark_repo().cart_recipe_ids_for(user_id).await
    }

    // Subscriptions

    pub async fn subscribe(&self, user_id: i32, author_id: i32) -> Result<InsertOutcome> {
        self.subscription_repo().subscribe(user_id, author_id).await
    }

    pub async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo()
            .unsubscribe(user_id, author_id)
            .await
    }

    pub async fn is_subscribed(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.subscription_repo()
            .is_subscribed(user_id, author_id)
            .await
    }

    pub async fn subscribed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        self.subscription_repo()
            .subscribed_among(user_id, author_ids)
            .await
    }

    pub async fn page_subscribed_authors(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(u64, Vec<User>)> {
        self.subscription_repo()
            .page_authors(user_id, page, per_page)
            .await
    }
}
