use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::entities::ingredients;

pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Catalog listing, optionally narrowed to a case-insensitive name
    /// prefix, ordered by name. Unpaginated: catalog browsing wants no
    /// ceiling.
    pub async fn list(&self, name_prefix: Option<&str>) -> Result<Vec<ingredients::Model>> {
        let mut query = ingredients::Entity::find().order_by_asc(ingredients::Column::Name);

        if let Some(prefix) = name_prefix {
            query = query.filter(ingredients::Column::Name.starts_with(prefix));
        }

        query
            .all(&self.conn)
            .await
            .context("Failed to list ingredients")
    }

    pub async fn get(&self, id: i32) -> Result<Option<ingredients::Model>> {
        ingredients::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query ingredient by ID")
    }

    /// Fetch the subset of `ids` that exist in the catalog.
    pub async fn filter_existing(&self, ids: &[i32]) -> Result<Vec<i32>> {
        let found: Vec<i32> = ingredients::Entity::find()
            .select_only()
            .column(ingredients::Column::Id)
            .filter(ingredients::Column::Id.is_in(ids.to_vec()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query ingredient IDs")?;

        Ok(found)
    }

    /// Idempotent seed insert. Returns `(model, created)`; re-running with
    /// the same data never produces a second (name, unit) row, even under a
    /// concurrent seeder (the unique index settles the race).
    pub async fn get_or_create(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<(ingredients::Model, bool)> {
        let existing = self.find_pair(name, measurement_unit).await?;
        if let Some(model) = existing {
            return Ok((model, false));
        }

        let active = ingredients::ActiveModel {
            name: Set(name.to_string()),
            measurement_unit: Set(measurement_unit.to_string()),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok((model, true)),
            Err(err) => {
                if matches!(
                    err.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    let model = self
                        .find_pair(name, measurement_unit)
                        .await?
                        .context("Ingredient vanished after unique violation")?;
                    Ok((model, false))
                } else {
                    Err(err).context("Failed to insert ingredient")
                }
            }
        }
    }

    async fn find_pair(
        &self,
        name: &str,
        measurement_unit: &str,
    ) -> Result<Option<ingredients::Model>> {
        ingredients::Entity::find()
            .filter(ingredients::Column::Name.eq(name))
            .filter(ingredients::Column::MeasurementUnit.eq(measurement_unit))
            .one(&self.conn)
            .await
            .context("Failed to query ingredient pair")
    }
}
