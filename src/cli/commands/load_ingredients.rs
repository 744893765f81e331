//! Ingredient catalog import command handler

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::config::Config;
use crate::db::Store;

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

pub async fn cmd_load_ingredients(config: &Config, file: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        println!("File not found: {}", file.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rows: Vec<IngredientSeed> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed JSON in {}", file.display()))?;

    let store = Store::new(&config.general.database_path).await?;
    let added = load_ingredients(&store, &rows).await?;

    println!("Added new ingredients: {added}");

    Ok(())
}

/// Idempotent: rows whose (name, unit) already exists are skipped, so
/// re-running with the same file adds nothing.
pub async fn load_ingredients(store: &Store, rows: &[IngredientSeed]) -> anyhow::Result<usize> {
    let mut added = 0;
    for row in rows {
        let (_, created) = store
            .get_or_create_ingredient(&row.name, &row.measurement_unit)
            .await?;
        if created {
            added += 1;
        }
    }
    Ok(added)
}
