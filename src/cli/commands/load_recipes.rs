//! Full recipe import command handler: recipes with media, plus the cart and
//! favorite marks referencing them.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::config::Config;
use crate::db::Store;
use crate::models::recipe::{NewRecipe, NewRecipeIngredient};
use crate::services::ImageService;
use crate::services::image::RECIPE_IMAGE_DIR;

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSeed {
    pub author_email: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// Image file path relative to the media dir argument.
    pub image: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientRef>,
    #[serde(default)]
    pub shopping_cart: Vec<String>,
    #[serde(default)]
    pub favorited_by: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientRef {
    pub id: i32,
    pub amount: i32,
}

pub async fn cmd_load_recipes(config: &Config, file: &Path, media_dir: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        println!("File not found: {}", file.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rows: Vec<RecipeSeed> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed JSON in {}", file.display()))?;

    let store = Store::new(&config.general.database_path).await?;
    let images = ImageService::new(config.general.media_path.clone());

    let (mut created, mut skipped) = (0, 0);
    for row in rows {
        let Some(author) = store.get_user_by_email(&row.author_email).await? else {
            println!("Author {} not found, skipping", row.author_email);
            skipped += 1;
            continue;
        };

        if store.recipe_exists_for_author(author.id, &row.name).await? {
            println!(
                "Recipe '{}' from {} already exists, skipping",
                row.name, row.author_email
            );
            skipped += 1;
            continue;
        }

        let image = match &row.image {
            Some(image_path) => {
                let image_full_path = media_dir.join(image_path);
                if image_full_path.exists() {
                    images.import_file(&image_full_path, RECIPE_IMAGE_DIR).await?
                } else {
                    println!("Image not found: {}", image_full_path.display());
                    String::new()
                }
            }
            None => String::new(),
        };

        let mut ingredients = Vec::with_capacity(row.ingredients.len());
        for item in &row.ingredients {
            if store.get_ingredient(item.id).await?.is_none() {
                println!("Ingredient with id={} not found, skipping", item.id);
                continue;
            }
            ingredients.push(NewRecipeIngredient {
                ingredient_id: item.id,
                amount: item.amount,
            });
        }

        let recipe_id = store
            .create_recipe(NewRecipe {
                author_id: author.id,
                name: row.name.clone(),
                image,
                text: row.text.clone(),
                cooking_time: row.cooking_time,
                ingredients,
            })
            .await?;

        for cart_email in &row.shopping_cart {
            match store.get_user_by_email(cart_email).await? {
                Some(user) => {
                    store.add_cart_recipe(user.id, recipe_id).await?;
                }
                None => println!("User for cart with email {cart_email} not found"),
            }
        }

        for fav_email in &row.favorited_by {
            match store.get_user_by_email(fav_email).await? {
                Some(user) => {
                    store.add_favorite(user.id, recipe_id).await?;
                }
                None => println!("User for favorite {fav_email} not found"),
            }
        }

        created += 1;
        println!("Recipe '{}' successfully created", row.name);
    }

    println!("Import done! Created: {created}, skipped: {skipped}");

    Ok(())
}
