use sea_orm::FromQueryResult;

use crate::entities::recipes;

/// A recipe with its ingredient amounts resolved.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: String,
    pub ingredients: Vec<IngredientAmount>,
}

/// One ingredient row of a recipe, joined with the catalog entry.
#[derive(Debug, Clone, FromQueryResult)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl Recipe {
    pub fn from_parts(model: recipes::Model, ingredients: Vec<IngredientAmount>) -> Self {
        Self {
            id: model.id,
            author_id: model.author_id,
            name: model.name,
            image: model.image,
            text: model.text,
            cooking_time: model.cooking_time,
            created_at: model.created_at,
            ingredients,
        }
    }
}

/// Write model for creating a recipe.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<NewRecipeIngredient>,
}

#[derive(Debug, Clone, Copy)]
pub struct NewRecipeIngredient {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Write model for updating a recipe. `None` fields are left untouched; the
/// API layer requires `ingredients` to be present before calling the store,
/// so the optionality here is a storage detail only.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<NewRecipeIngredient>>,
}
