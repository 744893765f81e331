use serde::{Deserialize, Serialize};

use crate::entities::{ingredients, recipes};
use crate::models::recipe::{IngredientAmount, Recipe};
use crate::models::user::User;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub total_pages: u64,
    pub results: Vec<T>,
}

/// Media-relative path rendered as a URL the static file service resolves.
pub fn media_url(path: &str) -> String {
    format!("/media/{path}")
}

// ============================================================================
// Read models
// ============================================================================

#[derive(Debug, Serialize, Clone)]
pub struct UserDto {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub avatar: Option<String>,
}

impl UserDto {
    pub fn from_user(user: &User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_subscribed,
            avatar: user.avatar.as_deref().map(media_url),
        }
    }
}

/// An author annotated with their recipes, returned by the subscription
/// endpoints.
#[derive(Debug, Serialize)]
pub struct UserWithRecipesDto {
    #[serde(flatten)]
    pub user: UserDto,
    pub recipes: Vec<RecipeMinifiedDto>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct IngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<ingredients::Model> for IngredientDto {
    fn from(model: ingredients::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            measurement_unit: model.measurement_unit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientDto {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<&IngredientAmount> for RecipeIngredientDto {
    fn from(row: &IngredientAmount) -> Self {
        Self {
            id: row.ingredient_id,
            name: row.name.clone(),
            measurement_unit: row.measurement_unit.clone(),
            amount: row.amount,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDto {
    pub id: i32,
    pub author: UserDto,
    pub ingredients: Vec<RecipeIngredientDto>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeDto {
    pub fn from_recipe(
        recipe: &Recipe,
        author: UserDto,
        is_favorited: bool,
        is_in_shopping_cart: bool,
    ) -> Self {
        Self {
            id: recipe.id,
            author,
            ingredients: recipe.ingredients.iter().map(Into::into).collect(),
            is_favorited,
            is_in_shopping_cart,
            name: recipe.name.clone(),
            image: media_url(&recipe.image),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
        }
    }

    pub fn from_model(
        model: &recipes::Model,
        ingredients: &[IngredientAmount],
        author: UserDto,
        is_favorited: bool,
        is_in_shopping_cart: bool,
    ) -> Self {
        Self {
            id: model.id,
            author,
            ingredients: ingredients.iter().map(Into::into).collect(),
            is_favorited,
            is_in_shopping_cart,
            name: model.name.clone(),
            image: media_url(&model.image),
            text: model.text.clone(),
            cooking_time: model.cooking_time,
        }
    }
}

/// The abbreviated recipe shape returned by toggle actions and embedded in
/// subscription listings.
#[derive(Debug, Serialize)]
pub struct RecipeMinifiedDto {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<&recipes::Model> for RecipeMinifiedDto {
    fn from(model: &recipes::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            image: media_url(&model.image),
            cooking_time: model.cooking_time,
        }
    }
}

// ============================================================================
// Write models
// ============================================================================

/// Recipe payload shared by create and update. Which fields are required
/// differs per operation and is enforced in the handlers: create needs all
/// of them, update treats everything but `ingredients` as optional.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Option<Vec<IngredientAmountPayload>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct IngredientAmountPayload {
    pub id: i32,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

#[derive(Debug, Serialize)]
pub struct ShortLinkDto {
    #[serde(rename = "short-link")]
    pub short_link: String,
}
