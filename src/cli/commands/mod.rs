mod load_ingredients;
mod load_recipes;
mod load_subscriptions;
mod load_users;

pub use load_ingredients::{IngredientSeed, cmd_load_ingredients, load_ingredients};
pub use load_recipes::{RecipeSeed, cmd_load_recipes};
pub use load_subscriptions::{SubscriptionSeed, cmd_load_subscriptions, load_subscriptions};
pub use load_users::{UserSeed, cmd_load_users};
