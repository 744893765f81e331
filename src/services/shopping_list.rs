use std::fmt::Write;

use crate::db::{CartRecipeRow, ShoppingListRow};

/// Render the aggregated shopping list as the downloadable text export:
/// a dated header, numbered ingredient totals, and the contributing recipes
/// with their authors. Pure; callers supply the aggregation result and the
/// current date.
#[must_use]
pub fn render_shopping_list(
    date: &str,
    items: &[ShoppingListRow],
    recipes: &[CartRecipeRow],
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Shopping list ({date})");
    let _ = writeln!(out);

    let _ = writeln!(out, "Ingredients:");
    for (i, item) in items.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({}) — {}",
            i + 1,
            item.name,
            item.measurement_unit,
            item.total
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Recipes:");
    for (i, recipe) in recipes.iter().enumerate() {
        let _ = writeln!(out, "{}. {} — {}", i + 1, recipe.name, recipe.author);
    }

    out
}
