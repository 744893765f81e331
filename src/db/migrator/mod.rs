use sea_orm_migration::prelude::*;

mod m20250106_initial;
mod m20250121_ingredient_unique_index;
mod m20250214_add_recipe_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250106_initial::Migration),
            Box::new(m20250121_ingredient_unique_index::Migration),
            Box::new(m20250214_add_recipe_indexes::Migration),
        ]
    }
}
