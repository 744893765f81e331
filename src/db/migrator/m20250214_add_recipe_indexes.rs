use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        // Listings are served newest-first and filtered by author.
        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_recipes_created_at ON recipes(created_at)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_recipes_author_id ON recipes(author_id)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_recipes_created_at")
            .await?;
        conn.execute_unprepared("DROP INDEX IF EXISTS idx_recipes_author_id")
            .await?;

        Ok(())
    }
}
