use std::collections::HashSet;

use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::db::InsertOutcome;
use crate::entities::{subscriptions, users};
use crate::models::user::User;

/// Follower -> author edges. A flat edge set; no traversal.
pub struct SubscriptionRepository {
    conn: DatabaseConnection,
}

impl SubscriptionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn subscribe(&self, user_id: i32, author_id: i32) -> Result<InsertOutcome> {
        let exists = subscriptions::Entity::find_by_id((user_id, author_id))
            .count(&self.conn)
            .await
            .context("Failed to check subscription")?
            > 0;
        if exists {
            return Ok(InsertOutcome::Duplicate);
        }

        let active = subscriptions::ActiveModel {
            user_id: Set(user_id),
            author_id: Set(author_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        match subscriptions::Entity::insert(active)
            .exec_without_returning(&self.conn)
            .await
        {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(err) => {
                if matches!(
                    err.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    Ok(InsertOutcome::Duplicate)
                } else {
                    Err(err).context("Failed to insert subscription")
                }
            }
        }
    }

    pub async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let res = subscriptions::Entity::delete_many()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.eq(author_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete subscription")?;

        Ok(res.rows_affected > 0)
    }

    pub async fn is_subscribed(&self, user_id: i32, author_id: i32) -> Result<bool> {
        let count = subscriptions::Entity::find_by_id((user_id, author_id))
            .count(&self.conn)
            .await
            .context("Failed to check subscription")?;

        Ok(count > 0)
    }

    /// Which of `author_ids` the user follows. Batch lookup for annotating
    /// listings without a query per row.
    pub async fn subscribed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = subscriptions::Entity::find()
            .select_only()
            .column(subscriptions::Column::AuthorId)
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::AuthorId.is_in(author_ids.to_vec()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query subscribed authors")?;

        Ok(ids.into_iter().collect())
    }

    /// Paginated authors the user follows, newest subscription first.
    pub async fn page_authors(
        &self,
        user_id: i32,
        page: u64,
        per_page: u64,
    ) -> Result<(u64, Vec<User>)> {
        let query = users::Entity::find()
            .join(
                JoinType::InnerJoin,
                subscriptions::Relation::Author.def().rev(),
            )
            .filter(subscriptions::Column::UserId.eq(user_id))
            .order_by_desc(subscriptions::Column::CreatedAt);

        let paginator = query.paginate(&self.conn, per_page);
        let count = paginator
            .num_items()
            .await
            .context("Failed to count subscriptions")?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch subscription page")?;

        Ok((count, models.into_iter().map(User::from).collect()))
    }
}
