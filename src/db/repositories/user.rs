use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::{auth_tokens, users};
use crate::models::user::{NewUser, User};

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to count users by email")?;

        Ok(count > 0)
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("Failed to count users by username")?;

        Ok(count > 0)
    }

    /// Insert a new user. Returns `None` when a concurrent signup won the
    /// unique email/username constraint race.
    pub async fn create(&self, input: NewUser) -> Result<Option<User>> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = users::ActiveModel {
            email: Set(input.email),
            username: Set(input.username),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            password_hash: Set(input.password_hash),
            avatar: Set(None),
            created_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(User::from(model))),
            Err(err) => {
                if matches!(
                    err.sql_err(),
                    Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
                ) {
                    Ok(None)
                } else {
                    Err(err).context("Failed to insert user")
                }
            }
        }
    }

    /// Paginated user listing, ordered by username.
    pub async fn page(&self, page: u64, per_page: u64) -> Result<(u64, Vec<User>)> {
        let paginator = users::Entity::find()
            .order_by_asc(users::Column::Username)
            .paginate(&self.conn, per_page);

        let count = paginator
            .num_items()
            .await
            .context("Failed to count users")?;
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .context("Failed to fetch user page")?;

        Ok((count, models.into_iter().map(User::from).collect()))
    }

    /// Verify credentials and return the matching user.
    /// Argon2 verification runs under `spawn_blocking`; it is CPU-intensive
    /// and would stall the async runtime if run inline.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let password_hash = user.password_hash.clone();
        let password = password.to_string();

        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid.then(|| User::from(user)))
    }

    pub async fn set_password(
        &self,
        user_id: i32,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let password = new_password.to_string();
        let config = config.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Replace the avatar path, returning the previous one so the caller can
    /// remove the stale file.
    pub async fn set_avatar(&self, user_id: i32, avatar: Option<String>) -> Result<Option<String>> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user for avatar update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        let previous = user.avatar.clone();

        let mut active: users::ActiveModel = user.into();
        active.avatar = Set(avatar);
        active.update(&self.conn).await?;

        Ok(previous)
    }

    /// Issue a fresh auth token for the user.
    pub async fn create_token(&self, user_id: i32) -> Result<String> {
        let key = generate_token_key();
        let now = chrono::Utc::now().to_rfc3339();

        let active = auth_tokens::ActiveModel {
            key: Set(key.clone()),
            user_id: Set(user_id),
            created_at: Set(now),
            ..Default::default()
        };
        active
            .insert(&self.conn)
            .await
            .context("Failed to insert auth token")?;

        Ok(key)
    }

    /// Resolve the user a token key belongs to.
    pub async fn user_by_token(&self, key: &str) -> Result<Option<User>> {
        let token = auth_tokens::Entity::find()
            .filter(auth_tokens::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query auth token")?;

        let Some(token) = token else {
            return Ok(None);
        };

        let user = users::Entity::find_by_id(token.user_id)
            .one(&self.conn)
            .await
            .context("Failed to query token owner")?;

        Ok(user.map(User::from))
    }

    pub async fn delete_token(&self, key: &str) -> Result<bool> {
        let res = auth_tokens::Entity::delete_many()
            .filter(auth_tokens::Column::Key.eq(key))
            .exec(&self.conn)
            .await
            .context("Failed to delete auth token")?;

        Ok(res.rows_affected > 0)
    }
}

/// Hash a password using Argon2id with optional custom params.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Generate a random token key (64 character hex string)
#[must_use]
pub fn generate_token_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
