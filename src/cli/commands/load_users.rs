//! User import command handler

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::config::Config;
use crate::db::Store;
use crate::db::repositories::user::hash_password;
use crate::models::user::NewUser;
use crate::services::ImageService;
use crate::services::image::AVATAR_DIR;

#[derive(Debug, Clone, Deserialize)]
pub struct UserSeed {
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: String,
    /// Avatar file path relative to the media dir argument.
    pub avatar: Option<String>,
}

pub async fn cmd_load_users(config: &Config, file: &Path, media_dir: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        println!("File not found: {}", file.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rows: Vec<UserSeed> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed JSON in {}", file.display()))?;

    let store = Store::new(&config.general.database_path).await?;
    let images = ImageService::new(config.general.media_path.clone());

    let (mut created, mut skipped) = (0, 0);
    for row in rows {
        if store.email_taken(&row.email).await? {
            println!("User {} already exists, skipping.", row.email);
            skipped += 1;
            continue;
        }

        let password_hash = hash_password(&row.password, Some(&config.security))?;

        let Some(user) = store
            .create_user(NewUser {
                email: row.email.clone(),
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                password_hash,
            })
            .await?
        else {
            println!("User {} collided with an existing row, skipping.", row.email);
            skipped += 1;
            continue;
        };

        if let Some(avatar_path) = row.avatar {
            let avatar_full_path = media_dir.join(&avatar_path);
            if avatar_full_path.exists() {
                let relative = images.import_file(&avatar_full_path, AVATAR_DIR).await?;
                store.set_user_avatar(user.id, Some(relative)).await?;
                println!("Avatar loaded for user {}.", row.email);
            } else {
                println!(
                    "Avatar file not found for user {}: {}",
                    row.email,
                    avatar_full_path.display()
                );
            }
        }

        created += 1;
        println!("User {} created.", row.email);
    }

    println!("Done! Created: {created}, Skipped: {skipped}");

    Ok(())
}
