//! Subscription import command handler

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::config::Config;
use crate::db::{InsertOutcome, Store};

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionSeed {
    pub user_email: String,
    pub author_email: String,
}

pub async fn cmd_load_subscriptions(config: &Config, file: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        println!("File not found: {}", file.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let rows: Vec<SubscriptionSeed> = serde_json::from_str(&content)
        .with_context(|| format!("Malformed JSON in {}", file.display()))?;

    let store = Store::new(&config.general.database_path).await?;
    let added = load_subscriptions(&store, &rows).await?;

    println!("Added new subscriptions: {added}");

    Ok(())
}

/// Rows with an unknown follower or author, or follower == author, are
/// skipped; existing edges are left alone.
pub async fn load_subscriptions(store: &Store, rows: &[SubscriptionSeed]) -> anyhow::Result<usize> {
    let mut added = 0;
    for row in rows {
        let user = store.get_user_by_email(&row.user_email).await?;
        let author = store.get_user_by_email(&row.author_email).await?;

        let (Some(user), Some(author)) = (user, author) else {
            println!(
                "Skipping subscription {} -> {}: unknown user",
                row.user_email, row.author_email
            );
            continue;
        };

        if user.id == author.id {
            println!("Skipping self-subscription for {}", row.user_email);
            continue;
        }

        if store.subscribe(user.id, author.id).await? == InsertOutcome::Inserted {
            added += 1;
        }
    }
    Ok(added)
}
