//! Command-line interface: the API server plus the bulk-import commands
//! that seed reference data and demo content.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Ladle - recipe sharing backend
#[derive(Parser)]
#[command(name = "ladle")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web API server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Import the ingredient catalog from a JSON file
    LoadIngredients {
        /// Path to ingredients.json
        #[arg(long, default_value = "data/ingredients.json")]
        file: PathBuf,
    },

    /// Import users (with optional avatars) from a JSON file
    LoadUsers {
        /// Path to users.json
        #[arg(long, default_value = "data/users.json")]
        file: PathBuf,
        /// Base directory avatar paths are resolved against
        #[arg(long, default_value = "data")]
        media_dir: PathBuf,
    },

    /// Import subscriptions from a JSON file
    LoadSubscriptions {
        /// Path to subscriptions.json
        #[arg(long, default_value = "data/subscriptions.json")]
        file: PathBuf,
    },

    /// Import full recipes with media, carts and favorites from a JSON file
    LoadRecipes {
        /// Path to recipes_full.json
        #[arg(long, default_value = "data/recipes_full.json")]
        file: PathBuf,
        /// Base directory image paths are resolved against
        #[arg(long, default_value = "data")]
        media_dir: PathBuf,
    },
}

pub use commands::*;
