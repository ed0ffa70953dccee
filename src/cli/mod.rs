pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "headliner")]
#[command(about = "Latest news with locally saved favorites", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/headliner/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the latest articles, marking favorites
    Latest {
        /// Free-text filter
        #[arg(short, long)]
        query: Option<String>,
        /// Page cursor from a previous listing
        #[arg(long)]
        page: Option<String>,
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// List saved favorites
    Favorites,
    /// Save an article from a listing as a favorite
    Save {
        /// 1-based position of the article on the page
        index: usize,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(long)]
        page: Option<String>,
        /// Don't download the article image
        #[arg(long)]
        no_image: bool,
    },
    /// Remove a favorite by its title (or link, depending on config)
    Remove {
        key: String,
    },
    /// Remove all favorites
    Clear,
}
