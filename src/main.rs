use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headliner::app::AppContext;
use headliner::cli::{commands, Cli, Commands};
use headliner::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Latest { query, page, pages } => {
            commands::latest(&ctx, query, page, pages).await?;
        }
        Commands::Favorites => {
            commands::list_favorites(&ctx);
        }
        Commands::Save {
            index,
            query,
            page,
            no_image,
        } => {
            commands::save(&ctx, index, query, page, !no_image).await?;
        }
        Commands::Remove { key } => {
            commands::remove(&ctx, &key)?;
        }
        Commands::Clear => {
            commands::clear(&ctx)?;
        }
    }

    Ok(())
}
