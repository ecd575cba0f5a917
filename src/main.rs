use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use marvel_feed::domain::{Comic, ComicDetail};
use marvel_feed::services::RoundOutcome;
use marvel_feed::{Catalog, Config};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type MarvelFeedResult<T> = anyhow::Result<T>;

#[derive(Debug, Parser)]
#[command(name = "marvel_feed", version, about = "Browse recent Marvel comics and keep favorites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load random batches of recent comics
    Feed {
        /// Number of batches to request
        #[arg(long, default_value_t = 1)]
        rounds: u32,
        /// Only show comics that went on sale in this year
        #[arg(long)]
        year: Option<String>,
    },
    /// Show a comic with its characters
    Detail { id: i64 },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        command: FavoritesCommand,
    },
}

#[derive(Debug, Subcommand)]
enum FavoritesCommand {
    /// List favorites alphabetically
    List,
    /// Add the comic if it is not a favorite, remove it otherwise
    Toggle { id: i64 },
    /// Remove every favorite
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> MarvelFeedResult<()> {
    // Initialize tracing (logs). Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!(
        "{}=info,reqwest=warn,sea_orm=warn,sqlx=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .finish()
        .with(ErrorLayer::default())
        .init();

    // Load environment variables from .env files
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };

    let cli = Cli::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), command = ?cli.command, "starting marvel_feed");

    let config = Config::load();
    if let Err(e) = config.validate() {
        return Err(anyhow::anyhow!(e));
    }

    let mut catalog = Catalog::bootstrap(&config)
        .await
        .with_context(|| "Failed to initialize catalog")?;

    match cli.command {
        Commands::Feed { rounds, year } => run_feed(&catalog, rounds, year.as_deref()).await,
        Commands::Detail { id } => {
            let detail = catalog.details.load_detail(id).await;
            print_detail(&catalog, &detail);
            Ok(())
        }
        Commands::Favorites { command } => run_favorites(&mut catalog, command).await,
    }
}

async fn run_feed(catalog: &Catalog, rounds: u32, year: Option<&str>) -> MarvelFeedResult<()> {
    for round in 0..rounds {
        match catalog.feed.load_more().await {
            RoundOutcome::Appended(n) => tracing::info!(round, appended = n, "loaded comics"),
            RoundOutcome::NothingNew => {
                tracing::info!(round, "no more unique comics to load");
                break;
            }
            RoundOutcome::AlreadyInProgress => {}
        }
    }

    let comics = catalog.feed.filter_by_year(year.unwrap_or(""));
    for comic in &comics {
        print_comic_line(catalog, comic);
    }
    if comics.is_empty() {
        println!("No comics to show.");
    }
    Ok(())
}

async fn run_favorites(catalog: &mut Catalog, command: FavoritesCommand) -> MarvelFeedResult<()> {
    match command {
        FavoritesCommand::List => {
            let favorites = catalog.favorites.sorted_by_title();
            if favorites.is_empty() {
                println!("No favorites added yet.");
            }
            for comic in favorites {
                println!("{:>8}  {}", comic.id, comic.title);
            }
        }
        FavoritesCommand::Toggle { id } => {
            let comic = match catalog.favorites.favorites().get(id) {
                Some(existing) => existing.clone(),
                None => catalog
                    .client
                    .get_comic(id)
                    .await?
                    .with_context(|| format!("Comic {} not found", id))?,
            };
            let title = comic.title.clone();
            catalog.favorites.toggle(comic).await?;
            if catalog.favorites.is_favorite(id) {
                println!("Added to favorites: {}", title);
            } else {
                println!("Removed from favorites: {}", title);
            }
        }
        FavoritesCommand::Clear { yes } => {
            let confirm = |prompt: &str| yes || ask(prompt);
            let remaining = catalog.favorites.clear(&confirm).await?;
            if remaining.is_empty() {
                println!("Favorites cleared.");
            } else {
                println!("Kept {} favorites.", remaining.len());
            }
        }
    }
    Ok(())
}

fn ask(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn print_comic_line(catalog: &Catalog, comic: &Comic) {
    let marker = if catalog.favorites.is_favorite(comic.id) { "*" } else { " " };
    let year = comic
        .release_year()
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".into());
    println!("{} {:>8}  {}  {}", marker, comic.id, year, comic.title);
}

fn print_detail(catalog: &Catalog, detail: &ComicDetail) {
    match &detail.comic {
        Some(comic) => {
            println!("{}", if comic.title.is_empty() { "No title available" } else { comic.title.as_str() });
            println!("Image: {}", comic.image_url());
            println!(
                "{}",
                comic.description.as_deref().unwrap_or("No description available.")
            );
            if catalog.favorites.is_favorite(comic.id) {
                println!("(favorite)");
            }
        }
        None => println!("Comic not available."),
    }
    println!();
    println!("Characters:");
    if detail.characters.is_empty() {
        println!("  No characters available.");
    }
    for character in &detail.characters {
        println!("  {} ({})", character.name, character.image_url());
    }
}
