//! MangaDex command-line client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mangadex_client::{
    Chapter, Client, CredentialGuard, FeedParams, HttpTransport, Limit, List, Manga, Transport,
    TransportConfig,
};
use shared::{Config, LogConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the configured locale
    #[arg(long)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search manga by title
    Search {
        title: String,
        #[arg(short, long, default_value_t = 10)]
        limit: u64,
    },
    /// Show one manga
    Manga { id: String },
    /// Latest chapters of a manga
    Feed {
        id: String,
        #[arg(short, long, default_value_t = 20)]
        limit: u64,
        /// Translated language filter, repeatable
        #[arg(short = 'L', long = "lang")]
        languages: Vec<String>,
    },
    /// Show a custom list (requires a token)
    List { id: String },
    /// Public lists of a user
    UserLists { user_id: String },
    /// Cover image URLs of a manga
    Covers { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings(&config.logging, "mdex");
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), "Loaded configuration");

    let transport = HttpTransport::new(TransportConfig::from(&config.api))
        .context("Failed to create HTTP transport")?;
    let locale = args.locale.unwrap_or_else(|| config.locale.default.clone());
    let credentials = transport.credentials();
    let client = Client::new(transport).with_locale(locale);

    match credentials {
        Some(guard) => run(&client.with_guard(guard), args.command).await,
        None => run(&client, args.command).await,
    }
}

async fn run<T: Transport, G: CredentialGuard>(client: &Client<T, G>, command: Command) -> Result<()> {
    let locale = client.locale();

    match command {
        Command::Search { title, limit } => {
            let results = Manga::search(client, title.as_str(), Limit::Count(limit), 0)
                .await
                .context("Search failed")?;
            for manga in &results {
                println!("{}  {}", manga.id, manga.title(locale).unwrap_or("(untitled)"));
            }
        }
        Command::Manga { id } => {
            let manga = Manga::get(client, &id)
                .await
                .with_context(|| format!("Failed to fetch manga {id}"))?;
            print_manga(&manga, locale);
        }
        Command::Feed { id, limit, languages } => {
            let feed = FeedParams {
                translated_language: languages,
                order: vec![("chapter".to_string(), "desc".to_string())],
                limit: Some(Limit::Count(limit)),
                ..Default::default()
            };
            let chapters = Manga::feed_of(client, &id, &feed)
                .await
                .with_context(|| format!("Failed to fetch feed of {id}"))?;
            for chapter in &chapters {
                print_chapter(chapter);
            }
        }
        Command::List { id } => {
            let list = List::get(client, &id)
                .await
                .with_context(|| format!("Failed to fetch list {id}"))?;
            print_list(&list);
        }
        Command::UserLists { user_id } => {
            let lists = List::user_lists(client, &user_id, Limit::Unbounded, 0)
                .await
                .with_context(|| format!("Failed to fetch lists of user {user_id}"))?;
            for list in &lists {
                print_list(list);
            }
        }
        Command::Covers { id } => {
            let manga = Manga::get(client, &id)
                .await
                .with_context(|| format!("Failed to fetch manga {id}"))?;
            let covers = manga.covers(client).await.context("Failed to fetch covers")?;
            for cover in &covers {
                let volume = cover.volume.as_deref().unwrap_or("-");
                println!("vol {volume:>4}  {}", cover.image_url().unwrap_or_default());
            }
        }
    }

    Ok(())
}

fn print_manga(manga: &Manga, locale: &str) {
    println!("{}", manga.title(locale).unwrap_or("(untitled)"));
    println!("  id:       {}", manga.id);
    if let Some(year) = manga.year {
        println!("  year:     {year}");
    }
    if let Some(status) = manga.status {
        println!("  status:   {status:?}");
    }
    let tags: Vec<&str> = manga.tags.iter().filter_map(|t| t.name(locale)).collect();
    if !tags.is_empty() {
        println!("  tags:     {}", tags.join(", "));
    }
    println!("  authors:  {}", manga.authors.len());
    if let Some(description) = manga.description(locale) {
        println!();
        println!("{description}");
    }
}

fn print_chapter(chapter: &Chapter) {
    println!(
        "{}  [{}] {}  {}",
        chapter.id,
        chapter.translated_language.as_deref().unwrap_or("??"),
        chapter.label(),
        chapter.title.as_deref().unwrap_or("")
    );
}

fn print_list(list: &List) {
    let visibility = list
        .visibility
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!(
        "{}  {} ({visibility}, {} manga)",
        list.id,
        list.name.as_deref().unwrap_or("(unnamed)"),
        list.manga.len()
    );
}
