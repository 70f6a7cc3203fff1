//! CLI binary for gameshelf.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use gameshelf::search::{RankedResult, SearchOrchestrator};
use gameshelf::{GameEntry, GameStore, PlayStatus, ShelfConfig};
use tracing_subscriber::EnvFilter;

/// gameshelf: search Wikidata and Wikipedia for games and keep a local library.
#[derive(Parser)]
#[command(name = "gameshelf", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "GAMESHELF_CONFIG")]
    config: Option<PathBuf>,

    /// Library file, overriding the configured one.
    #[arg(long, env = "GAMESHELF_LIBRARY")]
    library: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Search for games by title.
    Search {
        /// Title to look up.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print results as JSON instead of cards.
        #[arg(long)]
        json: bool,
    },

    /// Search and store one of the results in the library.
    Add {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Which result to store, 1-based.
        #[arg(long, default_value_t = 1)]
        pick: usize,
        /// Also add the game to this collection.
        #[arg(long)]
        collection: Option<String>,
    },

    /// List stored games.
    List {
        /// Only games in this collection, in collection order.
        #[arg(long)]
        collection: Option<String>,
        /// Only games carrying this tag.
        #[arg(long)]
        tag: Option<String>,
    },

    /// Rate a game from 1 to 5.
    Rate { id: String, rating: u8 },

    /// Tag a game.
    Tag { id: String, tag: String },

    /// Remove a tag from a game.
    Untag { id: String, tag: String },

    /// Set a game's notes. Empty text clears them.
    Note {
        id: String,
        #[arg(num_args = 0..)]
        text: Vec<String>,
    },

    /// Set a game's status (backlog, playing, completed, abandoned, wishlist).
    Status { id: String, status: PlayStatus },

    /// Remove a game from the library.
    Remove { id: String },

    /// Manage collections.
    #[command(subcommand)]
    Collection(CollectionCommand),
}

#[derive(Subcommand)]
enum CollectionCommand {
    /// Create a collection.
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a collection. Its games stay in the library.
    Delete { name: String },
    /// Rename a collection.
    Rename { name: String, new_name: String },
    /// List collections.
    List,
    /// Add a stored game to a collection.
    Add { name: String, id: String },
    /// Remove a game from a collection.
    Remove { name: String, id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `search --json` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gameshelf=info,gameshelf_search=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ShelfConfig::load(cli.config.as_deref()).context("failed to load config")?;
    config.validate()?;
    let library_path = cli
        .library
        .clone()
        .unwrap_or_else(|| config.store.resolved_library_path());

    match cli.command {
        Command::Search { query, json } => run_search(&config, &query.join(" "), json).await,
        Command::Add {
            query,
            pick,
            collection,
        } => {
            let mut store = GameStore::open(&library_path)?;
            run_add(&config, &mut store, &query.join(" "), pick, collection.as_deref()).await
        }
        Command::List { collection, tag } => {
            let store = GameStore::open(&library_path)?;
            list_games(&store, collection.as_deref(), tag.as_deref())
        }
        Command::Rate { id, rating } => {
            let mut store = GameStore::open(&library_path)?;
            store.set_rating(&id, rating)?;
            println!("Rated {} {rating}/5", store.resolve_game(&id)?.title());
            Ok(())
        }
        Command::Tag { id, tag } => {
            let mut store = GameStore::open(&library_path)?;
            store.add_tag(&id, &tag)?;
            Ok(())
        }
        Command::Untag { id, tag } => {
            let mut store = GameStore::open(&library_path)?;
            store.remove_tag(&id, &tag)?;
            Ok(())
        }
        Command::Note { id, text } => {
            let mut store = GameStore::open(&library_path)?;
            store.set_notes(&id, &text.join(" "))?;
            Ok(())
        }
        Command::Status { id, status } => {
            let mut store = GameStore::open(&library_path)?;
            store.set_status(&id, status)?;
            Ok(())
        }
        Command::Remove { id } => {
            let mut store = GameStore::open(&library_path)?;
            let removed = store.remove_game(&id)?;
            println!("Removed {}", removed.title());
            Ok(())
        }
        Command::Collection(command) => {
            let mut store = GameStore::open(&library_path)?;
            run_collection(&mut store, command)
        }
    }
}

async fn run_search(config: &ShelfConfig, query: &str, json: bool) -> anyhow::Result<()> {
    let orchestrator = SearchOrchestrator::new(&config.search.to_search_config())?;
    let results = orchestrator.search(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("No results found");
        return Ok(());
    }
    for (index, result) in results.iter().enumerate() {
        print_card(index + 1, result);
    }
    Ok(())
}

async fn run_add(
    config: &ShelfConfig,
    store: &mut GameStore,
    query: &str,
    pick: usize,
    collection: Option<&str>,
) -> anyhow::Result<()> {
    let orchestrator = SearchOrchestrator::new(&config.search.to_search_config())?;
    let mut results = orchestrator.search(query).await;
    if results.is_empty() {
        println!("No results found");
        return Ok(());
    }
    if pick == 0 || pick > results.len() {
        anyhow::bail!("--pick must be between 1 and {}", results.len());
    }

    let candidate = results.swap_remove(pick - 1);
    let title = candidate.title.clone();
    let id = store.add_game(candidate)?;
    println!("Added {title} ({})", short_id(&id));

    if let Some(name) = collection {
        if store.find_collection(name).is_none() {
            store.create_collection(name, None)?;
        }
        store.add_to_collection(name, &id)?;
        println!("  in collection {name}");
    }
    Ok(())
}

fn list_games(store: &GameStore, collection: Option<&str>, tag: Option<&str>) -> anyhow::Result<()> {
    let mut games: Vec<&GameEntry> = match collection {
        Some(name) => store.collection_games(name)?,
        None => store.list_games().iter().collect(),
    };
    if let Some(tag) = tag {
        let tagged: Vec<&str> = store
            .games_with_tag(tag)
            .into_iter()
            .map(|g| g.id.as_str())
            .collect();
        games.retain(|g| tagged.contains(&g.id.as_str()));
    }

    if games.is_empty() {
        println!("No games");
        return Ok(());
    }
    for game in games {
        let year = game
            .candidate
            .release_year()
            .map(|y| format!(" ({y})"))
            .unwrap_or_default();
        let rating = game
            .user
            .rating
            .map(|r| format!(" {}", "*".repeat(usize::from(r))))
            .unwrap_or_default();
        let tags = if game.user.tags.is_empty() {
            String::new()
        } else {
            let joined: Vec<&str> = game.user.tags.iter().map(String::as_str).collect();
            format!(" [{}]", joined.join(", "))
        };
        println!(
            "{}  {}{year}  {}{rating}{tags}",
            short_id(&game.id),
            game.title(),
            game.user.status
        );
    }
    Ok(())
}

fn run_collection(store: &mut GameStore, command: CollectionCommand) -> anyhow::Result<()> {
    match command {
        CollectionCommand::Create { name, description } => {
            store.create_collection(&name, description.as_deref())?;
            println!("Created collection {}", name.trim());
        }
        CollectionCommand::Delete { name } => {
            let removed = store.delete_collection(&name)?;
            println!("Deleted collection {}", removed.name);
        }
        CollectionCommand::Rename { name, new_name } => {
            store.rename_collection(&name, &new_name)?;
        }
        CollectionCommand::List => {
            if store.list_collections().is_empty() {
                println!("No collections");
            }
            for collection in store.list_collections() {
                let description = collection
                    .description
                    .as_deref()
                    .map(|d| format!(": {d}"))
                    .unwrap_or_default();
                println!(
                    "{} ({} games){description}",
                    collection.name,
                    collection.game_ids.len()
                );
            }
        }
        CollectionCommand::Add { name, id } => store.add_to_collection(&name, &id)?,
        CollectionCommand::Remove { name, id } => store.remove_from_collection(&name, &id)?,
    }
    Ok(())
}

fn print_card(position: usize, result: &RankedResult) {
    let year = result
        .release_year()
        .map(|y| format!(" ({y})"))
        .unwrap_or_default();
    println!("{position}. {}{year}", result.title);
    if !result.platforms.is_empty() {
        println!("   Platforms: {}", result.platforms.join(", "));
    }
    if let Some(developer) = &result.developer {
        println!("   Developer: {developer}");
    }
    let enhanced = if result.enhanced_with_wikipedia {
        " + Wikipedia"
    } else {
        ""
    };
    println!(
        "   Source: {}{enhanced}  confidence {:.2}",
        result.source().name(),
        result.confidence()
    );
    for (store, url) in &result.official_store_links {
        println!("   {store}: {url}");
    }
    if let Some(attribution) = &result.attribution {
        println!("   {} / {}", attribution.source, attribution.license);
    }
    println!();
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
