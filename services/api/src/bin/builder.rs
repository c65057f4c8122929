//! services/api/src/bin/builder.rs
//!
//! Builds the article of the day. Run it once a day from a scheduler; it takes the next
//! title from the queue unless one is given on the command line.

use api_lib::{
    adapters::{open_store, WikipediaAdapter},
    config::Config,
    error::ApiError,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikidle_core::{ports::GameStore, ArticleBuilder, ArticlePipeline, DayKey, PortError};

#[derive(Parser, Debug)]
#[command(name = "builder", version, about = "Builds the daily article")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Build this article instead of the next queued one.
    #[arg(short, long)]
    title: Option<String>,

    /// Day to build for, as YYYYMMDD. Defaults to today (UTC).
    #[arg(short, long)]
    day: Option<DayKey>,

    /// Print the chosen title once the article is stored.
    #[arg(short, long)]
    show: bool,

    /// Replace an article that already exists for the day.
    #[arg(short, long)]
    force: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add titles to the article queue.
    Queue {
        /// Titles to enqueue, in order.
        #[arg(required = true)]
        titles: Vec<String>,

        /// Prefer these titles for a specific day (YYYYMMDD).
        #[arg(short, long)]
        day: Option<DayKey>,
    },
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- 2. Open the Game Store ---
    let store = open_store(&config.database_url).await?;

    match cli.command {
        Some(Command::Queue { titles, day }) => enqueue(store.as_ref(), &titles, day).await,
        None => build(&cli, &config, store).await,
    }
}

async fn enqueue(
    store: &dyn GameStore,
    titles: &[String],
    day: Option<DayKey>,
) -> Result<(), ApiError> {
    for title in titles {
        let id = store.enqueue_title(title, day).await?;
        info!("Queued '{}' as entry {}", title, id);
    }
    Ok(())
}

async fn build(cli: &Cli, config: &Config, store: Arc<dyn GameStore>) -> Result<(), ApiError> {
    let day = cli.day.unwrap_or_else(DayKey::today);

    match store.get_article(day).await {
        Ok(existing) if !cli.force => {
            warn!(
                "Article '{}' already exists for {}; use --force to replace it",
                existing.title, day
            );
            return Ok(());
        }
        Ok(existing) => info!("Replacing article '{}' for {}", existing.title, day),
        Err(PortError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    // --- 3. Assemble the Pipeline ---
    let source = Arc::new(WikipediaAdapter::new(
        &config.wiki_base_url,
        config.fetch_timeout,
    )?);
    let pipeline = ArticlePipeline::new(Arc::new(ArticleBuilder::new()), source, store);

    // --- 4. Build and Store ---
    let title = match &cli.title {
        Some(title) => title.clone(),
        None => pipeline.next_title(day).await?,
    };
    let article = pipeline.run(&title, day).await?;

    if cli.show {
        println!("{}: {}", day, article.title);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_build_flags() {
        let cli = Cli::try_parse_from(["builder", "--title", "Sol", "--day", "20240310", "-s", "-f"])
            .unwrap();
        assert_eq!(cli.title.as_deref(), Some("Sol"));
        assert_eq!(cli.day, Some("20240310".parse().unwrap()));
        assert!(cli.show && cli.force);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_queue_subcommand() {
        let cli = Cli::try_parse_from(["builder", "queue", "Sol", "Luna", "--day", "20240311"]).unwrap();
        match cli.command {
            Some(Command::Queue { titles, day }) => {
                assert_eq!(titles, vec!["Sol", "Luna"]);
                assert_eq!(day, Some("20240311".parse().unwrap()));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn rejects_malformed_days() {
        assert!(Cli::try_parse_from(["builder", "--day", "2024-03-10"]).is_err());
    }
}
