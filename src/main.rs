//! igntui command line
//!
//! Thin front end over the library: browse, search and combine gitignore
//! templates, and manage the local cache.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use igntui::search::{SearchManager, SearchMode};
use igntui::tasks::{spawn_cleanup_task, spawn_operation, TaskCallbacks, TaskOutcome};
use igntui::{ApiClient, Config};

#[derive(Parser)]
#[command(name = "igntui")]
#[command(about = "Browse, search and combine .gitignore templates", long_about = None)]
struct Cli {
    /// Template service base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available templates
    List {
        /// Only show templates containing this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Print only the number of templates
        #[arg(short, long)]
        count: bool,

        /// Bypass the cache
        #[arg(short, long)]
        refresh: bool,
    },

    /// Search the template catalog
    Search {
        query: String,

        /// fuzzy, exact or regex
        #[arg(short, long, default_value = "fuzzy")]
        mode: SearchMode,

        /// Maximum results to show
        #[arg(long)]
        max: Option<usize>,

        /// Also print scores and match positions
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a combined .gitignore
    Generate {
        #[arg(required = true)]
        names: Vec<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Bypass the cache
        #[arg(short, long)]
        refresh: bool,
    },

    /// Inspect or manage the local cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Check connectivity to the template service
    Test,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Remove every cached record
    Clear,
    /// Remove expired records
    Cleanup,
    /// Drop cached content mentioning a template
    Invalidate { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so generated content can be piped.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "igntui=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(url) = cli.api_url {
        config.base_url = url;
    }
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }

    let client = Arc::new(ApiClient::new(&config).context("failed to initialize client")?);
    info!("Using template service at {}", client.base_url());

    let sweep = config
        .cleanup_interval()
        .map(|interval| spawn_cleanup_task(client.cache_manager().clone(), interval));

    let result = run_command(cli.command, client, &config).await;

    if let Some(handle) = sweep {
        handle.abort();
    }
    result
}

async fn run_command(command: Commands, client: Arc<ApiClient>, config: &Config) -> Result<()> {
    match command {
        Commands::List {
            filter,
            count,
            refresh,
        } => {
            let response = client.list_templates(refresh).await;
            if !response.success {
                bail!(
                    "could not list templates: {}",
                    response.error_message.unwrap_or_default()
                );
            }

            let filter = filter.map(|f| f.to_lowercase());
            let templates: Vec<&String> = response
                .data
                .iter()
                .filter(|t| filter.as_ref().map_or(true, |f| t.to_lowercase().contains(f)))
                .collect();

            if count {
                println!("{}", templates.len());
            } else {
                for template in templates {
                    println!("{template}");
                }
            }
        }

        Commands::Search {
            query,
            mode,
            max,
            verbose,
        } => {
            let response = client.list_templates(false).await;
            if !response.success {
                bail!(
                    "could not list templates: {}",
                    response.error_message.unwrap_or_default()
                );
            }

            let mut manager = SearchManager::new(config.case_sensitive_search);
            let results = manager.search(
                &response.data,
                &query,
                Some(mode),
                max.unwrap_or(config.max_results),
            );

            for result in &results.results {
                if verbose {
                    println!(
                        "{:<32} {:.3} {:?}",
                        result.item, result.score, result.match_positions
                    );
                } else {
                    println!("{}", result.item);
                }
            }
            info!(
                "{} of {} templates matched in {:.3}s",
                results.len(),
                results.total_items,
                results.search_time
            );
        }

        Commands::Generate {
            names,
            output,
            refresh,
        } => {
            let worker = client.clone();
            let handle = spawn_operation(
                async move { worker.get_templates(names.as_slice(), refresh).await },
                TaskCallbacks::new().on_error(|msg| warn!("Generation failed: {}", msg)),
            );

            let content = match handle.outcome().await {
                TaskOutcome::Success(content) => content,
                TaskOutcome::Failed {
                    message,
                    fallback: Some(content),
                } if output.is_none() => {
                    // The fallback is a comment block, still useful on stdout.
                    warn!("{}", message);
                    content
                }
                TaskOutcome::Failed { message, .. } => bail!("could not generate: {message}"),
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, &content)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("Wrote {} bytes to {}", content.len(), path.display());
                }
                None => println!("{content}"),
            }
        }

        Commands::Cache { action } => match action {
            CacheAction::Stats => {
                println!("{}", serde_json::to_string_pretty(&client.get_stats())?);
            }
            CacheAction::Clear => {
                println!("Cleared {} cache entries", client.clear_cache());
            }
            CacheAction::Cleanup => {
                let removed = client.cache_manager().cleanup_expired();
                println!("Removed {removed} expired entries");
            }
            CacheAction::Invalidate { name } => {
                println!(
                    "Invalidated {} cached entries for {name}",
                    client.invalidate_template(&name)
                );
            }
        },

        Commands::Test => {
            let response = client.test_connection().await;
            println!("{}", serde_json::to_string_pretty(&response.data)?);
            if !response.success {
                bail!(
                    "connection test failed: {}",
                    response.error_message.unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
