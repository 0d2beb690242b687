#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lensprobe::types::{OutputFormat, SearchCategory};

mod commands;

#[derive(Parser)]
#[command(name = "lensprobe")]
#[command(about = "Adaptive reverse-image search automation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reverse-image search
    Search {
        /// URL of the image to search by
        image_url: String,

        /// Result categories to harvest
        #[arg(short, long, default_value = "all")]
        category: SearchCategory,

        /// Browser to use
        #[arg(short, long, default_value = "firefox")]
        browser: String,

        /// WebDriver endpoint (overrides LENSPROBE_WEBDRIVER_URL)
        #[arg(long)]
        webdriver_url: Option<String>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Show learned selector statistics
    Stats {
        /// Limit output to one element type
        #[arg(long)]
        element_type: Option<String>,
    },

    /// Inspect or reset the generated-script cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached scripts
    List,
    /// Drop every cached script
    Clear,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            // JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": err.to_string(),
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );

            // Also log to stderr for human reading
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lensprobe=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            image_url,
            category,
            browser,
            webdriver_url,
            no_headless,
            format,
        } => {
            commands::search::handle_search(
                image_url,
                category,
                browser,
                webdriver_url,
                no_headless,
                format,
            )
            .await
        }

        Commands::Stats { element_type } => {
            commands::stats::handle_stats(element_type)?;
            Ok(0)
        }

        Commands::Cache { command } => {
            match command {
                CacheCommands::List => commands::cache::handle_list()?,
                CacheCommands::Clear => commands::cache::handle_clear()?,
            }
            Ok(0)
        }
    }
}
