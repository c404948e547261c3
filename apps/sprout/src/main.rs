//! # Sprout - Child Development Companion
//!
//! The main binary for the Sprout server.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for classification, content and records
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                apps/sprout (THE BINARY)               │
//! │                                                       │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────┐  │
//! │   │    CLI      │    │  HTTP API   │    │  Config  │  │
//! │   │   (clap)    │    │   (axum)    │    │  (toml)  │  │
//! │   └──────┬──────┘    └──────┬──────┘    └────┬─────┘  │
//! │          └──────────────────┼────────────────┘        │
//! │                             ▼                         │
//! │                     ┌───────────────┐                 │
//! │                     │  sprout-core  │                 │
//! │                     │  (THE LOGIC)  │                 │
//! │                     └───────────────┘                 │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! sprout server --host 0.0.0.0 --port 8080 --content data/milestones_en.csv
//!
//! # CLI operations
//! sprout stage --birth-date 2024-01-15
//! sprout guidance --birth-date 2024-01-15 --today 2024-03-01
//! sprout children --user user-42
//! ```

use clap::Parser;
use sprout::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SPROUT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SPROUT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sprout=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Sprout startup banner.
fn print_banner() {
    println!(
        r#"
   ___ _ __  _ __ ___  _   _| |_
  / __| '_ \| '__/ _ \| | | | __|
  \__ \ |_) | | | (_) | |_| | |_
  |___/ .__/|_|  \___/ \__,_|\__|
      |_|

  Child Development Companion v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
