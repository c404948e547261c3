//! # Sprout CLI Module
//!
//! This module implements the CLI interface for Sprout.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show record and content status
//! - `stage` - Classify a birth date
//! - `guidance` - Show guidance sections for a birth date
//! - `content` - Summarize the content table
//! - `children` - List a user's children with their current stage
//! - `init` - Initialize new database

mod commands;

use crate::config::{Backend, FileConfig, Overrides, Settings};
use clap::{Parser, Subcommand};
use sprout_core::SproutError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Sprout - child development companion server
///
/// Classifies a child's age into developmental stages and serves the
/// guidance authored for the current and upcoming stage.
#[derive(Parser, Debug)]
#[command(name = "sprout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file (default: ./sprout.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the record database
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend: "redb" (ACID database) or "memory"
    #[arg(short = 'B', long, global = true)]
    pub backend: Option<Backend>,

    /// Path to the guidance content CSV
    #[arg(short = 'C', long, global = true)]
    pub content: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show record and content status
    Status,

    /// Classify a birth date into a developmental stage
    Stage {
        /// Birth date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        birth_date: String,

        /// Reference date (default: now)
        #[arg(short, long)]
        today: Option<String>,
    },

    /// Show the guidance sections relevant for a birth date
    Guidance {
        /// Birth date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long)]
        birth_date: String,

        /// Reference date (default: now)
        #[arg(short, long)]
        today: Option<String>,
    },

    /// Summarize the content table and its stage coverage
    Content,

    /// List a user's children with their current stage
    Children {
        /// User id as issued by the authenticator
        #[arg(short, long)]
        user: String,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), SproutError> {
    let file = FileConfig::discover(cli.config.as_deref())?;
    let (host, port) = match &cli.command {
        Some(Commands::Server { host, port }) => (host.clone(), *port),
        _ => (None, None),
    };
    let settings = Settings::resolve(
        file,
        Overrides {
            host,
            port,
            database: cli.database,
            backend: cli.backend,
            content: cli.content,
        },
    );
    if cli.verbose {
        tracing::info!(?settings, "Resolved settings");
    }

    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&settings).await,
        Some(Commands::Status) => cmd_status(&settings, json_mode),
        Some(Commands::Stage { birth_date, today }) => {
            cmd_stage(&settings, json_mode, &birth_date, today.as_deref())
        }
        Some(Commands::Guidance { birth_date, today }) => {
            cmd_guidance(&settings, json_mode, &birth_date, today.as_deref())
        }
        Some(Commands::Content) => cmd_content(&settings, json_mode),
        Some(Commands::Children { user }) => cmd_children(&settings, json_mode, &user),
        Some(Commands::Init { force }) => cmd_init(&settings, force),
        None => cmd_status(&settings, json_mode),
    }
}
