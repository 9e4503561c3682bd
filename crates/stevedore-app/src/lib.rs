#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Stevedore application wiring: the command line, process bootstrap, and the
//! watch daemon.
//!
//! Layout: `cli.rs` (argument parsing), `bootstrap.rs` (logging, config, and
//! client wiring), `commands.rs` (one-shot subcommands), `watch.rs` (the
//! long-running daemon).

use tracing::info;

/// Logging, configuration, and download-client wiring.
pub mod bootstrap;
/// Command-line definition.
pub mod cli;
/// One-shot subcommand implementations.
mod commands;
/// Application error and exit-code mapping.
pub mod error;
/// Filesystem watcher, timer, and the serialized pass worker.
mod watch;

pub use cli::{Cli, Command};
pub use error::{AppError, AppResult};

/// Run a parsed command line to completion.
///
/// # Errors
/// Returns [`AppError::Logging`] when the tracing subscriber cannot be
/// installed, [`AppError::Config`] when the configuration cannot be loaded,
/// and whatever the selected command surfaces.
pub async fn run(cli: Cli) -> AppResult<()> {
    bootstrap::init_logging()?;
    let loaded = bootstrap::load_settings(cli.config)?;
    info!(path = %loaded.path.display(), "configuration loaded");
    let settings = loaded.settings;
    match cli.command {
        Command::Watch => watch::run(settings).await,
        Command::Sweep => commands::sweep_once(settings).await,
        Command::SetLimits => commands::limits_once(&settings).await,
        Command::AddCategory(args) => commands::add_category(&settings, &args).await,
        Command::AddRule(args) => commands::add_rule(&settings, &args).await,
    }
}
