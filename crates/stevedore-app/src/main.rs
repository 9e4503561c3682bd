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
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Binary entrypoint for the stevedore command line.

use std::process;

use clap::Parser;
use stevedore_app::Cli;

/// Parses the command line, runs the selected command, and maps failures to
/// process exit codes.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = stevedore_app::run(cli).await {
        eprintln!("error: {}", err.render());
        process::exit(err.exit_code());
    }
}
