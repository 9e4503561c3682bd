//! Command-line surface for the `stevedore` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "stevedore",
    about = "Post-completion automation for a qBittorrent instance"
)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, env = "STEVEDORE_CONFIG")]
    pub config: Option<PathBuf>,
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the incomplete directory and run passes continuously.
    Watch,
    /// Run a single reconciliation pass and exit.
    Sweep,
    /// Apply share limits to unclaimed downloads and exit.
    SetLimits,
    /// Create a download category for a genre if it does not exist.
    AddCategory(ProvisionArgs),
    /// Create a category and an RSS download rule for a genre if they do not
    /// exist.
    AddRule(ProvisionArgs),
}

/// Arguments shared by the provisioning subcommands.
#[derive(Debug, Args)]
pub struct ProvisionArgs {
    /// Genre key as written in the configuration.
    #[arg(long)]
    pub genre: String,
    /// Name of the category or show to provision.
    #[arg(long)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult<T> = anyhow::Result<T>;

    #[test]
    fn subcommands_parse_with_their_flags() -> TestResult<()> {
        let cli = Cli::try_parse_from(["stevedore", "add-rule", "--genre", "tv", "--name", "Show"])?;
        match cli.command {
            Command::AddRule(args) => {
                assert_eq!(args.genre, "tv");
                assert_eq!(args.name, "Show");
            }
            other => anyhow::bail!("unexpected command: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn config_flag_is_global() -> TestResult<()> {
        let cli = Cli::try_parse_from(["stevedore", "sweep", "--config", "/tmp/stevedore.toml"])?;
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/stevedore.toml")));
        assert!(matches!(cli.command, Command::Sweep));
        Ok(())
    }

    #[test]
    fn provisioning_requires_genre_and_name() {
        let result = Cli::try_parse_from(["stevedore", "add-category", "--genre", "tv"]);
        assert!(result.is_err());
    }
}
