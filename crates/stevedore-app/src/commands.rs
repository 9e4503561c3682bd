//! One-shot subcommand implementations.
//!
//! Usage mistakes are caught before any client session is opened so they
//! never need a reachable qBittorrent instance.

use std::sync::Arc;

use stevedore_config::{GenreProfile, Settings};
use stevedore_sweep::{Sweeper, apply_limits, ensure_category, ensure_rule};

use crate::bootstrap;
use crate::cli::ProvisionArgs;
use crate::error::{AppError, AppResult};

pub(crate) async fn sweep_once(settings: Settings) -> AppResult<()> {
    let client = bootstrap::connect(&settings).await?;
    let sweeper = Sweeper::new(Arc::new(settings), Arc::new(client));
    sweeper.sweep().await?;
    Ok(())
}

pub(crate) async fn limits_once(settings: &Settings) -> AppResult<()> {
    let client = bootstrap::connect(settings).await?;
    apply_limits(&client, settings).await?;
    Ok(())
}

pub(crate) async fn add_category(settings: &Settings, args: &ProvisionArgs) -> AppResult<()> {
    let genre = lookup_genre(settings, &args.genre)?;
    let client = bootstrap::connect(settings).await?;
    ensure_category(&client, genre, &args.name).await?;
    Ok(())
}

/// Provisions the category first so the rule never assigns a category the
/// client does not know about.
pub(crate) async fn add_rule(settings: &Settings, args: &ProvisionArgs) -> AppResult<()> {
    let genre = lookup_genre(settings, &args.genre)?;
    let Some(template) = genre.rss.as_ref() else {
        return Err(AppError::usage(format!(
            "genre '{}' has no [genres.{}.rss] template",
            args.genre, args.genre
        )));
    };
    let client = bootstrap::connect(settings).await?;
    ensure_category(&client, genre, &args.name).await?;
    ensure_rule(&client, &args.genre, genre, template, &args.name).await?;
    Ok(())
}

fn lookup_genre<'a>(settings: &'a Settings, key: &str) -> AppResult<&'a GenreProfile> {
    settings
        .genres
        .get(key)
        .ok_or_else(|| AppError::usage(format!("unknown genre '{key}'")))
}
