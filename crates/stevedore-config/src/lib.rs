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
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Static configuration for the stevedore post-completion pipeline.
//!
//! Settings are read once from a TOML document at startup, validated, and
//! shared read-only across the daemon's tasks. Nothing in here mutates after
//! load.

mod error;
mod loader;
mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_ENV_VAR, ConfigLoader, LoadedSettings};
pub use model::{
    ClientSettings, DEFAULT_LIMIT_GROUP, GenreProfile, LimitGroup, RescanSettings, RssTemplate,
    Settings, WatchSettings,
};
