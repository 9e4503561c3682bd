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

//! Shared test helpers for the stevedore pipeline suites.
//! Layout: client.rs (scripted download-client fake), fixtures.rs (torrent builders).

pub mod client;
pub mod fixtures;
