//! `seltab-lsp` - Language Server Protocol implementation for seltab
//! annotations.
//!
//! The server speaks LSP over stdio: backtick tag literals carrying CSS
//! selectors get completion from the target page's cached selector space,
//! hover with live match counts, and diagnostics when a typed selector no
//! longer resolves against the page.

mod cancel;
mod config;
mod handlers;
mod protocol;
mod rpc;
mod server;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use seltab_scrape::{HttpFetcher, SelectorStore};

use crate::config::SeltabConfig;
use crate::state::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging goes to stderr; stdout carries the wire protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("starting seltab language server");

    let config = SeltabConfig::load();
    let store = SelectorStore::open(&config.cache_path)
        .await
        .with_context(|| {
            format!(
                "failed to open selector cache at {}",
                config.cache_path.display()
            )
        })?;
    let fetcher =
        HttpFetcher::new(config.fetch_timeout()).context("failed to build HTTP client")?;
    let state = Arc::new(ServerState::new(store, Box::new(fetcher), config));

    let code = server::run(state).await?;
    info!(code, "seltab language server stopped");
    std::process::exit(code);
}
