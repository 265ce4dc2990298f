//! # tickerlens lib

use std::{env, path::PathBuf, sync::LazyLock};

use log::warn;
use tokio::sync::RwLock;

use crate::config::TlConfig;

pub mod api;
pub mod config;
pub mod error;
pub mod listing;
pub mod quote;
pub mod report;
pub mod resolver;
pub mod utils;

mod cache;
mod market;

pub async fn init() {
    env_logger::Builder::new()
        .parse_filters(env::var("LOG").as_deref().unwrap_or("off"))
        .init();

    if let Err(err) = cache::init().await {
        warn!("Initialize cache error, listing will not be cached: {err}");
    }
}

static CACHE_ONLY: LazyLock<bool> = LazyLock::new(|| {
    let v = env::var("CACHE_ONLY")
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    v == "true" || v == "t" || v == "yes" || v == "y"
});

static CACHE_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    match directories::ProjectDirs::from("", "", env!("CARGO_PKG_NAME")) {
        Some(proj_dirs) => proj_dirs.cache_dir().to_path_buf(),
        None => env::temp_dir().join(env!("CARGO_PKG_NAME")),
    }
    .join("cache.db")
});

static CONFIG: LazyLock<RwLock<TlConfig>> = LazyLock::new(|| {
    let config = confy::load(env!("CARGO_PKG_NAME"), None).unwrap_or_else(|err| {
        warn!("Load config error, using defaults: {err}");
        TlConfig::default()
    });

    RwLock::new(config)
});
