//! Resolution of free-form queries into listed instrument codes.
//!
//! The resolver never fails: when the listing cannot be obtained or does not
//! contain the query, the query itself is passed through as the code so the
//! caller can still try the downstream price fetch.

use std::{
    sync::{Arc, LazyLock},
    time::Duration,
};

use dashmap::DashMap;
use log::{debug, info};
use serde::Serialize;
use tokio::{sync::OnceCell, time::timeout};

use crate::{
    error::{TlError, TlResult},
    listing::{InstrumentRecord, ListingProvider},
};

pub const LISTING_TIMEOUT_SECS_DEFAULT: u64 = 5;

type Listing = Arc<Vec<InstrumentRecord>>;

/// Listing snapshots of this run, keyed by [`ListingProvider::cache_key`].
static LISTING_MEMO: LazyLock<DashMap<String, Arc<OnceCell<Listing>>>> =
    LazyLock::new(DashMap::new);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionSource {
    ListingMatch,
    RawPassthrough,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub code: String,
    pub name: String,
    pub resolved: bool,
    pub source: ResolutionSource,
}

impl ResolutionResult {
    fn matched(record: &InstrumentRecord) -> Self {
        Self {
            code: record.code.clone(),
            name: record.name.clone(),
            resolved: true,
            source: ResolutionSource::ListingMatch,
        }
    }

    fn passthrough(query: &str) -> Self {
        Self {
            code: query.to_string(),
            name: query.to_string(),
            resolved: false,
            source: ResolutionSource::RawPassthrough,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.source == ResolutionSource::RawPassthrough
    }
}

pub struct TickerResolver<P: ListingProvider> {
    provider: P,
    fetch_timeout: Option<Duration>,
}

impl<P: ListingProvider> TickerResolver<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            fetch_timeout: Some(Duration::from_secs(LISTING_TIMEOUT_SECS_DEFAULT)),
        }
    }

    /// Bounds the whole [`ListingProvider::fetch`], including any cache I/O
    /// the provider does; an elapsed deadline discards that fetch.
    pub fn with_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = Some(fetch_timeout);
        self
    }

    /// For providers which bound their own network calls.
    pub fn without_timeout(mut self) -> Self {
        self.fetch_timeout = None;
        self
    }

    /// Assumes `query` is non-empty; blank input should be filtered by the caller.
    pub async fn resolve(&self, query: &str) -> ResolutionResult {
        let listing = match self.listing().await {
            Ok(listing) => listing,
            Err(err) => {
                info!("Listing unavailable, switched to direct-code mode: {err}");
                return ResolutionResult::passthrough(query);
            }
        };

        if let Some(record) = listing.iter().find(|record| record.matches(query)) {
            debug!("'{query}' matched {} ({})", record.name, record.code);
            return ResolutionResult::matched(record);
        }

        info!("'{query}' not in listing, switched to direct-code mode");
        ResolutionResult::passthrough(query)
    }

    /// Failed or empty fetches leave the memo empty so a later call retries.
    async fn listing(&self) -> TlResult<Listing> {
        let cell = LISTING_MEMO
            .entry(self.provider.cache_key())
            .or_default()
            .value()
            .clone();

        let listing = cell
            .get_or_try_init(|| async {
                let records = match self.fetch_timeout {
                    Some(limit) => timeout(limit, self.provider.fetch()).await??,
                    None => self.provider.fetch().await?,
                };
                if records.is_empty() {
                    return Err(TlError::NoData {
                        code: "EMPTY_LISTING",
                        message: format!("Listing '{}' is empty", self.provider.cache_key()),
                    });
                }

                Ok::<Listing, TlError>(Arc::new(records))
            })
            .await?;

        Ok(listing.clone())
    }
}
