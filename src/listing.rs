use std::{collections::HashMap, path::PathBuf, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use fake_user_agent::get_rua;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::{
    CACHE_ONLY, CACHE_PATH, cache,
    config::{ListingFormat, TlConfig},
    error::{TlError, TlResult},
    market::next_data_expire_in_korea,
    utils::{compress, net::http_get, text::normalize_code},
};

const CODE_FIELDS: &[&str] = &["Code", "code", "Symbol", "symbol"];
const NAME_FIELDS: &[&str] = &["Name", "name"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    pub code: String,
    pub name: String,
}

/// Source of the instrument directory of one market.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    /// Identifies the listing snapshot for memoization, e.g. `listing:KRX`.
    fn cache_key(&self) -> String;

    async fn fetch(&self) -> TlResult<Vec<InstrumentRecord>>;
}

impl InstrumentRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn matches(&self, query: &str) -> bool {
        self.code == query || self.name == query
    }
}

/// Listing served over HTTP, kept in the local cache until the next close.
///
/// Only the HTTP request is bounded by `timeout_secs`; cache reads and writes
/// run to completion, so resolvers built on this provider need no deadline of
/// their own.
pub struct HttpListingProvider {
    api: String,
    market: String,
    format: ListingFormat,
    timeout_secs: u64,
    cache_path: PathBuf,
    cache_only: bool,
}

impl HttpListingProvider {
    pub fn from_config(config: &TlConfig) -> Self {
        Self {
            api: config.listing_api.clone(),
            market: config.listing_market.clone(),
            format: config.listing_format,
            timeout_secs: config.listing_timeout_secs,
            cache_path: CACHE_PATH.to_path_buf(),
            cache_only: *CACHE_ONLY,
        }
    }

    fn parse(&self, bytes: &[u8]) -> TlResult<Vec<InstrumentRecord>> {
        match self.format {
            ListingFormat::Json => {
                parse_listing_json(&serde_json::from_slice(bytes)?, &self.market)
            }
            ListingFormat::Csv => parse_listing_csv(bytes, &self.market),
        }
    }

    pub async fn check_api(&self) -> TlResult<()> {
        let (_, records) = self.fetch_remote().await?;
        if records.is_empty() {
            return Err(TlError::NoData {
                code: "EMPTY_LISTING",
                message: format!("Listing of market '{}' is empty", self.market),
            });
        }

        Ok(())
    }

    async fn fetch_remote(&self) -> TlResult<(Vec<u8>, Vec<InstrumentRecord>)> {
        let mut query: HashMap<String, String> = HashMap::new();
        query.insert("market".to_string(), self.market.clone());

        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert(
            reqwest::header::USER_AGENT.to_string(),
            get_rua().to_string(),
        );

        // Retries share the deadline with the first attempt
        let bytes = timeout(
            Duration::from_secs(self.timeout_secs),
            http_get(&self.api, None, &query, &headers, self.timeout_secs, 1),
        )
        .await??;
        let records = self.parse(&bytes)?;
        debug!(
            "Listing of market '{}' fetched with {} records",
            self.market,
            records.len()
        );

        Ok((bytes, records))
    }

    async fn read_cache(&self, ignore_expire: bool) -> Option<Vec<InstrumentRecord>> {
        let cache_key = self.cache_key();
        match cache::get_at(&self.cache_path, &cache_key, ignore_expire).await {
            Ok(Some(data)) => match compress::decode(&data)
                .map_err(TlError::from)
                .and_then(|bytes| self.parse(&bytes))
            {
                Ok(records) if !records.is_empty() => Some(records),
                Ok(_) => None,
                Err(err) => {
                    warn!("Discard cached listing '{cache_key}': {err}");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!("Read listing cache '{cache_key}' error: {err}");
                None
            }
        }
    }

    async fn write_cache(&self, bytes: &[u8]) {
        let cache_key = self.cache_key();
        let expire = next_data_expire_in_korea(&Utc::now());

        let result = match compress::encode(bytes) {
            Ok(data) => cache::upsert_at(&self.cache_path, &cache_key, &data, &expire).await,
            Err(err) => Err(err.into()),
        };
        if let Err(err) = result {
            warn!("Write listing cache '{cache_key}' error: {err}");
        }
    }
}

#[async_trait]
impl ListingProvider for HttpListingProvider {
    fn cache_key(&self) -> String {
        format!("listing:{}:{}", self.market, self.format)
    }

    async fn fetch(&self) -> TlResult<Vec<InstrumentRecord>> {
        if self.cache_only {
            return self.read_cache(true).await.ok_or_else(|| TlError::NoData {
                code: "NO_CACHE_DATA",
                message: format!("Cache with key '{}' not exists", self.cache_key()),
            });
        }

        if let Some(records) = self.read_cache(false).await {
            debug!("Listing '{}' loaded from cache", self.cache_key());
            return Ok(records);
        }

        let (bytes, records) = self.fetch_remote().await?;
        if !records.is_empty() {
            self.write_cache(&bytes).await;
        }

        Ok(records)
    }
}

/// Accepts a top-level array or one wrapped in a `data` field.
pub fn parse_listing_json(
    json: &serde_json::Value,
    market: &str,
) -> TlResult<Vec<InstrumentRecord>> {
    let array = json
        .as_array()
        .or_else(|| json["data"].as_array())
        .ok_or_else(|| TlError::Invalid {
            code: "INVALID_LISTING",
            message: "Listing response is not an array".to_string(),
        })?;

    let mut records: Vec<InstrumentRecord> = vec![];
    for item in array {
        if let Some(obj) = item.as_object() {
            let code = CODE_FIELDS
                .iter()
                .find_map(|field| match obj.get(*field) {
                    Some(serde_json::Value::String(s)) => Some(s.to_string()),
                    Some(serde_json::Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                })
                .map(|s| normalize_code(&s, market))
                .unwrap_or_default();
            if code.is_empty() {
                continue;
            }

            let name = NAME_FIELDS
                .iter()
                .find_map(|field| obj.get(*field).and_then(|v| v.as_str()))
                .map(|s| s.trim().to_string())
                .unwrap_or_default();

            records.push(InstrumentRecord { code, name });
        }
    }

    Ok(records)
}

pub fn parse_listing_csv(bytes: &[u8], market: &str) -> TlResult<Vec<InstrumentRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let position = |fields: &[&str]| {
        headers.iter().position(|h| {
            let h = h.trim().trim_start_matches('\u{feff}');
            fields.iter().any(|f| f.eq_ignore_ascii_case(h))
        })
    };
    let (Some(code_idx), Some(name_idx)) = (position(CODE_FIELDS), position(NAME_FIELDS)) else {
        return Err(TlError::Invalid {
            code: "INVALID_LISTING",
            message: format!("Listing CSV lacks code/name columns: {headers:?}"),
        });
    };

    let mut records: Vec<InstrumentRecord> = vec![];
    for row in reader.records() {
        let row = row?;
        let code = normalize_code(row.get(code_idx).unwrap_or_default(), market);
        if code.is_empty() {
            continue;
        }

        records.push(InstrumentRecord {
            code,
            name: row.get(name_idx).unwrap_or_default().trim().to_string(),
        });
    }

    Ok(records)
}
