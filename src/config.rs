use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TlError, TlResult};

#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ListingFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TlConfig {
    pub listing_api: String,
    pub listing_market: String,
    pub listing_format: ListingFormat,
    pub listing_timeout_secs: u64,
    pub quote_api: String,
    pub genai_api: String,
    pub genai_model: String,
    pub genai_api_key: String,
    pub report_language: String,
}

impl Default for TlConfig {
    fn default() -> Self {
        Self {
            listing_api: "http://127.0.0.1:8000/api/listing".to_string(),
            listing_market: "KRX".to_string(),
            listing_format: ListingFormat::Json,
            listing_timeout_secs: 5,
            quote_api: "http://127.0.0.1:8000/api/daily".to_string(),
            genai_api: "https://generativelanguage.googleapis.com".to_string(),
            genai_model: "gemini-pro".to_string(),
            genai_api_key: "".to_string(),
            report_language: "Korean".to_string(),
        }
    }
}

impl TlConfig {
    pub const KEYS: &'static [&'static str] = &[
        "listing_api",
        "listing_market",
        "listing_format",
        "listing_timeout_secs",
        "quote_api",
        "genai_api",
        "genai_model",
        "genai_api_key",
        "report_language",
    ];

    /// Environment takes precedence so the key never has to be written to disk.
    pub fn genai_api_key(&self) -> Option<String> {
        std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                if self.genai_api_key.trim().is_empty() {
                    None
                } else {
                    Some(self.genai_api_key.clone())
                }
            })
    }

    pub fn get(&self, key: &str) -> TlResult<String> {
        let value = match key.to_lowercase().as_str() {
            "listing_api" => self.listing_api.clone(),
            "listing_market" => self.listing_market.clone(),
            "listing_format" => self.listing_format.to_string(),
            "listing_timeout_secs" => self.listing_timeout_secs.to_string(),
            "quote_api" => self.quote_api.clone(),
            "genai_api" => self.genai_api.clone(),
            "genai_model" => self.genai_model.clone(),
            "genai_api_key" => self.genai_api_key.clone(),
            "report_language" => self.report_language.clone(),
            _ => return Err(unknown_key(key)),
        };

        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> TlResult<()> {
        let value = value.trim();

        match key.to_lowercase().as_str() {
            "listing_api" => self.listing_api = parse_url(value)?,
            "listing_market" => self.listing_market = value.to_uppercase(),
            "listing_format" => self.listing_format = ListingFormat::from_str(value)?,
            "listing_timeout_secs" => {
                self.listing_timeout_secs = match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        return Err(TlError::Invalid {
                            code: "INVALID_CONFIG_VALUE",
                            message: format!("Timeout must be a positive integer, got '{value}'"),
                        });
                    }
                }
            }
            "quote_api" => self.quote_api = parse_url(value)?,
            "genai_api" => self.genai_api = parse_url(value)?,
            "genai_model" => self.genai_model = value.to_string(),
            "genai_api_key" => self.genai_api_key = value.to_string(),
            "report_language" => self.report_language = value.to_string(),
            _ => return Err(unknown_key(key)),
        }

        Ok(())
    }
}

fn parse_url(value: &str) -> TlResult<String> {
    url::Url::parse(value)?;
    Ok(value.to_string())
}

fn unknown_key(key: &str) -> TlError {
    TlError::Invalid {
        code: "UNKNOWN_CONFIG_KEY",
        message: format!(
            "Unknown config key '{key}', available keys: {}",
            TlConfig::KEYS.join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut config = TlConfig::default();

        config.set("LISTING_FORMAT", "CSV").unwrap();
        assert_eq!(config.listing_format, ListingFormat::Csv);
        assert_eq!(config.get("listing_format").unwrap(), "csv");

        config.set("listing_market", "kosdaq").unwrap();
        assert_eq!(config.get("listing_market").unwrap(), "KOSDAQ");

        config.set("listing_timeout_secs", "3").unwrap();
        assert_eq!(config.listing_timeout_secs, 3);
    }

    #[test]
    fn test_set_invalid() {
        let mut config = TlConfig::default();

        assert!(config.set("nothing", "1").is_err());
        assert!(config.set("listing_timeout_secs", "0").is_err());
        assert!(config.set("listing_timeout_secs", "abc").is_err());
        assert!(config.set("quote_api", "not a url").is_err());
        assert!(config.set("listing_format", "xml").is_err());

        assert_eq!(config.listing_timeout_secs, 5);
    }
}
