use std::{collections::HashMap, fmt::Write};

use async_trait::async_trait;
use log::debug;
use serde_json::json;

use crate::{
    config::TlConfig,
    error::{TlError, TlResult},
    quote::PriceBar,
    utils::{
        datetime::date_to_str,
        net::{http_get, http_post},
    },
};

pub const PROMPT_BARS: usize = 30;

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate_report(&self, prompt: &str) -> TlResult<String>;
}

pub fn build_analysis_prompt(name: &str, code: &str, bars: &[PriceBar], language: &str) -> String {
    let bars = &bars[bars.len().saturating_sub(PROMPT_BARS)..];

    let mut table = format!(
        "{:<10} {:>12} {:>12} {:>12} {:>12} {:>14}\n",
        "Date", "Open", "High", "Low", "Close", "Volume"
    );
    for bar in bars {
        let _ = writeln!(
            table,
            "{:<10} {:>12.2} {:>12.2} {:>12.2} {:>12.2} {:>14}",
            date_to_str(&bar.date),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        );
    }

    format!(
        "You are a professional equity analyst. Analyze the share price data of '{name}' ({code}).\n\
         \n\
         [Last {count} trading days]\n\
         {table}\n\
         [Requests]\n\
         1. Summarize the recent price trend (rising, falling or sideways).\n\
         2. Explain any volatility or patterns investors should watch out for.\n\
         3. Suggest an outlook and an investment strategy.\n\
         4. Write in {language}, professionally and concisely.\n",
        count = bars.len(),
    )
}

pub struct GeminiReportGenerator {
    api: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiReportGenerator {
    pub fn from_config(config: &TlConfig) -> Self {
        Self {
            api: config.genai_api.clone(),
            model: config.genai_model.clone(),
            api_key: config.genai_api_key(),
        }
    }

    fn headers(&self) -> TlResult<HashMap<String, String>> {
        let Some(api_key) = &self.api_key else {
            return Err(TlError::Invalid {
                code: "MISSING_API_KEY",
                message: "No generation API key, set GEMINI_API_KEY or config genai_api_key"
                    .to_string(),
            });
        };

        let mut headers: HashMap<String, String> = HashMap::new();
        headers.insert("x-goog-api-key".to_string(), api_key.to_string());

        Ok(headers)
    }

    /// Looks the model up without spending a generation request.
    pub async fn check_api(&self) -> TlResult<()> {
        let headers = self.headers()?;
        let path = format!("/v1beta/models/{}", self.model);

        let bytes = http_get(&self.api, Some(&path), &HashMap::new(), &headers, 30, 1)
            .await
            .map_err(explain_rejection)?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        if json["name"].as_str().is_some() {
            return Ok(());
        }

        Err(TlError::Invalid {
            code: "INVALID_RESPONSE",
            message: format!("Unknown model '{}'", self.model),
        })
    }
}

#[async_trait]
impl ReportGenerator for GeminiReportGenerator {
    async fn generate_report(&self, prompt: &str) -> TlResult<String> {
        let headers = self.headers()?;
        let path = format!("/v1beta/models/{}:generateContent", self.model);
        let bytes = http_post(
            &self.api,
            Some(&path),
            &json!({
                "contents": [{
                    "parts": [{ "text": prompt }],
                }],
            }),
            &headers,
            60,
            1,
        )
        .await
        .map_err(explain_rejection)?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;
        debug!("[{}] {}", self.model, json["usageMetadata"]);

        parse_generation_response(&json)
    }
}

/// Gemini rejects bad keys or models with a JSON `error.message` body.
fn explain_rejection(err: TlError) -> TlError {
    if let TlError::HttpStatusError { status, body, .. } = &err {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(message) = json["error"]["message"].as_str() {
                return TlError::Generation {
                    message: format!("{status}: {message}"),
                };
            }
        }
    }

    err
}

/// Joins the text parts of the first candidate.
pub fn parse_generation_response(json: &serde_json::Value) -> TlResult<String> {
    if let Some(message) = json["error"]["message"].as_str() {
        return Err(TlError::Generation {
            message: message.to_string(),
        });
    }

    let text = json["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = json["promptFeedback"]["blockReason"]
            .as_str()
            .or_else(|| json["candidates"][0]["finishReason"].as_str())
            .unwrap_or("empty response");

        return Err(TlError::Generation {
            message: format!("No report generated ({reason})"),
        });
    }

    Ok(text)
}
