use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDate};
use log::debug;
use serde::Serialize;

use crate::{
    config::TlConfig,
    error::{TlError, TlResult},
    utils::{
        datetime::{date_from_str, date_to_str},
        net::http_get,
    },
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily bars of one instrument, oldest first.
#[derive(Clone, Debug, Serialize)]
pub struct PriceSeries {
    pub code: String,
    pub bars: Vec<PriceBar>,
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// An unknown code yields [`TlError::NoData`].
    async fn fetch_daily(
        &self,
        code: &str,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> TlResult<PriceSeries>;
}

impl PriceSeries {
    pub fn new(code: &str, mut bars: Vec<PriceBar>) -> Self {
        bars.sort_by_key(|bar| bar.date);
        bars.dedup_by_key(|bar| bar.date);

        Self {
            code: code.to_string(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// Last `n` bars, oldest first.
    pub fn recent(&self, n: usize) -> &[PriceBar] {
        &self.bars[self.bars.len().saturating_sub(n)..]
    }

    pub fn latest_first(&self, n: usize) -> Vec<&PriceBar> {
        self.bars.iter().rev().take(n).collect()
    }

    /// Change of close from the first to the last bar, as a ratio.
    pub fn change_ratio(&self) -> Option<f64> {
        let first = self.bars.first()?;
        let last = self.bars.last()?;
        if first.close == 0.0 {
            return None;
        }

        Some(last.close / first.close - 1.0)
    }
}

pub struct HttpQuoteProvider {
    api: String,
}

impl HttpQuoteProvider {
    pub fn from_config(config: &TlConfig) -> Self {
        Self {
            api: config.quote_api.clone(),
        }
    }

    pub async fn check_api(&self, probe_code: &str) -> TlResult<()> {
        let end = Local::now().date_naive();
        let start = end - Duration::days(14);
        self.fetch_daily(probe_code, &start, &end).await?;

        Ok(())
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    async fn fetch_daily(
        &self,
        code: &str,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> TlResult<PriceSeries> {
        let mut query: HashMap<String, String> = HashMap::new();
        query.insert("code".to_string(), code.to_string());
        query.insert("start".to_string(), date_to_str(start));
        query.insert("end".to_string(), date_to_str(end));

        let bytes = http_get(&self.api, None, &query, &HashMap::new(), 30, 3).await?;
        let json: serde_json::Value = serde_json::from_slice(&bytes)?;

        let series = parse_daily_json(code, &json)?;
        debug!("{} daily bars fetched for '{code}'", series.bars.len());

        if series.is_empty() {
            return Err(TlError::NoData {
                code: "NO_PRICE_DATA",
                message: format!("No data for this identifier '{code}'"),
            });
        }

        Ok(series)
    }
}

pub fn parse_daily_json(code: &str, json: &serde_json::Value) -> TlResult<PriceSeries> {
    let array = json
        .as_array()
        .or_else(|| json["data"].as_array())
        .ok_or_else(|| TlError::Invalid {
            code: "INVALID_DAILY",
            message: "Daily response is not an array".to_string(),
        })?;

    let field = |obj: &serde_json::Map<String, serde_json::Value>, name: &str| -> Option<f64> {
        obj.get(name)
            .or_else(|| obj.get(&name.to_lowercase()))
            .and_then(|v| v.as_f64().or_else(|| v.as_str()?.parse::<f64>().ok()))
    };

    let mut bars: Vec<PriceBar> = vec![];
    for item in array {
        let Some(obj) = item.as_object() else {
            continue;
        };

        let Some(date) = obj
            .get("Date")
            .or_else(|| obj.get("date"))
            .and_then(|v| v.as_str())
            .and_then(|s| date_from_str(s).ok())
        else {
            continue;
        };

        if let Some(close) = field(obj, "Close") {
            bars.push(PriceBar {
                date,
                open: field(obj, "Open").unwrap_or(close),
                high: field(obj, "High").unwrap_or(close),
                low: field(obj, "Low").unwrap_or(close),
                close,
                volume: field(obj, "Volume").map(|v| v as u64).unwrap_or_default(),
            });
        }
    }

    Ok(PriceSeries::new(code, bars))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            date: date_from_str(date).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    #[test]
    fn test_parse_daily_json() {
        let series = parse_daily_json(
            "005930",
            &json!([
                {"Date": "2024-01-03", "Open": 77000, "High": 77500, "Low": 76000, "Close": 76600, "Volume": 21753644},
                {"date": "2024-01-02T00:00:00", "open": "78200", "close": "79600", "volume": 17142847},
                {"Date": "2024-01-04", "Open": 76100},
                {"Close": 1},
            ]),
        )
        .unwrap();

        assert_eq!(series.bars.len(), 2);
        assert_eq!(series.bars[0].date, date_from_str("2024-01-02").unwrap());
        assert_eq!(series.bars[0].close, 79600.0);
        assert_eq!(series.bars[0].high, 79600.0);
        assert_eq!(series.bars[1].volume, 21753644);
    }

    #[test]
    fn test_parse_daily_json_invalid() {
        assert!(parse_daily_json("005930", &json!("oops")).is_err());
        assert!(parse_daily_json("005930", &json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_series_windows() {
        let series = PriceSeries::new(
            "005930",
            vec![
                bar("2024-01-04", 103.0),
                bar("2024-01-02", 100.0),
                bar("2024-01-03", 101.0),
                bar("2024-01-03", 999.0),
            ],
        );

        assert_eq!(series.bars.len(), 3);
        assert_eq!(series.latest().unwrap().close, 103.0);
        assert_eq!(series.recent(2)[0].close, 101.0);
        assert_eq!(series.recent(10).len(), 3);
        assert_eq!(
            series
                .latest_first(2)
                .iter()
                .map(|b| b.close)
                .collect::<Vec<_>>(),
            vec![103.0, 101.0]
        );
        assert!((series.change_ratio().unwrap() - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_series_to_json() {
        let series = PriceSeries::new("005930", vec![bar("2024-06-28", 81500.0)]);
        let json = serde_json::to_value(&series).unwrap();

        assert_eq!(json["code"], "005930");
        assert_eq!(json["bars"][0]["date"], "2024-06-28");
        assert_eq!(json["bars"][0]["close"], 81500.0);
    }
}
