use std::ops::RangeInclusive;

use chrono::{Days, Local, NaiveDate};
use log::debug;
use serde::Serialize;

use crate::{
    CONFIG,
    config::TlConfig,
    error::{TlError, TlResult},
    listing::{HttpListingProvider, ListingProvider},
    quote::{HttpQuoteProvider, PriceSeries, QuoteProvider},
    report::{GeminiReportGenerator, ReportGenerator, build_analysis_prompt},
    resolver::{ResolutionResult, TickerResolver},
};

pub use crate::resolver::ResolutionSource;

pub const ANALYSIS_DAYS: RangeInclusive<u32> = 30..=365;
pub const ANALYSIS_DAYS_DEFAULT: u32 = 100;

const CHECK_PROBE_CODE: &str = "005930";

#[derive(Clone, Debug, Serialize)]
pub struct AnalysisReport {
    pub resolution: ResolutionResult,
    pub series: PriceSeries,
}

pub async fn resolve(query: &str) -> ResolutionResult {
    let resolver = {
        let config = CONFIG.read().await;
        listing_resolver(&config)
    };

    resolver.resolve(query).await
}

pub async fn analyze(query: &str, days: u32) -> TlResult<AnalysisReport> {
    let (resolver, quotes) = {
        let config = CONFIG.read().await;
        (listing_resolver(&config), HttpQuoteProvider::from_config(&config))
    };

    analyze_with(&resolver, &quotes, query, days, &Local::now().date_naive()).await
}

pub async fn generate_report(analysis: &AnalysisReport) -> TlResult<String> {
    let (generator, language) = {
        let config = CONFIG.read().await;
        (
            GeminiReportGenerator::from_config(&config),
            config.report_language.clone(),
        )
    };

    generate_report_with(&generator, analysis, &language).await
}

pub async fn get_config() -> TlResult<TlConfig> {
    Ok(CONFIG.read().await.clone())
}

pub async fn set_config(key: &str, value: &str) -> TlResult<()> {
    let mut config = CONFIG.write().await;

    let mut updated = config.clone();
    updated.set(key, value)?;
    confy::store(env!("CARGO_PKG_NAME"), None, &updated)?;
    *config = updated;

    Ok(())
}

/// Probes each collaborator, reporting the error of those unreachable.
pub async fn check() -> TlResult<Vec<(String, Option<TlError>)>> {
    let config = CONFIG.read().await.clone();

    let listing = HttpListingProvider::from_config(&config);
    let quotes = HttpQuoteProvider::from_config(&config);
    let generator = GeminiReportGenerator::from_config(&config);

    let (listing_status, quote_status, generation_status) = tokio::join!(
        listing.check_api(),
        quotes.check_api(CHECK_PROBE_CODE),
        generator.check_api(),
    );

    Ok(vec![
        (
            format!("Listing ({})", config.listing_market),
            listing_status.err(),
        ),
        ("Quote".to_string(), quote_status.err()),
        (
            format!("Generation ({})", config.genai_model),
            generation_status.err(),
        ),
    ])
}

/// The provider bounds its HTTP request with `listing_timeout_secs`.
fn listing_resolver(config: &TlConfig) -> TickerResolver<HttpListingProvider> {
    TickerResolver::new(HttpListingProvider::from_config(config)).without_timeout()
}

async fn analyze_with<P, Q>(
    resolver: &TickerResolver<P>,
    quotes: &Q,
    query: &str,
    days: u32,
    today: &NaiveDate,
) -> TlResult<AnalysisReport>
where
    P: ListingProvider,
    Q: QuoteProvider,
{
    let query = query.trim();
    if query.is_empty() {
        return Err(TlError::Invalid {
            code: "EMPTY_QUERY",
            message: "Ticker name or code is required".to_string(),
        });
    }

    if !ANALYSIS_DAYS.contains(&days) {
        return Err(TlError::Invalid {
            code: "INVALID_DAYS",
            message: format!(
                "Analysis period must be within {}..={} days, got {days}",
                ANALYSIS_DAYS.start(),
                ANALYSIS_DAYS.end()
            ),
        });
    }

    let resolution = resolver.resolve(query).await;

    let start = *today - Days::new(days as u64);
    debug!("Fetch '{}' from {start} to {today}", resolution.code);
    let series = quotes.fetch_daily(&resolution.code, &start, today).await?;
    if series.is_empty() {
        return Err(TlError::NoData {
            code: "NO_PRICE_DATA",
            message: format!("No data for this identifier '{}'", resolution.code),
        });
    }

    Ok(AnalysisReport { resolution, series })
}

async fn generate_report_with<G: ReportGenerator>(
    generator: &G,
    analysis: &AnalysisReport,
    language: &str,
) -> TlResult<String> {
    let prompt = build_analysis_prompt(
        &analysis.resolution.name,
        &analysis.resolution.code,
        &analysis.series.bars,
        language,
    );

    generator.generate_report(&prompt).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        listing::InstrumentRecord,
        quote::PriceBar,
        utils::datetime::{date_from_str, date_to_str},
    };

    struct StaticListing(&'static str, Vec<InstrumentRecord>);

    #[async_trait]
    impl ListingProvider for StaticListing {
        fn cache_key(&self) -> String {
            format!("api-test:{}", self.0)
        }

        async fn fetch(&self) -> TlResult<Vec<InstrumentRecord>> {
            if self.1.is_empty() {
                return Err(TlError::NoData {
                    code: "NO_LISTING",
                    message: "listing down".to_string(),
                });
            }

            Ok(self.1.clone())
        }
    }

    /// Returns bars only for 005930 and records every request.
    #[derive(Default)]
    struct FakeQuotes {
        requests: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl QuoteProvider for FakeQuotes {
        async fn fetch_daily(
            &self,
            code: &str,
            start: &NaiveDate,
            end: &NaiveDate,
        ) -> TlResult<PriceSeries> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push((code.to_string(), date_to_str(start), date_to_str(end)));
            }

            let bars = if code == "005930" {
                (0..40)
                    .map(|i| PriceBar {
                        date: *end - Days::new(i),
                        open: 70000.0,
                        high: 71000.0,
                        low: 69000.0,
                        close: 70000.0 - i as f64 * 100.0,
                        volume: 10_000,
                    })
                    .collect()
            } else {
                vec![]
            };

            Ok(PriceSeries::new(code, bars))
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl ReportGenerator for EchoGenerator {
        async fn generate_report(&self, prompt: &str) -> TlResult<String> {
            Ok(prompt.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl ReportGenerator for FailingGenerator {
        async fn generate_report(&self, _prompt: &str) -> TlResult<String> {
            Err(TlError::Generation {
                message: "deadline exceeded".to_string(),
            })
        }
    }

    fn krx(name: &'static str) -> TickerResolver<StaticListing> {
        TickerResolver::new(StaticListing(
            name,
            vec![InstrumentRecord::new("005930", "삼성전자")],
        ))
    }

    fn today() -> NaiveDate {
        date_from_str("2024-06-28").unwrap()
    }

    #[tokio::test]
    async fn test_analyze_by_name() {
        let quotes = FakeQuotes::default();
        let analysis = analyze_with(&krx("by-name"), &quotes, "삼성전자", 100, &today())
            .await
            .unwrap();

        assert!(analysis.resolution.resolved);
        assert_eq!(analysis.series.code, "005930");
        assert_eq!(analysis.series.bars.len(), 40);
        assert_eq!(
            quotes.requests.lock().unwrap()[0],
            (
                "005930".to_string(),
                "2024-03-20".to_string(),
                "2024-06-28".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_analyze_listing_down_uses_raw_code() {
        let resolver = TickerResolver::new(StaticListing("down", vec![]));
        let quotes = FakeQuotes::default();
        let analysis = analyze_with(&resolver, &quotes, "005930", 30, &today())
            .await
            .unwrap();

        assert_eq!(analysis.resolution.source, ResolutionSource::RawPassthrough);
        assert_eq!(analysis.resolution.name, "005930");
        assert!(!analysis.series.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_unknown_code_no_data() {
        let quotes = FakeQuotes::default();
        let result = analyze_with(&krx("unknown"), &quotes, "999999", 30, &today()).await;

        assert!(matches!(
            result,
            Err(TlError::NoData {
                code: "NO_PRICE_DATA",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_analyze_invalid_input() {
        let quotes = FakeQuotes::default();

        for (name, query, days) in [
            ("blank", "   ", 100),
            ("short", "005930", 29),
            ("long", "005930", 366),
        ] {
            let result = analyze_with(&krx(name), &quotes, query, days, &today()).await;
            assert!(matches!(result, Err(TlError::Invalid { .. })));
        }
        assert!(quotes.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_report_prompt() {
        let quotes = FakeQuotes::default();
        let analysis = analyze_with(&krx("report"), &quotes, "005930", 100, &today())
            .await
            .unwrap();
        let prompt = generate_report_with(&EchoGenerator, &analysis, "Korean")
            .await
            .unwrap();

        assert!(prompt.contains("'삼성전자' (005930)"));
        assert!(prompt.contains("[Last 30 trading days]"));
        assert!(prompt.contains("2024-06-28"));
    }

    #[tokio::test]
    async fn test_generate_report_failure_surfaced() {
        let quotes = FakeQuotes::default();
        let analysis = analyze_with(&krx("fail"), &quotes, "005930", 100, &today())
            .await
            .unwrap();
        let result = generate_report_with(&FailingGenerator, &analysis, "Korean").await;

        assert!(matches!(result, Err(TlError::Generation { .. })));
    }
}
