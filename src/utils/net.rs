use std::{collections::HashMap, time::Duration};

use log::debug;
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{Jitter, RetryTransientMiddleware, policies::ExponentialBackoff};
use url::Url;

use crate::error::{TlError, TlResult};

pub async fn http_get(
    url: &str,
    path: Option<&str>,
    query: &HashMap<String, String>,
    headers: &HashMap<String, String>,
    timeout_secs: u64,
    max_retries: u32,
) -> TlResult<Vec<u8>> {
    let request_url = if let Some(path) = path {
        &join_url(url, path)?
    } else {
        url
    };

    let client = build_client(timeout_secs, max_retries);
    let mut request_builder = client
        .request(Method::GET, request_url)
        .timeout(Duration::from_secs(timeout_secs))
        .query(query);
    for (k, v) in headers {
        request_builder = request_builder.header(k, v);
    }

    let response = request_builder.send().await?;
    if response.status().is_success() {
        Ok(response.bytes().await?.to_vec())
    } else {
        Err(status_error(response, &format!("GET {request_url}")).await)
    }
}

pub async fn http_post(
    url: &str,
    path: Option<&str>,
    body: &serde_json::Value,
    headers: &HashMap<String, String>,
    timeout_secs: u64,
    max_retries: u32,
) -> TlResult<Vec<u8>> {
    let request_url = if let Some(path) = path {
        &join_url(url, path)?
    } else {
        url
    };

    let client = build_client(timeout_secs, max_retries);
    let mut request_builder = client
        .request(Method::POST, request_url)
        .timeout(Duration::from_secs(timeout_secs))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_vec(body)?);
    for (k, v) in headers {
        request_builder = request_builder.header(k, v);
    }

    let response = request_builder.send().await?;
    if response.status().is_success() {
        Ok(response.bytes().await?.to_vec())
    } else {
        Err(status_error(response, &format!("POST {request_url}")).await)
    }
}

/// Keeps the response body, services explain rejected requests there.
async fn status_error(response: reqwest::Response, request: &str) -> TlError {
    let status = response.status().to_string();
    let body = response.text().await.unwrap_or_default();
    debug!("[HTTP Status Error] [{request}] {status} {body}");

    TlError::HttpStatusError {
        status,
        request: request.to_string(),
        body,
    }
}

pub fn join_url(base_url: &str, extend_url: &str) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base_url)?;

    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(extend_url.split('/').filter(|s| !s.is_empty()));

    Ok(url.to_string())
}

fn build_client(timeout_secs: u64, max_retries: u32) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(
            Duration::from_millis(500),
            Duration::from_secs(timeout_secs.max(1)),
        )
        .jitter(Jitter::Bounded)
        .base(2)
        .build_with_max_retries(max_retries);

    ClientBuilder::new(reqwest::Client::new())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}
