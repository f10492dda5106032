//! Raw HTTP fetcher backed by reqwest

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{RunnerError, RunnerResult, TransportError};
use crate::fetcher::{FetchOptions, Fetcher, HttpResponse};
use crate::spec::CheckMode;

/// Fetches targets as plain HTTP GET requests. Supports HTTP checks only.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Client that follows redirects
    following: reqwest::Client,
    /// Client that reports 3xx responses as-is
    direct: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> RunnerResult<Self> {
        Ok(Self {
            following: Self::client(config, Policy::limited(config.max_redirects))?,
            direct: Self::client(config, Policy::none())?,
        })
    }

    fn client(config: &HttpConfig, policy: Policy) -> RunnerResult<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .redirect(policy)
            .build()
            .map_err(|e| RunnerError::InvalidConfig(format!("HTTP client: {}", e)))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn supports(&self, mode: CheckMode) -> bool {
        mode == CheckMode::Http
    }

    async fn fetch_http(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<HttpResponse, TransportError> {
        let client = if options.follow_redirects {
            &self.following
        } else {
            &self.direct
        };

        let classify = |e: reqwest::Error| transport_error(e, options.timeout);

        let start = Instant::now();
        let response = client
            .get(url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(classify)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        debug!("GET {} -> {} ({} bytes, {} ms)", url, status, body.len(), latency_ms);

        Ok(HttpResponse {
            status,
            headers,
            body,
            latency_ms,
        })
    }
}

/// Timeouts, whether sending or reading the body, report the check timeout
fn transport_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(timeout)
    } else {
        TransportError::from(err)
    }
}

/// Lowercased header names; repeated headers joined with ", "
fn collect_headers(map: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match headers.entry(name.as_str().to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, SET_COOKIE};

    #[test]
    fn test_collect_headers_joins_repeats() {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        map.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        map.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let headers = collect_headers(&map);
        assert_eq!(headers["content-type"], "text/html");
        assert_eq!(headers["set-cookie"], "a=1, b=2");
    }

    #[test]
    fn test_supports_http_only() {
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        assert!(fetcher.supports(CheckMode::Http));
        assert!(!fetcher.supports(CheckMode::Ui));
    }
}
