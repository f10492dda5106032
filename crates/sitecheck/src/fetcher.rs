//! Fetcher capability: the I/O a check runner delegates to
//!
//! The runner never talks to the network itself. Callers pass a
//! [`Fetcher`] into every run; implementations decide how a raw HTTP
//! request or a browser navigation is actually performed.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::spec::CheckMode;

/// Per-request options derived from a check
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Upper bound for the whole request or navigation
    pub timeout: Duration,

    /// Follow 3xx responses instead of reporting them
    pub follow_redirects: bool,

    /// Selectors whose visibility the navigator should report
    pub probe_selectors: Vec<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            follow_redirects: true,
            probe_selectors: Vec::new(),
        }
    }
}

/// Raw HTTP response
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    pub latency_ms: u64,
}

/// Result of navigating a browser page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Selector -> whether it resolved to a visible element
    #[serde(default)]
    pub visibility: BTreeMap<String, bool>,
    pub latency_ms: u64,
}

/// Capability performing the actual network or browser I/O
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Whether checks of `mode` can be dispatched to this fetcher
    fn supports(&self, mode: CheckMode) -> bool;

    /// Time spent before the request itself starts, e.g. launching a
    /// browser. The runner adds it on top of the check timeout.
    fn startup_allowance(&self, _mode: CheckMode) -> Duration {
        Duration::ZERO
    }

    async fn fetch_http(
        &self,
        _url: &str,
        _options: &FetchOptions,
    ) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Unsupported(CheckMode::Http))
    }

    async fn navigate(
        &self,
        _url: &str,
        _options: &FetchOptions,
    ) -> Result<PageResponse, TransportError> {
        Err(TransportError::Unsupported(CheckMode::Ui))
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    fn supports(&self, mode: CheckMode) -> bool {
        (**self).supports(mode)
    }

    fn startup_allowance(&self, mode: CheckMode) -> Duration {
        (**self).startup_allowance(mode)
    }

    async fn fetch_http(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<HttpResponse, TransportError> {
        (**self).fetch_http(url, options).await
    }

    async fn navigate(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<PageResponse, TransportError> {
        (**self).navigate(url, options).await
    }
}

/// Routes HTTP checks and UI checks to separate fetchers
#[derive(Clone, Default)]
pub struct CompositeFetcher {
    http: Option<Arc<dyn Fetcher>>,
    ui: Option<Arc<dyn Fetcher>>,
}

impl CompositeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.http = Some(fetcher);
        self
    }

    pub fn with_ui(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.ui = Some(fetcher);
        self
    }

    fn route(&self, mode: CheckMode) -> Option<&Arc<dyn Fetcher>> {
        match mode {
            CheckMode::Http => self.http.as_ref(),
            CheckMode::Ui => self.ui.as_ref(),
        }
    }
}

#[async_trait]
impl Fetcher for CompositeFetcher {
    fn supports(&self, mode: CheckMode) -> bool {
        self.route(mode).map(|f| f.supports(mode)).unwrap_or(false)
    }

    fn startup_allowance(&self, mode: CheckMode) -> Duration {
        self.route(mode)
            .map(|f| f.startup_allowance(mode))
            .unwrap_or_default()
    }

    async fn fetch_http(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<HttpResponse, TransportError> {
        match &self.http {
            Some(fetcher) => fetcher.fetch_http(url, options).await,
            None => Err(TransportError::Unsupported(CheckMode::Http)),
        }
    }

    async fn navigate(
        &self,
        url: &str,
        options: &FetchOptions,
    ) -> Result<PageResponse, TransportError> {
        match &self.ui {
            Some(fetcher) => fetcher.navigate(url, options).await,
            None => Err(TransportError::Unsupported(CheckMode::Ui)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PageOnly;

    #[async_trait]
    impl Fetcher for PageOnly {
        fn supports(&self, mode: CheckMode) -> bool {
            mode == CheckMode::Ui
        }

        fn startup_allowance(&self, _mode: CheckMode) -> Duration {
            Duration::from_secs(5)
        }

        async fn navigate(
            &self,
            _url: &str,
            _options: &FetchOptions,
        ) -> Result<PageResponse, TransportError> {
            Ok(PageResponse {
                status: 200,
                body_text: "hello".to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_composite_routes_by_mode() {
        let fetcher = CompositeFetcher::new().with_ui(Arc::new(PageOnly));

        assert!(fetcher.supports(CheckMode::Ui));
        assert!(!fetcher.supports(CheckMode::Http));
        assert_eq!(fetcher.startup_allowance(CheckMode::Ui), Duration::from_secs(5));
        assert_eq!(fetcher.startup_allowance(CheckMode::Http), Duration::ZERO);

        let page = fetcher
            .navigate("https://example.test/", &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(page.body_text, "hello");

        let err = fetcher
            .fetch_http("https://example.test/", &FetchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Unsupported(CheckMode::Http));
    }
}
