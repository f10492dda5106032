//! Declarative check specification

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::assertion::Assertion;

/// How a check target is fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMode {
    /// Raw HTTP request, body is the response payload
    #[default]
    Http,
    /// Browser navigation, body is the rendered page text
    Ui,
}

impl CheckMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckMode::Http => "HTTP",
            CheckMode::Ui => "UI",
        }
    }
}

impl fmt::Display for CheckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declarative assertion unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckSpec {
    /// Unique name for this check
    #[serde(default)]
    pub name: String,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Tags for filtering checks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// URL to fetch or navigate to
    pub target: String,

    #[serde(default)]
    pub mode: CheckMode,

    /// Acceptable status codes (set membership, not a range)
    #[serde(default)]
    pub expected_status: BTreeSet<u16>,

    /// Header name -> required substring of its value. An empty substring
    /// only requires the header to be present.
    #[serde(default)]
    pub expected_headers: BTreeMap<String, String>,

    /// Substrings that must all appear in the decoded body
    #[serde(default)]
    pub expected_body_contains: Vec<String>,

    #[serde(default)]
    pub max_response_time_ms: Option<u64>,

    /// UI only: substring of the page title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_title_contains: Option<String>,

    /// UI only: selectors that must resolve to a visible element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expected_visible: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_body_bytes: Option<u64>,

    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,
}

fn default_follow_redirects() -> bool {
    true
}

impl CheckSpec {
    /// Start an HTTP check against `target`
    pub fn http(target: impl Into<String>) -> Self {
        Self::with_mode(target, CheckMode::Http)
    }

    /// Start a browser check against `target`
    pub fn ui(target: impl Into<String>) -> Self {
        Self::with_mode(target, CheckMode::Ui)
    }

    fn with_mode(target: impl Into<String>, mode: CheckMode) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            tags: Vec::new(),
            target: target.into(),
            mode,
            expected_status: BTreeSet::new(),
            expected_headers: BTreeMap::new(),
            expected_body_contains: Vec::new(),
            max_response_time_ms: None,
            expected_title_contains: None,
            expected_visible: Vec::new(),
            min_body_bytes: None,
            follow_redirects: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn status(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.expected_status.extend(codes);
        self
    }

    pub fn header(mut self, name: impl Into<String>, contains: impl Into<String>) -> Self {
        self.expected_headers.insert(name.into(), contains.into());
        self
    }

    pub fn body_contains(mut self, needle: impl Into<String>) -> Self {
        self.expected_body_contains.push(needle.into());
        self
    }

    pub fn max_response_time_ms(mut self, ms: u64) -> Self {
        self.max_response_time_ms = Some(ms);
        self
    }

    pub fn title_contains(mut self, needle: impl Into<String>) -> Self {
        self.expected_title_contains = Some(needle.into());
        self
    }

    pub fn visible(mut self, selector: impl Into<String>) -> Self {
        self.expected_visible.push(selector.into());
        self
    }

    pub fn min_body_bytes(mut self, bytes: u64) -> Self {
        self.min_body_bytes = Some(bytes);
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Name used in logs and reports; falls back to the target
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.target
        } else {
            &self.name
        }
    }

    /// Check the structural invariants. Returns the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.target.trim().is_empty() {
            return Err("target is empty".to_string());
        }
        match Url::parse(&self.target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => return Err(format!("target scheme '{}' is not http(s)", url.scheme())),
            Err(e) => return Err(format!("target '{}' is not an absolute URL: {}", self.target, e)),
        }

        if self.mode == CheckMode::Http && self.expected_status.is_empty() {
            return Err("expected_status must not be empty for HTTP checks".to_string());
        }

        if let Some(code) = self
            .expected_status
            .iter()
            .find(|code| !(100..=599).contains(*code))
        {
            return Err(format!("status code {} is out of range", code));
        }

        let asserts_something = !self.expected_headers.is_empty()
            || !self.expected_body_contains.is_empty()
            || self.max_response_time_ms.is_some()
            || self.expected_title_contains.is_some()
            || !self.expected_visible.is_empty()
            || self.min_body_bytes.is_some();
        if !asserts_something {
            return Err("check asserts nothing beyond status".to_string());
        }

        let mut seen = BTreeSet::new();
        for name in self.expected_headers.keys() {
            if name.trim().is_empty() {
                return Err("header name is empty".to_string());
            }
            if !seen.insert(name.to_ascii_lowercase()) {
                return Err(format!("header '{}' is listed more than once", name));
            }
        }

        if self.mode == CheckMode::Http {
            if self.expected_title_contains.is_some() {
                return Err("expected_title_contains requires mode: ui".to_string());
            }
            if !self.expected_visible.is_empty() {
                return Err("expected_visible requires mode: ui".to_string());
            }
        }

        if self.mode == CheckMode::Ui && !self.follow_redirects {
            return Err("follow_redirects: false requires mode: http".to_string());
        }

        Ok(())
    }

    /// Expand into assertions, in the order failures are reported:
    /// status, headers, body, latency.
    pub fn assertions(&self) -> Vec<Assertion> {
        let mut assertions = Vec::new();

        if !self.expected_status.is_empty() {
            assertions.push(Assertion::Status(self.expected_status.clone()));
        }

        for (name, contains) in &self.expected_headers {
            assertions.push(Assertion::Header {
                name: name.clone(),
                contains: contains.clone(),
            });
        }

        if let Some(title) = &self.expected_title_contains {
            assertions.push(Assertion::TitleContains(title.clone()));
        }
        for selector in &self.expected_visible {
            assertions.push(Assertion::Visible(selector.clone()));
        }
        for needle in &self.expected_body_contains {
            assertions.push(Assertion::BodyContains(needle.clone()));
        }
        if let Some(min) = self.min_body_bytes {
            assertions.push(Assertion::MinBodyBytes(min));
        }

        if let Some(max) = self.max_response_time_ms {
            assertions.push(Assertion::MaxLatencyMs(max));
        }

        assertions
    }
}
