//! Assertion variants and their evaluation against an observed response

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::fetcher::{HttpResponse, PageResponse};

/// A single expectation derived from a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Assertion {
    /// Status must be one of the listed codes
    Status(BTreeSet<u16>),

    /// Header must exist (name matched case-insensitively) and its value
    /// must contain `contains`
    Header { name: String, contains: String },

    TitleContains(String),

    Visible(String),

    BodyContains(String),

    MinBodyBytes(u64),

    MaxLatencyMs(u64),
}

/// What a fetcher observed, normalized across modes
#[derive(Debug, Clone, Default)]
pub struct Observation {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Decoded text; assertions never look at raw bytes
    pub body: String,
    pub body_bytes: u64,
    pub title: Option<String>,
    pub visibility: BTreeMap<String, bool>,
    pub latency_ms: u64,
}

impl From<HttpResponse> for Observation {
    fn from(response: HttpResponse) -> Self {
        Self {
            status: response.status,
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len() as u64,
            headers: response.headers,
            title: None,
            visibility: BTreeMap::new(),
            latency_ms: response.latency_ms,
        }
    }
}

impl From<PageResponse> for Observation {
    fn from(page: PageResponse) -> Self {
        Self {
            status: page.status,
            body_bytes: page.body_text.len() as u64,
            body: page.body_text,
            headers: page.headers,
            title: page.title,
            visibility: page.visibility,
            latency_ms: page.latency_ms,
        }
    }
}

impl Observation {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl Assertion {
    /// Short category label
    pub fn kind(&self) -> &'static str {
        match self {
            Assertion::Status(_) => "status",
            Assertion::Header { .. } => "header",
            Assertion::TitleContains(_)
            | Assertion::Visible(_)
            | Assertion::BodyContains(_)
            | Assertion::MinBodyBytes(_) => "body",
            Assertion::MaxLatencyMs(_) => "latency",
        }
    }

    /// Evaluate against an observation. Returns the failure reason, or
    /// `None` when the assertion holds.
    pub fn evaluate(&self, observed: &Observation) -> Option<String> {
        match self {
            Assertion::Status(expected) => {
                if expected.contains(&observed.status) {
                    None
                } else {
                    Some(format!(
                        "status {} not in {}",
                        observed.status,
                        format_status_set(expected)
                    ))
                }
            }
            Assertion::Header { name, contains } => match observed.header(name) {
                None => Some(format!("header '{}' missing", name)),
                Some(value) if value.contains(contains.as_str()) => None,
                Some(value) => Some(format!(
                    "header '{}' value '{}' does not contain '{}'",
                    name, value, contains
                )),
            },
            Assertion::TitleContains(needle) => match &observed.title {
                Some(title) if title.contains(needle.as_str()) => None,
                Some(title) => Some(format!("title '{}' does not contain '{}'", title, needle)),
                None => Some(format!("title missing, expected it to contain '{}'", needle)),
            },
            Assertion::Visible(selector) => {
                if observed.visibility.get(selector).copied().unwrap_or(false) {
                    None
                } else {
                    Some(format!("element '{}' not visible", selector))
                }
            }
            Assertion::BodyContains(needle) => {
                if observed.body.contains(needle.as_str()) {
                    None
                } else {
                    Some(format!("body does not contain '{}'", needle))
                }
            }
            Assertion::MinBodyBytes(min) => {
                if observed.body_bytes >= *min {
                    None
                } else {
                    Some(format!(
                        "body size {} bytes below minimum {}",
                        observed.body_bytes, min
                    ))
                }
            }
            Assertion::MaxLatencyMs(max) => {
                if observed.latency_ms <= *max {
                    None
                } else {
                    Some(format!(
                        "latency {} ms exceeds {} ms",
                        observed.latency_ms, max
                    ))
                }
            }
        }
    }
}

/// Evaluate every assertion and collect all failures, in order
pub fn evaluate_all(assertions: &[Assertion], observed: &Observation) -> Vec<String> {
    assertions
        .iter()
        .filter_map(|assertion| assertion.evaluate(observed))
        .collect()
}

fn format_status_set(codes: &BTreeSet<u16>) -> String {
    let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    format!("{{{}}}", codes.join(", "))
}
