//! sitecheck: declarative endpoint and page checks
//!
//! This crate runs declarative checks against live or mocked targets:
//! - Parses check suites from YAML
//! - Dispatches each check to an injected fetcher (raw HTTP or browser page)
//! - Evaluates every assertion and collects all failures per check
//! - Aggregates results into an ordered, serializable report
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Check Runner (Rust)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CheckRunner                                                │
//! │    ├── validate(specs, fetcher)       config errors only    │
//! │    ├── run(specs, fetcher) -> Report  bounded parallelism   │
//! │    └── run_check(spec, fetcher) -> CheckResult              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (injected)                                         │
//! │    ├── HttpFetcher        reqwest, HTTP mode                │
//! │    ├── PlaywrightFetcher  node + playwright, both modes     │
//! │    └── CompositeFetcher   route by mode                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CheckSpec (YAML)                                           │
//! │    ├── target, mode: http | ui                              │
//! │    ├── expected_status, expected_headers                    │
//! │    ├── expected_body_contains, min_body_bytes               │
//! │    ├── expected_title_contains, expected_visible (ui)       │
//! │    └── max_response_time_ms                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assertion;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod spec;
pub mod suite;

pub use assertion::{Assertion, Observation};
pub use config::SiteCheckConfig;
pub use error::{RunnerError, RunnerResult, TransportError};
pub use fetcher::{CompositeFetcher, FetchOptions, Fetcher, HttpResponse, PageResponse};
pub use report::{CheckResult, Report, Summary};
pub use runner::{run, CheckRunner};
pub use spec::{CheckMode, CheckSpec};
pub use suite::Suite;
