//! CLI Commands

pub mod list;
pub mod run;
pub mod validate;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use sitecheck::suite::{self, Suite};
use sitecheck::CheckSpec;

/// Which suites and checks a command operates on
#[derive(Args, Debug, Clone)]
pub struct Selection {
    /// Suite files or directories of `.yaml`/`.yml` suites
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Only checks carrying this tag
    #[arg(short, long)]
    pub tag: Option<String>,

    /// Only the check with this name
    #[arg(short, long)]
    pub name: Option<String>,
}

impl Selection {
    /// Load every suite and apply the tag/name filters, keeping file order
    pub fn load(&self) -> Result<Vec<CheckSpec>> {
        let mut suites = Vec::new();
        for path in &self.paths {
            if !path.exists() {
                bail!("Suite path not found: {}", path.display());
            }
            suites.extend(Suite::load_all(path)?);
        }

        let mut checks = suite::collect_checks(&suites);
        if let Some(tag) = &self.tag {
            checks = suite::filter_by_tag(checks, tag);
        }
        if let Some(name) = &self.name {
            checks = vec![suite::find_by_name(checks, name)?];
        }

        tracing::debug!("Selected {} check(s) from {} suite(s)", checks.len(), suites.len());
        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"
name: site
base_url: https://example.test
checks:
  - name: home
    target: /
    expected_status: [200]
    expected_body_contains: [Example]
    tags: [smoke]
  - name: docs
    target: /docs/intro
    expected_status: [200]
    expected_body_contains: [Installation]
"#;

    fn selection(dir: &std::path::Path) -> Selection {
        Selection {
            paths: vec![dir.to_path_buf()],
            tag: None,
            name: None,
        }
    }

    #[test]
    fn test_load_with_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.yaml"), SUITE).unwrap();

        let all = selection(dir.path()).load().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].target, "https://example.test/docs/intro");

        let mut tagged = selection(dir.path());
        tagged.tag = Some("smoke".to_string());
        assert_eq!(tagged.load().unwrap().len(), 1);

        let mut named = selection(dir.path());
        named.name = Some("docs".to_string());
        assert_eq!(named.load().unwrap()[0].name, "docs");

        named.name = Some("nope".to_string());
        assert!(named.load().is_err());
    }

    #[test]
    fn test_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = selection(&dir.path().join("absent")).load().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
