//! YAML check suites

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};
use crate::spec::CheckSpec;

/// A group of checks parsed from one YAML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    /// Unique name for this suite
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Prefix for targets that start with `/`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Values applied to checks that do not set them
    #[serde(default)]
    pub defaults: SuiteDefaults,

    pub checks: Vec<CheckSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteDefaults {
    #[serde(default)]
    pub max_response_time_ms: Option<u64>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Suite {
    /// Parse a suite from YAML string
    pub fn from_yaml(yaml: &str) -> RunnerResult<Self> {
        let mut suite: Suite = serde_yaml::from_str(yaml)?;
        suite.resolve();
        Ok(suite)
    }

    /// Parse a suite from a YAML file
    pub fn from_file(path: &Path) -> RunnerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| RunnerError::SuiteParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load a single file, or every `.yaml`/`.yml` under a directory in
    /// path order
    pub fn load_all(path: &Path) -> RunnerResult<Vec<Self>> {
        if path.is_file() {
            return Ok(vec![Self::from_file(path)?]);
        }

        let mut entries: Vec<_> = walkdir::WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        entries.sort();

        entries.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Apply base URL, defaults, and fallback names to every check
    fn resolve(&mut self) {
        for (i, check) in self.checks.iter_mut().enumerate() {
            if check.target.starts_with('/') {
                if let Some(base) = &self.base_url {
                    check.target = format!("{}{}", base.trim_end_matches('/'), check.target);
                }
            }
            if check.max_response_time_ms.is_none() {
                check.max_response_time_ms = self.defaults.max_response_time_ms;
            }
            for tag in &self.defaults.tags {
                if !check.tags.contains(tag) {
                    check.tags.push(tag.clone());
                }
            }
            if check.name.is_empty() {
                check.name = format!("{}#{}", self.name, i + 1);
            }
        }
    }
}

/// Flatten suites into one ordered check list
pub fn collect_checks(suites: &[Suite]) -> Vec<CheckSpec> {
    suites.iter().flat_map(|s| s.checks.iter().cloned()).collect()
}

/// Filter checks by tag
pub fn filter_by_tag(checks: Vec<CheckSpec>, tag: &str) -> Vec<CheckSpec> {
    checks
        .into_iter()
        .filter(|c| c.tags.iter().any(|t| t == tag))
        .collect()
}

/// Find a check by name
pub fn find_by_name(checks: Vec<CheckSpec>, name: &str) -> RunnerResult<CheckSpec> {
    checks
        .into_iter()
        .find(|c| c.name == name)
        .ok_or_else(|| RunnerError::CheckNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::CheckMode;

    const SUITE: &str = r#"
name: website
description: Public website smoke checks
base_url: https://example.test/
defaults:
  max_response_time_ms: 10000
  tags: [smoke]
checks:
  - name: homepage
    target: /
    expected_status: [200]
    expected_headers:
      content-type: text/html
    expected_body_contains: [Example]
  - target: https://cdn.example.test/logo.svg
    expected_status: [200]
    expected_body_contains: ["<svg", "</svg>"]
    max_response_time_ms: 500
    tags: [assets]
  - name: title
    target: /
    mode: ui
    expected_title_contains: Example
"#;

    #[test]
    fn test_parse_suite_resolves_checks() {
        let suite = Suite::from_yaml(SUITE).unwrap();
        assert_eq!(suite.checks.len(), 3);

        let home = &suite.checks[0];
        assert_eq!(home.target, "https://example.test/");
        assert_eq!(home.max_response_time_ms, Some(10_000));
        assert_eq!(home.tags, vec!["smoke".to_string()]);

        let logo = &suite.checks[1];
        assert_eq!(logo.name, "website#2");
        assert_eq!(logo.target, "https://cdn.example.test/logo.svg");
        assert_eq!(logo.max_response_time_ms, Some(500));
        assert_eq!(logo.tags, vec!["assets".to_string(), "smoke".to_string()]);

        assert_eq!(suite.checks[2].mode, CheckMode::Ui);
    }

    #[test]
    fn test_relative_target_without_base_url_is_invalid() {
        let yaml = r#"
name: nobase
checks:
  - target: /docs/intro
    expected_status: [200]
    expected_body_contains: [Installation]
"#;
        let suite = Suite::from_yaml(yaml).unwrap();
        assert_eq!(suite.checks[0].target, "/docs/intro");
        assert!(suite.checks[0].validate().unwrap_err().contains("absolute URL"));

        let resolved = Suite::from_yaml(SUITE).unwrap();
        assert!(resolved.checks.iter().all(|c| c.validate().is_ok()));
    }

    #[test]
    fn test_filters() {
        let checks = Suite::from_yaml(SUITE).unwrap().checks;
        assert_eq!(filter_by_tag(checks.clone(), "assets").len(), 1);
        assert_eq!(filter_by_tag(checks.clone(), "smoke").len(), 3);
        assert_eq!(find_by_name(checks.clone(), "title").unwrap().mode, CheckMode::Ui);
        assert!(matches!(
            find_by_name(checks, "missing"),
            Err(RunnerError::CheckNotFound(_))
        ));
    }

    #[test]
    fn test_load_all_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.yaml"), SUITE.replace("website", "second")).unwrap();
        std::fs::write(dir.path().join("a.yml"), SUITE).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let suites = Suite::load_all(dir.path()).unwrap();
        let names: Vec<&str> = suites.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["website", "second"]);
        assert_eq!(collect_checks(&suites).len(), 6);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "name: x\nchecks: 3\n").unwrap();

        match Suite::from_file(&path) {
            Err(RunnerError::SuiteParse { path: p, .. }) => assert!(p.ends_with("broken.yaml")),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
