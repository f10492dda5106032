//! The bundled suites parse and validate

use std::path::PathBuf;

use sitecheck::{CheckMode, Suite};

fn suites_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../suites")
}

#[test]
fn bundled_suites_are_valid() {
    let suites = Suite::load_all(&suites_dir()).unwrap();
    assert!(!suites.is_empty());

    for suite in &suites {
        for check in &suite.checks {
            if let Err(reason) = check.validate() {
                panic!("{} / {}: {}", suite.name, check.display_name(), reason);
            }
        }
    }
}

#[test]
fn website_suite_resolves_targets() {
    let suite = Suite::from_file(&suites_dir().join("playwright-dev.yaml")).unwrap();

    let home = suite.checks.iter().find(|c| c.name == "homepage").unwrap();
    assert_eq!(home.target, "https://playwright.dev/");
    assert!(home.tags.contains(&"website".to_string()));

    let redirect = suite.checks.iter().find(|c| c.name == "docs-redirect").unwrap();
    assert!(!redirect.follow_redirects);

    assert!(suite.checks.iter().any(|c| c.mode == CheckMode::Ui));
}
