//! Validate Command

use anyhow::Result;

use crate::commands::Selection;
use crate::output::{print_error, print_success};

/// Parse every suite and check each spec's invariants without fetching
/// anything. Returns whether all checks are valid.
pub fn execute(selection: Selection) -> Result<bool> {
    let checks = selection.load()?;

    let mut invalid = 0;
    for check in &checks {
        if let Err(reason) = check.validate() {
            invalid += 1;
            print_error(&format!("{}: {}", check.display_name(), reason));
        }
    }

    if invalid == 0 {
        print_success(&format!("{} check(s) valid", checks.len()));
        Ok(true)
    } else {
        print_error(&format!("{} of {} check(s) invalid", invalid, checks.len()));
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_invalid_checks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("suite.yaml"),
            r#"
name: site
checks:
  - target: https://example.test/
    expected_status: [200]
    expected_body_contains: [Example]
  - target: https://example.test/empty
    expected_body_contains: [Example]
"#,
        )
        .unwrap();

        let selection = Selection {
            paths: vec![dir.path().to_path_buf()],
            tag: None,
            name: None,
        };
        assert!(!execute(selection).unwrap());
    }
}
