//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use sitecheck::{CheckResult, CheckSpec, Report};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No checks found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Row for one check definition
#[derive(Serialize)]
pub struct CheckRow {
    pub name: String,
    pub mode: String,
    pub target: String,
    pub tags: Vec<String>,
    pub assertions: usize,
}

impl From<&CheckSpec> for CheckRow {
    fn from(spec: &CheckSpec) -> Self {
        Self {
            name: spec.display_name().to_string(),
            mode: spec.mode.to_string(),
            target: spec.target.clone(),
            tags: spec.tags.clone(),
            assertions: spec.assertions().len(),
        }
    }
}

impl TableDisplay for CheckRow {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Mode", "Target", "Tags", "Assertions"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.mode.clone(),
            self.target.clone(),
            self.tags.join(", "),
            self.assertions.to_string(),
        ]
    }
}

/// Row for one executed check
#[derive(Serialize)]
pub struct ResultRow {
    pub name: String,
    pub mode: String,
    pub result: String,
    pub status: String,
    pub latency: String,
    pub failures: Vec<String>,
}

impl From<&CheckResult> for ResultRow {
    fn from(result: &CheckResult) -> Self {
        let outcome = if result.skipped {
            "SKIP"
        } else if result.passed {
            "PASS"
        } else {
            "FAIL"
        };

        Self {
            name: result.name().to_string(),
            mode: result.spec.mode.to_string(),
            result: outcome.to_string(),
            status: result
                .observed_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            latency: result
                .observed_latency_ms
                .map(|ms| format!("{} ms", ms))
                .unwrap_or_else(|| "-".to_string()),
            failures: if result.skipped {
                Vec::new()
            } else {
                result.failures.clone()
            },
        }
    }
}

impl TableDisplay for ResultRow {
    fn headers() -> Vec<&'static str> {
        vec!["Check", "Mode", "Result", "Status", "Latency", "Failures"]
    }

    fn row(&self) -> Vec<String> {
        let result = match self.result.as_str() {
            "PASS" => self.result.green().to_string(),
            "FAIL" => self.result.red().to_string(),
            _ => self.result.yellow().to_string(),
        };

        vec![
            self.name.clone(),
            self.mode.clone(),
            result,
            self.status.clone(),
            self.latency.clone(),
            self.failures.join("\n"),
        ]
    }
}

/// Print a report in the requested format
pub fn print_report(report: &Report, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(report).unwrap_or_default());
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let rows: Vec<ResultRow> = report.results.iter().map(ResultRow::from).collect();
            print_list(&rows, format);
            println!();
            println!("{}", summary_line(report));
        }
    }
}

/// One-line summary, colored by outcome
pub fn summary_line(report: &Report) -> String {
    let summary = &report.summary;
    let line = format!(
        "{} checks: {} passed, {} failed, {} skipped ({} ms)",
        summary.total, summary.passed, summary.failed, summary.skipped, summary.duration_ms
    );

    if report.cancelled {
        format!("{} {}", line.yellow(), "(cancelled)".yellow())
    } else if report.passed() {
        line.green().to_string()
    } else {
        line.red().to_string()
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
