//! List Command

use anyhow::Result;

use crate::commands::Selection;
use crate::output::{print_list, CheckRow, OutputFormat};

pub fn execute(selection: Selection, format: OutputFormat) -> Result<()> {
    let checks = selection.load()?;
    let rows: Vec<CheckRow> = checks.iter().map(CheckRow::from).collect();
    print_list(&rows, format);
    Ok(())
}
