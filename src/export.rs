//! Writes expenses to a spreadsheet-compatible CSV file.

use crate::model::Expense;
use crate::{utils, Result};
use anyhow::Context;
use chrono::TimeZone;
use std::fmt::Display;
use std::path::Path;
use tracing::debug;

/// The header row. The column order is fixed.
pub const COLUMNS: [&str; 4] = ["Payer", "Amount", "Category", "Date"];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Writes one row per expense to `path`, replacing any file that is already there. Dates are
/// shown in `tz` and a missing date is left empty.
pub async fn export_table<Tz>(records: &[Expense], path: &Path, tz: &Tz) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let data = to_csv(records, tz)?;
    utils::write(path, data)
        .await
        .with_context(|| format!("Unable to export expenses to {}", path.display()))?;
    debug!("Exported {} expenses to {}", records.len(), path.display());
    Ok(())
}

fn to_csv<Tz>(records: &[Expense], tz: &Tz) -> Result<Vec<u8>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(COLUMNS)
        .context("Unable to write the header row")?;

    for expense in records {
        let date = expense
            .date()
            .map(|d| d.with_timezone(tz).format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        writer
            .write_record([
                expense.entered_by().name().to_string(),
                expense.amount().to_string(),
                expense.category().label().to_string(),
                date,
            ])
            .with_context(|| format!("Unable to write expense {}", expense.id()))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish the CSV data: {}", e.error()))
}
