//! Plain-text rendering of expenses and summaries for the terminal.

use crate::aggregate::{Settlement, Summary};
use crate::controller::ViewState;
use crate::filter::MonthFilter;
use crate::model::{Expense, Payer};
use chrono::TimeZone;
use std::fmt::Display;

const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// One line per expense: date, payer, amount, category and id.
pub(super) fn expense_lines<Tz>(records: &[Expense], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if records.is_empty() {
        return "No expenses".to_string();
    }
    records
        .iter()
        .map(|e| {
            let date = e
                .date()
                .map(|d| d.with_timezone(tz).format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| "-".repeat(16));
            format!(
                "{date}  {:<6} {:>14} đ  {} {:<13}  {}",
                e.entered_by().name(),
                e.amount().to_string(),
                e.category().emoji(),
                e.category().label(),
                e.id()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The heading for a month selection.
pub(super) fn month_heading(month: MonthFilter) -> String {
    match month {
        MonthFilter::All => "All months".to_string(),
        MonthFilter::Month(m) => format!("Month {m}"),
    }
}

/// The totals and category panels, as selected in `view`.
pub(super) fn summary_text(summary: &Summary, view: &ViewState) -> String {
    let mut lines = vec![format!(
        "{} ({} expense{})",
        month_heading(view.month),
        summary.count,
        if summary.count == 1 { "" } else { "s" }
    )];

    if view.show_totals {
        lines.push(format!("💰 Total: {} đ", summary.total));
        lines.push(format!("➗ Each pays: {} đ", summary.split));
        for payer in Payer::ALL {
            let paid = summary.per_user.get(&payer).copied().unwrap_or_default();
            lines.push(format!("👤 {} paid: {paid} đ", payer.name()));
        }
        match summary.settlement {
            Settlement::Even => lines.push("👉 Even, nobody owes anything".to_string()),
            settlement => lines.push(format!("👉 {settlement}")),
        }
    }

    if view.show_categories {
        lines.push("📂 By category:".to_string());
        if summary.per_category.is_empty() {
            lines.push("  (none)".to_string());
        }
        for (category, amount) in &summary.per_category {
            lines.push(format!(
                "  {} {}: {amount} đ",
                category.emoji(),
                category.label()
            ));
        }
    }

    lines.join("\n")
}
