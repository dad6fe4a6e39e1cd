//! Builds the plain-text messages sent to the chat channel.

use crate::aggregate::MonthYear;
use crate::model::{Amount, Category, Expense, Payer};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Day first, the way the two people using this read dates.
pub const TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

const NO_DATE: &str = "(no date)";

/// Sent after an expense has been recorded.
pub fn created<Tz>(
    payer: Payer,
    amount: Amount,
    category: Category,
    now: DateTime<Utc>,
    tz: &Tz,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    [
        "🆕 New expense".to_string(),
        payer_line(payer),
        format!("💰 Amount: {amount} đ"),
        category_line(category),
        format!("🕒 Time: {}", format_time(&now, tz)),
    ]
    .join("\n")
}

/// Sent after an expense has been edited. `before` is the expense as it was before the edit and
/// `after` is what it became.
pub fn edited<Tz>(before: &Expense, after: &Expense, now: DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    [
        "✏️ Expense edited".to_string(),
        payer_line(after.entered_by()),
        format!(
            "💰 Amount: {} đ ➡️ {} đ",
            before.amount(),
            after.amount()
        ),
        category_line(after.category()),
        format!("🕒 Time: {}", format_time(&now, tz)),
    ]
    .join("\n")
}

/// Sent after an expense has been deleted, describing the expense as it was.
pub fn deleted<Tz>(expense: &Expense, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = match expense.date() {
        Some(date) => format_time(&date, tz),
        None => NO_DATE.to_string(),
    };
    [
        "🗑️ Expense deleted".to_string(),
        payer_line(expense.entered_by()),
        format!("💰 Amount: {} đ", expense.amount()),
        category_line(expense.category()),
        format!("📅 Date: {date}"),
    ]
    .join("\n")
}

/// One line per month, in the iteration order of `totals`.
pub fn monthly_summary(totals: &BTreeMap<MonthYear, Amount>) -> String {
    let mut lines = vec!["📊 Monthly totals".to_string()];
    lines.extend(
        totals
            .iter()
            .map(|(month, amount)| format!("📅 {month}: {amount} đ")),
    );
    lines.join("\n")
}

fn payer_line(payer: Payer) -> String {
    format!("👤 Payer: {}", payer.name())
}

fn category_line(category: Category) -> String {
    format!("🏷️ Category: {} {}", category.emoji(), category.label())
}

fn format_time<Tz>(date: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    date.with_timezone(tz).format(TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn expense(units: u64, category: Category, date: Option<&str>) -> Expense {
        Expense::new(
            "e1",
            Amount::from_units(units),
            category,
            Payer::Thach,
            date.map(at),
        )
    }

    #[test]
    fn test_created() {
        let text = created(
            Payer::Tai,
            Amount::from_units(100_000),
            Category::Food,
            at("2025-03-05T09:30:00Z"),
            &Utc,
        );
        assert_eq!(
            text,
            "🆕 New expense\n\
             👤 Payer: Tài\n\
             💰 Amount: 100.000 đ\n\
             🏷️ Category: 🍔 Food\n\
             🕒 Time: 05/03/2025 09:30"
        );
    }

    #[test]
    fn test_edited_has_old_and_new_amounts() {
        let before = expense(100_000, Category::Food, Some("2025-03-01T00:00:00Z"));
        let after = Expense::new(
            "e1",
            Amount::from_units(120_000),
            Category::Shopping,
            Payer::Thach,
            before.date(),
        );
        let text = edited(&before, &after, at("2025-03-06T10:00:00Z"), &Utc);
        assert!(text.contains("100.000 đ ➡️ 120.000 đ"));
        assert!(text.contains("👤 Payer: Thạch"));
        assert!(text.contains("Shopping"));
        assert!(text.contains("06/03/2025 10:00"));
    }

    #[test]
    fn test_deleted_uses_original_date() {
        let text = deleted(
            &expense(50_000, Category::Bills, Some("2025-03-12T09:00:00Z")),
            &Utc,
        );
        assert!(text.starts_with("🗑️ Expense deleted"));
        assert!(text.contains("💰 Amount: 50.000 đ"));
        assert!(text.ends_with("📅 Date: 12/03/2025 09:00"));
    }

    #[test]
    fn test_deleted_without_date() {
        let text = deleted(&expense(1, Category::Other, None), &Utc);
        assert!(text.ends_with("📅 Date: (no date)"));
    }

    #[test]
    fn test_monthly_summary_in_map_order() {
        let mut totals = BTreeMap::new();
        totals.insert(MonthYear::new(4, 2025), Amount::from_units(20_000));
        totals.insert(MonthYear::new(3, 2025), Amount::from_units(150_000));
        totals.insert(MonthYear::new(12, 2024), Amount::from_units(5));
        assert_eq!(
            monthly_summary(&totals),
            "📊 Monthly totals\n\
             📅 12-2024: 5 đ\n\
             📅 3-2025: 150.000 đ\n\
             📅 4-2025: 20.000 đ"
        );
    }

    #[test]
    fn test_monthly_summary_empty() {
        assert_eq!(monthly_summary(&BTreeMap::new()), "📊 Monthly totals");
    }
}
