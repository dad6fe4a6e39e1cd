//! Narrows a list of expenses down to one calendar month.

use crate::error::MalformedRecord;
use crate::model::Expense;
use chrono::{Datelike, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::warn;

/// Selects either every expense or the expenses of a single calendar month (1 to 12, any year).
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum MonthFilter {
    #[default]
    All,
    Month(u32),
}

impl MonthFilter {
    /// Creates a filter for `month`, which must be in `1..=12`.
    pub fn month(month: u32) -> Result<Self, String> {
        if (1..=12).contains(&month) {
            Ok(MonthFilter::Month(month))
        } else {
            Err(format!("Month must be between 1 and 12, got {month}"))
        }
    }

    /// The filter for the current calendar month in `tz`.
    pub fn current<Tz: TimeZone>(tz: &Tz) -> Self {
        MonthFilter::Month(Utc::now().with_timezone(tz).month())
    }
}

impl Display for MonthFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MonthFilter::All => write!(f, "all"),
            MonthFilter::Month(m) => write!(f, "{m}"),
        }
    }
}

impl FromStr for MonthFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(MonthFilter::All);
        }
        let month: u32 = s
            .parse()
            .map_err(|_| format!("Expected 'all' or a month number 1-12, got '{s}'"))?;
        MonthFilter::month(month)
    }
}

impl Serialize for MonthFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthFilter::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns the expenses that belong to `month`, in their original order.
///
/// Expenses without a usable date cannot be placed in a month. They are left out and a warning is
/// logged for each one.
pub fn filter_by_month<Tz: TimeZone>(
    records: &[Expense],
    month: MonthFilter,
    tz: &Tz,
) -> Vec<Expense> {
    filter_by_month_with(records, month, tz, |malformed| {
        warn!("Excluding expense from month filter: {malformed}")
    })
}

/// Same as `filter_by_month`, but each excluded malformed record is handed to `on_malformed`.
pub fn filter_by_month_with<Tz, F>(
    records: &[Expense],
    month: MonthFilter,
    tz: &Tz,
    mut on_malformed: F,
) -> Vec<Expense>
where
    Tz: TimeZone,
    F: FnMut(MalformedRecord),
{
    let wanted = match month {
        MonthFilter::All => return records.to_vec(),
        MonthFilter::Month(m) => m,
    };

    records
        .iter()
        .filter(|expense| match expense.date() {
            Some(date) => date.with_timezone(tz).month() == wanted,
            None => {
                on_malformed(MalformedRecord::new(
                    expense.id().as_str(),
                    "the expense has no valid date",
                ));
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Category, Payer};
    use chrono::FixedOffset;

    fn expense(id: &str, date: Option<&str>) -> Expense {
        Expense::new(
            id,
            Amount::from_units(1_000),
            Category::Food,
            Payer::Tai,
            date.map(|d| d.parse().unwrap()),
        )
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense("d", Some("2025-04-02T10:00:00Z")),
            expense("c", Some("2025-03-30T10:00:00Z")),
            expense("b", None),
            expense("a", Some("2024-03-01T10:00:00Z")),
        ]
    }

    fn ids(records: &[Expense]) -> Vec<&str> {
        records.iter().map(|e| e.id().as_str()).collect()
    }

    #[test]
    fn test_all_is_identity() {
        let records = sample();
        let filtered = filter_by_month(&records, MonthFilter::All, &Utc);
        assert_eq!(filtered, records);
    }

    #[test]
    fn test_month_keeps_matching_records_in_order() {
        let records = sample();
        let filtered = filter_by_month(&records, MonthFilter::Month(3), &Utc);
        assert_eq!(ids(&filtered), vec!["c", "a"]);
    }

    #[test]
    fn test_month_filter_is_idempotent() {
        let records = sample();
        let once = filter_by_month(&records, MonthFilter::Month(3), &Utc);
        let twice = filter_by_month(&once, MonthFilter::Month(3), &Utc);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_malformed_records_are_reported() {
        let records = sample();
        let mut reported = Vec::new();
        let filtered =
            filter_by_month_with(&records, MonthFilter::Month(4), &Utc, |m| reported.push(m));
        assert_eq!(ids(&filtered), vec!["d"]);
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].id, "b");
    }

    #[test]
    fn test_month_uses_timezone() {
        // 2025-03-31 20:00 UTC is already April 1st at UTC+7.
        let records = vec![expense("x", Some("2025-03-31T20:00:00Z"))];
        let plus_seven = FixedOffset::east_opt(7 * 3600).unwrap();
        assert_eq!(
            filter_by_month(&records, MonthFilter::Month(4), &plus_seven).len(),
            1
        );
        assert!(filter_by_month(&records, MonthFilter::Month(4), &Utc).is_empty());
    }

    #[test]
    fn test_month_filter_parse() {
        assert_eq!("all".parse::<MonthFilter>().unwrap(), MonthFilter::All);
        assert_eq!("ALL".parse::<MonthFilter>().unwrap(), MonthFilter::All);
        assert_eq!("12".parse::<MonthFilter>().unwrap(), MonthFilter::Month(12));
        assert!("0".parse::<MonthFilter>().is_err());
        assert!("13".parse::<MonthFilter>().is_err());
        assert!("march".parse::<MonthFilter>().is_err());
        assert_eq!(MonthFilter::Month(7).to_string(), "7");
    }
}
