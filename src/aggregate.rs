//! Totals, the 50/50 split and the settlement between the two payers.
//!
//! Every function here is a pure reduction over a slice of expenses. None of them depend on the
//! order of the slice.

use crate::error::MalformedRecord;
use crate::model::{Amount, Category, Expense, Payer};
use chrono::{Datelike, TimeZone};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use tracing::warn;

/// The sum of all amounts. Zero for an empty slice.
pub fn total(records: &[Expense]) -> Amount {
    records.iter().map(Expense::amount).sum()
}

/// What each person owes under a 50/50 split: exactly half the total, fractions included.
pub fn split_amount(records: &[Expense]) -> Amount {
    total(records).half()
}

/// The amount each payer has paid. Both payers are always present, with zero if they paid nothing.
pub fn per_user_totals(records: &[Expense]) -> BTreeMap<Payer, Amount> {
    let mut totals: BTreeMap<Payer, Amount> =
        Payer::ALL.iter().map(|p| (*p, Amount::ZERO)).collect();
    for expense in records {
        *totals.entry(expense.entered_by()).or_default() += expense.amount();
    }
    totals
}

/// The amount spent per category. Only categories that appear in `records` are present.
pub fn per_category_totals(records: &[Expense]) -> BTreeMap<Category, Amount> {
    let mut totals = BTreeMap::new();
    for expense in records {
        *totals.entry(expense.category()).or_insert(Amount::ZERO) += expense.amount();
    }
    totals
}

/// The transfer needed to even out what the two payers have contributed.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Settlement {
    /// Both payers contributed the same amount.
    Even,
    /// `from` contributed less and owes `amount` to `to`.
    Transfer {
        from: Payer,
        to: Payer,
        amount: Amount,
    },
}

impl Display for Settlement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Settlement::Even => write!(f, "Nobody owes anything"),
            Settlement::Transfer { from, to, amount } => {
                write!(f, "{} owes {} {amount} đ", from.name(), to.name())
            }
        }
    }
}

/// Computes the settlement given each payer's total and the split amount.
///
/// The payer who contributed more is owed `max(totals) - split`.
pub fn settlement(user_totals: &BTreeMap<Payer, Amount>, split: Amount) -> Settlement {
    let paid = |p: Payer| user_totals.get(&p).copied().unwrap_or_default();
    let tai = paid(Payer::Tai);
    let thach = paid(Payer::Thach);

    if tai == thach {
        return Settlement::Even;
    }

    let (creditor, higher) = if tai > thach {
        (Payer::Tai, tai)
    } else {
        (Payer::Thach, thach)
    };

    Settlement::Transfer {
        from: creditor.other(),
        to: creditor,
        amount: higher.difference(split),
    }
}

/// A calendar month of a specific year.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MonthYear {
    // Field order matters for the derived ordering: chronological.
    year: i32,
    month: u32,
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        Self { year, month }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

impl Display for MonthYear {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.month, self.year)
    }
}

impl Serialize for MonthYear {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Totals per month and year over every expense, regardless of any month filter. Expenses
/// without a date are skipped with a warning.
pub fn monthly_totals<Tz: TimeZone>(records: &[Expense], tz: &Tz) -> BTreeMap<MonthYear, Amount> {
    let mut totals = BTreeMap::new();
    for expense in records {
        let Some(date) = expense.date() else {
            let malformed = MalformedRecord::new(expense.id().as_str(), "the expense has no date");
            warn!("Skipping expense in monthly totals: {malformed}");
            continue;
        };
        let local = date.with_timezone(tz);
        let key = MonthYear::new(local.month(), local.year());
        *totals.entry(key).or_insert(Amount::ZERO) += expense.amount();
    }
    totals
}

/// Everything derived from one filtered set of expenses.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub total: Amount,
    pub split: Amount,
    pub per_user: BTreeMap<Payer, Amount>,
    pub settlement: Settlement,
    pub per_category: BTreeMap<Category, Amount>,
}

impl Summary {
    pub fn compute(records: &[Expense]) -> Self {
        let total = total(records);
        let split = total.half();
        let per_user = per_user_totals(records);
        let settlement = settlement(&per_user, split);
        Self {
            count: records.len(),
            total,
            split,
            per_user,
            settlement,
            per_category: per_category_totals(records),
        }
    }
}

impl Default for Summary {
    fn default() -> Self {
        Summary::compute(&[])
    }
}
