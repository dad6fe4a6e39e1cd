use crate::model::{Amount, Category, Payer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The store-assigned identifier of an expense.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh identifier for a new expense.
    pub(crate) fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ExpenseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpenseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A recorded expense.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Expense {
    id: ExpenseId,
    amount: Amount,
    category: Category,
    entered_by: Payer,
    /// Assigned by the store when the expense is created. `None` when the stored value is missing
    /// or could not be parsed.
    date: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn new(
        id: impl Into<ExpenseId>,
        amount: Amount,
        category: Category,
        entered_by: Payer,
        date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            category,
            entered_by,
            date,
        }
    }

    pub fn id(&self) -> &ExpenseId {
        &self.id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn entered_by(&self) -> Payer {
        self.entered_by
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

/// The fields a person provides when recording an expense. The store assigns the rest.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Amount,
    pub category: Category,
    pub entered_by: Payer,
}

/// The fields that may change when an expense is edited. The payer and date never change.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none() && self.category.is_none()
    }

    /// Returns `expense` with this update applied.
    pub fn apply(&self, expense: &Expense) -> Expense {
        let mut updated = expense.clone();
        if let Some(amount) = self.amount {
            updated.amount = amount;
        }
        if let Some(category) = self.category {
            updated.category = category;
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ExpenseId::generate();
        let b = ExpenseId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_update_apply_keeps_payer_and_date() {
        let date = Utc::now();
        let expense = Expense::new(
            "e1",
            Amount::from_units(100_000),
            Category::Food,
            Payer::Thach,
            Some(date),
        );
        let update = ExpenseUpdate {
            amount: Some(Amount::from_units(120_000)),
            category: None,
        };
        let updated = update.apply(&expense);
        assert_eq!(updated.id(), expense.id());
        assert_eq!(updated.amount(), Amount::from_units(120_000));
        assert_eq!(updated.category(), Category::Food);
        assert_eq!(updated.entered_by(), Payer::Thach);
        assert_eq!(updated.date(), Some(date));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ExpenseUpdate::default().is_empty());
        let update = ExpenseUpdate {
            amount: None,
            category: Some(Category::Bills),
        };
        assert!(!update.is_empty());
    }
}
