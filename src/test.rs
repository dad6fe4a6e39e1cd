//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::model::{Amount, Category, ExpenseId, NewExpense, Payer};
use crate::Config;
use chrono::{DateTime, Utc};
use std::path::Path;
use tempfile::TempDir;

/// Test environment that sets up an expenses home directory with Config and database.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with Config and initialized database.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("expenses");
        let config = Config::create(&root, None, None).await.unwrap();
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    pub fn home(&self) -> &Path {
        self.config.root()
    }

    /// Inserts an expense with a fixed `date`, bypassing the controller and its notifications.
    pub async fn insert_expense(
        &self,
        units: u64,
        category: Category,
        payer: Payer,
        date: &str,
    ) -> ExpenseId {
        let date: DateTime<Utc> = date.parse().unwrap();
        let new = NewExpense {
            amount: Amount::from_units(units),
            category,
            entered_by: payer,
        };
        self.config.db().create_at(&new, date).await.unwrap()
    }

    /// Inserts the three expenses of the worked example: two in March 2025, one in April 2025.
    pub async fn insert_example(&self) -> Vec<ExpenseId> {
        vec![
            self.insert_expense(100_000, Category::Food, Payer::Tai, "2025-03-05T09:00:00Z")
                .await,
            self.insert_expense(50_000, Category::Bills, Payer::Thach, "2025-03-12T09:00:00Z")
                .await,
            self.insert_expense(20_000, Category::Food, Payer::Tai, "2025-04-10T09:00:00Z")
                .await,
        ]
    }
}
