//! Holds the view state and the latest snapshot of the store, and turns user actions into store
//! mutations followed by notifications.
//!
//! The controller never changes its record set on its own. Records only ever come from store
//! snapshots, so a failed mutation leaves nothing to roll back.

use crate::aggregate::{monthly_totals, MonthYear, Summary};
use crate::db::{Db, Subscription};
use crate::error::StoreError;
use crate::export::export_table;
use crate::filter::{filter_by_month, MonthFilter};
use crate::model::{Amount, Category, Expense, ExpenseId, ExpenseUpdate, NewExpense, Payer};
use crate::notify::{message, Notifications};
use crate::{Config, Result};
use anyhow::bail;
use chrono::{Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info};

/// Asks the person running the program to approve a destructive action.
pub trait Confirm {
    /// Returns `true` if the action described by `prompt` may go ahead.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Approves everything, for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, prompt: &str) -> bool {
        debug!("Confirmed without asking: {prompt}");
        true
    }
}

/// What is shown: which month, and which panels.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub month: MonthFilter,
    pub show_totals: bool,
    pub show_categories: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            month: MonthFilter::All,
            show_totals: true,
            show_categories: true,
        }
    }
}

/// Owns the derived state of one view over the store.
#[derive(Debug)]
pub struct Controller<Tz = Local>
where
    Tz: TimeZone,
{
    db: Db,
    notifications: Notifications,
    tz: Tz,
    view: ViewState,
    records: Vec<Expense>,
    filtered: Vec<Expense>,
    summary: Summary,
}

impl<Tz> Controller<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Creates a controller with no records. Call `refresh` or feed it snapshots from `subscribe`.
    pub fn new(config: &Config, notifications: Notifications, tz: Tz, view: ViewState) -> Self {
        Self {
            db: config.db().clone(),
            notifications,
            tz,
            view,
            records: Vec::new(),
            filtered: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Replaces the record set with the store's current contents.
    pub async fn refresh(&mut self) -> Result<()> {
        let records = self.db.snapshot().await?;
        self.on_snapshot(records);
        Ok(())
    }

    /// Registers for store snapshots. Pass each one to `on_snapshot`.
    pub(crate) fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: FnMut(Vec<Expense>) + Send + 'static,
    {
        self.db.subscribe(on_change)
    }

    /// Replaces the record set and recomputes everything derived from it.
    pub fn on_snapshot(&mut self, records: Vec<Expense>) {
        self.records = records;
        self.recompute();
    }

    /// Changes the month and recomputes.
    pub fn set_month(&mut self, month: MonthFilter) {
        self.view.month = month;
        self.recompute();
    }

    pub fn set_show_totals(&mut self, show: bool) {
        self.view.show_totals = show;
    }

    pub fn set_show_categories(&mut self, show: bool) {
        self.view.show_categories = show;
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    /// Every record from the latest snapshot, newest first.
    pub fn records(&self) -> &[Expense] {
        &self.records
    }

    /// The records of the selected month, newest first.
    pub fn filtered(&self) -> &[Expense] {
        &self.filtered
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Totals per month over all records, ignoring the selected month.
    pub fn monthly_totals(&self) -> BTreeMap<MonthYear, Amount> {
        monthly_totals(&self.records, &self.tz)
    }

    pub fn tz(&self) -> &Tz {
        &self.tz
    }

    fn recompute(&mut self) {
        self.filtered = filter_by_month(&self.records, self.view.month, &self.tz);
        self.summary = Summary::compute(&self.filtered);
        debug!(
            "Recomputed {} of {} expenses for month '{}'",
            self.filtered.len(),
            self.records.len(),
            self.view.month
        );
    }

    /// Records a new expense, then sends a notification about it.
    pub async fn add(&self, amount: Amount, category: Category, payer: Payer) -> Result<ExpenseId> {
        let new = NewExpense {
            amount,
            category,
            entered_by: payer,
        };
        let id = self.db.create(&new).await?;
        info!("Recorded expense {id}");

        let text = message::created(payer, amount, category, Utc::now(), &self.tz);
        self.notifications.deliver(&text).await;
        Ok(id)
    }

    /// Changes the amount and/or category of `id` once `confirm` approves, then sends a
    /// notification with the old and new values. Returns `None` if the change was declined.
    pub async fn edit(
        &self,
        id: &ExpenseId,
        update: ExpenseUpdate,
        confirm: &dyn Confirm,
    ) -> Result<Option<Expense>> {
        if update.is_empty() {
            bail!("Nothing to change, provide a new amount or category");
        }
        let current = self.find(id).await?;
        let proposed = update.apply(&current);
        let prompt = format!(
            "Change expense {id} from {} đ ({}) to {} đ ({})?",
            current.amount(),
            current.category().label(),
            proposed.amount(),
            proposed.category().label()
        );
        if !confirm.confirm(&prompt) {
            debug!("Edit of {id} was declined");
            return Ok(None);
        }

        let before = self.db.update(id, &update).await?;
        let after = update.apply(&before);
        info!("Edited expense {id}");

        let text = message::edited(&before, &after, Utc::now(), &self.tz);
        self.notifications.deliver(&text).await;
        Ok(Some(after))
    }

    /// Deletes `id` once `confirm` approves, then sends a notification describing what was
    /// deleted. Returns `None` if the deletion was declined.
    pub async fn delete(&self, id: &ExpenseId, confirm: &dyn Confirm) -> Result<Option<Expense>> {
        let current = self.find(id).await?;
        let prompt = format!(
            "Delete the {} đ {} expense paid by {}?",
            current.amount(),
            current.category().label(),
            current.entered_by().name()
        );
        if !confirm.confirm(&prompt) {
            debug!("Delete of {id} was declined");
            return Ok(None);
        }

        let deleted = self.db.delete(id).await?;
        info!("Deleted expense {id}");

        let text = message::deleted(&deleted, &self.tz);
        self.notifications.deliver(&text).await;
        Ok(Some(deleted))
    }

    /// Sends the totals of every month as one message. Returns the totals that were sent and
    /// whether the channel accepted them.
    pub async fn send_monthly_summary(&self) -> (BTreeMap<MonthYear, Amount>, bool) {
        let totals = self.monthly_totals();
        let delivered = self
            .notifications
            .deliver(&message::monthly_summary(&totals))
            .await;
        (totals, delivered)
    }

    /// Writes the records of the selected month to `path`.
    pub async fn export(&self, path: &Path) -> Result<usize> {
        export_table(&self.filtered, path, &self.tz).await?;
        Ok(self.filtered.len())
    }

    async fn find(&self, id: &ExpenseId) -> Result<Expense> {
        match self.db.get(id).await? {
            Some(expense) => Ok(expense),
            None => Err(StoreError::NotFound(id.to_string()).into()),
        }
    }
}
