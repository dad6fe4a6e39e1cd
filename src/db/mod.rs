//! This module is responsible for reading, writing and watching the SQLite expense store.
//!
//! Every mutation commits before it returns and then publishes a fresh snapshot to subscribers in
//! this process. Changes made through other connections, including other processes, are noticed
//! by polling a revision counter that triggers keep up to date.

mod migrations;

use crate::error::{MalformedRecord, StoreError};
use crate::model::{Amount, Category, Expense, ExpenseId, ExpenseUpdate, NewExpense, Payer};
use crate::Result;
use anyhow::{bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

// Rows without a usable date go last, whatever text sits in the column.
const SELECT_ALL: &str = "SELECT id, amount, category, entered_by, date FROM expenses \
                          ORDER BY (date IS NULL OR date NOT GLOB '[0-9]*') ASC, \
                          date DESC, rowid DESC";
const SELECT_ONE: &str = "SELECT id, amount, category, entered_by, date FROM expenses WHERE id = ?";
const SELECT_REVISION: &str = "SELECT value FROM store_revision WHERE id = 1";

/// The full, ordered contents of the store at a given revision.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    revision: i64,
    records: Arc<Vec<Expense>>,
}

/// A handle to the SQLite expense store. Cloning is cheap and all clones share one connection
/// pool and one set of subscribers.
#[derive(Debug, Clone)]
pub(crate) struct Db {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    pool: SqlitePool,
    snapshot: watch::Sender<Snapshot>,
    poll_interval: Duration,
}

impl Db {
    /// - Validates that no file currently exists at `path`
    /// - Creates a new SQLite file at `path`
    /// - Initializes the database schema
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn init(path: impl AsRef<Path>, poll_interval: Duration) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            bail!("A database already exists at {}", path.display());
        }
        Self::open(path, true, poll_interval).await
    }

    /// - Validates that there is a SQLite file at `path`
    /// - Updates the database schema with migrations if it is out-of-date
    /// - Returns a constructed `Db` object for further operations
    pub(crate) async fn load(path: impl AsRef<Path>, poll_interval: Duration) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("The database file is missing '{}'", path.display());
        }
        Self::open(path, false, poll_interval).await
    }

    async fn open(path: &Path, create: bool, poll_interval: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(StoreError::from)
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;

        migrations::bootstrap(&pool).await?;
        let current = migrations::version(&pool).await?;
        if current > migrations::CURRENT_VERSION {
            bail!(
                "The database schema version {current} is newer than this program supports ({}). \
                 Is a newer version of expenses available?",
                migrations::CURRENT_VERSION
            );
        }
        migrations::run(&pool, current, migrations::CURRENT_VERSION).await?;

        let (snapshot, _) = watch::channel(Snapshot::default());
        let db = Self {
            inner: Arc::new(Inner {
                pool,
                snapshot,
                poll_interval,
            }),
        };
        db.publish().await?;
        Ok(db)
    }

    /// Returns all expenses, newest first.
    pub(crate) async fn snapshot(&self) -> Result<Vec<Expense>> {
        Ok(self.read_snapshot().await?.records.as_ref().clone())
    }

    /// Looks up a single expense.
    pub(crate) async fn get(&self, id: &ExpenseId) -> Result<Option<Expense>> {
        let row = sqlx::query(SELECT_ONE)
            .bind(id.as_str())
            .fetch_optional(&self.inner.pool)
            .await
            .map_err(StoreError::from)
            .context("Unable to read expense")?;
        match row {
            Some(row) => Ok(Some(parse_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Records a new expense dated now and returns its generated id.
    pub(crate) async fn create(&self, new: &NewExpense) -> Result<ExpenseId> {
        self.create_at(new, Utc::now()).await
    }

    pub(crate) async fn create_at(&self, new: &NewExpense, date: DateTime<Utc>) -> Result<ExpenseId> {
        let units = stored_units(new.amount)?;
        let id = ExpenseId::generate();

        sqlx::query(
            "INSERT INTO expenses (id, amount, category, entered_by, date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(units)
        .bind(new.category.to_string())
        .bind(new.entered_by.to_string())
        .bind(format_date(&date))
        .execute(&self.inner.pool)
        .await
        .map_err(StoreError::from)
        .context("Unable to create the expense")?;

        debug!("Created expense {id}");
        self.publish_after_mutation().await;
        Ok(id)
    }

    /// Applies `update` to the expense `id` and returns the expense as it was before the update.
    pub(crate) async fn update(&self, id: &ExpenseId, update: &ExpenseUpdate) -> Result<Expense> {
        let mut tx = self
            .inner
            .pool
            .begin()
            .await
            .map_err(StoreError::from)
            .context("Unable to begin update")?;

        let row = sqlx::query(SELECT_ONE)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)
            .context("Unable to read expense for update")?;
        let before = match row {
            Some(row) => parse_row(&row)?,
            None => return Err(StoreError::NotFound(id.to_string()).into()),
        };

        let after = update.apply(&before);
        let units = stored_units(after.amount())?;

        sqlx::query("UPDATE expenses SET amount = ?, category = ? WHERE id = ?")
            .bind(units)
            .bind(after.category().to_string())
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)
            .context("Unable to update the expense")?;

        tx.commit()
            .await
            .map_err(StoreError::from)
            .context("Unable to commit update")?;

        debug!("Updated expense {id}");
        self.publish_after_mutation().await;
        Ok(before)
    }

    /// Deletes the expense `id` and returns it as it was before deletion.
    pub(crate) async fn delete(&self, id: &ExpenseId) -> Result<Expense> {
        let mut tx = self
            .inner
            .pool
            .begin()
            .await
            .map_err(StoreError::from)
            .context("Unable to begin delete")?;

        let row = sqlx::query(SELECT_ONE)
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from)
            .context("Unable to read expense for delete")?;
        let Some(row) = row else {
            return Err(StoreError::NotFound(id.to_string()).into());
        };
        // Dropping `tx` on error rolls back, so a row that cannot be parsed stays in the store.
        let before = parse_row(&row)?;

        sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)
            .context("Unable to delete the expense")?;

        tx.commit()
            .await
            .map_err(StoreError::from)
            .context("Unable to commit delete")?;

        debug!("Deleted expense {id}");
        self.publish_after_mutation().await;
        Ok(before)
    }

    /// Registers `on_change` to receive the full, ordered set of expenses. It is called once right
    /// away and then after every change to the store, wherever the change was made.
    ///
    /// Delivery stops when the returned `Subscription` is dropped or unsubscribed.
    pub(crate) fn subscribe<F>(&self, mut on_change: F) -> Subscription
    where
        F: FnMut(Vec<Expense>) + Send + 'static,
    {
        let db = self.clone();
        let mut rx = self.inner.snapshot.subscribe();
        let handle = tokio::spawn(async move {
            if let Err(e) = db.publish().await {
                warn!("Unable to refresh the expense snapshot: {e:#}");
            }
            let first = rx.borrow_and_update().records.clone();
            on_change(first.as_ref().clone());

            let mut ticker = tokio::time::interval(db.inner.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let records = rx.borrow_and_update().records.clone();
                        on_change(records.as_ref().clone());
                    }
                    _ = ticker.tick() => {
                        db.poll().await;
                    }
                }
            }
            trace!("Subscription task finished");
        });
        Subscription { handle }
    }

    /// Republishes if the revision counter moved since the last published snapshot.
    async fn poll(&self) {
        let published = self.inner.snapshot.borrow().revision;
        match self.revision().await {
            Ok(revision) if revision != published => {
                trace!("Store revision moved from {published} to {revision}");
                if let Err(e) = self.publish().await {
                    warn!("Unable to refresh the expense snapshot: {e:#}");
                }
            }
            Ok(_) => {}
            Err(e) => warn!("Unable to poll the expense store: {e:#}"),
        }
    }

    async fn revision(&self) -> Result<i64> {
        let revision: i64 = sqlx::query_scalar(SELECT_REVISION)
            .fetch_one(&self.inner.pool)
            .await
            .map_err(StoreError::from)
            .context("Unable to read the store revision")?;
        Ok(revision)
    }

    /// Reads the revision and records in one transaction so they agree with each other.
    async fn read_snapshot(&self) -> Result<Snapshot> {
        let mut tx = self
            .inner
            .pool
            .begin()
            .await
            .map_err(StoreError::from)
            .context("Unable to begin read")?;

        let revision: i64 = sqlx::query_scalar(SELECT_REVISION)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from)
            .context("Unable to read the store revision")?;

        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&mut *tx)
            .await
            .map_err(StoreError::from)
            .context("Unable to read expenses")?;

        tx.commit()
            .await
            .map_err(StoreError::from)
            .context("Unable to finish read")?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match parse_row(row) {
                Ok(expense) => records.push(expense),
                Err(malformed) => warn!("Excluding expense from snapshot: {malformed}"),
            }
        }

        Ok(Snapshot {
            revision,
            records: Arc::new(records),
        })
    }

    /// Sends the current contents of the store to subscribers, unless they already have this
    /// revision or a later one.
    async fn publish(&self) -> Result<()> {
        let snapshot = self.read_snapshot().await?;
        self.offer(snapshot);
        Ok(())
    }

    /// Replaces the published snapshot only if `snapshot` is newer. A poll that read the store
    /// before a concurrent mutation committed must not roll subscribers back.
    fn offer(&self, snapshot: Snapshot) -> bool {
        self.inner.snapshot.send_if_modified(|current| {
            if snapshot.revision <= current.revision {
                trace!(
                    "Ignoring snapshot at revision {}, already at {}",
                    snapshot.revision,
                    current.revision
                );
                false
            } else {
                *current = snapshot;
                true
            }
        })
    }

    /// The mutation has already been committed, so a failure here only delays subscribers until
    /// the next poll.
    async fn publish_after_mutation(&self) {
        if let Err(e) = self.publish().await {
            warn!("Unable to publish the expense snapshot after a change: {e:#}");
        }
    }
}

/// A live registration created by `Db::subscribe`.
#[derive(Debug)]
pub(crate) struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Stops delivery and releases the listener.
    pub(crate) fn unsubscribe(self) {
        drop(self)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The integer the `amount` column holds for `amount`.
fn stored_units(amount: Amount) -> Result<i64> {
    if !amount.is_whole() {
        bail!("Expense amounts must be whole numbers, got {amount}");
    }
    match amount.units() {
        Some(units) => Ok(units),
        None => bail!(
            "The amount {amount} is too large, the largest amount that can be stored is {}",
            Amount::from_units(i64::MAX as u64)
        ),
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_row(row: &SqliteRow) -> std::result::Result<Expense, MalformedRecord> {
    let id: String = row
        .try_get("id")
        .map_err(|e| MalformedRecord::new("<unknown>", format!("unreadable id: {e}")))?;
    let malformed = |reason: String| MalformedRecord::new(id.clone(), reason);

    let amount: i64 = row
        .try_get("amount")
        .map_err(|e| malformed(format!("unreadable amount: {e}")))?;
    let amount = u64::try_from(amount)
        .map(Amount::from_units)
        .map_err(|_| malformed(format!("negative amount {amount}")))?;

    let category: String = row
        .try_get("category")
        .map_err(|e| malformed(format!("unreadable category: {e}")))?;
    let category = Category::from_str(&category)
        .map_err(|_| malformed(format!("unknown category '{category}'")))?;

    let entered_by: String = row
        .try_get("entered_by")
        .map_err(|e| malformed(format!("unreadable payer: {e}")))?;
    let entered_by = Payer::from_str(&entered_by)
        .map_err(|_| malformed(format!("unknown payer '{entered_by}'")))?;

    let date: Option<String> = row
        .try_get("date")
        .map_err(|e| malformed(format!("unreadable date: {e}")))?;
    let date = date.and_then(|s| match DateTime::parse_from_rfc3339(&s) {
        Ok(d) => Some(d.with_timezone(&Utc)),
        Err(e) => {
            warn!("Expense '{id}' has an invalid date '{s}': {e}");
            None
        }
    });

    Ok(Expense::new(id.as_str(), amount, category, entered_by, date))
}
