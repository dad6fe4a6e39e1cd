//! Command handlers for the expenses CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod delete;
mod edit;
mod export;
mod init;
mod list;
mod notify_summary;
mod render;
mod summary;
mod watch;

use crate::controller::{Confirm, Controller, ViewState};
use crate::filter::MonthFilter;
use crate::notify::Notifications;
use crate::{Config, Result};
use chrono::Local;
use serde::Serialize;
use std::fmt::Debug;
use std::io::{BufRead, Write};
use tracing::{debug, info};

pub use add::add;
pub use delete::delete;
pub use edit::edit;
pub use export::export;
pub use init::init;
pub use list::list;
pub use notify_summary::notify_summary;
pub use summary::summary;
pub use watch::watch;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Asks on the terminal. Anything other than "y" or "yes" declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prompt;

impl Confirm for Prompt {
    fn confirm(&self, prompt: &str) -> bool {
        let mut stderr = std::io::stderr();
        if write!(stderr, "{prompt} [y/N] ").is_err() || stderr.flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// The month to show when none was given on the command line.
fn month_or_current(month: Option<MonthFilter>) -> MonthFilter {
    month.unwrap_or_else(|| MonthFilter::current(&Local))
}

/// Builds a controller in local time over the current contents of the store.
async fn load_controller(
    config: &Config,
    notifications: Notifications,
    view: ViewState,
) -> Result<Controller<Local>> {
    let mut controller = Controller::new(config, notifications, Local, view);
    controller.refresh().await?;
    Ok(controller)
}
