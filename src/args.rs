//! These structs provide the CLI interface for the expenses CLI.

use crate::filter::MonthFilter;
use crate::model::{Amount, Category, Payer};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// expenses: A command-line tool for tracking shared expenses between two people.
///
/// Record what each of you paid, see the totals for a month, how much each of you owes under a
/// 50/50 split, and where the money went by category. Every change is announced in a chat
/// channel if one is configured.
///
/// Run `expenses init` first. To have notifications sent, put the bot token in
/// $EXPENSES_HOME/.secrets/notify_token (or EXPENSES_NOTIFY_TOKEN) and pass --chat-id to init.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and the database.
    ///
    /// This is the first command you should run. By default the data directory is
    /// $HOME/expenses, pass --expenses-home to put it somewhere else.
    Init(InitArgs),
    /// Record a new expense. It is dated now.
    Add(AddArgs),
    /// Change the amount and/or category of an expense.
    Edit(EditArgs),
    /// Delete an expense.
    Delete(DeleteArgs),
    /// List the expenses of a month, newest first.
    List(MonthArgs),
    /// Show the total, the split, the balance between the two of you and the category breakdown.
    Summary(SummaryArgs),
    /// Write the expenses of a month to a CSV file.
    Export(ExportArgs),
    /// Send the total of every month to the chat channel.
    NotifySummary,
    /// Show the summary and keep it up to date as expenses change, until Ctrl-C.
    Watch(MonthArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where expenses data and configuration is held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    expenses_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expenses_home: PathBuf) -> Self {
        Self {
            log_level,
            expenses_home: expenses_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expenses_home(&self) -> &DisplayPath {
        &self.expenses_home
    }
}

/// Args for the `expenses init` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct InitArgs {
    /// The base URL of the bot API that notifications are sent to.
    #[arg(long)]
    endpoint: Option<String>,

    /// The chat that receives notifications.
    #[arg(long)]
    chat_id: Option<String>,
}

impl InitArgs {
    pub fn new(endpoint: Option<String>, chat_id: Option<String>) -> Self {
        Self { endpoint, chat_id }
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }
}

/// Args for the `expenses add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The amount in whole units. Group separators are allowed, e.g. 100,000
    #[arg(long)]
    amount: Amount,

    /// What the money was spent on.
    #[arg(long, value_enum)]
    category: Category,

    /// Who paid.
    #[arg(long, value_enum)]
    payer: Payer,
}

impl AddArgs {
    pub fn new(amount: Amount, category: Category, payer: Payer) -> Self {
        Self {
            amount,
            category,
            payer,
        }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn payer(&self) -> Payer {
        self.payer
    }
}

/// Args for the `expenses edit` command.
#[derive(Debug, Parser, Clone)]
pub struct EditArgs {
    /// The id of the expense, as shown by `expenses list`.
    id: String,

    /// The new amount.
    #[arg(long)]
    amount: Option<Amount>,

    /// The new category.
    #[arg(long, value_enum)]
    category: Option<Category>,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
}

impl EditArgs {
    pub fn new(
        id: impl Into<String>,
        amount: Option<Amount>,
        category: Option<Category>,
        yes: bool,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            category,
            yes,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

/// Args for the `expenses delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the expense, as shown by `expenses list`.
    id: String,

    /// Do not ask for confirmation.
    #[arg(long, short)]
    yes: bool,
}

impl DeleteArgs {
    pub fn new(id: impl Into<String>, yes: bool) -> Self {
        Self { id: id.into(), yes }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn yes(&self) -> bool {
        self.yes
    }
}

/// Selects a month for commands that show expenses.
#[derive(Debug, Parser, Clone, Default)]
pub struct MonthArgs {
    /// A month number from 1 to 12, or "all". Defaults to the current month.
    #[arg(long)]
    month: Option<MonthFilter>,
}

impl MonthArgs {
    pub fn new(month: Option<MonthFilter>) -> Self {
        Self { month }
    }

    pub fn month(&self) -> Option<MonthFilter> {
        self.month
    }
}

/// Args for the `expenses summary` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct SummaryArgs {
    #[clap(flatten)]
    month: MonthArgs,

    /// Hide the totals and the balance.
    #[arg(long)]
    no_totals: bool,

    /// Hide the category breakdown.
    #[arg(long)]
    no_categories: bool,
}

impl SummaryArgs {
    pub fn new(month: Option<MonthFilter>, no_totals: bool, no_categories: bool) -> Self {
        Self {
            month: MonthArgs::new(month),
            no_totals,
            no_categories,
        }
    }

    pub fn month(&self) -> Option<MonthFilter> {
        self.month.month()
    }

    pub fn show_totals(&self) -> bool {
        !self.no_totals
    }

    pub fn show_categories(&self) -> bool {
        !self.no_categories
    }
}

/// Args for the `expenses export` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ExportArgs {
    #[clap(flatten)]
    month: MonthArgs,

    /// Where to write the CSV file. Defaults to `export_file` from config.json.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(month: Option<MonthFilter>, output: Option<PathBuf>) -> Self {
        Self {
            month: MonthArgs::new(month),
            output,
        }
    }

    pub fn month(&self) -> Option<MonthFilter> {
        self.month.month()
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expenses-home or EXPENSES_HOME instead of relying on the \
                default expenses home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from([
            "expenses",
            "--expenses-home",
            "/tmp/x",
            "add",
            "--amount",
            "100,000",
            "--category",
            "food",
            "--payer",
            "thach",
        ])
        .unwrap();
        assert_eq!(args.common().expenses_home().path(), Path::new("/tmp/x"));
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        assert_eq!(add.amount(), Amount::from_units(100_000));
        assert_eq!(add.category(), Category::Food);
        assert_eq!(add.payer(), Payer::Thach);
    }

    #[test]
    fn test_parse_rejects_bad_amount() {
        let result = Args::try_parse_from([
            "expenses", "add", "--amount", "12k", "--category", "food", "--payer", "tai",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_summary_month() {
        let args =
            Args::try_parse_from(["expenses", "summary", "--month", "3", "--no-categories"])
                .unwrap();
        let Command::Summary(summary) = args.command() else {
            panic!("expected summary");
        };
        assert_eq!(summary.month(), Some(MonthFilter::Month(3)));
        assert!(summary.show_totals());
        assert!(!summary.show_categories());

        assert!(Args::try_parse_from(["expenses", "list", "--month", "13"]).is_err());
        let args = Args::try_parse_from(["expenses", "list", "--month", "all"]).unwrap();
        let Command::List(list) = args.command() else {
            panic!("expected list");
        };
        assert_eq!(list.month(), Some(MonthFilter::All));
    }

    #[test]
    fn test_parse_edit_and_delete() {
        let args =
            Args::try_parse_from(["expenses", "edit", "abc", "--category", "bills", "-y"]).unwrap();
        let Command::Edit(edit) = args.command() else {
            panic!("expected edit");
        };
        assert_eq!(edit.id(), "abc");
        assert_eq!(edit.amount(), None);
        assert_eq!(edit.category(), Some(Category::Bills));
        assert!(edit.yes());

        let args = Args::try_parse_from(["expenses", "delete", "abc"]).unwrap();
        let Command::Delete(delete) = args.command() else {
            panic!("expected delete");
        };
        assert!(!delete.yes());
    }
}
