use clap::Parser;
use split_expenses::args::{Args, Command};
use split_expenses::commands::{self, Prompt};
use split_expenses::controller::{AssumeYes, Confirm};
use split_expenses::{Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().expenses_home().path();

    // This allows for running the program without sending anything to the chat channel. When
    // EXPENSES_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Testing,
    // otherwise it will be Mode::Webhook.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(home, init_args).await?.print(),

        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            commands::add(config, mode, add_args).await?.print()
        }

        Command::Edit(edit_args) => {
            let config = Config::load(home).await?;
            let confirm = confirmer(edit_args.yes());
            commands::edit(config, mode, edit_args, confirm.as_ref())
                .await?
                .print()
        }

        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            let confirm = confirmer(delete_args.yes());
            commands::delete(config, mode, delete_args, confirm.as_ref())
                .await?
                .print()
        }

        Command::List(month_args) => {
            let config = Config::load(home).await?;
            commands::list(config, month_args).await?.print()
        }

        Command::Summary(summary_args) => {
            let config = Config::load(home).await?;
            commands::summary(config, summary_args).await?.print()
        }

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, export_args).await?.print()
        }

        Command::NotifySummary => {
            let config = Config::load(home).await?;
            commands::notify_summary(config, mode).await?.print()
        }

        Command::Watch(month_args) => {
            let config = Config::load(home).await?;
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Unable to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            };
            commands::watch(config, month_args, shutdown).await?.print()
        }
    };
    Ok(())
}

/// Asks on the terminal unless `--yes` was given.
fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Prompt)
    }
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "split_expenses={level},{}={level}",
                env!("CARGO_CRATE_NAME"),
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
