use crate::args::EditArgs;
use crate::commands::Out;
use crate::controller::{Confirm, Controller, ViewState};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Expense, ExpenseId, ExpenseUpdate};
use crate::notify::{Mode, Notifications};
use crate::{Config, Result};
use anyhow::anyhow;
use chrono::Local;

/// Changes the amount and/or category of an expense after `confirm` approves. The payer and date
/// stay as they were.
pub async fn edit(
    config: Config,
    mode: Mode,
    args: &EditArgs,
    confirm: &dyn Confirm,
) -> Result<Out<Option<Expense>>> {
    let update = ExpenseUpdate {
        amount: args.amount(),
        category: args.category(),
    };
    if update.is_empty() {
        return Err(anyhow!("Nothing to change, pass --amount and/or --category"))
            .pub_result(ErrorType::Request);
    }

    let notifications = Notifications::from_config(&config, mode)
        .await
        .pub_result(ErrorType::Config)?;
    let controller = Controller::new(&config, notifications, Local, ViewState::default());

    let id = ExpenseId::new(args.id());
    let edited = controller
        .edit(&id, update, confirm)
        .await
        .pub_result(ErrorType::Database)?;

    let message = match &edited {
        Some(after) => format!(
            "Updated expense {id}: {} đ, {}",
            after.amount(),
            after.category().label()
        ),
        None => format!("Left expense {id} unchanged"),
    };
    Ok(Out::new(message, edited))
}
