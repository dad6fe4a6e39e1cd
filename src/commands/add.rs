use crate::args::AddArgs;
use crate::commands::Out;
use crate::controller::{Controller, ViewState};
use crate::error::{ErrorType, IntoResult};
use crate::model::ExpenseId;
use crate::notify::{Mode, Notifications};
use crate::{Config, Result};
use chrono::Local;

/// Records a new expense and announces it in the chat channel.
pub async fn add(config: Config, mode: Mode, args: &AddArgs) -> Result<Out<ExpenseId>> {
    let notifications = Notifications::from_config(&config, mode)
        .await
        .pub_result(ErrorType::Config)?;
    let controller = Controller::new(&config, notifications, Local, ViewState::default());

    let id = controller
        .add(args.amount(), args.category(), args.payer())
        .await
        .pub_result(ErrorType::Database)?;

    let message = format!(
        "Recorded {} đ for {} paid by {} ({id})",
        args.amount(),
        args.category().label(),
        args.payer().name()
    );
    Ok(Out::new(message, id))
}
