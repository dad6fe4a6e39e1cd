use crate::aggregate::MonthYear;
use crate::commands::{load_controller, Out};
use crate::controller::ViewState;
use crate::error::{ErrorType, IntoResult};
use crate::model::Amount;
use crate::notify::{Mode, Notifications};
use crate::{Config, Result};
use std::collections::BTreeMap;

/// Sends the total of every month, across all expenses, to the chat channel as one message.
pub async fn notify_summary(
    config: Config,
    mode: Mode,
) -> Result<Out<BTreeMap<MonthYear, Amount>>> {
    let notifications = Notifications::from_config(&config, mode)
        .await
        .pub_result(ErrorType::Config)?;
    let controller = load_controller(&config, notifications, ViewState::default())
        .await
        .pub_result(ErrorType::Database)?;

    let (totals, delivered) = controller.send_monthly_summary().await;
    let message = if delivered {
        format!("Sent the totals of {} months", totals.len())
    } else {
        "The monthly totals could not be sent, see the warning above".to_string()
    };
    Ok(Out::new(message, totals))
}
