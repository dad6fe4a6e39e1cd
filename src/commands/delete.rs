//! Delete command handler.

use crate::args::DeleteArgs;
use crate::commands::Out;
use crate::controller::{Confirm, Controller, ViewState};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Expense, ExpenseId};
use crate::notify::{Mode, Notifications};
use crate::{Config, Result};
use chrono::Local;

/// Deletes an expense after `confirm` approves and announces what was deleted.
pub async fn delete(
    config: Config,
    mode: Mode,
    args: &DeleteArgs,
    confirm: &dyn Confirm,
) -> Result<Out<Option<Expense>>> {
    let notifications = Notifications::from_config(&config, mode)
        .await
        .pub_result(ErrorType::Config)?;
    let controller = Controller::new(&config, notifications, Local, ViewState::default());

    let id = ExpenseId::new(args.id());
    let deleted = controller
        .delete(&id, confirm)
        .await
        .pub_result(ErrorType::Database)?;

    let message = match &deleted {
        Some(expense) => format!(
            "Deleted the {} đ {} expense paid by {}",
            expense.amount(),
            expense.category().label(),
            expense.entered_by().name()
        ),
        None => format!("Kept expense {id}"),
    };
    Ok(Out::new(message, deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::AssumeYes;
    use crate::model::{Category, Payer};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete() {
        let env = TestEnv::new().await;
        let ids = env.insert_example().await;

        let args = DeleteArgs::new(ids[1].as_str(), true);
        let out = delete(env.config(), Mode::Testing, &args, &AssumeYes)
            .await
            .unwrap();
        assert_eq!(
            out.message(),
            "Deleted the 50.000 đ Bills expense paid by Thạch"
        );

        let records = env.config().db().snapshot().await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|e| e.id() != &ids[1]));
    }

    #[tokio::test]
    async fn test_delete_declined() {
        let env = TestEnv::new().await;
        let id = env
            .insert_expense(1_000, Category::Other, Payer::Tai, "2025-01-01T12:00:00Z")
            .await;
        let args = DeleteArgs::new(id.as_str(), false);
        let out = delete(env.config(), Mode::Testing, &args, &|_: &str| false)
            .await
            .unwrap();
        assert!(out.structure().unwrap().is_none());
        assert_eq!(env.config().db().snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let env = TestEnv::new().await;
        let args = DeleteArgs::new("missing", true);
        let err = delete(env.config(), Mode::Testing, &args, &AssumeYes)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "database error");
    }
}
