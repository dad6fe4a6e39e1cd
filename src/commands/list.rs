use crate::args::MonthArgs;
use crate::commands::{load_controller, month_or_current, render, Out};
use crate::controller::ViewState;
use crate::error::{ErrorType, IntoResult};
use crate::model::Expense;
use crate::notify::{LogNotifier, Notifications};
use crate::{Config, Result};

/// Lists the expenses of the selected month, newest first.
pub async fn list(config: Config, args: &MonthArgs) -> Result<Out<Vec<Expense>>> {
    let view = ViewState {
        month: month_or_current(args.month()),
        ..ViewState::default()
    };
    let controller = load_controller(&config, Notifications::new(LogNotifier), view)
        .await
        .pub_result(ErrorType::Database)?;

    let message = format!(
        "{}\n{}",
        render::month_heading(view.month),
        render::expense_lines(controller.filtered(), controller.tz())
    );
    Ok(Out::new(message, controller.filtered().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::MonthFilter;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_list_month() {
        let env = TestEnv::new().await;
        let ids = env.insert_example().await;

        let out = list(env.config(), &MonthArgs::new(Some(MonthFilter::Month(3))))
            .await
            .unwrap();
        let listed: Vec<_> = out
            .structure()
            .unwrap()
            .iter()
            .map(|e| e.id().clone())
            .collect();
        assert_eq!(listed, vec![ids[1].clone(), ids[0].clone()]);
        assert!(out.message().starts_with("Month 3\n"));
    }

    #[tokio::test]
    async fn test_list_all() {
        let env = TestEnv::new().await;
        env.insert_example().await;
        let out = list(env.config(), &MonthArgs::new(Some(MonthFilter::All)))
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().len(), 3);
    }
}
