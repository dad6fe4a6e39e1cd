use crate::aggregate::Summary;
use crate::args::SummaryArgs;
use crate::commands::{load_controller, month_or_current, render, Out};
use crate::controller::ViewState;
use crate::error::{ErrorType, IntoResult};
use crate::notify::{LogNotifier, Notifications};
use crate::{Config, Result};

/// Shows the totals, split, balance and category breakdown for the selected month.
pub async fn summary(config: Config, args: &SummaryArgs) -> Result<Out<Summary>> {
    let view = ViewState {
        month: month_or_current(args.month()),
        show_totals: args.show_totals(),
        show_categories: args.show_categories(),
    };
    let controller = load_controller(&config, Notifications::new(LogNotifier), view)
        .await
        .pub_result(ErrorType::Database)?;

    let message = render::summary_text(controller.summary(), controller.view());
    Ok(Out::new(message, controller.summary().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Settlement;
    use crate::filter::MonthFilter;
    use crate::model::{Amount, Payer};
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_summary_worked_example() {
        let env = TestEnv::new().await;
        env.insert_example().await;

        let args = SummaryArgs::new(Some(MonthFilter::Month(3)), false, false);
        let out = summary(env.config(), &args).await.unwrap();
        let s = out.structure().unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.total, Amount::from_units(150_000));
        assert_eq!(s.split, Amount::from_units(75_000));
        assert_eq!(
            s.settlement,
            Settlement::Transfer {
                from: Payer::Thach,
                to: Payer::Tai,
                amount: Amount::from_units(25_000),
            }
        );
        assert!(out.message().contains("👉 Thạch owes Tài 25.000 đ"));
        assert!(out.message().contains("📂 By category:"));
    }

    #[tokio::test]
    async fn test_summary_hides_panels() {
        let env = TestEnv::new().await;
        env.insert_example().await;
        let args = SummaryArgs::new(Some(MonthFilter::Month(4)), true, true);
        let out = summary(env.config(), &args).await.unwrap();
        assert_eq!(out.message(), "Month 4 (1 expense)");
        assert_eq!(out.structure().unwrap().total, Amount::from_units(20_000));
    }
}
