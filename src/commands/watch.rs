use crate::args::MonthArgs;
use crate::commands::{month_or_current, render, Out};
use crate::controller::{Controller, ViewState};
use crate::notify::{LogNotifier, Notifications};
use crate::{Config, Result};
use chrono::Local;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Prints the summary of the selected month every time the store changes, whether the change was
/// made here or by another process, until `shutdown` completes. Returns the number of snapshots
/// that were shown.
pub async fn watch(
    config: Config,
    args: &MonthArgs,
    shutdown: impl Future<Output = ()>,
) -> Result<Out<usize>> {
    let view = ViewState {
        month: month_or_current(args.month()),
        ..ViewState::default()
    };
    let mut controller = Controller::new(&config, Notifications::new(LogNotifier), Local, view);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = controller.subscribe(move |records| {
        // The receiver is gone once the loop below has ended.
        let _ = tx.send(records);
    });

    tokio::pin!(shutdown);
    let mut shown = 0usize;
    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(records) = received else {
                    debug!("The subscription ended");
                    break;
                };
                controller.on_snapshot(records);
                shown += 1;
                info!(
                    "{}\n{}",
                    render::summary_text(controller.summary(), controller.view()),
                    render::expense_lines(controller.filtered(), controller.tz())
                );
            }
            _ = &mut shutdown => {
                debug!("Shutting down the watch");
                break;
            }
        }
    }
    subscription.unsubscribe();

    Ok(Out::new(
        format!("Stopped watching after {shown} updates"),
        shown,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::MonthFilter;
    use crate::model::{Category, Payer};
    use crate::test::TestEnv;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_watch_sees_changes() {
        let env = TestEnv::new().await;
        env.insert_example().await;

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let config = env.config();
        let handle = tokio::spawn(async move {
            let args = MonthArgs::new(Some(MonthFilter::All));
            watch(config, &args, async {
                let _ = stop_rx.await;
            })
            .await
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        env.insert_expense(1_000, Category::Other, Payer::Thach, "2025-05-01T10:00:00Z")
            .await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        stop_tx.send(()).unwrap();

        let out = handle.await.unwrap().unwrap();
        assert!(*out.structure().unwrap() >= 2);
    }
}
