use crate::args::ExportArgs;
use crate::commands::{load_controller, month_or_current, Out};
use crate::controller::ViewState;
use crate::error::{ErrorType, IntoResult};
use crate::notify::{LogNotifier, Notifications};
use crate::{Config, Result};
use std::path::PathBuf;

/// Writes the expenses of the selected month to a CSV file, replacing the file if it exists.
pub async fn export(config: Config, args: &ExportArgs) -> Result<Out<PathBuf>> {
    let view = ViewState {
        month: month_or_current(args.month()),
        ..ViewState::default()
    };
    let controller = load_controller(&config, Notifications::new(LogNotifier), view)
        .await
        .pub_result(ErrorType::Database)?;

    let path = match args.output() {
        Some(p) => p.to_path_buf(),
        None => config.export_path(),
    };
    let count = controller
        .export(&path)
        .await
        .pub_result(ErrorType::Export)?;

    Ok(Out::new(
        format!("Exported {count} expenses to {}", path.display()),
        path,
    ))
}
