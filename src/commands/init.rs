use crate::args::InitArgs;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and:
/// - Creates an initial `config.json` file with default settings plus the notification endpoint
///   and chat id, if they were given
/// - Creates the SQLite database
///
/// # Errors
/// - Returns an error if any file operations fail, or if the data directory already has a
///   database.
pub async fn init(expenses_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(expenses_home, args.endpoint(), args.chat_id())
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;

    let mut message = format!(
        "Successfully created the expenses directory at {}",
        config.root().display()
    );
    if config.notify().chat_id().is_none() {
        message.push_str(". Notifications are off until a chat_id is set in config.json");
    }
    Ok(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("expenses");
        let args = InitArgs::new(None, Some("-1".to_string()));
        let out = init(&home, &args).await.unwrap();
        assert!(out.message().starts_with("Successfully created"));
        assert!(home.join("config.json").is_file());
        assert!(home.join("expenses.sqlite").is_file());

        let err = init(&home, &args).await.unwrap_err();
        assert_eq!(err.to_string(), "config error");
    }
}
