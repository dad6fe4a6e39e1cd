use crate::Result;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Write a file.
pub(crate) async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .context(format!("Unable to write to {}", path.to_string_lossy()))
}

/// Read a file to a `String`.
pub(crate) async fn read(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at {}", path.display()))
}

/// Create a directory and any missing parents.
pub(crate) async fn make_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("Unable to create directory at {}", path.to_string_lossy()))
}

/// Resolve `path` to an absolute path. The path must exist.
pub(crate) async fn canonicalize(path: &Path) -> Result<PathBuf> {
    tokio::fs::canonicalize(path)
        .await
        .with_context(|| format!("Unable to resolve the path {}", path.display()))
}

/// Read an optional secret from a file. Returns `None` if the file is missing or blank.
pub(crate) async fn read_secret(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let secret = read(path).await?;
    let secret = secret.trim();
    if secret.is_empty() {
        Ok(None)
    } else {
        Ok(Some(secret.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        write(&path, "hello").await.unwrap();
        assert_eq!(read(&path).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_read_secret() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        assert_eq!(read_secret(&path).await.unwrap(), None);

        write(&path, "  \n").await.unwrap();
        assert_eq!(read_secret(&path).await.unwrap(), None);

        write(&path, "123:abc\n").await.unwrap();
        assert_eq!(read_secret(&path).await.unwrap().as_deref(), Some("123:abc"));
    }

    #[tokio::test]
    async fn test_make_dir_nested() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        make_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        let resolved = canonicalize(&nested).await.unwrap();
        assert!(resolved.is_absolute());
    }
}
