use crate::error::{AppError, Result};
use crate::store::KeyValueStore;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// One file per key under a base directory. Writes go through a temp file
/// and a rename so readers never see a half-written document.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{}.json", file_stem(key))))
    }

    /// Keys become file names: no separators, `..` or control characters.
    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(AppError::InvalidInput("store key cannot be empty".to_string()));
        }
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(AppError::InvalidInput(format!(
                "store key contains invalid characters: {key:?}"
            )));
        }
        if key.chars().any(|c| c.is_control()) {
            return Err(AppError::InvalidInput(format!(
                "store key contains control characters: {key:?}"
            )));
        }
        Ok(())
    }
}

/// Percent-escape `:` and `%` so distinct keys never share a file name.
fn file_stem(key: &str) -> String {
    let mut stem = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            ':' => stem.push_str("%3A"),
            '%' => stem.push_str("%25"),
            c => stem.push(c),
        }
    }
    stem
}

fn io_error(context: &str, e: std::io::Error) -> AppError {
    AppError::Storage(format!("{context}: {e}"))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read failed", e)),
        }
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.key_path(key)?;
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| io_error("create dir failed", e))?;

        let tmp_path = self.base_path.join(format!(
            ".{}.{}.tmp",
            file_stem(key),
            uuid::Uuid::new_v4().simple()
        ));

        let write_result = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(value).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, &path).await?;
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(io_error("write failed", e));
        }

        tracing::debug!("File store wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("delete failed", e)),
        }
    }

    async fn health_check(&self) -> bool {
        tokio::fs::create_dir_all(&self.base_path).await.is_ok()
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
