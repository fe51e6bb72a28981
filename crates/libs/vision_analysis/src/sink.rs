use crate::{ResultRecord, SinkError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Append-only destination for result records.
#[async_trait]
pub trait ResultSink: Send {
    /// Empties the store. Runs once per batch, before the first append.
    async fn initialize(&mut self) -> Result<(), SinkError>;

    async fn append(&mut self, record: &ResultRecord<'_>) -> Result<(), SinkError>;
}

/// Flat UTF-8 text file, one record after the other.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn initialize_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Initialize {
            path: self.path.clone(),
            source,
        }
    }

    fn append_error(&self, source: std::io::Error) -> SinkError {
        SinkError::Append {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn initialize(&mut self) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.initialize_error(e))?;
        }
        fs::write(&self.path, b"")
            .await
            .map_err(|e| self.initialize_error(e))
    }

    async fn append(&mut self, record: &ResultRecord<'_>) -> Result<(), SinkError> {
        let contents = record.to_string();
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.append_error(e))?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|e| self.append_error(e))?;
        file.flush().await.map_err(|e| self.append_error(e))?;
        file.sync_data().await.map_err(|e| self.append_error(e))
    }
}
