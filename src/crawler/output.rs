use crate::crawler::store::FlightStore;
use crate::crawler::types::CrawlerError;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::sync::Mutex;
use tracing::info;

/// Dumps the current store to a text file, one flight per line.
///
/// Writes are serialized and each one replaces the file atomically, so
/// readers never observe a partially written dump.
#[derive(Debug)]
pub struct OutputWriter {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OutputWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every stored flight. Returns the number of lines written.
    pub async fn write_snapshot(&self, store: &FlightStore) -> Result<usize, CrawlerError> {
        let _guard = self.write_lock.lock().await;

        // Taken under the lock so the last writer always carries the newest state
        let flights = store.snapshot();
        let mut content = String::new();
        for flight in &flights {
            content.push_str(&flight.to_string());
            content.push('\n');
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| self.output_error(e))?;
        }

        let temp_path = self.temp_path();
        async_fs::write(&temp_path, content)
            .await
            .map_err(|e| self.output_error(e))?;
        if let Err(e) = async_fs::rename(&temp_path, &self.path).await {
            let _ = async_fs::remove_file(&temp_path).await;
            return Err(self.output_error(e));
        }

        info!("Wrote {} flights to {:?}", flights.len(), self.path);
        Ok(flights.len())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn output_error(&self, e: std::io::Error) -> CrawlerError {
        CrawlerError::Output {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}
