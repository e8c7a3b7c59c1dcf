use crate::error::StorageError;
use crate::models::Portfolio;
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};

/// Whole-document persistence for the portfolio tree.
///
/// `save` stamps `updated_at` and returns the document as stored.
pub trait PortfolioStore: Send + Sync {
    fn load(&self) -> Result<Portfolio, StorageError>;
    fn save(&self, portfolio: Portfolio) -> Result<Portfolio, StorageError>;
}

pub struct JsonFileStore {
    path: PathBuf,
    seed: Option<PathBuf>,
    write_lock: Mutex<()>,
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, seed: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed,
            write_lock: Mutex::new(()),
        }
    }

    fn read_document(path: &Path) -> Result<Option<Portfolio>, StorageError> {
        match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(Some(Portfolio::default())),
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(path, e)),
        }
    }
}

impl PortfolioStore for JsonFileStore {
    fn load(&self) -> Result<Portfolio, StorageError> {
        if let Some(portfolio) = Self::read_document(&self.path)? {
            return Ok(portfolio);
        }
        if let Some(seed) = &self.seed {
            if let Some(portfolio) = Self::read_document(seed)? {
                debug!(seed = %seed.display(), "Loaded portfolio from seed file");
                return Ok(portfolio);
            }
        }
        Ok(Portfolio::default())
    }

    fn save(&self, mut portfolio: Portfolio) -> Result<Portfolio, StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockPoisoned)?;

        portfolio.updated_at = Some(Utc::now());
        let body = serde_json::to_string_pretty(&portfolio)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        // Write beside the target and rename so readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| io_error(&self.path, e))?;

        info!(
            path = %self.path.display(),
            divisions = portfolio.divisions.len(),
            "Saved portfolio"
        );
        Ok(portfolio)
    }
}

/// In-memory store used by tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    document: Mutex<Portfolio>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with(portfolio: Portfolio) -> Self {
        Self {
            document: Mutex::new(portfolio),
        }
    }
}

#[cfg(test)]
impl PortfolioStore for MemoryStore {
    fn load(&self) -> Result<Portfolio, StorageError> {
        self.document
            .lock()
            .map(|doc| doc.clone())
            .map_err(|_| StorageError::LockPoisoned)
    }

    fn save(&self, mut portfolio: Portfolio) -> Result<Portfolio, StorageError> {
        portfolio.updated_at = Some(Utc::now());
        let mut doc = self.document.lock().map_err(|_| StorageError::LockPoisoned)?;
        *doc = portfolio.clone();
        Ok(portfolio)
    }
}
