use crate::error::StorageError;
use crate::models::Portfolio;
use crate::storage::PortfolioStore;
use std::sync::Arc;
use tokio::task;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PortfolioStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PortfolioStore>) -> Self {
        Self { store }
    }

    /// Load the document on the blocking pool; file stores do synchronous I/O.
    pub async fn load(&self) -> Result<Portfolio, StorageError> {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || store.load()).await?
    }

    pub async fn save(&self, portfolio: Portfolio) -> Result<Portfolio, StorageError> {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || store.save(portfolio)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::JsonFileStore;

    #[tokio::test]
    async fn test_file_store_round_trip_off_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("portfolio.json");
        let state = AppState::new(Arc::new(JsonFileStore::new(&path, None)));

        assert!(state.load().await.unwrap().divisions.is_empty());
        let saved = state.save(Portfolio::default()).await.unwrap();
        assert!(saved.updated_at.is_some());
        assert!(path.exists());
        assert_eq!(state.load().await.unwrap().updated_at, saved.updated_at);
    }
}
