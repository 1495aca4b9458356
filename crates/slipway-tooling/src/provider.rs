//! Caching model provider. One provider exists per build; the cache holds
//! the last fetched model until a reload is forced or the provider is
//! invalidated by build file changes.

use std::sync::Arc;

use parking_lot::Mutex;

use slipway_core::{CancellationToken, CoreError};

use crate::connection::{ScopedConnection, ToolingConnector};
use crate::snapshot::BuildModel;

/// How a model fetch interacts with the provider cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Return the cached value or nothing; never touch the build tool.
    FromCacheOnly,
    /// Return the cached value, loading it first if absent.
    LoadIfNotCached,
    /// Always load a fresh value and replace the cache.
    ForceReload,
}

pub struct ModelProvider {
    connector: Arc<dyn ToolingConnector>,
    cache: Mutex<Option<Arc<BuildModel>>>,
}

impl ModelProvider {
    pub fn new(connector: Arc<dyn ToolingConnector>) -> Self {
        Self {
            connector,
            cache: Mutex::new(None),
        }
    }

    /// Fetch the build model according to the strategy. Only
    /// [`FetchStrategy::FromCacheOnly`] can return `None`.
    pub fn fetch_model(
        &self,
        strategy: FetchStrategy,
        token: &CancellationToken,
    ) -> Result<Option<Arc<BuildModel>>, CoreError> {
        if strategy != FetchStrategy::ForceReload {
            if let Some(cached) = self.cache.lock().clone() {
                return Ok(Some(cached));
            }
            if strategy == FetchStrategy::FromCacheOnly {
                return Ok(None);
            }
        }

        let mut connection = ScopedConnection::open(self.connector.as_ref())?;
        let model = Arc::new(connection.fetch_build_model(token)?);
        *self.cache.lock() = Some(model.clone());
        Ok(Some(model))
    }

    /// Drop the cached model so the next load hits the build tool.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }

    pub fn connector(&self) -> &Arc<dyn ToolingConnector> {
        &self.connector
    }
}
