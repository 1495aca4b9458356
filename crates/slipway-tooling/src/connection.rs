//! Connection seam to the build tool. The engine only ever talks to these
//! traits, so tests and the snapshot-backed connector plug in without any
//! process plumbing.

use slipway_core::{CancellationToken, CoreError};

use crate::snapshot::BuildModel;

/// Opens connections to a Gradle build rooted at a directory.
pub trait ToolingConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn ToolingConnection>, CoreError>;
}

/// One open connection. Connections are short-lived; every fetch in the
/// engine goes through [`ScopedConnection`] so the connection is closed on
/// success, error, and cancellation alike.
pub trait ToolingConnection: Send {
    /// Query the full project model of the build, including included builds.
    fn fetch_build_model(&mut self, token: &CancellationToken) -> Result<BuildModel, CoreError>;

    /// Run build tasks by path, e.g. `:app:eclipseClasspath`.
    fn run_tasks(&mut self, tasks: &[String], token: &CancellationToken)
        -> Result<(), CoreError>;

    fn close(&mut self);
}

/// RAII wrapper that closes the underlying connection when dropped.
pub struct ScopedConnection {
    inner: Box<dyn ToolingConnection>,
}

impl ScopedConnection {
    pub fn open(connector: &dyn ToolingConnector) -> Result<Self, CoreError> {
        Ok(Self {
            inner: connector.connect()?,
        })
    }

    pub fn fetch_build_model(
        &mut self,
        token: &CancellationToken,
    ) -> Result<BuildModel, CoreError> {
        self.inner.fetch_build_model(token)
    }

    pub fn run_tasks(
        &mut self,
        tasks: &[String],
        token: &CancellationToken,
    ) -> Result<(), CoreError> {
        self.inner.run_tasks(tasks, token)
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    struct TrackingConnection {
        closed: Arc<AtomicBool>,
    }

    impl ToolingConnection for TrackingConnection {
        fn fetch_build_model(
            &mut self,
            _token: &CancellationToken,
        ) -> Result<BuildModel, CoreError> {
            Err(CoreError::ModelFetch("boom".to_string()))
        }

        fn run_tasks(
            &mut self,
            _tasks: &[String],
            _token: &CancellationToken,
        ) -> Result<(), CoreError> {
            Ok(())
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct TrackingConnector {
        closed: Arc<AtomicBool>,
    }

    impl ToolingConnector for TrackingConnector {
        fn connect(&self) -> Result<Box<dyn ToolingConnection>, CoreError> {
            Ok(Box::new(TrackingConnection {
                closed: self.closed.clone(),
            }))
        }
    }

    #[test]
    fn connection_is_closed_even_when_the_fetch_fails() {
        let closed = Arc::new(AtomicBool::new(false));
        let connector = TrackingConnector {
            closed: closed.clone(),
        };

        let token = CancellationToken::new();
        {
            let mut connection = ScopedConnection::open(&connector).unwrap();
            assert!(connection.fetch_build_model(&token).is_err());
        }
        assert!(closed.load(Ordering::SeqCst));
    }
}
