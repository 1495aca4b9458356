//! Background job scheduling for synchronization runs.
//!
//! A newly requested job that an in-flight job already covers (same build
//! set, compatible new-project policy) is dropped instead of queued. Jobs
//! that do run are serialized against each other through one workspace-wide
//! lock, mirroring a host scheduler's workspace-root rule.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;

use slipway_core::{CancellationToken, CoreError};

use crate::operation::{NewProjectHandler, SyncOutcome};

/// What a synchronization job is asked to cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynchronizationRequest {
    /// Root directories of the builds to synchronize.
    pub build_roots: BTreeSet<PathBuf>,
    pub new_project_handler: NewProjectHandler,
}

impl SynchronizationRequest {
    pub fn new(build_roots: BTreeSet<PathBuf>, new_project_handler: NewProjectHandler) -> Self {
        Self {
            build_roots,
            new_project_handler,
        }
    }

    /// An in-flight job covers this request when it spans the same builds
    /// and its new-project policy subsumes ours. A no-op policy is covered
    /// by anything; an importing policy only by another importing job.
    fn is_covered_by(&self, active: &SynchronizationRequest) -> bool {
        self.build_roots == active.build_roots
            && (self.new_project_handler == NewProjectHandler::NoOp
                || self.new_project_handler == active.new_project_handler)
    }
}

/// Outcome of a schedule call.
pub enum ScheduleOutcome {
    Scheduled(JobHandle),
    /// A covering job is already running; this request was dropped.
    Coalesced,
}

impl ScheduleOutcome {
    pub fn was_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled(_))
    }
}

/// Handle to one running synchronization job.
pub struct JobHandle {
    token: CancellationToken,
    thread: JoinHandle<Result<SyncOutcome, CoreError>>,
}

impl JobHandle {
    /// Request cooperative cancellation; the job stops between steps.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn join(self) -> Result<SyncOutcome, CoreError> {
        self.thread
            .join()
            .unwrap_or_else(|_| Err(CoreError::message("synchronization job panicked")))
    }
}

struct ActiveJob {
    id: u64,
    request: SynchronizationRequest,
    token: CancellationToken,
}

#[derive(Clone, Default)]
pub struct SynchronizationJobManager {
    workspace_lock: Arc<Mutex<()>>,
    active: Arc<Mutex<Vec<ActiveJob>>>,
    next_id: Arc<AtomicU64>,
}

impl SynchronizationJobManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `run` for the request unless an in-flight job covers it.
    /// The closure receives the job's cancellation token and runs with the
    /// workspace lock held.
    pub fn schedule<F>(&self, request: SynchronizationRequest, run: F) -> ScheduleOutcome
    where
        F: FnOnce(&CancellationToken) -> Result<SyncOutcome, CoreError> + Send + 'static,
    {
        let token = CancellationToken::new();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut active = self.active.lock();
            if active.iter().any(|job| request.is_covered_by(&job.request)) {
                tracing::debug!(target: "slipway.sync", "dropping synchronization request covered by a running job");
                return ScheduleOutcome::Coalesced;
            }
            active.push(ActiveJob {
                id,
                request,
                token: token.clone(),
            });
        }

        let workspace_lock = self.workspace_lock.clone();
        let active = self.active.clone();
        let job_token = token.clone();
        let thread = std::thread::spawn(move || {
            let result = {
                let _workspace = workspace_lock.lock();
                run(&job_token)
            };
            active.lock().retain(|job| job.id != id);
            result
        });

        ScheduleOutcome::Scheduled(JobHandle { token, thread })
    }

    /// Cancel every in-flight job.
    pub fn cancel_all(&self) {
        for job in self.active.lock().iter() {
            job.token.cancel();
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.active.lock().len()
    }
}
