//! Lifecycle of a background polling task
//!
//! Monitors expose `start`/`stop` through `&self`, so the cancellation token
//! and join handle live behind locks here.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use reeltime_domain::Result as DomainResult;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::scheduling::SchedulerError;

const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) struct Poller {
    name: &'static str,
    cancel: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name, cancel: Mutex::new(CancellationToken::new()), task: Mutex::new(None) }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Spawn the loop built by `make_loop` with a fresh cancellation token.
    pub(crate) fn spawn<F, Fut>(&self, make_loop: F) -> DomainResult<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(SchedulerError::AlreadyRunning(self.name).into());
        }

        let cancel = CancellationToken::new();
        *self.cancel.lock() = cancel.clone();
        *task = Some(tokio::spawn(make_loop(cancel)));
        debug!(monitor = self.name, "Polling started");
        Ok(())
    }

    /// Cancel and join the loop; a no-op when nothing is running.
    pub(crate) async fn stop(&self) -> DomainResult<()> {
        self.cancel.lock().cancel();
        let Some(handle) = self.task.lock().take() else {
            return Ok(());
        };

        match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => {
                debug!(monitor = self.name, "Polling stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(SchedulerError::TaskJoinFailed(e.to_string()).into()),
            Err(_) => {
                warn!(monitor = self.name, "Polling task did not stop in time");
                Err(SchedulerError::Timeout { seconds: JOIN_TIMEOUT.as_secs() }.into())
            }
        }
    }
}
