//! Session persister: writes lifecycle notifications to the store.
//!
//! Every [`SessionEvent`] carries the full session record, so persisting is a
//! single upsert per event, applied in emission order. Store failures are
//! logged and skipped; the in-memory state machine stays authoritative and
//! the next checkpoint or end rewrites the record.
//!
//! A lagging receiver may have missed an `Ended`. The first event after a lag
//! therefore closes every other open record of that user, at its last
//! checkpoint or at the start of the event's session, since the machine never
//! holds two open sessions.

use std::sync::Arc;
use std::time::Duration;

use reeltime_core::SessionRepository;
use reeltime_domain::{Session, SessionEvent};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

const COMPONENT: &str = "session persister";

/// Background task persisting session notifications
pub struct SessionPersister {
    repository: Arc<dyn SessionRepository>,
    cancellation_token: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
    join_timeout: Duration,
}

impl SessionPersister {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self {
            repository,
            cancellation_token: CancellationToken::new(),
            task_handle: None,
            join_timeout: Duration::from_secs(10),
        }
    }

    /// Check if the persister is running
    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Start consuming `events`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyRunning` if the persister is running.
    #[instrument(skip(self, events))]
    pub async fn start(&mut self, events: broadcast::Receiver<SessionEvent>) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning(COMPONENT));
        }

        self.cancellation_token = CancellationToken::new();
        let cancel = self.cancellation_token.clone();
        let repository = Arc::clone(&self.repository);

        self.task_handle =
            Some(tokio::spawn(async move { Self::persist_loop(repository, events, cancel).await }));

        info!("Session persister started");
        Ok(())
    }

    /// Persist everything already queued, then stop. A no-op when stopped.
    ///
    /// Call after the event router has stopped so its final close and flush
    /// are written.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or `TaskJoinFailed` if the loop does not finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        let Some(handle) = self.task_handle.take() else {
            debug!("Session persister not running; nothing to stop");
            return Ok(());
        };

        self.cancellation_token.cancel();
        tokio::time::timeout(self.join_timeout, handle)
            .await
            .map_err(|_| SchedulerError::Timeout { seconds: self.join_timeout.as_secs() })?
            .map_err(|e| SchedulerError::TaskJoinFailed(e.to_string()))?;

        info!("Session persister stopped");
        Ok(())
    }

    async fn persist_loop(
        repository: Arc<dyn SessionRepository>,
        mut events: broadcast::Receiver<SessionEvent>,
        cancel: CancellationToken,
    ) {
        let mut lagged = false;
        loop {
            tokio::select! {
                biased;
                received = events.recv() => match received {
                    Ok(event) => handle(repository.as_ref(), &event, &mut lagged).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session persister lagged; reconciling on next event");
                        lagged = true;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Session event channel closed");
                        return;
                    }
                },
                _ = cancel.cancelled() => break,
            }
        }

        loop {
            match events.try_recv() {
                Ok(event) => handle(repository.as_ref(), &event, &mut lagged).await,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session persister lagged while draining");
                    lagged = true;
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }
}

async fn handle(repository: &dyn SessionRepository, event: &SessionEvent, lagged: &mut bool) {
    if std::mem::take(lagged) {
        close_orphans(repository, event.session()).await;
    }
    persist(repository, event).await;
}

async fn persist(repository: &dyn SessionRepository, event: &SessionEvent) {
    let session = event.session();
    match repository.upsert(session).await {
        Ok(()) => debug!(session_id = %session.id, kind = event.kind(), "Session persisted"),
        Err(e) => error!(
            session_id = %session.id,
            kind = event.kind(),
            error = %e,
            "Failed to persist session; continuing"
        ),
    }
}

/// Close open records of `current`'s user other than `current` itself.
async fn close_orphans(repository: &dyn SessionRepository, current: &Session) {
    let open = match repository.open_sessions_for_user(&current.user_id).await {
        Ok(open) => open,
        Err(e) => {
            error!(error = %e, "Failed to load open sessions after lag");
            return;
        }
    };

    for mut orphan in open.into_iter().filter(|s| s.id != current.id) {
        orphan.close(orphan.last_flushed_at.unwrap_or(current.started_at).min(current.started_at));
        match repository.upsert(&orphan).await {
            Ok(()) => warn!(
                session_id = %orphan.id,
                ended_at = ?orphan.ended_at,
                "Closed session whose end was missed"
            ),
            Err(e) => error!(session_id = %orphan.id, error = %e, "Failed to close missed session"),
        }
    }
}
