//! Per-project time totals

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reeltime_domain::{ProjectTotal, Result, Session};
use tracing::{debug, instrument};

use crate::tracking::ports::{Clock, SessionRepository};

/// Aggregates stored sessions into per-project totals
pub struct StatisticsService {
    repository: Arc<dyn SessionRepository>,
    clock: Arc<dyn Clock>,
}

impl StatisticsService {
    pub fn new(repository: Arc<dyn SessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Totals for `user_id` over `[since, now]` (all time when `since` is
    /// `None`), largest first.
    ///
    /// Sessions are clipped to the window. An open session counts up to its
    /// last checkpoint, or up to now when it has none yet: a session left
    /// open by a previous run stops at its final checkpoint instead of
    /// growing until recovery closes it.
    #[instrument(skip(self))]
    pub async fn project_totals(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ProjectTotal>> {
        let sessions = self.repository.sessions_for_user(user_id, since).await?;
        let totals = aggregate(&sessions, since, self.clock.now());
        debug!(sessions = sessions.len(), projects = totals.len(), "Computed project totals");
        Ok(totals)
    }
}

fn aggregate(
    sessions: &[Session],
    since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Vec<ProjectTotal> {
    let mut by_project: HashMap<&str, ProjectTotal> = HashMap::new();

    for session in sessions.iter().filter(|s| !s.is_unpromoted()) {
        let start = since.map_or(session.started_at, |since| session.started_at.max(since));
        let end = counted_end(session, now);
        if end <= start {
            continue;
        }

        let total = by_project.entry(session.project_name.as_str()).or_insert_with(|| {
            ProjectTotal {
                project_name: session.project_name.clone(),
                session_count: 0,
                total_seconds: 0,
            }
        });
        total.session_count += 1;
        total.total_seconds += (end - start).num_seconds();
    }

    let mut totals: Vec<_> = by_project.into_values().collect();
    totals.sort_by(|a, b| {
        b.total_seconds.cmp(&a.total_seconds).then_with(|| a.project_name.cmp(&b.project_name))
    });
    totals
}

fn counted_end(session: &Session, now: DateTime<Utc>) -> DateTime<Utc> {
    session.ended_at.or(session.last_flushed_at).unwrap_or(now).min(now)
}
