//! Application context - dependency injection container

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reeltime_core::{
    ActivityMonitor, Clock, CrashRecoveryService, GracePeriods, ProjectMonitor, RecoveryReport,
    SessionRepository, SessionStateMachine, StatisticsService, SystemClock,
};
use reeltime_domain::constants::{DEBUG_GRACE_END_SECS, DEBUG_GRACE_START_SECS};
use reeltime_domain::{Config, ProjectTotal, Result, SessionEvent, TrackingStatus};
use reeltime_infra::platform::{
    install_bridge_script, PollingActivityMonitor, PollingProjectMonitor, ResolveScriptProbe,
};
use reeltime_infra::{
    config, DbManager, EventRouter, EventRouterConfig, InstanceLock, SessionPersister,
    SqliteSessionRepository,
};
use tokio::sync::{broadcast, watch};
use tracing::{error, info, instrument, warn};

/// Type alias for session repository port trait object
type DynSessionRepository = dyn SessionRepository + 'static;

/// Application context - holds the store and the services built on it
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub sessions: Arc<DynSessionRepository>,
    pub statistics: Arc<StatisticsService>,
    clock: Arc<dyn Clock>,
}

impl AppContext {
    /// Create a context from the configuration found by the loader
    pub async fn new() -> Result<Self> {
        Self::new_with_config(config::load()?).await
    }

    /// Load configuration from `path` (or the standard locations) and apply
    /// the debug grace periods when asked.
    pub fn load_config(path: Option<PathBuf>, debug: bool) -> Result<Config> {
        let mut config = match path {
            Some(path) => config::load_from_file(Some(path))?,
            None => config::load()?,
        };
        if debug {
            config.tracking.grace_start_secs = DEBUG_GRACE_START_SECS;
            config.tracking.grace_end_secs = DEBUG_GRACE_END_SECS;
        }
        Ok(config)
    }

    /// Create a new application context with custom configuration
    ///
    /// Opens the database and applies the schema. Tests use this to point
    /// the context at a temporary database.
    pub async fn new_with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let sessions: Arc<DynSessionRepository> =
            Arc::new(SqliteSessionRepository::new(Arc::clone(&db)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let statistics = Arc::new(StatisticsService::new(sessions.clone(), clock.clone()));

        info!(
            db_path = %db.path().display(),
            user_id = %config.tracking.user_id,
            grace_start_secs = config.tracking.grace_start_secs,
            grace_end_secs = config.tracking.grace_end_secs,
            "Application context initialised"
        );

        Ok(Self { config, db, sessions, statistics, clock })
    }

    pub fn user_id(&self) -> &str {
        &self.config.tracking.user_id
    }

    /// Close the current user's sessions left open by a previous run.
    #[instrument(skip(self))]
    pub async fn recover(&self) -> Result<RecoveryReport> {
        let service = CrashRecoveryService::new(self.sessions.clone(), self.clock.clone());
        let report = service.recover(self.user_id()).await?;
        info!(
            closed = report.closed.len(),
            deleted = report.deleted.len(),
            "Crash recovery finished"
        );
        Ok(report)
    }

    /// Per-project totals of the current user since `since` (all time when
    /// `None`).
    pub async fn project_totals(&self, since: Option<DateTime<Utc>>) -> Result<Vec<ProjectTotal>> {
        self.statistics.project_totals(self.user_id(), since).await
    }

    /// Start tracking with the Resolve bridge and idle helper from config.
    ///
    /// Installs the bundled bridge script next to the database when no
    /// script is configured.
    pub async fn start_tracking(&self) -> Result<TrackingRuntime> {
        let monitors = &self.config.monitors;
        let script = match &monitors.resolve_script {
            Some(path) => path.clone(),
            None => install_bridge_script(&self.data_dir())?,
        };

        let probe = ResolveScriptProbe::from_config(monitors, script);
        let project: Arc<dyn ProjectMonitor> = Arc::new(PollingProjectMonitor::new(
            Arc::new(probe),
            monitors.project_poll_interval(),
        ));
        let activity: Arc<dyn ActivityMonitor> =
            Arc::new(PollingActivityMonitor::from_config(monitors));

        self.start_tracking_with(project, activity).await
    }

    /// Start tracking fed by the given monitors.
    ///
    /// Takes the database's instance lock and runs crash recovery first; a
    /// recovery failure aborts startup. The persister starts before the
    /// router so the first notification is never missed.
    #[instrument(skip_all)]
    pub async fn start_tracking_with(
        &self,
        project: Arc<dyn ProjectMonitor>,
        activity: Arc<dyn ActivityMonitor>,
    ) -> Result<TrackingRuntime> {
        let lock = InstanceLock::acquire_for_database(self.db.path())?;

        self.recover().await.map_err(|e| {
            error!(error = %e, "Crash recovery failed; refusing to start tracking");
            e
        })?;

        let tracking = &self.config.tracking;
        let machine = SessionStateMachine::new(
            tracking.user_id.clone(),
            GracePeriods::from(tracking),
            self.clock.clone(),
        );
        let mut router =
            EventRouter::new(machine, project, activity, EventRouterConfig::from(tracking));

        let mut persister = SessionPersister::new(self.sessions.clone());
        persister.start(router.subscribe()).await?;

        if let Err(e) = router.start().await {
            if let Err(stop_err) = persister.stop().await {
                warn!(error = %stop_err, "Failed to stop session persister after start failure");
            }
            return Err(e.into());
        }

        info!("Tracking started");
        Ok(TrackingRuntime { router, persister, _lock: lock })
    }

    fn data_dir(&self) -> PathBuf {
        self.db
            .path()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

/// Running tracker: router, persister and the instance lock
pub struct TrackingRuntime {
    router: EventRouter,
    persister: SessionPersister,
    _lock: InstanceLock,
}

impl TrackingRuntime {
    /// Latest tracking status
    pub fn status(&self) -> watch::Receiver<TrackingStatus> {
        self.router.status()
    }

    /// Subscribe to session lifecycle notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.router.subscribe()
    }

    /// Stop the router (final close and checkpoint), then let the persister
    /// write everything still queued. Releases the instance lock.
    #[instrument(skip_all)]
    pub async fn shutdown(mut self) -> Result<()> {
        info!("Shutting down tracking");

        let router = self.router.stop().await;
        if let Err(e) = &router {
            error!(error = %e, "Event router did not stop cleanly");
        }
        self.persister.stop().await?;
        router?;

        info!(state = %self.router.status().borrow().state, "Tracking stopped");
        Ok(())
    }
}
