//! Integration tests for session and tracking types
//!
//! Covers the session lifecycle as the tracker drives it and the JSON shape
//! of the types that cross process boundaries (status, notifications, config).

use chrono::{DateTime, Duration, TimeZone, Utc};
use reeltime_domain::{
    Config, MonitorEvent, Session, SessionDraft, SessionEvent, TrackingState, TrackingStatus,
};
use serde_json::json;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap() + Duration::seconds(secs)
}

// ============================================================================
// Session lifecycle
// ============================================================================

/// Scenario: grace start at t=0, promotion at t=3, grace end from t=4,
/// close at t=9. The closed session spans the whole 9 seconds.
#[test]
fn test_session_lifecycle_spans_grace_periods() {
    let draft = SessionDraft::new("Alpha", at(0));
    let mut session = draft.promote("editor");

    assert!(session.is_open());
    assert!(!session.is_unpromoted());
    assert_eq!(session.duration(at(3)), Duration::seconds(3));

    session.last_flushed_at = Some(at(6));
    session.close(at(9));

    assert!(!session.is_open());
    assert_eq!(session.duration(at(3_600)), Duration::seconds(9));
}

#[test]
fn test_sessions_get_distinct_ids() {
    let first = Session::open("editor", "Alpha", at(0));
    let second = Session::open("editor", "Alpha", at(0));

    assert_ne!(first.id, second.id);
    assert_eq!(first.id.get_version_num(), 7);
}

// ============================================================================
// Wire shapes
// ============================================================================

#[test]
fn test_monitor_events_are_tagged_by_kind() {
    let changed = serde_json::to_value(MonitorEvent::ProjectChanged(Some("Alpha".into()))).unwrap();
    assert_eq!(changed, json!({ "kind": "project_changed", "project": "Alpha" }));

    let closed = serde_json::to_value(MonitorEvent::ProjectChanged(None)).unwrap();
    assert_eq!(closed, json!({ "kind": "project_changed", "project": null }));

    let focus = serde_json::to_value(MonitorEvent::FocusGained).unwrap();
    assert_eq!(focus, json!({ "kind": "focus_gained" }));
}

#[test]
fn test_session_event_carries_full_record() {
    let session = Session::open("editor", "Alpha", at(0));
    let value = serde_json::to_value(SessionEvent::Started(session.clone())).unwrap();

    assert_eq!(value["kind"], "started");
    assert_eq!(value["session"]["project_name"], "Alpha");
    assert_eq!(value["session"]["ended_at"], serde_json::Value::Null);

    let back: SessionEvent = serde_json::from_value(value).unwrap();
    assert_eq!(back.session(), &session);
}

#[test]
fn test_status_reports_state_in_snake_case() {
    let status = TrackingStatus {
        state: TrackingState::GraceEnd,
        project: Some("Alpha".into()),
        session: None,
        grace_started_at: Some(at(10)),
    };

    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["state"], "grace_end");
    assert_eq!(status.grace_elapsed(at(14)), Some(Duration::seconds(4)));
    assert_eq!(status.grace_elapsed(at(5)), Some(Duration::zero()));
}

#[test]
fn test_partial_config_keeps_defaults() {
    let config: Config = serde_json::from_value(json!({
        "tracking": { "user_id": "colorist" },
        "monitors": { "idle_command": ["xprintidle"] }
    }))
    .unwrap();

    let defaults = Config::default();
    assert_eq!(config.tracking.user_id, "colorist");
    assert_eq!(config.tracking.grace_start_secs, defaults.tracking.grace_start_secs);
    assert_eq!(config.database, defaults.database);
    assert_eq!(config.monitors.idle_command, Some(vec!["xprintidle".to_string()]));
    assert!(config.validate().is_ok());
}
