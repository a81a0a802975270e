use std::sync::Once;

use codes_core::{
    update, AppError, AppState, Effect, EmptyState, Msg, NormalizeError, Settings,
    TransportFailure,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const NOW: i64 = 1_729_411_260_000;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(codes_logging::initialize_for_tests);
}

fn configured(endpoint: &str, delete_url: &str) -> AppState {
    let settings = Settings {
        endpoint_url: endpoint.to_string(),
        delete_url: delete_url.to_string(),
        ..Settings::default()
    };
    let (mut state, _) = update(AppState::new(), Msg::SettingsLoaded(settings));
    state.consume_dirty();
    state
}

fn complete(state: AppState, request_id: u64, result: Result<Value, TransportFailure>) -> AppState {
    let (state, effects) = update(
        state,
        Msg::FetchCompleted {
            request_id,
            received_at_ms: NOW,
            result,
        },
    );
    assert!(effects.is_empty());
    state
}

fn two_codes() -> Value {
    json!({
        "success": true,
        "data": [
            { "id": "older", "code": "111111", "phone": "+1", "time": 1_729_411_200 },
            { "id": "newer", "code": "222222", "phone": "+2", "time": 1_729_411_230_000u64 }
        ]
    })
}

#[test]
fn refresh_without_endpoint_sets_banner_and_emits_nothing() {
    init_logging();
    let (mut state, effects) = update(AppState::new(), Msg::RefreshClicked);

    assert!(effects.is_empty());
    assert_eq!(state.banner(), Some(&AppError::EmptyUrl));
    assert!(state.consume_dirty());
    assert_eq!(
        state.view().banner.as_deref(),
        Some("configure an endpoint URL in settings first")
    );
}

#[test]
fn empty_state_reflects_configuration() {
    init_logging();
    assert_eq!(AppState::new().view().empty_state, EmptyState::NotConfigured);

    let state = configured("https://worker.example/api/codes", "");
    assert_eq!(state.view().empty_state, EmptyState::NoCodes);

    let (state, _) = update(state, Msg::RefreshClicked);
    assert!(state.view().is_loading);
    assert_eq!(state.view().empty_state, EmptyState::None);
}

#[test]
fn refresh_emits_fetch_with_increasing_request_ids() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");

    let (state, effects) = update(state, Msg::RefreshClicked);
    assert_eq!(
        effects,
        vec![Effect::FetchCodes {
            request_id: 1,
            url: "https://worker.example/api/codes".to_string(),
        }]
    );

    // Manual refresh is ignored while loading.
    let (state, effects) = update(state, Msg::RefreshClicked);
    assert!(effects.is_empty());

    // The timer is not.
    let (state, effects) = update(state, Msg::AutoRefreshFired);
    assert_eq!(
        effects,
        vec![Effect::FetchCodes {
            request_id: 2,
            url: "https://worker.example/api/codes".to_string(),
        }]
    );
    assert!(state.is_loading());
}

#[test]
fn successful_fetch_sorts_by_recency_and_clears_banner() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::RefreshClicked);
    assert!(state.banner().is_some());
    let (state, _) = update(
        state,
        Msg::EndpointChanged("https://worker.example/api/codes".to_string()),
    );
    assert_eq!(state.banner(), None);

    let (state, _) = update(state, Msg::RefreshClicked);
    let mut state = complete(state, 1, Ok(two_codes()));

    assert!(state.consume_dirty());
    let view = state.view();
    assert!(!view.is_loading);
    assert_eq!(view.banner, None);
    let ids: Vec<_> = view.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["newer", "older"]);
    assert_eq!(view.rows[0].relative_time, "just now");
    assert_eq!(view.rows[1].relative_time, "1 minute ago");
    assert_eq!(view.rows[1].absolute_time, "10-20 08:00:00");
    assert_eq!(view.last_refresh_label.as_deref(), Some("10-20 08:01:00"));
}

#[test]
fn failed_fetch_keeps_previous_codes() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 1, Ok(two_codes()));

    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 2, Err(TransportFailure::HttpStatus { status: 502 }));

    assert_eq!(state.codes().len(), 2);
    assert_eq!(
        state.banner(),
        Some(&AppError::Transport(TransportFailure::HttpStatus {
            status: 502
        }))
    );
    assert_eq!(state.view().banner.as_deref(), Some("server returned HTTP 502"));
}

#[test]
fn normalization_failures_reach_banner() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(
        state,
        1,
        Ok(json!({ "success": false, "data": [], "message": "quota exceeded" })),
    );

    assert_eq!(
        state.banner(),
        Some(&AppError::Normalize(
            NormalizeError::ServerReportedFailure {
                detail: Some("quota exceeded".to_string())
            }
        ))
    );
    assert_eq!(
        state.view().banner.as_deref(),
        Some("server reported failure: quota exceeded")
    );
}

#[test]
fn last_completed_fetch_wins_regardless_of_issue_order() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let (state, _) = update(state, Msg::AutoRefreshFired);

    let newer_payload = json!([{ "id": "from-2", "code": "222222", "phone": "+2" }]);
    let older_payload = json!([{ "id": "from-1", "code": "111111", "phone": "+1" }]);

    let state = complete(state, 2, Ok(newer_payload));
    assert!(state.is_loading());
    let state = complete(state, 1, Ok(older_payload));

    assert!(!state.is_loading());
    assert_eq!(state.codes()[0].id, "from-1");
}

#[test]
fn settings_edits_persist_only_on_change() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::EndpointChanged("  https://worker.example/api/codes  ".to_string()),
    );
    let expected = Settings {
        endpoint_url: "https://worker.example/api/codes".to_string(),
        ..Settings::default()
    };
    assert_eq!(effects, vec![Effect::PersistSettings(expected)]);

    let (state, effects) = update(
        state,
        Msg::EndpointChanged("https://worker.example/api/codes".to_string()),
    );
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::DarkModeChanged(Some(true)));
    assert_eq!(effects.len(), 1);
    assert_eq!(state.view().dark_mode, Some(true));

    let (state, effects) = update(state, Msg::AutoRefreshChanged(30));
    assert_eq!(
        effects,
        vec![
            Effect::PersistSettings(state.settings().clone()),
            Effect::ScheduleAutoRefresh { interval_secs: 30 },
        ]
    );
    assert_eq!(state.view().auto_refresh_secs, 30);
}

#[test]
fn settings_loaded_schedules_timer() {
    init_logging();
    let settings = Settings {
        auto_refresh_secs: 15,
        ..Settings::default()
    };
    let (_state, effects) = update(AppState::new(), Msg::SettingsLoaded(settings));
    assert_eq!(effects, vec![Effect::ScheduleAutoRefresh { interval_secs: 15 }]);
}

#[test]
fn copy_marks_row_until_feedback_expires() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 1, Ok(two_codes()));

    let (state, effects) = update(state, Msg::CopyClicked { id: "older".to_string() });
    assert_eq!(
        effects,
        vec![Effect::CopyToClipboard {
            id: "older".to_string(),
            code: "111111".to_string(),
        }]
    );
    let copied: Vec<_> = state.view().rows.iter().filter(|r| r.copied).map(|r| r.id.clone()).collect();
    assert_eq!(copied, vec!["older".to_string()]);

    let (state, _) = update(state, Msg::CopyFeedbackExpired { id: "older".to_string() });
    assert!(state.view().rows.iter().all(|r| !r.copied));

    let (_state, effects) = update(state, Msg::CopyClicked { id: "missing".to_string() });
    assert!(effects.is_empty());
}

#[test]
fn dismiss_removes_single_code_locally() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 1, Ok(two_codes()));

    let (state, effects) = update(state, Msg::DismissCode { id: "newer".to_string() });
    assert!(effects.is_empty());
    assert_eq!(state.codes().len(), 1);
    assert_eq!(state.codes()[0].id, "older");
}

#[test]
fn clear_all_without_delete_url_clears_locally() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 1, Ok(two_codes()));

    let (state, effects) = update(state, Msg::ClearAllClicked);
    assert!(effects.is_empty());
    assert!(state.codes().is_empty());
}

#[test]
fn clear_all_with_delete_url_waits_for_server() {
    init_logging();
    let state = configured(
        "https://worker.example/api/codes",
        "https://worker.example/api/delete",
    );
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 1, Ok(two_codes()));

    let (state, effects) = update(state, Msg::ClearAllClicked);
    assert_eq!(
        effects,
        vec![Effect::DeleteAll {
            url: "https://worker.example/api/delete".to_string(),
        }]
    );
    assert!(state.view().is_deleting);
    assert_eq!(state.codes().len(), 2);

    // A second click while deleting does nothing.
    let (state, effects) = update(state, Msg::ClearAllClicked);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::DeleteCompleted {
            result: Err(TransportFailure::HttpStatus { status: 500 }),
        },
    );
    assert_eq!(state.codes().len(), 2);
    assert_eq!(
        state.view().banner.as_deref(),
        Some("bulk delete failed: server returned HTTP 500")
    );

    let (state, _) = update(state, Msg::ClearAllClicked);
    let (state, _) = update(state, Msg::DeleteCompleted { result: Ok(()) });
    assert!(state.codes().is_empty());
    assert!(!state.view().is_deleting);
    assert_eq!(state.banner(), None);
}

#[test]
fn transport_empty_url_maps_to_configuration_banner() {
    init_logging();
    let state = configured("https://worker.example/api/codes", "");
    let (state, _) = update(state, Msg::RefreshClicked);
    let state = complete(state, 1, Err(TransportFailure::EmptyUrl));
    assert_eq!(state.banner(), Some(&AppError::EmptyUrl));
}
