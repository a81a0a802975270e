use crate::{AppState, Effect, Msg, Settings};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SettingsLoaded(settings) => {
            let interval_secs = settings.auto_refresh_secs;
            state.replace_settings(settings);
            vec![Effect::ScheduleAutoRefresh { interval_secs }]
        }
        Msg::EndpointChanged(url) => edit_settings(&mut state, |s| {
            s.endpoint_url = url.trim().to_string();
        }),
        Msg::DeleteEndpointChanged(url) => edit_settings(&mut state, |s| {
            s.delete_url = url.trim().to_string();
        }),
        Msg::DarkModeChanged(dark_mode) => edit_settings(&mut state, |s| {
            s.dark_mode = dark_mode;
        }),
        Msg::AutoRefreshChanged(interval_secs) => {
            let mut effects = edit_settings(&mut state, |s| {
                s.auto_refresh_secs = interval_secs;
            });
            if !effects.is_empty() {
                effects.push(Effect::ScheduleAutoRefresh { interval_secs });
            }
            effects
        }
        Msg::RefreshClicked => {
            // The refresh control is disabled while a fetch is pending.
            if state.is_loading() {
                Vec::new()
            } else {
                fetch_effects(&mut state)
            }
        }
        // Timer fetches may overlap a pending one.
        Msg::AutoRefreshFired => fetch_effects(&mut state),
        Msg::FetchCompleted {
            request_id,
            received_at_ms,
            result,
        } => {
            state.apply_fetch_result(request_id, received_at_ms, result);
            Vec::new()
        }
        Msg::CopyClicked { id } => match state.code_by_id(&id).map(|r| r.code.clone()) {
            Some(code) => {
                state.set_copied(id.clone());
                vec![Effect::CopyToClipboard { id, code }]
            }
            None => Vec::new(),
        },
        Msg::CopyFeedbackExpired { id } => {
            state.expire_copied(&id);
            Vec::new()
        }
        Msg::DismissCode { id } => {
            state.dismiss(&id);
            Vec::new()
        }
        Msg::ClearAllClicked => {
            if state.is_deleting() {
                Vec::new()
            } else if state.settings().delete_url.is_empty() {
                state.clear_codes();
                Vec::new()
            } else {
                state.begin_delete();
                vec![Effect::DeleteAll {
                    url: state.settings().delete_url.clone(),
                }]
            }
        }
        Msg::DeleteCompleted { result } => {
            state.apply_delete_result(result);
            Vec::new()
        }
        Msg::Tick { now_ms } => {
            state.set_now(now_ms);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn fetch_effects(state: &mut AppState) -> Vec<Effect> {
    match state.begin_fetch() {
        Some((request_id, url)) => vec![Effect::FetchCodes { request_id, url }],
        None => Vec::new(),
    }
}

/// Applies `edit` and emits a persist effect only when something changed.
fn edit_settings(state: &mut AppState, edit: impl FnOnce(&mut Settings)) -> Vec<Effect> {
    let mut settings = state.settings().clone();
    edit(&mut settings);
    if &settings == state.settings() {
        return Vec::new();
    }
    state.replace_settings(settings.clone());
    vec![Effect::PersistSettings(settings)]
}
