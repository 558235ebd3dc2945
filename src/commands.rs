//! Tauri commands exposed to the frontend.

use tauri::State;

use crate::{models::MeetingRecord, settings::AlertConfig, AppState};

/// Replace the meeting list; returns how many meetings were alerted by the
/// immediate pass that follows.
#[tauri::command]
pub async fn set_meetings(
    state: State<'_, AppState>,
    meetings: Vec<MeetingRecord>,
) -> Result<usize, String> {
    Ok(state.service.set_meetings(meetings))
}

#[tauri::command]
pub async fn get_alert_config(state: State<'_, AppState>) -> Result<AlertConfig, String> {
    Ok(state.service.config())
}

#[tauri::command]
pub async fn update_alert_config(
    state: State<'_, AppState>,
    config: AlertConfig,
) -> Result<AlertConfig, String> {
    state
        .service
        .update_config(config)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn trigger_test_alert(state: State<'_, AppState>) -> Result<(), String> {
    // Channels run detached; nothing to wait for here.
    let _ = state.service.trigger_test_alert();
    Ok(())
}

#[tauri::command]
pub async fn force_overlay_cleanup(state: State<'_, AppState>) -> Result<(), String> {
    state.service.force_overlay_cleanup();
    Ok(())
}

#[tauri::command]
pub async fn get_alerted_ids(state: State<'_, AppState>) -> Result<Vec<String>, String> {
    Ok(state.service.alerted_ids())
}
