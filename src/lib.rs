pub mod alerts;
pub mod audio;
pub mod clock;
mod commands;
pub mod desktop;
pub mod error;
pub mod models;
pub mod notify;
pub mod overlay;
pub mod service;
pub mod settings;
pub mod timer;
pub mod ui;
mod utils;
pub mod wake;

use std::sync::Arc;

use audio::RodioBeeper;
use clock::SystemClock;
use commands::{
    force_overlay_cleanup, get_alert_config, get_alerted_ids, set_meetings, trigger_test_alert,
    update_alert_config,
};
use desktop::{TauriDispatcher, TauriDisplay, TauriNotifier};
use overlay::FlashPlatform;
use service::{AlertService, ServiceParts};
use settings::ConfigStore;
use tauri::{Manager, RunEvent};
use timer::TokioTickScheduler;

const CONFIG_FILE_NAME: &str = "alert-config.json";

pub(crate) struct AppState {
    pub(crate) service: AlertService,
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    utils::logging::init();

    log::info!("meetalert starting up...");

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let config = Arc::new(ConfigStore::load(app_data_dir.join(CONFIG_FILE_NAME))?);
                let runtime =
                    tauri::async_runtime::block_on(async { tokio::runtime::Handle::current() });
                let handle = app.handle().clone();

                let service = AlertService::build(ServiceParts {
                    config,
                    ui: Arc::new(TauriDispatcher::new(handle.clone())),
                    ticks: Arc::new(TokioTickScheduler::new(runtime)),
                    clock: Arc::new(SystemClock),
                    display: Some(Arc::new(TauriDisplay::new(handle.clone()))),
                    beeper: Arc::new(RodioBeeper),
                    notifier: Arc::new(TauriNotifier::new(handle)),
                    platform: FlashPlatform::current(),
                });
                service.start();

                app.manage(AppState { service });
                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            set_meetings,
            get_alert_config,
            update_alert_config,
            trigger_test_alert,
            force_overlay_cleanup,
            get_alerted_ids,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app, event| match event {
        // Overlays come and go; closing the last one must not end the process.
        RunEvent::ExitRequested { api, code, .. } if code.is_none() => api.prevent_exit(),
        RunEvent::Exit => {
            if let Some(state) = app.try_state::<AppState>() {
                state.service.shutdown();
            }
        }
        _ => {}
    });
}
