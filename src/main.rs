use std::path::PathBuf;
use std::process::ExitCode;

use lifetimer::services::clock::SystemClock;
use lifetimer::services::control_loop::{show_fatal, ControlLoop};
use lifetimer::services::device::{ConsoleScreen, HostLink, SysfsBattery};
use lifetimer::services::registry::PersonRegistry;
use lifetimer::services::time_sync::{resolve_zone, HttpTimeApi, TimeSync};
use lifetimer::utils::config::load_settings;

const BATTERY_SUPPLY: &str = "BAT0";

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Life Timer starting (v{})", env!("CARGO_PKG_VERSION"));

    // Optional settings file as the only argument; `.env` otherwise.
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = match load_settings(settings_path.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut screen = ConsoleScreen::new();
    let registry = match PersonRegistry::load(&settings.people) {
        Ok(registry) => registry,
        Err(err) => {
            log::error!("FATAL: {}", err);
            show_fatal(&mut screen, &err).await;
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "Config loaded for: {} (+{} more)",
        registry.primary().name,
        registry.len() - 1
    );

    let endpoint = settings.time.endpoint();
    let sync = TimeSync::new(
        HostLink::new(settings.network.wifi_ssid.clone(), &endpoint),
        HttpTimeApi::new(endpoint),
        resolve_zone(&settings.time.time_zone),
    );
    let interval = settings.update_interval();

    let mut control = ControlLoop::new(
        registry,
        sync,
        SystemClock::new(),
        screen,
        SysfsBattery::new(BATTERY_SUPPLY),
        interval,
    );
    control
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Cannot listen for stop signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    ExitCode::SUCCESS
}
