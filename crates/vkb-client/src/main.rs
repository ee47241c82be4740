//! Virtual keyboard headless entry point.
//!
//! Reads the text to type from standard input, optionally calibrates first,
//! then types it into whichever window has focus once the countdown ends.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ init_config()               -- TOML settings (defaults written if absent)
//!  └─ VkbAppState::bootstrap()    -- environment id + profile + dispatch policy
//!  └─ calibrate()                 -- only when VKB_CALIBRATE=1
//!  └─ start_playback()            -- countdown, then paced typing
//!       └─ ctrl_c                 -> stop_playback()
//! ```
//!
//! # Platform keyboard
//!
//! On Windows the real `SendInput` keyboard and the native capture window are
//! used.  Other targets have no injection backend; there the binary runs
//! against the in-memory `SimulatedDesktop` so the whole flow can still be
//! exercised.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vkb_client::application::type_text::ThreadPacer;
use vkb_client::infrastructure::{
    environment::SystemSessionProbe,
    shell_bridge::{self, PlatformBindings, VkbAppState},
    storage::{
        config::{init_config, AppConfig},
        profiles::FileProfileStore,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_error) = match init_config() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialise structured logging; RUST_LOG wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    info!("Virtual keyboard starting");
    if let Some(e) = config_error {
        warn!("using default configuration: {e}");
    }

    let data_dir = config.data_dir().unwrap_or_else(|e| {
        warn!("{e}; keeping calibration files in the working directory");
        PathBuf::from(".")
    });
    let store = FileProfileStore::new(data_dir);
    info!(data_dir = %store.root().display(), "calibration store");

    let state = VkbAppState::bootstrap(
        &SystemSessionProbe,
        Arc::new(store),
        platform_bindings(),
        config.calibration_timing(),
    );

    // ── Optional calibration ──────────────────────────────────────────────────
    if std::env::var("VKB_CALIBRATE").is_ok_and(|v| v == "1") {
        let result = shell_bridge::calibrate(Arc::clone(&state), |progress| {
            info!("{}", progress.message());
        })
        .await;
        match (result.data, result.error) {
            (Some(dto), _) => {
                info!("{}", dto.summary);
                for warning in &dto.warnings {
                    warn!("{warning}");
                }
            }
            (None, error) => {
                error!("calibration failed: {}", error.unwrap_or_default());
            }
        }
    }

    let status = shell_bridge::get_status(Arc::clone(&state)).await;
    if let Some(status) = status.data {
        info!("{}", status.message);
        if status.needs_remote_calibration {
            warn!(
                "remote session {} has no calibration of its own; run with VKB_CALIBRATE=1",
                status.environment_id
            );
        }
    }

    // ── Text to type ──────────────────────────────────────────────────────────
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read text from standard input")?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let state_clone = Arc::clone(&state);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("stop requested");
            shell_bridge::stop_playback(state_clone).await;
        }
    });

    let started = shell_bridge::start_playback(
        Arc::clone(&state),
        text,
        &config.playback.countdown_secs.to_string(),
        &config.playback.char_delay_secs.to_string(),
    )
    .await;
    if let Some(e) = started.error {
        anyhow::bail!("cannot start playback: {e}");
    }

    let finished = shell_bridge::wait_playback(Arc::clone(&state)).await;
    match finished.data {
        Some(reason) => info!("{}", reason.message()),
        None => error!("{}", finished.error.unwrap_or_default()),
    }

    info!("Virtual keyboard stopped");
    Ok(())
}

#[cfg(target_os = "windows")]
fn platform_bindings() -> PlatformBindings {
    use vkb_client::application::calibrate_keyboard::CaptureSurface;
    use vkb_client::infrastructure::{
        capture::windows::EditCaptureWindow, keyboard::windows::WindowsKeyboard,
    };

    PlatformBindings {
        keyboard: Arc::new(WindowsKeyboard::new()),
        surface_factory: Arc::new(|| Box::new(EditCaptureWindow::new()) as Box<dyn CaptureSurface>),
        pacer: Arc::new(ThreadPacer),
    }
}

#[cfg(not(target_os = "windows"))]
fn platform_bindings() -> PlatformBindings {
    use vkb_client::application::calibrate_keyboard::CaptureSurface;
    use vkb_client::infrastructure::capture::simulated::SimulatedDesktop;

    warn!("no native keyboard backend on this platform; typing into a simulated desktop");
    let desktop = SimulatedDesktop::us_layout();
    let surface = desktop.clone();
    PlatformBindings {
        keyboard: Arc::new(desktop),
        surface_factory: Arc::new(move || Box::new(surface.clone()) as Box<dyn CaptureSurface>),
        pacer: Arc::new(ThreadPacer),
    }
}
