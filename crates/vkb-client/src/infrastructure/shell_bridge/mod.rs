//! Command bridge between the application layer and an interactive shell.
//!
//! Exposes the keyboard's operations (calibrate, send a character, force a
//! method, inspect the environment, start and stop playback) as async
//! functions over one shared [`VkbAppState`].  A GUI front-end or the
//! headless binary calls these; nothing else in the crate reaches into the
//! state directly.
//!
//! # DTOs
//!
//! The application state holds trait objects, atomics and task handles and is
//! not serializable.  The DTO structs are plain serializable snapshots that
//! are safe to send across a process or IPC boundary.
//!
//! # `CommandResult<T>`
//!
//! All commands return `CommandResult<T>`, a unified envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```
//!
//! # Threads
//!
//! Calibration and playback block on OS input and sleeps, so both run under
//! `tokio::task::spawn_blocking`.  The calibration capture window is created
//! inside that blocking task because native windows belong to the thread
//! that creates them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use vkb_core::{
    CalibrationMap, InjectionMethod, MethodOverride, PlaybackSettings, ProbeSet, StopReason,
    UnresolvedProbe,
};

use crate::application::calibrate_keyboard::{
    CalibrateKeyboardUseCase, CalibrationProgress, CalibrationTiming, CaptureSurface,
};
use crate::application::dispatch_char::DispatchPolicy;
use crate::application::identify_environment::{identify, Environment, SessionProbe};
use crate::application::inject_char::PlatformKeyboard;
use crate::application::manage_profiles::{ProfileLoad, ProfileRepository, ProfileService};
use crate::application::type_text::{Pacer, PlaybackStatus, TypeTextUseCase};

/// Creates a fresh capture surface on the calling thread.
pub type SurfaceFactory = Arc<dyn Fn() -> Box<dyn CaptureSurface> + Send + Sync>;

/// The OS-facing pieces the bridge is wired with.
#[derive(Clone)]
pub struct PlatformBindings {
    pub keyboard: Arc<dyn PlatformKeyboard>,
    pub surface_factory: SurfaceFactory,
    pub pacer: Arc<dyn Pacer>,
}

// ── Shared application state ──────────────────────────────────────────────────

/// Where the active calibration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationSource {
    /// Calibrated for exactly this environment.
    Environment,
    /// Borrowed from the legacy file, possibly another environment.
    Legacy,
    /// No calibration; every character uses direct injection.
    Uncalibrated,
}

impl From<&ProfileLoad> for CalibrationSource {
    fn from(load: &ProfileLoad) -> Self {
        match load {
            ProfileLoad::Exact(_) => CalibrationSource::Environment,
            ProfileLoad::Legacy(_) => CalibrationSource::Legacy,
            ProfileLoad::Missing => CalibrationSource::Uncalibrated,
        }
    }
}

/// Process-lifetime context shared by every command.
pub struct VkbAppState {
    environment: Environment,
    policy: Arc<DispatchPolicy>,
    profiles: ProfileService,
    platform: PlatformBindings,
    timing: CalibrationTiming,
    source: Mutex<CalibrationSource>,
    cancel: Arc<AtomicBool>,
    playback: Mutex<Option<JoinHandle<StopReason>>>,
    calibrating: AtomicBool,
    /// Written from blocking tasks, hence a std mutex.
    last_message: Arc<std::sync::Mutex<String>>,
}

impl VkbAppState {
    /// Identifies the environment, loads its calibration and builds the
    /// dispatch policy.
    pub fn bootstrap(
        probe: &dyn SessionProbe,
        repository: Arc<dyn ProfileRepository>,
        platform: PlatformBindings,
        timing: CalibrationTiming,
    ) -> Arc<Self> {
        let environment = identify(probe);
        let profiles = ProfileService::new(repository);
        let load = profiles.load_for(&environment.id);
        let source = CalibrationSource::from(&load);
        let policy = Arc::new(DispatchPolicy::new(
            Arc::clone(&platform.keyboard),
            load.into_map(),
        ));

        let state = Self {
            environment,
            policy,
            profiles,
            platform,
            timing,
            source: Mutex::new(source),
            cancel: Arc::new(AtomicBool::new(false)),
            playback: Mutex::new(None),
            calibrating: AtomicBool::new(false),
            last_message: Arc::new(std::sync::Mutex::new(String::new())),
        };
        let message = state.ready_message(source);
        if source == CalibrationSource::Uncalibrated {
            warn!(environment = %state.environment.id, "{message}");
        } else {
            info!(environment = %state.environment.id, ?source, "{message}");
        }
        state.set_message(message);
        Arc::new(state)
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn policy(&self) -> &Arc<DispatchPolicy> {
        &self.policy
    }

    /// The cancellation flag watched by playback.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn ready_message(&self, source: CalibrationSource) -> String {
        let counts = self.policy.method_counts();
        let env = &self.environment.id;
        match source {
            CalibrationSource::Environment => format!(
                "Ready ({} unicode + {} vkscan calibrated for {env})",
                counts.unicode, counts.layout_replay
            ),
            CalibrationSource::Legacy => {
                format!("Ready (using a calibration from another environment; recalibrate for {env})")
            }
            CalibrationSource::Uncalibrated => "Not calibrated: all characters use unicode".to_string(),
        }
    }

    fn set_message(&self, message: impl Into<String>) {
        store_message(&self.last_message, message.into());
    }

    fn message(&self) -> String {
        self.last_message
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    async fn is_playing(&self) -> bool {
        self.playback
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

fn store_message(slot: &std::sync::Mutex<String>, message: String) {
    *slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = message;
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Status snapshot for the shell's status line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusDto {
    pub environment_id: String,
    pub remote_session: bool,
    pub calibration: CalibrationSource,
    pub unicode_count: usize,
    pub layout_replay_count: usize,
    /// `None` when the policy chooses per character.
    pub forced_method: Option<InjectionMethod>,
    /// A remote session running on a borrowed or missing calibration.
    pub needs_remote_calibration: bool,
    pub playing: bool,
    pub calibrating: bool,
    pub message: String,
}

/// Result of a calibration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationDto {
    pub mapping: CalibrationMap,
    pub unresolved: Vec<UnresolvedProbe>,
    /// One line per failed write; empty when both files were saved.
    pub warnings: Vec<String>,
    pub summary: String,
}

/// Which method a manually sent character used.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeliveryDto {
    pub resolved: InjectionMethod,
    pub used: InjectionMethod,
}

/// Unified response wrapper for shell commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    /// `true` if the command completed successfully; `false` on error.
    pub success: bool,
    /// The command's return value, present only when `success` is `true`.
    pub data: Option<T>,
    /// A human-readable error message, present only when `success` is `false`.
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the current status snapshot.
pub async fn get_status(state: Arc<VkbAppState>) -> CommandResult<StatusDto> {
    let source = *state.source.lock().await;
    let counts = state.policy.method_counts();
    let remote = state.environment.is_remote();

    CommandResult::ok(StatusDto {
        environment_id: state.environment.id.to_string(),
        remote_session: remote,
        calibration: source,
        unicode_count: counts.unicode,
        layout_replay_count: counts.layout_replay,
        forced_method: state.policy.override_mode().forced(),
        needs_remote_calibration: remote && source != CalibrationSource::Environment,
        playing: state.is_playing().await,
        calibrating: state.calibrating.load(Ordering::SeqCst),
        message: state.message(),
    })
}

/// Calibrates every probe character against a fresh capture surface.
///
/// `progress` is called before each probe from the calibration thread.
/// Refused while playback is running, since both would type into the
/// focused window.
pub async fn calibrate<F>(state: Arc<VkbAppState>, progress: F) -> CommandResult<CalibrationDto>
where
    F: FnMut(&CalibrationProgress) + Send + 'static,
{
    calibrate_probes(state, ProbeSet::standard(), progress).await
}

/// [`calibrate`] over an explicit probe list.
pub async fn calibrate_probes<F>(
    state: Arc<VkbAppState>,
    probes: ProbeSet,
    mut progress: F,
) -> CommandResult<CalibrationDto>
where
    F: FnMut(&CalibrationProgress) + Send + 'static,
{
    // Claim the flag before looking at playback; start_playback checks it
    // while holding the playback slot, so one of the two always sees the other.
    if state.calibrating.swap(true, Ordering::SeqCst) {
        return CommandResult::err("calibration is already running");
    }
    if state.is_playing().await {
        state.calibrating.store(false, Ordering::SeqCst);
        return CommandResult::err("cannot calibrate while playback is running");
    }

    let use_case = CalibrateKeyboardUseCase::new(
        Arc::clone(&state.platform.keyboard),
        state.profiles.clone(),
        Arc::clone(&state.policy),
        state.environment.clone(),
        state.timing,
    );
    let factory = Arc::clone(&state.platform.surface_factory);
    let joined = tokio::task::spawn_blocking(move || {
        let mut surface = factory();
        use_case.calibrate(surface.as_mut(), &probes, &mut progress)
    })
    .await;
    state.calibrating.store(false, Ordering::SeqCst);

    let outcome = match joined {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!("calibration failed: {e}");
            state.set_message(format!("Calibration failed: {e}"));
            return CommandResult::err(e.to_string());
        }
        Err(e) => return CommandResult::err(format!("calibration task failed: {e}")),
    };

    *state.source.lock().await = CalibrationSource::Environment;
    let summary = outcome.report.summary(state.environment.id.as_str());
    let warnings = outcome.persistence.warnings();
    for line in outcome.report.unresolved.iter().map(UnresolvedProbe::describe) {
        warn!("unresolved: {line}");
    }
    state.set_message(summary.clone());

    let (mapping, unresolved) = outcome.into_parts();
    CommandResult::ok(CalibrationDto {
        mapping,
        unresolved,
        warnings,
        summary,
    })
}

/// Sends one character through the dispatch policy.
pub async fn send_char(state: Arc<VkbAppState>, ch: char) -> CommandResult<DeliveryDto> {
    let delivery = state.policy.send(ch);
    CommandResult::ok(DeliveryDto {
        resolved: delivery.resolved,
        used: delivery.used,
    })
}

/// Forces one method for every character, or clears the override with `None`.
pub async fn set_forced_method(
    state: Arc<VkbAppState>,
    method: Option<InjectionMethod>,
) -> CommandResult<()> {
    state.policy.set_override(MethodOverride::from(method));
    CommandResult::ok(())
}

pub async fn current_environment_id(state: Arc<VkbAppState>) -> CommandResult<String> {
    CommandResult::ok(state.environment.id.to_string())
}

pub async fn is_remote_session(state: Arc<VkbAppState>) -> CommandResult<bool> {
    CommandResult::ok(state.environment.is_remote())
}

/// Lists environments with a stored profile, sorted.
pub async fn list_known_profiles(state: Arc<VkbAppState>) -> CommandResult<Vec<String>> {
    let known = state.profiles.list_known();
    CommandResult::ok(known.into_iter().map(|env| env.to_string()).collect())
}

/// Validates the settings and starts typing `text` in the background.
///
/// `delay` is the countdown in whole seconds; `speed` the pause after each
/// character in seconds.  Both are trimmed before parsing.
pub async fn start_playback(
    state: Arc<VkbAppState>,
    text: String,
    delay: &str,
    speed: &str,
) -> CommandResult<()> {
    let settings = match PlaybackSettings::parse(delay, speed) {
        Ok(settings) => settings,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    let mut slot = state.playback.lock().await;
    if state.calibrating.load(Ordering::SeqCst) {
        return CommandResult::err("cannot type while calibration is running");
    }
    if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
        return CommandResult::err("playback is already running");
    }

    state.cancel.store(false, Ordering::SeqCst);
    let use_case = TypeTextUseCase::new(Arc::clone(&state.policy), Arc::clone(&state.platform.pacer));
    let cancel = Arc::clone(&state.cancel);
    let messages = Arc::clone(&state.last_message);
    info!(chars = text.chars().count(), ?settings, "playback started");
    *slot = Some(tokio::task::spawn_blocking(move || {
        use_case.run(&text, &settings, &cancel, &mut |status: PlaybackStatus| {
            store_message(&messages, status.message());
        })
    }));
    CommandResult::ok(())
}

/// Asks running playback to stop before its next character.
pub async fn stop_playback(state: Arc<VkbAppState>) -> CommandResult<()> {
    state.cancel.store(true, Ordering::SeqCst);
    CommandResult::ok(())
}

/// Waits for the current playback to end and returns why it stopped.
pub async fn wait_playback(state: Arc<VkbAppState>) -> CommandResult<StopReason> {
    let handle = state.playback.lock().await.take();
    match handle {
        Some(handle) => match handle.await {
            Ok(reason) => CommandResult::ok(reason),
            Err(e) => CommandResult::err(format!("playback task failed: {e}")),
        },
        None => CommandResult::err("no playback has been started"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
