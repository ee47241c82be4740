//! Session probes: host name and remote-session detection.

use sysinfo::System;

use crate::application::identify_environment::SessionProbe;

/// Host name used when the environment exposes none.
pub const FALLBACK_HOSTNAME: &str = "vkb-host";

/// Reads the real host name and session state from the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemSessionProbe;

impl SessionProbe for SystemSessionProbe {
    /// The DNS host name as the OS reports it, then `COMPUTERNAME` /
    /// `HOSTNAME`, then [`FALLBACK_HOSTNAME`].
    fn hostname(&self) -> String {
        first_usable_hostname([
            System::host_name(),
            std::env::var("COMPUTERNAME").ok(),
            std::env::var("HOSTNAME").ok(),
        ])
    }

    #[cfg(target_os = "windows")]
    fn is_remote_session(&self) -> bool {
        use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_REMOTESESSION};
        // SAFETY: GetSystemMetrics is always safe to call
        unsafe { GetSystemMetrics(SM_REMOTESESSION) != 0 }
    }

    #[cfg(not(target_os = "windows"))]
    fn is_remote_session(&self) -> bool {
        false
    }
}

/// Returns the first candidate that is not blank.
fn first_usable_hostname<I>(candidates: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    candidates
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_HOSTNAME.to_string())
}

/// A probe with fixed answers, for tests and for pinning an environment
/// from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSessionProbe {
    pub hostname: String,
    pub remote: bool,
}

impl StaticSessionProbe {
    pub fn new(hostname: impl Into<String>, remote: bool) -> Self {
        Self {
            hostname: hostname.into(),
            remote,
        }
    }
}

impl SessionProbe for StaticSessionProbe {
    fn hostname(&self) -> String {
        self.hostname.clone()
    }

    fn is_remote_session(&self) -> bool {
        self.remote
    }
}
