//! Identifies the current execution environment.
//!
//! The host name and the remote-session flag are read through the
//! [`SessionProbe`] trait so the use case can be tested without an RDP
//! session.  The identifier is recomputed on every start; it is never stored.

use vkb_core::{EnvironmentId, SessionKind};

/// OS queries needed to identify the environment.
pub trait SessionProbe: Send + Sync {
    /// The machine's host name.
    fn hostname(&self) -> String;

    /// `true` when running inside a remote-desktop session.
    fn is_remote_session(&self) -> bool;
}

/// The identified environment: its key plus the session classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub id: EnvironmentId,
    pub session: SessionKind,
}

impl Environment {
    pub fn is_remote(&self) -> bool {
        self.session.is_remote()
    }
}

/// Queries `probe` and derives the environment identifier.
pub fn identify(probe: &dyn SessionProbe) -> Environment {
    let session = SessionKind::from_remote_flag(probe.is_remote_session());
    let id = EnvironmentId::derive(&probe.hostname(), session);
    tracing::debug!(environment = %id, ?session, "identified execution environment");
    Environment { id, session }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe {
        host: &'static str,
        remote: bool,
    }

    impl SessionProbe for FixedProbe {
        fn hostname(&self) -> String {
            self.host.to_string()
        }

        fn is_remote_session(&self) -> bool {
            self.remote
        }
    }

    #[test]
    fn test_identify_local_session() {
        let env = identify(&FixedProbe { host: "WS01", remote: false });

        assert_eq!(env.id.as_str(), "WS01_local");
        assert!(!env.is_remote());
    }

    #[test]
    fn test_identify_remote_session() {
        let env = identify(&FixedProbe { host: "WS01", remote: true });

        assert_eq!(env.id.as_str(), "WS01_remoto");
        assert_eq!(env.session, SessionKind::Remote);
    }
}
