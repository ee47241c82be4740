//! Environment identifiers: which machine, and whether we are inside a
//! remote-desktop session.
//!
//! Direct code-point injection behaves differently on the physical console
//! and inside an RDP session on the same host, so calibration results are
//! keyed by both.  The identifier is recomputed on every start and only ever
//! used as a lookup key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether input is delivered through the local console or a remote session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Local,
    Remote,
}

impl SessionKind {
    pub fn from_remote_flag(is_remote: bool) -> Self {
        if is_remote {
            SessionKind::Remote
        } else {
            SessionKind::Local
        }
    }

    /// Suffix appended to the host name.  `remoto` is kept so that profile
    /// files created by earlier releases keep matching.
    pub fn suffix(self) -> &'static str {
        match self {
            SessionKind::Local => "local",
            SessionKind::Remote => "remoto",
        }
    }

    pub fn is_remote(self) -> bool {
        matches!(self, SessionKind::Remote)
    }
}

/// Stable key of an execution environment: `<hostname>_<local|remoto>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(String);

impl EnvironmentId {
    /// Derives the identifier for `hostname` in a session of kind `session`.
    pub fn derive(hostname: &str, session: SessionKind) -> Self {
        Self(format!("{}_{}", hostname.trim(), session.suffix()))
    }

    /// Wraps an identifier read back from storage (e.g. a profile file stem).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identifier as a file name stem.
    ///
    /// Characters that cannot appear in a file name, control characters and
    /// `%` itself are written as `%XX` per UTF-8 byte; everything else is kept,
    /// so ordinary ids map to themselves and distinct ids never share a stem.
    pub fn file_stem(&self) -> String {
        let mut stem = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            if is_reserved_in_file_name(c) {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    stem.push_str(&format!("%{byte:02X}"));
                }
            } else {
                stem.push(c);
            }
        }
        stem
    }

    /// Reverses [`EnvironmentId::file_stem`].  Stray `%` not followed by two
    /// hex digits are kept as written.
    pub fn from_file_stem(stem: &str) -> Self {
        let bytes = stem.as_bytes();
        let mut decoded = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            let escaped = bytes
                .get(i + 1..i + 3)
                .filter(|hex| bytes[i] == b'%' && hex.iter().all(u8::is_ascii_hexdigit))
                .and_then(|hex| std::str::from_utf8(hex).ok())
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            match escaped {
                Some(byte) => {
                    decoded.push(byte);
                    i += 3;
                }
                None => {
                    decoded.push(bytes[i]);
                    i += 1;
                }
            }
        }
        Self(String::from_utf8_lossy(&decoded).into_owned())
    }
}

fn is_reserved_in_file_name(c: char) -> bool {
    matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%') || c.is_control()
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EnvironmentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
