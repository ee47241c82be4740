//! Infrastructure layer.
//!
//! Contains OS-facing adapters: keyboard synthesis, the calibration capture
//! window, session detection, configuration and calibration files, and the
//! command bridge used by a shell.
//!
//! **Dependency rule**: this layer may depend on `application` and `vkb_core`,
//! but MUST NOT be imported by the `application` or domain layers.
//!
//! # Sub-modules
//!
//! - **`keyboard`** – `PlatformKeyboard` implementations: `SendInput` on
//!   Windows, plus a recording `MockKeyboard` for tests.
//!
//! - **`capture`** – `CaptureSurface` implementations: a native `EDIT`
//!   window on Windows and the in-memory `SimulatedDesktop`.
//!
//! - **`environment`** – host name and remote-session detection.
//!
//! - **`storage`** – TOML configuration and the JSON calibration files.
//!
//! - **`shell_bridge`** – async commands over the shared `VkbAppState`.

pub mod capture;
pub mod environment;
pub mod keyboard;
pub mod shell_bridge;
pub mod storage;
