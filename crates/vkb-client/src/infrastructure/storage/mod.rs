//! Storage infrastructure: configuration and calibration files.
//!
//! - **`config`** – the TOML configuration file and the platform directory
//!   it lives in.
//! - **`profiles`** – the JSON calibration files: the legacy single-file
//!   mapping and one profile per environment.

pub mod config;
pub mod profiles;
