//! Configuration module
//!
//! Settings for matching, pacing, and TP recovery. Values are supplied by
//! whatever loads them (a config file, a CLI); this crate only defines the
//! shape and the defaults.

pub mod settings;

pub use settings::{Settings, TimingSettings, TpRecoverySettings};
