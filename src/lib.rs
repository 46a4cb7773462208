//! Scroll Strike - simulation core of a side-scrolling combat game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (geometry, collisions, entities, tick)
//! - `catalog`: Weapon, ammunition and grenade data
//! - `profile`: Persistent player profile with change observers
//! - `settings`: Per-mission settings
//! - `tuning`: Data-driven game balance
//! - `error`: Error types
//!
//! Rendering, audio and input polling live outside this crate. The
//! simulation reports what happened through [`sim::GameEvent`]s.

pub mod catalog;
pub mod error;
pub mod profile;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use catalog::Catalog;
pub use error::{CatalogError, LevelError, SettingsError, SimError};
pub use profile::{PlayerProfile, ProfileChange};
pub use settings::Settings;
pub use sim::{GameEvent, GameState, InputSnapshot, tick};
pub use tuning::Tuning;

/// Runner constants
pub mod consts {
    /// Tick length used by the headless runner (ms)
    pub const RUNNER_TICK_MS: f64 = 16.0;
    /// Headless runs stop after this many ticks
    pub const RUNNER_MAX_TICKS: u32 = 20_000;
}
