//! Data-driven game balance
//!
//! Every gameplay constant the simulation uses lives here so missions can
//! be rebalanced from JSON without touching code. Missing fields fall back
//! to the defaults below.

use serde::{Deserialize, Serialize};

/// Gameplay tuning values (distances in px, durations in ms, speeds in px/ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Players ===
    pub player_width: f64,
    pub player_height: f64,
    pub player_speed: f64,
    /// Players are kept this far inside the play field
    pub border_margin: f64,
    pub player_death_ms: f64,
    pub invincibility_ms: f64,

    // === Enemies ===
    pub enemy_death_ms: f64,
    pub enemy_bullet_speed: f64,
    pub enemy_bullet_range: f64,
    pub enemy_grenade_speed: f64,
    pub enemy_grenade_range: f64,

    // === Projectiles & explosions ===
    pub bullet_size: f64,
    pub explosive_size: f64,
    pub explosion_width: f64,
    pub explosion_height: f64,
    pub explosion_duration_ms: f64,

    // === Scrolling ===
    pub max_scroll_speed: f64,
    /// Fraction of the play field, measured from the edge the camera moves
    /// toward, at which scroll pressure starts
    pub scroll_barrier_fraction: f64,
    /// Depth of the strip outside the play field where enemies wake up
    pub activation_margin: f64,

    // === Cosmetic ===
    pub death_sound_variants: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_width: 40.0,
            player_height: 60.0,
            player_speed: 0.3,
            border_margin: 10.0,
            player_death_ms: 1500.0,
            invincibility_ms: 3000.0,

            enemy_death_ms: 1000.0,
            enemy_bullet_speed: 0.5,
            enemy_bullet_range: 600.0,
            enemy_grenade_speed: 0.3,
            enemy_grenade_range: 300.0,

            bullet_size: 6.0,
            explosive_size: 12.0,
            explosion_width: 100.0,
            explosion_height: 100.0,
            explosion_duration_ms: 900.0,

            max_scroll_speed: 0.2,
            scroll_barrier_fraction: 0.5,
            activation_margin: 200.0,

            death_sound_variants: 3,
        }
    }
}
