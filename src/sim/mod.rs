//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied elapsed time only
//! - Seeded RNG only, and only for cosmetic choices
//! - Stable iteration order (insertion order, entity ids never reused)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod enemy;
pub mod geometry;
pub mod level;
pub mod movement;
pub mod player;
pub mod projectile;
pub mod state;
pub mod tick;

pub use collision::stop_movement_on_collision;
pub use enemy::{ActiveEnemy, Capabilities, EnemyAction, EnemyKind, EnemySpawn};
pub use geometry::{Direction, Line, Point, Rectangle};
pub use level::{LevelController, LevelData, LevelSegment, Obstacle, ScrollState, load_levels_dir};
pub use movement::{displacement, resolve_movement};
pub use player::{InputSnapshot, PlayerBehavior};
pub use projectile::{Bullet, BurnMark, Explosion, Explosive, Owner};
pub use state::{GameEvent, GameState, LoopCue, Player};
pub use tick::tick;
