//! Game state and simulation context
//!
//! One [`GameState`] per mission owns every live entity. Nothing here is
//! global; tests build as many independent engines as they like.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::enemy::{ActiveEnemy, EnemyKind, EnemySpawn};
use super::geometry::{Direction, Point, Rectangle};
use super::level::{LevelController, LevelData};
use super::player::PlayerBehavior;
use super::projectile::{Bullet, BurnMark, Explosion, Explosive, Owner};
use crate::catalog::Catalog;
use crate::error::SimError;
use crate::profile::PlayerProfile;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Looping sounds the audio layer keeps running until told to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCue {
    TankEngine,
}

/// Side effects for the audio and sprite collaborators.
///
/// Events are queued during a tick and drained by the host afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Single shot from a pistol, rocket launcher or grenade throw
    WeaponFired { player: usize, sound: String },
    OutOfAmmo { player: usize },
    AutomaticFireStarted { player: usize, sound: String },
    AutomaticFireStopped { player: usize },
    ItemSelected { player: usize, item: String },
    /// A bullet bounced off an armored enemy
    Ricochet { enemy: u32 },
    Explosion { at: Point },
    PlayerDied { player: usize, sound_variant: u32 },
    PlayerRespawned { player: usize },
    PlayerEliminated { player: usize },
    EnemyActivated { enemy: u32, kind: EnemyKind },
    EnemyKilled {
        enemy: u32,
        kind: EnemyKind,
        killer: Option<usize>,
    },
    LoopStarted { cue: LoopCue, enemy: u32 },
    LoopStopped { cue: LoopCue, enemy: u32 },
    Scream { enemy: u32 },
    SegmentAdvanced { index: usize },
    MissionWon,
    MissionLost,
}

/// A participant in the mission
#[derive(Debug)]
pub struct Player {
    pub profile: PlayerProfile,
    pub behavior: PlayerBehavior,
    pub rect: Rectangle,
    /// Kills scored this mission
    pub kills: u32,
    /// False once the last life is gone
    pub alive: bool,
    /// An automatic weapon's firing loop is playing
    pub auto_fire_looping: bool,
}

impl Player {
    /// Alive and not in the middle of dying
    pub fn is_active(&self) -> bool {
        self.alive && !self.behavior.dying
    }
}

/// Complete simulation context for one mission
#[derive(Debug)]
pub struct GameState {
    pub settings: Settings,
    pub catalog: Catalog,
    pub level: LevelController,
    pub players: Vec<Player>,
    pub bullets: Vec<Bullet>,
    pub explosives: Vec<Explosive>,
    pub explosions: Vec<Explosion>,
    pub burn_marks: Vec<BurnMark>,
    pub enemies: Vec<ActiveEnemy>,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
    pub won: bool,
    pub lost: bool,
    /// Simulated time in ms
    pub time_ms: f64,
    /// Cosmetic randomness only
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Set up a mission. Every item a player owns must be in the catalog.
    pub fn new(
        settings: Settings,
        catalog: Catalog,
        level: LevelData,
        profiles: Vec<PlayerProfile>,
    ) -> Result<Self, SimError> {
        if profiles.is_empty() {
            return Err(SimError::NoPlayers);
        }
        for profile in &profiles {
            for item in profile.owned_items() {
                catalog.validate_item(item)?;
            }
            if !profile.selected_item().is_empty() {
                catalog.validate_item(profile.selected_item())?;
            }
        }

        let play_field = settings.play_field();
        let tuning = &settings.tuning;
        level.validate()?;
        let direction = level.segments[0].direction;
        let count = profiles.len();

        let players = profiles
            .into_iter()
            .enumerate()
            .map(|(index, profile)| {
                let start = level
                    .player_starts
                    .get(index)
                    .copied()
                    .unwrap_or_else(|| default_start(&play_field, direction, index, count, tuning));
                Player {
                    profile,
                    behavior: PlayerBehavior::new(direction),
                    rect: Rectangle::new(start.x, start.y, tuning.player_width, tuning.player_height),
                    kills: 0,
                    alive: true,
                    auto_fire_looping: false,
                }
            })
            .collect();

        let rng = Pcg32::seed_from_u64(settings.seed);
        let level = LevelController::new(level, play_field, tuning)?;

        let mut state = Self {
            settings,
            catalog,
            level,
            players,
            bullets: Vec::new(),
            explosives: Vec::new(),
            explosions: Vec::new(),
            burn_marks: Vec::new(),
            enemies: Vec::new(),
            events: Vec::new(),
            won: false,
            lost: false,
            time_ms: 0.0,
            rng,
            next_id: 1,
        };
        state.activate_pending();

        log::info!(
            "Mission started: {} player(s), {} segment(s)",
            state.players.len(),
            state.level.segment_count()
        );
        Ok(state)
    }

    pub fn tuning(&self) -> &Tuning {
        &self.settings.tuning
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn player(&self, index: usize) -> Result<&Player, SimError> {
        self.players.get(index).ok_or(SimError::NoSuchPlayer(index))
    }

    pub fn profile(&self, index: usize) -> Result<&PlayerProfile, SimError> {
        self.player(index).map(|p| &p.profile)
    }

    pub fn profile_mut(&mut self, index: usize) -> Result<&mut PlayerProfile, SimError> {
        self.players
            .get_mut(index)
            .map(|p| &mut p.profile)
            .ok_or(SimError::NoSuchPlayer(index))
    }

    pub fn kills(&self, index: usize) -> Result<u32, SimError> {
        self.player(index).map(|p| p.kills)
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn is_over(&self) -> bool {
        self.won || self.lost
    }

    /// Take every event raised since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Rectangles of the players that steer the camera. Dying players
    /// count too, since scrolling shifts them with everything else.
    pub fn living_player_rects(&self) -> Vec<Rectangle> {
        self.players
            .iter()
            .filter(|p| p.alive)
            .map(|p| p.rect)
            .collect()
    }

    /// Pull enemies the camera has reached into the live set
    pub fn activate_pending(&mut self) {
        for spawn in self.level.take_activated() {
            self.add_enemy(spawn);
        }
    }

    /// Make an enemy live, running its activation hook
    pub fn add_enemy(&mut self, spawn: EnemySpawn) -> u32 {
        let id = self.next_entity_id();
        let enemy = ActiveEnemy::from_spawn(id, spawn);
        log::debug!("Enemy {} activated ({:?})", id, enemy.kind);

        self.emit(GameEvent::EnemyActivated {
            enemy: id,
            kind: enemy.kind,
        });
        if let Some(event) = enemy.kind.on_activation(id) {
            self.emit(event);
        }
        self.enemies.push(enemy);
        id
    }

    /// Spawn a standard explosion centered on `source`
    pub fn spawn_explosion(&mut self, source: &Rectangle, owner: Owner) {
        let id = self.next_entity_id();
        let tuning = &self.settings.tuning;
        let explosion = Explosion::new(
            id,
            source,
            tuning.explosion_width,
            tuning.explosion_height,
            tuning.explosion_duration_ms,
            owner,
        );
        self.emit(GameEvent::Explosion {
            at: explosion.center(),
        });
        self.explosions.push(explosion);
    }

    /// Pick one of the death sound variants
    pub(crate) fn death_sound_variant(&mut self) -> u32 {
        let variants = self.settings.tuning.death_sound_variants.max(1);
        self.rng.random_range(0..variants)
    }
}

/// Start position for a player the level gives no explicit start for:
/// spread across the field near the edge the camera moves away from.
fn default_start(field: &Rectangle, direction: Direction, index: usize, count: usize, tuning: &Tuning) -> Point {
    let (w, h) = (tuning.player_width, tuning.player_height);
    let m = tuning.border_margin;
    let slot = (index + 1) as f64 / (count + 1) as f64;

    match direction {
        Direction::Down => Point::new(field.x + field.width * slot - w / 2.0, field.top() + m),
        Direction::Left => Point::new(field.right() - m - w, field.y + field.height * slot - h / 2.0),
        Direction::Right => Point::new(field.left() + m, field.y + field.height * slot - h / 2.0),
        _ => Point::new(field.x + field.width * slot - w / 2.0, field.bottom() - m - h),
    }
}
