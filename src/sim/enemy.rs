//! Enemy model
//!
//! All archetypes share one skeleton (position, movement queue, cyclic
//! action schedule, dying countdown). What differs is looked up in a const
//! capability table keyed by [`EnemyKind`].

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Point, Rectangle};
use super::state::{GameEvent, LoopCue};

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Person,
    Landmine,
    GunTurret,
    SpawnArea,
    Tank,
}

/// Per-archetype behavior switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub can_die_by_bullet: bool,
    pub can_die_by_explosion: bool,
    pub can_die_by_explosive: bool,
    pub can_fire: bool,
    pub can_move: bool,
    pub can_spawn: bool,
    pub points_for_kill: u64,
    /// Touching it kills a player
    pub is_collision_deadly: bool,
    /// Touching it also blows it up
    pub is_collision_explosive: bool,
    /// The wreck blocks player movement while dying
    pub is_obstacle_when_dying: bool,
    /// Player bullets ricochet off it
    pub stops_bullets: bool,
    pub is_visible: bool,
}

const PERSON: Capabilities = Capabilities {
    can_die_by_bullet: true,
    can_die_by_explosion: true,
    can_die_by_explosive: true,
    can_fire: true,
    can_move: true,
    can_spawn: false,
    points_for_kill: 100,
    is_collision_deadly: false,
    is_collision_explosive: false,
    is_obstacle_when_dying: false,
    stops_bullets: false,
    is_visible: true,
};

const LANDMINE: Capabilities = Capabilities {
    can_die_by_bullet: false,
    can_die_by_explosion: true,
    can_die_by_explosive: false,
    can_fire: false,
    can_move: false,
    can_spawn: false,
    points_for_kill: 50,
    is_collision_deadly: true,
    is_collision_explosive: true,
    is_obstacle_when_dying: false,
    stops_bullets: false,
    is_visible: true,
};

// Turrets are emplacements: walking into one is not lethal.
const GUN_TURRET: Capabilities = Capabilities {
    can_die_by_bullet: false,
    can_die_by_explosion: true,
    can_die_by_explosive: true,
    can_fire: true,
    can_move: false,
    can_spawn: false,
    points_for_kill: 200,
    is_collision_deadly: false,
    is_collision_explosive: false,
    is_obstacle_when_dying: false,
    stops_bullets: true,
    is_visible: true,
};

const SPAWN_AREA: Capabilities = Capabilities {
    can_die_by_bullet: false,
    can_die_by_explosion: false,
    can_die_by_explosive: false,
    can_fire: false,
    can_move: false,
    can_spawn: true,
    points_for_kill: 0,
    is_collision_deadly: false,
    is_collision_explosive: false,
    is_obstacle_when_dying: false,
    stops_bullets: false,
    is_visible: false,
};

const TANK: Capabilities = Capabilities {
    can_die_by_bullet: false,
    can_die_by_explosion: true,
    can_die_by_explosive: true,
    can_fire: true,
    can_move: true,
    can_spawn: false,
    points_for_kill: 500,
    is_collision_deadly: true,
    is_collision_explosive: false,
    is_obstacle_when_dying: true,
    stops_bullets: true,
    is_visible: true,
};

impl EnemyKind {
    pub fn capabilities(self) -> &'static Capabilities {
        match self {
            EnemyKind::Person => &PERSON,
            EnemyKind::Landmine => &LANDMINE,
            EnemyKind::GunTurret => &GUN_TURRET,
            EnemyKind::SpawnArea => &SPAWN_AREA,
            EnemyKind::Tank => &TANK,
        }
    }

    /// Side effect when the enemy becomes live
    pub fn on_activation(self, enemy: u32) -> Option<GameEvent> {
        match self {
            EnemyKind::Tank => Some(GameEvent::LoopStarted {
                cue: LoopCue::TankEngine,
                enemy,
            }),
            _ => None,
        }
    }

    /// Side effect at the moment the enemy starts dying
    pub fn on_death(self, enemy: u32) -> Option<GameEvent> {
        match self {
            EnemyKind::Tank => Some(GameEvent::LoopStopped {
                cue: LoopCue::TankEngine,
                enemy,
            }),
            EnemyKind::Person => Some(GameEvent::Scream { enemy }),
            _ => None,
        }
    }

    /// Side effect when a live enemy is scrolled away without dying
    pub fn on_deactivation(self, enemy: u32) -> Option<GameEvent> {
        match self {
            EnemyKind::Tank => Some(GameEvent::LoopStopped {
                cue: LoopCue::TankEngine,
                enemy,
            }),
            _ => None,
        }
    }
}

/// One leg of scripted movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSegment {
    pub duration: f64,
    /// px per ms
    pub vx: f64,
    pub vy: f64,
    #[serde(skip)]
    pub elapsed: f64,
}

impl MovementSegment {
    pub fn new(duration: f64, vx: f64, vy: f64) -> Self {
        Self {
            duration,
            vx,
            vy,
            elapsed: 0.0,
        }
    }
}

/// What an action schedule entry does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Bullet,
    Grenade,
}

/// One entry of the cyclic action schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub delay: f64,
    pub kind: ActionKind,
}

/// Static description of an enemy placed in a level segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub rect: Rectangle,
    #[serde(default = "default_viewing_direction")]
    pub direction: Direction,
    #[serde(default)]
    pub movement: Vec<MovementSegment>,
    #[serde(default)]
    pub actions: Vec<ScheduledAction>,
    /// Spawn areas only: how many enemies may be produced (None/0 = unlimited)
    #[serde(default)]
    pub spawn_capacity: Option<u32>,
    /// Spawn areas only: the enemy produced on each action tick
    #[serde(default)]
    pub spawn_template: Option<Box<EnemySpawn>>,
    /// Sprite set for the renderer
    #[serde(default)]
    pub skin: Option<String>,
}

fn default_viewing_direction() -> Direction {
    Direction::Down
}

impl EnemySpawn {
    pub fn new(kind: EnemyKind, rect: Rectangle) -> Self {
        Self {
            kind,
            rect,
            direction: default_viewing_direction(),
            movement: Vec::new(),
            actions: Vec::new(),
            spawn_capacity: None,
            spawn_template: None,
            skin: None,
        }
    }
}

/// What an enemy wants to do this tick
#[derive(Debug, Clone, PartialEq)]
pub enum EnemyAction {
    Fire(ActionKind),
    Spawn(EnemySpawn),
}

/// A live enemy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEnemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub rect: Rectangle,
    pub viewing_direction: Direction,
    pub movement: VecDeque<MovementSegment>,
    pub actions: Vec<ScheduledAction>,
    pub action_index: usize,
    pub action_elapsed: f64,
    pub dying: bool,
    pub death_countdown: f64,
    pub skin: Option<String>,
    pub spawn_remaining: Option<u32>,
    pub spawn_template: Option<Box<EnemySpawn>>,
    depleted: bool,
}

impl ActiveEnemy {
    pub fn from_spawn(id: u32, spawn: EnemySpawn) -> Self {
        let spawn_remaining = spawn.spawn_capacity.filter(|&c| c > 0);
        Self {
            id,
            kind: spawn.kind,
            rect: spawn.rect,
            viewing_direction: spawn.direction,
            movement: spawn.movement.into_iter().collect(),
            actions: spawn.actions,
            action_index: 0,
            action_elapsed: 0.0,
            dying: false,
            death_countdown: 0.0,
            skin: spawn.skin,
            spawn_remaining,
            spawn_template: spawn.spawn_template,
            depleted: false,
        }
    }

    pub fn capabilities(&self) -> &'static Capabilities {
        self.kind.capabilities()
    }

    /// Alive, visible and able to take part in combat checks
    pub fn is_combatant(&self) -> bool {
        !self.dying && self.capabilities().is_visible
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    /// Follow the scripted movement queue. Time left over after a leg ends
    /// carries into the next one.
    pub fn advance_movement(&mut self, elapsed_ms: f64) {
        if !self.capabilities().can_move {
            return;
        }

        let mut remaining = elapsed_ms.max(0.0);
        while remaining > 0.0 {
            let Some(segment) = self.movement.front_mut() else {
                break;
            };

            let step = remaining.min((segment.duration - segment.elapsed).max(0.0));
            segment.elapsed += step;
            remaining -= step;

            self.rect = self.rect.offset(Point::new(segment.vx * step, segment.vy * step));
            if let Some(direction) = Direction::from_components(segment.vx, segment.vy) {
                self.viewing_direction = direction;
            }

            if segment.elapsed >= segment.duration {
                self.movement.pop_front();
            }
        }
    }

    /// Step the cyclic action schedule; returns the action that fires
    pub fn advance_actions(&mut self, elapsed_ms: f64) -> Option<EnemyAction> {
        let caps = self.capabilities();
        if !(caps.can_fire || caps.can_spawn) || self.actions.is_empty() {
            return None;
        }

        self.action_elapsed += elapsed_ms.max(0.0);
        let current = self.actions[self.action_index % self.actions.len()];
        if self.action_elapsed <= current.delay {
            return None;
        }

        self.action_elapsed = 0.0;
        self.action_index = (self.action_index + 1) % self.actions.len();

        if caps.can_spawn {
            self.try_spawn().map(EnemyAction::Spawn)
        } else {
            Some(EnemyAction::Fire(current.kind))
        }
    }

    /// Produce one enemy from the template, centered in this area
    pub fn try_spawn(&mut self) -> Option<EnemySpawn> {
        if !self.capabilities().can_spawn || self.depleted {
            return None;
        }
        let template = self.spawn_template.as_deref()?;

        let mut spawn = template.clone();
        spawn.rect = Rectangle::centered_at(self.center(), template.rect.width, template.rect.height);

        if let Some(remaining) = self.spawn_remaining.as_mut() {
            *remaining -= 1;
            if *remaining == 0 {
                self.depleted = true;
            }
        }
        Some(spawn)
    }

    pub fn is_depleted(&self) -> bool {
        self.depleted
    }

    /// Start dying; returns the archetype's death side effect
    pub fn die(&mut self, duration_ms: f64) -> Option<GameEvent> {
        if self.dying {
            return None;
        }
        self.dying = true;
        self.death_countdown = duration_ms;
        self.kind.on_death(self.id)
    }

    /// Count down a dying enemy. True once it should be removed.
    pub fn advance_death(&mut self, elapsed_ms: f64) -> bool {
        if !self.dying {
            return false;
        }
        self.death_countdown -= elapsed_ms;
        self.death_countdown <= 0.0
    }
}
