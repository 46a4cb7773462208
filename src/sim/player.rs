//! Per-player input and behavior state
//!
//! Raw button state is sampled once per tick into an [`InputSnapshot`];
//! [`PlayerBehavior`] turns consecutive snapshots into edges (trigger
//! pressed/released, weapon cycling) so held buttons act exactly once.

use serde::{Deserialize, Serialize};

use super::geometry::Direction;

/// Buttons held by one player during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub primary_action: bool,
    pub cycle_next: bool,
    pub cycle_prev: bool,
}

impl InputSnapshot {
    /// Requested movement direction; opposite keys cancel out
    pub fn direction(&self) -> Option<Direction> {
        let dx = (self.move_right as i8 - self.move_left as i8) as f64;
        let dy = (self.move_down as i8 - self.move_up as i8) as f64;
        Direction::from_components(dx, dy)
    }

    /// Snapshot holding only a direction
    pub fn moving(direction: Direction) -> Self {
        let (sx, sy) = direction.unit_signs();
        Self {
            move_up: sy < 0.0,
            move_down: sy > 0.0,
            move_left: sx < 0.0,
            move_right: sx > 0.0,
            ..Default::default()
        }
    }
}

/// Transient per-mission state of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerBehavior {
    pub direction: Direction,
    pub moving: bool,
    pub firing: bool,
    pub trigger_pressed: bool,
    pub trigger_released: bool,
    pub dying: bool,
    pub death_countdown: f64,
    pub invincible: bool,
    pub invincibility_countdown: f64,
    pub time_since_last_shot: f64,
    pub cycle_next_pressed: bool,
    pub cycle_prev_pressed: bool,
    cycle_next_held: bool,
    cycle_prev_held: bool,
}

impl Default for PlayerBehavior {
    fn default() -> Self {
        Self::new(Direction::Up)
    }
}

impl PlayerBehavior {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            moving: false,
            firing: false,
            trigger_pressed: false,
            trigger_released: false,
            dying: false,
            death_countdown: 0.0,
            invincible: false,
            invincibility_countdown: 0.0,
            // Ready to shoot immediately
            time_since_last_shot: f64::MAX,
            cycle_next_pressed: false,
            cycle_prev_pressed: false,
            cycle_next_held: false,
            cycle_prev_held: false,
        }
    }

    /// Derive this tick's state from the input snapshot
    pub fn update(&mut self, input: &InputSnapshot, elapsed_ms: f64) {
        self.time_since_last_shot += elapsed_ms.max(0.0);

        let wanted = input.direction();
        let was_idle = !self.moving;
        let was_firing = self.firing;

        // A stationary player who is already shooting turns in place instead
        // of walking off, so aim is kept.
        self.moving = wanted.is_some() && !(was_idle && was_firing);

        self.trigger_pressed = !was_firing && input.primary_action;
        self.trigger_released = was_firing && !input.primary_action;
        self.firing = input.primary_action;

        if let Some(direction) = wanted {
            self.direction = direction;
        }

        self.cycle_next_pressed = !self.cycle_next_held && input.cycle_next;
        self.cycle_next_held = input.cycle_next;
        self.cycle_prev_pressed = !self.cycle_prev_held && input.cycle_prev;
        self.cycle_prev_held = input.cycle_prev;
    }

    /// Start the death sequence
    pub fn die(&mut self, duration_ms: f64) {
        self.dying = true;
        self.death_countdown = duration_ms;
        self.moving = false;
        self.firing = false;
        self.trigger_pressed = false;
        self.trigger_released = false;
    }

    /// Count down the death sequence. True on the tick it completes.
    pub fn advance_death(&mut self, elapsed_ms: f64) -> bool {
        if !self.dying {
            return false;
        }
        self.death_countdown -= elapsed_ms;
        if self.death_countdown <= 0.0 {
            self.dying = false;
            self.death_countdown = 0.0;
            true
        } else {
            false
        }
    }

    pub fn start_invincibility(&mut self, duration_ms: f64) {
        self.invincible = true;
        self.invincibility_countdown = duration_ms;
    }

    pub fn advance_invincibility(&mut self, elapsed_ms: f64) {
        if !self.invincible {
            return;
        }
        self.invincibility_countdown -= elapsed_ms;
        if self.invincibility_countdown <= 0.0 {
            self.invincible = false;
            self.invincibility_countdown = 0.0;
        }
    }

    /// Whether lethal collisions apply to this player right now
    pub fn is_vulnerable(&self) -> bool {
        !self.dying && !self.invincible
    }

    pub fn shot_fired(&mut self) {
        self.time_since_last_shot = 0.0;
    }
}
