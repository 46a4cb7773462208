//! Bullets, explosives, explosions and burn marks
//!
//! Small state machines built on the movement calculator. None of them
//! know about obstacles or enemies; the tick tests those and decides when a
//! projectile ends.

use serde::{Deserialize, Serialize};

use super::geometry::{Direction, Point, Rectangle};
use super::movement::{displacement, travel_distance};

/// Who fired a projectile or caused an explosion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    /// Player index
    Player(usize),
    Enemy,
}

impl Owner {
    pub fn is_player(self) -> bool {
        matches!(self, Owner::Player(_))
    }

    /// Player index responsible, if any
    pub fn player(self) -> Option<usize> {
        match self {
            Owner::Player(index) => Some(index),
            Owner::Enemy => None,
        }
    }
}

/// Straight-line travel toward a fixed range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub rect: Rectangle,
    pub direction: Direction,
    pub speed: f64,
    pub distance_moved: f64,
    pub distance_to_target: f64,
}

impl Flight {
    pub fn new(rect: Rectangle, direction: Direction, speed: f64, range: f64) -> Self {
        Self {
            rect,
            direction,
            speed,
            distance_moved: 0.0,
            distance_to_target: range.max(0.0),
        }
    }

    pub fn remaining(&self) -> f64 {
        (self.distance_to_target - self.distance_moved).max(0.0)
    }

    pub fn is_spent(&self) -> bool {
        self.distance_moved >= self.distance_to_target
    }

    /// Advance along the flight path. Returns true only on the call that
    /// first reaches the target range.
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        if self.is_spent() {
            return false;
        }

        let remaining = self.remaining();
        let step = travel_distance(elapsed_ms, self.speed, Some(remaining));
        self.rect = self
            .rect
            .offset(displacement(elapsed_ms, self.direction, self.speed, Some(remaining)));

        self.distance_moved = (self.distance_moved + step).min(self.distance_to_target);
        self.is_spent()
    }
}

/// A bullet in flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub flight: Flight,
    pub owner: Owner,
    /// Spawns an explosion when it ends
    pub explodes_on_impact: bool,
}

impl Bullet {
    pub fn new(id: u32, flight: Flight, owner: Owner, explodes_on_impact: bool) -> Self {
        Self {
            id,
            flight,
            owner,
            explodes_on_impact,
        }
    }

    pub fn rect(&self) -> &Rectangle {
        &self.flight.rect
    }

    pub fn fired_by_player(&self) -> bool {
        self.owner.is_player()
    }

    /// See [`Flight::advance`]
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        self.flight.advance(elapsed_ms)
    }
}

/// A thrown grenade or fired rocket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosive {
    pub id: u32,
    pub flight: Flight,
    pub owner: Owner,
    /// Detonates when touching an enemy (rockets)
    pub explodes_on_contact: bool,
}

impl Explosive {
    pub fn new(id: u32, flight: Flight, owner: Owner, explodes_on_contact: bool) -> Self {
        Self {
            id,
            flight,
            owner,
            explodes_on_contact,
        }
    }

    pub fn rect(&self) -> &Rectangle {
        &self.flight.rect
    }

    pub fn fired_by_player(&self) -> bool {
        self.owner.is_player()
    }

    /// See [`Flight::advance`]
    pub fn advance(&mut self, elapsed_ms: f64) -> bool {
        self.flight.advance(elapsed_ms)
    }
}

/// A scorch left on the ground. Lives until scrolled away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnMark {
    pub rect: Rectangle,
}

/// A live explosion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub id: u32,
    pub rect: Rectangle,
    pub age: f64,
    pub duration: f64,
    pub has_created_mark: bool,
    pub owner: Owner,
}

impl Explosion {
    /// Explosion of fixed size centered on the source rectangle
    pub fn new(id: u32, source: &Rectangle, width: f64, height: f64, duration: f64, owner: Owner) -> Self {
        Self {
            id,
            rect: Rectangle::centered_at(source.center(), width, height),
            age: 0.0,
            duration,
            has_created_mark: false,
            owner,
        }
    }

    pub fn center(&self) -> Point {
        self.rect.center()
    }

    pub fn caused_by_player(&self) -> bool {
        self.owner.is_player()
    }

    pub fn tick(&mut self, elapsed_ms: f64) {
        self.age += elapsed_ms.max(0.0);
    }

    /// True on the first tick at or past a third of the lifetime, until the
    /// mark is created
    pub fn creates_mark(&self) -> bool {
        !self.has_created_mark && self.age >= self.duration / 3.0
    }

    /// Leave a burn mark under the explosion (clamped into the play field)
    pub fn create_mark(&mut self, play_field: &Rectangle) -> BurnMark {
        self.has_created_mark = true;
        BurnMark {
            rect: self.rect.clamped_into(play_field).rounded(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.duration
    }
}
