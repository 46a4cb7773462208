//! Level data and the scroll controller
//!
//! A level is an ordered list of segments, each scrolling in one cardinal
//! direction. The controller owns the current segment's world (background
//! tiles, obstacles, not-yet-active enemies, goal), moves it as players
//! push forward, and hands enemies to the engine once the camera nears them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::enemy::EnemySpawn;
use super::geometry::{Direction, Point, Rectangle};
use crate::error::LevelError;
use crate::tuning::Tuning;

/// A static blocker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub rect: Rectangle,
    #[serde(default)]
    pub stops_bullets: bool,
    #[serde(default)]
    pub stops_explosives: bool,
}

/// Background tile as stored in level data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundStrip {
    pub image: String,
    /// Extent along the scroll axis
    pub length: f64,
}

/// Background tile placed in the world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundTile {
    pub image: String,
    pub rect: Rectangle,
}

/// One scrolling section of a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSegment {
    pub direction: Direction,
    pub backgrounds: Vec<BackgroundStrip>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    #[serde(default)]
    pub goal: Option<Rectangle>,
}

/// A complete mission map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    #[serde(default)]
    pub name: String,
    /// Top-left corner of each player's start rectangle
    #[serde(default)]
    pub player_starts: Vec<Point>,
    pub segments: Vec<LevelSegment>,
}

impl LevelData {
    /// Parse and validate a level from JSON
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let level: LevelData = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Load a single level file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let level = Self::from_json_str(&json)?;
        log::info!("Loaded level {:?} ({} segments)", level.name, level.segments.len());
        Ok(level)
    }

    /// Segments must exist and scroll along a cardinal axis
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.segments.is_empty() {
            return Err(LevelError::NoSegments(self.name.clone()));
        }
        for segment in &self.segments {
            if segment.direction.is_diagonal() {
                return Err(LevelError::InvalidDirection(segment.direction.to_string()));
            }
        }
        Ok(())
    }
}

/// Load every `*.json` level in a directory, sorted by file name.
///
/// A malformed file is logged and skipped; an unreadable directory fails.
pub fn load_levels_dir(dir: impl AsRef<Path>) -> Result<Vec<LevelData>, LevelError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| LevelError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<_> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut levels = Vec::with_capacity(paths.len());
    for path in paths {
        match LevelData::load(&path) {
            Ok(level) => levels.push(level),
            Err(err) => log::warn!("Skipping level {}: {}", path.display(), err),
        }
    }
    Ok(levels)
}

/// Progress through the level
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollState {
    pub segment_index: usize,
    pub distance_scrolled: f64,
    /// Scroll still to apply; only ever drained by scrolling
    pub distance_owed: f64,
}

/// Owns the scrolling world of the current segment
#[derive(Debug, Clone)]
pub struct LevelController {
    segments: Vec<LevelSegment>,
    play_field: Rectangle,
    max_scroll_speed: f64,
    barrier_fraction: f64,
    activation_margin: f64,
    border_margin: f64,

    scroll: ScrollState,
    direction: Direction,
    segment_length: f64,
    backgrounds: Vec<BackgroundTile>,
    obstacles: Vec<Obstacle>,
    pending: Vec<EnemySpawn>,
    goal: Option<Rectangle>,
}

impl LevelController {
    pub fn new(level: LevelData, play_field: Rectangle, tuning: &Tuning) -> Result<Self, LevelError> {
        level.validate()?;

        let mut controller = Self {
            direction: level.segments[0].direction,
            segments: level.segments,
            play_field,
            max_scroll_speed: tuning.max_scroll_speed,
            barrier_fraction: tuning.scroll_barrier_fraction,
            activation_margin: tuning.activation_margin,
            border_margin: tuning.border_margin,
            scroll: ScrollState::default(),
            segment_length: 0.0,
            backgrounds: Vec::new(),
            obstacles: Vec::new(),
            pending: Vec::new(),
            goal: None,
        };
        controller.install_segment(0);
        Ok(controller)
    }

    fn install_segment(&mut self, index: usize) {
        let segment = &self.segments[index];
        let field = self.play_field;
        let direction = segment.direction;
        self.direction = direction;

        let mut cursor = match direction {
            Direction::Up => field.bottom(),
            Direction::Left => field.right(),
            Direction::Right => field.left(),
            _ => field.top(),
        };

        self.backgrounds = segment
            .backgrounds
            .iter()
            .map(|tile| {
                let len = tile.length;
                let rect = match direction {
                    Direction::Up => {
                        cursor -= len;
                        Rectangle::new(field.x, cursor, field.width, len)
                    }
                    Direction::Left => {
                        cursor -= len;
                        Rectangle::new(cursor, field.y, len, field.height)
                    }
                    Direction::Right => {
                        cursor += len;
                        Rectangle::new(cursor - len, field.y, len, field.height)
                    }
                    _ => {
                        cursor += len;
                        Rectangle::new(field.x, cursor - len, field.width, len)
                    }
                };
                BackgroundTile {
                    image: tile.image.clone(),
                    rect,
                }
            })
            .collect();

        let total: f64 = segment.backgrounds.iter().map(|b| b.length).sum();
        self.segment_length = (total - self.axis_extent()).max(0.0);
        self.obstacles = segment.obstacles.clone();
        self.pending = segment.enemies.clone();
        self.goal = segment.goal;
        self.scroll = ScrollState {
            segment_index: index,
            ..ScrollState::default()
        };
    }

    fn axis_extent(&self) -> f64 {
        match self.direction {
            Direction::Left | Direction::Right => self.play_field.width,
            _ => self.play_field.height,
        }
    }

    pub fn play_field(&self) -> &Rectangle {
        &self.play_field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroll
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segment_length(&self) -> f64 {
        self.segment_length
    }

    pub fn remaining_length(&self) -> f64 {
        (self.segment_length - self.scroll.distance_scrolled).max(0.0)
    }

    pub fn backgrounds(&self) -> &[BackgroundTile] {
        &self.backgrounds
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Obstacles currently on screen
    pub fn visible_obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles
            .iter()
            .filter(move |o| o.rect.intersects(&self.play_field))
    }

    pub fn pending_enemies(&self) -> &[EnemySpawn] {
        &self.pending
    }

    pub fn goal(&self) -> Option<&Rectangle> {
        self.goal.as_ref()
    }

    /// How far the rearmost player is past the scroll barrier
    pub fn scroll_pressure(&self, players: &[Rectangle]) -> f64 {
        if players.is_empty() {
            return 0.0;
        }
        let field = &self.play_field;
        let f = self.barrier_fraction;

        let pressure = match self.direction {
            Direction::Up => {
                let barrier = field.top() + field.height * f;
                let trailing = players.iter().map(|p| p.top()).fold(f64::MIN, f64::max);
                barrier - trailing
            }
            Direction::Down => {
                let barrier = field.bottom() - field.height * f;
                let trailing = players.iter().map(|p| p.bottom()).fold(f64::MAX, f64::min);
                trailing - barrier
            }
            Direction::Left => {
                let barrier = field.left() + field.width * f;
                let trailing = players.iter().map(|p| p.left()).fold(f64::MIN, f64::max);
                barrier - trailing
            }
            _ => {
                let barrier = field.right() - field.width * f;
                let trailing = players.iter().map(|p| p.right()).fold(f64::MAX, f64::min);
                trailing - barrier
            }
        };
        pressure.max(0.0)
    }

    /// How far content may shift before a player is pushed off screen
    fn room_to_far_edge(&self, players: &[Rectangle]) -> f64 {
        let field = &self.play_field;
        let m = self.border_margin;
        players
            .iter()
            .map(|p| match self.direction {
                Direction::Up => field.bottom() - m - p.bottom(),
                Direction::Down => p.top() - (field.top() + m),
                Direction::Left => field.right() - m - p.right(),
                _ => p.left() - (field.left() + m),
            })
            .fold(f64::MAX, f64::min)
            .max(0.0)
    }

    fn offset_for(&self, amount: f64) -> Point {
        match self.direction {
            Direction::Up => Point::new(0.0, amount),
            Direction::Down => Point::new(0.0, -amount),
            Direction::Left => Point::new(amount, 0.0),
            _ => Point::new(-amount, 0.0),
        }
    }

    /// Advance the camera. Returns the world offset every live entity must
    /// be shifted by.
    pub fn scroll(&mut self, elapsed_ms: f64, players: &[Rectangle]) -> Point {
        let pressure = self.scroll_pressure(players);
        self.scroll.distance_owed = self.scroll.distance_owed.max(pressure);

        let applied = if players.is_empty() {
            0.0
        } else {
            self.scroll
                .distance_owed
                .min(self.remaining_length())
                .min(self.max_scroll_speed * elapsed_ms.max(0.0))
                .min(self.room_to_far_edge(players))
                .max(0.0)
        };

        self.scroll.distance_owed -= applied;
        self.scroll.distance_scrolled += applied;

        let offset = self.offset_for(applied);
        if applied > 0.0 {
            self.shift(offset);
        }

        if self.remaining_length() <= 0.0 && self.scroll.segment_index + 1 < self.segments.len() {
            let next = self.scroll.segment_index + 1;
            log::debug!("Advancing to segment {} ({})", next, self.segments[next].direction);
            self.install_segment(next);
        }

        offset
    }

    fn shift(&mut self, offset: Point) {
        for tile in &mut self.backgrounds {
            tile.rect = tile.rect.offset(offset);
        }
        for obstacle in &mut self.obstacles {
            obstacle.rect = obstacle.rect.offset(offset);
        }
        for spawn in &mut self.pending {
            spawn.rect = spawn.rect.offset(offset);
        }
        if let Some(goal) = self.goal.as_mut() {
            *goal = goal.offset(offset);
        }

        let field = self.play_field;
        let direction = self.direction;
        self.obstacles
            .retain(|o| !has_scrolled_past(&o.rect, &field, direction));
        self.pending
            .retain(|s| !has_scrolled_past(&s.rect, &field, direction));
    }

    /// Strip just outside the edge the camera is moving toward
    pub fn activation_window(&self) -> Rectangle {
        let field = &self.play_field;
        let m = self.activation_margin;
        match self.direction {
            Direction::Up => Rectangle::new(field.x, field.top() - m, field.width, m),
            Direction::Down => Rectangle::new(field.x, field.bottom(), field.width, m),
            Direction::Left => Rectangle::new(field.left() - m, field.y, m, field.height),
            _ => Rectangle::new(field.right(), field.y, m, field.height),
        }
    }

    /// Whether a live enemy at `rect` should stay in the simulation
    pub fn retains_enemy(&self, rect: &Rectangle) -> bool {
        rect.intersects(&self.play_field) || rect.intersects(&self.activation_window())
    }

    /// Remove and return the enemies the camera has reached
    pub fn take_activated(&mut self) -> Vec<EnemySpawn> {
        let pending = std::mem::take(&mut self.pending);
        let (activated, pending): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|spawn| self.retains_enemy(&spawn.rect));
        self.pending = pending;
        activated
    }
}

/// Entirely beyond the trailing edge: it can never come back on screen
fn has_scrolled_past(rect: &Rectangle, field: &Rectangle, direction: Direction) -> bool {
    match direction {
        Direction::Up => rect.top() >= field.bottom(),
        Direction::Down => rect.bottom() <= field.top(),
        Direction::Left => rect.left() >= field.right(),
        _ => rect.right() <= field.left(),
    }
}
