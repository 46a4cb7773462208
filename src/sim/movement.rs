//! Movement calculator
//!
//! Turns elapsed time, direction and speed into a displacement vector.
//! Diagonal components are rounded here (and only here) so entities move in
//! whole pixels on both axes.

use super::collision::stop_movement_on_collision;
use super::geometry::{Direction, Point, Rectangle};

/// Unrounded travel distance for a tick, capped by `max_distance`
pub fn travel_distance(elapsed_ms: f64, speed_per_ms: f64, max_distance: Option<f64>) -> f64 {
    let distance = (elapsed_ms * speed_per_ms).max(0.0);
    match max_distance {
        Some(max) => distance.min(max.max(0.0)),
        None => distance,
    }
}

/// Displacement for one tick of travel in `direction`
pub fn displacement(
    elapsed_ms: f64,
    direction: Direction,
    speed_per_ms: f64,
    max_distance: Option<f64>,
) -> Point {
    let distance = travel_distance(elapsed_ms, speed_per_ms, max_distance);
    let (sx, sy) = direction.unit_signs();

    if direction.is_diagonal() {
        let diagonal = (distance * distance / 2.0).sqrt().round();
        Point::new(sx * diagonal, sy * diagonal)
    } else {
        Point::new(sx * distance, sy * distance)
    }
}

/// Move `rect` by `delta`, stopping at the most restrictive obstacle.
///
/// Every obstacle is tested against the full, unclamped displacement; the
/// adjusted rectangle with the shortest travel wins.
pub fn resolve_movement<'a>(
    rect: &Rectangle,
    direction: Direction,
    delta: Point,
    obstacles: impl IntoIterator<Item = &'a Rectangle>,
) -> Rectangle {
    let mut best = rect.offset(delta);
    let mut best_travel = delta.length();

    for obstacle in obstacles {
        if let Some(adjusted) = stop_movement_on_collision(rect, obstacle, direction, delta) {
            let travel = (adjusted.position() - rect.position()).length();
            if travel < best_travel {
                best = adjusted;
                best_travel = travel;
            }
        }
    }

    best
}
