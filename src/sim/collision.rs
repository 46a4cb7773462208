//! Swept rectangle-vs-rectangle collision for the eight movement directions
//!
//! The tricky part of the simulation: a rectangle travelling a full tick's
//! displacement must stop flush against the first obstacle it would touch,
//! even when the obstacle is smaller than the mover and slips between the
//! mover's corners.
//!
//! No rounding happens here so several obstacles can be tested per tick
//! without accumulating error.

use super::geometry::{Direction, Line, Point, Rectangle};

/// A successful contact: how far the mover may travel before touching
#[derive(Debug, Clone, Copy)]
struct Contact {
    translation: Point,
    distance: f64,
}

/// Corner of a rectangle selected by horizontal/vertical side (-1 or +1)
fn corner(rect: &Rectangle, side_x: f64, side_y: f64) -> Point {
    Point::new(
        if side_x > 0.0 { rect.right() } else { rect.left() },
        if side_y > 0.0 { rect.bottom() } else { rect.top() },
    )
}

/// Vertical border on the given side (-1 left, +1 right)
fn vertical_border(rect: &Rectangle, side_x: f64) -> Line {
    if side_x > 0.0 {
        rect.right_border()
    } else {
        rect.left_border()
    }
}

/// Horizontal border on the given side (-1 top, +1 bottom)
fn horizontal_border(rect: &Rectangle, side_y: f64) -> Line {
    if side_y > 0.0 {
        rect.bottom_border()
    } else {
        rect.top_border()
    }
}

/// Cast rays from `origins` along `delta` against `borders`, recording
/// every hit as a contact. `flip` turns a hit into the mover's translation
/// for rays cast from the still rectangle.
fn cast_rays(
    origins: &[Point],
    delta: Point,
    borders: &[Line],
    flip: bool,
    contacts: &mut Vec<Contact>,
) {
    for &origin in origins {
        let ray = Line::from_vector(origin, delta);
        for border in borders {
            if let Some(hit) = ray.intersection(border) {
                let hit = onto_border(hit, border);
                let translation = if flip { origin - hit } else { hit - origin };
                contacts.push(Contact {
                    translation,
                    distance: translation.length(),
                });
            }
        }
    }
}

/// Put a hit point exactly on the axis-aligned border it was found on
fn onto_border(hit: Point, border: &Line) -> Point {
    if border.start.y == border.end.y {
        Point::new(hit.x, border.start.y)
    } else {
        Point::new(border.start.x, hit.y)
    }
}

/// Gap still counted as touching after a float computation
const TOUCH_TOLERANCE: f64 = 1e-9;

/// Whether `moved`, touching `still`, would overlap it if it kept going
/// along (`sx`, `sy`). Corners that only meet while sliding apart do not.
fn enters(moved: &Rectangle, still: &Rectangle, sx: f64, sy: f64) -> bool {
    fn axis(lo: f64, hi: f64, still_lo: f64, still_hi: f64, sign: f64) -> bool {
        if sign > 0.0 {
            hi >= still_lo - TOUCH_TOLERANCE && lo < still_hi
        } else if sign < 0.0 {
            lo <= still_hi + TOUCH_TOLERANCE && hi > still_lo
        } else {
            lo < still_hi && hi > still_lo
        }
    }
    axis(moved.left(), moved.right(), still.left(), still.right(), sx)
        && axis(moved.top(), moved.bottom(), still.top(), still.bottom(), sy)
}

/// Earliest contact; ties keep the first one recorded
fn nearest(contacts: &[Contact]) -> Option<Contact> {
    let mut best: Option<Contact> = None;
    for contact in contacts {
        match best {
            Some(b) if contact.distance >= b.distance => {}
            _ => best = Some(*contact),
        }
    }
    best
}

/// Stop a moving rectangle at the first contact with a still one.
///
/// Returns the adjusted rectangle, or `None` when the full `displacement`
/// does not touch `still` (the caller then applies it unchanged).
pub fn stop_movement_on_collision(
    moving: &Rectangle,
    still: &Rectangle,
    direction: Direction,
    displacement: Point,
) -> Option<Rectangle> {
    if displacement == Point::ZERO {
        return None;
    }

    let contacts = if direction.is_diagonal() {
        diagonal_contacts(moving, still, direction, displacement)
    } else {
        cardinal_contacts(moving, still, direction, displacement)
    };

    nearest(&contacts).map(|c| moving.offset(c.translation))
}

fn cardinal_contacts(
    moving: &Rectangle,
    still: &Rectangle,
    direction: Direction,
    displacement: Point,
) -> Vec<Contact> {
    let (sx, sy) = direction.unit_signs();
    let horizontal = sx != 0.0;

    // Grazing along a shared edge never blocks
    let overlaps = if horizontal {
        moving.top() < still.bottom() && moving.bottom() > still.top()
    } else {
        moving.left() < still.right() && moving.right() > still.left()
    };
    if !overlaps {
        return Vec::new();
    }

    let (leading, opposing, still_facing, mover_border, still_is_smaller) = if horizontal {
        (
            [corner(moving, sx, -1.0), corner(moving, sx, 1.0)],
            vertical_border(still, -sx),
            [corner(still, -sx, -1.0), corner(still, -sx, 1.0)],
            vertical_border(moving, sx),
            still.height < moving.height,
        )
    } else {
        (
            [corner(moving, -1.0, sy), corner(moving, 1.0, sy)],
            horizontal_border(still, -sy),
            [corner(still, -1.0, -sy), corner(still, 1.0, -sy)],
            horizontal_border(moving, sy),
            still.width < moving.width,
        )
    };

    let mut contacts = Vec::with_capacity(4);
    cast_rays(&leading, displacement, &[opposing], false, &mut contacts);

    if still_is_smaller {
        cast_rays(&still_facing, -displacement, &[mover_border], true, &mut contacts);
    }

    contacts
}

fn diagonal_contacts(
    moving: &Rectangle,
    still: &Rectangle,
    direction: Direction,
    displacement: Point,
) -> Vec<Contact> {
    let (sx, sy) = direction.unit_signs();

    let leading = [
        corner(moving, sx, -sy),
        corner(moving, sx, sy),
        corner(moving, -sx, sy),
    ];
    let facing_borders = [vertical_border(still, -sx), horizontal_border(still, -sy)];

    let mut contacts = Vec::with_capacity(12);
    cast_rays(&leading, displacement, &facing_borders, false, &mut contacts);

    if still.width < moving.width || still.height < moving.height {
        let still_facing = [
            corner(still, -sx, sy),
            corner(still, -sx, -sy),
            corner(still, sx, -sy),
        ];
        let mover_borders = [vertical_border(moving, sx), horizontal_border(moving, sy)];
        cast_rays(&still_facing, -displacement, &mover_borders, true, &mut contacts);
    }

    contacts.retain(|c| enters(&moving.offset(c.translation), still, sx, sy));
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_no_collision_when_path_clear() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(100.0, 0.0, 10.0, 10.0);
        let result =
            stop_movement_on_collision(&moving, &still, Direction::Right, Point::new(50.0, 0.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_cardinal_stops_flush() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(30.0, -5.0, 20.0, 20.0);
        let result =
            stop_movement_on_collision(&moving, &still, Direction::Right, Point::new(50.0, 0.0))
                .unwrap();
        assert!((result.right() - 30.0).abs() < EPS);
        assert_eq!(result.y, 0.0);
    }

    #[test]
    fn test_cardinal_up_and_down() {
        let moving = Rectangle::new(0.0, 100.0, 10.0, 10.0);
        let wall = Rectangle::new(-20.0, 50.0, 50.0, 10.0);
        let up = stop_movement_on_collision(&moving, &wall, Direction::Up, Point::new(0.0, -80.0))
            .unwrap();
        assert!((up.top() - 60.0).abs() < EPS);
        assert_eq!(up.x, 0.0);

        let floor = Rectangle::new(-20.0, 150.0, 50.0, 10.0);
        let down =
            stop_movement_on_collision(&moving, &floor, Direction::Down, Point::new(0.0, 80.0))
                .unwrap();
        assert!((down.bottom() - 150.0).abs() < EPS);
    }

    #[test]
    fn test_small_obstacle_between_corners() {
        // Obstacle shorter than the mover, sitting between its two leading corners
        let moving = Rectangle::new(0.0, 0.0, 20.0, 100.0);
        let still = Rectangle::new(50.0, 40.0, 5.0, 5.0);
        let result =
            stop_movement_on_collision(&moving, &still, Direction::Right, Point::new(60.0, 0.0))
                .unwrap();
        assert!((result.right() - 50.0).abs() < EPS);
        assert_eq!(result.y, 0.0);

        let left = stop_movement_on_collision(
            &Rectangle::new(100.0, 0.0, 20.0, 100.0),
            &still,
            Direction::Left,
            Point::new(-60.0, 0.0),
        )
        .unwrap();
        assert!((left.left() - 55.0).abs() < EPS);
    }

    #[test]
    fn test_grazing_does_not_block() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(20.0, 10.0, 10.0, 10.0);
        let result =
            stop_movement_on_collision(&moving, &still, Direction::Right, Point::new(50.0, 0.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_diagonal_hits_left_face() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(20.0, 0.0, 10.0, 100.0);
        let result = stop_movement_on_collision(
            &moving,
            &still,
            Direction::DownRight,
            Point::new(30.0, 30.0),
        )
        .unwrap();
        assert!((result.right() - 20.0).abs() < EPS);
        assert!((result.y - 10.0).abs() < EPS);
    }

    #[test]
    fn test_diagonal_hits_top_face() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(-50.0, 15.0, 200.0, 10.0);
        let result = stop_movement_on_collision(
            &moving,
            &still,
            Direction::DownRight,
            Point::new(20.0, 20.0),
        )
        .unwrap();
        assert!((result.bottom() - 15.0).abs() < EPS);
        assert!((result.x - 5.0).abs() < EPS);
    }

    #[test]
    fn test_diagonal_corner_touch_moving_away() {
        // Bottom-right corner sits on the obstacle's top-left corner
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(10.0, 10.0, 10.0, 10.0);
        let result =
            stop_movement_on_collision(&moving, &still, Direction::UpRight, Point::new(5.0, -5.0));
        assert!(result.is_none());

        let result =
            stop_movement_on_collision(&moving, &still, Direction::DownLeft, Point::new(-5.0, 5.0));
        assert!(result.is_none());
    }

    #[test]
    fn test_diagonal_corner_to_corner_blocks() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(20.0, 20.0, 10.0, 10.0);
        let result = stop_movement_on_collision(
            &moving,
            &still,
            Direction::DownRight,
            Point::new(30.0, 30.0),
        )
        .unwrap();
        assert!((result.right() - 20.0).abs() < EPS);
        assert!((result.bottom() - 20.0).abs() < EPS);

        // Already touching at the corner and heading straight in
        let touching = Rectangle::new(10.0, 10.0, 10.0, 10.0);
        let result = stop_movement_on_collision(
            &touching,
            &still,
            Direction::DownRight,
            Point::new(5.0, 5.0),
        )
        .unwrap();
        assert_eq!(result, touching);
    }

    #[test]
    fn test_diagonal_small_obstacle_fallback() {
        // A pebble strictly inside the mover's swept leading edge
        let moving = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let still = Rectangle::new(120.0, 150.0, 2.0, 2.0);
        let result = stop_movement_on_collision(
            &moving,
            &still,
            Direction::DownRight,
            Point::new(80.0, 80.0),
        )
        .unwrap();
        // The pebble's top-left corner ends up on the mover's bottom border
        assert!((result.bottom() - 150.0).abs() < EPS);
        assert!(result.left() <= 120.0 && result.right() >= 120.0);
    }

    #[test]
    fn test_zero_displacement() {
        let moving = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let still = Rectangle::new(10.0, 0.0, 10.0, 10.0);
        assert!(stop_movement_on_collision(&moving, &still, Direction::Right, Point::ZERO).is_none());
    }

    proptest! {
        #[test]
        fn prop_cardinal_narrow_obstacle_flush(
            w in 10.0f64..100.0,
            h in 20.0f64..100.0,
            gap in 0.0f64..50.0,
            extra in 1.0f64..50.0,
            still_h_frac in 0.05f64..0.9,
            still_off_frac in 0.0f64..1.0,
        ) {
            let moving = Rectangle::new(0.0, 0.0, w, h);
            let still_h = h * still_h_frac;
            let still_y = (h - still_h) * still_off_frac;
            let still = Rectangle::new(w + gap, still_y, 5.0, still_h);
            let result = stop_movement_on_collision(
                &moving, &still, Direction::Right, Point::new(gap + extra, 0.0),
            );
            let result = result.expect("obstacle in path must block");
            prop_assert!((result.right() - still.left()).abs() < 1e-6);
            prop_assert_eq!(result.y, moving.y);
        }

        #[test]
        fn prop_diagonal_stops_at_first_overlap(
            sx in -200.0f64..200.0,
            sy in -200.0f64..200.0,
            sw in 1.0f64..80.0,
            sh in 1.0f64..80.0,
            d in 1.0f64..150.0,
            dir_idx in 0usize..4,
        ) {
            let dirs = [Direction::UpRight, Direction::DownRight, Direction::DownLeft, Direction::UpLeft];
            let direction = dirs[dir_idx];
            let (ux, uy) = direction.unit_signs();
            let displacement = Point::new(ux * d, uy * d);
            let moving = Rectangle::new(0.0, 0.0, 40.0, 40.0);
            let still = Rectangle::new(sx, sy, sw, sh);
            prop_assume!(!moving.intersects(&still));

            // Fractions of the path between which the swept mover overlaps
            let slab = |lo: f64, hi: f64, still_lo: f64, still_hi: f64, delta: f64| {
                if delta > 0.0 {
                    ((still_lo - hi) / delta, (still_hi - lo) / delta)
                } else {
                    ((still_hi - lo) / delta, (still_lo - hi) / delta)
                }
            };
            let (x_in, x_out) = slab(moving.left(), moving.right(), still.left(), still.right(), displacement.x);
            let (y_in, y_out) = slab(moving.top(), moving.bottom(), still.top(), still.bottom(), displacement.y);
            let entry = x_in.max(y_in);
            let exit = x_out.min(y_out);
            let path_overlaps = exit > 1e-6 && entry < 1.0 - 1e-6 && exit - entry > 1e-6;

            let result = stop_movement_on_collision(&moving, &still, direction, displacement);
            if path_overlaps {
                let stopped = result.expect("an overlapping path must be blocked");
                let travel = stopped.position() - moving.position();
                prop_assert!((travel.length() - entry * displacement.length()).abs() < 1e-6);
            }
            if let Some(result) = result {
                let travel = result.position() - moving.position();
                prop_assert!(travel.length() <= entry.clamp(0.0, 1.0) * displacement.length() + 1e-6);
                // Travel never goes against the direction of motion
                prop_assert!(travel.x * ux >= -1e-9);
                prop_assert!(travel.y * uy >= -1e-9);
            }
        }
    }
}
