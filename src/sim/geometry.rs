//! Geometry kernel: points, axis-aligned rectangles, line segments and the
//! eight fixed movement directions.
//!
//! Screen coordinates: origin top-left, y grows downward. All math is f64.

use std::fmt;
use std::str::FromStr;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// A 2D point / vector
pub type Point = DVec2;

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Rectangle of the given size whose center is `center`
    pub fn centered_at(center: Point, width: f64, height: f64) -> Self {
        Self::new(center.x - width / 2.0, center.y - height / 2.0, width, height)
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left(), self.top())
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Translate by a vector
    pub fn offset(&self, by: Point) -> Self {
        Self {
            x: self.x + by.x,
            y: self.y + by.y,
            ..*self
        }
    }

    /// Overlapping area of two rectangles, if it is non-empty.
    ///
    /// Rectangles that only share an edge do not intersect.
    pub fn intersection(&self, other: &Rectangle) -> Option<Rectangle> {
        let left = self.left().max(other.left());
        let right = self.right().min(other.right());
        let top = self.top().max(other.top());
        let bottom = self.bottom().min(other.bottom());

        if right > left && bottom > top {
            Some(Rectangle::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Rectangle) -> bool {
        self.intersection(other).is_some()
    }

    /// True if `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rectangle) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Shrink by `margin` on every side
    pub fn inset(&self, margin: f64) -> Self {
        Self::new(
            self.x + margin,
            self.y + margin,
            self.width - 2.0 * margin,
            self.height - 2.0 * margin,
        )
    }

    /// Move this rectangle (keeping its size) so it lies inside `bounds`.
    /// If it is larger than `bounds` along an axis it is aligned to the
    /// bounds' top/left edge on that axis.
    pub fn clamped_into(&self, bounds: &Rectangle) -> Self {
        let max_x = (bounds.right() - self.width).max(bounds.left());
        let max_y = (bounds.bottom() - self.height).max(bounds.top());
        Self {
            x: self.x.clamp(bounds.left(), max_x),
            y: self.y.clamp(bounds.top(), max_y),
            ..*self
        }
    }

    /// Same rectangle with every component rounded to the nearest integer
    pub fn rounded(&self) -> Self {
        Self::new(
            self.x.round(),
            self.y.round(),
            self.width.round(),
            self.height.round(),
        )
    }

    pub fn top_border(&self) -> Line {
        Line::new(self.top_left(), self.top_right())
    }

    pub fn bottom_border(&self) -> Line {
        Line::new(self.bottom_left(), self.bottom_right())
    }

    pub fn left_border(&self) -> Line {
        Line::new(self.top_left(), self.bottom_left())
    }

    pub fn right_border(&self) -> Line {
        Line::new(self.top_right(), self.bottom_right())
    }

    /// All four borders: top, bottom, left, right
    pub fn borders(&self) -> [Line; 4] {
        [
            self.top_border(),
            self.bottom_border(),
            self.left_border(),
            self.right_border(),
        ]
    }
}

/// A line segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

impl Line {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Segment starting at `start` and spanning `delta`
    pub fn from_vector(start: Point, delta: Point) -> Self {
        Self::new(start, start + delta)
    }

    pub fn delta(&self) -> Point {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    /// Intersection point of two segments.
    ///
    /// Endpoints count as part of the segment. Parallel, collinear and
    /// zero-length segments never intersect.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let r = self.delta();
        let s = other.delta();
        let denom = r.perp_dot(s);
        if denom == 0.0 {
            return None;
        }

        let qp = other.start - self.start;
        let t = qp.perp_dot(s) / denom;
        let u = qp.perp_dot(r) / denom;

        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.start + r * t)
        } else {
            None
        }
    }

    /// Equality ignoring which end is the start
    pub fn same_segment(&self, other: &Line) -> bool {
        (self.start == other.start && self.end == other.end)
            || (self.start == other.end && self.end == other.start)
    }
}

/// One of the eight fixed movement directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Direction {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    /// Compass angle in degrees, counter-clockwise from Right
    pub fn angle_degrees(self) -> f64 {
        match self {
            Direction::Right => 0.0,
            Direction::UpRight => 45.0,
            Direction::Up => 90.0,
            Direction::UpLeft => 135.0,
            Direction::Left => 180.0,
            Direction::DownLeft => 225.0,
            Direction::Down => 270.0,
            Direction::DownRight => 315.0,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Direction::UpRight | Direction::DownRight | Direction::DownLeft | Direction::UpLeft
        )
    }

    /// Per-axis sign of travel in screen space (y down)
    pub fn unit_signs(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::UpRight => (1.0, -1.0),
            Direction::Right => (1.0, 0.0),
            Direction::DownRight => (1.0, 1.0),
            Direction::Down => (0.0, 1.0),
            Direction::DownLeft => (-1.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::UpLeft => (-1.0, -1.0),
        }
    }

    /// Direction pointing the opposite way
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::UpRight => Direction::DownLeft,
            Direction::Right => Direction::Left,
            Direction::DownRight => Direction::UpLeft,
            Direction::Down => Direction::Up,
            Direction::DownLeft => Direction::UpRight,
            Direction::Left => Direction::Right,
            Direction::UpLeft => Direction::DownRight,
        }
    }

    /// Direction matching the signs of a screen-space vector, if non-zero
    pub fn from_components(dx: f64, dy: f64) -> Option<Direction> {
        let sx = if dx > 0.0 { 1 } else if dx < 0.0 { -1 } else { 0 };
        let sy = if dy > 0.0 { 1 } else if dy < 0.0 { -1 } else { 0 };
        match (sx, sy) {
            (0, -1) => Some(Direction::Up),
            (1, -1) => Some(Direction::UpRight),
            (1, 0) => Some(Direction::Right),
            (1, 1) => Some(Direction::DownRight),
            (0, 1) => Some(Direction::Down),
            (-1, 1) => Some(Direction::DownLeft),
            (-1, 0) => Some(Direction::Left),
            (-1, -1) => Some(Direction::UpLeft),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::UpRight => "up_right",
            Direction::Right => "right",
            Direction::DownRight => "down_right",
            Direction::Down => "down",
            Direction::DownLeft => "down_left",
            Direction::Left => "left",
            Direction::UpLeft => "up_left",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "up" => Ok(Direction::Up),
            "upright" => Ok(Direction::UpRight),
            "right" => Ok(Direction::Right),
            "downright" => Ok(Direction::DownRight),
            "down" => Ok(Direction::Down),
            "downleft" => Ok(Direction::DownLeft),
            "left" => Ok(Direction::Left),
            "upleft" => Ok(Direction::UpLeft),
            _ => Err(LevelError::InvalidDirection(s.to_string())),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = LevelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        direction.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_intersection() {
        let a = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let b = Rectangle::new(50.0, 60.0, 100.0, 100.0);
        let overlap = a.intersection(&b).unwrap();
        assert_eq!(overlap, Rectangle::new(50.0, 60.0, 50.0, 40.0));

        // Shared edge is not an intersection
        let c = Rectangle::new(100.0, 0.0, 10.0, 10.0);
        assert!(a.intersection(&c).is_none());
    }

    #[test]
    fn test_negative_size_is_clamped() {
        let r = Rectangle::new(1.0, 2.0, -5.0, 3.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.height, 3.0);
    }

    #[test]
    fn test_borders() {
        let r = Rectangle::new(10.0, 20.0, 30.0, 40.0);
        assert!(r.top_border().same_segment(&Line::new(
            Point::new(40.0, 20.0),
            Point::new(10.0, 20.0)
        )));
        assert_eq!(r.right_border().start, Point::new(40.0, 20.0));
        assert_eq!(r.right_border().end, Point::new(40.0, 60.0));
        assert_eq!(r.bottom_border().start.y, 60.0);
        assert_eq!(r.borders().len(), 4);
    }

    #[test]
    fn test_line_intersection() {
        let a = Line::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let b = Line::new(Point::new(0.0, 10.0), Point::new(10.0, 0.0));
        let p = a.intersection(&b).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);

        // Endpoint touch counts
        let c = Line::new(Point::new(10.0, 10.0), Point::new(20.0, 0.0));
        assert_eq!(a.intersection(&c), Some(Point::new(10.0, 10.0)));

        // Parallel
        let d = Line::new(Point::new(0.0, 1.0), Point::new(10.0, 11.0));
        assert!(a.intersection(&d).is_none());

        // Out of range
        let e = Line::new(Point::new(20.0, 0.0), Point::new(30.0, -10.0));
        assert!(a.intersection(&e).is_none());
    }

    #[test]
    fn test_line_equality_ignores_orientation() {
        let a = Line::new(Point::new(1.0, 2.0), Point::new(3.0, 4.0));
        let b = Line::new(Point::new(3.0, 4.0), Point::new(1.0, 2.0));
        let c = Line::new(Point::new(1.0, 2.0), Point::new(3.0, 5.0));
        assert!(a.same_segment(&b));
        assert!(!a.same_segment(&c));
    }

    #[test]
    fn test_clamped_into() {
        let bounds = Rectangle::new(10.0, 10.0, 100.0, 100.0);
        let r = Rectangle::new(-50.0, 105.0, 20.0, 20.0).clamped_into(&bounds);
        assert_eq!(r, Rectangle::new(10.0, 90.0, 20.0, 20.0));
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("Down-Right".parse::<Direction>().unwrap(), Direction::DownRight);
        assert_eq!("up_left".parse::<Direction>().unwrap(), Direction::UpLeft);
        assert!(matches!(
            "sideways".parse::<Direction>(),
            Err(LevelError::InvalidDirection(_))
        ));
    }

    #[test]
    fn test_direction_angles_and_diagonals() {
        for dir in Direction::ALL {
            assert_eq!(dir.angle_degrees() % 90.0 != 0.0, dir.is_diagonal());
            let (sx, sy) = dir.unit_signs();
            assert_eq!(Direction::from_components(sx, sy), Some(dir));
            assert_eq!(dir.opposite().opposite(), dir);
        }
        assert_eq!(Direction::from_components(0.0, 0.0), None);
    }

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&Direction::DownLeft).unwrap();
        assert_eq!(json, "\"down_left\"");
        let back: Direction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Direction::DownLeft);
        assert!(serde_json::from_str::<Direction>("\"north\"").is_err());
    }
}
