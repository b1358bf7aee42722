//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use uuid::Uuid;

/// Number of discrete directions an animal can face.
pub const DIRECTION_COUNT: u8 = 8;

/// Unique identifier for an element placed on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer 2D coordinate of a map cell.
///
/// `follows` and `precedes` compare both components and are used for bounds
/// checks. They are not a total order: `(0, 5)` neither follows nor precedes
/// `(5, 0)`. The derived `Ord` is lexicographic on `(x, y)` and only exists so
/// positions can key an ordered map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Vector2D {
    pub x: i32,
    pub y: i32,
}

impl Vector2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Both components are greater than or equal to `other`'s.
    pub fn follows(&self, other: &Vector2D) -> bool {
        self.x >= other.x && self.y >= other.y
    }

    /// Both components are less than or equal to `other`'s.
    pub fn precedes(&self, other: &Vector2D) -> bool {
        self.x <= other.x && self.y <= other.y
    }

    pub fn opposite(&self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Add for Vector2D {
    type Output = Vector2D;

    fn add(self, other: Vector2D) -> Vector2D {
        Vector2D::new(self.x + other.x, self.y + other.y)
    }
}

impl fmt::Display for Vector2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing of an animal, stored as an index into eight compass directions.
///
/// Index 0 is north and indices increase clockwise, so `Rotation(2)` faces
/// east and `Rotation(4)` faces south. The index is always reduced modulo
/// [`DIRECTION_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rotation(u8);

impl Rotation {
    pub const NORTH: Rotation = Rotation(0);
    pub const EAST: Rotation = Rotation(2);
    pub const SOUTH: Rotation = Rotation(4);
    pub const WEST: Rotation = Rotation(6);

    pub fn new(index: u32) -> Self {
        Self((index % DIRECTION_COUNT as u32) as u8)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    /// Turn clockwise by `steps` eighths of a full turn.
    pub fn turned(&self, steps: u32) -> Self {
        Self::new(self.0 as u32 + steps % DIRECTION_COUNT as u32)
    }

    /// Turn around by half a circle.
    pub fn reversed(&self) -> Self {
        self.turned(DIRECTION_COUNT as u32 / 2)
    }

    /// Mirror the facing across the vertical axis (the x component flips).
    pub fn mirrored_x(&self) -> Self {
        Self::new(DIRECTION_COUNT as u32 - self.0 as u32)
    }

    /// Mirror the facing across the horizontal axis (the y component flips).
    pub fn mirrored_y(&self) -> Self {
        Self::new(DIRECTION_COUNT as u32 + DIRECTION_COUNT as u32 / 2 - self.0 as u32)
    }

    /// Unit vector of one step in this direction.
    pub fn to_unit_vector(&self) -> Vector2D {
        let (dx, dy) = match self.0 {
            0 => (0, 1),
            1 => (1, 1),
            2 => (1, 0),
            3 => (1, -1),
            4 => (0, -1),
            5 => (-1, -1),
            6 => (-1, 0),
            _ => (-1, 1),
        };
        Vector2D::new(dx, dy)
    }

    pub fn all() -> impl Iterator<Item = Rotation> {
        (0..DIRECTION_COUNT).map(Rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follows_and_precedes() {
        let a = Vector2D::new(2, 3);
        assert!(a.follows(&Vector2D::new(0, 0)));
        assert!(a.follows(&a));
        assert!(a.precedes(&Vector2D::new(2, 3)));
        assert!(a.precedes(&Vector2D::new(10, 10)));

        // Not a total order
        let b = Vector2D::new(0, 5);
        let c = Vector2D::new(5, 0);
        assert!(!b.follows(&c));
        assert!(!b.precedes(&c));
    }

    #[test]
    fn test_vector_add() {
        let pos = Vector2D::new(4, 4) + Vector2D::new(-1, 1);
        assert_eq!(pos, Vector2D::new(3, 5));
        assert_eq!(Vector2D::new(3, -2).opposite(), Vector2D::new(-3, 2));
    }

    #[test]
    fn test_rotation_is_modular() {
        assert_eq!(Rotation::new(9).index(), 1);
        assert_eq!(Rotation::new(7).turned(3).index(), 2);
        assert_eq!(Rotation::NORTH.reversed(), Rotation::SOUTH);
        assert_eq!(Rotation::EAST.reversed(), Rotation::WEST);
    }

    #[test]
    fn test_unit_vectors() {
        assert_eq!(Rotation::NORTH.to_unit_vector(), Vector2D::new(0, 1));
        assert_eq!(Rotation::EAST.to_unit_vector(), Vector2D::new(1, 0));
        assert_eq!(Rotation::SOUTH.to_unit_vector(), Vector2D::new(0, -1));
        assert_eq!(Rotation::WEST.to_unit_vector(), Vector2D::new(-1, 0));

        for rotation in Rotation::all() {
            let v = rotation.to_unit_vector();
            assert_eq!(rotation.reversed().to_unit_vector(), v.opposite());
        }
    }

    #[test]
    fn test_mirroring_flips_one_component() {
        for rotation in Rotation::all() {
            let v = rotation.to_unit_vector();
            assert_eq!(rotation.mirrored_x().to_unit_vector(), Vector2D::new(-v.x, v.y));
            assert_eq!(rotation.mirrored_y().to_unit_vector(), Vector2D::new(v.x, -v.y));
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_rotation_stays_in_range(start in 0u32..1000, turns in proptest::collection::vec(0u32..64, 0..50)) {
            let mut rotation = Rotation::new(start);
            for steps in turns {
                rotation = rotation.turned(steps);
                proptest::prop_assert!(rotation.index() < DIRECTION_COUNT);
            }
        }
    }
}
