//! Edge policies resolving moves that would leave the map.

use crate::element::Animal;
use ecosim_core::{BorderKind, EnergyConfig, RandomSource, Vector2D};

/// Inclusive rectangle of valid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBounds {
    pub lower_left: Vector2D,
    pub upper_right: Vector2D,
}

impl MapBounds {
    /// Bounds of a `width` x `height` map anchored at the origin.
    pub fn from_size(width: i32, height: i32) -> Self {
        Self {
            lower_left: Vector2D::new(0, 0),
            upper_right: Vector2D::new(width - 1, height - 1),
        }
    }

    pub fn contains(&self, position: &Vector2D) -> bool {
        position.follows(&self.lower_left) && position.precedes(&self.upper_right)
    }

    pub fn width(&self) -> i32 {
        self.upper_right.x - self.lower_left.x + 1
    }

    pub fn height(&self) -> i32 {
        self.upper_right.y - self.lower_left.y + 1
    }

    pub fn cell_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn positions(&self) -> impl Iterator<Item = Vector2D> + '_ {
        (self.lower_left.y..=self.upper_right.y).flat_map(move |y| {
            (self.lower_left.x..=self.upper_right.x).map(move |x| Vector2D::new(x, y))
        })
    }

    fn wrap_x(&self, x: i32) -> i32 {
        self.lower_left.x + (x - self.lower_left.x).rem_euclid(self.width())
    }

    fn wrap_y(&self, y: i32) -> i32 {
        self.lower_left.y + (y - self.lower_left.y).rem_euclid(self.height())
    }
}

/// Resolves a candidate position against the map edges.
///
/// Implementations must return a position inside `bounds` and keep no state
/// between calls. A candidate already inside the bounds comes back unchanged.
/// The animal is handed over mutably so a policy can turn it or charge it.
pub trait MapBorders {
    fn position_out_of_map(
        &self,
        animal: &mut Animal,
        candidate: Vector2D,
        bounds: &MapBounds,
        rng: &mut dyn RandomSource,
    ) -> Vector2D;

    fn kind(&self) -> BorderKind;
}

/// Build the policy selected in configuration.
pub fn for_kind(kind: BorderKind, energy: &EnergyConfig) -> Box<dyn MapBorders> {
    match kind {
        BorderKind::WrapAround => Box::new(WrapAround),
        BorderKind::Bounce => Box::new(Bounce),
        BorderKind::Globe => Box::new(Globe),
        BorderKind::HellPortal => Box::new(HellPortal::new(energy.portal_energy_cost)),
    }
}

/// Toroidal edges on both axes
#[derive(Debug, Clone, Copy, Default)]
pub struct WrapAround;

impl MapBorders for WrapAround {
    fn position_out_of_map(
        &self,
        _animal: &mut Animal,
        candidate: Vector2D,
        bounds: &MapBounds,
        _rng: &mut dyn RandomSource,
    ) -> Vector2D {
        Vector2D::new(bounds.wrap_x(candidate.x), bounds.wrap_y(candidate.y))
    }

    fn kind(&self) -> BorderKind {
        BorderKind::WrapAround
    }
}

/// Reflects the offending axis back inside and mirrors the facing
#[derive(Debug, Clone, Copy, Default)]
pub struct Bounce;

impl Bounce {
    /// Reflect `value` across whichever edge it crossed. Returns the value and
    /// whether a reflection happened.
    fn reflect(value: i32, low: i32, high: i32) -> (i32, bool) {
        let reflected = if value < low {
            low + (low - value)
        } else if value > high {
            high - (value - high)
        } else {
            return (value, false);
        };
        // One-cell-wide axes reflect onto the only cell
        (reflected.clamp(low, high), true)
    }
}

impl MapBorders for Bounce {
    fn position_out_of_map(
        &self,
        animal: &mut Animal,
        candidate: Vector2D,
        bounds: &MapBounds,
        _rng: &mut dyn RandomSource,
    ) -> Vector2D {
        let (x, flipped_x) = Self::reflect(candidate.x, bounds.lower_left.x, bounds.upper_right.x);
        let (y, flipped_y) = Self::reflect(candidate.y, bounds.lower_left.y, bounds.upper_right.y);
        if flipped_x {
            animal.rotation = animal.rotation.mirrored_x();
        }
        if flipped_y {
            animal.rotation = animal.rotation.mirrored_y();
        }
        Vector2D::new(x, y)
    }

    fn kind(&self) -> BorderKind {
        BorderKind::Bounce
    }
}

/// Horizontal wrap-around with impassable poles.
///
/// Walking off the top or bottom row leaves the animal where it was, facing
/// the opposite way.
#[derive(Debug, Clone, Copy, Default)]
pub struct Globe;

impl MapBorders for Globe {
    fn position_out_of_map(
        &self,
        animal: &mut Animal,
        candidate: Vector2D,
        bounds: &MapBounds,
        _rng: &mut dyn RandomSource,
    ) -> Vector2D {
        if candidate.y < bounds.lower_left.y || candidate.y > bounds.upper_right.y {
            animal.rotation = animal.rotation.reversed();
            return animal.position();
        }
        Vector2D::new(bounds.wrap_x(candidate.x), candidate.y)
    }

    fn kind(&self) -> BorderKind {
        BorderKind::Globe
    }
}

/// Sends an animal leaving the map to a random cell for an energy fee
#[derive(Debug, Clone, Copy)]
pub struct HellPortal {
    energy_cost: i32,
}

impl HellPortal {
    pub fn new(energy_cost: i32) -> Self {
        Self { energy_cost }
    }
}

impl MapBorders for HellPortal {
    fn position_out_of_map(
        &self,
        animal: &mut Animal,
        candidate: Vector2D,
        bounds: &MapBounds,
        rng: &mut dyn RandomSource,
    ) -> Vector2D {
        if bounds.contains(&candidate) {
            return candidate;
        }
        animal.lose_energy(self.energy_cost);
        Vector2D::new(
            rng.random_int(bounds.lower_left.x, bounds.upper_right.x + 1),
            rng.random_int(bounds.lower_left.y, bounds.upper_right.y + 1),
        )
    }

    fn kind(&self) -> BorderKind {
        BorderKind::HellPortal
    }
}
