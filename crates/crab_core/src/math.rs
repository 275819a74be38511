//! Fixed-point math utilities for deterministic simulation.
//!
//! Positions, distances, timers and work accumulators all use fixed-point
//! arithmetic so two runs of the same match make identical decisions.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// 32 integer bits and 32 fractional bits.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world units.
    #[must_use]
    pub fn from_units(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Vector length.
    ///
    /// Long vectors are normalised by their largest component first so the
    /// squared length stays inside the fixed-point range.
    #[must_use]
    pub fn length(self) -> Fixed {
        let largest = self.x.saturating_abs().max(self.y.saturating_abs());
        if largest <= DIRECT_LENGTH_LIMIT {
            return fixed_sqrt(self.dot(self));
        }
        let unit = Self::new(self.x / largest, self.y / largest);
        fixed_sqrt(unit.dot(unit)).saturating_mul(largest)
    }

    /// Scale both components.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x.saturating_mul(factor), self.y.saturating_mul(factor))
    }

    /// Step from `self` toward `target` by at most `max_step`.
    ///
    /// Lands exactly on `target` when it is closer than `max_step`.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: Fixed) -> Self {
        let delta = target - self;
        let len = delta.length();
        if len <= max_step || len == Fixed::ZERO {
            return target;
        }
        self + delta.scale(max_step / len)
    }
}

/// Largest component whose square still fits comfortably in [`Fixed`].
const DIRECT_LENGTH_LIMIT: Fixed = Fixed::from_bits(16_384_i64 << 32);

/// Square of a distance, used to compare against squared distances.
#[must_use]
pub fn squared(value: Fixed) -> Fixed {
    value.saturating_mul(value)
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..48 {
        let mid = low + (high - low) / 2;
        if mid.saturating_mul(mid) <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        let a = Vec2Fixed::from_units(3, 0);
        let b = Vec2Fixed::from_units(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_length() {
        let v = Vec2Fixed::from_units(3, 4);
        let epsilon = Fixed::ONE / Fixed::from_num(10000);
        assert!((v.length() - Fixed::from_num(5)).abs() < epsilon);
    }

    #[test]
    fn test_move_towards_clamps_to_target() {
        let start = Vec2Fixed::ZERO;
        let target = Vec2Fixed::from_units(1, 0);
        assert_eq!(start.move_towards(target, Fixed::from_num(5)), target);
    }

    #[test]
    fn test_move_towards_partial_step() {
        let start = Vec2Fixed::ZERO;
        let target = Vec2Fixed::from_units(10, 0);
        let next = start.move_towards(target, Fixed::from_num(2));
        let epsilon = Fixed::ONE / Fixed::from_num(1000);
        assert!((next.x - Fixed::from_num(2)).abs() < epsilon);
        assert_eq!(next.y, Fixed::ZERO);
    }

    #[test]
    fn test_length_of_distant_vectors() {
        let epsilon = Fixed::ONE / Fixed::from_num(100);
        let far = Vec2Fixed::from_units(50_000, 0);
        assert!((far.length() - Fixed::from_num(50_000)).abs() < epsilon);
        let diagonal = Vec2Fixed::from_units(-30_000, 40_000);
        assert!((diagonal.length() - Fixed::from_num(50_000)).abs() < epsilon);
    }

    #[test]
    fn test_move_towards_distant_target() {
        let target = Vec2Fixed::from_units(50_000, 0);
        let next = Vec2Fixed::ZERO.move_towards(target, Fixed::from_num(2));
        let epsilon = Fixed::ONE / Fixed::from_num(1000);
        assert!((next.x - Fixed::from_num(2)).abs() < epsilon);
        assert_eq!(next.y, Fixed::ZERO);
    }

    #[test]
    fn test_extreme_coordinates_saturate() {
        let low = Vec2Fixed::new(Fixed::MIN, Fixed::MIN);
        let high = Vec2Fixed::new(Fixed::MAX, Fixed::MAX);
        assert_eq!(low.distance_squared(high), Fixed::MAX);
        assert!(low.move_towards(high, Fixed::ONE).x > Fixed::MIN);
    }
}
