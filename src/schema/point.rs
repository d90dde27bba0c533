//! Discretized polar coordinates.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::RouteError;

/// Polar coordinate whose angle is one of `positions` equally spaced rays.
///
/// Serialized through [`PointRecord`], so a malformed record is rejected with
/// [`RouteError::InvalidEncoding`] instead of producing an invalid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRecord", into = "PointRecord")]
pub struct DiscretePoint {
    position: usize,
    positions: usize,
    distance: f64,
}

impl DiscretePoint {
    /// Create a point on ray `position` out of `positions`.
    pub fn new(position: usize, positions: usize, distance: f64) -> Result<Self, RouteError> {
        if positions == 0 || position >= positions {
            return Err(RouteError::position_out_of_range(position, positions));
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(RouteError::invalid_distance(distance));
        }
        Ok(Self {
            position,
            positions,
            distance,
        })
    }

    /// The origin, expressed on ray 0.
    pub fn origin(positions: usize) -> Result<Self, RouteError> {
        Self::new(0, positions, 0.0)
    }

    /// The origin, using this point's slot count.
    pub fn origin_like(&self) -> Self {
        Self {
            position: 0,
            positions: self.positions,
            distance: 0.0,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn positions(&self) -> usize {
        self.positions
    }

    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Radian angle of the ray, in `[0, 2π)`.
    #[inline]
    pub fn angle(&self) -> f64 {
        TAU * self.position as f64 / self.positions as f64
    }

    /// Project to a cartesian `(x, y)` coordinate.
    pub fn to_cartesian(&self) -> (f64, f64) {
        let angle = self.angle();
        (self.distance * angle.cos(), self.distance * angle.sin())
    }

    /// Euclidean distance between the cartesian projections.
    pub fn distance_to(&self, other: &DiscretePoint) -> f64 {
        let (ax, ay) = self.to_cartesian();
        let (bx, by) = other.to_cartesian();
        (ax - bx).hypot(ay - by)
    }

    /// Whether both points lie on the same ray.
    ///
    /// Compares angles rather than indices so points built with different slot
    /// counts (e.g. 4 and 8) still agree on shared rays.
    pub fn same_ray(&self, other: &DiscretePoint) -> bool {
        self.position * other.positions == other.position * self.positions
    }

    /// Copy of this point with a different distance.
    pub fn with_distance(&self, distance: f64) -> Result<Self, RouteError> {
        Self::new(self.position, self.positions, distance)
    }

    /// Copy of this point on a different ray.
    pub fn with_position(&self, position: usize) -> Result<Self, RouteError> {
        Self::new(position, self.positions, self.distance)
    }

    /// Exchange distances with `other`; positions stay put.
    pub fn swap_distance(&mut self, other: &mut DiscretePoint) -> Result<(), RouteError> {
        self.check_compatible(other)?;
        std::mem::swap(&mut self.distance, &mut other.distance);
        Ok(())
    }

    /// Exchange position indices with `other`; distances stay put.
    pub fn swap_positions(&mut self, other: &mut DiscretePoint) -> Result<(), RouteError> {
        self.check_compatible(other)?;
        std::mem::swap(&mut self.position, &mut other.position);
        Ok(())
    }

    fn check_compatible(&self, other: &DiscretePoint) -> Result<(), RouteError> {
        if self.positions != other.positions {
            return Err(RouteError::slot_mismatch(self.positions, other.positions));
        }
        Ok(())
    }
}

impl std::fmt::Display for DiscretePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DiscretePoint({}/{}, {})",
            self.position, self.positions, self.distance
        )
    }
}

/// Plain property bag for persisting a [`DiscretePoint`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub position_index: usize,
    pub total_positions: usize,
    pub distance: f64,
}

impl From<DiscretePoint> for PointRecord {
    fn from(point: DiscretePoint) -> Self {
        Self {
            position_index: point.position,
            total_positions: point.positions,
            distance: point.distance,
        }
    }
}

impl TryFrom<PointRecord> for DiscretePoint {
    type Error = RouteError;

    fn try_from(record: PointRecord) -> Result<Self, Self::Error> {
        DiscretePoint::new(record.position_index, record.total_positions, record.distance)
    }
}
