//! Detection plane definition.

use crate::hit::Point3;
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Normals whose length falls inside this band are used as given.
const UNIT_TOLERANCE: (f64, f64) = (0.99, 1.01);

/// An infinite plane given by a point on it and a (near-)unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane {
    vertex: Point3,
    normal: Point3,
}

impl Plane {
    /// Creates a plane, renormalizing the normal if its length is outside
    /// `[0.99, 1.01]`.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateNormal`] if the normal is zero or not finite.
    pub fn new(vertex: Point3, normal: Point3) -> Result<Self> {
        let length = normal.norm();
        if !normal.is_finite() || length == 0.0 {
            return Err(Error::DegenerateNormal(normal.x, normal.y, normal.z));
        }
        let normal = if (UNIT_TOLERANCE.0..=UNIT_TOLERANCE.1).contains(&length) {
            normal
        } else {
            normal.scale(1.0 / length)
        };
        Ok(Self { vertex, normal })
    }

    /// Builds an optional plane from separately supplied vertex and normal.
    ///
    /// # Errors
    /// Returns [`Error::PartialPlane`] if exactly one of the two is given,
    /// or [`Error::DegenerateNormal`] for an unusable normal.
    pub fn from_parts(vertex: Option<[f64; 3]>, normal: Option<[f64; 3]>) -> Result<Option<Self>> {
        match (vertex, normal) {
            (None, None) => Ok(None),
            (Some(vertex), Some(normal)) => Self::new(vertex.into(), normal.into()).map(Some),
            _ => Err(Error::PartialPlane),
        }
    }

    /// A point on the plane.
    #[must_use]
    pub fn vertex(&self) -> Point3 {
        self.vertex
    }

    /// The normal used for distance computations.
    #[must_use]
    pub fn normal(&self) -> Point3 {
        self.normal
    }

    /// Signed distance along the normal from `point` to the plane.
    #[inline]
    #[must_use]
    pub fn offset_from(&self, point: &Point3) -> f64 {
        self.normal.dot(&(self.vertex - *point))
    }
}
