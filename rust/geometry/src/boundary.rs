// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary geometry and mesh-size callbacks used by the drivers.

use nalgebra::{Point3, Unit, Vector3};

/// Identifier of a boundary surface, as stored on front entities.
pub type SurfaceId = usize;

/// Surface description queried by the surface mesher.
pub trait BoundaryGeometry: Send + Sync {
    /// Moves a point onto the surface.
    fn project_point(&self, surface: SurfaceId, point: &Point3<f64>) -> Point3<f64>;

    /// Unit surface normal at a point, `None` where it is undefined.
    fn normal(&self, surface: SurfaceId, point: &Point3<f64>) -> Option<Vector3<f64>>;

    /// Target element size near `point`.
    fn local_h(&self, _surface: SurfaceId, _point: &Point3<f64>, global_h: f64) -> f64 {
        global_h
    }
}

/// Mesh-size field queried by the volume mesher.
pub trait SizeField: Send + Sync {
    fn local_h(&self, point: &Point3<f64>, global_h: f64) -> f64;
}

/// A single plane, the same for every surface id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarBoundary {
    origin: Point3<f64>,
    normal: Unit<Vector3<f64>>,
}

impl PlanarBoundary {
    /// `None` for a zero normal.
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Option<Self> {
        Unit::try_new(normal, 1e-12).map(|normal| Self { origin, normal })
    }

    /// The `z = 0` plane with upward normal.
    pub fn xy() -> Self {
        Self {
            origin: Point3::origin(),
            normal: Vector3::z_axis(),
        }
    }
}

impl Default for PlanarBoundary {
    fn default() -> Self {
        Self::xy()
    }
}

impl BoundaryGeometry for PlanarBoundary {
    fn project_point(&self, _surface: SurfaceId, point: &Point3<f64>) -> Point3<f64> {
        let distance = (point - self.origin).dot(&self.normal);
        point - self.normal.into_inner() * distance
    }

    fn normal(&self, _surface: SurfaceId, _point: &Point3<f64>) -> Option<Vector3<f64>> {
        Some(self.normal.into_inner())
    }
}

/// Constant size: always the global `h`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UniformSize;

impl SizeField for UniformSize {
    fn local_h(&self, _point: &Point3<f64>, global_h: f64) -> f64 {
        global_h
    }
}

/// Size growing linearly with the distance from a source point, capped at
/// the global `h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradedSize {
    pub source: Point3<f64>,
    pub h_min: f64,
    /// Size increase per unit distance.
    pub grading: f64,
}

impl SizeField for GradedSize {
    fn local_h(&self, point: &Point3<f64>, global_h: f64) -> f64 {
        let h = self.h_min + self.grading * (point - self.source).norm();
        h.min(global_h)
    }
}
