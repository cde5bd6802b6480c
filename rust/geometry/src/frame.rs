// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local frames that map world coordinates into the canonical rule space.
//!
//! Rules are written for a base entity of unit size at the origin. A frame
//! places the base entity of the front there: the base line runs from
//! `(0, 0)` to `(1, 0)`, the base face spans `(0,0,0)`, `(1,0,0)` and a
//! third point in the `z = 0` plane. Coordinates are divided by the local
//! mesh size `h`.

use nalgebra::{Matrix3, Point2, Point3, Vector3};

use crate::error::{Error, Result};

const MIN_LENGTH: f64 = 1e-12;

/// Plane frame of a surface front line.
///
/// `x` runs along the line, `z` is the surface normal and `y = z × x` points
/// into the unmeshed side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    origin: Point3<f64>,
    ex: Vector3<f64>,
    ey: Vector3<f64>,
    ez: Vector3<f64>,
    h: f64,
}

impl PlaneFrame {
    /// Builds the frame from the base line `p1 -> p2` and the surface normal
    /// at `p1`. The line direction is projected into the tangent plane, so
    /// the frame stays orthonormal on curved surfaces.
    pub fn new(p1: &Point3<f64>, p2: &Point3<f64>, normal: &Vector3<f64>, h: f64) -> Result<Self> {
        if !(h > 0.0) {
            return Err(Error::DegenerateFrame(format!("mesh size {} is not positive", h)));
        }
        let n_len = normal.norm();
        if n_len < MIN_LENGTH {
            return Err(Error::DegenerateFrame("zero surface normal".into()));
        }
        let ez = normal / n_len;

        let d = p2 - p1;
        let tangent = d - ez * d.dot(&ez);
        let t_len = tangent.norm();
        if t_len < MIN_LENGTH {
            return Err(Error::DegenerateFrame(
                "base line is parallel to the normal or has zero length".into(),
            ));
        }
        let ex = tangent / t_len;
        let ey = ez.cross(&ex);

        Ok(Self {
            origin: *p1,
            ex,
            ey,
            ez,
            h,
        })
    }

    /// World point to scaled plane coordinates.
    #[inline]
    pub fn to_plane(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.ex) / self.h, d.dot(&self.ey) / self.h)
    }

    /// Scaled plane coordinates back to a world point in the tangent plane.
    #[inline]
    pub fn to_space(&self, q: &Point2<f64>) -> Point3<f64> {
        self.origin + (self.ex * q.x + self.ey * q.y) * self.h
    }

    /// Signed distance off the tangent plane, in units of `h`.
    pub fn height(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.ez) / self.h
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.ez
    }

    pub fn h(&self) -> f64 {
        self.h
    }
}

/// Frame of a volume front face.
///
/// `x` runs along the first edge, `z` is the face normal (pointing into the
/// unmeshed domain) and `y = z × x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidFrame {
    origin: Point3<f64>,
    /// Rows are the frame axes.
    axes: Matrix3<f64>,
    h: f64,
}

impl SolidFrame {
    pub fn new(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>, h: f64) -> Result<Self> {
        if !(h > 0.0) {
            return Err(Error::DegenerateFrame(format!("mesh size {} is not positive", h)));
        }
        let e1 = p2 - p1;
        let e1_len = e1.norm();
        if e1_len < MIN_LENGTH {
            return Err(Error::DegenerateFrame("base edge has zero length".into()));
        }
        let n = e1.cross(&(p3 - p1));
        let n_len = n.norm();
        if n_len < MIN_LENGTH * e1_len {
            return Err(Error::DegenerateFrame("base face is flat".into()));
        }

        let ex = e1 / e1_len;
        let ez = n / n_len;
        let ey = ez.cross(&ex);
        let axes = Matrix3::from_rows(&[ex.transpose(), ey.transpose(), ez.transpose()]);

        Ok(Self {
            origin: *p1,
            axes,
            h,
        })
    }

    #[inline]
    pub fn to_local(&self, p: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.axes * (p - self.origin) / self.h)
    }

    /// Local coordinates back to world. The axes are orthonormal, so the
    /// inverse rotation is the transpose.
    #[inline]
    pub fn to_world(&self, q: &Point3<f64>) -> Point3<f64> {
        self.origin + self.axes.transpose() * q.coords * self.h
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.axes.row(2).transpose()
    }

    pub fn h(&self) -> f64 {
        self.h
    }
}
