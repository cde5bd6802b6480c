// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point and vector primitives shared by the fronts and the rule matcher.

use nalgebra::{Point, Point2, Point3, SVector, Vector3};

/// Axis-aligned bounding box in `D` dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<const D: usize> {
    pub min: Point<f64, D>,
    pub max: Point<f64, D>,
}

impl<const D: usize> Aabb<D> {
    /// Smallest box containing all points, `None` for an empty input.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<f64, D>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut min = first;
        let mut max = first;
        for p in iter {
            for i in 0..D {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        Some(Self { min, max })
    }

    /// Grows the box by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        let shift = SVector::<f64, D>::repeat(margin);
        Self {
            min: self.min - shift,
            max: self.max + shift,
        }
    }

    /// Returns `true` if the boxes overlap (touching counts).
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    pub fn contains(&self, p: &Point<f64, D>) -> bool {
        (0..D).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

/// Signed area of a 2D triangle, positive for counter-clockwise order.
#[inline]
pub fn signed_area(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    0.5 * (b - a).perp(&(c - a))
}

/// Signed volume of a tetrahedron, positive when `d` lies on the side of
/// triangle `(a, b, c)` its right-hand normal points to.
#[inline]
pub fn signed_volume(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>, d: &Point3<f64>) -> f64 {
    (b - a).cross(&(c - a)).dot(&(d - a)) / 6.0
}

/// Unit right-hand normal of a triangle, `None` if degenerate.
pub fn triangle_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Vector3<f64>> {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len < 1e-15 {
        return None; // degenerate triangle
    }
    Some(n / len)
}

/// Euclidean distance from `p` to the segment `[a, b]`.
pub fn distance_to_segment<const D: usize>(
    p: &Point<f64, D>,
    a: &Point<f64, D>,
    b: &Point<f64, D>,
) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-30 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Average of the given points.
pub fn centroid<const D: usize>(points: &[Point<f64, D>]) -> Option<Point<f64, D>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(SVector::<f64, D>::zeros(), |acc, p| acc + p.coords);
    Some(Point::from(sum / points.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aabb_overlap() {
        let a = Aabb::from_points(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]).unwrap();
        let b = Aabb::from_points(&[Point2::new(0.5, 0.5), Point2::new(2.0, 3.0)]).unwrap();
        let c = Aabb::from_points(&[Point2::new(1.5, 1.5), Point2::new(2.0, 2.0)]).unwrap();
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.expanded(0.6).intersects(&c));
        assert!(a.contains(&Point2::new(1.0, 0.0)));
    }

    #[test]
    fn empty_aabb() {
        let none: [Point3<f64>; 0] = [];
        assert!(Aabb::from_points(&none).is_none());
    }

    #[test]
    fn orientation_signs() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert_relative_eq!(signed_area(&a, &b, &c), 0.5);
        assert_relative_eq!(signed_area(&a, &c, &b), -0.5);

        let o = Point3::origin();
        let x = Point3::new(1.0, 0.0, 0.0);
        let y = Point3::new(0.0, 1.0, 0.0);
        let z = Point3::new(0.0, 0.0, 1.0);
        assert_relative_eq!(signed_volume(&o, &x, &y, &z), 1.0 / 6.0);
        assert!(signed_volume(&o, &y, &x, &z) < 0.0);
    }

    #[test]
    fn segment_distance() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(1.0, 1.0), &a, &b), 1.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(3.0, 0.0), &a, &b), 1.0);
        assert_relative_eq!(distance_to_segment(&Point2::new(-1.0, 0.0), &a, &a), 1.0);
    }

    #[test]
    fn degenerate_normal() {
        let p = Point3::new(1.0, 2.0, 3.0);
        assert!(triangle_normal(&p, &p, &Point3::origin()).is_none());
        let n = triangle_normal(
            &Point3::origin(),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(n, Vector3::z());
    }
}
