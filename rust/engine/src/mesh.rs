// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output mesh: points and elements, append only.

use frontmesh_core::ElementPoints;
use frontmesh_geometry::{signed_area, signed_volume};
use nalgebra::{Point, Point2, Point3};
use serde::Serialize;
use smallvec::SmallVec;

/// Smallest signed area or volume, in canonical units, of an accepted element.
const MIN_MEASURE: f64 = 1e-10;

/// Element shapes produced by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Triangle,
    Quad,
    Tetrahedron,
    Pyramid,
    Prism,
}

impl ElementKind {
    /// Shape of an element with `len` points in `dimension`.
    pub fn from_len(dimension: usize, len: usize) -> Option<Self> {
        match (dimension, len) {
            (2, 3) => Some(ElementKind::Triangle),
            (2, 4) => Some(ElementKind::Quad),
            (3, 4) => Some(ElementKind::Tetrahedron),
            (3, 5) => Some(ElementKind::Pyramid),
            (3, 6) => Some(ElementKind::Prism),
            _ => None,
        }
    }

    pub fn point_count(self) -> usize {
        match self {
            ElementKind::Triangle => 3,
            ElementKind::Quad | ElementKind::Tetrahedron => 4,
            ElementKind::Pyramid => 5,
            ElementKind::Prism => 6,
        }
    }

    /// Checks that an element has positive measure: counter-clockwise
    /// triangles and quads, positively oriented solids.
    ///
    /// Quads are tested as two triangles. Pyramids (quad base, apex last)
    /// as the four tetrahedra of both base diagonals. Prisms (bottom
    /// triangle, then the matching top triangle) by every top point above
    /// the bottom and every bottom point below the top.
    pub fn is_positive<const D: usize>(self, points: &[Point<f64, D>]) -> bool {
        if points.len() != self.point_count() {
            return false;
        }
        match D {
            2 => {
                let p: SmallVec<[Point2<f64>; 4]> = points.iter().map(|p| Point2::new(p[0], p[1])).collect();
                let area = |a: usize, b: usize, c: usize| signed_area(&p[a], &p[b], &p[c]) > MIN_MEASURE;
                match self {
                    ElementKind::Triangle => area(0, 1, 2),
                    ElementKind::Quad => area(0, 1, 2) && area(0, 2, 3) && area(1, 2, 3) && area(0, 1, 3),
                    _ => false,
                }
            }
            3 => {
                let p: SmallVec<[Point3<f64>; 6]> = points.iter().map(|p| Point3::new(p[0], p[1], p[2])).collect();
                let vol = |a: usize, b: usize, c: usize, d: usize| {
                    signed_volume(&p[a], &p[b], &p[c], &p[d]) > MIN_MEASURE
                };
                match self {
                    ElementKind::Tetrahedron => vol(0, 1, 2, 3),
                    ElementKind::Pyramid => {
                        vol(0, 1, 2, 4) && vol(0, 2, 3, 4) && vol(0, 1, 3, 4) && vol(1, 2, 3, 4)
                    }
                    ElementKind::Prism => {
                        (3..6).all(|top| vol(0, 1, 2, top)) && (0..3).all(|bottom| vol(3, 5, 4, bottom))
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// A mesh element referencing global point indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub points: ElementPoints,
}

/// Generated points and elements.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    points: Vec<Point3<f64>>,
    elements: Vec<Element>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a point and returns its global index.
    pub fn add_point(&mut self, point: Point3<f64>) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    pub fn add_element(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of elements of one kind.
    pub fn count(&self, kind: ElementKind) -> usize {
        self.elements.iter().filter(|e| e.kind == kind).count()
    }

    /// Sum of element areas (surface meshes, triangles and quads).
    pub fn surface_area(&self) -> f64 {
        self.elements
            .iter()
            .map(|e| {
                let p = |i: usize| self.points[e.points[i]];
                let tri = |a: Point3<f64>, b: Point3<f64>, c: Point3<f64>| 0.5 * (b - a).cross(&(c - a)).norm();
                match e.kind {
                    ElementKind::Triangle => tri(p(0), p(1), p(2)),
                    ElementKind::Quad => tri(p(0), p(1), p(2)) + tri(p(0), p(2), p(3)),
                    _ => 0.0,
                }
            })
            .sum()
    }

    /// Sum of tetrahedron volumes.
    pub fn volume(&self) -> f64 {
        self.elements
            .iter()
            .filter(|e| e.kind == ElementKind::Tetrahedron)
            .map(|e| {
                let p = |i: usize| &self.points[e.points[i]];
                signed_volume(p(0), p(1), p(2), p(3))
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use smallvec::smallvec;

    #[test]
    fn kinds_from_point_count() {
        assert_eq!(ElementKind::from_len(2, 3), Some(ElementKind::Triangle));
        assert_eq!(ElementKind::from_len(3, 6), Some(ElementKind::Prism));
        assert_eq!(ElementKind::from_len(2, 5), None);
        assert_eq!(ElementKind::Pyramid.point_count(), 5);
    }

    #[test]
    fn triangle_orientation() {
        let ccw = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        let cw = [ccw[0], ccw[2], ccw[1]];
        assert!(ElementKind::Triangle.is_positive(&ccw));
        assert!(!ElementKind::Triangle.is_positive(&cw));
        assert!(!ElementKind::Quad.is_positive(&ccw));
    }

    #[test]
    fn solid_orientation() {
        let tet = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        assert!(ElementKind::Tetrahedron.is_positive(&tet));
        assert!(!ElementKind::Tetrahedron.is_positive(&[tet[1], tet[0], tet[2], tet[3]]));

        let prism = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        assert!(ElementKind::Prism.is_positive(&prism));

        let pyramid = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        assert!(ElementKind::Pyramid.is_positive(&pyramid));
    }

    #[test]
    fn mesh_measures() {
        let mut mesh = Mesh::new();
        for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]] {
            mesh.add_point(Point3::from(p));
        }
        mesh.add_element(Element {
            kind: ElementKind::Triangle,
            points: smallvec![0, 1, 2],
        });
        mesh.add_element(Element {
            kind: ElementKind::Triangle,
            points: smallvec![0, 2, 3],
        });
        assert_relative_eq!(mesh.surface_area(), 1.0);
        assert_eq!(mesh.count(ElementKind::Triangle), 2);
        assert_eq!(mesh.count(ElementKind::Quad), 0);
        assert_eq!(mesh.volume(), 0.0);
    }
}
