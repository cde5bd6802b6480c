// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Front faces for volume meshing.

use frontmesh_geometry::centroid;

use crate::error::{Error, Result};
use crate::front::{EntityKind, Front, FrontEntity};

/// Marker for a front of triangles and quads whose right-hand normal points
/// into the unmeshed volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face;

/// Front of faces.
pub type FaceFront = Front<Face>;

impl EntityKind for Face {
    const NAME: &'static str = "face";

    fn arity_ok(n: usize) -> bool {
        n == 3 || n == 4
    }

    /// Prefers faces close to the starting boundary so the front advances
    /// in layers.
    fn score(front: &Front<Self>, entity: &FrontEntity) -> f64 {
        entity.class as f64 + 2.0 * front.min_front_nr(entity) as f64
    }

    /// Faces whose centroid lies within `radius` of the base centroid. A
    /// face larger than the neighbourhood also counts when its bounding
    /// sphere reaches that far.
    fn is_relevant(front: &Front<Self>, base: &FrontEntity, other: &FrontEntity, radius: f64) -> bool {
        let base = centroid(&front.entity_positions(base));
        let corners = front.entity_positions(other);
        let (Some(b), Some(o)) = (base, centroid(&corners)) else {
            return false;
        };
        let reach = corners.iter().map(|p| (p - o).norm()).fold(0.0_f64, f64::max);
        (o - b).norm() <= radius + reach
    }
}

impl Front<Face> {
    /// Checks that no point is used by exactly one or two faces. A closed
    /// front surface has at least three faces around every point.
    pub fn check_connectivity(&self) -> Result<()> {
        match self
            .points()
            .find(|(_, p)| p.connectivity == 1 || p.connectivity == 2)
        {
            Some((point, p)) => Err(Error::ConnectivityLeak {
                point,
                faces: p.connectivity,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{EntityId, PointId};
    use nalgebra::Point3;

    fn tetrahedron() -> (FaceFront, Vec<PointId>, Vec<EntityId>) {
        let mut front = FaceFront::new();
        let h = (2.0_f64 / 3.0).sqrt();
        let s = 3.0_f64.sqrt();
        let p: Vec<PointId> = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, s / 2.0, 0.0),
            Point3::new(0.5, s / 6.0, h),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, x)| front.add_point(x, i))
        .collect();
        let faces = [[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]]
            .iter()
            .map(|f| {
                front
                    .add_entity(&[p[f[0]], p[f[1]], p[f[2]]], 0)
                    .unwrap()
                    .unwrap()
            })
            .collect();
        (front, p, faces)
    }

    #[test]
    fn closed_surface_passes_connectivity_check() {
        let (front, points, _) = tetrahedron();
        assert!(front.check_connectivity().is_ok());
        assert!(points.iter().all(|&p| front.point(p).unwrap().connectivity == 3));
    }

    #[test]
    fn open_surface_is_a_leak() {
        let (mut front, _, faces) = tetrahedron();
        front.delete_entity(faces[0]).unwrap();
        assert!(matches!(
            front.check_connectivity(),
            Err(Error::ConnectivityLeak { faces: 2, .. })
        ));
    }

    #[test]
    fn rotated_reverse_face_cancels() {
        let (mut front, p, faces) = tetrahedron();
        // (0, 1, 2) reversed and rotated
        assert_eq!(front.add_entity(&[p[1], p[0], p[2]], 0).unwrap(), None);
        assert!(front.entity(faces[0]).is_none());
        // same orientation, rotated
        assert!(matches!(
            front.add_entity(&[p[3], p[1], p[0]], 0),
            Err(Error::DuplicateEntity(_))
        ));
    }

    #[test]
    fn selection_prefers_start_front() {
        let (mut front, p, faces) = tetrahedron();
        front.set_start_front();
        let apex = front.add_point(Point3::new(0.5, 0.3, 2.0), 4);
        // a face touching the new point still has front number 0 at its base
        front.add_entity(&[p[0], p[1], apex], 0).unwrap();
        assert_eq!(front.point(apex).unwrap().front_nr, 1);
        assert_eq!(front.select(), Some(faces[0]));

        front.increment_class(faces[0]).unwrap();
        assert_eq!(front.select(), Some(faces[1]));
        let locals = front.get_locals(10.0).unwrap();
        assert_eq!(locals.base, faces[1]);
        assert_eq!(locals.entities.len(), 5);
        assert_eq!(locals.base_len(), 3);
    }

    #[test]
    fn large_faces_reach_into_the_neighbourhood() {
        let mut front = FaceFront::new();
        let small: Vec<PointId> = [(0.0, 0.0, 0.0), (0.1, 0.0, 0.0), (0.0, 0.1, 0.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| front.add_point(Point3::new(x, y, z), i))
            .collect();
        // a wall whose centroid is far away but which passes next to the base
        let wall: Vec<PointId> = [(0.2, 0.0, -1.0), (0.2, 30.0, -1.0), (0.2, 0.0, 29.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| front.add_point(Point3::new(x, y, z), 3 + i))
            .collect();
        // a face of the same size as the base, equally far away
        let distant: Vec<PointId> = [(8.0, 8.0, 8.0), (8.1, 8.0, 8.0), (8.0, 8.1, 8.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| front.add_point(Point3::new(x, y, z), 6 + i))
            .collect();
        let base = front.add_entity(&small, 0).unwrap().unwrap();
        let far = front.add_entity(&wall, 0).unwrap().unwrap();
        front.add_entity(&distant, 0).unwrap();

        let locals = front.locals_of(base, 0.5).unwrap();
        assert_eq!(locals.entity_ids, vec![base, far]);
        assert_eq!(locals.points.len(), 6);
    }

    #[test]
    fn quads_are_faces() {
        let mut front = FaceFront::new();
        let p: Vec<_> = (0..4)
            .map(|i| front.add_point(Point3::new(i as f64, (i % 2) as f64, 0.0), i))
            .collect();
        assert!(front.add_entity(&p, 0).unwrap().is_some());
        assert!(front.add_entity(&p[..2], 0).is_err());
    }
}
