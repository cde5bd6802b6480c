// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Volume meshing: a closed face front is filled with tetrahedra (and
//! whatever other solids the rules produce).

use frontmesh_geometry::{centroid, SizeField, SolidFrame, SurfaceId};
use frontmesh_topology::{FaceFront, PointId};
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::MeshingConfig;
use crate::driver::{advance, Accepted};
use crate::error::{Error, Result};
use crate::library::VolumeRules;
use crate::matcher::{Candidate, MatchInput, RuleMatcher};
use crate::mesh::Mesh;
use crate::stats::MeshingStats;

/// Fills volumes bounded by closed triangle and quad surfaces.
#[derive(Debug, Clone)]
pub struct VolumeMesher<'a> {
    library: &'a VolumeRules,
    config: MeshingConfig,
    front: FaceFront,
    mesh: Mesh,
    seeded: FxHashMap<usize, PointId>,
}

impl<'a> VolumeMesher<'a> {
    pub fn new(library: &'a VolumeRules, config: MeshingConfig) -> Self {
        Self {
            library,
            config,
            front: FaceFront::new(),
            mesh: Mesh::new(),
            seeded: FxHashMap::default(),
        }
    }

    /// Adds a boundary point and returns its mesh index.
    pub fn add_point(&mut self, position: Point3<f64>) -> usize {
        let index = self.mesh.add_point(position);
        let id = self.front.add_point(position, index);
        self.seeded.insert(index, id);
        index
    }

    /// Adds a boundary triangle or quad whose right-hand normal points into
    /// the volume.
    pub fn add_boundary_face(&mut self, points: &[usize], surface: SurfaceId) -> Result<()> {
        let ids = points
            .iter()
            .map(|&index| {
                self.seeded
                    .get(&index)
                    .copied()
                    .filter(|&id| self.front.point(id).is_some_and(|p| p.global_index == index))
                    .ok_or(Error::UnknownPoint(index))
            })
            .collect::<Result<SmallVec<[PointId; 4]>>>()?;
        self.front.add_entity(&ids, surface)?;
        Ok(())
    }

    /// Fills the front. `size` gives the local mesh size around each base
    /// face centroid.
    pub fn generate(&mut self, size: &dyn SizeField, global_h: f64) -> Result<MeshingStats> {
        let config = self.config.clone();
        let matcher = RuleMatcher::new(self.library, &config);

        advance(
            &mut self.front,
            &mut self.mesh,
            self.library,
            &config,
            |front, base, usage| {
                let Some(entity) = front.entity(base) else {
                    return Ok(None);
                };
                let Some(center) = centroid(&front.entity_positions(entity)) else {
                    return Ok(None);
                };
                let h = size.local_h(&center, global_h);
                if !(h > 0.0) {
                    return Err(Error::InvalidSize(h));
                }
                let Some(locals) = front.locals_of(base, config.radius_factor * h) else {
                    return Ok(None);
                };

                let (frames, candidates): (Vec<SolidFrame>, Vec<Candidate<3>>) =
                    Candidate::face_rotations(&locals.positions, locals.base_len(), h)
                        .into_iter()
                        .unzip();
                let input = MatchInput {
                    candidates: &candidates,
                    entities: &locals.entities,
                    class: locals.class,
                };
                let Some(found) = matcher.apply(&input, usage) else {
                    return Ok(None);
                };
                let Some(frame) = frames.get(found.candidate) else {
                    return Ok(None);
                };
                let new_points = found.new_points.iter().map(|q| frame.to_world(q)).collect();
                Ok(Some(Accepted::new(locals, found, new_points)))
            },
            |front| {
                if config.check_topology {
                    front.check_connectivity()?;
                }
                Ok(())
            },
        )
    }

    pub fn front(&self) -> &FaceFront {
        &self.front
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ElementKind;
    use approx::assert_relative_eq;
    use frontmesh_geometry::UniformSize;

    fn regular_tetrahedron(mesher: &mut VolumeMesher<'_>) {
        let s = 3f64.sqrt();
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, s / 2.0, 0.0),
            Point3::new(0.5, s / 6.0, (2.0f64 / 3.0).sqrt()),
        ];
        let p: Vec<usize> = corners.into_iter().map(|c| mesher.add_point(c)).collect();
        for face in [[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]] {
            let points: Vec<usize> = face.iter().map(|&i| p[i]).collect();
            mesher.add_boundary_face(&points, 0).unwrap();
        }
    }

    #[test]
    fn tetrahedron_hole_becomes_one_element() {
        let library = VolumeRules::builtin_tetrahedra().unwrap();
        let config = MeshingConfig {
            check_topology: true,
            ..MeshingConfig::default()
        };
        let mut mesher = VolumeMesher::new(&library, config);
        regular_tetrahedron(&mut mesher);
        assert_eq!(mesher.front().len(), 4);

        let stats = mesher.generate(&UniformSize, 1.0).unwrap();
        assert_eq!(stats.steps, 1);
        assert_eq!(stats.elements, 1);
        assert_eq!(stats.points, 4);
        assert!(mesher.front().is_empty());

        let mesh = mesher.into_mesh();
        assert_eq!(mesh.count(ElementKind::Tetrahedron), 1);
        assert_relative_eq!(mesh.volume(), 2f64.sqrt() / 12.0, epsilon = 1e-12);
    }

    #[test]
    fn face_points_are_checked() {
        let library = VolumeRules::builtin_tetrahedra().unwrap();
        let mut mesher = VolumeMesher::new(&library, MeshingConfig::default());
        let a = mesher.add_point(Point3::origin());
        let b = mesher.add_point(Point3::new(1.0, 0.0, 0.0));
        assert!(matches!(
            mesher.add_boundary_face(&[a, b, 9], 0),
            Err(Error::UnknownPoint(9))
        ));
        assert!(matches!(
            mesher.add_boundary_face(&[a, b], 0),
            Err(Error::Topology(_))
        ));
    }
}
