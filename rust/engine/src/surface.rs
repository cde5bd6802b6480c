// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface meshing: a line front on a boundary surface is filled with
//! triangles.
//!
//! Every step works in the plane frame of the selected line. The frame's
//! `x` axis runs along the line, its `z` axis is the surface normal, and
//! lengths are divided by the local mesh size, so rules see the line as
//! roughly `(0, 0) -> (1, 0)`. New points are mapped back and projected onto
//! the surface.

use frontmesh_geometry::{BoundaryGeometry, PlaneFrame, SurfaceId};
use frontmesh_topology::{LineFront, PointId};
use nalgebra::Point3;
use rustc_hash::FxHashMap;

use crate::config::MeshingConfig;
use crate::driver::{advance, Accepted};
use crate::error::{Error, Result};
use crate::library::SurfaceRules;
use crate::matcher::{Candidate, MatchInput, RuleMatcher};
use crate::mesh::Mesh;
use crate::stats::MeshingStats;

/// Triangulates surfaces bounded by closed line loops.
#[derive(Debug, Clone)]
pub struct SurfaceMesher<'a> {
    library: &'a SurfaceRules,
    config: MeshingConfig,
    front: LineFront,
    mesh: Mesh,
    /// Front point of every boundary point, by mesh index.
    seeded: FxHashMap<usize, PointId>,
}

impl<'a> SurfaceMesher<'a> {
    pub fn new(library: &'a SurfaceRules, config: MeshingConfig) -> Self {
        Self {
            library,
            config,
            front: LineFront::new(),
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

    /// Adds a boundary line between two points added with
    /// [`SurfaceMesher::add_point`]. The surface to mesh lies on its left,
    /// seen from the surface normal.
    pub fn add_boundary_element(&mut self, from: usize, to: usize, surface: SurfaceId) -> Result<()> {
        let points = [self.front_point(from)?, self.front_point(to)?];
        self.front.add_entity(&points, surface)?;
        Ok(())
    }

    fn front_point(&self, index: usize) -> Result<PointId> {
        self.seeded
            .get(&index)
            .copied()
            .filter(|&id| self.front.point(id).is_some_and(|p| p.global_index == index))
            .ok_or(Error::UnknownPoint(index))
    }

    /// Fills the front with triangles. `global_h` is the target edge length
    /// where the geometry sets no local size.
    pub fn generate(&mut self, geometry: &dyn BoundaryGeometry, global_h: f64) -> Result<MeshingStats> {
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
                let surface = entity.surface;
                let ends = front.entity_positions(entity);
                let (p1, p2) = match ends.as_slice() {
                    [p1, p2] => (*p1, *p2),
                    _ => return Ok(None),
                };

                let h = geometry.local_h(surface, &nalgebra::center(&p1, &p2), global_h);
                if !(h > 0.0) {
                    return Err(Error::InvalidSize(h));
                }
                let Some(locals) = front.locals_of(base, config.radius_factor * h) else {
                    return Ok(None);
                };
                let Some(frame) = geometry
                    .normal(surface, &p1)
                    .and_then(|n| PlaneFrame::new(&p1, &p2, &n, h).ok())
                else {
                    tracing::trace!(base = %base, "no plane frame for line");
                    return Ok(None);
                };

                let candidates = [Candidate::in_plane(&frame, &locals.positions)];
                let input = MatchInput {
                    candidates: &candidates,
                    entities: &locals.entities,
                    class: locals.class,
                };
                let Some(found) = matcher.apply(&input, usage) else {
                    return Ok(None);
                };
                let new_points = found
                    .new_points
                    .iter()
                    .map(|q| geometry.project_point(surface, &frame.to_space(q)))
                    .collect();
                Ok(Some(Accepted::new(locals, found, new_points)))
            },
            |_| Ok(()),
        )
    }

    pub fn front(&self) -> &LineFront {
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
    use frontmesh_geometry::PlanarBoundary;

    fn unit_square(mesher: &mut SurfaceMesher<'_>) {
        let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let points: Vec<usize> = corners
            .iter()
            .map(|&(x, y)| mesher.add_point(Point3::new(x, y, 0.0)))
            .collect();
        for i in 0..4 {
            mesher.add_boundary_element(points[i], points[(i + 1) % 4], 0).unwrap();
        }
    }

    #[test]
    fn unit_square_gives_two_triangles() {
        let library = SurfaceRules::builtin_triangles().unwrap();
        let mut mesher = SurfaceMesher::new(&library, MeshingConfig::default());
        unit_square(&mut mesher);

        let stats = mesher.generate(&PlanarBoundary::xy(), 1.0).unwrap();
        assert_eq!(stats.initial_front, 4);
        assert_eq!(stats.remaining_front, 0);
        assert_eq!(stats.elements, 2);
        assert_eq!(stats.points, 4);
        assert_eq!(stats.steps, 2);
        assert!(mesher.front().is_empty());

        let mesh = mesher.mesh();
        assert_eq!(mesh.count(ElementKind::Triangle), 2);
        assert_relative_eq!(mesh.surface_area(), 1.0, epsilon = 1e-12);
        let used = |name: &str| stats.rules.iter().find(|r| r.name == name).map_or(0, |r| r.used);
        assert_eq!(used("Right 60"), 1);
        assert_eq!(used("Close Triangle"), 1);
    }

    /// A corner rule that re-adds its consumed lines reversed, so both
    /// cancel before the driver deletes them and the new diagonal lands in
    /// a recycled slot.
    const CANCELLING_CORNER: &str = r#"
rule "Close Triangle"
quality 1
mappoints (0, 0); (1, 0); (0.5, 0.866) { 0.5 };
maplines (1, 2) del; (2, 3) del; (3, 1) del;
freearea (0, 0); (1, 0) { 1 X2 } { }; (0.5, 0.866) { 1 X3 } { 1 Y3 };
elements (1, 2, 3);
endrule

rule "Corner"
quality 1
mappoints (0, 0); (1, 0); (0.5, 0.866) { 0.5 };
maplines (1, 2) del; (2, 3) del;
newlines (2, 1); (1, 3); (3, 2);
freearea (0, 0); (1, 0) { 1 X2 } { }; (0.5, 0.866) { 1 X3 } { 1 Y3 }; (-0.125, 0.6495) { 0.75 X3 } { 0.75 Y3 };
elements (1, 2, 3);
endrule
"#;

    #[test]
    fn cancelled_consumed_lines_are_not_deleted_twice() {
        let library: SurfaceRules = CANCELLING_CORNER.parse().unwrap();
        let config = MeshingConfig {
            check_topology: true,
            ..MeshingConfig::default()
        };
        let mut mesher = SurfaceMesher::new(&library, config);
        unit_square(&mut mesher);

        let stats = mesher.generate(&PlanarBoundary::xy(), 1.0).unwrap();
        assert_eq!(stats.remaining_front, 0);
        assert_eq!(stats.elements, 2);
        assert!(mesher.front().is_empty());
        assert!(mesher.front().entity_slots() <= 4);
        assert_relative_eq!(mesher.mesh().surface_area(), 1.0, epsilon = 1e-12);
        let used = |name: &str| stats.rules.iter().find(|r| r.name == name).map_or(0, |r| r.used);
        assert_eq!(used("Corner"), 1);
        assert_eq!(used("Close Triangle"), 1);
    }

    #[test]
    fn unknown_point_is_rejected() {
        let library = SurfaceRules::builtin_triangles().unwrap();
        let mut mesher = SurfaceMesher::new(&library, MeshingConfig::default());
        let a = mesher.add_point(Point3::origin());
        assert!(matches!(
            mesher.add_boundary_element(a, 7, 0),
            Err(Error::UnknownPoint(7))
        ));
    }

    #[test]
    fn non_positive_size_is_an_error() {
        let library = SurfaceRules::builtin_triangles().unwrap();
        let mut mesher = SurfaceMesher::new(&library, MeshingConfig::default());
        unit_square(&mut mesher);
        assert!(matches!(
            mesher.generate(&PlanarBoundary::xy(), 0.0),
            Err(Error::InvalidSize(_))
        ));
    }

    #[test]
    fn empty_front_finishes_immediately() {
        let library = SurfaceRules::builtin_triangles().unwrap();
        let mut mesher = SurfaceMesher::new(&library, MeshingConfig::default());
        let stats = mesher.generate(&PlanarBoundary::xy(), 1.0).unwrap();
        assert_eq!(stats.steps, 0);
        assert_eq!(mesher.into_mesh().element_count(), 0);
    }
}
