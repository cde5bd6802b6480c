// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meshing of independent boundary components on several threads.
//!
//! Each component gets its own front and mesh; only the rule library and
//! the geometry are shared, read-only.

use frontmesh_geometry::{BoundaryGeometry, SizeField, SurfaceId};
use nalgebra::Point3;
#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::config::MeshingConfig;
use crate::error::{Error, Result};
use crate::library::{SurfaceRules, VolumeRules};
use crate::mesh::Mesh;
use crate::stats::MeshingStats;
use crate::surface::SurfaceMesher;
use crate::volume::VolumeMesher;

/// A closed region of one surface: points and the boundary lines between
/// them, surface on the left.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceComponent {
    pub points: Vec<Point3<f64>>,
    /// Index pairs into `points`.
    pub lines: Vec<[usize; 2]>,
    pub surface: SurfaceId,
}

/// A closed volume boundary: points and faces with inward normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeComponent {
    pub points: Vec<Point3<f64>>,
    /// Triangles or quads as indices into `points`.
    pub faces: Vec<SmallVec<[usize; 4]>>,
}

/// Result of one component.
#[derive(Debug, Clone)]
pub struct MeshedComponent {
    pub mesh: Mesh,
    pub stats: MeshingStats,
}

fn mesh_surface(
    library: &SurfaceRules,
    config: &MeshingConfig,
    geometry: &dyn BoundaryGeometry,
    global_h: f64,
    component: &SurfaceComponent,
) -> Result<MeshedComponent> {
    let mut mesher = SurfaceMesher::new(library, config.clone());
    let index: Vec<usize> = component.points.iter().map(|&p| mesher.add_point(p)).collect();
    let point = |i: usize| index.get(i).copied().ok_or(Error::UnknownPoint(i));
    for &[a, b] in &component.lines {
        mesher.add_boundary_element(point(a)?, point(b)?, component.surface)?;
    }
    let stats = mesher.generate(geometry, global_h)?;
    Ok(MeshedComponent {
        mesh: mesher.into_mesh(),
        stats,
    })
}

fn mesh_volume(
    library: &VolumeRules,
    config: &MeshingConfig,
    size: &dyn SizeField,
    global_h: f64,
    component: &VolumeComponent,
) -> Result<MeshedComponent> {
    let mut mesher = VolumeMesher::new(library, config.clone());
    let index: Vec<usize> = component.points.iter().map(|&p| mesher.add_point(p)).collect();
    for face in &component.faces {
        let points = face
            .iter()
            .map(|&i| index.get(i).copied().ok_or(Error::UnknownPoint(i)))
            .collect::<Result<SmallVec<[usize; 4]>>>()?;
        mesher.add_boundary_face(&points, 0)?;
    }
    let stats = mesher.generate(size, global_h)?;
    Ok(MeshedComponent {
        mesh: mesher.into_mesh(),
        stats,
    })
}

/// Meshes every surface component, in parallel on native targets. Fails with
/// the first component error.
pub fn mesh_surfaces_parallel(
    library: &SurfaceRules,
    config: &MeshingConfig,
    geometry: &dyn BoundaryGeometry,
    global_h: f64,
    components: &[SurfaceComponent],
) -> Result<Vec<MeshedComponent>> {
    tracing::debug!(components = components.len(), "meshing surface components");

    #[cfg(not(target_arch = "wasm32"))]
    let results = components
        .par_iter()
        .map(|c| mesh_surface(library, config, geometry, global_h, c))
        .collect();

    #[cfg(target_arch = "wasm32")]
    let results = components
        .iter()
        .map(|c| mesh_surface(library, config, geometry, global_h, c))
        .collect();

    results
}

/// Meshes every volume component, in parallel on native targets.
pub fn mesh_volumes_parallel(
    library: &VolumeRules,
    config: &MeshingConfig,
    size: &dyn SizeField,
    global_h: f64,
    components: &[VolumeComponent],
) -> Result<Vec<MeshedComponent>> {
    tracing::debug!(components = components.len(), "meshing volume components");

    #[cfg(not(target_arch = "wasm32"))]
    let results = components
        .par_iter()
        .map(|c| mesh_volume(library, config, size, global_h, c))
        .collect();

    #[cfg(target_arch = "wasm32")]
    let results = components
        .iter()
        .map(|c| mesh_volume(library, config, size, global_h, c))
        .collect();

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontmesh_geometry::{PlanarBoundary, UniformSize};

    fn square(offset: f64) -> SurfaceComponent {
        SurfaceComponent {
            points: [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
                .iter()
                .map(|&(x, y)| Point3::new(x + offset, y, 0.0))
                .collect(),
            lines: vec![[0, 1], [1, 2], [2, 3], [3, 0]],
            surface: 0,
        }
    }

    #[test]
    fn components_are_meshed_independently() {
        let library = SurfaceRules::builtin_triangles().unwrap();
        let components: Vec<_> = (0..4).map(|i| square(3.0 * i as f64)).collect();
        let results = mesh_surfaces_parallel(
            &library,
            &MeshingConfig::default(),
            &PlanarBoundary::xy(),
            1.0,
            &components,
        )
        .unwrap();

        assert_eq!(results.len(), 4);
        let mut total = MeshingStats::default();
        for result in &results {
            assert_eq!(result.mesh.element_count(), 2);
            total.merge(&result.stats);
        }
        assert_eq!(total.elements, 8);
        assert_eq!(total.remaining_front, 0);
    }

    #[test]
    fn component_error_is_reported() {
        let library = SurfaceRules::builtin_triangles().unwrap();
        let mut broken = square(0.0);
        broken.lines.push([0, 9]);
        let result = mesh_surfaces_parallel(
            &library,
            &MeshingConfig::default(),
            &PlanarBoundary::xy(),
            1.0,
            &[square(5.0), broken],
        );
        assert!(matches!(result, Err(Error::UnknownPoint(9))));
    }

    #[test]
    fn volume_component() {
        let library = VolumeRules::builtin_tetrahedra().unwrap();
        let s = 3f64.sqrt();
        let component = VolumeComponent {
            points: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, s / 2.0, 0.0),
                Point3::new(0.5, s / 6.0, (2.0f64 / 3.0).sqrt()),
            ],
            faces: vec![
                SmallVec::from_slice(&[0, 1, 2]),
                SmallVec::from_slice(&[0, 3, 1]),
                SmallVec::from_slice(&[1, 3, 2]),
                SmallVec::from_slice(&[2, 3, 0]),
            ],
        };
        let results =
            mesh_volumes_parallel(&library, &MeshingConfig::default(), &UniformSize, 1.0, &[component]).unwrap();
        assert_eq!(results[0].mesh.element_count(), 1);
        assert_eq!(results[0].stats.max_class, 1);
    }
}
