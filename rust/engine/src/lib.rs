// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FrontMesh Engine
//!
//! Rule-based advancing-front mesh generation. A front of boundary lines (on
//! a surface) or boundary faces (around a volume) is consumed one entity at
//! a time: the local neighbourhood of the selected entity is mapped into a
//! canonical frame, matched against a library of parametrized rules, and the
//! first rule whose free zone is empty is applied. Meshing ends when the
//! front is empty.
//!
//! ## Quick Start
//!
//! ```
//! use frontmesh_engine::{MeshingConfig, SurfaceMesher, SurfaceRules};
//! use frontmesh_geometry::PlanarBoundary;
//! use nalgebra::Point3;
//!
//! let rules = SurfaceRules::builtin_triangles().unwrap();
//! let mut mesher = SurfaceMesher::new(&rules, MeshingConfig::default());
//! let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
//! let points: Vec<usize> = corners
//!     .iter()
//!     .map(|&(x, y)| mesher.add_point(Point3::new(x, y, 0.0)))
//!     .collect();
//! for i in 0..4 {
//!     mesher.add_boundary_element(points[i], points[(i + 1) % 4], 0).unwrap();
//! }
//!
//! let stats = mesher.generate(&PlanarBoundary::xy(), 1.0).unwrap();
//! assert_eq!(stats.elements, 2);
//! ```
//!
//! ## Parallelism
//!
//! A single front is processed sequentially. Independent boundary
//! components can be meshed on several threads with
//! [`mesh_surfaces_parallel`] and [`mesh_volumes_parallel`].

pub mod config;
mod driver;
pub mod error;
pub mod library;
pub mod matcher;
pub mod mesh;
pub mod parallel;
pub mod rule;
pub mod stats;
pub mod surface;
pub mod volume;

pub use config::MeshingConfig;
pub use error::{Error, Result};
pub use library::{RuleLibrary, SurfaceRules, VolumeRules};
pub use matcher::{Candidate, MatchInput, RuleMatch, RuleMatcher};
pub use mesh::{Element, ElementKind, Mesh};
pub use parallel::{
    mesh_surfaces_parallel, mesh_volumes_parallel, MeshedComponent, SurfaceComponent,
    VolumeComponent,
};
pub use rule::{Instantiation, Rule, RuleElement};
pub use stats::{MeshingStats, RuleUsage};
pub use surface::SurfaceMesher;
pub use volume::VolumeMesher;
