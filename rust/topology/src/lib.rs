// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FrontMesh Topology
//!
//! The advancing front used by the mesh generators: points and entities in
//! slot maps with recycled, versioned keys, connectivity and front-number
//! bookkeeping, quality-class escalation and extraction of the local
//! neighbourhood around the next entity to process.
//!
//! [`LineFront`] drives surface (triangle) meshing and [`FaceFront`] drives
//! volume (tetrahedron) meshing. Both are instances of the generic
//! [`Front`], parameterised by an [`EntityKind`].
//!
//! ```
//! use frontmesh_topology::LineFront;
//! use nalgebra::Point3;
//!
//! let mut front = LineFront::new();
//! let a = front.add_point(Point3::new(0.0, 0.0, 0.0), 0);
//! let b = front.add_point(Point3::new(1.0, 0.0, 0.0), 1);
//! front.add_entity(&[a, b], 0).unwrap();
//!
//! assert_eq!(front.len(), 1);
//! ```

pub mod error;
pub mod front;
pub mod front2d;
pub mod front3d;
pub mod keys;

pub use error::{Error, Result};
pub use front::{
    EntityKind, EntityPoints, Front, FrontEntity, FrontPoint, LocalEntity, LocalNeighborhood,
    UNSET_FRONT_NR,
};
pub use front2d::{Line, LineFront};
pub use front3d::{Face, FaceFront};
pub use keys::{EntityId, PointId};
