// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! FrontMesh Geometry
//!
//! Geometric building blocks of the advancing-front mesher: bounding boxes
//! and orientation predicates, the local frames that map the front into the
//! canonical rule space, free-zone containment tests and the boundary and
//! mesh-size callbacks supplied by the caller.

pub mod boundary;
pub mod error;
pub mod frame;
pub mod freezone;
pub mod geom;
pub mod linalg;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use boundary::{BoundaryGeometry, GradedSize, PlanarBoundary, SizeField, SurfaceId, UniformSize};
pub use error::{Error, Result};
pub use frame::{PlaneFrame, SolidFrame};
pub use freezone::{
    FreeSetTopology, FreeZone, FreeZoneTolerances, HalfSpace, TriangleTest, Verdict, ZoneQuery,
};
pub use geom::{centroid, distance_to_segment, signed_area, signed_volume, triangle_normal, Aabb};
pub use linalg::{affine_apply, solve2};
