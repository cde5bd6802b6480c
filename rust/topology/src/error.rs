// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for front operations.

use crate::keys::{EntityId, PointId};

/// Result type alias for front operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while editing the front.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A referenced point is not on the front.
    #[error("front point not found: {0}")]
    PointNotFound(PointId),

    /// A referenced entity is not on the front.
    #[error("front entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Wrong number of points, or a point used twice.
    #[error("degenerate front entity: {0}")]
    DegenerateEntity(String),

    /// The same oriented entity is already on the front.
    #[error("front entity already present as {0}")]
    DuplicateEntity(EntityId),

    /// A point is referenced by one or two faces only, so the front surface
    /// is no longer closed around it.
    #[error("front leaks at {point}: referenced by {faces} face(s)")]
    ConnectivityLeak { point: PointId, faces: u32 },
}
