// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in geometric utilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Singular matrix")]
    SingularMatrix,

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Degenerate local frame: {0}")]
    DegenerateFrame(String),

    #[error("Free zone has no points")]
    EmptyFreeZone,

    #[error("Free set spans no area or volume")]
    DegenerateFreeSet,

    #[error("Point index {index} out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}
