// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh generation.

use thiserror::Error;

/// Result type for meshing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling rules or generating a mesh
#[derive(Error, Debug)]
pub enum Error {
    #[error("Rule file error: {0}")]
    RuleFile(#[from] frontmesh_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] frontmesh_geometry::Error),

    #[error("Front error: {0}")]
    Topology(#[from] frontmesh_topology::Error),

    #[error("Invalid rule {rule:?}: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Rule library contains no rules")]
    EmptyLibrary,

    #[error("Unknown boundary point {0}")]
    UnknownPoint(usize),

    #[error("Invalid mesh size {0}")]
    InvalidSize(f64),

    #[error("Front could not be closed: {remaining} entities left after {steps} steps")]
    UnmatchedBoundary { remaining: usize, steps: usize },
}

impl Error {
    pub fn invalid_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }
}
