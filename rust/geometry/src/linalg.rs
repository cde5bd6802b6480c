// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small checked linear-algebra helpers.
//!
//! Singular systems and shape mismatches are reported as errors rather than
//! producing NaNs or panics.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use crate::error::{Error, Result};

/// Relative pivot threshold for 2x2 solves.
const SINGULAR_RATIO: f64 = 1e-14;

/// Solves `m * x = rhs`.
pub fn solve2(m: &Matrix2<f64>, rhs: &Vector2<f64>) -> Result<Vector2<f64>> {
    let scale = m.amax();
    let det = m.determinant();
    if scale == 0.0 || det.abs() <= SINGULAR_RATIO * scale * scale {
        return Err(Error::SingularMatrix);
    }
    Ok(Vector2::new(
        (rhs.x * m[(1, 1)] - rhs.y * m[(0, 1)]) / det,
        (m[(0, 0)] * rhs.y - m[(1, 0)] * rhs.x) / det,
    ))
}

/// Evaluates `base + matrix * u`.
pub fn affine_apply(matrix: &DMatrix<f64>, base: &DVector<f64>, u: &DVector<f64>) -> Result<DVector<f64>> {
    if matrix.ncols() != u.len() {
        return Err(Error::DimensionMismatch {
            expected: matrix.ncols(),
            found: u.len(),
        });
    }
    if matrix.nrows() != base.len() {
        return Err(Error::DimensionMismatch {
            expected: matrix.nrows(),
            found: base.len(),
        });
    }
    Ok(base + matrix * u)
}
