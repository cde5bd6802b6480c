// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compiled meshing rules.
//!
//! A rule maps a small piece of front, given in canonical coordinates, to
//! new points, new front entities and elements. When the front differs from
//! the canonical geometry, the difference is captured by the displacement
//! vector `u` (one `D`-vector per old point). New points and free-zone
//! vertices follow as `reference + T · u` with a fixed matrix `T` per rule.

use frontmesh_core::{ElementPoints, EntityPoints, OldEntity, RuleDescription, Tolerance};
use frontmesh_geometry::{affine_apply, FreeSetTopology, FreeZone, FreeZoneTolerances};
use nalgebra::{DMatrix, DVector, Point, SVector};

use crate::error::{Error, Result};
use crate::mesh::ElementKind;

/// An element of a rule in rule point indices (old points first, then new).
#[derive(Debug, Clone, PartialEq)]
pub struct RuleElement {
    pub kind: ElementKind,
    pub points: ElementPoints,
}

/// New points and free zone of a rule fitted to the front.
#[derive(Debug, Clone)]
pub struct Instantiation<const D: usize> {
    pub new_points: Vec<Point<f64, D>>,
    pub free_zone: FreeZone<D>,
}

/// A rule ready for matching, in dimension `D`.
#[derive(Debug, Clone)]
pub struct Rule<const D: usize> {
    name: String,
    quality: u32,
    old_points: Vec<Point<f64, D>>,
    tolerances: Vec<Tolerance>,
    old_entities: Vec<OldEntity>,
    new_points: Vec<Point<f64, D>>,
    new_point_map: DMatrix<f64>,
    new_entities: Vec<EntityPoints>,
    free_zone: Vec<Point<f64, D>>,
    free_zone_map: DMatrix<f64>,
    free_sets: Vec<FreeSetTopology>,
    elements: Vec<RuleElement>,
    orientations: Vec<[usize; 4]>,
}

fn to_point<const D: usize>(coords: &[f64]) -> Point<f64, D> {
    Point::from(SVector::<f64, D>::from_fn(|i, _| coords.get(i).copied().unwrap_or(0.0)))
}

/// Builds the `(D * points) x (D * n_old)` displacement matrix.
fn displacement_matrix<const D: usize>(points: &[frontmesh_core::AffinePoint], n_old: usize) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(D * points.len(), D * n_old);
    for (row_point, point) in points.iter().enumerate() {
        for (coord, terms) in point.terms.iter().enumerate() {
            for term in terms {
                matrix[(D * row_point + coord, D * term.point + term.axis)] += term.weight;
            }
        }
    }
    matrix
}

fn chunk_points<const D: usize>(values: &DVector<f64>) -> Vec<Point<f64, D>> {
    values
        .as_slice()
        .chunks_exact(D)
        .map(to_point::<D>)
        .collect()
}

fn flatten<const D: usize>(points: &[Point<f64, D>]) -> DVector<f64> {
    DVector::from_iterator(D * points.len(), points.iter().flat_map(|p| p.coords.iter().copied()))
}

impl<const D: usize> Rule<D> {
    /// Compiles a parsed rule description.
    pub fn compile(desc: &RuleDescription) -> Result<Self> {
        if desc.dimension != D {
            return Err(Error::DimensionMismatch {
                expected: D,
                found: desc.dimension,
            });
        }
        desc.validate()?;

        let n_old = desc.old_points.len();
        let old_points: Vec<Point<f64, D>> = desc.old_points.iter().map(|p| to_point(&p.position)).collect();
        let tolerances = desc
            .old_points
            .iter()
            .map(|p| p.tolerance.unwrap_or_default())
            .collect();
        let new_points: Vec<Point<f64, D>> = desc.new_points.iter().map(|p| to_point(&p.position)).collect();
        let free_zone: Vec<Point<f64, D>> = desc.free_zone.iter().map(|p| to_point(&p.position)).collect();

        let all_zone: Vec<usize> = (0..free_zone.len()).collect();
        let set_lists: Vec<&[usize]> = if desc.free_sets.is_empty() {
            vec![all_zone.as_slice()]
        } else {
            desc.free_sets.iter().map(Vec::as_slice).collect()
        };
        let free_sets = set_lists
            .into_iter()
            .map(|set| {
                FreeSetTopology::from_reference(&free_zone, set)
                    .map_err(|e| Error::invalid_rule(&desc.name, format!("free set: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let elements = desc
            .elements
            .iter()
            .map(|points| {
                ElementKind::from_len(D, points.len())
                    .map(|kind| RuleElement {
                        kind,
                        points: points.clone(),
                    })
                    .ok_or_else(|| Error::invalid_rule(&desc.name, "unsupported element"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: desc.name.clone(),
            quality: desc.quality,
            new_point_map: displacement_matrix::<D>(&desc.new_points, n_old),
            free_zone_map: displacement_matrix::<D>(&desc.free_zone, n_old),
            old_points,
            tolerances,
            old_entities: desc.old_entities.clone(),
            new_points,
            new_entities: desc.new_entities.clone(),
            free_zone,
            free_sets,
            elements,
            orientations: desc.orientations.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quality(&self) -> u32 {
        self.quality
    }

    pub fn old_points(&self) -> &[Point<f64, D>] {
        &self.old_points
    }

    pub fn old_entities(&self) -> &[OldEntity] {
        &self.old_entities
    }

    pub fn new_points(&self) -> &[Point<f64, D>] {
        &self.new_points
    }

    pub fn new_entities(&self) -> &[EntityPoints] {
        &self.new_entities
    }

    pub fn elements(&self) -> &[RuleElement] {
        &self.elements
    }

    pub fn orientations(&self) -> &[[usize; 4]] {
        &self.orientations
    }

    /// Points in the base entity (old entity 0).
    pub fn base_len(&self) -> usize {
        self.old_entities.first().map_or(0, |e| e.points.len())
    }

    /// Old plus new points.
    pub fn point_count(&self) -> usize {
        self.old_points.len() + self.new_points.len()
    }

    /// Displacement of the old points from their canonical positions.
    pub fn fit(&self, matched: &[Point<f64, D>]) -> Result<DVector<f64>> {
        if matched.len() != self.old_points.len() {
            return Err(Error::DimensionMismatch {
                expected: self.old_points.len(),
                found: matched.len(),
            });
        }
        Ok(flatten(matched) - flatten(&self.old_points))
    }

    /// Weighted squared distance of `p` from old point `i`. Infinite for an
    /// index past the rule's old points.
    pub fn point_deviation(&self, i: usize, p: &Point<f64, D>) -> f64 {
        let (Some(old), Some(tolerance)) = (self.old_points.get(i), self.tolerances.get(i)) else {
            return f64::INFINITY;
        };
        let d = p - old;
        match *tolerance {
            Tolerance::Isotropic(f) => f * d.norm_squared(),
            Tolerance::Quadratic([f1, f2, f3]) => match D {
                2 => f1 * d[0] * d[0] + f2 * d[0] * d[1] + f3 * d[1] * d[1],
                _ => f1 * d[0] * d[0] + f2 * d[1] * d[1] + f3 * d[2] * d[2],
            },
        }
    }

    /// Accepts `p` as old point `i` if its deviation is within `limit`.
    pub fn check_point_tolerance(&self, i: usize, p: &Point<f64, D>, limit: f64) -> bool {
        self.point_deviation(i, p) <= limit
    }

    /// Evaluates new points and the free zone for displacement `u`.
    pub fn instantiate(&self, u: &DVector<f64>, tolerances: FreeZoneTolerances) -> Result<Instantiation<D>> {
        let new_points = affine_apply(&self.new_point_map, &flatten(&self.new_points), u)?;
        let zone = affine_apply(&self.free_zone_map, &flatten(&self.free_zone), u)?;
        Ok(Instantiation {
            new_points: chunk_points(&new_points),
            free_zone: FreeZone::new(chunk_points(&zone), &self.free_sets, tolerances)?,
        })
    }
}

impl<const D: usize> Instantiation<D> {
    /// The moved free zone is still a union of convex sets.
    pub fn convex_free_zone(&self) -> bool {
        self.free_zone.is_convex()
    }
}
