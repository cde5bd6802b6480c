// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain rule records as read from a rule file.
//!
//! A [`RuleDescription`] is the uncompiled form of a meshing rule: canonical
//! positions, index lists and affine coefficient terms. All indices are
//! 0-based here; the rule-file text is 1-based and converted by the parser.
//! The engine compiles descriptions into matrices before meshing.

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coordinates of a canonical point (2 or 3 entries).
pub type Coordinates = SmallVec<[f64; 3]>;

/// Point indices of a front entity: a line (2), triangle (3) or quad (4).
pub type EntityPoints = SmallVec<[usize; 4]>;

/// Point indices of an element: triangle up to prism (3 to 6).
pub type ElementPoints = SmallVec<[usize; 6]>;

/// Weights of the quadratic form used to measure how far a local point may
/// sit from its canonical position. Larger weights are stricter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tolerance {
    /// `f * |d|^2`
    Isotropic(f64),
    /// 2-D: `f1*dx^2 + f2*dx*dy + f3*dy^2`. 3-D: `f1*dx^2 + f2*dy^2 + f3*dz^2`.
    Quadratic([f64; 3]),
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance::Isotropic(1.0)
    }
}

/// One term of an affine map: `weight` times the `axis` displacement of old
/// point `point`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coefficient {
    pub weight: f64,
    pub point: usize,
    pub axis: usize,
}

/// A point the rule expects to find on the front.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OldPoint {
    pub position: Coordinates,
    pub tolerance: Option<Tolerance>,
}

/// A point that moves with the displacement of the old points: new points
/// and free-zone vertices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AffinePoint {
    pub position: Coordinates,
    /// One term list per coordinate axis.
    pub terms: Vec<Vec<Coefficient>>,
}

impl AffinePoint {
    /// A point with no displacement terms.
    pub fn fixed(position: &[f64]) -> Self {
        Self {
            position: Coordinates::from_slice(position),
            terms: vec![Vec::new(); position.len()],
        }
    }
}

/// A front entity the rule maps onto, optionally consumed by the rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OldEntity {
    pub points: EntityPoints,
    pub delete: bool,
}

/// The uncompiled form of one meshing rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleDescription {
    pub name: String,
    /// 2 for surface (line) rules, 3 for volume (face) rules.
    pub dimension: usize,
    pub quality: u32,
    pub old_points: Vec<OldPoint>,
    pub old_entities: Vec<OldEntity>,
    pub new_points: Vec<AffinePoint>,
    pub new_entities: Vec<EntityPoints>,
    pub free_zone: Vec<AffinePoint>,
    pub free_sets: Vec<Vec<usize>>,
    pub elements: Vec<ElementPoints>,
    /// Tetrahedra that must keep a positive volume (3-D only).
    pub orientations: Vec<[usize; 4]>,
}

/// The contents of a rule file.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RuleFile {
    /// Library-wide multiplier of the point tolerance (`tolfak`).
    pub tolerance_factor: Option<f64>,
    pub rules: Vec<RuleDescription>,
}

impl RuleDescription {
    /// Creates an empty rule of the given dimension with quality 1.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            quality: 1,
            old_points: Vec::new(),
            old_entities: Vec::new(),
            new_points: Vec::new(),
            new_entities: Vec::new(),
            free_zone: Vec::new(),
            free_sets: Vec::new(),
            elements: Vec::new(),
            orientations: Vec::new(),
        }
    }

    /// Number of old plus new points, the range of element indices.
    pub fn point_count(&self) -> usize {
        self.old_points.len() + self.new_points.len()
    }

    /// Checks index ranges, arities and the canonical base entity.
    pub fn validate(&self) -> Result<()> {
        let dim = self.dimension;
        let name = self.name.as_str();
        if dim != 2 && dim != 3 {
            return Err(Error::invalid(name, format!("unsupported dimension {}", dim)));
        }
        if self.quality == 0 {
            return Err(Error::invalid(name, "quality must be at least 1"));
        }
        if self.old_points.len() < dim {
            return Err(Error::invalid(
                name,
                format!("needs at least {} map points", dim),
            ));
        }

        let n_old = self.old_points.len();
        let n_all = self.point_count();

        for p in &self.old_points {
            if p.position.len() != dim {
                return Err(Error::MixedDimensions(self.name.clone()));
            }
        }
        for p in self.new_points.iter().chain(&self.free_zone) {
            if p.position.len() != dim {
                return Err(Error::MixedDimensions(self.name.clone()));
            }
            if p.terms.len() > dim {
                return Err(Error::invalid(name, "too many coefficient blocks"));
            }
            for term in p.terms.iter().flatten() {
                if term.point >= n_old {
                    return Err(Error::invalid(
                        name,
                        format!("coefficient references old point {}", term.point + 1),
                    ));
                }
                if term.axis >= dim {
                    return Err(Error::invalid(name, "coefficient axis out of range"));
                }
            }
        }

        let entity_arity_ok = |len: usize| match dim {
            2 => len == 2,
            _ => len == 3 || len == 4,
        };

        let base = self
            .old_entities
            .first()
            .ok_or_else(|| Error::invalid(name, "no map lines or faces"))?;
        if !base.points.iter().copied().eq(0..base.points.len()) {
            return Err(Error::invalid(
                name,
                "first mapped entity must use the first map points in order",
            ));
        }
        for entity in &self.old_entities {
            if !entity_arity_ok(entity.points.len()) {
                return Err(Error::invalid(name, "wrong number of points in mapped entity"));
            }
            if entity.points.iter().any(|&p| p >= n_old) {
                return Err(Error::invalid(name, "mapped entity references a new point"));
            }
        }
        for entity in &self.new_entities {
            if !entity_arity_ok(entity.len()) {
                return Err(Error::invalid(name, "wrong number of points in new entity"));
            }
            if entity.iter().any(|&p| p >= n_all) {
                return Err(Error::invalid(name, "new entity index out of range"));
            }
        }

        if self.free_zone.len() < dim + 1 {
            return Err(Error::invalid(
                name,
                format!("free zone needs at least {} points", dim + 1),
            ));
        }
        for set in &self.free_sets {
            if set.len() < dim + 1 {
                return Err(Error::invalid(name, "free set spans no area or volume"));
            }
            if set.iter().any(|&i| i >= self.free_zone.len()) {
                return Err(Error::invalid(name, "free set index out of range"));
            }
        }

        for element in &self.elements {
            let arity_ok = match dim {
                2 => element.len() == 3 || element.len() == 4,
                _ => (4..=6).contains(&element.len()),
            };
            if !arity_ok {
                return Err(Error::invalid(name, "unsupported element size"));
            }
            if element.iter().any(|&p| p >= n_all) {
                return Err(Error::invalid(name, "element index out of range"));
            }
        }

        if dim == 2 && !self.orientations.is_empty() {
            return Err(Error::invalid(name, "orientations are only defined in 3-D"));
        }
        for tet in &self.orientations {
            if tet.iter().any(|&p| p >= n_all) {
                return Err(Error::invalid(name, "orientation index out of range"));
            }
        }

        Ok(())
    }
}
