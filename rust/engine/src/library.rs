// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordered rule collections.

use std::str::FromStr;

use frontmesh_core::{parse_rules, RuleFile};

use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::stats::RuleUsage;

const TRIANGLE_RULES: &str = include_str!("../rules/triangle.rls");
const TETRAHEDRON_RULES: &str = include_str!("../rules/tetra.rls");

/// Compiled rules sorted by ascending quality. Read-only once built, so one
/// library can serve several meshers at the same time.
#[derive(Debug, Clone)]
pub struct RuleLibrary<const D: usize> {
    rules: Vec<Rule<D>>,
    tolerance_factor: f64,
}

/// Line rules producing triangles.
pub type SurfaceRules = RuleLibrary<2>;

/// Face rules producing volume elements.
pub type VolumeRules = RuleLibrary<3>;

impl<const D: usize> RuleLibrary<D> {
    /// Compiles every rule of a parsed file. Rules of equal quality keep
    /// their file order.
    pub fn from_descriptions(file: RuleFile) -> Result<Self> {
        let mut rules = file
            .rules
            .iter()
            .map(Rule::<D>::compile)
            .collect::<Result<Vec<_>>>()?;
        if rules.is_empty() {
            return Err(Error::EmptyLibrary);
        }
        rules.sort_by_key(Rule::quality);

        let tolerance_factor = file.tolerance_factor.unwrap_or(1.0);
        tracing::debug!(
            rules = rules.len(),
            dimension = D,
            tolerance_factor,
            "rule library loaded"
        );
        Ok(Self {
            rules,
            tolerance_factor,
        })
    }

    pub fn rules(&self) -> &[Rule<D>] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&Rule<D>> {
        self.rules.get(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Library-wide multiplier of the point tolerance (`tolfak`).
    pub fn tolerance_factor(&self) -> f64 {
        self.tolerance_factor
    }

    /// Zeroed usage counters, one per rule in library order.
    pub fn usage_template(&self) -> Vec<RuleUsage> {
        self.rules.iter().map(|r| RuleUsage::new(r.name())).collect()
    }
}

impl<const D: usize> FromStr for RuleLibrary<D> {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Self::from_descriptions(parse_rules(text)?)
    }
}

impl RuleLibrary<2> {
    /// The bundled triangle rules.
    pub fn builtin_triangles() -> Result<Self> {
        TRIANGLE_RULES.parse()
    }
}

impl RuleLibrary<3> {
    /// The bundled tetrahedron rules.
    pub fn builtin_tetrahedra() -> Result<Self> {
        TETRAHEDRON_RULES.parse()
    }
}
