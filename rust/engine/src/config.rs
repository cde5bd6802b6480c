// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meshing configuration with environment overrides.

use std::str::FromStr;

use frontmesh_geometry::FreeZoneTolerances;

/// Tunable parameters of the mesh generators.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshingConfig {
    /// Neighbourhood radius in units of the local mesh size.
    pub radius_factor: f64,
    /// Squared canonical distance a mapped point may deviate at class 1,
    /// before the rule's own weights and the library factor.
    pub point_tolerance: f64,
    /// A front entity failing beyond this class aborts meshing.
    pub max_quality_class: u32,
    /// Step budget per initial front entity.
    pub max_steps_per_entity: usize,
    /// Verify closed-front connectivity after every volume step.
    pub check_topology: bool,
    pub free_zone: FreeZoneTolerances,
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            radius_factor: 3.0,
            point_tolerance: 0.2,
            max_quality_class: 30,
            max_steps_per_entity: 200,
            check_topology: cfg!(debug_assertions),
            free_zone: FreeZoneTolerances::default(),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl MeshingConfig {
    /// Load configuration from `FRONTMESH_*` environment variables, falling
    /// back to the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`MeshingConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let z = d.free_zone;
        Self {
            radius_factor: parsed(&lookup, "FRONTMESH_RADIUS_FACTOR", d.radius_factor),
            point_tolerance: parsed(&lookup, "FRONTMESH_POINT_TOLERANCE", d.point_tolerance),
            max_quality_class: parsed(&lookup, "FRONTMESH_MAX_CLASS", d.max_quality_class),
            max_steps_per_entity: parsed(&lookup, "FRONTMESH_MAX_STEPS_PER_ENTITY", d.max_steps_per_entity),
            check_topology: parsed(&lookup, "FRONTMESH_CHECK_TOPOLOGY", d.check_topology),
            free_zone: FreeZoneTolerances {
                margin: parsed(&lookup, "FRONTMESH_FREEZONE_MARGIN", z.margin),
                zero_objective: parsed(&lookup, "FRONTMESH_FREEZONE_ZERO", z.zero_objective),
                stationarity: parsed(&lookup, "FRONTMESH_FREEZONE_STATIONARITY", z.stationarity),
                armijo: parsed(&lookup, "FRONTMESH_FREEZONE_ARMIJO", z.armijo),
                damping: parsed(&lookup, "FRONTMESH_FREEZONE_DAMPING", z.damping),
                max_iterations: parsed(&lookup, "FRONTMESH_FREEZONE_MAX_ITERATIONS", z.max_iterations),
                convexity: parsed(&lookup, "FRONTMESH_FREEZONE_CONVEXITY", z.convexity),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let config = MeshingConfig::from_lookup(|key| match key {
            "FRONTMESH_RADIUS_FACTOR" => Some("4.5".into()),
            "FRONTMESH_MAX_CLASS" => Some(" 12 ".into()),
            "FRONTMESH_CHECK_TOPOLOGY" => Some("true".into()),
            "FRONTMESH_FREEZONE_MAX_ITERATIONS" => Some("50".into()),
            "FRONTMESH_POINT_TOLERANCE" => Some("not a number".into()),
            _ => None,
        });
        assert_eq!(config.radius_factor, 4.5);
        assert_eq!(config.max_quality_class, 12);
        assert!(config.check_topology);
        assert_eq!(config.free_zone.max_iterations, 50);
        assert_eq!(config.point_tolerance, MeshingConfig::default().point_tolerance);
        assert_eq!(config.free_zone.margin, 1e-5);
    }

    #[test]
    fn empty_lookup_is_default() {
        assert_eq!(MeshingConfig::from_lookup(|_| None), MeshingConfig::default());
    }
}
