// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The advancing loop shared by the surface and volume meshers.

use std::time::Instant;

use frontmesh_topology::{EntityId, EntityKind, EntityPoints, Front, LocalNeighborhood, PointId};
use nalgebra::Point3;
use smallvec::SmallVec;

use crate::config::MeshingConfig;
use crate::error::{Error, Result};
use crate::library::RuleLibrary;
use crate::matcher::RuleMatch;
use crate::mesh::{Element, Mesh};
use crate::rule::Rule;
use crate::stats::{MeshingStats, RuleUsage};

type TopologyError = frontmesh_topology::Error;

/// A rule match ready to be written into the front and the mesh.
#[derive(Debug, Clone)]
pub(crate) struct Accepted {
    pub locals: LocalNeighborhood,
    pub rule: usize,
    pub point_map: Vec<usize>,
    pub entity_map: Vec<usize>,
    /// New points in world coordinates.
    pub new_points: Vec<Point3<f64>>,
}

impl Accepted {
    pub fn new<const D: usize>(locals: LocalNeighborhood, found: RuleMatch<D>, new_points: Vec<Point3<f64>>) -> Self {
        Self {
            locals,
            rule: found.rule,
            point_map: found.point_map,
            entity_map: found.entity_map,
            new_points,
        }
    }
}

fn unmatched<K: EntityKind>(front: &Front<K>, steps: usize) -> Error {
    tracing::warn!(
        remaining = front.len(),
        steps,
        kind = K::NAME,
        "front could not be closed"
    );
    Error::UnmatchedBoundary {
        remaining: front.len(),
        steps,
    }
}

/// Consumes the front until it is empty.
///
/// `step` gets the selected base entity and returns the accepted rule
/// application, or `None` when no rule applies. `after_step` runs after every
/// successful step.
pub(crate) fn advance<K, S, A, const D: usize>(
    front: &mut Front<K>,
    mesh: &mut Mesh,
    library: &RuleLibrary<D>,
    config: &MeshingConfig,
    mut step: S,
    mut after_step: A,
) -> Result<MeshingStats>
where
    K: EntityKind,
    S: FnMut(&Front<K>, EntityId, &mut [RuleUsage]) -> Result<Option<Accepted>>,
    A: FnMut(&Front<K>) -> Result<()>,
{
    let started = Instant::now();
    front.set_start_front();

    let mut stats = MeshingStats {
        initial_front: front.len(),
        rules: library.usage_template(),
        ..MeshingStats::default()
    };
    let budget = config.max_steps_per_entity.saturating_mul(stats.initial_front);
    tracing::info!(
        kind = K::NAME,
        entities = stats.initial_front,
        rules = library.len(),
        "meshing started"
    );

    while let Some(base) = front.select() {
        if stats.steps >= budget {
            return Err(unmatched(front, stats.steps));
        }
        stats.steps += 1;
        let class = front.entity(base).map_or(1, |e| e.class);
        stats.max_class = stats.max_class.max(class);

        match step(front, base, &mut stats.rules)? {
            Some(accepted) => {
                let rule = library
                    .get(accepted.rule)
                    .ok_or_else(|| Error::invalid_rule(format!("#{}", accepted.rule), "not in library"))?;
                commit(front, mesh, rule, &accepted)?;
                after_step(front)?;
                tracing::debug!(
                    rule = rule.name(),
                    base = %base,
                    class,
                    front = front.len(),
                    "rule applied"
                );
            }
            None => {
                stats.failed_steps += 1;
                let class = front.increment_class(base)?;
                stats.max_class = stats.max_class.max(class);
                tracing::trace!(base = %base, class, "no rule applies");
                if class > config.max_quality_class {
                    return Err(unmatched(front, stats.steps));
                }
            }
        }
    }

    stats.remaining_front = front.len();
    stats.points = mesh.point_count();
    stats.elements = mesh.element_count();
    stats.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(
        kind = K::NAME,
        steps = stats.steps,
        failed = stats.failed_steps,
        points = stats.points,
        elements = stats.elements,
        elapsed_ms = stats.elapsed_ms,
        "meshing finished"
    );
    Ok(stats)
}

/// Writes one rule application. Point indices are resolved before any
/// entity is touched, since deleting entities may release points.
fn commit<K: EntityKind, const D: usize>(
    front: &mut Front<K>,
    mesh: &mut Mesh,
    rule: &Rule<D>,
    step: &Accepted,
) -> Result<()> {
    let locals = &step.locals;

    let mut consumed: SmallVec<[EntityId; 4]> = SmallVec::new();
    for (old, &local) in rule.old_entities().iter().zip(&step.entity_map) {
        if !old.delete {
            continue;
        }
        let id = locals.entity_ids[local];
        if front.entity(id).is_none() {
            return Err(TopologyError::EntityNotFound(id).into());
        }
        consumed.push(id);
    }

    let mut ids: Vec<PointId> = Vec::with_capacity(rule.point_count());
    let mut globals: Vec<usize> = Vec::with_capacity(rule.point_count());
    for &local in &step.point_map {
        let id = locals.points[local];
        let point = front.point(id).ok_or(TopologyError::PointNotFound(id))?;
        ids.push(id);
        globals.push(point.global_index);
    }
    for &position in &step.new_points {
        let global = mesh.add_point(position);
        ids.push(front.add_point(position, global));
        globals.push(global);
    }

    for entity in rule.new_entities() {
        let points: EntityPoints = entity.iter().map(|&i| ids[i]).collect();
        front.add_entity(&points, locals.surface)?;
    }
    for element in rule.elements() {
        mesh.add_element(Element {
            kind: element.kind,
            points: element.points.iter().map(|&i| globals[i]).collect(),
        });
    }

    // A new entity may have cancelled a consumed one already. Its key is
    // then stale even if the slot was reused.
    for id in consumed {
        if front.entity(id).is_some() {
            front.delete_entity(id)?;
        }
    }
    for &id in &locals.entity_ids {
        if front.entity(id).is_some() {
            front.reset_class(id)?;
        }
    }
    Ok(())
}
