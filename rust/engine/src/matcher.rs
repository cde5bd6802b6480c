// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule matching against a local front neighbourhood.
//!
//! For every rule, in ascending quality, the matcher searches topological
//! maps of the rule's old entities onto the local entities. A map is
//! accepted when the mapped points are within tolerance, the moved free zone
//! is convex and empty of unmapped front geometry, and every new element has
//! positive measure. The first accepted map wins.

use frontmesh_core::{EntityPoints, OldEntity};
use frontmesh_geometry::{FreeZone, PlaneFrame, SolidFrame, ZoneQuery};
use frontmesh_topology::LocalEntity;
use nalgebra::{Point, Point3};
use smallvec::{smallvec, SmallVec};

use crate::config::MeshingConfig;
use crate::library::RuleLibrary;
use crate::mesh::ElementKind;
use crate::rule::Rule;
use crate::stats::RuleUsage;

/// The local points seen from one placement of the base entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<const D: usize> {
    /// Local points in canonical coordinates.
    pub positions: Vec<Point<f64, D>>,
    /// Local indices of the base entity points, in rule order.
    pub base_map: SmallVec<[usize; 4]>,
}

impl Candidate<2> {
    /// Local points projected into the plane frame of a base line.
    pub fn in_plane(frame: &PlaneFrame, world: &[Point3<f64>]) -> Self {
        Self {
            positions: world.iter().map(|p| frame.to_plane(p)).collect(),
            base_map: smallvec![0, 1],
        }
    }
}

impl Candidate<3> {
    /// One candidate per rotation of the base face, each in the frame of its
    /// first three points. Rotations with a degenerate frame are skipped.
    pub fn face_rotations(world: &[Point3<f64>], base_len: usize, h: f64) -> Vec<(SolidFrame, Self)> {
        if base_len < 3 || world.len() < base_len {
            return Vec::new();
        }
        (0..base_len)
            .filter_map(|r| {
                let at = |i: usize| &world[(r + i) % base_len];
                let frame = SolidFrame::new(at(0), at(1), at(2), h).ok()?;
                let candidate = Self {
                    positions: world.iter().map(|p| frame.to_local(p)).collect(),
                    base_map: (0..base_len).map(|i| (r + i) % base_len).collect(),
                };
                Some((frame, candidate))
            })
            .collect()
    }
}

/// Everything the matcher needs about one base entity.
#[derive(Debug, Clone, Copy)]
pub struct MatchInput<'a, const D: usize> {
    pub candidates: &'a [Candidate<D>],
    /// Local entities; entry 0 is the base.
    pub entities: &'a [LocalEntity],
    /// Quality class of the base entity.
    pub class: u32,
}

/// An accepted rule application.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<const D: usize> {
    /// Index of the rule in the library.
    pub rule: usize,
    /// Index of the candidate the rule matched in.
    pub candidate: usize,
    /// Local point of every old rule point.
    pub point_map: Vec<usize>,
    /// Local entity of every old rule entity.
    pub entity_map: Vec<usize>,
    /// New points in the candidate's canonical coordinates.
    pub new_points: Vec<Point<f64, D>>,
}

/// Backtracking state of the topological search.
struct Search<'r> {
    old_entities: &'r [OldEntity],
    local_entities: &'r [LocalEntity],
    point_map: Vec<Option<usize>>,
    point_used: Vec<bool>,
    entity_map: Vec<usize>,
    entity_used: Vec<bool>,
}

type Visit<'v> = dyn FnMut(&[usize], &[usize]) -> bool + 'v;

impl<'r> Search<'r> {
    /// Starts with the base entity fixed onto local entity 0.
    fn new<const D: usize>(rule: &'r Rule<D>, candidate: &Candidate<D>, local_entities: &'r [LocalEntity]) -> Self {
        let mut search = Self {
            old_entities: rule.old_entities(),
            local_entities,
            point_map: vec![None; rule.old_points().len()],
            point_used: vec![false; candidate.positions.len()],
            entity_map: vec![0; rule.old_entities().len()],
            entity_used: vec![false; local_entities.len()],
        };
        for (i, &local) in candidate.base_map.iter().enumerate() {
            search.point_map[i] = Some(local);
            search.point_used[local] = true;
        }
        if let Some(used) = search.entity_used.first_mut() {
            *used = true;
        }
        search
    }

    /// Calls `visit` for every complete map until it returns `true`.
    fn run(&mut self, visit: &mut Visit<'_>) -> bool {
        self.entities(1, visit)
    }

    fn entities(&mut self, next: usize, visit: &mut Visit<'_>) -> bool {
        let old_entities = self.old_entities;
        let Some(old) = old_entities.get(next) else {
            let pending: SmallVec<[usize; 4]> = (0..self.point_map.len())
                .filter(|&i| self.point_map[i].is_none())
                .collect();
            return self.isolated(&pending, 0, visit);
        };
        let n = old.points.len();
        // lines keep their direction, faces may start anywhere
        let rotations = if n == 2 { 1 } else { n };

        let locals = self.local_entities;
        for (e, local) in locals.iter().enumerate() {
            if self.entity_used[e] || local.len() != n {
                continue;
            }
            for r in 0..rotations {
                let mut assigned: SmallVec<[usize; 4]> = SmallVec::new();
                if self.assign(&old.points, local, r, &mut assigned) {
                    self.entity_used[e] = true;
                    self.entity_map[next] = e;
                    if self.entities(next + 1, visit) {
                        return true;
                    }
                    self.entity_used[e] = false;
                }
                self.unassign(&assigned);
            }
        }
        false
    }

    fn assign(&mut self, old: &[usize], local: &[usize], rotation: usize, assigned: &mut SmallVec<[usize; 4]>) -> bool {
        let n = old.len();
        for (i, &op) in old.iter().enumerate() {
            let lp = local[(i + rotation) % n];
            match self.point_map[op] {
                Some(mapped) if mapped == lp => {}
                Some(_) => return false,
                None if self.point_used[lp] => return false,
                None => {
                    self.point_map[op] = Some(lp);
                    self.point_used[lp] = true;
                    assigned.push(op);
                }
            }
        }
        true
    }

    fn unassign(&mut self, assigned: &[usize]) {
        for &op in assigned {
            if let Some(lp) = self.point_map[op].take() {
                self.point_used[lp] = false;
            }
        }
    }

    /// Old points outside every old entity go onto unused local points.
    fn isolated(&mut self, pending: &[usize], next: usize, visit: &mut Visit<'_>) -> bool {
        let Some(&op) = pending.get(next) else {
            let point_map: Vec<usize> = self.point_map.iter().flatten().copied().collect();
            return visit(&point_map, &self.entity_map);
        };
        for lp in 0..self.point_used.len() {
            if self.point_used[lp] {
                continue;
            }
            self.point_map[op] = Some(lp);
            self.point_used[lp] = true;
            if self.isolated(pending, next + 1, visit) {
                return true;
            }
            self.point_map[op] = None;
            self.point_used[lp] = false;
        }
        false
    }
}

/// Same points in the same cyclic order. Lines must match exactly.
fn same_cycle(a: &[usize], b: &[usize]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.len() < 3 {
        return a == b;
    }
    (0..a.len()).any(|r| (0..a.len()).all(|i| a[(i + r) % a.len()] == b[i]))
}

/// A new entity over old points only would duplicate a front entity with
/// the same orientation. Applying the rule would fold the mesh over it.
fn repeats_front_entity(new_entities: &[EntityPoints], point_map: &[usize], entities: &[LocalEntity]) -> bool {
    new_entities.iter().any(|new| {
        let local: Option<LocalEntity> = new.iter().map(|&i| point_map.get(i).copied()).collect();
        local.is_some_and(|local| entities.iter().any(|e| same_cycle(e, &local)))
    })
}

/// Applies a rule library to local neighbourhoods.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatcher<'a, const D: usize> {
    library: &'a RuleLibrary<D>,
    config: &'a MeshingConfig,
}

impl<'a, const D: usize> RuleMatcher<'a, D>
where
    FreeZone<D>: ZoneQuery<D>,
{
    pub fn new(library: &'a RuleLibrary<D>, config: &'a MeshingConfig) -> Self {
        Self { library, config }
    }

    /// Finds the first rule, in quality order, that applies to the input.
    ///
    /// `usage` holds one counter set per library rule and is updated for
    /// every rule tried.
    pub fn apply(&self, input: &MatchInput<'_, D>, usage: &mut [RuleUsage]) -> Option<RuleMatch<D>> {
        for (index, rule) in self.library.rules().iter().enumerate() {
            if rule.quality() > input.class {
                break;
            }
            let mut counters = RuleUsage::default();
            let found = input
                .candidates
                .iter()
                .enumerate()
                .filter(|(_, candidate)| candidate.base_map.len() == rule.base_len())
                .find_map(|(c, candidate)| self.match_candidate(index, rule, c, candidate, input, &mut counters));
            if let Some(total) = usage.get_mut(index) {
                total.add(&counters);
            }
            if found.is_some() {
                tracing::trace!(rule = rule.name(), class = input.class, "rule accepted");
                return found;
            }
        }
        None
    }

    fn match_candidate(
        &self,
        index: usize,
        rule: &Rule<D>,
        c: usize,
        candidate: &Candidate<D>,
        input: &MatchInput<'_, D>,
        counters: &mut RuleUsage,
    ) -> Option<RuleMatch<D>> {
        let mut accepted = None;
        let mut search = Search::new(rule, candidate, input.entities);
        search.run(&mut |point_map: &[usize], entity_map: &[usize]| {
            match self.evaluate(rule, candidate, input, point_map, entity_map, counters) {
                Some(new_points) => {
                    accepted = Some(RuleMatch {
                        rule: index,
                        candidate: c,
                        point_map: point_map.to_vec(),
                        entity_map: entity_map.to_vec(),
                        new_points,
                    });
                    true
                }
                None => false,
            }
        });
        accepted
    }

    /// Geometric checks of one complete topological map.
    fn evaluate(
        &self,
        rule: &Rule<D>,
        candidate: &Candidate<D>,
        input: &MatchInput<'_, D>,
        point_map: &[usize],
        entity_map: &[usize],
        counters: &mut RuleUsage,
    ) -> Option<Vec<Point<f64, D>>> {
        counters.mapped += 1;
        let positions = &candidate.positions;

        let limit = self.config.point_tolerance * self.library.tolerance_factor() * f64::from(input.class);
        let matched: Vec<Point<f64, D>> = point_map.iter().map(|&l| positions[l]).collect();
        if !matched
            .iter()
            .enumerate()
            .all(|(i, p)| rule.check_point_tolerance(i, p, limit))
        {
            return None;
        }
        counters.tolerated += 1;

        if repeats_front_entity(rule.new_entities(), point_map, input.entities) {
            return None;
        }

        let u = rule.fit(&matched).ok()?;
        let instance = rule.instantiate(&u, self.config.free_zone).ok()?;
        if !instance.convex_free_zone() {
            return None;
        }
        let zone = &instance.free_zone;

        let mut point_mapped = vec![false; positions.len()];
        for &l in point_map {
            point_mapped[l] = true;
        }
        for (p, &mapped) in positions.iter().zip(&point_mapped) {
            if !mapped && zone.contains_point(p) {
                return None;
            }
        }

        let mut entity_mapped = vec![false; input.entities.len()];
        for &e in entity_map {
            entity_mapped[e] = true;
        }
        for (entity, &mapped) in input.entities.iter().zip(&entity_mapped) {
            if mapped {
                continue;
            }
            let corners: SmallVec<[Point<f64, D>; 4]> = entity.iter().map(|&l| positions[l]).collect();
            if zone.entity_verdict(&corners).blocks() {
                return None;
            }
        }

        let all: Vec<Point<f64, D>> = matched.iter().chain(&instance.new_points).copied().collect();
        let positive = |kind: ElementKind, indices: &[usize]| {
            let corners: SmallVec<[Point<f64, D>; 6]> = indices.iter().map(|&i| all[i]).collect();
            kind.is_positive(&corners)
        };
        if !rule.elements().iter().all(|e| positive(e.kind, &e.points)) {
            return None;
        }
        if !rule
            .orientations()
            .iter()
            .all(|tet| positive(ElementKind::Tetrahedron, tet))
        {
            return None;
        }

        counters.used += 1;
        Some(instance.new_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Vector3};

    const FREE_ONLY: &str = r#"
rule "Free Triangle"
quality 1
mappoints (0, 0); (1, 0) { 1.0, 0, 1.0 };
maplines (1, 2) del;
newpoints (0.5, 0.866) { 0.5 X2 } { };
newlines (1, 3); (3, 2);
freearea (0, 0); (1, 0) { 1 X2 } { }; (1.5, 0.7) { 1 X2 } { }; (0.5, 1.5) { 0.5 X2 } { }; (-0.5, 0.7);
elements (1, 2, 3);
endrule
"#;

    fn planar(points: &[(f64, f64)]) -> Candidate<2> {
        Candidate {
            positions: points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
            base_map: smallvec![0, 1],
        }
    }

    fn lines(pairs: &[(usize, usize)]) -> Vec<LocalEntity> {
        pairs.iter().map(|&(a, b)| smallvec![a, b]).collect()
    }

    fn regular_tetrahedron() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3f64.sqrt() / 2.0, 0.0),
            Point3::new(0.5, 3f64.sqrt() / 6.0, (2.0f64 / 3.0).sqrt()),
        ]
    }

    fn faces(list: &[[usize; 3]]) -> Vec<LocalEntity> {
        list.iter().map(|f| f.iter().copied().collect()).collect()
    }

    #[test]
    fn square_corner_takes_right_60() {
        let library = RuleLibrary::builtin_triangles().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])];
        let entities = lines(&[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };
        let mut usage = library.usage_template();

        let found = matcher.apply(&input, &mut usage).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Right 60");
        assert_eq!(found.point_map, vec![0, 1, 2]);
        assert_eq!(found.entity_map, vec![0, 1]);
        assert!(found.new_points.is_empty());

        // the closing rule has no matching line from the third point back
        assert_eq!(usage[0].mapped, 0);
        assert_eq!((usage[1].mapped, usage[1].tolerated, usage[1].used), (1, 1, 1));
        assert!(usage[2..].iter().all(|u| u.mapped == 0));
    }

    #[test]
    fn lone_line_gets_free_triangle() {
        let library = RuleLibrary::builtin_triangles().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0)])];
        let entities = lines(&[(0, 1)]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };
        let mut usage = library.usage_template();

        let found = matcher.apply(&input, &mut usage).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Free Triangle");
        assert_relative_eq!(found.new_points[0], Point2::new(0.5, 0.866), epsilon = 1e-12);
    }

    #[test]
    fn facing_front_point_is_joined() {
        let library = RuleLibrary::builtin_triangles().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0), (0.7, 0.6), (0.3, 0.6)])];
        let entities = lines(&[(0, 1), (2, 3)]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };

        let found = matcher.apply(&input, &mut library.usage_template()).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Vis A Vis");
        assert_eq!(found.point_map, vec![0, 1, 2]);
        assert_eq!(found.entity_map, vec![0]);
        assert!(found.new_points.is_empty());
    }

    #[test]
    fn blocked_zone_waits_for_higher_class() {
        let library = RuleLibrary::builtin_triangles().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        // a long line overhead whose ends are far from the base
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0), (2.5, 0.6), (-1.5, 0.6)])];
        let entities = lines(&[(0, 1), (2, 3)]);
        let mut usage = library.usage_template();

        let at = |class| MatchInput {
            candidates: &candidates,
            entities: &entities,
            class,
        };
        assert!(matcher.apply(&at(1), &mut usage).is_none());
        assert_eq!((usage[5].mapped, usage[5].tolerated), (2, 0));
        assert_eq!((usage[6].mapped, usage[6].tolerated, usage[6].used), (1, 1, 0));
        assert!(matcher.apply(&at(3), &mut usage).is_none());

        let found = matcher.apply(&at(5), &mut usage).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Vis A Vis (5)");
        assert_eq!(found.point_map, vec![0, 1, 2]);
    }

    #[test]
    fn point_inside_zone_blocks() {
        let library: RuleLibrary<2> = FREE_ONLY.parse().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0), (0.5, 0.4)])];
        // the third point belongs to no local entity
        let entities = lines(&[(0, 1)]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 10,
        };
        assert!(matcher.apply(&input, &mut library.usage_template()).is_none());
    }

    #[test]
    fn point_inside_zone_is_joined_by_builtin_rules() {
        let library = RuleLibrary::builtin_triangles().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0), (0.5, 0.4)])];
        let entities = lines(&[(0, 1)]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };

        let found = matcher.apply(&input, &mut library.usage_template()).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Vis A Vis");
        assert!(found.new_points.is_empty());
    }

    #[test]
    fn existing_line_in_same_direction_is_not_repeated() {
        let entities = lines(&[(0, 1), (1, 2), (0, 2)]);
        let new: Vec<EntityPoints> = vec![smallvec![0, 2]];
        assert!(repeats_front_entity(&new, &[0, 1, 2], &entities));
        // the reverse line cancels instead
        let reverse: Vec<EntityPoints> = vec![smallvec![2, 0]];
        assert!(!repeats_front_entity(&reverse, &[0, 1, 2], &entities));
        // lines to new points never repeat
        let fresh: Vec<EntityPoints> = vec![smallvec![0, 3]];
        assert!(!repeats_front_entity(&fresh, &[0, 1, 2], &entities));

        // faces match in any rotation
        let shell = faces(&[[0, 1, 2], [1, 3, 2]]);
        let rotated: Vec<EntityPoints> = vec![smallvec![3, 2, 1]];
        assert!(repeats_front_entity(&rotated, &[0, 1, 2, 3], &shell));
        let flipped: Vec<EntityPoints> = vec![smallvec![1, 2, 3]];
        assert!(!repeats_front_entity(&flipped, &[0, 1, 2, 3], &shell));
    }

    #[test]
    fn square_corner_with_diagonal_skips_right_60() {
        let library = RuleLibrary::builtin_triangles().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let candidates = [planar(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])];
        // a line from the base start to the far corner already runs the
        // same way as the one Right 60 would add
        let entities = lines(&[(0, 1), (1, 2), (0, 2)]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };
        let mut usage = library.usage_template();

        let found = matcher.apply(&input, &mut usage);
        assert_eq!((usage[1].tolerated, usage[1].used), (1, 0));
        assert!(found.map_or(true, |m| library.rules()[m.rule].name() != "Right 60"));
    }

    #[test]
    fn tetrahedron_hole_is_closed() {
        let library = RuleLibrary::builtin_tetrahedra().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let (_, candidates): (Vec<_>, Vec<_>) = Candidate::face_rotations(&regular_tetrahedron(), 3, 1.0)
            .into_iter()
            .unzip();
        assert_eq!(candidates.len(), 3);
        let entities = faces(&[[0, 1, 2], [0, 3, 1], [1, 3, 2], [2, 3, 0]]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };

        let found = matcher.apply(&input, &mut library.usage_template()).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Close Tetrahedron");
        assert_eq!(found.candidate, 0);
        assert_eq!(found.point_map, vec![0, 1, 2, 3]);
        assert_eq!(found.entity_map, vec![0, 1, 2, 3]);
    }

    #[test]
    fn base_face_rotation_is_searched() {
        let library = RuleLibrary::builtin_tetrahedra().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let (frames, candidates): (Vec<_>, Vec<_>) = Candidate::face_rotations(&regular_tetrahedron(), 3, 1.0)
            .into_iter()
            .unzip();
        // the face (0, 3, 1) is missing, so only the rotation starting at
        // point 1 lines the rule up with the two side faces
        let entities = faces(&[[0, 1, 2], [1, 3, 2], [2, 3, 0]]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };

        let found = matcher.apply(&input, &mut library.usage_template()).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Three Faces");
        assert_eq!(found.candidate, 1);
        assert_eq!(found.point_map, vec![1, 2, 0, 3]);
        assert_relative_eq!(frames[1].normal(), Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn lone_face_gets_free_tetrahedron() {
        let library = RuleLibrary::builtin_tetrahedra().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let world = &regular_tetrahedron()[..3];
        let (_, candidates): (Vec<_>, Vec<_>) = Candidate::face_rotations(world, 3, 1.0).into_iter().unzip();
        let entities = faces(&[[0, 1, 2]]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };

        let found = matcher.apply(&input, &mut library.usage_template()).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Free Tetrahedron");
        let apex = found.new_points[0];
        assert_relative_eq!(apex.z, 0.8165, epsilon = 1e-12);
        assert_relative_eq!(apex.x, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn point_above_face_is_joined() {
        let library = RuleLibrary::builtin_tetrahedra().unwrap();
        let config = MeshingConfig::default();
        let matcher = RuleMatcher::new(&library, &config);
        let (_, candidates): (Vec<_>, Vec<_>) = Candidate::face_rotations(&regular_tetrahedron(), 3, 1.0)
            .into_iter()
            .unzip();
        // the apex belongs to no face yet
        let entities = faces(&[[0, 1, 2]]);
        let input = MatchInput {
            candidates: &candidates,
            entities: &entities,
            class: 1,
        };

        let found = matcher.apply(&input, &mut library.usage_template()).unwrap();
        assert_eq!(library.rules()[found.rule].name(), "Vis A Vis Point");
        assert_eq!(found.candidate, 0);
        assert_eq!(found.point_map, vec![0, 1, 2, 3]);
        assert!(found.new_points.is_empty());
    }

    #[test]
    fn degenerate_base_has_no_candidates() {
        let flat = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert!(Candidate::face_rotations(&flat, 3, 1.0).is_empty());
        assert!(Candidate::face_rotations(&flat[..2], 3, 1.0).is_empty());
    }
}
