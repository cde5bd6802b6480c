// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The advancing front.
//!
//! A [`Front`] holds the boundary between the meshed and the unmeshed part
//! of the domain: points, and entities (lines in 2D, triangles or quads in
//! 3D) referencing them. Both live in `SlotMap`s; deleting an entity
//! releases points no longer referenced, and freed slots are reused by later
//! insertions under a new key version, so stale ids stop resolving.
//!
//! Each point keeps its connectivity (number of referencing entities) and a
//! front number, the graph distance from the starting boundary. Each entity
//! keeps a quality class that grows while no rule can consume it.
//!
//! The dimension-specific parts (entity arity, selection score, relevance
//! test) come from the [`EntityKind`] parameter.

use std::marker::PhantomData;

use frontmesh_geometry::SurfaceId;
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::keys::{EntityId, PointId};

/// Front number of a point not yet reached from the starting boundary.
pub const UNSET_FRONT_NR: u32 = u32::MAX;

/// Point ids of a front entity.
pub type EntityPoints = SmallVec<[PointId; 4]>;

/// Entity points as indices into a [`LocalNeighborhood`].
pub type LocalEntity = SmallVec<[usize; 4]>;

/// A point on the front.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontPoint {
    pub position: Point3<f64>,
    /// Index of the point in the output mesh.
    pub global_index: usize,
    /// Number of front entities using this point.
    pub connectivity: u32,
    pub front_nr: u32,
}

/// A front line or face.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontEntity {
    /// Oriented so the unmeshed domain is on the left (lines) or on the
    /// right-hand normal side (faces).
    pub points: EntityPoints,
    pub surface: SurfaceId,
    /// Quality class, starting at 1.
    pub class: u32,
}

/// Dimension-specific behaviour of front entities.
pub trait EntityKind: Sized + Send + Sync + 'static {
    /// Human readable name used in messages.
    const NAME: &'static str;

    /// Whether an entity may have `n` points.
    fn arity_ok(n: usize) -> bool;

    /// Selection score within a quality class; lower is picked first.
    fn score(front: &Front<Self>, entity: &FrontEntity) -> f64;

    /// Whether `other` belongs to the neighbourhood of `base`.
    fn is_relevant(front: &Front<Self>, base: &FrontEntity, other: &FrontEntity, radius: f64) -> bool;
}

/// The neighbourhood of a selected base entity, renumbered compactly.
///
/// Local point `i` is `points[i]`. The base entity is `entities[0]` and
/// uses local points `0..n` in order.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalNeighborhood {
    pub base: EntityId,
    /// Quality class of the base entity.
    pub class: u32,
    pub surface: SurfaceId,
    pub points: Vec<PointId>,
    pub positions: Vec<Point3<f64>>,
    pub entities: Vec<LocalEntity>,
    pub entity_ids: Vec<EntityId>,
}

impl LocalNeighborhood {
    /// Number of points in the base entity.
    pub fn base_len(&self) -> usize {
        self.entities.first().map_or(0, |e| e.len())
    }
}

/// Points and entities of an advancing front.
#[derive(Debug, Clone)]
pub struct Front<K: EntityKind> {
    points: SlotMap<PointId, FrontPoint>,
    entities: SlotMap<EntityId, FrontEntity>,
    /// Entities by their sorted point ids.
    lookup: FxHashMap<SmallVec<[PointId; 4]>, EntityId>,
    /// Most points ever live at once.
    point_peak: usize,
    /// Most entities ever live at once.
    entity_peak: usize,
    _kind: PhantomData<K>,
}

impl<K: EntityKind> Default for Front<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// `b` is a cyclic rotation of `a`. Lines only match exactly.
fn same_cycle(a: &[PointId], b: &[PointId]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.len() < 3 {
        return a == b;
    }
    (0..a.len()).any(|r| (0..a.len()).all(|i| a[(i + r) % a.len()] == b[i]))
}

/// `b` is `a` traversed backwards, up to rotation.
fn reverse_cycle(a: &[PointId], b: &[PointId]) -> bool {
    let reversed: EntityPoints = b.iter().rev().copied().collect();
    same_cycle(a, &reversed)
}

fn sorted_key(points: &[PointId]) -> SmallVec<[PointId; 4]> {
    let mut key: SmallVec<[PointId; 4]> = points.iter().copied().collect();
    key.sort_unstable();
    key
}

impl<K: EntityKind> Front<K> {
    pub fn new() -> Self {
        Self {
            points: SlotMap::with_key(),
            entities: SlotMap::with_key(),
            lookup: FxHashMap::default(),
            point_peak: 0,
            entity_peak: 0,
            _kind: PhantomData,
        }
    }

    /// Adds a point that is not yet referenced by any entity.
    pub fn add_point(&mut self, position: Point3<f64>, global_index: usize) -> PointId {
        let id = self.points.insert(FrontPoint {
            position,
            global_index,
            connectivity: 0,
            front_nr: UNSET_FRONT_NR,
        });
        self.point_peak = self.point_peak.max(self.points.len());
        id
    }

    /// Adds an entity over existing points.
    ///
    /// If the reverse entity is already on the front, both cancel out: the
    /// existing one is deleted and `None` is returned.
    pub fn add_entity(&mut self, points: &[PointId], surface: SurfaceId) -> Result<Option<EntityId>> {
        if !K::arity_ok(points.len()) {
            return Err(Error::DegenerateEntity(format!(
                "{} with {} points",
                K::NAME,
                points.len()
            )));
        }
        for (i, p) in points.iter().enumerate() {
            if !self.points.contains_key(*p) {
                return Err(Error::PointNotFound(*p));
            }
            if points[..i].contains(p) {
                return Err(Error::DegenerateEntity(format!("{} repeats {}", K::NAME, p)));
            }
        }

        let key = sorted_key(points);
        if let Some(&existing) = self.lookup.get(&key) {
            let other = self
                .entities
                .get(existing)
                .ok_or(Error::EntityNotFound(existing))?;
            if reverse_cycle(&other.points, points) {
                self.delete_entity(existing)?;
                return Ok(None);
            }
            if same_cycle(&other.points, points) {
                return Err(Error::DuplicateEntity(existing));
            }
        }

        let nearest = points
            .iter()
            .filter_map(|&p| self.points.get(p))
            .map(|p| p.front_nr)
            .min()
            .unwrap_or(UNSET_FRONT_NR);
        for &p in points {
            if let Some(point) = self.points.get_mut(p) {
                point.connectivity += 1;
                point.front_nr = point.front_nr.min(nearest.saturating_add(1));
            }
        }

        let id = self.entities.insert(FrontEntity {
            points: points.iter().copied().collect(),
            surface,
            class: 1,
        });
        self.entity_peak = self.entity_peak.max(self.entities.len());
        self.lookup.insert(key, id);
        Ok(Some(id))
    }

    /// Removes an entity. Points left without entities are removed too.
    pub fn delete_entity(&mut self, id: EntityId) -> Result<FrontEntity> {
        let entity = self.entities.remove(id).ok_or(Error::EntityNotFound(id))?;
        let key = sorted_key(&entity.points);
        if self.lookup.get(&key) == Some(&id) {
            self.lookup.remove(&key);
        }
        for &p in &entity.points {
            let orphaned = match self.points.get_mut(p) {
                Some(point) => {
                    point.connectivity = point.connectivity.saturating_sub(1);
                    point.connectivity == 0
                }
                None => false,
            };
            if orphaned {
                self.points.remove(p);
            }
        }
        Ok(entity)
    }

    pub fn increment_class(&mut self, id: EntityId) -> Result<u32> {
        let entity = self.entities.get_mut(id).ok_or(Error::EntityNotFound(id))?;
        entity.class += 1;
        Ok(entity.class)
    }

    pub fn reset_class(&mut self, id: EntityId) -> Result<()> {
        let entity = self.entities.get_mut(id).ok_or(Error::EntityNotFound(id))?;
        entity.class = 1;
        Ok(())
    }

    /// Marks every point of the current front as front number 0.
    pub fn set_start_front(&mut self) {
        let on_front: Vec<PointId> = self
            .entities
            .values()
            .flat_map(|e| e.points.iter().copied())
            .collect();
        for id in on_front {
            if let Some(point) = self.points.get_mut(id) {
                point.front_nr = 0;
            }
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of entities on the front.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Entity slots allocated so far, live or free. Freed slots are
    /// reused before new ones are appended, so this is the most entities
    /// ever live at once.
    pub fn entity_slots(&self) -> usize {
        self.entity_peak
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Point slots allocated so far, live or free.
    pub fn point_slots(&self) -> usize {
        self.point_peak
    }

    pub fn point(&self, id: PointId) -> Option<&FrontPoint> {
        self.points.get(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&FrontEntity> {
        self.entities.get(id)
    }

    pub fn position(&self, id: PointId) -> Option<Point3<f64>> {
        self.points.get(id).map(|p| p.position)
    }

    pub fn points(&self) -> impl Iterator<Item = (PointId, &FrontPoint)> {
        self.points.iter()
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &FrontEntity)> {
        self.entities.iter()
    }

    /// Smallest front number among the entity's points.
    pub fn min_front_nr(&self, entity: &FrontEntity) -> u32 {
        entity
            .points
            .iter()
            .filter_map(|&p| self.points.get(p))
            .map(|p| p.front_nr)
            .min()
            .unwrap_or(UNSET_FRONT_NR)
    }

    /// Positions of an entity's points.
    pub fn entity_positions(&self, entity: &FrontEntity) -> SmallVec<[Point3<f64>; 4]> {
        entity
            .points
            .iter()
            .filter_map(|&p| self.points.get(p))
            .map(|p| p.position)
            .collect()
    }

    /// Picks the next entity to work on: lowest quality class first, then
    /// the kind's score, then front number, then key order.
    pub fn select(&self) -> Option<EntityId> {
        self.entities
            .iter()
            .map(|(i, e)| (e.class, K::score(self, e), self.min_front_nr(e), i))
            .min_by(|a, b| {
                a.0.cmp(&b.0)
                    .then(a.1.total_cmp(&b.1))
                    .then(a.2.cmp(&b.2))
                    .then(a.3.cmp(&b.3))
            })
            .map(|(.., id)| id)
    }

    /// Selects the base entity and collects its neighbourhood within
    /// `radius`. `None` once the front is empty.
    pub fn get_locals(&self, radius: f64) -> Option<LocalNeighborhood> {
        self.locals_of(self.select()?, radius)
    }

    /// Collects the neighbourhood of a given base entity. The base points
    /// come first, then points of relevant entities in first-seen order.
    pub fn locals_of(&self, base_id: EntityId, radius: f64) -> Option<LocalNeighborhood> {
        let base = self.entities.get(base_id)?;

        let mut remap: FxHashMap<PointId, usize> = FxHashMap::default();
        let mut points = Vec::new();
        let mut positions = Vec::new();
        let mut local_index = |id: PointId, points: &mut Vec<PointId>, positions: &mut Vec<Point3<f64>>| {
            *remap.entry(id).or_insert_with(|| {
                points.push(id);
                positions.push(self.points.get(id).map_or_else(Point3::origin, |p| p.position));
                points.len() - 1
            })
        };

        let mut entities = Vec::new();
        let mut entity_ids = Vec::new();

        let base_local: LocalEntity = base
            .points
            .iter()
            .map(|&p| local_index(p, &mut points, &mut positions))
            .collect();
        entities.push(base_local);
        entity_ids.push(base_id);

        for (id, other) in self.entities.iter() {
            if id == base_id || !K::is_relevant(self, base, other, radius) {
                continue;
            }
            let local: LocalEntity = other
                .points
                .iter()
                .map(|&p| local_index(p, &mut points, &mut positions))
                .collect();
            entities.push(local);
            entity_ids.push(id);
        }

        Some(LocalNeighborhood {
            base: base_id,
            class: base.class,
            surface: base.surface,
            points,
            positions,
            entities,
            entity_ids,
        })
    }
}
