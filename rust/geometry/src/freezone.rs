// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Free-zone containment tests.
//!
//! A free zone is the region a rule needs to be empty before it may add its
//! elements. It is the union of one or more convex sets, each given by its
//! vertices. The facet structure of every set is derived once from the
//! rule's reference positions ([`FreeSetTopology`]); after the rule is fitted
//! to the front, the half-spaces are rebuilt from the moved vertices
//! ([`FreeZone`]).
//!
//! All tests shrink the zone by a margin `ε`: a point only counts as inside
//! when it lies at least `ε` inside every half-space of some set. Touching
//! the zone boundary is therefore allowed, which is what a neighbouring front
//! entity normally does.
//!
//! ## Triangle test
//!
//! Whether a triangle reaches into a convex set is decided by minimising
//!
//! ```text
//! f(λ) = Σ_i max(0, g_i(p(λ)) + ε)²
//! ```
//!
//! over the barycentric simplex `λ1, λ2 ≥ 0, λ1 + λ2 ≤ 1`, where `g_i` are
//! the facet functions and `p(λ) = p1 + λ1 (p2 - p1) + λ2 (p3 - p1)`. The
//! triangle reaches the shrunk set iff the minimum is zero. The minimiser is
//! an active-set projected Newton method with an Armijo line search.

use nalgebra::{Matrix2, Point, Point2, Point3, SVector, Vector2};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::geom::Aabb;
use crate::linalg::solve2;

/// Facet vertex indices, `D` entries each.
pub type Facet = SmallVec<[usize; 3]>;

/// Numerical settings of the free-zone tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeZoneTolerances {
    /// Shrink margin `ε` of the zone, in canonical units.
    pub margin: f64,
    /// Objective value treated as zero: the triangle reaches the set.
    pub zero_objective: f64,
    /// Stationarity threshold on `|projected gradient|² / f`.
    pub stationarity: f64,
    /// Sufficient-decrease constant of the line search.
    pub armijo: f64,
    /// Step reduction factor of the line search.
    pub damping: f64,
    pub max_iterations: usize,
    /// Relative slack when checking that a moved set is still convex.
    pub convexity: f64,
}

impl Default for FreeZoneTolerances {
    fn default() -> Self {
        Self {
            margin: 1e-5,
            zero_objective: 1e-12,
            stationarity: 1e-12,
            armijo: 1e-4,
            damping: 0.5,
            max_iterations: 1000,
            convexity: 1e-9,
        }
    }
}

/// Outcome of testing a front entity against a free zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// The entity stays outside the shrunk zone.
    Allowed,
    /// The entity reaches into the zone.
    Blocked,
    /// The minimiser stopped without an answer. Callers treat this as
    /// blocking.
    Undecided,
}

impl Verdict {
    /// `true` unless the entity is known to stay outside.
    pub fn blocks(self) -> bool {
        !matches!(self, Verdict::Allowed)
    }
}

/// Half-space `normal · x + offset <= 0` with unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfSpace<const D: usize> {
    pub normal: SVector<f64, D>,
    pub offset: f64,
}

impl<const D: usize> HalfSpace<D> {
    /// Plane through `D` points with the right-hand normal as outside.
    /// `None` if the points are degenerate.
    pub fn through(points: &[Point<f64, D>]) -> Option<Self> {
        if points.len() != D {
            return None;
        }
        let raw = facet_normal(points);
        let len = raw.norm();
        let scale = points
            .iter()
            .skip(1)
            .map(|p| (p - points[0]).norm())
            .fold(0.0_f64, f64::max);
        if len <= 1e-14 * scale.powi(D as i32 - 1).max(1e-300) {
            return None;
        }
        let normal = raw / len;
        Some(Self {
            normal,
            offset: -normal.dot(&points[0].coords),
        })
    }

    /// Signed distance, negative inside.
    #[inline]
    pub fn eval(&self, p: &Point<f64, D>) -> f64 {
        self.normal.dot(&p.coords) + self.offset
    }
}

/// Right-hand normal of a facet: rotated edge in 2D, cross product in 3D.
fn facet_normal<const D: usize>(points: &[Point<f64, D>]) -> SVector<f64, D> {
    match D {
        2 => {
            let d = points[1] - points[0];
            SVector::from_fn(|i, _| if i == 0 { d[1] } else { -d[0] })
        }
        3 => {
            let u = points[1] - points[0];
            let v = points[2] - points[0];
            SVector::from_fn(|i, _| {
                let (j, k) = ((i + 1) % 3, (i + 2) % 3);
                u[j] * v[k] - u[k] * v[j]
            })
        }
        _ => SVector::zeros(),
    }
}

fn combinations(n: usize, k: usize) -> Vec<Facet> {
    fn recurse(start: usize, n: usize, k: usize, current: &mut Facet, out: &mut Vec<Facet>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            recurse(i + 1, n, k, current, out);
            current.pop();
        }
    }
    let mut out = Vec::new();
    recurse(0, n, k, &mut Facet::new(), &mut out);
    out
}

/// Facet structure of one convex free set.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeSetTopology {
    /// Zone point indices belonging to the set.
    pub points: Vec<usize>,
    /// Hull facets as zone point indices, ordered so the right-hand normal
    /// points out of the set.
    pub facets: Vec<Facet>,
}

impl FreeSetTopology {
    /// Derives the hull facets of `set` from reference positions.
    ///
    /// Every `D`-subset whose plane has all other set points on one side is a
    /// facet. Fails if the set is flat.
    pub fn from_reference<const D: usize>(zone: &[Point<f64, D>], set: &[usize]) -> Result<Self> {
        let points: Vec<Point<f64, D>> = set
            .iter()
            .map(|&i| {
                zone.get(i).copied().ok_or(Error::IndexOutOfRange {
                    index: i,
                    len: zone.len(),
                })
            })
            .collect::<Result<_>>()?;
        let diameter = Aabb::from_points(&points).map(|b| b.diagonal()).unwrap_or(0.0);
        let tol = 1e-9 * diameter.max(1e-300);

        let mut facets = Vec::new();
        for combo in combinations(points.len(), D) {
            let corners: SmallVec<[Point<f64, D>; 3]> = combo.iter().map(|&i| points[i]).collect();
            let Some(plane) = HalfSpace::through(&corners) else {
                continue;
            };
            let (mut below, mut above) = (false, false);
            for (i, p) in points.iter().enumerate() {
                if combo.contains(&i) {
                    continue;
                }
                let s = plane.eval(p);
                below |= s < -tol;
                above |= s > tol;
            }
            let mut facet: Facet = combo.iter().map(|&i| set[i]).collect();
            match (below, above) {
                (true, false) => facets.push(facet),
                (false, true) => {
                    facet.swap(0, 1);
                    facets.push(facet);
                }
                _ => {}
            }
        }

        if facets.len() < D + 1 {
            return Err(Error::DegenerateFreeSet);
        }
        Ok(Self {
            points: set.to_vec(),
            facets,
        })
    }
}

/// One convex set after transformation.
#[derive(Debug, Clone)]
struct ConvexSet<const D: usize> {
    points: Vec<usize>,
    planes: Vec<HalfSpace<D>>,
    /// A facet collapsed under the transformation.
    degenerate: bool,
}

/// A transformed free zone ready for containment tests.
#[derive(Debug, Clone)]
pub struct FreeZone<const D: usize> {
    points: Vec<Point<f64, D>>,
    sets: Vec<ConvexSet<D>>,
    bounds: Aabb<D>,
    tolerances: FreeZoneTolerances,
}

impl<const D: usize> FreeZone<D> {
    /// Rebuilds the half-spaces of every set from the moved vertices.
    pub fn new(
        points: Vec<Point<f64, D>>,
        topology: &[FreeSetTopology],
        tolerances: FreeZoneTolerances,
    ) -> Result<Self> {
        let bounds = Aabb::from_points(&points).ok_or(Error::EmptyFreeZone)?;
        let mut sets = Vec::with_capacity(topology.len());
        for set in topology {
            let mut planes = Vec::with_capacity(set.facets.len());
            let mut degenerate = false;
            for facet in &set.facets {
                let corners: SmallVec<[Point<f64, D>; 3]> = facet
                    .iter()
                    .map(|&i| {
                        points.get(i).copied().ok_or(Error::IndexOutOfRange {
                            index: i,
                            len: points.len(),
                        })
                    })
                    .collect::<Result<_>>()?;
                match HalfSpace::through(&corners) {
                    Some(plane) => planes.push(plane),
                    None => degenerate = true,
                }
            }
            sets.push(ConvexSet {
                points: set.points.clone(),
                planes,
                degenerate,
            });
        }
        Ok(Self {
            points,
            sets,
            bounds,
            tolerances,
        })
    }

    pub fn points(&self) -> &[Point<f64, D>] {
        &self.points
    }

    pub fn bounds(&self) -> &Aabb<D> {
        &self.bounds
    }

    pub fn tolerances(&self) -> &FreeZoneTolerances {
        &self.tolerances
    }

    /// Checks that every set is still convex after the transformation: no
    /// facet collapsed and all set vertices lie inside all facet planes.
    pub fn is_convex(&self) -> bool {
        let slack = self.tolerances.convexity * self.bounds.diagonal().max(1.0);
        self.sets.iter().all(|set| {
            !set.degenerate
                && set
                    .points
                    .iter()
                    .all(|&i| set.planes.iter().all(|h| h.eval(&self.points[i]) <= slack))
        })
    }

    /// `true` if the shrunk box of `points` misses the zone's box.
    pub fn bounding_box_rejects(&self, points: &[Point<f64, D>]) -> bool {
        match Aabb::from_points(points) {
            Some(b) => !b.intersects(&self.bounds.expanded(-self.tolerances.margin)),
            None => true,
        }
    }

    /// `true` if `p` lies at least `ε` inside some set.
    pub fn contains_point(&self, p: &Point<f64, D>) -> bool {
        if self.bounding_box_rejects(std::slice::from_ref(p)) {
            return false;
        }
        let margin = self.tolerances.margin;
        self.sets
            .iter()
            .any(|set| set.planes.iter().all(|h| h.eval(p) + margin <= 0.0))
    }
}

impl FreeZone<2> {
    /// Tests a front line. The segment is clipped against the shrunk
    /// half-spaces of each set; a non-empty remainder blocks.
    pub fn segment_verdict(&self, a: &Point2<f64>, b: &Point2<f64>) -> Verdict {
        if self.bounding_box_rejects(&[*a, *b]) {
            return Verdict::Allowed;
        }
        let margin = self.tolerances.margin;
        if self.sets.iter().any(|set| clip_segment(&set.planes, a, b, margin)) {
            Verdict::Blocked
        } else {
            Verdict::Allowed
        }
    }
}

fn clip_segment(planes: &[HalfSpace<2>], a: &Point2<f64>, b: &Point2<f64>, margin: f64) -> bool {
    let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
    for h in planes {
        let ga = h.eval(a) + margin;
        let gb = h.eval(b) + margin;
        let d = gb - ga;
        if d.abs() < 1e-15 {
            if ga > 0.0 {
                return false;
            }
            continue;
        }
        let t = -ga / d;
        if d > 0.0 {
            hi = hi.min(t);
        } else {
            lo = lo.max(t);
        }
        if lo > hi {
            return false;
        }
    }
    true
}

/// Result of a triangle test with the work it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleTest {
    pub verdict: Verdict,
    /// Minimiser iterations summed over the sets.
    pub iterations: usize,
    /// Decided by the bounding-box check alone.
    pub bounding_box: bool,
}

impl FreeZone<3> {
    pub fn triangle_verdict(&self, p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> Verdict {
        self.classify_triangle(p1, p2, p3).verdict
    }

    /// Tests a triangle against every set. Allowed iff every set allows it;
    /// undecided if some set is undecided and none blocks.
    pub fn classify_triangle(&self, p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> TriangleTest {
        if self.bounding_box_rejects(&[*p1, *p2, *p3]) {
            return TriangleTest {
                verdict: Verdict::Allowed,
                iterations: 0,
                bounding_box: true,
            };
        }

        let mut iterations = 0;
        let mut undecided = false;
        for set in &self.sets {
            let (verdict, used) = triangle_in_set(&set.planes, [p1, p2, p3], &self.tolerances);
            iterations += used;
            match verdict {
                Verdict::Blocked => {
                    return TriangleTest {
                        verdict,
                        iterations,
                        bounding_box: false,
                    }
                }
                Verdict::Undecided => undecided = true,
                Verdict::Allowed => {}
            }
        }

        TriangleTest {
            verdict: if undecided { Verdict::Undecided } else { Verdict::Allowed },
            iterations,
            bounding_box: false,
        }
    }
}

/// Tests one convex set. Returns the verdict and the iterations used.
fn triangle_in_set(planes: &[HalfSpace<3>], tri: [&Point3<f64>; 3], tol: &FreeZoneTolerances) -> (Verdict, usize) {
    let margin = tol.margin;
    let values: SmallVec<[[f64; 3]; 8]> = planes
        .iter()
        .map(|h| [h.eval(tri[0]) + margin, h.eval(tri[1]) + margin, h.eval(tri[2]) + margin])
        .collect();

    // one plane separates the whole triangle
    if values.iter().any(|g| g.iter().all(|&v| v > 0.0)) {
        return (Verdict::Allowed, 0);
    }
    // a corner is inside
    if (0..3).any(|k| values.iter().all(|g| g[k] <= 0.0)) {
        return (Verdict::Blocked, 0);
    }

    let objective = Objective {
        terms: values
            .iter()
            .map(|g| (g[0], Vector2::new(g[1] - g[0], g[2] - g[0])))
            .collect(),
    };
    objective.minimize(tol)
}

/// `f(λ) = Σ max(0, b + a·λ)²`.
struct Objective {
    terms: SmallVec<[(f64, Vector2<f64>); 8]>,
}

/// Active-set threshold on the simplex constraints.
const ACTIVE: f64 = 1e-12;

/// Simplex constraints `w · λ + e >= 0`.
fn simplex_bounds() -> [(Vector2<f64>, f64); 3] {
    [
        (Vector2::new(1.0, 0.0), 0.0),
        (Vector2::new(0.0, 1.0), 0.0),
        (Vector2::new(-1.0, -1.0), 1.0),
    ]
}

/// Tangent cone projection of the steepest-descent direction.
enum Projected {
    /// No constraint restricts the direction.
    Free(Vector2<f64>),
    /// Restricted to the line of one active constraint with normal `w`.
    Edge(Vector2<f64>, Vector2<f64>),
    /// At a vertex where no descent is feasible.
    Stationary,
}

impl Objective {
    fn value(&self, lam: &Vector2<f64>) -> f64 {
        self.terms
            .iter()
            .map(|(b, a)| {
                let g = b + a.dot(lam);
                if g > 0.0 {
                    g * g
                } else {
                    0.0
                }
            })
            .sum()
    }

    fn derivatives(&self, lam: &Vector2<f64>) -> (f64, Vector2<f64>, Matrix2<f64>) {
        let mut f = 0.0;
        let mut grad = Vector2::zeros();
        let mut hess = Matrix2::zeros();
        for (b, a) in &self.terms {
            let g = b + a.dot(lam);
            if g > 0.0 {
                f += g * g;
                grad += a * (2.0 * g);
                hess += a * a.transpose() * 2.0;
            }
        }
        (f, grad, hess)
    }

    fn minimize(&self, tol: &FreeZoneTolerances) -> (Verdict, usize) {
        let bounds = simplex_bounds();
        let mut lam = Vector2::new(1.0 / 3.0, 1.0 / 3.0);

        for iteration in 0..tol.max_iterations {
            let (f, grad, hess) = self.derivatives(&lam);
            if f < tol.zero_objective {
                return (Verdict::Blocked, iteration);
            }

            let active: SmallVec<[Vector2<f64>; 3]> = bounds
                .iter()
                .filter(|(w, e)| w.dot(&lam) + e <= ACTIVE)
                .map(|(w, _)| *w)
                .collect();

            let projected = project_to_cone(-grad, &active);
            let pg = match &projected {
                Projected::Free(v) | Projected::Edge(v, _) => *v,
                Projected::Stationary => Vector2::zeros(),
            };
            if pg.norm_squared() <= tol.stationarity * f {
                return (Verdict::Allowed, iteration);
            }

            let newton = match projected {
                Projected::Free(_) => solve2(&hess, &-grad).ok(),
                Projected::Edge(_, w) => {
                    let t = Vector2::new(-w.y, w.x).normalize();
                    let curvature = t.dot(&(hess * t));
                    (curvature > 1e-15).then(|| t * (-grad.dot(&t) / curvature))
                }
                Projected::Stationary => None,
            };

            // Newton step if it descends and leaves room to move, else the
            // projected gradient.
            let mut direction = pg;
            let mut alpha_max = max_step(&lam, &pg, &bounds);
            if let Some(d) = newton {
                let room = max_step(&lam, &d, &bounds);
                if d.dot(&grad) < 0.0 && room > 1e-14 {
                    direction = d;
                    alpha_max = room;
                }
            }

            let slope = grad.dot(&direction);
            let mut alpha = alpha_max.min(1.0);
            let mut accepted = None;
            for _ in 0..64 {
                if alpha <= 0.0 {
                    break;
                }
                let candidate = lam + direction * alpha;
                if self.value(&candidate) <= f + tol.armijo * alpha * slope {
                    accepted = Some(candidate);
                    break;
                }
                alpha *= tol.damping;
            }

            match accepted {
                Some(next) => lam = clamp_to_simplex(next),
                // no descent left at machine precision: f > 0 is the minimum
                None => return (Verdict::Allowed, iteration + 1),
            }
        }

        (Verdict::Undecided, tol.max_iterations)
    }
}

fn project_to_cone(v: Vector2<f64>, active: &[Vector2<f64>]) -> Projected {
    let feasible = |d: &Vector2<f64>| active.iter().all(|w| w.dot(d) >= -1e-15);
    if feasible(&v) {
        return Projected::Free(v);
    }
    let mut best = Projected::Stationary;
    let mut best_dist = v.norm_squared();
    for w in active {
        let candidate = v - w * (w.dot(&v) / w.norm_squared());
        let dist = (v - candidate).norm_squared();
        if feasible(&candidate) && dist < best_dist {
            best_dist = dist;
            best = Projected::Edge(candidate, *w);
        }
    }
    best
}

/// Largest step along `d` that stays in the simplex.
fn max_step(lam: &Vector2<f64>, d: &Vector2<f64>, bounds: &[(Vector2<f64>, f64); 3]) -> f64 {
    bounds
        .iter()
        .filter_map(|(w, e)| {
            let rate = w.dot(d);
            (rate < -1e-15).then(|| ((w.dot(lam) + e) / -rate).max(0.0))
        })
        .fold(f64::INFINITY, f64::min)
}

fn clamp_to_simplex(lam: Vector2<f64>) -> Vector2<f64> {
    let mut out = lam.map(|x| x.max(0.0));
    let sum = out.x + out.y;
    if sum > 1.0 {
        out /= sum;
    }
    out
}

/// Entity test used by the rule matcher, generic over the front dimension.
pub trait ZoneQuery<const D: usize> {
    /// Verdict for a front entity given by its points in canonical
    /// coordinates.
    fn entity_verdict(&self, points: &[Point<f64, D>]) -> Verdict;
}

impl ZoneQuery<2> for FreeZone<2> {
    fn entity_verdict(&self, points: &[Point2<f64>]) -> Verdict {
        match points {
            [a, b] => self.segment_verdict(a, b),
            _ => Verdict::Undecided,
        }
    }
}

impl ZoneQuery<3> for FreeZone<3> {
    /// Triangles directly, quads as two triangles.
    fn entity_verdict(&self, points: &[Point3<f64>]) -> Verdict {
        if points.len() < 3 {
            return Verdict::Undecided;
        }
        let mut undecided = false;
        for i in 1..points.len() - 1 {
            match self.triangle_verdict(&points[0], &points[i], &points[i + 1]) {
                Verdict::Blocked => return Verdict::Blocked,
                Verdict::Undecided => undecided = true,
                Verdict::Allowed => {}
            }
        }
        if undecided {
            Verdict::Undecided
        } else {
            Verdict::Allowed
        }
    }
}
