// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Front lines for surface meshing.

use frontmesh_geometry::distance_to_segment;

use crate::front::{EntityKind, Front, FrontEntity};

/// Marker for a front of oriented lines, domain on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line;

/// Front of lines.
pub type LineFront = Front<Line>;

impl EntityKind for Line {
    const NAME: &'static str = "line";

    fn arity_ok(n: usize) -> bool {
        n == 2
    }

    /// Shortest line first.
    fn score(front: &Front<Self>, entity: &FrontEntity) -> f64 {
        match front.entity_positions(entity).as_slice() {
            [a, b] => (b - a).norm(),
            _ => f64::INFINITY,
        }
    }

    /// Lines closer than `radius` to the base line.
    fn is_relevant(front: &Front<Self>, base: &FrontEntity, other: &FrontEntity, radius: f64) -> bool {
        let base = front.entity_positions(base);
        let other = front.entity_positions(other);
        let ([a, b], [c, d]) = (base.as_slice(), other.as_slice()) else {
            return false;
        };
        let distance = distance_to_segment(c, a, b)
            .min(distance_to_segment(d, a, b))
            .min(distance_to_segment(a, c, d))
            .min(distance_to_segment(b, c, d));
        distance <= radius
    }
}
