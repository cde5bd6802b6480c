// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Meshing statistics, returned by value from the drivers.

use serde::Serialize;

/// Per-rule counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleUsage {
    pub name: String,
    /// Topological maps found onto a local neighbourhood.
    pub mapped: usize,
    /// Maps whose points were within tolerance.
    pub tolerated: usize,
    /// Times the rule was applied.
    pub used: usize,
}

impl RuleUsage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add(&mut self, other: &RuleUsage) {
        self.mapped += other.mapped;
        self.tolerated += other.tolerated;
        self.used += other.used;
    }
}

/// Summary of one meshing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshingStats {
    /// Base entities processed, successful or not.
    pub steps: usize,
    /// Steps where no rule applied and the class was raised.
    pub failed_steps: usize,
    pub initial_front: usize,
    pub remaining_front: usize,
    pub points: usize,
    pub elements: usize,
    /// Highest quality class reached by any base entity.
    pub max_class: u32,
    pub elapsed_ms: u64,
    pub rules: Vec<RuleUsage>,
}

impl MeshingStats {
    /// Adds the counters of another run, rule by rule.
    pub fn merge(&mut self, other: &MeshingStats) {
        self.steps += other.steps;
        self.failed_steps += other.failed_steps;
        self.initial_front += other.initial_front;
        self.remaining_front += other.remaining_front;
        self.points += other.points;
        self.elements += other.elements;
        self.max_class = self.max_class.max(other.max_class);
        self.elapsed_ms = self.elapsed_ms.max(other.elapsed_ms);
        for usage in &other.rules {
            match self.rules.iter_mut().find(|r| r.name == usage.name) {
                Some(mine) => mine.add(usage),
                None => self.rules.push(usage.clone()),
            }
        }
    }
}
