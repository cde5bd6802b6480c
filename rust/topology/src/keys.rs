// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key types for front storage.
//!
//! Points and entities live in `slotmap::SlotMap`s. Freed slots are reused
//! before a map grows, and every reuse bumps the slot's version, so a key
//! held past the deletion of its item no longer resolves, even when a later
//! insertion took over the slot.

use std::fmt;

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Key of a front point.
    pub struct PointId;

    /// Key of a front entity (line or face).
    pub struct EntityId;
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "point {:?}", self.data())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity {:?}", self.data())
    }
}
