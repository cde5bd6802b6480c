// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # FrontMesh Core
//!
//! Rule-file parser for advancing-front mesh generation, built with
//! [nom](https://docs.rs/nom).
//!
//! ## Overview
//!
//! A rule file is a sequence of parametrized local mesh templates. Each rule
//! describes the front geometry it expects (map points and map lines or
//! faces), the geometry it adds (new points, lines or faces, elements) and a
//! free zone that must stay empty for the rule to apply. New points and
//! free-zone vertices carry affine coefficient terms so they follow the
//! displacement of the mapped points.
//!
//! This crate only reads and validates the text. Compiling rules into
//! matrices and matching them against a front happens in `frontmesh-engine`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frontmesh_core::parse_rules;
//!
//! let file = parse_rules(&std::fs::read_to_string("triangles.rls")?)?;
//! for rule in &file.rules {
//!     println!("{} (quality {})", rule.name, rule.quality);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for rule records

pub mod error;
pub mod parser;
pub mod rule;

pub use error::{Error, Result};
pub use parser::parse_rules;
pub use rule::{
    AffinePoint, Coefficient, Coordinates, ElementPoints, EntityPoints, OldEntity, OldPoint,
    RuleDescription, RuleFile, Tolerance,
};
