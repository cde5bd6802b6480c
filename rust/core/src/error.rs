// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for rule-file parsing and validation.

/// Result type alias for rule-file operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a rule file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The text does not follow the rule-file grammar.
    #[error("rule file parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The rule parsed, but its contents are inconsistent.
    #[error("invalid rule \"{rule}\": {reason}")]
    InvalidRule { rule: String, reason: String },

    /// The rule mixes 2-D and 3-D points or entity keywords.
    #[error("rule \"{0}\" mixes 2-D and 3-D entries")]
    MixedDimensions(String),
}

impl Error {
    /// Creates a parse error at a 1-based line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Creates a validation error for the named rule.
    pub fn invalid(rule: &str, reason: impl Into<String>) -> Self {
        Error::InvalidRule {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}
