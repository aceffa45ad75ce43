// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration-level errors.
//!
//! Everything that goes wrong while matching or binding a single step is
//! recovered into a [`StepResult`] variant. The errors of this module are the
//! ones that indicate a setup defect and are therefore surfaced eagerly:
//! unresolvable localized keywords, duplicate step candidates and patterns
//! that cannot be compiled.
//!
//! [`StepResult`]: crate::StepResult

use derive_more::with_trait::{Display, Error, From};

use crate::keywords::{KeywordNotFound, StartingWordNotFound, StepType};

/// Error raised while configuring or collecting steps.
#[derive(Clone, Debug, Display, Error, From)]
pub enum ConfigurationError {
    /// A step (or a step type) has no starting word in the active
    /// [`Keywords`].
    ///
    /// [`Keywords`]: crate::Keywords
    #[display("{_0}")]
    #[from]
    StartingWordNotFound(StartingWordNotFound),

    /// A required keyword is absent from a localized keyword table.
    #[display("{_0}")]
    #[from]
    KeywordNotFound(KeywordNotFound),

    /// Two candidates declare the same pattern for the same step type.
    #[display("Duplicate candidate step found: {step_type} {pattern}")]
    DuplicateCandidateFound {
        /// Type of both candidates.
        #[error(not(source))]
        step_type: StepType,

        /// Textual pattern declared twice.
        pattern: String,
    },

    /// A step pattern could not be compiled.
    #[display("Invalid step pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// Pattern as it was declared.
        #[error(not(source))]
        pattern: String,

        /// Compilation error description.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates a new [`ConfigurationError::DuplicateCandidateFound`].
    #[must_use]
    pub fn duplicate_candidate(
        step_type: StepType,
        pattern: impl Into<String>,
    ) -> Self {
        Self::DuplicateCandidateFound { step_type, pattern: pattern.into() }
    }

    /// Creates a new [`ConfigurationError::InvalidPattern`].
    #[must_use]
    pub fn invalid_pattern(
        pattern: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    /// Indicates whether this error is a missing starting word.
    #[must_use]
    pub const fn is_starting_word_not_found(&self) -> bool {
        matches!(self, Self::StartingWordNotFound(_))
    }
}

/// Alias for a [`Result`] with [`ConfigurationError`].
pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_candidate_message_names_type_and_pattern() {
        let err = ConfigurationError::duplicate_candidate(
            StepType::Given,
            "a $colour stone",
        );

        assert_eq!(
            err.to_string(),
            "Duplicate candidate step found: Given a $colour stone",
        );
    }

    #[test]
    fn starting_word_errors_convert() {
        let err: ConfigurationError =
            StartingWordNotFound::for_step("Giv a stone", ["Given", "When"])
                .into();

        assert!(err.is_starting_word_not_found());
        assert!(err.to_string().contains("Giv a stone"));
    }
}
