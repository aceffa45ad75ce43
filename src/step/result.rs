// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`StepResult`] definition.

use derive_more::with_trait::Display;

use super::failure::{PendingStepFound, UuidFailure};
use crate::reporter::StoryReporter;

/// Kind of a [`StepResult`], without its payload.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum StepResultKind {
    /// [`StepResult::Successful`].
    Successful,

    /// [`StepResult::Pending`].
    Pending,

    /// [`StepResult::NotPerformed`].
    NotPerformed,

    /// [`StepResult::Ignorable`].
    Ignorable,

    /// [`StepResult::Comment`].
    Comment,

    /// [`StepResult::Failed`].
    Failed,

    /// [`StepResult::Skipped`].
    Skipped,
}

/// Result of performing (or not performing) a single step.
#[derive(Clone, Debug, PartialEq)]
pub enum StepResult {
    /// User code ran to completion, or would have in a dry run.
    Successful {
        /// Step as written.
        step: String,

        /// Step with its parameter values marked.
        parametrised: String,
    },

    /// Step has no usable step definition.
    Pending {
        /// Step as written.
        step: String,

        /// Step with its parameter values marked, when they could be bound.
        parametrised: String,

        /// Signal raised by the pending step.
        pending: PendingStepFound,
    },

    /// Step was not performed because of an earlier failure.
    NotPerformed {
        /// Step as written.
        step: String,

        /// Step with its parameter values marked, when they could be bound.
        parametrised: String,
    },

    /// Commented-out step.
    Ignorable {
        /// Step as written.
        step: String,
    },

    /// Free text comment.
    Comment {
        /// Comment as written.
        step: String,
    },

    /// User code failed.
    Failed {
        /// Step as written.
        step: String,

        /// Step with its parameter values marked, when they could be bound.
        parametrised: String,

        /// What the step failed with.
        failure: UuidFailure,
    },

    /// Hook that ran successfully, or was not applicable to the outcome.
    Skipped,
}

impl StepResult {
    /// Creates a new [`StepResult::Successful`].
    #[must_use]
    pub fn successful(step: impl Into<String>, parametrised: impl Into<String>) -> Self {
        Self::Successful { step: step.into(), parametrised: parametrised.into() }
    }

    /// Creates a new [`StepResult::Pending`] whose parametrised text is the
    /// step itself.
    #[must_use]
    pub fn pending(step: impl Into<String>) -> Self {
        let step = step.into();
        Self::Pending {
            pending: PendingStepFound::new(step.clone()),
            parametrised: step.clone(),
            step,
        }
    }

    /// Creates a new [`StepResult::NotPerformed`].
    #[must_use]
    pub fn not_performed(
        step: impl Into<String>,
        parametrised: impl Into<String>,
    ) -> Self {
        Self::NotPerformed { step: step.into(), parametrised: parametrised.into() }
    }

    /// Creates a new [`StepResult::Ignorable`].
    #[must_use]
    pub fn ignorable(step: impl Into<String>) -> Self {
        Self::Ignorable { step: step.into() }
    }

    /// Creates a new [`StepResult::Comment`].
    #[must_use]
    pub fn comment(step: impl Into<String>) -> Self {
        Self::Comment { step: step.into() }
    }

    /// Creates a new [`StepResult::Failed`].
    #[must_use]
    pub fn failed(
        step: impl Into<String>,
        parametrised: impl Into<String>,
        failure: UuidFailure,
    ) -> Self {
        Self::Failed {
            step: step.into(),
            parametrised: parametrised.into(),
            failure,
        }
    }

    /// Returns this result with the parametrised text replaced.
    #[must_use]
    pub fn with_parametrised(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            Self::Successful { parametrised, .. }
            | Self::Pending { parametrised, .. }
            | Self::NotPerformed { parametrised, .. }
            | Self::Failed { parametrised, .. } => *parametrised = text.into(),
            Self::Ignorable { .. } | Self::Comment { .. } | Self::Skipped => {}
        }
        self
    }

    /// [`StepResultKind`] of this result.
    #[must_use]
    pub const fn kind(&self) -> StepResultKind {
        match self {
            Self::Successful { .. } => StepResultKind::Successful,
            Self::Pending { .. } => StepResultKind::Pending,
            Self::NotPerformed { .. } => StepResultKind::NotPerformed,
            Self::Ignorable { .. } => StepResultKind::Ignorable,
            Self::Comment { .. } => StepResultKind::Comment,
            Self::Failed { .. } => StepResultKind::Failed,
            Self::Skipped => StepResultKind::Skipped,
        }
    }

    /// Step as written, empty for [`StepResult::Skipped`].
    #[must_use]
    pub fn step(&self) -> &str {
        match self {
            Self::Successful { step, .. }
            | Self::Pending { step, .. }
            | Self::NotPerformed { step, .. }
            | Self::Ignorable { step }
            | Self::Comment { step }
            | Self::Failed { step, .. } => step,
            Self::Skipped => "",
        }
    }

    /// Step with its parameter values marked, or the step as written when
    /// it carries no parameters.
    #[must_use]
    pub fn parametrised_step(&self) -> &str {
        match self {
            Self::Successful { parametrised, .. }
            | Self::Pending { parametrised, .. }
            | Self::NotPerformed { parametrised, .. }
            | Self::Failed { parametrised, .. } => parametrised,
            Self::Ignorable { step } | Self::Comment { step } => step,
            Self::Skipped => "",
        }
    }

    /// Failure of a [`StepResult::Failed`].
    #[must_use]
    pub const fn failure(&self) -> Option<&UuidFailure> {
        match self {
            Self::Failed { failure, .. } => Some(failure),
            Self::Successful { .. }
            | Self::Pending { .. }
            | Self::NotPerformed { .. }
            | Self::Ignorable { .. }
            | Self::Comment { .. }
            | Self::Skipped => None,
        }
    }

    /// Indicates whether this is a [`StepResult::Failed`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Indicates whether this is a [`StepResult::Pending`].
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// Reports this result to the `reporter`.
    ///
    /// Failures of an outcomes verification are reported with
    /// [`StoryReporter::failed_outcomes()`].
    pub fn describe_to(&self, reporter: &mut dyn StoryReporter) {
        match self {
            Self::Successful { parametrised, .. } => {
                reporter.successful(parametrised);
            }
            Self::Pending { parametrised, .. } => reporter.pending(parametrised),
            Self::NotPerformed { parametrised, .. } => {
                reporter.not_performed(parametrised);
            }
            Self::Ignorable { step } => reporter.ignorable(step),
            Self::Comment { step } => reporter.comment(step),
            Self::Failed { parametrised, failure, .. } => {
                match failure.outcomes() {
                    Some(table) => reporter.failed_outcomes(parametrised, table),
                    None => reporter.failed(parametrised, failure),
                }
            }
            Self::Skipped => {}
        }
    }
}
