// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Failures of performed steps.

use std::{error::Error as StdError, fmt, sync::Arc};

use derive_more::with_trait::{Display, Error};
use uuid::Uuid;

use super::outcomes::{OutcomesFailed, OutcomesTable};

/// Failure of a step wrapped with a unique correlation id.
///
/// Clones share both the id and the cause, so reporters receiving the same
/// failure through different paths can tell it is the same one.
#[derive(Clone)]
pub struct UuidFailure {
    id: Uuid,
    step: String,
    cause: Arc<anyhow::Error>,
}

impl UuidFailure {
    /// Wraps the `cause` of the `step` failure with a fresh id.
    ///
    /// An already wrapped [`UuidFailure`] is returned as is, keeping its id.
    #[must_use]
    pub fn wrap(step: impl Into<String>, cause: anyhow::Error) -> Self {
        match cause.downcast::<Self>() {
            Ok(wrapped) => wrapped,
            Err(cause) => Self {
                id: Uuid::new_v4(),
                step: step.into(),
                cause: Arc::new(cause),
            },
        }
    }

    /// Correlation id of this failure.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Step that failed.
    #[must_use]
    pub fn step(&self) -> &str {
        &self.step
    }

    /// Underlying cause.
    #[must_use]
    pub fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// [`OutcomesTable`] of the failed verification, if this failure comes
    /// from [`OutcomesTable::verify()`].
    #[must_use]
    pub fn outcomes(&self) -> Option<&OutcomesTable> {
        self.cause.downcast_ref::<OutcomesFailed>().map(OutcomesFailed::table)
    }

    /// Indicates whether a [`RestartingScenarioFailure`] caused this failure,
    /// directly or down its chain of causes.
    #[must_use]
    pub fn is_restarting_scenario(&self) -> bool {
        self.cause.chain().any(|e| e.is::<RestartingScenarioFailure>())
    }
}

impl PartialEq for UuidFailure {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for UuidFailure {}

impl fmt::Debug for UuidFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UuidFailure")
            .field("id", &self.id)
            .field("step", &self.step)
            .field("cause", &format_args!("{:#}", self.cause))
            .finish()
    }
}

impl fmt::Display for UuidFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.cause)
    }
}

impl StdError for UuidFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let cause: &(dyn StdError + Send + Sync + 'static) =
            (*self.cause).as_ref();
        Some(cause)
    }
}

/// Value of a placeholder required by a step handler could not be found.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum ParameterNotFound {
    /// No group of the matched step carries the name.
    #[display("Parameter not found for name '{name}' amongst {available:?}")]
    ForName {
        /// Name looked up.
        #[error(not(source))]
        name: String,

        /// Names of the groups available.
        available: Vec<String>,
    },

    /// The matched step has fewer groups than the handler has parameters.
    #[display(
        "Parameter not found for position '{position}' amongst {available:?}"
    )]
    ForPosition {
        /// Position of the handler parameter.
        #[error(not(source))]
        position: usize,

        /// Names of the groups available.
        available: Vec<String>,
    },
}

/// Step that was not matched, or was matched by a pending step definition.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Pending step: {step}")]
pub struct PendingStepFound {
    /// Text of the step.
    #[error(not(source))]
    pub step: String,
}

impl PendingStepFound {
    /// Creates a new [`PendingStepFound`] signal.
    #[must_use]
    pub fn new(step: impl Into<String>) -> Self {
        Self { step: step.into() }
    }
}

/// Returned by a step to have its scenario performed again from the start.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Restarting scenario: {reason}")]
pub struct RestartingScenarioFailure {
    /// Why the scenario restarts.
    #[error(not(source))]
    pub reason: String,
}

impl RestartingScenarioFailure {
    /// Creates a new [`RestartingScenarioFailure`] signal.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Failure of a before or after hook.
#[derive(Clone, Debug, Display)]
#[display("Method {method} failed")]
pub struct BeforeOrAfterFailed {
    /// Name of the hook.
    pub method: String,

    /// What the hook failed with.
    pub cause: Arc<anyhow::Error>,
}

impl BeforeOrAfterFailed {
    /// Creates a new [`BeforeOrAfterFailed`] error.
    #[must_use]
    pub fn new(method: impl Into<String>, cause: anyhow::Error) -> Self {
        Self { method: method.into(), cause: Arc::new(cause) }
    }
}

impl StdError for BeforeOrAfterFailed {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        let cause: &(dyn StdError + Send + Sync + 'static) =
            (*self.cause).as_ref();
        Some(cause)
    }
}
