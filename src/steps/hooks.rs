// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Before and after hooks.

use std::sync::Arc;

use crate::{
    collector::{Outcome, ScenarioType, Stage},
    configuration::Configuration,
    model::Meta,
    step::{BeforeOrAfterStep, Step},
};

use super::{builder::HookOptions, handler::StepInvoker, ParameterNamer};

/// What a hook runs around.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HookScope {
    /// The whole run.
    Stories,

    /// Every story.
    Story {
        /// Whether the hook runs around given stories rather than regular
        /// ones.
        given_story: bool,
    },

    /// Every scenario of a [`ScenarioType`].
    Scenario(ScenarioType),
}

/// Registered hook.
#[derive(Debug)]
pub struct BeforeOrAfterMethod {
    stage: Stage,
    scope: HookScope,
    order: i32,
    outcome: Outcome,
    namer: ParameterNamer,
    invoker: Arc<dyn StepInvoker>,
    configuration: Arc<Configuration>,
}

impl BeforeOrAfterMethod {
    pub(crate) fn new(
        options: &HookOptions,
        invoker: Arc<dyn StepInvoker>,
        configuration: Arc<Configuration>,
    ) -> Self {
        Self {
            stage: options.stage,
            scope: options.scope,
            order: options.order,
            outcome: options.outcome,
            namer: options.namer.clone(),
            invoker,
            configuration,
        }
    }

    /// [`Stage`] the hook runs at.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// What the hook runs around.
    #[must_use]
    pub const fn scope(&self) -> HookScope {
        self.scope
    }

    /// Order amongst the hooks of the same provider.
    #[must_use]
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// [`Outcome`] an after hook is restricted to.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Name the hook is reported under.
    #[must_use]
    pub fn method(&self) -> &str {
        self.invoker.method()
    }

    pub(crate) const fn namer(&self) -> &ParameterNamer {
        &self.namer
    }

    pub(crate) fn invoker(&self) -> &dyn StepInvoker {
        self.invoker.as_ref()
    }

    pub(crate) fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Creates a [`Step`] performing this hook with parameters read from the
    /// `meta`.
    #[must_use]
    pub fn create_step(self: &Arc<Self>, meta: &Meta) -> Step {
        Step::BeforeOrAfter(BeforeOrAfterStep::new(Arc::clone(self), meta.clone()))
    }

    /// Creates a [`Step`] performing this hook only upon its [`Outcome`].
    #[must_use]
    pub fn create_step_upon_outcome(self: &Arc<Self>, meta: &Meta) -> Step {
        self.create_step(meta).upon(self.outcome)
    }
}
