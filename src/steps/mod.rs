// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Registration of step definitions and hooks.
//!
//! A [`Steps`] value owns a user steps instance and the handlers registered
//! on it. As a [`CandidateSteps`] provider it turns them into
//! [`StepCandidate`]s and [`BeforeOrAfterMethod`]s.

pub mod builder;
pub mod handler;
pub mod hooks;

use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex},
};

use once_cell::sync::OnceCell;

use crate::{
    candidate::StepCandidate,
    collector::ScenarioType,
    configuration::Configuration,
    error::{ConfigurationError, Result},
    keywords::StepType,
};

#[doc(inline)]
pub use self::{
    builder::{HookOptions, StepOptions},
    handler::{StepHandler, StepInvoker, StepReturn},
    hooks::{BeforeOrAfterMethod, HookScope},
};

/// Provider of [`StepCandidate`]s and hooks.
pub trait CandidateSteps: Send + Sync {
    /// [`Configuration`] the candidates are created with.
    fn configuration(&self) -> &Arc<Configuration>;

    /// Lists the candidates of every registered step definition, aliases
    /// included, in registration order.
    ///
    /// # Errors
    ///
    /// With [`ConfigurationError::DuplicateCandidateFound`] if two candidates
    /// share a type and a pattern, or if a pattern cannot be compiled.
    fn list_candidates(&self) -> Result<Vec<Arc<StepCandidate>>>;

    /// Hooks running before or after all stories.
    fn list_before_or_after_stories(&self) -> Vec<Arc<BeforeOrAfterMethod>>;

    /// Hooks running before or after a story, either a regular one or a given
    /// one.
    fn list_before_or_after_story(
        &self,
        given_story: bool,
    ) -> Vec<Arc<BeforeOrAfterMethod>>;

    /// Hooks running before or after scenarios of the `scenario_type`.
    fn list_before_or_after_scenario(
        &self,
        scenario_type: ScenarioType,
    ) -> Vec<Arc<BeforeOrAfterMethod>>;
}

/// Names of handler parameters, by position.
///
/// An annotated name is given explicitly at registration. A declared name
/// stands for the name the handler itself gives the parameter, and is only
/// consulted when no annotated name binds.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParameterNamer {
    annotated: Vec<Option<String>>,
    declared: Vec<Option<String>>,
}

fn names<I, N>(names: I) -> Vec<Option<String>>
where
    I: IntoIterator<Item = N>,
    N: Into<String>,
{
    names
        .into_iter()
        .map(|n| Some(n.into()).filter(|n: &String| !n.is_empty()))
        .collect()
}

impl ParameterNamer {
    /// Creates a [`ParameterNamer`] with the annotated `names`. An empty
    /// name leaves its position unnamed.
    #[must_use]
    pub fn annotated<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self::default().with_annotated(names)
    }

    /// Creates a [`ParameterNamer`] with the declared `names`. An empty
    /// name leaves its position unnamed.
    #[must_use]
    pub fn declared<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self::default().with_declared(names)
    }

    /// Replaces the annotated names.
    #[must_use]
    pub fn with_annotated<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.annotated = self::names(names);
        self
    }

    /// Replaces the declared names.
    #[must_use]
    pub fn with_declared<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.declared = self::names(names);
        self
    }

    /// Annotated name of the parameter at the `position`.
    #[must_use]
    pub fn annotated_name(&self, position: usize) -> Option<&str> {
        self.annotated.get(position)?.as_deref()
    }

    /// Declared name of the parameter at the `position`.
    #[must_use]
    pub fn parameter_name(&self, position: usize) -> Option<&str> {
        self.declared.get(position)?.as_deref()
    }

    /// Annotated name of the parameter at the `position`, or its declared
    /// one.
    #[must_use]
    pub fn name(&self, position: usize) -> Option<&str> {
        self.annotated_name(position).or_else(|| self.parameter_name(position))
    }
}

/// Step definition as registered, before it is compiled into candidates.
struct Registration {
    step_type: StepType,
    pattern: String,
    options: StepOptions,
    invoker: Arc<dyn StepInvoker>,
}

/// Step definitions and hooks of a steps instance `S`.
///
/// ```rust
/// # use std::sync::Arc;
/// # use stepwise::{CandidateSteps as _, Configuration, Steps};
/// #[derive(Default)]
/// struct Elevator {
///     floor: i32,
/// }
///
/// let mut steps = Steps::new(Arc::new(Configuration::default()), Elevator::default());
/// _ = steps
///     .given("the elevator is on floor $floor", |e: &mut Elevator, floor: i32| {
///         e.floor = floor;
///     })
///     .when("the elevator goes up", |e: &mut Elevator| e.floor += 1);
///
/// assert_eq!(steps.list_candidates().unwrap().len(), 2);
/// ```
pub struct Steps<S> {
    configuration: Arc<Configuration>,
    instance: Arc<Mutex<S>>,
    registrations: Vec<Registration>,
    hooks: Vec<Arc<BeforeOrAfterMethod>>,

    /// Compiled [`StepCandidate`]s, reset on every new registration.
    candidates: OnceCell<Vec<Arc<StepCandidate>>>,
}

impl<S> fmt::Debug for Steps<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Steps")
            .field("instance", &std::any::type_name::<S>())
            .field(
                "patterns",
                &self.registrations.iter().map(|r| &r.pattern).collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<S> Steps<S> {
    /// Creates [`Steps`] without any definitions, owning the `instance`.
    #[must_use]
    pub fn new(configuration: Arc<Configuration>, instance: S) -> Self {
        Self {
            configuration,
            instance: Arc::new(Mutex::new(instance)),
            registrations: Vec::new(),
            hooks: Vec::new(),
            candidates: OnceCell::new(),
        }
    }

    /// Shared steps instance the handlers run against.
    #[must_use]
    pub const fn instance(&self) -> &Arc<Mutex<S>> {
        &self.instance
    }

    fn hooks_where(
        &self,
        scope: impl Fn(HookScope) -> bool,
    ) -> Vec<Arc<BeforeOrAfterMethod>> {
        self.hooks.iter().filter(|h| scope(h.scope())).cloned().collect()
    }

    fn register(&mut self, registration: Registration) {
        self.registrations.push(registration);
        self.candidates = OnceCell::new();
    }

    fn compile_candidates(&self) -> Result<Vec<Arc<StepCandidate>>> {
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        for r in &self.registrations {
            let patterns =
                std::iter::once(&r.pattern).chain(&r.options.aliases);
            for pattern in patterns {
                if !seen.insert((r.step_type, pattern.as_str())) {
                    return Err(ConfigurationError::duplicate_candidate(
                        r.step_type,
                        pattern.as_str(),
                    ));
                }
                candidates.push(Arc::new(StepCandidate::new(
                    pattern,
                    r.step_type,
                    &r.options,
                    Arc::clone(&r.invoker),
                    Arc::clone(&self.configuration),
                )?));
            }
        }
        tracing::trace!(
            steps = std::any::type_name::<S>(),
            count = candidates.len(),
            "compiled candidates",
        );
        Ok(candidates)
    }
}

impl<S: Send + 'static> CandidateSteps for Steps<S> {
    fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    fn list_candidates(&self) -> Result<Vec<Arc<StepCandidate>>> {
        self.candidates
            .get_or_try_init(|| self.compile_candidates())
            .cloned()
    }

    fn list_before_or_after_stories(&self) -> Vec<Arc<BeforeOrAfterMethod>> {
        self.hooks_where(|s| s == HookScope::Stories)
    }

    fn list_before_or_after_story(
        &self,
        given_story: bool,
    ) -> Vec<Arc<BeforeOrAfterMethod>> {
        self.hooks_where(|s| s == HookScope::Story { given_story })
    }

    fn list_before_or_after_scenario(
        &self,
        scenario_type: ScenarioType,
    ) -> Vec<Arc<BeforeOrAfterMethod>> {
        self.hooks_where(|s| s == HookScope::Scenario(scenario_type))
    }
}
