// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Executable [`Step`]s and what performing them results in.
//!
//! Every kind of [`Step`] answers two questions: what happens when it is
//! [performed][0], and what happens when it is [not performed][1] because an
//! earlier step failed or is pending. Both always produce a [`StepResult`],
//! never an error.
//!
//! [0]: Step::perform
//! [1]: Step::do_not_perform

pub(crate) mod creator;
pub mod failure;
pub mod outcomes;
pub mod result;

use std::sync::Arc;

use crate::{
    candidate::StepCandidate,
    collector::Outcome,
    model::Meta,
    panic_trap,
    parameters::{
        converters::{Conversion, ConversionError, Input},
        NamedParameters as _, ParamType, Parameter, ParameterConverter, Row,
        Value,
    },
    pattern::MatchedParameters,
    steps::BeforeOrAfterMethod,
};

use self::creator::{parametrise, Bound, ParameterBinder};

#[doc(inline)]
pub use self::{
    failure::{
        BeforeOrAfterFailed, ParameterNotFound, PendingStepFound,
        RestartingScenarioFailure, UuidFailure,
    },
    outcomes::{OutcomeMatcher, OutcomesFailed, OutcomesTable},
    result::{StepResult, StepResultKind},
};

/// Step ready to be performed.
#[derive(Debug)]
pub enum Step {
    /// Step matched by a [`StepCandidate`].
    Parametrised(ParametrisedStep),

    /// Step no candidate matched, or matched by a pending definition.
    Pending(PendingStep),

    /// Step starting with the ignorable keyword.
    Ignorable(String),

    /// Comment line.
    Comment(String),

    /// Before or after hook.
    BeforeOrAfter(BeforeOrAfterStep),

    /// Step performed only upon an [`Outcome`] of the steps preceding it.
    UponOutcome {
        /// [`Outcome`] the inner step is restricted to.
        outcome: Outcome,

        /// Restricted step.
        step: Box<Step>,
    },
}

impl Step {
    /// Creates a [`Step::Pending`] of the `step` text.
    #[must_use]
    pub fn pending(
        step: impl Into<String>,
        previous_non_and: Option<String>,
    ) -> Self {
        Self::Pending(PendingStep::new(step, previous_non_and))
    }

    /// Restricts this step to the `outcome`.
    #[must_use]
    pub fn upon(self, outcome: Outcome) -> Self {
        Self::UponOutcome { outcome, step: Box::new(self) }
    }

    /// Performs this step, after a `failure` of the scenario so far, if any.
    #[must_use]
    pub fn perform(&self, failure: Option<&UuidFailure>) -> StepResult {
        match self {
            Self::Parametrised(s) => s.perform(),
            Self::Pending(p) => StepResult::pending(p.step_as_string()),
            Self::Ignorable(s) => StepResult::ignorable(s.as_str()),
            Self::Comment(s) => StepResult::comment(s.as_str()),
            Self::BeforeOrAfter(h) => h.perform(failure),
            Self::UponOutcome { outcome, step } => match outcome {
                Outcome::Any | Outcome::Success => step.perform(failure),
                Outcome::Failure => StepResult::Skipped,
            },
        }
    }

    /// Handles this step once an earlier one failed or is pending.
    #[must_use]
    pub fn do_not_perform(&self, failure: Option<&UuidFailure>) -> StepResult {
        match self {
            Self::Parametrised(s) => s.do_not_perform(),
            Self::Pending(p) => StepResult::pending(p.step_as_string()),
            Self::Ignorable(s) => StepResult::ignorable(s.as_str()),
            Self::Comment(s) => StepResult::comment(s.as_str()),
            Self::BeforeOrAfter(h) => h.perform(failure),
            Self::UponOutcome { outcome, step } => match outcome {
                Outcome::Any | Outcome::Failure => step.perform(failure),
                Outcome::Success => StepResult::Skipped,
            },
        }
    }

    /// Text of this step, or the name of a hook.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Parametrised(s) => s.step(),
            Self::Pending(p) => p.step_as_string(),
            Self::Ignorable(s) | Self::Comment(s) => s,
            Self::BeforeOrAfter(h) => h.method().method(),
            Self::UponOutcome { step, .. } => step.as_str(),
        }
    }

    /// Steps a composite step expands into, performed right after it.
    #[must_use]
    pub fn composed(&self) -> &[Self] {
        match self {
            Self::Parametrised(s) => s.composed(),
            Self::UponOutcome { step, .. } => step.composed(),
            Self::Pending(_)
            | Self::Ignorable(_)
            | Self::Comment(_)
            | Self::BeforeOrAfter(_) => &[],
        }
    }

    /// Indicates whether this step is a before or after hook.
    #[must_use]
    pub fn is_hook(&self) -> bool {
        match self {
            Self::BeforeOrAfter(_) => true,
            Self::UponOutcome { step, .. } => step.is_hook(),
            Self::Parametrised(_)
            | Self::Pending(_)
            | Self::Ignorable(_)
            | Self::Comment(_) => false,
        }
    }

    /// [`PendingStep`] behind this step, if it is one.
    #[must_use]
    pub fn as_pending(&self) -> Option<&PendingStep> {
        match self {
            Self::Pending(p) => Some(p),
            Self::UponOutcome { step, .. } => step.as_pending(),
            Self::Parametrised(_)
            | Self::Ignorable(_)
            | Self::Comment(_)
            | Self::BeforeOrAfter(_) => None,
        }
    }
}

/// Step matched by a [`StepCandidate`], together with the named parameters
/// it runs with.
#[derive(Debug)]
pub struct ParametrisedStep {
    step: String,
    offset: usize,
    candidate: Arc<StepCandidate>,
    named: Row,
    composed: Vec<Step>,
}

impl ParametrisedStep {
    pub(crate) fn new(
        step: impl Into<String>,
        candidate: Arc<StepCandidate>,
        named: Row,
        composed: Vec<Step>,
    ) -> Self {
        let step = step.into();
        let offset = candidate
            .configuration()
            .keywords()
            .step_without_starting_word(&step, candidate.step_type())
            .map_or(0, |stripped| step.len() - stripped.len());
        Self { step, offset, candidate, named, composed }
    }

    /// Text of the step as written.
    #[must_use]
    pub fn step(&self) -> &str {
        &self.step
    }

    /// [`StepCandidate`] that matched the step.
    #[must_use]
    pub const fn candidate(&self) -> &Arc<StepCandidate> {
        &self.candidate
    }

    /// Named parameters the step runs with.
    #[must_use]
    pub const fn named(&self) -> &Row {
        &self.named
    }

    /// Steps this one expands into.
    #[must_use]
    pub fn composed(&self) -> &[Step] {
        &self.composed
    }

    fn matched(&self) -> Option<MatchedParameters> {
        self.candidate.matcher().find(&self.step[self.offset..])
    }

    fn bind(
        &self,
        matched: Option<&MatchedParameters>,
    ) -> Result<Vec<Bound>, ParameterNotFound> {
        let configuration = self.candidate.configuration();
        ParameterBinder {
            matched,
            group_names: self.candidate.matcher().parameter_names(),
            namer: self.candidate.namer(),
            named: &self.named,
            controls: configuration.parameter_controls(),
            monitor: configuration.step_monitor().as_ref(),
        }
        .bind_all(self.candidate.invoker().parameter_types().len())
    }

    fn parametrise(
        &self,
        matched: Option<&MatchedParameters>,
        bound: &[Bound],
    ) -> String {
        parametrise(
            &self.step,
            self.offset,
            matched,
            bound,
            &self.named,
            self.candidate.invoker().parameter_types(),
            self.candidate.configuration().parameter_controls(),
        )
    }

    fn perform(&self) -> StepResult {
        let configuration = self.candidate.configuration();
        let invoker = self.candidate.invoker();
        let matched = self.matched();
        let bound = match self.bind(matched.as_ref()) {
            Ok(bound) => bound,
            Err(e) => {
                tracing::debug!(step = %self.step, error = %e, "step is pending");
                return StepResult::pending(self.step.as_str());
            }
        };
        let parametrised = self.parametrise(matched.as_ref(), &bound);

        let args = configuration
            .parameter_converters()
            .with_conversion(|c| convert_all(c, &bound, invoker.parameter_types()));
        let args = match args {
            Ok(args) => args,
            Err(e) => {
                let failure = UuidFailure::wrap(self.step.as_str(), e.into());
                return StepResult::failed(self.step.as_str(), parametrised, failure);
            }
        };

        let dry_run = configuration.dry_run();
        configuration.step_monitor().performing(&self.step, dry_run);
        if !dry_run {
            if let Err(e) = panic_trap::run(|| invoker.invoke(args)) {
                let failure = UuidFailure::wrap(self.step.as_str(), e);
                return StepResult::failed(self.step.as_str(), parametrised, failure);
            }
        }
        StepResult::successful(self.step.as_str(), parametrised)
    }

    fn do_not_perform(&self) -> StepResult {
        let matched = self.matched();
        let parametrised = self.bind(matched.as_ref()).map_or_else(
            |_| self.step.clone(),
            |bound| self.parametrise(matched.as_ref(), &bound),
        );
        StepResult::not_performed(self.step.as_str(), parametrised)
    }
}

fn convert_all(
    conversion: Conversion<'_>,
    bound: &[Bound],
    types: &[ParamType],
) -> Result<Vec<Value>, ConversionError> {
    bound
        .iter()
        .zip(types)
        .map(|(b, ty)| conversion.convert(&b.value, ty))
        .collect()
}

/// Step that no candidate could perform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingStep {
    step: String,
    previous_non_and: Option<String>,
    annotated_on: Option<String>,
}

impl PendingStep {
    /// Creates a [`PendingStep`] of the `step` text, following the
    /// `previous_non_and` step, if any.
    #[must_use]
    pub fn new(step: impl Into<String>, previous_non_and: Option<String>) -> Self {
        Self { step: step.into(), previous_non_and, annotated_on: None }
    }

    /// Text of the step as written.
    #[must_use]
    pub fn step_as_string(&self) -> &str {
        &self.step
    }

    /// Closest preceding step that is not an `And` one.
    #[must_use]
    pub fn previous_non_and_step(&self) -> Option<&str> {
        self.previous_non_and.as_deref()
    }

    /// Method of the pending definition that matched the step, if any.
    #[must_use]
    pub fn annotated_on(&self) -> Option<&str> {
        self.annotated_on.as_deref()
    }

    /// Indicates whether a pending definition matched the step.
    #[must_use]
    pub const fn is_annotated(&self) -> bool {
        self.annotated_on.is_some()
    }

    pub(crate) fn annotate(&mut self, method: impl Into<String>) {
        self.annotated_on = Some(method.into());
    }
}

/// Hook bound to the [`Meta`] of what it runs around.
#[derive(Debug)]
pub struct BeforeOrAfterStep {
    method: Arc<BeforeOrAfterMethod>,
    meta: Meta,
}

impl BeforeOrAfterStep {
    /// Creates a [`BeforeOrAfterStep`] reading the hook parameters from the
    /// `meta`.
    #[must_use]
    pub const fn new(method: Arc<BeforeOrAfterMethod>, meta: Meta) -> Self {
        Self { method, meta }
    }

    /// Hook being performed.
    #[must_use]
    pub const fn method(&self) -> &Arc<BeforeOrAfterMethod> {
        &self.method
    }

    /// Runs the hook. A successful hook results in [`StepResult::Skipped`],
    /// as hooks are not reported unless they fail.
    ///
    /// Parameters are looked up in the [`Meta`] by name, with a missing
    /// property converted from an empty value. A parameter of
    /// [`ScenarioFailure`] type receives the `failure`.
    #[must_use]
    pub fn perform(&self, failure: Option<&UuidFailure>) -> StepResult {
        let configuration = self.method.configuration();
        if configuration.dry_run() {
            return StepResult::Skipped;
        }
        let name = self.method.method();
        let invoker = self.method.invoker();
        let converters = configuration.parameter_converters().new_instance_adding(
            Arc::new(ScenarioFailureConverter(failure.cloned())),
        );

        let result = invoker
            .parameter_types()
            .iter()
            .enumerate()
            .map(|(position, ty)| {
                let raw = self
                    .method
                    .namer()
                    .name(position)
                    .and_then(|n| self.meta.value_of(n))
                    .unwrap_or_default();
                converters.convert(raw, ty)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(anyhow::Error::from)
            .and_then(|args| panic_trap::run(|| invoker.invoke(args)));

        match result {
            Ok(()) => StepResult::Skipped,
            Err(e) => {
                tracing::debug!(method = name, error = %format!("{e:#}"), "hook failed");
                let failure =
                    UuidFailure::wrap(name, BeforeOrAfterFailed::new(name, e).into());
                StepResult::failed(name, name, failure)
            }
        }
    }
}

/// Failure of the scenario an after hook runs upon, if it failed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScenarioFailure(pub Option<UuidFailure>);

impl Parameter for ScenarioFailure {
    fn param_type() -> ParamType {
        ParamType::scalar::<Self>()
    }
}

struct ScenarioFailureConverter(Option<UuidFailure>);

impl ParameterConverter for ScenarioFailureConverter {
    fn name(&self) -> &str {
        "ScenarioFailureConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<ScenarioFailure>()
    }

    fn convert(
        &self,
        _: Input<'_>,
        _: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        Ok(Box::new(ScenarioFailure(self.0.clone())))
    }
}
