// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fluent registration of step definitions and hooks on [`Steps`].

use std::sync::Arc;

use crate::{
    collector::{Outcome, ScenarioType, Stage},
    keywords::StepType,
};

use super::{
    handler::{BoundHandler, Handler, StepHandler},
    hooks::{BeforeOrAfterMethod, HookScope},
    ParameterNamer, Registration, Steps,
};

/// Options of a step definition.
#[derive(Clone, Debug, Default)]
pub struct StepOptions {
    pub(crate) priority: i32,
    pub(crate) namer: ParameterNamer,
    pub(crate) aliases: Vec<String>,
    pub(crate) pending: bool,
    pub(crate) composed_of: Vec<String>,
    pub(crate) method: Option<String>,
}

impl StepOptions {
    /// Creates default [`StepOptions`]: priority `0`, no names, no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority. Higher priority candidates are tried first.
    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the annotated names of the handler parameters, in order.
    #[must_use]
    pub fn named<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.namer = self.namer.with_annotated(names);
        self
    }

    /// Sets the declared names of the handler parameters, in order.
    #[must_use]
    pub fn parameter_names<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.namer = self.namer.with_declared(names);
        self
    }

    /// Adds an alternative pattern handled the same way.
    #[must_use]
    pub fn alias(mut self, pattern: impl Into<String>) -> Self {
        self.aliases.push(pattern.into());
        self
    }

    /// Adds alternative patterns handled the same way.
    #[must_use]
    pub fn aliases<I, P>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.aliases.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Marks the definition as pending: matching steps are reported pending
    /// and never performed.
    #[must_use]
    pub fn pending(mut self) -> Self {
        self.pending = true;
        self
    }

    /// Makes the definition composite: every matching step expands into the
    /// `steps`, with `<name>` references replaced by the matched values.
    #[must_use]
    pub fn composed_of<I, P>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.composed_of = steps.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the name the handler is reported under. Defaults to the pattern.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.method = Some(name.into());
        self
    }
}

/// Options of a hook, including when it runs.
#[derive(Clone, Debug)]
pub struct HookOptions {
    pub(crate) stage: Stage,
    pub(crate) scope: HookScope,
    pub(crate) order: i32,
    pub(crate) outcome: Outcome,
    pub(crate) namer: ParameterNamer,
    pub(crate) method: Option<String>,
}

impl HookOptions {
    const fn new(stage: Stage, scope: HookScope) -> Self {
        Self {
            stage,
            scope,
            order: 0,
            outcome: Outcome::Any,
            namer: ParameterNamer { annotated: Vec::new(), declared: Vec::new() },
            method: None,
        }
    }

    /// Hook running once before all stories.
    #[must_use]
    pub const fn before_stories() -> Self {
        Self::new(Stage::Before, HookScope::Stories)
    }

    /// Hook running once after all stories.
    #[must_use]
    pub const fn after_stories() -> Self {
        Self::new(Stage::After, HookScope::Stories)
    }

    /// Hook running before every regular story.
    #[must_use]
    pub const fn before_story() -> Self {
        Self::new(Stage::Before, HookScope::Story { given_story: false })
    }

    /// Hook running after every regular story.
    #[must_use]
    pub const fn after_story() -> Self {
        Self::new(Stage::After, HookScope::Story { given_story: false })
    }

    /// Hook running before every normal scenario.
    #[must_use]
    pub const fn before_scenario() -> Self {
        Self::new(Stage::Before, HookScope::Scenario(ScenarioType::Normal))
    }

    /// Hook running after every normal scenario.
    #[must_use]
    pub const fn after_scenario() -> Self {
        Self::new(Stage::After, HookScope::Scenario(ScenarioType::Normal))
    }

    /// Sets the order amongst hooks of the same steps. Before hooks run in
    /// ascending order, after hooks in descending order.
    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Restricts an after hook to the `outcome` of what it follows.
    #[must_use]
    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Makes a story hook run around given stories instead of regular ones.
    #[must_use]
    pub fn given_story(mut self, given_story: bool) -> Self {
        if let HookScope::Story { .. } = self.scope {
            self.scope = HookScope::Story { given_story };
        }
        self
    }

    /// Makes a scenario hook run around scenarios of the `scenario_type`.
    #[must_use]
    pub fn scenario_type(mut self, scenario_type: ScenarioType) -> Self {
        if let HookScope::Scenario(_) = self.scope {
            self.scope = HookScope::Scenario(scenario_type);
        }
        self
    }

    /// Sets the meta property names the handler parameters are read from.
    #[must_use]
    pub fn named<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        self.namer = self.namer.with_annotated(names);
        self
    }

    /// Sets the name the hook is reported under.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.method = Some(name.into());
        self
    }

    fn default_method(&self) -> String {
        let stage = match self.stage {
            Stage::Before => "before",
            Stage::After => "after",
        };
        let scope = match self.scope {
            HookScope::Stories => "stories",
            HookScope::Story { .. } => "story",
            HookScope::Scenario(_) => "scenario",
        };
        format!("{stage}_{scope}")
    }
}

impl<S: Send + 'static> Steps<S> {
    /// Registers a `Given` step definition.
    pub fn given<Args, H>(&mut self, pattern: impl Into<String>, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.add_step(StepType::Given, pattern, StepOptions::default(), handler)
    }

    /// Registers a `When` step definition.
    pub fn when<Args, H>(&mut self, pattern: impl Into<String>, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.add_step(StepType::When, pattern, StepOptions::default(), handler)
    }

    /// Registers a `Then` step definition.
    pub fn then<Args, H>(&mut self, pattern: impl Into<String>, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.add_step(StepType::Then, pattern, StepOptions::default(), handler)
    }

    /// Registers a `Given` step definition with the `options`.
    pub fn given_with<Args, H>(
        &mut self,
        pattern: impl Into<String>,
        options: StepOptions,
        handler: H,
    ) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.add_step(StepType::Given, pattern, options, handler)
    }

    /// Registers a `When` step definition with the `options`.
    pub fn when_with<Args, H>(
        &mut self,
        pattern: impl Into<String>,
        options: StepOptions,
        handler: H,
    ) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.add_step(StepType::When, pattern, options, handler)
    }

    /// Registers a `Then` step definition with the `options`.
    pub fn then_with<Args, H>(
        &mut self,
        pattern: impl Into<String>,
        options: StepOptions,
        handler: H,
    ) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.add_step(StepType::Then, pattern, options, handler)
    }

    /// Registers a composite step definition doing nothing on its own but
    /// expanding into the `composed_of` steps.
    pub fn composite<I, P>(
        &mut self,
        step_type: StepType,
        pattern: impl Into<String>,
        composed_of: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.add_step(
            step_type,
            pattern,
            StepOptions::new().composed_of(composed_of),
            |_: &mut S| {},
        )
    }

    /// Registers a pending step definition: matching steps are reported
    /// pending.
    pub fn pending(
        &mut self,
        step_type: StepType,
        pattern: impl Into<String>,
    ) -> &mut Self {
        self.add_step(step_type, pattern, StepOptions::new().pending(), |_: &mut S| {})
    }

    /// Registers a step definition of the `step_type`.
    pub fn add_step<Args, H>(
        &mut self,
        step_type: StepType,
        pattern: impl Into<String>,
        options: StepOptions,
        handler: H,
    ) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        let pattern = pattern.into();
        let method = options.method.clone().unwrap_or_else(|| pattern.clone());
        let invoker = BoundHandler::new(
            method,
            Arc::clone(&self.instance),
            Handler::new(handler),
        );
        self.register(Registration {
            step_type,
            pattern,
            options,
            invoker: Arc::new(invoker),
        });
        self
    }

    /// Registers a hook described by the `options`.
    pub fn hook<Args, H>(&mut self, options: HookOptions, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        let method =
            options.method.clone().unwrap_or_else(|| options.default_method());
        let invoker = BoundHandler::new(
            method,
            Arc::clone(&self.instance),
            Handler::new(handler),
        );
        self.hooks.push(Arc::new(BeforeOrAfterMethod::new(
            &options,
            Arc::new(invoker),
            Arc::clone(&self.configuration),
        )));
        self
    }

    /// Registers a hook running once before all stories.
    pub fn before_stories<Args, H>(&mut self, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.hook(HookOptions::before_stories(), handler)
    }

    /// Registers a hook running once after all stories.
    pub fn after_stories<Args, H>(&mut self, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.hook(HookOptions::after_stories(), handler)
    }

    /// Registers a hook running before every regular story.
    pub fn before_story<Args, H>(&mut self, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.hook(HookOptions::before_story(), handler)
    }

    /// Registers a hook running after every regular story, whatever its
    /// outcome.
    pub fn after_story<Args, H>(&mut self, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.hook(HookOptions::after_story(), handler)
    }

    /// Registers a hook running before every normal scenario.
    pub fn before_scenario<Args, H>(&mut self, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.hook(HookOptions::before_scenario(), handler)
    }

    /// Registers a hook running after every normal scenario, whatever its
    /// outcome.
    pub fn after_scenario<Args, H>(&mut self, handler: H) -> &mut Self
    where
        H: StepHandler<S, Args>,
    {
        self.hook(HookOptions::after_scenario(), handler)
    }
}
