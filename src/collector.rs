// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Collecting executable [`Step`]s of scenarios, lifecycles and hooks.

use std::{cmp::Reverse, sync::Arc};

use derive_more::with_trait::Display;

use crate::{
    candidate::{match_step, StepCandidate},
    configuration::Configuration,
    error::Result,
    finder::StepFinder,
    keywords::Keywords,
    model::{row_with_meta, Lifecycle, Meta, Story},
    parameters::Row,
    step::Step,
    steps::{BeforeOrAfterMethod, CandidateSteps},
};

/// Whether steps run before or after what they surround.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Stage {
    /// Before.
    #[display("BEFORE")]
    Before,

    /// After.
    #[display("AFTER")]
    After,
}

/// What [`Lifecycle`] steps surround.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Scope {
    /// A whole story.
    #[display("STORY")]
    Story,

    /// Every scenario of a story.
    #[display("SCENARIO")]
    Scenario,
}

/// Kind of a scenario run, selecting the scenario hooks surrounding it.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum ScenarioType {
    /// Scenario run without examples.
    #[display("NORMAL")]
    Normal,

    /// Single examples row of a scenario.
    #[display("EXAMPLE")]
    Example,

    /// Any scenario run.
    #[display("ANY")]
    Any,
}

/// Outcome of a story or scenario that after steps are restricted to.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum Outcome {
    /// Whatever happened.
    #[default]
    #[display("ANY")]
    Any,

    /// Nothing failed.
    #[display("SUCCESS")]
    Success,

    /// Something failed.
    #[display("FAILURE")]
    Failure,
}

impl Outcome {
    /// All the [`Outcome`]s, in declaration order.
    pub const ALL: [Self; 3] = [Self::Any, Self::Success, Self::Failure];
}

/// Collector of the executable [`Step`]s of a run.
pub trait StepCollector {
    /// Hooks surrounding all stories.
    fn collect_before_or_after_stories_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        stage: Stage,
    ) -> Vec<Step>;

    /// Hooks surrounding the `story`, which is either a regular or a given
    /// one.
    fn collect_before_or_after_story_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        story: &Story,
        stage: Stage,
        given_story: bool,
    ) -> Vec<Step>;

    /// Hooks surrounding a scenario run of the `scenario_type`, reading their
    /// parameters from the `meta`.
    fn collect_before_or_after_scenario_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        meta: &Meta,
        stage: Stage,
        scenario_type: ScenarioType,
    ) -> Vec<Step>;

    /// [`Lifecycle`] steps of the `scope`. After steps are restricted to their
    /// declared [`Outcome`].
    ///
    /// # Errors
    ///
    /// If candidates cannot be listed, or a starting word is missing.
    fn collect_lifecycle_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        lifecycle: &Lifecycle,
        meta: &Meta,
        stage: Stage,
        scope: Scope,
    ) -> Result<Vec<Step>>;

    /// Steps of a scenario, with the `named` parameters of an examples row.
    ///
    /// # Errors
    ///
    /// If candidates cannot be listed, or a starting word is missing.
    fn collect_scenario_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        steps: &[String],
        named: &Row,
    ) -> Result<Vec<Step>>;
}

/// [`StepCollector`] turning every step no candidate matches into a
/// [`Step::Pending`].
#[derive(Clone, Debug, Default)]
pub struct MarkUnmatchedStepsAsPending {
    finder: StepFinder,
    keywords: Keywords,
}

impl MarkUnmatchedStepsAsPending {
    /// Creates a collector with the given [`StepFinder`] and [`Keywords`].
    #[must_use]
    pub const fn new(finder: StepFinder, keywords: Keywords) -> Self {
        Self { finder, keywords }
    }

    /// Creates a collector with the [`StepFinder`] and [`Keywords`] of the
    /// `configuration`.
    #[must_use]
    pub fn from_configuration(configuration: &Configuration) -> Self {
        Self::new(
            configuration.step_finder().clone(),
            configuration.keywords().clone(),
        )
    }

    /// Matches the textual `steps` in order, appending them to `collected`.
    fn add_matched_steps<'s>(
        &self,
        collected: &mut Vec<Step>,
        steps: impl IntoIterator<Item = &'s str>,
        named: &Row,
        candidates: &[Arc<StepCandidate>],
        outcome: Option<Outcome>,
    ) -> Result<()> {
        let mut previous_non_and = None;
        for step in steps {
            let prioritised = self.finder.prioritise(step, candidates.to_vec());
            collected.push(match_step(
                step,
                previous_non_and,
                named,
                &prioritised,
                outcome,
            )?);
            if !self.keywords.is_and_step(step)
                && !self.keywords.is_ignorable_step(step)
            {
                previous_non_and = Some(step);
            }
        }
        Ok(())
    }
}

/// Creates the steps of the `stage` hooks of every provider.
///
/// Before hooks follow the provider order and, within a provider, ascending
/// [`BeforeOrAfterMethod::order()`]. After hooks follow the reverse provider
/// order and descending order within a provider.
fn hook_steps(
    providers: &[Arc<dyn CandidateSteps>],
    stage: Stage,
    meta: &Meta,
    hooks_of: impl Fn(&dyn CandidateSteps) -> Vec<Arc<BeforeOrAfterMethod>>,
) -> Vec<Step> {
    let mut steps = Vec::new();
    for provider in providers {
        let mut hooks = hooks_of(provider.as_ref());
        hooks.retain(|h| h.stage() == stage);
        match stage {
            Stage::Before => {
                hooks.sort_by_key(|h| h.order());
                steps.extend(hooks.iter().map(|h| h.create_step(meta)));
            }
            Stage::After => {
                hooks.sort_by_key(|h| Reverse(h.order()));
                let provided = hooks
                    .iter()
                    .map(|h| h.create_step_upon_outcome(meta))
                    .collect::<Vec<_>>();
                _ = steps.splice(0..0, provided);
            }
        }
    }
    steps
}

impl StepCollector for MarkUnmatchedStepsAsPending {
    fn collect_before_or_after_stories_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        stage: Stage,
    ) -> Vec<Step> {
        hook_steps(providers, stage, &Meta::new(), |p| {
            p.list_before_or_after_stories()
        })
    }

    fn collect_before_or_after_story_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        story: &Story,
        stage: Stage,
        given_story: bool,
    ) -> Vec<Step> {
        hook_steps(providers, stage, story.meta(), |p| {
            p.list_before_or_after_story(given_story)
        })
    }

    fn collect_before_or_after_scenario_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        meta: &Meta,
        stage: Stage,
        scenario_type: ScenarioType,
    ) -> Vec<Step> {
        hook_steps(providers, stage, meta, |p| {
            p.list_before_or_after_scenario(scenario_type)
        })
    }

    fn collect_lifecycle_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        lifecycle: &Lifecycle,
        meta: &Meta,
        stage: Stage,
        scope: Scope,
    ) -> Result<Vec<Step>> {
        let candidates = self.finder.collect_candidates(providers)?;
        let named = row_with_meta(&Row::new(), meta);
        let mut steps = Vec::new();
        match stage {
            Stage::Before => self.add_matched_steps(
                &mut steps,
                lifecycle.before_steps(scope),
                &named,
                &candidates,
                None,
            )?,
            Stage::After => {
                for outcome in Outcome::ALL {
                    self.add_matched_steps(
                        &mut steps,
                        lifecycle.after_steps(scope, outcome),
                        &named,
                        &candidates,
                        Some(outcome),
                    )?;
                }
            }
        }
        Ok(steps)
    }

    fn collect_scenario_steps(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
        steps: &[String],
        named: &Row,
    ) -> Result<Vec<Step>> {
        let candidates = self.finder.collect_candidates(providers)?;
        let mut collected = Vec::with_capacity(steps.len());
        self.add_matched_steps(
            &mut collected,
            steps.iter().map(String::as_str),
            named,
            &candidates,
            None,
        )?;
        tracing::trace!(count = collected.len(), "collected scenario steps");
        Ok(collected)
    }
}
