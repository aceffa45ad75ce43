// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Running [`Story`]s.
//!
//! # Order guarantees
//!
//! Steps of a scenario always run sequentially, on a single thread. With more
//! than one [`Configuration::threads()`], whole stories run concurrently, and
//! the events of each story reach the [`StoryReporter`] all at once when the
//! story finishes.
//!
//! Within a story:
//! 1. Before story hooks, given stories and before story [`Lifecycle`] steps.
//! 2. Every scenario:
//!    1. [`ScenarioType::Any`] before hooks and the given stories of the
//!       scenario.
//!    2. Once, or once per examples row: [`ScenarioType::Normal`] (or
//!       [`ScenarioType::Example`]) before hooks, before scenario
//!       [`Lifecycle`] steps, scenario steps, after scenario [`Lifecycle`]
//!       steps and after hooks.
//!    3. [`ScenarioType::Any`] after hooks.
//! 3. After story [`Lifecycle`] steps and after story hooks.
//!
//! Once a step fails or is pending, the following steps of the scenario are
//! not performed, and after hooks run upon a failure.
//!
//! A step failing with a [`RestartingScenarioFailure`] is reported as
//! restarted instead, and the current run of its scenario (2.2 above) starts
//! over.
//!
//! [`RestartingScenarioFailure`]: crate::step::RestartingScenarioFailure
//!
//! [`Lifecycle`]: crate::model::Lifecycle

use std::{
    fmt, mem,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Instant,
};

use derive_more::with_trait::{Display, Error, From};
use itertools::Itertools as _;

use crate::{
    collector::{
        MarkUnmatchedStepsAsPending, ScenarioType, Scope, Stage, StepCollector,
    },
    configuration::Configuration,
    error::ConfigurationError,
    model::{row_with_meta, GivenStories, Meta, Scenario, Story},
    parameters::Row,
    reporter::{
        concurrent::SharedStoryReporter, ConcurrentStoryReporter,
        NullStoryReporter, StoryReporter,
    },
    step::{PendingStep, Step, StepResult, UuidFailure},
    steps::CandidateSteps,
};

/// Summary of a run.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RunOutcome {
    /// Number of stories run, excluding given ones.
    pub stories: usize,

    /// Paths of the stories with failed steps.
    pub failed_stories: Vec<String>,

    /// Paths of the stories that ran out of time.
    pub cancelled_stories: Vec<String>,

    /// Number of failed before or after stories hooks.
    pub failed_hooks: usize,

    /// Number of pending steps.
    pub pending_steps: usize,

    /// Generated step definitions of the pending steps, without duplicates.
    pub pending_methods: Vec<String>,
}

impl RunOutcome {
    /// Indicates whether nothing failed and nothing was cancelled.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_stories.is_empty()
            && self.cancelled_stories.is_empty()
            && self.failed_hooks == 0
    }

    fn absorb(&mut self, story: StoryOutcome) {
        self.stories += 1;
        if story.failed {
            self.failed_stories.push(story.path.clone());
        }
        if story.cancelled {
            self.cancelled_stories.push(story.path);
        }
        self.pending_steps += story.pending_steps;
        for method in story.pending_methods {
            if !self.pending_methods.contains(&method) {
                self.pending_methods.push(method);
            }
        }
    }
}

/// Error of [`StoryRunner::run_stories()`].
#[derive(Clone, Debug, Display, Error, From)]
pub enum RunError {
    /// Steps could not be collected.
    #[display("{_0}")]
    #[from]
    Configuration(ConfigurationError),

    /// Some stories failed, or ran out of time.
    #[display(
        "{} of {} stories failed, {} cancelled",
        _0.failed_stories.len(),
        _0.stories,
        _0.cancelled_stories.len(),
    )]
    StoriesFailed(#[error(not(source))] RunOutcome),

    /// Pending steps were found while they are not allowed.
    #[display("{} pending steps found", _0.pending_steps)]
    PendingStepsFound(#[error(not(source))] RunOutcome),
}

impl RunError {
    /// [`RunOutcome`] of the run, unless steps could not be collected.
    #[must_use]
    pub const fn outcome(&self) -> Option<&RunOutcome> {
        match self {
            Self::Configuration(_) => None,
            Self::StoriesFailed(o) | Self::PendingStepsFound(o) => Some(o),
        }
    }
}

/// Runs [`Story`]s with the steps of its [`CandidateSteps`] providers.
///
/// Providers are expected to share the [`Configuration`] of this runner, as
/// a dry run is decided by the configuration of each matched step.
pub struct StoryRunner<C = MarkUnmatchedStepsAsPending> {
    configuration: Arc<Configuration>,
    providers: Vec<Arc<dyn CandidateSteps>>,
    collector: C,
    reporter: SharedStoryReporter,
}

impl<C: fmt::Debug> fmt::Debug for StoryRunner<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryRunner")
            .field("configuration", &self.configuration)
            .field("providers", &self.providers.len())
            .field("collector", &self.collector)
            .finish_non_exhaustive()
    }
}

impl StoryRunner {
    /// Creates a [`StoryRunner`] collecting steps with a
    /// [`MarkUnmatchedStepsAsPending`] and reporting nowhere.
    #[must_use]
    pub fn new(configuration: Arc<Configuration>) -> Self {
        let collector =
            MarkUnmatchedStepsAsPending::from_configuration(&configuration);
        Self {
            configuration,
            providers: Vec::new(),
            collector,
            reporter: Arc::new(Mutex::new(NullStoryReporter)),
        }
    }
}

impl<C> StoryRunner<C> {
    /// Replaces the [`StepCollector`].
    #[must_use]
    pub fn with_collector<D: StepCollector>(self, collector: D) -> StoryRunner<D> {
        let Self { configuration, providers, reporter, .. } = self;
        StoryRunner { configuration, providers, collector, reporter }
    }

    /// Adds a provider of steps.
    #[must_use]
    pub fn with_steps(mut self, steps: impl CandidateSteps + 'static) -> Self {
        self.providers.push(Arc::new(steps));
        self
    }

    /// Adds an already shared provider of steps.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn CandidateSteps>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Sets the [`StoryReporter`] receiving the events of the run.
    #[must_use]
    pub fn with_reporter(mut self, reporter: impl StoryReporter + 'static) -> Self {
        self.reporter = Arc::new(Mutex::new(reporter));
        self
    }

    /// Sets the [`StoryReporter`] receiving the events of the run, keeping it
    /// accessible to the caller.
    #[must_use]
    pub fn with_shared_reporter(mut self, reporter: SharedStoryReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// [`Configuration`] of the run.
    #[must_use]
    pub const fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    /// Providers of steps, in declaration order.
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn CandidateSteps>] {
        &self.providers
    }
}

impl<C: StepCollector + Sync> StoryRunner<C> {
    /// Runs the `stories`, surrounded by the before and after stories hooks.
    ///
    /// # Errors
    ///
    /// - [`RunError::Configuration`] if steps could not be collected.
    /// - [`RunError::StoriesFailed`] if a step or a stories hook failed, or a
    ///   story ran out of time.
    /// - [`RunError::PendingStepsFound`] on pending steps, if
    ///   [`Configuration::fail_on_pending()`].
    pub fn run_stories(&self, stories: &[Story]) -> Result<RunOutcome, RunError> {
        for provider in &self.providers {
            _ = provider.list_candidates()?;
        }
        let mut outcome = RunOutcome::default();

        outcome.failed_hooks += self.run_stories_hooks(Stage::Before);
        for story in self.run_each(stories)? {
            outcome.absorb(story);
        }
        outcome.failed_hooks += self.run_stories_hooks(Stage::After);

        tracing::debug!(
            stories = outcome.stories,
            failed = outcome.failed_stories.len(),
            cancelled = outcome.cancelled_stories.len(),
            pending = outcome.pending_steps,
            "finished stories",
        );
        if !outcome.is_success() {
            Err(RunError::StoriesFailed(outcome))
        } else if self.configuration.fail_on_pending() && outcome.pending_steps > 0 {
            Err(RunError::PendingStepsFound(outcome))
        } else {
            Ok(outcome)
        }
    }

    /// Returns the number of failed hooks.
    fn run_stories_hooks(&self, stage: Stage) -> usize {
        let hooks = self
            .collector
            .collect_before_or_after_stories_steps(&self.providers, stage);
        if hooks.is_empty() {
            return 0;
        }
        let reporter = ConcurrentStoryReporter::new(Arc::clone(&self.reporter), false);
        let mut context = StoryContext::new(self, reporter, None);
        context.run_steps(&hooks);
        context.failed_steps
    }

    fn run_each(&self, stories: &[Story]) -> Result<Vec<StoryOutcome>, ConfigurationError> {
        let threads = self.configuration.threads().min(stories.len());
        if threads <= 1 {
            return stories.iter().map(|s| self.run_story(s, false)).collect();
        }

        tracing::debug!(threads, stories = stories.len(), "running stories concurrently");
        let next = AtomicUsize::new(0);
        let finished = Mutex::new(Vec::with_capacity(stories.len()));
        thread::scope(|scope| {
            for _ in 0..threads {
                _ = scope.spawn(|| loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(story) = stories.get(index) else {
                        break;
                    };
                    let outcome = self.run_story(story, true);
                    finished
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push((index, outcome));
                });
            }
        });

        finished
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .sorted_by_key(|(index, _)| *index)
            .map(|(_, outcome)| outcome)
            .collect()
    }

    fn run_story(
        &self,
        story: &Story,
        multi_threading: bool,
    ) -> Result<StoryOutcome, ConfigurationError> {
        tracing::debug!(story = story.path(), "running story");
        let reporter =
            ConcurrentStoryReporter::new(Arc::clone(&self.reporter), multi_threading);
        let mut context = StoryContext::new(self, reporter, Some(story));

        _ = context.run_story(story, false)?;
        let pending_methods = context.report_pending_methods();
        context.reporter.after_story(false);
        context.reporter.invoke_delayed();

        Ok(StoryOutcome {
            path: story.path().to_owned(),
            failed: context.failed_steps > 0,
            cancelled: context.cancelled,
            pending_steps: context.pending_steps,
            pending_methods,
        })
    }
}

/// What happened in a single story.
#[derive(Debug)]
struct StoryOutcome {
    path: String,
    failed: bool,
    cancelled: bool,
    pending_steps: usize,
    pending_methods: Vec<String>,
}

/// Progress of the steps performed so far.
#[derive(Clone, Debug, Default)]
enum State {
    /// Every step succeeded.
    #[default]
    FineSoFar,

    /// A step failed or is pending.
    SomethingHappened(UuidFailure),
}

impl State {
    fn run(&self, step: &Step) -> StepResult {
        match self {
            Self::FineSoFar => step.perform(None),
            Self::SomethingHappened(failure) => step.do_not_perform(Some(failure)),
        }
    }

    fn record(&mut self, result: &StepResult) {
        if let Self::SomethingHappened(_) = self {
            return;
        }
        match result {
            StepResult::Failed { failure, .. } => {
                *self = Self::SomethingHappened(failure.clone());
            }
            StepResult::Pending { step, pending, .. } => {
                *self = Self::SomethingHappened(UuidFailure::wrap(
                    step.as_str(),
                    pending.clone().into(),
                ));
            }
            StepResult::Successful { .. }
            | StepResult::NotPerformed { .. }
            | StepResult::Ignorable { .. }
            | StepResult::Comment { .. }
            | StepResult::Skipped => {}
        }
    }

    /// Keeps the earliest failure.
    fn or(self, other: Self) -> Self {
        match self {
            Self::SomethingHappened(_) => self,
            Self::FineSoFar => other,
        }
    }
}

/// Running state of a single story, given stories included.
struct StoryContext<'r, C> {
    runner: &'r StoryRunner<C>,
    reporter: ConcurrentStoryReporter,
    story: Option<&'r Story>,
    started: Instant,
    state: State,
    cancelled: bool,
    failed_steps: usize,
    pending_steps: usize,
    pending: Vec<PendingStep>,

    /// Whether the steps being run belong to a single scenario run, which
    /// can be restarted.
    restartable: bool,

    /// Whether a step asked for its scenario to restart.
    restarting: bool,
}

impl<'r, C: StepCollector> StoryContext<'r, C> {
    fn new(
        runner: &'r StoryRunner<C>,
        reporter: ConcurrentStoryReporter,
        story: Option<&'r Story>,
    ) -> Self {
        Self {
            runner,
            reporter,
            story,
            started: Instant::now(),
            state: State::FineSoFar,
            cancelled: false,
            failed_steps: 0,
            pending_steps: 0,
            pending: Vec::new(),
            restartable: false,
            restarting: false,
        }
    }

    /// Indicates whether the story ran out of time, reporting it the first
    /// time it does.
    fn is_cancelled(&mut self) -> bool {
        if self.cancelled {
            return true;
        }
        let (Some(story), Some(timeout)) =
            (self.story, self.runner.configuration.story_timeout())
        else {
            return false;
        };
        if self.started.elapsed() < timeout {
            return false;
        }
        tracing::debug!(story = story.path(), ?timeout, "story cancelled");
        self.reporter.story_cancelled(story, timeout);
        self.cancelled = true;
        true
    }

    fn run_steps(&mut self, steps: &[Step]) {
        for step in steps {
            if self.restarting {
                return;
            }
            if self.is_cancelled() {
                if !step.is_hook() {
                    self.reporter.not_performed(step.as_str());
                }
                self.run_steps(step.composed());
                continue;
            }

            let result = self.state.run(step);
            if matches!(result, StepResult::Skipped) {
                continue;
            }
            self.reporter.before_step(step.as_str());
            if let Some(failure) = result
                .failure()
                .filter(|f| self.restartable && f.is_restarting_scenario())
            {
                self.reporter.restarted(step.as_str(), failure);
                self.restarting = true;
                return;
            }
            result.describe_to(&mut self.reporter);
            if result.is_failed() {
                self.failed_steps += 1;
            }
            if result.is_pending() {
                self.pending_steps += 1;
                if let Some(pending) = step.as_pending().filter(|p| !p.is_annotated()) {
                    self.pending.push(pending.clone());
                }
            }
            self.state.record(&result);

            self.run_steps(step.composed());
        }
    }

    /// Runs the `story`, leaving the [`State`] of the caller untouched.
    ///
    /// Returns the [`State`] the story ended in. The closing
    /// [`StoryReporter::after_story()`] of a regular story is left to the
    /// caller, as pending methods are reported before it.
    fn run_story(
        &mut self,
        story: &Story,
        given_story: bool,
    ) -> Result<State, ConfigurationError> {
        let runner = self.runner;
        let (providers, collector) = (&runner.providers, &runner.collector);
        let caller = mem::take(&mut self.state);

        self.reporter.before_story(story, given_story);
        if !given_story && runner.configuration.dry_run() {
            self.reporter.dry_run();
        }
        self.reporter.narrative(story.narrative());
        self.reporter.lifecycle(story.lifecycle());

        self.run_steps(&collector.collect_before_or_after_story_steps(
            providers,
            story,
            Stage::Before,
            given_story,
        ));
        self.run_given_stories(story.given_stories())?;
        self.run_steps(&collector.collect_lifecycle_steps(
            providers,
            story.lifecycle(),
            story.meta(),
            Stage::Before,
            Scope::Story,
        )?);

        let before = self.state.clone();
        let mut scenarios = State::FineSoFar;
        for scenario in story.scenarios() {
            self.state = before.clone();
            self.run_scenario(story, scenario)?;
            scenarios = scenarios.or(mem::take(&mut self.state));
        }
        self.state = before.or(scenarios);

        self.run_steps(&collector.collect_lifecycle_steps(
            providers,
            story.lifecycle(),
            story.meta(),
            Stage::After,
            Scope::Story,
        )?);
        self.run_steps(&collector.collect_before_or_after_story_steps(
            providers,
            story,
            Stage::After,
            given_story,
        ));

        if given_story {
            self.reporter.after_story(true);
        }
        Ok(mem::replace(&mut self.state, caller))
    }

    fn run_given_stories(
        &mut self,
        given: &GivenStories,
    ) -> Result<(), ConfigurationError> {
        if given.is_empty() {
            return Ok(());
        }
        let paths = given.paths().into_iter().map(str::to_owned).collect_vec();
        self.reporter.before_given_stories();
        self.reporter.given_stories(&paths);
        for story in given.stories() {
            let ended = self.run_story(story, true)?;
            self.state = mem::take(&mut self.state).or(ended);
        }
        self.reporter.after_given_stories();
        Ok(())
    }

    fn run_scenario(
        &mut self,
        story: &Story,
        scenario: &Scenario,
    ) -> Result<(), ConfigurationError> {
        let runner = self.runner;
        let (providers, collector) = (&runner.providers, &runner.collector);
        let meta = scenario.meta().inherit_from(story.meta());

        self.reporter.before_scenario(scenario.title());
        self.reporter.scenario_meta(&meta);
        self.run_steps(&collector.collect_before_or_after_scenario_steps(
            providers,
            &meta,
            Stage::Before,
            ScenarioType::Any,
        ));
        self.run_given_stories(scenario.given_stories())?;

        let examples = scenario.examples();
        if examples.is_empty() {
            self.run_scenario_steps(story, scenario, &meta, &Row::new(), ScenarioType::Normal)?;
        } else {
            self.reporter.before_examples(scenario.steps_as_strings(), examples);
            let entry = self.state.clone();
            let mut rows = State::FineSoFar;
            for (index, row) in examples.rows().iter().enumerate() {
                self.reporter.example(row, index);
                self.state = entry.clone();
                self.run_scenario_steps(story, scenario, &meta, row, ScenarioType::Example)?;
                rows = rows.or(mem::take(&mut self.state));
            }
            self.state = entry.or(rows);
            self.reporter.after_examples();
        }

        self.run_steps(&collector.collect_before_or_after_scenario_steps(
            providers,
            &meta,
            Stage::After,
            ScenarioType::Any,
        ));
        self.reporter.after_scenario();
        Ok(())
    }

    /// Runs the steps of a single scenario run, again from the start for as
    /// long as one of them asks for a restart.
    fn run_scenario_steps(
        &mut self,
        story: &Story,
        scenario: &Scenario,
        meta: &Meta,
        row: &Row,
        scenario_type: ScenarioType,
    ) -> Result<(), ConfigurationError> {
        let entry = self.state.clone();
        self.restartable = true;
        loop {
            let ran = self.run_restartable_steps(story, scenario, meta, row, scenario_type);
            if ran.is_err() || !mem::take(&mut self.restarting) {
                self.restartable = false;
                return ran;
            }
            tracing::debug!(scenario = scenario.title(), "restarting scenario");
            self.state = entry.clone();
        }
    }

    fn run_restartable_steps(
        &mut self,
        story: &Story,
        scenario: &Scenario,
        meta: &Meta,
        row: &Row,
        scenario_type: ScenarioType,
    ) -> Result<(), ConfigurationError> {
        let runner = self.runner;
        let (providers, collector) = (&runner.providers, &runner.collector);
        let named = row_with_meta(row, meta);
        let named_meta = named.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Meta>();

        self.run_steps(&collector.collect_before_or_after_scenario_steps(
            providers,
            meta,
            Stage::Before,
            scenario_type,
        ));
        self.run_steps(&collector.collect_lifecycle_steps(
            providers,
            story.lifecycle(),
            &named_meta,
            Stage::Before,
            Scope::Scenario,
        )?);
        self.run_steps(&collector.collect_scenario_steps(
            providers,
            scenario.steps_as_strings(),
            &named,
        )?);
        self.run_steps(&collector.collect_lifecycle_steps(
            providers,
            story.lifecycle(),
            &named_meta,
            Stage::After,
            Scope::Scenario,
        )?);
        self.run_steps(&collector.collect_before_or_after_scenario_steps(
            providers,
            meta,
            Stage::After,
            scenario_type,
        ));
        Ok(())
    }

    /// Generates and reports step definitions of the pending steps.
    fn report_pending_methods(&mut self) -> Vec<String> {
        let generator = self.runner.configuration.pending_step_method_generator();
        let methods = self
            .pending
            .iter()
            .filter_map(|step| {
                generator
                    .generate_method(step)
                    .map_err(|e| {
                        tracing::warn!(
                            step = step.step_as_string(),
                            error = %e,
                            "cannot generate pending step method",
                        );
                    })
                    .ok()
            })
            .unique()
            .collect_vec();
        if !methods.is_empty() {
            self.reporter.pending_methods(&methods);
        }
        methods
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        collector::Outcome,
        keywords::StepType,
        model::Lifecycle,
        parameters::ExamplesTable,
        reporter::{RecordingStoryReporter, ReporterEvent},
        step::{RestartingScenarioFailure, ScenarioFailure},
        steps::{HookOptions, StepOptions, Steps},
    };

    type Log = Arc<Mutex<Vec<String>>>;

    fn lift(configuration: &Arc<Configuration>, log: &Log) -> Steps<Log> {
        let mut steps = Steps::new(Arc::clone(configuration), Arc::clone(log));
        _ = steps
            .given("the lift is on floor $floor", |log: &mut Log, floor: i32| {
                log.lock().unwrap().push(format!("on {floor}"));
            })
            .when("it breaks", |_: &mut Log| -> anyhow::Result<()> {
                anyhow::bail!("cable snapped")
            })
            .when("I press $floor", |log: &mut Log, floor: i32| {
                log.lock().unwrap().push(format!("press {floor}"));
            })
            .when("it stalls", |log: &mut Log| -> anyhow::Result<()> {
                let mut log = log.lock().unwrap();
                if log.iter().any(|e| e == "stalled") {
                    return Ok(());
                }
                log.push("stalled".to_owned());
                Err(RestartingScenarioFailure::new("motor stalled").into())
            })
            .then("it arrives", |log: &mut Log| {
                log.lock().unwrap().push("arrived".to_owned());
            })
            .composite(StepType::Given, "the lift is serviced", ["When I press 0"])
            .hook(
                HookOptions::after_scenario().outcome(Outcome::Failure),
                |log: &mut Log, failure: ScenarioFailure| {
                    let cause = failure.0.map(|f| f.to_string()).unwrap_or_default();
                    log.lock().unwrap().push(format!("failed: {cause}"));
                },
            );
        steps
    }

    fn run(
        configuration: Configuration,
        stories: &[Story],
    ) -> (Log, Vec<ReporterEvent>, Result<RunOutcome, RunError>) {
        let configuration = Arc::new(configuration);
        let log = Log::default();
        let recording = Arc::new(Mutex::new(RecordingStoryReporter::new()));
        let result = StoryRunner::new(Arc::clone(&configuration))
            .with_steps(lift(&configuration, &log))
            .with_shared_reporter(recording.clone())
            .run_stories(stories);
        let events = recording.lock().unwrap().take_events();
        (log, events, result)
    }

    fn story(steps: &[&str]) -> Story {
        Story::new("lift.story")
            .scenario(Scenario::new("ride").steps(steps.iter().copied()))
    }

    #[test]
    fn stops_performing_after_failure() {
        let (log, events, result) = run(
            Configuration::default(),
            &[story(&["Given the lift is on floor 3", "When it breaks", "Then it arrives"])],
        );

        assert_eq!(log.lock().unwrap().as_slice(), ["on 3", "failed: cable snapped"]);
        assert!(events.iter().any(|e| matches!(
            e,
            ReporterEvent::NotPerformed { step } if step == "Then it arrives",
        )));
        let outcome = result.unwrap_err().outcome().cloned().unwrap();
        assert_eq!(outcome.failed_stories, ["lift.story"]);
    }

    #[test]
    fn runs_scenario_once_per_example() {
        let scenario = Scenario::new("ride")
            .steps(["Given the lift is on floor <from>", "When I press <to>"])
            .with_examples(ExamplesTable::parse("|from|to|\n|1|4|\n|2|5|"));
        let (log, events, result) = run(
            Configuration::default(),
            &[Story::new("lift.story").scenario(scenario)],
        );

        assert!(result.unwrap().is_success());
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["on 1", "press 4", "on 2", "press 5"],
        );
        let indices = events
            .iter()
            .filter_map(|e| match e {
                ReporterEvent::Example { index, .. } => Some(*index),
                _ => None,
            })
            .collect_vec();
        assert_eq!(indices, [0, 1]);
    }

    #[test]
    fn reports_pending_methods() {
        let (_, events, result) = run(
            Configuration::default().with_fail_on_pending(true),
            &[story(&["Given the lift is on floor 1", "When I am pending", "Then it arrives"])],
        );

        let Err(RunError::PendingStepsFound(outcome)) = result else {
            panic!("expected pending steps, got {result:?}");
        };
        assert_eq!(outcome.pending_steps, 1);
        assert!(outcome.pending_methods[0].contains("whenIAmPending"));
        assert!(events.iter().any(|e| matches!(e, ReporterEvent::PendingMethods { .. })));
    }

    #[test]
    fn cancels_story_out_of_time() {
        let (log, events, result) = run(
            Configuration::default().with_story_timeout(Some(Duration::ZERO)),
            &[story(&["Given the lift is on floor 3", "Then it arrives"])],
        );

        assert!(log.lock().unwrap().is_empty());
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ReporterEvent::StoryCancelled { .. }))
                .count(),
            1,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            ReporterEvent::NotPerformed { step } if step == "Then it arrives",
        )));
        let outcome = result.unwrap_err().outcome().cloned().unwrap();
        assert_eq!(outcome.cancelled_stories, ["lift.story"]);
    }

    #[test]
    fn reports_composed_steps_of_cancelled_story_as_not_performed() {
        let (log, events, _) = run(
            Configuration::default().with_story_timeout(Some(Duration::ZERO)),
            &[story(&["Given the lift is serviced", "Then it arrives"])],
        );

        assert!(log.lock().unwrap().is_empty());
        let not_performed = events
            .iter()
            .filter_map(|e| match e {
                ReporterEvent::NotPerformed { step } => Some(step.as_str()),
                _ => None,
            })
            .collect_vec();
        assert_eq!(
            not_performed,
            ["Given the lift is serviced", "When I press 0", "Then it arrives"],
        );
    }

    #[test]
    fn restarts_scenario_on_request() {
        let (log, events, result) = run(
            Configuration::default(),
            &[story(&["Given the lift is on floor 1", "When it stalls", "Then it arrives"])],
        );

        assert!(result.unwrap().is_success());
        assert_eq!(
            log.lock().unwrap().as_slice(),
            ["on 1", "stalled", "on 1", "arrived"],
        );
        let restarted = events
            .iter()
            .filter_map(|e| match e {
                ReporterEvent::Restarted { step, failure } => {
                    Some((step.as_str(), failure.to_string()))
                }
                _ => None,
            })
            .collect_vec();
        assert_eq!(
            restarted,
            [("When it stalls", "Restarting scenario: motor stalled".to_owned())],
        );
        assert!(!events.iter().any(|e| matches!(e, ReporterEvent::Failed { .. })));
    }

    #[test]
    fn never_invokes_steps_in_dry_run() {
        let (log, events, result) = run(
            Configuration::default().with_dry_run(true),
            &[story(&["Given the lift is on floor 3", "When it breaks", "Then it arrives"])],
        );

        assert!(result.unwrap().is_success());
        assert!(log.lock().unwrap().is_empty());
        assert!(events.iter().any(|e| matches!(e, ReporterEvent::DryRun)));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, ReporterEvent::Successful { .. }))
                .count(),
            3,
        );
    }

    #[test]
    fn runs_given_stories_and_lifecycle_first() {
        let given = Story::new("built.story")
            .scenario(Scenario::new("build").step("Given the lift is on floor 0"));
        let main = story(&["When I press 2"])
            .with_given_stories(GivenStories::new([given]))
            .with_lifecycle(
                Lifecycle::new().with_before(Scope::Scenario, ["Given the lift is on floor 1"]),
            );

        let (log, events, _) = run(Configuration::default(), &[main]);

        assert_eq!(log.lock().unwrap().as_slice(), ["on 0", "on 1", "press 2"]);
        assert!(events.iter().any(|e| matches!(
            e,
            ReporterEvent::GivenStories { paths } if paths == &["built.story"],
        )));
    }

    #[test]
    fn keeps_events_of_concurrent_stories_together() {
        let stories = (0..6)
            .map(|i| {
                Story::new(format!("{i}.story")).scenario(
                    Scenario::new("ride")
                        .steps([format!("Given the lift is on floor {i}"), "Then it arrives".into()]),
                )
            })
            .collect_vec();

        let (log, events, result) =
            run(Configuration::default().with_threads(4), &stories);

        assert_eq!(result.unwrap().stories, 6);
        assert_eq!(log.lock().unwrap().len(), 12);
        let mut current = None;
        for event in &events {
            match event {
                ReporterEvent::BeforeStory { story, .. } => {
                    assert!(current.is_none(), "story started before {current:?} ended");
                    current = Some(story.path().to_owned());
                }
                ReporterEvent::AfterStory { .. } => current = None,
                _ => assert!(current.is_some(), "event outside of a story: {event:?}"),
            }
        }
    }
}
