// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Counting the results of a run.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::{
    model::{Scenario, Story},
    parameters::Row,
    step::{OutcomesTable, UuidFailure},
};

use super::StoryReporter;

/// Counters of a run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Statistics {
    /// Stories run, excluding given ones.
    pub stories: usize,

    /// Given stories run.
    pub given_stories: usize,

    /// Stories that ran out of time.
    pub stories_cancelled: usize,

    /// Stories skipped by a filter.
    pub stories_not_allowed: usize,

    /// Scenarios run.
    pub scenarios: usize,

    /// Scenarios without failed or pending steps.
    pub scenarios_successful: usize,

    /// Scenarios with at least one failed step.
    pub scenarios_failed: usize,

    /// Scenarios with pending steps but no failed ones.
    pub scenarios_pending: usize,

    /// Scenarios skipped by a filter.
    pub scenarios_not_allowed: usize,

    /// Examples rows run.
    pub examples: usize,

    /// Successful steps.
    pub steps_successful: usize,

    /// Pending steps.
    pub steps_pending: usize,

    /// Steps not performed.
    pub steps_not_performed: usize,

    /// Failed steps.
    pub steps_failed: usize,

    /// Commented-out steps.
    pub steps_ignorable: usize,

    /// Comments.
    pub steps_comment: usize,

    /// Generated pending step definitions.
    pub pending_methods: usize,
}

impl Statistics {
    /// Indicates whether anything failed or was cancelled.
    #[must_use]
    pub const fn has_failures(&self) -> bool {
        self.steps_failed > 0 || self.stories_cancelled > 0
    }
}

/// What happened in the current scenario so far.
#[derive(Clone, Copy, Debug, Default)]
struct ScenarioState {
    failed: bool,
    pending: bool,
}

#[derive(Debug, Default)]
struct Inner {
    statistics: Statistics,
    scenario: Option<ScenarioState>,
}

/// [`StoryReporter`] counting [`Statistics`].
///
/// Clones share the same counters, so one clone may be handed to a runner
/// while another one is kept to read the [`Statistics`] afterwards.
#[derive(Clone, Debug, Default)]
pub struct PostStoryStatisticsCollector {
    inner: Arc<Mutex<Inner>>,
}

impl PostStoryStatisticsCollector {
    /// Creates a [`PostStoryStatisticsCollector`] with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.lock().statistics
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn step(&self, f: impl FnOnce(&mut Statistics, &mut ScenarioState)) {
        let mut inner = self.lock();
        let Inner { statistics, scenario } = &mut *inner;
        let mut outside = ScenarioState::default();
        f(statistics, scenario.as_mut().unwrap_or(&mut outside));
    }
}

impl StoryReporter for PostStoryStatisticsCollector {
    fn story_not_allowed(&mut self, _: &Story, _: &str) {
        self.lock().statistics.stories_not_allowed += 1;
    }

    fn before_story(&mut self, _: &Story, given_story: bool) {
        let mut inner = self.lock();
        let stats = &mut inner.statistics;
        if given_story {
            stats.given_stories += 1;
        } else {
            stats.stories += 1;
        }
    }

    fn scenario_not_allowed(&mut self, _: &Scenario, _: &str) {
        self.lock().statistics.scenarios_not_allowed += 1;
    }

    fn before_scenario(&mut self, _: &str) {
        let mut inner = self.lock();
        inner.statistics.scenarios += 1;
        inner.scenario = Some(ScenarioState::default());
    }

    fn after_scenario(&mut self) {
        let mut inner = self.lock();
        let Some(state) = inner.scenario.take() else {
            return;
        };
        let stats = &mut inner.statistics;
        if state.failed {
            stats.scenarios_failed += 1;
        } else if state.pending {
            stats.scenarios_pending += 1;
        } else {
            stats.scenarios_successful += 1;
        }
    }

    fn example(&mut self, _: &Row, _: usize) {
        self.lock().statistics.examples += 1;
    }

    fn successful(&mut self, _: &str) {
        self.step(|s, _| s.steps_successful += 1);
    }

    fn ignorable(&mut self, _: &str) {
        self.step(|s, _| s.steps_ignorable += 1);
    }

    fn comment(&mut self, _: &str) {
        self.step(|s, _| s.steps_comment += 1);
    }

    fn pending(&mut self, _: &str) {
        self.step(|s, scenario| {
            s.steps_pending += 1;
            scenario.pending = true;
        });
    }

    fn not_performed(&mut self, _: &str) {
        self.step(|s, _| s.steps_not_performed += 1);
    }

    fn failed(&mut self, _: &str, _: &UuidFailure) {
        self.step(|s, scenario| {
            s.steps_failed += 1;
            scenario.failed = true;
        });
    }

    fn failed_outcomes(&mut self, _: &str, _: &OutcomesTable) {
        self.step(|s, scenario| {
            s.steps_failed += 1;
            scenario.failed = true;
        });
    }

    fn pending_methods(&mut self, methods: &[String]) {
        self.lock().statistics.pending_methods += methods.len();
    }

    fn story_cancelled(&mut self, _: &Story, _: Duration) {
        self.lock().statistics.stories_cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_scenarios() {
        let collector = PostStoryStatisticsCollector::new();
        let mut reporter = collector.clone();
        let failure = UuidFailure::wrap("When it breaks", anyhow::anyhow!("boom"));

        reporter.before_story(&Story::new("lift.story"), false);
        reporter.before_scenario("fine");
        reporter.successful("Given it works");
        reporter.after_scenario();
        reporter.before_scenario("broken");
        reporter.pending("Given I am pending");
        reporter.failed("When it breaks", &failure);
        reporter.not_performed("Then it arrives");
        reporter.after_scenario();
        reporter.before_scenario("unfinished");
        reporter.pending("Given I am pending");
        reporter.after_scenario();
        reporter.after_story(false);

        let stats = collector.statistics();
        assert_eq!(stats.stories, 1);
        assert_eq!(stats.scenarios, 3);
        assert_eq!(stats.scenarios_successful, 1);
        assert_eq!(stats.scenarios_failed, 1);
        assert_eq!(stats.scenarios_pending, 1);
        assert_eq!(stats.steps_pending, 2);
        assert_eq!(stats.steps_not_performed, 1);
        assert!(stats.has_failures());
    }

    #[test]
    fn counts_steps_outside_scenarios() {
        let collector = PostStoryStatisticsCollector::new();
        let mut reporter = collector.clone();

        reporter.before_story(&Story::new("given.story"), true);
        reporter.successful("Given the lift is built");
        reporter.pending_methods(&["a".into(), "b".into()]);

        let stats = collector.statistics();
        assert_eq!(stats.given_stories, 1);
        assert_eq!(stats.stories, 0);
        assert_eq!(stats.steps_successful, 1);
        assert_eq!(stats.pending_methods, 2);
        assert_eq!(stats.scenarios, 0);
        assert!(!stats.has_failures());
    }
}
