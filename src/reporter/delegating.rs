// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Passing events to multiple [`StoryReporter`]s.

use std::{fmt, time::Duration};

use crate::{
    model::{Lifecycle, Meta, Narrative, Scenario, Story},
    parameters::{ExamplesTable, Row},
    step::{OutcomesTable, UuidFailure},
};

use super::StoryReporter;

/// [`StoryReporter`] passing every event to each of its delegates, in the
/// order they were added.
#[derive(Default)]
pub struct DelegatingStoryReporter {
    delegates: Vec<Box<dyn StoryReporter>>,
}

impl fmt::Debug for DelegatingStoryReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegatingStoryReporter")
            .field("delegates", &self.delegates.len())
            .finish()
    }
}

impl DelegatingStoryReporter {
    /// Creates a [`DelegatingStoryReporter`] without delegates.
    #[must_use]
    pub const fn new() -> Self {
        Self { delegates: Vec::new() }
    }

    /// Adds a delegate.
    #[must_use]
    pub fn with(mut self, reporter: impl StoryReporter + 'static) -> Self {
        self.delegates.push(Box::new(reporter));
        self
    }

    /// Adds a delegate.
    pub fn add(&mut self, reporter: Box<dyn StoryReporter>) -> &mut Self {
        self.delegates.push(reporter);
        self
    }

    /// Number of delegates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delegates.len()
    }

    /// Indicates whether there are no delegates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delegates.is_empty()
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn StoryReporter)) {
        for delegate in &mut self.delegates {
            f(delegate.as_mut());
        }
    }
}

impl StoryReporter for DelegatingStoryReporter {
    fn story_not_allowed(&mut self, story: &Story, filter: &str) {
        self.each(|r| r.story_not_allowed(story, filter));
    }

    fn before_story(&mut self, story: &Story, given_story: bool) {
        self.each(|r| r.before_story(story, given_story));
    }

    fn after_story(&mut self, given_story: bool) {
        self.each(|r| r.after_story(given_story));
    }

    fn narrative(&mut self, narrative: &Narrative) {
        self.each(|r| r.narrative(narrative));
    }

    fn lifecycle(&mut self, lifecycle: &Lifecycle) {
        self.each(|r| r.lifecycle(lifecycle));
    }

    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        self.each(|r| r.scenario_not_allowed(scenario, filter));
    }

    fn before_scenario(&mut self, title: &str) {
        self.each(|r| r.before_scenario(title));
    }

    fn scenario_meta(&mut self, meta: &Meta) {
        self.each(|r| r.scenario_meta(meta));
    }

    fn after_scenario(&mut self) {
        self.each(|r| r.after_scenario());
    }

    fn before_given_stories(&mut self) {
        self.each(|r| r.before_given_stories());
    }

    fn given_stories(&mut self, paths: &[String]) {
        self.each(|r| r.given_stories(paths));
    }

    fn after_given_stories(&mut self) {
        self.each(|r| r.after_given_stories());
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) {
        self.each(|r| r.before_examples(steps, table));
    }

    fn example(&mut self, row: &Row, index: usize) {
        self.each(|r| r.example(row, index));
    }

    fn after_examples(&mut self) {
        self.each(|r| r.after_examples());
    }

    fn before_step(&mut self, step: &str) {
        self.each(|r| r.before_step(step));
    }

    fn successful(&mut self, step: &str) {
        self.each(|r| r.successful(step));
    }

    fn ignorable(&mut self, step: &str) {
        self.each(|r| r.ignorable(step));
    }

    fn comment(&mut self, step: &str) {
        self.each(|r| r.comment(step));
    }

    fn pending(&mut self, step: &str) {
        self.each(|r| r.pending(step));
    }

    fn not_performed(&mut self, step: &str) {
        self.each(|r| r.not_performed(step));
    }

    fn failed(&mut self, step: &str, failure: &UuidFailure) {
        self.each(|r| r.failed(step, failure));
    }

    fn failed_outcomes(&mut self, step: &str, table: &OutcomesTable) {
        self.each(|r| r.failed_outcomes(step, table));
    }

    fn dry_run(&mut self) {
        self.each(|r| r.dry_run());
    }

    fn pending_methods(&mut self, methods: &[String]) {
        self.each(|r| r.pending_methods(methods));
    }

    fn restarted(&mut self, step: &str, failure: &UuidFailure) {
        self.each(|r| r.restarted(step, failure));
    }

    fn restarted_story(&mut self, story: &Story, failure: &UuidFailure) {
        self.each(|r| r.restarted_story(story, failure));
    }

    fn story_cancelled(&mut self, story: &Story, timeout: Duration) {
        self.each(|r| r.story_cancelled(story, timeout));
    }
}
