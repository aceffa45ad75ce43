// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Reporting of story runs.
//!
//! A [`StoryReporter`] receives one callback per lifecycle or step event.
//! Reporters are composed with a [`DelegatingStoryReporter`], made safe for
//! concurrent stories with a [`ConcurrentStoryReporter`], and recorded for a
//! later replay with a [`RecordingStoryReporter`].

pub mod concurrent;
pub mod console;
pub mod delegating;
pub mod event;
pub mod stats;

use std::time::Duration;

use crate::{
    model::{Lifecycle, Meta, Narrative, Scenario, Story},
    parameters::{ExamplesTable, Row},
    step::{OutcomesTable, UuidFailure},
};

#[doc(inline)]
pub use self::{
    concurrent::ConcurrentStoryReporter,
    console::ConsoleOutput,
    delegating::DelegatingStoryReporter,
    event::{RecordingStoryReporter, ReporterEvent},
    stats::{PostStoryStatisticsCollector, Statistics},
};

/// Sink of the events of a story run.
///
/// Every method has an empty default body, so a reporter only implements the
/// events it's interested in.
pub trait StoryReporter: Send {
    /// The `story` is skipped because of the `filter`.
    fn story_not_allowed(&mut self, _story: &Story, _filter: &str) {}

    /// The `story` starts, either as a regular or a given one.
    fn before_story(&mut self, _story: &Story, _given_story: bool) {}

    /// The current story ends.
    fn after_story(&mut self, _given_story: bool) {}

    /// [`Narrative`] of the current story.
    fn narrative(&mut self, _narrative: &Narrative) {}

    /// [`Lifecycle`] of the current story.
    fn lifecycle(&mut self, _lifecycle: &Lifecycle) {}

    /// The `scenario` is skipped because of the `filter`.
    fn scenario_not_allowed(&mut self, _scenario: &Scenario, _filter: &str) {}

    /// The scenario with the `title` starts.
    fn before_scenario(&mut self, _title: &str) {}

    /// [`Meta`] of the current scenario.
    fn scenario_meta(&mut self, _meta: &Meta) {}

    /// The current scenario ends.
    fn after_scenario(&mut self) {}

    /// Given stories are about to run.
    fn before_given_stories(&mut self) {}

    /// Paths of the given stories of the current story or scenario.
    fn given_stories(&mut self, _paths: &[String]) {}

    /// Given stories finished.
    fn after_given_stories(&mut self) {}

    /// The scenario `steps` are about to run once per row of the `table`.
    fn before_examples(&mut self, _steps: &[String], _table: &ExamplesTable) {}

    /// The examples `row` at the `index` is about to run.
    fn example(&mut self, _row: &Row, _index: usize) {}

    /// Every examples row finished.
    fn after_examples(&mut self) {}

    /// The `step` is about to be performed.
    fn before_step(&mut self, _step: &str) {}

    /// The `step` succeeded.
    fn successful(&mut self, _step: &str) {}

    /// The `step` is commented out.
    fn ignorable(&mut self, _step: &str) {}

    /// The `step` is a comment.
    fn comment(&mut self, _step: &str) {}

    /// The `step` is pending.
    fn pending(&mut self, _step: &str) {}

    /// The `step` was not performed because of an earlier failure.
    fn not_performed(&mut self, _step: &str) {}

    /// The `step` failed with the `failure`.
    fn failed(&mut self, _step: &str, _failure: &UuidFailure) {}

    /// The `step` failed verifying the outcomes of the `table`.
    fn failed_outcomes(&mut self, _step: &str, _table: &OutcomesTable) {}

    /// Steps run without invoking user code.
    fn dry_run(&mut self) {}

    /// Skeletons of the step definitions pending steps lack.
    fn pending_methods(&mut self, _methods: &[String]) {}

    /// The `step` is restarted after the `failure`.
    fn restarted(&mut self, _step: &str, _failure: &UuidFailure) {}

    /// The `story` is restarted after the `failure`.
    fn restarted_story(&mut self, _story: &Story, _failure: &UuidFailure) {}

    /// The `story` ran out of its `timeout`.
    fn story_cancelled(&mut self, _story: &Story, _timeout: Duration) {}
}

/// [`StoryReporter`] ignoring every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStoryReporter;

impl StoryReporter for NullStoryReporter {}

impl<R: StoryReporter + ?Sized> StoryReporter for Box<R> {
    fn story_not_allowed(&mut self, story: &Story, filter: &str) {
        (**self).story_not_allowed(story, filter);
    }

    fn before_story(&mut self, story: &Story, given_story: bool) {
        (**self).before_story(story, given_story);
    }

    fn after_story(&mut self, given_story: bool) {
        (**self).after_story(given_story);
    }

    fn narrative(&mut self, narrative: &Narrative) {
        (**self).narrative(narrative);
    }

    fn lifecycle(&mut self, lifecycle: &Lifecycle) {
        (**self).lifecycle(lifecycle);
    }

    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        (**self).scenario_not_allowed(scenario, filter);
    }

    fn before_scenario(&mut self, title: &str) {
        (**self).before_scenario(title);
    }

    fn scenario_meta(&mut self, meta: &Meta) {
        (**self).scenario_meta(meta);
    }

    fn after_scenario(&mut self) {
        (**self).after_scenario();
    }

    fn before_given_stories(&mut self) {
        (**self).before_given_stories();
    }

    fn given_stories(&mut self, paths: &[String]) {
        (**self).given_stories(paths);
    }

    fn after_given_stories(&mut self) {
        (**self).after_given_stories();
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) {
        (**self).before_examples(steps, table);
    }

    fn example(&mut self, row: &Row, index: usize) {
        (**self).example(row, index);
    }

    fn after_examples(&mut self) {
        (**self).after_examples();
    }

    fn before_step(&mut self, step: &str) {
        (**self).before_step(step);
    }

    fn successful(&mut self, step: &str) {
        (**self).successful(step);
    }

    fn ignorable(&mut self, step: &str) {
        (**self).ignorable(step);
    }

    fn comment(&mut self, step: &str) {
        (**self).comment(step);
    }

    fn pending(&mut self, step: &str) {
        (**self).pending(step);
    }

    fn not_performed(&mut self, step: &str) {
        (**self).not_performed(step);
    }

    fn failed(&mut self, step: &str, failure: &UuidFailure) {
        (**self).failed(step, failure);
    }

    fn failed_outcomes(&mut self, step: &str, table: &OutcomesTable) {
        (**self).failed_outcomes(step, table);
    }

    fn dry_run(&mut self) {
        (**self).dry_run();
    }

    fn pending_methods(&mut self, methods: &[String]) {
        (**self).pending_methods(methods);
    }

    fn restarted(&mut self, step: &str, failure: &UuidFailure) {
        (**self).restarted(step, failure);
    }

    fn restarted_story(&mut self, story: &Story, failure: &UuidFailure) {
        (**self).restarted_story(story, failure);
    }

    fn story_cancelled(&mut self, story: &Story, timeout: Duration) {
        (**self).story_cancelled(story, timeout);
    }
}
