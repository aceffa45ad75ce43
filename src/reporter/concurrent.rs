// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`StoryReporter`] keeping the events of concurrently run stories apart.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use crate::{
    model::{Lifecycle, Meta, Narrative, Scenario, Story},
    parameters::{ExamplesTable, Row},
    step::{OutcomesTable, UuidFailure},
};

use super::{RecordingStoryReporter, StoryReporter};

/// [`StoryReporter`] shared by the stories of a run.
pub type SharedStoryReporter = Arc<Mutex<dyn StoryReporter>>;

/// Wraps a [`StoryReporter`] shared by concurrently run stories.
///
/// When multi-threading, the events of a story are buffered and only passed
/// to the shared reporter on [`ConcurrentStoryReporter::invoke_delayed()`],
/// all at once and under its lock. So the output of a story is never
/// interleaved with the output of another one. Otherwise, events are passed
/// right away.
pub struct ConcurrentStoryReporter {
    delegate: SharedStoryReporter,
    buffered: RecordingStoryReporter,
    multi_threading: bool,
}

impl fmt::Debug for ConcurrentStoryReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentStoryReporter")
            .field("buffered", &self.buffered.events().len())
            .field("multi_threading", &self.multi_threading)
            .finish_non_exhaustive()
    }
}

impl ConcurrentStoryReporter {
    /// Wraps the shared `delegate`, buffering events when
    /// `multi_threading`.
    #[must_use]
    pub fn new(delegate: SharedStoryReporter, multi_threading: bool) -> Self {
        Self {
            delegate,
            buffered: RecordingStoryReporter::new(),
            multi_threading,
        }
    }

    /// Indicates whether events are buffered.
    #[must_use]
    pub const fn is_multi_threading(&self) -> bool {
        self.multi_threading
    }

    /// Passes the buffered events to the shared reporter, in order, while
    /// holding its lock.
    pub fn invoke_delayed(&mut self) {
        let events = self.buffered.take_events();
        if events.is_empty() {
            return;
        }
        let mut delegate =
            self.delegate.lock().unwrap_or_else(PoisonError::into_inner);
        tracing::trace!(count = events.len(), "replaying buffered events");
        for event in &events {
            event.replay(&mut *delegate);
        }
    }

    fn dispatch(&mut self, f: impl FnOnce(&mut dyn StoryReporter)) {
        if self.multi_threading {
            f(&mut self.buffered);
        } else {
            let mut delegate =
                self.delegate.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut *delegate);
        }
    }
}

impl Drop for ConcurrentStoryReporter {
    fn drop(&mut self) {
        self.invoke_delayed();
    }
}

impl StoryReporter for ConcurrentStoryReporter {
    fn story_not_allowed(&mut self, story: &Story, filter: &str) {
        self.dispatch(|r| r.story_not_allowed(story, filter));
    }

    fn before_story(&mut self, story: &Story, given_story: bool) {
        self.dispatch(|r| r.before_story(story, given_story));
    }

    fn after_story(&mut self, given_story: bool) {
        self.dispatch(|r| r.after_story(given_story));
    }

    fn narrative(&mut self, narrative: &Narrative) {
        self.dispatch(|r| r.narrative(narrative));
    }

    fn lifecycle(&mut self, lifecycle: &Lifecycle) {
        self.dispatch(|r| r.lifecycle(lifecycle));
    }

    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        self.dispatch(|r| r.scenario_not_allowed(scenario, filter));
    }

    fn before_scenario(&mut self, title: &str) {
        self.dispatch(|r| r.before_scenario(title));
    }

    fn scenario_meta(&mut self, meta: &Meta) {
        self.dispatch(|r| r.scenario_meta(meta));
    }

    fn after_scenario(&mut self) {
        self.dispatch(|r| r.after_scenario());
    }

    fn before_given_stories(&mut self) {
        self.dispatch(|r| r.before_given_stories());
    }

    fn given_stories(&mut self, paths: &[String]) {
        self.dispatch(|r| r.given_stories(paths));
    }

    fn after_given_stories(&mut self) {
        self.dispatch(|r| r.after_given_stories());
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) {
        self.dispatch(|r| r.before_examples(steps, table));
    }

    fn example(&mut self, row: &Row, index: usize) {
        self.dispatch(|r| r.example(row, index));
    }

    fn after_examples(&mut self) {
        self.dispatch(|r| r.after_examples());
    }

    fn before_step(&mut self, step: &str) {
        self.dispatch(|r| r.before_step(step));
    }

    fn successful(&mut self, step: &str) {
        self.dispatch(|r| r.successful(step));
    }

    fn ignorable(&mut self, step: &str) {
        self.dispatch(|r| r.ignorable(step));
    }

    fn comment(&mut self, step: &str) {
        self.dispatch(|r| r.comment(step));
    }

    fn pending(&mut self, step: &str) {
        self.dispatch(|r| r.pending(step));
    }

    fn not_performed(&mut self, step: &str) {
        self.dispatch(|r| r.not_performed(step));
    }

    fn failed(&mut self, step: &str, failure: &UuidFailure) {
        self.dispatch(|r| r.failed(step, failure));
    }

    fn failed_outcomes(&mut self, step: &str, table: &OutcomesTable) {
        self.dispatch(|r| r.failed_outcomes(step, table));
    }

    fn dry_run(&mut self) {
        self.dispatch(|r| r.dry_run());
    }

    fn pending_methods(&mut self, methods: &[String]) {
        self.dispatch(|r| r.pending_methods(methods));
    }

    fn restarted(&mut self, step: &str, failure: &UuidFailure) {
        self.dispatch(|r| r.restarted(step, failure));
    }

    fn restarted_story(&mut self, story: &Story, failure: &UuidFailure) {
        self.dispatch(|r| r.restarted_story(story, failure));
    }

    fn story_cancelled(&mut self, story: &Story, timeout: Duration) {
        self.dispatch(|r| r.story_cancelled(story, timeout));
    }
}
