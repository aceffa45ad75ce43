// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Recorded [`StoryReporter`] events.

use std::time::Duration;

use crate::{
    model::{Lifecycle, Meta, Narrative, Scenario, Story},
    parameters::{ExamplesTable, Row},
    step::{OutcomesTable, UuidFailure},
};

use super::StoryReporter;

/// Single [`StoryReporter`] call with its arguments.
#[derive(Clone, Debug)]
pub enum ReporterEvent {
    /// [`StoryReporter::story_not_allowed()`].
    StoryNotAllowed {
        /// Skipped story.
        story: Story,

        /// Filter skipping it.
        filter: String,
    },

    /// [`StoryReporter::before_story()`].
    BeforeStory {
        /// Starting story.
        story: Story,

        /// Whether it's a given story.
        given_story: bool,
    },

    /// [`StoryReporter::after_story()`].
    AfterStory {
        /// Whether it's a given story.
        given_story: bool,
    },

    /// [`StoryReporter::narrative()`].
    Narrative(Narrative),

    /// [`StoryReporter::lifecycle()`].
    Lifecycle(Lifecycle),

    /// [`StoryReporter::scenario_not_allowed()`].
    ScenarioNotAllowed {
        /// Skipped scenario.
        scenario: Scenario,

        /// Filter skipping it.
        filter: String,
    },

    /// [`StoryReporter::before_scenario()`].
    BeforeScenario {
        /// Title of the scenario.
        title: String,
    },

    /// [`StoryReporter::scenario_meta()`].
    ScenarioMeta(Meta),

    /// [`StoryReporter::after_scenario()`].
    AfterScenario,

    /// [`StoryReporter::before_given_stories()`].
    BeforeGivenStories,

    /// [`StoryReporter::given_stories()`].
    GivenStories {
        /// Paths of the given stories.
        paths: Vec<String>,
    },

    /// [`StoryReporter::after_given_stories()`].
    AfterGivenStories,

    /// [`StoryReporter::before_examples()`].
    BeforeExamples {
        /// Steps run per row.
        steps: Vec<String>,

        /// Examples.
        table: ExamplesTable,
    },

    /// [`StoryReporter::example()`].
    Example {
        /// Examples row.
        row: Row,

        /// Index of the row.
        index: usize,
    },

    /// [`StoryReporter::after_examples()`].
    AfterExamples,

    /// [`StoryReporter::before_step()`].
    BeforeStep {
        /// Step as written.
        step: String,
    },

    /// [`StoryReporter::successful()`].
    Successful {
        /// Parametrised step.
        step: String,
    },

    /// [`StoryReporter::ignorable()`].
    Ignorable {
        /// Step as written.
        step: String,
    },

    /// [`StoryReporter::comment()`].
    Comment {
        /// Comment as written.
        step: String,
    },

    /// [`StoryReporter::pending()`].
    Pending {
        /// Parametrised step.
        step: String,
    },

    /// [`StoryReporter::not_performed()`].
    NotPerformed {
        /// Parametrised step.
        step: String,
    },

    /// [`StoryReporter::failed()`].
    Failed {
        /// Parametrised step.
        step: String,

        /// What it failed with.
        failure: UuidFailure,
    },

    /// [`StoryReporter::failed_outcomes()`].
    FailedOutcomes {
        /// Parametrised step.
        step: String,

        /// Verified outcomes.
        table: OutcomesTable,
    },

    /// [`StoryReporter::dry_run()`].
    DryRun,

    /// [`StoryReporter::pending_methods()`].
    PendingMethods {
        /// Generated skeletons.
        methods: Vec<String>,
    },

    /// [`StoryReporter::restarted()`].
    Restarted {
        /// Restarted step.
        step: String,

        /// Failure causing the restart.
        failure: UuidFailure,
    },

    /// [`StoryReporter::restarted_story()`].
    RestartedStory {
        /// Restarted story.
        story: Story,

        /// Failure causing the restart.
        failure: UuidFailure,
    },

    /// [`StoryReporter::story_cancelled()`].
    StoryCancelled {
        /// Cancelled story.
        story: Story,

        /// Timeout it ran out of.
        timeout: Duration,
    },
}

impl ReporterEvent {
    /// Calls the `reporter` method this event records.
    pub fn replay(&self, reporter: &mut dyn StoryReporter) {
        match self {
            Self::StoryNotAllowed { story, filter } => {
                reporter.story_not_allowed(story, filter);
            }
            Self::BeforeStory { story, given_story } => {
                reporter.before_story(story, *given_story);
            }
            Self::AfterStory { given_story } => reporter.after_story(*given_story),
            Self::Narrative(narrative) => reporter.narrative(narrative),
            Self::Lifecycle(lifecycle) => reporter.lifecycle(lifecycle),
            Self::ScenarioNotAllowed { scenario, filter } => {
                reporter.scenario_not_allowed(scenario, filter);
            }
            Self::BeforeScenario { title } => reporter.before_scenario(title),
            Self::ScenarioMeta(meta) => reporter.scenario_meta(meta),
            Self::AfterScenario => reporter.after_scenario(),
            Self::BeforeGivenStories => reporter.before_given_stories(),
            Self::GivenStories { paths } => reporter.given_stories(paths),
            Self::AfterGivenStories => reporter.after_given_stories(),
            Self::BeforeExamples { steps, table } => {
                reporter.before_examples(steps, table);
            }
            Self::Example { row, index } => reporter.example(row, *index),
            Self::AfterExamples => reporter.after_examples(),
            Self::BeforeStep { step } => reporter.before_step(step),
            Self::Successful { step } => reporter.successful(step),
            Self::Ignorable { step } => reporter.ignorable(step),
            Self::Comment { step } => reporter.comment(step),
            Self::Pending { step } => reporter.pending(step),
            Self::NotPerformed { step } => reporter.not_performed(step),
            Self::Failed { step, failure } => reporter.failed(step, failure),
            Self::FailedOutcomes { step, table } => {
                reporter.failed_outcomes(step, table);
            }
            Self::DryRun => reporter.dry_run(),
            Self::PendingMethods { methods } => reporter.pending_methods(methods),
            Self::Restarted { step, failure } => reporter.restarted(step, failure),
            Self::RestartedStory { story, failure } => {
                reporter.restarted_story(story, failure);
            }
            Self::StoryCancelled { story, timeout } => {
                reporter.story_cancelled(story, *timeout);
            }
        }
    }
}

/// [`StoryReporter`] recording every event as a [`ReporterEvent`].
#[derive(Clone, Debug, Default)]
pub struct RecordingStoryReporter {
    events: Vec<ReporterEvent>,
}

impl RecordingStoryReporter {
    /// Creates an empty [`RecordingStoryReporter`].
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Recorded events, in order.
    #[must_use]
    pub fn events(&self) -> &[ReporterEvent] {
        &self.events
    }

    /// Takes the recorded events out, leaving nothing recorded.
    pub fn take_events(&mut self) -> Vec<ReporterEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replays the recorded events onto the `reporter`, in order.
    pub fn replay(&self, reporter: &mut dyn StoryReporter) {
        for event in &self.events {
            event.replay(reporter);
        }
    }

    fn record(&mut self, event: ReporterEvent) {
        self.events.push(event);
    }
}

impl StoryReporter for RecordingStoryReporter {
    fn story_not_allowed(&mut self, story: &Story, filter: &str) {
        self.record(ReporterEvent::StoryNotAllowed {
            story: story.clone(),
            filter: filter.to_owned(),
        });
    }

    fn before_story(&mut self, story: &Story, given_story: bool) {
        self.record(ReporterEvent::BeforeStory { story: story.clone(), given_story });
    }

    fn after_story(&mut self, given_story: bool) {
        self.record(ReporterEvent::AfterStory { given_story });
    }

    fn narrative(&mut self, narrative: &Narrative) {
        self.record(ReporterEvent::Narrative(narrative.clone()));
    }

    fn lifecycle(&mut self, lifecycle: &Lifecycle) {
        self.record(ReporterEvent::Lifecycle(lifecycle.clone()));
    }

    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        self.record(ReporterEvent::ScenarioNotAllowed {
            scenario: scenario.clone(),
            filter: filter.to_owned(),
        });
    }

    fn before_scenario(&mut self, title: &str) {
        self.record(ReporterEvent::BeforeScenario { title: title.to_owned() });
    }

    fn scenario_meta(&mut self, meta: &Meta) {
        self.record(ReporterEvent::ScenarioMeta(meta.clone()));
    }

    fn after_scenario(&mut self) {
        self.record(ReporterEvent::AfterScenario);
    }

    fn before_given_stories(&mut self) {
        self.record(ReporterEvent::BeforeGivenStories);
    }

    fn given_stories(&mut self, paths: &[String]) {
        self.record(ReporterEvent::GivenStories { paths: paths.to_vec() });
    }

    fn after_given_stories(&mut self) {
        self.record(ReporterEvent::AfterGivenStories);
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) {
        self.record(ReporterEvent::BeforeExamples {
            steps: steps.to_vec(),
            table: table.clone(),
        });
    }

    fn example(&mut self, row: &Row, index: usize) {
        self.record(ReporterEvent::Example { row: row.clone(), index });
    }

    fn after_examples(&mut self) {
        self.record(ReporterEvent::AfterExamples);
    }

    fn before_step(&mut self, step: &str) {
        self.record(ReporterEvent::BeforeStep { step: step.to_owned() });
    }

    fn successful(&mut self, step: &str) {
        self.record(ReporterEvent::Successful { step: step.to_owned() });
    }

    fn ignorable(&mut self, step: &str) {
        self.record(ReporterEvent::Ignorable { step: step.to_owned() });
    }

    fn comment(&mut self, step: &str) {
        self.record(ReporterEvent::Comment { step: step.to_owned() });
    }

    fn pending(&mut self, step: &str) {
        self.record(ReporterEvent::Pending { step: step.to_owned() });
    }

    fn not_performed(&mut self, step: &str) {
        self.record(ReporterEvent::NotPerformed { step: step.to_owned() });
    }

    fn failed(&mut self, step: &str, failure: &UuidFailure) {
        self.record(ReporterEvent::Failed {
            step: step.to_owned(),
            failure: failure.clone(),
        });
    }

    fn failed_outcomes(&mut self, step: &str, table: &OutcomesTable) {
        self.record(ReporterEvent::FailedOutcomes {
            step: step.to_owned(),
            table: table.clone(),
        });
    }

    fn dry_run(&mut self) {
        self.record(ReporterEvent::DryRun);
    }

    fn pending_methods(&mut self, methods: &[String]) {
        self.record(ReporterEvent::PendingMethods { methods: methods.to_vec() });
    }

    fn restarted(&mut self, step: &str, failure: &UuidFailure) {
        self.record(ReporterEvent::Restarted {
            step: step.to_owned(),
            failure: failure.clone(),
        });
    }

    fn restarted_story(&mut self, story: &Story, failure: &UuidFailure) {
        self.record(ReporterEvent::RestartedStory {
            story: story.clone(),
            failure: failure.clone(),
        });
    }

    fn story_cancelled(&mut self, story: &Story, timeout: Duration) {
        self.record(ReporterEvent::StoryCancelled { story: story.clone(), timeout });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_recorded_events_in_order() {
        let failure = UuidFailure::wrap("When it breaks", anyhow::anyhow!("broken"));
        let mut recorded = RecordingStoryReporter::new();
        recorded.before_scenario("Breaking");
        recorded.successful("Given it works");
        recorded.failed("When it breaks", &failure);
        recorded.after_scenario();

        let mut replayed = RecordingStoryReporter::default();
        recorded.replay(&mut replayed);

        assert!(matches!(
            replayed.events(),
            [
                ReporterEvent::BeforeScenario { title },
                ReporterEvent::Successful { .. },
                ReporterEvent::Failed { failure: f, .. },
                ReporterEvent::AfterScenario,
            ] if title == "Breaking" && f.id() == failure.id(),
        ));
    }

    #[test]
    fn takes_events_out() {
        let mut recorded = RecordingStoryReporter::new();
        recorded.dry_run();

        assert_eq!(recorded.take_events().len(), 1);
        assert!(recorded.events().is_empty());
    }
}
