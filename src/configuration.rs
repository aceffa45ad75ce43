// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`Configuration`] shared by step providers, collectors and runners.

use std::{sync::Arc, time::Duration};

use smart_default::SmartDefault;

use crate::{
    finder::{PrioritisingStrategy, StepFinder},
    keywords::Keywords,
    monitor::{SilentStepMonitor, StepMonitor},
    parameters::{ParameterControls, ParameterConverters},
    pattern::{RegexPrefixCapturingPatternParser, StepPatternParser},
    pending::PendingStepMethodGenerator,
};

/// Everything steps are matched, converted, performed and run with.
///
/// ```rust
/// # use std::time::Duration;
/// # use stepwise::Configuration;
/// let configuration = Configuration::default()
///     .with_threads(4)
///     .with_story_timeout(Some(Duration::from_secs(30)));
///
/// assert_eq!(configuration.threads(), 4);
/// assert!(!configuration.dry_run());
/// ```
#[derive(Clone, Debug, SmartDefault)]
pub struct Configuration {
    /// Starting and reporting words.
    keywords: Keywords,

    /// Compiler of step patterns.
    #[default(Arc::new(RegexPrefixCapturingPatternParser::default()))]
    pattern_parser: Arc<dyn StepPatternParser>,

    /// Converters of raw parameter values.
    parameter_converters: ParameterConverters,

    /// Delimiters of named parameters.
    parameter_controls: ParameterControls,

    /// Observer of matching and performing decisions.
    #[default(Arc::new(SilentStepMonitor))]
    step_monitor: Arc<dyn StepMonitor>,

    /// Collector and prioritiser of candidates.
    step_finder: StepFinder,

    /// Whether user code is never invoked.
    dry_run: bool,

    /// Whether pending steps fail the run.
    fail_on_pending: bool,

    /// Number of stories run at once.
    #[default(1)]
    threads: usize,

    /// Time a single story may run before it's cancelled.
    story_timeout: Option<Duration>,
}

impl Configuration {
    /// Replaces the [`Keywords`].
    #[must_use]
    pub fn with_keywords(mut self, keywords: Keywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// Replaces the [`StepPatternParser`].
    #[must_use]
    pub fn with_pattern_parser(mut self, parser: Arc<dyn StepPatternParser>) -> Self {
        self.pattern_parser = parser;
        self
    }

    /// Replaces the [`ParameterConverters`].
    ///
    /// The converters keep notifying their own [`StepMonitor`].
    #[must_use]
    pub fn with_parameter_converters(mut self, converters: ParameterConverters) -> Self {
        self.parameter_converters = converters;
        self
    }

    /// Replaces the [`ParameterControls`].
    #[must_use]
    pub fn with_parameter_controls(mut self, controls: ParameterControls) -> Self {
        self.parameter_controls = controls;
        self
    }

    /// Replaces the [`StepMonitor`], the one of the current
    /// [`ParameterConverters`] included.
    #[must_use]
    pub fn with_step_monitor(mut self, monitor: Arc<dyn StepMonitor>) -> Self {
        self.parameter_converters =
            self.parameter_converters.with_monitor(Arc::clone(&monitor));
        self.step_monitor = monitor;
        self
    }

    /// Replaces the [`StepFinder`].
    #[must_use]
    pub fn with_step_finder(mut self, finder: StepFinder) -> Self {
        self.step_finder = finder;
        self
    }

    /// Replaces the [`PrioritisingStrategy`] of candidates.
    #[must_use]
    pub fn with_prioritising_strategy(
        self,
        strategy: Arc<dyn PrioritisingStrategy>,
    ) -> Self {
        self.with_step_finder(StepFinder::new(strategy))
    }

    /// Switches dry run on or off.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Switches failing on pending steps on or off.
    #[must_use]
    pub const fn with_fail_on_pending(mut self, fail: bool) -> Self {
        self.fail_on_pending = fail;
        self
    }

    /// Sets the number of stories run at once. `0` is treated as `1`.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Sets the time a single story may run before it's cancelled.
    #[must_use]
    pub const fn with_story_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.story_timeout = timeout;
        self
    }

    /// [`Keywords`] in use.
    #[must_use]
    pub const fn keywords(&self) -> &Keywords {
        &self.keywords
    }

    /// [`StepPatternParser`] in use.
    #[must_use]
    pub fn pattern_parser(&self) -> &dyn StepPatternParser {
        self.pattern_parser.as_ref()
    }

    /// [`ParameterConverters`] in use.
    #[must_use]
    pub const fn parameter_converters(&self) -> &ParameterConverters {
        &self.parameter_converters
    }

    /// [`ParameterControls`] in use.
    #[must_use]
    pub const fn parameter_controls(&self) -> &ParameterControls {
        &self.parameter_controls
    }

    /// [`StepMonitor`] in use.
    #[must_use]
    pub const fn step_monitor(&self) -> &Arc<dyn StepMonitor> {
        &self.step_monitor
    }

    /// [`StepFinder`] in use.
    #[must_use]
    pub const fn step_finder(&self) -> &StepFinder {
        &self.step_finder
    }

    /// Whether user code is never invoked.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Whether pending steps fail the run.
    #[must_use]
    pub const fn fail_on_pending(&self) -> bool {
        self.fail_on_pending
    }

    /// Number of stories run at once.
    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// Time a single story may run before it's cancelled.
    #[must_use]
    pub const fn story_timeout(&self) -> Option<Duration> {
        self.story_timeout
    }

    /// [`PendingStepMethodGenerator`] speaking the current [`Keywords`].
    #[must_use]
    pub fn pending_step_method_generator(&self) -> PendingStepMethodGenerator {
        PendingStepMethodGenerator::new(self.keywords.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::TracingStepMonitor;

    #[test]
    fn defaults() {
        let configuration = Configuration::default();

        assert_eq!(configuration.threads(), 1);
        assert!(!configuration.dry_run());
        assert!(!configuration.fail_on_pending());
        assert_eq!(configuration.story_timeout(), None);
        assert_eq!(configuration.pattern_parser().prefix(), "$");
        assert_eq!(configuration.keywords(), &Keywords::default());
    }

    #[test]
    fn never_runs_on_zero_threads() {
        assert_eq!(Configuration::default().with_threads(0).threads(), 1);
    }

    #[test]
    fn step_monitor_reaches_converters() {
        let configuration = Configuration::default()
            .with_step_monitor(Arc::new(TracingStepMonitor));

        let value = configuration
            .parameter_converters()
            .convert_to::<i32>("42")
            .unwrap();

        assert_eq!(value, 42);
        assert!(
            format!("{:?}", configuration.parameter_converters().monitor())
                .contains("TracingStepMonitor"),
        );
    }
}
