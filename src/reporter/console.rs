// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Plain text [`StoryReporter`].

use std::{fmt, io, time::Duration};

use console::Term;
use itertools::Itertools as _;

use crate::{
    collector::{Outcome, Scope},
    keywords::{keys, Keywords},
    model::{Lifecycle, Meta, Narrative, Scenario, Story},
    parameters::{
        ExamplesTable, Row, PARAMETER_TABLE_END, PARAMETER_TABLE_START,
        PARAMETER_VALUE_END, PARAMETER_VALUE_NEWLINE, PARAMETER_VALUE_START,
    },
    step::{OutcomesTable, UuidFailure},
};

use super::StoryReporter;

/// [`StoryReporter`] writing plain text lines, without any styling.
///
/// Steps that didn't succeed are suffixed with their reporting keyword, like
/// `When I am pending (PENDING)`.
pub struct ConsoleOutput<Out: io::Write = Term> {
    output: Out,
    keywords: Keywords,
}

impl<Out: io::Write> fmt::Debug for ConsoleOutput<Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleOutput").finish_non_exhaustive()
    }
}

impl ConsoleOutput {
    /// Creates a [`ConsoleOutput`] writing to the standard output.
    #[must_use]
    pub fn stdout(keywords: Keywords) -> Self {
        Self::new(Term::stdout(), keywords)
    }

    /// Creates a [`ConsoleOutput`] writing to the standard error.
    #[must_use]
    pub fn stderr(keywords: Keywords) -> Self {
        Self::new(Term::stderr(), keywords)
    }
}

impl<Out: io::Write> ConsoleOutput<Out> {
    /// Creates a [`ConsoleOutput`] writing to the `output`.
    #[must_use]
    pub const fn new(output: Out, keywords: Keywords) -> Self {
        Self { output, keywords }
    }

    /// Returns the underlying output.
    #[must_use]
    pub fn into_inner(self) -> Out {
        self.output
    }

    fn word(&self, key: &str) -> &str {
        self.keywords.word(key)
    }

    fn write_line(&mut self, line: impl AsRef<str>) {
        let line = console::strip_ansi_codes(line.as_ref());
        if let Err(e) = writeln!(self.output, "{line}") {
            tracing::warn!(error = %e, "failed to write report line");
        }
    }

    fn write_step(&mut self, step: &str, key: &str) {
        let line = format!("{} ({})", plain(step), self.word(key));
        self.write_line(line);
    }
}

/// Removes the parameter markers from a parametrised step.
fn plain(step: &str) -> String {
    step.chars()
        .filter(|c| {
            ![
                PARAMETER_VALUE_START,
                PARAMETER_VALUE_END,
                PARAMETER_TABLE_START,
                PARAMETER_TABLE_END,
            ]
            .contains(c)
        })
        .map(|c| if c == PARAMETER_VALUE_NEWLINE { '\n' } else { c })
        .collect()
}

impl<Out: io::Write + Send> StoryReporter for ConsoleOutput<Out> {
    fn story_not_allowed(&mut self, story: &Story, filter: &str) {
        self.write_line(format!(
            "{} (not allowed by filter: {filter})",
            story.path(),
        ));
    }

    fn before_story(&mut self, story: &Story, given_story: bool) {
        if !story.description().is_empty() {
            self.write_line(story.description());
        }
        let given = if given_story { "given " } else { "" };
        self.write_line(format!("({given}{})", story.path()));
    }

    fn after_story(&mut self, _: bool) {
        self.write_line("");
    }

    fn narrative(&mut self, narrative: &Narrative) {
        if narrative.is_empty() {
            return;
        }
        self.write_line(self.word(keys::NARRATIVE).to_owned());
        for (prefix, text) in [
            ("In order to", &narrative.in_order_to),
            ("As a", &narrative.as_a),
            ("I want to", &narrative.i_want_to),
        ] {
            if !text.is_empty() {
                self.write_line(format!("{prefix} {text}"));
            }
        }
    }

    fn lifecycle(&mut self, lifecycle: &Lifecycle) {
        if lifecycle.is_empty() {
            return;
        }
        self.write_line(self.word(keys::LIFECYCLE).to_owned());
        let before = [Scope::Story, Scope::Scenario]
            .into_iter()
            .flat_map(|scope| lifecycle.before_steps(scope))
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if !before.is_empty() {
            self.write_line(self.word(keys::BEFORE).to_owned());
            for step in before {
                self.write_line(step);
            }
        }
        let after = [Scope::Story, Scope::Scenario]
            .into_iter()
            .cartesian_product(Outcome::ALL)
            .flat_map(|(scope, outcome)| lifecycle.after_steps(scope, outcome))
            .map(str::to_owned)
            .collect::<Vec<_>>();
        if !after.is_empty() {
            self.write_line(self.word(keys::AFTER).to_owned());
            for step in after {
                self.write_line(step);
            }
        }
    }

    fn scenario_not_allowed(&mut self, scenario: &Scenario, filter: &str) {
        self.write_line(format!(
            "{} {} (not allowed by filter: {filter})",
            self.word(keys::SCENARIO),
            scenario.title(),
        ));
    }

    fn before_scenario(&mut self, title: &str) {
        self.write_line(format!("{} {title}", self.word(keys::SCENARIO)));
    }

    fn scenario_meta(&mut self, meta: &Meta) {
        if meta.is_empty() {
            return;
        }
        self.write_line(self.word(keys::META).to_owned());
        self.write_line(meta.as_string());
    }

    fn after_scenario(&mut self) {
        self.write_line("");
    }

    fn given_stories(&mut self, paths: &[String]) {
        self.write_line(format!(
            "{} {}",
            self.word(keys::GIVEN_STORIES),
            paths.join(", "),
        ));
    }

    fn before_examples(&mut self, steps: &[String], table: &ExamplesTable) {
        for step in steps {
            self.write_line(step);
        }
        self.write_line("");
        self.write_line(self.word(keys::EXAMPLES_TABLE).to_owned());
        self.write_line(table.as_string().trim_end());
    }

    fn example(&mut self, row: &Row, index: usize) {
        let values = row.iter().map(|(k, v)| format!("{k}={v}")).join(", ");
        self.write_line(format!("Example {}: {{{values}}}", index + 1));
    }

    fn successful(&mut self, step: &str) {
        self.write_line(plain(step));
    }

    fn ignorable(&mut self, step: &str) {
        self.write_line(step);
    }

    fn comment(&mut self, step: &str) {
        self.write_line(step);
    }

    fn pending(&mut self, step: &str) {
        self.write_step(step, keys::PENDING);
    }

    fn not_performed(&mut self, step: &str) {
        self.write_step(step, keys::NOT_PERFORMED);
    }

    fn failed(&mut self, step: &str, failure: &UuidFailure) {
        self.write_step(step, keys::FAILED);
        self.write_line(format!("({failure})"));
    }

    fn failed_outcomes(&mut self, step: &str, table: &OutcomesTable) {
        self.write_step(step, keys::FAILED);
        let rendered = table.as_string(&self.keywords);
        self.write_line(rendered.trim_end());
    }

    fn dry_run(&mut self) {
        self.write_line(self.word(keys::DRY_RUN).to_owned());
    }

    fn pending_methods(&mut self, methods: &[String]) {
        for method in methods {
            self.write_line(method.trim_end());
        }
    }

    fn restarted(&mut self, step: &str, failure: &UuidFailure) {
        self.write_line(format!("{} ({failure})", plain(step)));
    }

    fn restarted_story(&mut self, story: &Story, failure: &UuidFailure) {
        self.write_line(format!("{} ({failure})", story.path()));
    }

    fn story_cancelled(&mut self, story: &Story, timeout: Duration) {
        self.write_line(format!(
            "{} {} ({} {})",
            self.word(keys::STORY_CANCELLED),
            story.path(),
            self.word(keys::DURATION),
            humantime::format_duration(timeout),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::OutcomeMatcher;

    fn output() -> ConsoleOutput<Vec<u8>> {
        ConsoleOutput::new(Vec::new(), Keywords::default())
    }

    fn text(output: ConsoleOutput<Vec<u8>>) -> String {
        String::from_utf8(output.into_inner()).unwrap()
    }

    #[test]
    fn writes_steps_with_their_result() {
        let failure = UuidFailure::wrap("When it breaks", anyhow::anyhow!("snapped"));
        let mut output = output();

        output.before_scenario("Lift");
        output.successful("Given the lift is on floor \u{FF5F}3\u{FF60}");
        output.failed("When it breaks", &failure);
        output.not_performed("Then it arrives");
        output.pending("Then I am pending");
        output.ignorable("!-- Then it's ignored");

        assert_eq!(
            text(output),
            "Scenario: Lift\n\
             Given the lift is on floor 3\n\
             When it breaks (FAILED)\n\
             (snapped)\n\
             Then it arrives (NOT PERFORMED)\n\
             Then I am pending (PENDING)\n\
             !-- Then it's ignored\n",
        );
    }

    #[test]
    fn writes_failed_outcomes_as_table() {
        let mut table = OutcomesTable::new();
        _ = table.add_outcome("floor", 2, OutcomeMatcher::equal_to(3));
        let mut output = output();

        output.failed_outcomes("Then it arrives", &table);

        let text = text(output);
        assert!(text.starts_with("Then it arrives (FAILED)\n"));
        assert!(text.contains("|Description|Value|Matcher|Verified|"));
    }

    #[test]
    fn writes_cancelled_story() {
        let mut output = output();

        output.story_cancelled(&Story::new("lift.story"), Duration::from_secs(90));

        assert_eq!(text(output), "STORY CANCELLED lift.story (DURATION 1m 30s)\n");
    }

    #[test]
    fn writes_to_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut output =
            ConsoleOutput::new(file.reopen().unwrap(), Keywords::default());

        output.dry_run();
        drop(output);

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, "DRY RUN\n");
    }
}
