// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`StepCandidate`]: a compiled step definition eligible to match literal
//! steps.

use std::sync::Arc;

use crate::{
    collector::Outcome,
    configuration::Configuration,
    error::Result,
    keywords::{StartingWordNotFound, StepType},
    parameters::{ChainedParameters, Row},
    pattern::StepMatcher,
    step::{creator::ParameterBinder, ParametrisedStep, Step},
    steps::{ParameterNamer, StepInvoker, StepOptions},
};

/// Step definition compiled against a [`Configuration`].
///
/// Candidates are created once, when listed by a [`CandidateSteps`]
/// provider, and are shared read-only afterwards.
///
/// [`CandidateSteps`]: crate::CandidateSteps
#[derive(Debug)]
pub struct StepCandidate {
    pattern: String,
    step_type: StepType,
    priority: i32,
    matcher: StepMatcher,
    namer: ParameterNamer,
    composed_of: Vec<String>,
    pending: bool,
    invoker: Arc<dyn StepInvoker>,
    configuration: Arc<Configuration>,
}

impl StepCandidate {
    /// Compiles the `pattern` of a step definition.
    ///
    /// # Errors
    ///
    /// If the `pattern` cannot be compiled.
    pub fn new(
        pattern: &str,
        step_type: StepType,
        options: &StepOptions,
        invoker: Arc<dyn StepInvoker>,
        configuration: Arc<Configuration>,
    ) -> Result<Self> {
        let matcher =
            configuration.pattern_parser().parse_step(step_type, pattern)?;
        Ok(Self {
            pattern: pattern.to_owned(),
            step_type,
            priority: options.priority,
            matcher,
            namer: options.namer.clone(),
            composed_of: options.composed_of.clone(),
            pending: options.pending,
            invoker,
            configuration,
        })
    }

    /// Pattern as declared.
    #[must_use]
    pub fn pattern_as_string(&self) -> &str {
        &self.pattern
    }

    /// Declared priority. Higher priority candidates are tried first.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// [`StepType`] of the steps this candidate matches.
    #[must_use]
    pub const fn step_type(&self) -> StepType {
        self.step_type
    }

    /// Starting word of the [`StepType`] followed by the pattern, like
    /// `Given a $colour stone`.
    ///
    /// # Errors
    ///
    /// If the active keywords define no starting word for the type.
    pub fn name(&self) -> std::result::Result<String, StartingWordNotFound> {
        let word = self.configuration.keywords().starting_word_for(self.step_type)?;
        Ok(format!("{word} {}", self.pattern))
    }

    /// Name of the handler.
    #[must_use]
    pub fn method(&self) -> &str {
        self.invoker.method()
    }

    /// Name of the type declaring the handler.
    #[must_use]
    pub fn declared_by(&self) -> &str {
        self.invoker.declared_by()
    }

    /// Compiled pattern.
    #[must_use]
    pub const fn matcher(&self) -> &StepMatcher {
        &self.matcher
    }

    /// Names of the handler parameters.
    #[must_use]
    pub const fn namer(&self) -> &ParameterNamer {
        &self.namer
    }

    /// Handler performing matched steps.
    #[must_use]
    pub fn invoker(&self) -> &dyn StepInvoker {
        self.invoker.as_ref()
    }

    /// [`Configuration`] this candidate was compiled against.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Indicates whether matched steps expand into composed steps.
    #[must_use]
    pub fn is_composite(&self) -> bool {
        !self.composed_of.is_empty()
    }

    /// Templates of the composed steps.
    #[must_use]
    pub fn composed_steps(&self) -> &[String] {
        &self.composed_of
    }

    /// Indicates whether matched steps are reported pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Indicates whether the `step` is a commented-out step, like
    /// `!-- Given a stone`.
    #[must_use]
    pub fn ignore(&self, step: &str) -> bool {
        self.configuration.keywords().is_ignored_step(step)
    }

    /// Indicates whether the `step` is a free text comment, like
    /// `!-- remember the stones`.
    #[must_use]
    pub fn comment(&self, step: &str) -> bool {
        self.configuration.keywords().is_comment(step)
    }

    /// Indicates whether the `step` starts with an `And` word.
    #[must_use]
    pub fn is_and_step(&self, step: &str) -> bool {
        self.configuration.keywords().is_and_step(step)
    }

    /// Indicates whether this candidate matches the `step`.
    ///
    /// An `And` step matches only if the type of the `previous_non_and` step
    /// is the type of this candidate, so an `And` step without a previous
    /// step never matches. Any other step has to start with a word of this
    /// candidate's type. In both cases the rest of the step has to match the
    /// pattern.
    ///
    /// # Errors
    ///
    /// If the active keywords define no starting word for the type of this
    /// candidate. This is a setup defect rather than a mismatch.
    pub fn matches(
        &self,
        step: &str,
        previous_non_and: Option<&str>,
    ) -> std::result::Result<bool, StartingWordNotFound> {
        let keywords = self.configuration.keywords();
        let monitor = self.configuration.step_monitor();
        _ = keywords.starting_words(self.step_type)?;

        let matches_type = if keywords.is_and_step(step) {
            previous_non_and
                .and_then(|prev| keywords.step_type_for(prev).ok())
                .is_some_and(|ty| ty == self.step_type)
        } else {
            keywords.step_starts_with_type(step, self.step_type)
        };
        monitor.step_matches_type(
            step,
            previous_non_and,
            matches_type,
            self.step_type,
            &self.pattern,
        );

        let matches_pattern = keywords
            .step_without_starting_word(step, self.step_type)
            .is_ok_and(|stripped| self.matcher.matches(stripped));
        monitor.step_matches_pattern(
            step,
            matches_pattern,
            self.matcher.pattern(),
            self.declared_by(),
        );

        Ok(matches_type && matches_pattern)
    }

    /// Creates the executable [`Step`] of the matched `step`, running with
    /// the `named` parameters and followed by the `composed` steps.
    #[must_use]
    pub fn create_matched_step(
        self: &Arc<Self>,
        step: &str,
        named: &Row,
        composed: Vec<Step>,
    ) -> Step {
        Step::Parametrised(ParametrisedStep::new(
            step,
            Arc::clone(self),
            named.clone(),
            composed,
        ))
    }

    /// Creates the executable [`Step`] of the matched `step`, performed only
    /// upon the `outcome`.
    #[must_use]
    pub fn create_matched_step_upon_outcome(
        self: &Arc<Self>,
        step: &str,
        named: &Row,
        composed: Vec<Step>,
        outcome: Outcome,
    ) -> Step {
        self.create_matched_step(step, named, composed).upon(outcome)
    }

    /// Resolves the composed steps of the matched composite `step` against
    /// the `candidates`, adding them to the `steps`.
    ///
    /// Composed steps see the `named` parameters, overridden by the values
    /// captured from the `step` under their placeholder names and handler
    /// parameter names. A composed step no candidate matches is pending.
    ///
    /// # Errors
    ///
    /// See [`StepCandidate::matches()`].
    pub fn add_composed_steps(
        self: &Arc<Self>,
        steps: &mut Vec<Step>,
        step: &str,
        named: &Row,
        candidates: &[Arc<Self>],
    ) -> std::result::Result<(), StartingWordNotFound> {
        let merged = self.composed_parameters(step, named);
        let keywords = self.configuration.keywords();
        let mut previous_non_and: Option<&str> = None;
        for composed in &self.composed_of {
            steps.push(match_step(
                composed,
                previous_non_and,
                &merged,
                candidates,
                None,
            )?);
            if !(keywords.is_and_step(composed)
                || keywords.is_ignorable_step(composed))
            {
                previous_non_and = Some(composed);
            }
        }
        Ok(())
    }

    fn composed_parameters(&self, step: &str, named: &Row) -> Row {
        let keywords = self.configuration.keywords();
        let Some(matched) = keywords
            .step_without_starting_word(step, self.step_type)
            .ok()
            .and_then(|stripped| self.matcher.find(stripped))
        else {
            return named.clone();
        };

        let controls = self.configuration.parameter_controls();
        let captured = matched
            .iter()
            .filter(|(n, _)| !n.is_empty())
            .map(|(name, value)| {
                let value = if controls.delimiter_named_parameters() {
                    controls.replace_all_delimited(value, named).into_owned()
                } else {
                    value.to_owned()
                };
                (name, value)
            })
            .collect::<Row>();

        let binder = ParameterBinder {
            matched: Some(&matched),
            group_names: self.matcher.parameter_names(),
            namer: &self.namer,
            named,
            controls,
            monitor: self.configuration.step_monitor().as_ref(),
        };
        let bound = (0..self.invoker.parameter_types().len())
            .filter_map(|position| {
                let name = self.namer.name(position)?;
                Some((name, binder.bind(position).ok()?.value))
            })
            .collect::<Row>();

        ChainedParameters::new(bound)
            .then(captured)
            .then(named.clone())
            .flatten()
    }
}

/// Resolves the literal `step` against the `candidates`, in the order given.
///
/// The first candidate recognising the step as ignorable, as a comment, or
/// matching it decides. A pending candidate leaves the step pending but
/// records its method. A step nothing matches is pending.
pub(crate) fn match_step(
    step: &str,
    previous_non_and: Option<&str>,
    named: &Row,
    candidates: &[Arc<StepCandidate>],
    outcome: Option<Outcome>,
) -> std::result::Result<Step, StartingWordNotFound> {
    let mut resolved = Step::pending(step, previous_non_and.map(str::to_owned));
    for candidate in candidates {
        if candidate.ignore(step) {
            return Ok(Step::Ignorable(step.to_owned()));
        }
        if candidate.comment(step) {
            return Ok(Step::Comment(step.to_owned()));
        }
        if candidate.matches(step, previous_non_and)? {
            if candidate.is_pending() {
                if let Step::Pending(pending) = &mut resolved {
                    pending.annotate(candidate.method());
                }
                return Ok(resolved);
            }
            let mut composed = Vec::new();
            if candidate.is_composite() {
                candidate.add_composed_steps(&mut composed, step, named, candidates)?;
            }
            return Ok(match outcome {
                Some(outcome) => candidate
                    .create_matched_step_upon_outcome(step, named, composed, outcome),
                None => candidate.create_matched_step(step, named, composed),
            });
        }
    }
    tracing::debug!(step, "no candidate matches, step is pending");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        keywords::Keywords,
        steps::{CandidateSteps as _, Steps},
    };

    #[derive(Default)]
    struct Building {
        floors: Vec<String>,
    }

    fn candidates(configuration: Configuration) -> Vec<Arc<StepCandidate>> {
        let mut steps = Steps::new(Arc::new(configuration), Building::default());
        _ = steps
            .given("I live on the $nth floor", |b: &mut Building, nth: String| {
                b.floors.push(nth);
            })
            .when("I take the lift to $floor", |_: &mut Building, _: String| {})
            .then("I arrive home", |_: &mut Building| {});
        steps.list_candidates().unwrap()
    }

    #[test]
    fn matches_steps_of_own_type_only() {
        let candidates = candidates(Configuration::default());
        let given = &candidates[0];

        assert!(given.matches("Given I live on the 1st floor", None).unwrap());
        assert!(!given.matches("When I live on the 1st floor", None).unwrap());
        assert!(!given.matches("Given I live on the 1st", None).unwrap());
        assert_eq!(given.name().unwrap(), "Given I live on the $nth floor");
    }

    #[test]
    fn matches_and_steps_by_previous_non_and_type() {
        let candidates = candidates(Configuration::default());
        let given = &candidates[0];
        let when = &candidates[1];

        assert!(given
            .matches("And I live on the 1st floor", Some("Given I am home"))
            .unwrap());
        assert!(!given
            .matches("And I live on the 1st floor", Some("When I am home"))
            .unwrap());
        assert!(!given.matches("And I live on the 1st floor", None).unwrap());
        assert!(when.matches("And I take the lift to 3", Some("When I leave")).unwrap());
    }

    #[test]
    fn fails_without_starting_word_for_type() {
        let words = Keywords::english()
            .clone()
            .with_starting_words(StepType::Then, Vec::<String>::new());
        let candidates = candidates(Configuration::default().with_keywords(words));

        let err = candidates[2].matches("Then I arrive home", None).unwrap_err();

        assert_eq!(err, StartingWordNotFound::OfType { step_type: StepType::Then });
    }

    #[test]
    fn recognises_ignorable_steps_and_comments() {
        let candidates = candidates(Configuration::default());
        let given = &candidates[0];

        assert!(given.ignore("!-- Given I live on the 1st floor"));
        assert!(!given.comment("!-- Given I live on the 1st floor"));
        assert!(given.comment("!-- the lift is broken"));
        assert!(!given.ignore("Given I live on the 1st floor"));
        assert!(given.is_and_step("And I live on the 1st floor"));
    }

    #[test]
    fn resolves_first_matching_candidate() {
        let candidates = candidates(Configuration::default());

        let matched = match_step(
            "Given I live on the 1st floor",
            None,
            &Row::new(),
            &candidates,
            None,
        )
        .unwrap();
        let pending = match_step("Given I fly", None, &Row::new(), &candidates, None)
            .unwrap();
        let upon = match_step(
            "Then I arrive home",
            None,
            &Row::new(),
            &candidates,
            Some(Outcome::Failure),
        )
        .unwrap();

        assert!(matches!(matched, Step::Parametrised(_)));
        assert_eq!(pending.as_pending().unwrap().step_as_string(), "Given I fly");
        assert!(matches!(upon, Step::UponOutcome { outcome: Outcome::Failure, .. }));
    }

    #[test]
    fn merges_captured_values_into_composed_parameters() {
        let candidates = candidates(Configuration::default());
        let given = &candidates[0];
        let named = Row::new().with("nth", "ground").with("lift", "A");

        let merged = given.composed_parameters("Given I live on the 5th floor", &named);

        assert_eq!(merged.get("nth").map(String::as_str), Some("5th"));
        assert_eq!(merged.get("lift").map(String::as_str), Some("A"));
    }
}
