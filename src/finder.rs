// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Collecting [`StepCandidate`]s and ordering them for a literal step.

use std::{cmp::Reverse, fmt, sync::Arc};

use lazy_regex::regex;

use crate::{
    candidate::StepCandidate, error::Result, keywords::StepType,
    steps::CandidateSteps,
};

/// Ordering of the candidates tried against a literal step.
pub trait PrioritisingStrategy: fmt::Debug + Send + Sync {
    /// Sorts the `candidates` so the preferred ones come first.
    fn prioritise(&self, step: &str, candidates: &mut [Arc<StepCandidate>]);
}

/// Orders candidates by descending priority, keeping the declaration order of
/// candidates with the same priority.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByPriorityField;

impl PrioritisingStrategy for ByPriorityField {
    fn prioritise(&self, _: &str, candidates: &mut [Arc<StepCandidate>]) {
        candidates.sort_by_key(|c| Reverse(c.priority()));
    }
}

/// Orders candidates by ascending edit distance between their pattern and
/// the step, then by descending priority.
///
/// Placeholders are removed from patterns and the starting word from the
/// step before measuring.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByLevenshteinDistance;

impl ByLevenshteinDistance {
    fn scoring_pattern(pattern: &str) -> String {
        let spaced = regex!(r"\s\$\w+\s").replace_all(pattern, " ");
        regex!(r"\$\w+").replace_all(&spaced, "").into_owned()
    }
}

impl PrioritisingStrategy for ByLevenshteinDistance {
    fn prioritise(&self, step: &str, candidates: &mut [Arc<StepCandidate>]) {
        let trimmed = step.split_once(' ').map_or("", |(_, rest)| rest);
        candidates.sort_by_cached_key(|c| {
            let pattern = Self::scoring_pattern(c.pattern_as_string());
            (levenshtein(&pattern, trimmed), Reverse(c.priority()))
        });
    }
}

/// Edit distance between the `a` and `b` strings, counted in [`char`]s.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b = b.chars().collect::<Vec<_>>();
    let mut previous = (0..=b.len()).collect::<Vec<_>>();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Documentation of a [`StepCandidate`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Stepdoc {
    /// Type of the steps the candidate matches.
    pub step_type: StepType,

    /// Pattern as declared.
    pub pattern: String,

    /// Name of the handler.
    pub method: String,

    /// Name of the type declaring the handler.
    pub declared_by: String,

    /// Declared priority.
    pub priority: i32,
}

impl From<&StepCandidate> for Stepdoc {
    fn from(candidate: &StepCandidate) -> Self {
        Self {
            step_type: candidate.step_type(),
            pattern: candidate.pattern_as_string().to_owned(),
            method: candidate.method().to_owned(),
            declared_by: candidate.declared_by().to_owned(),
            priority: candidate.priority(),
        }
    }
}

/// Collects the candidates of [`CandidateSteps`] providers and prioritises
/// them with a [`PrioritisingStrategy`].
#[derive(Clone, Debug)]
pub struct StepFinder {
    strategy: Arc<dyn PrioritisingStrategy>,
}

impl Default for StepFinder {
    fn default() -> Self {
        Self::new(Arc::new(ByPriorityField))
    }
}

impl StepFinder {
    /// Creates a [`StepFinder`] prioritising with the `strategy`.
    #[must_use]
    pub fn new(strategy: Arc<dyn PrioritisingStrategy>) -> Self {
        Self { strategy }
    }

    /// Candidates of all the `providers`, in provider order.
    ///
    /// # Errors
    ///
    /// If a provider fails to list its candidates.
    pub fn collect_candidates(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
    ) -> Result<Vec<Arc<StepCandidate>>> {
        let mut collected = Vec::new();
        for provider in providers {
            collected.extend(provider.list_candidates()?);
        }
        Ok(collected)
    }

    /// Returns the `candidates` in the order they are to be tried against the
    /// `step`.
    #[must_use]
    pub fn prioritise(
        &self,
        step: &str,
        mut candidates: Vec<Arc<StepCandidate>>,
    ) -> Vec<Arc<StepCandidate>> {
        self.strategy.prioritise(step, &mut candidates);
        candidates
    }

    /// [`Stepdoc`]s of every candidate of the `providers`.
    ///
    /// # Errors
    ///
    /// If a provider fails to list its candidates.
    pub fn stepdocs(
        &self,
        providers: &[Arc<dyn CandidateSteps>],
    ) -> Result<Vec<Stepdoc>> {
        Ok(self
            .collect_candidates(providers)?
            .iter()
            .map(|c| Stepdoc::from(c.as_ref()))
            .collect())
    }

    /// [`Stepdoc`]s of the candidates of the `providers` matching the `step`
    /// on its own.
    ///
    /// # Errors
    ///
    /// If a provider fails to list its candidates, or the keywords lack a
    /// starting word.
    pub fn find_matching(
        &self,
        step: &str,
        providers: &[Arc<dyn CandidateSteps>],
    ) -> Result<Vec<Stepdoc>> {
        let mut matching = Vec::new();
        for candidate in self.collect_candidates(providers)? {
            if candidate.matches(step, None)? {
                matching.push(Stepdoc::from(candidate.as_ref()));
            }
        }
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        configuration::Configuration,
        steps::{StepOptions, Steps},
    };

    struct Shop;

    fn providers() -> Vec<Arc<dyn CandidateSteps>> {
        let configuration = Arc::new(Configuration::default());
        let mut steps = Steps::new(Arc::clone(&configuration), Shop);
        _ = steps
            .given("a $product costs $price", |_: &mut Shop, _: String, _: String| {})
            .given_with(
                "a ticket costs $price",
                StepOptions::new().priority(1),
                |_: &mut Shop, _: String| {},
            )
            .given("a discount of $rate", |_: &mut Shop, _: String| {});
        let mut other = Steps::new(configuration, Shop);
        _ = other.given_with(
            "a ticket costs nothing",
            StepOptions::new().priority(1),
            |_: &mut Shop| {},
        );
        vec![Arc::new(steps), Arc::new(other)]
    }

    fn patterns(candidates: &[Arc<StepCandidate>]) -> Vec<&str> {
        candidates.iter().map(|c| c.pattern_as_string()).collect()
    }

    #[test]
    fn prioritises_by_priority_keeping_declaration_order() {
        let finder = StepFinder::default();
        let candidates = finder.collect_candidates(&providers()).unwrap();

        let prioritised = finder.prioritise("Given a ticket costs 10", candidates);

        assert_eq!(
            patterns(&prioritised),
            [
                "a ticket costs $price",
                "a ticket costs nothing",
                "a $product costs $price",
                "a discount of $rate",
            ],
        );
    }

    #[test]
    fn prioritises_by_levenshtein_distance() {
        let finder = StepFinder::new(Arc::new(ByLevenshteinDistance));
        let candidates = finder.collect_candidates(&providers()).unwrap();

        let prioritised = finder.prioritise("Given a discount of 10%", candidates);

        assert_eq!(prioritised[0].pattern_as_string(), "a discount of $rate");
    }

    #[test]
    fn strips_placeholders_from_scoring_patterns() {
        assert_eq!(
            ByLevenshteinDistance::scoring_pattern("a $product costs $price"),
            "a costs ",
        );
    }

    #[test]
    fn measures_edit_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("flaw", "flaw"), 0);
    }

    #[test]
    fn documents_matching_candidates() {
        let finder = StepFinder::default();

        let docs = finder
            .find_matching("Given a ticket costs nothing", &providers())
            .unwrap();

        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.step_type == StepType::Given));
        assert!(docs.iter().any(|d| d.priority == 1));
        assert_eq!(finder.stepdocs(&providers()).unwrap().len(), 4);
    }
}
