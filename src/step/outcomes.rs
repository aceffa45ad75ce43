// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tables of verified outcomes.
//!
//! An [`OutcomesTable`] aggregates several assertions of a single step, so
//! that a failing step reports every outcome and whether it held, rather
//! than only the first failed assertion.

use std::fmt;

use derive_more::with_trait::{Display, Error};
use itertools::Itertools as _;

use crate::keywords::{keys, Keywords};

/// Predicate over an outcome value, with a description of what it expects.
pub struct OutcomeMatcher<T> {
    description: String,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> fmt::Debug for OutcomeMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutcomeMatcher")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<T> OutcomeMatcher<T> {
    /// Creates a matcher described by the `description`.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self { description: description.into(), predicate: Box::new(predicate) }
    }

    /// Description of the expectation.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Indicates whether the `value` satisfies this matcher.
    #[must_use]
    pub fn matches(&self, value: &T) -> bool {
        (self.predicate)(value)
    }
}

impl<T: fmt::Debug + PartialEq + Send + Sync + 'static> OutcomeMatcher<T> {
    /// Matcher of values equal to the `expected` one.
    #[must_use]
    pub fn equal_to(expected: T) -> Self {
        Self::new(format!("equal to {expected:?}"), move |v| *v == expected)
    }
}

/// Single row of an [`OutcomesTable`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutcomeRow {
    /// What the outcome is about.
    pub description: String,

    /// Rendered actual value.
    pub value: String,

    /// Rendered expectation.
    pub matcher: String,

    /// Whether the value satisfied the expectation.
    pub verified: bool,
}

/// Aggregated assertions of a step.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OutcomesTable {
    outcomes: Vec<OutcomeRow>,
}

impl OutcomesTable {
    /// Creates an empty [`OutcomesTable`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks the `value` with the `matcher` and records the outcome.
    pub fn add_outcome<T: fmt::Debug>(
        &mut self,
        description: impl Into<String>,
        value: T,
        matcher: OutcomeMatcher<T>,
    ) -> &mut Self {
        self.outcomes.push(OutcomeRow {
            description: description.into(),
            verified: matcher.matches(&value),
            value: format!("{value:?}"),
            matcher: matcher.description,
        });
        self
    }

    /// All the recorded outcomes.
    #[must_use]
    pub fn outcomes(&self) -> &[OutcomeRow] {
        &self.outcomes
    }

    /// Outcomes that were not verified.
    pub fn failed_outcomes(&self) -> impl Iterator<Item = &OutcomeRow> {
        self.outcomes.iter().filter(|o| !o.verified)
    }

    fn failed_descriptions(&self) -> String {
        self.failed_outcomes().map(|o| o.description.as_str()).join(", ")
    }

    /// Verifies every recorded outcome.
    ///
    /// # Errors
    ///
    /// With [`OutcomesFailed`] carrying this whole table if any outcome was
    /// not verified.
    pub fn verify(&self) -> Result<(), OutcomesFailed> {
        if self.outcomes.iter().all(|o| o.verified) {
            Ok(())
        } else {
            Err(OutcomesFailed { table: self.clone() })
        }
    }

    /// Renders this table with the outcome field names of the `keywords`.
    #[must_use]
    pub fn as_string(&self, keywords: &Keywords) -> String {
        let fields = [
            keys::OUTCOME_DESCRIPTION,
            keys::OUTCOME_VALUE,
            keys::OUTCOME_MATCHER,
            keys::OUTCOME_VERIFIED,
        ];
        let mut out = String::new();
        for field in fields {
            out.push('|');
            out.push_str(keywords.word(field));
        }
        out.push_str("|\n");
        for o in &self.outcomes {
            let verified =
                keywords.word(if o.verified { keys::YES } else { keys::NO });
            out.push_str(&format!(
                "|{}|{}|{}|{verified}|\n",
                o.description, o.value, o.matcher,
            ));
        }
        out
    }
}

/// Failed verification of an [`OutcomesTable`].
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("Outcomes failed: {}", table.failed_descriptions())]
pub struct OutcomesFailed {
    #[error(not(source))]
    table: OutcomesTable,
}

impl OutcomesFailed {
    /// Table whose verification failed.
    #[must_use]
    pub const fn table(&self) -> &OutcomesTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_all_outcomes() {
        let mut table = OutcomesTable::new();
        _ = table
            .add_outcome("price", 42, OutcomeMatcher::equal_to(42))
            .add_outcome(
                "name",
                "STK1",
                OutcomeMatcher::new("starting with STK", |s: &&str| {
                    s.starts_with("STK")
                }),
            );

        assert!(table.verify().is_ok());
        assert_eq!(table.failed_outcomes().count(), 0);
    }

    #[test]
    fn failure_carries_every_outcome() {
        let mut table = OutcomesTable::new();
        _ = table
            .add_outcome("a", 1, OutcomeMatcher::equal_to(1))
            .add_outcome("b", 2, OutcomeMatcher::equal_to(3));

        let err = table.verify().unwrap_err();

        assert_eq!(err.table().outcomes().len(), 2);
        assert_eq!(err.to_string(), "Outcomes failed: b");
    }

    #[test]
    fn renders_as_string() {
        let mut table = OutcomesTable::new();
        _ = table.add_outcome("b", 2, OutcomeMatcher::equal_to(3));

        assert_eq!(
            table.as_string(&Keywords::default()),
            "|Description|Value|Matcher|Verified|\n|b|2|equal to 3|No|\n",
        );
    }
}
