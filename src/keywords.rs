// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Localizable [`Keywords`] and the [`StepType`] classification of literal
//! steps.

use std::collections::HashMap;

use derive_more::with_trait::{Display, Error};
use itertools::Itertools as _;
use once_cell::sync::Lazy;

/// Type of a step, as determined by its starting word.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub enum StepType {
    /// `Given` step, establishing context.
    Given,

    /// `When` step, performing an action.
    When,

    /// `Then` step, verifying an outcome.
    Then,

    /// `And` step, continuing the previous non-`And` step.
    And,

    /// Ignorable step (`!--` by default), never performed.
    Ignorable,
}

impl StepType {
    /// All [`StepType`]s in the order starting words are resolved.
    pub const ALL: [Self; 5] =
        [Self::Given, Self::When, Self::Then, Self::And, Self::Ignorable];

    /// Key of this [`StepType`]'s starting word in a keyword table.
    #[must_use]
    pub const fn keyword_key(self) -> &'static str {
        match self {
            Self::Given => keys::GIVEN,
            Self::When => keys::WHEN,
            Self::Then => keys::THEN,
            Self::And => keys::AND,
            Self::Ignorable => keys::IGNORABLE,
        }
    }
}

/// Keys of a localized keyword table, as accepted by
/// [`Keywords::from_map()`].
pub mod keys {
    #![allow(missing_docs)]

    pub const GIVEN: &str = "Given";
    pub const WHEN: &str = "When";
    pub const THEN: &str = "Then";
    pub const AND: &str = "And";
    pub const IGNORABLE: &str = "Ignorable";
    pub const META: &str = "Meta";
    pub const NARRATIVE: &str = "Narrative";
    pub const LIFECYCLE: &str = "Lifecycle";
    pub const BEFORE: &str = "Before";
    pub const AFTER: &str = "After";
    pub const SCENARIO: &str = "Scenario";
    pub const GIVEN_STORIES: &str = "GivenStories";
    pub const EXAMPLES_TABLE: &str = "ExamplesTable";
    pub const PENDING: &str = "Pending";
    pub const NOT_PERFORMED: &str = "NotPerformed";
    pub const FAILED: &str = "Failed";
    pub const DRY_RUN: &str = "DryRun";
    pub const STORY_CANCELLED: &str = "StoryCancelled";
    pub const DURATION: &str = "Duration";
    pub const OUTCOME_DESCRIPTION: &str = "OutcomeDescription";
    pub const OUTCOME_VALUE: &str = "OutcomeValue";
    pub const OUTCOME_MATCHER: &str = "OutcomeMatcher";
    pub const OUTCOME_VERIFIED: &str = "OutcomeVerified";
    pub const YES: &str = "Yes";
    pub const NO: &str = "No";

    /// Every key a complete keyword table has to define.
    pub const ALL: [&str; 25] = [
        GIVEN,
        WHEN,
        THEN,
        AND,
        IGNORABLE,
        META,
        NARRATIVE,
        LIFECYCLE,
        BEFORE,
        AFTER,
        SCENARIO,
        GIVEN_STORIES,
        EXAMPLES_TABLE,
        PENDING,
        NOT_PERFORMED,
        FAILED,
        DRY_RUN,
        STORY_CANCELLED,
        DURATION,
        OUTCOME_DESCRIPTION,
        OUTCOME_VALUE,
        OUTCOME_MATCHER,
        OUTCOME_VERIFIED,
        YES,
        NO,
    ];
}

/// Separator of synonyms inside a single keyword value.
pub const SYNONYM_SEPARATOR: char = '|';

/// No starting word could be resolved.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum StartingWordNotFound {
    /// A literal step starts with none of the known starting words.
    #[display("No starting word found for step '{step}' amongst '{known}'")]
    ForStep {
        /// The literal step.
        #[error(not(source))]
        step: String,

        /// Known starting words, comma separated.
        known: String,
    },

    /// A literal step starts with none of the words of the expected type.
    #[display(
        "No starting word found for step '{step}' of type '{step_type}' \
         amongst '{known}'"
    )]
    ForStepOfType {
        /// The literal step.
        #[error(not(source))]
        step: String,

        /// Expected type.
        step_type: StepType,

        /// Starting words of the expected type, comma separated.
        known: String,
    },

    /// The active keywords define no starting word for a type.
    #[display("No starting word found of type '{step_type}'")]
    OfType {
        /// Type lacking starting words.
        #[error(not(source))]
        step_type: StepType,
    },
}

impl StartingWordNotFound {
    /// Creates a new [`StartingWordNotFound::ForStep`].
    #[must_use]
    pub fn for_step<I, W>(step: impl Into<String>, known: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: AsRef<str>,
    {
        Self::ForStep {
            step: step.into(),
            known: known.into_iter().map(|w| w.as_ref().to_owned()).join(","),
        }
    }
}

/// A required key is missing from a keyword table.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("Keyword '{name}' not found amongst '{available}'")]
pub struct KeywordNotFound {
    /// Missing key.
    #[error(not(source))]
    pub name: String,

    /// Keys present in the table, comma separated.
    pub available: String,
}

/// Words used to recognise steps and to render results.
///
/// Starting words may declare synonyms separated by `|` (for example
/// `Given|Giv`). A starting word only matches when followed by whitespace.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Keywords {
    /// Synonyms of the starting words, per [`StepType`].
    starting_words: HashMap<StepType, Vec<String>>,

    /// Every other keyword, by key.
    words: HashMap<&'static str, String>,
}

static ENGLISH: Lazy<Keywords> = Lazy::new(|| {
    let table = [
        (keys::GIVEN, "Given"),
        (keys::WHEN, "When"),
        (keys::THEN, "Then"),
        (keys::AND, "And"),
        (keys::IGNORABLE, "!--"),
        (keys::META, "Meta:"),
        (keys::NARRATIVE, "Narrative:"),
        (keys::LIFECYCLE, "Lifecycle:"),
        (keys::BEFORE, "Before:"),
        (keys::AFTER, "After:"),
        (keys::SCENARIO, "Scenario:"),
        (keys::GIVEN_STORIES, "GivenStories:"),
        (keys::EXAMPLES_TABLE, "Examples:"),
        (keys::PENDING, "PENDING"),
        (keys::NOT_PERFORMED, "NOT PERFORMED"),
        (keys::FAILED, "FAILED"),
        (keys::DRY_RUN, "DRY RUN"),
        (keys::STORY_CANCELLED, "STORY CANCELLED"),
        (keys::DURATION, "DURATION"),
        (keys::OUTCOME_DESCRIPTION, "Description"),
        (keys::OUTCOME_VALUE, "Value"),
        (keys::OUTCOME_MATCHER, "Matcher"),
        (keys::OUTCOME_VERIFIED, "Verified"),
        (keys::YES, "Yes"),
        (keys::NO, "No"),
    ];
    Keywords::assemble(|key| {
        table.iter().find(|(k, _)| *k == key).map(|(_, w)| (*w).to_owned())
    })
});

impl Default for Keywords {
    fn default() -> Self {
        ENGLISH.clone()
    }
}

impl Keywords {
    /// Returns the default English [`Keywords`].
    #[must_use]
    pub fn english() -> &'static Self {
        &ENGLISH
    }

    /// Creates [`Keywords`] out of a localized table keyed by [`keys`].
    ///
    /// # Errors
    ///
    /// If any of [`keys::ALL`] is missing from the `table`.
    pub fn from_map<S: AsRef<str>>(
        table: &HashMap<String, S>,
    ) -> Result<Self, KeywordNotFound> {
        if let Some(missing) =
            keys::ALL.iter().find(|k| !table.contains_key(**k))
        {
            return Err(KeywordNotFound {
                name: (*missing).to_owned(),
                available: table.keys().sorted().join(","),
            });
        }
        Ok(Self::assemble(|key| {
            table.get(key).map(|w| w.as_ref().to_owned())
        }))
    }

    /// Returns these [`Keywords`] with the starting words of the given
    /// [`StepType`] replaced. An empty `words` leaves the type unresolvable.
    #[must_use]
    pub fn with_starting_words<I, W>(mut self, step_type: StepType, words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let words = words
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.is_empty())
            .collect::<Vec<_>>();
        _ = self.starting_words.insert(step_type, words);
        self
    }

    fn assemble(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let starting_words = StepType::ALL
            .iter()
            .map(|ty| {
                let synonyms = lookup(ty.keyword_key())
                    .map(|w| {
                        w.split(SYNONYM_SEPARATOR)
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(ToOwned::to_owned)
                            .collect()
                    })
                    .unwrap_or_default();
                (*ty, synonyms)
            })
            .collect();
        let words = keys::ALL
            .iter()
            .map(|k| (*k, lookup(*k).unwrap_or_default()))
            .collect();
        Self { starting_words, words }
    }

    /// Returns the keyword stored under `key` (one of [`keys`]), or an empty
    /// string for unknown keys.
    #[must_use]
    pub fn word(&self, key: &str) -> &str {
        self.words.get(key).map_or("", String::as_str)
    }

    /// All synonyms of the starting word of the given [`StepType`].
    ///
    /// # Errors
    ///
    /// If no starting word is defined for the `step_type`.
    pub fn starting_words(
        &self,
        step_type: StepType,
    ) -> Result<&[String], StartingWordNotFound> {
        self.starting_words
            .get(&step_type)
            .filter(|w| !w.is_empty())
            .map(Vec::as_slice)
            .ok_or(StartingWordNotFound::OfType { step_type })
    }

    /// Primary (first) starting word of the given [`StepType`].
    ///
    /// # Errors
    ///
    /// If no starting word is defined for the `step_type`.
    pub fn starting_word_for(
        &self,
        step_type: StepType,
    ) -> Result<&str, StartingWordNotFound> {
        self.starting_words(step_type)
            .map(|w| w.first().map_or("", String::as_str))
    }

    /// Resolves the [`StepType`] of a literal step by its starting word.
    ///
    /// # Errors
    ///
    /// If the `step` starts with no known starting word.
    pub fn step_type_for(
        &self,
        step: &str,
    ) -> Result<StepType, StartingWordNotFound> {
        StepType::ALL
            .into_iter()
            .find(|ty| self.step_starts_with_type(step, *ty))
            .ok_or_else(|| {
                StartingWordNotFound::for_step(
                    step,
                    StepType::ALL
                        .iter()
                        .filter_map(|ty| self.starting_words.get(ty))
                        .flatten(),
                )
            })
    }

    /// Strips the starting word of the given [`StepType`] (or an `And`
    /// synonym) and the whitespace following it.
    ///
    /// # Errors
    ///
    /// If the `step` starts neither with a word of the `step_type` nor with an
    /// `And` word.
    pub fn step_without_starting_word<'s>(
        &self,
        step: &'s str,
        step_type: StepType,
    ) -> Result<&'s str, StartingWordNotFound> {
        [step_type, StepType::And]
            .iter()
            .filter_map(|ty| self.starting_words.get(ty))
            .flatten()
            .find(|word| starts_with_word(step, word))
            .map(|word| strip_word(step, word))
            .ok_or_else(|| StartingWordNotFound::ForStepOfType {
                step: step.to_owned(),
                step_type,
                known: self
                    .starting_words
                    .get(&step_type)
                    .map(|w| w.join(","))
                    .unwrap_or_default(),
            })
    }

    /// Indicates whether the `step` starts with an `And` word.
    #[must_use]
    pub fn is_and_step(&self, step: &str) -> bool {
        self.step_starts_with_type(step, StepType::And)
    }

    /// Indicates whether the `step` starts with an ignorable word.
    #[must_use]
    pub fn is_ignorable_step(&self, step: &str) -> bool {
        self.step_starts_with_type(step, StepType::Ignorable)
    }

    /// Indicates whether the `step` starts with any of the starting words of
    /// the given [`StepType`].
    #[must_use]
    pub fn step_starts_with_type(&self, step: &str, step_type: StepType) -> bool {
        self.starting_words
            .get(&step_type)
            .is_some_and(|w| w.iter().any(|w| starts_with_word(step, w)))
    }

    /// Indicates whether the `step` is a commented-out step: an ignorable
    /// word followed by a regular starting word, like `!-- Given a stone`.
    #[must_use]
    pub fn is_ignored_step(&self, step: &str) -> bool {
        let Some(ignorables) = self.starting_words.get(&StepType::Ignorable)
        else {
            return false;
        };
        ignorables.iter().filter(|w| starts_with_word(step, w)).any(|w| {
            let rest = strip_word(step, w);
            [StepType::Given, StepType::When, StepType::Then, StepType::And]
                .into_iter()
                .any(|ty| self.step_starts_with_type(rest, ty))
        })
    }

    /// Indicates whether the `step` is a free text comment: it starts with an
    /// ignorable word but is not an [ignored step][0].
    ///
    /// [0]: Keywords::is_ignored_step
    #[must_use]
    pub fn is_comment(&self, step: &str) -> bool {
        self.is_ignorable_step(step) && !self.is_ignored_step(step)
    }
}

/// Indicates whether the `text` starts with the `word` followed by
/// whitespace.
#[must_use]
pub fn starts_with_word(text: &str, word: &str) -> bool {
    !word.is_empty()
        && text
            .strip_prefix(word)
            .and_then(|rest| rest.chars().next())
            .is_some_and(char::is_whitespace)
}

fn strip_word<'s>(text: &'s str, word: &str) -> &'s str {
    let rest = &text[word.len()..];
    let mut chars = rest.chars();
    _ = chars.next();
    chars.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_step_types() {
        let kw = Keywords::default();

        assert_eq!(kw.step_type_for("Given a stone").unwrap(), StepType::Given);
        assert_eq!(kw.step_type_for("When I throw").unwrap(), StepType::When);
        assert_eq!(kw.step_type_for("Then it flies").unwrap(), StepType::Then);
        assert_eq!(kw.step_type_for("And it lands").unwrap(), StepType::And);
        assert_eq!(kw.step_type_for("!-- noise").unwrap(), StepType::Ignorable);
    }

    #[test]
    fn starting_word_requires_whitespace() {
        let kw = Keywords::default();

        assert!(kw.step_type_for("Givenness is").is_err());
        assert!(starts_with_word("Given\nfoo", "Given"));
        assert!(!starts_with_word("Given", "Given"));
    }

    #[test]
    fn strips_type_or_and_words() {
        let kw = Keywords::default();

        assert_eq!(
            kw.step_without_starting_word("Given a stone", StepType::Given)
                .unwrap(),
            "a stone",
        );
        assert_eq!(
            kw.step_without_starting_word("And a stone", StepType::Given)
                .unwrap(),
            "a stone",
        );
        assert!(matches!(
            kw.step_without_starting_word("When a stone", StepType::Given),
            Err(StartingWordNotFound::ForStepOfType { .. }),
        ));
    }

    #[test]
    fn supports_synonyms() {
        let mut table: HashMap<String, String> = keys::ALL
            .iter()
            .map(|k| ((*k).to_owned(), Keywords::english().word(k).to_owned()))
            .collect();
        _ = table.insert(keys::GIVEN.into(), "Given|Giv".into());
        let kw = Keywords::from_map(&table).unwrap();

        assert_eq!(kw.step_type_for("Giv a stone").unwrap(), StepType::Given);
        assert_eq!(kw.starting_word_for(StepType::Given).unwrap(), "Given");
    }

    #[test]
    fn missing_keyword_is_reported() {
        let table: HashMap<String, String> =
            [("Given".to_owned(), "Given".to_owned())].into_iter().collect();

        let err = Keywords::from_map(&table).unwrap_err();

        assert_eq!(err.name, keys::WHEN);
    }

    #[test]
    fn unresolvable_type_is_an_error() {
        let kw = Keywords::default()
            .with_starting_words(StepType::Then, Vec::<String>::new());

        assert_eq!(
            kw.starting_word_for(StepType::Then),
            Err(StartingWordNotFound::OfType { step_type: StepType::Then }),
        );
    }

    #[test]
    fn classifies_ignored_steps_and_comments() {
        let kw = Keywords::default();

        assert!(kw.is_ignored_step("!-- Given a stone"));
        assert!(!kw.is_comment("!-- Given a stone"));
        assert!(kw.is_comment("!-- just a note"));
        assert!(!kw.is_comment("Given a stone"));
    }
}
