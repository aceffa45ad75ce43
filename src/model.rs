// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Stories, scenarios and the metadata around them.
//!
//! Parsing story files is left to the caller: these types are built
//! programmatically, or by whatever parser produces them.

use std::collections::BTreeMap;

use crate::{
    collector::{Outcome, Scope},
    parameters::{ChainedParameters, ExamplesTable, NamedParameters, Row},
};

/// Prefix of a property in textual [`Meta`].
pub const META_PROPERTY: &str = "@";

/// Named properties of a story or scenario, sorted by name.
///
/// Hooks read their parameters from the [`Meta`] of what they run around.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Meta(BTreeMap<String, String>);

impl Meta {
    /// Creates an empty [`Meta`].
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parses `@name value` properties.
    ///
    /// The value is everything after the first space, trimmed. Anything
    /// following the `ignorable` word within a property is dropped.
    ///
    /// ```rust
    /// # use stepwise::model::Meta;
    /// let meta = Meta::parse("@author Mauro @theme parsing !-- for now", "!--");
    ///
    /// assert_eq!(meta.property("author"), "Mauro");
    /// assert_eq!(meta.property("theme"), "parsing");
    /// ```
    #[must_use]
    pub fn parse(text: &str, ignorable: &str) -> Self {
        text.split(META_PROPERTY)
            .map(|p| p.split(ignorable).next().unwrap_or_default())
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                let p = p.trim();
                let (name, value) = p.split_once(' ').unwrap_or((p, ""));
                (name.trim(), value.trim())
            })
            .collect()
    }

    /// Names of the properties, sorted.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Indicates whether the property of the `name` is present.
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Value of the property of the `name`, or an empty one if absent.
    #[must_use]
    pub fn property(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    /// Returns these properties completed with the ones of the `parent`
    /// this [`Meta`] does not define.
    #[must_use]
    pub fn inherit_from(&self, parent: &Self) -> Self {
        let mut inherited = parent.0.clone();
        inherited.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self(inherited)
    }

    /// Indicates whether there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the properties as `@name value` pairs.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{META_PROPERTY}{k} {v}").trim_end().to_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl NamedParameters for Meta {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Meta {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Why a story exists, from the point of view of its stakeholder.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Narrative {
    /// Benefit sought.
    pub in_order_to: String,

    /// Role of the stakeholder.
    pub as_a: String,

    /// Feature wanted.
    pub i_want_to: String,
}

impl Narrative {
    /// Indicates whether nothing is narrated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.in_order_to.is_empty() && self.as_a.is_empty() && self.i_want_to.is_empty()
    }
}

/// Stories run ahead of a story or scenario, to set up its preconditions.
#[derive(Clone, Debug, Default)]
pub struct GivenStories(Vec<Story>);

impl GivenStories {
    /// Creates [`GivenStories`] out of the `stories`.
    #[must_use]
    pub fn new(stories: impl IntoIterator<Item = Story>) -> Self {
        Self(stories.into_iter().collect())
    }

    /// Stories to run, in order.
    #[must_use]
    pub fn stories(&self) -> &[Story] {
        &self.0
    }

    /// Paths of the stories, in order.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(Story::path).collect()
    }

    /// Indicates whether there are no given stories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Steps of a [`Lifecycle`] for one [`Scope`] and, for after steps, one
/// [`Outcome`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LifecycleSteps {
    /// Around what the steps run.
    pub scope: Scope,

    /// Outcome the steps are restricted to. Before steps use
    /// [`Outcome::Any`].
    pub outcome: Outcome,

    /// Textual steps.
    pub steps: Vec<String>,
}

/// Textual steps a story declares to run before and after each of its
/// scenarios, or around the story itself.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Lifecycle {
    before: Vec<LifecycleSteps>,
    after: Vec<LifecycleSteps>,
}

impl Lifecycle {
    /// Creates an empty [`Lifecycle`].
    #[must_use]
    pub const fn new() -> Self {
        Self { before: Vec::new(), after: Vec::new() }
    }

    /// Adds `steps` to run before every unit of the `scope`.
    #[must_use]
    pub fn with_before<I, S>(mut self, scope: Scope, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.push(LifecycleSteps {
            scope,
            outcome: Outcome::Any,
            steps: steps.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Adds `steps` to run after every unit of the `scope` ending with the
    /// `outcome`.
    #[must_use]
    pub fn with_after<I, S>(mut self, scope: Scope, outcome: Outcome, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.push(LifecycleSteps {
            scope,
            outcome,
            steps: steps.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Before steps of the `scope`, in declaration order.
    pub fn before_steps(&self, scope: Scope) -> impl Iterator<Item = &str> {
        self.before
            .iter()
            .filter(move |s| s.scope == scope)
            .flat_map(|s| s.steps.iter().map(String::as_str))
    }

    /// After steps of the `scope` restricted to the `outcome`, in
    /// declaration order.
    pub fn after_steps(
        &self,
        scope: Scope,
        outcome: Outcome,
    ) -> impl Iterator<Item = &str> {
        self.after
            .iter()
            .filter(move |s| s.scope == scope && s.outcome == outcome)
            .flat_map(|s| s.steps.iter().map(String::as_str))
    }

    /// Indicates whether no steps are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.iter().chain(&self.after).all(|s| s.steps.is_empty())
    }
}

/// Titled sequence of textual steps, run once, or once per examples row.
#[derive(Clone, Debug, Default)]
pub struct Scenario {
    title: String,
    meta: Meta,
    given_stories: GivenStories,
    examples: ExamplesTable,
    steps: Vec<String>,
}

impl Scenario {
    /// Creates a [`Scenario`] without steps.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    /// Sets the [`Meta`].
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the stories run ahead of every run of this scenario.
    #[must_use]
    pub fn with_given_stories(mut self, given_stories: GivenStories) -> Self {
        self.given_stories = given_stories;
        self
    }

    /// Sets the examples the scenario is run once per row of.
    #[must_use]
    pub fn with_examples(mut self, examples: ExamplesTable) -> Self {
        self.examples = examples;
        self
    }

    /// Appends a textual step.
    #[must_use]
    pub fn step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Appends textual steps.
    #[must_use]
    pub fn steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// [`Meta`] of the scenario only.
    #[must_use]
    pub const fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Stories run ahead of every run of this scenario.
    #[must_use]
    pub const fn given_stories(&self) -> &GivenStories {
        &self.given_stories
    }

    /// Examples the scenario is run once per row of.
    #[must_use]
    pub const fn examples(&self) -> &ExamplesTable {
        &self.examples
    }

    /// Textual steps.
    #[must_use]
    pub fn steps_as_strings(&self) -> &[String] {
        &self.steps
    }
}

/// Story: a narrative and the scenarios illustrating it.
#[derive(Clone, Debug, Default)]
pub struct Story {
    path: String,
    description: String,
    narrative: Narrative,
    meta: Meta,
    given_stories: GivenStories,
    lifecycle: Lifecycle,
    scenarios: Vec<Scenario>,
}

impl Story {
    /// Creates an empty [`Story`] found at the `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the [`Narrative`].
    #[must_use]
    pub fn with_narrative(mut self, narrative: Narrative) -> Self {
        self.narrative = narrative;
        self
    }

    /// Sets the [`Meta`].
    #[must_use]
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Sets the stories run ahead of this one.
    #[must_use]
    pub fn with_given_stories(mut self, given_stories: GivenStories) -> Self {
        self.given_stories = given_stories;
        self
    }

    /// Sets the [`Lifecycle`].
    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Appends a [`Scenario`].
    #[must_use]
    pub fn scenario(mut self, scenario: Scenario) -> Self {
        self.scenarios.push(scenario);
        self
    }

    /// Path the story was found at, also used as its name.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// [`Narrative`].
    #[must_use]
    pub const fn narrative(&self) -> &Narrative {
        &self.narrative
    }

    /// [`Meta`].
    #[must_use]
    pub const fn meta(&self) -> &Meta {
        &self.meta
    }

    /// Stories run ahead of this one.
    #[must_use]
    pub const fn given_stories(&self) -> &GivenStories {
        &self.given_stories
    }

    /// [`Lifecycle`].
    #[must_use]
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Scenarios, in order.
    #[must_use]
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Properties describing the story itself, each name starting with the
    /// `prefix`.
    #[must_use]
    pub fn as_meta(&self, prefix: &str) -> Meta {
        Meta::from_iter([
            (format!("{prefix}path"), self.path.clone()),
            (format!("{prefix}description"), self.description.clone()),
        ])
    }
}

/// Named parameters a scenario run with an examples `row` sees: the row
/// itself, completed with the `meta` properties it does not define.
#[must_use]
pub fn row_with_meta(row: &Row, meta: &Meta) -> Row {
    let properties = meta
        .property_names()
        .map(|name| (name, meta.property(name)))
        .collect::<Row>();
    ChainedParameters::new(row.clone()).then(properties).flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meta_properties() {
        let meta = Meta::parse("@author Mauro\n@theme  parsing things\n@flag", "!--");

        assert_eq!(meta.property_names().collect::<Vec<_>>(), ["author", "flag", "theme"]);
        assert_eq!(meta.property("theme"), "parsing things");
        assert_eq!(meta.property("flag"), "");
        assert!(meta.has_property("flag"));
        assert_eq!(meta.property("missing"), "");
        assert_eq!(meta.as_string(), "@author Mauro @flag @theme parsing things");
    }

    #[test]
    fn inherits_missing_properties_only() {
        let story = Meta::from_iter([("author", "Mauro"), ("theme", "story")]);
        let scenario = Meta::from_iter([("theme", "scenario")]);

        let meta = scenario.inherit_from(&story);

        assert_eq!(meta.property("author"), "Mauro");
        assert_eq!(meta.property("theme"), "scenario");
    }

    #[test]
    fn filters_lifecycle_steps() {
        let lifecycle = Lifecycle::new()
            .with_before(Scope::Scenario, ["Given a scenario"])
            .with_before(Scope::Story, ["Given a story"])
            .with_after(Scope::Scenario, Outcome::Failure, ["Then clean up"])
            .with_after(Scope::Scenario, Outcome::Any, ["Then log"]);

        assert_eq!(
            lifecycle.before_steps(Scope::Scenario).collect::<Vec<_>>(),
            ["Given a scenario"],
        );
        assert_eq!(
            lifecycle
                .after_steps(Scope::Scenario, Outcome::Failure)
                .collect::<Vec<_>>(),
            ["Then clean up"],
        );
        assert_eq!(lifecycle.after_steps(Scope::Story, Outcome::Any).count(), 0);
        assert!(!lifecycle.is_empty());
        assert!(Lifecycle::new().is_empty());
    }

    #[test]
    fn completes_rows_with_meta() {
        let row = Row::new().with("floor", "3");
        let meta = Meta::from_iter([("floor", "7"), ("building", "A")]);

        let row = row_with_meta(&row, &meta);

        assert_eq!(row.value_of("floor"), Some("3"));
        assert_eq!(row.value_of("building"), Some("A"));
    }
}
