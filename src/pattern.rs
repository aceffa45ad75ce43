// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Compiling step patterns into [`StepMatcher`]s.
//!
//! A pattern like `I live on the $nth floor` becomes an anchored [`Regex`]
//! capturing one group per placeholder. Both `$name` and `<name>`
//! placeholders are recognised, literal text is escaped and any run of
//! whitespace matches any other run of whitespace.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
};

use derive_more::with_trait::{Deref, Display};
use itertools::Itertools as _;
use lazy_regex::regex;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::{error::ConfigurationError, keywords::StepType};

/// [`Regex`] wrapper implementing [`Eq`], [`Ord`] and [`Hash`] by its source.
#[derive(Clone, Debug, Deref, Display)]
pub struct HashableRegex(Regex);

impl HashableRegex {
    /// Returns the wrapped [`Regex`].
    #[must_use]
    pub const fn inner(&self) -> &Regex {
        &self.0
    }
}

impl From<Regex> for HashableRegex {
    fn from(re: Regex) -> Self {
        Self(re)
    }
}

impl Hash for HashableRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_str().hash(state);
    }
}

impl PartialEq for HashableRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

impl Eq for HashableRegex {}

impl PartialOrd for HashableRegex {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HashableRegex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_str().cmp(other.0.as_str())
    }
}

/// Parser of textual step patterns.
pub trait StepPatternParser: fmt::Debug + Send + Sync {
    /// Compiles the `pattern` of a step of the given [`StepType`].
    ///
    /// # Errors
    ///
    /// If the resulting expression cannot be compiled.
    fn parse_step(
        &self,
        step_type: StepType,
        pattern: &str,
    ) -> Result<StepMatcher, ConfigurationError>;

    /// Prefix of `$name`-style placeholders.
    fn prefix(&self) -> &str;
}

/// [`StepPatternParser`] capturing prefixed (`$name`) and delimited
/// (`<name>`) placeholders.
#[derive(Clone, Debug)]
pub struct RegexPrefixCapturingPatternParser {
    /// Prefix of placeholder names.
    prefix: String,

    /// Expression finding placeholders, compiled on first use.
    placeholder: OnceCell<Regex>,
}

impl PartialEq for RegexPrefixCapturingPatternParser {
    fn eq(&self, other: &Self) -> bool {
        self.prefix == other.prefix
    }
}

impl Eq for RegexPrefixCapturingPatternParser {}

impl Default for RegexPrefixCapturingPatternParser {
    fn default() -> Self {
        Self::new("$")
    }
}

impl RegexPrefixCapturingPatternParser {
    /// Creates a new parser recognising placeholders starting with `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), placeholder: OnceCell::new() }
    }

    fn placeholder(&self) -> Result<&Regex, regex::Error> {
        self.placeholder.get_or_try_init(|| {
            Regex::new(&format!(
                r"{}(\w*)|<(\w+)>",
                regex::escape(&self.prefix),
            ))
        })
    }
}

impl StepPatternParser for RegexPrefixCapturingPatternParser {
    fn parse_step(
        &self,
        step_type: StepType,
        pattern: &str,
    ) -> Result<StepMatcher, ConfigurationError> {
        let placeholder = self
            .placeholder()
            .map_err(|e| ConfigurationError::invalid_pattern(pattern, e))?;

        let mut expression = String::from("(?s)^");
        let mut names = Vec::new();
        let mut last = 0;
        for caps in placeholder.captures_iter(pattern) {
            let Some(whole) = caps.get(0) else { continue };
            expression.push_str(&literal(&pattern[last..whole.start()]));
            expression.push_str("(.*)");
            names.push(
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .map_or_else(String::new, |m| m.as_str().to_owned()),
            );
            last = whole.end();
        }
        expression.push_str(&literal(&pattern[last..]));
        expression.push('$');

        let regex = Regex::new(&expression)
            .map_err(|e| ConfigurationError::invalid_pattern(pattern, e))?;
        tracing::trace!(pattern, %regex, "compiled step pattern");

        Ok(StepMatcher {
            step_type,
            pattern: pattern.to_owned(),
            regex: regex.into(),
            parameter_names: names,
        })
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// Escapes the `text` keeping whitespace runs interchangeable.
fn literal(text: &str) -> String {
    regex!(r"\s+").split(text).map(regex::escape).join(r"\s+")
}

/// Compiled step pattern.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
#[display("{pattern}")]
pub struct StepMatcher {
    /// Type of the steps this matcher is declared for.
    step_type: StepType,

    /// Pattern as declared.
    pattern: String,

    /// Compiled expression.
    regex: HashableRegex,

    /// Placeholder names in order of appearance.
    parameter_names: Vec<String>,
}

impl StepMatcher {
    /// Creates a [`StepMatcher`] out of an already compiled [`Regex`] whose
    /// groups are named by the `parameter_names` in order.
    #[must_use]
    pub fn from_regex(
        step_type: StepType,
        regex: Regex,
        parameter_names: Vec<String>,
    ) -> Self {
        Self {
            step_type,
            pattern: regex.as_str().to_owned(),
            regex: regex.into(),
            parameter_names,
        }
    }

    /// Type of the steps this matcher is declared for.
    #[must_use]
    pub const fn step_type(&self) -> StepType {
        self.step_type
    }

    /// Pattern as declared.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Compiled expression.
    #[must_use]
    pub const fn regex(&self) -> &HashableRegex {
        &self.regex
    }

    /// Placeholder names in order of appearance.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Indicates whether the whole `text` (a step without its starting word)
    /// matches.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Extracts the captured placeholder values of the `text`, if it matches.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<MatchedParameters> {
        let caps = self.regex.captures(text)?;
        let (values, spans) = caps
            .iter()
            .skip(1)
            .map(|m| {
                m.map_or_else(
                    || (String::new(), None),
                    |m| (m.as_str().to_owned(), Some(m.range())),
                )
            })
            .unzip::<_, _, Vec<_>, Vec<_>>();
        let names = (0..values.len())
            .map(|i| self.parameter_names.get(i).cloned().unwrap_or_default())
            .collect();
        Some(MatchedParameters { names, values, spans })
    }
}

/// Values captured by a [`StepMatcher`], addressable by position and by
/// placeholder name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchedParameters {
    /// Placeholder names, parallel to `values`.
    names: Vec<String>,

    /// Captured values.
    values: Vec<String>,

    /// Byte ranges of the captured values in the matched text.
    spans: Vec<Option<Range<usize>>>,
}

impl MatchedParameters {
    /// Number of captured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Indicates whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Placeholder names, in order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Value captured at the zero-based `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).map(String::as_str)
    }

    /// Byte range of the value captured at the zero-based `position`.
    #[must_use]
    pub fn span(&self, position: usize) -> Option<Range<usize>> {
        self.spans.get(position).cloned().flatten()
    }

    /// Value captured by the first placeholder called `name`.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.position_of(name).and_then(|i| self.get(i))
    }

    /// Position of the first placeholder called `name`.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names
            .iter()
            .zip(&self.values)
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
