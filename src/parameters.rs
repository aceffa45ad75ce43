// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Named parameters and their conversion into typed values.
//!
//! Raw parameter values come from three places: the placeholders captured by
//! a [`StepMatcher`], the [`Row`] of an examples table and any further
//! fallback maps layered with [`ChainedParameters`]. They are turned into
//! typed values by the [`ParameterConverters`] registry.
//!
//! [`StepMatcher`]: crate::StepMatcher

pub mod builtin;
pub mod converters;
pub mod table;
pub mod types;

use std::borrow::Cow;

use derive_more::with_trait::{Deref, DerefMut, From, Into};
use linked_hash_map::LinkedHashMap;
use smart_default::SmartDefault;

#[doc(inline)]
pub use self::{
    builtin::{
        BooleanConverter, CharConverter, CollectionConverter, Currency,
        CurrencyConverter, DateConverter, DurationConverter, EnumConverter,
        ExamplesTableConverter, FluentEnumConverter, NumberConverter,
        NumberFormat, PathConverter, RegexConverter, RowsConverter,
        StringConverter, TableRowsConverter, TemporalConverter,
    },
    converters::{
        ChainedConverter, Conversion, ConversionError, FunctionalConverter,
        Input, ParameterConverter, ParameterConverters,
    },
    table::{ExamplesTable, FromRow, TypedRow},
    types::{
        CollectionKind, CollectionType, EnumType, ParamType, Parameter,
        ParameterEnum, Shape, Value,
    },
};

/// Source of raw values looked up by name.
pub trait NamedParameters {
    /// Raw value of the parameter called `name`.
    fn value_of(&self, name: &str) -> Option<&str>;
}

/// Ordered mapping of parameter names to raw values, like a row of an
/// examples table.
#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, From, Into, PartialEq)]
pub struct Row(LinkedHashMap<String, String>);

impl Row {
    /// Creates an empty [`Row`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns this [`Row`] with the `name` set to the `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        _ = self.0.insert(name.into(), value.into());
        self
    }

    /// Names of the values, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl NamedParameters for Row {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Layers of [`Row`]s looked up in order: an earlier layer wins over a later
/// one on a name collision.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChainedParameters {
    layers: Vec<Row>,
}

impl ChainedParameters {
    /// Creates [`ChainedParameters`] with a single layer.
    #[must_use]
    pub fn new(first: Row) -> Self {
        Self { layers: vec![first] }
    }

    /// Appends a fallback layer, consulted after all existing ones.
    #[must_use]
    pub fn then(mut self, fallback: Row) -> Self {
        self.layers.push(fallback);
        self
    }

    /// Indicates whether any layer defines the `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.value_of(name).is_some()
    }

    /// Flattens the layers into a single [`Row`], keeping the value of the
    /// earliest layer for every name.
    #[must_use]
    pub fn flatten(&self) -> Row {
        let mut row = Row::new();
        for layer in &self.layers {
            for (name, value) in layer.iter() {
                if !row.contains_key(name) {
                    _ = row.insert(name.clone(), value.clone());
                }
            }
        }
        row
    }
}

impl NamedParameters for ChainedParameters {
    fn value_of(&self, name: &str) -> Option<&str> {
        self.layers.iter().find_map(|l| l.value_of(name))
    }
}

/// Prefix marking the start of a parameter value in a parametrised step.
pub const PARAMETER_VALUE_START: char = '\u{FF5F}';

/// Suffix marking the end of a parameter value in a parametrised step.
pub const PARAMETER_VALUE_END: char = '\u{FF60}';

/// Replacement of newlines inside a marked parameter value.
pub const PARAMETER_VALUE_NEWLINE: char = '\u{2424}';

/// Prefix marking the start of a table value in a parametrised step.
pub const PARAMETER_TABLE_START: char = '\u{FF3B}';

/// Suffix marking the end of a table value in a parametrised step.
pub const PARAMETER_TABLE_END: char = '\u{FF3D}';

/// Delimiters of named parameter references like `<name>`.
#[derive(Clone, Debug, Eq, PartialEq, SmartDefault)]
pub struct ParameterControls {
    /// Left delimiter of a name.
    #[default("<")]
    name_delimiter_left: String,

    /// Right delimiter of a name.
    #[default(">")]
    name_delimiter_right: String,

    /// Whether delimited names inside captured values are replaced by the
    /// named parameters.
    #[default(true)]
    delimiter_named_parameters: bool,
}

impl ParameterControls {
    /// Returns these [`ParameterControls`] with custom name delimiters.
    #[must_use]
    pub fn with_name_delimiters(
        mut self,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        self.name_delimiter_left = left.into();
        self.name_delimiter_right = right.into();
        self
    }

    /// Returns these [`ParameterControls`] with replacement of delimited
    /// names inside captured values switched on or off.
    #[must_use]
    pub const fn with_delimiter_named_parameters(mut self, on: bool) -> Self {
        self.delimiter_named_parameters = on;
        self
    }

    /// Whether delimited names inside captured values are replaced.
    #[must_use]
    pub const fn delimiter_named_parameters(&self) -> bool {
        self.delimiter_named_parameters
    }

    /// Wraps the `name` into the delimiters.
    #[must_use]
    pub fn create_delimited_name(&self, name: &str) -> String {
        format!(
            "{}{name}{}",
            self.name_delimiter_left, self.name_delimiter_right,
        )
    }

    /// Replaces every delimited name in the `text` that the `parameters`
    /// define. Unknown names are left untouched.
    #[must_use]
    pub fn replace_all_delimited<'t>(
        &self,
        text: &'t str,
        parameters: &dyn NamedParameters,
    ) -> Cow<'t, str> {
        let (left, right) =
            (&self.name_delimiter_left, &self.name_delimiter_right);
        if left.is_empty() || right.is_empty() || !text.contains(left.as_str())
        {
            return Cow::Borrowed(text);
        }

        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(left.as_str()) {
            let after = &rest[start + left.len()..];
            let Some(end) = after.find(right.as_str()) else { break };
            let name = &after[..end];
            let replacement = (!name.is_empty()
                && name.chars().all(|c| c.is_alphanumeric() || c == '_'))
            .then(|| parameters.value_of(name))
            .flatten();
            out.push_str(&rest[..start]);
            match replacement {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[end + right.len()..];
                }
                None => {
                    out.push_str(left);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        Cow::Owned(out)
    }
}
