// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Binding handler parameters to raw values and marking them in step text.

use std::ops::Range;

use crate::{
    monitor::StepMonitor,
    parameters::{
        ExamplesTable, NamedParameters, ParamType, ParameterControls, Row,
        PARAMETER_TABLE_END, PARAMETER_TABLE_START, PARAMETER_VALUE_END,
        PARAMETER_VALUE_NEWLINE, PARAMETER_VALUE_START,
    },
    pattern::MatchedParameters,
    steps::ParameterNamer,
};

use super::failure::ParameterNotFound;

/// Where the raw value of a handler parameter comes from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Source {
    /// Placeholder captured at this position.
    Group(usize),

    /// Named parameter (usually a table column) of this name.
    Table(String),
}

/// Raw value bound to a handler parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Bound {
    pub(crate) value: String,
    pub(crate) source: Source,
}

/// Resolves the raw value of every handler parameter.
///
/// For each position, in order of precedence: the annotated name as a
/// placeholder, the declared name as a placeholder, the annotated name as a
/// named parameter, the declared name as a named parameter and finally the
/// placeholder at the same position.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ParameterBinder<'a> {
    pub(crate) matched: Option<&'a MatchedParameters>,
    pub(crate) group_names: &'a [String],
    pub(crate) namer: &'a ParameterNamer,
    pub(crate) named: &'a Row,
    pub(crate) controls: &'a ParameterControls,
    pub(crate) monitor: &'a dyn StepMonitor,
}

impl ParameterBinder<'_> {
    /// Binds the parameters at positions `0..count`.
    pub(crate) fn bind_all(
        &self,
        count: usize,
    ) -> Result<Vec<Bound>, ParameterNotFound> {
        (0..count).map(|position| self.bind(position)).collect()
    }

    /// Binds the parameter at the `position`.
    pub(crate) fn bind(&self, position: usize) -> Result<Bound, ParameterNotFound> {
        let annotated = self.namer.annotated_name(position);
        let declared = self.namer.parameter_name(position);

        let bound = if let Some(name) = annotated.filter(|n| self.is_group(n)) {
            self.monitor.using_annotated_name_for_parameter(name, position);
            self.group_by_name(name)?
        } else if let Some(name) = declared.filter(|n| self.is_group(n)) {
            self.monitor.using_parameter_name_for_parameter(name, position);
            self.group_by_name(name)?
        } else if let Some(name) = annotated.filter(|n| self.is_table(n)) {
            self.monitor
                .using_table_annotated_name_for_parameter(name, position);
            self.table(name)
        } else if let Some(name) = declared.filter(|n| self.is_table(n)) {
            self.monitor
                .using_table_parameter_name_for_parameter(name, position);
            self.table(name)
        } else {
            self.monitor.using_natural_order_for_parameter(position);
            self.group_at(position)?
        };
        self.monitor.found_parameter(&bound.value, position);
        Ok(bound)
    }

    fn is_group(&self, name: &str) -> bool {
        self.group_names.iter().any(|n| n == name)
    }

    fn is_table(&self, name: &str) -> bool {
        self.named.value_of(name).is_some()
    }

    fn table(&self, name: &str) -> Bound {
        Bound {
            value: self.named.value_of(name).unwrap_or_default().to_owned(),
            source: Source::Table(name.to_owned()),
        }
    }

    fn group_by_name(&self, name: &str) -> Result<Bound, ParameterNotFound> {
        self.matched
            .and_then(|m| m.position_of(name))
            .and_then(|position| self.group(position))
            .ok_or_else(|| ParameterNotFound::ForName {
                name: name.to_owned(),
                available: self.group_names.to_vec(),
            })
    }

    fn group_at(&self, position: usize) -> Result<Bound, ParameterNotFound> {
        (position < self.group_names.len())
            .then(|| self.group(position))
            .flatten()
            .ok_or_else(|| ParameterNotFound::ForPosition {
                position,
                available: self.group_names.to_vec(),
            })
    }

    fn group(&self, position: usize) -> Option<Bound> {
        let raw = self.matched.and_then(|m| m.get(position))?;
        let value = if self.controls.delimiter_named_parameters() {
            self.controls.replace_all_delimited(raw, self.named).into_owned()
        } else {
            raw.to_owned()
        };
        Some(Bound { value, source: Source::Group(position) })
    }
}

/// Marks the bound values in the `step` text.
///
/// `offset` is the byte position in the `step` where the text matched by the
/// pattern starts. Placeholder values are marked where they were captured,
/// named parameters wherever their delimited name appears, whether bound to
/// a handler parameter or not.
pub(crate) fn parametrise(
    step: &str,
    offset: usize,
    matched: Option<&MatchedParameters>,
    bound: &[Bound],
    named: &Row,
    types: &[ParamType],
    controls: &ParameterControls,
) -> String {
    let mut edits = Vec::<(Range<usize>, String)>::new();
    for (position, b) in bound.iter().enumerate() {
        let table = types
            .get(position)
            .is_some_and(|ty| ty.is::<ExamplesTable>());
        let marked = mark(&b.value, table);
        match &b.source {
            Source::Group(group) => {
                if let Some(span) = matched.and_then(|m| m.span(*group)) {
                    edits.push((span.start + offset..span.end + offset, marked));
                }
            }
            Source::Table(name) => {
                let delimited = controls.create_delimited_name(name);
                edits.extend(
                    step.match_indices(&delimited)
                        .map(|(at, d)| (at..at + d.len(), marked.clone())),
                );
            }
        }
    }
    for name in named.names() {
        let delimited = controls.create_delimited_name(name);
        let marked = mark(named.value_of(name).unwrap_or_default(), false);
        edits.extend(
            step.match_indices(&delimited)
                .map(|(at, d)| (at..at + d.len(), marked.clone())),
        );
    }
    // Stable, so bound values win over named ones at the same position.
    edits.sort_by_key(|(range, _)| range.start);

    let mut out = String::with_capacity(step.len());
    let mut last = 0;
    for (range, replacement) in edits {
        if range.start < last || range.end > step.len() {
            continue;
        }
        out.push_str(&step[last..range.start]);
        out.push_str(&replacement);
        last = range.end;
    }
    out.push_str(&step[last..]);
    out
}

fn mark(value: &str, table: bool) -> String {
    if table {
        format!("{PARAMETER_TABLE_START}{value}{PARAMETER_TABLE_END}")
    } else {
        let value = value.replace('\n', &PARAMETER_VALUE_NEWLINE.to_string());
        format!("{PARAMETER_VALUE_START}{value}{PARAMETER_VALUE_END}")
    }
}
