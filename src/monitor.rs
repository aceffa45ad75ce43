// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Observing matching, binding and performing decisions.

use std::fmt;

use crate::{keywords::StepType, parameters::ParamType};

/// Observer of the decisions taken while matching and performing steps.
///
/// Every method has an empty default body.
pub trait StepMonitor: fmt::Debug + Send + Sync {
    /// A candidate's type was compared against a literal step.
    fn step_matches_type(
        &self,
        _step: &str,
        _previous_non_and: Option<&str>,
        _matches: bool,
        _step_type: StepType,
        _candidate: &str,
    ) {
    }

    /// A candidate's pattern was compared against a literal step.
    fn step_matches_pattern(
        &self,
        _step: &str,
        _matches: bool,
        _pattern: &str,
        _declared_by: &str,
    ) {
    }

    /// A raw value was converted.
    fn converted_value_of_type(
        &self,
        _value: &str,
        _target: &ParamType,
        _converter: &str,
    ) {
    }

    /// A step is about to be performed.
    fn performing(&self, _step: &str, _dry_run: bool) {}

    /// A parameter is bound by its annotated name to a placeholder.
    fn using_annotated_name_for_parameter(&self, _name: &str, _position: usize) {
    }

    /// A parameter is bound by its declared name to a placeholder.
    fn using_parameter_name_for_parameter(&self, _name: &str, _position: usize) {
    }

    /// A parameter is bound by its annotated name to a table column.
    fn using_table_annotated_name_for_parameter(
        &self,
        _name: &str,
        _position: usize,
    ) {
    }

    /// A parameter is bound by its declared name to a table column.
    fn using_table_parameter_name_for_parameter(
        &self,
        _name: &str,
        _position: usize,
    ) {
    }

    /// A parameter is bound to the placeholder at its own position.
    fn using_natural_order_for_parameter(&self, _position: usize) {}

    /// A raw parameter value was found.
    fn found_parameter(&self, _value: &str, _position: usize) {}
}

/// [`StepMonitor`] ignoring everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentStepMonitor;

impl StepMonitor for SilentStepMonitor {}

/// [`StepMonitor`] emitting [`tracing`] events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingStepMonitor;

impl StepMonitor for TracingStepMonitor {
    fn step_matches_type(
        &self,
        step: &str,
        previous_non_and: Option<&str>,
        matches: bool,
        step_type: StepType,
        candidate: &str,
    ) {
        tracing::debug!(
            step,
            previous_non_and,
            matches,
            %step_type,
            candidate,
            "step type check",
        );
    }

    fn step_matches_pattern(
        &self,
        step: &str,
        matches: bool,
        pattern: &str,
        declared_by: &str,
    ) {
        tracing::debug!(step, matches, pattern, declared_by, "pattern check");
    }

    fn converted_value_of_type(
        &self,
        value: &str,
        target: &ParamType,
        converter: &str,
    ) {
        tracing::trace!(value, target = target.name(), converter, "converted");
    }

    fn performing(&self, step: &str, dry_run: bool) {
        tracing::debug!(step, dry_run, "performing");
    }

    fn using_annotated_name_for_parameter(&self, name: &str, position: usize) {
        tracing::trace!(name, position, "binding by annotated name");
    }

    fn using_parameter_name_for_parameter(&self, name: &str, position: usize) {
        tracing::trace!(name, position, "binding by parameter name");
    }

    fn using_table_annotated_name_for_parameter(
        &self,
        name: &str,
        position: usize,
    ) {
        tracing::trace!(name, position, "binding table column by annotated name");
    }

    fn using_table_parameter_name_for_parameter(
        &self,
        name: &str,
        position: usize,
    ) {
        tracing::trace!(
            name,
            position,
            "binding table column by parameter name",
        );
    }

    fn using_natural_order_for_parameter(&self, position: usize) {
        tracing::trace!(position, "binding by natural order");
    }

    fn found_parameter(&self, value: &str, position: usize) {
        tracing::trace!(value, position, "found parameter");
    }
}
