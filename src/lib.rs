// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![deny(
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts
)]
#![forbid(non_ascii_idents, unsafe_code)]
#![warn(
    clippy::pedantic,
    missing_docs,
    unused_import_braces,
    unused_labels,
    unused_qualifications,
    unused_results
)]
#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

pub mod candidate;
pub mod cli;
pub mod collector;
pub mod configuration;
pub mod error;
pub mod finder;
pub mod keywords;
pub mod model;
pub mod monitor;
mod panic_trap;
pub mod parameters;
pub mod pattern;
pub mod pending;
pub mod reporter;
pub mod runner;
pub mod step;
pub mod steps;

#[doc(inline)]
pub use self::{
    candidate::StepCandidate,
    collector::{
        MarkUnmatchedStepsAsPending, Outcome, ScenarioType, Scope, Stage,
        StepCollector,
    },
    configuration::Configuration,
    error::ConfigurationError,
    finder::{
        ByLevenshteinDistance, ByPriorityField, PrioritisingStrategy,
        StepFinder,
    },
    keywords::{Keywords, StepType},
    monitor::{SilentStepMonitor, StepMonitor, TracingStepMonitor},
    parameters::{
        ExamplesTable, ParameterControls, ParameterConverter,
        ParameterConverters, Row,
    },
    pattern::{
        MatchedParameters, RegexPrefixCapturingPatternParser, StepMatcher,
        StepPatternParser,
    },
    pending::PendingStepMethodGenerator,
    reporter::{
        ConcurrentStoryReporter, ConsoleOutput, DelegatingStoryReporter,
        PostStoryStatisticsCollector, StoryReporter,
    },
    runner::{RunError, RunOutcome, StoryRunner},
    step::{RestartingScenarioFailure, Step, StepResult, UuidFailure},
    steps::{CandidateSteps, HookOptions, StepOptions, Steps},
};
