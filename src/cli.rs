// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI options overriding a [`Configuration`].
//!
//! [`Opts`] is a [`clap::Args`], so it may be flattened into the CLI of a
//! test executable:
//!
//! ```rust
//! # use stepwise::{cli, Configuration};
//! #[derive(clap::Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     stories: cli::Opts,
//! }
//!
//! let cli = <Cli as clap::Parser>::parse_from(["test", "--threads", "4"]);
//! let configuration = cli.stories.apply(Configuration::default());
//! assert_eq!(configuration.threads(), 4);
//! ```

use std::{sync::Arc, time::Duration};

use crate::{configuration::Configuration, monitor::TracingStepMonitor};

pub use clap::{Args, Parser};

/// Options of a run.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct Opts {
    /// Match and report steps without invoking them.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Number of stories to run concurrently.
    #[arg(long, short = 'j', value_name = "int", global = true)]
    pub threads: Option<usize>,

    /// Fail the run on pending steps.
    #[arg(long, global = true)]
    pub fail_on_pending: bool,

    /// Time a story may take before its remaining steps are not performed.
    #[arg(
        long,
        value_name = "duration",
        value_parser = humantime::parse_duration,
        global = true
    )]
    pub story_timeout: Option<Duration>,

    /// Log matching and conversion of steps with `tracing`.
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

impl Opts {
    /// Overrides the `configuration` with the given options. Options left
    /// unspecified keep the configured values.
    #[must_use]
    pub fn apply(&self, mut configuration: Configuration) -> Configuration {
        if self.dry_run {
            configuration = configuration.with_dry_run(true);
        }
        if self.fail_on_pending {
            configuration = configuration.with_fail_on_pending(true);
        }
        if let Some(threads) = self.threads {
            configuration = configuration.with_threads(threads);
        }
        if self.story_timeout.is_some() {
            configuration = configuration.with_story_timeout(self.story_timeout);
        }
        if self.verbose {
            configuration =
                configuration.with_step_monitor(Arc::new(TracingStepMonitor));
        }
        configuration
    }
}
