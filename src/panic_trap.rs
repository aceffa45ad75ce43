// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Turning panics of user code into errors.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use derive_more::with_trait::{Display, Error};

/// Panic caught while running user code.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("{payload}")]
pub struct PanicDetails {
    /// Rendered panic payload.
    #[error(not(source))]
    pub payload: String,
}

impl PanicDetails {
    fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let payload = if let Some(string) = payload.downcast_ref::<String>() {
            string.clone()
        } else if let Some(&string) = payload.downcast_ref::<&str>() {
            string.to_owned()
        } else {
            "(Could not resolve panic payload)".to_owned()
        };
        Self { payload }
    }
}

/// Runs the `f`, converting a panic into an error.
///
/// # Errors
///
/// With [`PanicDetails`] if the `f` panics, or with whatever the `f` returns.
pub(crate) fn run<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let details = PanicDetails::from_payload(payload.as_ref());
        tracing::debug!(payload = %details, "step panicked");
        Err(details.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_results_through() {
        assert!(run(|| Ok(())).is_ok());
        assert_eq!(
            run(|| Err(anyhow::anyhow!("nope"))).unwrap_err().to_string(),
            "nope",
        );
    }

    #[test]
    fn renders_panic_payloads() {
        let err = run(|| panic!("broke {}", 42)).unwrap_err();
        assert_eq!(err.to_string(), "broke 42");
        assert!(err.downcast_ref::<PanicDetails>().is_some());

        let err = run(|| std::panic::panic_any(7_u8)).unwrap_err();
        assert_eq!(err.to_string(), "(Could not resolve panic payload)");
    }
}
