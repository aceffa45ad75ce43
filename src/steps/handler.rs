// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Typed step handlers and their type-erased invocation.
//!
//! Any `Fn(&mut S, A1, .., An) -> R` with up to eight [`Parameter`]
//! arguments is a [`StepHandler`]. Its argument types are captured when it is
//! registered, so raw values can be converted before the call.

use std::{
    any, fmt,
    sync::{Arc, Mutex, PoisonError},
};

use crate::parameters::{ParamType, Parameter, Value};

/// Return type of a step handler.
pub trait StepReturn {
    /// Converts this value into the outcome of the step.
    ///
    /// # Errors
    ///
    /// If the step failed.
    fn into_result(self) -> anyhow::Result<()>;
}

impl StepReturn for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E: Into<anyhow::Error>> StepReturn for Result<(), E> {
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Function performing a step on a steps instance `S`.
///
/// `Args` is a tuple of the argument types, used only to tell the
/// implementations for different arities apart.
pub trait StepHandler<S, Args>: Send + Sync + 'static {
    /// Types of the arguments, in order.
    fn parameter_types(&self) -> Vec<ParamType>;

    /// Calls this handler with already converted `args`.
    ///
    /// # Errors
    ///
    /// If an argument is not of the declared type, or the handler fails.
    fn call(&self, steps: &mut S, args: Vec<Value>) -> anyhow::Result<()>;
}

fn take<T: Parameter>(
    args: &mut impl Iterator<Item = Value>,
) -> anyhow::Result<T> {
    args.next()
        .ok_or_else(|| anyhow::anyhow!("missing argument of {}", any::type_name::<T>()))?
        .downcast::<T>()
        .map(|v| *v)
        .map_err(|_| anyhow::anyhow!("argument is not of {}", any::type_name::<T>()))
}

macro_rules! impl_step_handler {
    ($($ty:ident $var:ident),*) => {
        impl<S, F, R, $($ty,)*> StepHandler<S, ($($ty,)*)> for F
        where
            F: Fn(&mut S, $($ty),*) -> R + Send + Sync + 'static,
            R: StepReturn,
            $($ty: Parameter,)*
        {
            fn parameter_types(&self) -> Vec<ParamType> {
                vec![$($ty::param_type()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn call(&self, steps: &mut S, args: Vec<Value>) -> anyhow::Result<()> {
                let mut args = args.into_iter();
                $(let $var = take::<$ty>(&mut args)?;)*
                self(steps, $($var),*).into_result()
            }
        }
    };
}

impl_step_handler!();
impl_step_handler!(A1 a1);
impl_step_handler!(A1 a1, A2 a2);
impl_step_handler!(A1 a1, A2 a2, A3 a3);
impl_step_handler!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_step_handler!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_step_handler!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_step_handler!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
impl_step_handler!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);

type ErasedCall<S> =
    Box<dyn Fn(&mut S, Vec<Value>) -> anyhow::Result<()> + Send + Sync>;

/// [`StepHandler`] with its arguments tuple erased.
pub(crate) struct Handler<S> {
    parameter_types: Vec<ParamType>,
    call: ErasedCall<S>,
}

impl<S> fmt::Debug for Handler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("parameter_types", &self.parameter_types)
            .finish_non_exhaustive()
    }
}

impl<S: 'static> Handler<S> {
    pub(crate) fn new<Args, H: StepHandler<S, Args>>(handler: H) -> Self {
        Self {
            parameter_types: handler.parameter_types(),
            call: Box::new(move |steps: &mut S, args: Vec<Value>| {
                handler.call(steps, args)
            }),
        }
    }
}

/// Invocation of user code, detached from the type of its steps instance.
pub trait StepInvoker: fmt::Debug + Send + Sync {
    /// Name of the handler, used in reports and generated code.
    fn method(&self) -> &str;

    /// Name of the type declaring the handler.
    fn declared_by(&self) -> &str;

    /// Types of the arguments, in order.
    fn parameter_types(&self) -> &[ParamType];

    /// Invokes the handler with already converted `args`.
    ///
    /// # Errors
    ///
    /// If the handler fails.
    fn invoke(&self, args: Vec<Value>) -> anyhow::Result<()>;
}

/// [`Handler`] bound to a shared steps instance.
pub(crate) struct BoundHandler<S> {
    method: String,
    instance: Arc<Mutex<S>>,
    handler: Handler<S>,
}

impl<S> fmt::Debug for BoundHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundHandler")
            .field("method", &self.method)
            .field("declared_by", &any::type_name::<S>())
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

impl<S> BoundHandler<S> {
    pub(crate) fn new(
        method: impl Into<String>,
        instance: Arc<Mutex<S>>,
        handler: Handler<S>,
    ) -> Self {
        Self { method: method.into(), instance, handler }
    }
}

impl<S: Send + 'static> StepInvoker for BoundHandler<S> {
    fn method(&self) -> &str {
        &self.method
    }

    fn declared_by(&self) -> &str {
        any::type_name::<S>()
    }

    fn parameter_types(&self) -> &[ParamType] {
        &self.handler.parameter_types
    }

    fn invoke(&self, args: Vec<Value>) -> anyhow::Result<()> {
        let mut steps =
            self.instance.lock().unwrap_or_else(PoisonError::into_inner);
        (self.handler.call)(&mut steps, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        total: i64,
    }

    fn bound<Args, H: StepHandler<Counter, Args>>(
        handler: H,
    ) -> (Arc<Mutex<Counter>>, BoundHandler<Counter>) {
        let instance = Arc::new(Mutex::new(Counter::default()));
        let bound = BoundHandler::new(
            "add",
            Arc::clone(&instance),
            Handler::new(handler),
        );
        (instance, bound)
    }

    #[test]
    fn captures_argument_types() {
        let (_, h) = bound(|c: &mut Counter, by: i64, _note: String| c.total += by);

        assert_eq!(h.parameter_types().len(), 2);
        assert!(h.parameter_types()[0].is::<i64>());
        assert!(h.parameter_types()[1].is::<String>());
        assert_eq!(h.method(), "add");
        assert!(h.declared_by().ends_with("Counter"));
    }

    #[test]
    fn invokes_with_converted_arguments() {
        let (instance, h) = bound(|c: &mut Counter, by: i64| c.total += by);

        h.invoke(vec![Box::new(3_i64)]).unwrap();
        h.invoke(vec![Box::new(4_i64)]).unwrap();

        assert_eq!(instance.lock().unwrap().total, 7);
    }

    #[test]
    fn propagates_handler_errors() {
        let (_, h) = bound(|_: &mut Counter| -> anyhow::Result<()> {
            anyhow::bail!("not today")
        });

        assert_eq!(h.invoke(vec![]).unwrap_err().to_string(), "not today");
    }

    #[test]
    fn rejects_arguments_of_other_types() {
        let (_, h) = bound(|c: &mut Counter, by: i64| c.total += by);

        assert!(h.invoke(vec![Box::new("3")]).is_err());
        assert!(h.invoke(vec![]).is_err());
    }
}
