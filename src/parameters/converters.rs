// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`ParameterConverter`] abstraction and the [`ParameterConverters`]
//! registry.
//!
//! The registry keeps its converters in an immutable snapshot swapped on
//! every registration, so a conversion always runs against the snapshot it
//! started with, no matter how many converters are added meanwhile.

use std::{
    fmt,
    marker::PhantomData,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use derive_more::with_trait::{Display, Error};
use either::Either;
use itertools::Itertools as _;

use super::{
    builtin::{
        BooleanConverter, CharConverter, CollectionConverter,
        CurrencyConverter, DateConverter, DurationConverter,
        ExamplesTableConverter, FluentEnumConverter, NumberConverter,
        NumberFormat, PathConverter, RegexConverter, StringConverter,
        TableRowsConverter, TemporalConverter,
    },
    types::{ParamType, Parameter, Value},
};
use crate::monitor::{SilentStepMonitor, StepMonitor};

/// Longest chain of converters resolved for a single conversion.
pub const MAX_CHAIN_DEPTH: usize = 8;

/// Default separator of collection items.
pub const DEFAULT_LIST_SEPARATOR: &str = ",";

/// Input of a [`ParameterConverter`]: raw text, or the value produced by the
/// converter of its [source type][0].
///
/// [0]: ParameterConverter::source_type
pub type Input<'a> = Either<&'a str, Value>;

/// Failure to convert a raw parameter value.
#[derive(Clone, Debug, Display, Error)]
pub enum ConversionError {
    /// No converter accepts the target type.
    #[display("No parameter converter for {target}")]
    NoConverter {
        /// Name of the target type.
        #[error(not(source))]
        target: String,
    },

    /// A converter accepted the target type but the value is malformed.
    #[display("Failed to convert '{value}' to {target}: {reason}")]
    Malformed {
        /// Raw value.
        #[error(not(source))]
        value: String,

        /// Name of the target type.
        target: String,

        /// Why the value was rejected.
        reason: String,
    },

    /// A converter received input of an unexpected kind.
    #[display("Unexpected input for conversion to {target}")]
    UnexpectedInput {
        /// Name of the target type.
        #[error(not(source))]
        target: String,
    },

    /// Chained converters refer to each other too deeply.
    #[display("Conversion chain to {target} exceeds {depth} converters")]
    ChainTooDeep {
        /// Name of the target type.
        #[error(not(source))]
        target: String,

        /// Maximum depth.
        depth: usize,
    },
}

impl ConversionError {
    /// Creates a new [`ConversionError::NoConverter`].
    #[must_use]
    pub fn no_converter(target: &ParamType) -> Self {
        Self::NoConverter { target: target.name().to_owned() }
    }

    /// Creates a new [`ConversionError::Malformed`].
    #[must_use]
    pub fn malformed(
        value: impl Into<String>,
        target: &ParamType,
        reason: impl ToString,
    ) -> Self {
        Self::Malformed {
            value: value.into(),
            target: target.name().to_owned(),
            reason: reason.to_string(),
        }
    }

    /// Creates a new [`ConversionError::UnexpectedInput`].
    #[must_use]
    pub fn unexpected_input(target: &ParamType) -> Self {
        Self::UnexpectedInput { target: target.name().to_owned() }
    }
}

/// Converter of raw parameter values into typed ones.
pub trait ParameterConverter: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Indicates whether this converter produces the `target` type.
    fn accepts(&self, target: &ParamType) -> bool;

    /// Type this converter consumes, if it consumes the output of another
    /// converter instead of raw text.
    fn source_type(&self) -> Option<ParamType> {
        None
    }

    /// Converts the `input` into a value of the `target` type.
    ///
    /// # Errors
    ///
    /// If the `input` cannot be represented as the `target` type.
    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        conversion: &Conversion<'_>,
    ) -> Result<Value, ConversionError>;
}

/// Requires the `input` to be raw text.
///
/// # Errors
///
/// If the `input` is an already converted value.
pub fn text<'a>(
    input: Input<'a>,
    target: &ParamType,
) -> Result<&'a str, ConversionError> {
    input.left().ok_or_else(|| ConversionError::unexpected_input(target))
}

/// Single conversion running against a snapshot of converters.
#[derive(Clone, Copy)]
pub struct Conversion<'a> {
    converters: &'a [Arc<dyn ParameterConverter>],
    monitor: &'a dyn StepMonitor,
    depth: usize,
}

impl fmt::Debug for Conversion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("converters", &self.converters.len())
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl<'a> Conversion<'a> {
    /// Converts the `raw` value into the `target` type with the first
    /// converter accepting it, resolving chained converters.
    ///
    /// # Errors
    ///
    /// If no converter accepts the `target`, or the accepting converter
    /// rejects the value.
    pub fn convert(
        &self,
        raw: &str,
        target: &ParamType,
    ) -> Result<Value, ConversionError> {
        if self.depth > MAX_CHAIN_DEPTH {
            return Err(ConversionError::ChainTooDeep {
                target: target.name().to_owned(),
                depth: MAX_CHAIN_DEPTH,
            });
        }
        let converter = self
            .converters
            .iter()
            .find(|c| c.accepts(target))
            .ok_or_else(|| ConversionError::no_converter(target))?;

        let input = match converter.source_type() {
            None => Either::Left(raw),
            Some(source) => {
                let nested = Self { depth: self.depth + 1, ..*self };
                Either::Right(nested.convert(raw, &source)?)
            }
        };
        let value = converter.convert(input, target, self)?;
        self.monitor.converted_value_of_type(raw, target, converter.name());
        Ok(value)
    }

    /// Converts the `raw` value into `T`.
    ///
    /// # Errors
    ///
    /// See [`Conversion::convert()`].
    pub fn convert_to<T: Parameter>(
        &self,
        raw: &str,
    ) -> Result<T, ConversionError> {
        let target = T::param_type();
        self.convert(raw, &target)?.downcast::<T>().map(|v| *v).map_err(|_| {
            ConversionError::malformed(raw, &target, "converter produced another type")
        })
    }
}

/// Ordered, copy-on-write registry of [`ParameterConverter`]s.
///
/// The first converter [accepting][0] a target type performs the conversion.
/// Converters added later are tried first.
///
/// [0]: ParameterConverter::accepts
pub struct ParameterConverters {
    /// Current snapshot of converters, swapped as a whole on registration.
    converters: RwLock<Arc<Vec<Arc<dyn ParameterConverter>>>>,

    /// Serializes registrations.
    registration: Mutex<()>,

    /// [`StepMonitor`] notified of every conversion.
    monitor: Arc<dyn StepMonitor>,
}

impl fmt::Debug for ParameterConverters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterConverters")
            .field(
                "converters",
                &self.snapshot().iter().map(|c| c.name().to_owned()).collect_vec(),
            )
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl Default for ParameterConverters {
    fn default() -> Self {
        Self::new(
            Arc::new(SilentStepMonitor),
            NumberFormat::ENGLISH,
            DEFAULT_LIST_SEPARATOR,
        )
    }
}

impl Clone for ParameterConverters {
    fn clone(&self) -> Self {
        Self::from_snapshot(self.snapshot(), Arc::clone(&self.monitor))
    }
}

impl ParameterConverters {
    /// Creates a registry with the built-in converters.
    #[must_use]
    pub fn new(
        monitor: Arc<dyn StepMonitor>,
        number_format: NumberFormat,
        list_separator: &str,
    ) -> Self {
        let defaults: Vec<Arc<dyn ParameterConverter>> = vec![
            Arc::new(BooleanConverter::default()),
            Arc::new(NumberConverter::new(number_format)),
            Arc::new(StringConverter),
            Arc::new(CharConverter),
            Arc::new(DateConverter::default()),
            Arc::new(TemporalConverter),
            Arc::new(DurationConverter),
            Arc::new(FluentEnumConverter),
            Arc::new(CurrencyConverter),
            Arc::new(RegexConverter),
            Arc::new(PathConverter),
            Arc::new(ExamplesTableConverter),
            Arc::new(TableRowsConverter),
            #[cfg(feature = "json")]
            Arc::new(super::builtin::JsonConverter),
            Arc::new(CollectionConverter::new(list_separator)),
        ];
        Self::from_snapshot(Arc::new(defaults), monitor)
    }

    /// Creates a registry without any converters.
    #[must_use]
    pub fn empty(monitor: Arc<dyn StepMonitor>) -> Self {
        Self::from_snapshot(Arc::new(Vec::new()), monitor)
    }

    fn from_snapshot(
        converters: Arc<Vec<Arc<dyn ParameterConverter>>>,
        monitor: Arc<dyn StepMonitor>,
    ) -> Self {
        Self {
            converters: RwLock::new(converters),
            registration: Mutex::new(()),
            monitor,
        }
    }

    fn snapshot(&self) -> Arc<Vec<Arc<dyn ParameterConverter>>> {
        Arc::clone(
            &self.converters.read().unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Returns the [`StepMonitor`] notified of conversions.
    #[must_use]
    pub fn monitor(&self) -> &Arc<dyn StepMonitor> {
        &self.monitor
    }

    /// Returns a copy of this registry notifying the `monitor` instead.
    #[must_use]
    pub fn with_monitor(&self, monitor: Arc<dyn StepMonitor>) -> Self {
        Self::from_snapshot(self.snapshot(), monitor)
    }

    /// Number of registered converters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Indicates whether no converters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Registers the `converters` in front of the existing ones, keeping
    /// their given order.
    ///
    /// Conversions already running keep using the converters they started
    /// with.
    pub fn add_converters<I>(&self, converters: I) -> &Self
    where
        I: IntoIterator<Item = Arc<dyn ParameterConverter>>,
    {
        let _serialized =
            self.registration.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.snapshot();
        let next = converters
            .into_iter()
            .chain(current.iter().cloned())
            .collect::<Vec<_>>();
        *self.converters.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(next);
        self
    }

    /// Registers a single `converter` in front of the existing ones.
    pub fn add_converter(
        &self,
        converter: impl ParameterConverter + 'static,
    ) -> &Self {
        let converter: Arc<dyn ParameterConverter> = Arc::new(converter);
        self.add_converters([converter])
    }

    /// Returns an independent copy of this registry with the `converter`
    /// in front.
    #[must_use]
    pub fn new_instance_adding(
        &self,
        converter: Arc<dyn ParameterConverter>,
    ) -> Self {
        let copy = self.clone();
        _ = copy.add_converters([converter]);
        copy
    }

    /// Runs the `f` with a [`Conversion`] over the current converters.
    pub fn with_conversion<R>(&self, f: impl FnOnce(Conversion<'_>) -> R) -> R {
        let snapshot = self.snapshot();
        f(Conversion {
            converters: &snapshot,
            monitor: self.monitor.as_ref(),
            depth: 0,
        })
    }

    /// Converts the `raw` value into the `target` type.
    ///
    /// # Errors
    ///
    /// If no converter accepts the `target`, or the accepting converter
    /// rejects the value.
    pub fn convert(
        &self,
        raw: &str,
        target: &ParamType,
    ) -> Result<Value, ConversionError> {
        self.with_conversion(|c| c.convert(raw, target))
    }

    /// Converts the `raw` value into `T`.
    ///
    /// # Errors
    ///
    /// See [`ParameterConverters::convert()`].
    pub fn convert_to<T: Parameter>(
        &self,
        raw: &str,
    ) -> Result<T, ConversionError> {
        self.with_conversion(|c| c.convert_to(raw))
    }
}

/// [`ParameterConverter`] from raw text into `T` with a function.
pub struct FunctionalConverter<T, F> {
    convert: F,
    _target: PhantomData<fn() -> T>,
}

impl<T, F> fmt::Debug for FunctionalConverter<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionalConverter")
            .field("target", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T, F, E> FunctionalConverter<T, F>
where
    T: Parameter,
    F: Fn(&str) -> Result<T, E> + Send + Sync,
    E: fmt::Display,
{
    /// Creates a converter applying the function `convert`.
    #[must_use]
    pub const fn new(convert: F) -> Self {
        Self { convert, _target: PhantomData }
    }
}

impl<T, F, E> ParameterConverter for FunctionalConverter<T, F>
where
    T: Parameter,
    F: Fn(&str) -> Result<T, E> + Send + Sync,
    E: fmt::Display,
{
    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<T>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        (self.convert)(raw)
            .map(|v| -> Value { Box::new(v) })
            .map_err(|e| ConversionError::malformed(raw, target, e))
    }
}

/// [`ParameterConverter`] from the output `S` of another converter into `T`.
pub struct ChainedConverter<S, T, F> {
    convert: F,
    _types: PhantomData<fn(S) -> T>,
}

impl<S, T, F> fmt::Debug for ChainedConverter<S, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedConverter")
            .field("source", &std::any::type_name::<S>())
            .field("target", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<S, T, F, E> ChainedConverter<S, T, F>
where
    S: Parameter,
    T: Parameter,
    F: Fn(S) -> Result<T, E> + Send + Sync,
    E: fmt::Display,
{
    /// Creates a converter applying the function `convert` to the value the
    /// converter of `S` produces.
    #[must_use]
    pub const fn new(convert: F) -> Self {
        Self { convert, _types: PhantomData }
    }
}

impl<S, T, F, E> ParameterConverter for ChainedConverter<S, T, F>
where
    S: Parameter,
    T: Parameter,
    F: Fn(S) -> Result<T, E> + Send + Sync,
    E: fmt::Display,
{
    fn name(&self) -> &str {
        std::any::type_name::<T>()
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<T>()
    }

    fn source_type(&self) -> Option<ParamType> {
        Some(S::param_type())
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let source = input
            .right()
            .and_then(|v| v.downcast::<S>().ok())
            .ok_or_else(|| ConversionError::unexpected_input(target))?;
        (self.convert)(*source)
            .map(|v| -> Value { Box::new(v) })
            .map_err(|e| {
                ConversionError::malformed(std::any::type_name::<S>(), target, e)
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        thread,
    };

    use super::*;
    use crate::parameters::{ExamplesTable, Row};

    #[derive(Debug, PartialEq)]
    struct Money(u64);

    impl Parameter for Money {
        fn param_type() -> ParamType {
            ParamType::scalar::<Self>()
        }
    }

    #[test]
    fn first_accepting_converter_wins() {
        let converters = ParameterConverters::default();
        _ = converters.add_converter(FunctionalConverter::new(
            |s: &str| -> Result<i32, String> { Ok(s.len() as i32) },
        ));

        assert_eq!(converters.convert_to::<i32>("abcd").unwrap(), 4);
    }

    #[test]
    fn unknown_type_has_no_converter() {
        let converters = ParameterConverters::default();

        let err = converters.convert_to::<Money>("5").unwrap_err();

        assert!(matches!(err, ConversionError::NoConverter { .. }));
        assert!(err.to_string().starts_with("No parameter converter for"));
    }

    #[test]
    fn chains_converters_by_source_type() {
        let converters = ParameterConverters::default();
        _ = converters.add_converter(ChainedConverter::new(
            |table: ExamplesTable| -> Result<Money, String> {
                let total = table
                    .rows()
                    .iter()
                    .filter_map(|r| r.get("amount"))
                    .map(|a| a.parse::<u64>().map_err(|e| e.to_string()))
                    .sum::<Result<u64, _>>()?;
                Ok(Money(total))
            },
        ));

        let money = converters
            .convert_to::<Money>("|amount|\n|3|\n|4|")
            .unwrap();

        assert_eq!(money, Money(7));
    }

    #[test]
    fn chained_converter_failures_are_malformed() {
        let converters = ParameterConverters::default();
        _ = converters.add_converter(ChainedConverter::new(
            |_: Vec<Row>| -> Result<Money, &'static str> { Err("no money") },
        ));

        let err = converters.convert_to::<Money>("|a|\n|1|").unwrap_err();

        assert!(matches!(err, ConversionError::Malformed { .. }));
    }

    #[test]
    fn new_instance_adding_leaves_original_untouched() {
        let converters = ParameterConverters::default();
        let before = converters.len();

        let copy = converters.new_instance_adding(Arc::new(
            FunctionalConverter::new(|s: &str| s.parse::<u64>().map(Money)),
        ));

        assert_eq!(converters.len(), before);
        assert_eq!(copy.len(), before + 1);
        assert_eq!(copy.convert_to::<Money>("12").unwrap(), Money(12));
    }

    #[test]
    fn converts_while_converters_are_added() {
        let converters = Arc::new(ParameterConverters::default());
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let converters = Arc::clone(&converters);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut added = 0;
                loop {
                    _ = converters.add_converter(FunctionalConverter::new(
                        |s: &str| s.parse::<u64>().map(Money),
                    ));
                    added += 1;
                    if done.load(Ordering::SeqCst) || added >= 2_000 {
                        break added;
                    }
                }
            })
        };

        for _ in 0..1_000 {
            assert_eq!(converters.convert_to::<i64>("42").unwrap(), 42);
        }
        done.store(true, Ordering::SeqCst);
        let added = writer.join().unwrap();

        assert!(added > 0);
        assert_eq!(converters.convert_to::<Money>("7").unwrap(), Money(7));
    }
}
