// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Built-in [`ParameterConverter`]s.

use std::{
    any::Any,
    marker::PhantomData,
    path::PathBuf,
    str::FromStr,
    sync::atomic::{
        AtomicBool, AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize,
        AtomicU16, AtomicU32, AtomicU64, AtomicU8, AtomicUsize,
    },
    time::Duration,
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use derive_more::with_trait::{Display, Error};
use inflector::Inflector as _;
use regex::Regex;

use super::{
    converters::{text, Conversion, ConversionError, Input, ParameterConverter},
    table::{ExamplesTable, FromRow, TypedRow},
    types::{ParamType, Parameter, Value},
    Row,
};

fn boxed<T: Any + Send>(value: T) -> Value {
    Box::new(value)
}

/// Grouping and decimal separators of formatted numbers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NumberFormat {
    /// Separator of digit groups, stripped before parsing.
    pub grouping: Option<char>,

    /// Separator of the fractional part.
    pub decimal: char,
}

impl NumberFormat {
    /// `1,234.5`
    pub const ENGLISH: Self = Self { grouping: Some(','), decimal: '.' };

    /// `1.234,5`
    pub const GERMAN: Self = Self { grouping: Some('.'), decimal: ',' };

    /// `1 234,5`
    pub const FRENCH: Self = Self { grouping: Some('\u{202F}'), decimal: ',' };

    /// Rewrites a localized number into the form [`FromStr`] of Rust numbers
    /// expects. `NaN` and `Infinity` tokens (including `∞`) are normalized.
    #[must_use]
    pub fn canonicalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        match trimmed {
            "NaN" | "nan" => return "NaN".into(),
            "Infinity" | "+Infinity" | "∞" | "+∞" => return "inf".into(),
            "-Infinity" | "-∞" => return "-inf".into(),
            _ => {}
        }
        trimmed
            .chars()
            .filter(|c| {
                Some(*c) != self.grouping
                    && !(c.is_whitespace() && self.grouping.is_some_and(char::is_whitespace))
            })
            .map(|c| if c == self.decimal { '.' } else { c })
            .collect()
    }
}

/// Converter of numbers, including atomics, honouring a [`NumberFormat`].
#[derive(Clone, Copy, Debug)]
pub struct NumberConverter {
    format: NumberFormat,
}

impl Default for NumberConverter {
    fn default() -> Self {
        Self::new(NumberFormat::ENGLISH)
    }
}

impl NumberConverter {
    /// Creates a converter of numbers formatted with the `format`.
    #[must_use]
    pub const fn new(format: NumberFormat) -> Self {
        Self { format }
    }
}

macro_rules! number_targets {
    (
        plain: [$($plain:ty),*],
        atomic: [$($atomic:ty => $inner:ty),*] $(,)?
    ) => {
        fn is_number(target: &ParamType) -> bool {
            $(target.is::<$plain>())||* || $(target.is::<$atomic>())||*
        }

        fn parse_number(
            canonical: &str,
            target: &ParamType,
        ) -> Option<Result<Value, String>> {
            $(
                if target.is::<$plain>() {
                    return Some(
                        canonical
                            .parse::<$plain>()
                            .map(boxed)
                            .map_err(|e| e.to_string()),
                    );
                }
            )*
            $(
                if target.is::<$atomic>() {
                    return Some(
                        canonical
                            .parse::<$inner>()
                            .map(|v| boxed(<$atomic>::new(v)))
                            .map_err(|e| e.to_string()),
                    );
                }
            )*
            None
        }
    };
}

number_targets!(
    plain: [
        i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
        f64
    ],
    atomic: [
        AtomicI8 => i8, AtomicI16 => i16, AtomicI32 => i32, AtomicI64 => i64,
        AtomicIsize => isize, AtomicU8 => u8, AtomicU16 => u16,
        AtomicU32 => u32, AtomicU64 => u64, AtomicUsize => usize
    ],
);

impl ParameterConverter for NumberConverter {
    fn name(&self) -> &str {
        "NumberConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        is_number(target)
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        let canonical = self.format.canonicalize(raw);
        match parse_number(&canonical, target) {
            Some(Ok(v)) => Ok(v),
            Some(Err(reason)) => {
                Err(ConversionError::malformed(raw, target, reason))
            }
            None => Err(ConversionError::no_converter(target)),
        }
    }
}

/// Converter of booleans with configurable literal tokens.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BooleanConverter {
    true_token: String,
    false_token: String,
}

impl Default for BooleanConverter {
    fn default() -> Self {
        Self::with_tokens("true", "false")
    }
}

impl BooleanConverter {
    /// Creates a converter recognising the given tokens, case-insensitively.
    #[must_use]
    pub fn with_tokens(
        true_token: impl Into<String>,
        false_token: impl Into<String>,
    ) -> Self {
        Self { true_token: true_token.into(), false_token: false_token.into() }
    }

    fn parse(&self, raw: &str) -> Option<bool> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(&self.true_token) {
            Some(true)
        } else if raw.eq_ignore_ascii_case(&self.false_token) {
            Some(false)
        } else {
            None
        }
    }
}

impl ParameterConverter for BooleanConverter {
    fn name(&self) -> &str {
        "BooleanConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<bool>() || target.is::<AtomicBool>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        let value = self.parse(raw).ok_or_else(|| {
            ConversionError::malformed(
                raw,
                target,
                format!(
                    "expected '{}' or '{}'",
                    self.true_token, self.false_token,
                ),
            )
        })?;
        Ok(if target.is::<AtomicBool>() {
            boxed(AtomicBool::new(value))
        } else {
            boxed(value)
        })
    }
}

/// Converter of [`String`]s, normalizing line endings to `\n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringConverter;

impl ParameterConverter for StringConverter {
    fn name(&self) -> &str {
        "StringConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<String>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        Ok(boxed(text(input, target)?.replace("\r\n", "\n")))
    }
}

/// Converter of single [`char`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct CharConverter;

impl ParameterConverter for CharConverter {
    fn name(&self) -> &str {
        "CharConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<char>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(boxed(c)),
            _ => Err(ConversionError::malformed(
                raw,
                target,
                "expected exactly one character",
            )),
        }
    }
}

/// Converter of [`NaiveDate`]s with a [`chrono` format][0].
///
/// [0]: chrono::format::strftime
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateConverter {
    format: String,
}

impl Default for DateConverter {
    fn default() -> Self {
        Self::with_format("%Y-%m-%d")
    }
}

impl DateConverter {
    /// Creates a converter parsing dates with the `format`.
    #[must_use]
    pub fn with_format(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }
}

impl ParameterConverter for DateConverter {
    fn name(&self) -> &str {
        "DateConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<NaiveDate>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        NaiveDate::parse_from_str(raw.trim(), &self.format)
            .map(boxed)
            .map_err(|e| ConversionError::malformed(raw, target, e))
    }
}

/// Converter of ISO-8601 times, date-times and RFC 3339 timestamps.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemporalConverter;

impl TemporalConverter {
    fn parse<T>(raw: &str, target: &ParamType) -> Result<Value, ConversionError>
    where
        T: FromStr + Any + Send,
        T::Err: ToString,
    {
        raw.trim()
            .parse::<T>()
            .map(boxed)
            .map_err(|e| ConversionError::malformed(raw, target, e.to_string()))
    }
}

impl ParameterConverter for TemporalConverter {
    fn name(&self) -> &str {
        "TemporalConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<NaiveDateTime>()
            || target.is::<NaiveTime>()
            || target.is::<DateTime<FixedOffset>>()
            || target.is::<DateTime<Utc>>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        if target.is::<NaiveDateTime>() {
            Self::parse::<NaiveDateTime>(raw, target)
        } else if target.is::<NaiveTime>() {
            Self::parse::<NaiveTime>(raw, target)
        } else if target.is::<DateTime<FixedOffset>>() {
            Self::parse::<DateTime<FixedOffset>>(raw, target)
        } else {
            Self::parse::<DateTime<Utc>>(raw, target)
        }
    }
}

/// Converter of [`Duration`]s written like `1h 15m` or `250ms`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DurationConverter;

impl ParameterConverter for DurationConverter {
    fn name(&self) -> &str {
        "DurationConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<Duration>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        humantime::parse_duration(raw.trim())
            .map(boxed)
            .map_err(|e| ConversionError::malformed(raw, target, e))
    }
}

/// Converter of enumerations by the exact variant name.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumConverter;

impl ParameterConverter for EnumConverter {
    fn name(&self) -> &str {
        "EnumConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.as_enum().is_some()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        let e = target.as_enum().ok_or_else(|| ConversionError::no_converter(target))?;
        (e.value_of)(raw.trim()).ok_or_else(|| {
            ConversionError::malformed(
                raw,
                target,
                format!("expected one of {:?}", (e.names)()),
            )
        })
    }
}

/// Converter of enumerations tolerant to case and word separators:
/// `first floor`, `first-floor` and `FIRST_FLOOR` all resolve to a
/// `FirstFloor` variant.
#[derive(Clone, Copy, Debug, Default)]
pub struct FluentEnumConverter;

impl ParameterConverter for FluentEnumConverter {
    fn name(&self) -> &str {
        "FluentEnumConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.as_enum().is_some()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        let e = target.as_enum().ok_or_else(|| ConversionError::no_converter(target))?;
        let trimmed = raw.trim();
        if let Some(v) = (e.value_of)(trimmed) {
            return Ok(v);
        }
        let wanted = trimmed.to_screaming_snake_case();
        (e.names)()
            .into_iter()
            .find(|n| n.to_screaming_snake_case() == wanted)
            .and_then(e.value_of)
            .ok_or_else(|| {
                ConversionError::malformed(
                    raw,
                    target,
                    format!("expected one of {:?}", (e.names)()),
                )
            })
    }
}

/// Currency identified by its ISO-4217 style three letter code.
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Currency(String);

/// Malformed currency code.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
#[display("'{code}' is not a three letter currency code")]
pub struct InvalidCurrencyCode {
    #[error(not(source))]
    code: String,
}

impl Currency {
    /// Code of this currency.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl FromStr for Currency {
    type Err = InvalidCurrencyCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Self(code))
        } else {
            Err(InvalidCurrencyCode { code: s.to_owned() })
        }
    }
}

/// Converter of [`Currency`] codes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrencyConverter;

impl ParameterConverter for CurrencyConverter {
    fn name(&self) -> &str {
        "CurrencyConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<Currency>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        raw.parse::<Currency>()
            .map(boxed)
            .map_err(|e| ConversionError::malformed(raw, target, e))
    }
}

/// Converter of [`Regex`]es.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegexConverter;

impl ParameterConverter for RegexConverter {
    fn name(&self) -> &str {
        "RegexConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<Regex>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        Regex::new(raw)
            .map(boxed)
            .map_err(|e| ConversionError::malformed(raw, target, e))
    }
}

/// Converter of file system [`PathBuf`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct PathConverter;

impl ParameterConverter for PathConverter {
    fn name(&self) -> &str {
        "PathConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<PathBuf>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        Ok(boxed(PathBuf::from(text(input, target)?.trim())))
    }
}

/// Converter of multi-line text into an [`ExamplesTable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ExamplesTableConverter;

impl ParameterConverter for ExamplesTableConverter {
    fn name(&self) -> &str {
        "ExamplesTableConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<ExamplesTable>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        Ok(boxed(ExamplesTable::parse(text(input, target)?)))
    }
}

/// Converter of an [`ExamplesTable`] into its [`Row`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct TableRowsConverter;

impl ParameterConverter for TableRowsConverter {
    fn name(&self) -> &str {
        "TableRowsConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<Vec<Row>>()
    }

    fn source_type(&self) -> Option<ParamType> {
        Some(ExamplesTable::param_type())
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let table = input
            .right()
            .and_then(|v| v.downcast::<ExamplesTable>().ok())
            .ok_or_else(|| ConversionError::unexpected_input(target))?;
        Ok(boxed(table.into_rows()))
    }
}

/// Converter of an [`ExamplesTable`] into typed rows implementing
/// [`FromRow`].
pub struct RowsConverter<T>(PhantomData<fn() -> T>);

impl<T> std::fmt::Debug for RowsConverter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RowsConverter")
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Default for RowsConverter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: FromRow> RowsConverter<T> {
    /// Creates a converter of tables into `Vec<T>`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: FromRow> ParameterConverter for RowsConverter<T> {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<Vec<T>>()
    }

    fn source_type(&self) -> Option<ParamType> {
        Some(ExamplesTable::param_type())
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        conversion: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let table = input
            .right()
            .and_then(|v| v.downcast::<ExamplesTable>().ok())
            .ok_or_else(|| ConversionError::unexpected_input(target))?;
        table
            .rows()
            .iter()
            .map(|row| T::from_row(&TypedRow::new(row, *conversion)))
            .collect::<Result<Vec<T>, _>>()
            .map(boxed)
    }
}

/// Converter of separated values into any collection of convertible
/// elements. Blank input yields an empty collection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CollectionConverter {
    separator: String,
}

impl Default for CollectionConverter {
    fn default() -> Self {
        Self::new(super::converters::DEFAULT_LIST_SEPARATOR)
    }
}

impl CollectionConverter {
    /// Creates a converter splitting values by the `separator`.
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self { separator: separator.into() }
    }
}

impl ParameterConverter for CollectionConverter {
    fn name(&self) -> &str {
        "CollectionConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.as_collection().is_some()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        conversion: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        let collection = target
            .as_collection()
            .ok_or_else(|| ConversionError::no_converter(target))?;

        let elements = if raw.trim().is_empty() {
            Vec::new()
        } else {
            raw.split(self.separator.as_str())
                .map(|item| conversion.convert(item.trim(), &collection.element))
                .collect::<Result<Vec<_>, _>>()?
        };
        (collection.assemble)(elements).ok_or_else(|| {
            ConversionError::malformed(
                raw,
                target,
                format!("elements are not of type {}", collection.element),
            )
        })
    }
}

/// Converter of JSON documents into [`serde_json::Value`]s.
#[cfg(feature = "json")]
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonConverter;

#[cfg(feature = "json")]
impl ParameterConverter for JsonConverter {
    fn name(&self) -> &str {
        "JsonConverter"
    }

    fn accepts(&self, target: &ParamType) -> bool {
        target.is::<serde_json::Value>()
    }

    fn convert(
        &self,
        input: Input<'_>,
        target: &ParamType,
        _: &Conversion<'_>,
    ) -> Result<Value, ConversionError> {
        let raw = text(input, target)?;
        serde_json::from_str::<serde_json::Value>(raw)
            .map(boxed)
            .map_err(|e| ConversionError::malformed(raw, target, e))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashSet, VecDeque},
        sync::atomic::Ordering,
    };

    use super::*;
    use crate::{parameter_enum, parameters::ParameterConverters};

    #[derive(Debug, PartialEq)]
    enum Floor {
        Ground,
        FirstFloor,
    }

    parameter_enum!(Floor { Ground, FirstFloor });

    fn converters() -> ParameterConverters {
        ParameterConverters::default()
    }

    #[test]
    fn numbers() {
        let c = converters();

        assert_eq!(c.convert_to::<i32>("1,024").unwrap(), 1024);
        assert_eq!(c.convert_to::<u8>(" 7 ").unwrap(), 7);
        assert_eq!(c.convert_to::<f64>("2.5").unwrap(), 2.5);
        assert!(c.convert_to::<f64>("NaN").unwrap().is_nan());
        assert_eq!(c.convert_to::<f32>("-Infinity").unwrap(), f32::NEG_INFINITY);
        assert_eq!(
            c.convert_to::<AtomicI64>("-3").unwrap().load(Ordering::SeqCst),
            -3,
        );
        assert!(matches!(
            c.convert_to::<i32>("one").unwrap_err(),
            ConversionError::Malformed { .. },
        ));
    }

    #[test]
    fn localized_numbers() {
        let c = ParameterConverters::empty(std::sync::Arc::new(
            crate::monitor::SilentStepMonitor,
        ));
        _ = c.add_converter(NumberConverter::new(NumberFormat::GERMAN));

        assert_eq!(c.convert_to::<f64>("1.234,5").unwrap(), 1234.5);
    }

    #[test]
    fn booleans_with_custom_tokens() {
        let c = converters();
        _ = c.add_converter(BooleanConverter::with_tokens("yes", "no"));

        assert!(c.convert_to::<bool>("YES").unwrap());
        assert!(!c.convert_to::<bool>("no").unwrap());
        assert!(c.convert_to::<bool>("true").is_err());
    }

    #[test]
    fn strings_and_chars() {
        let c = converters();

        assert_eq!(c.convert_to::<String>("a\r\nb").unwrap(), "a\nb");
        assert_eq!(c.convert_to::<char>("x").unwrap(), 'x');
        assert!(c.convert_to::<char>("xy").is_err());
    }

    #[test]
    fn dates_and_durations() {
        let c = converters();

        assert_eq!(
            c.convert_to::<NaiveDate>("2011-10-28").unwrap(),
            NaiveDate::from_ymd_opt(2011, 10, 28).unwrap(),
        );
        assert_eq!(
            c.convert_to::<NaiveTime>("10:30:00").unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        );
        assert!(c.convert_to::<DateTime<FixedOffset>>("2011-10-28T10:30:00+02:00").is_ok());
        assert_eq!(
            c.convert_to::<Duration>("1m 30s").unwrap(),
            Duration::from_secs(90),
        );
        assert!(c.convert_to::<NaiveDate>("28/10/2011").is_err());
    }

    #[test]
    fn custom_date_format() {
        let c = converters();
        _ = c.add_converter(DateConverter::with_format("%d/%m/%Y"));

        assert_eq!(
            c.convert_to::<NaiveDate>("28/10/2011").unwrap(),
            NaiveDate::from_ymd_opt(2011, 10, 28).unwrap(),
        );
    }

    #[test]
    fn enums_exact_and_fluent() {
        let c = converters();

        assert_eq!(c.convert_to::<Floor>("Ground").unwrap(), Floor::Ground);
        assert_eq!(c.convert_to::<Floor>("first floor").unwrap(), Floor::FirstFloor);
        assert_eq!(c.convert_to::<Floor>("FIRST_FLOOR").unwrap(), Floor::FirstFloor);
        assert!(c.convert_to::<Floor>("roof").is_err());

        _ = c.add_converter(EnumConverter);
        assert!(c.convert_to::<Floor>("first floor").is_err());
    }

    #[test]
    fn currencies_regexes_and_paths() {
        let c = converters();

        assert_eq!(c.convert_to::<Currency>("eur").unwrap().code(), "EUR");
        assert!(c.convert_to::<Currency>("euro").is_err());
        assert!(c.convert_to::<Regex>("^a+$").unwrap().is_match("aaa"));
        assert!(c.convert_to::<Regex>("(").is_err());
        assert_eq!(
            c.convert_to::<PathBuf>("stories/a.story").unwrap(),
            PathBuf::from("stories/a.story"),
        );
    }

    #[test]
    fn collections() {
        let c = converters();

        assert_eq!(c.convert_to::<Vec<i32>>("1,2,3").unwrap(), [1, 2, 3]);
        assert_eq!(
            c.convert_to::<VecDeque<String>>("a, b").unwrap(),
            ["a", "b"],
        );
        assert_eq!(c.convert_to::<HashSet<u8>>("1,1,2").unwrap().len(), 2);
        assert_eq!(&*c.convert_to::<Box<[f64]>>("0.5").unwrap(), [0.5]);
        assert!(c.convert_to::<Vec<i32>>("1,x").is_err());
    }

    #[test]
    fn blank_collections_are_empty() {
        let c = converters();

        assert!(c.convert_to::<Vec<i32>>("").unwrap().is_empty());
        assert!(c.convert_to::<HashSet<String>>("  ").unwrap().is_empty());
        assert!(c.convert_to::<Box<[u8]>>("").unwrap().is_empty());
    }

    #[test]
    fn custom_separator() {
        let c = converters();
        _ = c.add_converter(CollectionConverter::new("|"));

        assert_eq!(c.convert_to::<Vec<u8>>("1|2").unwrap(), [1, 2]);
    }

    #[test]
    fn tables_and_rows() {
        let c = converters();

        let table = c.convert_to::<ExamplesTable>("|a|b|\n|1|2|").unwrap();
        assert_eq!(table.headers(), ["a", "b"]);

        let rows = c.convert_to::<Vec<Row>>("|a|b|\n|1|2|\n|3|4|").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("b").map(String::as_str), Some("4"));
    }
}
