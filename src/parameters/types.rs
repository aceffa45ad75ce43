// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Runtime descriptors of parameter types.
//!
//! Step handlers are typed closures, so every argument type is known when the
//! step is registered. [`Parameter::param_type()`] captures what converters
//! need to know about such a type: its identity, whether it is a collection
//! (and of what) or an enumeration (and of which variants).

use std::{
    any::{self, Any, TypeId},
    collections::{BTreeSet, HashSet, VecDeque},
    fmt,
    hash::Hash,
    path::PathBuf,
    sync::atomic::{
        AtomicBool, AtomicI16, AtomicI32, AtomicI64, AtomicI8, AtomicIsize,
        AtomicU16, AtomicU32, AtomicU64, AtomicU8, AtomicUsize,
    },
    time::Duration,
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use derive_more::with_trait::Display;
use regex::Regex;

use super::{builtin::Currency, table::ExamplesTable, Row};

/// Type-erased converted value.
pub type Value = Box<dyn Any + Send>;

/// Kind of a collection [`ParamType`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum CollectionKind {
    /// [`Vec`].
    #[display("list")]
    List,

    /// [`VecDeque`].
    #[display("deque")]
    Deque,

    /// [`HashSet`].
    #[display("set")]
    Set,

    /// [`BTreeSet`].
    #[display("sorted set")]
    SortedSet,

    /// Boxed slice.
    #[display("array")]
    Array,
}

/// Shape of a [`ParamType`].
#[derive(Clone, Debug)]
pub enum Shape {
    /// Single value.
    Scalar,

    /// Collection of elements of another [`ParamType`].
    Collection(Box<CollectionType>),

    /// Enumeration with named variants.
    Enumeration(EnumType),
}

/// Description of a collection type.
#[derive(Clone, Debug)]
pub struct CollectionType {
    /// Kind of the collection.
    pub kind: CollectionKind,

    /// Type of the elements.
    pub element: ParamType,

    /// Builds the collection out of converted elements, or returns [`None`]
    /// if an element is not of the expected type.
    pub assemble: fn(Vec<Value>) -> Option<Value>,
}

/// Description of an enumeration type.
#[derive(Clone, Copy, Debug)]
pub struct EnumType {
    /// Names of all the variants.
    pub names: fn() -> Vec<&'static str>,

    /// Variant of the given exact name.
    pub value_of: fn(&str) -> Option<Value>,
}

/// Descriptor of a parameter type.
#[derive(Clone, Debug)]
pub struct ParamType {
    id: TypeId,
    name: &'static str,
    shape: Shape,
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParamType {}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl ParamType {
    /// Descriptor of a single-valued type.
    #[must_use]
    pub fn scalar<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            shape: Shape::Scalar,
        }
    }

    /// Descriptor of a collection `C` of `T` elements.
    #[must_use]
    pub fn collection<C: Any, T: Parameter>(
        kind: CollectionKind,
        assemble: fn(Vec<Value>) -> Option<Value>,
    ) -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: any::type_name::<C>(),
            shape: Shape::Collection(Box::new(CollectionType {
                kind,
                element: T::param_type(),
                assemble,
            })),
        }
    }

    /// Descriptor of an enumeration.
    #[must_use]
    pub fn enumeration<T: ParameterEnum>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
            shape: Shape::Enumeration(EnumType {
                names: enum_names::<T>,
                value_of: enum_value::<T>,
            }),
        }
    }

    /// [`TypeId`] of the described type.
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Name of the described type.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// [`Shape`] of the described type.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Indicates whether this describes `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// [`CollectionType`] if this describes a collection.
    #[must_use]
    pub fn as_collection(&self) -> Option<&CollectionType> {
        match &self.shape {
            Shape::Collection(c) => Some(c.as_ref()),
            Shape::Scalar | Shape::Enumeration(_) => None,
        }
    }

    /// [`EnumType`] if this describes an enumeration.
    #[must_use]
    pub const fn as_enum(&self) -> Option<&EnumType> {
        match &self.shape {
            Shape::Enumeration(e) => Some(e),
            Shape::Scalar | Shape::Collection(_) => None,
        }
    }
}

/// Type that step parameters can be converted into.
pub trait Parameter: Any + Send + Sized {
    /// Descriptor of this type.
    fn param_type() -> ParamType;
}

/// Enumeration usable as a step parameter.
///
/// Implement [`Parameter`] for it with [`ParamType::enumeration()`], or use
/// the [`parameter_enum!`] macro doing both.
///
/// [`parameter_enum!`]: crate::parameter_enum
pub trait ParameterEnum: Send + Sized + 'static {
    /// Every variant with its textual name.
    fn variants() -> Vec<(&'static str, Self)>;
}

fn enum_names<T: ParameterEnum>() -> Vec<&'static str> {
    T::variants().into_iter().map(|(n, _)| n).collect()
}

fn enum_value<T: ParameterEnum>(name: &str) -> Option<Value> {
    T::variants()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| -> Value { Box::new(v) })
}

/// Implements [`ParameterEnum`] and [`Parameter`] for a fieldless enum.
///
/// ```rust
/// # use stepwise::parameter_enum;
/// #[derive(Debug, PartialEq)]
/// enum Floor {
///     Ground,
///     First,
/// }
///
/// parameter_enum!(Floor { Ground, First });
/// ```
#[macro_export]
macro_rules! parameter_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::parameters::ParameterEnum for $ty {
            fn variants() -> ::std::vec::Vec<(&'static str, Self)> {
                ::std::vec![$((::std::stringify!($variant), $ty::$variant)),+]
            }
        }

        impl $crate::parameters::Parameter for $ty {
            fn param_type() -> $crate::parameters::ParamType {
                $crate::parameters::ParamType::enumeration::<Self>()
            }
        }
    };
}

macro_rules! scalar_parameter {
    ($($ty:ty),* $(,)?) => {$(
        impl Parameter for $ty {
            fn param_type() -> ParamType {
                ParamType::scalar::<Self>()
            }
        }
    )*};
}

scalar_parameter!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    AtomicI8, AtomicI16, AtomicI32, AtomicI64, AtomicIsize,
    AtomicU8, AtomicU16, AtomicU32, AtomicU64, AtomicUsize, AtomicBool,
    bool, char, String, PathBuf, Regex, Duration,
    NaiveDate, NaiveDateTime, NaiveTime, DateTime<FixedOffset>, DateTime<Utc>,
    Currency, Row, ExamplesTable,
);

#[cfg(feature = "json")]
scalar_parameter!(serde_json::Value);

fn downcast_all<T: Any>(values: Vec<Value>) -> Option<Vec<T>> {
    values.into_iter().map(|v| v.downcast::<T>().ok().map(|b| *b)).collect()
}

fn assemble_vec<T: Parameter>(values: Vec<Value>) -> Option<Value> {
    downcast_all::<T>(values).map(|v| -> Value { Box::new(v) })
}

fn assemble_deque<T: Parameter>(values: Vec<Value>) -> Option<Value> {
    downcast_all::<T>(values).map(|v| -> Value { Box::new(VecDeque::from(v)) })
}

fn assemble_set<T: Parameter + Eq + Hash>(values: Vec<Value>) -> Option<Value> {
    downcast_all::<T>(values)
        .map(|v| -> Value { Box::new(v.into_iter().collect::<HashSet<_>>()) })
}

fn assemble_sorted_set<T: Parameter + Ord>(values: Vec<Value>) -> Option<Value> {
    downcast_all::<T>(values)
        .map(|v| -> Value { Box::new(v.into_iter().collect::<BTreeSet<_>>()) })
}

fn assemble_array<T: Parameter>(values: Vec<Value>) -> Option<Value> {
    downcast_all::<T>(values).map(|v| -> Value { Box::new(v.into_boxed_slice()) })
}

impl<T: Parameter> Parameter for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::collection::<Self, T>(CollectionKind::List, assemble_vec::<T>)
    }
}

impl<T: Parameter> Parameter for VecDeque<T> {
    fn param_type() -> ParamType {
        ParamType::collection::<Self, T>(
            CollectionKind::Deque,
            assemble_deque::<T>,
        )
    }
}

impl<T: Parameter + Eq + Hash> Parameter for HashSet<T> {
    fn param_type() -> ParamType {
        ParamType::collection::<Self, T>(CollectionKind::Set, assemble_set::<T>)
    }
}

impl<T: Parameter + Ord> Parameter for BTreeSet<T> {
    fn param_type() -> ParamType {
        ParamType::collection::<Self, T>(
            CollectionKind::SortedSet,
            assemble_sorted_set::<T>,
        )
    }
}

impl<T: Parameter> Parameter for Box<[T]> {
    fn param_type() -> ParamType {
        ParamType::collection::<Self, T>(
            CollectionKind::Array,
            assemble_array::<T>,
        )
    }
}
