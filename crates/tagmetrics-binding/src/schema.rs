//! Self-describing metrics schemas.
//!
//! A schema reports its fields to a [`FieldVisitor`], one `(FieldName, Slot)`
//! pair per field, in declaration order. The binder is such a visitor. The
//! [`metric_schema!`](crate::metric_schema) macro writes the boilerplate:
//!
//! ```
//! use std::collections::HashMap;
//! use tagmetrics_binding::{metric_schema, Counter, Timer};
//!
//! metric_schema! {
//!     #[derive(Default)]
//!     pub struct Handler {
//!         pub calls: Counter,
//!     }
//! }
//!
//! metric_schema! {
//!     #[derive(Default)]
//!     pub struct Service {
//!         pub latency: Timer => "latency_ns",
//!         pub handlers: HashMap<String, Box<Handler>>,
//!         pub owner: String,
//!         pub limits: HashMap<String, u32> => skip,
//!     }
//! }
//! ```
//!
//! `=> "name"` overrides the path segment, `=> skip` leaves a field out of the
//! description entirely. Without an override the segment is the lower-cased
//! field name. Field types without a [`MetricField`] impl (integer-keyed maps,
//! `Arc`s, foreign structs) are reported as [`Slot::Ignored`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::time::Duration;

use tagmetrics_core::{Counter, Gauge, Histogram, Meter, Timer};

/// Identifier and optional annotation of one schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldName {
    pub ident: &'static str,
    pub annotation: Option<&'static str>,
}

impl FieldName {
    pub const fn new(ident: &'static str) -> Self {
        Self { ident, annotation: None }
    }

    pub const fn annotated(ident: &'static str, annotation: &'static str) -> Self {
        Self { ident, annotation: Some(annotation) }
    }

    /// Path segment contributed by this field. An empty annotation counts as
    /// no annotation.
    pub fn segment(&self) -> Cow<'static, str> {
        match self.annotation {
            Some(a) if !a.is_empty() => Cow::Borrowed(a),
            _ => Cow::Owned(self.ident.to_lowercase()),
        }
    }
}

/// The binder's view of one field.
pub enum Slot<'a> {
    /// Nested record: contributes a segment, then its own fields.
    Record(&'a mut dyn MetricSchema),
    /// String-keyed records: every key becomes an extra segment.
    Keyed(&'a mut dyn RecordMap),
    Counter(&'a mut Counter),
    Gauge(&'a mut Gauge),
    Meter(&'a mut Meter),
    Histogram(&'a mut Histogram),
    Timer(&'a mut Timer),
    /// Plain data unrelated to metrics.
    Ignored,
}

impl Slot<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            Slot::Record(_) => "record",
            Slot::Keyed(_) => "keyed",
            Slot::Counter(_) => "counter",
            Slot::Gauge(_) => "gauge",
            Slot::Meter(_) => "meter",
            Slot::Histogram(_) => "histogram",
            Slot::Timer(_) => "timer",
            Slot::Ignored => "ignored",
        }
    }
}

/// A struct that can enumerate its metric-bearing fields.
pub trait MetricSchema {
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor);
}

pub trait FieldVisitor {
    fn visit(&mut self, name: FieldName, slot: Slot<'_>);
}

/// Conversion of a field into its [`Slot`].
pub trait MetricField {
    fn slot(&mut self) -> Slot<'_>;
}

/// A string-keyed collection of boxed records.
pub trait RecordMap {
    /// Visit every entry currently present, in key order.
    fn for_each_record(&mut self, f: &mut dyn FnMut(&str, &mut dyn MetricSchema));
}

impl<T: MetricSchema, S: BuildHasher> RecordMap for HashMap<String, Box<T>, S> {
    fn for_each_record(&mut self, f: &mut dyn FnMut(&str, &mut dyn MetricSchema)) {
        let mut entries: Vec<(&String, &mut Box<T>)> = self.iter_mut().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (key, record) in entries {
            f(key.as_str(), &mut **record);
        }
    }
}

impl<T: MetricSchema> RecordMap for BTreeMap<String, Box<T>> {
    fn for_each_record(&mut self, f: &mut dyn FnMut(&str, &mut dyn MetricSchema)) {
        for (key, record) in self.iter_mut() {
            f(key.as_str(), &mut **record);
        }
    }
}

impl<T: MetricSchema, S: BuildHasher> MetricField for HashMap<String, Box<T>, S> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Keyed(self)
    }
}

impl<T: MetricSchema> MetricField for BTreeMap<String, Box<T>> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Keyed(self)
    }
}

macro_rules! instrument_field {
    ($($ty:ident),*) => {
        $(
            impl MetricField for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::$ty(self)
                }
            }
        )*
    };
}

instrument_field!(Counter, Gauge, Meter, Histogram, Timer);

macro_rules! ignored_field {
    ($($ty:ty),*) => {
        $(
            impl MetricField for $ty {
                fn slot(&mut self) -> Slot<'_> {
                    Slot::Ignored
                }
            }
        )*
    };
}

ignored_field!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str, Duration
);

impl<T> MetricField for Option<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Ignored
    }
}

impl<T> MetricField for Vec<T> {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Ignored
    }
}

/// Field handle used by [`metric_schema!`](crate::metric_schema) to pick a
/// [`Slot`] by method resolution: [`KnownField`] applies when the field type
/// implements [`MetricField`], [`UnknownField`] (one autoref away) otherwise.
#[doc(hidden)]
pub struct FieldRef<'a, T>(pub &'a mut T);

#[doc(hidden)]
pub trait KnownField<'a> {
    fn into_slot(self) -> Slot<'a>;
}

impl<'a, T: MetricField> KnownField<'a> for FieldRef<'a, T> {
    fn into_slot(self) -> Slot<'a> {
        MetricField::slot(self.0)
    }
}

#[doc(hidden)]
pub trait UnknownField<'a> {
    fn into_slot(self) -> Slot<'a>;
}

impl<'a, T> UnknownField<'a> for &FieldRef<'a, T> {
    fn into_slot(self) -> Slot<'a> {
        Slot::Ignored
    }
}

/// Declare a metrics schema struct together with its [`MetricSchema`] and
/// [`MetricField`] impls. See the [module docs](crate::schema).
#[macro_export]
macro_rules! metric_schema {
    (@field $visitor:ident, $place:expr, $field:ident) => {
        $visitor.visit(
            $crate::schema::FieldName::new(stringify!($field)),
            $crate::schema::FieldRef(&mut $place).into_slot(),
        )
    };
    (@field $visitor:ident, $place:expr, $field:ident, skip) => {};
    (@field $visitor:ident, $place:expr, $field:ident, $tag:literal) => {
        $visitor.visit(
            $crate::schema::FieldName::annotated(stringify!($field), $tag),
            $crate::schema::FieldRef(&mut $place).into_slot(),
        )
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $tag:tt)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::schema::MetricSchema for $name {
            #[allow(unused_variables)]
            fn visit_fields(&mut self, visitor: &mut dyn $crate::schema::FieldVisitor) {
                #[allow(unused_imports)]
                use $crate::schema::{KnownField as _, UnknownField as _};
                $(
                    $crate::metric_schema!(@field visitor, self.$field, $field $(, $tag)?);
                )*
            }
        }

        impl $crate::schema::MetricField for $name {
            fn slot(&mut self) -> $crate::schema::Slot<'_> {
                $crate::schema::Slot::Record(self)
            }
        }
    };
}
