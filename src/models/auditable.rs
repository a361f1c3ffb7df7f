//! Conversion of domain types into the value model
//!
//! Implementations are provided for the standard scalar, collection and time
//! types. Structs implement `Auditable` by building a [`Record`]:
//!
//! ```rust
//! use audit_trail::models::{Auditable, Record, Value};
//!
//! struct Address {
//!     street: String,
//!     city: String,
//! }
//!
//! impl Auditable for Address {
//!     fn to_value(&self) -> Value {
//!         Record::new("Address")
//!             .with("street", &self.street)
//!             .with("city", &self.city)
//!             .into()
//!     }
//! }
//! ```
//!
//! Enums should return [`Value::enum_name`] so diffs name the variant.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Display;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use super::value::{Record, Value};

/// A type that can describe itself as a `Value` tree
pub trait Auditable {
    fn to_value(&self) -> Value;
}

impl Auditable for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl Auditable for Record {
    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }
}

impl Auditable for str {
    fn to_value(&self) -> Value {
        Value::string(self)
    }
}

impl Auditable for String {
    fn to_value(&self) -> Value {
        Value::string(self.as_str())
    }
}

impl Auditable for bool {
    fn to_value(&self) -> Value {
        Value::bool(*self)
    }
}

macro_rules! auditable_int {
    ($($t:ty),*) => {
        $(
            impl Auditable for $t {
                fn to_value(&self) -> Value {
                    Value::int(i64::from(*self))
                }
            }
        )*
    };
}

auditable_int!(i8, i16, i32, i64, u8, u16, u32);

impl Auditable for u64 {
    fn to_value(&self) -> Value {
        i64::try_from(*self)
            .map(Value::int)
            .unwrap_or_else(|_| Value::string(self.to_string()))
    }
}

impl Auditable for usize {
    fn to_value(&self) -> Value {
        i64::try_from(*self)
            .map(Value::int)
            .unwrap_or_else(|_| Value::string(self.to_string()))
    }
}

impl Auditable for f32 {
    fn to_value(&self) -> Value {
        Value::float(f64::from(*self))
    }
}

impl Auditable for f64 {
    fn to_value(&self) -> Value {
        Value::float(*self)
    }
}

impl Auditable for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::timestamp(*self)
    }
}

/// Naive timestamps are taken to be UTC
impl Auditable for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::timestamp(self.and_utc())
    }
}

impl Auditable for Uuid {
    fn to_value(&self) -> Value {
        Value::string(self.to_string())
    }
}

impl<T: Auditable + ?Sized> Auditable for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Auditable + ?Sized> Auditable for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: Auditable> Auditable for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: Auditable> Auditable for Vec<T> {
    fn to_value(&self) -> Value {
        Value::list(self.iter().map(Auditable::to_value))
    }
}

impl<T: Auditable> Auditable for [T] {
    fn to_value(&self) -> Value {
        Value::list(self.iter().map(Auditable::to_value))
    }
}

impl<T: Auditable> Auditable for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::set(self.iter().map(Auditable::to_value))
    }
}

impl<T: Auditable, S> Auditable for HashSet<T, S> {
    fn to_value(&self) -> Value {
        Value::set(self.iter().map(Auditable::to_value))
    }
}

impl<K: Display, V: Auditable> Auditable for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k, v.to_value())))
    }
}

impl<K: Display, V: Auditable, S> Auditable for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::map(self.iter().map(|(k, v)| (k, v.to_value())))
    }
}
