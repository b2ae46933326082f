//! Dynamic value representation.
//!
//! [`Value`] is the closed set of shapes the codec can represent. Native Rust
//! values enter the model through the `From` conversions below, through
//! [`Value::list`] for any iterable, or through [`crate::to_value`] for
//! anything implementing `serde::Serialize`.
//!
//! ## Creating Values
//!
//! ```rust
//! use serde_ots::Value;
//!
//! let null = Value::Null;
//! let flag = Value::from(true);
//! let number = Value::from(-42);
//! let text = Value::from("hello");
//! let raw = Value::from(vec![0xde_u8, 0xad]);
//!
//! // Any iterator becomes a list
//! let list = Value::list([1, 2, 3]);
//! assert_eq!(list.as_list().map(|l| l.len()), Some(3));
//! ```
//!
//! ## Extracting Values
//!
//! ```rust
//! use serde_ots::Value;
//! use std::convert::TryFrom;
//!
//! let value = Value::from(42);
//! let num: i64 = i64::try_from(value).unwrap();
//! assert_eq!(num, 42);
//! ```

use num_bigint::{BigInt, BigUint};
use num_traits::ToPrimitive;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use unicode_normalization::{is_nfc, UnicodeNormalization};

use crate::registry::Typecode;
use crate::{Dict, Error, Object, Result};

/// NFC-normalizes text for encoding, rejecting U+0000.
pub(crate) fn normalize_str(s: &str) -> Result<Cow<'_, str>> {
    if s.contains('\0') {
        return Err(Error::InvalidString(format!(
            "{:?} contains U+0000",
            s.replace('\0', "\\0")
        )));
    }
    if is_nfc(s) {
        Ok(Cow::Borrowed(s))
    } else {
        Ok(Cow::Owned(s.nfc().collect()))
    }
}

/// A dynamically-typed serializable value.
///
/// `UInt` only appears when decoding a stream that carries the unsigned
/// typecode; native unsigned integers convert to `Int`.
///
/// # Examples
///
/// ```rust
/// use serde_ots::Value;
///
/// let text = Value::Str("hello".to_string());
/// assert!(text.is_str());
/// assert!(Value::Null.is_null());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(BigInt),
    UInt(BigUint),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(Dict),
    Object(Object),
}

impl Value {
    /// Builds a list from any iterable of convertible items.
    ///
    /// This is the sequence adapter: sets, iterators and other collections
    /// that are not a `Vec<Value>` serialize as lists.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::Value;
    /// use std::collections::BTreeSet;
    ///
    /// let set: BTreeSet<&str> = ["b", "a"].into_iter().collect();
    /// let value = Value::list(set);
    /// assert_eq!(value, Value::List(vec![Value::from("a"), Value::from("b")]));
    /// ```
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns the typecode this value is written with.
    #[must_use]
    pub const fn typecode(&self) -> Typecode {
        match self {
            Value::Null => Typecode::Null,
            Value::Bool(_) => Typecode::Bool,
            Value::Int(_) => Typecode::Int,
            Value::UInt(_) => Typecode::UInt,
            Value::Str(_) => Typecode::Str,
            Value::Bytes(_) => Typecode::Bytes,
            Value::List(_) => Typecode::List,
            Value::Dict(_) => Typecode::Dict,
            Value::Object(_) => Typecode::Obj,
        }
    }

    /// Returns the type name of this value; objects report their own type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Value::Object(obj) => obj.type_name(),
            other => other.typecode().type_name(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns `true` for both signed and unsigned integers.
    #[inline]
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Value::Int(_) | Value::UInt(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is an integer that fits in an `i64`, returns it.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::Value;
    ///
    /// assert_eq!(Value::from(-7).as_i64(), Some(-7));
    /// assert_eq!(Value::from(u64::MAX).as_i64(), None);
    /// ```
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => i.to_i64(),
            Value::UInt(u) => u.to_i64(),
            _ => None,
        }
    }

    /// If the value is an integer that fits in a `u64`, returns it.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => i.to_u64(),
            Value::UInt(u) => u.to_u64(),
            _ => None,
        }
    }

    /// Returns the integer as a [`BigInt`], whichever sign variant holds it.
    #[must_use]
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::Int(i) => Some(i.clone()),
            Value::UInt(u) => Some(BigInt::from(u.clone())),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(crate::Error::custom(format!(
                "expected bool, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value.as_i64() {
            Some(i) => Ok(i),
            None if value.is_int() => Err(crate::Error::custom(
                "integer does not fit in i64".to_string(),
            )),
            None => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for u64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value.as_u64() {
            Some(u) => Ok(u),
            None if value.is_int() => Err(crate::Error::custom(
                "integer does not fit in u64".to_string(),
            )),
            None => Err(crate::Error::custom(format!(
                "expected integer, found {}",
                value.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for BigInt {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value.as_bigint().ok_or_else(|| {
            crate::Error::custom(format!("expected integer, found {}", value.type_name()))
        })
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(crate::Error::custom(format!(
                "expected str, found {}",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<Value> for Vec<u8> {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(crate::Error::custom(format!(
                "expected bytes, found {}",
                other.type_name()
            ))),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(BigInt::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::Int(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<T: Into<Value>> From<BTreeSet<T>> for Value {
    fn from(value: BTreeSet<T>) -> Self {
        Value::list(value)
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Value::Dict(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::List(iter.into_iter().collect())
    }
}

/// Hash sets have no stable order, so there is no `From<HashSet<_>>`; use
/// this to turn one into a list in sorted order.
///
/// # Examples
///
/// ```rust
/// use serde_ots::value::sorted_list;
/// use std::collections::HashSet;
///
/// let set: HashSet<i64> = [3, 1, 2].into_iter().collect();
/// let value = sorted_list(set);
/// assert_eq!(value.as_list().unwrap()[0].as_i64(), Some(1));
/// ```
pub fn sorted_list<T>(set: HashSet<T>) -> Value
where
    T: Ord + Into<Value>,
{
    let mut items: Vec<T> = set.into_iter().collect();
    items.sort();
    Value::list(items)
}

/// Objects serialize in their JSON wrapper shape, `{type_name: fields}`.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => {
                if let Some(n) = i.to_i64() {
                    serializer.serialize_i64(n)
                } else if let Some(n) = i.to_u64() {
                    serializer.serialize_u64(n)
                } else if let Some(n) = i.to_i128() {
                    serializer.serialize_i128(n)
                } else if let Some(n) = i.to_u128() {
                    serializer.serialize_u128(n)
                } else {
                    Err(ser::Error::custom(Error::IntegerOutOfRange(i.to_string())))
                }
            }
            Value::UInt(u) => match u.to_u128() {
                Some(n) if n <= u128::from(u64::MAX) => serializer.serialize_u64(n as u64),
                Some(n) => serializer.serialize_u128(n),
                None => Err(ser::Error::custom(Error::IntegerOutOfRange(u.to_string()))),
            },
            Value::Str(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(dict) => dict.serialize(serializer),
            Value::Object(obj) => {
                let fields = obj.fields().map_err(ser::Error::custom)?;
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(obj.type_name(), &fields)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a value without floating point numbers")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_i128<E>(self, value: i128) -> std::result::Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_u128<E>(self, value: u128) -> std::result::Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::Str(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Value, E> {
                Ok(Value::Str(value))
            }

            fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Value, E> {
                Ok(Value::Bytes(value.to_vec()))
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Value, E> {
                Ok(Value::Bytes(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(Value::List(vec))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = Dict::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(Value::Dict(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
