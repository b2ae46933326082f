//! Typed objects: the extension point for structured records.
//!
//! New basic typecodes are a breaking format change, so every domain-specific
//! record travels as an object: a [`TypeName`] tag plus a [`Dict`] of fields.
//!
//! - Implement [`TypedObject`] (or use the [`typed_object!`](crate::typed_object)
//!   macro for serde types) and register it with a
//!   [`RegistryBuilder`](crate::RegistryBuilder).
//! - A registered type must project back onto exactly the fields it was
//!   decoded from; decoding fails otherwise.
//! - Decoding an object whose type name has no rule yields an
//!   [`UnknownObject`], which re-encodes to the exact same bytes.
//!
//! ```rust
//! use serde_ots::{Dict, Object, Result, TypedObject, Value};
//!
//! #[derive(Debug, PartialEq)]
//! struct Digest {
//!     algorithm: String,
//! }
//!
//! impl TypedObject for Digest {
//!     const TYPE_NAME: &'static str = "org.example.Digest";
//!
//!     fn to_fields(&self) -> Result<Dict> {
//!         let mut fields = Dict::new();
//!         fields.insert("algorithm".to_string(), Value::from(self.algorithm.as_str()));
//!         Ok(fields)
//!     }
//!
//!     fn from_fields(mut fields: Dict) -> Result<Self> {
//!         let algorithm = fields
//!             .remove("algorithm")
//!             .ok_or_else(|| serde_ots::Error::custom("missing algorithm"))?;
//!         Ok(Digest { algorithm: String::try_from(algorithm)? })
//!     }
//! }
//!
//! let obj = Object::new(Digest { algorithm: "sha256".to_string() });
//! assert_eq!(obj.type_name(), "org.example.Digest");
//! assert!(obj.downcast_ref::<Digest>().is_some());
//! ```

use regex::Regex;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use crate::registry::Typecode;
use crate::{Dict, Error, Result};

/// The syntax every type name must match.
pub const TYPE_NAME_PATTERN: &str = r"^[A-Za-z0-9\-_.]+$";

fn type_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TYPE_NAME_PATTERN).expect("type name pattern is valid"))
}

/// A validated type name.
///
/// Any name matching [`TYPE_NAME_PATTERN`] is accepted here; whether it is
/// reserved for a basic type is checked where objects are encoded and rules
/// registered. Prefix extension names with a domain you control or a UUID to
/// avoid clashes (`com.example.Foo`).
///
/// # Examples
///
/// ```rust
/// use serde_ots::TypeName;
///
/// assert!(TypeName::new("com.example.Foo").is_ok());
/// assert!(TypeName::new("has space").is_err());
/// assert!(TypeName::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_type_name(&name)?;
        Ok(TypeName(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this is the name of a basic type such as `dict`.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        Typecode::from_type_name(&self.0).is_some()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Checks `name` against [`TYPE_NAME_PATTERN`].
pub fn validate_type_name(name: &str) -> Result<()> {
    if type_name_regex().is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_type_name(
            name,
            &format!("names must match {}", TYPE_NAME_PATTERN),
        ))
    }
}

/// A native Rust type that serializes as a typed object.
pub trait TypedObject: fmt::Debug + PartialEq + Send + Sync + Sized + 'static {
    /// The wire type name; must match [`TYPE_NAME_PATTERN`].
    const TYPE_NAME: &'static str;

    /// Projects the value onto the fields that get serialized.
    fn to_fields(&self) -> Result<Dict>;

    /// Rebuilds the value from decoded fields.
    fn from_fields(fields: Dict) -> Result<Self>;
}

/// Object-safe view of anything stored in a [`Value::Object`](crate::Value::Object).
///
/// Implemented for every [`TypedObject`] and for [`UnknownObject`].
pub trait ObjectValue: fmt::Debug + Send + Sync + 'static {
    fn type_name(&self) -> &str;

    fn fields(&self) -> Result<Dict>;

    fn as_any(&self) -> &dyn Any;

    fn eq_object(&self, other: &dyn ObjectValue) -> bool;
}

impl<T: TypedObject> ObjectValue for T {
    fn type_name(&self) -> &str {
        T::TYPE_NAME
    }

    fn fields(&self) -> Result<Dict> {
        self.to_fields()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_object(&self, other: &dyn ObjectValue) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }
}

/// Holder for decoded objects whose type name has no registered rule.
///
/// Keeps the original type name and every field so the object re-encodes
/// unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownObject {
    type_name: TypeName,
    fields: Dict,
}

impl UnknownObject {
    pub fn new(type_name: TypeName, fields: Dict) -> Self {
        UnknownObject { type_name, fields }
    }

    #[must_use]
    pub fn name(&self) -> &TypeName {
        &self.type_name
    }

    #[must_use]
    pub fn field_map(&self) -> &Dict {
        &self.fields
    }
}

impl ObjectValue for UnknownObject {
    fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    fn fields(&self) -> Result<Dict> {
        Ok(self.fields.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_object(&self, other: &dyn ObjectValue) -> bool {
        other.as_any().downcast_ref::<UnknownObject>() == Some(self)
    }
}

/// A typed object value, shared behind an `Arc`.
///
/// Two objects are equal when they hold the same native type with equal
/// contents; a registered type never equals an [`UnknownObject`].
#[derive(Clone)]
pub struct Object(Arc<dyn ObjectValue>);

impl Object {
    pub fn new<T: TypedObject>(value: T) -> Self {
        Object(Arc::new(value))
    }

    pub fn unknown(type_name: TypeName, fields: Dict) -> Self {
        Object(Arc::new(UnknownObject::new(type_name, fields)))
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    /// Returns the fields to serialize.
    pub fn fields(&self) -> Result<Dict> {
        self.0.fields()
    }

    #[must_use]
    pub fn downcast_ref<T: ObjectValue>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.downcast_ref::<UnknownObject>().is_some()
    }

    /// The type name to write, rejecting malformed and reserved names.
    pub(crate) fn wire_type_name(&self) -> Result<TypeName> {
        let name = TypeName::new(self.type_name())?;
        if name.is_reserved() {
            return Err(Error::invalid_type_name(
                name.as_str(),
                "reserved for a basic type",
            ));
        }
        Ok(name)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_object(other.0.as_ref())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<T: TypedObject> From<T> for Object {
    fn from(value: T) -> Self {
        Object::new(value)
    }
}

/// Serialization rule for one object type name.
pub trait ObjectRule: Send + Sync {
    fn type_name(&self) -> &str;

    /// Builds the native value from decoded fields.
    ///
    /// `type_name` is the tag read from the input; only the fallback rule
    /// needs it.
    fn instantiate(&self, type_name: &TypeName, fields: Dict) -> Result<Object>;
}

/// Rule backed by a [`TypedObject`] implementation.
pub struct TypedRule<T>(PhantomData<fn() -> T>);

impl<T: TypedObject> TypedRule<T> {
    #[must_use]
    pub fn new() -> Self {
        TypedRule(PhantomData)
    }
}

impl<T: TypedObject> Default for TypedRule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TypedObject> ObjectRule for TypedRule<T> {
    fn type_name(&self) -> &str {
        T::TYPE_NAME
    }

    /// Fails unless the rebuilt value projects back onto exactly the
    /// decoded fields, so a registered object always re-encodes to the bytes
    /// it was read from.
    fn instantiate(&self, _type_name: &TypeName, fields: Dict) -> Result<Object> {
        let value = T::from_fields(fields.clone())?;
        ensure_fields_preserved(T::TYPE_NAME, &fields, &value.to_fields()?)?;
        Ok(Object::new(value))
    }
}

fn ensure_fields_preserved(type_name: &str, decoded: &Dict, rebuilt: &Dict) -> Result<()> {
    for (key, value) in decoded.iter() {
        match rebuilt.get(key) {
            None => {
                return Err(Error::custom(format!(
                    "{} has no field '{}'",
                    type_name, key
                )))
            }
            Some(projected) if projected != value => {
                return Err(Error::custom(format!(
                    "{} field '{}' would re-encode as {} instead of {}",
                    type_name,
                    key,
                    projected.type_name(),
                    value.type_name()
                )))
            }
            Some(_) => {}
        }
    }
    if let Some(key) = rebuilt.keys().find(|key| !decoded.contains_key(key)) {
        return Err(Error::custom(format!(
            "{} field '{}' is missing from the input",
            type_name, key
        )));
    }
    Ok(())
}

/// Fallback rule for type names with no registration.
pub struct UnknownObjectRule;

impl ObjectRule for UnknownObjectRule {
    fn type_name(&self) -> &str {
        "obj"
    }

    fn instantiate(&self, type_name: &TypeName, fields: Dict) -> Result<Object> {
        Ok(Object::unknown(type_name.clone(), fields))
    }
}
