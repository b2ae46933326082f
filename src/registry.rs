//! Type registry: maps typecodes and type names to serialization rules.
//!
//! A [`Registry`] is built once with a [`RegistryBuilder`] and then only read.
//! It is `Send + Sync`, so a single instance can back any number of threads.
//! Finish registering before sharing it, e.g. by building it inside a
//! `OnceLock`:
//!
//! ```rust
//! use serde_ots::Registry;
//! use std::sync::OnceLock;
//!
//! fn registry() -> &'static Registry {
//!     static REGISTRY: OnceLock<Registry> = OnceLock::new();
//!     REGISTRY.get_or_init(|| Registry::builder().build())
//! }
//!
//! assert!(registry().resolve_typecode(0x06).is_ok());
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::object::{validate_type_name, ObjectRule, TypedRule};
use crate::{Error, Result, TypeName, TypedObject, Value};

/// One-byte tag of a basic wire type.
///
/// Typecodes stay in `0x00..=0x09`: they are unprintable and have the high bit
/// clear, so a stream that is misaligned onto varint data fails quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Typecode {
    Null = 0x00,
    Bool = 0x01,
    Int = 0x02,
    UInt = 0x03,
    Str = 0x04,
    Bytes = 0x05,
    Dict = 0x06,
    List = 0x07,
    ListEnd = 0x08,
    Obj = 0x09,
}

impl Typecode {
    /// Every basic type, in typecode order.
    pub const ALL: [Typecode; 10] = [
        Typecode::Null,
        Typecode::Bool,
        Typecode::Int,
        Typecode::UInt,
        Typecode::Str,
        Typecode::Bytes,
        Typecode::Dict,
        Typecode::List,
        Typecode::ListEnd,
        Typecode::Obj,
    ];

    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Typecode::Null => "null",
            Typecode::Bool => "bool",
            Typecode::Int => "int",
            Typecode::UInt => "uint",
            Typecode::Str => "str",
            Typecode::Bytes => "bytes",
            Typecode::Dict => "dict",
            Typecode::List => "list",
            Typecode::ListEnd => "list_end",
            Typecode::Obj => "obj",
        }
    }

    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        Typecode::ALL.into_iter().find(|code| code.type_name() == name)
    }
}

impl fmt::Display for Typecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.type_name(), self.as_u8())
    }
}

/// The rule resolved for a value or a type name.
#[derive(Clone, Copy)]
pub enum Rule<'r> {
    Basic(Typecode),
    Object(&'r dyn ObjectRule),
    /// No rule is registered; the object is kept as an [`UnknownObject`](crate::UnknownObject).
    Unknown,
}

impl fmt::Debug for Rule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Basic(code) => f.debug_tuple("Basic").field(code).finish(),
            Rule::Object(rule) => f.debug_tuple("Object").field(&rule.type_name()).finish(),
            Rule::Unknown => f.write_str("Unknown"),
        }
    }
}

#[derive(Clone)]
enum Entry {
    Basic(Typecode),
    Object(Arc<dyn ObjectRule>),
}

/// Immutable lookup table of serialization rules.
#[derive(Clone)]
pub struct Registry {
    by_name: HashMap<String, Entry>,
    by_code: BTreeMap<u8, Typecode>,
}

impl Registry {
    /// Starts a builder with the basic types already registered.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Resolves the leading byte of a binary value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::{Error, Registry, Typecode};
    ///
    /// let registry = Registry::default();
    /// assert_eq!(registry.resolve_typecode(0x07), Ok(Typecode::List));
    /// assert_eq!(registry.resolve_typecode(0xff), Err(Error::UnknownTypecode(0xff)));
    /// ```
    pub fn resolve_typecode(&self, byte: u8) -> Result<Typecode> {
        self.by_code
            .get(&byte)
            .copied()
            .ok_or(Error::UnknownTypecode(byte))
    }

    /// Resolves a type name read from the wire.
    ///
    /// Unregistered but well-formed names resolve to [`Rule::Unknown`].
    pub fn resolve_type_name(&self, name: &str) -> Result<Rule<'_>> {
        validate_type_name(name)?;
        Ok(match self.by_name.get(name) {
            Some(Entry::Basic(code)) => Rule::Basic(*code),
            Some(Entry::Object(rule)) => Rule::Object(rule.as_ref()),
            None => Rule::Unknown,
        })
    }

    /// Resolves the rule that applies to a value.
    ///
    /// Non-object values map to their basic rule; objects to their registered
    /// rule, or [`Rule::Unknown`] when none is registered.
    pub fn resolve_value(&self, value: &Value) -> Rule<'_> {
        match value {
            Value::Object(obj) => match self.by_name.get(obj.type_name()) {
                Some(Entry::Object(rule)) => Rule::Object(rule.as_ref()),
                _ => Rule::Unknown,
            },
            other => Rule::Basic(other.typecode()),
        }
    }

    /// Returns `true` if an object rule is registered under `name`.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        matches!(self.by_name.get(name), Some(Entry::Object(_)))
    }

    /// Registered object type names, sorted.
    #[must_use]
    pub fn object_type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_name
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Object(_)))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        RegistryBuilder::new().build()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("typecodes", &self.by_code.len())
            .field("objects", &self.object_type_names())
            .finish()
    }
}

/// Collects rules before freezing them into a [`Registry`].
///
/// # Examples
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use serde_ots::{typed_object, Registry};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Note {
///     text: String,
/// }
///
/// typed_object!(Note, "org.example.Note");
///
/// let registry = Registry::builder().register::<Note>().unwrap().build();
/// assert!(registry.is_registered("org.example.Note"));
///
/// // Names are unique per registry
/// assert!(Registry::builder()
///     .register::<Note>()
///     .unwrap()
///     .register::<Note>()
///     .is_err());
/// ```
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        let mut builder = RegistryBuilder {
            registry: Registry {
                by_name: HashMap::new(),
                by_code: BTreeMap::new(),
            },
        };
        for code in Typecode::ALL {
            builder
                .insert_basic(code)
                .expect("basic typecodes and names are distinct");
        }
        builder
    }

    fn insert_basic(&mut self, code: Typecode) -> Result<()> {
        if self.registry.by_code.contains_key(&code.as_u8()) {
            return Err(Error::DuplicateRegistration(format!(
                "typecode 0x{:02x}",
                code.as_u8()
            )));
        }
        self.insert_name(code.type_name(), Entry::Basic(code))?;
        self.registry.by_code.insert(code.as_u8(), code);
        Ok(())
    }

    fn insert_name(&mut self, name: &str, entry: Entry) -> Result<()> {
        validate_type_name(name)?;
        if self.registry.by_name.contains_key(name) {
            return Err(Error::DuplicateRegistration(format!("type name '{}'", name)));
        }
        self.registry.by_name.insert(name.to_string(), entry);
        Ok(())
    }

    /// Registers a [`TypedObject`] under its `TYPE_NAME`.
    pub fn register<T: TypedObject>(self) -> Result<Self> {
        self.register_rule(Arc::new(TypedRule::<T>::new()))
    }

    /// Registers a custom rule.
    ///
    /// Fails with [`Error::InvalidTypeName`] for malformed names and
    /// [`Error::DuplicateRegistration`] when the name is taken, including by
    /// a basic type.
    pub fn register_rule(mut self, rule: Arc<dyn ObjectRule>) -> Result<Self> {
        let name = TypeName::new(rule.type_name())?;
        self.insert_name(name.as_str(), Entry::Object(rule))?;
        tracing::debug!(type_name = %name, "registered object rule");
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> Registry {
        self.registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dict, Object, TypeName};

    #[derive(Debug, PartialEq)]
    struct Stamp;

    impl TypedObject for Stamp {
        const TYPE_NAME: &'static str = "test.Stamp";

        fn to_fields(&self) -> Result<Dict> {
            Ok(Dict::new())
        }

        fn from_fields(_fields: Dict) -> Result<Self> {
            Ok(Stamp)
        }
    }

    #[derive(Debug, PartialEq)]
    struct Shadow;

    impl TypedObject for Shadow {
        const TYPE_NAME: &'static str = "dict";

        fn to_fields(&self) -> Result<Dict> {
            Ok(Dict::new())
        }

        fn from_fields(_fields: Dict) -> Result<Self> {
            Ok(Shadow)
        }
    }

    #[derive(Debug, PartialEq)]
    struct BadName;

    impl TypedObject for BadName {
        const TYPE_NAME: &'static str = "bad name";

        fn to_fields(&self) -> Result<Dict> {
            Ok(Dict::new())
        }

        fn from_fields(_fields: Dict) -> Result<Self> {
            Ok(BadName)
        }
    }

    #[test]
    fn test_typecode_table() {
        let registry = Registry::default();
        for code in Typecode::ALL {
            assert_eq!(registry.resolve_typecode(code.as_u8()), Ok(code));
        }
        assert_eq!(
            registry.resolve_typecode(0x0a),
            Err(Error::UnknownTypecode(0x0a))
        );
    }

    #[test]
    fn test_resolve_type_name() {
        let registry = Registry::builder().register::<Stamp>().unwrap().build();

        assert!(matches!(
            registry.resolve_type_name("bytes"),
            Ok(Rule::Basic(Typecode::Bytes))
        ));
        assert!(matches!(
            registry.resolve_type_name("test.Stamp"),
            Ok(Rule::Object(_))
        ));
        assert!(matches!(
            registry.resolve_type_name("test.Missing"),
            Ok(Rule::Unknown)
        ));
        assert!(matches!(
            registry.resolve_type_name("no spaces allowed"),
            Err(Error::InvalidTypeName { .. })
        ));
    }

    #[test]
    fn test_resolve_value() {
        let registry = Registry::builder().register::<Stamp>().unwrap().build();

        assert!(matches!(
            registry.resolve_value(&Value::from("x")),
            Rule::Basic(Typecode::Str)
        ));
        assert!(matches!(
            registry.resolve_value(&Value::Object(Object::new(Stamp))),
            Rule::Object(_)
        ));
        let unknown = Object::unknown(TypeName::new("test.Other").unwrap(), Dict::new());
        assert!(matches!(
            registry.resolve_value(&Value::Object(unknown)),
            Rule::Unknown
        ));
    }

    #[test]
    fn test_duplicate_and_invalid_registration() {
        let builder = Registry::builder().register::<Stamp>().unwrap();
        assert!(matches!(
            builder.register::<Stamp>(),
            Err(Error::DuplicateRegistration(_))
        ));
        assert!(matches!(
            Registry::builder().register::<Shadow>(),
            Err(Error::DuplicateRegistration(_))
        ));
        assert!(matches!(
            Registry::builder().register::<BadName>(),
            Err(Error::InvalidTypeName { .. })
        ));
    }

    #[test]
    fn test_duplicate_typecode() {
        let mut builder = RegistryBuilder::new();
        assert!(matches!(
            builder.insert_basic(Typecode::Dict),
            Err(Error::DuplicateRegistration(_))
        ));
    }

    #[test]
    fn test_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
        assert_send_sync::<Value>();
    }
}
