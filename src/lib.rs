//! # serde_ots
//!
//! Canonical binary and JSON serialization for values that get hashed.
//!
//! Every value has exactly one encoding in each format. Dict keys are sorted,
//! text is NFC-normalized and integers use minimal variable-length encodings,
//! so equal values always produce equal bytes and digests of encoded data are
//! stable across runs and implementations.
//!
//! ## Key Features
//!
//! - **Deterministic**: insertion order, hash map order and Unicode
//!   composition never leak into the output
//! - **Arbitrary precision integers**: zig-zag varints over `BigInt`
//! - **Typed objects**: domain records travel as `type name + fields` and
//!   unknown types survive a decode/encode round trip byte for byte
//! - **Serde bridge**: any `Serialize` type converts to a [`Value`]
//! - **Hardened decoding**: depth limits and an opt-in canonical-only mode
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! serde_ots = "0.1"
//! ```
//!
//! ### Binary Round Trip
//!
//! ```rust
//! use serde_ots::{from_slice, ots, to_bytes, Registry};
//!
//! let value = ots!({
//!     "name": "Alice",
//!     "tags": ["a", "b"]
//! });
//!
//! let bytes = to_bytes(&value).unwrap();
//! let registry = Registry::default();
//! assert_eq!(from_slice(&registry, &bytes).unwrap(), value);
//! ```
//!
//! ### JSON
//!
//! ```rust
//! use serde_json::json;
//! use serde_ots::{from_json, ots, to_json, Registry};
//!
//! let value = ots!({ "raw": (vec![1u8, 2]) });
//! let tree = to_json(&value).unwrap();
//! assert_eq!(tree, json!({"dict": {"raw": "#0102"}}));
//! assert_eq!(from_json(&Registry::default(), &tree).unwrap(), value);
//! ```
//!
//! ### Typed Objects
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_ots::{from_slice, to_bytes, typed_object, Object, Registry, Value};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Commitment {
//!     digest: String,
//!     height: u64,
//! }
//!
//! typed_object!(Commitment, "org.example.Commitment");
//!
//! let registry = Registry::builder().register::<Commitment>().unwrap().build();
//!
//! let value = Value::from(Object::new(Commitment { digest: "ab".into(), height: 1 }));
//! let bytes = to_bytes(&value).unwrap();
//! assert_eq!(from_slice(&registry, &bytes).unwrap(), value);
//!
//! // Without the registration the object is kept as an unknown object
//! let unknown = from_slice(&Registry::default(), &bytes).unwrap();
//! assert!(unknown.as_object().unwrap().is_unknown());
//! assert_eq!(to_bytes(&unknown).unwrap(), bytes);
//! ```
//!
//! ## Thread Safety
//!
//! Encoding and decoding keep no global state. A [`Registry`] is immutable
//! once built and can be shared between threads; finish every registration
//! before decoding starts.
//!
//! ## Wire Format
//!
//! See the [`format`] module for the byte-level description of both encodings.

pub mod binary;
pub mod de;
pub mod error;
pub mod format;
pub mod json;
pub mod macros;
pub mod map;
pub mod object;
pub mod options;
pub mod registry;
pub mod ser;
pub mod value;
pub mod varint;

pub use binary::{Decoder, Encoder};
pub use de::ValueDeserializer;
pub use error::{Error, Result};
pub use json::JsonDecoder;
pub use map::Dict;
pub use object::{
    Object, ObjectRule, ObjectValue, TypeName, TypedObject, TypedRule, UnknownObject,
    UnknownObjectRule,
};
pub use options::{DecodeOptions, DEFAULT_MAX_DEPTH};
pub use registry::{Registry, RegistryBuilder, Rule, Typecode};
pub use ser::ValueSerializer;
pub use value::Value;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Major version of the binary encoding; bumped when basic types change.
pub const BINARY_MAJOR_VERSION: u32 = 0;
/// Minor version of the binary encoding.
pub const BINARY_MINOR_VERSION: u32 = 0;
/// Major version of the JSON encoding; bumped when basic types change.
pub const JSON_MAJOR_VERSION: u32 = 0;
/// Minor version of the JSON encoding.
pub const JSON_MINOR_VERSION: u32 = 0;

/// Encode a value in the binary format.
///
/// # Examples
///
/// ```rust
/// use serde_ots::{to_bytes, Value};
///
/// assert_eq!(to_bytes(&Value::from(-1)).unwrap(), vec![0x02, 0x01]);
/// assert_eq!(to_bytes(&Value::from("hi")).unwrap(), vec![0x04, 0x02, b'h', b'i']);
/// ```
///
/// # Errors
///
/// Returns an error for text containing U+0000, empty or colliding dict keys,
/// and objects with invalid type names.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut encoder = Encoder::new();
    encoder.encode(value)?;
    let bytes = encoder.into_inner();
    tracing::trace!(len = bytes.len(), "encoded binary value");
    Ok(bytes)
}

/// Encode a value in the binary format into a writer.
///
/// The value is fully encoded before anything is written, so a failed
/// encoding leaves the writer untouched.
///
/// # Errors
///
/// Returns an error if encoding fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W>(mut writer: W, value: &Value) -> Result<()>
where
    W: io::Write,
{
    let bytes = to_bytes(value)?;
    writer
        .write_all(&bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    Ok(())
}

/// Decode exactly one binary value.
///
/// # Examples
///
/// ```rust
/// use serde_ots::{from_slice, Error, Registry, Value};
///
/// let registry = Registry::default();
/// assert_eq!(from_slice(&registry, &[0x01, 0xff]).unwrap(), Value::Bool(true));
/// assert_eq!(from_slice(&registry, &[0xff]), Err(Error::UnknownTypecode(0xff)));
///
/// // Trailing bytes are an error
/// assert!(from_slice(&registry, &[0x00, 0x00]).is_err());
/// ```
///
/// # Errors
///
/// Returns an error if the input is malformed, truncated, has trailing bytes
/// or fails a registered object's field validation.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice(registry: &Registry, bytes: &[u8]) -> Result<Value> {
    from_slice_with_options(registry, bytes, &DecodeOptions::default())
}

/// Decode exactly one binary value with custom options.
///
/// # Errors
///
/// Same as [`from_slice`], plus [`Error::DepthLimitExceeded`] and the
/// canonical-form checks enabled by `options`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice_with_options(
    registry: &Registry,
    bytes: &[u8],
    options: &DecodeOptions,
) -> Result<Value> {
    let mut decoder = Decoder::with_options(registry, bytes, options.clone());
    let value = decoder.decode_value()?;
    if !decoder.is_at_end() {
        return Err(Error::malformed_binary(
            decoder.position(),
            &format!("{} trailing bytes", bytes.len() - decoder.position()),
        ));
    }
    tracing::trace!(len = bytes.len(), "decoded binary value");
    Ok(value)
}

/// Decode exactly one binary value from a reader.
///
/// The reader is read to its end before decoding.
///
/// # Examples
///
/// ```rust
/// use serde_ots::{from_reader, Registry, Value};
/// use std::io::Cursor;
///
/// let value = from_reader(&Registry::default(), Cursor::new(vec![0x07, 0x00, 0x08])).unwrap();
/// assert_eq!(value, Value::List(vec![Value::Null]));
/// ```
///
/// # Errors
///
/// Returns an error if reading fails or the bytes do not decode.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R>(registry: &Registry, mut reader: R) -> Result<Value>
where
    R: io::Read,
{
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::io(&e.to_string()))?;
    from_slice(registry, &bytes)
}

/// Convert a value into its JSON tree.
///
/// # Examples
///
/// ```rust
/// use serde_json::json;
/// use serde_ots::{to_json, Value};
///
/// assert_eq!(to_json(&Value::from("#tag")).unwrap(), json!("\\#tag"));
/// ```
///
/// # Errors
///
/// Returns [`Error::IntegerOutOfRange`] for integers that do not fit a JSON
/// number, plus the same errors as [`to_bytes`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    json::encode(value)
}

/// Rebuild a value from its JSON tree.
///
/// # Errors
///
/// Returns an error if the tree breaks the JSON conventions (see
/// [`format`]) or names an invalid type.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_json(registry: &Registry, json: &serde_json::Value) -> Result<Value> {
    from_json_with_options(registry, json, &DecodeOptions::default())
}

/// Rebuild a value from its JSON tree with custom options.
///
/// # Errors
///
/// Same as [`from_json`], plus the limits enabled by `options`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_json_with_options(
    registry: &Registry,
    json: &serde_json::Value,
    options: &DecodeOptions,
) -> Result<Value> {
    JsonDecoder::with_options(registry, options.clone()).decode(json)
}

/// Encode a value as JSON text.
///
/// Object keys come out sorted, so the text is as deterministic as the tree.
///
/// # Errors
///
/// Same as [`to_json`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_json_string(value: &Value) -> Result<String> {
    let tree = to_json(value)?;
    let text = serde_json::to_string(&tree).map_err(Error::custom)?;
    tracing::trace!(len = text.len(), "encoded JSON value");
    Ok(text)
}

/// Decode a value from JSON text.
///
/// # Examples
///
/// ```rust
/// use serde_ots::{from_json_str, Registry, Value};
///
/// let value = from_json_str(&Registry::default(), r#"{"dict": {"x": 1}}"#).unwrap();
/// assert_eq!(value.as_dict().unwrap().get("x"), Some(&Value::from(1)));
/// ```
///
/// # Errors
///
/// Returns [`Error::MalformedJson`] if the text does not parse, plus the
/// errors of [`from_json`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_json_str(registry: &Registry, s: &str) -> Result<Value> {
    let tree: serde_json::Value = serde_json::from_str(s).map_err(Error::malformed_json)?;
    from_json(registry, &tree)
}

/// Convert any `T: Serialize` into a [`Value`].
///
/// # Examples
///
/// ```rust
/// use serde_ots::to_value;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert!(value.is_dict());
/// ```
///
/// # Errors
///
/// Returns an error for floats and for maps with non-string keys.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    value.serialize(ValueSerializer)
}

/// Convert a [`Value`] into any `T: Deserialize`.
///
/// # Errors
///
/// Returns an error if the value's shape does not match `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        active: bool,
        tags: Vec<String>,
    }

    fn user() -> User {
        User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["admin".to_string(), "user".to_string()],
        }
    }

    #[test]
    fn test_binary_roundtrip_point() {
        let value = to_value(&Point { x: 1, y: 2 }).unwrap();
        let bytes = to_bytes(&value).unwrap();
        let back = from_slice(&Registry::default(), &bytes).unwrap();
        let point: Point = from_value(back).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn test_json_roundtrip_user() {
        let value = to_value(&user()).unwrap();
        let text = to_json_string(&value).unwrap();
        let back = from_json_str(&Registry::default(), &text).unwrap();
        assert_eq!(from_value::<User>(back).unwrap(), user());
    }

    #[test]
    fn test_writer_and_reader() {
        let value = to_value(&user()).unwrap();
        let mut buffer = Vec::new();
        to_writer(&mut buffer, &value).unwrap();
        assert_eq!(buffer, to_bytes(&value).unwrap());

        let back = from_reader(&Registry::default(), std::io::Cursor::new(buffer)).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let registry = Registry::default();
        assert!(matches!(
            from_slice(&registry, &[0x00, 0x00]),
            Err(Error::MalformedBinary { offset: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_json_text() {
        assert!(matches!(
            from_json_str(&Registry::default(), "{"),
            Err(Error::MalformedJson(_))
        ));
    }

    #[test]
    fn test_failed_encode_leaves_writer_empty() {
        let mut buffer = Vec::new();
        let bad = Value::list([Value::from(1), Value::from("nul\0")]);
        assert!(to_writer(&mut buffer, &bad).is_err());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_versions() {
        assert_eq!(BINARY_MAJOR_VERSION, 0);
        assert_eq!(JSON_MAJOR_VERSION, 0);
    }
}
