//! Error types for canonical binary and JSON (de)serialization.
//!
//! Every failure is reported to the caller as a distinct [`Error`] variant.
//! Nothing is coerced or silently repaired: a codec that quietly accepted
//! malformed input would produce values whose canonical bytes no longer match
//! what the producer hashed.
//!
//! ## Error Categories
//!
//! - **Registry**: [`Error::InvalidTypeName`], [`Error::DuplicateRegistration`]
//! - **Dispatch**: [`Error::UnknownType`], [`Error::UnknownTypecode`]
//! - **Binary input**: [`Error::MalformedBinary`] with the byte offset of the problem
//! - **JSON input**: [`Error::MalformedJson`]
//! - **Encoding**: [`Error::InvalidKey`], [`Error::InvalidString`], [`Error::IntegerOutOfRange`]
//!
//! ## Examples
//!
//! ```rust
//! use serde_ots::{from_slice, Error, Registry};
//!
//! let registry = Registry::default();
//! let result = from_slice(&registry, &[0xff]);
//! assert!(matches!(result, Err(Error::UnknownTypecode(0xff))));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur during serialization or deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A type name does not match `^[A-Za-z0-9\-_.]+$` or names a basic type
    #[error("Invalid type name '{name}': {reason}")]
    InvalidTypeName { name: String, reason: String },

    /// A type name or typecode was registered twice
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// A native value has no serialization rule
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// The leading byte of a binary value is not a registered typecode
    #[error("Unknown typecode 0x{0:02x}")]
    UnknownTypecode(u8),

    /// Structural violation in a binary stream
    #[error("Malformed binary at offset {offset}: {msg}")]
    MalformedBinary { offset: usize, msg: String },

    /// Structural violation in a JSON tree
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    /// Dict key that cannot be encoded (empty, or colliding after normalization)
    #[error("Invalid dict key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// Text that cannot be encoded
    #[error("Invalid string: {0}")]
    InvalidString(String),

    /// Integer that does not fit the JSON number range
    #[error("Integer {0} exceeds the JSON number range")]
    IntegerOutOfRange(String),

    /// Nesting deeper than the configured decode limit
    #[error("Nesting depth exceeds the limit of {0}")]
    DepthLimitExceeded(usize),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates an invalid type name error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::Error;
    ///
    /// let err = Error::invalid_type_name("bad name", "contains a space");
    /// assert!(err.to_string().contains("bad name"));
    /// ```
    pub fn invalid_type_name(name: &str, reason: &str) -> Self {
        Error::InvalidTypeName {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates a malformed binary error at the given byte offset.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_ots::Error;
    ///
    /// let err = Error::malformed_binary(3, "unexpected end of input");
    /// assert!(err.to_string().contains("offset 3"));
    /// ```
    pub fn malformed_binary(offset: usize, msg: &str) -> Self {
        Error::MalformedBinary {
            offset,
            msg: msg.to_string(),
        }
    }

    /// Creates a malformed JSON error.
    pub fn malformed_json<T: fmt::Display>(msg: T) -> Self {
        Error::MalformedJson(msg.to_string())
    }

    /// Creates an invalid dict key error.
    pub fn invalid_key(key: &str, reason: &str) -> Self {
        Error::InvalidKey {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unknown type error for native values with no rule.
    pub fn unknown_type(msg: &str) -> Self {
        Error::UnknownType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::UnknownTypecode(0xff).to_string(),
            "Unknown typecode 0xff"
        );
        assert_eq!(
            Error::malformed_binary(7, "truncated").to_string(),
            "Malformed binary at offset 7: truncated"
        );
        assert!(Error::invalid_key("", "empty key")
            .to_string()
            .contains("empty key"));
    }

    #[test]
    fn test_serde_custom() {
        let err = <Error as serde::de::Error>::custom("boom");
        assert_eq!(err, Error::Custom("boom".to_string()));
    }
}
