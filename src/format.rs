//! Wire format reference
//!
//! This module documents the binary and JSON encodings produced by this
//! library. Both are canonical: a value has exactly one valid encoding, so
//! encoded bytes can be hashed and compared directly.
//!
//! # Value Model
//!
//! | Type | Rust | Notes |
//! |------|------|-------|
//! | `null` | `Value::Null` | |
//! | `bool` | `Value::Bool` | |
//! | `int` | `Value::Int(BigInt)` | arbitrary precision |
//! | `uint` | `Value::UInt(BigUint)` | only produced by decoders |
//! | `str` | `Value::Str` | NFC-normalized, no U+0000 |
//! | `bytes` | `Value::Bytes` | |
//! | `list` | `Value::List` | |
//! | `dict` | `Value::Dict` | non-empty text keys |
//! | `obj` | `Value::Object` | type name + fields |
//!
//! There are no floating point numbers. Sets, iterators and other sequences
//! are written as lists.
//!
//! # Binary Encoding
//!
//! ## Typecodes
//!
//! Every value starts with a single typecode byte:
//!
//! | Byte | Type |
//! |------|------|
//! | `0x00` | null |
//! | `0x01` | bool |
//! | `0x02` | int |
//! | `0x03` | uint |
//! | `0x04` | str |
//! | `0x05` | bytes |
//! | `0x06` | dict |
//! | `0x07` | list |
//! | `0x08` | list_end |
//! | `0x09` | obj |
//!
//! Any other leading byte is rejected with
//! [`Error::UnknownTypecode`](crate::Error::UnknownTypecode).
//!
//! ## Integers
//!
//! Unsigned integers use base-128 little-endian groups with the high bit as a
//! continuation flag. Signed integers are zig-zag mapped first:
//!
//! ```text
//!  value   uint    bytes
//!      0      0    00
//!     -1      1    01
//!      1      2    02
//!    127     --    7f      (as uint)
//!    128     --    80 01   (as uint)
//! ```
//!
//! ## Text and Bytes
//!
//! `bytes` is a varint length followed by the raw bytes. `str` is the NFC form
//! of the text, UTF-8 encoded, framed exactly like `bytes`:
//!
//! ```text
//! "hi"      04 02 68 69
//! b"\xaa"   05 01 aa
//! ```
//!
//! ## Lists and Dicts
//!
//! Lists are their elements followed by a `list_end` typecode. Dicts are
//! `(key, value)` pairs sorted by key in code point order, each key written
//! as a `str` body without its typecode, and closed by an empty key:
//!
//! ```text
//! [1]             07 02 02 08
//! {"a": true}     06 01 61 01 ff 00
//! ```
//!
//! ## Objects
//!
//! An object is its type name as a `str` body followed by its fields as a
//! `dict` body:
//!
//! ```text
//! t{"n": 1}       09 01 74 01 6e 02 02 00
//! ```
//!
//! Type names match `^[A-Za-z0-9\-_.]+$` and may not be one of the ten basic
//! type names above.
//!
//! # JSON Encoding
//!
//! | Value | JSON |
//! |-------|------|
//! | null, bool | as is |
//! | int | number (must fit `i64` or `u64`) |
//! | uint | `{"uint": n}` |
//! | bytes `01 02` | `"#0102"` |
//! | text `#foo` | `"\\#foo"` |
//! | list | array |
//! | dict, not one key | object |
//! | dict, one key | `{"dict": {...}}` |
//! | object | `{"type.Name": {...fields}}` |
//!
//! A JSON object with one key is always read as a typed wrapper. The key
//! `dict` unwraps a dict; any other basic type name decodes its payload as
//! that type (`{"int": 5}`); anything else is an object type name.
//!
//! # Forward Compatibility
//!
//! New basic types are a breaking change and bump the major version
//! ([`BINARY_MAJOR_VERSION`](crate::BINARY_MAJOR_VERSION),
//! [`JSON_MAJOR_VERSION`](crate::JSON_MAJOR_VERSION)). New object types need no
//! version change: a decoder that does not know a type name keeps it as an
//! [`UnknownObject`](crate::UnknownObject), which re-encodes to the same bytes.
//!
//! # Limitations
//!
//! - **Integers in JSON**: values outside `i64`/`u64` fail with
//!   [`Error::IntegerOutOfRange`](crate::Error::IntegerOutOfRange)
//! - **Map keys**: must be non-empty text
//! - **Byte fields**: serde writes `Vec<u8>` as a list; annotate byte fields of
//!   typed objects with `#[serde(with = "serde_bytes")]`
//! - **Floats**: not representable

// This module contains only documentation; no implementation code
