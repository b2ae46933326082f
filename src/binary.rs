//! Binary encoding and decoding.
//!
//! Every value is written as `<typecode><body>`. There is no generic length
//! prefix; each body knows where it ends:
//!
//! | type | body |
//! |------|------|
//! | null, list_end | empty |
//! | bool | `ff` or `00` |
//! | int | zig-zag varint |
//! | uint | varint |
//! | bytes | varint length, raw bytes |
//! | str | bytes body of the NFC-normalized UTF-8 text |
//! | list | values, then a `list_end` value |
//! | dict | `(str body of key, value)*` sorted by key, then an empty str body |
//! | obj | str body of the type name, then a dict body of the fields |
//!
//! ## Streaming
//!
//! [`Decoder`] reads one value at a time and tracks its position, so
//! consecutive values can be pulled from one buffer:
//!
//! ```rust
//! use serde_ots::{binary::Decoder, to_bytes, Registry, Value};
//!
//! let mut buf = to_bytes(&Value::from(1)).unwrap();
//! buf.extend(to_bytes(&Value::from("two")).unwrap());
//!
//! let registry = Registry::default();
//! let mut decoder = Decoder::new(&registry, &buf);
//! assert_eq!(decoder.decode_value().unwrap(), Value::from(1));
//! assert_eq!(decoder.decode_value().unwrap(), Value::from("two"));
//! assert!(decoder.is_at_end());
//! ```

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use unicode_normalization::is_nfc;

use crate::object::UnknownObjectRule;
use crate::registry::{Rule, Typecode};
use crate::value::normalize_str;
use crate::varint::{self, ReadUint};
use crate::{DecodeOptions, Dict, Error, Object, ObjectRule, Registry, Result, TypeName, Value};

const TRUE_BYTE: u8 = 0xff;
const FALSE_BYTE: u8 = 0x00;

/// Writes values in the canonical binary format.
///
/// Created via [`Encoder::new`]; output accumulates in memory until
/// [`Encoder::into_inner`].
pub struct Encoder {
    output: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Encoder {
            output: Vec::with_capacity(64),
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.output
    }

    /// Appends one value, typecode included.
    pub fn encode(&mut self, value: &Value) -> Result<()> {
        self.write_typecode(value.typecode());
        match value {
            Value::Null => {}
            Value::Bool(b) => self.output.push(if *b { TRUE_BYTE } else { FALSE_BYTE }),
            Value::Int(i) => varint::write_int(&mut self.output, i),
            Value::UInt(u) => varint::write_uint(&mut self.output, u),
            Value::Str(s) => self.write_str_body(s)?,
            Value::Bytes(b) => self.write_bytes_body(b),
            Value::List(items) => {
                for item in items {
                    self.encode(item)?;
                }
                self.write_typecode(Typecode::ListEnd);
            }
            Value::Dict(dict) => self.write_dict_body(dict)?,
            Value::Object(obj) => self.write_object_body(obj)?,
        }
        Ok(())
    }

    #[inline]
    fn write_typecode(&mut self, code: Typecode) {
        self.output.push(code.as_u8());
    }

    fn write_bytes_body(&mut self, bytes: &[u8]) {
        varint::write_uint(&mut self.output, &BigUint::from(bytes.len()));
        self.output.extend_from_slice(bytes);
    }

    fn write_str_body(&mut self, s: &str) -> Result<()> {
        let normalized = normalize_str(s)?;
        self.write_bytes_body(normalized.as_bytes());
        Ok(())
    }

    fn write_dict_body(&mut self, dict: &Dict) -> Result<()> {
        for (key, value) in dict.canonical_entries()? {
            self.write_bytes_body(key.as_bytes());
            self.encode(value)?;
        }
        // An empty key ends the dict
        self.write_bytes_body(&[]);
        Ok(())
    }

    fn write_object_body(&mut self, obj: &Object) -> Result<()> {
        let name = obj.wire_type_name()?;
        self.write_str_body(name.as_str())?;
        self.write_dict_body(&obj.fields()?)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads values from a byte slice.
///
/// Object type names are resolved against the [`Registry`] the decoder was
/// created with.
pub struct Decoder<'de, 'r> {
    input: &'de [u8],
    position: usize,
    registry: &'r Registry,
    options: DecodeOptions,
    depth: usize,
}

impl<'de, 'r> Decoder<'de, 'r> {
    pub fn new(registry: &'r Registry, input: &'de [u8]) -> Self {
        Self::with_options(registry, input, DecodeOptions::default())
    }

    pub fn with_options(registry: &'r Registry, input: &'de [u8], options: DecodeOptions) -> Self {
        Decoder {
            input,
            position: 0,
            registry,
            options,
            depth: 0,
        }
    }

    /// Byte offset of the next unread byte.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Decodes the next complete value.
    pub fn decode_value(&mut self) -> Result<Value> {
        self.depth = 0;
        let start = self.position;
        match self.decode_item()? {
            Some(value) => Ok(value),
            None => Err(Error::malformed_binary(
                start,
                "list terminator outside of a list",
            )),
        }
    }

    /// Decodes a value, or returns `None` on a list terminator.
    fn decode_item(&mut self) -> Result<Option<Value>> {
        let byte = self.read_byte()?;
        let value = match self.registry.resolve_typecode(byte)? {
            Typecode::Null => Value::Null,
            Typecode::Bool => {
                let offset = self.position;
                match self.read_byte()? {
                    TRUE_BYTE => Value::Bool(true),
                    FALSE_BYTE => Value::Bool(false),
                    other => {
                        return Err(Error::malformed_binary(
                            offset,
                            &format!("expected 0xff or 0x00 for bool, got 0x{:02x}", other),
                        ))
                    }
                }
            }
            Typecode::Int => Value::Int(varint::zigzag_decode(&self.read_uint()?)),
            Typecode::UInt => Value::UInt(self.read_uint()?),
            Typecode::Str => Value::Str(self.read_str_body()?),
            Typecode::Bytes => Value::Bytes(self.read_bytes_body()?.to_vec()),
            Typecode::List => {
                self.enter()?;
                let items = self.read_list_body()?;
                self.leave();
                Value::List(items)
            }
            Typecode::ListEnd => return Ok(None),
            Typecode::Dict => {
                self.enter()?;
                let dict = self.read_dict_body()?;
                self.leave();
                Value::Dict(dict)
            }
            Typecode::Obj => {
                self.enter()?;
                let obj = self.read_object_body()?;
                self.leave();
                Value::Object(obj)
            }
        };
        Ok(Some(value))
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(Error::DepthLimitExceeded(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_byte(&mut self) -> Result<u8> {
        match self.input.get(self.position) {
            Some(&byte) => {
                self.position += 1;
                Ok(byte)
            }
            None => Err(Error::malformed_binary(
                self.position,
                "unexpected end of input",
            )),
        }
    }

    fn read_uint(&mut self) -> Result<BigUint> {
        let start = self.position;
        match varint::read_uint(&self.input[start..]) {
            ReadUint::Complete {
                value,
                len,
                minimal,
            } => {
                if self.options.canonical && !minimal {
                    return Err(Error::malformed_binary(start, "non-minimal varint"));
                }
                self.position += len;
                Ok(value)
            }
            ReadUint::Truncated => Err(Error::malformed_binary(
                self.input.len(),
                "unexpected end of input inside varint",
            )),
        }
    }

    fn read_bytes_body(&mut self) -> Result<&'de [u8]> {
        let start = self.position;
        let remaining = self.input.len() - self.position;
        let len = self.read_uint()?;
        let len = match len.to_usize() {
            Some(len) if len <= remaining => len,
            _ => {
                return Err(Error::malformed_binary(
                    start,
                    &format!(
                        "declared length {} exceeds the {} bytes remaining",
                        len, remaining
                    ),
                ))
            }
        };
        let end = self.position + len;
        if end > self.input.len() {
            return Err(Error::malformed_binary(
                start,
                &format!("declared length {} exceeds the input", len),
            ));
        }
        let bytes = &self.input[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn read_str_body(&mut self) -> Result<String> {
        let start = self.position;
        let bytes = self.read_bytes_body()?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::malformed_binary(start, &format!("invalid UTF-8: {}", e)))?;
        if text.contains('\0') {
            return Err(Error::malformed_binary(start, "text contains U+0000"));
        }
        if self.options.canonical && !is_nfc(text) {
            return Err(Error::malformed_binary(start, "text is not NFC-normalized"));
        }
        Ok(text.to_string())
    }

    fn read_list_body(&mut self) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        while let Some(item) = self.decode_item()? {
            items.push(item);
        }
        Ok(items)
    }

    fn read_dict_body(&mut self) -> Result<Dict> {
        let mut dict = Dict::new();
        let mut previous: Option<String> = None;
        loop {
            let key_offset = self.position;
            let key = self.read_str_body()?;
            if key.is_empty() {
                return Ok(dict);
            }
            if dict.contains_key(&key) {
                return Err(Error::malformed_binary(
                    key_offset,
                    &format!("duplicate dict key {:?}", key),
                ));
            }
            if self.options.canonical && previous.as_deref().map_or(false, |p| p >= key.as_str())
            {
                return Err(Error::malformed_binary(
                    key_offset,
                    &format!("dict key {:?} is out of order", key),
                ));
            }
            let value = self.decode_value()?;
            previous = Some(key.clone());
            dict.insert(key, value);
        }
    }

    fn read_object_body(&mut self) -> Result<Object> {
        let name_offset = self.position;
        let name = self.read_str_body()?;
        let type_name = TypeName::new(name)?;

        let registry = self.registry;
        let rule = registry.resolve_type_name(type_name.as_str())?;
        if let Rule::Basic(code) = rule {
            return Err(Error::malformed_binary(
                name_offset,
                &format!("basic type name '{}' used as an object type", code.type_name()),
            ));
        }

        let fields = self.read_dict_body()?;
        match rule {
            Rule::Object(rule) => rule.instantiate(&type_name, fields),
            _ => {
                tracing::debug!(type_name = %type_name, "no rule registered, keeping unknown object");
                UnknownObjectRule.instantiate(&type_name, fields)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn encode(value: &Value) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.encode(value).unwrap();
        encoder.into_inner()
    }

    fn decode(bytes: &[u8]) -> Result<Value> {
        let registry = Registry::default();
        Decoder::new(&registry, bytes).decode_value()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(encode(&Value::Null), vec![0x00]);
        assert_eq!(encode(&Value::Bool(true)), vec![0x01, 0xff]);
        assert_eq!(encode(&Value::Bool(false)), vec![0x01, 0x00]);
        assert_eq!(encode(&Value::from(-1)), vec![0x02, 0x01]);
        assert_eq!(encode(&Value::UInt(BigUint::from(128u32))), vec![0x03, 0x80, 0x01]);
        assert_eq!(encode(&Value::from("hi")), vec![0x04, 0x02, b'h', b'i']);
        assert_eq!(encode(&Value::from(vec![0xaa_u8])), vec![0x05, 0x01, 0xaa]);
    }

    #[test]
    fn test_list_and_dict_framing() {
        assert_eq!(encode(&Value::List(vec![])), vec![0x07, 0x08]);
        assert_eq!(
            encode(&Value::list([1])),
            vec![0x07, 0x02, 0x02, 0x08]
        );
        assert_eq!(encode(&Value::Dict(Dict::new())), vec![0x06, 0x00]);

        let mut dict = Dict::new();
        dict.insert("b".to_string(), Value::Null);
        dict.insert("a".to_string(), Value::Bool(true));
        assert_eq!(
            encode(&Value::Dict(dict)),
            vec![0x06, 0x01, b'a', 0x01, 0xff, 0x01, b'b', 0x00, 0x00]
        );
    }

    #[test]
    fn test_decode_roundtrip() {
        let mut dict = Dict::new();
        dict.insert("n".to_string(), Value::Int(BigInt::from(-300)));
        dict.insert("l".to_string(), Value::list(["x", "y"]));
        let value = Value::Dict(dict);
        assert_eq!(decode(&encode(&value)).unwrap(), value);
    }

    #[test]
    fn test_invalid_bool() {
        assert!(matches!(
            decode(&[0x01, 0x01]),
            Err(Error::MalformedBinary { offset: 1, .. })
        ));
    }

    #[test]
    fn test_truncated_inputs() {
        assert!(matches!(decode(&[]), Err(Error::MalformedBinary { .. })));
        assert!(matches!(decode(&[0x05, 0x03, 0x00]), Err(Error::MalformedBinary { .. })));
        assert!(matches!(decode(&[0x02, 0x80]), Err(Error::MalformedBinary { .. })));
        assert!(matches!(decode(&[0x07, 0x00]), Err(Error::MalformedBinary { .. })));
        assert!(matches!(decode(&[0x06, 0x01, b'a']), Err(Error::MalformedBinary { .. })));
    }

    #[test]
    fn test_stray_list_end() {
        assert!(matches!(
            decode(&[0x08]),
            Err(Error::MalformedBinary { offset: 0, .. })
        ));
    }

    #[test]
    fn test_text_checks() {
        assert!(matches!(decode(&[0x04, 0x01, 0xff]), Err(Error::MalformedBinary { .. })));
        assert!(matches!(decode(&[0x04, 0x01, 0x00]), Err(Error::MalformedBinary { .. })));

        let mut encoder = Encoder::new();
        assert!(matches!(
            encoder.encode(&Value::from("a\0b")),
            Err(Error::InvalidString(_))
        ));
    }

    #[test]
    fn test_duplicate_dict_key() {
        let bytes = [0x06, 0x01, b'a', 0x00, 0x01, b'a', 0x00, 0x00];
        assert!(matches!(decode(&bytes), Err(Error::MalformedBinary { offset: 4, .. })));
    }

    #[test]
    fn test_canonical_mode() {
        let registry = Registry::default();
        let strict = DecodeOptions::canonical();

        // keys out of order
        let unsorted = [0x06, 0x01, b'b', 0x00, 0x01, b'a', 0x00, 0x00];
        assert!(decode(&unsorted).is_ok());
        assert!(Decoder::with_options(&registry, &unsorted, strict.clone())
            .decode_value()
            .is_err());

        // decomposed "é"
        let decomposed = [0x04, 0x03, b'e', 0xcc, 0x81];
        assert!(decode(&decomposed).is_ok());
        assert!(Decoder::with_options(&registry, &decomposed, strict)
            .decode_value()
            .is_err());
    }

    #[test]
    fn test_depth_limit() {
        let registry = Registry::default();
        let nested = [0x07, 0x07, 0x07, 0x08, 0x08, 0x08];
        let options = DecodeOptions::new().with_max_depth(2);
        assert_eq!(
            Decoder::with_options(&registry, &nested, options).decode_value(),
            Err(Error::DepthLimitExceeded(2))
        );
        let options = DecodeOptions::new().with_max_depth(3);
        assert!(Decoder::with_options(&registry, &nested, options)
            .decode_value()
            .is_ok());
    }

    #[test]
    fn test_decoder_usable_after_nested_error() {
        let registry = Registry::default();
        let options = DecodeOptions::new().with_max_depth(2);
        // [[<0xff>  then  [[]]
        let bytes = [0x07, 0x07, 0xff, 0x07, 0x07, 0x08, 0x08];
        let mut decoder = Decoder::with_options(&registry, &bytes, options);

        assert_eq!(decoder.decode_value(), Err(Error::UnknownTypecode(0xff)));
        assert_eq!(decoder.position(), 3);
        assert_eq!(
            decoder.decode_value().unwrap(),
            Value::List(vec![Value::List(vec![])])
        );
        assert!(decoder.is_at_end());
    }

    #[test]
    fn test_object_with_basic_name_rejected() {
        // obj "dict" {}
        let bytes = [0x09, 0x04, b'd', b'i', b'c', b't', 0x00];
        assert!(matches!(decode(&bytes), Err(Error::MalformedBinary { offset: 1, .. })));
    }

    #[test]
    fn test_object_with_invalid_name_rejected() {
        let bytes = [0x09, 0x03, b'a', b' ', b'b', 0x00];
        assert!(matches!(decode(&bytes), Err(Error::InvalidTypeName { .. })));
    }
}
