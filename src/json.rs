//! JSON representation.
//!
//! JSON cannot tell text from binary data and has no type tags, so a few
//! conventions are layered on top of plain JSON trees:
//!
//! - Bytes become a string of `#` followed by lowercase hex.
//! - Text that starts with `#` or `\` gets one extra leading `\`.
//! - A JSON object with exactly one key is a *typed wrapper*
//!   `{"type_name": payload}`. Objects are written this way.
//! - A dict that would itself have exactly one key is therefore written as
//!   `{"dict": {...}}`.
//!
//! ```rust
//! use serde_json::json;
//! use serde_ots::{json::encode, Dict, Value};
//!
//! let mut dict = Dict::new();
//! dict.insert("x".to_string(), Value::from(1));
//!
//! assert_eq!(encode(&Value::from(vec![1u8, 2])).unwrap(), json!("#0102"));
//! assert_eq!(encode(&Value::from("#foo")).unwrap(), json!("\\#foo"));
//! assert_eq!(encode(&Value::Dict(dict)).unwrap(), json!({"dict": {"x": 1}}));
//! ```
//!
//! Integers travel as native JSON numbers and must fit in `i64` or `u64`;
//! larger magnitudes fail with [`Error::IntegerOutOfRange`].

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;
use serde_json::{Map, Number, Value as JsonValue};
use unicode_normalization::is_nfc;

use crate::object::UnknownObjectRule;
use crate::registry::{Rule, Typecode};
use crate::value::normalize_str;
use crate::{DecodeOptions, Dict, Error, Object, ObjectRule, Registry, Result, TypeName, Value};

const BYTES_PREFIX: char = '#';
const ESCAPE_PREFIX: char = '\\';
const DICT_WRAPPER: &str = "dict";

/// Converts a value into a JSON tree.
pub fn encode(value: &Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::Number(int_to_number(i)?),
        // Plain numbers decode as `int`, so keep the tag
        Value::UInt(u) => wrap(Typecode::UInt.type_name(), JsonValue::Number(uint_to_number(u)?)),
        Value::Str(s) => JsonValue::String(encode_str(s)?),
        Value::Bytes(b) => JsonValue::String(encode_bytes(b)),
        Value::List(items) => JsonValue::Array(items.iter().map(encode).collect::<Result<_>>()?),
        Value::Dict(dict) => {
            let map = encode_dict(dict)?;
            if map.len() == 1 {
                wrap(DICT_WRAPPER, JsonValue::Object(map))
            } else {
                JsonValue::Object(map)
            }
        }
        Value::Object(obj) => encode_object(obj)?,
    })
}

fn wrap(type_name: &str, payload: JsonValue) -> JsonValue {
    let mut map = Map::new();
    map.insert(type_name.to_string(), payload);
    JsonValue::Object(map)
}

fn int_to_number(i: &BigInt) -> Result<Number> {
    if let Some(n) = i.to_i64() {
        Ok(Number::from(n))
    } else if let Some(n) = i.to_u64() {
        Ok(Number::from(n))
    } else {
        Err(Error::IntegerOutOfRange(i.to_string()))
    }
}

fn uint_to_number(u: &BigUint) -> Result<Number> {
    u.to_u64()
        .map(Number::from)
        .ok_or_else(|| Error::IntegerOutOfRange(u.to_string()))
}

fn encode_str(s: &str) -> Result<String> {
    let normalized = normalize_str(s)?;
    if normalized.starts_with(BYTES_PREFIX) || normalized.starts_with(ESCAPE_PREFIX) {
        let mut escaped = String::with_capacity(normalized.len() + 1);
        escaped.push(ESCAPE_PREFIX);
        escaped.push_str(&normalized);
        Ok(escaped)
    } else {
        Ok(normalized.into_owned())
    }
}

fn encode_bytes(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2 + 1);
    s.push(BYTES_PREFIX);
    s.push_str(&hex::encode(bytes));
    s
}

/// Encodes dict entries without the one-key wrapper.
fn encode_dict(dict: &Dict) -> Result<Map<String, JsonValue>> {
    let mut map = Map::new();
    for (key, value) in dict.canonical_entries()? {
        map.insert(key, encode(value)?);
    }
    Ok(map)
}

fn encode_object(obj: &Object) -> Result<JsonValue> {
    let name = obj.wire_type_name()?;
    let fields = encode_dict(&obj.fields()?)?;
    Ok(wrap(name.as_str(), JsonValue::Object(fields)))
}

/// Rebuilds values from JSON trees.
///
/// Typed wrappers are resolved against the [`Registry`]; unregistered type
/// names become [`UnknownObject`](crate::UnknownObject)s.
pub struct JsonDecoder<'r> {
    registry: &'r Registry,
    options: DecodeOptions,
    depth: usize,
}

impl<'r> JsonDecoder<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_options(registry, DecodeOptions::default())
    }

    pub fn with_options(registry: &'r Registry, options: DecodeOptions) -> Self {
        JsonDecoder {
            registry,
            options,
            depth: 0,
        }
    }

    /// Decodes one JSON tree.
    pub fn decode(&mut self, json: &JsonValue) -> Result<Value> {
        self.depth = 0;
        self.decode_value(json)
    }

    fn decode_value(&mut self, json: &JsonValue) -> Result<Value> {
        match json {
            JsonValue::Null => Ok(Value::Null),
            JsonValue::Bool(b) => Ok(Value::Bool(*b)),
            JsonValue::Number(n) => decode_int(n),
            JsonValue::String(s) => self.decode_str(s),
            JsonValue::Array(items) => {
                self.enter()?;
                let list = self.decode_list(items)?;
                self.leave();
                Ok(list)
            }
            JsonValue::Object(map) => {
                self.enter()?;
                let value = if map.len() == 1 {
                    self.decode_wrapper(map)?
                } else {
                    Value::Dict(self.decode_dict(map)?)
                };
                self.leave();
                Ok(value)
            }
        }
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

    fn check_text(&self, s: &str) -> Result<()> {
        if s.contains('\0') {
            return Err(Error::malformed_json(format!("text contains U+0000: {:?}", s)));
        }
        if self.options.canonical && !is_nfc(s) {
            return Err(Error::malformed_json(format!("text is not NFC-normalized: {:?}", s)));
        }
        Ok(())
    }

    fn decode_str(&self, s: &str) -> Result<Value> {
        if s.starts_with(BYTES_PREFIX) {
            let bytes = decode_bytes(s)?;
            if self.options.canonical && encode_bytes(&bytes) != s {
                return Err(Error::malformed_json(format!(
                    "bytes must use lowercase hex: {:?}",
                    s
                )));
            }
            return Ok(Value::Bytes(bytes));
        }
        let text = s.strip_prefix(ESCAPE_PREFIX).unwrap_or(s);
        self.check_text(text)?;
        if self.options.canonical && encode_str(text)? != s {
            return Err(Error::malformed_json(format!("unneeded escape in {:?}", s)));
        }
        Ok(Value::Str(text.to_string()))
    }

    fn decode_list(&mut self, items: &[JsonValue]) -> Result<Value> {
        items
            .iter()
            .map(|item| self.decode_value(item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }

    /// Decodes a JSON object as a dict, without treating it as a wrapper.
    fn decode_dict(&mut self, map: &Map<String, JsonValue>) -> Result<Dict> {
        let mut dict = Dict::with_capacity(map.len());
        for (key, value) in map {
            if key.is_empty() {
                return Err(Error::malformed_json("dict keys must not be empty"));
            }
            self.check_text(key)?;
            dict.insert(key.clone(), self.decode_value(value)?);
        }
        Ok(dict)
    }

    fn decode_wrapper(&mut self, map: &Map<String, JsonValue>) -> Result<Value> {
        let (name, payload) = match map.iter().next() {
            Some(entry) => entry,
            None => return Err(Error::malformed_json("typed wrapper has no key")),
        };

        let registry = self.registry;
        match registry.resolve_type_name(name)? {
            Rule::Basic(code) => self.decode_basic(code, payload),
            Rule::Object(rule) => self.decode_object(rule, name, payload),
            Rule::Unknown => {
                tracing::debug!(type_name = %name, "no rule registered, keeping unknown object");
                self.decode_object(&UnknownObjectRule, name, payload)
            }
        }
    }

    fn decode_object(
        &mut self,
        rule: &dyn ObjectRule,
        name: &str,
        payload: &JsonValue,
    ) -> Result<Value> {
        let type_name = TypeName::new(name)?;
        let fields = match payload {
            JsonValue::Object(map) => self.decode_dict(map)?,
            other => {
                return Err(Error::malformed_json(format!(
                    "fields of '{}' must be a JSON object, got {}",
                    type_name, other
                )))
            }
        };
        Ok(Value::Object(rule.instantiate(&type_name, fields)?))
    }

    /// Decodes `{"<basic type>": payload}`.
    fn decode_basic(&mut self, code: Typecode, payload: &JsonValue) -> Result<Value> {
        let mismatch = || {
            Error::malformed_json(format!(
                "wrapper '{}' does not accept {}",
                code.type_name(),
                payload
            ))
        };
        // The encoder only ever writes these two
        if self.options.canonical && !matches!(code, Typecode::UInt | Typecode::Dict) {
            return Err(Error::malformed_json(format!(
                "wrapper '{}' is not canonical",
                code.type_name()
            )));
        }
        match (code, payload) {
            (Typecode::Null, JsonValue::Null) => Ok(Value::Null),
            (Typecode::Bool, JsonValue::Bool(b)) => Ok(Value::Bool(*b)),
            (Typecode::Int, JsonValue::Number(n)) => decode_int(n),
            (Typecode::UInt, JsonValue::Number(n)) => n
                .as_u64()
                .map(|u| Value::UInt(BigUint::from(u)))
                .ok_or_else(mismatch),
            (Typecode::Str, JsonValue::String(s)) => self.decode_str(s),
            (Typecode::Bytes, JsonValue::String(s)) => decode_bytes(s).map(Value::Bytes),
            (Typecode::List, JsonValue::Array(items)) => self.decode_list(items),
            (Typecode::Dict, JsonValue::Object(map)) => {
                if self.options.canonical && map.len() != 1 {
                    return Err(Error::malformed_json(
                        "dict wrapper around a dict that does not have exactly one key",
                    ));
                }
                self.decode_dict(map).map(Value::Dict)
            }
            (Typecode::ListEnd, _) | (Typecode::Obj, _) => Err(Error::malformed_json(format!(
                "'{}' is not a valid typed wrapper",
                code.type_name()
            ))),
            _ => Err(mismatch()),
        }
    }
}

fn decode_int(n: &Number) -> Result<Value> {
    if let Some(i) = n.as_i64() {
        Ok(Value::Int(BigInt::from(i)))
    } else if let Some(u) = n.as_u64() {
        Ok(Value::Int(BigInt::from_biguint(Sign::Plus, BigUint::from(u))))
    } else {
        Err(Error::malformed_json(format!(
            "floating point numbers are not supported: {}",
            n
        )))
    }
}

fn decode_bytes(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix(BYTES_PREFIX).ok_or_else(|| {
        Error::malformed_json(format!("bytes must start with '{}': {:?}", BYTES_PREFIX, s))
    })?;
    hex::decode(digits).map_err(|e| Error::malformed_json(format!("invalid hex {:?}: {}", s, e)))
}
