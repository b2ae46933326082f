/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// Leaves go through `Value::from`, so integers, text, byte vectors and
/// options all work; nested `[...]` and `{...}` become lists and dicts.
///
/// ```rust
/// use serde_ots::{ots, Value};
///
/// let value = ots!({
///     "name": "Alice",
///     "tags": ["a", "b"],
///     "raw": (vec![0xffu8]),
///     "parent": null
/// });
/// assert_eq!(value.as_dict().unwrap().len(), 4);
/// ```
#[macro_export]
macro_rules! ots {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::List(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::List(vec![$($crate::ots!($elem)),*])
    };

    ({}) => {
        $crate::Value::Dict($crate::Dict::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut dict = $crate::Dict::new();
        $(
            dict.insert($key.to_string(), $crate::ots!($value));
        )*
        $crate::Value::Dict(dict)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}

/// Implements [`TypedObject`](crate::TypedObject) for a serde type.
///
/// Every field the type serializes becomes an object field, and decoding
/// goes back through `Deserialize`. The type must serialize to a dict (a
/// struct with named fields or a map).
///
/// Decoding a registered object fails unless the rebuilt value projects back
/// onto exactly the fields that were read: unknown fields, missing fields and
/// fields whose type would change are all errors. Serde writes `Vec<u8>` as a
/// list of integers, so byte fields such as digests need
/// `#[serde(with = "serde_bytes")]` to be written as `bytes`.
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use serde_ots::{from_slice, to_bytes, typed_object, Registry, Value};
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct Attestation {
///     height: u64,
/// }
///
/// typed_object!(Attestation, "org.example.Attestation");
///
/// let registry = Registry::builder().register::<Attestation>().unwrap().build();
/// let bytes = to_bytes(&Value::from(serde_ots::Object::new(Attestation { height: 7 }))).unwrap();
///
/// let decoded = from_slice(&registry, &bytes).unwrap();
/// let obj = decoded.as_object().unwrap();
/// assert_eq!(obj.downcast_ref::<Attestation>(), Some(&Attestation { height: 7 }));
/// ```
#[macro_export]
macro_rules! typed_object {
    ($ty:ty, $name:expr) => {
        impl $crate::TypedObject for $ty {
            const TYPE_NAME: &'static str = $name;

            fn to_fields(&self) -> $crate::Result<$crate::Dict> {
                match $crate::to_value(self)? {
                    $crate::Value::Dict(fields) => Ok(fields),
                    other => Err($crate::Error::unknown_type(&format!(
                        "{} must serialize to a dict, not {}",
                        $name,
                        other.type_name()
                    ))),
                }
            }

            fn from_fields(fields: $crate::Dict) -> $crate::Result<Self> {
                $crate::from_value($crate::Value::Dict(fields))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{Dict, Error, Object, TypedObject, Value};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pair {
        left: i32,
        right: String,
    }

    typed_object!(Pair, "test.Pair");

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapped(u8);

    typed_object!(Wrapped, "test.Wrapped");

    #[test]
    fn test_ots_macro_primitives() {
        assert_eq!(ots!(null), Value::Null);
        assert_eq!(ots!(true), Value::Bool(true));
        assert_eq!(ots!(false), Value::Bool(false));
        assert_eq!(ots!(42), Value::from(42));
        assert_eq!(ots!("hello"), Value::Str("hello".to_string()));
    }

    #[test]
    fn test_ots_macro_lists() {
        assert_eq!(ots!([]), Value::List(vec![]));
        assert_eq!(ots!([1, 2, 3]), Value::list([1, 2, 3]));
        assert_eq!(ots!([[true], null]), Value::List(vec![Value::list([true]), Value::Null]));
    }

    #[test]
    fn test_ots_macro_dicts() {
        assert_eq!(ots!({}), Value::Dict(Dict::new()));

        let value = ots!({
            "name": "Alice",
            "age": 30
        });
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("name"), Some(&Value::from("Alice")));
        assert_eq!(dict.get("age"), Some(&Value::from(30)));
    }

    #[test]
    fn test_typed_object_fields() {
        let pair = Pair {
            left: -1,
            right: "r".to_string(),
        };
        let fields = pair.to_fields().unwrap();
        assert_eq!(fields.get("left"), Some(&Value::from(-1)));
        assert_eq!(Pair::from_fields(fields).unwrap(), pair);

        let obj = Object::new(pair);
        assert_eq!(obj.type_name(), "test.Pair");
    }

    #[test]
    fn test_typed_object_requires_dict() {
        assert!(matches!(Wrapped(1).to_fields(), Err(Error::UnknownType(_))));
    }
}
