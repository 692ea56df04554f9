//! # JSON Value Abstraction
//!
//! The engine never talks to a concrete JSON library. It only needs a parsed tree
//! it can walk: look up a child by key or index, read the key at an index, resolve
//! a node into a scalar (or a handle to a nested container) and ask for a length.
//! [`JsonNode`] is that capability set and [`JsonBackend`] produces trees from text.
//!
//! Releasing a parsed tree is dropping the [`JsonBackend::Document`].
//!
//! A ready-made backend over `serde_json` is provided as [`SerdeJsonBackend`].

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

/// Type tag of a JSON value, shared by formal signatures and resolved values.
///
/// The single-character codes are the ones used in parameter signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Number,
    Boolean,
    String,
    Array,
    Object,
    Null,
    Undefined,
}

impl JsonType {
    /// All type codes accepted in a signature, in declaration order
    pub const CODES: &'static str = "ibsaonu";

    pub fn code(&self) -> char {
        match self {
            JsonType::Number => 'i',
            JsonType::Boolean => 'b',
            JsonType::String => 's',
            JsonType::Array => 'a',
            JsonType::Object => 'o',
            JsonType::Null => 'n',
            JsonType::Undefined => 'u',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'i' => Some(JsonType::Number),
            'b' => Some(JsonType::Boolean),
            's' => Some(JsonType::String),
            'a' => Some(JsonType::Array),
            'o' => Some(JsonType::Object),
            'n' => Some(JsonType::Null),
            'u' => Some(JsonType::Undefined),
            _ => None,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonType::Number => "number",
            JsonType::Boolean => "boolean",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
            JsonType::Null => "null",
            JsonType::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// A node resolved into something the engine can inspect.
///
/// Strings borrow from the parsed tree; arrays and objects stay as handles into
/// it so nested data is only walked by the procedures that want it.
#[derive(Debug, Clone, Copy)]
pub enum JsonValue<'a> {
    Number(f64),
    Boolean(bool),
    String(&'a str),
    Array(&'a dyn JsonNode),
    Object(&'a dyn JsonNode),
    Null,
    Undefined,
}

impl<'a> JsonValue<'a> {
    pub fn json_type(&self) -> JsonType {
        match self {
            JsonValue::Number(_) => JsonType::Number,
            JsonValue::Boolean(_) => JsonType::Boolean,
            JsonValue::String(_) => JsonType::String,
            JsonValue::Array(_) => JsonType::Array,
            JsonValue::Object(_) => JsonType::Object,
            JsonValue::Null => JsonType::Null,
            JsonValue::Undefined => JsonType::Undefined,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Handle to the nested array or object, if this is one
    pub fn as_node(&self) -> Option<&'a dyn JsonNode> {
        match self {
            JsonValue::Array(node) | JsonValue::Object(node) => Some(*node),
            _ => None,
        }
    }

    /// Copy this value (and everything beneath it) into an owned `serde_json::Value`.
    ///
    /// Returns `None` if any nested node cannot be resolved.
    pub fn to_value(&self) -> Option<Value> {
        Some(match self {
            JsonValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            JsonValue::Boolean(b) => Value::Bool(*b),
            JsonValue::String(s) => Value::String((*s).to_string()),
            JsonValue::Null | JsonValue::Undefined => Value::Null,
            JsonValue::Array(node) => Value::Array(
                (0..node.len())
                    .map(|i| node.get_at(i)?.resolve()?.to_value())
                    .collect::<Option<Vec<_>>>()?,
            ),
            JsonValue::Object(node) => {
                let mut map = Map::new();
                for i in 0..node.len() {
                    let key = node.key_at(i)?;
                    let value = node.get_at(i)?.resolve()?.to_value()?;
                    map.insert(key.to_string(), value);
                }
                Value::Object(map)
            }
        })
    }
}

/// Read-only view of one node in a parsed JSON tree.
///
/// Object members are addressed by position as well as by key: `get_at(i)` and
/// `key_at(i)` must describe the same member.
pub trait JsonNode: fmt::Debug {
    /// Child of an object by key
    fn get(&self, key: &str) -> Option<&dyn JsonNode>;

    /// Child of an array or object by position
    fn get_at(&self, index: usize) -> Option<&dyn JsonNode>;

    /// Key of the object member at `index`
    fn key_at(&self, index: usize) -> Option<&str>;

    /// Resolve this node into a scalar or container handle. `None` means the
    /// backend could not produce a valid value for it.
    fn resolve(&self) -> Option<JsonValue<'_>>;

    /// Number of members or elements; zero for scalars
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pluggable JSON parser producing trees the engine can walk.
pub trait JsonBackend {
    /// Owned parsed tree; its root is the top-level value.
    type Document: JsonNode;

    /// Parse `text`, or `None` if it is not valid JSON.
    fn parse(&self, text: &str) -> Option<Self::Document>;
}

/// [`JsonBackend`] built on `serde_json`.
///
/// Object member order follows the input text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonBackend;

impl JsonBackend for SerdeJsonBackend {
    type Document = Value;

    fn parse(&self, text: &str) -> Option<Value> {
        match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(error = %e, "Rejecting malformed JSON text");
                None
            }
        }
    }
}

impl JsonNode for Value {
    fn get(&self, key: &str) -> Option<&dyn JsonNode> {
        self.as_object()?.get(key).map(|v| v as &dyn JsonNode)
    }

    fn get_at(&self, index: usize) -> Option<&dyn JsonNode> {
        match self {
            Value::Array(items) => items.get(index).map(|v| v as &dyn JsonNode),
            Value::Object(map) => map.values().nth(index).map(|v| v as &dyn JsonNode),
            _ => None,
        }
    }

    fn key_at(&self, index: usize) -> Option<&str> {
        self.as_object()?.keys().nth(index).map(String::as_str)
    }

    fn resolve(&self) -> Option<JsonValue<'_>> {
        Some(match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Boolean(*b),
            Value::Number(n) => JsonValue::Number(n.as_f64()?),
            Value::String(s) => JsonValue::String(s),
            Value::Array(_) => JsonValue::Array(self),
            Value::Object(_) => JsonValue::Object(self),
        })
    }

    fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(text: &str) -> Value {
        SerdeJsonBackend.parse(text).expect("valid JSON")
    }

    #[test]
    fn test_type_codes_round_trip() {
        for code in JsonType::CODES.chars() {
            let ty = JsonType::from_code(code).unwrap();
            assert_eq!(ty.code(), code);
        }
        assert_eq!(JsonType::from_code('x'), None);
    }

    #[test]
    fn test_object_access_keeps_input_order() {
        let doc = parse(r#"{"zeta": 1, "alpha": "two", "mid": [3]}"#);
        let root: &dyn JsonNode = &doc;

        assert_eq!(root.len(), 3);
        assert_eq!(root.key_at(0), Some("zeta"));
        assert_eq!(root.key_at(1), Some("alpha"));
        assert_eq!(root.get_at(1).and_then(|n| n.resolve()).and_then(|v| v.as_str()), Some("two"));
        assert_eq!(root.get("mid").map(|n| n.len()), Some(1));
        assert!(root.get("missing").is_none());
        assert!(root.key_at(3).is_none());
    }

    #[test]
    fn test_resolve_scalars_and_containers() {
        let doc = parse(r#"[1.5, true, "s", [], {}, null]"#);
        let root: &dyn JsonNode = &doc;
        let types: Vec<JsonType> = (0..root.len())
            .map(|i| root.get_at(i).unwrap().resolve().unwrap().json_type())
            .collect();
        assert_eq!(
            types,
            vec![
                JsonType::Number,
                JsonType::Boolean,
                JsonType::String,
                JsonType::Array,
                JsonType::Object,
                JsonType::Null
            ]
        );
        assert!(root.key_at(0).is_none());
    }

    #[test]
    fn test_to_value_copies_nested_data() {
        let doc = parse(r#"{"a": [1, {"b": false}], "c": "x"}"#);
        let value = (&doc as &dyn JsonNode).resolve().unwrap().to_value().unwrap();
        assert_eq!(value, json!({"a": [1.0, {"b": false}], "c": "x"}));
    }

    #[test]
    fn test_malformed_text_is_rejected() {
        assert!(SerdeJsonBackend.parse(r#"{"jsonrpc": "2.0", "method""#).is_none());
        assert!(SerdeJsonBackend.parse("not valid json").is_none());
    }
}
