use tracing::trace;

use crate::error::JsonRpcErrorCode;
use crate::types::{JsonRpcVersion, RequestId};
use crate::value::{JsonNode, JsonValue};

/// Parameters for a JSON-RPC request, as handles into the parsed tree
#[derive(Debug, Clone, Copy)]
pub enum RequestParams<'a> {
    /// Positional parameters as an array
    Array(&'a dyn JsonNode),
    /// Named parameters as an object
    Object(&'a dyn JsonNode),
}

impl<'a> RequestParams<'a> {
    pub fn node(&self) -> &'a dyn JsonNode {
        match self {
            RequestParams::Array(node) | RequestParams::Object(node) => *node,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, RequestParams::Object(_))
    }

    pub fn len(&self) -> usize {
        self.node().len()
    }

    pub fn is_empty(&self) -> bool {
        self.node().is_empty()
    }
}

/// A validated JSON-RPC request, borrowed from the parsed tree it came from.
#[derive(Debug, Clone)]
pub struct JsonRpcRequest<'a> {
    pub version: JsonRpcVersion,
    pub method: &'a str,
    pub params: Option<RequestParams<'a>>,
    /// `None` marks a notification
    pub id: Option<RequestId>,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Check the shape of a request object.
    ///
    /// `jsonrpc` must be the string `"2.0"`, `method` a string, `params` (if
    /// present) an array or object and `id` (if present) a number or string.
    /// Unknown members are ignored. Every violation is
    /// [`JsonRpcErrorCode::InvalidRequest`].
    pub fn validate(request: &'a dyn JsonNode) -> Result<Self, JsonRpcErrorCode> {
        let invalid = |reason: &'static str| {
            trace!(reason, "Invalid request object");
            JsonRpcErrorCode::InvalidRequest
        };

        let version = member(request, "jsonrpc")
            .and_then(|v| v.as_str())
            .and_then(JsonRpcVersion::parse)
            .ok_or_else(|| invalid("jsonrpc must be \"2.0\""))?;

        let method = member(request, "method")
            .and_then(|v| v.as_str())
            .ok_or_else(|| invalid("method must be a string"))?;

        let params = match member(request, "params") {
            None => None,
            Some(JsonValue::Array(node)) => Some(RequestParams::Array(node)),
            Some(JsonValue::Object(node)) => Some(RequestParams::Object(node)),
            Some(_) => return Err(invalid("params must be an array or object")),
        };

        let id = match member(request, "id") {
            None => None,
            Some(JsonValue::Number(n)) => Some(RequestId::Number(n)),
            Some(JsonValue::String(s)) => Some(RequestId::String(s.to_string())),
            Some(_) => return Err(invalid("id must be a number or string")),
        };

        Ok(Self {
            version,
            method,
            params,
            id,
        })
    }
}

/// A member that is missing or cannot be resolved is treated as absent.
fn member<'a>(node: &'a dyn JsonNode, key: &str) -> Option<JsonValue<'a>> {
    node.get(key)?.resolve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn validate(value: &Value) -> Result<JsonRpcRequest<'_>, JsonRpcErrorCode> {
        JsonRpcRequest::validate(value)
    }

    #[test]
    fn test_valid_call_with_positional_params() {
        let doc = json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1});
        let request = validate(&doc).unwrap();

        assert_eq!(request.version, JsonRpcVersion::V2_0);
        assert_eq!(request.method, "subtract");
        assert_eq!(request.id, Some(RequestId::Number(1.0)));
        let params = request.params.unwrap();
        assert!(!params.is_named());
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_notification_without_params() {
        let doc = json!({"jsonrpc": "2.0", "method": "foobar", "extra": true});
        let request = validate(&doc).unwrap();

        assert!(request.is_notification());
        assert!(request.params.is_none());
    }

    #[test]
    fn test_string_id_and_named_params() {
        let doc = json!({"jsonrpc": "2.0", "method": "m", "params": {"a": 1}, "id": "abc"});
        let request = validate(&doc).unwrap();

        assert_eq!(request.id, Some(RequestId::from("abc")));
        assert!(request.params.unwrap().is_named());
    }

    #[test]
    fn test_invalid_shapes() {
        let cases = [
            json!({"method": "m"}),
            json!({"jsonrpc": "1.0", "method": "m"}),
            json!({"jsonrpc": 2.0, "method": "m"}),
            json!({"jsonrpc": "2.0"}),
            json!({"jsonrpc": "2.0", "method": 1, "params": "bar"}),
            json!({"jsonrpc": "2.0", "method": "m", "params": "bar"}),
            json!({"jsonrpc": "2.0", "method": "m", "params": 3}),
            json!({"jsonrpc": "2.0", "method": "m", "id": null}),
            json!({"jsonrpc": "2.0", "method": "m", "id": [1]}),
            json!(1),
            json!({"foo": "boo"}),
        ];
        for case in &cases {
            assert_eq!(
                validate(case).unwrap_err(),
                JsonRpcErrorCode::InvalidRequest,
                "{case} should be rejected"
            );
        }
    }
}
