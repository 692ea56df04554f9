use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use crate::buffer::OutputBuffer;
use crate::error::{JsonRpcError, JsonRpcErrorCode};
use crate::types::{JsonRpcVersion, RequestId, write_json_string, write_number};

/// Sink a procedure writes its result into.
///
/// Text is copied verbatim into the `result` member of the response, so a
/// procedure either writes one complete JSON value by hand or uses the typed
/// helpers. Writing nothing yields `"result":null`.
pub struct ResultWriter<'b> {
    buffer: &'b mut OutputBuffer,
}

impl<'b> ResultWriter<'b> {
    pub fn new(buffer: &'b mut OutputBuffer) -> Self {
        Self { buffer }
    }

    /// Append raw JSON text
    pub fn write_raw(&mut self, json: &str) {
        self.buffer.push_str(json);
    }

    pub fn write_number(&mut self, n: f64) {
        let _ = write_number(&mut *self.buffer, n);
    }

    /// Append `s` as a quoted, escaped JSON string
    pub fn write_string(&mut self, s: &str) {
        let _ = write_json_string(&mut *self.buffer, s);
    }

    pub fn write_bool(&mut self, b: bool) {
        self.buffer.push_str(if b { "true" } else { "false" });
    }

    pub fn write_null(&mut self) {
        self.buffer.push_str("null");
    }

    /// Serialize `value` with serde
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), JsonRpcErrorCode> {
        let json = serde_json::to_string(value).map_err(|e| {
            warn!(error = %e, "Failed to serialize procedure result");
            JsonRpcErrorCode::InternalError
        })?;
        self.buffer.push_str(&json);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Write for ResultWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

/// Append a success response carrying `result` verbatim.
///
/// An empty `result` is written as `null`.
pub fn write_success(out: &mut OutputBuffer, result: &str, id: &RequestId) {
    out.push_str(r#"{"jsonrpc":"2.0","result":"#);
    out.push_str(if result.is_empty() { "null" } else { result });
    out.push_str(r#","id":"#);
    let _ = id.write_json(out);
    out.push('}');
}

/// Append an error response.
///
/// Member order is `jsonrpc`, `error`, `id`; a missing id is written as `null`.
pub fn write_error(out: &mut OutputBuffer, error: &JsonRpcError) {
    match serde_json::to_string(error) {
        Ok(json) => out.push_str(&json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize error response");
            out.push_str(INTERNAL_ERROR_RESPONSE);
        }
    }
}

/// Fallback for an error object that cannot be serialized
const INTERNAL_ERROR_RESPONSE: &str =
    r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Internal error"},"id":null}"#;

/// Append the error response for `code`, unless it must be suppressed.
///
/// Without an id only parse errors and invalid requests are reported; anything
/// else stays silent. Returns whether a response was written.
pub fn write_error_response(
    out: &mut OutputBuffer,
    code: JsonRpcErrorCode,
    id: Option<&RequestId>,
) -> bool {
    if id.is_none() && !code.replies_without_id() {
        trace!(%code, "Suppressing error response without request id");
        return false;
    }
    write_error(out, &JsonRpcError::from_code(code, id.cloned()));
    true
}

/// A successful JSON-RPC response, as decoded by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

impl JsonRpcResponse {
    pub fn new(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id,
        }
    }
}

/// Either kind of response message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Response(JsonRpcResponse),
    Error(JsonRpcError),
}

impl JsonRpcMessage {
    pub fn success(id: RequestId, result: Value) -> Self {
        JsonRpcMessage::Response(JsonRpcResponse::new(id, result))
    }

    pub fn error(error: JsonRpcError) -> Self {
        JsonRpcMessage::Error(error)
    }

    pub fn id(&self) -> Option<&RequestId> {
        match self {
            JsonRpcMessage::Response(response) => Some(&response.id),
            JsonRpcMessage::Error(error) => error.id.as_ref(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, JsonRpcMessage::Error(_))
    }

    /// Error code, for error messages
    pub fn error_code(&self) -> Option<i64> {
        match self {
            JsonRpcMessage::Response(_) => None,
            JsonRpcMessage::Error(error) => Some(error.error.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonRpcErrorObject;
    use serde_json::json;

    #[test]
    fn test_success_layout() {
        let mut out = OutputBuffer::new();
        write_success(&mut out, "19", &RequestId::from(1));
        assert_eq!(out.as_str(), r#"{"jsonrpc":"2.0","result":19,"id":1}"#);

        out.rewind();
        write_success(&mut out, "", &RequestId::from("a\"b"));
        assert_eq!(out.as_str(), r#"{"jsonrpc":"2.0","result":null,"id":"a\"b"}"#);
    }

    #[test]
    fn test_error_layout_matches_serde() {
        let error = JsonRpcError::from_code(JsonRpcErrorCode::InvalidParams, Some(RequestId::from(7)));
        let mut out = OutputBuffer::new();
        write_error(&mut out, &error);

        assert_eq!(
            out.as_str(),
            r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"},"id":7}"#
        );
        assert_eq!(out.as_str(), serde_json::to_string(&error).unwrap());
    }

    #[test]
    fn test_error_strings_are_escaped_like_serde() {
        let object = JsonRpcErrorObject::new(
            JsonRpcErrorCode::InternalError,
            Some("bad\u{8}\"input\"".to_string()),
            None,
        );
        let error = JsonRpcError::new(Some(RequestId::from("tab\there")), object);
        let mut out = OutputBuffer::new();
        write_error(&mut out, &error);

        assert_eq!(
            out.as_str(),
            r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"bad\b\"input\""},"id":"tab\there"}"#
        );
        assert_eq!(out.as_str(), serde_json::to_string(&error).unwrap());
    }

    #[test]
    fn test_error_data_is_included() {
        let mut error = JsonRpcError::parse_error();
        error.error.data = Some(json!({"offset": 3}));
        let mut out = OutputBuffer::new();
        write_error(&mut out, &error);

        let decoded: Value = serde_json::from_str(out.as_str()).unwrap();
        assert_eq!(decoded["error"]["data"], json!({"offset": 3}));
        assert_eq!(decoded["id"], Value::Null);
    }

    #[test]
    fn test_errors_without_id_are_suppressed() {
        let mut out = OutputBuffer::new();
        assert!(!write_error_response(&mut out, JsonRpcErrorCode::MethodNotFound, None));
        assert!(!write_error_response(&mut out, JsonRpcErrorCode::ServerInternal, None));
        assert!(out.is_empty());

        assert!(write_error_response(&mut out, JsonRpcErrorCode::InvalidRequest, None));
        assert!(out.as_str().ends_with(r#""id":null}"#));

        out.rewind();
        let id = RequestId::from(3);
        assert!(write_error_response(&mut out, JsonRpcErrorCode::MethodNotFound, Some(&id)));
    }

    #[test]
    fn test_result_writer_helpers() {
        let mut buffer = OutputBuffer::new();
        let mut writer = ResultWriter::new(&mut buffer);
        assert!(writer.is_empty());

        writer.write_raw("[");
        writer.write_number(19.0);
        writer.write_raw(",");
        writer.write_string("x\ny");
        writer.write_raw(",");
        writer.write_bool(true);
        writer.write_raw(",");
        writer.write_null();
        writer.write_raw(",");
        writer.write_json(&json!({"k": 1})).unwrap();
        writer.write_raw("]");

        assert_eq!(buffer.as_str(), r#"[19,"x\ny",true,null,{"k":1}]"#);
    }

    #[test]
    fn test_decode_messages() {
        let ok: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","result":19,"id":1}"#).unwrap();
        assert!(!ok.is_error());
        assert_eq!(ok.id(), Some(&RequestId::from(1)));

        let err: JsonRpcMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","error":{"code":-32600,"message":"Invalid Request"},"id":null}"#,
        )
        .unwrap();
        assert_eq!(err.error_code(), Some(-32600));
        assert_eq!(err.id(), None);
    }
}
