use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error_codes;
use crate::types::{JsonRpcVersion, RequestId};

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    /// The engine could not obtain memory for a buffer or parameter list.
    OutOfMemory,
    /// A decoded value could not be read back from the JSON backend.
    ServerInternal,
    ServerError(i64), // -32099 to -32000
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::InternalError => error_codes::INTERNAL_ERROR,
            JsonRpcErrorCode::OutOfMemory => error_codes::SERVER_OUT_OF_MEMORY,
            JsonRpcErrorCode::ServerInternal => error_codes::SERVER_INTERNAL,
            JsonRpcErrorCode::ServerError(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::InternalError => "Internal error",
            JsonRpcErrorCode::OutOfMemory => "Server: Out of memory",
            JsonRpcErrorCode::ServerInternal => "Server: Internal error",
            JsonRpcErrorCode::ServerError(_) => "Unknown error",
        }
    }

    /// Map a raw numeric code back onto the enum; unknown codes inside the
    /// server band become [`JsonRpcErrorCode::ServerError`].
    pub fn from_code(code: i64) -> Option<Self> {
        let known = [
            JsonRpcErrorCode::ParseError,
            JsonRpcErrorCode::InvalidRequest,
            JsonRpcErrorCode::MethodNotFound,
            JsonRpcErrorCode::InvalidParams,
            JsonRpcErrorCode::InternalError,
            JsonRpcErrorCode::OutOfMemory,
            JsonRpcErrorCode::ServerInternal,
        ];
        known
            .into_iter()
            .find(|c| c.code() == code)
            .or_else(|| {
                (error_codes::SERVER_ERROR_START..=error_codes::SERVER_ERROR_END)
                    .contains(&code)
                    .then_some(JsonRpcErrorCode::ServerError(code))
            })
    }

    /// Whether an error of this kind is reported even when no request id could
    /// be extracted. The server must not reply to anything else without an id.
    pub fn replies_without_id(&self) -> bool {
        matches!(
            self,
            JsonRpcErrorCode::ParseError | JsonRpcErrorCode::InvalidRequest
        )
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for JsonRpcErrorCode {}

/// JSON-RPC Error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorObject {
    pub fn new(code: JsonRpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }
}

impl From<JsonRpcErrorCode> for JsonRpcErrorObject {
    fn from(code: JsonRpcErrorCode) -> Self {
        Self::new(code, None, None)
    }
}

/// JSON-RPC Error response
///
/// Field order matches what goes on the wire: `jsonrpc`, `error`, `id`. A missing
/// id is written as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub error: JsonRpcErrorObject,
    pub id: Option<RequestId>,
}

impl JsonRpcError {
    pub fn new(id: Option<RequestId>, error: JsonRpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            error,
            id,
        }
    }

    pub fn from_code(code: JsonRpcErrorCode, id: Option<RequestId>) -> Self {
        Self::new(id, code.into())
    }

    pub fn parse_error() -> Self {
        Self::from_code(JsonRpcErrorCode::ParseError, None)
    }

    pub fn invalid_request() -> Self {
        Self::from_code(JsonRpcErrorCode::InvalidRequest, None)
    }

    pub fn method_not_found(id: Option<RequestId>) -> Self {
        Self::from_code(JsonRpcErrorCode::MethodNotFound, id)
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "JSON-RPC Error {}: {}",
            self.error.code, self.error.message
        )
    }
}

impl std::error::Error for JsonRpcError {}

/// Problems with a parameter signature string given at registration time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("unknown parameter type '{0}'")]
    UnknownType(char),

    #[error("malformed 'name:type' pair '{0}'")]
    MalformedPair(String),

    #[error("signature declares more than {max} parameters")]
    Overflow { max: usize },
}

/// Errors returned by procedure registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("invalid signature for '{method}': {source}")]
    InvalidSignature {
        method: String,
        #[source]
        source: SignatureError,
    },

    #[error("out of memory while registering '{method}'")]
    OutOfMemory { method: String },
}

impl RegistrationError {
    /// Numeric code reported for this failure by the flat registration API.
    pub fn code(&self) -> JsonRpcErrorCode {
        match self {
            RegistrationError::InvalidSignature { .. } => JsonRpcErrorCode::InvalidParams,
            RegistrationError::OutOfMemory { .. } => JsonRpcErrorCode::OutOfMemory,
        }
    }
}

/// Transport-level errors for moving messages in and out of the engine
#[derive(Debug, Error)]
pub enum JsonRpcTransportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("transport closed")]
    Closed,

    #[error("Protocol error: {0}")]
    ProtocolError(String),
}
