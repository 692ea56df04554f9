//! # JSON-RPC 2.0 Dispatch Engine
//!
//! A synchronous, transport-agnostic JSON-RPC 2.0 server engine. Applications
//! register procedures under method names together with a parameter signature;
//! the engine takes a request text (one request or a batch), resolves each
//! request to a matching overload, invokes it and produces the response text.
//!
//! ## Features
//! - Full request validation and the standard error codes
//! - Batches, notifications and error suppression as the JSON-RPC 2.0 rules require
//! - Overloads selected by parameter types, for positional and named params
//! - Pluggable JSON parser behind [`JsonBackend`] (`serde_json` provided)
//! - Async transport glue with the `async` feature
//!
//! ## Example
//!
//! ```rust
//! use turul_json_rpc_engine::prelude::*;
//!
//! let mut server = Server::new();
//! server
//!     .register("subtract", true, Some("minuend:i, subtrahend:i"), |params, result| {
//!         let (a, b) = (params[0].as_f64(), params[1].as_f64());
//!         result.write_number(a.unwrap_or_default() - b.unwrap_or_default());
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let response = server.execute(
//!     r#"{"jsonrpc":"2.0","method":"subtract","params":{"subtrahend":23,"minuend":42},"id":3}"#,
//! );
//! assert_eq!(response.as_deref(), Some(r#"{"jsonrpc":"2.0","result":19,"id":3}"#));
//! ```

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod params;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod signature;
pub mod types;
pub mod value;

#[cfg(feature = "async")]
pub mod r#async;

// Re-export main types
pub use config::ServerConfig;
pub use dispatch::Server;
pub use error::{
    JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, JsonRpcTransportError, RegistrationError,
    SignatureError,
};
pub use params::ActualParameter;
pub use registry::{Procedure, ProcedureHandler, ProcedureRegistry};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessage, JsonRpcResponse, ResultWriter};
pub use signature::FormalParameter;
pub use types::{JsonRpcVersion, RequestId};
pub use value::{JsonBackend, JsonNode, JsonType, JsonValue, SerdeJsonBackend};

#[cfg(feature = "async")]
pub use r#async::{MessageTransport, StreamTransport, serve};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Engine-specific codes inside the server error range
    pub const SERVER_OUT_OF_MEMORY: i64 = -32098;
    pub const SERVER_INTERNAL: i64 = -32097;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
