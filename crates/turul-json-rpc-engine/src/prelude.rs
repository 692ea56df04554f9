//! # JSON-RPC Engine Prelude
//!
//! Convenient re-exports of the types needed to register procedures and
//! execute requests.
//!
//! ```rust
//! use turul_json_rpc_engine::prelude::*;
//! ```

// Server and procedures
pub use crate::config::ServerConfig;
pub use crate::dispatch::Server;
pub use crate::params::ActualParameter;
pub use crate::registry::ProcedureHandler;
pub use crate::response::ResultWriter;

// Core JSON-RPC types
pub use crate::error::{JsonRpcError, JsonRpcErrorCode, RegistrationError};
pub use crate::types::{JsonRpcVersion, RequestId};
pub use crate::value::{JsonBackend, JsonNode, JsonType, JsonValue, SerdeJsonBackend};

#[cfg(feature = "async")]
pub use crate::r#async::{MessageTransport, StreamTransport, serve};

// Standard error codes
pub use crate::error_codes::*;
