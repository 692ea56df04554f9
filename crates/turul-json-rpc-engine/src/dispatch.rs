//! Request execution: parse, validate, resolve, bind, invoke, serialize.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::buffer::{BufferPool, OutputBuffer};
use crate::config::ServerConfig;
use crate::error::{JsonRpcErrorCode, RegistrationError};
use crate::params::{ActualParameter, extract_actuals, match_and_order};
use crate::registry::{ProcedureHandler, ProcedureRegistry};
use crate::request::JsonRpcRequest;
use crate::response::{ResultWriter, write_error_response, write_success};
use crate::value::{JsonBackend, JsonNode, JsonValue, SerdeJsonBackend};

/// A JSON-RPC 2.0 server: a procedure registry plus the machinery to execute
/// request texts against it.
///
/// Execution takes `&mut self`; a server handles one request text at a time.
#[derive(Debug)]
pub struct Server<B: JsonBackend = SerdeJsonBackend> {
    backend: B,
    registry: ProcedureRegistry,
    pool: BufferPool,
    config: ServerConfig,
}

impl Server<SerdeJsonBackend> {
    pub fn new() -> Self {
        Self::open(SerdeJsonBackend)
    }
}

impl Default for Server<SerdeJsonBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: JsonBackend> Server<B> {
    /// Server over `backend` with the default configuration and no procedures
    pub fn open(backend: B) -> Self {
        Self::with_config(backend, ServerConfig::default())
    }

    pub fn with_config(backend: B, config: ServerConfig) -> Self {
        debug!(?config, "Opening JSON-RPC server");
        Self {
            backend,
            registry: ProcedureRegistry::new(&config),
            pool: BufferPool::new(config.buffer_pool_size, config.buffer_capacity),
            config,
        }
    }

    /// Register a procedure under `name`.
    ///
    /// `expects_response` selects between serving calls (requests with an id)
    /// and notifications. `signature` declares the parameters, either as type
    /// codes (`"ii"`) or as `name:type` pairs (`"minuend:i, subtrahend:i"`);
    /// `None` declares a procedure without parameters. The same name may be
    /// registered several times with different signatures.
    pub fn register<F>(
        &mut self,
        name: &str,
        expects_response: bool,
        signature: Option<&str>,
        callback: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&[ActualParameter<'_>], &mut ResultWriter<'_>) -> Result<(), JsonRpcErrorCode>
            + Send
            + Sync
            + 'static,
    {
        self.registry
            .register(name, expects_response, signature, Arc::new(callback))
    }

    /// Register a [`ProcedureHandler`] implementation under `name`
    pub fn register_handler<H>(
        &mut self,
        name: &str,
        expects_response: bool,
        signature: Option<&str>,
        handler: H,
    ) -> Result<(), RegistrationError>
    where
        H: ProcedureHandler + 'static,
    {
        self.registry
            .register(name, expects_response, signature, Arc::new(handler))
    }

    pub fn registry(&self) -> &ProcedureRegistry {
        &self.registry
    }

    /// Distinct registered method names, sorted
    pub fn registered_methods(&self) -> Vec<String> {
        self.registry.names().map(str::to_string).collect()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Execute one request text: a single request object or a batch.
    ///
    /// Returns the response text, or `None` when nothing must be sent back
    /// (notifications, suppressed errors, batches without any response).
    pub fn execute(&mut self, request: &str) -> Option<String> {
        let mut executor = Executor {
            registry: &self.registry,
            pool: &mut self.pool,
        };

        let Some(document) = self.backend.parse(request) else {
            debug!(len = request.len(), "Request text is not valid JSON");
            return executor.error_text(JsonRpcErrorCode::ParseError);
        };
        executor.execute_document(&document)
    }

    /// Shut the server down, dropping every registered procedure
    pub fn close(self) {
        debug!(procedures = self.registry.len(), "Closing JSON-RPC server");
    }
}

/// Borrowed view of a server for the duration of one request text
struct Executor<'s> {
    registry: &'s ProcedureRegistry,
    pool: &'s mut BufferPool,
}

impl Executor<'_> {
    fn execute_document(&mut self, root: &dyn JsonNode) -> Option<String> {
        match root.resolve() {
            Some(JsonValue::Array(batch)) => self.execute_batch(batch),
            Some(JsonValue::Object(request)) => {
                let mut out = self.pool.acquire();
                let response = self
                    .execute_request(request, &mut out)
                    .then(|| out.as_str().to_string());
                self.pool.release(out);
                response
            }
            Some(other) => {
                debug!(kind = %other.json_type(), "Top-level value is neither object nor array");
                self.error_text(JsonRpcErrorCode::InvalidRequest)
            }
            None => {
                warn!("JSON backend could not resolve the top-level value");
                self.error_text(JsonRpcErrorCode::ServerInternal)
            }
        }
    }

    /// Responses of a batch are joined into one array in input order. A batch
    /// that yields no response at all (including `[]`) yields no output.
    fn execute_batch(&mut self, batch: &dyn JsonNode) -> Option<String> {
        let mut out = self.pool.acquire();
        let mut element = self.pool.acquire();
        let mut responses = 0usize;

        out.push('[');
        for index in 0..batch.len() {
            element.rewind();
            let produced = match batch.get_at(index) {
                Some(node) => match node.resolve() {
                    Some(JsonValue::Object(request)) => self.execute_request(request, &mut element),
                    _ => write_error_response(&mut element, JsonRpcErrorCode::InvalidRequest, None),
                },
                None => write_error_response(&mut element, JsonRpcErrorCode::InvalidRequest, None),
            };
            if produced {
                if responses > 0 {
                    out.push(',');
                }
                out.push_str(element.as_str());
                responses += 1;
            }
        }
        out.push(']');

        debug!(elements = batch.len(), responses, "Executed batch");
        let response = (responses > 0).then(|| out.as_str().to_string());
        self.pool.release(element);
        self.pool.release(out);
        response
    }

    /// Execute one request object, appending its response (if any) to `out`.
    /// Returns whether anything was written.
    fn execute_request(&mut self, node: &dyn JsonNode, out: &mut OutputBuffer) -> bool {
        let request = match JsonRpcRequest::validate(node) {
            Ok(request) => request,
            Err(code) => return write_error_response(out, code, None),
        };
        let id = request.id.as_ref();

        let registry = self.registry;
        let candidates = registry.resolve(request.method);
        if candidates.is_empty() {
            debug!(method = request.method, "Method not found");
            return write_error_response(out, JsonRpcErrorCode::MethodNotFound, id);
        }

        let mut actuals = match extract_actuals(request.params.as_ref()) {
            Ok(actuals) => actuals,
            Err(code) => {
                warn!(method = request.method, %code, "Could not read request params");
                return write_error_response(out, code, id);
            }
        };

        let Some(procedure) = candidates
            .iter()
            .find(|procedure| match_and_order(procedure, &mut actuals))
        else {
            debug!(
                method = request.method,
                overloads = candidates.len(),
                "No overload matches the given params"
            );
            return write_error_response(out, JsonRpcErrorCode::MethodNotFound, id);
        };

        if procedure.expects_response() != id.is_some() {
            debug!(
                method = request.method,
                expects_response = procedure.expects_response(),
                "Call and notification mismatch"
            );
            return write_error_response(out, JsonRpcErrorCode::MethodNotFound, id);
        }

        let mut result = self.pool.acquire();
        let outcome = procedure.invoke(&actuals, &mut ResultWriter::new(&mut result));
        let written = match (id, outcome) {
            (Some(id), Ok(())) => {
                write_success(out, result.as_str(), id);
                true
            }
            (Some(id), Err(code)) => {
                debug!(method = request.method, %code, "Procedure reported an error");
                write_error_response(out, code, Some(id))
            }
            (None, Ok(())) => false,
            (None, Err(code)) => {
                debug!(method = request.method, %code, "Notification failed; nothing is sent");
                false
            }
        };
        self.pool.release(result);
        written
    }

    /// Response text for a request that failed as a whole
    fn error_text(&mut self, code: JsonRpcErrorCode) -> Option<String> {
        let mut out = self.pool.acquire();
        let response = write_error_response(&mut out, code, None).then(|| out.as_str().to_string());
        self.pool.release(out);
        response
    }
}
