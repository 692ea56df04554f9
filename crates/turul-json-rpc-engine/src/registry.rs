//! Procedure registry.
//!
//! Procedures are kept in a multimap from method name to every overload
//! registered under it, in registration order. Lookup is by exact,
//! case-sensitive name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::ServerConfig;
use crate::error::{JsonRpcErrorCode, RegistrationError, SignatureError};
use crate::params::ActualParameter;
use crate::response::ResultWriter;
use crate::signature::{FormalParameter, parse_signature};

/// Body of a procedure.
///
/// `params` arrive in formal order. Whatever is written to `result` becomes the
/// `result` member of the response verbatim, so it must be one JSON value.
/// Returning an error code produces an error response instead.
pub trait ProcedureHandler: Send + Sync {
    fn call(
        &self,
        params: &[ActualParameter<'_>],
        result: &mut ResultWriter<'_>,
    ) -> Result<(), JsonRpcErrorCode>;
}

impl<F> ProcedureHandler for F
where
    F: Fn(&[ActualParameter<'_>], &mut ResultWriter<'_>) -> Result<(), JsonRpcErrorCode>
        + Send
        + Sync,
{
    fn call(
        &self,
        params: &[ActualParameter<'_>],
        result: &mut ResultWriter<'_>,
    ) -> Result<(), JsonRpcErrorCode> {
        self(params, result)
    }
}

/// One registered overload of a method
#[derive(Clone)]
pub struct Procedure {
    name: String,
    expects_response: bool,
    params: Vec<FormalParameter>,
    handler: Arc<dyn ProcedureHandler>,
}

impl Procedure {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this overload serves calls (with an id) rather than notifications
    pub fn expects_response(&self) -> bool {
        self.expects_response
    }

    pub fn params(&self) -> &[FormalParameter] {
        &self.params
    }

    pub fn invoke(
        &self,
        params: &[ActualParameter<'_>],
        result: &mut ResultWriter<'_>,
    ) -> Result<(), JsonRpcErrorCode> {
        self.handler.call(params, result)
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("name", &self.name)
            .field("expects_response", &self.expects_response)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ProcedureRegistry {
    procedures: BTreeMap<String, Vec<Procedure>>,
    count: usize,
    /// Current signature limit, raised whenever a signature needs more room
    param_capacity: usize,
    max_param_capacity: usize,
}

impl ProcedureRegistry {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            procedures: BTreeMap::new(),
            count: 0,
            param_capacity: config.param_capacity,
            max_param_capacity: config.max_param_capacity,
        }
    }

    /// Add an overload of `name`.
    ///
    /// The signature is parsed against the current parameter limit; when it has
    /// more parameters the limit doubles and parsing starts over, up to the
    /// configured maximum. Beyond that registration fails with
    /// [`RegistrationError::OutOfMemory`].
    pub fn register(
        &mut self,
        name: &str,
        expects_response: bool,
        signature: Option<&str>,
        handler: Arc<dyn ProcedureHandler>,
    ) -> Result<(), RegistrationError> {
        let params = loop {
            match parse_signature(signature, self.param_capacity) {
                Ok(params) => break params,
                Err(SignatureError::Overflow { max }) if max < self.max_param_capacity => {
                    self.param_capacity = (max.max(1) * 2).min(self.max_param_capacity);
                    debug!(
                        method = name,
                        capacity = self.param_capacity,
                        "Growing signature parameter limit"
                    );
                }
                Err(SignatureError::Overflow { .. }) => {
                    return Err(RegistrationError::OutOfMemory {
                        method: name.to_string(),
                    });
                }
                Err(source) => {
                    return Err(RegistrationError::InvalidSignature {
                        method: name.to_string(),
                        source,
                    });
                }
            }
        };

        debug!(
            method = name,
            expects_response,
            arity = params.len(),
            "Registered procedure"
        );
        self.procedures
            .entry(name.to_string())
            .or_default()
            .push(Procedure {
                name: name.to_string(),
                expects_response,
                params,
                handler,
            });
        self.count += 1;
        Ok(())
    }

    /// All overloads registered under `name`, in registration order
    pub fn resolve(&self, name: &str) -> &[Procedure] {
        self.procedures
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of registered procedures, counting every overload
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Distinct method names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.procedures.keys().map(String::as_str)
    }
}

impl Default for ProcedureRegistry {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &[ActualParameter<'_>], _: &mut ResultWriter<'_>) -> Result<(), JsonRpcErrorCode> {
        Ok(())
    }

    #[test]
    fn test_overloads_keep_registration_order() {
        let mut registry = ProcedureRegistry::default();
        registry.register("sum", true, Some("ii"), Arc::new(noop)).unwrap();
        registry.register("sum", true, Some("iii"), Arc::new(noop)).unwrap();
        registry.register("abs", false, Some("i"), Arc::new(noop)).unwrap();

        assert_eq!(registry.len(), 3);
        let overloads = registry.resolve("sum");
        assert_eq!(overloads.len(), 2);
        assert_eq!(overloads[0].params().len(), 2);
        assert_eq!(overloads[1].params().len(), 3);
        assert!(!registry.resolve("abs")[0].expects_response());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["abs", "sum"]);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut registry = ProcedureRegistry::default();
        registry.register("Sum", true, None, Arc::new(noop)).unwrap();

        assert!(registry.resolve("sum").is_empty());
        assert_eq!(registry.resolve("Sum")[0].name(), "Sum");
    }

    #[test]
    fn test_invalid_signature_is_rejected() {
        let mut registry = ProcedureRegistry::default();
        let err = registry
            .register("bad", true, Some("ix"), Arc::new(noop))
            .unwrap_err();

        assert_eq!(
            err,
            RegistrationError::InvalidSignature {
                method: "bad".to_string(),
                source: SignatureError::UnknownType('x'),
            }
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parameter_limit_grows_up_to_maximum() {
        let config = ServerConfig::default().with_param_capacity(2, 8);
        let mut registry = ProcedureRegistry::new(&config);

        registry.register("five", true, Some("iiiii"), Arc::new(noop)).unwrap();
        assert_eq!(registry.resolve("five")[0].params().len(), 5);

        let err = registry
            .register("nine", true, Some("iiiiiiiii"), Arc::new(noop))
            .unwrap_err();
        assert_eq!(err.code(), JsonRpcErrorCode::OutOfMemory);
        assert_eq!(registry.len(), 1);
    }
}
