//! Actual parameters: extracting them from a request and binding them to a
//! procedure's formal signature.

use serde_json::Value;

use crate::error::JsonRpcErrorCode;
use crate::registry::Procedure;
use crate::request::RequestParams;
use crate::value::{JsonNode, JsonType, JsonValue};

/// One argument as supplied by the caller.
///
/// After a successful [`match_and_order`] the slice handed to a procedure is in
/// formal order, so `params[i]` is the i-th declared parameter.
#[derive(Debug, Clone, Copy)]
pub struct ActualParameter<'a> {
    /// Member key for named arguments, `None` for positional ones
    pub name: Option<&'a str>,
    /// Formal slot this argument binds to
    pub index: usize,
    pub value: JsonValue<'a>,
}

impl<'a> ActualParameter<'a> {
    pub fn json_type(&self) -> JsonType {
        self.value.json_type()
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }

    pub fn as_str(&self) -> Option<&'a str> {
        self.value.as_str()
    }

    pub fn as_node(&self) -> Option<&'a dyn JsonNode> {
        self.value.as_node()
    }

    /// Owned copy of the argument value
    pub fn to_value(&self) -> Option<Value> {
        self.value.to_value()
    }
}

/// Collect the actual parameters of a request in the order they appear.
///
/// Absent params give an empty list. An element the backend cannot resolve
/// fails the whole request with [`JsonRpcErrorCode::ServerInternal`].
pub fn extract_actuals<'a>(
    params: Option<&RequestParams<'a>>,
) -> Result<Vec<ActualParameter<'a>>, JsonRpcErrorCode> {
    let Some(params) = params else {
        return Ok(Vec::new());
    };

    let node = params.node();
    let mut actuals = Vec::with_capacity(node.len());
    for index in 0..node.len() {
        let value = node
            .get_at(index)
            .and_then(|child| child.resolve())
            .ok_or(JsonRpcErrorCode::ServerInternal)?;
        // object members are named even when the key is empty
        let name = if params.is_named() {
            Some(node.key_at(index).ok_or(JsonRpcErrorCode::ServerInternal)?)
        } else {
            None
        };
        actuals.push(ActualParameter { name, index, value });
    }
    Ok(actuals)
}

/// Check `actuals` against the signature of `procedure`, reordering them into
/// formal order on success.
///
/// Counts must be equal. Positional arguments (the first one has no name) must
/// match the formal types slot by slot. Named arguments bind each formal to the
/// first unbound argument with the same name and type; on a full match the
/// arguments are stably sorted into formal order. On a mismatch `actuals` is
/// left untouched.
pub fn match_and_order(procedure: &Procedure, actuals: &mut [ActualParameter<'_>]) -> bool {
    let formals = procedure.params();
    if formals.len() != actuals.len() {
        return false;
    }

    let Some(first) = actuals.first() else {
        return true;
    };

    if first.name.is_none() {
        return formals
            .iter()
            .zip(actuals.iter())
            .all(|(formal, actual)| formal.ty == actual.json_type());
    }

    let mut slots = vec![None; actuals.len()];
    for (slot, formal) in formals.iter().enumerate() {
        let bound = actuals.iter().enumerate().position(|(i, actual)| {
            slots[i].is_none()
                && actual.json_type() == formal.ty
                && actual.name == formal.name.as_deref()
        });
        match bound {
            Some(i) => slots[i] = Some(slot),
            None => return false,
        }
    }

    let mut reordered = false;
    for (i, (actual, slot)) in actuals.iter_mut().zip(slots).enumerate() {
        // every argument is bound once the loop above completes
        let slot = slot.unwrap_or(i);
        reordered |= slot != i;
        actual.index = slot;
    }
    if reordered {
        actuals.sort_by_key(|actual| actual.index);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcedureRegistry;
    use crate::response::ResultWriter;
    use serde_json::json;

    fn noop(_: &[ActualParameter<'_>], _: &mut ResultWriter<'_>) -> Result<(), JsonRpcErrorCode> {
        Ok(())
    }

    fn procedure(signature: Option<&str>) -> Procedure {
        let mut registry = ProcedureRegistry::default();
        registry
            .register("p", true, signature, std::sync::Arc::new(noop))
            .unwrap();
        registry.resolve("p")[0].clone()
    }

    fn params_of(doc: &Value) -> Option<RequestParams<'_>> {
        match (doc as &dyn JsonNode).resolve()? {
            JsonValue::Array(node) => Some(RequestParams::Array(node)),
            JsonValue::Object(node) => Some(RequestParams::Object(node)),
            _ => None,
        }
    }

    #[test]
    fn test_extract_positional_and_named() {
        let doc = json!([42, "x"]);
        let actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert_eq!(actuals.len(), 2);
        assert!(actuals.iter().all(|a| a.name.is_none()));
        assert_eq!(actuals[0].as_f64(), Some(42.0));
        assert_eq!(actuals[1].index, 1);

        let doc = json!({"b": true, "a": null});
        let actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert_eq!(actuals[0].name, Some("b"));
        assert_eq!(actuals[1].json_type(), JsonType::Null);

        assert!(extract_actuals(None).unwrap().is_empty());
    }

    #[test]
    fn test_positional_match_requires_exact_types() {
        let sub = procedure(Some("ii"));
        let doc = json!([42, 23]);
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert!(match_and_order(&sub, &mut actuals));

        let doc = json!([42, "23"]);
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert!(!match_and_order(&sub, &mut actuals));

        let doc = json!([42]);
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert!(!match_and_order(&sub, &mut actuals));
    }

    #[test]
    fn test_named_match_reorders_into_formal_order() {
        let sub = procedure(Some("minuend:i, subtrahend:i"));
        let doc = json!({"subtrahend": 23, "minuend": 42});
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();

        assert!(match_and_order(&sub, &mut actuals));
        assert_eq!(actuals[0].name, Some("minuend"));
        assert_eq!(actuals[0].as_f64(), Some(42.0));
        assert_eq!(actuals[1].as_f64(), Some(23.0));
        assert_eq!(actuals[1].index, 1);
    }

    #[test]
    fn test_named_match_rotates_mixed_types() {
        let p = procedure(Some("a:i,b:s,c:b"));
        let doc = json!({"c": true, "a": 1, "b": "x"});
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();

        assert!(match_and_order(&p, &mut actuals));
        let names: Vec<_> = actuals.iter().map(|a| a.name).collect();
        assert_eq!(names, [Some("a"), Some("b"), Some("c")]);
        assert_eq!(actuals[0].as_f64(), Some(1.0));
        assert_eq!(actuals[1].as_str(), Some("x"));
        assert_eq!(actuals[2].as_bool(), Some(true));
        let indices: Vec<_> = actuals.iter().map(|a| a.index).collect();
        assert_eq!(indices, [0, 1, 2]);
    }

    #[test]
    fn test_empty_key_binds_by_name() {
        let doc = json!({"": 1});
        let actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert_eq!(actuals[0].name, Some(""));
    }

    #[test]
    fn test_named_mismatch_leaves_actuals_untouched() {
        let sub = procedure(Some("minuend:i, subtrahend:i"));
        let doc = json!({"subtrahend": 23, "minuend": "42"});
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();

        assert!(!match_and_order(&sub, &mut actuals));
        assert_eq!(actuals[0].name, Some("subtrahend"));
        assert_eq!(actuals[0].index, 0);
    }

    #[test]
    fn test_void_procedure_matches_only_empty_params() {
        let void = procedure(None);
        assert!(match_and_order(&void, &mut []));

        let doc = json!([1]);
        let mut actuals = extract_actuals(params_of(&doc).as_ref()).unwrap();
        assert!(!match_and_order(&void, &mut actuals));
    }
}
