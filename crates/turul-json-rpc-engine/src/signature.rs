//! Parameter signature parsing.
//!
//! Two grammars are accepted, never mixed within one signature:
//!
//! - type-only: concatenated type codes, e.g. `"iii"` (commas may separate groups)
//! - named: comma-separated `name:type` pairs, e.g. `"minuend:i, subtrahend:i"`
//!
//! Whitespace is ignored everywhere. Type codes are listed in [`JsonType::CODES`].

use crate::error::SignatureError;
use crate::value::JsonType;

/// A procedure's declared argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormalParameter {
    /// `None` for type-only signatures
    pub name: Option<String>,
    pub ty: JsonType,
}

impl FormalParameter {
    pub fn positional(ty: JsonType) -> Self {
        Self { name: None, ty }
    }

    pub fn named(name: impl Into<String>, ty: JsonType) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }
}

/// Parse `signature` into at most `max` formal parameters.
///
/// `None` declares a procedure without parameters. More than `max` parameters
/// yields [`SignatureError::Overflow`] so the caller can retry with a larger limit.
pub fn parse_signature(
    signature: Option<&str>,
    max: usize,
) -> Result<Vec<FormalParameter>, SignatureError> {
    let Some(signature) = signature else {
        return Ok(Vec::new());
    };

    let compact: String = signature.chars().filter(|c| !c.is_whitespace()).collect();
    let named = compact.contains(':');
    let mut params = Vec::new();

    for token in compact.split(',').filter(|t| !t.is_empty()) {
        if named {
            push_param(&mut params, parse_pair(token)?, max)?;
        } else {
            for code in token.chars() {
                let ty = JsonType::from_code(code).ok_or(SignatureError::UnknownType(code))?;
                push_param(&mut params, FormalParameter::positional(ty), max)?;
            }
        }
    }
    Ok(params)
}

fn parse_pair(token: &str) -> Result<FormalParameter, SignatureError> {
    let malformed = || SignatureError::MalformedPair(token.to_string());

    let (name, ty) = token.split_once(':').ok_or_else(malformed)?;
    if name.is_empty() || ty.contains(':') {
        return Err(malformed());
    }

    let mut codes = ty.chars();
    match (codes.next(), codes.next()) {
        (Some(code), None) => {
            let ty = JsonType::from_code(code).ok_or(SignatureError::UnknownType(code))?;
            Ok(FormalParameter::named(name, ty))
        }
        _ => Err(malformed()),
    }
}

fn push_param(
    params: &mut Vec<FormalParameter>,
    param: FormalParameter,
    max: usize,
) -> Result<(), SignatureError> {
    if params.len() == max {
        return Err(SignatureError::Overflow { max });
    }
    params.push(param);
    Ok(())
}
