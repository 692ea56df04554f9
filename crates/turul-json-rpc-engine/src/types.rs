use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier echoed back in a response.
///
/// JSON-RPC allows numbers and strings. Numbers are kept as `f64` because that
/// is what the JSON backends hand out; integral values are written back without
/// a fractional part.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(f64),
    String(String),
}

impl RequestId {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RequestId::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Append the JSON form of this id (`1`, `1.5`, `"abc"`) to `out`.
    pub fn write_json(&self, out: &mut impl fmt::Write) -> fmt::Result {
        match self {
            RequestId::Number(n) => write_number(out, *n),
            RequestId::String(s) => write_json_string(out, s),
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write_number(f, *n),
        }
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestId::Number(n) if is_integral(*n) => serializer.serialize_i64(*n as i64),
            RequestId::Number(n) => serializer.serialize_f64(*n),
            RequestId::String(s) => serializer.serialize_str(s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n as f64)
    }
}

impl From<f64> for RequestId {
    fn from(n: f64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// Write a number the way JSON-RPC peers expect to read it back: integral values
/// without a fractional part, everything else with Rust's shortest round-trip form.
pub(crate) fn write_number(out: &mut impl fmt::Write, n: f64) -> fmt::Result {
    if !n.is_finite() {
        // JSON has no representation for NaN or infinities
        return out.write_str("null");
    }
    if is_integral(n) {
        write!(out, "{}", n as i64)
    } else {
        write!(out, "{}", n)
    }
}

/// Integral and small enough to survive the trip through `i64` unchanged.
fn is_integral(n: f64) -> bool {
    n.is_finite() && n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15
}

/// Write `s` as a quoted, escaped JSON string.
pub(crate) fn write_json_string(out: &mut impl fmt::Write, s: &str) -> fmt::Result {
    let quoted = serde_json::to_string(s).map_err(|_| fmt::Error)?;
    out.write_str(&quoted)
}

/// JSON-RPC version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => "2.0",
        }
    }

    /// Only the exact string `"2.0"` is accepted; there is no 1.0 compatibility mode.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "2.0" => Some(JsonRpcVersion::V2_0),
            _ => None,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        JsonRpcVersion::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid JSON-RPC version: {}", s)))
    }
}
