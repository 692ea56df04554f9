//! Simple Calculator JSON-RPC Example
//!
//! Registers a handful of procedures (including overloads and a notification)
//! and runs the request examples from the JSON-RPC 2.0 specification through
//! the engine, printing each request and its response.
//!
//! Run with `RUST_LOG=debug` to see the engine's dispatch decisions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;
use tracing_subscriber::EnvFilter;
use turul_json_rpc_engine::prelude::*;

fn subtract(params: &[ActualParameter<'_>], result: &mut ResultWriter<'_>) -> Result<(), JsonRpcErrorCode> {
    match (params[0].as_f64(), params[1].as_f64()) {
        (Some(minuend), Some(subtrahend)) => {
            result.write_number(minuend - subtrahend);
            Ok(())
        }
        _ => Err(JsonRpcErrorCode::InvalidParams),
    }
}

fn sum(params: &[ActualParameter<'_>], result: &mut ResultWriter<'_>) -> Result<(), JsonRpcErrorCode> {
    let total: f64 = params.iter().filter_map(|p| p.as_f64()).sum();
    result.write_number(total);
    Ok(())
}

/// Counts `update` notifications
#[derive(Default)]
struct UpdateCounter {
    seen: AtomicU64,
}

impl ProcedureHandler for UpdateCounter {
    fn call(
        &self,
        params: &[ActualParameter<'_>],
        _result: &mut ResultWriter<'_>,
    ) -> Result<(), JsonRpcErrorCode> {
        let seen = self.seen.fetch_add(1, Ordering::Relaxed) + 1;
        println!("  (update #{seen} with {} values)", params.len());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut server = Server::new();
    server.register("subtract", true, Some("ii"), subtract)?;
    server.register("subtract", true, Some("minuend:i, subtrahend:i"), subtract)?;
    server.register("sum", true, Some("iii"), sum)?;
    server.register("sum", true, Some("ii"), sum)?;
    server.register("notify_hello", false, Some("i"), |_, _| Ok(()))?;
    server.register("notify_sum", false, Some("iii"), |_, _| Ok(()))?;
    server.register("get_data", true, None, |_, result| {
        result.write_json(&json!(["hello", 5]))
    })?;
    server.register_handler("update", false, Some("iiiii"), UpdateCounter::default())?;

    println!("Registered methods: {:?}\n", server.registered_methods());

    let requests = [
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": [23, 42], "id": 2}"#,
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": {"subtrahend": 23, "minuend": 42}, "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "subtract", "params": {"minuend": 42, "subtrahend": 23}, "id": 4}"#,
        r#"{"jsonrpc": "2.0", "method": "update", "params": [1,2,3,4,5]}"#,
        r#"{"jsonrpc": "2.0", "method": "foobar"}"#,
        r#"{"jsonrpc": "2.0", "method": "foobar", "id": "1"}"#,
        r#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#,
        r#"{"jsonrpc": "2.0", "method": 1, "params": "bar"}"#,
        r#"[
            {"jsonrpc": "2.0", "method": "sum", "params": [1,2,4], "id": "1"},
            {"jsonrpc": "2.0", "method"
        ]"#,
        r#"[]"#,
        r#"[1]"#,
        r#"[1,2,3]"#,
        r#"[
            {"jsonrpc": "2.0", "method": "sum", "params": [1,2,4], "id": "1"},
            {"jsonrpc": "2.0", "method": "notify_hello", "params": [7]},
            {"jsonrpc": "2.0", "method": "subtract", "params": [42,23], "id": "2"},
            {"foo": "boo"},
            {"jsonrpc": "2.0", "method": "foo.get", "params": {"name": "myself"}, "id": "5"},
            {"jsonrpc": "2.0", "method": "get_data", "id": "9"}
        ]"#,
        r#"[
            {"jsonrpc": "2.0", "method": "notify_sum", "params": [1,2,4]},
            {"jsonrpc": "2.0", "method": "notify_hello", "params": [7]}
        ]"#,
    ];

    for request in requests {
        println!("--> {request}");
        match server.execute(request) {
            Some(response) => println!("<-- {response}\n"),
            None => println!("<-- (no response)\n"),
        }
    }

    server.close();
    Ok(())
}
