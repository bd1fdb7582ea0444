//! Purpose: Built-in route groups served by the `jsonrpc-router` binary.
//! Exports: `route_groups`.
//! Role: Small, self-contained handlers that exercise the decode/handle contract.
//! Invariants: Every handler sends exactly one reply per call.

use serde::{Deserialize, Serialize};
use serde_json::json;

use jsonrpc_router::api::{JsonRpcError, RoutesGroup, Transmitter, TypedRoute, decode_none};

#[derive(Debug, Serialize, Deserialize)]
struct EchoParams {
    text: String,
}

fn echo(params: EchoParams, transmitter: Transmitter) {
    match serde_json::to_value(&params) {
        Ok(value) => transmitter.send(value),
        Err(err) => transmitter.send_error(JsonRpcError::internal_error(err.to_string())),
    }
}

fn sum(values: Vec<f64>, transmitter: Transmitter) {
    let total: f64 = values.iter().sum();
    if total.is_finite() {
        transmitter.send(json!(total));
    } else {
        transmitter.send_error(JsonRpcError::new(1, "sum overflowed"));
    }
}

pub(crate) fn route_groups() -> Vec<RoutesGroup> {
    vec![
        RoutesGroup::new("Echo").with_route(TypedRoute::json("echo", echo)),
        RoutesGroup::new("Math")
            .with_route(TypedRoute::json("sum", sum))
            .with_route(TypedRoute::new("ping", decode_none, |(), transmitter: Transmitter| {
                transmitter.send(json!("pong"))
            })),
    ]
}
