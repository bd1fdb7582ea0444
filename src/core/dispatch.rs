//! Purpose: Connect an extracted `(method, params)` pair to its registered route.
//! Exports: `Dispatcher`, `DispatchOutcome`.
//! Role: Transport-side glue: lookup, decode, then hand off to the route's handler.
//! Invariants: Unknown methods reply `method_not_found`; decode failures reply `invalid_params`.
//! Invariants: A handler never runs when its decode step failed.
//! Invariants: Exactly one reply is produced by the dispatcher or delegated to the handler.

use crate::core::jsonrpc::JsonRpcError;
use crate::core::router::Router;
use crate::core::transmit::Transmitter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Params decoded and the route's handler ran.
    Handled,
    MethodNotFound,
    InvalidParams,
}

#[derive(Clone, Copy, Debug)]
pub struct Dispatcher<'r> {
    router: &'r Router,
}

impl<'r> Dispatcher<'r> {
    pub fn new(router: &'r Router) -> Self {
        Self { router }
    }

    pub fn dispatch(&self, method: &str, params: &[u8], transmitter: Transmitter) -> DispatchOutcome {
        let Some(route) = self.router.get_method_handler(method) else {
            tracing::debug!(method, "method not found");
            transmitter.send_error(JsonRpcError::method_not_found(format!(
                "method not found: {method}"
            )));
            return DispatchOutcome::MethodNotFound;
        };

        let decoded = match route.decode(params) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::warn!(method, error = %err, "failed to decode params");
                transmitter.send_error(JsonRpcError::invalid_params(err.to_string()));
                return DispatchOutcome::InvalidParams;
            }
        };

        tracing::debug!(method, "dispatching to handler");
        route.handle(decoded, transmitter);
        DispatchOutcome::Handled
    }
}
