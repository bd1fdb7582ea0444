//! Purpose: Define the stable public Rust API boundary for the router.
//! Exports: Route, router, dispatch, transmission, and error types.
//! Role: Public, additive-only surface over the `core` modules.
//! Invariants: Callers registering or dispatching methods need nothing outside this module.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::dispatch::{DispatchOutcome, Dispatcher};
pub use crate::core::error::{DecodeError, Error, ErrorKind};
pub use crate::core::jsonrpc::{
    INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE, INVALID_REQUEST_CODE, JsonRpcError,
    METHOD_NOT_FOUND_CODE, PARSE_ERROR_CODE,
};
pub use crate::core::route::{DecodedParams, Route, TypedRoute, decode_json, decode_none};
pub use crate::core::router::{
    Router, RoutesGroup, default_router, format_routes, print_routes, register_route,
    register_routes_group, register_routes_groups,
};
pub use crate::core::transmit::{
    ChannelTransmitter, Reply, ResponseTransmitter, Transmitter, channel,
};
