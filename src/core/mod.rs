// Core modules implementing routes, the router, dispatch, and errors.
pub mod dispatch;
pub mod error;
pub mod jsonrpc;
#[cfg(test)]
pub(crate) mod log_capture;
pub mod route;
pub mod router;
pub mod transmit;
