//! Purpose: Method-dispatch registry for JSON-RPC style request handling.
//! Exports: `api` (stable surface), `core` (routes, router, dispatch, errors).
//! Role: Library backing the `jsonrpc-router` binary and embedding transports.
//! Invariants: Routes pair decode and handle with one params type per route.
//! Invariants: Lookup and registration are safe from any thread.
pub mod api;
pub mod core;
