//! Purpose: Pair a method name with its decode and handle steps.
//! Exports: `TypedRoute`, `Route`, `DecodedParams`, `decode_json`, `decode_none`.
//! Role: Leaf of the dispatch core; the router stores `Route`s, transports call them.
//! Invariants: A route's decode output is always the exact type its handler takes.
//! Invariants: Decode failures are returned; handler outcomes go through the transmitter.
//! Invariants: Routes are immutable after construction and cheap to clone.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::DecodeError;
use crate::core::transmit::Transmitter;

type DecodeFn<T> = dyn Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync;
type HandleFn<T> = dyn Fn(T, Transmitter) + Send + Sync;
type BoundCall = Box<dyn FnOnce(Transmitter) + Send>;

/// Route whose params type `T` is fixed at compile time.
///
/// The decode function produces `T` and the handler consumes `T`, so a
/// mismatched pair does not type-check.
pub struct TypedRoute<T> {
    method: String,
    decode: Arc<DecodeFn<T>>,
    handle: Arc<HandleFn<T>>,
}

impl<T> Clone for TypedRoute<T> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            decode: Arc::clone(&self.decode),
            handle: Arc::clone(&self.handle),
        }
    }
}

impl<T> fmt::Debug for TypedRoute<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRoute")
            .field("method", &self.method)
            .field("params", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: Send + 'static> TypedRoute<T> {
    pub fn new<D, H>(method: impl Into<String>, decode: D, handle: H) -> Self
    where
        D: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
        H: Fn(T, Transmitter) + Send + Sync + 'static,
    {
        Self {
            method: method.into(),
            decode: Arc::new(decode),
            handle: Arc::new(handle),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn decode(&self, params: &[u8]) -> Result<T, DecodeError> {
        (self.decode)(params)
    }

    pub fn handle(&self, params: T, transmitter: Transmitter) {
        (self.handle)(params, transmitter)
    }

    pub fn into_route(self) -> Route {
        Route::from(self)
    }
}

impl<T: DeserializeOwned + Send + 'static> TypedRoute<T> {
    /// Route whose params are decoded from JSON with [`decode_json`].
    pub fn json<H>(method: impl Into<String>, handle: H) -> Self
    where
        H: Fn(T, Transmitter) + Send + Sync + 'static,
    {
        Self::new(method, decode_json::<T>, handle)
    }
}

trait ErasedRoute: Send + Sync {
    fn bind(&self, params: &[u8]) -> Result<BoundCall, DecodeError>;
    fn params_type(&self) -> &'static str;
}

impl<T: Send + 'static> ErasedRoute for TypedRoute<T> {
    fn bind(&self, params: &[u8]) -> Result<BoundCall, DecodeError> {
        let value = (self.decode)(params)?;
        let handle = Arc::clone(&self.handle);
        Ok(Box::new(move |transmitter| handle(value, transmitter)))
    }

    fn params_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Type-erased route as stored in a router.
///
/// Cloning shares the underlying functions.
#[derive(Clone)]
pub struct Route {
    method: Arc<str>,
    inner: Arc<dyn ErasedRoute>,
}

impl Route {
    pub fn new<T, D, H>(method: impl Into<String>, decode: D, handle: H) -> Self
    where
        T: Send + 'static,
        D: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
        H: Fn(T, Transmitter) + Send + Sync + 'static,
    {
        TypedRoute::new(method, decode, handle).into_route()
    }

    pub fn json<T, H>(method: impl Into<String>, handle: H) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        H: Fn(T, Transmitter) + Send + Sync + 'static,
    {
        TypedRoute::<T>::json(method, handle).into_route()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Decode raw params into a value bound to this route's handler.
    pub fn decode(&self, params: &[u8]) -> Result<DecodedParams, DecodeError> {
        let call = self.inner.bind(params)?;
        Ok(DecodedParams {
            method: Arc::clone(&self.method),
            call,
        })
    }

    /// Run the handler paired with `params`.
    ///
    /// The handler that runs is always the one `params` was decoded for; a
    /// mismatch is a caller bug and is reported at warn level.
    pub fn handle(&self, params: DecodedParams, transmitter: Transmitter) {
        if params.method != self.method {
            tracing::warn!(
                route = %self.method,
                decoded_for = %params.method,
                "params decoded by another route; running their own handler"
            );
        }
        params.handle(transmitter);
    }

    /// True when both values share the same registered functions.
    pub fn same_route(&self, other: &Route) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Send + 'static> From<TypedRoute<T>> for Route {
    fn from(route: TypedRoute<T>) -> Self {
        Self {
            method: Arc::from(route.method.as_str()),
            inner: Arc::new(route),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("params", &self.inner.params_type())
            .finish()
    }
}

/// Successfully decoded params, ready for exactly one handler invocation.
pub struct DecodedParams {
    method: Arc<str>,
    call: BoundCall,
}

impl DecodedParams {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn handle(self, transmitter: Transmitter) {
        (self.call)(transmitter)
    }
}

impl fmt::Debug for DecodedParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedParams")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Decode JSON params into `T`. Empty input decodes as JSON `null`.
pub fn decode_json<T: DeserializeOwned>(params: &[u8]) -> Result<T, DecodeError> {
    if params.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null).map_err(DecodeError::from);
    }
    serde_json::from_slice(params).map_err(DecodeError::from)
}

/// Decoder for methods that take no params.
///
/// Accepts empty input, `null`, `{}` and `[]`.
pub fn decode_none(params: &[u8]) -> Result<(), DecodeError> {
    if params.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }
    let value: Value = serde_json::from_slice(params)?;
    match value {
        Value::Null => Ok(()),
        Value::Object(map) if map.is_empty() => Ok(()),
        Value::Array(items) if items.is_empty() => Ok(()),
        _ => Err(DecodeError::new("method takes no params")),
    }
}
