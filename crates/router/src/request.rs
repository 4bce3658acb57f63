//! The validated request seen by middlewares, and the per-request context.
//!
//! - `RouterRequest`: the raw input plus the value produced by the request validator
//! - `Context`: request scoped state threaded explicitly through the middleware chain

use crate::error::ExtractError;
use crate::input::{RequestBody, RouterInput};
use crate::matcher::PathParams;
use http::Extensions;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// A request that passed method matching, path matching and validation.
///
/// Cloning is cheap: the raw input and the validated value are shared.
#[derive(Debug, Clone)]
pub struct RouterRequest {
    input: Arc<RouterInput>,
    pathname: String,
    params: PathParams,
    value: Arc<Value>,
}

impl RouterRequest {
    pub(crate) fn new(input: RouterInput, params: PathParams, value: Value) -> Self {
        let pathname = input.pathname().to_string();
        Self { input: Arc::new(input), pathname, params, value: Arc::new(value) }
    }

    /// The effective pathname. Inside a sub route this is relative to the mount point.
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn method(&self) -> Option<&str> {
        self.input.method()
    }

    /// The raw path params, before validation.
    pub fn path_params(&self) -> &PathParams {
        &self.params
    }

    /// The validated request value, shaped like the router's request schema.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The raw input this router was run with.
    pub fn input(&self) -> &RouterInput {
        &self.input
    }

    /// The decoded body as sent, including a buffer the validator never sees.
    pub fn raw_body(&self) -> &RequestBody {
        self.input.body()
    }

    /// Deserializes the validated, coerced path params.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, ExtractError> {
        self.slot("params")
    }

    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ExtractError> {
        self.slot("query")
    }

    /// Deserializes the validated body; without a body schema it reads as `null`.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, ExtractError> {
        self.slot("body")
    }

    pub fn headers<T: DeserializeOwned>(&self) -> Result<T, ExtractError> {
        self.slot("headers")
    }

    pub fn cookies<T: DeserializeOwned>(&self) -> Result<T, ExtractError> {
        self.slot("cookies")
    }

    /// Deserializes one validated slot; an undeclared slot reads as `null`.
    fn slot<T: DeserializeOwned>(&self, slot: &'static str) -> Result<T, ExtractError> {
        let value = self.value.get(slot).unwrap_or(&NULL);
        T::deserialize(value).map_err(|source| ExtractError::Deserialize { slot, source })
    }

    /// The same request seen from below a mount point.
    pub(crate) fn with_pathname(&self, pathname: String) -> Self {
        Self { pathname, ..self.clone() }
    }

    /// The raw input as a nested router should receive it: same fields, effective pathname.
    pub(crate) fn to_input(&self) -> RouterInput {
        let mut input = RouterInput::clone(&self.input);
        input.set_pathname(self.pathname.clone());
        input
    }
}

/// Request scoped state, passed explicitly through [`Next`](crate::Next).
///
/// Holds the mount points entered so far and arbitrary typed extensions.
#[derive(Debug, Clone, Default)]
pub struct Context {
    basenames: Vec<String>,
    extensions: Extensions,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mount points entered so far, outermost first.
    pub fn basenames(&self) -> &[String] {
        &self.basenames
    }

    /// The mount points joined, e.g. `/api/v1`; empty outside any sub route.
    pub fn basename(&self) -> String {
        self.basenames.concat()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    /// Inserts a typed value, returning the previous one of the same type.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    pub(crate) fn with_basename(mut self, basename: &str) -> Self {
        self.basenames.push(basename.to_string());
        self
    }
}
