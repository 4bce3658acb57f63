//! The typed router.
//!
//! A [`Router`] owns a [`RequestSchema`], the path matcher compiled from its pathname, the
//! request validator built from the rest of it, and a [`Pipeline`] of middlewares.
//!
//! Running a router is a two step affair:
//!
//! 1. [`Router::prepare`] checks the method, matches the pathname and validates the request.
//!    Each of these rejects with a [`RouterError`] before any middleware runs.
//! 2. The middlewares run in registration order on the resulting [`RouterRequest`].
//!
//! A router is itself a [`Middleware`], so routers nest. An inner router whose chain ends
//! without a response hands the request to whatever follows it; an inner rejection is an
//! error of the outer chain.

use crate::error::{RouterBuildError, RouterError};
use crate::extract::FromRequest;
use crate::fn_trait::FnTrait;
use crate::handler::{MatchBody, handler_fn};
use crate::input::{BodyType, FromBody, RouterInput};
use crate::matcher::PathMatcher;
use crate::mount::{Route, ServeDir};
use crate::pipeline::{BoxError, Middleware, Next, Pipeline, RunOptions};
use crate::request::RouterRequest;
use crate::responder::Responder;
use crate::response::Response;
use crate::schema::RequestSchema;
use crate::validator::{ValidateRequest, create_request_validator};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// Router construction options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Reject unknown keys in declared slots instead of dropping them.
    pub strict: bool,
}

impl RouterOptions {
    /// Options of a router that rejects unknown keys.
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// A future resolving to the response of one dispatched request.
pub type Dispatch<'a> = BoxFuture<'a, Result<Response, BoxError>>;

/// Matches one pathname pattern, validates the request against a [`RequestSchema`] and
/// runs the accepted request through its middleware chain.
pub struct Router {
    schema: RequestSchema,
    matcher: PathMatcher,
    validator: Box<dyn ValidateRequest>,
    pipeline: Pipeline<RouterRequest, Response>,
}

impl Router {
    /// Builds a router. Pattern and schema problems surface here, never per request.
    pub fn new(schema: RequestSchema, options: RouterOptions) -> Result<Self, RouterBuildError> {
        let validator = create_request_validator(&schema, options.strict)?;
        Self::with_validator(schema, Box::new(validator))
    }

    pub(crate) fn with_validator(
        schema: RequestSchema,
        validator: Box<dyn ValidateRequest>,
    ) -> Result<Self, RouterBuildError> {
        let matcher = PathMatcher::compile(&schema.pathname)?;
        debug!(pattern = %schema.pathname, method = ?schema.method, "router created");
        Ok(Self { schema, matcher, validator, pipeline: Pipeline::new() })
    }

    /// The request schema this router was built from.
    pub fn schema(&self) -> &RequestSchema {
        &self.schema
    }

    /// The pathname pattern requests are matched against.
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    /// Appends a middleware to the chain.
    pub fn use_middleware<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware<RouterRequest, Response> + 'static,
    {
        self.pipeline.use_middleware(middleware);
        self
    }

    /// Appends an async fn handler whose arguments are extractors.
    pub fn use_handler<F, Args>(&mut self, f: F) -> &mut Self
    where
        F: FnTrait<Args> + 'static,
        F::Output: Responder,
        Args: FromRequest + Send + 'static,
    {
        self.use_middleware(handler_fn(f))
    }

    /// Same as [`Router::route`].
    pub fn use_route<M>(&mut self, name: &str, middleware: M) -> &mut Self
    where
        M: Middleware<RouterRequest, Response> + 'static,
    {
        self.route(name, middleware)
    }

    /// Mounts `middleware` under the pathname prefix `name`.
    ///
    /// Below the mount, the request pathname is relative to it: with `route("/admin", m)`,
    /// a request for `/admin/users` reaches `m` as `/users`.
    pub fn route<M>(&mut self, name: &str, middleware: M) -> &mut Self
    where
        M: Middleware<RouterRequest, Response> + 'static,
    {
        self.use_middleware(Route::new(name, middleware))
    }

    /// Appends a handler that answers only requests whose raw body has `body_type`.
    ///
    /// The handler receives the body's inner value, see [`FromBody`].
    pub fn match_body<F, T, Fut, R>(&mut self, body_type: BodyType, f: F) -> &mut Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        T: FromBody + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Responder + 'static,
    {
        self.use_middleware(MatchBody::new(body_type, f))
    }

    /// Serves files from `dir` under the mount `name`.
    pub fn serve(&mut self, name: &str, dir: impl Into<PathBuf>) -> &mut Self {
        self.route(name, ServeDir::new(dir))
    }

    /// Method, path and validation checks, in that order.
    pub fn prepare(&self, input: RouterInput) -> Result<RouterRequest, RouterError> {
        if let Some(expected) = &self.schema.method {
            let received = input.method();
            if !received.is_some_and(|method| method.eq_ignore_ascii_case(expected)) {
                debug!(expected = %expected, received = ?received, "method not matched");
                return Err(RouterError::method_not_matched(expected, received));
            }
        }

        let Some(params) = self.matcher.matches(input.pathname()) else {
            debug!(pattern = %self.matcher.pattern(), pathname = %input.pathname(), "path not matched");
            return Err(RouterError::path_not_matched(self.matcher.pattern(), input.pathname()));
        };

        let candidate = self.schema.candidate(&input, &params);
        let value = self.validator.validate(&candidate).inspect_err(|e| {
            debug!(pathname = %input.pathname(), cause = %e, "request validation failed");
        })?;

        trace!(pathname = %input.pathname(), "request accepted");
        Ok(RouterRequest::new(input, params, value))
    }

    /// Prepares `input` and, when it is accepted, returns the future running the chain.
    ///
    /// Rejections are returned synchronously so a caller can try another router without
    /// polling anything.
    pub fn run<'a>(
        &'a self,
        input: RouterInput,
        options: RunOptions<'a, RouterRequest, Response>,
    ) -> Result<Dispatch<'a>, RouterError> {
        let request = self.prepare(input)?;
        Ok(self.pipeline.run(request, options))
    }

    /// Runs `input` to completion, converting middleware failures into [`RouterError::Handler`].
    pub async fn handle(&self, input: RouterInput) -> Result<Response, RouterError> {
        self.run(input, RunOptions::default())?.await.map_err(RouterError::handler)
    }

    /// Runs this router as a step of an enclosing chain.
    ///
    /// The outer request is re-run against this router's schema, starting from its effective
    /// pathname. A rejection propagates as an error. When this router's chain ends without
    /// a response, the outer chain continues with the outer request, exactly once.
    pub async fn middleware(
        &self,
        req: RouterRequest,
        next: Next<'_, RouterRequest, Response>,
    ) -> Result<Response, BoxError> {
        let input = req.to_input();
        let context = next.context().clone();
        let outer = Mutex::new(Some((next, req)));
        let slot = &outer;

        let options = RunOptions::<RouterRequest, Response>::new(context).on_last(move |_, _| async move {
            let taken = slot.lock().await.take();
            match taken {
                Some((next, req)) => next.run(req).await,
                None => Ok(Response::unset()),
            }
        });

        let response = self.run(input, options)?.await?;
        if !response.is_unset() {
            return Ok(response);
        }

        let taken = outer.lock().await.take();
        match taken {
            Some((next, req)) => {
                trace!(pattern = %self.matcher.pattern(), "embedded router gave no response, continue outer chain");
                next.run(req).await
            }
            None => Ok(response),
        }
    }
}

#[async_trait]
impl Middleware<RouterRequest, Response> for Router {
    async fn call(&self, req: RouterRequest, next: Next<'_, RouterRequest, Response>) -> Result<Response, BoxError> {
        self.middleware(req, next).await
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("schema", &self.schema)
            .field("matcher", &self.matcher)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::MockValidateRequest;
    use micro_schema::ValidationError;
    use serde_json::json;

    #[tokio::test]
    async fn test_method_rejected_before_validation() {
        let mut validator = MockValidateRequest::new();
        validator.expect_validate().never();

        let schema = RequestSchema::new("/users").method("POST");
        let router = Router::with_validator(schema, Box::new(validator)).unwrap();

        let error = router.prepare(RouterInput::new("/users").with_method("GET")).unwrap_err();
        assert_eq!(error.to_string(), "Expected method to be POST, but received GET");
    }

    #[tokio::test]
    async fn test_path_rejected_before_validation() {
        let mut validator = MockValidateRequest::new();
        validator.expect_validate().never();

        let router = Router::with_validator(RequestSchema::new("/users/:id"), Box::new(validator)).unwrap();

        let error = router.prepare(RouterInput::new("/posts/1")).unwrap_err();
        assert!(matches!(error, RouterError::PathNotMatched { .. }));
    }

    #[tokio::test]
    async fn test_validator_sees_projected_candidate() {
        let mut validator = MockValidateRequest::new();
        validator
            .expect_validate()
            .withf(|candidate| candidate == &json!({ "pathname": "/users/1", "method": "get" }))
            .times(1)
            .returning(|candidate| Ok(candidate.clone()));

        let schema = RequestSchema::new("/users/:id").method("GET");
        let router = Router::with_validator(schema, Box::new(validator)).unwrap();

        let request = router.prepare(RouterInput::new("/users/1").with_method("get").with_query("q", "x")).unwrap();
        assert_eq!(request.path_params().get("id"), Some("1"));
    }

    #[tokio::test]
    async fn test_validation_error_is_rejection() {
        let mut validator = MockValidateRequest::new();
        validator.expect_validate().returning(|_| Err(ValidationError::new(&["params".to_string()], "bad")));

        let router = Router::with_validator(RequestSchema::new("/"), Box::new(validator)).unwrap();

        let error = router.handle(RouterInput::new("/")).await.unwrap_err();
        assert!(error.is_rejection());
        assert_eq!(error.to_string(), "params: bad");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: RouterOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, RouterOptions::default());

        let options: RouterOptions = serde_json::from_value(json!({ "strict": true })).unwrap();
        assert_eq!(options, RouterOptions::strict());
    }
}
