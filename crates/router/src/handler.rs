//! Adapters turning plain functions into [`Middleware`]s.
//!
//! - [`handler_fn`]: an async fn whose arguments are [`FromRequest`] extractors. It always
//!   answers; the rest of the chain never runs.
//! - [`middleware_fn`]: a closure receiving the request and the [`Next`] cursor.
//! - [`MatchBody`]: answers only for requests whose body has a given [`BodyType`].

use crate::extract::FromRequest;
use crate::fn_trait::FnTrait;
use crate::input::{BodyType, FromBody};
use crate::pipeline::{BoxError, Middleware, Next};
use crate::request::RouterRequest;
use crate::responder::Responder;
use crate::response::Response;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::marker::PhantomData;
use tracing::{trace, warn};

/// a `FnTrait` holder which represents any async Fn
pub struct FnHandler<F, Args> {
    f: F,
    _phantom: PhantomData<fn(Args)>,
}

impl<F, Args> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    fn new(f: F) -> Self {
        Self { f, _phantom: PhantomData }
    }
}

impl<F, Args> Debug for FnHandler<F, Args> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").field("f", &std::any::type_name::<F>()).finish()
    }
}

pub fn handler_fn<F, Args>(f: F) -> FnHandler<F, Args>
where
    F: FnTrait<Args>,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Args> Middleware<RouterRequest, Response> for FnHandler<F, Args>
where
    F: FnTrait<Args>,
    F::Output: Responder,
    Args: FromRequest + Send + 'static,
{
    async fn call(&self, req: RouterRequest, next: Next<'_, RouterRequest, Response>) -> Result<Response, BoxError> {
        let args = Args::from_request(&req, next.context())?;
        self.f.call(args).await.respond()
    }
}

/// A closure with full control over the rest of the chain.
pub struct FnMiddleware<F> {
    f: F,
}

impl<F> Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware").finish_non_exhaustive()
    }
}

/// Wraps a closure as a middleware.
///
/// ```
/// use futures::FutureExt;
/// use micro_router::{middleware_fn, BoxError};
///
/// let logger = middleware_fn(|req, next| {
///     async move {
///         let pathname = req.pathname().to_string();
///         let response = next.run(req).await?;
///         tracing::info!(pathname, status = %response.status(), "served");
///         Ok::<_, BoxError>(response)
///     }
///     .boxed()
/// });
/// # let _ = logger;
/// ```
pub fn middleware_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(RouterRequest, Next<'a, RouterRequest, Response>) -> BoxFuture<'a, Result<Response, BoxError>>
        + Send
        + Sync,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F> Middleware<RouterRequest, Response> for FnMiddleware<F>
where
    F: for<'a> Fn(RouterRequest, Next<'a, RouterRequest, Response>) -> BoxFuture<'a, Result<Response, BoxError>>
        + Send
        + Sync,
{
    async fn call(&self, req: RouterRequest, next: Next<'_, RouterRequest, Response>) -> Result<Response, BoxError> {
        (self.f)(req, next).await
    }
}

/// Answers requests whose raw body has the given type and passes the others on.
///
/// The handler receives the inner value of the body, e.g. a `String` for
/// [`BodyType::Text`] or a [`serde_json::Value`] for [`BodyType::Json`]. A handler taking
/// [`RequestBody`](crate::RequestBody) receives the whole body.
pub struct MatchBody<F, T> {
    body_type: BodyType,
    f: F,
    _phantom: PhantomData<fn(T)>,
}

impl<F, T> MatchBody<F, T> {
    pub fn new(body_type: BodyType, f: F) -> Self {
        Self { body_type, f, _phantom: PhantomData }
    }
}

impl<F, T> Debug for MatchBody<F, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchBody").field("body_type", &self.body_type).finish_non_exhaustive()
    }
}

#[async_trait]
impl<F, T, Fut, R> Middleware<RouterRequest, Response> for MatchBody<F, T>
where
    F: Fn(T) -> Fut + Send + Sync,
    T: FromBody + Send + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: Responder + 'static,
{
    async fn call(&self, req: RouterRequest, next: Next<'_, RouterRequest, Response>) -> Result<Response, BoxError> {
        let body_type = req.raw_body().body_type();
        if body_type != self.body_type {
            trace!(expected = ?self.body_type, received = ?body_type, "body type not matched");
            return next.run(req).await;
        }
        match T::from_body(req.raw_body().clone()) {
            Some(body) => (self.f)(body).await.respond(),
            None => {
                warn!(body_type = ?self.body_type, "handler argument does not fit the matched body type");
                next.run(req).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Params, Pathname};
    use crate::input::{RequestBody, RouterInput};
    use crate::matcher::PathParams;
    use crate::pipeline::{Pipeline, RunOptions};
    use futures::FutureExt;
    use http::Method;
    use serde::Deserialize;
    use serde_json::json;

    fn assert_is_middleware<T: Middleware<RouterRequest, Response>>(_handler: &T) {
        // no op
    }

    #[derive(Deserialize)]
    struct Id {
        id: u64,
    }

    fn request(body: RequestBody) -> RouterRequest {
        let value = json!({ "pathname": "/users/3", "params": { "id": 3 } });
        RouterRequest::new(RouterInput::new("/users/3").with_method("GET").with_body(body), PathParams::empty(), value)
    }

    #[test]
    fn assert_fn_is_middleware() {
        async fn zero() {}
        async fn one(_method: Method) -> &'static str {
            "ok"
        }
        async fn two(_method: Method, _pathname: Pathname) -> Response {
            Response::empty()
        }

        assert_is_middleware(&handler_fn(zero));
        assert_is_middleware(&handler_fn(one));
        assert_is_middleware(&handler_fn(two));
    }

    #[tokio::test]
    async fn test_handler_extracts_arguments() {
        async fn show(Params(Id { id }): Params<Id>, method: Method) -> String {
            format!("{method} {id}")
        }

        let mut pipeline: Pipeline<RouterRequest, Response> = Pipeline::new();
        pipeline.use_middleware(handler_fn(show));

        let response = pipeline.run(request(RequestBody::Empty), RunOptions::default()).await.unwrap();
        assert_eq!(response, Response::text("GET 3"));
    }

    #[tokio::test]
    async fn test_extraction_failure_is_error() {
        async fn show(Params(_id): Params<String>) {}

        let mut pipeline: Pipeline<RouterRequest, Response> = Pipeline::new();
        pipeline.use_middleware(handler_fn(show));

        let error = pipeline.run(request(RequestBody::Empty), RunOptions::default()).await.unwrap_err();
        assert!(error.to_string().contains("params"));
    }

    #[tokio::test]
    async fn test_middleware_fn_wraps_next() {
        let mut pipeline: Pipeline<RouterRequest, Response> = Pipeline::new();
        pipeline
            .use_middleware(middleware_fn(|req, next| {
                async move {
                    let response = next.run(req).await?;
                    Ok::<_, BoxError>(response.with_status(http::StatusCode::ACCEPTED))
                }
                .boxed()
            }))
            .use_middleware(handler_fn(|| async { "inner" }));

        let response = pipeline.run(request(RequestBody::Empty), RunOptions::default()).await.unwrap();
        assert_eq!(response.status(), http::StatusCode::ACCEPTED);
        assert_eq!(response, Response::text("inner").with_status(http::StatusCode::ACCEPTED));
    }

    #[tokio::test]
    async fn test_match_body() {
        let mut pipeline: Pipeline<RouterRequest, Response> = Pipeline::new();
        pipeline
            .use_middleware(MatchBody::new(BodyType::Json, |value: serde_json::Value| async move { Response::json(value) }))
            .use_middleware(handler_fn(|| async { "fallback" }));

        let json = pipeline.run(request(RequestBody::Json(json!({ "a": 1 }))), RunOptions::default()).await.unwrap();
        assert_eq!(json, Response::json(json!({ "a": 1 })));

        let text = pipeline.run(request(RequestBody::Text("a".into())), RunOptions::default()).await.unwrap();
        assert_eq!(text, Response::text("fallback"));
    }

    #[tokio::test]
    async fn test_match_body_argument_of_another_type_passes_on() {
        let mut pipeline: Pipeline<RouterRequest, Response> = Pipeline::new();
        pipeline
            .use_middleware(MatchBody::new(BodyType::Text, |bytes: bytes::Bytes| async move { Response::buffer(bytes) }))
            .use_middleware(handler_fn(|| async { "fallback" }));

        let text = pipeline.run(request(RequestBody::Text("a".into())), RunOptions::default()).await.unwrap();
        assert_eq!(text, Response::text("fallback"));
    }
}
