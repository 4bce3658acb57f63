//! A typed request router.
//!
//! A [`Router`] is built from a [`RequestSchema`]: a pathname pattern, an optional method
//! and optional descriptors for params, query, headers, cookies and body. For every
//! [`RouterInput`] it
//!
//! 1. rejects a method or pathname that does not match,
//! 2. validates the request against the schema, coercing strings where declared,
//! 3. runs its middlewares in registration order on the validated [`RouterRequest`].
//!
//! # Example
//! ```
//! use micro_router::{fields, handler_fn, Params, RequestSchema, Router, RouterInput, RouterOptions, Schema};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Id {
//!     id: u64,
//! }
//!
//! async fn show(Params(Id { id }): Params<Id>) -> String {
//!     format!("user {id}")
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let schema = RequestSchema::new("/users/:id").method("GET").params(fields! { "id" => Schema::Int });
//! let mut router = Router::new(schema, RouterOptions::default()).unwrap();
//! router.use_middleware(handler_fn(show));
//!
//! let response = router.handle(RouterInput::new("/users/42").with_method("GET")).await.unwrap();
//! assert_eq!(response, micro_router::Response::text("user 42"));
//!
//! let rejected = router.handle(RouterInput::new("/users/abc").with_method("GET")).await;
//! assert!(rejected.unwrap_err().is_rejection());
//! # });
//! ```

mod body;
mod error;
mod fn_trait;
mod handler;
mod input;
mod matcher;
mod mount;
mod pipeline;
mod request;
mod responder;
mod response;
mod router;
mod schema;
mod validator;

pub mod extract;

pub use body::ResponseBody;
pub use error::ExtractError;
pub use error::InputError;
pub use error::ResponseError;
pub use error::RouterBuildError;
pub use error::RouterError;
pub use extract::{Body, Cookies, FromRequest, Headers, Params, Pathname, Query};
pub use fn_trait::FnTrait;
pub use handler::{FnHandler, FnMiddleware, MatchBody, handler_fn, middleware_fn};
pub use input::{BodyType, FromBody, RequestBody, RouterInput};
pub use matcher::{PathMatcher, PathParams, PatternError};
pub use mount::{Route, ServeDir};
pub use pipeline::{BoxError, Last, Middleware, Next, Pipeline, RunOptions};
pub use request::{Context, RouterRequest};
pub use responder::{Json, Responder};
pub use response::{Payload, Response};
pub use router::{Dispatch, Router, RouterOptions};
pub use schema::{RequestSchema, build_request_schema};
pub use validator::{ValidateRequest, create_request_validator};

pub use micro_schema::{Fields, Mode, Schema, SchemaError, ValidationError, Validator, fields};
