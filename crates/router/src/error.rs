use crate::matcher::PatternError;
use crate::pipeline::BoxError;
use micro_schema::{SchemaError, ValidationError};
use thiserror::Error;

/// A router that can not be built. Raised once, by [`Router::new`](crate::Router::new).
#[derive(Error, Debug)]
pub enum RouterBuildError {
    #[error("invalid pathname pattern: {source}")]
    Pattern {
        #[from]
        source: PatternError,
    },

    #[error("invalid request schema: {source}")]
    Schema {
        #[from]
        source: SchemaError,
    },
}

/// Why a single request was not served.
///
/// Method, path and validation rejections are expected conditions: a caller composing
/// several routers can check [`RouterError::is_rejection`] and try the next one.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("Expected method to be {expected}, but received {}", .received.as_deref().unwrap_or("nothing"))]
    MethodNotMatched { expected: String, received: Option<String> },

    #[error("{pattern} is not matched, received: {pathname}")]
    PathNotMatched { pattern: String, pathname: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("handler failed: {source}")]
    Handler {
        #[source]
        source: BoxError,
    },
}

impl RouterError {
    pub fn method_not_matched<S: ToString>(expected: S, received: Option<&str>) -> Self {
        Self::MethodNotMatched { expected: expected.to_string(), received: received.map(ToString::to_string) }
    }

    pub fn path_not_matched<P: ToString, S: ToString>(pattern: P, pathname: S) -> Self {
        Self::PathNotMatched { pattern: pattern.to_string(), pathname: pathname.to_string() }
    }

    pub fn handler(source: BoxError) -> Self {
        Self::Handler { source }
    }

    /// True for the per-request rejections raised before any middleware runs.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, RouterError::Handler { .. })
    }
}

/// A raw request that could not be turned into a [`RouterInput`](crate::RouterInput).
#[derive(Error, Debug)]
pub enum InputError {
    #[error("invalid query string: {source}")]
    InvalidQuery {
        #[source]
        source: serde_urlencoded::de::Error,
    },

    #[error("invalid json body: {source}")]
    InvalidJson {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid form body: {source}")]
    InvalidForm {
        #[source]
        source: serde_urlencoded::de::Error,
    },

    #[error("text body is not utf8: {source}")]
    InvalidText {
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// A [`Response`](crate::Response) that could not be turned into an [`http::Response`].
#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("can not read file body: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid header value: {source}")]
    InvalidHeader {
        #[from]
        source: http::header::InvalidHeaderValue,
    },

    #[error("can not serialize json body: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// A handler argument that could not be extracted from the validated request.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("can not deserialize request {slot}: {source}")]
    Deserialize {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("request has no method")]
    MissingMethod,

    #[error("invalid http method: {method}")]
    InvalidMethod {
        method: String,
        #[source]
        source: http::method::InvalidMethod,
    },
}
