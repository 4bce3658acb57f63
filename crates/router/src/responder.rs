//! Converts handler return values into [`Response`]s.
//!
//! A `Result` whose error is not a response propagates as a handler error; everything
//! else maps to a response value.

use crate::pipeline::BoxError;
use crate::response::Response;
use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::convert::Infallible;

/// A type a handler can return.
pub trait Responder {
    fn respond(self) -> Result<Response, BoxError>;
}

impl Responder for Response {
    fn respond(self) -> Result<Response, BoxError> {
        Ok(self)
    }
}

impl<T: Responder, E: Into<BoxError>> Responder for Result<T, E> {
    fn respond(self) -> Result<Response, BoxError> {
        match self {
            Ok(t) => t.respond(),
            Err(e) => Err(e.into()),
        }
    }
}

/// `None` leaves the response unset, so an enclosing router keeps looking.
impl<T: Responder> Responder for Option<T> {
    fn respond(self) -> Result<Response, BoxError> {
        match self {
            Some(t) => t.respond(),
            None => Ok(Response::unset()),
        }
    }
}

impl Responder for () {
    fn respond(self) -> Result<Response, BoxError> {
        Ok(Response::empty())
    }
}

impl Responder for String {
    fn respond(self) -> Result<Response, BoxError> {
        Ok(Response::text(self))
    }
}

impl Responder for &'static str {
    fn respond(self) -> Result<Response, BoxError> {
        Ok(Response::text(self))
    }
}

impl Responder for Value {
    fn respond(self) -> Result<Response, BoxError> {
        Ok(Response::json(self))
    }
}

impl Responder for Infallible {
    fn respond(self) -> Result<Response, BoxError> {
        match self {}
    }
}

/// Serializes the inner value as a json response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> Responder for Json<T> {
    fn respond(self) -> Result<Response, BoxError> {
        Ok(Response::json_from(&self.0)?)
    }
}

impl<T: Responder> Responder for (StatusCode, T) {
    fn respond(self) -> Result<Response, BoxError> {
        let (status, responder) = self;
        Ok(responder.respond()?.with_status(status))
    }
}

impl<T: Responder> Responder for (T, StatusCode) {
    fn respond(self) -> Result<Response, BoxError> {
        let (responder, status) = self;
        (status, responder).respond()
    }
}

impl<T: Responder> Responder for Box<T> {
    fn respond(self) -> Result<Response, BoxError> {
        (*self).respond()
    }
}
