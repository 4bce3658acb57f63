use crate::error::ExtractError;
use crate::input::RequestBody;
use crate::matcher::PathParams;
use crate::request::{Context, RouterRequest};
use http::Method;

/// Builds a handler argument from the validated request and its context.
///
/// Extraction runs after validation, so it only reshapes data the request schema
/// already accepted.
pub trait FromRequest: Sized {
    fn from_request(req: &RouterRequest, context: &Context) -> Result<Self, ExtractError>;
}

impl<T: FromRequest> FromRequest for Option<T> {
    fn from_request(req: &RouterRequest, context: &Context) -> Result<Self, ExtractError> {
        Ok(T::from_request(req, context).ok())
    }
}

impl<T: FromRequest> FromRequest for Result<T, ExtractError> {
    fn from_request(req: &RouterRequest, context: &Context) -> Result<Self, ExtractError> {
        Ok(T::from_request(req, context))
    }
}

impl FromRequest for Method {
    fn from_request(req: &RouterRequest, _context: &Context) -> Result<Self, ExtractError> {
        let method = req.method().ok_or(ExtractError::MissingMethod)?;
        Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|source| ExtractError::InvalidMethod { method: method.to_string(), source })
    }
}

impl FromRequest for RouterRequest {
    fn from_request(req: &RouterRequest, _context: &Context) -> Result<Self, ExtractError> {
        Ok(req.clone())
    }
}

impl FromRequest for Context {
    fn from_request(_req: &RouterRequest, context: &Context) -> Result<Self, ExtractError> {
        Ok(context.clone())
    }
}

impl FromRequest for PathParams {
    fn from_request(req: &RouterRequest, _context: &Context) -> Result<Self, ExtractError> {
        Ok(req.path_params().clone())
    }
}

/// The raw decoded body, including bodies the validator never sees.
impl FromRequest for RequestBody {
    fn from_request(req: &RouterRequest, _context: &Context) -> Result<Self, ExtractError> {
        Ok(req.raw_body().clone())
    }
}
