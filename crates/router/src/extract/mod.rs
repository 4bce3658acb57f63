//! Typed handler arguments.
//!
//! Each wrapper deserializes one slot of the validated request value:
//!
//! | wrapper      | slot      |
//! |--------------|-----------|
//! | [`Params`]   | `params`  |
//! | [`Query`]    | `query`   |
//! | [`Body`]     | `body`    |
//! | [`Headers`]  | `headers` |
//! | [`Cookies`]  | `cookies` |
//!
//! Because the value already passed validation, `"42"` in a path param declared as
//! [`Schema::Int`](micro_schema::Schema::Int) deserializes straight into a `u64`.

mod extract_tuple;
mod from_request;

pub use from_request::FromRequest;

use crate::error::ExtractError;
use crate::request::{Context, RouterRequest};
use serde::de::DeserializeOwned;
use std::ops::{Deref, DerefMut};

macro_rules! slot_extractor {
    ($(#[$meta:meta])* $name:ident, $accessor:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name<T>(pub T);

        impl<T> $name<T> {
            pub fn into_inner(self) -> T {
                self.0
            }
        }

        impl<T> Deref for $name<T> {
            type Target = T;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl<T> DerefMut for $name<T> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl<T: DeserializeOwned> FromRequest for $name<T> {
            fn from_request(req: &RouterRequest, _context: &Context) -> Result<Self, ExtractError> {
                req.$accessor::<T>().map($name)
            }
        }
    };
}

slot_extractor!(
    /// The validated path params.
    Params, params
);
slot_extractor!(
    /// The validated query.
    Query, query
);
slot_extractor!(
    /// The validated body.
    Body, body
);
slot_extractor!(Headers, headers);
slot_extractor!(Cookies, cookies);

/// The effective pathname, relative to the innermost mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pathname(pub String);

impl FromRequest for Pathname {
    fn from_request(req: &RouterRequest, _context: &Context) -> Result<Self, ExtractError> {
        Ok(Pathname(req.pathname().to_string()))
    }
}
