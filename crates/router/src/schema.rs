//! The declarative description of the requests a router accepts.

use crate::input::RouterInput;
use crate::matcher::PathParams;
use micro_schema::{Fields, Schema, SchemaError};
use serde_json::{Map, Value};

/// What a router matches and validates.
///
/// `pathname` is required and is compiled into a path matcher. `method`, when set, is
/// compared case-insensitively before anything else. Every other slot is optional; an
/// undeclared slot is neither validated nor visible in [`RouterRequest::value`](crate::RouterRequest::value).
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSchema {
    pub pathname: String,
    pub method: Option<String>,
    pub params: Option<Fields>,
    pub query: Option<Fields>,
    pub headers: Option<Fields>,
    pub cookies: Option<Fields>,
    pub body: Option<Schema>,
}

impl RequestSchema {
    /// A schema for requests matching `pathname`, with any method.
    pub fn new(pathname: impl Into<String>) -> Self {
        Self { pathname: pathname.into(), method: None, params: None, query: None, headers: None, cookies: None, body: None }
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn params(mut self, params: Fields) -> Self {
        self.params = Some(params);
        self
    }

    #[must_use]
    pub fn query(mut self, query: Fields) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: Fields) -> Self {
        self.headers = Some(headers);
        self
    }

    #[must_use]
    pub fn cookies(mut self, cookies: Fields) -> Self {
        self.cookies = Some(cookies);
        self
    }

    /// Declares the body. Unlike the other slots it may be any schema, not only a struct.
    #[must_use]
    pub fn body(mut self, body: impl Into<Schema>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The request value handed to the validator: the input projected on the declared slots.
    ///
    /// `params` comes from the path matcher, not from the input.
    pub(crate) fn candidate(&self, input: &RouterInput, params: &PathParams) -> Value {
        let mut candidate = Map::new();
        candidate.insert("pathname".to_string(), Value::String(input.pathname().to_string()));

        if self.method.is_some()
            && let Some(method) = input.method()
        {
            candidate.insert("method".to_string(), Value::String(method.to_string()));
        }
        if self.params.is_some() {
            candidate.insert("params".to_string(), params.to_value());
        }
        if self.query.is_some() {
            candidate.insert("query".to_string(), Value::Object(input.query().clone()));
        }
        if self.headers.is_some() {
            candidate.insert("headers".to_string(), Value::Object(input.headers().clone()));
        }
        if self.cookies.is_some() {
            candidate.insert("cookies".to_string(), Value::Object(input.cookies().clone()));
        }
        if self.body.is_some()
            && let Some(body) = input.body().to_value()
        {
            candidate.insert("body".to_string(), body);
        }

        Value::Object(candidate)
    }
}

/// Builds the struct schema of a whole request from a [`RequestSchema`].
///
/// `pathname` is always a string field and `method` a string field when declared. The
/// result is [`checked`](Schema::check), so a descriptor that can never accept a value
/// fails here and not on every request.
pub fn build_request_schema(schema: &RequestSchema) -> Result<Schema, SchemaError> {
    let mut fields = Fields::new().field("pathname", Schema::String);

    if schema.method.is_some() {
        fields.insert("method", Schema::String);
    }

    let slots = [("params", &schema.params), ("query", &schema.query), ("headers", &schema.headers), ("cookies", &schema.cookies)];
    for (name, slot) in slots {
        if let Some(slot) = slot {
            fields.insert(name, Schema::Struct(slot.clone()));
        }
    }

    if let Some(body) = &schema.body {
        fields.insert("body", body.clone());
    }

    let schema = Schema::Struct(fields);
    schema.check()?;
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::RequestBody;
    use micro_schema::fields;
    use serde_json::json;

    #[test]
    fn test_build_only_declared_slots() {
        let schema = RequestSchema::new("/users/:id").params(fields! { "id" => Schema::Int });
        let Schema::Struct(fields) = build_request_schema(&schema).unwrap() else {
            panic!("request schema must be a struct");
        };
        assert_eq!(fields.names().collect::<Vec<_>>(), vec!["params", "pathname"]);
    }

    #[test]
    fn test_build_rejects_invalid_descriptor() {
        let schema = RequestSchema::new("/").body(Schema::union([]));
        assert!(build_request_schema(&schema).is_err());
    }

    #[test]
    fn test_candidate_projects_declared_slots() {
        let schema = RequestSchema::new("/users/:id").method("POST").params(fields! { "id" => Schema::Int });
        let input = RouterInput::new("/users/1")
            .with_method("post")
            .with_query("debug", "1")
            .with_body(RequestBody::Json(json!({ "name": "foo" })));
        let params = PathParams::from_iter([("id".to_string(), "1".to_string())]);

        assert_eq!(
            schema.candidate(&input, &params),
            json!({ "pathname": "/users/1", "method": "post", "params": { "id": "1" } })
        );
    }

    #[test]
    fn test_candidate_omits_buffer_body() {
        let schema = RequestSchema::new("/").body(Schema::Any);
        let input = RouterInput::new("/").with_body(RequestBody::Buffer(bytes::Bytes::from_static(b"raw")));
        assert_eq!(schema.candidate(&input, &PathParams::empty()), json!({ "pathname": "/" }));
    }
}
