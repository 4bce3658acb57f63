//! The raw request a router runs on.
//!
//! A [`RouterInput`] carries everything the request schema can describe: the pathname,
//! the method, query, headers, cookies and the decoded body. It is built directly in tests
//! and by server adapters, or from an [`http::request::Parts`] plus body bytes.

use crate::error::InputError;
use bytes::Bytes;
use http::HeaderMap;
use http::request::Parts;
use mime::Mime;
use serde_json::{Map, Value};

/// Decoded request body, tagged by how it was sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    Form(Map<String, Value>),
    /// Opaque bytes; never offered to the validator, only to body-type matchers.
    Buffer(Bytes),
}

/// The tag of a [`RequestBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    Empty,
    Text,
    Json,
    Form,
    Buffer,
}

impl RequestBody {
    pub fn body_type(&self) -> BodyType {
        match self {
            RequestBody::Empty => BodyType::Empty,
            RequestBody::Text(_) => BodyType::Text,
            RequestBody::Json(_) => BodyType::Json,
            RequestBody::Form(_) => BodyType::Form,
            RequestBody::Buffer(_) => BodyType::Buffer,
        }
    }

    /// Decodes `bytes` according to the request's content type.
    ///
    /// `application/json` and `application/x-www-form-urlencoded` are parsed, any `text/*`
    /// becomes [`RequestBody::Text`], everything else stays a buffer.
    pub fn decode(content_type: Option<&Mime>, bytes: Bytes) -> Result<Self, InputError> {
        if bytes.is_empty() {
            return Ok(RequestBody::Empty);
        }

        let Some(content_type) = content_type else {
            return Ok(RequestBody::Buffer(bytes));
        };

        match (content_type.type_(), content_type.subtype()) {
            (mime::APPLICATION, mime::JSON) => Ok(RequestBody::Json(serde_json::from_slice(&bytes)?)),
            (mime::APPLICATION, mime::WWW_FORM_URLENCODED) => {
                let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
                    .map_err(|source| InputError::InvalidForm { source })?;
                Ok(RequestBody::Form(collect_pairs(pairs)))
            }
            (mime::TEXT, _) => {
                String::from_utf8(bytes.to_vec()).map(RequestBody::Text).map_err(|source| InputError::InvalidText { source })
            }
            _ => Ok(RequestBody::Buffer(bytes)),
        }
    }

    /// The body as offered to the validator, `None` when there is nothing to validate.
    pub(crate) fn to_value(&self) -> Option<Value> {
        match self {
            RequestBody::Empty | RequestBody::Buffer(_) => None,
            RequestBody::Text(text) => Some(Value::String(text.clone())),
            RequestBody::Json(value) => Some(value.clone()),
            RequestBody::Form(map) => Some(Value::Object(map.clone())),
        }
    }
}

/// The inner value of one [`RequestBody`] variant, handed to [`match_body`](crate::Router::match_body)
/// handlers.
///
/// `RequestBody` itself accepts every variant.
pub trait FromBody: Sized {
    fn from_body(body: RequestBody) -> Option<Self>;
}

impl FromBody for RequestBody {
    fn from_body(body: RequestBody) -> Option<Self> {
        Some(body)
    }
}

impl FromBody for () {
    fn from_body(body: RequestBody) -> Option<Self> {
        matches!(body, RequestBody::Empty).then_some(())
    }
}

macro_rules! impl_from_body {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
        impl FromBody for $ty {
            fn from_body(body: RequestBody) -> Option<Self> {
                match body {
                    RequestBody::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
        )*
    };
}

impl_from_body! {
    Text => String,
    Json => Value,
    Form => Map<String, Value>,
    Buffer => Bytes,
}

/// A raw, not yet validated request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouterInput {
    pathname: String,
    method: Option<String>,
    query: Map<String, Value>,
    headers: Map<String, Value>,
    cookies: Map<String, Value>,
    body: RequestBody,
}

impl RouterInput {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self { pathname: pathname.into(), ..Self::default() }
    }

    /// Builds an input from request head parts and the already collected body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Result<Self, InputError> {
        let mut input = Self::new(parts.uri.path()).with_method(parts.method.as_str());

        if let Some(query) = parts.uri.query() {
            input = input.with_query_string(query)?;
        }

        input.headers = header_map_to_object(&parts.headers);
        input.cookies = parse_cookies(&parts.headers);

        let content_type =
            parts.headers.get(http::header::CONTENT_TYPE).and_then(|value| value.to_str().ok()?.parse::<Mime>().ok());
        input.body = RequestBody::decode(content_type.as_ref(), body)?;

        Ok(input)
    }

    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Adds a query value; a repeated name collects its values into a list.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        push_value(&mut self.query, name.into(), value.into());
        self
    }

    /// Parses an `application/x-www-form-urlencoded` query string into the query map.
    pub fn with_query_string(mut self, query: &str) -> Result<Self, InputError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query)
            .map_err(|source| InputError::InvalidQuery { source })?;
        for (name, value) in pairs {
            push_value(&mut self.query, name, value);
        }
        Ok(self)
    }

    /// Adds a header; the name is lower-cased like [`http::HeaderName`] does.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        push_value(&mut self.headers, name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), Value::String(value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn headers(&self) -> &Map<String, Value> {
        &self.headers
    }

    pub fn cookies(&self) -> &Map<String, Value> {
        &self.cookies
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    pub(crate) fn set_pathname(&mut self, pathname: String) {
        self.pathname = pathname;
    }
}

fn push_value(map: &mut Map<String, Value>, name: String, value: String) {
    match map.get_mut(&name) {
        None => {
            map.insert(name, Value::String(value));
        }
        Some(Value::Array(values)) => values.push(Value::String(value)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(value)]);
        }
    }
}

fn collect_pairs(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in pairs {
        push_value(&mut map, name, value);
    }
    map
}

fn header_map_to_object(headers: &HeaderMap) -> Map<String, Value> {
    let mut map = Map::new();
    for (name, value) in headers {
        push_value(&mut map, name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

fn parse_cookies(headers: &HeaderMap) -> Map<String, Value> {
    headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), Value::String(value.trim().trim_matches('"').to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;
    use serde_json::json;

    #[test]
    fn test_repeated_query_collects_list() {
        let input = RouterInput::new("/").with_query_string("tag=a&tag=b&tag=c&q=x").unwrap();
        assert_eq!(input.query().get("tag"), Some(&json!(["a", "b", "c"])));
        assert_eq!(input.query().get("q"), Some(&json!("x")));
    }

    #[test]
    fn test_from_parts() {
        let (parts, ()) = Request::builder()
            .method("POST")
            .uri("/users/1?debug=1")
            .header("X-Token", "abc")
            .header(http::header::COOKIE, "session=s1; theme=\"dark\"")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(())
            .unwrap()
            .into_parts();

        let input = RouterInput::from_parts(&parts, Bytes::from_static(br#"{"name":"foo"}"#)).unwrap();

        assert_eq!(input.pathname(), "/users/1");
        assert_eq!(input.method(), Some("POST"));
        assert_eq!(input.query().get("debug"), Some(&json!("1")));
        assert_eq!(input.headers().get("x-token"), Some(&json!("abc")));
        assert_eq!(input.cookies().get("theme"), Some(&json!("dark")));
        assert_eq!(input.cookies().get("session"), Some(&json!("s1")));
        assert_eq!(input.body(), &RequestBody::Json(json!({ "name": "foo" })));
    }

    #[test]
    fn test_decode_body() {
        let form = RequestBody::decode(Some(&mime::APPLICATION_WWW_FORM_URLENCODED), Bytes::from_static(b"a=1&b=2"))
            .unwrap();
        assert_eq!(form.body_type(), BodyType::Form);
        assert_eq!(form.to_value(), Some(json!({ "a": "1", "b": "2" })));

        let text = RequestBody::decode(Some(&mime::TEXT_PLAIN_UTF_8), Bytes::from_static(b"hello")).unwrap();
        assert_eq!(text, RequestBody::Text("hello".into()));

        let buffer = RequestBody::decode(Some(&mime::IMAGE_PNG), Bytes::from_static(&[1, 2, 3])).unwrap();
        assert_eq!(buffer.body_type(), BodyType::Buffer);
        assert_eq!(buffer.to_value(), None);

        assert_eq!(RequestBody::decode(None, Bytes::new()).unwrap(), RequestBody::Empty);
        assert!(matches!(
            RequestBody::decode(Some(&mime::APPLICATION_JSON), Bytes::from_static(b"{")),
            Err(InputError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_headers_lowercased() {
        let input = RouterInput::new("/").with_header("Accept", "text/html").with_header("ACCEPT", "text/plain");
        assert_eq!(input.headers().get("accept"), Some(&json!(["text/html", "text/plain"])));
    }

    #[test]
    fn test_from_body_takes_the_matching_variant() {
        assert_eq!(String::from_body(RequestBody::Text("hi".into())), Some("hi".to_string()));
        assert_eq!(Value::from_body(RequestBody::Json(json!([1]))), Some(json!([1])));
        assert_eq!(Bytes::from_body(RequestBody::Buffer(Bytes::from_static(b"x"))), Some(Bytes::from_static(b"x")));
        assert_eq!(<()>::from_body(RequestBody::Empty), Some(()));
        assert_eq!(String::from_body(RequestBody::Json(json!("hi"))), None);
        assert!(Map::<String, Value>::from_body(RequestBody::Empty).is_none());
        assert_eq!(RequestBody::from_body(RequestBody::Empty), Some(RequestBody::Empty));
    }
}
