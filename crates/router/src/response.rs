//! The response value produced by handlers.
//!
//! A [`Response`] is plain data: a status, headers and one [`Payload`] variant. Turning it
//! into an [`http::Response`] happens once, at the edge, with [`Response::into_http`].

use crate::body::ResponseBody;
use crate::error::ResponseError;
use bytes::Bytes;
use futures::TryStreamExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use http_body::Frame;
use http_body_util::StreamBody;
use mime::Mime;
use serde::Serialize;
use serde_json::Value;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing::{debug, error};

/// What a response carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    /// Nothing was produced. An enclosing router treats this as "not handled".
    #[default]
    Unset,
    Empty,
    Text(String),
    Html(String),
    Json(Value),
    Buffer(Bytes),
    /// A file on disk, read when the response is sent.
    File(PathBuf),
    Redirect(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    payload: Payload,
}

impl Response {
    fn with_payload(payload: Payload) -> Self {
        Self { payload, ..Self::default() }
    }

    /// No response at all; an enclosing chain moves on, and it converts to `404`.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self::with_payload(Payload::Empty)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::with_payload(Payload::Text(text.into()))
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self::with_payload(Payload::Html(html.into()))
    }

    pub fn json(value: Value) -> Self {
        Self::with_payload(Payload::Json(value))
    }

    /// Serializes `value` into a json response.
    pub fn json_from<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::json)
    }

    pub fn buffer(bytes: impl Into<Bytes>) -> Self {
        Self::with_payload(Payload::Buffer(bytes.into()))
    }

    /// A file streamed from disk when converted. The content type follows the extension.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::with_payload(Payload::File(path.into()))
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::with_payload(Payload::Redirect(location.into())).with_status(StatusCode::FOUND)
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn is_unset(&self) -> bool {
        matches!(self.payload, Payload::Unset)
    }

    /// Converts into an [`http::Response`].
    ///
    /// An unset response becomes `404 Not Found`, as does a file that does not exist. A
    /// content type is added per payload unless one was set explicitly.
    pub async fn into_http(self) -> Result<http::Response<ResponseBody>, ResponseError> {
        let Response { mut status, mut headers, payload } = self;

        let body = match payload {
            Payload::Unset => {
                status = StatusCode::NOT_FOUND;
                ResponseBody::empty()
            }
            Payload::Empty => ResponseBody::empty(),
            Payload::Text(text) => {
                set_content_type(&mut headers, &mime::TEXT_PLAIN_UTF_8);
                ResponseBody::from(text)
            }
            Payload::Html(html) => {
                set_content_type(&mut headers, &mime::TEXT_HTML_UTF_8);
                ResponseBody::from(html)
            }
            Payload::Json(value) => {
                set_content_type(&mut headers, &mime::APPLICATION_JSON);
                ResponseBody::from(serde_json::to_vec(&value)?)
            }
            Payload::Buffer(bytes) => {
                set_content_type(&mut headers, &mime::APPLICATION_OCTET_STREAM);
                ResponseBody::from(bytes)
            }
            Payload::Redirect(location) => {
                headers.insert(LOCATION, HeaderValue::try_from(location)?);
                ResponseBody::empty()
            }
            Payload::File(path) => match open_file(&path).await? {
                Some((file, len)) => {
                    set_content_type(&mut headers, &mime_for(&path));
                    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
                    let stream = ReaderStream::new(file).map_ok(Frame::data);
                    ResponseBody::streaming(StreamBody::new(stream))
                }
                None => {
                    status = StatusCode::NOT_FOUND;
                    ResponseBody::empty()
                }
            },
        };

        let mut response = http::Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

fn set_content_type(headers: &mut HeaderMap, mime: &Mime) {
    if !headers.contains_key(CONTENT_TYPE)
        && let Ok(value) = HeaderValue::from_str(mime.as_ref())
    {
        headers.insert(CONTENT_TYPE, value);
    }
}

/// Opens a regular file, `None` when there is no such file.
async fn open_file(path: &Path) -> io::Result<Option<(tokio::fs::File, u64)>> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "file not found");
            return Ok(None);
        }
        Err(e) => {
            error!(path = %path.display(), cause = %e, "can not open file");
            return Err(e);
        }
    };

    let metadata = file.metadata().await.inspect_err(|e| {
        error!(path = %path.display(), cause = %e, "can not read file metadata");
    })?;
    if !metadata.is_file() {
        debug!(path = %path.display(), "not a regular file");
        return Ok(None);
    }
    Ok(Some((file, metadata.len())))
}

/// Guesses the content type from the file extension. Text types are served as utf8.
fn mime_for(path: &Path) -> Mime {
    let guessed = mime_guess::from_path(path).first_or_octet_stream();
    if guessed.type_() == mime::TEXT
        && guessed.get_param(mime::CHARSET).is_none()
        && let Ok(with_charset) = format!("{guessed}; charset=utf-8").parse::<Mime>()
    {
        return with_charset;
    }
    guessed
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn collect(response: http::Response<ResponseBody>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_unset_is_not_found() {
        let response = Response::unset().into_http().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_json_sets_content_type() {
        let response = Response::json(json!({ "id": 1 })).into_http().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(collect(response).await, Bytes::from_static(br#"{"id":1}"#));
    }

    #[tokio::test]
    async fn test_explicit_content_type_is_kept() {
        let response = Response::text("<p>")
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/x-custom"))
            .into_http()
            .await
            .unwrap();
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/x-custom");
    }

    #[tokio::test]
    async fn test_redirect() {
        let response = Response::redirect("/login").into_http().await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/login");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let path = std::env::temp_dir().join("micro-router-missing-file.txt");
        let response = Response::file(path).into_http().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_is_streamed() {
        let dir = std::env::temp_dir().join(format!("micro-router-response-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("hello.txt");
        tokio::fs::write(&path, "hello file").await.unwrap();

        let response = Response::file(&path).into_http().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");
        assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "10");
        assert_eq!(collect(response).await, Bytes::from_static(b"hello file"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_mime_for_extensions() {
        let content_type = |name: &str| mime_for(Path::new(name)).to_string();
        assert_eq!(content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("style.CSS"), "text/css; charset=utf-8");
        assert_eq!(content_type("app.wasm"), "application/wasm");
        assert_eq!(content_type("font.woff2"), "font/woff2");
        assert_eq!(content_type("photo.webp"), "image/webp");
        assert_eq!(content_type("data.json"), "application/json");
        assert_eq!(content_type("archive.unknown-ext"), "application/octet-stream");
        assert_eq!(content_type("no_extension"), "application/octet-stream");
    }

    #[test]
    fn test_default_is_unset() {
        assert!(Response::default().is_unset());
        assert!(!Response::empty().is_unset());
    }
}
