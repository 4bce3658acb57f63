use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use std::fmt::{Debug, Formatter};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The body of an [`http::Response`] built by [`Response::into_http`](crate::Response::into_http).
///
/// Either fully buffered, yielding at most one data frame, or a boxed stream such as a
/// file being read.
pub struct ResponseBody {
    kind: BodyKind,
}

enum BodyKind {
    Full(Option<Bytes>),
    Streaming(UnsyncBoxBody<Bytes, io::Error>),
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { kind: BodyKind::Full(None) }
    }

    pub fn full(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self { kind: BodyKind::Full((!bytes.is_empty()).then_some(bytes)) }
    }

    pub fn streaming<B>(body: B) -> Self
    where
        B: HttpBody<Data = Bytes, Error = io::Error> + Send + 'static,
    {
        Self { kind: BodyKind::Streaming(UnsyncBoxBody::new(body)) }
    }
}

impl Debug for ResponseBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            BodyKind::Full(bytes) => f.debug_struct("ResponseBody").field("len", &bytes.as_ref().map_or(0, Bytes::len)).finish(),
            BodyKind::Streaming(_) => f.debug_struct("ResponseBody").field("streaming", &true).finish(),
        }
    }
}

macro_rules! impl_from_for_full_body {
    ($($ty:ty),*) => {
        $(
        impl From<$ty> for ResponseBody {
            fn from(value: $ty) -> Self {
                Self::full(value)
            }
        }
        )*
    };
}

impl_from_for_full_body!(Bytes, String, Vec<u8>, &'static str);

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match &mut self.get_mut().kind {
            BodyKind::Full(bytes) => Poll::Ready(bytes.take().map(Frame::data).map(Ok)),
            BodyKind::Streaming(body) => Pin::new(body).poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            BodyKind::Full(bytes) => bytes.is_none(),
            BodyKind::Streaming(body) => body.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            BodyKind::Full(bytes) => SizeHint::with_exact(bytes.as_ref().map_or(0, |bytes| bytes.len() as u64)),
            BodyKind::Streaming(body) => body.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResponseBody;
    use bytes::Bytes;
    use futures::TryStreamExt;
    use http_body::{Body as HttpBody, Frame};
    use http_body_util::{BodyExt, StreamBody};
    use std::io;

    #[tokio::test]
    async fn test_full_body_yields_one_frame() {
        let mut body = ResponseBody::from(String::from("{\"ok\":true}"));
        assert_eq!(body.size_hint().exact(), Some(11));

        let frame = body.frame().await.unwrap().unwrap();
        assert_eq!(frame.into_data().unwrap(), Bytes::from_static(b"{\"ok\":true}"));
        assert!(body.is_end_stream());
        assert!(body.frame().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_input_is_end_of_stream() {
        for mut body in [ResponseBody::empty(), ResponseBody::from(""), ResponseBody::from(Vec::new())] {
            assert!(body.is_end_stream());
            assert_eq!(body.size_hint().exact(), Some(0));
            assert!(body.frame().await.is_none());
        }
    }

    #[tokio::test]
    async fn test_streaming_body_collects_chunks() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![Ok(Bytes::from_static(b"he")), Ok(Bytes::from_static(b"llo"))];
        let body = ResponseBody::streaming(StreamBody::new(futures::stream::iter(chunks).map_ok(Frame::data)));

        assert_eq!(body.size_hint().exact(), None);
        assert_eq!(body.collect().await.unwrap().to_bytes(), "hello");
    }

    #[tokio::test]
    async fn test_streaming_error_is_surfaced() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![Err(io::Error::other("read failed"))];
        let body = ResponseBody::streaming(StreamBody::new(futures::stream::iter(chunks).map_ok(Frame::data)));

        assert_eq!(body.collect().await.unwrap_err().to_string(), "read failed");
    }
}
