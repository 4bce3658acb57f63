//! An ordered middleware chain.
//!
//! A [`Pipeline`] is a list of [`Middleware`]s. Running it hands the input to the first
//! middleware together with a [`Next`], a cursor over the remaining ones. A middleware
//! either produces the output itself or calls [`Next::run`] to advance the cursor. `Next`
//! is consumed by `run`, so each middleware continues the chain at most once.
//!
//! When the cursor runs past the last middleware, the chain ends in the `on_last`
//! continuation given to [`Pipeline::run`], or in `O::default()` when there is none.

use crate::request::Context;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// The error type of middlewares and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The continuation run when a chain is exhausted.
pub type Last<'a, I, O> = Box<dyn FnOnce(I, Context) -> BoxFuture<'a, Result<O, BoxError>> + Send + 'a>;

#[async_trait]
pub trait Middleware<I, O>: Send + Sync {
    async fn call(&self, input: I, next: Next<'_, I, O>) -> Result<O, BoxError>;
}

#[async_trait]
impl<I, O, M> Middleware<I, O> for Arc<M>
where
    I: Send + 'static,
    O: Send + 'static,
    M: Middleware<I, O> + ?Sized,
{
    async fn call(&self, input: I, next: Next<'_, I, O>) -> Result<O, BoxError> {
        self.as_ref().call(input, next).await
    }
}

/// The rest of a chain, as seen from one middleware.
pub struct Next<'a, I, O> {
    middlewares: &'a [Arc<dyn Middleware<I, O>>],
    context: Context,
    last: Option<Last<'a, I, O>>,
}

impl<'a, I, O> Next<'a, I, O>
where
    I: Send + 'static,
    O: Send + Default + 'static,
{
    pub fn new(middlewares: &'a [Arc<dyn Middleware<I, O>>], context: Context, last: Option<Last<'a, I, O>>) -> Self {
        Self { middlewares, context, last }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the context the rest of the chain will see.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Hands `input` to the next middleware, or to the chain's end.
    pub async fn run(self, input: I) -> Result<O, BoxError> {
        let Next { middlewares, context, last } = self;
        match middlewares.split_first() {
            Some((head, rest)) => {
                trace!(remaining = rest.len(), "dispatch to next middleware");
                let head: &dyn Middleware<I, O> = head.as_ref();
                head.call(input, Next { middlewares: rest, context, last }).await
            }
            None => match last {
                Some(last) => last(input, context).await,
                None => {
                    trace!("middleware chain exhausted without a response");
                    Ok(O::default())
                }
            },
        }
    }
}

impl<I, O> Debug for Next<'_, I, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.middlewares.len())
            .field("context", &self.context)
            .field("has_last", &self.last.is_some())
            .finish()
    }
}

/// Per-run options: the context to start from and the chain's end continuation.
pub struct RunOptions<'a, I, O> {
    pub context: Context,
    pub on_last: Option<Last<'a, I, O>>,
}

impl<I, O> Default for RunOptions<'_, I, O> {
    fn default() -> Self {
        Self { context: Context::default(), on_last: None }
    }
}

impl<'a, I, O> RunOptions<'a, I, O> {
    pub fn new(context: Context) -> Self {
        Self { context, on_last: None }
    }

    #[must_use]
    pub fn on_last<F, Fut>(mut self, f: F) -> Self
    where
        F: FnOnce(I, Context) -> Fut + Send + 'a,
        Fut: Future<Output = Result<O, BoxError>> + Send + 'a,
    {
        self.on_last = Some(Box::new(move |input, context| f(input, context).boxed()));
        self
    }
}

impl<I, O> Debug for RunOptions<'_, I, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOptions").field("context", &self.context).field("has_last", &self.on_last.is_some()).finish()
    }
}

/// An ordered, append-only list of middlewares.
pub struct Pipeline<I, O> {
    middlewares: Vec<Arc<dyn Middleware<I, O>>>,
}

impl<I, O> Default for Pipeline<I, O> {
    fn default() -> Self {
        Self { middlewares: Vec::new() }
    }
}

impl<I, O> Pipeline<I, O>
where
    I: Send + 'static,
    O: Send + Default + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware; it runs after every middleware registered before it.
    pub fn use_middleware<M: Middleware<I, O> + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub fn run<'a>(&'a self, input: I, options: RunOptions<'a, I, O>) -> BoxFuture<'a, Result<O, BoxError>> {
        Next::new(&self.middlewares, options.context, options.on_last).run(input).boxed()
    }
}

impl<I, O> Debug for Pipeline<I, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("middlewares", &self.middlewares.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Record {
        name: &'static str,
        log: Log,
        respond: bool,
    }

    #[async_trait]
    impl Middleware<u32, String> for Record {
        async fn call(&self, input: u32, next: Next<'_, u32, String>) -> Result<String, BoxError> {
            self.log.lock().unwrap().push(self.name.to_string());
            if self.respond { Ok(format!("{}:{input}", self.name)) } else { next.run(input + 1).await }
        }
    }

    fn record(name: &'static str, log: &Log, respond: bool) -> Record {
        Record { name, log: Arc::clone(log), respond }
    }

    #[tokio::test]
    async fn test_runs_in_order_and_stops_at_response() {
        let log = Log::default();
        let mut pipeline: Pipeline<u32, String> = Pipeline::new();
        pipeline
            .use_middleware(record("a", &log, false))
            .use_middleware(record("b", &log, true))
            .use_middleware(record("c", &log, true));

        let output = pipeline.run(1, RunOptions::default()).await.unwrap();

        assert_eq!(output, "b:2");
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_exhausted_chain_calls_on_last() {
        let log = Log::default();
        let mut pipeline: Pipeline<u32, String> = Pipeline::new();
        pipeline.use_middleware(record("a", &log, false));

        let options = RunOptions::<u32, String>::default().on_last(|input, _| async move { Ok(format!("last:{input}")) });
        assert_eq!(pipeline.run(1, options).await.unwrap(), "last:2");
    }

    #[tokio::test]
    async fn test_exhausted_chain_without_on_last_is_default() {
        let pipeline: Pipeline<u32, String> = Pipeline::new();
        assert_eq!(pipeline.run(1, RunOptions::default()).await.unwrap(), "");
        assert!(pipeline.is_empty());
    }

    #[tokio::test]
    async fn test_context_reaches_on_last() {
        #[derive(Clone)]
        struct Tag(u8);

        let pipeline: Pipeline<u32, String> = Pipeline::new();
        let mut context = Context::new();
        context.insert(Tag(7));

        let options = RunOptions::<u32, String>::new(context)
            .on_last(|_, context| async move { Ok(context.get::<Tag>().map(|tag| tag.0.to_string()).unwrap_or_default()) });
        assert_eq!(pipeline.run(0, options).await.unwrap(), "7");
    }

    #[tokio::test]
    async fn test_errors_propagate() {
        struct Fail;

        #[async_trait]
        impl Middleware<u32, String> for Fail {
            async fn call(&self, _input: u32, _next: Next<'_, u32, String>) -> Result<String, BoxError> {
                Err("boom".into())
            }
        }

        let log = Log::default();
        let mut pipeline: Pipeline<u32, String> = Pipeline::new();
        pipeline.use_middleware(Fail).use_middleware(record("a", &log, true));

        let error = pipeline.run(0, RunOptions::default()).await.unwrap_err();
        assert_eq!(error.to_string(), "boom");
        assert!(log.lock().unwrap().is_empty());
    }
}
