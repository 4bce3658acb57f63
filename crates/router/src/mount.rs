//! Mount points: a middleware scoped to a pathname prefix.

use crate::pipeline::{BoxError, Last, Middleware, Next};
use crate::request::RouterRequest;
use crate::response::Response;
use async_trait::async_trait;
use futures::FutureExt;
use std::path::{Component, Path, PathBuf};
use std::slice;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs `inner` for requests below `mount`, with the mount stripped from the pathname.
///
/// The match is on whole segments: `/admin` covers `/admin` and `/admin/users` but not
/// `/administrator`. When `inner` passes the request on, the chain resumes after this
/// route with the original pathname.
pub struct Route {
    mount: String,
    inner: Arc<dyn Middleware<RouterRequest, Response>>,
}

impl Route {
    pub fn new<M>(mount: impl AsRef<str>, inner: M) -> Self
    where
        M: Middleware<RouterRequest, Response> + 'static,
    {
        Self { mount: normalize(mount.as_ref()), inner: Arc::new(inner) }
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route").field("mount", &self.mount).finish_non_exhaustive()
    }
}

#[async_trait]
impl Middleware<RouterRequest, Response> for Route {
    async fn call(&self, req: RouterRequest, next: Next<'_, RouterRequest, Response>) -> Result<Response, BoxError> {
        let Some(relative) = relative(&self.mount, req.pathname()) else {
            return next.run(req).await;
        };

        debug!(mount = %self.mount, pathname = %req.pathname(), relative, "enter sub route");
        let scoped = req.with_pathname(relative.to_string());
        let context = next.context().clone().with_basename(&self.mount);
        let last: Last<'_, RouterRequest, Response> = Box::new(move |_, _| next.run(req).boxed());

        Next::new(slice::from_ref(&self.inner), context, Some(last)).run(scoped).await
    }
}

/// `"admin/"` becomes `"/admin"`; the root mount is `""`.
fn normalize(mount: &str) -> String {
    let trimmed = mount.trim_matches('/');
    if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}

/// The pathname below `mount`, or `None` when the pathname is outside it.
fn relative<'a>(mount: &str, pathname: &'a str) -> Option<&'a str> {
    let rest = pathname.strip_prefix(mount)?;
    match rest {
        "" => Some("/"),
        _ if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Serves files from a directory, addressed by the effective pathname.
///
/// A pathname that tries to leave the directory is passed on untouched.
#[derive(Debug, Clone)]
pub struct ServeDir {
    dir: PathBuf,
}

impl ServeDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn resolve(&self, pathname: &str) -> Option<PathBuf> {
        let relative = Path::new(pathname.trim_start_matches('/'));
        let mut path = self.dir.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(path)
    }
}

#[async_trait]
impl Middleware<RouterRequest, Response> for ServeDir {
    async fn call(&self, req: RouterRequest, next: Next<'_, RouterRequest, Response>) -> Result<Response, BoxError> {
        match self.resolve(req.pathname()) {
            Some(path) => Ok(Response::file(path)),
            None => {
                warn!(pathname = %req.pathname(), dir = %self.dir.display(), "refusing to serve outside directory");
                next.run(req).await
            }
        }
    }
}
