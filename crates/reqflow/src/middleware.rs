//! Pre-send and post-receive hooks.
//!
//! Hooks run in registration order, each receiving the previous hook's
//! output. A failing hook stops the chain and fails the request with
//! [`Error::Middleware`]; it is never retried.

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::RwLock;
use reqflow_core::BoxError;
use std::future::Future;
use std::sync::Arc;

/// Transforms a request before it is admitted.
pub type PreSendHook =
    Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Request, BoxError>> + Send + Sync>;

/// Transforms a response before it is returned to the caller.
pub type PostReceiveHook =
    Arc<dyn Fn(Response) -> BoxFuture<'static, Result<Response, BoxError>> + Send + Sync>;

pub(crate) fn pre_send_hook<F, Fut, E>(f: F) -> PreSendHook
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Request, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    Arc::new(move |request: Request| -> BoxFuture<'static, Result<Request, BoxError>> {
        f(request).map(|result| result.map_err(Into::into)).boxed()
    })
}

pub(crate) fn post_receive_hook<F, Fut, E>(f: F) -> PostReceiveHook
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, E>> + Send + 'static,
    E: Into<BoxError> + 'static,
{
    Arc::new(move |response: Response| -> BoxFuture<'static, Result<Response, BoxError>> {
        f(response).map(|result| result.map_err(Into::into)).boxed()
    })
}

/// Registered hooks.
#[derive(Default)]
pub(crate) struct Middleware {
    pre_send: RwLock<Vec<PreSendHook>>,
    post_receive: RwLock<Vec<PostReceiveHook>>,
}

impl Middleware {
    pub(crate) fn add_pre_send(&self, hook: PreSendHook) {
        self.pre_send.write().push(hook);
    }

    pub(crate) fn add_post_receive(&self, hook: PostReceiveHook) {
        self.post_receive.write().push(hook);
    }

    pub(crate) async fn run_pre_send(&self, mut request: Request) -> Result<Request, Error> {
        let hooks = self.pre_send.read().clone();
        for hook in hooks {
            request = hook(request).await.map_err(Error::Middleware)?;
        }
        Ok(request)
    }

    pub(crate) async fn run_post_receive(&self, mut response: Response) -> Result<Response, Error> {
        let hooks = self.post_receive.read().clone();
        for hook in hooks {
            response = hook(response).await.map_err(Error::Middleware)?;
        }
        Ok(response)
    }

    pub(crate) fn counts(&self) -> (usize, usize) {
        (self.pre_send.read().len(), self.post_receive.read().len())
    }
}
