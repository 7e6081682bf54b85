use crate::error::Error;
use crate::types::{Fut, Handler, Reply, RequestEvent};
use std::future::Future;
use std::sync::Arc;

/// The boxed middleware function type.
///
/// A middleware receives the request event and a [`Next`] continuation. It
/// must either return the reply produced by `next.run(event)` (possibly
/// after mutating the event's response before or after the call) or
/// short-circuit by producing its own reply without calling `next`.
pub type MiddlewareFn = Arc<dyn Fn(RequestEvent, Next) -> Fut + Send + Sync + 'static>;

/// A registered middleware and the path prefix it applies to.
pub struct MiddlewareEntry {
    /// The middleware runs iff the request path starts with this prefix.
    /// An empty prefix matches every request.
    pub base_path: String,

    pub(crate) func: MiddlewareFn,
}

impl MiddlewareEntry {
    pub(crate) fn new(base_path: String, func: MiddlewareFn) -> Self {
        Self { base_path, func }
    }

    pub(crate) fn applies_to(&self, path: &str) -> bool {
        self.base_path.is_empty() || path.starts_with(&self.base_path)
    }
}

/// The continuation handed to each middleware.
///
/// Running it executes the remaining middleware entries in registration
/// order, skipping entries whose prefix does not match, and finally the
/// terminal route dispatcher, which either invokes the matched handler or
/// yields the 404 responder. If every middleware calls `run` exactly once,
/// the dispatcher runs exactly once per request.
pub struct Next {
    pub(crate) entries: Vec<Arc<MiddlewareEntry>>,
    pub(crate) terminal: Handler,
}

impl Next {
    /// Continues the chain with the given event.
    pub async fn run(mut self, event: RequestEvent) -> Result<Reply, Error> {
        while !self.entries.is_empty() {
            let entry = self.entries.remove(0);
            if entry.applies_to(event.req.path()) {
                let func = entry.func.clone();
                return func(event, self).await;
            }
        }
        (self.terminal)(event).await
    }
}

pub(crate) fn middleware_from_closure<F, MFut>(middleware: F) -> MiddlewareFn
where
    F: Fn(RequestEvent, Next) -> MFut + Send + Sync + 'static,
    MFut: Future<Output = Result<Reply, Error>> + Send + 'static,
{
    Arc::new(move |event, next| Box::pin(middleware(event, next)))
}
