#![warn(missing_docs)]
use crate::error::Error;
use crate::logger::SharedLogger;
use crate::middleware::{middleware_from_closure, MiddlewareEntry, Next};
use crate::pattern::PathPattern;
use crate::types::{box_future, Handler, Method, Reply, RequestEvent};
use crate::ws::{box_ws_future, WsEvent, WsHandler};
use ahash::AHashMap;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// How a route was classified at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// A literal path, served from the O(1) index.
    Static,
    /// A templated path, scanned in insertion order.
    Dynamic,
}

pub(crate) struct Registration {
    pub kind: RouteKind,
    pub replaced: bool,
}

/// The dual-index route registry.
///
/// Literal paths live in a per-method map and are found in O(1); templated
/// paths are compiled once and scanned in insertion order. A third map keeps
/// every `(method, path)` pair for introspection. The wildcard method `*`
/// participates in lookup at the lowest precedence of its tier.
#[derive(Clone, Default)]
pub struct RouteStore {
    literal: AHashMap<Method, AHashMap<String, Handler>>,
    templated: AHashMap<Method, Vec<(PathPattern, Handler)>>,
    mappings: AHashMap<(Method, String), Handler>,
}

impl RouteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Every registered `(method, path)` pair, for route listing.
    pub fn routes(&self) -> Vec<(Method, String)> {
        self.mappings
            .keys()
            .map(|(method, path)| (method.clone(), path.clone()))
            .collect()
    }

    /// Classifies and stores a route. A duplicate `(method, path)` replaces
    /// the previous handler.
    pub(crate) fn register(
        &mut self,
        method: Method,
        path: &str,
        handler: Handler,
    ) -> Result<Registration, Error> {
        let pattern = PathPattern::compile(path)?;

        let replaced = self
            .mappings
            .insert((method.clone(), path.to_string()), handler.clone())
            .is_some();

        if pattern.is_literal() {
            self.literal
                .entry(method)
                .or_default()
                .insert(path.to_string(), handler);
            Ok(Registration {
                kind: RouteKind::Static,
                replaced,
            })
        } else {
            let list = self.templated.entry(method).or_default();
            if replaced {
                list.retain(|(existing, _)| existing.template() != path);
            }
            list.push((pattern, handler));
            Ok(Registration {
                kind: RouteKind::Dynamic,
                replaced,
            })
        }
    }

    /// Looks up a handler for the method and path.
    ///
    /// Precedence: literal match for the method, literal match under `*`,
    /// templated match for the method in insertion order, templated match
    /// under `*`.
    pub(crate) fn find(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(Handler, HashMap<String, String>)> {
        if let Some(handler) = self.literal.get(method).and_then(|paths| paths.get(path)) {
            return Some((handler.clone(), HashMap::new()));
        }
        if let Some(handler) = self
            .literal
            .get(&Method::ANY)
            .and_then(|paths| paths.get(path))
        {
            return Some((handler.clone(), HashMap::new()));
        }

        for tier in [method, &Method::ANY] {
            if let Some(list) = self.templated.get(tier) {
                for (pattern, handler) in list {
                    if let Some(params) = pattern.match_path(path) {
                        return Some((handler.clone(), params));
                    }
                }
            }
        }

        None
    }

    /// Merges another store into this one. The other store's templated
    /// entries are appended after the existing ones; colliding literal paths
    /// take the other store's handler.
    pub(crate) fn merge(&mut self, other: RouteStore) {
        for (method, paths) in other.literal {
            self.literal.entry(method).or_default().extend(paths);
        }
        for (method, list) in other.templated {
            self.templated.entry(method).or_default().extend(list);
        }
        self.mappings.extend(other.mappings);
    }
}

/// Trait providing route registration for applications and route groups.
///
/// Default methods implement the Express-style sugar (`get`, `post`, …) over
/// [`try_on`](Routing::try_on); implementors only supply access to their base
/// path, store and logger.
pub trait Routing {
    /// The prefix every registered path is joined onto.
    fn base_path(&self) -> &str;

    /// Mutable access to the backing store.
    fn store_mut(&mut self) -> &mut RouteStore;

    /// The logger registration events are reported to.
    fn routing_logger(&self) -> SharedLogger;

    /// Registers a handler for a method and path, reporting template errors.
    ///
    /// The path is joined onto the base path. Registering the same method and
    /// full path twice replaces the previous handler (logged at warn level).
    fn try_on<F, HFut>(&mut self, method: Method, path: &str, handler: F) -> Result<(), Error>
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        let full_path = format!("{}{}", self.base_path(), path);
        let wrapped: Handler = Arc::new(move |event| box_future(handler(event)));
        let logger = self.routing_logger();

        let registration = self
            .store_mut()
            .register(method.clone(), &full_path, wrapped)?;

        if registration.replaced {
            logger.warn(&|| {
                format!(
                    "route {} {} re-registered, previous handler replaced",
                    method, full_path
                )
            });
        }
        logger.debug(&|| {
            let kind = match registration.kind {
                RouteKind::Static => "static",
                RouteKind::Dynamic => "dynamic",
            };
            format!("route registered: {} {} ({})", method, full_path, kind)
        });

        Ok(())
    }

    /// Registers a handler for a method and path.
    ///
    /// # Panics
    ///
    /// Panics when the path template is invalid (`**` not terminal, empty
    /// parameter name) so a misconfigured server cannot start silently. Use
    /// [`try_on`](Routing::try_on) to handle the error instead.
    fn on<F, HFut>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        if let Err(err) = self.try_on(method, path, handler) {
            panic!("{}", err);
        }
        self
    }

    /// Registers a GET handler for a path.
    ///
    /// # Example
    /// ```
    /// use viaduct::{app::App, res::responder::Text, router::Routing};
    ///
    /// let mut app = App::new();
    /// app.get("/hello", |event| async move { Ok(event.send(Text::new("Hello, World!"))) });
    /// ```
    fn get<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::GET, path, handler)
    }

    /// Registers a POST handler for a path.
    fn post<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::POST, path, handler)
    }

    /// Registers a PUT handler for a path.
    fn put<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::PUT, path, handler)
    }

    /// Registers a PATCH handler for a path.
    fn patch<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::PATCH, path, handler)
    }

    /// Registers a DELETE handler for a path.
    fn delete<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::DELETE, path, handler)
    }

    /// Registers a HEAD handler for a path.
    fn head<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::HEAD, path, handler)
    }

    /// Registers an OPTIONS handler for a path.
    fn options<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::OPTIONS, path, handler)
    }

    /// Registers a TRACE handler for a path.
    fn trace<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::TRACE, path, handler)
    }

    /// Registers a CONNECT handler for a path.
    fn connect<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::CONNECT, path, handler)
    }

    /// Registers a handler for every HTTP method, at lower precedence than
    /// exact-method routes on the same path.
    fn all<F, HFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RequestEvent) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<Reply, Error>> + Send + 'static,
        Self: Sized,
    {
        self.on(Method::ANY, path, handler)
    }
}

/// A transient registration scope for grouping routes under a common prefix.
///
/// Created by [`App::group`](crate::app::App::group): routes, middleware and
/// WebSocket handlers registered on the group carry the group's full base
/// path, and are merged into the parent once the configure closure returns.
/// Merging an empty group is a no-op; grouping the same prefix twice is
/// additive.
///
/// # Example
///
/// ```
/// use viaduct::{app::App, res::responder::Text, router::Routing};
///
/// let mut app = App::new();
/// app.group("/api", |api| {
///     api.get("/hello", |event| async move { Ok(event.send(Text::new("hi"))) });
/// });
/// ```
pub struct RouteGroup {
    base_path: String,
    pub(crate) store: RouteStore,
    pub(crate) middlewares: Vec<Arc<MiddlewareEntry>>,
    pub(crate) ws_routes: HashMap<String, WsHandler>,
    logger: SharedLogger,
}

impl RouteGroup {
    pub(crate) fn new(base_path: String, logger: SharedLogger) -> Self {
        Self {
            base_path,
            store: RouteStore::new(),
            middlewares: Vec::new(),
            ws_routes: HashMap::new(),
            logger,
        }
    }

    /// Adds a middleware scoped to this group's prefix.
    pub fn use_middleware<F, MFut>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(RequestEvent, Next) -> MFut + Send + Sync + 'static,
        MFut: Future<Output = Result<Reply, Error>> + Send + 'static,
    {
        self.middlewares.push(Arc::new(MiddlewareEntry::new(
            self.base_path.clone(),
            middleware_from_closure(middleware),
        )));
        self
    }

    /// Adds a middleware scoped to a sub-prefix of this group.
    pub fn use_middleware_at<F, MFut>(&mut self, prefix: &str, middleware: F) -> &mut Self
    where
        F: Fn(RequestEvent, Next) -> MFut + Send + Sync + 'static,
        MFut: Future<Output = Result<Reply, Error>> + Send + 'static,
    {
        self.middlewares.push(Arc::new(MiddlewareEntry::new(
            format!("{}{}", self.base_path, prefix),
            middleware_from_closure(middleware),
        )));
        self
    }

    /// Registers a WebSocket handler under this group's prefix.
    pub fn ws<F, WFut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(WsEvent) -> WFut + Send + Sync + 'static,
        WFut: Future<Output = ()> + Send + 'static,
    {
        let full_path = format!("{}{}", self.base_path, path);
        self.ws_routes.insert(
            full_path,
            Arc::new(move |event| box_ws_future(handler(event))),
        );
        self
    }

    /// True when nothing was registered on this group.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty() && self.middlewares.is_empty() && self.ws_routes.is_empty()
    }
}

impl Routing for RouteGroup {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn store_mut(&mut self) -> &mut RouteStore {
        &mut self.store
    }

    fn routing_logger(&self) -> SharedLogger {
        self.logger.clone()
    }
}
