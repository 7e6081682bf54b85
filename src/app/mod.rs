#![warn(missing_docs)]

use crate::error::{Error, ErrorKind};
use crate::logger::{Logger, SharedLogger, TracingLogger};
use crate::middleware::{middleware_from_closure, MiddlewareEntry, Next};
use crate::middlewares::cors::{cors, CorsConfig};
use crate::res::headers::Headers;
use crate::res::responder::StatusText;
use crate::router::{RouteGroup, RouteStore, Routing};
use crate::transport::{HyperTransport, OutboundResponse, Transport};
use crate::types::{Fut, Handler, Reply, RequestEvent};
use crate::req::HttpRequest;
use crate::ws::{box_ws_future, Hub, WsEvent, WsHandler};
use bytes::BytesMut;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// The App struct is the core of Viaduct, aggregating the route store, the
/// middleware chain, the WebSocket hub and the logger behind an Express-like
/// registration surface.
///
/// ## Example
///
/// ```no_run
/// use viaduct::app::App;
/// use viaduct::res::responder::Text;
/// use viaduct::router::Routing;
///
/// #[tokio::main]
/// async fn main() {
///     let mut app = App::new();
///     app.get("/", |event| async move { Ok(event.send(Text::new("Hello World!"))) });
///     app.listen(3000, || println!("server running on port 3000")).await;
/// }
/// ```
pub struct App {
    base_path: String,
    store: RouteStore,
    middlewares: Vec<Arc<MiddlewareEntry>>,
    ws_routes: HashMap<String, WsHandler>,
    hub: Arc<Hub>,
    logger: SharedLogger,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl Routing for App {
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

impl App {
    /// Creates a new App instance with an empty base path and the default
    /// `tracing`-backed logger.
    ///
    /// ## Example
    ///
    /// ```
    /// use viaduct::app::App;
    ///
    /// let mut app = App::new();
    /// ```
    pub fn new() -> Self {
        let logger: SharedLogger = Arc::new(TracingLogger);
        App {
            base_path: String::new(),
            store: RouteStore::new(),
            middlewares: Vec::new(),
            ws_routes: HashMap::new(),
            hub: Arc::new(Hub::new(logger.clone())),
            logger,
        }
    }

    /// Prefixes every route, middleware and WebSocket path registered on
    /// this app.
    pub fn with_base_path<P: Into<String>>(mut self, base_path: P) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Replaces the logger. Call before registering anything so setup events
    /// reach the new sink.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.hub = Arc::new(Hub::new(logger.clone()));
        self.logger = logger;
        self
    }

    /// Adds a middleware that runs for every request under this app's base
    /// path.
    ///
    /// Middleware runs in registration order, each receiving the event and a
    /// `next` continuation (onion model). Returning without calling `next`
    /// short-circuits the chain.
    ///
    /// ## Example
    ///
    /// ```
    /// use viaduct::app::App;
    ///
    /// let mut app = App::new();
    /// app.use_middleware(|event, next| async move {
    ///     // pre-processing happens here
    ///     let reply = next.run(event).await?;
    ///     // post-processing happens here
    ///     Ok(reply)
    /// });
    /// ```
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

    /// Adds a middleware restricted to paths starting with the given prefix
    /// (joined onto the base path).
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

    /// Adds the builtin CORS middleware.
    ///
    /// ## Example
    ///
    /// ```
    /// use viaduct::app::App;
    /// use viaduct::middlewares::cors::CorsConfig;
    ///
    /// let mut app = App::new();
    /// app.use_cors(None);
    /// ```
    pub fn use_cors(&mut self, config: Option<CorsConfig>) -> &mut Self {
        self.use_middleware(cors(config))
    }

    /// Creates a route group under `base_path + prefix`, runs the configure
    /// closure against it, and merges the result into this app.
    ///
    /// Group middleware is appended after the app's current middleware list;
    /// group routes land in the shared store with their full paths. Grouping
    /// the same prefix twice is additive, and an empty group merges as a
    /// no-op.
    ///
    /// ## Example
    ///
    /// ```
    /// use viaduct::{app::App, res::responder::Text, router::Routing};
    ///
    /// let mut app = App::new();
    /// app.group("/api", |api| {
    ///     api.get("/users", |event| async move { Ok(event.send(Text::new("[]"))) });
    /// });
    /// ```
    pub fn group<F>(&mut self, prefix: &str, configure: F) -> &mut Self
    where
        F: FnOnce(&mut RouteGroup),
    {
        let full_prefix = format!("{}{}", self.base_path, prefix);
        let mut group = RouteGroup::new(full_prefix.clone(), self.logger.clone());
        configure(&mut group);

        let routes = group.store.len();
        let middlewares = group.middlewares.len();
        self.store.merge(group.store);
        self.middlewares.extend(group.middlewares);
        self.ws_routes.extend(group.ws_routes);

        self.logger.debug(&|| {
            format!(
                "group {} merged ({} routes, {} middlewares)",
                full_prefix, routes, middlewares
            )
        });
        self
    }

    /// Registers a WebSocket handler at `base_path + path`.
    ///
    /// WebSocket routes live in their own literal-path index, reached when
    /// the transport surfaces an upgrade for that exact path.
    ///
    /// ## Example
    ///
    /// ```
    /// use viaduct::app::App;
    /// use viaduct::ws::WsEvent;
    ///
    /// let mut app = App::new();
    /// app.ws("/chat", |event| async move {
    ///     if let WsEvent::Message(peer, _body) = event {
    ///         peer.send("ack");
    ///     }
    /// });
    /// ```
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

    /// The app's WebSocket hub, for publishing from outside handlers.
    pub fn hub(&self) -> Arc<Hub> {
        self.hub.clone()
    }

    /// Freezes the current routes, middleware and WebSocket handlers into a
    /// cloneable serving snapshot.
    ///
    /// Registration after this point does not affect the returned
    /// dispatcher. Transports drive the core exclusively through this value,
    /// and tests can call [`Dispatcher::dispatch`] directly without a
    /// socket.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self)
    }

    /// Starts the bundled HTTP transport and listens on the given port.
    ///
    /// ## Example
    ///
    /// ```no_run
    /// use viaduct::app::App;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let app = App::new();
    ///     app.listen(3000, || println!("server running on port 3000")).await;
    /// }
    /// ```
    pub async fn listen<F: FnOnce()>(&self, port: u16, cb: F) {
        cb();
        if let Err(err) = self.serve(port, HyperTransport::new()).await {
            self.logger.error(&|| format!("server error: {}", err));
        }
    }

    /// Binds a caller-supplied transport to the given port.
    pub async fn serve<T: Transport + 'static>(&self, port: u16, transport: T) -> Result<(), Error> {
        Box::new(transport).serve(port, self.dispatcher()).await
    }
}

struct DispatcherInner {
    middlewares: Vec<Arc<MiddlewareEntry>>,
    terminal: Handler,
    ws_routes: HashMap<String, WsHandler>,
    hub: Arc<Hub>,
    logger: SharedLogger,
}

/// A frozen, cloneable serving snapshot of an [`App`].
///
/// One request flows through [`dispatch`](Dispatcher::dispatch): a
/// [`RequestEvent`] is built (status 200, empty params), the middleware
/// chain runs to a [`Reply`], and the reply's responder is materialised:
/// `options` first, then one `Set-Cookie` header per response cookie, then
/// `output` into the body buffer. Errors escaping the chain become the
/// default 400/500 responses.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    fn new(app: &App) -> Self {
        let store = app.store.clone();
        let logger = app.logger.clone();
        let terminal: Handler = Arc::new(move |mut event: RequestEvent| {
            let store = store.clone();
            let logger = logger.clone();
            let fut = async move {
                match store.find(event.req.method(), event.req.path()) {
                    Some((handler, params)) => {
                        logger.debug(&|| {
                            format!("route found: {} {}", event.req.method(), event.req.path())
                        });
                        event.set_params(params);
                        handler(event).await
                    }
                    None => {
                        logger.debug(&|| {
                            format!("no route for {} {}", event.req.method(), event.req.path())
                        });
                        Ok(event.send(StatusText {
                            status: 404,
                            body: "Not Found",
                        }))
                    }
                }
            };
            Box::pin(fut) as Fut
        });

        Self {
            inner: Arc::new(DispatcherInner {
                middlewares: app.middlewares.clone(),
                terminal,
                ws_routes: app.ws_routes.clone(),
                hub: app.hub.clone(),
                logger: app.logger.clone(),
            }),
        }
    }

    /// Runs one request through the middleware chain and materialises the
    /// response.
    pub async fn dispatch(&self, req: HttpRequest) -> OutboundResponse {
        let event = RequestEvent::new(req);
        let next = Next {
            entries: self.inner.middlewares.clone(),
            terminal: self.inner.terminal.clone(),
        };

        match next.run(event).await {
            Ok(reply) => materialize(reply),
            Err(err) => match err.kind {
                ErrorKind::Body => {
                    self.inner
                        .logger
                        .debug(&|| format!("body rejected: {}", err));
                    default_response(400, "Invalid body")
                }
                _ => {
                    self.inner
                        .logger
                        .error(&|| format!("handler failed: {}", err));
                    default_response(500, "Internal Server Error")
                }
            },
        }
    }

    /// The WebSocket handler registered for an exact path, if any.
    pub fn ws_handler(&self, path: &str) -> Option<WsHandler> {
        self.inner.ws_routes.get(path).cloned()
    }

    /// The hub peers of this snapshot connect to.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.inner.hub
    }

    pub(crate) fn logger(&self) -> &SharedLogger {
        &self.inner.logger
    }
}

fn materialize(reply: Reply) -> OutboundResponse {
    let Reply { mut event, responder } = reply;

    responder.options(&mut event.res);

    let cookie_headers: Vec<String> = event
        .res
        .cookies()
        .iter()
        .map(|cookie| cookie.to_header_value())
        .collect();
    for value in cookie_headers {
        event.res.headers.append("Set-Cookie", value);
    }

    let mut body = BytesMut::new();
    responder.output(&mut body);

    OutboundResponse {
        status: event.res.status_code(),
        headers: std::mem::take(&mut event.res.headers),
        body: body.freeze(),
    }
}

fn default_response(status: u16, body: &'static str) -> OutboundResponse {
    let mut headers = Headers::new();
    headers.insert("Content-Type", "text/plain; charset=utf-8");
    OutboundResponse {
        status,
        headers,
        body: bytes::Bytes::from_static(body.as_bytes()),
    }
}
