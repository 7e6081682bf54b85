use crate::middleware::Next;
use crate::res::responder::Empty;
use crate::types::{Fut, Method, RequestEvent};

/// Configuration for the CORS middleware.
///
/// Every option defaults to the permissive value: `*` for the header lists,
/// credentials off, a one-day preflight cache.
#[derive(Clone)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin`.
    pub origin: &'static str,
    /// Value of `Access-Control-Allow-Methods`.
    pub methods: &'static str,
    /// Value of `Access-Control-Allow-Headers`.
    pub allow_headers: &'static str,
    /// Value of `Access-Control-Expose-Headers`.
    pub expose_headers: &'static str,
    /// When true, adds `Access-Control-Allow-Credentials: true`.
    pub credentials: bool,
    /// Value of `Access-Control-Max-Age`, in seconds.
    pub max_age: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig {
            origin: "*",
            methods: "*",
            allow_headers: "*",
            expose_headers: "*",
            credentials: false,
            max_age: 86_400,
        }
    }
}

/// Builtin CORS middleware.
///
/// Adds the configured CORS headers to every response. A preflight request
/// (`OPTIONS` carrying `Access-Control-Request-Method`) short-circuits with
/// status 204 and no body; the route handler is not invoked.
///
/// ## Examples
///
/// ```
/// use viaduct::{app::App, middlewares::cors::cors};
/// let mut app = App::new();
/// app.use_middleware(cors(None));
/// ```
///
/// ```
/// use viaduct::{app::App, middlewares::cors::{cors, CorsConfig}};
/// let mut app = App::new();
/// app.use_middleware(cors(Some(CorsConfig {
///     origin: "https://example.com",
///     credentials: true,
///     ..Default::default()
/// })));
/// ```
pub fn cors(
    config: Option<CorsConfig>,
) -> impl Fn(RequestEvent, Next) -> Fut + Send + Sync + Clone + 'static {
    move |mut event, next| {
        let config = config.clone().unwrap_or_default();

        Box::pin(async move {
            let headers = &mut event.res.headers;
            headers.insert("Access-Control-Allow-Origin", config.origin);
            headers.insert("Access-Control-Allow-Methods", config.methods);
            headers.insert("Access-Control-Allow-Headers", config.allow_headers);
            headers.insert("Access-Control-Expose-Headers", config.expose_headers);
            headers.insert("Access-Control-Max-Age", config.max_age.to_string());
            if config.credentials {
                headers.insert("Access-Control-Allow-Credentials", "true");
            }

            let preflight = event.req.method() == &Method::OPTIONS
                && event.req.header("access-control-request-method").is_some();
            if preflight {
                event.res.set_status(204);
                return Ok(event.send(Empty));
            }

            next.run(event).await
        })
    }
}
