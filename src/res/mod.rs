#![warn(missing_docs)]

use bytes::Bytes;
use serde::Serialize;

/// Cookie attributes and the outbound cookie codec.
pub mod cookie;

/// The response header collection.
pub mod headers;

/// The responder protocol and its built-in implementations.
pub mod responder;

/// The response status enum and its methods.
pub mod status;

use self::cookie::{CookieOptions, SetCookie};
use self::headers::Headers;
use self::status::StatusCode;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResponseBody {
    Text(String),
    Html(String),
    Json(serde_json::Value),
    Bin(Bytes),
    Empty,
}

/// Represents an HTTP response being sent to the client.
///
/// Every request carries one `HttpResponse` through the middleware chain: its
/// status defaults to 200 and middleware may set status, headers and cookies
/// on it at any point. A handler may also build a standalone `HttpResponse`
/// and return it; the struct implements
/// [`Responder`](crate::res::responder::Responder), making it the fully
/// caller-controlled response shape.
///
/// # Examples
///
/// ```rust
/// use viaduct::context::HttpResponse;
///
/// let res = HttpResponse::new().ok().text("Hello, World!");
/// ```
///
/// JSON response:
/// ```rust
/// use viaduct::context::HttpResponse;
/// use serde_json::json;
///
/// let res = HttpResponse::new().created().json(json!({ "id": 7 }));
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub(crate) status: StatusCode,

    /// Response headers. Middleware writes here directly.
    pub headers: Headers,

    pub(crate) cookies: Vec<SetCookie>,

    pub(crate) body: ResponseBody,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpResponse {
    /// Creates a new response: status 200, no headers, no cookies, no body.
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: Headers::new(),
            cookies: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// The numeric status code.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Sets the status code in place. Used by middleware holding the
    /// response by reference.
    pub fn set_status(&mut self, code: u16) {
        self.status = StatusCode::from_u16(code);
    }

    /// Sets the status code to 200 OK.
    pub fn ok(mut self) -> Self {
        self.status = StatusCode::Ok;
        self
    }

    /// Sets the status code to 201 Created.
    pub fn created(mut self) -> Self {
        self.status = StatusCode::Created;
        self
    }

    /// Sets the status code to 202 Accepted.
    pub fn accepted(mut self) -> Self {
        self.status = StatusCode::Accepted;
        self
    }

    /// Sets the status code to 204 No Content.
    pub fn no_content(mut self) -> Self {
        self.status = StatusCode::NoContent;
        self
    }

    /// Sets the status code to 400 Bad Request.
    pub fn bad_request(mut self) -> Self {
        self.status = StatusCode::BadRequest;
        self
    }

    /// Sets the status code to 401 Unauthorized.
    pub fn unauthorized(mut self) -> Self {
        self.status = StatusCode::Unauthorized;
        self
    }

    /// Sets the status code to 403 Forbidden.
    pub fn forbidden(mut self) -> Self {
        self.status = StatusCode::Forbidden;
        self
    }

    /// Sets the status code to 404 Not Found.
    pub fn not_found(mut self) -> Self {
        self.status = StatusCode::NotFound;
        self
    }

    /// Sets the status code to 500 Internal Server Error.
    pub fn internal_server_error(mut self) -> Self {
        self.status = StatusCode::InternalServerError;
        self
    }

    /// Sets the status code to a given u16 value.
    pub fn status(mut self, code: u16) -> Self {
        self.status = StatusCode::from_u16(code);
        self
    }

    /// Sets the response body to text.
    ///
    /// # Example
    /// ```rust
    /// use viaduct::context::HttpResponse;
    ///
    /// let res = HttpResponse::new().ok().text("done");
    /// ```
    pub fn text<T: Into<String>>(mut self, text: T) -> Self {
        self.body = ResponseBody::Text(text.into());
        self
    }

    /// Sets the response body to HTML.
    pub fn html<T: Into<String>>(mut self, html: T) -> Self {
        self.body = ResponseBody::Html(html.into());
        self
    }

    /// Sets the response body to JSON.
    ///
    /// Values that fail to serialise become JSON `null`.
    ///
    /// # Example
    /// ```rust
    /// use viaduct::context::HttpResponse;
    /// use serde::Serialize;
    ///
    /// #[derive(Serialize)]
    /// struct User {
    ///     name: String,
    /// }
    ///
    /// let res = HttpResponse::new().ok().json(User { name: "John".to_string() });
    /// ```
    pub fn json<T: Serialize>(mut self, json: T) -> Self {
        self.body =
            ResponseBody::Json(serde_json::to_value(json).unwrap_or(serde_json::Value::Null));
        self
    }

    /// Sets the response body to binary data.
    pub fn bytes<T: Into<Bytes>>(mut self, bytes: T) -> Self {
        self.body = ResponseBody::Bin(bytes.into());
        self
    }

    /// Sets a header in the response.
    ///
    /// # Example
    /// ```
    /// use viaduct::context::HttpResponse;
    ///
    /// let res = HttpResponse::new().set_header("X-Request-Id", "abc");
    /// ```
    pub fn set_header<K: AsRef<str>, V: AsRef<str>>(mut self, name: K, value: V) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets a cookie in the response.
    ///
    /// Each cookie becomes its own `Set-Cookie` header when the response is
    /// materialised.
    ///
    /// # Example
    /// ```rust
    /// use viaduct::context::HttpResponse;
    /// use viaduct::res::cookie::CookieOptions;
    ///
    /// let res = HttpResponse::new()
    ///     .set_cookie("session", "abc123", CookieOptions::default())
    ///     .ok()
    ///     .text("Logged in");
    /// ```
    pub fn set_cookie<N: Into<String>, V: Into<String>>(
        mut self,
        name: N,
        value: V,
        options: CookieOptions,
    ) -> Self {
        self.cookies.push(SetCookie::new(name, value, options));
        self
    }

    /// Removes a cookie on the client: emits the name with an empty value and
    /// `Max-Age=0`.
    ///
    /// # Example
    /// ```rust
    /// use viaduct::context::HttpResponse;
    ///
    /// let res = HttpResponse::new().clear_cookie("session").ok().text("Logged out");
    /// ```
    pub fn clear_cookie<N: Into<String>>(mut self, name: N) -> Self {
        let name = name.into();
        self.cookies.retain(|cookie| cookie.name != name);
        self.cookies.push(SetCookie::expire_now(name, None));
        self
    }

    /// Redirects the client to the specified URL with a 302.
    pub fn redirect<L: AsRef<str>>(mut self, location: L) -> Self {
        self.status = StatusCode::Redirect;
        self.headers.insert("Location", location);
        self
    }

    /// Permanently redirects the client to the specified URL with a 301.
    pub fn permanent_redirect<L: AsRef<str>>(mut self, location: L) -> Self {
        self.status = StatusCode::PermanentRedirect;
        self.headers.insert("Location", location);
        self
    }

    /// Queues a cookie on the response in place. Useful from middleware and
    /// handlers holding the response by reference.
    pub fn push_cookie<N: Into<String>, V: Into<String>>(
        &mut self,
        name: N,
        value: V,
        options: CookieOptions,
    ) {
        self.cookies.push(SetCookie::new(name, value, options));
    }

    /// The cookies queued on this response.
    pub fn cookies(&self) -> &[SetCookie] {
        &self.cookies
    }

    pub(crate) fn add_cookie(&mut self, cookie: SetCookie) {
        self.cookies.push(cookie);
    }
}
