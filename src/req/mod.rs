#![warn(missing_docs)]

use crate::error::BodyError;
use crate::res::cookie::parse_cookie_header;
use crate::types::Method;
use bytes::Bytes;
use once_cell::sync::OnceCell;
use std::collections::HashMap;

/// Request body decoding: the content-type dispatched [`RequestBody`](body::RequestBody)
/// and the [`FromRequestBody`](body::FromRequestBody) extension trait.
pub mod body;

/// Represents an incoming HTTP request.
///
/// Carries the method, path, query parameters, headers and the raw body
/// bytes. Cookies are parsed lazily on first access, and the body is decoded
/// lazily by the accessor that is actually called: [`text`](HttpRequest::text),
/// [`json`](HttpRequest::json), [`bytes`](HttpRequest::bytes) or the
/// content-type dispatched [`body`](HttpRequest::body).
///
/// ## Example
///
/// ```rust
/// use viaduct::context::HttpRequest;
/// use viaduct::types::Method;
///
/// let mut req = HttpRequest::new(Method::POST, "/login");
/// req.set_header("Content-Type", "application/json");
/// req.set_body(r#"{"user":"ada"}"#);
///
/// let value: serde_json::Value = req.json().unwrap();
/// assert_eq!(value["user"], "ada");
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    origin_url: String,
    query: HashMap<String, String>,
    headers: HashMap<String, String>,
    cookies: OnceCell<HashMap<String, String>>,
    body: Bytes,
}

impl HttpRequest {
    /// Creates a request with the given method and path and nothing else.
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            origin_url: path.to_string(),
            query: HashMap::new(),
            headers: HashMap::new(),
            cookies: OnceCell::new(),
            body: Bytes::new(),
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path, exactly as the transport delivered it.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request path plus query string.
    pub fn url(&self) -> &str {
        &self.origin_url
    }

    /// Returns a header value. Lookup is case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|value| value.as_str())
    }

    /// Sets a header. Names are stored lowercased.
    pub fn set_header(&mut self, name: &str, value: &str) {
        let name = name.to_lowercase();
        if name == "cookie" {
            // Drop any jar parsed from the previous header value.
            self.cookies = OnceCell::new();
        }
        self.headers.insert(name, value.to_string());
    }

    /// Returns a query parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|value| value.as_str())
    }

    /// Sets a single query parameter.
    pub fn set_query(&mut self, name: &str, value: &str) {
        self.query.insert(name.to_string(), value.to_string());
    }

    /// Parses a raw query string (without the leading `?`) into the query
    /// map and records it on the url.
    pub fn set_query_string(&mut self, raw: &str) {
        for (name, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            self.query.insert(name.into_owned(), value.into_owned());
        }
        if !raw.is_empty() {
            self.origin_url = format!("{}?{}", self.path, raw);
        }
    }

    /// Retrieves a cookie value by name.
    ///
    /// The `Cookie` header is parsed once, on first access.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie_jar().get(name).map(|value| value.as_str())
    }

    /// All cookies sent with the request.
    pub fn cookies(&self) -> &HashMap<String, String> {
        self.cookie_jar()
    }

    fn cookie_jar(&self) -> &HashMap<String, String> {
        self.cookies.get_or_init(|| {
            self.header("cookie")
                .map(parse_cookie_header)
                .unwrap_or_default()
        })
    }

    /// Replaces the raw body bytes.
    pub fn set_body<B: Into<Bytes>>(&mut self, body: B) {
        self.body = body.into();
    }

    /// The raw, undecoded body bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Decodes the body as UTF-8 text.
    pub fn text(&self) -> Result<String, BodyError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|err| BodyError::InvalidText(err.to_string()))
    }

    /// Deserialises the request body as JSON into the specified type.
    ///
    /// ## Example
    /// ```rust
    /// use viaduct::context::HttpRequest;
    /// use viaduct::types::Method;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct LoginData {
    ///     username: String,
    /// }
    ///
    /// let mut req = HttpRequest::new(Method::POST, "/login");
    /// req.set_body(r#"{"username":"ada"}"#);
    /// let data: LoginData = req.json().unwrap();
    /// assert_eq!(data.username, "ada");
    /// ```
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, BodyError> {
        let text = std::str::from_utf8(&self.body)
            .map_err(|err| BodyError::InvalidJsonCharset(err.to_string()))?;
        serde_json::from_str(text).map_err(|err| BodyError::InvalidJson(err.to_string()))
    }

    /// Decodes the body by Content-Type: JSON for `application/json`, text
    /// for `text/plain`/`text/html`, raw bytes otherwise (including when the
    /// header is absent).
    pub fn body(&self) -> Result<body::RequestBody, BodyError> {
        body::decode(self)
    }

    /// Decodes the body through a user-provided [`body::FromRequestBody`]
    /// implementation.
    pub fn body_as<T: body::FromRequestBody>(&self) -> Result<T, BodyError> {
        T::from_request(self)
    }

    /// The parsed Content-Type, if the header is present and valid.
    pub fn content_type(&self) -> Option<mime::Mime> {
        self.header("content-type")
            .and_then(|value| value.parse::<mime::Mime>().ok())
    }
}
