use crate::res::{HttpResponse, ResponseBody};
use bytes::BytesMut;
use serde::Serialize;

/// A value that can materialise an HTTP response.
///
/// Materialisation is a two-step contract driven by the dispatcher:
///
/// 1. [`options`](Responder::options) may adjust the response status and
///    propose headers (notably Content-Type). Headers already present, set
///    by middleware or earlier writes, win: a responder only sets what is
///    absent.
/// 2. [`output`](Responder::output) appends the serialised body bytes.
///
/// Handlers return any responder; the built-ins cover plain text, HTML,
/// JSON, raw bytes, empty bodies and the fully caller-controlled
/// [`HttpResponse`].
pub trait Responder {
    /// Sets status and headers on the response being accumulated.
    fn options(&self, res: &mut HttpResponse);

    /// Appends the serialised body.
    fn output(&self, buf: &mut BytesMut);
}

const CONTENT_TYPE: &str = "Content-Type";

fn propose_content_type(res: &mut HttpResponse, value: &'static str) {
    if !res.headers.contains_key(CONTENT_TYPE) {
        res.headers.insert(CONTENT_TYPE, value);
    }
}

/// A `text/plain; charset=utf-8` body.
pub struct Text(pub String);

impl Text {
    /// Builds a text responder from anything stringly.
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self(text.into())
    }
}

impl Responder for Text {
    fn options(&self, res: &mut HttpResponse) {
        if !self.0.is_empty() {
            propose_content_type(res, "text/plain; charset=utf-8");
        }
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(self.0.as_bytes());
    }
}

/// A `text/html; charset=utf-8` body.
pub struct Html(pub String);

impl Html {
    /// Builds an HTML responder.
    pub fn new<T: Into<String>>(html: T) -> Self {
        Self(html.into())
    }
}

impl Responder for Html {
    fn options(&self, res: &mut HttpResponse) {
        if !self.0.is_empty() {
            propose_content_type(res, "text/html; charset=utf-8");
        }
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(self.0.as_bytes());
    }
}

/// An `application/json; charset=utf-8` body carrying canonical JSON.
pub struct Json(pub serde_json::Value);

impl Json {
    /// Serialises any `Serialize` value into a JSON responder.
    pub fn of<T: Serialize>(value: T) -> Result<Self, crate::error::Error> {
        Ok(Self(serde_json::to_value(value)?))
    }
}

impl Responder for Json {
    fn options(&self, res: &mut HttpResponse) {
        propose_content_type(res, "application/json; charset=utf-8");
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&serde_json::to_vec(&self.0).unwrap_or_default());
    }
}

/// An `application/octet-stream` body.
pub struct Bin(pub bytes::Bytes);

impl Bin {
    /// Builds a binary responder.
    pub fn new<T: Into<bytes::Bytes>>(bytes: T) -> Self {
        Self(bytes.into())
    }
}

impl Responder for Bin {
    fn options(&self, res: &mut HttpResponse) {
        if !self.0.is_empty() {
            propose_content_type(res, "application/octet-stream");
        }
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.0);
    }
}

/// No body, no Content-Type. The response status and headers stand as set.
pub struct Empty;

impl Responder for Empty {
    fn options(&self, _res: &mut HttpResponse) {}

    fn output(&self, _buf: &mut BytesMut) {}
}

/// Status-plus-plain-text responder used for the framework's default
/// responses (404, 400, 500).
pub(crate) struct StatusText {
    pub status: u16,
    pub body: &'static str,
}

impl Responder for StatusText {
    fn options(&self, res: &mut HttpResponse) {
        res.set_status(self.status);
        propose_content_type(res, "text/plain; charset=utf-8");
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(self.body.as_bytes());
    }
}

impl Responder for String {
    fn options(&self, res: &mut HttpResponse) {
        if !self.is_empty() {
            propose_content_type(res, "text/plain; charset=utf-8");
        }
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(self.as_bytes());
    }
}

impl Responder for &'static str {
    fn options(&self, res: &mut HttpResponse) {
        if !self.is_empty() {
            propose_content_type(res, "text/plain; charset=utf-8");
        }
    }

    fn output(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(self.as_bytes());
    }
}

/// The fully caller-controlled responder: status, headers, cookies and body
/// all come from the [`HttpResponse`] itself. Headers already present on the
/// accumulated response still win over this response's proposals.
impl Responder for HttpResponse {
    fn options(&self, res: &mut HttpResponse) {
        res.set_status(self.status_code());

        for key in self.headers.keys() {
            if !res.headers.contains_key(key) {
                for value in self.headers.get_all(key) {
                    res.headers.append(key, value);
                }
            }
        }

        for cookie in self.cookies() {
            res.add_cookie(cookie.clone());
        }

        match &self.body {
            ResponseBody::Text(text) if !text.is_empty() => {
                propose_content_type(res, "text/plain; charset=utf-8")
            }
            ResponseBody::Html(html) if !html.is_empty() => {
                propose_content_type(res, "text/html; charset=utf-8")
            }
            ResponseBody::Json(_) => propose_content_type(res, "application/json; charset=utf-8"),
            ResponseBody::Bin(bytes) if !bytes.is_empty() => {
                propose_content_type(res, "application/octet-stream")
            }
            _ => {}
        }
    }

    fn output(&self, buf: &mut BytesMut) {
        match &self.body {
            ResponseBody::Text(text) => buf.extend_from_slice(text.as_bytes()),
            ResponseBody::Html(html) => buf.extend_from_slice(html.as_bytes()),
            ResponseBody::Json(value) => {
                buf.extend_from_slice(&serde_json::to_vec(value).unwrap_or_default())
            }
            ResponseBody::Bin(bytes) => buf.extend_from_slice(bytes),
            ResponseBody::Empty => {}
        }
    }
}
