use crate::error::BodyError;
use crate::req::HttpRequest;
use bytes::Bytes;

/// A request body decoded by Content-Type.
///
/// Produced by [`HttpRequest::body`]: `application/json` bodies become
/// [`Json`](RequestBody::Json), `text/plain` and `text/html` become
/// [`Text`](RequestBody::Text), everything else (including requests without
/// a Content-Type) stays raw [`Bytes`](RequestBody::Bytes). A request with
/// no body at all is [`Empty`](RequestBody::Empty).
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// UTF-8 text from a `text/*` body.
    Text(String),
    /// Parsed JSON from an `application/json` body.
    Json(serde_json::Value),
    /// Raw bytes for any other (or missing) Content-Type.
    Bytes(Bytes),
    /// No body was sent.
    Empty,
}

/// The ability to produce a typed value from a request's body and headers.
///
/// Built-in implementations cover `String` (UTF-8 text), `serde_json::Value`
/// and raw `Bytes`. User types typically build on the JSON reader:
///
/// ```rust
/// use viaduct::error::BodyError;
/// use viaduct::req::body::FromRequestBody;
/// use viaduct::req::HttpRequest;
///
/// struct Login {
///     username: String,
/// }
///
/// impl FromRequestBody for Login {
///     fn from_request(req: &HttpRequest) -> Result<Self, BodyError> {
///         let value: serde_json::Value = req.json()?;
///         Ok(Login {
///             username: value["username"].as_str().unwrap_or_default().to_string(),
///         })
///     }
/// }
/// ```
pub trait FromRequestBody: Sized {
    /// Reads the typed value out of the request.
    fn from_request(req: &HttpRequest) -> Result<Self, BodyError>;
}

impl FromRequestBody for String {
    fn from_request(req: &HttpRequest) -> Result<Self, BodyError> {
        req.text()
    }
}

impl FromRequestBody for serde_json::Value {
    fn from_request(req: &HttpRequest) -> Result<Self, BodyError> {
        req.json()
    }
}

impl FromRequestBody for Bytes {
    fn from_request(req: &HttpRequest) -> Result<Self, BodyError> {
        Ok(req.bytes().clone())
    }
}

pub(crate) fn decode(req: &HttpRequest) -> Result<RequestBody, BodyError> {
    if req.bytes().is_empty() {
        return Ok(RequestBody::Empty);
    }

    match req.content_type() {
        Some(mime) if mime.type_() == mime::APPLICATION && mime.subtype() == mime::JSON => {
            Ok(RequestBody::Json(req.json()?))
        }
        Some(mime)
            if mime.type_() == mime::TEXT
                && (mime.subtype() == mime::PLAIN || mime.subtype() == mime::HTML) =>
        {
            Ok(RequestBody::Text(req.text()?))
        }
        _ => Ok(RequestBody::Bytes(req.bytes().clone())),
    }
}
