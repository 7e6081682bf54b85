use std::fmt::Display;

/// Broad failure categories used across the framework.
///
/// The category decides the default response the dispatcher produces when an
/// error escapes a handler or middleware: [`Body`](ErrorKind::Body) turns into
/// a 400, everything else into a 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid configuration, reported at registration time (e.g. a bad
    /// route template). A misconfigured server must not start silently.
    Config,
    /// A request body could not be decoded.
    Body,
    /// A handler or middleware failed for any other reason.
    Handler,
    /// The transport failed while moving bytes.
    Transport,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Config => write!(f, "Config error"),
            ErrorKind::Body => write!(f, "Body error"),
            ErrorKind::Handler => write!(f, "Handler error"),
            ErrorKind::Transport => write!(f, "Transport error"),
        }
    }
}

/// Framework error: a category plus a human-readable message.
#[derive(Debug)]
pub struct Error {
    /// The failure category.
    pub kind: ErrorKind,
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl Error {
    /// A registration-time configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self {
            kind: ErrorKind::Config,
            message: message.into(),
        }
    }

    /// A handler failure.
    pub fn handler<M: Into<String>>(message: M) -> Self {
        Self {
            kind: ErrorKind::Handler,
            message: message.into(),
        }
    }

    /// A transport failure.
    pub fn transport<M: Into<String>>(message: M) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: message.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ViaductError: {{ message: {}, kind: {} }}",
            self.message, self.kind
        )
    }
}

impl std::error::Error for Error {}

/// Typed request-body decode failures.
///
/// Surfaced by the body readers on [`HttpRequest`](crate::req::HttpRequest);
/// a handler may catch these and respond differently, otherwise the
/// dispatcher converts them into a 400 response.
#[derive(Debug, PartialEq)]
pub enum BodyError {
    /// The body is not valid UTF-8 text.
    InvalidText(String),
    /// A JSON body is not valid UTF-8.
    InvalidJsonCharset(String),
    /// A JSON body failed to parse.
    InvalidJson(String),
}

impl Display for BodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BodyError::InvalidText(detail) => write!(f, "Body is not valid text: {}", detail),
            BodyError::InvalidJsonCharset(detail) => {
                write!(f, "JSON body is not valid UTF-8: {}", detail)
            }
            BodyError::InvalidJson(detail) => write!(f, "JSON is invalid: {}", detail),
        }
    }
}

impl std::error::Error for BodyError {}

impl From<BodyError> for Error {
    fn from(err: BodyError) -> Self {
        Self {
            kind: ErrorKind::Body,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Transport,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self {
            kind: ErrorKind::Handler,
            message: err.to_string(),
        }
    }
}
