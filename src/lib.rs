#![warn(missing_docs)]

//! # Viaduct
//!
//! Viaduct is a lightweight, Express-style web framework for building HTTP APIs
//! and real-time applications in Rust. Applications declare routes (method plus
//! path pattern) bound to async handler functions, optionally wrapped by layered
//! middleware, and serve them over HTTP, with WebSocket upgrades feeding a
//! channel-based publish/subscribe hub.
//!
//! ## Modules
//!
//! - [`app`] - The main application struct and the per-request dispatcher.
//! - [`req`] - The HTTP request struct and utilities for extracting data from requests.
//! - [`res`] - The HTTP response struct, responders, headers, cookies and status codes.
//! - [`router`] - The route store, route groups and the registration trait.
//! - [`pattern`] - The path template compiler and matcher.
//! - [`middleware`] - The onion-model middleware chain and its `Next` continuation.
//! - [`middlewares`] - Built-in middleware (CORS).
//! - [`ws`] - The WebSocket hub, peers and events.
//! - [`transport`] - The transport seam and the bundled hyper adapter.
//! - [`logger`] - The logging capability consumed by the core.
//! - [`types`] - Core types and aliases used throughout the framework.
//! - [`error`] - Error types and categories.
//!
//! ## Example
//!
//! ```no_run
//! use viaduct::app::App;
//! use viaduct::res::responder::Text;
//! use viaduct::router::Routing;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = App::new();
//!     app.get("/hello", |event| async move { Ok(event.send(Text::new("hi"))) });
//!     app.listen(3000, || println!("listening on port 3000")).await;
//! }
//! ```

/// The main application struct and the per-request dispatcher.
///
/// See [`app::App`] for details.
pub mod app;

/// Error types and categories used throughout the framework.
pub mod error;

/// The logging capability consumed by the core.
pub mod logger;

/// The onion-model middleware chain and its `Next` continuation.
pub mod middleware;

/// Built-in middleware modules.
pub mod middlewares;

/// The path template compiler and matcher.
pub mod pattern;

/// The HTTP request struct and its methods for extracting data from requests.
///
/// See [`req::HttpRequest`] for details.
pub mod req;

/// The HTTP response struct and its methods for building responses.
///
/// See [`res::HttpResponse`] for details.
pub mod res;

/// The route store, route groups and the registration trait.
pub mod router;

/// The transport seam and the bundled hyper adapter.
pub mod transport;

/// Core types and aliases used throughout the framework.
pub mod types;

/// The WebSocket hub, peers and events.
pub mod ws;

/// Common context types for handler functions.
///
/// Re-exports [`HttpRequest`](req::HttpRequest), [`HttpResponse`](res::HttpResponse)
/// and the per-request [`RequestEvent`](types::RequestEvent) for convenience.
pub mod context {
    pub use super::req::HttpRequest;
    pub use super::res::HttpResponse;
    pub use super::types::{Reply, RequestEvent};
}

#[cfg(test)]
mod tests;
