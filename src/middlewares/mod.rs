//! Built-in middleware.

/// Cross-origin resource sharing middleware.
pub mod cors;
