//! Axum integration for seatlease services.
//!
//! Handlers stay thin: they parse the request, call into a coordinator
//! (which runs the reducer under its store lock) and map the result or
//! domain error onto HTTP.
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives at an Axum handler
//! 2. **Extract data** from the request (JSON, bearer token)
//! 3. **Dispatch** through the owning store
//! 4. **Map result** to an HTTP response, or to [`AppError`]
//!
//! Live feeds are WebSocket connections fed from a broadcast channel by
//! [`handlers::stream_broadcast`].

#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::BearerToken;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
