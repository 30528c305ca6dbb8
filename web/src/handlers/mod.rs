//! HTTP and WebSocket handlers shared by seatlease services.

pub mod health;
pub mod websocket;

// Re-export common handler utilities
pub use health::health_check;
pub use websocket::stream_broadcast;
