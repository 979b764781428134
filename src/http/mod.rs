//! HTTP listening interface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → GET /health → latest HealthSnapshot (200 healthy, 503 otherwise)
//! ```

pub mod server;

pub use server::HttpServer;
