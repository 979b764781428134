//! Account service library: MySQL pool cache and database health supervision.

pub mod config;
pub mod database;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServiceConfig;
pub use database::{PoolCache, ProbeOutcome, ProbeRunner};
pub use health::HealthMonitor;
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownCoordinator};
