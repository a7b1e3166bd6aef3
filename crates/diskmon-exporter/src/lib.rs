pub mod config;
pub mod handlers;
pub mod metrics;
pub mod probe;
pub mod router;
