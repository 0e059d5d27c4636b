/// Moments Service Library
///
/// Family post service for the Family Moments platform: posts with up to
/// four images, soft deletes, keyset-paginated family feeds, and loves.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route registration
/// - `models`: Posts, image slots, views and request types
/// - `services`: Post and love business logic
/// - `db`: Repositories, transactions and connection pool
/// - `middleware`: Caller identity extraction
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
