pub mod api;
pub mod config;
pub mod constants;
pub mod service;

pub use api::router;
pub use config::Args;
pub use service::{LedgerService, ServiceError};
