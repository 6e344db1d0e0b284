pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::{EngineError, ErrorResponse, ValidationError};
