//! Scanpage Common Library
//!
//! REST API client and request payloads used to seed fixtures for the
//! candidate scanning page E2E scenarios.

pub mod api;
pub mod error;
pub mod models;

pub use api::{ApiClient, ApiConfig, ApiResponse, Method};
pub use error::{Error, Result};
pub use models::*;
