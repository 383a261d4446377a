//! Shared types for the dine ordering service
//!
//! Structured error codes, domain models, event payloads and small
//! utilities used by the server and by client tooling.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, ErrorCategory, ErrorCode};
pub use message::{DineEvent, EventKind};
