//! dine-server: multi-tenant table ordering service
//!
//! - Anonymous per-table ordering sessions
//! - Desk occupancy derived from outstanding orders, bulk settle-and-release
//! - Transactional order placement with lazy desk provisioning
//! - Customization pricing for cart lines and orders

pub mod api;
pub mod auth;
pub mod cache;
pub mod cart;
pub mod config;
pub mod db;
pub mod desks;
pub mod error;
pub mod logger;
pub mod menu;
pub mod message;
pub mod orders;
pub mod pricing;
pub mod sessions;
pub mod state;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
