//! Data models
//!
//! Shared between dine-server and its clients (via API).
//! Row/entity ids are `i64` snowflakes (see [`crate::util::snowflake_id`]);
//! ordering sessions use the opaque string id described in [`session`].
//! Timestamps are unix milliseconds.

pub mod cart;
pub mod customer;
pub mod desk;
pub mod menu;
pub mod order;
pub mod session;
pub mod shop;

// Re-exports
pub use cart::*;
pub use customer::*;
pub use desk::*;
pub use menu::*;
pub use order::*;
pub use session::*;
pub use shop::*;
