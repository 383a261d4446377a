//! Authentication middleware for customer sessions and staff

pub mod session_auth;
pub mod staff_auth;

pub use session_auth::{SessionContext, session_middleware, session_orders_middleware};
pub use staff_auth::{StaffIdentity, create_token, staff_auth_middleware};
