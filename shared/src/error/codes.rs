//! Unified error codes for the dine platform
//!
//! This module defines all error codes used across dine-server and its clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / ordering-session errors
//! - 3xxx: Shop (tenant) errors
//! - 4xxx: Order and cart errors
//! - 6xxx: Menu errors
//! - 7xxx: Table (desk) errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid format
    InvalidFormat = 6,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth / Session ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Ordering session not found (missing, expired or completed)
    SessionNotFound = 1010,
    /// Ordering session id is malformed
    SessionInvalid = 1011,
    /// Session table number conflicts with the supplied table number
    SessionTableMismatch = 1012,
    /// Session is a degraded fallback and cannot be used for writes
    SessionReadOnly = 1013,

    // ==================== 3xxx: Shop ====================
    /// Shop not found
    ShopNotFound = 3002,

    // ==================== 4xxx: Order / Cart ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been completed
    OrderAlreadyCompleted = 4003,
    /// Order has no items
    OrderEmpty = 4007,
    /// Order status value is not part of the vocabulary
    OrderInvalidStatus = 4008,
    /// Cart line not found
    CartItemNotFound = 4101,
    /// Cart is empty
    CartEmpty = 4102,
    /// Quantity is not acceptable
    InvalidQuantity = 4103,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item is not available for ordering
    MenuItemUnavailable = 6003,
    /// Customization selection or schema is invalid
    InvalidCustomization = 6301,

    // ==================== 7xxx: Table ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table name already exists in the shop
    TableNameExists = 7005,
    /// Table number is malformed
    InvalidTableNumber = 7006,
    /// Table has orders referencing it
    TableHasOrders = 7104,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth / Session
            ErrorCode::NotAuthenticated => "Caller is not authenticated",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::SessionNotFound => "Session not found or no longer active",
            ErrorCode::SessionInvalid => "Session id is malformed",
            ErrorCode::SessionTableMismatch => "Session belongs to a different table",
            ErrorCode::SessionReadOnly => "Session is temporarily read-only",

            // Shop
            ErrorCode::ShopNotFound => "Shop not found",

            // Order / Cart
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyCompleted => "Order has already been completed",
            ErrorCode::OrderEmpty => "Order is empty",
            ErrorCode::OrderInvalidStatus => "Invalid order status",
            ErrorCode::CartItemNotFound => "Cart item not found",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::InvalidQuantity => "Invalid quantity",

            // Menu
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemUnavailable => "Menu item is not available",
            ErrorCode::InvalidCustomization => "Invalid customization",

            // Table
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableNameExists => "Table name already exists",
            ErrorCode::InvalidTableNumber => "Invalid table number",
            ErrorCode::TableHasOrders => "Table has orders",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            6 => Ok(ErrorCode::InvalidFormat),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth / Session
            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1010 => Ok(ErrorCode::SessionNotFound),
            1011 => Ok(ErrorCode::SessionInvalid),
            1012 => Ok(ErrorCode::SessionTableMismatch),
            1013 => Ok(ErrorCode::SessionReadOnly),

            // Shop
            3002 => Ok(ErrorCode::ShopNotFound),

            // Order / Cart
            4001 => Ok(ErrorCode::OrderNotFound),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderInvalidStatus),
            4101 => Ok(ErrorCode::CartItemNotFound),
            4102 => Ok(ErrorCode::CartEmpty),
            4103 => Ok(ErrorCode::InvalidQuantity),

            // Menu
            6001 => Ok(ErrorCode::MenuItemNotFound),
            6003 => Ok(ErrorCode::MenuItemUnavailable),
            6301 => Ok(ErrorCode::InvalidCustomization),

            // Table
            7001 => Ok(ErrorCode::TableNotFound),
            7005 => Ok(ErrorCode::TableNameExists),
            7006 => Ok(ErrorCode::InvalidTableNumber),
            7104 => Ok(ErrorCode::TableHasOrders),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
