//! Desk (Table) Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::order::Order;

/// Capacity given to desks provisioned implicitly by an incoming order
pub const DEFAULT_DESK_CAPACITY: i32 = 4;

/// Stored desk status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeskStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

impl DeskStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
        }
    }
}

impl fmt::Display for DeskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "reserved" => Ok(Self::Reserved),
            other => Err(format!("unknown desk status '{other}'")),
        }
    }
}

/// Desk entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desk {
    pub id: i64,
    pub shop_id: i64,
    /// Table number as printed on the QR code
    pub name: String,
    pub capacity: i32,
    /// Stored flag, may be overridden manually by staff
    pub status: DeskStatus,
    pub area: Option<String>,
    pub created_at: i64,
}

/// Create desk payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskCreate {
    pub name: String,
    pub capacity: Option<i32>,
    pub area: Option<String>,
}

/// Update desk payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskUpdate {
    pub name: Option<String>,
    pub capacity: Option<i32>,
    pub area: Option<String>,
}

/// Manual status override payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskStatusUpdate {
    pub status: DeskStatus,
}

/// Desk with occupancy derived from its linked orders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskView {
    #[serde(flatten)]
    pub desk: Desk,
    /// Count of orders currently occupying the desk
    pub order_count: i64,
    /// Most recently created occupying order
    pub current_order: Option<Order>,
    /// Computed status: `occupied` iff any order occupies the desk.
    /// The stored `status` flag is reported alongside, untouched.
    pub occupancy: DeskStatus,
}

impl DeskView {
    pub fn is_occupied(&self) -> bool {
        self.order_count > 0
    }
}

/// Outcome of settling a desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskRelease {
    pub desk_id: i64,
    /// Orders flipped to completed + paid (empty when nothing was outstanding)
    pub orders: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desk_status_parse() {
        assert_eq!("reserved".parse::<DeskStatus>(), Ok(DeskStatus::Reserved));
        assert!("busy".parse::<DeskStatus>().is_err());
        assert_eq!(DeskStatus::default(), DeskStatus::Available);
    }

    #[test]
    fn test_view_flattens_desk() {
        let view = DeskView {
            desk: Desk {
                id: 5,
                shop_id: 1,
                name: "A1".to_string(),
                capacity: 4,
                status: DeskStatus::Available,
                area: None,
                created_at: 0,
            },
            order_count: 0,
            current_order: None,
            occupancy: DeskStatus::Available,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["name"], "A1");
        assert_eq!(json["occupancy"], "available");
        assert!(!view.is_occupied());
    }
}
