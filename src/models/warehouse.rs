use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

/// An (item reference, amount) entry embedded in a warehouse's inventory.
/// The reference is an opaque string; whether it resolves to a real item is
/// checked separately at warehouse creation time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WarehouseItem {
    #[validate(length(min = 1))]
    pub item: String,

    #[validate(range(min = 0))]
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub inventory: Vec<WarehouseItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateWarehouseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 255))]
    pub address: String,

    #[validate(length(min = 1), nested)]
    pub inventory: Vec<WarehouseItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateWarehouseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub address: Option<String>,

    #[validate(length(min = 1), nested)]
    pub inventory: Option<Vec<WarehouseItem>>,
}

/// Returns the first item reference that appears more than once in an
/// inventory list. Two entries for the same item would make per-warehouse
/// amounts ambiguous, so this runs before any warehouse write. References
/// naming the same row id in different spellings ("5" and "05") count as
/// duplicates; only unparseable references fall back to text comparison.
pub fn find_duplicate_item_ref(inventory: &[WarehouseItem]) -> Option<&str> {
    let mut seen = HashSet::new();
    inventory
        .iter()
        .find(|entry| {
            let key = entry.item.parse::<i64>().map_err(|_| entry.item.as_str());
            !seen.insert(key)
        })
        .map(|entry| entry.item.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(item: &str, amount: i64) -> WarehouseItem {
        WarehouseItem {
            item: item.to_string(),
            amount,
        }
    }

    #[test]
    fn duplicate_item_refs_are_detected() {
        let inventory = vec![entry("1", 5), entry("2", 3), entry("1", 7)];
        assert_eq!(find_duplicate_item_ref(&inventory), Some("1"));
    }

    #[test]
    fn duplicate_item_refs_are_detected_across_spellings() {
        let inventory = vec![entry("5", 1), entry("05", 2)];
        assert_eq!(find_duplicate_item_ref(&inventory), Some("05"));
    }

    #[test]
    fn unique_item_refs_pass() {
        let inventory = vec![entry("1", 5), entry("2", 3)];
        assert_eq!(find_duplicate_item_ref(&inventory), None);
    }

    #[test]
    fn create_request_requires_nonempty_fields() {
        let req = CreateWarehouseRequest {
            name: String::new(),
            address: "12 Dock Road".to_string(),
            inventory: vec![entry("1", 1)],
        };
        assert!(req.validate().is_err());

        let req = CreateWarehouseRequest {
            name: "North depot".to_string(),
            address: "12 Dock Road".to_string(),
            inventory: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_rejects_negative_amounts() {
        let req = CreateWarehouseRequest {
            name: "North depot".to_string(),
            address: "12 Dock Road".to_string(),
            inventory: vec![entry("1", -2)],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_accepts_valid_input() {
        let req = CreateWarehouseRequest {
            name: "North depot".to_string(),
            address: "12 Dock Road".to_string(),
            inventory: vec![entry("1", 0), entry("2", 40)],
        };
        assert!(req.validate().is_ok());
    }
}
