pub mod item_service;
pub mod warehouse_service;

pub use item_service::*;
pub use warehouse_service::*;

/// Identifiers arrive as opaque path/reference strings. Anything that does
/// not parse as a row id is treated exactly like an id that does not exist,
/// so callers never see a separate "malformed id" error.
pub(crate) fn parse_id(id: &str) -> Option<i64> {
    id.parse::<i64>().ok()
}
