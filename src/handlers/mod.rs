pub mod items;
pub mod warehouses;

pub use items::*;
pub use warehouses::*;
