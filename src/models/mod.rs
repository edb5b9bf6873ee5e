pub mod item;
pub mod warehouse;

pub use item::*;
pub use warehouse::*;
