//! Domain model (IDs, items, policy decisions, error classification).

pub mod decision;
pub mod errors;
pub mod ids;
pub mod item;

pub use decision::{Policy, Resolution};
pub use errors::ErrorKind;
pub use ids::{ItemId, PassId};
pub use item::Item;
