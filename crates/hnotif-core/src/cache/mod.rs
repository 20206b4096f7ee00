//! Cache module: freshness cache implementations.

mod memory;

pub use memory::InMemoryFreshnessCache;
