//! Lock manager that guards per-resource exclusivity for transactions
//!
//! Locks live in the key-value store as `lock:<type>:<id>` entries whose
//! value is the owning transaction id. Every lock carries a TTL; a lock that
//! is never explicitly released lapses on its own, which is the only
//! recovery path for transactions abandoned mid-flight.

mod key;
mod manager;

pub use key::LockKey;
pub use manager::LockManager;
