//! Local Partition Store
//!
//! The node-local slice of the overlay's data: an ordered map from integer
//! key to serialized data item, covering exactly the key interval this node
//! owns.
//!
//! ## Core Concepts
//! - **Single lock**: every read and write goes through one mutex, so
//!   concurrent gather handlers never observe torn writes.
//! - **Ordered keys**: range and full scans walk the underlying `BTreeMap`
//!   in key order; a node's contribution to a response is always sorted.
//! - **Opaque encoding**: values are stored as serialized JSON strings. Any
//!   bijective encoding would do; JSON keeps the store inspectable.

pub mod partition;
pub mod types;

#[cfg(test)]
mod tests;
