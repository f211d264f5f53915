//! Query-Result Cache
//!
//! A bounded FIFO of recently answered portal queries, keyed by the
//! caller-chosen query id. Entries expire after a configured TTL; expiry is
//! checked opportunistically on every cache operation, so no sweeper task is
//! needed. Lookup is a linear scan, which is fine at the configured
//! capacities (order of hundreds).

pub mod query_cache;

#[cfg(test)]
mod tests;
