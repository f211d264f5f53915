//! Distributed Key-Value Overlay Library
//!
//! This library crate defines the core modules of the overlay node. It
//! serves as the foundation for the server binary (`main.rs`).
//!
//! ## Architecture Modules
//! The node is composed of five loosely coupled subsystems:
//!
//! - **`topology`**: The static cluster model. Loads and validates the node
//!   table, key intervals, peer adjacency and the designated portal.
//! - **`store`**: The node-local data layer. An ordered, mutex-protected
//!   partition of the overlay's key space.
//! - **`cache`**: The portal's bounded, TTL-expiring query-result cache.
//! - **`overlay`**: The distributed query engine. Client queries enter at
//!   the portal, fan out to peers with bounded hops and deadlines, and come
//!   back as one aggregated response.
//! - **`messaging`**: The pass-through messaging RPCs (unary send, batch
//!   send, subscription stream, echo chat) sharing the node's transport.

pub mod cache;
pub mod messaging;
pub mod overlay;
pub mod store;
pub mod topology;
