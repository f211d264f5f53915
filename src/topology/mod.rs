//! Topology Model
//!
//! In-memory representation of the static overlay: the node table, the
//! designated portal, each node's key interval and peer adjacency.
//!
//! ## Core Concepts
//! - **Static membership**: the node set is fixed by a configuration document
//!   loaded once at startup. There is no discovery protocol; a malformed
//!   document aborts the process before it accepts traffic.
//! - **Partitioning**: every node owns a closed integer key interval. The
//!   intervals are pairwise disjoint and together cover the designed key
//!   space, so `owner_of` resolves every key to exactly one node.
//! - **Adjacency**: `connects_to` lists which peers a node dials at startup.
//!   The adjacency table is plain data; peer handles live in the overlay's
//!   registry, never as ownership cycles between node structures.

pub mod model;
pub mod types;
