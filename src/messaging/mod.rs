//! Messaging Surface
//!
//! The non-query RPCs sharing the node's transport: unary message send, a
//! batched variant, a server-push subscription stream and a bidirectional
//! echo chat. All of them are thin pass-throughs over an in-memory message
//! table; none participate in the distributed query path.

pub mod handlers;
pub mod protocol;
pub mod service;

#[cfg(test)]
mod tests;
