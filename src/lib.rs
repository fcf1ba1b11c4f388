//! Consistent-hash shard routing.
//!
//! This crate answers one question: given a string key, which shard of a
//! cluster owns it? Shards are projected onto a 32-bit hash ring as virtual
//! nodes, and a key belongs to the first virtual node at or after the key's
//! own hash, wrapping around past the highest position. The answer is
//! deterministic for a fixed membership, lookups cost one hash plus a binary
//! search, and adding or removing a shard only remaps the keys whose closest
//! virtual node changed.
//!
//! # Routing keys
//! All routing goes through a [`ShardingPolicy`]. The crate ships
//! [`ConsistentHashPolicy`]:
//!
//! ```rust
//! use shard_ring::{ConsistentHashPolicy, ShardingPolicy};
//!
//! let policy = ConsistentHashPolicy::new(["alpha", "beta", "gamma"], 128);
//!
//! // The same key resolves to the same shard, call after call.
//! let owner = policy.shard_for_key("user:1001").unwrap();
//! assert_eq!(policy.shard_for_key("user:1001").unwrap(), owner);
//!
//! // Growing the cluster only remaps the keys the new shard takes over.
//! policy.add_shard("delta");
//! ```
//!
//! Policies are configured through a builder when the defaults don't fit:
//!
//! ```rust
//! use shard_ring::routing::partitioner::PartitionerName;
//! use shard_ring::ConsistentHashPolicy;
//!
//! let policy = ConsistentHashPolicy::builder()
//!     .shards(["alpha", "beta"])
//!     .virtual_nodes_per_shard(64)
//!     .partitioner(PartitionerName::Fnv1a)
//!     .build();
//! assert_eq!(policy.virtual_node_count(), 128);
//! ```
//!
//! # Concurrency
//! A policy is meant to be shared: lookups are lock-free reads of an
//! immutable ring snapshot that is replaced wholesale on every membership
//! change, so readers never block and never observe a half-updated ring.
//! See [`sharding::consistent_hash::RingSnapshot`] for reading the ring
//! directly.

pub mod errors;
pub mod routing;
pub mod sharding;

#[cfg(test)]
mod test_utils;

pub use sharding::consistent_hash::{ConsistentHashPolicy, ConsistentHashPolicyBuilder};
pub use sharding::{ShardId, ShardingPolicy};
