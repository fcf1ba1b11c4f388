//! Shard selection policies.
//!
//! A [`ShardingPolicy`] decides which shard owns a routing key. The crate
//! ships one implementation, [`consistent_hash::ConsistentHashPolicy`];
//! the trait is object safe so alternative strategies can be swapped in
//! behind an `Arc<dyn ShardingPolicy>` without changing callers.

pub mod consistent_hash;

use std::sync::Arc;

use crate::errors::ShardSelectionError;

/// The identifier of a shard, an opaque non-empty string chosen by the
/// caller.
///
/// Stored as `Arc<str>` so that all ring entries of one shard, and every
/// lookup result handed out, share a single allocation.
pub type ShardId = Arc<str>;

/// Policy deciding which shard owns a routing key.
pub trait ShardingPolicy: Send + Sync + std::fmt::Debug {
    /// Resolves the shard owning `key`.
    ///
    /// For a fixed shard membership the result is deterministic: the same
    /// key always resolves to the same shard. Fails with
    /// [`ShardSelectionError::NoShardsAvailable`] when no shard is
    /// registered.
    fn shard_for_key(&self, key: &str) -> Result<ShardId, ShardSelectionError>;

    /// Returns the name of the policy.
    fn name(&self) -> String;
}
