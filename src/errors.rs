//! This module contains the errors which can be returned during shard
//! selection.

use thiserror::Error;

/// An error returned when a routing key cannot be resolved to a shard.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ShardSelectionError {
    /// The ring holds no virtual nodes, so no shard can own the key.
    /// Returned until at least one shard with a nonzero virtual node count
    /// is registered.
    #[error("no shards available")]
    NoShardsAvailable,
}
