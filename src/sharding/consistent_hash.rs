//! Consistent-hash shard selection.
//!
//! Each shard is projected onto the ring as a set of virtual nodes: the
//! labels `"<shard>-0"` through `"<shard>-<n-1>"` are hashed and the
//! resulting positions all route to that shard. A key is owned by the shard
//! of the first virtual node at or after the key's own hash, wrapping around
//! past the highest position. Spreading every shard across many positions
//! evens out the load, and membership changes only move the keys whose
//! closest virtual node changed.

use std::fmt;
use std::iter;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use itertools::Itertools;
use tracing::debug;

use crate::errors::ShardSelectionError;
use crate::routing::partitioner::{Partitioner, PartitionerName};
use crate::routing::ring::HashRing;
use crate::routing::RingPosition;
use crate::sharding::{ShardId, ShardingPolicy};

/// Number of virtual nodes each shard contributes to the ring, unless
/// overridden with
/// [`ConsistentHashPolicyBuilder::virtual_nodes_per_shard`].
pub const DEFAULT_VIRTUAL_NODES_PER_SHARD: u32 = 128;

/// An immutable view of the ring, taken at a point in time.
///
/// The routing state is never modified in place: every membership change
/// builds a fresh snapshot and publishes it with an atomic pointer swap.
/// A holder of a snapshot therefore keeps reading a consistent, fully
/// sorted ring no matter what mutations happen concurrently.
#[derive(Debug)]
pub struct RingSnapshot {
    ring: HashRing<ShardId>,
    unique_shards: Vec<ShardId>,
}

impl RingSnapshot {
    fn new(entries: impl Iterator<Item = (RingPosition, ShardId)>) -> Self {
        let ring = HashRing::new(entries);
        let unique_shards: Vec<ShardId> = ring
            .iter()
            .map(|(_position, shard)| shard)
            .unique()
            .cloned()
            .collect();
        Self {
            ring,
            unique_shards,
        }
    }

    /// The ring of virtual nodes this snapshot routes against.
    pub fn ring(&self) -> &HashRing<ShardId> {
        &self.ring
    }

    /// Shards present in this snapshot, deduplicated, in ring order.
    pub fn shards(&self) -> &[ShardId] {
        &self.unique_shards
    }
}

/// Shard selection based on consistent hashing.
///
/// Keys and virtual node labels are hashed onto a 32-bit ring with the
/// configured [`PartitionerName`]; a key belongs to the shard owning the
/// first position at or after the key's hash. Lookups cost one hash plus a
/// binary search over all virtual nodes.
///
/// Lookups never lock. They read the current [`RingSnapshot`] through an
/// atomic pointer, so any number of threads can route keys while another
/// adds or removes shards; a lookup racing with a mutation uses either the
/// old or the new ring, never a partially updated one. Mutations serialize
/// on an internal mutex.
///
/// Registering the same shard twice duplicates its virtual nodes instead of
/// failing. The duplicate labels hash to the very same positions, so
/// lookup results are unaffected; it is not a way to weight a shard.
pub struct ConsistentHashPolicy {
    partitioner: PartitionerName,
    virtual_nodes_per_shard: u32,
    // Serializes membership changes. Lookups never touch it.
    membership_lock: Mutex<()>,
    state: ArcSwap<RingSnapshot>,
}

impl ConsistentHashPolicy {
    /// Creates a policy with the given shards, added in input order, each
    /// contributing `virtual_nodes_per_shard` positions.
    ///
    /// Duplicate identifiers are processed independently, and a zero
    /// virtual node count produces a policy that fails every lookup.
    /// For other settings use [`ConsistentHashPolicy::builder`].
    pub fn new(
        shard_ids: impl IntoIterator<Item = impl AsRef<str>>,
        virtual_nodes_per_shard: u32,
    ) -> Self {
        Self::builder()
            .shards(shard_ids)
            .virtual_nodes_per_shard(virtual_nodes_per_shard)
            .build()
    }

    /// Creates a builder with default settings: no shards,
    /// [`DEFAULT_VIRTUAL_NODES_PER_SHARD`] virtual nodes per shard and the
    /// default partitioner.
    pub fn builder() -> ConsistentHashPolicyBuilder {
        ConsistentHashPolicyBuilder::new()
    }

    /// Registers a shard: hashes its virtual node labels onto the ring and
    /// publishes the re-sorted ring as a new snapshot.
    ///
    /// Keys whose closest virtual node is now one of the new shard's
    /// positions move to it; every other key keeps its previous shard.
    /// Lookups proceed against the old snapshot until the new one is
    /// published.
    pub fn add_shard(&self, shard_id: &str) {
        let _membership_guard = self.membership_lock.lock().unwrap();

        let shard: ShardId = Arc::from(shard_id);
        let new_entries = (0..self.virtual_nodes_per_shard).map(|index| {
            let label = format!("{shard_id}-{index}");
            (self.partitioner.hash_one(label.as_bytes()), Arc::clone(&shard))
        });

        let snapshot = self.state.load();
        let next = RingSnapshot::new(snapshot.ring().iter().cloned().chain(new_entries));
        debug!(
            shard = shard_id,
            virtual_nodes = self.virtual_nodes_per_shard,
            ring_len = next.ring().len(),
            "added shard to ring"
        );
        self.state.store(Arc::new(next));
    }

    /// Deregisters a shard, deleting exactly the positions it owns, and
    /// publishes the result as a new snapshot. Returns whether the shard
    /// owned any position; removing an unknown shard is a no-op.
    ///
    /// Keys owned by the removed shard move to the next shard clockwise;
    /// every other key keeps its previous shard.
    pub fn remove_shard(&self, shard_id: &str) -> bool {
        let _membership_guard = self.membership_lock.lock().unwrap();

        let snapshot = self.state.load();
        if !snapshot.shards().iter().any(|shard| shard.as_ref() == shard_id) {
            return false;
        }

        let next = RingSnapshot::new(
            snapshot
                .ring()
                .iter()
                .filter(|(_position, shard)| shard.as_ref() != shard_id)
                .cloned(),
        );
        debug!(
            shard = shard_id,
            ring_len = next.ring().len(),
            "removed shard from ring"
        );
        self.state.store(Arc::new(next));
        true
    }

    /// Returns the current ring snapshot.
    ///
    /// The snapshot is immutable and cheap to obtain (an atomic load plus a
    /// reference count bump); it keeps describing the membership from the
    /// time of the call even if shards are added or removed afterwards.
    pub fn snapshot(&self) -> Arc<RingSnapshot> {
        self.state.load_full()
    }

    /// Shards currently registered, deduplicated, in ring order.
    pub fn shards(&self) -> Vec<ShardId> {
        self.state.load().shards().to_vec()
    }

    /// Whether the given shard currently owns any position on the ring.
    pub fn contains_shard(&self, shard_id: &str) -> bool {
        self.state
            .load()
            .shards()
            .iter()
            .any(|shard| shard.as_ref() == shard_id)
    }

    /// Total number of virtual nodes on the ring, summed over all
    /// registered shards.
    pub fn virtual_node_count(&self) -> usize {
        self.state.load().ring().len()
    }
}

impl ShardingPolicy for ConsistentHashPolicy {
    fn shard_for_key(&self, key: &str) -> Result<ShardId, ShardSelectionError> {
        let snapshot = self.state.load();
        let position = self.partitioner.hash_one(key.as_bytes());
        snapshot
            .ring()
            .get_elem_for_position(position)
            .cloned()
            .ok_or(ShardSelectionError::NoShardsAvailable)
    }

    fn name(&self) -> String {
        "ConsistentHashPolicy".to_owned()
    }
}

impl fmt::Debug for ConsistentHashPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.state.load();
        f.debug_struct("ConsistentHashPolicy")
            .field("partitioner", &self.partitioner)
            .field("virtual_nodes_per_shard", &self.virtual_nodes_per_shard)
            .field("shards", &snapshot.shards().len())
            .field("virtual_nodes", &snapshot.ring().len())
            .finish()
    }
}

/// Builder for [`ConsistentHashPolicy`], entered through
/// [`ConsistentHashPolicy::builder`].
pub struct ConsistentHashPolicyBuilder {
    partitioner: PartitionerName,
    virtual_nodes_per_shard: u32,
    initial_shards: Vec<String>,
}

impl ConsistentHashPolicyBuilder {
    fn new() -> Self {
        Self {
            partitioner: PartitionerName::default(),
            virtual_nodes_per_shard: DEFAULT_VIRTUAL_NODES_PER_SHARD,
            initial_shards: Vec::new(),
        }
    }

    /// Registers a shard to add when the policy is built.
    pub fn shard(mut self, shard_id: impl AsRef<str>) -> Self {
        self.initial_shards.push(shard_id.as_ref().to_owned());
        self
    }

    /// Registers multiple shards to add when the policy is built, in order.
    pub fn shards(mut self, shard_ids: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.initial_shards.extend(
            shard_ids
                .into_iter()
                .map(|shard_id| shard_id.as_ref().to_owned()),
        );
        self
    }

    /// Sets how many virtual nodes each shard contributes. Zero is accepted
    /// and makes every added shard own no positions.
    pub fn virtual_nodes_per_shard(mut self, virtual_nodes_per_shard: u32) -> Self {
        self.virtual_nodes_per_shard = virtual_nodes_per_shard;
        self
    }

    /// Sets the hash algorithm used for virtual node labels and keys.
    pub fn partitioner(mut self, partitioner: PartitionerName) -> Self {
        self.partitioner = partitioner;
        self
    }

    /// Builds the policy and adds the registered shards in order.
    pub fn build(self) -> ConsistentHashPolicy {
        let policy = ConsistentHashPolicy {
            partitioner: self.partitioner,
            virtual_nodes_per_shard: self.virtual_nodes_per_shard,
            membership_lock: Mutex::new(()),
            state: ArcSwap::from(Arc::new(RingSnapshot::new(iter::empty()))),
        };
        for shard_id in &self.initial_shards {
            policy.add_shard(shard_id);
        }
        policy
    }
}
