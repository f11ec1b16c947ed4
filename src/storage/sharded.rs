//! Sharded engine
//!
//! A fixed array of direct engines; a key always routes to the shard at
//! `fnv1a32(key) % partitions`, so every operation stays within one shard
//! and writers on different shards never contend.

use super::memory::InMemoryEngine;
use super::StorageEngine;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Partitioned engine; shard count is fixed at startup
pub struct ShardedEngine {
    partitions: Vec<InMemoryEngine>,
}

impl ShardedEngine {
    pub fn new(partitions: usize, start_size: usize) -> Self {
        assert!(partitions > 0, "sharded engine needs at least one partition");
        Self {
            partitions: (0..partitions)
                .map(|_| InMemoryEngine::with_capacity(start_size))
                .collect(),
        }
    }

    fn partition(&self, key: &str) -> &InMemoryEngine {
        let index = fnv1a32(key.as_bytes()) as usize % self.partitions.len();
        &self.partitions[index]
    }
}

impl StorageEngine for ShardedEngine {
    fn set(&self, key: &str, value: &str) {
        self.partition(key).set(key, value);
    }

    fn get(&self, key: &str) -> String {
        self.partition(key).get(key)
    }

    fn del(&self, key: &str) {
        self.partition(key).del(key);
    }
}

/// 32-bit FNV-1a
fn fnv1a32(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
