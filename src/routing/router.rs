use crate::config::ClusterConfig;
use crate::types::{ShardId, WorkerId};

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over the raw key bytes.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub shard: ShardId,
    pub worker: WorkerId,
}

#[derive(Debug, Clone, Copy)]
pub struct ShardRouter {
    num_shards: u32,
    num_workers: u32,
}

impl ShardRouter {
    pub fn new(cluster: ClusterConfig) -> Self {
        Self {
            num_shards: cluster.shard_count(),
            num_workers: cluster.worker_count(),
        }
    }

    pub fn num_shards(&self) -> u32 {
        self.num_shards
    }

    pub fn num_workers(&self) -> u32 {
        self.num_workers
    }

    pub fn shard_for(&self, key: &str) -> ShardId {
        ShardId(fnv1a_32(key.as_bytes()) % self.num_shards)
    }

    pub fn worker_for_shard(&self, shard: ShardId) -> WorkerId {
        WorkerId(shard.0 % self.num_workers)
    }

    pub fn route(&self, key: &str) -> Route {
        let shard = self.shard_for(key);
        Route {
            shard,
            worker: self.worker_for_shard(shard),
        }
    }

    /// Shards a given worker is responsible for under the modulo mapping.
    pub fn shards_of(&self, worker: WorkerId) -> Vec<ShardId> {
        (0..self.num_shards)
            .map(ShardId)
            .filter(|&shard| self.worker_for_shard(shard) == worker)
            .collect()
    }
}
