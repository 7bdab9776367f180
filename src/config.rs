//! Runtime configuration
//!
//! Command line flags with environment fallbacks, matching the variables a
//! stateful-set deployment injects (`MOUNT_PATH`, `PERSIST_ORACLE`,
//! `POD_NAMESPACE`, `POD_NAME`).

use crate::error::ConfigError;
use crate::types::WorkerId;
use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WORKER_PORT: u16 = 50051;
pub const DEFAULT_CONTROL_MANAGER_PORT: u16 = 50052;
pub const DEFAULT_NUM_SHARDS: u32 = 9;
pub const DEFAULT_NUM_WORKERS: u32 = 3;
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// The two cluster-wide placement constants. Fixed at deployment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    shard_count: u32,
    worker_count: u32,
}

impl ClusterConfig {
    pub fn new(shard_count: u32, worker_count: u32) -> Result<Self, ConfigError> {
        if shard_count == 0 {
            return Err(ConfigError::ZeroShards);
        }
        if worker_count == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(Self {
            shard_count,
            worker_count,
        })
    }

    /// Workers only need the shard count to place keys on disk.
    pub fn shards_only(shard_count: u32) -> Result<Self, ConfigError> {
        Self::new(shard_count, 1)
    }

    pub fn shard_count(&self) -> u32 {
        self.shard_count
    }

    pub fn worker_count(&self) -> u32 {
        self.worker_count
    }
}

#[derive(Parser, Debug)]
#[command(name = "sharded-kv", about = "Sharded key-value store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a storage worker.
    Worker(WorkerArgs),
    /// Run the control manager (blocks on leader election before serving).
    ControlManager(ControlManagerArgs),
    /// Write a key through a control manager.
    Put(PutArgs),
    /// Read a key through a control manager.
    Get(GetArgs),
}

#[derive(Args, Debug, Clone)]
pub struct WorkerArgs {
    #[arg(long, env = "KV_WORKER_PORT", default_value_t = DEFAULT_WORKER_PORT)]
    pub port: u16,

    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind_ip: IpAddr,

    #[arg(long, env = "KV_NUM_SHARDS", default_value_t = DEFAULT_NUM_SHARDS)]
    pub shards: u32,

    /// Root directory holding one sub-directory per shard.
    #[arg(long, env = "MOUNT_PATH")]
    pub mount_path: PathBuf,

    /// Directory holding one oracle checkpoint file per shard.
    #[arg(long, env = "PERSIST_ORACLE")]
    pub oracle_path: PathBuf,
}

impl WorkerArgs {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    pub fn cluster(&self) -> Result<ClusterConfig, ConfigError> {
        ClusterConfig::shards_only(self.shards)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ControlManagerArgs {
    #[arg(long, env = "KV_CONTROL_MANAGER_PORT", default_value_t = DEFAULT_CONTROL_MANAGER_PORT)]
    pub port: u16,

    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind_ip: IpAddr,

    #[arg(long, env = "KV_NUM_SHARDS", default_value_t = DEFAULT_NUM_SHARDS)]
    pub shards: u32,

    #[arg(long, env = "KV_NUM_WORKERS", default_value_t = DEFAULT_NUM_WORKERS)]
    pub workers: u32,

    /// Explicit worker addresses; the n-th entry is worker n.
    #[arg(long = "worker-addr")]
    pub worker_addrs: Vec<String>,

    /// Address template used when no explicit list is given. `{id}`,
    /// `{namespace}` and `{port}` are substituted.
    #[arg(
        long,
        default_value = "worker-{id}.worker.{namespace}.svc.cluster.local:{port}"
    )]
    pub worker_addr_template: String,

    /// Port the workers listen on, substituted for `{port}`.
    #[arg(long, env = "KV_WORKER_PORT", default_value_t = DEFAULT_WORKER_PORT)]
    pub worker_port: u16,

    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    pub pod_namespace: String,

    /// Identity used when campaigning for leadership.
    #[arg(long, env = "POD_NAME")]
    pub candidate_id: Option<String>,

    #[arg(long, default_value_t = DEFAULT_RPC_TIMEOUT.as_secs())]
    pub rpc_timeout_secs: u64,
}

impl ControlManagerArgs {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    pub fn cluster(&self) -> Result<ClusterConfig, ConfigError> {
        ClusterConfig::new(self.shards, self.workers)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }

    pub fn candidate_id(&self) -> String {
        self.candidate_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
    }

    /// Network address for a worker, or `None` when it cannot be resolved.
    pub fn worker_addr(&self, worker: WorkerId) -> Option<String> {
        if !self.worker_addrs.is_empty() {
            return self.worker_addrs.get(worker.0 as usize).cloned();
        }
        Some(
            self.worker_addr_template
                .replace("{id}", &worker.0.to_string())
                .replace("{namespace}", &self.pod_namespace)
                .replace("{port}", &self.worker_port.to_string()),
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct PutArgs {
    #[arg(long, default_value = "127.0.0.1:50052")]
    pub addr: String,
    pub key: String,
    pub value: String,
}

#[derive(Args, Debug, Clone)]
pub struct GetArgs {
    #[arg(long, default_value = "127.0.0.1:50052")]
    pub addr: String,
    pub key: String,
}
