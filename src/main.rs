use clap::Parser;
use sharded_kv::client::KvClient;
use sharded_kv::config::{Cli, Command, ControlManagerArgs, WorkerArgs};
use sharded_kv::control::{Dispatcher, StandaloneElection, WorkerPool, server};
use sharded_kv::oracle::OracleClock;
use sharded_kv::routing::ShardRouter;
use sharded_kv::storage::{WorkerService, WorkerStore, handlers};
use sharded_kv::types::WorkerId;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Worker(args) => run_worker(args).await,
        Command::ControlManager(args) => run_control_manager(args).await,
        Command::Put(args) => {
            let ret = KvClient::new(&args.addr).put_key(&args.key, &args.value).await?;
            println!("{}", serde_json::to_string_pretty(&ret)?);
            Ok(())
        }
        Command::Get(args) => {
            let ret = KvClient::new(&args.addr).get_key(&args.key).await?;
            println!("{}", serde_json::to_string_pretty(&ret)?);
            Ok(())
        }
    }
}

async fn run_worker(args: WorkerArgs) -> anyhow::Result<()> {
    let router = ShardRouter::new(args.cluster()?);

    tracing::info!(
        "Starting worker with {} shards, data at {}, oracle checkpoints at {}",
        router.num_shards(),
        args.mount_path.display(),
        args.oracle_path.display()
    );

    // 1. Oracle clock, rehydrated from checkpoints:
    let clock = Arc::new(OracleClock::open(&args.oracle_path));

    // 2. Storage engine:
    let store = Arc::new(WorkerStore::new(&args.mount_path, router));

    // 3. HTTP Router:
    let app = handlers::router(WorkerService::new(clock, store));

    // 4. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(args.bind_addr()).await?;
    tracing::info!("Worker service listening at {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_control_manager(args: ControlManagerArgs) -> anyhow::Result<()> {
    let router = ShardRouter::new(args.cluster()?);
    let candidate_id = args.candidate_id();

    tracing::info!(
        "Control manager {} for {} shards over {} workers",
        candidate_id,
        router.num_shards(),
        router.num_workers()
    );
    for id in 0..router.num_workers() {
        let worker = WorkerId(id);
        let shards: Vec<String> = router
            .shards_of(worker)
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!("{} owns shards [{}]", worker, shards.join(", "));
    }

    // 1. Worker handles; failures are recorded, not fatal:
    let pool = WorkerPool::connect(router.num_workers(), |worker| args.worker_addr(worker));
    tracing::info!(
        "{} of {} worker clients initialized",
        pool.connected_count(),
        router.num_workers()
    );

    let dispatcher = Arc::new(Dispatcher::new(router, pool, args.rpc_timeout()));

    // 2. Leader gate, then serve:
    server::run(&StandaloneElection, &candidate_id, args.bind_addr(), dispatcher).await
}
