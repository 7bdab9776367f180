//! Control Manager Tests
//!
//! Runs real workers and a control manager on loopback listeners and drives
//! them through `KvClient`.
//!
//! ## Test Scopes
//! - **Validation**: invalid arguments never reach a worker.
//! - **Dispatch**: routing to the owning worker, result classification,
//!   missing handles, unreachable and slow workers.
//! - **Election**: the leader gate and shutdown on lost leadership.

#[cfg(test)]
mod tests {
    use crate::client::KvClient;
    use crate::config::ClusterConfig;
    use crate::control::protocol::{ENDPOINT_GET_KEY, ENDPOINT_PUT_KEY, GetKeyRet, PutKeyRet};
    use crate::control::{
        Dispatcher, LeaderElection, LocalElection, StandaloneElection, WorkerPool, server,
    };
    use crate::error::{ErrorEnvelope, ErrorKind};
    use crate::oracle::OracleClock;
    use crate::routing::ShardRouter;
    use crate::storage::protocol::ENDPOINT_GET_KEY_INTERNAL;
    use crate::storage::{WorkerService, WorkerStore, handlers};
    use crate::types::{ShardId, StoredRecord, WorkerId};

    use axum::Router;
    use axum::routing::post;
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    const NUM_SHARDS: u32 = 9;
    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    async fn spawn_router(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn spawn_worker(root: &Path) -> SocketAddr {
        let store = WorkerStore::new(
            root.join("data"),
            ShardRouter::new(ClusterConfig::shards_only(NUM_SHARDS).unwrap()),
        );
        let clock = OracleClock::open(root.join("oracle"));
        spawn_router(handlers::router(WorkerService::new(
            Arc::new(clock),
            Arc::new(store),
        )))
        .await
    }

    fn dispatcher(addrs: Vec<Option<String>>, timeout: Duration) -> Arc<Dispatcher> {
        let workers = addrs.len() as u32;
        let router = ShardRouter::new(ClusterConfig::new(NUM_SHARDS, workers).unwrap());
        let pool = WorkerPool::connect(workers, |worker| addrs[worker.0 as usize].clone());
        Arc::new(Dispatcher::new(router, pool, timeout))
    }

    async fn spawn_control_addr(dispatcher: Arc<Dispatcher>) -> SocketAddr {
        let leadership = StandaloneElection.campaign("cm-test").await.unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server::serve(listener, dispatcher, leadership));
        addr
    }

    async fn spawn_control(dispatcher: Arc<Dispatcher>) -> KvClient {
        KvClient::new(&spawn_control_addr(dispatcher).await.to_string())
    }

    struct Cluster {
        _dir: TempDir,
        worker_roots: Vec<PathBuf>,
        client: KvClient,
    }

    async fn start_cluster(workers: u32) -> Cluster {
        let dir = tempfile::tempdir().unwrap();
        let mut worker_roots = Vec::new();
        let mut addrs = Vec::new();

        for id in 0..workers {
            let root = dir.path().join(format!("worker-{}", id));
            addrs.push(Some(spawn_worker(&root).await.to_string()));
            worker_roots.push(root);
        }

        let client = spawn_control(dispatcher(addrs, TEST_TIMEOUT)).await;
        Cluster {
            _dir: dir,
            worker_roots,
            client,
        }
    }

    fn read_record(path: PathBuf) -> StoredRecord {
        serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
    }

    /// Address that refuses connections.
    async fn closed_addr() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    // ============================================================
    // VALIDATION
    // ============================================================

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_dispatch() {
        // No worker handles at all: anything reaching dispatch would be an internal error.
        let dispatcher = dispatcher(vec![None, None, None], TEST_TIMEOUT);

        for (key, value) in [("", "v"), ("k", "")] {
            let ret = dispatcher.handle_put(key, value).await;
            assert!(!ret.success);
            assert_eq!(ret.error.kind, ErrorKind::InvalidArgument);
        }

        let ret = dispatcher.handle_get("").await;
        assert!(!ret.success);
        assert_eq!(ret.error.kind, ErrorKind::InvalidArgument);
        assert!(ret.value.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_arguments_over_http() {
        let cluster = start_cluster(3).await;

        let ret = cluster.client.put_key("", "v").await.unwrap();
        assert_eq!(ret.error.kind, ErrorKind::InvalidArgument);

        let ret = cluster.client.get_key("").await.unwrap();
        assert_eq!(ret.error.kind, ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_missing_fields_are_invalid_arguments() {
        let addr = spawn_control_addr(dispatcher(vec![None], TEST_TIMEOUT)).await;
        let http = reqwest::Client::new();

        let response = http
            .post(format!("http://{}{}", addr, ENDPOINT_PUT_KEY))
            .json(&serde_json::json!({ "key": "k" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let ret: PutKeyRet = response.json().await.unwrap();
        assert!(!ret.success);
        assert_eq!(ret.error.kind, ErrorKind::InvalidArgument);

        let response = http
            .post(format!("http://{}{}", addr, ENDPOINT_GET_KEY))
            .json(&serde_json::json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let ret: GetKeyRet = response.json().await.unwrap();
        assert!(!ret.success);
        assert_eq!(ret.error.kind, ErrorKind::InvalidArgument);
    }

    // ============================================================
    // DISPATCH
    // ============================================================

    #[tokio::test]
    async fn test_put_then_get_test_key() {
        let cluster = start_cluster(3).await;

        let put = cluster.client.put_key("test_key", "test_value").await.unwrap();
        assert_eq!(put, PutKeyRet::ok());

        let get = cluster.client.get_key("test_key").await.unwrap();
        assert_eq!(
            get,
            GetKeyRet {
                value: "test_value".to_string(),
                success: true,
                error: ErrorEnvelope::ok(),
            }
        );

        // test_key -> shard 5 -> worker 2.
        let record = read_record(cluster.worker_roots[2].join("data/5/test_key"));
        assert_eq!(record.value, "test_value");
        assert!(!cluster.worker_roots[0].join("data/5").exists());
        assert!(!cluster.worker_roots[1].join("data/5").exists());
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let cluster = start_cluster(3).await;

        let ret = cluster.client.get_key("missing_key").await.unwrap();
        assert!(!ret.success);
        assert_eq!(ret.error.kind, ErrorKind::NotFound);
        assert!(!ret.error.details.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_and_repeated_get() {
        let cluster = start_cluster(3).await;

        cluster.client.put_key("a", "1").await.unwrap();
        cluster.client.put_key("a", "2").await.unwrap();

        let first = cluster.client.get_key("a").await.unwrap();
        assert_eq!(first.value, "2");
        for _ in 0..5 {
            assert_eq!(cluster.client.get_key("a").await.unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_one_shard_get_distinct_timestamps() {
        let cluster = start_cluster(3).await;
        let router = ShardRouter::new(ClusterConfig::new(NUM_SHARDS, 3).unwrap());

        let keys: Vec<String> = (0..)
            .map(|i| format!("key_{}", i))
            .filter(|key| router.shard_for(key) == ShardId(5))
            .take(20)
            .collect();

        let mut tasks = Vec::new();
        for key in keys.clone() {
            let client = cluster.client.clone();
            tasks.push(tokio::spawn(async move {
                client.put_key(&key, "v").await.unwrap()
            }));
        }
        for task in tasks {
            assert!(task.await.unwrap().success);
        }

        let shard_dir = cluster.worker_roots[2].join("data/5");
        let stamps: Vec<i64> = keys
            .iter()
            .map(|key| read_record(shard_dir.join(key)).db_modified_ts)
            .collect();
        let unique: HashSet<i64> = stamps.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());

        let checkpoint =
            std::fs::read_to_string(cluster.worker_roots[2].join("oracle/5")).unwrap();
        assert_eq!(checkpoint, stamps.iter().max().unwrap().to_string());
    }

    #[tokio::test]
    async fn test_missing_worker_handle_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let worker0 = spawn_worker(&dir.path().join("w0")).await.to_string();
        let worker2 = spawn_worker(&dir.path().join("w2")).await.to_string();

        let dispatcher = dispatcher(vec![Some(worker0), None, Some(worker2)], TEST_TIMEOUT);
        assert_eq!(dispatcher.router().route("a").worker, WorkerId(1));

        let put = dispatcher.handle_put("a", "v").await;
        assert!(!put.success);
        assert_eq!(put.error.kind, ErrorKind::InternalError);

        let get = dispatcher.handle_get("a").await;
        assert!(!get.success);
        assert_eq!(get.error.kind, ErrorKind::InternalError);

        // Other workers are unaffected.
        assert!(dispatcher.handle_put("foo", "bar").await.success);
        assert_eq!(dispatcher.handle_get("foo").await.value, "bar");
    }

    #[tokio::test]
    async fn test_invalid_worker_address_leaves_no_handle() {
        let pool = WorkerPool::connect(2, |worker| match worker.0 {
            0 => Some("127.0.0.1:50051".to_string()),
            _ => Some("bad host:1".to_string()),
        });

        assert_eq!(pool.connected_count(), 1);
        assert!(pool.client(WorkerId(0)).is_some());
        assert!(pool.client(WorkerId(1)).is_none());
        assert!(pool.client(WorkerId(7)).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_worker_is_internal_error() {
        let addr = closed_addr().await;
        let dispatcher = dispatcher(vec![Some(addr)], TEST_TIMEOUT);

        let ret = dispatcher.handle_put("foo", "bar").await;
        assert!(!ret.success);
        assert_eq!(ret.error.kind, ErrorKind::InternalError);
        assert_eq!(ret.error.details, "worker-0 unavailable");

        let ret = dispatcher.handle_get("foo").await;
        assert_eq!(ret.error.kind, ErrorKind::InternalError);
    }

    #[tokio::test]
    async fn test_slow_worker_times_out() {
        let slow = Router::new().route(
            ENDPOINT_GET_KEY_INTERNAL,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                "{}"
            }),
        );
        let addr = spawn_router(slow).await.to_string();
        let dispatcher = dispatcher(vec![Some(addr)], Duration::from_millis(200));

        let started = std::time::Instant::now();
        let ret = dispatcher.handle_get("foo").await;

        assert_eq!(ret.error.kind, ErrorKind::InternalError);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_checkpoint_failure_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("w0");
        std::fs::create_dir_all(&root).unwrap();
        // The oracle directory is a file, so checkpoints fail.
        std::fs::write(root.join("oracle"), b"x").unwrap();

        let addr = spawn_worker(&root).await.to_string();
        let dispatcher = dispatcher(vec![Some(addr)], TEST_TIMEOUT);

        let put = dispatcher.handle_put("foo", "bar").await;
        assert!(!put.success);
        assert_eq!(put.error.kind, ErrorKind::BackendError);
        assert!(put.error.details.contains("oracle timestamp"));

        // The value write was skipped.
        assert_eq!(
            dispatcher.handle_get("foo").await.error.kind,
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_corrupt_record_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("w0");
        let addr = spawn_worker(&root).await.to_string();
        let dispatcher = dispatcher(vec![Some(addr)], TEST_TIMEOUT);

        assert!(dispatcher.handle_put("foo", "bar").await.success);
        std::fs::write(root.join("data/6/foo"), b"{\"val").unwrap();

        let get = dispatcher.handle_get("foo").await;
        assert!(!get.success);
        assert_eq!(get.error.kind, ErrorKind::BackendError);
    }

    #[tokio::test]
    async fn test_unclassified_worker_failure_maps_to_not_found() {
        let legacy = Router::new().route(
            ENDPOINT_GET_KEY_INTERNAL,
            post(|| async {
                axum::Json(serde_json::json!({
                    "success": false,
                    "error_details": "no such file",
                }))
            }),
        );
        let addr = spawn_router(legacy).await.to_string();
        let dispatcher = dispatcher(vec![Some(addr)], TEST_TIMEOUT);

        let ret = dispatcher.handle_get("foo").await;
        assert_eq!(
            ret.error,
            ErrorEnvelope::new(ErrorKind::NotFound, "no such file")
        );
    }

    #[tokio::test]
    async fn test_get_unstorable_key_is_not_found() {
        let cluster = start_cluster(3).await;

        let ret = cluster.client.get_key("a/b").await.unwrap();
        assert!(!ret.success);
        assert_eq!(ret.error.kind, ErrorKind::NotFound);
        assert!(ret.value.is_empty());
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let cluster = start_cluster(1).await;
        let health = cluster.client.health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.role, "control-manager");
    }

    // ============================================================
    // ELECTION
    // ============================================================

    #[tokio::test]
    async fn test_second_candidate_waits_for_leader() {
        let election = LocalElection::new();

        let first = election.campaign("cm-0").await.unwrap();
        assert_eq!(first.epoch(), 1);

        let waiting = {
            let election = election.clone();
            tokio::spawn(async move { election.campaign("cm-1").await.unwrap() })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiting.is_finished());

        drop(first);
        let second = tokio::time::timeout(TEST_TIMEOUT, waiting)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.candidate_id(), "cm-1");
        assert_eq!(second.epoch(), 2);
    }

    #[tokio::test]
    async fn test_standalone_leadership_is_never_revoked() {
        let mut leadership = StandaloneElection.campaign("solo").await.unwrap();
        assert!(!leadership.is_revoked());
        assert!(
            tokio::time::timeout(Duration::from_millis(50), leadership.revoked())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_server_stops_when_leadership_revoked() {
        let election = LocalElection::new();
        let leadership = election.campaign("cm-0").await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(server::serve(
            listener,
            dispatcher(vec![None], TEST_TIMEOUT),
            leadership,
        ));

        let client = KvClient::new(&addr.to_string());
        assert!(client.health().await.is_ok());

        assert!(election.revoke());
        tokio::time::timeout(TEST_TIMEOUT, server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        // The seat is free again.
        let next = tokio::time::timeout(TEST_TIMEOUT, election.campaign("cm-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.epoch(), 2);
    }
}
