//! Control manager lifecycle: win the election, then serve until leadership is lost.

use super::dispatcher::Dispatcher;
use super::election::{LeaderElection, Leadership};
use super::handlers;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Campaigns as `candidate_id` and only binds `bind_addr` once elected.
pub async fn run<E: LeaderElection>(
    election: &E,
    candidate_id: &str,
    bind_addr: SocketAddr,
    dispatcher: Arc<Dispatcher>,
) -> Result<()> {
    tracing::info!("Elect a leader or wait for leader resign.");
    let leadership = election.campaign(candidate_id).await?;

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Control manager listening on {}", listener.local_addr()?);

    serve(listener, dispatcher, leadership).await
}

/// Serves client requests until leadership is revoked. In-flight requests
/// are allowed to finish; no new connections are accepted afterwards.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    mut leadership: Leadership,
) -> Result<()> {
    let epoch = leadership.epoch();
    axum::serve(listener, handlers::router(dispatcher))
        .with_graceful_shutdown(async move {
            leadership.revoked().await;
            tracing::warn!(
                "Leadership of {} (epoch {}) lost, no longer accepting requests",
                leadership.candidate_id(),
                leadership.epoch()
            );
        })
        .await?;

    tracing::info!("Control manager for epoch {} stopped", epoch);
    Ok(())
}
