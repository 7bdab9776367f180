//! Control Manager Module
//!
//! The leader-elected front door of the store. It validates client
//! requests, routes each key to the worker owning its shard and turns the
//! worker's answer (or the lack of one) into a typed `ErrorEnvelope`.
//!
//! ## Submodules
//! - **`dispatcher`**: validation, routing and result classification.
//! - **`pool`**: remote-call handles to workers, established at startup.
//! - **`election`**: the leader election seam the server waits on.
//! - **`server`**: campaign, bind, serve until leadership is lost.
//! - **`protocol`** / **`handlers`**: the client-facing HTTP API.

pub mod dispatcher;
pub mod election;
pub mod handlers;
pub mod pool;
pub mod protocol;
pub mod server;

pub use dispatcher::Dispatcher;
pub use election::{LeaderElection, Leadership, LocalElection, StandaloneElection};
pub use pool::{WorkerClient, WorkerPool};

#[cfg(test)]
mod tests;
