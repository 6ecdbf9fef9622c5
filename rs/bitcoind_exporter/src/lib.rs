//! The bitcoind exporter polls one or more bitcoin-family daemons over
//! JSON-RPC and publishes their state as Prometheus gauges. Every tick a
//! [`collector::NodeSnapshot`] is collected per node and reconciled against
//! what was published for that node before.

/// Coin types and their per-coin RPC differences.
pub mod coin;
/// This module contains the command line of the exporter binary.
pub mod cli;
/// Node snapshot collection.
pub mod collector;
/// Deployment configuration: nodes, timing and logging.
pub mod config;
pub mod error;
/// Fee estimation through `estimatesmartfee`.
pub mod fee;
/// The `/metrics` endpoint.
pub mod http;
pub mod logger;
/// This module contains the metrics registry and the published metric
/// catalog.
pub mod metrics;
pub mod reconciler;
pub mod rpc;
pub mod scheduler;

pub use config::Config;
pub use scheduler::{NodePoller, PollScheduler};
