use crate::{coin::CoinType, rpc::RpcError};
use thiserror::Error;

/// A failed poll of one node.
#[derive(Debug, Error)]
#[error("failed to poll node {node}")]
pub struct PollError {
    pub node: String,
    #[source]
    pub source: RpcError,
}

/// How the scheduler treats a [`PollError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The node is still loading its state. Carries the matched message.
    StartupTransient(&'static str),
    Fatal,
}

impl PollError {
    pub fn classify(&self, coin: CoinType) -> ErrorClass {
        classify(coin, &self.source)
    }
}

/// Matches the error message against the startup messages `coin` is known
/// to report while it is initializing.
pub fn classify(coin: CoinType, error: &RpcError) -> ErrorClass {
    let message = match error {
        RpcError::Rpc { message, .. } => message.clone(),
        other => other.to_string(),
    };
    coin.profile()
        .startup_transient_messages()
        .find(|startup_message| message.contains(startup_message))
        .map_or(ErrorClass::Fatal, ErrorClass::StartupTransient)
}
