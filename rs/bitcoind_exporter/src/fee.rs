use crate::{
    coin::{CoinType, FeeEstimation},
    rpc::{call_typed, RpcClient, RpcError, SmartFeeEstimate},
};
use futures::future::try_join_all;
use serde_json::json;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

/// Confirmation targets, in blocks, for which fees are estimated.
pub const FEE_TARGETS: [u8; 3] = [1, 2, 3];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "UPPERCASE")]
pub enum FeeMode {
    Conservative,
    Economical,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeeEstimate {
    pub target: u8,
    pub mode: FeeMode,
    /// Per kilobyte, in the coin's unit.
    pub feerate: f64,
}

/// Runs the `estimatesmartfee` grid against one node. All calls are issued
/// concurrently and any RPC failure fails the whole estimate; a missing or
/// non-numeric feerate only drops that entry.
pub async fn estimate_fees(
    coin: CoinType,
    client: &dyn RpcClient,
) -> Result<Vec<FeeEstimate>, RpcError> {
    let fee_estimation = coin.profile().fee_estimation;
    if fee_estimation == FeeEstimation::Unsupported {
        return Ok(vec![]);
    }

    let requests = FEE_TARGETS.iter().flat_map(|&target| {
        FeeMode::iter().map(move |mode| estimate_fee(client, fee_estimation, target, mode))
    });
    let estimates = try_join_all(requests).await?;

    Ok(estimates.into_iter().flatten().collect())
}

async fn estimate_fee(
    client: &dyn RpcClient,
    fee_estimation: FeeEstimation,
    target: u8,
    mode: FeeMode,
) -> Result<Option<FeeEstimate>, RpcError> {
    let params = match fee_estimation {
        FeeEstimation::TargetOnly => vec![json!(target)],
        _ => vec![json!(target), json!(mode.as_ref())],
    };
    let estimate: SmartFeeEstimate = call_typed(client, "estimatesmartfee", params).await?;

    Ok(estimate
        .feerate
        .and_then(|feerate| feerate.as_f64())
        .filter(|feerate| feerate.is_finite())
        .map(|feerate| FeeEstimate {
            target,
            mode,
            feerate,
        }))
}
