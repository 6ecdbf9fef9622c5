use crate::{
    coin::CoinType,
    fee::{estimate_fees, FeeEstimate},
    rpc::{call_typed, BlockchainInfo, MempoolInfo, NetworkInfo, PeerInfo, RpcClient, RpcError},
};

/// Everything one poll learns about a node. Built fresh on every tick.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
    pub subversion: String,
    pub best_block_hash: String,
    pub blocks: u64,
    pub headers: u64,
    pub size_on_disk: u64,
    pub mempool_size: u64,
    pub mempool_bytes: u64,
    /// One entry per connected peer, duplicates included.
    pub peer_subversions: Vec<String>,
    pub fee_estimates: Vec<FeeEstimate>,
}

/// Collects a [`NodeSnapshot`]. The five queries run concurrently and the
/// snapshot fails as a whole if any of them fails.
pub async fn collect_snapshot(
    coin: CoinType,
    client: &dyn RpcClient,
) -> Result<NodeSnapshot, RpcError> {
    let (blockchain, mempool, network, peers, fee_estimates) = futures::try_join!(
        call_typed::<BlockchainInfo>(client, "getblockchaininfo", vec![]),
        call_typed::<MempoolInfo>(client, "getmempoolinfo", vec![]),
        call_typed::<NetworkInfo>(client, "getnetworkinfo", vec![]),
        call_typed::<Vec<PeerInfo>>(client, "getpeerinfo", vec![]),
        estimate_fees(coin, client),
    )?;

    Ok(NodeSnapshot {
        subversion: network.subversion,
        best_block_hash: blockchain.bestblockhash,
        blocks: blockchain.blocks,
        headers: blockchain.headers,
        size_on_disk: blockchain.size_on_disk.unwrap_or_default(),
        mempool_size: mempool.size,
        mempool_bytes: mempool.bytes,
        peer_subversions: peers.into_iter().map(|peer| peer.subver).collect(),
        fee_estimates,
    })
}
