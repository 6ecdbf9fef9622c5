use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Startup messages reported by every bitcoin-family daemon while it is
/// still loading its state.
const COMMON_STARTUP_MESSAGES: &[&str] = &[
    "Loading block index",
    "Rewinding blocks",
    "Verifying blocks",
    "Loading P2P addresses",
];

const DASH_STARTUP_MESSAGES: &[&str] = &[
    "Loading masternode cache",
    "Loading masternode payment cache",
    "Loading governance cache",
    "Masternode cache is empty, skipping payments and governance cache",
    "Loading fulfilled requests cache",
    "Loading addresses",
];

const ZCASH_STARTUP_MESSAGES: &[&str] = &["Loading addresses"];

const DOGECOIN_STARTUP_MESSAGES: &[&str] = &["Activating best chain"];

/// The flavour of bitcoin-like daemon behind a configured node.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[value(rename_all = "lower")]
pub enum CoinType {
    Bitcoin,
    BitcoinCash,
    BitcoinGold,
    BitcoinSv,
    Dash,
    Decred,
    DigiByte,
    Dogecoin,
    Litecoin,
    Qtum,
    Vertcoin,
    Zcash,
}

/// How a coin's `estimatesmartfee` RPC has to be called, if at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeeEstimation {
    /// The daemon has no working `estimatesmartfee`.
    Unsupported,
    /// `estimatesmartfee <target>`.
    TargetOnly,
    /// `estimatesmartfee <target> <mode>`.
    TargetAndMode,
}

/// Per-coin quirks. Adding a coin type only requires a new row in
/// [`CoinType::profile`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinProfile {
    pub fee_estimation: FeeEstimation,
    /// Messages, beyond the common ones, that the daemon reports while it
    /// is still starting up.
    pub startup_messages: &'static [&'static str],
}

impl CoinProfile {
    const fn new(
        fee_estimation: FeeEstimation,
        startup_messages: &'static [&'static str],
    ) -> Self {
        Self {
            fee_estimation,
            startup_messages,
        }
    }

    /// All messages which indicate that the node is still initializing, the
    /// common ones first.
    pub fn startup_transient_messages(&self) -> impl Iterator<Item = &'static str> {
        let coin_specific: &'static [&'static str] = self.startup_messages;
        COMMON_STARTUP_MESSAGES
            .iter()
            .chain(coin_specific.iter())
            .copied()
    }
}

const DEFAULT_PROFILE: CoinProfile = CoinProfile::new(FeeEstimation::TargetAndMode, &[]);
const NO_FEE_PROFILE: CoinProfile = CoinProfile::new(FeeEstimation::Unsupported, &[]);
const DASH_PROFILE: CoinProfile =
    CoinProfile::new(FeeEstimation::TargetOnly, DASH_STARTUP_MESSAGES);
const DOGECOIN_PROFILE: CoinProfile =
    CoinProfile::new(FeeEstimation::Unsupported, DOGECOIN_STARTUP_MESSAGES);
const ZCASH_PROFILE: CoinProfile =
    CoinProfile::new(FeeEstimation::Unsupported, ZCASH_STARTUP_MESSAGES);

impl CoinType {
    pub fn profile(self) -> &'static CoinProfile {
        match self {
            CoinType::Bitcoin
            | CoinType::BitcoinGold
            | CoinType::Decred
            | CoinType::DigiByte
            | CoinType::Litecoin
            | CoinType::Qtum
            | CoinType::Vertcoin => &DEFAULT_PROFILE,
            CoinType::BitcoinCash | CoinType::BitcoinSv => &NO_FEE_PROFILE,
            CoinType::Dash => &DASH_PROFILE,
            CoinType::Dogecoin => &DOGECOIN_PROFILE,
            CoinType::Zcash => &ZCASH_PROFILE,
        }
    }
}
