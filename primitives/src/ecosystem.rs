//! Ecosystem Constants for the index fund pallets
//!
//! This module centralizes the identifiers and economic parameters shared by the oracle,
//! category registry, weighted pool, rebalancing controller and unbound-asset liquidator.
//!
//! Runtimes and test mocks feed these values into each pallet's `Config`, so a single
//! change here moves every consumer together.

/// Balance type alias for consistency across ecosystem
pub type Balance = u128;

/// Identifier of a fungible asset (a `pallet-assets` id).
pub type AssetId = u32;

/// Identifier of a weighted pool. Allocated from a counter and never reused.
pub type PoolId = u32;

/// Identifier of an asset category. Allocated from a counter and never reused.
pub type CategoryId = u32;

/// Unix timestamp in seconds, as reported by the injected clock.
pub type Moment = u64;

/// Pallet identifiers for deriving pallet-owned accounts.
///
/// These IDs are used by Polkadot SDK's `PalletId::into_account_truncating()`
/// (and `into_sub_account_truncating(pool_id)` for per-pool accounts)
/// to deterministically generate accounts for pallet-specific operations.
pub mod pallet_ids {
  /// Weighted pool pallet ID; every pool holds its reserves in a sub-account of it
  pub const WEIGHTED_POOL_PALLET_ID: &[u8; 8] = b"idx/pool";

  /// Rebalancing controller pallet ID; its account is the controller of every index pool
  pub const INDEX_CONTROLLER_PALLET_ID: &[u8; 8] = b"idx/ctrl";

  /// Unbound asset liquidator pallet ID
  pub const UNBOUND_LIQUIDATOR_PALLET_ID: &[u8; 8] = b"idx/sell";
}

/// Ecosystem parameters defining mathematical constants and thresholds.
///
/// Weights, fees and ratios are fixed-point numbers scaled by [`params::BONE`].
pub mod params {
  use super::{Balance, Moment};

  /// Fixed-point one (10^18).
  ///
  /// All pool weights, fees and ratios are expressed in BONE units so that callers and the
  /// pool agree on scale without ambiguity.
  pub const BONE: Balance = 1_000_000_000_000_000_000;

  /// Smallest weight a ready asset may hold (0.25).
  pub const MIN_WEIGHT: Balance = BONE / 4;

  /// Largest weight a single asset may hold (25).
  pub const MAX_WEIGHT: Balance = BONE * 25;

  /// Ceiling on the sum of all weights in a pool (26).
  ///
  /// One unit above the rebalancing budget leaves room for assets being phased in while
  /// others are still being phased out.
  pub const MAX_TOTAL_WEIGHT: Balance = BONE * 26;

  /// Total weight budget distributed by the rebalancing controller (25).
  pub const WEIGHT_BUDGET: Balance = BONE * 25;

  /// Minimum seed balance of an asset at pool initialization.
  pub const MIN_BALANCE: Balance = BONE / 1_000_000_000_000;

  /// Pool shares minted to the initial liquidity provider (100).
  pub const INIT_POOL_SUPPLY: Balance = BONE * 100;

  /// Minimum number of assets in an initialized pool.
  pub const MIN_BOUND_TOKENS: u32 = 2;

  /// Maximum number of bound assets per pool. Twice the largest index, so a reindex can bind
  /// replacements while the assets it drops are still being phased out.
  pub const MAX_BOUND_TOKENS: u32 = 2 * MAX_INDEX_SIZE;

  /// Minimum swap fee (0.0001%).
  pub const MIN_FEE: Balance = BONE / 1_000_000;

  /// Maximum swap fee (10%).
  pub const MAX_FEE: Balance = BONE / 10;

  /// Swap fee applied to newly deployed index pools (2.5%).
  pub const DEFAULT_SWAP_FEE: Balance = BONE / 40;

  /// Exit fee charged in pool shares and paid to the controller (0.5%).
  pub const EXIT_FEE: Balance = BONE / 200;

  /// Maximum fraction of an input balance a single swap may add (1/2).
  pub const MAX_IN_RATIO: Balance = BONE / 2;

  /// Maximum fraction of an output balance a single swap may remove (1/3 + 1 wei).
  pub const MAX_OUT_RATIO: Balance = BONE / 3 + 1;

  /// Minimum time between two weight adjustments of the same asset (1 hour).
  pub const WEIGHT_UPDATE_DELAY: Moment = 60 * 60;

  /// Length of an oracle observation bucket (1 hour).
  pub const OBSERVATION_PERIOD: Moment = 60 * 60;

  /// Minimum time between two stored oracle samples of one asset (30 minutes).
  pub const MIN_UPDATE_PERIOD: Moment = 30 * 60;

  /// Short oracle window used for trading bounds: 20 minutes to 2 days.
  pub const SHORT_TWAP_MIN_AGE: Moment = 20 * 60;
  pub const SHORT_TWAP_MAX_AGE: Moment = 2 * 24 * 60 * 60;

  /// Long oracle window used for market caps: 3.5 days to 2 weeks.
  pub const LONG_TWAP_MIN_AGE: Moment = 84 * 60 * 60;
  pub const LONG_TWAP_MAX_AGE: Moment = 14 * 24 * 60 * 60;

  /// Maximum age of a category sort before its top assets can no longer be read (1 day).
  pub const MAX_SORT_DELAY: Moment = 24 * 60 * 60;

  /// Maximum number of assets in a category.
  pub const MAX_CATEGORY_TOKENS: u32 = 25;

  /// Minimum time between two rebalances of the same pool (1 week).
  pub const POOL_REBALANCE_DELAY: Moment = 7 * 24 * 60 * 60;

  /// Number of reweighs performed between two reindexes.
  pub const REWEIGHS_BEFORE_REINDEX: u32 = 3;

  /// Smallest and largest index size the controller deploys.
  pub const MIN_INDEX_SIZE: u32 = 2;
  pub const MAX_INDEX_SIZE: u32 = 10;

  /// A newly introduced asset must be seeded with 1/100 of the pool value.
  pub const MINIMUM_BALANCE_DIVISOR: Balance = 100;

  /// Premium paid on unbound asset sales, in percent.
  pub const DEFAULT_SELLER_PREMIUM: u8 = 2;

  /// Largest premium a controller may offer on unbound asset sales, in percent.
  pub const MAX_SELLER_PREMIUM: u8 = 19;
}
