use polkadot_sdk::frame_support::pallet_prelude::*;
use primitives::{AssetId, Balance, CategoryId, Moment};

/// Pool created by `prepare_index` and waiting for its seed balances
#[derive(
  Encode, Decode, CloneNoBound, PartialEqNoBound, EqNoBound, RuntimeDebugNoBound, TypeInfo,
  MaxEncodedLen,
)]
#[scale_info(skip_type_params(MaxAssets))]
#[codec(mel_bound(MaxAssets: Get<u32>))]
pub struct PreparedIndex<MaxAssets: Get<u32>> {
  pub category: CategoryId,
  pub assets: BoundedVec<AssetId, MaxAssets>,
  /// Initial weights, in the order of `assets`
  pub weights: BoundedVec<Balance, MaxAssets>,
  /// Seed balance the deployer provides per asset
  pub balances: BoundedVec<Balance, MaxAssets>,
}

/// Rebalancing state of a deployed index pool
#[derive(
  Encode, Decode, Clone, Copy, PartialEq, Eq, RuntimeDebug, TypeInfo, MaxEncodedLen,
)]
pub struct IndexRecord {
  pub category: CategoryId,
  pub index_size: u32,
  /// Rebalances so far; every `ReweighsBeforeReindex + 1`-th one is a reindex
  pub update_count: u32,
  pub last_update_at: Moment,
}

impl IndexRecord {
  /// Whether the next rebalance must be a reindex
  pub fn reindex_due(&self, reweighs_before_reindex: u32) -> bool {
    self.update_count.saturating_add(1) % reweighs_before_reindex.saturating_add(1) == 0
  }
}
