//! Interfaces between the index fund pallets.
//!
//! Each pallet depends on its collaborators only through these traits; the runtime wires
//! the concrete pallets together in their `Config` implementations.

use crate::{
  ecosystem::{AssetId, Balance, CategoryId, PoolId},
  fixed_point::Uq112x112,
  prices::{ObservationWindow, TwoWayAveragePrice},
};
use alloc::vec::Vec;
use polkadot_sdk::{
  sp_core::U256,
  sp_runtime::{DispatchError, DispatchResult},
};

/// External venue reporting accumulated prices of assets against the reference asset.
pub trait CumulativePriceSource {
  /// `(price_cumulative, reference_price_cumulative)` of `asset` as of the current block.
  fn current_cumulative_prices(asset: AssetId) -> Result<(U256, U256), DispatchError>;
}

/// External venue executing swaps on behalf of a pallet account.
pub trait SwapVenue<AccountId> {
  /// Amount of `asset_in` the venue currently asks for `amount_out` of `asset_out`.
  fn quote_exact_out(
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
  ) -> Result<Balance, DispatchError>;

  /// Swap at most `max_amount_in` of `asset_in` held by `who` for exactly `amount_out` of
  /// `asset_out`, delivered to `who`. Returns the amount of `asset_in` spent.
  fn swap_tokens_for_exact_tokens(
    who: &AccountId,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
    max_amount_in: Balance,
  ) -> Result<Balance, DispatchError>;
}

/// Time-weighted average prices.
pub trait PriceOracle {
  /// Stores a new sample for `asset`. Returns `Ok(false)` when the last sample is too
  /// recent to be replaced.
  fn try_update_price(asset: AssetId) -> Result<bool, DispatchError>;

  fn compute_two_way_average_price(
    asset: AssetId,
    window: ObservationWindow,
  ) -> Result<TwoWayAveragePrice, DispatchError>;

  fn compute_average_price(
    asset: AssetId,
    window: ObservationWindow,
  ) -> Result<Uq112x112, DispatchError> {
    Ok(Self::compute_two_way_average_price(asset, window)?.price_average)
  }

  /// Reference-asset value of `amount` units of `asset`.
  fn compute_average_reference_for_assets(
    asset: AssetId,
    amount: Balance,
    window: ObservationWindow,
  ) -> Result<Balance, DispatchError> {
    Ok(Self::compute_two_way_average_price(asset, window)?.reference_for_assets(amount)?)
  }

  /// Units of `asset` worth `value` reference units.
  fn compute_average_assets_for_reference(
    asset: AssetId,
    value: Balance,
    window: ObservationWindow,
  ) -> Result<Balance, DispatchError> {
    Ok(Self::compute_two_way_average_price(asset, window)?.assets_for_reference(value)?)
  }
}

/// Ranked asset categories.
pub trait CategoryRanking {
  fn has_category(category: CategoryId) -> bool;

  /// The `n` members with the largest market caps, largest first.
  fn top_assets(category: CategoryId, n: u32) -> Result<Vec<AssetId>, DispatchError>;

  /// Long-window average market cap of every asset, in input order.
  fn compute_average_market_caps(assets: &[AssetId]) -> Result<Vec<Balance>, DispatchError>;
}

/// Weighted pool operations reserved for a pool's controller, plus the queries the
/// controller and liquidator need.
pub trait IndexPoolApi<AccountId> {
  /// Creates an empty pool controlled by `controller`.
  fn create_pool(
    controller: &AccountId,
    name: Vec<u8>,
    symbol: Vec<u8>,
    swap_fee: Balance,
  ) -> Result<PoolId, DispatchError>;

  /// Binds the initial assets, pulling their balances from `provider`, and mints the
  /// initial pool shares to `provider`.
  fn initialize(
    controller: &AccountId,
    pool: PoolId,
    assets: &[AssetId],
    balances: &[Balance],
    weights: &[Balance],
    provider: &AccountId,
  ) -> DispatchResult;

  fn controller(pool: PoolId) -> Option<AccountId>;

  /// Account holding the pool's reserves.
  fn pool_account(pool: PoolId) -> AccountId;

  fn set_swap_fee(controller: &AccountId, pool: PoolId, swap_fee: Balance) -> DispatchResult;

  fn set_public_swap(controller: &AccountId, pool: PoolId, enabled: bool) -> DispatchResult;

  fn reweigh_tokens(
    controller: &AccountId,
    pool: PoolId,
    assets: &[AssetId],
    weights: &[Balance],
  ) -> DispatchResult;

  fn reindex_tokens(
    controller: &AccountId,
    pool: PoolId,
    assets: &[AssetId],
    weights: &[Balance],
    minimum_balances: &[Balance],
  ) -> DispatchResult;

  fn set_minimum_balance(
    controller: &AccountId,
    pool: PoolId,
    asset: AssetId,
    minimum_balance: Balance,
  ) -> DispatchResult;

  /// Bound assets, in pool order.
  fn current_tokens(pool: PoolId) -> Vec<AssetId>;

  /// Bound assets with a non-zero desired weight, in pool order.
  fn current_desired_tokens(pool: PoolId) -> Vec<AssetId>;

  fn desired_weight(pool: PoolId, asset: AssetId) -> Balance;

  fn is_bound(pool: PoolId, asset: AssetId) -> bool;

  fn is_ready(pool: PoolId, asset: AssetId) -> bool;

  /// Total pool value in units of one ready asset: `(asset, balance * total / weight)`.
  fn extrapolate_pool_value_from_token(pool: PoolId) -> Result<(AssetId, Balance), DispatchError>;

  /// Absorbs any balance of `asset` sent to the pool account outside of pool operations.
  fn gulp(pool: PoolId, asset: AssetId) -> DispatchResult;
}

/// Receiver of assets removed from a pool.
pub trait UnboundAssetHandler<AccountId> {
  /// Account the pool transfers unbound balances to.
  fn handler_account() -> AccountId;

  /// Called after `amount` of `asset` was transferred to [`Self::handler_account`].
  fn on_unbind(pool: PoolId, asset: AssetId, amount: Balance) -> DispatchResult;
}

/// Liquidator settings the controller manages.
pub trait LiquidatorApi<AccountId> {
  /// Sets the premium, in percent, offered on sales of `pool`'s unbound assets.
  fn set_premium_percent(controller: &AccountId, pool: PoolId, premium: u8) -> DispatchResult;
}
