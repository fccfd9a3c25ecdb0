//! Index Controller Pallet
//!
//! Deploys weighted pools that track the largest assets of a category and keeps them
//! rebalanced.
//!
//! The pallet account is the controller of every pool it deploys. Target weights are the
//! square roots of the assets' average market caps, normalized to `WeightBudget`:
//!
//! `w_i = sqrt(m_i) / Σ sqrt(m_j) × WeightBudget`
//!
//! Rebalancing runs at most once per `RebalanceDelay` per pool and alternates between two
//! actions. A reweigh refreshes the weights of the assets the pool currently wants; every
//! `ReweighsBeforeReindex + 1`-th rebalance is a reindex instead, which replaces the asset set
//! with the category's current top assets. Assets new to the pool are bound with a minimum
//! balance worth `1 / MinimumBalanceDivisor` of the pool, and assets that fell out of the top
//! are phased out by the pool and handed to the liquidator.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod types;
pub mod weights;
pub use types::*;
pub use weights::WeightInfo;

use alloc::vec::Vec;
use frame::deps::{
  frame_support::{PalletId, traits::UnixTime},
  sp_runtime::{ArithmeticError, traits::AccountIdConversion},
};
use frame::prelude::*;
use polkadot_sdk::sp_core::U256;
use primitives::{
  AssetId, Balance, CategoryId, Moment, ObservationWindow, PoolId, Uq112x112, fixed_point,
  params,
  traits::{CategoryRanking, IndexPoolApi, LiquidatorApi, PriceOracle},
  weighted_math::{bdiv, bmul},
};

const LOG_TARGET: &str = "runtime::index-controller";

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Sorted category of `n` priced assets
  fn create_category(n: u32) -> Result<CategoryId, DispatchError>;
  fn fund_account(who: &AccountId, asset: AssetId, amount: Balance) -> DispatchResult;
}

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Clock used to pace rebalances
    type UnixTime: UnixTime;

    /// Pallet ID the controller account is derived from
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Origin allowed to deploy indexes and tune their pools
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    /// Ranked categories the indexes track
    type Categories: CategoryRanking;

    /// Prices for seed and minimum balances
    type PriceOracle: PriceOracle;

    /// Pools the indexes are deployed as
    type Pools: IndexPoolApi<Self::AccountId>;

    /// Liquidator of the assets the pools phase out
    type Liquidator: LiquidatorApi<Self::AccountId>;

    /// Oracle window seed and minimum balances are priced with
    #[pallet::constant]
    type PriceWindow: Get<ObservationWindow>;

    /// Sum of the target weights of an index
    #[pallet::constant]
    type WeightBudget: Get<Balance>;

    #[pallet::constant]
    type MinIndexSize: Get<u32>;

    #[pallet::constant]
    type MaxIndexSize: Get<u32>;

    /// Minimum time between two rebalances of a pool
    #[pallet::constant]
    type RebalanceDelay: Get<Moment>;

    #[pallet::constant]
    type ReweighsBeforeReindex: Get<u32>;

    /// Share of the pool value a new asset's minimum balance is worth, as a divisor
    #[pallet::constant]
    type MinimumBalanceDivisor: Get<Balance>;

    /// Swap fee of newly prepared pools
    #[pallet::constant]
    type DefaultSwapFee: Get<Balance>;

    /// Liquidator premium of newly deployed pools until the admin sets another one
    #[pallet::constant]
    type DefaultPremium: Get<u8>;

    /// Weight information
    type WeightInfo: WeightInfo;

    /// Helper for benchmarking
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper<Self::AccountId>;
  }

  #[pallet::pallet]
  #[pallet::storage_version(STORAGE_VERSION)]
  pub struct Pallet<T>(_);

  /// The current storage version.
  const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

  #[pallet::storage]
  pub type PreparedIndexes<T: Config> =
    StorageMap<_, Twox64Concat, PoolId, PreparedIndex<T::MaxIndexSize>, OptionQuery>;

  #[pallet::storage]
  pub type Indexes<T: Config> = StorageMap<_, Twox64Concat, PoolId, IndexRecord, OptionQuery>;

  /// Premium set through `set_default_premium`
  #[pallet::storage]
  pub type DefaultPremiumOverride<T: Config> = StorageValue<_, u8, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// Pool created for a category; waiting for `deploy_index`
    IndexPrepared {
      pool: PoolId,
      category: CategoryId,
      index_size: u32,
    },
    IndexDeployed {
      pool: PoolId,
      provider: T::AccountId,
    },
    PoolReweighed {
      pool: PoolId,
      update_count: u32,
    },
    PoolReindexed {
      pool: PoolId,
      update_count: u32,
    },
    DefaultPremiumSet {
      premium: u8,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    CategoryNotFound,
    /// Index size outside `[MinIndexSize, MaxIndexSize]`
    InvalidIndexSize,
    /// No prepared index for the pool
    NotPrepared,
    /// The pool is not an index deployed by this pallet
    IndexNotFound,
    /// The pool is not controlled by this pallet
    NotManaged,
    /// The last rebalance is younger than `RebalanceDelay`
    RebalanceTooSoon,
    /// The next rebalance of the pool must be a reindex
    ReindexRequired,
    /// The next rebalance of the pool must be a reweigh
    ReweighRequired,
    /// Premium outside `1..=MAX_SELLER_PREMIUM`
    InvalidPremium,
    /// The asset is not bound to the pool
    NotBound,
    /// The asset already reached its minimum balance
    AlreadyReady,
    /// A market cap rounds to a zero weight
    ZeroWeight,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create a pool for the `index_size` largest assets of `category`
    ///
    /// The pool stays uninitialized until someone provides `seed_value` reference units worth
    /// of its assets with [`Pallet::deploy_index`].
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::prepare_index(*index_size))]
    pub fn prepare_index(
      origin: OriginFor<T>,
      category: CategoryId,
      index_size: u32,
      seed_value: Balance,
      name: Vec<u8>,
      symbol: Vec<u8>,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::do_prepare_index(category, index_size, seed_value, name, symbol)?;
      Ok(())
    }

    /// Provide the seed balances of a prepared index and receive its initial shares
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::deploy_index(T::MaxIndexSize::get()))]
    pub fn deploy_index(origin: OriginFor<T>, pool: PoolId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_deploy_index(&who, pool)
    }

    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::reweigh_pool(T::MaxIndexSize::get()))]
    pub fn reweigh_pool(origin: OriginFor<T>, pool: PoolId) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_reweigh_pool(pool)
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::reindex_pool(T::MaxIndexSize::get()))]
    pub fn reindex_pool(origin: OriginFor<T>, pool: PoolId) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_reindex_pool(pool)
    }

    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::set_swap_fee())]
    pub fn set_swap_fee(origin: OriginFor<T>, pool: PoolId, swap_fee: Balance) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::ensure_managed(pool)?;
      T::Pools::set_swap_fee(&Self::account_id(), pool, swap_fee)
    }

    /// Premium given to pools deployed from now on
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::set_default_premium())]
    pub fn set_default_premium(origin: OriginFor<T>, premium: u8) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::ensure_premium(premium)?;
      DefaultPremiumOverride::<T>::put(premium);
      Self::deposit_event(Event::DefaultPremiumSet { premium });
      Ok(())
    }

    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::set_premium())]
    pub fn set_premium(origin: OriginFor<T>, pool: PoolId, premium: u8) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::ensure_managed(pool)?;
      Self::ensure_premium(premium)?;
      T::Liquidator::set_premium_percent(&Self::account_id(), pool, premium)
    }

    /// Reprice the minimum balance of an asset the pool is still waiting for
    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::update_minimum_balance())]
    pub fn update_minimum_balance(
      origin: OriginFor<T>,
      pool: PoolId,
      asset: AssetId,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_update_minimum_balance(pool, asset)
    }

    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::set_public_swap())]
    pub fn set_public_swap(origin: OriginFor<T>, pool: PoolId, enabled: bool) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::ensure_managed(pool)?;
      T::Pools::set_public_swap(&Self::account_id(), pool, enabled)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Controller account of every index pool
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn now() -> Moment {
      T::UnixTime::now().as_secs()
    }

    pub fn index(pool: PoolId) -> Option<IndexRecord> {
      Indexes::<T>::get(pool)
    }

    pub fn prepared_index(pool: PoolId) -> Option<PreparedIndex<T::MaxIndexSize>> {
      PreparedIndexes::<T>::get(pool)
    }

    pub fn default_premium() -> u8 {
      DefaultPremiumOverride::<T>::get().unwrap_or_else(T::DefaultPremium::get)
    }

    fn ensure_managed(pool: PoolId) -> DispatchResult {
      ensure!(
        T::Pools::controller(pool) == Some(Self::account_id()),
        Error::<T>::NotManaged
      );
      Ok(())
    }

    fn ensure_premium(premium: u8) -> DispatchResult {
      ensure!(
        premium >= 1 && premium <= params::MAX_SELLER_PREMIUM,
        Error::<T>::InvalidPremium
      );
      Ok(())
    }

    /// Square-root market-cap weights of `caps`, summing to at most `WeightBudget`
    pub fn compute_weights(caps: &[Balance]) -> Result<Vec<Balance>, DispatchError> {
      let roots: Vec<U256> = caps
        .iter()
        .map(|cap| fixed_point::sqrt(U256::from(*cap)))
        .collect();
      let total = roots
        .iter()
        .try_fold(U256::zero(), |sum, root| sum.checked_add(*root))
        .ok_or(ArithmeticError::Overflow)?;
      let budget = T::WeightBudget::get();
      roots
        .into_iter()
        .map(|root| -> Result<Balance, DispatchError> {
          let weight = Uq112x112::fraction(root, total)?.mul(budget)?.decode_u128()?;
          ensure!(weight > 0, Error::<T>::ZeroWeight);
          Ok(weight)
        })
        .collect()
    }

    /// Square-root market-cap weights of `assets`
    pub fn compute_asset_weights(assets: &[AssetId]) -> Result<Vec<Balance>, DispatchError> {
      let caps = T::Categories::compute_average_market_caps(assets)?;
      Self::compute_weights(&caps)
    }

    /// Reference-unit value of `pool`, extrapolated from its first ready asset
    pub fn pool_value(pool: PoolId) -> Result<Balance, DispatchError> {
      let (asset, amount) = T::Pools::extrapolate_pool_value_from_token(pool)?;
      T::PriceOracle::compute_average_reference_for_assets(asset, amount, T::PriceWindow::get())
    }

    /// Balance of `asset` worth `pool_value / MinimumBalanceDivisor`
    pub fn minimum_balance(asset: AssetId, pool_value: Balance) -> Result<Balance, DispatchError> {
      let value = pool_value
        .checked_div(T::MinimumBalanceDivisor::get())
        .ok_or(ArithmeticError::DivisionByZero)?;
      T::PriceOracle::compute_average_assets_for_reference(asset, value, T::PriceWindow::get())
    }

    pub fn do_prepare_index(
      category: CategoryId,
      index_size: u32,
      seed_value: Balance,
      name: Vec<u8>,
      symbol: Vec<u8>,
    ) -> Result<PoolId, DispatchError> {
      ensure!(
        index_size >= T::MinIndexSize::get() && index_size <= T::MaxIndexSize::get(),
        Error::<T>::InvalidIndexSize
      );
      ensure!(
        T::Categories::has_category(category),
        Error::<T>::CategoryNotFound
      );

      let assets = T::Categories::top_assets(category, index_size)?;
      let weights = Self::compute_asset_weights(&assets)?;
      let total_weight = weights
        .iter()
        .try_fold(0u128, |sum, weight| sum.checked_add(*weight))
        .ok_or(ArithmeticError::Overflow)?;
      let window = T::PriceWindow::get();
      let balances = assets
        .iter()
        .zip(&weights)
        .map(|(asset, weight)| {
          let value = bmul(seed_value, bdiv(*weight, total_weight)?)?;
          T::PriceOracle::compute_average_assets_for_reference(*asset, value, window)
        })
        .collect::<Result<Vec<_>, DispatchError>>()?;

      let pool = T::Pools::create_pool(&Self::account_id(), name, symbol, T::DefaultSwapFee::get())?;
      let prepared = PreparedIndex {
        category,
        assets: assets.try_into().map_err(|_| Error::<T>::InvalidIndexSize)?,
        weights: weights.try_into().map_err(|_| Error::<T>::InvalidIndexSize)?,
        balances: balances.try_into().map_err(|_| Error::<T>::InvalidIndexSize)?,
      };
      PreparedIndexes::<T>::insert(pool, prepared);

      log::debug!(
        target: LOG_TARGET,
        "prepared pool {} for the top {} assets of category {}",
        pool,
        index_size,
        category
      );
      Self::deposit_event(Event::IndexPrepared {
        pool,
        category,
        index_size,
      });
      Ok(pool)
    }

    pub fn do_deploy_index(provider: &T::AccountId, pool: PoolId) -> DispatchResult {
      let prepared = PreparedIndexes::<T>::take(pool).ok_or(Error::<T>::NotPrepared)?;
      let controller = Self::account_id();
      T::Pools::initialize(
        &controller,
        pool,
        &prepared.assets,
        &prepared.balances,
        &prepared.weights,
        provider,
      )?;
      T::Liquidator::set_premium_percent(&controller, pool, Self::default_premium())?;
      Indexes::<T>::insert(
        pool,
        IndexRecord {
          category: prepared.category,
          index_size: prepared.assets.len() as u32,
          update_count: 0,
          last_update_at: Self::now(),
        },
      );

      Self::deposit_event(Event::IndexDeployed {
        pool,
        provider: provider.clone(),
      });
      Ok(())
    }

    /// Checks the pacing of the next rebalance of `pool` and returns its updated record
    fn next_rebalance(pool: PoolId, reindex: bool) -> Result<IndexRecord, DispatchError> {
      let mut record = Indexes::<T>::get(pool).ok_or(Error::<T>::IndexNotFound)?;
      let now = Self::now();
      ensure!(
        now.saturating_sub(record.last_update_at) >= T::RebalanceDelay::get(),
        Error::<T>::RebalanceTooSoon
      );
      let reindex_due = record.reindex_due(T::ReweighsBeforeReindex::get());
      ensure!(!reindex_due || reindex, Error::<T>::ReindexRequired);
      ensure!(reindex_due || !reindex, Error::<T>::ReweighRequired);

      record.update_count = record
        .update_count
        .checked_add(1)
        .ok_or(ArithmeticError::Overflow)?;
      record.last_update_at = now;
      Ok(record)
    }

    pub fn do_reweigh_pool(pool: PoolId) -> DispatchResult {
      let record = Self::next_rebalance(pool, false)?;
      let assets = T::Pools::current_desired_tokens(pool);
      let weights = Self::compute_asset_weights(&assets)?;
      T::Pools::reweigh_tokens(&Self::account_id(), pool, &assets, &weights)?;
      Indexes::<T>::insert(pool, record);

      log::debug!(target: LOG_TARGET, "reweighed pool {}", pool);
      Self::deposit_event(Event::PoolReweighed {
        pool,
        update_count: record.update_count,
      });
      Ok(())
    }

    pub fn do_reindex_pool(pool: PoolId) -> DispatchResult {
      let record = Self::next_rebalance(pool, true)?;
      let assets = T::Categories::top_assets(record.category, record.index_size)?;
      let weights = Self::compute_asset_weights(&assets)?;

      let mut pool_value = None;
      let mut minimum_balances = Vec::with_capacity(assets.len());
      for asset in &assets {
        if T::Pools::is_bound(pool, *asset) {
          minimum_balances.push(0);
          continue;
        }
        let value = match pool_value {
          Some(value) => value,
          None => *pool_value.insert(Self::pool_value(pool)?),
        };
        minimum_balances.push(Self::minimum_balance(*asset, value)?);
      }

      T::Pools::reindex_tokens(
        &Self::account_id(),
        pool,
        &assets,
        &weights,
        &minimum_balances,
      )?;
      Indexes::<T>::insert(pool, record);

      log::debug!(
        target: LOG_TARGET,
        "reindexed pool {} to {} assets of category {}",
        pool,
        assets.len(),
        record.category
      );
      Self::deposit_event(Event::PoolReindexed {
        pool,
        update_count: record.update_count,
      });
      Ok(())
    }

    pub fn do_update_minimum_balance(pool: PoolId, asset: AssetId) -> DispatchResult {
      ensure!(Indexes::<T>::contains_key(pool), Error::<T>::IndexNotFound);
      ensure!(T::Pools::is_bound(pool, asset), Error::<T>::NotBound);
      ensure!(!T::Pools::is_ready(pool, asset), Error::<T>::AlreadyReady);
      let minimum_balance = Self::minimum_balance(asset, Self::pool_value(pool)?)?;
      T::Pools::set_minimum_balance(&Self::account_id(), pool, asset, minimum_balance)
    }
  }
}
