//! Weighted Pool Pallet
//!
//! Multi-asset pools priced by a constant weighted product, with gradual weight changes.
//!
//! Each pool holds between `MinBoundAssets` and `MaxBoundAssets` assets. The controller of a
//! pool never sets weights directly: it sets a desired weight per asset, and every swap moves
//! the current weight of the input asset up and of the output asset down towards the desired
//! one, by at most half the swap fee per `WeightUpdateDelay`.
//!
//! New assets are bound with a minimum balance and are not ready until the pool holds that
//! much of them. Until then they can only be bought by the pool: they are priced with the
//! minimum balance and a weight slightly above `MinWeight`, and can never be swapped out. An
//! asset whose desired weight is zero is unbound once its weight falls to the minimum, and its
//! remaining balance is handed to the [`UnboundAssetHandler`]. A reindex that drops an asset
//! before it is ready unbinds it at once.

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
use core::marker::PhantomData;
use frame::deps::{
  frame_support::{
    PalletId,
    traits::{
      UnixTime,
      fungibles::{Inspect, Mutate},
      tokens::Preservation,
    },
  },
  sp_runtime::{ArithmeticError, traits::AccountIdConversion},
};
use frame::prelude::*;
use primitives::{
  AssetId, Balance, Moment, PoolId,
  traits::{IndexPoolApi, UnboundAssetHandler},
  weighted_math::{
    badd, bdiv, bmul, bsub, calc_in_given_out, calc_out_given_in, calc_pool_in_given_single_out,
    calc_pool_out_given_single_in, calc_single_in_given_pool_out, calc_single_out_given_pool_in,
    calc_spot_price,
  },
};

const LOG_TARGET: &str = "runtime::weighted-pool";

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  fn create_asset(asset: AssetId) -> DispatchResult;
  fn fund_account(who: &AccountId, asset: AssetId, amount: Balance) -> DispatchResult;
}

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for pooled assets
    type Assets: Inspect<Self::AccountId, AssetId = AssetId, Balance = Balance>
      + Mutate<Self::AccountId, AssetId = AssetId, Balance = Balance>;

    /// Clock used to rate-limit weight changes
    type UnixTime: UnixTime;

    /// Pallet ID the pool accounts are derived from
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Receiver of the balances of unbound assets
    type UnbindHandler: UnboundAssetHandler<Self::AccountId>;

    /// Smallest weight of a bound asset
    #[pallet::constant]
    type MinWeight: Get<Balance>;

    /// Largest weight of a bound asset
    #[pallet::constant]
    type MaxWeight: Get<Balance>;

    /// Largest sum of the current weights in a pool
    #[pallet::constant]
    type MaxTotalWeight: Get<Balance>;

    #[pallet::constant]
    type MinSwapFee: Get<Balance>;

    #[pallet::constant]
    type MaxSwapFee: Get<Balance>;

    /// Fraction of redeemed shares paid to the controller on exit
    #[pallet::constant]
    type ExitFee: Get<Balance>;

    /// Largest swap input relative to the input balance
    #[pallet::constant]
    type MaxInRatio: Get<Balance>;

    /// Largest swap output relative to the output balance
    #[pallet::constant]
    type MaxOutRatio: Get<Balance>;

    /// Minimum time between two weight changes of an asset
    #[pallet::constant]
    type WeightUpdateDelay: Get<Moment>;

    #[pallet::constant]
    type MinBoundAssets: Get<u32>;

    #[pallet::constant]
    type MaxBoundAssets: Get<u32>;

    /// Shares minted to the provider of the initial balances
    #[pallet::constant]
    type InitPoolSupply: Get<Balance>;

    /// Smallest initial balance and minimum balance of an asset
    #[pallet::constant]
    type MinBalance: Get<Balance>;

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

  /// Identifier of the next pool; ids are never reused
  #[pallet::storage]
  pub type NextPoolId<T: Config> = StorageValue<_, PoolId, ValueQuery>;

  #[pallet::storage]
  pub type Pools<T: Config> =
    StorageMap<_, Twox64Concat, PoolId, PoolInfo<T::AccountId>, OptionQuery>;

  /// Bound assets of each pool, in record index order
  #[pallet::storage]
  pub type PoolAssets<T: Config> =
    StorageMap<_, Twox64Concat, PoolId, BoundedVec<AssetId, T::MaxBoundAssets>, ValueQuery>;

  #[pallet::storage]
  pub type Records<T: Config> =
    StorageDoubleMap<_, Twox64Concat, PoolId, Blake2_128Concat, AssetId, AssetRecord, OptionQuery>;

  /// Balance a bound asset needs to become ready
  #[pallet::storage]
  pub type MinimumBalances<T: Config> =
    StorageDoubleMap<_, Twox64Concat, PoolId, Blake2_128Concat, AssetId, Balance, ValueQuery>;

  /// Pool shares per holder
  #[pallet::storage]
  pub type Shares<T: Config> = StorageDoubleMap<
    _,
    Twox64Concat,
    PoolId,
    Blake2_128Concat,
    T::AccountId,
    Balance,
    ValueQuery,
  >;

  /// Pools with an operation in progress
  #[pallet::storage]
  pub type PoolLocks<T: Config> = StorageMap<_, Twox64Concat, PoolId, bool, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    PoolCreated {
      pool: PoolId,
      controller: T::AccountId,
    },
    /// Initial assets bound and initial shares minted
    PoolInitialized {
      pool: PoolId,
      provider: T::AccountId,
      shares: Balance,
    },
    AssetBound {
      pool: PoolId,
      asset: AssetId,
      minimum_balance: Balance,
      desired_weight: Balance,
    },
    /// The pool reached the minimum balance of an asset
    AssetReady {
      pool: PoolId,
      asset: AssetId,
      weight: Balance,
    },
    /// An asset left the pool and its balance went to the unbind handler
    AssetUnbound {
      pool: PoolId,
      asset: AssetId,
      amount: Balance,
    },
    Swapped {
      pool: PoolId,
      who: T::AccountId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_in: Balance,
      amount_out: Balance,
    },
    Joined {
      pool: PoolId,
      who: T::AccountId,
      asset: AssetId,
      amount_in: Balance,
    },
    Exited {
      pool: PoolId,
      who: T::AccountId,
      asset: AssetId,
      amount_out: Balance,
    },
    SharesMinted {
      pool: PoolId,
      who: T::AccountId,
      amount: Balance,
    },
    SharesBurned {
      pool: PoolId,
      who: T::AccountId,
      amount: Balance,
    },
    SwapFeeUpdated {
      pool: PoolId,
      swap_fee: Balance,
    },
    PublicSwapUpdated {
      pool: PoolId,
      enabled: bool,
    },
    DesiredWeightSet {
      pool: PoolId,
      asset: AssetId,
      weight: Balance,
    },
    MinimumBalanceUpdated {
      pool: PoolId,
      asset: AssetId,
      minimum_balance: Balance,
    },
    /// Tracked balance synced with the pool account
    Gulped {
      pool: PoolId,
      asset: AssetId,
      balance: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    PoolNotFound,
    /// Caller is not the pool controller
    NotController,
    NotInitialized,
    AlreadyInitialized,
    /// Number of initial assets outside the allowed range
    InvalidAssetCount,
    ArrayLengthMismatch,
    /// Weight outside `[MinWeight, MaxWeight]`
    InvalidWeight,
    /// Swap fee outside `[MinSwapFee, MaxSwapFee]`
    InvalidSwapFee,
    /// Balance below `MinBalance`
    BalanceBelowMinimum,
    MaxTotalWeightExceeded,
    /// The pool already holds `MaxBoundAssets` assets
    MaxAssetsExceeded,
    AlreadyBound,
    NotBound,
    /// The asset has not reached its minimum balance
    NotReady,
    /// The asset already reached its minimum balance
    AlreadyReady,
    SwapNotPublic,
    IdenticalAssets,
    ZeroAmount,
    MaxInRatioExceeded,
    MaxOutRatioExceeded,
    /// Spot price before the swap exceeds the caller's maximum price
    BadLimitPrice,
    /// Spot price after the swap exceeds the caller's maximum price
    LimitPrice,
    BelowMinimumOutput,
    AboveMaximumInput,
    /// Rounding moved the price against the pool
    MathApproximation,
    InsufficientShares,
    /// No ready asset with a non-zero weight to value the pool with
    NoReadyAsset,
    NameTooLong,
    /// The pool is already executing an operation
    Reentrancy,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Create an empty pool controlled by the caller
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_pool())]
    pub fn create_pool(
      origin: OriginFor<T>,
      name: Vec<u8>,
      symbol: Vec<u8>,
      swap_fee: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_create_pool(&who, name, symbol, swap_fee)?;
      Ok(())
    }

    /// Bind the initial assets with balances pulled from the caller
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::initialize(assets.len() as u32))]
    pub fn initialize(
      origin: OriginFor<T>,
      pool: PoolId,
      assets: Vec<AssetId>,
      balances: Vec<Balance>,
      weights: Vec<Balance>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_initialize(&who, pool, &assets, &balances, &weights, &who)
    }

    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::swap_exact_amount_in())]
    pub fn swap_exact_amount_in(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      amount_in: Balance,
      asset_out: AssetId,
      min_amount_out: Balance,
      max_price: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_swap_exact_amount_in(
        &who,
        pool,
        asset_in,
        amount_in,
        asset_out,
        min_amount_out,
        max_price,
      )?;
      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::swap_exact_amount_out())]
    pub fn swap_exact_amount_out(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      max_amount_in: Balance,
      asset_out: AssetId,
      amount_out: Balance,
      max_price: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_swap_exact_amount_out(
        &who,
        pool,
        asset_in,
        max_amount_in,
        asset_out,
        amount_out,
        max_price,
      )?;
      Ok(())
    }

    /// Mint `pool_amount_out` shares for a proportional deposit of every asset
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::join_pool(max_amounts_in.len() as u32))]
    pub fn join_pool(
      origin: OriginFor<T>,
      pool: PoolId,
      pool_amount_out: Balance,
      max_amounts_in: Vec<Balance>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_join_pool(&who, pool, pool_amount_out, &max_amounts_in)
    }

    /// Redeem `pool_amount_in` shares for a proportional share of every ready asset
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::exit_pool(min_amounts_out.len() as u32))]
    pub fn exit_pool(
      origin: OriginFor<T>,
      pool: PoolId,
      pool_amount_in: Balance,
      min_amounts_out: Vec<Balance>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_exit_pool(&who, pool, pool_amount_in, &min_amounts_out)
    }

    #[pallet::call_index(6)]
    #[pallet::weight(T::WeightInfo::join_swap_extern_amount_in())]
    pub fn join_swap_extern_amount_in(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      amount_in: Balance,
      min_pool_amount_out: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_join_swap_extern_amount_in(&who, pool, asset_in, amount_in, min_pool_amount_out)?;
      Ok(())
    }

    #[pallet::call_index(7)]
    #[pallet::weight(T::WeightInfo::join_swap_pool_amount_out())]
    pub fn join_swap_pool_amount_out(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      pool_amount_out: Balance,
      max_amount_in: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_join_swap_pool_amount_out(&who, pool, asset_in, pool_amount_out, max_amount_in)?;
      Ok(())
    }

    #[pallet::call_index(8)]
    #[pallet::weight(T::WeightInfo::exit_swap_pool_amount_in())]
    pub fn exit_swap_pool_amount_in(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_out: AssetId,
      pool_amount_in: Balance,
      min_amount_out: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_exit_swap_pool_amount_in(&who, pool, asset_out, pool_amount_in, min_amount_out)?;
      Ok(())
    }

    #[pallet::call_index(9)]
    #[pallet::weight(T::WeightInfo::exit_swap_extern_amount_out())]
    pub fn exit_swap_extern_amount_out(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_out: AssetId,
      amount_out: Balance,
      max_pool_amount_in: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_exit_swap_extern_amount_out(&who, pool, asset_out, amount_out, max_pool_amount_in)?;
      Ok(())
    }

    /// Sync the tracked balance of `asset` with the pool account
    #[pallet::call_index(10)]
    #[pallet::weight(T::WeightInfo::gulp())]
    pub fn gulp(origin: OriginFor<T>, pool: PoolId, asset: AssetId) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_gulp(pool, asset)
    }

    #[pallet::call_index(11)]
    #[pallet::weight(T::WeightInfo::bind())]
    pub fn bind(
      origin: OriginFor<T>,
      pool: PoolId,
      asset: AssetId,
      minimum_balance: Balance,
      desired_weight: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      let info = Self::ensure_controller(pool, &who)?;
      ensure!(info.initialized, Error::<T>::NotInitialized);
      Self::do_bind(pool, asset, minimum_balance, desired_weight)
    }

    #[pallet::call_index(12)]
    #[pallet::weight(T::WeightInfo::unbind())]
    pub fn unbind(origin: OriginFor<T>, pool: PoolId, asset: AssetId) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::ensure_controller(pool, &who)?;
      let _lock = PoolLock::<T>::acquire(pool)?;
      let mut info = Self::pool(pool)?;
      Self::unbind_asset(pool, asset, &mut info)?;
      Pools::<T>::insert(pool, info);
      Ok(())
    }

    #[pallet::call_index(13)]
    #[pallet::weight(T::WeightInfo::set_swap_fee())]
    pub fn set_swap_fee(origin: OriginFor<T>, pool: PoolId, swap_fee: Balance) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_set_swap_fee(&who, pool, swap_fee)
    }

    #[pallet::call_index(14)]
    #[pallet::weight(T::WeightInfo::set_public_swap())]
    pub fn set_public_swap(origin: OriginFor<T>, pool: PoolId, enabled: bool) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_set_public_swap(&who, pool, enabled)
    }

    /// Set the desired weights of bound assets
    #[pallet::call_index(15)]
    #[pallet::weight(T::WeightInfo::reweigh_tokens(assets.len() as u32))]
    pub fn reweigh_tokens(
      origin: OriginFor<T>,
      pool: PoolId,
      assets: Vec<AssetId>,
      weights: Vec<Balance>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_reweigh_tokens(&who, pool, &assets, &weights)
    }

    /// Replace the desired asset set: listed assets are bound or reweighed, every other
    /// bound asset gets a zero desired weight
    #[pallet::call_index(16)]
    #[pallet::weight(T::WeightInfo::reindex_tokens(assets.len() as u32))]
    pub fn reindex_tokens(
      origin: OriginFor<T>,
      pool: PoolId,
      assets: Vec<AssetId>,
      weights: Vec<Balance>,
      minimum_balances: Vec<Balance>,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_reindex_tokens(&who, pool, &assets, &weights, &minimum_balances)
    }

    #[pallet::call_index(17)]
    #[pallet::weight(T::WeightInfo::set_minimum_balance())]
    pub fn set_minimum_balance(
      origin: OriginFor<T>,
      pool: PoolId,
      asset: AssetId,
      minimum_balance: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_set_minimum_balance(&who, pool, asset, minimum_balance)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Account holding the reserves of `pool`
    pub fn pool_account(pool: PoolId) -> T::AccountId {
      T::PalletId::get().into_sub_account_truncating(pool)
    }

    pub fn now() -> Moment {
      T::UnixTime::now().as_secs()
    }

    pub fn pool(pool: PoolId) -> Result<PoolInfo<T::AccountId>, DispatchError> {
      Pools::<T>::get(pool).ok_or(Error::<T>::PoolNotFound.into())
    }

    fn ensure_controller(
      pool: PoolId,
      who: &T::AccountId,
    ) -> Result<PoolInfo<T::AccountId>, DispatchError> {
      let info = Self::pool(pool)?;
      ensure!(info.controller == *who, Error::<T>::NotController);
      Ok(info)
    }

    fn check_weight(weight: Balance) -> DispatchResult {
      ensure!(
        weight >= T::MinWeight::get() && weight <= T::MaxWeight::get(),
        Error::<T>::InvalidWeight
      );
      Ok(())
    }

    pub fn do_create_pool(
      controller: &T::AccountId,
      name: Vec<u8>,
      symbol: Vec<u8>,
      swap_fee: Balance,
    ) -> Result<PoolId, DispatchError> {
      ensure!(
        swap_fee >= T::MinSwapFee::get() && swap_fee <= T::MaxSwapFee::get(),
        Error::<T>::InvalidSwapFee
      );
      let name: BoundedVec<u8, NameLimit> = name.try_into().map_err(|_| Error::<T>::NameTooLong)?;
      let symbol: BoundedVec<u8, NameLimit> =
        symbol.try_into().map_err(|_| Error::<T>::NameTooLong)?;

      let pool = NextPoolId::<T>::get();
      NextPoolId::<T>::put(pool.checked_add(1).ok_or(ArithmeticError::Overflow)?);
      Pools::<T>::insert(
        pool,
        PoolInfo {
          controller: controller.clone(),
          swap_fee,
          public_swap: false,
          initialized: false,
          total_weight: 0,
          total_supply: 0,
          name,
          symbol,
        },
      );

      log::debug!(target: LOG_TARGET, "created pool {}", pool);
      Self::deposit_event(Event::PoolCreated {
        pool,
        controller: controller.clone(),
      });
      Ok(pool)
    }

    pub fn do_initialize(
      controller: &T::AccountId,
      pool: PoolId,
      assets: &[AssetId],
      balances: &[Balance],
      weights: &[Balance],
      provider: &T::AccountId,
    ) -> DispatchResult {
      let mut info = Self::ensure_controller(pool, controller)?;
      ensure!(!info.initialized, Error::<T>::AlreadyInitialized);
      ensure!(
        assets.len() == balances.len() && assets.len() == weights.len(),
        Error::<T>::ArrayLengthMismatch
      );
      let count = assets.len() as u32;
      ensure!(
        count >= T::MinBoundAssets::get() && count <= T::MaxBoundAssets::get(),
        Error::<T>::InvalidAssetCount
      );
      let _lock = PoolLock::<T>::acquire(pool)?;

      let account = Self::pool_account(pool);
      let now = Self::now();
      let mut bound = BoundedVec::<AssetId, T::MaxBoundAssets>::default();
      let mut total_weight: Balance = 0;
      for (index, ((asset, balance), weight)) in assets.iter().zip(balances).zip(weights).enumerate()
      {
        Self::check_weight(*weight)?;
        ensure!(*balance >= T::MinBalance::get(), Error::<T>::BalanceBelowMinimum);
        ensure!(!bound.contains(asset), Error::<T>::AlreadyBound);
        bound
          .try_push(*asset)
          .map_err(|_| Error::<T>::MaxAssetsExceeded)?;
        Records::<T>::insert(
          pool,
          asset,
          AssetRecord {
            bound: true,
            ready: true,
            last_weight_update: now,
            current_weight: *weight,
            desired_weight: *weight,
            index: u8::try_from(index).map_err(|_| Error::<T>::MaxAssetsExceeded)?,
            balance: *balance,
          },
        );
        total_weight = badd(total_weight, *weight)?;
        T::Assets::transfer(*asset, provider, &account, *balance, Preservation::Expendable)?;
      }
      ensure!(
        total_weight <= T::MaxTotalWeight::get(),
        Error::<T>::MaxTotalWeightExceeded
      );

      let shares = T::InitPoolSupply::get();
      PoolAssets::<T>::insert(pool, bound);
      info.total_weight = total_weight;
      info.public_swap = true;
      info.initialized = true;
      Self::mint_shares(pool, &mut info, provider, shares)?;
      Pools::<T>::insert(pool, info);

      log::debug!(
        target: LOG_TARGET,
        "initialized pool {} with {} assets, total weight {}",
        pool,
        count,
        total_weight
      );
      Self::deposit_event(Event::PoolInitialized {
        pool,
        provider: provider.clone(),
        shares,
      });
      Ok(())
    }

    /// Pricing view of an input asset and its real tracked balance
    ///
    /// An asset that is not ready is priced as if the pool held its minimum balance, with
    /// a weight between `MinWeight` and `1.1 * MinWeight` that grows with the shortfall.
    fn input_record(pool: PoolId, asset: AssetId) -> Result<(AssetRecord, Balance), DispatchError> {
      let mut record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
      let real_balance = record.balance;
      if !record.ready {
        let minimum = MinimumBalances::<T>::get(pool, asset);
        let min_weight = T::MinWeight::get();
        let shortfall = bdiv(minimum.saturating_sub(real_balance), minimum)?;
        record.balance = minimum;
        record.current_weight = badd(min_weight, bmul(min_weight / 10, shortfall)?)?;
      }
      Ok((record, real_balance))
    }

    fn output_record(pool: PoolId, asset: AssetId) -> Result<AssetRecord, DispatchError> {
      let record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
      ensure!(record.ready, Error::<T>::NotReady);
      Ok(record)
    }

    /// Records a deposit of `asset`: makes it ready once the minimum balance is reached,
    /// otherwise moves a ready asset's weight up towards its desired weight
    fn update_input(
      pool: PoolId,
      asset: AssetId,
      info: &mut PoolInfo<T::AccountId>,
      real_balance: Balance,
    ) -> DispatchResult {
      let mut record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
      if record.ready {
        Self::increase_weight(pool, asset, &mut record, info)?;
      } else {
        Self::try_make_ready(pool, asset, &mut record, info, real_balance)?;
      }
      record.balance = real_balance;
      Records::<T>::insert(pool, asset, record);
      Ok(())
    }

    fn try_make_ready(
      pool: PoolId,
      asset: AssetId,
      record: &mut AssetRecord,
      info: &mut PoolInfo<T::AccountId>,
      real_balance: Balance,
    ) -> DispatchResult {
      let minimum = MinimumBalances::<T>::get(pool, asset);
      if real_balance < minimum {
        return Ok(());
      }
      let min_weight = T::MinWeight::get();
      let surplus = bdiv(real_balance - minimum, minimum)?;
      let weight = badd(min_weight, bmul(min_weight, surplus)?)?.min(T::MaxWeight::get());

      info.total_weight = badd(info.total_weight, weight)?;
      ensure!(
        info.total_weight <= T::MaxTotalWeight::get(),
        Error::<T>::MaxTotalWeightExceeded
      );
      record.ready = true;
      record.current_weight = weight;
      record.last_weight_update = Self::now();
      MinimumBalances::<T>::remove(pool, asset);

      log::debug!(
        target: LOG_TARGET,
        "asset {} ready in pool {} with weight {}",
        asset,
        pool,
        weight
      );
      Self::deposit_event(Event::AssetReady {
        pool,
        asset,
        weight,
      });
      Ok(())
    }

    fn increase_weight(
      pool: PoolId,
      asset: AssetId,
      record: &mut AssetRecord,
      info: &mut PoolInfo<T::AccountId>,
    ) -> DispatchResult {
      let now = Self::now();
      if record.current_weight >= record.desired_weight
        || now.saturating_sub(record.last_weight_update) < T::WeightUpdateDelay::get()
      {
        return Ok(());
      }
      let max_diff = bmul(record.current_weight, info.swap_fee / 2)?;
      let weight = badd(record.current_weight, max_diff)?.min(record.desired_weight);
      let diff = weight - record.current_weight;
      if diff == 0 {
        return Ok(());
      }

      info.total_weight = badd(info.total_weight, diff)?;
      ensure!(
        info.total_weight <= T::MaxTotalWeight::get(),
        Error::<T>::MaxTotalWeightExceeded
      );
      record.current_weight = weight;
      record.last_weight_update = now;
      log::debug!(target: LOG_TARGET, "pool {} asset {} weight up to {}", pool, asset, weight);
      Ok(())
    }

    /// Moves an output asset's weight down towards its desired weight. An asset with a zero
    /// desired weight is unbound once its weight would reach `MinWeight`.
    fn decrease_weight(
      pool: PoolId,
      asset: AssetId,
      info: &mut PoolInfo<T::AccountId>,
    ) -> DispatchResult {
      let mut record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
      let now = Self::now();
      if record.current_weight <= record.desired_weight
        || now.saturating_sub(record.last_weight_update) < T::WeightUpdateDelay::get()
      {
        return Ok(());
      }
      let old_weight = record.current_weight;
      let max_diff = bmul(old_weight, info.swap_fee / 2)?;
      let weight = old_weight
        .saturating_sub(max_diff)
        .max(record.desired_weight);
      if record.desired_weight == 0 && weight <= T::MinWeight::get() {
        return Self::unbind_asset(pool, asset, info);
      }

      info.total_weight = bsub(info.total_weight, old_weight - weight)?;
      record.current_weight = weight;
      record.last_weight_update = now;
      Records::<T>::insert(pool, asset, record);
      log::debug!(target: LOG_TARGET, "pool {} asset {} weight down to {}", pool, asset, weight);
      Ok(())
    }

    pub fn do_bind(
      pool: PoolId,
      asset: AssetId,
      minimum_balance: Balance,
      desired_weight: Balance,
    ) -> DispatchResult {
      ensure!(
        !Records::<T>::contains_key(pool, asset),
        Error::<T>::AlreadyBound
      );
      Self::check_weight(desired_weight)?;
      ensure!(
        minimum_balance >= T::MinBalance::get(),
        Error::<T>::BalanceBelowMinimum
      );
      let index = PoolAssets::<T>::try_mutate(pool, |assets| -> Result<u8, DispatchError> {
        let index = u8::try_from(assets.len()).map_err(|_| Error::<T>::MaxAssetsExceeded)?;
        assets
          .try_push(asset)
          .map_err(|_| Error::<T>::MaxAssetsExceeded)?;
        Ok(index)
      })?;
      Records::<T>::insert(
        pool,
        asset,
        AssetRecord {
          bound: true,
          ready: false,
          last_weight_update: 0,
          current_weight: 0,
          desired_weight,
          index,
          balance: 0,
        },
      );
      MinimumBalances::<T>::insert(pool, asset, minimum_balance);

      log::debug!(target: LOG_TARGET, "bound asset {} to pool {}", asset, pool);
      Self::deposit_event(Event::AssetBound {
        pool,
        asset,
        minimum_balance,
        desired_weight,
      });
      Ok(())
    }

    /// Removes `asset` from the pool and hands its balance to the unbind handler
    fn unbind_asset(
      pool: PoolId,
      asset: AssetId,
      info: &mut PoolInfo<T::AccountId>,
    ) -> DispatchResult {
      let record = Records::<T>::take(pool, asset).ok_or(Error::<T>::NotBound)?;
      info.total_weight = bsub(info.total_weight, record.current_weight)?;
      MinimumBalances::<T>::remove(pool, asset);
      PoolAssets::<T>::mutate(pool, |assets| {
        let index = record.index as usize;
        if index < assets.len() {
          assets.swap_remove(index);
          if let Some(moved) = assets.get(index) {
            Records::<T>::mutate(pool, moved, |moved| {
              if let Some(moved) = moved {
                moved.index = record.index;
              }
            });
          }
        }
      });
      Pools::<T>::insert(pool, &*info);

      Self::hand_to_unbind_handler(pool, asset, record.balance)?;
      log::debug!(
        target: LOG_TARGET,
        "unbound asset {} from pool {}, {} handed over",
        asset,
        pool,
        record.balance
      );
      Self::deposit_event(Event::AssetUnbound {
        pool,
        asset,
        amount: record.balance,
      });
      Ok(())
    }

    fn hand_to_unbind_handler(pool: PoolId, asset: AssetId, amount: Balance) -> DispatchResult {
      if amount > 0 {
        T::Assets::transfer(
          asset,
          &Self::pool_account(pool),
          &T::UnbindHandler::handler_account(),
          amount,
          Preservation::Expendable,
        )?;
      }
      T::UnbindHandler::on_unbind(pool, asset, amount)
    }

    fn mint_shares(
      pool: PoolId,
      info: &mut PoolInfo<T::AccountId>,
      who: &T::AccountId,
      amount: Balance,
    ) -> DispatchResult {
      info.total_supply = badd(info.total_supply, amount)?;
      Shares::<T>::try_mutate(pool, who, |shares| -> DispatchResult {
        *shares = badd(*shares, amount)?;
        Ok(())
      })?;
      Self::deposit_event(Event::SharesMinted {
        pool,
        who: who.clone(),
        amount,
      });
      Ok(())
    }

    /// Takes `amount` shares from `who`, pays `exit_fee` of them to the controller and burns
    /// the rest
    fn burn_shares(
      pool: PoolId,
      info: &mut PoolInfo<T::AccountId>,
      who: &T::AccountId,
      amount: Balance,
      exit_fee: Balance,
    ) -> DispatchResult {
      Shares::<T>::try_mutate(pool, who, |shares| -> DispatchResult {
        *shares = shares
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientShares)?;
        Ok(())
      })?;
      if exit_fee > 0 {
        Shares::<T>::try_mutate(pool, &info.controller, |shares| -> DispatchResult {
          *shares = badd(*shares, exit_fee)?;
          Ok(())
        })?;
      }
      let burned = bsub(amount, exit_fee)?;
      info.total_supply = bsub(info.total_supply, burned)?;
      Self::deposit_event(Event::SharesBurned {
        pool,
        who: who.clone(),
        amount: burned,
      });
      Ok(())
    }

    /// Moves the assets of a swap and checks the price movement
    fn settle_swap(
      who: &T::AccountId,
      pool: PoolId,
      mut info: PoolInfo<T::AccountId>,
      (asset_in, in_record, real_in): (AssetId, AssetRecord, Balance),
      (asset_out, out_record): (AssetId, AssetRecord),
      (amount_in, amount_out): (Balance, Balance),
      spot_price_before: Balance,
      max_price: Balance,
    ) -> Result<Balance, DispatchError> {
      let account = Self::pool_account(pool);
      T::Assets::transfer(asset_in, who, &account, amount_in, Preservation::Expendable)?;
      T::Assets::transfer(asset_out, &account, who, amount_out, Preservation::Expendable)?;

      let out_balance = bsub(out_record.balance, amount_out)?;
      let spot_price_after = calc_spot_price(
        badd(in_record.balance, amount_in)?,
        in_record.current_weight,
        out_balance,
        out_record.current_weight,
        info.swap_fee,
      )?;
      ensure!(
        spot_price_after >= spot_price_before,
        Error::<T>::MathApproximation
      );
      ensure!(spot_price_after <= max_price, Error::<T>::LimitPrice);
      ensure!(
        spot_price_before <= bdiv(amount_in, amount_out)?,
        Error::<T>::MathApproximation
      );

      Self::update_input(pool, asset_in, &mut info, badd(real_in, amount_in)?)?;
      Records::<T>::mutate(pool, asset_out, |record| {
        if let Some(record) = record {
          record.balance = out_balance;
        }
      });
      Self::decrease_weight(pool, asset_out, &mut info)?;
      Pools::<T>::insert(pool, info);

      Self::deposit_event(Event::Swapped {
        pool,
        who: who.clone(),
        asset_in,
        asset_out,
        amount_in,
        amount_out,
      });
      Ok(spot_price_after)
    }

    /// Returns `(amount_out, spot_price_after)`
    pub fn do_swap_exact_amount_in(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      amount_in: Balance,
      asset_out: AssetId,
      min_amount_out: Balance,
      max_price: Balance,
    ) -> Result<(Balance, Balance), DispatchError> {
      ensure!(asset_in != asset_out, Error::<T>::IdenticalAssets);
      let _lock = PoolLock::<T>::acquire(pool)?;
      let info = Self::pool(pool)?;
      ensure!(info.public_swap, Error::<T>::SwapNotPublic);

      let (in_record, real_in) = Self::input_record(pool, asset_in)?;
      let out_record = Self::output_record(pool, asset_out)?;
      ensure!(
        amount_in <= bmul(in_record.balance, T::MaxInRatio::get())?,
        Error::<T>::MaxInRatioExceeded
      );

      let spot_price_before = calc_spot_price(
        in_record.balance,
        in_record.current_weight,
        out_record.balance,
        out_record.current_weight,
        info.swap_fee,
      )?;
      ensure!(spot_price_before <= max_price, Error::<T>::BadLimitPrice);

      let amount_out = calc_out_given_in(
        in_record.balance,
        in_record.current_weight,
        out_record.balance,
        out_record.current_weight,
        amount_in,
        info.swap_fee,
      )?;
      ensure!(amount_out >= min_amount_out, Error::<T>::BelowMinimumOutput);

      let spot_price_after = Self::settle_swap(
        who,
        pool,
        info,
        (asset_in, in_record, real_in),
        (asset_out, out_record),
        (amount_in, amount_out),
        spot_price_before,
        max_price,
      )?;
      Ok((amount_out, spot_price_after))
    }

    /// Returns `(amount_in, spot_price_after)`
    pub fn do_swap_exact_amount_out(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      max_amount_in: Balance,
      asset_out: AssetId,
      amount_out: Balance,
      max_price: Balance,
    ) -> Result<(Balance, Balance), DispatchError> {
      ensure!(asset_in != asset_out, Error::<T>::IdenticalAssets);
      let _lock = PoolLock::<T>::acquire(pool)?;
      let info = Self::pool(pool)?;
      ensure!(info.public_swap, Error::<T>::SwapNotPublic);

      let (in_record, real_in) = Self::input_record(pool, asset_in)?;
      let out_record = Self::output_record(pool, asset_out)?;
      ensure!(
        amount_out <= bmul(out_record.balance, T::MaxOutRatio::get())?,
        Error::<T>::MaxOutRatioExceeded
      );

      let spot_price_before = calc_spot_price(
        in_record.balance,
        in_record.current_weight,
        out_record.balance,
        out_record.current_weight,
        info.swap_fee,
      )?;
      ensure!(spot_price_before <= max_price, Error::<T>::BadLimitPrice);

      let amount_in = calc_in_given_out(
        in_record.balance,
        in_record.current_weight,
        out_record.balance,
        out_record.current_weight,
        amount_out,
        info.swap_fee,
      )?;
      ensure!(amount_in <= max_amount_in, Error::<T>::AboveMaximumInput);

      let spot_price_after = Self::settle_swap(
        who,
        pool,
        info,
        (asset_in, in_record, real_in),
        (asset_out, out_record),
        (amount_in, amount_out),
        spot_price_before,
        max_price,
      )?;
      Ok((amount_in, spot_price_after))
    }

    pub fn do_join_pool(
      who: &T::AccountId,
      pool: PoolId,
      pool_amount_out: Balance,
      max_amounts_in: &[Balance],
    ) -> DispatchResult {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let mut info = Self::pool(pool)?;
      ensure!(info.initialized, Error::<T>::NotInitialized);
      let assets = PoolAssets::<T>::get(pool);
      ensure!(
        max_amounts_in.len() == assets.len(),
        Error::<T>::ArrayLengthMismatch
      );
      let ratio = bdiv(pool_amount_out, info.total_supply)?;
      ensure!(ratio != 0, Error::<T>::MathApproximation);

      let account = Self::pool_account(pool);
      for (asset, max_amount_in) in assets.iter().zip(max_amounts_in) {
        let record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
        let amount_in = bmul(ratio, Self::used_balance_of(pool, *asset, &record))?;
        ensure!(amount_in != 0, Error::<T>::MathApproximation);
        ensure!(amount_in <= *max_amount_in, Error::<T>::AboveMaximumInput);
        T::Assets::transfer(*asset, who, &account, amount_in, Preservation::Expendable)?;
        Self::update_input(pool, *asset, &mut info, badd(record.balance, amount_in)?)?;
        Self::deposit_event(Event::Joined {
          pool,
          who: who.clone(),
          asset: *asset,
          amount_in,
        });
      }
      Self::mint_shares(pool, &mut info, who, pool_amount_out)?;
      Pools::<T>::insert(pool, info);
      Ok(())
    }

    pub fn do_exit_pool(
      who: &T::AccountId,
      pool: PoolId,
      pool_amount_in: Balance,
      min_amounts_out: &[Balance],
    ) -> DispatchResult {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let mut info = Self::pool(pool)?;
      ensure!(info.initialized, Error::<T>::NotInitialized);
      let assets = PoolAssets::<T>::get(pool);
      ensure!(
        min_amounts_out.len() == assets.len(),
        Error::<T>::ArrayLengthMismatch
      );
      let exit_fee = bmul(pool_amount_in, T::ExitFee::get())?;
      let ratio = bdiv(bsub(pool_amount_in, exit_fee)?, info.total_supply)?;
      ensure!(ratio != 0, Error::<T>::MathApproximation);
      Self::burn_shares(pool, &mut info, who, pool_amount_in, exit_fee)?;

      let account = Self::pool_account(pool);
      for (asset, min_amount_out) in assets.iter().zip(min_amounts_out) {
        let mut record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
        if !record.ready {
          ensure!(*min_amount_out == 0, Error::<T>::NotReady);
          continue;
        }
        let amount_out = bmul(ratio, record.balance)?;
        ensure!(amount_out != 0, Error::<T>::MathApproximation);
        ensure!(
          amount_out >= *min_amount_out,
          Error::<T>::BelowMinimumOutput
        );
        record.balance = bsub(record.balance, amount_out)?;
        Records::<T>::insert(pool, asset, record);
        T::Assets::transfer(*asset, &account, who, amount_out, Preservation::Expendable)?;
        Self::deposit_event(Event::Exited {
          pool,
          who: who.clone(),
          asset: *asset,
          amount_out,
        });
      }
      Pools::<T>::insert(pool, info);
      Ok(())
    }

    /// Returns the shares minted
    pub fn do_join_swap_extern_amount_in(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      amount_in: Balance,
      min_pool_amount_out: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let mut info = Self::pool(pool)?;
      ensure!(info.public_swap, Error::<T>::SwapNotPublic);
      ensure!(amount_in != 0, Error::<T>::ZeroAmount);

      let (in_record, real_in) = Self::input_record(pool, asset_in)?;
      ensure!(
        amount_in <= bmul(in_record.balance, T::MaxInRatio::get())?,
        Error::<T>::MaxInRatioExceeded
      );
      let pool_amount_out = calc_pool_out_given_single_in(
        in_record.balance,
        in_record.current_weight,
        info.total_supply,
        info.total_weight,
        amount_in,
        info.swap_fee,
      )?;
      ensure!(
        pool_amount_out >= min_pool_amount_out,
        Error::<T>::BelowMinimumOutput
      );

      T::Assets::transfer(
        asset_in,
        who,
        &Self::pool_account(pool),
        amount_in,
        Preservation::Expendable,
      )?;
      Self::update_input(pool, asset_in, &mut info, badd(real_in, amount_in)?)?;
      Self::mint_shares(pool, &mut info, who, pool_amount_out)?;
      Pools::<T>::insert(pool, info);
      Self::deposit_event(Event::Joined {
        pool,
        who: who.clone(),
        asset: asset_in,
        amount_in,
      });
      Ok(pool_amount_out)
    }

    /// Returns the amount of `asset_in` deposited
    pub fn do_join_swap_pool_amount_out(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      pool_amount_out: Balance,
      max_amount_in: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let mut info = Self::pool(pool)?;
      ensure!(info.public_swap, Error::<T>::SwapNotPublic);

      let (in_record, real_in) = Self::input_record(pool, asset_in)?;
      let amount_in = calc_single_in_given_pool_out(
        in_record.balance,
        in_record.current_weight,
        info.total_supply,
        info.total_weight,
        pool_amount_out,
        info.swap_fee,
      )?;
      ensure!(amount_in != 0, Error::<T>::MathApproximation);
      ensure!(amount_in <= max_amount_in, Error::<T>::AboveMaximumInput);
      ensure!(
        amount_in <= bmul(in_record.balance, T::MaxInRatio::get())?,
        Error::<T>::MaxInRatioExceeded
      );

      T::Assets::transfer(
        asset_in,
        who,
        &Self::pool_account(pool),
        amount_in,
        Preservation::Expendable,
      )?;
      Self::update_input(pool, asset_in, &mut info, badd(real_in, amount_in)?)?;
      Self::mint_shares(pool, &mut info, who, pool_amount_out)?;
      Pools::<T>::insert(pool, info);
      Self::deposit_event(Event::Joined {
        pool,
        who: who.clone(),
        asset: asset_in,
        amount_in,
      });
      Ok(amount_in)
    }

    /// Returns the amount of `asset_out` withdrawn
    pub fn do_exit_swap_pool_amount_in(
      who: &T::AccountId,
      pool: PoolId,
      asset_out: AssetId,
      pool_amount_in: Balance,
      min_amount_out: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let info = Self::pool(pool)?;
      ensure!(info.public_swap, Error::<T>::SwapNotPublic);

      let out_record = Self::output_record(pool, asset_out)?;
      let amount_out = calc_single_out_given_pool_in(
        out_record.balance,
        out_record.current_weight,
        info.total_supply,
        info.total_weight,
        pool_amount_in,
        info.swap_fee,
        T::ExitFee::get(),
      )?;
      ensure!(amount_out >= min_amount_out, Error::<T>::BelowMinimumOutput);
      ensure!(
        amount_out <= bmul(out_record.balance, T::MaxOutRatio::get())?,
        Error::<T>::MaxOutRatioExceeded
      );

      Self::settle_single_exit(who, pool, info, asset_out, out_record, pool_amount_in, amount_out)?;
      Ok(amount_out)
    }

    /// Returns the shares redeemed
    pub fn do_exit_swap_extern_amount_out(
      who: &T::AccountId,
      pool: PoolId,
      asset_out: AssetId,
      amount_out: Balance,
      max_pool_amount_in: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let info = Self::pool(pool)?;
      ensure!(info.public_swap, Error::<T>::SwapNotPublic);

      let out_record = Self::output_record(pool, asset_out)?;
      ensure!(
        amount_out <= bmul(out_record.balance, T::MaxOutRatio::get())?,
        Error::<T>::MaxOutRatioExceeded
      );
      let pool_amount_in = calc_pool_in_given_single_out(
        out_record.balance,
        out_record.current_weight,
        info.total_supply,
        info.total_weight,
        amount_out,
        info.swap_fee,
        T::ExitFee::get(),
      )?;
      ensure!(pool_amount_in != 0, Error::<T>::MathApproximation);
      ensure!(
        pool_amount_in <= max_pool_amount_in,
        Error::<T>::AboveMaximumInput
      );

      Self::settle_single_exit(who, pool, info, asset_out, out_record, pool_amount_in, amount_out)?;
      Ok(pool_amount_in)
    }

    fn settle_single_exit(
      who: &T::AccountId,
      pool: PoolId,
      mut info: PoolInfo<T::AccountId>,
      asset_out: AssetId,
      mut out_record: AssetRecord,
      pool_amount_in: Balance,
      amount_out: Balance,
    ) -> DispatchResult {
      let exit_fee = bmul(pool_amount_in, T::ExitFee::get())?;
      Self::burn_shares(pool, &mut info, who, pool_amount_in, exit_fee)?;

      out_record.balance = bsub(out_record.balance, amount_out)?;
      Records::<T>::insert(pool, asset_out, out_record);
      T::Assets::transfer(
        asset_out,
        &Self::pool_account(pool),
        who,
        amount_out,
        Preservation::Expendable,
      )?;
      Self::decrease_weight(pool, asset_out, &mut info)?;
      Pools::<T>::insert(pool, info);
      Self::deposit_event(Event::Exited {
        pool,
        who: who.clone(),
        asset: asset_out,
        amount_out,
      });
      Ok(())
    }

    pub fn do_gulp(pool: PoolId, asset: AssetId) -> DispatchResult {
      let _lock = PoolLock::<T>::acquire(pool)?;
      let mut info = Self::pool(pool)?;
      let balance = T::Assets::balance(asset, &Self::pool_account(pool));

      let Some(mut record) = Records::<T>::get(pool, asset) else {
        if balance > 0 {
          log::debug!(
            target: LOG_TARGET,
            "forwarding {} of unbound asset {} from pool {}",
            balance,
            asset,
            pool
          );
          Self::hand_to_unbind_handler(pool, asset, balance)?;
        }
        return Ok(());
      };
      if !record.ready {
        Self::try_make_ready(pool, asset, &mut record, &mut info, balance)?;
      }
      record.balance = balance;
      Records::<T>::insert(pool, asset, record);
      Pools::<T>::insert(pool, info);
      Self::deposit_event(Event::Gulped {
        pool,
        asset,
        balance,
      });
      Ok(())
    }

    pub fn do_set_swap_fee(who: &T::AccountId, pool: PoolId, swap_fee: Balance) -> DispatchResult {
      let mut info = Self::ensure_controller(pool, who)?;
      ensure!(
        swap_fee >= T::MinSwapFee::get() && swap_fee <= T::MaxSwapFee::get(),
        Error::<T>::InvalidSwapFee
      );
      info.swap_fee = swap_fee;
      Pools::<T>::insert(pool, info);
      Self::deposit_event(Event::SwapFeeUpdated { pool, swap_fee });
      Ok(())
    }

    pub fn do_set_public_swap(who: &T::AccountId, pool: PoolId, enabled: bool) -> DispatchResult {
      let mut info = Self::ensure_controller(pool, who)?;
      ensure!(!enabled || info.initialized, Error::<T>::NotInitialized);
      info.public_swap = enabled;
      Pools::<T>::insert(pool, info);
      Self::deposit_event(Event::PublicSwapUpdated { pool, enabled });
      Ok(())
    }

    fn set_desired_weight(pool: PoolId, asset: AssetId, weight: Balance) -> DispatchResult {
      Records::<T>::try_mutate(pool, asset, |record| -> DispatchResult {
        let record = record.as_mut().ok_or(Error::<T>::NotBound)?;
        record.desired_weight = weight;
        Ok(())
      })?;
      Self::deposit_event(Event::DesiredWeightSet {
        pool,
        asset,
        weight,
      });
      Ok(())
    }

    pub fn do_reweigh_tokens(
      who: &T::AccountId,
      pool: PoolId,
      assets: &[AssetId],
      weights: &[Balance],
    ) -> DispatchResult {
      let info = Self::ensure_controller(pool, who)?;
      ensure!(info.initialized, Error::<T>::NotInitialized);
      ensure!(
        assets.len() == weights.len(),
        Error::<T>::ArrayLengthMismatch
      );
      for (asset, weight) in assets.iter().zip(weights) {
        Self::check_weight(*weight)?;
        Self::set_desired_weight(pool, *asset, *weight)?;
      }
      Ok(())
    }

    /// Sets the desired weights of `assets`, binding those not yet in the pool. Assets left
    /// out are phased out: a ready asset gets a zero desired weight and is unbound once swaps
    /// bring its weight down, an asset that is not ready is unbound right away.
    pub fn do_reindex_tokens(
      who: &T::AccountId,
      pool: PoolId,
      assets: &[AssetId],
      weights: &[Balance],
      minimum_balances: &[Balance],
    ) -> DispatchResult {
      let mut info = Self::ensure_controller(pool, who)?;
      ensure!(info.initialized, Error::<T>::NotInitialized);
      ensure!(
        assets.len() == weights.len() && assets.len() == minimum_balances.len(),
        Error::<T>::ArrayLengthMismatch
      );

      for asset in PoolAssets::<T>::get(pool) {
        if assets.contains(&asset) {
          continue;
        }
        let record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
        if record.ready {
          Self::set_desired_weight(pool, asset, 0)?;
        } else {
          Self::unbind_asset(pool, asset, &mut info)?;
        }
      }
      for ((asset, weight), minimum_balance) in assets.iter().zip(weights).zip(minimum_balances) {
        if Records::<T>::contains_key(pool, asset) {
          Self::check_weight(*weight)?;
          Self::set_desired_weight(pool, *asset, *weight)?;
        } else {
          Self::do_bind(pool, *asset, *minimum_balance, *weight)?;
        }
      }
      Ok(())
    }

    pub fn do_set_minimum_balance(
      who: &T::AccountId,
      pool: PoolId,
      asset: AssetId,
      minimum_balance: Balance,
    ) -> DispatchResult {
      Self::ensure_controller(pool, who)?;
      let record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
      ensure!(!record.ready, Error::<T>::AlreadyReady);
      ensure!(
        minimum_balance >= T::MinBalance::get(),
        Error::<T>::BalanceBelowMinimum
      );
      MinimumBalances::<T>::insert(pool, asset, minimum_balance);
      Self::deposit_event(Event::MinimumBalanceUpdated {
        pool,
        asset,
        minimum_balance,
      });
      Ok(())
    }

    fn used_balance_of(pool: PoolId, asset: AssetId, record: &AssetRecord) -> Balance {
      if record.ready {
        record.balance
      } else {
        MinimumBalances::<T>::get(pool, asset)
      }
    }

    /// Record of `asset`; the default record for an unbound asset
    pub fn record(pool: PoolId, asset: AssetId) -> AssetRecord {
      Records::<T>::get(pool, asset).unwrap_or_default()
    }

    pub fn current_tokens(pool: PoolId) -> Vec<AssetId> {
      PoolAssets::<T>::get(pool).into_inner()
    }

    pub fn current_desired_tokens(pool: PoolId) -> Vec<AssetId> {
      PoolAssets::<T>::get(pool)
        .into_iter()
        .filter(|asset| Self::record(pool, *asset).desired_weight > 0)
        .collect()
    }

    pub fn total_weight(pool: PoolId) -> Balance {
      Pools::<T>::get(pool).map_or(0, |info| info.total_weight)
    }

    pub fn total_supply(pool: PoolId) -> Balance {
      Pools::<T>::get(pool).map_or(0, |info| info.total_supply)
    }

    pub fn shares_of(pool: PoolId, who: &T::AccountId) -> Balance {
      Shares::<T>::get(pool, who)
    }

    pub fn current_weight(pool: PoolId, asset: AssetId) -> Balance {
      Self::record(pool, asset).current_weight
    }

    pub fn desired_weight(pool: PoolId, asset: AssetId) -> Balance {
      Self::record(pool, asset).desired_weight
    }

    pub fn minimum_balance(pool: PoolId, asset: AssetId) -> Balance {
      MinimumBalances::<T>::get(pool, asset)
    }

    /// Balance the pool prices `asset` with: the tracked balance once ready, the minimum
    /// balance before
    pub fn used_balance(pool: PoolId, asset: AssetId) -> Result<Balance, DispatchError> {
      let record = Records::<T>::get(pool, asset).ok_or(Error::<T>::NotBound)?;
      Ok(Self::used_balance_of(pool, asset, &record))
    }

    /// Price of `asset_out` in units of `asset_in`, swap fee included
    pub fn spot_price(
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
    ) -> Result<Balance, DispatchError> {
      let info = Self::pool(pool)?;
      Self::spot_price_with_fee(pool, asset_in, asset_out, info.swap_fee)
    }

    pub fn spot_price_sans_fee(
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
    ) -> Result<Balance, DispatchError> {
      Self::spot_price_with_fee(pool, asset_in, asset_out, 0)
    }

    fn spot_price_with_fee(
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      swap_fee: Balance,
    ) -> Result<Balance, DispatchError> {
      let (in_record, _) = Self::input_record(pool, asset_in)?;
      let out_record = Self::output_record(pool, asset_out)?;
      Ok(calc_spot_price(
        in_record.balance,
        in_record.current_weight,
        out_record.balance,
        out_record.current_weight,
        swap_fee,
      )?)
    }

    /// Value of the whole pool in units of its first ready asset with a non-zero weight
    pub fn extrapolate_pool_value_from_token(
      pool: PoolId,
    ) -> Result<(AssetId, Balance), DispatchError> {
      let info = Self::pool(pool)?;
      for asset in PoolAssets::<T>::get(pool) {
        let record = Self::record(pool, asset);
        if record.ready && record.current_weight > 0 {
          let value = bmul(record.balance, bdiv(info.total_weight, record.current_weight)?)?;
          return Ok((asset, value));
        }
      }
      Err(Error::<T>::NoReadyAsset.into())
    }
  }
}

/// Reentrancy lock of a pool, released when dropped
pub struct PoolLock<T: Config> {
  pool: PoolId,
  _marker: PhantomData<T>,
}

impl<T: Config> PoolLock<T> {
  pub fn acquire(pool: PoolId) -> Result<Self, DispatchError> {
    ensure!(!PoolLocks::<T>::get(pool), Error::<T>::Reentrancy);
    PoolLocks::<T>::insert(pool, true);
    Ok(Self {
      pool,
      _marker: PhantomData,
    })
  }
}

impl<T: Config> Drop for PoolLock<T> {
  fn drop(&mut self) {
    PoolLocks::<T>::remove(self.pool);
  }
}

impl<T: Config> IndexPoolApi<T::AccountId> for Pallet<T> {
  fn create_pool(
    controller: &T::AccountId,
    name: Vec<u8>,
    symbol: Vec<u8>,
    swap_fee: Balance,
  ) -> Result<PoolId, DispatchError> {
    Self::do_create_pool(controller, name, symbol, swap_fee)
  }

  fn initialize(
    controller: &T::AccountId,
    pool: PoolId,
    assets: &[AssetId],
    balances: &[Balance],
    weights: &[Balance],
    provider: &T::AccountId,
  ) -> DispatchResult {
    Self::do_initialize(controller, pool, assets, balances, weights, provider)
  }

  fn controller(pool: PoolId) -> Option<T::AccountId> {
    Pools::<T>::get(pool).map(|info| info.controller)
  }

  fn pool_account(pool: PoolId) -> T::AccountId {
    Pallet::<T>::pool_account(pool)
  }

  fn set_swap_fee(controller: &T::AccountId, pool: PoolId, swap_fee: Balance) -> DispatchResult {
    Self::do_set_swap_fee(controller, pool, swap_fee)
  }

  fn set_public_swap(controller: &T::AccountId, pool: PoolId, enabled: bool) -> DispatchResult {
    Self::do_set_public_swap(controller, pool, enabled)
  }

  fn reweigh_tokens(
    controller: &T::AccountId,
    pool: PoolId,
    assets: &[AssetId],
    weights: &[Balance],
  ) -> DispatchResult {
    Self::do_reweigh_tokens(controller, pool, assets, weights)
  }

  fn reindex_tokens(
    controller: &T::AccountId,
    pool: PoolId,
    assets: &[AssetId],
    weights: &[Balance],
    minimum_balances: &[Balance],
  ) -> DispatchResult {
    Self::do_reindex_tokens(controller, pool, assets, weights, minimum_balances)
  }

  fn set_minimum_balance(
    controller: &T::AccountId,
    pool: PoolId,
    asset: AssetId,
    minimum_balance: Balance,
  ) -> DispatchResult {
    Self::do_set_minimum_balance(controller, pool, asset, minimum_balance)
  }

  fn current_tokens(pool: PoolId) -> Vec<AssetId> {
    Pallet::<T>::current_tokens(pool)
  }

  fn current_desired_tokens(pool: PoolId) -> Vec<AssetId> {
    Pallet::<T>::current_desired_tokens(pool)
  }

  fn desired_weight(pool: PoolId, asset: AssetId) -> Balance {
    Pallet::<T>::desired_weight(pool, asset)
  }

  fn is_bound(pool: PoolId, asset: AssetId) -> bool {
    Records::<T>::contains_key(pool, asset)
  }

  fn is_ready(pool: PoolId, asset: AssetId) -> bool {
    Self::record(pool, asset).ready
  }

  fn extrapolate_pool_value_from_token(pool: PoolId) -> Result<(AssetId, Balance), DispatchError> {
    Pallet::<T>::extrapolate_pool_value_from_token(pool)
  }

  fn gulp(pool: PoolId, asset: AssetId) -> DispatchResult {
    Self::do_gulp(pool, asset)
  }
}
