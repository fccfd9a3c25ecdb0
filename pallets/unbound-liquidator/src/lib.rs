//! Unbound Asset Liquidator Pallet
//!
//! Receives the balances of assets a weighted pool unbinds and sells them for assets the pool
//! still wants.
//!
//! Holdings are accounted per pool. They are sold in two ways:
//!
//! - Directly to any caller, who hands in a desired asset of the pool and is paid in the held
//!   asset at the oracle's short-window average price plus a premium.
//! - Through the external [`SwapVenue`]: the caller triggers a purchase of a desired asset with
//!   held funds, the pallet spends at most the oracle value plus the premium, and whatever
//!   the venue leaves of that allowance is paid to the caller.
//!
//! Purchased assets are sent to the pool and absorbed with `gulp`. The premium of each pool is
//! set by its controller.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use core::marker::PhantomData;
use frame::deps::{
  frame_support::{
    PalletId,
    traits::{
      fungibles::{Inspect, Mutate},
      tokens::Preservation,
    },
  },
  sp_runtime::{ArithmeticError, Percent, traits::AccountIdConversion},
};
use frame::prelude::*;
use primitives::{
  AssetId, Balance, ObservationWindow, PoolId,
  traits::{IndexPoolApi, LiquidatorApi, PriceOracle, SwapVenue, UnboundAssetHandler},
};

const LOG_TARGET: &str = "runtime::unbound-liquidator";

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId> {
  /// Pool controlled by `controller` whose desired assets include `desired`
  fn create_pool(controller: &AccountId, desired: AssetId) -> Result<PoolId, DispatchError>;
  fn fund_account(who: &AccountId, asset: AssetId, amount: Balance) -> DispatchResult;
}

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset management interface for held and purchased assets
    type Assets: Inspect<Self::AccountId, AssetId = AssetId, Balance = Balance>
      + Mutate<Self::AccountId, AssetId = AssetId, Balance = Balance>;

    /// Pallet ID the holding account is derived from
    #[pallet::constant]
    type PalletId: Get<PalletId>;

    /// Pools whose unbound assets are sold
    type Pools: IndexPoolApi<Self::AccountId>;

    /// Fair value of held and desired assets
    type PriceOracle: PriceOracle;

    /// Venue for sales triggered through `execute_swap_via_venue`
    type Venue: SwapVenue<Self::AccountId>;

    /// Oracle window sale prices are averaged over
    #[pallet::constant]
    type PriceWindow: Get<ObservationWindow>;

    /// Premium, in percent, of pools whose controller never set one
    #[pallet::constant]
    type DefaultPremium: Get<u8>;

    /// Largest premium, in percent, a controller may set
    #[pallet::constant]
    type MaxPremium: Get<u8>;

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

  /// Unsold balance of each asset a pool unbound
  #[pallet::storage]
  pub type Holdings<T: Config> =
    StorageDoubleMap<_, Twox64Concat, PoolId, Blake2_128Concat, AssetId, Balance, ValueQuery>;

  /// Premium set by the pool's controller
  #[pallet::storage]
  pub type Premiums<T: Config> = StorageMap<_, Twox64Concat, PoolId, u8, OptionQuery>;

  /// Pools with a sale in progress
  #[pallet::storage]
  pub type SaleLocks<T: Config> = StorageMap<_, Twox64Concat, PoolId, bool, ValueQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A pool handed over the balance of an unbound asset
    AssetReceived {
      pool: PoolId,
      asset: AssetId,
      amount: Balance,
    },
    PremiumSet {
      pool: PoolId,
      premium: u8,
    },
    /// A caller bought held `asset_out` with desired `asset_in`
    Swapped {
      pool: PoolId,
      who: T::AccountId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_in: Balance,
      amount_out: Balance,
    },
    /// Held `asset_sold` was sold on the venue for desired `asset_bought`
    SoldViaVenue {
      pool: PoolId,
      who: T::AccountId,
      asset_sold: AssetId,
      asset_bought: AssetId,
      amount_sold: Balance,
      amount_bought: Balance,
      incentive: Balance,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    PoolNotFound,
    /// Caller is not the pool controller
    NotController,
    /// Premium outside `1..=MaxPremium`
    InvalidPremium,
    /// The pool does not want the asset offered or bought
    TokenNotDesired,
    /// Not enough of the asset is held for the pool
    InsufficientHoldings,
    IdenticalAssets,
    ZeroAmount,
    BelowMinimumOutput,
    AboveMaximumInput,
    /// The venue asks more than the oracle value plus the premium
    VenuePriceTooHigh,
    /// A sale for the pool is already in progress
    Reentrancy,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Pay exactly `amount_in` of a desired asset into the pool for held `asset_out`
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::swap_exact_tokens_for_tokens())]
    pub fn swap_exact_tokens_for_tokens(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_in: Balance,
      min_amount_out: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_swap_exact_tokens_for_tokens(
        &who,
        pool,
        asset_in,
        asset_out,
        amount_in,
        min_amount_out,
      )?;
      Ok(())
    }

    /// Receive exactly `amount_out` of held `asset_out` for a desired asset paid into the pool
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::swap_tokens_for_exact_tokens())]
    pub fn swap_tokens_for_exact_tokens(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_out: Balance,
      max_amount_in: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_swap_tokens_for_exact_tokens(
        &who,
        pool,
        asset_in,
        asset_out,
        amount_out,
        max_amount_in,
      )?;
      Ok(())
    }

    /// Buy exactly `amount_out` of desired `asset_out` on the venue with held `asset_in`
    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::execute_swap_via_venue())]
    pub fn execute_swap_via_venue(
      origin: OriginFor<T>,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_out: Balance,
    ) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_execute_swap_via_venue(&who, pool, asset_in, asset_out, amount_out)?;
      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::set_premium())]
    pub fn set_premium(origin: OriginFor<T>, pool: PoolId, premium: u8) -> DispatchResult {
      let who = ensure_signed(origin)?;
      Self::do_set_premium(&who, pool, premium)
    }
  }

  impl<T: Config> Pallet<T> {
    /// Account holding the unbound assets of every pool
    pub fn account_id() -> T::AccountId {
      T::PalletId::get().into_account_truncating()
    }

    pub fn held_balance(pool: PoolId, asset: AssetId) -> Balance {
      Holdings::<T>::get(pool, asset)
    }

    pub fn premium_percent(pool: PoolId) -> u8 {
      Premiums::<T>::get(pool).unwrap_or_else(T::DefaultPremium::get)
    }

    /// Held `asset_out` paid for `amount_in` of desired `asset_in`, premium included
    pub fn calc_out_given_in(
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_in: Balance,
    ) -> Result<Balance, DispatchError> {
      let fair_out = Self::fair_exchange(asset_in, asset_out, amount_in)?;
      let bonus = Percent::from_percent(Self::premium_percent(pool)).mul_floor(fair_out);
      Ok(fair_out.checked_add(bonus).ok_or(ArithmeticError::Overflow)?)
    }

    /// Desired `asset_in` asked for `amount_out` of held `asset_out`, premium included
    pub fn calc_in_given_out(
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_out: Balance,
    ) -> Result<Balance, DispatchError> {
      let fair_in = Self::fair_exchange(asset_out, asset_in, amount_out)?;
      let discount = 100u8.saturating_sub(Self::premium_percent(pool));
      Ok(Percent::from_percent(discount).mul_floor(fair_in))
    }

    /// Units of `asset_to` worth `amount` of `asset_from` at the average prices
    fn fair_exchange(
      asset_from: AssetId,
      asset_to: AssetId,
      amount: Balance,
    ) -> Result<Balance, DispatchError> {
      let window = T::PriceWindow::get();
      let value = T::PriceOracle::compute_average_reference_for_assets(asset_from, amount, window)?;
      T::PriceOracle::compute_average_assets_for_reference(asset_to, value, window)
    }

    fn ensure_pool(pool: PoolId) -> DispatchResult {
      ensure!(T::Pools::controller(pool).is_some(), Error::<T>::PoolNotFound);
      Ok(())
    }

    /// Checks shared by every sale of held `asset_held` for desired `asset_desired`
    fn ensure_sale(pool: PoolId, asset_desired: AssetId, asset_held: AssetId) -> DispatchResult {
      Self::ensure_pool(pool)?;
      ensure!(asset_desired != asset_held, Error::<T>::IdenticalAssets);
      ensure!(
        T::Pools::desired_weight(pool, asset_desired) > 0,
        Error::<T>::TokenNotDesired
      );
      Ok(())
    }

    fn take_holdings(pool: PoolId, asset: AssetId, amount: Balance) -> DispatchResult {
      Holdings::<T>::try_mutate(pool, asset, |held| -> DispatchResult {
        *held = held
          .checked_sub(amount)
          .ok_or(Error::<T>::InsufficientHoldings)?;
        Ok(())
      })
    }

    /// Moves `amount_in` of desired `asset_in` from `who` into the pool and pays `amount_out`
    /// of held `asset_out`
    fn settle_swap(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_in: Balance,
      amount_out: Balance,
    ) -> DispatchResult {
      Self::take_holdings(pool, asset_out, amount_out)?;
      T::Assets::transfer(
        asset_in,
        who,
        &T::Pools::pool_account(pool),
        amount_in,
        Preservation::Expendable,
      )?;
      T::Pools::gulp(pool, asset_in)?;
      T::Assets::transfer(
        asset_out,
        &Self::account_id(),
        who,
        amount_out,
        Preservation::Expendable,
      )?;

      Self::deposit_event(Event::Swapped {
        pool,
        who: who.clone(),
        asset_in,
        asset_out,
        amount_in,
        amount_out,
      });
      Ok(())
    }

    pub fn do_swap_exact_tokens_for_tokens(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_in: Balance,
      min_amount_out: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = SaleLock::<T>::acquire(pool)?;
      ensure!(amount_in > 0, Error::<T>::ZeroAmount);
      Self::ensure_sale(pool, asset_in, asset_out)?;

      let amount_out = Self::calc_out_given_in(pool, asset_in, asset_out, amount_in)?;
      ensure!(amount_out > 0, Error::<T>::ZeroAmount);
      ensure!(amount_out >= min_amount_out, Error::<T>::BelowMinimumOutput);

      Self::settle_swap(who, pool, asset_in, asset_out, amount_in, amount_out)?;
      Ok(amount_out)
    }

    pub fn do_swap_tokens_for_exact_tokens(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_out: Balance,
      max_amount_in: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = SaleLock::<T>::acquire(pool)?;
      ensure!(amount_out > 0, Error::<T>::ZeroAmount);
      Self::ensure_sale(pool, asset_in, asset_out)?;

      let amount_in = Self::calc_in_given_out(pool, asset_in, asset_out, amount_out)?;
      ensure!(amount_in > 0, Error::<T>::ZeroAmount);
      ensure!(amount_in <= max_amount_in, Error::<T>::AboveMaximumInput);

      Self::settle_swap(who, pool, asset_in, asset_out, amount_in, amount_out)?;
      Ok(amount_in)
    }

    /// Returns the incentive paid to `who` in `asset_in`
    pub fn do_execute_swap_via_venue(
      who: &T::AccountId,
      pool: PoolId,
      asset_in: AssetId,
      asset_out: AssetId,
      amount_out: Balance,
    ) -> Result<Balance, DispatchError> {
      let _lock = SaleLock::<T>::acquire(pool)?;
      ensure!(amount_out > 0, Error::<T>::ZeroAmount);
      Self::ensure_sale(pool, asset_out, asset_in)?;

      let fair_in = Self::fair_exchange(asset_out, asset_in, amount_out)?;
      let premium = Percent::from_percent(Self::premium_percent(pool)).mul_floor(fair_in);
      let max_amount_in = fair_in.checked_add(premium).ok_or(ArithmeticError::Overflow)?;
      Self::take_holdings(pool, asset_in, max_amount_in)?;

      let quote = T::Venue::quote_exact_out(asset_in, asset_out, amount_out)?;
      if quote > max_amount_in {
        log::warn!(
          target: LOG_TARGET,
          "venue asks {} of asset {} for pool {}, allowance is {}",
          quote,
          asset_in,
          pool,
          max_amount_in
        );
        return Err(Error::<T>::VenuePriceTooHigh.into());
      }

      let account = Self::account_id();
      let spent =
        T::Venue::swap_tokens_for_exact_tokens(&account, asset_in, asset_out, amount_out, max_amount_in)?;
      let incentive = max_amount_in
        .checked_sub(spent)
        .ok_or(Error::<T>::VenuePriceTooHigh)?;

      T::Assets::transfer(
        asset_out,
        &account,
        &T::Pools::pool_account(pool),
        amount_out,
        Preservation::Expendable,
      )?;
      T::Pools::gulp(pool, asset_out)?;
      if incentive > 0 {
        T::Assets::transfer(asset_in, &account, who, incentive, Preservation::Expendable)?;
      }

      log::debug!(
        target: LOG_TARGET,
        "pool {} sold {} of asset {} for {} of asset {}, incentive {}",
        pool,
        spent,
        asset_in,
        amount_out,
        asset_out,
        incentive
      );
      Self::deposit_event(Event::SoldViaVenue {
        pool,
        who: who.clone(),
        asset_sold: asset_in,
        asset_bought: asset_out,
        amount_sold: spent,
        amount_bought: amount_out,
        incentive,
      });
      Ok(incentive)
    }

    pub fn do_set_premium(controller: &T::AccountId, pool: PoolId, premium: u8) -> DispatchResult {
      let owner = T::Pools::controller(pool).ok_or(Error::<T>::PoolNotFound)?;
      ensure!(owner == *controller, Error::<T>::NotController);
      ensure!(
        premium >= 1 && premium <= T::MaxPremium::get(),
        Error::<T>::InvalidPremium
      );
      Premiums::<T>::insert(pool, premium);
      Self::deposit_event(Event::PremiumSet { pool, premium });
      Ok(())
    }
  }
}

/// Sale lock of a pool, released when dropped
pub struct SaleLock<T: Config> {
  pool: PoolId,
  _marker: PhantomData<T>,
}

impl<T: Config> SaleLock<T> {
  pub fn acquire(pool: PoolId) -> Result<Self, DispatchError> {
    ensure!(!SaleLocks::<T>::get(pool), Error::<T>::Reentrancy);
    SaleLocks::<T>::insert(pool, true);
    Ok(Self {
      pool,
      _marker: PhantomData,
    })
  }
}

impl<T: Config> Drop for SaleLock<T> {
  fn drop(&mut self) {
    SaleLocks::<T>::remove(self.pool);
  }
}

impl<T: Config> UnboundAssetHandler<T::AccountId> for Pallet<T> {
  fn handler_account() -> T::AccountId {
    Self::account_id()
  }

  fn on_unbind(pool: PoolId, asset: AssetId, amount: Balance) -> DispatchResult {
    Holdings::<T>::try_mutate(pool, asset, |held| -> DispatchResult {
      *held = held.checked_add(amount).ok_or(ArithmeticError::Overflow)?;
      Ok(())
    })?;
    log::debug!(
      target: LOG_TARGET,
      "received {} of unbound asset {} from pool {}",
      amount,
      asset,
      pool
    );
    Self::deposit_event(Event::AssetReceived {
      pool,
      asset,
      amount,
    });
    Ok(())
  }
}

impl<T: Config> LiquidatorApi<T::AccountId> for Pallet<T> {
  fn set_premium_percent(controller: &T::AccountId, pool: PoolId, premium: u8) -> DispatchResult {
    Self::do_set_premium(controller, pool, premium)
  }
}
