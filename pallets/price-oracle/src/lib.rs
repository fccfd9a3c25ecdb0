//! Price Oracle Pallet
//!
//! Time-weighted average prices of assets against a reference asset.
//!
//! The external venue keeps a running integral of each asset's price (see
//! [`CumulativePriceSource`]). This pallet stores samples of that integral; the average
//! price over an interval is the difference of two samples divided by the elapsed time.
//!
//! Every query names an [`ObservationWindow`]. The stored sample bracketing the interval
//! must be at least `min_age` old, which keeps a price moved for a single block from
//! dominating the average, and at most `max_age` old, which keeps the average current.
//! Samples are kept per observation period so that long windows still find a sample
//! after newer ones have been taken.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use alloc::vec::Vec;
use frame::prelude::*;
use frame::deps::frame_support::traits::UnixTime;
use primitives::{
  AssetId, Balance, Moment, ObservationWindow, PriceObservation, TwoWayAveragePrice, Uq112x112,
  traits::{CumulativePriceSource, PriceOracle},
};

const LOG_TARGET: &str = "runtime::price-oracle";

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper {
  /// Makes the price source report a price for `asset`
  fn register_price(asset: AssetId) -> DispatchResult;
}

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Venue reporting cumulative prices against the reference asset
    type PriceSource: CumulativePriceSource;

    /// Clock used for sample timestamps and window checks
    type UnixTime: UnixTime;

    /// Minimum time between two stored samples of the same asset
    #[pallet::constant]
    type MinUpdatePeriod: Get<Moment>;

    /// Length of the buckets historical samples are kept in
    #[pallet::constant]
    type ObservationPeriod: Get<Moment>;

    /// Maximum number of assets in one batch call
    #[pallet::constant]
    type MaxBatchSize: Get<u32>;

    /// Weight information
    type WeightInfo: WeightInfo;

    /// Helper for benchmarking
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper: crate::BenchmarkHelper;
  }

  #[pallet::pallet]
  #[pallet::storage_version(STORAGE_VERSION)]
  pub struct Pallet<T>(_);

  /// The current storage version.
  const STORAGE_VERSION: StorageVersion = StorageVersion::new(1);

  /// Most recent sample per asset
  #[pallet::storage]
  pub type LatestObservations<T: Config> =
    StorageMap<_, Blake2_128Concat, AssetId, PriceObservation, OptionQuery>;

  /// Samples per asset and observation period; a later sample in the same period replaces
  /// the earlier one
  #[pallet::storage]
  pub type Observations<T: Config> = StorageDoubleMap<
    _,
    Blake2_128Concat,
    AssetId,
    Twox64Concat,
    u64,
    PriceObservation,
    OptionQuery,
  >;

  /// Timestamp of the first sample ever taken per asset
  #[pallet::storage]
  pub type FirstObservedAt<T: Config> = StorageMap<_, Blake2_128Concat, AssetId, Moment, OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    /// A new price sample was stored
    PriceUpdated { asset: AssetId, timestamp: Moment },
  }

  #[pallet::error]
  pub enum Error<T> {
    /// The last sample of this asset is younger than the minimum update period
    ObservationTooFrequent,
    /// The asset has never been sampled
    NoPriceObservation,
    /// No sample is old enough for the requested window yet
    ObservationTooRecent,
    /// The youngest sample old enough for the window is older than its maximum age
    StaleObservation,
    /// Window minimum age exceeds its maximum age
    InvalidWindow,
    /// Batch exceeds the maximum batch size
    TooManyAssets,
    /// Batch inputs have different lengths
    ArrayLengthMismatch,
    /// Arithmetic overflow in price computation
    ArithmeticOverflow,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    /// Store a new price sample for `asset`
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::update_price())]
    pub fn update_price(origin: OriginFor<T>, asset: AssetId) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(
        Self::do_update_price(asset)?,
        Error::<T>::ObservationTooFrequent
      );
      Ok(())
    }

    /// Store a new price sample for every asset; fails as a whole if any asset fails
    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::update_prices(assets.len() as u32))]
    pub fn update_prices(origin: OriginFor<T>, assets: Vec<AssetId>) -> DispatchResult {
      ensure_signed(origin)?;
      ensure!(
        assets.len() as u32 <= T::MaxBatchSize::get(),
        Error::<T>::TooManyAssets
      );
      for asset in assets {
        ensure!(
          Self::do_update_price(asset)?,
          Error::<T>::ObservationTooFrequent
        );
      }
      Ok(())
    }
  }

  impl<T: Config> Pallet<T> {
    /// Current time in seconds
    pub fn now() -> Moment {
      T::UnixTime::now().as_secs()
    }

    /// Latest stored sample of `asset`
    pub fn latest_observation(asset: AssetId) -> Option<PriceObservation> {
      LatestObservations::<T>::get(asset)
    }

    /// Whether a new sample of `asset` may be stored now
    pub fn can_update_price(asset: AssetId) -> bool {
      match LatestObservations::<T>::get(asset) {
        Some(last) => Self::now().saturating_sub(last.timestamp) >= T::MinUpdatePeriod::get(),
        None => true,
      }
    }

    /// Sample the venue as of now without storing anything
    pub fn current_observation(asset: AssetId) -> Result<PriceObservation, DispatchError> {
      let (price_cumulative, reference_price_cumulative) =
        T::PriceSource::current_cumulative_prices(asset)?;
      Ok(PriceObservation {
        timestamp: Self::now(),
        price_cumulative,
        reference_price_cumulative,
      })
    }

    /// Store a fresh sample unless the last one is younger than the minimum update period
    pub fn do_update_price(asset: AssetId) -> Result<bool, DispatchError> {
      if !Self::can_update_price(asset) {
        return Ok(false);
      }
      let observation = Self::current_observation(asset)?;
      let period = observation.timestamp / T::ObservationPeriod::get().max(1);

      LatestObservations::<T>::insert(asset, observation);
      Observations::<T>::insert(asset, period, observation);
      if !FirstObservedAt::<T>::contains_key(asset) {
        FirstObservedAt::<T>::insert(asset, observation.timestamp);
      }

      log::debug!(
        target: LOG_TARGET,
        "stored price sample for asset {} at {}",
        asset,
        observation.timestamp
      );
      Self::deposit_event(Event::PriceUpdated {
        asset,
        timestamp: observation.timestamp,
      });
      Ok(true)
    }

    /// The most recent stored sample of `asset` whose age lies within `window`
    pub fn observation_in_window(
      asset: AssetId,
      window: ObservationWindow,
    ) -> Result<PriceObservation, DispatchError> {
      ensure!(window.min_age <= window.max_age, Error::<T>::InvalidWindow);
      let latest = LatestObservations::<T>::get(asset).ok_or(Error::<T>::NoPriceObservation)?;

      let now = Self::now();
      // a zero-length interval has no average
      let newest_allowed = now.saturating_sub(window.min_age.max(1));
      let oldest_allowed = now.saturating_sub(window.max_age);

      if latest.timestamp <= newest_allowed {
        ensure!(
          latest.timestamp >= oldest_allowed,
          Error::<T>::StaleObservation
        );
        return Ok(latest);
      }

      let period = T::ObservationPeriod::get().max(1);
      let first = oldest_allowed / period;
      let mut bucket = newest_allowed / period;
      loop {
        if let Some(observation) = Observations::<T>::get(asset, bucket) {
          if observation.timestamp <= newest_allowed {
            ensure!(
              observation.timestamp >= oldest_allowed,
              Error::<T>::StaleObservation
            );
            return Ok(observation);
          }
        }
        if bucket <= first {
          break;
        }
        bucket -= 1;
      }

      match FirstObservedAt::<T>::get(asset) {
        Some(first_seen) if first_seen <= newest_allowed => Err(Error::<T>::StaleObservation.into()),
        _ => Err(Error::<T>::ObservationTooRecent.into()),
      }
    }

    /// Average prices of `asset` in both directions over the interval ending now
    pub fn compute_two_way_average_price(
      asset: AssetId,
      window: ObservationWindow,
    ) -> Result<TwoWayAveragePrice, DispatchError> {
      let older = Self::observation_in_window(asset, window)?;
      let current = Self::current_observation(asset)?;
      current
        .average_since(&older)
        .map_err(|_| Error::<T>::ArithmeticOverflow.into())
    }

    /// Average price of one unit of `asset` in reference units
    pub fn compute_average_price(
      asset: AssetId,
      window: ObservationWindow,
    ) -> Result<Uq112x112, DispatchError> {
      Ok(Self::compute_two_way_average_price(asset, window)?.price_average)
    }

    /// Average reference-asset value of `amount` units of `asset`
    pub fn compute_average_value(
      asset: AssetId,
      amount: Balance,
      window: ObservationWindow,
    ) -> Result<Balance, DispatchError> {
      Self::compute_two_way_average_price(asset, window)?
        .reference_for_assets(amount)
        .map_err(|_| Error::<T>::ArithmeticOverflow.into())
    }

    /// Average number of `asset` units worth `value` reference units
    pub fn compute_average_assets_for_value(
      asset: AssetId,
      value: Balance,
      window: ObservationWindow,
    ) -> Result<Balance, DispatchError> {
      Self::compute_two_way_average_price(asset, window)?
        .assets_for_reference(value)
        .map_err(|_| Error::<T>::ArithmeticOverflow.into())
    }

    pub fn compute_two_way_average_prices(
      assets: &[AssetId],
      window: ObservationWindow,
    ) -> Result<Vec<TwoWayAveragePrice>, DispatchError> {
      assets
        .iter()
        .map(|asset| Self::compute_two_way_average_price(*asset, window))
        .collect()
    }

    pub fn compute_average_prices(
      assets: &[AssetId],
      window: ObservationWindow,
    ) -> Result<Vec<Uq112x112>, DispatchError> {
      assets
        .iter()
        .map(|asset| Self::compute_average_price(*asset, window))
        .collect()
    }

    pub fn compute_average_values(
      assets: &[AssetId],
      amounts: &[Balance],
      window: ObservationWindow,
    ) -> Result<Vec<Balance>, DispatchError> {
      ensure!(
        assets.len() == amounts.len(),
        Error::<T>::ArrayLengthMismatch
      );
      assets
        .iter()
        .zip(amounts)
        .map(|(asset, amount)| Self::compute_average_value(*asset, *amount, window))
        .collect()
    }
  }
}

impl<T: Config> PriceOracle for Pallet<T> {
  fn try_update_price(asset: AssetId) -> Result<bool, DispatchError> {
    Self::do_update_price(asset)
  }

  fn compute_two_way_average_price(
    asset: AssetId,
    window: ObservationWindow,
  ) -> Result<TwoWayAveragePrice, DispatchError> {
    Pallet::<T>::compute_two_way_average_price(asset, window)
  }
}
