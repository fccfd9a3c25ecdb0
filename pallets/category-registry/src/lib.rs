//! Category Registry Pallet
//!
//! Curated groups of assets kept in descending market-cap order.
//!
//! The admin origin creates categories and manages their members. Ranking is permissionless:
//! anyone may sort a category, either by handing in a complete order that the pallet verifies
//! or by letting the pallet sort on its own. The market cap of an asset is its total issuance
//! valued at the oracle's long-window average price.
//!
//! [`Pallet::top_assets`] only answers while the last sort is younger than `MaxSortDelay`, and
//! any membership change invalidates the sort until the category is sorted again.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use pallet::*;

#[cfg(test)]
mod mock;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;
pub use weights::WeightInfo;

use alloc::{collections::BTreeSet, vec::Vec};
use frame::deps::{
  frame_support::traits::{UnixTime, fungibles::Inspect},
  sp_runtime::ArithmeticError,
};
use frame::prelude::*;
use polkadot_sdk::sp_core::H256;
use primitives::{
  AssetId, Balance, CategoryId, Moment, ObservationWindow,
  traits::{CategoryRanking, PriceOracle},
};

const LOG_TARGET: &str = "runtime::category-registry";

/// Helper for benchmarking
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper {
  /// Issues `supply` of `asset` and makes the oracle price it at `price` reference units
  fn register_asset(asset: AssetId, supply: Balance, price: u128) -> DispatchResult;
}

/// Registry entry of a category
#[derive(Encode, Decode, Clone, PartialEq, Eq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct CategoryInfo {
  /// Hash of the off-chain description
  pub metadata_hash: H256,
  /// Time of the last sort; `None` until sorted or after a membership change
  pub last_sorted_at: Option<Moment>,
}

#[frame::pallet]
pub mod pallet {
  use super::*;

  #[pallet::config]
  pub trait Config: frame_system::Config {
    /// Asset supplies for market caps
    type Assets: Inspect<Self::AccountId, AssetId = AssetId, Balance = Balance>;

    /// Price source for market caps
    type PriceOracle: PriceOracle;

    type UnixTime: UnixTime;

    /// Origin allowed to create categories and manage their members
    type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

    #[pallet::constant]
    type MaxCategoryAssets: Get<u32>;

    /// Age after which a sort no longer answers top-asset queries
    #[pallet::constant]
    type MaxSortDelay: Get<Moment>;

    /// Oracle window market caps are averaged over
    #[pallet::constant]
    type MarketCapWindow: Get<ObservationWindow>;

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

  #[pallet::storage]
  pub type NextCategoryId<T: Config> = StorageValue<_, CategoryId, ValueQuery>;

  #[pallet::storage]
  pub type Categories<T: Config> =
    StorageMap<_, Twox64Concat, CategoryId, CategoryInfo, OptionQuery>;

  /// Members of each category, largest market cap first as of the last sort
  #[pallet::storage]
  pub type CategoryAssets<T: Config> = StorageMap<
    _,
    Twox64Concat,
    CategoryId,
    BoundedVec<AssetId, T::MaxCategoryAssets>,
    ValueQuery,
  >;

  #[pallet::storage]
  pub type Members<T: Config> =
    StorageDoubleMap<_, Twox64Concat, CategoryId, Blake2_128Concat, AssetId, (), OptionQuery>;

  #[pallet::event]
  #[pallet::generate_deposit(pub(super) fn deposit_event)]
  pub enum Event<T: Config> {
    CategoryCreated {
      category: CategoryId,
      metadata_hash: H256,
    },
    AssetAdded {
      category: CategoryId,
      asset: AssetId,
    },
    AssetRemoved {
      category: CategoryId,
      asset: AssetId,
    },
    /// Members reordered by market cap
    CategorySorted {
      category: CategoryId,
      timestamp: Moment,
    },
  }

  #[pallet::error]
  pub enum Error<T> {
    CategoryNotFound,
    /// The category already holds `MaxCategoryAssets` members
    CategoryFull,
    /// The asset is already a member of the category
    AlreadyBound,
    NotMember,
    /// The category was never sorted, or not within `MaxSortDelay`
    CategoryNotReady,
    /// Fewer members than requested
    InsufficientMembers,
    /// Proposed order is not a permutation of the members
    InvalidOrder,
    /// Market caps increase somewhere along the proposed order
    NotSortedByMarketCap,
  }

  #[pallet::call]
  impl<T: Config> Pallet<T> {
    #[pallet::call_index(0)]
    #[pallet::weight(T::WeightInfo::create_category())]
    pub fn create_category(origin: OriginFor<T>, metadata_hash: H256) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::do_create_category(metadata_hash)?;
      Ok(())
    }

    #[pallet::call_index(1)]
    #[pallet::weight(T::WeightInfo::add_asset())]
    pub fn add_asset(origin: OriginFor<T>, category: CategoryId, asset: AssetId) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::do_add_asset(category, asset)
    }

    #[pallet::call_index(2)]
    #[pallet::weight(T::WeightInfo::add_assets(assets.len() as u32))]
    pub fn add_assets(
      origin: OriginFor<T>,
      category: CategoryId,
      assets: Vec<AssetId>,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      for asset in assets {
        Self::do_add_asset(category, asset)?;
      }
      Ok(())
    }

    #[pallet::call_index(3)]
    #[pallet::weight(T::WeightInfo::remove_asset())]
    pub fn remove_asset(
      origin: OriginFor<T>,
      category: CategoryId,
      asset: AssetId,
    ) -> DispatchResult {
      T::AdminOrigin::ensure_origin(origin)?;
      Self::do_remove_asset(category, asset)
    }

    /// Store `order` as the ranking after checking it against current market caps
    #[pallet::call_index(4)]
    #[pallet::weight(T::WeightInfo::order_by_market_cap(order.len() as u32))]
    pub fn order_by_market_cap(
      origin: OriginFor<T>,
      category: CategoryId,
      order: Vec<AssetId>,
    ) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_order_by_market_cap(category, order)
    }

    /// Rank the members by their current market caps
    #[pallet::call_index(5)]
    #[pallet::weight(T::WeightInfo::sort_by_market_cap(T::MaxCategoryAssets::get()))]
    pub fn sort_by_market_cap(origin: OriginFor<T>, category: CategoryId) -> DispatchResult {
      ensure_signed(origin)?;
      Self::do_sort_by_market_cap(category)
    }
  }

  impl<T: Config> Pallet<T> {
    pub fn now() -> Moment {
      T::UnixTime::now().as_secs()
    }

    pub fn category(category: CategoryId) -> Option<CategoryInfo> {
      Categories::<T>::get(category)
    }

    pub fn has_category(category: CategoryId) -> bool {
      Categories::<T>::contains_key(category)
    }

    pub fn category_assets(category: CategoryId) -> Vec<AssetId> {
      CategoryAssets::<T>::get(category).into_inner()
    }

    pub fn is_member(category: CategoryId, asset: AssetId) -> bool {
      Members::<T>::contains_key(category, asset)
    }

    fn ensure_category(category: CategoryId) -> Result<CategoryInfo, DispatchError> {
      Categories::<T>::get(category).ok_or(Error::<T>::CategoryNotFound.into())
    }

    fn invalidate_sort(category: CategoryId, mut info: CategoryInfo) {
      info.last_sorted_at = None;
      Categories::<T>::insert(category, info);
    }

    pub fn do_create_category(metadata_hash: H256) -> Result<CategoryId, DispatchError> {
      let category = NextCategoryId::<T>::get();
      NextCategoryId::<T>::put(category.checked_add(1).ok_or(ArithmeticError::Overflow)?);
      Categories::<T>::insert(
        category,
        CategoryInfo {
          metadata_hash,
          last_sorted_at: None,
        },
      );
      log::debug!(target: LOG_TARGET, "created category {}", category);
      Self::deposit_event(Event::CategoryCreated {
        category,
        metadata_hash,
      });
      Ok(category)
    }

    pub fn do_add_asset(category: CategoryId, asset: AssetId) -> DispatchResult {
      let info = Self::ensure_category(category)?;
      ensure!(
        !Members::<T>::contains_key(category, asset),
        Error::<T>::AlreadyBound
      );
      CategoryAssets::<T>::try_mutate(category, |assets| {
        assets.try_push(asset).map_err(|_| Error::<T>::CategoryFull)
      })?;
      Members::<T>::insert(category, asset, ());
      if !T::PriceOracle::try_update_price(asset)? {
        log::debug!(target: LOG_TARGET, "asset {} was sampled recently", asset);
      }
      Self::invalidate_sort(category, info);

      Self::deposit_event(Event::AssetAdded { category, asset });
      Ok(())
    }

    pub fn do_remove_asset(category: CategoryId, asset: AssetId) -> DispatchResult {
      let info = Self::ensure_category(category)?;
      ensure!(
        Members::<T>::take(category, asset).is_some(),
        Error::<T>::NotMember
      );
      CategoryAssets::<T>::mutate(category, |assets| {
        if let Some(position) = assets.iter().position(|member| *member == asset) {
          assets.swap_remove(position);
        }
      });
      Self::invalidate_sort(category, info);

      Self::deposit_event(Event::AssetRemoved { category, asset });
      Ok(())
    }

    pub fn do_order_by_market_cap(category: CategoryId, order: Vec<AssetId>) -> DispatchResult {
      let mut info = Self::ensure_category(category)?;
      let members = CategoryAssets::<T>::get(category);
      ensure!(order.len() == members.len(), Error::<T>::InvalidOrder);
      let mut seen = BTreeSet::new();
      for asset in &order {
        ensure!(
          Members::<T>::contains_key(category, asset) && seen.insert(*asset),
          Error::<T>::InvalidOrder
        );
      }

      let caps = Self::compute_average_market_caps(&order)?;
      ensure!(
        caps.windows(2).all(|pair| pair[0] >= pair[1]),
        Error::<T>::NotSortedByMarketCap
      );

      let order: BoundedVec<AssetId, T::MaxCategoryAssets> =
        order.try_into().map_err(|_| Error::<T>::InvalidOrder)?;
      CategoryAssets::<T>::insert(category, order);
      Self::mark_sorted(category, &mut info);
      Ok(())
    }

    pub fn do_sort_by_market_cap(category: CategoryId) -> DispatchResult {
      let mut info = Self::ensure_category(category)?;
      let mut assets = CategoryAssets::<T>::get(category).into_inner();
      let mut caps = Self::compute_average_market_caps(&assets)?;

      // insertion sort, descending; equal caps keep their order
      for i in 1..assets.len() {
        let (asset, cap) = (assets[i], caps[i]);
        let mut j = i;
        while j > 0 && caps[j - 1] < cap {
          assets[j] = assets[j - 1];
          caps[j] = caps[j - 1];
          j -= 1;
        }
        assets[j] = asset;
        caps[j] = cap;
      }

      let assets: BoundedVec<AssetId, T::MaxCategoryAssets> =
        assets.try_into().map_err(|_| Error::<T>::CategoryFull)?;
      CategoryAssets::<T>::insert(category, assets);
      Self::mark_sorted(category, &mut info);
      Ok(())
    }

    fn mark_sorted(category: CategoryId, info: &mut CategoryInfo) {
      let now = Self::now();
      info.last_sorted_at = Some(now);
      Categories::<T>::insert(category, &*info);
      log::debug!(target: LOG_TARGET, "sorted category {} at {}", category, now);
      Self::deposit_event(Event::CategorySorted {
        category,
        timestamp: now,
      });
    }

    /// The `n` members with the largest market caps, largest first
    pub fn top_assets(category: CategoryId, n: u32) -> Result<Vec<AssetId>, DispatchError> {
      let info = Self::ensure_category(category)?;
      let sorted_at = info.last_sorted_at.ok_or(Error::<T>::CategoryNotReady)?;
      ensure!(
        Self::now().saturating_sub(sorted_at) <= T::MaxSortDelay::get(),
        Error::<T>::CategoryNotReady
      );
      let assets = CategoryAssets::<T>::get(category);
      ensure!(
        n as usize <= assets.len(),
        Error::<T>::InsufficientMembers
      );
      Ok(assets.into_iter().take(n as usize).collect())
    }

    /// Total issuance of each asset valued at its long-window average price
    pub fn compute_average_market_caps(assets: &[AssetId]) -> Result<Vec<Balance>, DispatchError> {
      let window = T::MarketCapWindow::get();
      assets
        .iter()
        .map(|asset| {
          T::PriceOracle::compute_average_reference_for_assets(
            *asset,
            T::Assets::total_issuance(*asset),
            window,
          )
        })
        .collect()
    }
  }
}

impl<T: Config> CategoryRanking for Pallet<T> {
  fn has_category(category: CategoryId) -> bool {
    Pallet::<T>::has_category(category)
  }

  fn top_assets(category: CategoryId, n: u32) -> Result<Vec<AssetId>, DispatchError> {
    Pallet::<T>::top_assets(category, n)
  }

  fn compute_average_market_caps(assets: &[AssetId]) -> Result<Vec<Balance>, DispatchError> {
    Pallet::<T>::compute_average_market_caps(assets)
  }
}
