extern crate alloc;

use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;

const SUPPLY: Balance = 1_000_000;

/// Assets `1..=n`, priced so that later ids carry larger market caps
fn register<T: Config>(n: u32) -> Vec<AssetId> {
  (1..=n)
    .map(|asset| {
      T::BenchmarkHelper::register_asset(asset, SUPPLY, asset as u128)
        .expect("Failed to register asset");
      asset
    })
    .collect()
}

fn category_with<T: Config>(n: u32) -> (CategoryId, Vec<AssetId>) {
  let assets = register::<T>(n);
  let category =
    Pallet::<T>::do_create_category(H256::repeat_byte(1)).expect("Failed to create category");
  for asset in &assets {
    Pallet::<T>::do_add_asset(category, *asset).expect("Failed to add asset");
  }
  (category, assets)
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn create_category() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    create_category(origin as T::RuntimeOrigin, H256::repeat_byte(1));

    assert!(Pallet::<T>::has_category(0));
    Ok(())
  }

  #[benchmark]
  fn add_asset() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let (category, _) = category_with::<T>(T::MaxCategoryAssets::get() - 1);
    let asset = T::MaxCategoryAssets::get();
    register::<T>(asset);

    #[extrinsic_call]
    add_asset(origin as T::RuntimeOrigin, category, asset);

    assert!(Pallet::<T>::is_member(category, asset));
    Ok(())
  }

  #[benchmark]
  fn add_assets(n: Linear<1, { T::MaxCategoryAssets::get() }>) -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let assets = register::<T>(n);
    let category =
      Pallet::<T>::do_create_category(H256::repeat_byte(1)).expect("Failed to create category");

    #[extrinsic_call]
    add_assets(origin as T::RuntimeOrigin, category, assets);

    assert_eq!(Pallet::<T>::category_assets(category).len(), n as usize);
    Ok(())
  }

  #[benchmark]
  fn remove_asset() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let (category, _) = category_with::<T>(T::MaxCategoryAssets::get());

    #[extrinsic_call]
    remove_asset(origin as T::RuntimeOrigin, category, 1);

    assert!(!Pallet::<T>::is_member(category, 1));
    Ok(())
  }

  #[benchmark]
  fn order_by_market_cap(n: Linear<1, { T::MaxCategoryAssets::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (category, mut assets) = category_with::<T>(n);
    assets.reverse();

    #[extrinsic_call]
    order_by_market_cap(RawOrigin::Signed(caller), category, assets.clone());

    assert_eq!(Pallet::<T>::top_assets(category, n), Ok(assets));
  }

  #[benchmark]
  fn sort_by_market_cap(n: Linear<1, { T::MaxCategoryAssets::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (category, mut assets) = category_with::<T>(n);
    assets.reverse();

    #[extrinsic_call]
    sort_by_market_cap(RawOrigin::Signed(caller), category);

    assert_eq!(Pallet::<T>::top_assets(category, n), Ok(assets));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
