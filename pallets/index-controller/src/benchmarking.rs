extern crate alloc;

use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::params::BONE;

const SEED_VALUE: Balance = 10_000 * BONE;

/// Index over the top `n` of `n + extra` category assets, seeded by `provider`
fn deployed<T: Config>(provider: &T::AccountId, n: u32, extra: u32) -> (PoolId, CategoryId) {
  let category = T::BenchmarkHelper::create_category(n + extra).expect("Failed to create category");
  let pool = Pallet::<T>::do_prepare_index(category, n, SEED_VALUE, b"Bench".to_vec(), b"BNC".to_vec())
    .expect("Failed to prepare index");
  fund_seed::<T>(provider, pool);
  Pallet::<T>::do_deploy_index(provider, pool).expect("Failed to deploy index");
  (pool, category)
}

fn fund_seed<T: Config>(provider: &T::AccountId, pool: PoolId) {
  let prepared = Pallet::<T>::prepared_index(pool).expect("Index not prepared");
  for (asset, balance) in prepared.assets.iter().zip(&prepared.balances) {
    T::BenchmarkHelper::fund_account(provider, *asset, *balance).expect("Failed to fund provider");
  }
}

/// Makes the next rebalance of `pool` due, as a reindex or a reweigh
fn make_due<T: Config>(pool: PoolId, reindex: bool) {
  Indexes::<T>::mutate(pool, |record| {
    if let Some(record) = record {
      record.last_update_at = Pallet::<T>::now().saturating_sub(T::RebalanceDelay::get());
      record.update_count = if reindex { T::ReweighsBeforeReindex::get() } else { 0 };
    }
  });
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn prepare_index(
    n: Linear<{ T::MinIndexSize::get() }, { T::MaxIndexSize::get() }>,
  ) -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let category = T::BenchmarkHelper::create_category(n).expect("Failed to create category");

    #[extrinsic_call]
    prepare_index(
      origin as T::RuntimeOrigin,
      category,
      n,
      SEED_VALUE,
      b"Bench".to_vec(),
      b"BNC".to_vec(),
    );

    assert!(Pallet::<T>::prepared_index(0).is_some());
    Ok(())
  }

  #[benchmark]
  fn deploy_index(n: Linear<{ T::MinIndexSize::get() }, { T::MaxIndexSize::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let category = T::BenchmarkHelper::create_category(n).expect("Failed to create category");
    let pool = Pallet::<T>::do_prepare_index(
      category,
      n,
      SEED_VALUE,
      b"Bench".to_vec(),
      b"BNC".to_vec(),
    )
    .expect("Failed to prepare index");
    fund_seed::<T>(&caller, pool);

    #[extrinsic_call]
    deploy_index(RawOrigin::Signed(caller), pool);

    assert!(Pallet::<T>::index(pool).is_some());
    assert_eq!(T::Pools::current_tokens(pool).len(), n as usize);
  }

  #[benchmark]
  fn reweigh_pool(n: Linear<{ T::MinIndexSize::get() }, { T::MaxIndexSize::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = deployed::<T>(&caller, n, 0);
    make_due::<T>(pool, false);

    #[extrinsic_call]
    reweigh_pool(RawOrigin::Signed(caller), pool);

    assert_eq!(Pallet::<T>::index(pool).map(|record| record.update_count), Some(1));
  }

  #[benchmark]
  fn reindex_pool(n: Linear<{ T::MinIndexSize::get() }, { T::MaxIndexSize::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = deployed::<T>(&caller, n, 0);
    make_due::<T>(pool, true);

    #[extrinsic_call]
    reindex_pool(RawOrigin::Signed(caller), pool);

    assert_eq!(
      Pallet::<T>::index(pool).map(|record| record.update_count),
      Some(T::ReweighsBeforeReindex::get() + 1)
    );
  }

  #[benchmark]
  fn set_swap_fee() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = deployed::<T>(&caller, T::MinIndexSize::get(), 0);

    #[extrinsic_call]
    set_swap_fee(origin as T::RuntimeOrigin, pool, BONE / 100);

    Ok(())
  }

  #[benchmark]
  fn set_default_premium() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;

    #[extrinsic_call]
    set_default_premium(origin as T::RuntimeOrigin, 5);

    assert_eq!(Pallet::<T>::default_premium(), 5);
    Ok(())
  }

  #[benchmark]
  fn set_premium() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = deployed::<T>(&caller, T::MinIndexSize::get(), 0);

    #[extrinsic_call]
    set_premium(origin as T::RuntimeOrigin, pool, 5);

    Ok(())
  }

  #[benchmark]
  fn update_minimum_balance() {
    let caller: T::AccountId = whitelisted_caller();
    let n = T::MinIndexSize::get();
    let (pool, category) = deployed::<T>(&caller, n, 1);

    // bind the category's smallest asset without funding it
    let assets = T::Categories::top_assets(category, n + 1).expect("Category not ready");
    let weights = Pallet::<T>::compute_asset_weights(&assets).expect("Failed to compute weights");
    let value = Pallet::<T>::pool_value(pool).expect("Failed to value pool");
    let mut minimum_balances = alloc::vec![0; n as usize];
    let asset = assets[n as usize];
    minimum_balances
      .push(Pallet::<T>::minimum_balance(asset, value).expect("Failed to price minimum balance"));
    T::Pools::reindex_tokens(&Pallet::<T>::account_id(), pool, &assets, &weights, &minimum_balances)
      .expect("Failed to bind asset");

    #[extrinsic_call]
    update_minimum_balance(RawOrigin::Signed(caller), pool, asset);

    assert!(T::Pools::is_bound(pool, asset) && !T::Pools::is_ready(pool, asset));
  }

  #[benchmark]
  fn set_public_swap() -> Result<(), BenchmarkError> {
    let origin =
      T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = deployed::<T>(&caller, T::MinIndexSize::get(), 0);

    #[extrinsic_call]
    set_public_swap(origin as T::RuntimeOrigin, pool, false);

    Ok(())
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
