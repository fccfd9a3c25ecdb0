extern crate alloc;

use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::params::BONE;

const SEED_BALANCE: Balance = 1_000_000 * BONE;
const POOL_BALANCE: Balance = 100 * BONE;

fn fund<T: Config>(who: &T::AccountId, assets: &[AssetId]) {
  for asset in assets {
    T::BenchmarkHelper::create_asset(*asset).expect("Failed to create asset");
    T::BenchmarkHelper::fund_account(who, *asset, SEED_BALANCE).expect("Failed to fund account");
  }
}

/// Initialized pool of `n` equally weighted assets controlled by `controller`
fn setup_pool<T: Config>(controller: &T::AccountId, n: u32) -> (PoolId, Vec<AssetId>) {
  let assets: Vec<AssetId> = (1..=n).collect();
  fund::<T>(controller, &assets);
  let pool = Pallet::<T>::do_create_pool(controller, b"Bench".to_vec(), b"BNC".to_vec(), BONE / 40)
    .expect("Failed to create pool");
  Pallet::<T>::do_initialize(
    controller,
    pool,
    &assets,
    &alloc::vec![POOL_BALANCE; n as usize],
    &alloc::vec![BONE; n as usize],
    controller,
  )
  .expect("Failed to initialize pool");
  (pool, assets)
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn create_pool() {
    let caller: T::AccountId = whitelisted_caller();

    #[extrinsic_call]
    create_pool(
      RawOrigin::Signed(caller),
      b"Bench".to_vec(),
      b"BNC".to_vec(),
      BONE / 40,
    );

    assert!(Pools::<T>::contains_key(0));
  }

  #[benchmark]
  fn initialize(n: Linear<2, { T::MaxBoundAssets::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let assets: Vec<AssetId> = (1..=n).collect();
    fund::<T>(&caller, &assets);
    let pool = Pallet::<T>::do_create_pool(&caller, b"Bench".to_vec(), b"BNC".to_vec(), BONE / 40)
      .expect("Failed to create pool");

    #[extrinsic_call]
    initialize(
      RawOrigin::Signed(caller),
      pool,
      assets,
      alloc::vec![POOL_BALANCE; n as usize],
      alloc::vec![BONE; n as usize],
    );

    assert_eq!(PoolAssets::<T>::get(pool).len(), n as usize);
  }

  #[benchmark]
  fn swap_exact_amount_in() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    swap_exact_amount_in(RawOrigin::Signed(caller), pool, 1, BONE, 2, 0, Balance::MAX);

    assert!(Pallet::<T>::record(pool, 1).balance > POOL_BALANCE);
  }

  #[benchmark]
  fn swap_exact_amount_out() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    swap_exact_amount_out(
      RawOrigin::Signed(caller),
      pool,
      1,
      10 * BONE,
      2,
      BONE,
      Balance::MAX,
    );

    assert_eq!(Pallet::<T>::record(pool, 2).balance, POOL_BALANCE - BONE);
  }

  #[benchmark]
  fn join_pool(n: Linear<2, { T::MaxBoundAssets::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, n);

    #[extrinsic_call]
    join_pool(
      RawOrigin::Signed(caller.clone()),
      pool,
      BONE,
      alloc::vec![Balance::MAX; n as usize],
    );

    assert!(Shares::<T>::get(pool, &caller) > T::InitPoolSupply::get());
  }

  #[benchmark]
  fn exit_pool(n: Linear<2, { T::MaxBoundAssets::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, n);

    #[extrinsic_call]
    exit_pool(
      RawOrigin::Signed(caller.clone()),
      pool,
      BONE,
      alloc::vec![0; n as usize],
    );

    assert!(Shares::<T>::get(pool, &caller) < T::InitPoolSupply::get());
  }

  #[benchmark]
  fn join_swap_extern_amount_in() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    join_swap_extern_amount_in(RawOrigin::Signed(caller.clone()), pool, 1, BONE, 0);

    assert!(Shares::<T>::get(pool, &caller) > T::InitPoolSupply::get());
  }

  #[benchmark]
  fn join_swap_pool_amount_out() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    join_swap_pool_amount_out(RawOrigin::Signed(caller.clone()), pool, 1, BONE, Balance::MAX);

    assert_eq!(
      Shares::<T>::get(pool, &caller),
      T::InitPoolSupply::get() + BONE
    );
  }

  #[benchmark]
  fn exit_swap_pool_amount_in() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    exit_swap_pool_amount_in(RawOrigin::Signed(caller), pool, 1, BONE, 0);

    assert!(Pallet::<T>::record(pool, 1).balance < POOL_BALANCE);
  }

  #[benchmark]
  fn exit_swap_extern_amount_out() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    exit_swap_extern_amount_out(RawOrigin::Signed(caller), pool, 1, BONE, Balance::MAX);

    assert_eq!(Pallet::<T>::record(pool, 1).balance, POOL_BALANCE - BONE);
  }

  #[benchmark]
  fn gulp() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);
    T::BenchmarkHelper::fund_account(&Pallet::<T>::pool_account(pool), 1, BONE)
      .expect("Failed to fund pool");

    #[extrinsic_call]
    gulp(RawOrigin::Signed(caller), pool, 1);

    assert_eq!(Pallet::<T>::record(pool, 1).balance, POOL_BALANCE + BONE);
  }

  #[benchmark]
  fn bind() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    bind(RawOrigin::Signed(caller), pool, 3, BONE, BONE);

    assert!(Records::<T>::contains_key(pool, 3));
  }

  #[benchmark]
  fn unbind() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 3);

    #[extrinsic_call]
    unbind(RawOrigin::Signed(caller), pool, 1);

    assert!(!Records::<T>::contains_key(pool, 1));
  }

  #[benchmark]
  fn set_swap_fee() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    set_swap_fee(RawOrigin::Signed(caller), pool, BONE / 100);

    assert_eq!(Pools::<T>::get(pool).map(|info| info.swap_fee), Some(BONE / 100));
  }

  #[benchmark]
  fn set_public_swap() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);

    #[extrinsic_call]
    set_public_swap(RawOrigin::Signed(caller), pool, false);

    assert_eq!(Pools::<T>::get(pool).map(|info| info.public_swap), Some(false));
  }

  #[benchmark]
  fn reweigh_tokens(n: Linear<2, { T::MaxBoundAssets::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, assets) = setup_pool::<T>(&caller, n);

    #[extrinsic_call]
    reweigh_tokens(
      RawOrigin::Signed(caller),
      pool,
      assets,
      alloc::vec![2 * BONE; n as usize],
    );

    assert_eq!(Pallet::<T>::desired_weight(pool, 1), 2 * BONE);
  }

  #[benchmark]
  fn reindex_tokens(n: Linear<2, { T::MaxBoundAssets::get() - 1 }>) {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);
    let assets: Vec<AssetId> = (2..=n + 1).collect();
    fund::<T>(&caller, &assets);

    #[extrinsic_call]
    reindex_tokens(
      RawOrigin::Signed(caller),
      pool,
      assets,
      alloc::vec![BONE; n as usize],
      alloc::vec![BONE; n as usize],
    );

    assert_eq!(Pallet::<T>::desired_weight(pool, 1), 0);
  }

  #[benchmark]
  fn set_minimum_balance() {
    let caller: T::AccountId = whitelisted_caller();
    let (pool, _) = setup_pool::<T>(&caller, 2);
    Pallet::<T>::do_bind(pool, 3, BONE, BONE).expect("Failed to bind asset");

    #[extrinsic_call]
    set_minimum_balance(RawOrigin::Signed(caller), pool, 3, 2 * BONE);

    assert_eq!(MinimumBalances::<T>::get(pool, 3), 2 * BONE);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
