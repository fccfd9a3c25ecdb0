use crate::*;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;
use primitives::params::BONE;

const DESIRED: AssetId = 1;
const HELD: AssetId = 100;
const HELD_BALANCE: Balance = 1_000 * BONE;

/// Pool with `HELD_BALANCE` of `HELD` already handed over to the liquidator
fn setup<T: Config>(controller: &T::AccountId) -> PoolId {
  let pool = T::BenchmarkHelper::create_pool(controller, DESIRED).expect("Failed to create pool");
  T::BenchmarkHelper::fund_account(&Pallet::<T>::account_id(), HELD, HELD_BALANCE)
    .expect("Failed to fund liquidator");
  Pallet::<T>::on_unbind(pool, HELD, HELD_BALANCE).expect("Failed to record holdings");
  pool
}

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn swap_exact_tokens_for_tokens() {
    let caller: T::AccountId = whitelisted_caller();
    let pool = setup::<T>(&caller);

    #[extrinsic_call]
    swap_exact_tokens_for_tokens(RawOrigin::Signed(caller), pool, DESIRED, HELD, BONE, 0);

    assert!(Pallet::<T>::held_balance(pool, HELD) < HELD_BALANCE);
  }

  #[benchmark]
  fn swap_tokens_for_exact_tokens() {
    let caller: T::AccountId = whitelisted_caller();
    let pool = setup::<T>(&caller);

    #[extrinsic_call]
    swap_tokens_for_exact_tokens(
      RawOrigin::Signed(caller),
      pool,
      DESIRED,
      HELD,
      BONE,
      Balance::MAX,
    );

    assert_eq!(Pallet::<T>::held_balance(pool, HELD), HELD_BALANCE - BONE);
  }

  #[benchmark]
  fn execute_swap_via_venue() {
    let caller: T::AccountId = whitelisted_caller();
    let pool = setup::<T>(&caller);

    #[extrinsic_call]
    execute_swap_via_venue(RawOrigin::Signed(caller), pool, HELD, DESIRED, BONE);

    assert!(Pallet::<T>::held_balance(pool, HELD) < HELD_BALANCE);
  }

  #[benchmark]
  fn set_premium() {
    let caller: T::AccountId = whitelisted_caller();
    let pool = setup::<T>(&caller);

    #[extrinsic_call]
    set_premium(RawOrigin::Signed(caller), pool, 10);

    assert_eq!(Pallet::<T>::premium_percent(pool), 10);
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
