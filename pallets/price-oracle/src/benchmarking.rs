extern crate alloc;

use crate::*;
use alloc::vec::Vec;
use polkadot_sdk::frame_benchmarking::v2::*;
use polkadot_sdk::frame_system::RawOrigin;

#[benchmarks]
mod benches {
  use super::*;

  #[benchmark]
  fn update_price() {
    let caller: T::AccountId = whitelisted_caller();
    let asset: AssetId = 1;
    T::BenchmarkHelper::register_price(asset).expect("Failed to register price");

    #[extrinsic_call]
    update_price(RawOrigin::Signed(caller), asset);

    assert!(LatestObservations::<T>::contains_key(asset));
  }

  #[benchmark]
  fn update_prices(n: Linear<1, { T::MaxBatchSize::get() }>) {
    let caller: T::AccountId = whitelisted_caller();
    let assets: Vec<AssetId> = (1..=n).collect();
    for asset in &assets {
      T::BenchmarkHelper::register_price(*asset).expect("Failed to register price");
    }

    #[extrinsic_call]
    update_prices(RawOrigin::Signed(caller), assets.clone());

    assert!(assets.iter().all(|asset| LatestObservations::<T>::contains_key(asset)));
  }

  #[cfg(test)]
  use crate::mock::{Test, new_test_ext};
  #[cfg(test)]
  impl_benchmark_test_suite!(Pallet, new_test_ext(), Test);
}
