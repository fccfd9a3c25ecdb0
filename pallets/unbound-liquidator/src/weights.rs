#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn swap_exact_tokens_for_tokens() -> Weight;
	fn swap_tokens_for_exact_tokens() -> Weight;
	fn execute_swap_via_venue() -> Weight;
	fn set_premium() -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn swap_exact_tokens_for_tokens() -> Weight {
		Weight::from_parts(95_000_000, 8000)
			.saturating_add(T::DbWeight::get().reads(14))
			.saturating_add(T::DbWeight::get().writes(10))
	}
	fn swap_tokens_for_exact_tokens() -> Weight {
		Weight::from_parts(95_000_000, 8000)
			.saturating_add(T::DbWeight::get().reads(14))
			.saturating_add(T::DbWeight::get().writes(10))
	}
	fn execute_swap_via_venue() -> Weight {
		Weight::from_parts(120_000_000, 10000)
			.saturating_add(T::DbWeight::get().reads(16))
			.saturating_add(T::DbWeight::get().writes(10))
	}
	fn set_premium() -> Weight {
		Weight::from_parts(14_000_000, 1500)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(1))
	}
}

impl WeightInfo for () {
	fn swap_exact_tokens_for_tokens() -> Weight {
		Weight::from_parts(95_000_000, 8000)
			.saturating_add(RocksDbWeight::get().reads(14))
			.saturating_add(RocksDbWeight::get().writes(10))
	}
	fn swap_tokens_for_exact_tokens() -> Weight {
		Weight::from_parts(95_000_000, 8000)
			.saturating_add(RocksDbWeight::get().reads(14))
			.saturating_add(RocksDbWeight::get().writes(10))
	}
	fn execute_swap_via_venue() -> Weight {
		Weight::from_parts(120_000_000, 10000)
			.saturating_add(RocksDbWeight::get().reads(16))
			.saturating_add(RocksDbWeight::get().writes(10))
	}
	fn set_premium() -> Weight {
		Weight::from_parts(14_000_000, 1500)
			.saturating_add(RocksDbWeight::get().reads(1))
			.saturating_add(RocksDbWeight::get().writes(1))
	}
}
