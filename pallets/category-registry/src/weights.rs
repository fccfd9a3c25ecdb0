#![cfg_attr(rustfmt, rustfmt_skip)]
#![allow(unused_parens)]
#![allow(unused_imports)]
#![allow(missing_docs)]

use polkadot_sdk::frame_support::{traits::Get, weights::{Weight, constants::RocksDbWeight}};
use core::marker::PhantomData;

pub trait WeightInfo {
	fn create_category() -> Weight;
	fn add_asset() -> Weight;
	fn add_assets(n: u32) -> Weight;
	fn remove_asset() -> Weight;
	fn order_by_market_cap(n: u32) -> Weight;
	fn sort_by_market_cap(n: u32) -> Weight;
}

pub struct SubstrateWeight<T>(PhantomData<T>);
impl<T: polkadot_sdk::frame_system::Config> WeightInfo for SubstrateWeight<T> {
	fn create_category() -> Weight {
		Weight::from_parts(18_000_000, 2000)
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn add_asset() -> Weight {
		Weight::from_parts(45_000_000, 5000)
			.saturating_add(T::DbWeight::get().reads(6))
			.saturating_add(T::DbWeight::get().writes(6))
	}
	fn add_assets(n: u32) -> Weight {
		Weight::from_parts(10_000_000, 1000)
			.saturating_add(Weight::from_parts(45_000_000, 5000).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(1))
			.saturating_add(T::DbWeight::get().reads(6_u64.saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(1))
			.saturating_add(T::DbWeight::get().writes(6_u64.saturating_mul(n.into())))
	}
	fn remove_asset() -> Weight {
		Weight::from_parts(25_000_000, 3000)
			.saturating_add(T::DbWeight::get().reads(3))
			.saturating_add(T::DbWeight::get().writes(3))
	}
	fn order_by_market_cap(n: u32) -> Weight {
		Weight::from_parts(15_000_000, 2000)
			.saturating_add(Weight::from_parts(20_000_000, 2500).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().reads(4_u64.saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(2))
	}
	fn sort_by_market_cap(n: u32) -> Weight {
		Weight::from_parts(15_000_000, 2000)
			.saturating_add(Weight::from_parts(20_000_000, 2500).saturating_mul(n.into()))
			.saturating_add(T::DbWeight::get().reads(2))
			.saturating_add(T::DbWeight::get().reads(4_u64.saturating_mul(n.into())))
			.saturating_add(T::DbWeight::get().writes(2))
	}
}

impl WeightInfo for () {
	fn create_category() -> Weight {
		Weight::from_parts(18_000_000, 2000)
			.saturating_add(RocksDbWeight::get().reads(1))
			.saturating_add(RocksDbWeight::get().writes(2))
	}
	fn add_asset() -> Weight {
		Weight::from_parts(45_000_000, 5000)
			.saturating_add(RocksDbWeight::get().reads(6))
			.saturating_add(RocksDbWeight::get().writes(6))
	}
	fn add_assets(n: u32) -> Weight {
		Weight::from_parts(10_000_000, 1000)
			.saturating_add(Weight::from_parts(45_000_000, 5000).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(1))
			.saturating_add(RocksDbWeight::get().reads(6_u64.saturating_mul(n.into())))
			.saturating_add(RocksDbWeight::get().writes(1))
			.saturating_add(RocksDbWeight::get().writes(6_u64.saturating_mul(n.into())))
	}
	fn remove_asset() -> Weight {
		Weight::from_parts(25_000_000, 3000)
			.saturating_add(RocksDbWeight::get().reads(3))
			.saturating_add(RocksDbWeight::get().writes(3))
	}
	fn order_by_market_cap(n: u32) -> Weight {
		Weight::from_parts(15_000_000, 2000)
			.saturating_add(Weight::from_parts(20_000_000, 2500).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(2))
			.saturating_add(RocksDbWeight::get().reads(4_u64.saturating_mul(n.into())))
			.saturating_add(RocksDbWeight::get().writes(2))
	}
	fn sort_by_market_cap(n: u32) -> Weight {
		Weight::from_parts(15_000_000, 2000)
			.saturating_add(Weight::from_parts(20_000_000, 2500).saturating_mul(n.into()))
			.saturating_add(RocksDbWeight::get().reads(2))
			.saturating_add(RocksDbWeight::get().reads(4_u64.saturating_mul(n.into())))
			.saturating_add(RocksDbWeight::get().writes(2))
	}
}
