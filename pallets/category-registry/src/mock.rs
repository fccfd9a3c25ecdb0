extern crate alloc;

use crate as pallet_category_registry;
use alloc::{collections::BTreeMap, vec::Vec};
use core::cell::RefCell;
use polkadot_sdk::frame_support::{
  construct_runtime, derive_impl, parameter_types,
  traits::{ConstU32, ConstU64, ConstU128},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_core::U256;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  AssetId, Balance, ObservationWindow, TwoWayAveragePrice, Uq112x112, params, traits::PriceOracle,
};

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    CategoryRegistry: pallet_category_registry,
  }
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
  type Block = Block;
  type AccountId = u64;
  type Lookup = IdentityLookup<Self::AccountId>;
  type Hash = H256;
  type Hashing = BlakeTwo256;
  type AccountData = polkadot_sdk::pallet_balances::AccountData<u128>;
}

impl polkadot_sdk::pallet_timestamp::Config for Test {
  type Moment = u64;
  type OnTimestampSet = ();
  type MinimumPeriod = ConstU64<1>;
  type WeightInfo = ();
}

impl polkadot_sdk::pallet_balances::Config for Test {
  type MaxLocks = ();
  type MaxReserves = ();
  type ReserveIdentifier = [u8; 8];
  type Balance = u128;
  type DustRemoval = ();
  type RuntimeEvent = RuntimeEvent;
  type ExistentialDeposit = ConstU128<1>;
  type AccountStore = System;
  type WeightInfo = ();
  type FreezeIdentifier = ();
  type MaxFreezes = ();
  type RuntimeHoldReason = ();
  type RuntimeFreezeReason = ();
  type DoneSlashHandler = ();
}

impl polkadot_sdk::pallet_assets::Config for Test {
  type RuntimeEvent = RuntimeEvent;
  type Balance = u128;
  type AssetId = u32;
  type AssetIdParameter = u32;
  type Currency = Balances;
  type CreateOrigin = polkadot_sdk::frame_support::traits::AsEnsureOriginWithArg<
    frame_system::EnsureSigned<Self::AccountId>,
  >;
  type ForceOrigin = frame_system::EnsureRoot<Self::AccountId>;
  type AssetDeposit = ConstU128<1>;
  type AssetAccountDeposit = ConstU128<1>;
  type MetadataDepositBase = ConstU128<1>;
  type MetadataDepositPerByte = ConstU128<1>;
  type ApprovalDeposit = ConstU128<1>;
  type StringLimit = ConstU32<50>;
  type Freezer = ();
  type Extra = ();
  type ReserveData = ();
  type CallbackHandle = ();
  type WeightInfo = ();
  type RemoveItemsLimit = ConstU32<5>;
  type Holder = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = AssetBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct AssetBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl polkadot_sdk::pallet_assets::BenchmarkHelper<u32, ()> for AssetBenchmarkHelper {
  fn create_asset_id_parameter(id: u32) -> u32 {
    id
  }
  fn create_reserve_id_parameter(_id: u32) -> () {
    ()
  }
}

pub const ALICE: u64 = 1;

/// Unix time the tests start at.
pub const START: u64 = 1_700_000_000;

pub const ASSET_A: AssetId = 1;
pub const ASSET_B: AssetId = 2;
pub const ASSET_C: AssetId = 3;
pub const ASSET_D: AssetId = 4;
pub const ASSET_E: AssetId = 5;
pub const UNPRICED: AssetId = 9;

/// Every seeded asset has this total issuance
pub const SUPPLY: Balance = 100;

thread_local! {
  static PRICES: RefCell<BTreeMap<AssetId, u128>> = RefCell::new(BTreeMap::new());
  static SAMPLED: RefCell<Vec<AssetId>> = RefCell::new(Vec::new());
}

/// Oracle answering every window with a fixed integer price per asset
pub struct MockOracle;

impl MockOracle {
  pub fn set_price(asset: AssetId, price: u128) {
    PRICES.with(|prices| prices.borrow_mut().insert(asset, price));
  }

  /// Assets sampled through `try_update_price`, in call order
  pub fn sampled() -> Vec<AssetId> {
    SAMPLED.with(|sampled| sampled.borrow().clone())
  }

  fn price(asset: AssetId) -> Result<u128, DispatchError> {
    PRICES
      .with(|prices| prices.borrow().get(&asset).copied())
      .ok_or(DispatchError::Other("no venue pair"))
  }
}

impl PriceOracle for MockOracle {
  fn try_update_price(asset: AssetId) -> Result<bool, DispatchError> {
    Self::price(asset)?;
    SAMPLED.with(|sampled| sampled.borrow_mut().push(asset));
    Ok(true)
  }

  fn compute_two_way_average_price(
    asset: AssetId,
    _window: ObservationWindow,
  ) -> Result<TwoWayAveragePrice, DispatchError> {
    let price = Self::price(asset)?;
    Ok(TwoWayAveragePrice {
      price_average: Uq112x112::from_integer(price)?,
      reference_price_average: Uq112x112::fraction(U256::one(), U256::from(price))?,
    })
  }
}

parameter_types! {
  pub const MarketCapWindow: ObservationWindow =
    ObservationWindow::new(params::LONG_TWAP_MIN_AGE, params::LONG_TWAP_MAX_AGE);
}

impl pallet_category_registry::Config for Test {
  type Assets = Assets;
  type PriceOracle = MockOracle;
  type UnixTime = Timestamp;
  type AdminOrigin = frame_system::EnsureRoot<u64>;
  type MaxCategoryAssets = ConstU32<5>;
  type MaxSortDelay = ConstU64<{ params::MAX_SORT_DELAY }>;
  type MarketCapWindow = MarketCapWindow;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = CategoryRegistryBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct CategoryRegistryBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_category_registry::BenchmarkHelper for CategoryRegistryBenchmarkHelper {
  fn register_asset(asset: AssetId, supply: Balance, price: u128) -> polkadot_sdk::sp_runtime::DispatchResult {
    use polkadot_sdk::frame_support::traits::fungibles::{Create, Mutate};
    if !<Assets as polkadot_sdk::frame_support::traits::fungibles::Inspect<u64>>::asset_exists(asset) {
      <Assets as Create<u64>>::create(asset, ALICE, true, 1)?;
    }
    <Assets as Mutate<u64>>::mint_into(asset, &ALICE, supply)?;
    MockOracle::set_price(asset, price);
    Ok(())
  }
}

pub fn now() -> u64 {
  Timestamp::get() / 1_000
}

pub fn set_time(seconds: u64) {
  Timestamp::set_timestamp(seconds * 1_000);
}

pub fn advance_time(seconds: u64) {
  set_time(now() + seconds);
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let assets = [ASSET_A, ASSET_B, ASSET_C, ASSET_D, ASSET_E, UNPRICED];
  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: assets.iter().map(|id| (*id, ALICE, true, 1)).collect(),
    metadata: alloc::vec![],
    accounts: assets.iter().map(|id| (*id, ALICE, SUPPLY)).collect(),
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| {
    System::set_block_number(1);
    set_time(START);
    PRICES.with(|prices| prices.borrow_mut().clear());
    SAMPLED.with(|sampled| sampled.borrow_mut().clear());
    // market caps 1000, 400, 100, 100, 100
    for (asset, price) in [(ASSET_A, 10), (ASSET_B, 4), (ASSET_C, 1), (ASSET_D, 1), (ASSET_E, 1)] {
      MockOracle::set_price(asset, price);
    }
  });
  ext
}
