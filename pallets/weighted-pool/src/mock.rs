extern crate alloc;

use crate as pallet_weighted_pool;
use alloc::vec::Vec;
use core::cell::RefCell;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{ConstU32, ConstU64, ConstU128, fungibles::Inspect},
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{AssetId, Balance, PoolId, pallet_ids, params, traits::UnboundAssetHandler};

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    WeightedPool: pallet_weighted_pool,
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
pub const BOB: u64 = 2;
pub const CONTROLLER: u64 = 10;
pub const HANDLER: u64 = 99;

pub const ASSET_A: AssetId = 1;
pub const ASSET_B: AssetId = 2;
pub const ASSET_C: AssetId = 3;
pub const ASSET_D: AssetId = 4;

/// Unix time the tests start at.
pub const START: u64 = 1_700_000_000;

pub const BONE: Balance = params::BONE;

pub const fn units(x: u128) -> Balance {
  x * BONE
}

thread_local! {
  static UNBOUND: RefCell<Vec<(PoolId, AssetId, Balance)>> = const { RefCell::new(Vec::new()) };
}

parameter_types! {
  pub const WeightedPoolPalletId: PalletId = PalletId(*pallet_ids::WEIGHTED_POOL_PALLET_ID);
  /// Makes the unbind handler call back into the pool
  pub static ReenterOnUnbind: bool = false;
}

/// Unbind handler recording every hand-over
pub struct MockUnbindHandler;

impl MockUnbindHandler {
  pub fn unbound() -> Vec<(PoolId, AssetId, Balance)> {
    UNBOUND.with(|unbound| unbound.borrow().clone())
  }
}

impl UnboundAssetHandler<u64> for MockUnbindHandler {
  fn handler_account() -> u64 {
    HANDLER
  }

  fn on_unbind(pool: PoolId, asset: AssetId, amount: Balance) -> DispatchResult {
    if ReenterOnUnbind::get() {
      WeightedPool::do_gulp(pool, asset)?;
    }
    UNBOUND.with(|unbound| unbound.borrow_mut().push((pool, asset, amount)));
    Ok(())
  }
}

impl pallet_weighted_pool::Config for Test {
  type Assets = Assets;
  type UnixTime = Timestamp;
  type PalletId = WeightedPoolPalletId;
  type UnbindHandler = MockUnbindHandler;
  type MinWeight = ConstU128<{ params::MIN_WEIGHT }>;
  type MaxWeight = ConstU128<{ params::MAX_WEIGHT }>;
  type MaxTotalWeight = ConstU128<{ params::MAX_TOTAL_WEIGHT }>;
  type MinSwapFee = ConstU128<0>;
  type MaxSwapFee = ConstU128<{ params::MAX_FEE }>;
  type ExitFee = ConstU128<{ params::EXIT_FEE }>;
  type MaxInRatio = ConstU128<{ params::MAX_IN_RATIO }>;
  type MaxOutRatio = ConstU128<{ params::MAX_OUT_RATIO }>;
  type WeightUpdateDelay = ConstU64<{ params::WEIGHT_UPDATE_DELAY }>;
  type MinBoundAssets = ConstU32<{ params::MIN_BOUND_TOKENS }>;
  type MaxBoundAssets = ConstU32<{ params::MAX_BOUND_TOKENS }>;
  type InitPoolSupply = ConstU128<{ params::INIT_POOL_SUPPLY }>;
  type MinBalance = ConstU128<{ params::MIN_BALANCE }>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = WeightedPoolBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct WeightedPoolBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_weighted_pool::BenchmarkHelper<u64> for WeightedPoolBenchmarkHelper {
  fn create_asset(asset: AssetId) -> DispatchResult {
    if !Assets::asset_exists(asset) {
      Assets::force_create(RuntimeOrigin::root(), asset, ALICE, true, 1)?;
    }
    Ok(())
  }

  fn fund_account(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
    use polkadot_sdk::frame_support::traits::fungibles::Mutate;
    <Assets as Mutate<u64>>::mint_into(asset, who, amount)?;
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

pub fn balance_of(asset: AssetId, who: u64) -> Balance {
  <Assets as Inspect<u64>>::balance(asset, &who)
}

pub fn pool_account(pool: PoolId) -> u64 {
  WeightedPool::pool_account(pool)
}

/// Creates `asset` with a million units held by `CONTROLLER`
pub fn create_asset(asset: AssetId) {
  use polkadot_sdk::frame_support::traits::fungibles::Mutate;
  Assets::force_create(RuntimeOrigin::root(), asset, ALICE, true, 1).expect("asset created");
  <Assets as Mutate<u64>>::mint_into(asset, &CONTROLLER, units(1_000_000)).expect("asset minted");
}

/// Creates a pool controlled by `CONTROLLER` and seeds it from the controller's balances
pub fn setup_pool(assets: &[AssetId], balances: &[Balance], weights: &[Balance], swap_fee: Balance) -> PoolId {
  let pool = WeightedPool::do_create_pool(&CONTROLLER, b"Index".to_vec(), b"IDX".to_vec(), swap_fee)
    .expect("pool created");
  WeightedPool::do_initialize(&CONTROLLER, pool, assets, balances, weights, &CONTROLLER)
    .expect("pool initialized");
  pool
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let holders = [ALICE, BOB, CONTROLLER];
  let assets = [ASSET_A, ASSET_B, ASSET_C, ASSET_D];
  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: assets.iter().map(|id| (*id, ALICE, true, 1)).collect(),
    metadata: alloc::vec![],
    accounts: assets
      .iter()
      .flat_map(|id| holders.iter().map(move |who| (*id, *who, units(1_000_000))))
      .collect(),
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| {
    System::set_block_number(1);
    set_time(START);
    UNBOUND.with(|unbound| unbound.borrow_mut().clear());
    ReenterOnUnbind::set(false);
  });
  ext
}
