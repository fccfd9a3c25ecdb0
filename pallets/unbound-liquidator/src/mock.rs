extern crate alloc;

use crate as pallet_unbound_liquidator;
use alloc::collections::BTreeMap;
use core::cell::RefCell;
use polkadot_sdk::frame_support::{
  PalletId, construct_runtime, derive_impl, parameter_types,
  traits::{
    ConstU8, ConstU32, ConstU64, ConstU128,
    fungibles::{Inspect, Mutate},
    tokens::{Fortitude, Precision, Preservation},
  },
};
use polkadot_sdk::frame_system;
use polkadot_sdk::sp_core::U256;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  AssetId, Balance, ObservationWindow, PoolId, TwoWayAveragePrice, Uq112x112, pallet_ids, params,
  traits::{PriceOracle, SwapVenue},
};

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    WeightedPool: pallet_weighted_pool,
    Liquidator: pallet_unbound_liquidator,
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

/// Desired pool assets
pub const ASSET_A: AssetId = 1;
pub const ASSET_B: AssetId = 2;
/// Pool asset phased out by `phase_out`
pub const ASSET_C: AssetId = 3;
/// Never bound; only reaches the liquidator through `gulp`
pub const ASSET_D: AssetId = 4;

/// Unix time the tests start at.
pub const START: u64 = 1_700_000_000;

pub const BONE: Balance = params::BONE;

pub const fn units(x: u128) -> Balance {
  x * BONE
}

thread_local! {
  static PRICES: RefCell<BTreeMap<AssetId, u128>> = RefCell::new(BTreeMap::new());
}

parameter_types! {
  pub const WeightedPoolPalletId: PalletId = PalletId(*pallet_ids::WEIGHTED_POOL_PALLET_ID);
  pub const LiquidatorPalletId: PalletId = PalletId(*pallet_ids::UNBOUND_LIQUIDATOR_PALLET_ID);
  pub const PriceWindow: ObservationWindow =
    ObservationWindow::new(params::SHORT_TWAP_MIN_AGE, params::SHORT_TWAP_MAX_AGE);
  /// What the venue charges, in percent of the oracle value
  pub static VenueCostPercent: u128 = 100;
  /// Makes the venue call back into the liquidator
  pub static ReenterFromVenue: bool = false;
}

/// Oracle answering every window with a fixed integer price per asset
pub struct MockOracle;

impl MockOracle {
  pub fn set_price(asset: AssetId, price: u128) {
    PRICES.with(|prices| prices.borrow_mut().insert(asset, price));
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

/// Venue converting at oracle prices scaled by `VenueCostPercent`
pub struct MockVenue;

impl SwapVenue<u64> for MockVenue {
  fn quote_exact_out(
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
  ) -> Result<Balance, DispatchError> {
    let value = amount_out * MockOracle::price(asset_out)?;
    Ok(value / MockOracle::price(asset_in)? * VenueCostPercent::get() / 100)
  }

  fn swap_tokens_for_exact_tokens(
    who: &u64,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
    max_amount_in: Balance,
  ) -> Result<Balance, DispatchError> {
    if ReenterFromVenue::get() {
      Liquidator::do_swap_exact_tokens_for_tokens(&BOB, 0, ASSET_A, ASSET_D, units(1), 0)?;
    }
    let amount_in = Self::quote_exact_out(asset_in, asset_out, amount_out)?;
    if amount_in > max_amount_in {
      return Err(DispatchError::Other("excessive input amount"));
    }
    <Assets as Mutate<u64>>::burn_from(
      asset_in,
      who,
      amount_in,
      Preservation::Expendable,
      Precision::Exact,
      Fortitude::Polite,
    )?;
    <Assets as Mutate<u64>>::mint_into(asset_out, who, amount_out)?;
    Ok(amount_in)
  }
}

impl pallet_weighted_pool::Config for Test {
  type Assets = Assets;
  type UnixTime = Timestamp;
  type PalletId = WeightedPoolPalletId;
  type UnbindHandler = Liquidator;
  type MinWeight = ConstU128<{ params::MIN_WEIGHT }>;
  type MaxWeight = ConstU128<{ params::MAX_WEIGHT }>;
  type MaxTotalWeight = ConstU128<{ params::MAX_TOTAL_WEIGHT }>;
  type MinSwapFee = ConstU128<{ params::MIN_FEE }>;
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
  type BenchmarkHelper = TestBenchmarkHelper;
}

impl pallet_unbound_liquidator::Config for Test {
  type Assets = Assets;
  type PalletId = LiquidatorPalletId;
  type Pools = WeightedPool;
  type PriceOracle = MockOracle;
  type Venue = MockVenue;
  type PriceWindow = PriceWindow;
  type DefaultPremium = ConstU8<{ params::DEFAULT_SELLER_PREMIUM }>;
  type MaxPremium = ConstU8<{ params::MAX_SELLER_PREMIUM }>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = TestBenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct TestBenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
fn ensure_asset(asset: AssetId) -> DispatchResult {
  if !Assets::asset_exists(asset) {
    Assets::force_create(RuntimeOrigin::root(), asset, ALICE, true, 1)?;
  }
  Ok(())
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_weighted_pool::BenchmarkHelper<u64> for TestBenchmarkHelper {
  fn create_asset(asset: AssetId) -> DispatchResult {
    ensure_asset(asset)
  }

  fn fund_account(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
    <Assets as Mutate<u64>>::mint_into(asset, who, amount)?;
    Ok(())
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_unbound_liquidator::BenchmarkHelper<u64> for TestBenchmarkHelper {
  fn create_pool(controller: &u64, desired: AssetId) -> Result<PoolId, DispatchError> {
    let assets = [desired, desired + 1];
    for asset in assets {
      ensure_asset(asset)?;
      <Assets as Mutate<u64>>::mint_into(asset, controller, units(1_000))?;
      MockOracle::set_price(asset, 1);
    }
    let pool =
      WeightedPool::do_create_pool(controller, b"Bench".to_vec(), b"BNC".to_vec(), BONE / 40)?;
    WeightedPool::do_initialize(
      controller,
      pool,
      &assets,
      &[units(100), units(100)],
      &[BONE, BONE],
      controller,
    )?;
    Ok(pool)
  }

  fn fund_account(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
    ensure_asset(asset)?;
    <Assets as Mutate<u64>>::mint_into(asset, who, amount)?;
    MockOracle::set_price(asset, 1);
    Ok(())
  }
}

pub fn now() -> u64 {
  Timestamp::get() / 1_000
}

pub fn set_time(seconds: u64) {
  Timestamp::set_timestamp(seconds * 1_000);
}

pub fn balance_of(asset: AssetId, who: u64) -> Balance {
  <Assets as Inspect<u64>>::balance(asset, &who)
}

pub fn liquidator_account() -> u64 {
  Liquidator::account_id()
}

/// Pool 0 over A, B and C, controlled by `CONTROLLER`
pub fn setup_pool() -> PoolId {
  let pool = WeightedPool::do_create_pool(&CONTROLLER, b"Index".to_vec(), b"IDX".to_vec(), BONE / 40)
    .expect("pool created");
  WeightedPool::do_initialize(
    &CONTROLLER,
    pool,
    &[ASSET_A, ASSET_B, ASSET_C],
    &[units(100), units(100), units(100)],
    &[units(5), units(5), units(5)],
    &CONTROLLER,
  )
  .expect("pool initialized");
  pool
}

/// Sends `amount` of an asset the pool does not hold to its account; gulping forwards it here
pub fn hand_over(pool: PoolId, asset: AssetId, amount: Balance) {
  <Assets as Mutate<u64>>::mint_into(asset, &WeightedPool::pool_account(pool), amount)
    .expect("pool account funded");
  WeightedPool::do_gulp(pool, asset).expect("gulp forwards the balance");
}

/// Drops C from the desired assets of `pool`
pub fn phase_out(pool: PoolId) {
  WeightedPool::do_reindex_tokens(
    &CONTROLLER,
    pool,
    &[ASSET_A, ASSET_B],
    &[units(5), units(5)],
    &[0, 0],
  )
  .expect("pool reindexed");
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
      .flat_map(|id| holders.iter().map(move |who| (*id, *who, units(1_000))))
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
    PRICES.with(|prices| prices.borrow_mut().clear());
    for (asset, price) in [(ASSET_A, 2), (ASSET_B, 1), (ASSET_C, 1), (ASSET_D, 4)] {
      MockOracle::set_price(asset, price);
    }
    VenueCostPercent::set(100);
    ReenterFromVenue::set(false);
  });
  ext
}
