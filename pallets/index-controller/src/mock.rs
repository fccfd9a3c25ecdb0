extern crate alloc;

use crate as pallet_index_controller;
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
use polkadot_sdk::frame_system::{self, EnsureRoot};
use polkadot_sdk::sp_core::U256;
use polkadot_sdk::sp_runtime::{
  BuildStorage, DispatchError, DispatchResult,
  testing::H256,
  traits::{BlakeTwo256, IdentityLookup},
};
use primitives::{
  AssetId, Balance, CategoryId, ObservationWindow, PoolId, Uq112x112, pallet_ids, params,
  traits::{CumulativePriceSource, SwapVenue},
};

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
  pub struct Test {
    System: frame_system,
    Timestamp: polkadot_sdk::pallet_timestamp,
    Balances: polkadot_sdk::pallet_balances,
    Assets: polkadot_sdk::pallet_assets,
    Oracle: pallet_price_oracle,
    CategoryRegistry: pallet_category_registry,
    WeightedPool: pallet_weighted_pool,
    Liquidator: pallet_unbound_liquidator,
    IndexController: pallet_index_controller,
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

pub const ASSET_A: AssetId = 1;
pub const ASSET_B: AssetId = 2;
pub const ASSET_C: AssetId = 3;
/// Smallest cap at genesis; overtakes C once repriced
pub const ASSET_D: AssetId = 4;

/// Unix time the tests start at.
pub const START: u64 = 1_700_000_000;

pub const HOUR: u64 = 60 * 60;

pub const BONE: Balance = params::BONE;

pub const fn units(x: u128) -> Balance {
  x * BONE
}

/// Total issuance of A, B and C; D has half of it
pub const SUPPLY: Balance = units(1_000_000);

/// A venue pair of one asset against the reference asset.
#[derive(Clone, Copy, Default)]
struct MockPair {
  price: u128,
  cumulative: U256,
  inverse_cumulative: U256,
  last_update: u64,
}

impl MockPair {
  fn rates(&self) -> (U256, U256) {
    let rate = Uq112x112::from_integer(self.price).expect("price fits").0;
    let inverse = Uq112x112::fraction(U256::one(), U256::from(self.price))
      .expect("price is not zero")
      .0;
    (rate, inverse)
  }

  fn cumulative_at(&self, now: u64) -> (U256, U256) {
    let elapsed = U256::from(now.saturating_sub(self.last_update));
    let (rate, inverse) = self.rates();
    (
      self.cumulative.overflowing_add(rate.overflowing_mul(elapsed).0).0,
      self
        .inverse_cumulative
        .overflowing_add(inverse.overflowing_mul(elapsed).0)
        .0,
    )
  }
}

thread_local! {
  static PAIRS: RefCell<BTreeMap<AssetId, MockPair>> = RefCell::new(BTreeMap::new());
}

/// Venue trading every asset against the reference asset at prices set by tests
pub struct MockVenue;

impl MockVenue {
  /// Price one unit of `asset` at `price` reference units from now on
  pub fn set_price(asset: AssetId, price: u128) {
    let now = now();
    PAIRS.with(|pairs| {
      let mut pairs = pairs.borrow_mut();
      let pair = pairs.entry(asset).or_insert_with(|| MockPair {
        last_update: now,
        ..Default::default()
      });
      if pair.price > 0 {
        let (cumulative, inverse_cumulative) = pair.cumulative_at(now);
        pair.cumulative = cumulative;
        pair.inverse_cumulative = inverse_cumulative;
      }
      pair.last_update = now;
      pair.price = price;
    });
  }

  pub fn price(asset: AssetId) -> Result<u128, DispatchError> {
    PAIRS
      .with(|pairs| pairs.borrow().get(&asset).map(|pair| pair.price))
      .ok_or(DispatchError::Other("no venue pair"))
  }
}

impl CumulativePriceSource for MockVenue {
  fn current_cumulative_prices(asset: AssetId) -> Result<(U256, U256), DispatchError> {
    PAIRS.with(|pairs| {
      pairs
        .borrow()
        .get(&asset)
        .map(|pair| pair.cumulative_at(now()))
        .ok_or(DispatchError::Other("no venue pair"))
    })
  }
}

impl SwapVenue<u64> for MockVenue {
  fn quote_exact_out(
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
  ) -> Result<Balance, DispatchError> {
    Ok(amount_out * Self::price(asset_out)? / Self::price(asset_in)?)
  }

  fn swap_tokens_for_exact_tokens(
    who: &u64,
    asset_in: AssetId,
    asset_out: AssetId,
    amount_out: Balance,
    max_amount_in: Balance,
  ) -> Result<Balance, DispatchError> {
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

parameter_types! {
  pub const WeightedPoolPalletId: PalletId = PalletId(*pallet_ids::WEIGHTED_POOL_PALLET_ID);
  pub const LiquidatorPalletId: PalletId = PalletId(*pallet_ids::UNBOUND_LIQUIDATOR_PALLET_ID);
  pub const ControllerPalletId: PalletId = PalletId(*pallet_ids::INDEX_CONTROLLER_PALLET_ID);
  pub const ShortWindow: ObservationWindow =
    ObservationWindow::new(params::SHORT_TWAP_MIN_AGE, params::SHORT_TWAP_MAX_AGE);
  pub const LongWindow: ObservationWindow =
    ObservationWindow::new(params::LONG_TWAP_MIN_AGE, params::LONG_TWAP_MAX_AGE);
  pub static ReweighsBeforeReindex: u32 = params::REWEIGHS_BEFORE_REINDEX;
}

impl pallet_price_oracle::Config for Test {
  type PriceSource = MockVenue;
  type UnixTime = Timestamp;
  type MinUpdatePeriod = ConstU64<{ params::MIN_UPDATE_PERIOD }>;
  type ObservationPeriod = ConstU64<{ params::OBSERVATION_PERIOD }>;
  type MaxBatchSize = ConstU32<16>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = TestBenchmarkHelper;
}

impl pallet_category_registry::Config for Test {
  type Assets = Assets;
  type PriceOracle = Oracle;
  type UnixTime = Timestamp;
  type AdminOrigin = EnsureRoot<u64>;
  type MaxCategoryAssets = ConstU32<{ params::MAX_CATEGORY_TOKENS }>;
  type MaxSortDelay = ConstU64<{ params::MAX_SORT_DELAY }>;
  type MarketCapWindow = LongWindow;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = TestBenchmarkHelper;
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
  type PriceOracle = Oracle;
  type Venue = MockVenue;
  type PriceWindow = ShortWindow;
  type DefaultPremium = ConstU8<{ params::DEFAULT_SELLER_PREMIUM }>;
  type MaxPremium = ConstU8<{ params::MAX_SELLER_PREMIUM }>;
  type WeightInfo = ();
  #[cfg(feature = "runtime-benchmarks")]
  type BenchmarkHelper = TestBenchmarkHelper;
}

impl pallet_index_controller::Config for Test {
  type UnixTime = Timestamp;
  type PalletId = ControllerPalletId;
  type AdminOrigin = EnsureRoot<u64>;
  type Categories = CategoryRegistry;
  type PriceOracle = Oracle;
  type Pools = WeightedPool;
  type Liquidator = Liquidator;
  type PriceWindow = ShortWindow;
  type WeightBudget = ConstU128<{ params::WEIGHT_BUDGET }>;
  type MinIndexSize = ConstU32<{ params::MIN_INDEX_SIZE }>;
  type MaxIndexSize = ConstU32<{ params::MAX_INDEX_SIZE }>;
  type RebalanceDelay = ConstU64<{ params::POOL_REBALANCE_DELAY }>;
  type ReweighsBeforeReindex = ReweighsBeforeReindex;
  type MinimumBalanceDivisor = ConstU128<{ params::MINIMUM_BALANCE_DIVISOR }>;
  type DefaultSwapFee = ConstU128<{ params::DEFAULT_SWAP_FEE }>;
  type DefaultPremium = ConstU8<{ params::DEFAULT_SELLER_PREMIUM }>;
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
fn fund(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
  ensure_asset(asset)?;
  <Assets as Mutate<u64>>::mint_into(asset, who, amount)?;
  if MockVenue::price(asset).is_err() {
    MockVenue::set_price(asset, 1);
  }
  Ok(())
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_price_oracle::BenchmarkHelper for TestBenchmarkHelper {
  fn register_price(asset: AssetId) -> DispatchResult {
    MockVenue::set_price(asset, 2);
    Ok(())
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_category_registry::BenchmarkHelper for TestBenchmarkHelper {
  fn register_asset(asset: AssetId, supply: Balance, price: u128) -> DispatchResult {
    ensure_asset(asset)?;
    <Assets as Mutate<u64>>::mint_into(asset, &ALICE, supply)?;
    MockVenue::set_price(asset, price);
    Ok(())
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_weighted_pool::BenchmarkHelper<u64> for TestBenchmarkHelper {
  fn create_asset(asset: AssetId) -> DispatchResult {
    ensure_asset(asset)
  }

  fn fund_account(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
    fund(who, asset, amount)
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_unbound_liquidator::BenchmarkHelper<u64> for TestBenchmarkHelper {
  fn create_pool(controller: &u64, desired: AssetId) -> Result<PoolId, DispatchError> {
    let assets = [desired, desired + 1];
    for asset in assets {
      fund(controller, asset, units(1_000))?;
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
    sample_and_wait(&assets);
    Ok(pool)
  }

  fn fund_account(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
    fund(who, asset, amount)?;
    sample_and_wait(&[asset]);
    Ok(())
  }
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_index_controller::BenchmarkHelper<u64> for TestBenchmarkHelper {
  fn create_category(n: u32) -> Result<CategoryId, DispatchError> {
    let assets: alloc::vec::Vec<AssetId> = (100..100 + n).collect();
    for (rank, asset) in assets.iter().enumerate() {
      ensure_asset(*asset)?;
      <Assets as Mutate<u64>>::mint_into(*asset, &ALICE, SUPPLY)?;
      MockVenue::set_price(*asset, (n as u128 - rank as u128) * 10);
    }
    setup_category(&assets)
  }

  fn fund_account(who: &u64, asset: AssetId, amount: Balance) -> DispatchResult {
    fund(who, asset, amount)
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

/// Samples `assets` and waits out the short window's minimum age
pub fn sample_and_wait(assets: &[AssetId]) {
  for asset in assets {
    Oracle::do_update_price(*asset).expect("asset has a venue pair");
  }
  advance_time(HOUR);
}

/// Category of `assets`, sorted with long and short averages available
pub fn setup_category(assets: &[AssetId]) -> Result<CategoryId, DispatchError> {
  let category = CategoryRegistry::do_create_category(H256::repeat_byte(1))?;
  for asset in assets {
    CategoryRegistry::do_add_asset(category, *asset)?;
  }
  advance_time(params::LONG_TWAP_MIN_AGE - HOUR);
  sample_and_wait(assets);
  CategoryRegistry::do_sort_by_market_cap(category)?;
  Ok(category)
}

/// Category 0 of the four genesis assets
pub fn genesis_category() -> CategoryId {
  setup_category(&[ASSET_A, ASSET_B, ASSET_C, ASSET_D]).expect("category set up")
}

/// Index over the top three assets of `category`, seeded by ALICE with 10 000 reference units
pub fn deploy(category: CategoryId) -> PoolId {
  let pool = IndexController::do_prepare_index(
    category,
    3,
    units(10_000),
    b"Top Three".to_vec(),
    b"TOP3".to_vec(),
  )
  .expect("index prepared");
  IndexController::do_deploy_index(&ALICE, pool).expect("index deployed");
  pool
}

/// Waits out the rebalance delay, then refreshes short averages and the category sort
pub fn next_epoch(category: CategoryId) {
  advance_time(params::POOL_REBALANCE_DELAY);
  sample_and_wait(&CategoryRegistry::category_assets(category));
  CategoryRegistry::do_sort_by_market_cap(category).expect("category sorted");
}

pub fn new_test_ext() -> polkadot_sdk::sp_io::TestExternalities {
  let mut t = frame_system::GenesisConfig::<Test>::default()
    .build_storage()
    .unwrap();

  let assets = [ASSET_A, ASSET_B, ASSET_C, ASSET_D];
  polkadot_sdk::pallet_assets::GenesisConfig::<Test> {
    assets: assets.iter().map(|id| (*id, ALICE, true, 1)).collect(),
    metadata: alloc::vec![],
    accounts: alloc::vec![
      (ASSET_A, ALICE, SUPPLY - units(10_000)),
      (ASSET_A, BOB, units(10_000)),
      (ASSET_B, ALICE, SUPPLY),
      (ASSET_C, ALICE, SUPPLY),
      (ASSET_D, ALICE, SUPPLY / 2),
    ],
    reserves: alloc::vec![],
    next_asset_id: None,
  }
  .assimilate_storage(&mut t)
  .unwrap();

  let mut ext: polkadot_sdk::sp_io::TestExternalities = t.into();
  ext.execute_with(|| {
    System::set_block_number(1);
    set_time(START);
    PAIRS.with(|pairs| pairs.borrow_mut().clear());
    // market caps 10, 4, 1 and 0.5 million reference units
    for (asset, price) in [(ASSET_A, 10), (ASSET_B, 4), (ASSET_C, 1), (ASSET_D, 1)] {
      MockVenue::set_price(asset, price);
    }
    ReweighsBeforeReindex::set(params::REWEIGHS_BEFORE_REINDEX);
  });
  ext
}
