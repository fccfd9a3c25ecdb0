use polkadot_sdk::frame_support::pallet_prelude::*;
use primitives::{Balance, Moment};

/// Maximum length of a pool name or symbol
pub type NameLimit = ConstU32<32>;

/// Pool-level state
#[derive(Encode, Decode, Clone, PartialEq, Eq, RuntimeDebug, TypeInfo, MaxEncodedLen)]
pub struct PoolInfo<AccountId> {
  /// Account allowed to bind, unbind and reweigh assets
  pub controller: AccountId,
  /// Swap fee as a BONE fraction
  pub swap_fee: Balance,
  pub public_swap: bool,
  /// Set once the initial assets have been bound
  pub initialized: bool,
  /// Sum of the current weights of all ready assets
  pub total_weight: Balance,
  /// Outstanding pool shares
  pub total_supply: Balance,
  pub name: BoundedVec<u8, NameLimit>,
  pub symbol: BoundedVec<u8, NameLimit>,
}

/// State of one bound asset
///
/// A record that is not ready holds its real balance in `balance` and a zero
/// `current_weight`; swaps and joins price it with its minimum balance instead.
#[derive(
  Encode, Decode, Clone, Copy, PartialEq, Eq, Default, RuntimeDebug, TypeInfo, MaxEncodedLen,
)]
pub struct AssetRecord {
  pub bound: bool,
  pub ready: bool,
  /// Time of the last weight change
  pub last_weight_update: Moment,
  pub current_weight: Balance,
  /// Weight the asset converges towards; zero marks it for removal
  pub desired_weight: Balance,
  /// Position in the pool's asset list
  pub index: u8,
  pub balance: Balance,
}
