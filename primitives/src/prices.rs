//! Time-weighted price types shared by the oracle and its consumers.

use crate::{ecosystem::Moment, fixed_point::Uq112x112};
use codec::{Decode, Encode, MaxEncodedLen};
use polkadot_sdk::sp_core::U256;
use scale_info::TypeInfo;
use sp_arithmetic::ArithmeticError;

/// A sample of an asset's cumulative prices against the reference asset.
///
/// `price_cumulative` integrates the UQ112x112 price of one asset unit in reference units
/// over seconds; `reference_price_cumulative` integrates the inverse price.
#[derive(Clone, Copy, Debug, Decode, Default, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo)]
pub struct PriceObservation {
  pub timestamp: Moment,
  pub price_cumulative: U256,
  pub reference_price_cumulative: U256,
}

impl PriceObservation {
  /// Average prices over the interval from `older` to `self`.
  pub fn average_since(&self, older: &PriceObservation) -> Result<TwoWayAveragePrice, ArithmeticError> {
    let elapsed = self
      .timestamp
      .checked_sub(older.timestamp)
      .ok_or(ArithmeticError::Underflow)?;
    Ok(TwoWayAveragePrice {
      price_average: Uq112x112::from_cumulative_delta(
        older.price_cumulative,
        self.price_cumulative,
        elapsed,
      )?,
      reference_price_average: Uq112x112::from_cumulative_delta(
        older.reference_price_cumulative,
        self.reference_price_cumulative,
        elapsed,
      )?,
    })
  }
}

/// Accepted age range of the older sample bracketing an average price query.
///
/// The lower bound rules out samples taken too recently to resist single-block
/// manipulation; the upper bound rules out stale data.
#[derive(Clone, Copy, Debug, Decode, Default, Encode, Eq, MaxEncodedLen, PartialEq, TypeInfo)]
pub struct ObservationWindow {
  pub min_age: Moment,
  pub max_age: Moment,
}

impl ObservationWindow {
  pub const fn new(min_age: Moment, max_age: Moment) -> Self {
    Self { min_age, max_age }
  }
}

/// Average price of an asset in reference units together with the inverse average.
///
/// Both directions are kept because the average of the inverse is not the inverse of the
/// average.
#[derive(Clone, Copy, Debug, Decode, Default, Encode, Eq, PartialEq, TypeInfo)]
pub struct TwoWayAveragePrice {
  pub price_average: Uq112x112,
  pub reference_price_average: Uq112x112,
}

impl TwoWayAveragePrice {
  /// Reference-asset value of `amount` units of the asset.
  pub fn reference_for_assets(&self, amount: u128) -> Result<u128, ArithmeticError> {
    self.price_average.mul(amount)?.decode_u128()
  }

  /// Asset units worth `value` reference units.
  pub fn assets_for_reference(&self, value: u128) -> Result<u128, ArithmeticError> {
    self.reference_price_average.mul(value)?.decode_u128()
  }
}
