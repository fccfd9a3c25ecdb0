//! Binary fixed-point fractions.
//!
//! Oracle prices are carried as UQ112x112 numbers: an unsigned 256-bit integer whose low
//! 112 bits are the fractional part. Only 224 bits are ever significant, which leaves room
//! to multiply by a 32-bit elapsed time (cumulative prices) or, through [`Uq144x112`], by an
//! integer amount without losing the fraction.

use codec::{Decode, Encode, MaxEncodedLen};
use polkadot_sdk::sp_core::U256;
use scale_info::TypeInfo;
use sp_arithmetic::ArithmeticError;

/// Number of fractional bits.
pub const RESOLUTION: usize = 112;

fn q112() -> U256 {
  U256::one() << RESOLUTION
}

fn max_uq112x112() -> U256 {
  (U256::one() << (2 * RESOLUTION)) - U256::one()
}

/// Unsigned fixed-point number with 112 integer and 112 fractional bits.
#[derive(
  Clone, Copy, Debug, Decode, Default, Encode, Eq, MaxEncodedLen, Ord, PartialEq, PartialOrd, TypeInfo,
)]
pub struct Uq112x112(pub U256);

/// Product of a [`Uq112x112`] and an integer: 144 integer bits, 112 fractional bits.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Uq144x112(pub U256);

impl Uq112x112 {
  pub fn zero() -> Self {
    Self(U256::zero())
  }

  pub fn one() -> Self {
    Self(q112())
  }

  pub fn is_zero(&self) -> bool {
    self.0.is_zero()
  }

  /// Encodes an integer as a fraction. Fails if `x` does not fit in 112 bits.
  pub fn from_integer(x: u128) -> Result<Self, ArithmeticError> {
    let value = U256::from(x) << RESOLUTION;
    if value > max_uq112x112() {
      return Err(ArithmeticError::Overflow);
    }
    Ok(Self(value))
  }

  /// `numerator / denominator` as a fraction.
  pub fn fraction(numerator: U256, denominator: U256) -> Result<Self, ArithmeticError> {
    if denominator.is_zero() {
      return Err(ArithmeticError::DivisionByZero);
    }
    let shifted = numerator
      .checked_mul(q112())
      .ok_or(ArithmeticError::Overflow)?;
    let value = shifted / denominator;
    if value > max_uq112x112() {
      return Err(ArithmeticError::Overflow);
    }
    Ok(Self(value))
  }

  /// Multiplies by an integer, keeping the fractional bits of the product.
  pub fn mul(self, y: u128) -> Result<Uq144x112, ArithmeticError> {
    self
      .0
      .checked_mul(U256::from(y))
      .map(Uq144x112)
      .ok_or(ArithmeticError::Overflow)
  }

  /// `1 / self`.
  pub fn reciprocal(self) -> Result<Self, ArithmeticError> {
    if self.0.is_zero() {
      return Err(ArithmeticError::DivisionByZero);
    }
    let value = (U256::one() << (2 * RESOLUTION)) / self.0;
    if value > max_uq112x112() {
      return Err(ArithmeticError::Overflow);
    }
    Ok(Self(value))
  }

  /// Integer part.
  pub fn decode(self) -> U256 {
    self.0 >> RESOLUTION
  }

  /// Average rate between two accumulator readings taken `elapsed` seconds apart.
  ///
  /// Accumulators are allowed to wrap around 2^256, so the difference is taken modulo
  /// 2^256.
  pub fn from_cumulative_delta(
    older: U256,
    newer: U256,
    elapsed: u64,
  ) -> Result<Self, ArithmeticError> {
    if elapsed == 0 {
      return Err(ArithmeticError::DivisionByZero);
    }
    let (delta, _) = newer.overflowing_sub(older);
    let value = delta / U256::from(elapsed);
    if value > max_uq112x112() {
      return Err(ArithmeticError::Overflow);
    }
    Ok(Self(value))
  }
}

impl Uq144x112 {
  /// Integer part, up to 144 bits.
  pub fn decode144(self) -> U256 {
    self.0 >> RESOLUTION
  }

  /// Integer part narrowed to `u128`.
  pub fn decode_u128(self) -> Result<u128, ArithmeticError> {
    let value = self.decode144();
    if value > U256::from(u128::MAX) {
      return Err(ArithmeticError::Overflow);
    }
    Ok(value.as_u128())
  }
}

/// Integer square root by Newton's iteration, `floor(sqrt(y))`.
pub fn sqrt(y: U256) -> U256 {
  if y > U256::from(3u8) {
    let mut z = y;
    let mut x = y / 2 + 1;
    while x < z {
      z = x;
      x = (y / x + x) / 2;
    }
    z
  } else if !y.is_zero() {
    U256::one()
  } else {
    U256::zero()
  }
}
