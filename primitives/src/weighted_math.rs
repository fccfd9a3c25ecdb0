//! Weighted pool math in BONE fixed point.
//!
//! Every quantity is a `u128` scaled by [`BONE`]. Products and quotients are computed in
//! `U256` and narrowed back with an overflow check, so no operation here can wrap.

use crate::ecosystem::params::BONE;
use polkadot_sdk::sp_core::U256;
use sp_arithmetic::ArithmeticError;

pub type MathResult<T> = Result<T, ArithmeticError>;

/// Smallest base accepted by [`bpow`].
pub const MIN_BPOW_BASE: u128 = 1;
/// Largest base accepted by [`bpow`]; the binomial series only converges below 2.
pub const MAX_BPOW_BASE: u128 = 2 * BONE - 1;
/// Series terms below this value are dropped by [`bpow_approx`].
pub const BPOW_PRECISION: u128 = BONE / 10_000_000_000;

fn narrow(x: U256) -> MathResult<u128> {
  if x > U256::from(u128::MAX) {
    return Err(ArithmeticError::Overflow);
  }
  Ok(x.as_u128())
}

pub fn btoi(a: u128) -> u128 {
  a / BONE
}

pub fn bfloor(a: u128) -> u128 {
  btoi(a) * BONE
}

pub fn badd(a: u128, b: u128) -> MathResult<u128> {
  a.checked_add(b).ok_or(ArithmeticError::Overflow)
}

pub fn bsub(a: u128, b: u128) -> MathResult<u128> {
  a.checked_sub(b).ok_or(ArithmeticError::Underflow)
}

/// `|a - b|` and whether the difference is negative.
pub fn bsub_sign(a: u128, b: u128) -> (u128, bool) {
  if a >= b { (a - b, false) } else { (b - a, true) }
}

/// `a * b`, rounded half up.
pub fn bmul(a: u128, b: u128) -> MathResult<u128> {
  let c = U256::from(a) * U256::from(b) + U256::from(BONE / 2);
  narrow(c / U256::from(BONE))
}

/// `a / b`, rounded half up.
pub fn bdiv(a: u128, b: u128) -> MathResult<u128> {
  if b == 0 {
    return Err(ArithmeticError::DivisionByZero);
  }
  let c = U256::from(a) * U256::from(BONE) + U256::from(b / 2);
  narrow(c / U256::from(b))
}

/// `a ^ n` for an integer exponent.
pub fn bpowi(mut a: u128, mut n: u128) -> MathResult<u128> {
  let mut z = if n % 2 != 0 { a } else { BONE };
  n /= 2;
  while n != 0 {
    a = bmul(a, a)?;
    if n % 2 != 0 {
      z = bmul(z, a)?;
    }
    n /= 2;
  }
  Ok(z)
}

/// `base ^ exp` for a fractional exponent.
///
/// The whole part of the exponent is handled by [`bpowi`] and the remainder by a
/// binomial series, which requires `base` within `[MIN_BPOW_BASE, MAX_BPOW_BASE]`.
pub fn bpow(base: u128, exp: u128) -> MathResult<u128> {
  if base < MIN_BPOW_BASE {
    return Err(ArithmeticError::Underflow);
  }
  if base > MAX_BPOW_BASE {
    return Err(ArithmeticError::Overflow);
  }

  let whole = bfloor(exp);
  let remain = exp - whole;
  let whole_pow = bpowi(base, btoi(whole))?;
  if remain == 0 {
    return Ok(whole_pow);
  }
  let partial = bpow_approx(base, remain, BPOW_PRECISION)?;
  bmul(whole_pow, partial)
}

/// Binomial expansion of `base ^ exp` for `exp < 1`.
pub fn bpow_approx(base: u128, exp: u128, precision: u128) -> MathResult<u128> {
  let a = exp;
  let (x, xneg) = bsub_sign(base, BONE);
  let mut term = BONE;
  let mut sum = term;
  let mut negative = false;

  let mut i: u128 = 1;
  while term >= precision {
    let big_k = i.checked_mul(BONE).ok_or(ArithmeticError::Overflow)?;
    let (c, cneg) = bsub_sign(a, bsub(big_k, BONE)?);
    term = bmul(term, bmul(c, x)?)?;
    term = bdiv(term, big_k)?;
    if term == 0 {
      break;
    }
    if xneg {
      negative = !negative;
    }
    if cneg {
      negative = !negative;
    }
    sum = if negative { bsub(sum, term)? } else { badd(sum, term)? };
    i += 1;
  }
  Ok(sum)
}

/// Spot price of `out` in units of `in`, including the swap fee.
pub fn calc_spot_price(
  balance_in: u128,
  weight_in: u128,
  balance_out: u128,
  weight_out: u128,
  swap_fee: u128,
) -> MathResult<u128> {
  let numer = bdiv(balance_in, weight_in)?;
  let denom = bdiv(balance_out, weight_out)?;
  let ratio = bdiv(numer, denom)?;
  let scale = bdiv(BONE, bsub(BONE, swap_fee)?)?;
  bmul(ratio, scale)
}

/// Output of a swap with an exact input amount.
///
/// `out = balance_out * (1 - (balance_in / (balance_in + in * (1 - fee))) ^ (w_in / w_out))`
pub fn calc_out_given_in(
  balance_in: u128,
  weight_in: u128,
  balance_out: u128,
  weight_out: u128,
  amount_in: u128,
  swap_fee: u128,
) -> MathResult<u128> {
  let weight_ratio = bdiv(weight_in, weight_out)?;
  let adjusted_in = bmul(amount_in, bsub(BONE, swap_fee)?)?;
  let y = bdiv(balance_in, badd(balance_in, adjusted_in)?)?;
  let foo = bpow(y, weight_ratio)?;
  let bar = bsub(BONE, foo)?;
  bmul(balance_out, bar)
}

/// Input required by a swap with an exact output amount.
///
/// `in = balance_in * ((balance_out / (balance_out - out)) ^ (w_out / w_in) - 1) / (1 - fee)`
pub fn calc_in_given_out(
  balance_in: u128,
  weight_in: u128,
  balance_out: u128,
  weight_out: u128,
  amount_out: u128,
  swap_fee: u128,
) -> MathResult<u128> {
  let weight_ratio = bdiv(weight_out, weight_in)?;
  let diff = bsub(balance_out, amount_out)?;
  let y = bdiv(balance_out, diff)?;
  let foo = bsub(bpow(y, weight_ratio)?, BONE)?;
  let amount_in = bmul(balance_in, foo)?;
  bdiv(amount_in, bsub(BONE, swap_fee)?)
}

/// Pool shares minted for a single-asset deposit.
///
/// The part of the deposit that would have to be swapped into the other assets pays the
/// swap fee.
pub fn calc_pool_out_given_single_in(
  balance_in: u128,
  weight_in: u128,
  pool_supply: u128,
  total_weight: u128,
  amount_in: u128,
  swap_fee: u128,
) -> MathResult<u128> {
  let normalized_weight = bdiv(weight_in, total_weight)?;
  let zaz = bmul(bsub(BONE, normalized_weight)?, swap_fee)?;
  let amount_in_after_fee = bmul(amount_in, bsub(BONE, zaz)?)?;

  let new_balance_in = badd(balance_in, amount_in_after_fee)?;
  let in_ratio = bdiv(new_balance_in, balance_in)?;

  let pool_ratio = bpow(in_ratio, normalized_weight)?;
  let new_pool_supply = bmul(pool_ratio, pool_supply)?;
  bsub(new_pool_supply, pool_supply)
}

/// Single-asset deposit required to mint an exact amount of pool shares.
pub fn calc_single_in_given_pool_out(
  balance_in: u128,
  weight_in: u128,
  pool_supply: u128,
  total_weight: u128,
  pool_amount_out: u128,
  swap_fee: u128,
) -> MathResult<u128> {
  let normalized_weight = bdiv(weight_in, total_weight)?;
  let new_pool_supply = badd(pool_supply, pool_amount_out)?;
  let pool_ratio = bdiv(new_pool_supply, pool_supply)?;

  let boo = bdiv(BONE, normalized_weight)?;
  let in_ratio = bpow(pool_ratio, boo)?;
  let new_balance_in = bmul(in_ratio, balance_in)?;
  let amount_in_after_fee = bsub(new_balance_in, balance_in)?;

  let zar = bmul(bsub(BONE, normalized_weight)?, swap_fee)?;
  bdiv(amount_in_after_fee, bsub(BONE, zar)?)
}

/// Single-asset withdrawal for burning an exact amount of pool shares.
///
/// `exit_fee` is charged on the shares before they are redeemed.
pub fn calc_single_out_given_pool_in(
  balance_out: u128,
  weight_out: u128,
  pool_supply: u128,
  total_weight: u128,
  pool_amount_in: u128,
  swap_fee: u128,
  exit_fee: u128,
) -> MathResult<u128> {
  let normalized_weight = bdiv(weight_out, total_weight)?;
  let pool_in_after_exit_fee = bmul(pool_amount_in, bsub(BONE, exit_fee)?)?;
  let new_pool_supply = bsub(pool_supply, pool_in_after_exit_fee)?;
  let pool_ratio = bdiv(new_pool_supply, pool_supply)?;

  let out_ratio = bpow(pool_ratio, bdiv(BONE, normalized_weight)?)?;
  let new_balance_out = bmul(out_ratio, balance_out)?;
  let amount_out_before_fee = bsub(balance_out, new_balance_out)?;

  let zaz = bmul(bsub(BONE, normalized_weight)?, swap_fee)?;
  bmul(amount_out_before_fee, bsub(BONE, zaz)?)
}

/// Pool shares to burn for an exact single-asset withdrawal.
pub fn calc_pool_in_given_single_out(
  balance_out: u128,
  weight_out: u128,
  pool_supply: u128,
  total_weight: u128,
  amount_out: u128,
  swap_fee: u128,
  exit_fee: u128,
) -> MathResult<u128> {
  let normalized_weight = bdiv(weight_out, total_weight)?;
  let zoo = bsub(BONE, normalized_weight)?;
  let zar = bmul(zoo, swap_fee)?;
  let amount_out_before_fee = bdiv(amount_out, bsub(BONE, zar)?)?;

  let new_balance_out = bsub(balance_out, amount_out_before_fee)?;
  let out_ratio = bdiv(new_balance_out, balance_out)?;

  let pool_ratio = bpow(out_ratio, normalized_weight)?;
  let new_pool_supply = bmul(pool_ratio, pool_supply)?;
  let pool_in_after_exit_fee = bsub(pool_supply, new_pool_supply)?;
  bdiv(pool_in_after_exit_fee, bsub(BONE, exit_fee)?)
}
