//! 100-nanosecond ticks since 0001-01-01T00:00:00Z.
//!
//! Tick counts are carried as `BigInt` through every conversion; only the
//! final result is narrowed to an `i64`.

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::{EvalError, EvalResult};

pub const TICKS_PER_MILLISECOND: i64 = 10_000;
pub const TICKS_PER_SECOND: i64 = 10_000_000;
pub const TICKS_PER_MINUTE: i64 = 600_000_000;
pub const TICKS_PER_HOUR: i64 = 36_000_000_000;
pub const TICKS_PER_DAY: i64 = 864_000_000_000;

/// Ticks at 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

pub fn to_ticks(dt: &DateTime<Utc>) -> BigInt {
    BigInt::from(dt.timestamp()) * TICKS_PER_SECOND
        + BigInt::from(dt.timestamp_subsec_nanos() / 100)
        + UNIX_EPOCH_TICKS
}

pub fn from_ticks(ticks: &BigInt) -> EvalResult<DateTime<Utc>> {
    let out_of_range =
        || EvalError::invalid(format!("{} is out of the supported datetime range.", ticks));
    let since_epoch = ticks - BigInt::from(UNIX_EPOCH_TICKS);
    let per_second = BigInt::from(TICKS_PER_SECOND);
    let mut seconds = &since_epoch / &per_second;
    let mut remainder = &since_epoch % &per_second;
    if remainder < BigInt::zero() {
        seconds -= 1;
        remainder += &per_second;
    }
    let seconds = seconds.to_i64().ok_or_else(out_of_range)?;
    let nanos = remainder.to_u32().ok_or_else(out_of_range)? * 100;
    DateTime::from_timestamp(seconds, nanos).ok_or_else(out_of_range)
}

pub fn narrow(ticks: BigInt) -> EvalResult<i64> {
    ticks
        .to_i64()
        .ok_or_else(|| EvalError::invalid(format!("{} does not fit in a 64-bit integer.", ticks)))
}

/// `ticks` expressed in `unit`-sized ticks, as a float.
pub fn scale(ticks: i64, unit: i64) -> f64 {
    let whole = BigInt::from(ticks) / unit;
    let rest = BigInt::from(ticks) % unit;
    whole.to_f64().unwrap_or(f64::NAN) + rest.to_f64().unwrap_or(0.0) / unit as f64
}
