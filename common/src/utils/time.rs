use chrono::prelude::*;
use mockable::Clock;

pub const SECOND1: u64 = 1000;

pub const MINUTE1: u64 = 60 * SECOND1;

pub const MINUTE2: u64 = 2 * MINUTE1;

pub const MINUTE5: u64 = 5 * MINUTE1;

pub const MINUTE15: u64 = 15 * MINUTE1;

pub const HOUR1: u64 = 60 * MINUTE1;

pub const DAY1: u64 = 24 * HOUR1;
pub const DAY15: u64 = 15 * DAY1;

pub fn current_date() -> String {
    let dt: DateTime<Local> = Local::now();
    dt.format("%Y-%m-%d %H:%M:%S.%f").to_string()
}

/// Milliseconds since the epoch according to `clock`.
pub fn clock_millis(clock: &dyn Clock) -> u64 {
    clock.utc().timestamp_millis().max(0) as u64
}

/// Seconds since the epoch according to `clock`, as used in jwt claims.
pub fn clock_secs(clock: &dyn Clock) -> u64 {
    clock.utc().timestamp().max(0) as u64
}
