//! Chrono crate type implementations (NaiveDate, NaiveTime, NaiveDateTime, DateTime<Utc>).
//!
//! PostgreSQL counts dates in days and timestamps in microseconds from
//! 2000-01-01. The `infinity` sentinels fall outside chrono's range and are
//! reported as decode errors.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Error, Result};
use crate::protocol::types::{Oid, oid};

use super::FromWireValue;

/// PostgreSQL epoch: 2000-01-01
const PG_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2000, 1, 1) {
    Some(d) => d,
    None => panic!("invalid date"),
};

/// Microseconds per second
const USECS_PER_SEC: i64 = 1_000_000;

fn be_i64(bytes: &[u8], what: &str) -> Result<i64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::Decode(format!("invalid {} length: {}", what, bytes.len())))?;
    Ok(i64::from_be_bytes(arr))
}

impl FromWireValue<'_> for NaiveDate {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::DATE {
            return Err(Error::Decode(format!(
                "cannot decode oid {} as NaiveDate",
                oid
            )));
        }
        let arr: [u8; 4] = bytes
            .try_into()
            .map_err(|_| Error::Decode(format!("invalid Date length: {}", bytes.len())))?;
        let pg_days = i32::from_be_bytes(arr);
        PG_EPOCH
            .checked_add_signed(Duration::days(pg_days as i64))
            .ok_or_else(|| Error::Decode(format!("date out of range: {} days", pg_days)))
    }
}

impl FromWireValue<'_> for NaiveTime {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::TIME {
            return Err(Error::Decode(format!(
                "cannot decode oid {} as NaiveTime",
                oid
            )));
        }
        let usecs = be_i64(bytes, "Time")?;
        if usecs < 0 {
            return Err(Error::Decode(format!("invalid time: {} usecs", usecs)));
        }
        let secs = (usecs / USECS_PER_SEC) as u32;
        let nano = ((usecs % USECS_PER_SEC) * 1000) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nano)
            .ok_or_else(|| Error::Decode(format!("invalid time: {} usecs", usecs)))
    }
}

impl FromWireValue<'_> for NaiveDateTime {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if !matches!(oid, oid::TIMESTAMP | oid::TIMESTAMPTZ) {
            return Err(Error::Decode(format!(
                "cannot decode oid {} as NaiveDateTime",
                oid
            )));
        }
        let usecs = be_i64(bytes, "Timestamp")?;
        PG_EPOCH
            .and_time(NaiveTime::MIN)
            .checked_add_signed(Duration::microseconds(usecs))
            .ok_or_else(|| Error::Decode(format!("timestamp out of range: {} usecs", usecs)))
    }
}

impl FromWireValue<'_> for DateTime<Utc> {
    fn from_binary(oid: Oid, bytes: &[u8]) -> Result<Self> {
        if oid != oid::TIMESTAMPTZ {
            return Err(Error::Decode(format!(
                "cannot decode oid {} as DateTime<Utc>",
                oid
            )));
        }
        // TIMESTAMPTZ is stored as UTC
        NaiveDateTime::from_binary(oid, bytes).map(|dt| dt.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_date_binary() {
        // 2024-01-15 is 8780 days since 2000-01-01
        let date = NaiveDate::from_binary(oid::DATE, &8780_i32.to_be_bytes()).unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 15));

        let before = NaiveDate::from_binary(oid::DATE, &(-1_i32).to_be_bytes()).unwrap();
        assert_eq!((before.year(), before.month(), before.day()), (1999, 12, 31));
    }

    #[test]
    fn test_date_infinity() {
        assert!(NaiveDate::from_binary(oid::DATE, &i32::MAX.to_be_bytes()).is_err());
    }

    #[test]
    fn test_time_binary() {
        let usecs: i64 = (10 * 3600 + 30 * 60 + 45) * 1_000_000 + 123_456;
        let time = NaiveTime::from_binary(oid::TIME, &usecs.to_be_bytes()).unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (10, 30, 45));
        assert_eq!(time.nanosecond(), 123_456_000);
    }

    #[test]
    fn test_timestamp_before_epoch() {
        // 1999-12-31 23:59:59.5
        let ts = NaiveDateTime::from_binary(oid::TIMESTAMP, &(-500_000_i64).to_be_bytes()).unwrap();
        assert_eq!(ts.year(), 1999);
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (23, 59, 59));
        assert_eq!(ts.nanosecond(), 500_000_000);
    }

    #[test]
    fn test_timestamptz() {
        let usecs: i64 = 86_400 * USECS_PER_SEC;
        let ts = DateTime::<Utc>::from_binary(oid::TIMESTAMPTZ, &usecs.to_be_bytes()).unwrap();
        assert_eq!(ts.to_rfc3339(), "2000-01-02T00:00:00+00:00");
        assert!(DateTime::<Utc>::from_binary(oid::TIMESTAMP, &usecs.to_be_bytes()).is_err());
    }
}
