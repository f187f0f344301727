//! # Bill Identity
//!
//! Opaque ids for bills and products, and human-readable bill numbers.
//!
//! ## Bill Number Format
//! ```text
//! BILL-20240115-143052
//! │    │        │
//! │    │        └── HHMMSS  (finalization time)
//! │    └─────────── YYYYMMDD (finalization date)
//! └──────────────── fixed prefix
//! ```
//!
//! Two bills finalized within the same second share a bill number. That is
//! accepted: the UUID `id` is the authoritative key, the bill number is
//! only for people.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use uuid::Uuid;

use crate::BILL_NUMBER_PREFIX;

/// Identity minted for a bill at finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillIdentity {
    pub id: String,
    pub bill_number: String,
    pub date: DateTime<Utc>,
}

impl BillIdentity {
    /// Mints a fresh identity for a bill finalized at `now`.
    ///
    /// The bill number uses the wall-clock time of `tz`, the way a cashier
    /// reads it; `date` stays in UTC.
    pub fn mint<Tz>(now: DateTime<Utc>, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        BillIdentity {
            id: new_id(),
            bill_number: bill_number(&now.with_timezone(tz)),
            date: now,
        }
    }
}

/// Generates a new opaque identifier (UUID v4).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Formats a bill number for the given timestamp.
///
/// ## Example
/// ```rust
/// use billgen_core::identity::bill_number;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap();
/// assert_eq!(bill_number(&at), "BILL-20240115-143052");
/// ```
pub fn bill_number<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}-{}-{}",
        BILL_NUMBER_PREFIX,
        at.format("%Y%m%d"),
        at.format("%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_bill_number_format() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap();
        assert_eq!(bill_number(&at), "BILL-20240115-143052");
    }

    #[test]
    fn test_bill_number_pads_single_digits() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(bill_number(&at), "BILL-20240305-070809");
    }

    #[test]
    fn test_mint_uses_local_wall_clock_for_number() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        let identity = BillIdentity::mint(now, &ist);

        assert_eq!(identity.bill_number, "BILL-20240116-050000");
        assert_eq!(identity.date, now);
    }

    #[test]
    fn test_same_second_shares_number_not_id() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 14, 30, 52).unwrap();
        let a = BillIdentity::mint(now, &Utc);
        let b = BillIdentity::mint(now, &Utc);

        assert_eq!(a.bill_number, b.bill_number);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_new_id_is_uuid() {
        let id = new_id();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_ne!(id, new_id());
    }
}
