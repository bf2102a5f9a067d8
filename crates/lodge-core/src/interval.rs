//! # Stay Interval Module
//!
//! Half-open date ranges for stays: `[check_in, check_out)`.
//!
//! ## Why Half-Open?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SAME-DAY TURNOVER                                                      │
//! │                                                                         │
//! │  Guest A:  Mar 01 ────────── Mar 03   [01, 03)                         │
//! │  Guest B:               Mar 03 ────── Mar 05   [03, 05)                │
//! │                                                                         │
//! │  A checks out the morning of Mar 03, B checks in that afternoon.      │
//! │  With half-open intervals these do NOT overlap - turnover is legal     │
//! │  without any special casing.                                           │
//! │                                                                         │
//! │  Overlap test: a.check_in < b.check_out && a.check_out > b.check_in    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, DomainResult};
use crate::MAX_STAY_NIGHTS;

// =============================================================================
// Stay Interval
// =============================================================================

/// A half-open date range `[check_in, check_out)`.
///
/// Invariant: `check_in < check_out` - enforced at construction, so every
/// `StayInterval` in the system represents at least one night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayInterval {
    check_in: NaiveDate,
    check_out: NaiveDate,
}

impl StayInterval {
    /// Creates a stay interval, validating `check_in < check_out`.
    ///
    /// ## Errors
    /// `DomainError::InvalidInterval` if the range is empty, inverted, or
    /// longer than [`MAX_STAY_NIGHTS`].
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> DomainResult<Self> {
        if check_in >= check_out {
            return Err(DomainError::InvalidInterval {
                reason: format!("check_in {} must be before check_out {}", check_in, check_out),
            });
        }

        let nights = (check_out - check_in).num_days();
        if nights > MAX_STAY_NIGHTS {
            return Err(DomainError::InvalidInterval {
                reason: format!("stay of {} nights exceeds maximum of {}", nights, MAX_STAY_NIGHTS),
            });
        }

        Ok(StayInterval { check_in, check_out })
    }

    /// Rebuilds an interval from parts already known to satisfy
    /// `check_in < check_out` (rows the store validated on insert, plus a
    /// CHECK constraint in the schema). Not for caller input - use
    /// [`StayInterval::new`] there.
    #[inline]
    pub const fn new_unchecked(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        StayInterval { check_in, check_out }
    }

    /// The first night of the stay.
    #[inline]
    pub const fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    /// The morning the room is vacated (exclusive bound).
    #[inline]
    pub const fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    /// Number of nights in the stay. Always >= 1 by construction.
    #[inline]
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open overlap test.
    ///
    /// Back-to-back stays (one's check_out == the other's check_in) do NOT
    /// overlap - that is a same-day turnover.
    #[inline]
    pub fn overlaps(&self, other: &StayInterval) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }

    /// Whether the given date falls inside the stay (occupied that night).
    #[inline]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }

    /// Rejects intervals starting before `today`.
    ///
    /// Walk-in creation cannot start a stay in the past; same-day check-in
    /// (`check_in == today`) is valid.
    pub fn ensure_not_past(&self, today: NaiveDate) -> DomainResult<()> {
        if self.check_in < today {
            return Err(DomainError::InvalidInterval {
                reason: format!("check_in {} is in the past (today is {})", self.check_in, today),
            });
        }
        Ok(())
    }
}

impl fmt::Display for StayInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.check_in, self.check_out)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
