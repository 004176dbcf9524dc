//! Rebalance policies and calendar periods.
//!
//! Policies parse from short codes: `none`, `M`, `Q`, `W`, `A` (or `Y`), and
//! multiples such as `2M` or `6W`. Pandas-style month/quarter/year end
//! aliases (`ME`, `QE`, `YE`) are accepted too.

use crate::{Result, RiskError};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Calendar bucket used for periodic rebalancing.
///
/// Weeks run Monday to Sunday; months, quarters and years follow the
/// calendar, with multiples counted from year zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarPeriod {
    /// Every `n` weeks
    Weeks(u32),
    /// Every `n` calendar months
    Months(u32),
    /// Every `n` calendar years
    Years(u32),
}

impl CalendarPeriod {
    /// Bucket identifier for `date`; consecutive dates share a bucket iff
    /// they fall in the same period.
    pub fn key(&self, date: NaiveDate) -> i64 {
        match *self {
            Self::Weeks(n) => {
                // 0001-01-01 is a Monday and has day number 1.
                let day = i64::from(date.num_days_from_ce()) - 1;
                day.div_euclid(7 * i64::from(n.max(1)))
            }
            Self::Months(n) => {
                let month = i64::from(date.year()) * 12 + i64::from(date.month0());
                month.div_euclid(i64::from(n.max(1)))
            }
            Self::Years(n) => i64::from(date.year()).div_euclid(i64::from(n.max(1))),
        }
    }
}

/// How often target weights are re-applied.
///
/// Policies compare by their calendar period, so `Custom(Months(1))` equals
/// `Monthly`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RebalancePolicy {
    /// Buy and hold: weights drift after the initial allocation
    None,
    /// Rebalance every calendar month
    #[default]
    Monthly,
    /// Rebalance every calendar quarter
    Quarterly,
    /// Rebalance on an arbitrary calendar period
    Custom(CalendarPeriod),
}

impl RebalancePolicy {
    /// Policy for `period`, preferring the named variants.
    pub const fn custom(period: CalendarPeriod) -> Self {
        match period {
            CalendarPeriod::Months(1) => Self::Monthly,
            CalendarPeriod::Months(3) => Self::Quarterly,
            other => Self::Custom(other),
        }
    }

    /// Calendar period between rebalances, `None` for buy and hold.
    pub const fn period(&self) -> Option<CalendarPeriod> {
        match *self {
            Self::None => None,
            Self::Monthly => Some(CalendarPeriod::Months(1)),
            Self::Quarterly => Some(CalendarPeriod::Months(3)),
            Self::Custom(period) => Some(period),
        }
    }
}

impl PartialEq for RebalancePolicy {
    fn eq(&self, other: &Self) -> bool {
        self.period() == other.period()
    }
}

impl Eq for RebalancePolicy {}

impl Hash for RebalancePolicy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.period().hash(state);
    }
}

impl fmt::Display for RebalancePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Monthly => f.write_str("M"),
            Self::Quarterly => f.write_str("Q"),
            Self::Custom(CalendarPeriod::Weeks(n)) => write!(f, "{n}W"),
            Self::Custom(CalendarPeriod::Months(n)) => write!(f, "{n}M"),
            Self::Custom(CalendarPeriod::Years(n)) => write!(f, "{n}A"),
        }
    }
}

impl FromStr for RebalancePolicy {
    type Err = RiskError;

    fn from_str(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() || code.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }

        let split = code
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(code.len());
        let (count, unit) = code.split_at(split);
        let n: u32 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| RiskError::InvalidInput(format!("bad rebalance code '{code}'")))?
        };
        if n == 0 {
            return Err(RiskError::InvalidInput(format!(
                "rebalance period must be positive: '{code}'"
            )));
        }

        let period = match unit.to_ascii_uppercase().as_str() {
            "W" => CalendarPeriod::Weeks(n),
            "M" | "ME" => CalendarPeriod::Months(n),
            "Q" | "QE" => CalendarPeriod::Months(3 * n),
            "A" | "Y" | "YE" => CalendarPeriod::Years(n),
            _ => {
                return Err(RiskError::InvalidInput(format!(
                    "unknown rebalance code '{code}'"
                )));
            }
        };

        Ok(Self::custom(period))
    }
}

impl TryFrom<String> for RebalancePolicy {
    type Error = RiskError;

    fn try_from(code: String) -> Result<Self> {
        code.parse()
    }
}

impl From<RebalancePolicy> for String {
    fn from(policy: RebalancePolicy) -> Self {
        policy.to_string()
    }
}
