use chrono::{Datelike, NaiveDate};
use std::fmt;
use thiserror::Error;

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Error, PartialEq)]
#[error("Invalid month/year label '{0}', expected MMMYY or MMMYYYY (e.g. DEC25, Aug2025)")]
pub struct MonthYearError(pub String);

/// A calendar month, displayed as `Aug2025`. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthYear {
    year: i32,
    month: u32,
}

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `DEC25`, `Dec2025` or `dec2025`. Two-digit years are 20xx.
    pub fn parse(label: &str) -> Result<Self, MonthYearError> {
        let invalid = || MonthYearError(label.to_string());
        let label = label.trim();
        if !label.is_ascii() || label.len() < 5 {
            return Err(invalid());
        }
        let (name, year) = label.split_at(3);

        let month = MONTH_ABBREVIATIONS
            .iter()
            .position(|abbr| abbr.eq_ignore_ascii_case(name))
            .ok_or_else(invalid)? as u32
            + 1;

        if !year.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = match year.len() {
            2 => 2000 + year.parse::<i32>().map_err(|_| invalid())?,
            4 => year.parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.succ().first_day()?.pred_opt()
    }

    pub fn pred(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The `count` months strictly before `self`, oldest first.
    pub fn preceding(&self, count: usize) -> Vec<MonthYear> {
        let mut months = Vec::with_capacity(count);
        let mut cursor = *self;
        for _ in 0..count {
            cursor = cursor.pred();
            months.push(cursor);
        }
        months.reverse();
        months
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            MONTH_ABBREVIATIONS[(self.month - 1) as usize],
            self.year
        )
    }
}

/// Market-behaviour buckets derived from the signs of MoM%, Diff Rollover%
/// and Diff Rollover Cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    LongRolls,
    ShortRolls,
    ShortCovering,
    LongUnwind,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [
        Bucket::LongRolls,
        Bucket::ShortRolls,
        Bucket::ShortCovering,
        Bucket::LongUnwind,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Bucket::LongRolls => "Long Rolls",
            Bucket::ShortRolls => "Short Rolls",
            Bucket::ShortCovering => "Short Covering",
            Bucket::LongUnwind => "Long Unwind",
        }
    }

    pub fn legend(&self) -> &'static str {
        match self {
            Bucket::LongRolls => "Long Rolls (MoM+ , %Roll+ , Cost+)",
            Bucket::ShortRolls => "Short Rolls (MoM- , %Roll+ , Cost-)",
            Bucket::ShortCovering => "Short Covering (MoM+ , %Roll- , Cost+)",
            Bucket::LongUnwind => "Long Unwind (MoM- , %Roll- , Cost-)",
        }
    }

    /// Required signs of (MoM%, Diff Rollover%, Diff Rollover Cost); `true` is positive.
    pub fn signs(&self) -> (bool, bool, bool) {
        match self {
            Bucket::LongRolls => (true, true, true),
            Bucket::ShortRolls => (false, true, false),
            Bucket::ShortCovering => (true, false, true),
            Bucket::LongUnwind => (false, false, false),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
