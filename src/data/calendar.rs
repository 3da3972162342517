//! Monthly expiry dates for stock futures and the file-name date stamps
//! derived from them.

use crate::types::MonthYear;
use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalendarError {
    #[error("Could not calculate expiry date for {0}")]
    NoExpiry(MonthYear),
    #[error("Expiry {expiry} for {month} has not been reached yet (today is {today})")]
    ExpiryNotReached {
        month: MonthYear,
        expiry: NaiveDate,
        today: NaiveDate,
    },
}

pub type Result<T> = std::result::Result<T, CalendarError>;

pub fn last_weekday_of_month(month: MonthYear, weekday: Weekday) -> Option<NaiveDate> {
    let mut day = month.last_day()?;
    for _ in 0..7 {
        if day.weekday() == weekday {
            return Some(day);
        }
        day = day.pred_opt()?;
    }
    None
}

/// Last Thursday of the month before `switch_date`, last Tuesday from then on.
#[derive(Debug, Clone, Copy)]
pub struct ExpiryRule {
    pub switch_date: NaiveDate,
}

impl ExpiryRule {
    pub fn new(switch_date: NaiveDate) -> Self {
        Self { switch_date }
    }

    pub fn weekday_for(&self, month: MonthYear) -> Weekday {
        match month.first_day() {
            Some(first) if first < self.switch_date => Weekday::Thu,
            _ => Weekday::Tue,
        }
    }

    pub fn expiry_date(&self, month: MonthYear) -> Result<NaiveDate> {
        last_weekday_of_month(month, self.weekday_for(month)).ok_or(CalendarError::NoExpiry(month))
    }

    /// Like [`expiry_date`](Self::expiry_date) but rejects expiries after `today`,
    /// since the exchange files for that day cannot exist yet.
    pub fn settled_expiry(&self, month: MonthYear, today: NaiveDate) -> Result<NaiveDate> {
        let expiry = self.expiry_date(month)?;
        if today < expiry {
            return Err(CalendarError::ExpiryNotReached {
                month,
                expiry,
                today,
            });
        }
        Ok(expiry)
    }
}

/// Current and previous month expiries for one report month.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDates {
    pub month: MonthYear,
    pub current_expiry: NaiveDate,
    pub previous_expiry: NaiveDate,
}

impl ReportDates {
    pub fn for_month(month: MonthYear, rule: &ExpiryRule, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            month,
            current_expiry: rule.settled_expiry(month, today)?,
            previous_expiry: rule.settled_expiry(month.pred(), today)?,
        })
    }

    pub fn current_stamps(&self) -> (String, String) {
        date_stamps(self.current_expiry)
    }

    pub fn previous_stamps(&self) -> (String, String) {
        date_stamps(self.previous_expiry)
    }
}

/// `DDMMYY` and `DDMMYYYY` forms of a date, in lookup order.
pub fn date_stamps(date: NaiveDate) -> (String, String) {
    (
        date.format("%d%m%y").to_string(),
        date.format("%d%m%Y").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> ExpiryRule {
        ExpiryRule::new(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
    }

    fn ym(year: i32, month: u32) -> MonthYear {
        MonthYear::new(year, month).unwrap()
    }

    #[test]
    fn test_last_thursday_before_switch() {
        assert_eq!(
            rule().expiry_date(ym(2025, 8)).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 28).unwrap()
        );
        assert_eq!(
            rule().expiry_date(ym(2025, 7)).unwrap(),
            NaiveDate::from_ymd_opt(2025, 7, 31).unwrap()
        );
    }

    #[test]
    fn test_last_tuesday_from_switch() {
        assert_eq!(rule().weekday_for(ym(2025, 9)), Weekday::Tue);
        assert_eq!(
            rule().expiry_date(ym(2025, 9)).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()
        );
        assert_eq!(
            rule().expiry_date(ym(2025, 10)).unwrap(),
            NaiveDate::from_ymd_opt(2025, 10, 28).unwrap()
        );
    }

    #[test]
    fn test_future_expiry_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 27).unwrap();
        let err = rule().settled_expiry(ym(2025, 8), today).unwrap_err();
        assert!(matches!(err, CalendarError::ExpiryNotReached { .. }));

        let today = NaiveDate::from_ymd_opt(2025, 8, 28).unwrap();
        assert!(rule().settled_expiry(ym(2025, 8), today).is_ok());
    }

    #[test]
    fn test_report_dates_and_stamps() {
        let today = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let dates = ReportDates::for_month(ym(2025, 9), &rule(), today).unwrap();

        assert_eq!(
            dates.current_stamps(),
            ("300925".to_string(), "30092025".to_string())
        );
        assert_eq!(
            dates.previous_stamps(),
            ("280825".to_string(), "28082025".to_string())
        );
    }

    #[test]
    fn test_january_looks_back_to_december() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let dates = ReportDates::for_month(ym(2026, 1), &rule(), today).unwrap();
        assert_eq!(dates.previous_expiry, NaiveDate::from_ymd_opt(2025, 12, 30).unwrap());
        assert_eq!(dates.current_expiry, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap());
    }
}
