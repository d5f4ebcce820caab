//! Period bucketing (spec.md §4.8): partitions `[start, end]` into
//! contiguous quarter/semester/year intervals and labels them
//! `Q<q> <yyyy>` / `S<s> <yyyy>` / `<yyyy>`.

use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Quarter,
    Semester,
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

/// Splits `[start, end]` into contiguous, non-overlapping periods of the
/// requested grouping, the first starting on `start`'s own bucket boundary.
pub fn bucket_periods(start: NaiveDate, end: NaiveDate, grouping: Grouping) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut cursor = bucket_start(start, grouping);
    while cursor <= end {
        let bucket_end = next_bucket_start(cursor, grouping).pred_opt().unwrap_or(cursor);
        periods.push(Period { start: cursor, end: bucket_end, label: label_for(cursor, grouping) });
        cursor = next_bucket_start(cursor, grouping);
    }
    periods
}

/// The label one bucket after `last`'s, for forecast output (spec.md §4.8
/// "Forecast one period ahead").
pub fn next_period_label(last: &Period, grouping: Grouping) -> String {
    label_for(next_bucket_start(last.start, grouping), grouping)
}

fn bucket_start(date: NaiveDate, grouping: Grouping) -> NaiveDate {
    let year = date.year();
    match grouping {
        Grouping::Year => NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
        Grouping::Semester => {
            let month = if date.month() <= 6 { 1 } else { 7 };
            NaiveDate::from_ymd_opt(year, month, 1).unwrap()
        }
        Grouping::Quarter => {
            let month = ((date.month0() / 3) * 3) + 1;
            NaiveDate::from_ymd_opt(year, month, 1).unwrap()
        }
    }
}

fn next_bucket_start(bucket_start_date: NaiveDate, grouping: Grouping) -> NaiveDate {
    let months = match grouping {
        Grouping::Quarter => 3,
        Grouping::Semester => 6,
        Grouping::Year => 12,
    };
    let total_months = bucket_start_date.year() * 12 + (bucket_start_date.month0() as i32) + months;
    let year = total_months.div_euclid(12);
    let month = total_months.rem_euclid(12) + 1;
    NaiveDate::from_ymd_opt(year, month as u32, 1).unwrap()
}

fn label_for(bucket_start_date: NaiveDate, grouping: Grouping) -> String {
    match grouping {
        Grouping::Year => bucket_start_date.year().to_string(),
        Grouping::Semester => {
            let semester = if bucket_start_date.month() <= 6 { 1 } else { 2 };
            format!("S{semester} {}", bucket_start_date.year())
        }
        Grouping::Quarter => {
            let quarter = bucket_start_date.month0() / 3 + 1;
            format!("Q{quarter} {}", bucket_start_date.year())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_labels_cover_a_full_year() {
        let periods = bucket_periods(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), Grouping::Quarter);
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Q1 2024", "Q2 2024", "Q3 2024", "Q4 2024"]);
    }

    #[test]
    fn semester_labels_split_the_year_in_two() {
        let periods = bucket_periods(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(), NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(), Grouping::Semester);
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["S1 2024", "S2 2024"]);
    }

    #[test]
    fn year_grouping_spans_multiple_years() {
        let periods = bucket_periods(NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), Grouping::Year);
        let labels: Vec<&str> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["2022", "2023", "2024"]);
    }

    #[test]
    fn next_period_label_rolls_over_the_year_boundary() {
        let periods = bucket_periods(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), Grouping::Quarter);
        let last = periods.last().unwrap();
        assert_eq!(next_period_label(last, Grouping::Quarter), "Q1 2025");
    }
}
