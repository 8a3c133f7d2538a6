//! Date parsing for purchase-order documents.

use chrono::NaiveDate;

use super::patterns::{DATE_DAY_MONTH_NAME, DATE_MONTH_NAME, DATE_NUMERIC, DATE_YMD};
use super::{ExtractionMatch, FieldExtractor};

/// How a vendor writes purely numeric dates such as `07/10/2025`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `MM/DD/YYYY`
    MonthFirst,
    /// `DD/MM/YYYY`
    DayFirst,
}

/// Date field extractor.
///
/// Recognises `Oct 7, 2025`, `7 October 2025`, `2025-10-07` and numeric
/// day/month forms. Numeric forms are read in the configured order first
/// and in the other order when the first is not a calendar date.
pub struct DateExtractor {
    order: DateOrder,
}

impl DateExtractor {
    pub fn new(order: DateOrder) -> Self {
        Self { order }
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new(DateOrder::MonthFirst)
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<NaiveDate>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<Self::Output> = Vec::new();

        let mut push = |date: Option<NaiveDate>, m: Option<regex::Match<'_>>| {
            let (Some(date), Some(m)) = (date, m) else { return };
            let overlaps = results.iter().any(|r| match r.position {
                Some((start, end)) => m.start() < end && start < m.end(),
                None => false,
            });
            if !overlaps {
                results.push(
                    ExtractionMatch::new(date, m.as_str()).with_position(m.start(), m.end()),
                );
            }
        };

        // Month names first, so "Oct 7, 2025" is never read as numbers
        for caps in DATE_MONTH_NAME.captures_iter(text) {
            let date = month_name_to_number(&caps[1])
                .and_then(|month| calendar_date(&caps[3], month, &caps[2]));
            push(date, caps.get(0));
        }

        for caps in DATE_DAY_MONTH_NAME.captures_iter(text) {
            let date = month_name_to_number(&caps[2])
                .and_then(|month| calendar_date(&caps[3], month, &caps[1]));
            push(date, caps.get(0));
        }

        // YYYY-MM-DD or YYYY/MM/DD
        for caps in DATE_YMD.captures_iter(text) {
            let date = caps[2]
                .parse()
                .ok()
                .and_then(|month| calendar_date(&caps[1], month, &caps[3]));
            push(date, caps.get(0));
        }

        for caps in DATE_NUMERIC.captures_iter(text) {
            push(numeric_date(&caps[1], &caps[2], &caps[3], self.order), caps.get(0));
        }

        results.sort_by_key(|r| r.position.map(|(start, _)| start).unwrap_or(usize::MAX));
        results
    }
}

/// First date found in `text`, or `None`.
pub fn parse_date(text: &str, order: DateOrder) -> Option<NaiveDate> {
    DateExtractor::new(order).extract(text).map(|m| m.value)
}

fn calendar_date(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(parse_year(year)?, month, day.parse().ok()?)
}

fn numeric_date(first: &str, second: &str, year: &str, order: DateOrder) -> Option<NaiveDate> {
    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let year = parse_year(year)?;
    let (month, day) = match order {
        DateOrder::MonthFirst => (first, second),
        DateOrder::DayFirst => (second, first),
    };
    NaiveDate::from_ymd_opt(year, month, day).or_else(|| NaiveDate::from_ymd_opt(year, day, month))
}

/// Two-digit years are 20xx.
fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(if s.len() <= 2 { 2000 + year } else { year })
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// English month name or its three-letter abbreviation ("Sept" too).
fn month_name_to_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let name = lower.as_str();
    MONTHS
        .iter()
        .position(|&full| full == name || &full[..3] == name || (name == "sept" && full == "september"))
        .map(|i| i as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_name_forms() {
        assert_eq!(parse_date("Oct 7, 2025", DateOrder::MonthFirst), Some(ymd(2025, 10, 7)));
        assert_eq!(parse_date("October 7, 2025", DateOrder::DayFirst), Some(ymd(2025, 10, 7)));
        assert_eq!(parse_date("Sept 30, 2025", DateOrder::MonthFirst), Some(ymd(2025, 9, 30)));
        assert_eq!(parse_date("7 Oct 2025", DateOrder::MonthFirst), Some(ymd(2025, 10, 7)));
    }

    #[test]
    fn test_iso_forms() {
        assert_eq!(parse_date("2025-10-07", DateOrder::DayFirst), Some(ymd(2025, 10, 7)));
        assert_eq!(parse_date("2025/10/11", DateOrder::MonthFirst), Some(ymd(2025, 10, 11)));
    }

    #[test]
    fn test_numeric_order() {
        assert_eq!(parse_date("07/10/2025", DateOrder::MonthFirst), Some(ymd(2025, 7, 10)));
        assert_eq!(parse_date("07/10/2025", DateOrder::DayFirst), Some(ymd(2025, 10, 7)));
        assert_eq!(parse_date("01-10-2025", DateOrder::DayFirst), Some(ymd(2025, 10, 1)));
    }

    #[test]
    fn test_numeric_order_fallback() {
        // 25 cannot be a month
        assert_eq!(parse_date("09/25/2025", DateOrder::DayFirst), Some(ymd(2025, 9, 25)));
        assert_eq!(parse_date("25/09/2025", DateOrder::MonthFirst), Some(ymd(2025, 9, 25)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_date("10/11/25", DateOrder::MonthFirst), Some(ymd(2025, 10, 11)));
    }

    #[test]
    fn test_not_a_date() {
        assert_eq!(parse_date("Decimal 12, 2025", DateOrder::MonthFirst), None);
        assert_eq!(parse_date("13/13/2025", DateOrder::MonthFirst), None);
        assert_eq!(parse_date("", DateOrder::MonthFirst), None);
    }

    #[test]
    fn test_extract_all_in_text_order() {
        let extractor = DateExtractor::new(DateOrder::DayFirst);
        let found = extractor.extract_all("Created on: Sep 1, 2025 due 2025-10-07");
        let dates: Vec<_> = found.iter().map(|m| m.value).collect();
        assert_eq!(dates, vec![ymd(2025, 9, 1), ymd(2025, 10, 7)]);
    }
}
