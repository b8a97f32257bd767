//! Display labels for calendar buckets.
//!
//! The engine keys everything by `chrono::Weekday` / `chrono::Month`; labels are a
//! lossless, per-locale projection applied at the edge.

use chrono::{Month, Weekday};
use serde::{Deserialize, Serialize};

/// Fixed week order used by every weekday aggregation.
pub const WEEK_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Calendar month order, January first.
pub const MONTH_ORDER: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    Portuguese,
}

/// Canonical English weekday name (`Monday`..`Sunday`).
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

pub fn weekday_label(weekday: Weekday, locale: Locale) -> &'static str {
    match locale {
        Locale::English => weekday_name(weekday),
        Locale::Portuguese => match weekday {
            Weekday::Mon => "Segunda",
            Weekday::Tue => "Terça",
            Weekday::Wed => "Quarta",
            Weekday::Thu => "Quinta",
            Weekday::Fri => "Sexta",
            Weekday::Sat => "Sábado",
            Weekday::Sun => "Domingo",
        },
    }
}

pub fn month_label(month: Month, locale: Locale) -> &'static str {
    match locale {
        Locale::English => month.name(),
        Locale::Portuguese => match month {
            Month::January => "Jan",
            Month::February => "Fev",
            Month::March => "Mar",
            Month::April => "Abr",
            Month::May => "Mai",
            Month::June => "Jun",
            Month::July => "Jul",
            Month::August => "Ago",
            Month::September => "Set",
            Month::October => "Out",
            Month::November => "Nov",
            Month::December => "Dez",
        },
    }
}

/// Month for a 1-based month number.
pub fn month_from_number(month: u32) -> Option<Month> {
    MONTH_ORDER.get(month.checked_sub(1)? as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Weekday::Mon, "Monday", "Segunda")]
    #[case(Weekday::Sat, "Saturday", "Sábado")]
    #[case(Weekday::Sun, "Sunday", "Domingo")]
    fn weekday_labels(#[case] day: Weekday, #[case] en: &str, #[case] pt: &str) {
        assert_eq!(weekday_label(day, Locale::English), en);
        assert_eq!(weekday_label(day, Locale::Portuguese), pt);
    }

    #[test]
    fn week_starts_on_monday() {
        assert_eq!(WEEK_ORDER[0], Weekday::Mon);
        assert_eq!(WEEK_ORDER[6], Weekday::Sun);
    }

    #[rstest]
    #[case(1, Some(Month::January))]
    #[case(12, Some(Month::December))]
    #[case(0, None)]
    #[case(13, None)]
    fn month_numbers(#[case] n: u32, #[case] expected: Option<Month>) {
        assert_eq!(month_from_number(n), expected);
    }

    #[test]
    fn month_labels() {
        assert_eq!(month_label(Month::February, Locale::English), "February");
        assert_eq!(month_label(Month::February, Locale::Portuguese), "Fev");
    }
}
