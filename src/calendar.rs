use chrono::{Datelike, Duration, Local, NaiveDate};

/// Returns today's date in local time.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Returns the Monday of the week containing `date`.
///
/// Weeks run Monday through Sunday, so a Sunday belongs to the week that
/// started six days earlier.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let dow = date.weekday().num_days_from_sunday();
    let back = if dow == 0 { 6 } else { dow - 1 };
    date - Duration::days(back as i64)
}

/// Returns the Sunday closing the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// The seven consecutive days of the week containing `date`, Monday first.
pub fn week_dates(date: NaiveDate) -> [NaiveDate; 7] {
    let start = week_start(date);
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

/// Moves a week boundary by `weeks` whole weeks (negative goes back).
pub fn shift_weeks(date: NaiveDate, weeks: i64) -> NaiveDate {
    date + Duration::weeks(weeks)
}

/// ISO 8601 week number.
///
/// The date is moved to the Thursday of its week; the week number is then
/// the count of weeks from January 1st of that Thursday's year.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    let day_num = date.weekday().number_from_monday() as i64;
    let thursday = date + Duration::days(4 - day_num);
    (thursday.ordinal() + 6) / 7
}

/// Calendar-day equality, ignoring any time-of-day component.
pub fn same_day<A: Datelike, B: Datelike>(a: &A, b: &B) -> bool {
    a.year() == b.year() && a.month() == b.month() && a.day() == b.day()
}

/// Short display form, e.g. `Mon, Jan 8`.
pub fn format_short(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

/// Display form of a span, e.g. `Mon, Jan 8 – Sun, Jan 14`.
pub fn format_range(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} – {}", format_short(start), format_short(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc, Weekday};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_start_is_monday_and_contains_date() {
        let mut d = ymd(2023, 12, 1);
        while d < ymd(2025, 3, 1) {
            let start = week_start(d);
            assert_eq!(start.weekday(), Weekday::Mon, "start of {d}");
            assert!(start <= d && d <= start + Duration::days(6), "{d} outside its week");
            d += Duration::days(1);
        }
    }

    #[test]
    fn sunday_rolls_back_to_previous_monday() {
        // 2024-03-10 is a Sunday.
        assert_eq!(week_start(ymd(2024, 3, 10)), ymd(2024, 3, 4));
        assert_eq!(week_end(ymd(2024, 3, 10)), ymd(2024, 3, 10));
        assert_eq!(week_start(ymd(2024, 3, 11)), ymd(2024, 3, 11));
    }

    #[test]
    fn week_dates_are_seven_consecutive_days() {
        let days = week_dates(ymd(2024, 2, 29));
        assert_eq!(days[0], ymd(2024, 2, 26));
        for pair in days.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
        }
        assert_eq!(days[6], ymd(2024, 3, 3));
    }

    #[test]
    fn iso_week_reference_values() {
        assert_eq!(iso_week_number(ymd(2024, 1, 1)), 1);
        assert_eq!(iso_week_number(ymd(2021, 1, 4)), 1);
        assert_eq!(iso_week_number(ymd(2023, 1, 1)), 52);
        assert_eq!(iso_week_number(ymd(2021, 1, 3)), 53);
        assert_eq!(iso_week_number(ymd(2020, 12, 31)), 53);
        assert_eq!(iso_week_number(ymd(2024, 12, 30)), 1);
    }

    #[test]
    fn iso_week_agrees_with_chrono() {
        let mut d = ymd(2015, 12, 20);
        while d < ymd(2027, 1, 10) {
            assert_eq!(iso_week_number(d), d.iso_week().week(), "{d}");
            d += Duration::days(1);
        }
    }

    #[test]
    fn same_day_ignores_time_of_day() {
        let morning = Utc.with_ymd_and_hms(2024, 5, 6, 0, 0, 1).unwrap();
        let night = Utc.with_ymd_and_hms(2024, 5, 6, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2024, 5, 7, 0, 0, 0).unwrap();
        assert!(same_day(&morning, &night));
        assert!(!same_day(&night, &next));
        assert!(same_day(&ymd(2024, 5, 6), &night));
    }

    #[test]
    fn short_format_is_weekday_month_day() {
        assert_eq!(format_short(ymd(2024, 1, 8)), "Mon, Jan 8");
        assert_eq!(format_range(ymd(2024, 1, 8), ymd(2024, 1, 14)), "Mon, Jan 8 – Sun, Jan 14");
    }
}
