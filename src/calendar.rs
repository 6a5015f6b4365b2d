use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Next occurrence of `weekday`, counting `today` itself when it matches.
pub fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let target = i64::from(weekday.num_days_from_monday());
    let current = i64::from(today.weekday().num_days_from_monday());
    today + Duration::days((target - current).rem_euclid(7))
}

/// Long English weekday name, e.g. "Saturday".
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
