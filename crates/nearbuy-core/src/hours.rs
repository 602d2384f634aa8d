//! Weekly opening hours for shop detail pages.

use chrono::{NaiveTime, Weekday};
use serde::Serialize;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const CLOSED: &str = "Closed";

/// Display hours for one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayHours {
    pub day: &'static str,
    /// `"HH:MM - HH:MM"`, or [`CLOSED`].
    pub hours: String,
}

/// One stored timing row: a day name plus optional open and close times.
#[derive(Debug, Clone, Copy)]
pub struct Timing<'a> {
    pub day: &'a str,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Format stored timings into a full Monday-to-Sunday schedule.
///
/// Day names are matched case-insensitively (`"monday"`, `"Mon"`). Days with
/// no row, or with a missing open/close time, read as [`CLOSED`]. When a day
/// appears twice the later row wins. Rows with unrecognised day names are
/// skipped.
pub fn weekly_hours<'a, I>(timings: I) -> Vec<DayHours>
where
    I: IntoIterator<Item = Timing<'a>>,
{
    let mut slots: [Option<String>; 7] = Default::default();

    for timing in timings {
        let Ok(day) = timing.day.trim().parse::<Weekday>() else {
            continue;
        };
        let idx = day.num_days_from_monday() as usize;
        slots[idx] = match (timing.open_time, timing.close_time) {
            (Some(open), Some(close)) => Some(format!(
                "{} - {}",
                open.format("%H:%M"),
                close.format("%H:%M")
            )),
            _ => None,
        };
    }

    WEEK.iter()
        .zip(slots)
        .map(|(day, hours)| DayHours {
            day: day_name(*day),
            hours: hours.unwrap_or_else(|| CLOSED.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn empty_timings_are_all_closed() {
        let week = weekly_hours(Vec::<Timing>::new());
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].day, "Monday");
        assert_eq!(week[6].day, "Sunday");
        assert!(week.iter().all(|d| d.hours == CLOSED));
    }

    #[test]
    fn formats_open_and_close_times() {
        let week = weekly_hours([Timing {
            day: "tuesday",
            open_time: t(9, 0),
            close_time: t(21, 30),
        }]);
        assert_eq!(week[1].day, "Tuesday");
        assert_eq!(week[1].hours, "09:00 - 21:30");
        assert_eq!(week[0].hours, CLOSED);
    }

    #[test]
    fn missing_close_time_is_closed() {
        let week = weekly_hours([Timing {
            day: "Friday",
            open_time: t(10, 0),
            close_time: None,
        }]);
        assert_eq!(week[4].hours, CLOSED);
    }

    #[test]
    fn later_row_wins_and_unknown_days_are_skipped() {
        let week = weekly_hours([
            Timing {
                day: "Sun",
                open_time: t(8, 0),
                close_time: t(12, 0),
            },
            Timing {
                day: "Funday",
                open_time: t(1, 0),
                close_time: t(2, 0),
            },
            Timing {
                day: "SUNDAY",
                open_time: t(10, 0),
                close_time: t(14, 0),
            },
        ]);
        assert_eq!(week.len(), 7);
        assert_eq!(week[6].hours, "10:00 - 14:00");
    }
}
