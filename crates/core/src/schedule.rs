use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, TimeZone, Utc, Weekday};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid wall-clock time `{0}` (expected HH:MM)")]
    InvalidWallClock(String),
    #[error("invalid utc offset `{0}` (expected +HH:MM or -HH:MM)")]
    InvalidUtcOffset(String),
    #[error("unknown weekday `{0}`")]
    UnknownWeekday(String),
}

/// Wall-clock time as entered through the configuration surface.
///
/// Parsing is strict: exactly `HH:MM`, two digits, a colon, two digits,
/// hours 00-23 and minutes 00-59. Anything else is rejected before a
/// scheduler is ever constructed from it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallClock {
    hour: u8,
    minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ScheduleError> {
        if hour > 23 || minute > 59 {
            return Err(ScheduleError::InvalidWallClock(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for WallClock {
    type Err = ScheduleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let bytes = value.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && bytes[0].is_ascii_digit()
            && bytes[1].is_ascii_digit()
            && bytes[3].is_ascii_digit()
            && bytes[4].is_ascii_digit();
        if !well_formed {
            return Err(ScheduleError::InvalidWallClock(value.to_owned()));
        }

        let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
        let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
        Self::new(hour, minute).map_err(|_| ScheduleError::InvalidWallClock(value.to_owned()))
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parses a `+HH:MM` / `-HH:MM` offset from UTC. The sign is mandatory.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, ScheduleError> {
    let invalid = || ScheduleError::InvalidUtcOffset(value.to_owned());

    let (sign, clock) = if let Some(rest) = value.strip_prefix('+') {
        (1i32, rest)
    } else if let Some(rest) = value.strip_prefix('-') {
        (-1i32, rest)
    } else {
        return Err(invalid());
    };

    let wall = clock.parse::<WallClock>().map_err(|_| invalid())?;
    let seconds = sign * (i32::from(wall.hour()) * 3600 + i32::from(wall.minute()) * 60);
    FixedOffset::east_opt(seconds).ok_or_else(invalid)
}

/// Offset of UTC itself, the configuration default.
pub fn zero_utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is in range")
}

/// Days on which a lunch cycle is allowed to run.
///
/// Every day starts disabled; days are enabled only through explicit
/// configuration actions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeekdaySet {
    bits: u8,
}

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn weekdays() -> Self {
        Self::empty()
            .enable(Weekday::Mon)
            .enable(Weekday::Tue)
            .enable(Weekday::Wed)
            .enable(Weekday::Thu)
            .enable(Weekday::Fri)
    }

    #[must_use]
    pub fn enable(mut self, day: Weekday) -> Self {
        self.bits |= 1 << day.num_days_from_monday();
        self
    }

    #[must_use]
    pub fn disable(mut self, day: Weekday) -> Self {
        self.bits &= !(1 << day.num_days_from_monday());
        self
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.bits & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn from_names<I, S>(names: I) -> Result<Self, ScheduleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        for name in names {
            set = set.enable(parse_weekday(name.as_ref())?);
        }
        Ok(set)
    }

    pub fn names(&self) -> Vec<&'static str> {
        ALL_DAYS.iter().filter(|day| self.contains(**day)).map(|day| weekday_name(*day)).collect()
    }
}

fn parse_weekday(name: &str) -> Result<Weekday, ScheduleError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        "sunday" => Ok(Weekday::Sun),
        other => Err(ScheduleError::UnknownWeekday(other.to_owned())),
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// The two UTC instants bounding one lunch cycle: when the participation
/// prompt opens and when voting closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

impl ScheduleWindow {
    pub fn new(opens_at: DateTime<Utc>, closes_at: DateTime<Utc>) -> Self {
        Self { opens_at, closes_at }
    }

    /// Rolls each instant forward in whole-day steps until it is in the
    /// future and lands on an enabled weekday, then clamps `closes_at` to be
    /// strictly after `opens_at`. Time-of-day is preserved throughout.
    pub fn catch_up(&mut self, now: DateTime<Utc>, days: WeekdaySet) {
        self.opens_at = next_enabled(advance_past(self.opens_at, now), days);
        self.closes_at = next_enabled(advance_past(self.closes_at, now), days);
        self.clamp_close_after_open();
    }

    /// End-of-cycle advancement: both instants move one day forward, then
    /// onward past any disabled weekdays.
    pub fn advance_cycle(&mut self, days: WeekdaySet) {
        self.opens_at = next_enabled(self.opens_at + Duration::days(1), days);
        self.closes_at = next_enabled(self.closes_at + Duration::days(1), days);
        self.clamp_close_after_open();
    }

    fn clamp_close_after_open(&mut self) {
        while self.closes_at <= self.opens_at {
            self.closes_at += Duration::days(1);
        }
    }
}

fn advance_past(mut instant: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    while instant <= now {
        instant += Duration::days(1);
    }
    instant
}

fn next_enabled(mut instant: DateTime<Utc>, days: WeekdaySet) -> DateTime<Utc> {
    // An empty set admits every day here; configuration validation rejects
    // it before a scheduler is built from it.
    if days.is_empty() {
        return instant;
    }
    while !days.contains(instant.weekday()) {
        instant += Duration::days(1);
    }
    instant
}

/// Materializes today's window from configured wall clocks, each localized
/// through its own fixed offset from UTC. The result may lie in the past or
/// on a disabled day; `catch_up` is responsible for rolling it forward.
pub fn window_from_wall_clock(
    opens: WallClock,
    opens_offset: FixedOffset,
    closes: WallClock,
    closes_offset: FixedOffset,
    now: DateTime<Utc>,
) -> ScheduleWindow {
    ScheduleWindow::new(
        localized_today(opens, opens_offset, now),
        localized_today(closes, closes_offset, now),
    )
}

fn localized_today(clock: WallClock, offset: FixedOffset, now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&offset).date_naive();
    let local = local_date.and_time(clock.time());
    let utc_naive = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc_naive)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Weekday};

    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().expect("valid timestamp")
    }

    #[test]
    fn wall_clock_parses_strict_two_digit_form() {
        let clock = "09:30".parse::<WallClock>().expect("parse");
        assert_eq!((clock.hour(), clock.minute()), (9, 30));
        assert_eq!(clock.to_string(), "09:30");
    }

    #[test]
    fn wall_clock_rejects_loose_forms() {
        for raw in ["9:30", "09:3", "09-30", "0930", " 09:30", "09:30 ", "aa:bb", ""] {
            assert!(
                matches!(raw.parse::<WallClock>(), Err(ScheduleError::InvalidWallClock(_))),
                "expected rejection of `{raw}`"
            );
        }
    }

    #[test]
    fn wall_clock_rejects_out_of_range_values() {
        assert!("24:00".parse::<WallClock>().is_err());
        assert!("12:60".parse::<WallClock>().is_err());
        assert!("23:59".parse::<WallClock>().is_ok());
        assert!("00:00".parse::<WallClock>().is_ok());
    }

    #[test]
    fn utc_offset_requires_explicit_sign() {
        assert_eq!(parse_utc_offset("+02:00").expect("parse").local_minus_utc(), 2 * 3600);
        assert_eq!(parse_utc_offset("-05:30").expect("parse").local_minus_utc(), -(5 * 3600 + 1800));
        for raw in ["02:00", "+2:00", "+02", "Z", "utc", "+02:60"] {
            assert!(parse_utc_offset(raw).is_err(), "expected rejection of `{raw}`");
        }
    }

    #[test]
    fn weekday_set_starts_fully_disabled() {
        let set = WeekdaySet::default();
        assert!(set.is_empty());
        assert!(!set.contains(Weekday::Mon));
    }

    #[test]
    fn weekday_set_round_trips_names() {
        let set = WeekdaySet::from_names(["monday", "Friday", " sunday "]).expect("parse");
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Fri));
        assert!(set.contains(Weekday::Sun));
        assert!(!set.contains(Weekday::Tue));
        assert_eq!(set.names(), vec!["monday", "friday", "sunday"]);
    }

    #[test]
    fn weekday_set_rejects_unknown_names() {
        assert!(matches!(
            WeekdaySet::from_names(["funday"]),
            Err(ScheduleError::UnknownWeekday(name)) if name == "funday"
        ));
    }

    #[test]
    fn catch_up_lands_on_next_enabled_monday_at_original_time_of_day() {
        // 2026-07-06 is a Monday. Three weeks stale, evaluated on a Thursday.
        let mut window = ScheduleWindow::new(utc(2026, 7, 6, 11, 30), utc(2026, 7, 6, 12, 30));
        let now = utc(2026, 7, 23, 9, 0);
        window.catch_up(now, WeekdaySet::empty().enable(Weekday::Mon));

        assert_eq!(window.opens_at, utc(2026, 7, 27, 11, 30));
        assert_eq!(window.closes_at, utc(2026, 7, 27, 12, 30));
        assert_eq!(window.opens_at.weekday(), Weekday::Mon);
    }

    #[test]
    fn catch_up_leaves_future_enabled_instants_untouched() {
        let opens = utc(2026, 7, 27, 11, 30);
        let closes = utc(2026, 7, 27, 12, 30);
        let mut window = ScheduleWindow::new(opens, closes);
        window.catch_up(utc(2026, 7, 27, 8, 0), WeekdaySet::weekdays());

        assert_eq!(window, ScheduleWindow::new(opens, closes));
    }

    #[test]
    fn catch_up_clamps_close_strictly_after_open() {
        // Close wall clock earlier than open: once both catch up to the same
        // day, the close instant must still fall after the open instant.
        let mut window = ScheduleWindow::new(utc(2026, 7, 6, 12, 0), utc(2026, 7, 6, 11, 0));
        window.catch_up(utc(2026, 7, 7, 13, 0), WeekdaySet::weekdays());

        assert!(window.closes_at > window.opens_at);
        assert_eq!(window.opens_at, utc(2026, 7, 8, 12, 0));
        assert_eq!(window.closes_at, utc(2026, 7, 9, 11, 0));
    }

    #[test]
    fn advance_cycle_skips_disabled_weekend() {
        // 2026-07-10 is a Friday.
        let mut window = ScheduleWindow::new(utc(2026, 7, 10, 11, 30), utc(2026, 7, 10, 12, 30));
        window.advance_cycle(WeekdaySet::weekdays());

        assert_eq!(window.opens_at, utc(2026, 7, 13, 11, 30));
        assert_eq!(window.closes_at, utc(2026, 7, 13, 12, 30));
        assert_eq!(window.opens_at.weekday(), Weekday::Mon);
    }

    #[test]
    fn advance_cycle_without_enabled_days_moves_one_day() {
        let mut window = ScheduleWindow::new(utc(2026, 7, 10, 11, 30), utc(2026, 7, 10, 12, 30));
        window.advance_cycle(WeekdaySet::empty());

        assert_eq!(window.opens_at, utc(2026, 7, 11, 11, 30));
    }

    #[test]
    fn window_from_wall_clock_honors_fixed_offsets() {
        let opens = "12:00".parse::<WallClock>().expect("parse");
        let closes = "13:15".parse::<WallClock>().expect("parse");
        let rome = parse_utc_offset("+02:00").expect("offset");
        let window =
            window_from_wall_clock(opens, rome, closes, rome, utc(2026, 7, 21, 8, 0));

        assert_eq!(window.opens_at, utc(2026, 7, 21, 10, 0));
        assert_eq!(window.closes_at, utc(2026, 7, 21, 11, 15));
    }

    #[test]
    fn window_from_wall_clock_uses_each_offset_for_its_own_instant() {
        let opens = "12:00".parse::<WallClock>().expect("parse");
        let closes = "12:00".parse::<WallClock>().expect("parse");
        let rome = parse_utc_offset("+02:00").expect("offset");
        let lisbon = parse_utc_offset("+01:00").expect("offset");
        let window =
            window_from_wall_clock(opens, rome, closes, lisbon, utc(2026, 7, 21, 8, 0));

        assert_eq!(window.opens_at, utc(2026, 7, 21, 10, 0));
        assert_eq!(window.closes_at, utc(2026, 7, 21, 11, 0));
    }
}
