//! Date ranges for `~d` and `~r`.
//!
//! Dates are resolved in the local timezone of the [`Clock`]. A relative
//! form like `<3d` depends on "now", so patterns compiled for hooks keep the
//! source text and resolve it again on every evaluation.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use maildata::Clock;

use crate::range::{Range, leading_int};

/// 1970-01-02: the epoch plus a day, so no timezone pushes it negative.
fn floor() -> NaiveDateTime {
    day(1970, 1, 2).and_time(NaiveTime::MIN)
}

/// 2030-12-31 23:59:59.
fn ceiling() -> NaiveDateTime {
    day(2030, 12, 31).and_time(end_of_day())
}

/// 23:59:59.
fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// A calendar day, with out-of-range days rolling into the next month.
fn day(year: i32, month: u32, mday: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.checked_add_days(Days::new(u64::from(mday.saturating_sub(1)))))
        .unwrap_or(NaiveDate::MIN)
}

/// Replace the date part of `t`, keeping its time.
fn with_date(t: NaiveDateTime, date: NaiveDate) -> NaiveDateTime {
    date.and_time(t.time())
}

/// Signed offset `n` in `unit` (`y m w d H M S`); `None` for an unknown unit.
fn shift(t: NaiveDateTime, n: i64, unit: char) -> Option<NaiveDateTime> {
    let months = |t: NaiveDateTime, m: i64| {
        let m32 = u32::try_from(m.unsigned_abs()).ok()?;
        if m >= 0 {
            t.checked_add_months(Months::new(m32))
        } else {
            t.checked_sub_months(Months::new(m32))
        }
    };
    match unit {
        'y' => months(t, n.checked_mul(12)?),
        'm' => months(t, n),
        'w' => t.checked_add_signed(TimeDelta::try_weeks(n)?),
        'd' => t.checked_add_signed(TimeDelta::try_days(n)?),
        'H' => t.checked_add_signed(TimeDelta::try_hours(n)?),
        'M' => t.checked_add_signed(TimeDelta::try_minutes(n)?),
        'S' => t.checked_add_signed(TimeDelta::try_seconds(n)?),
        _ => None,
    }
}

/// Apply an offset like `3d` at the start of `s`, forcing its sign to
/// `sign`. Returns the bytes consumed, or `None` if `s` holds no offset.
fn offset(t: &mut NaiveDateTime, s: &str, sign: i64) -> Option<usize> {
    let (n, len) = leading_int(s).unwrap_or((0, 0));
    let unit = s[len..].chars().next()?;
    let n = n.abs() * sign;
    *t = shift(*t, n, unit)?;
    Some(len + 1)
}

/// Length of leading blanks.
fn blanks(s: &str) -> usize {
    s.len() - s.trim_start().len()
}

/// Parse an absolute date at the start of `s`: `yyyymmdd` or
/// `dd[/mm[/yy[yy]]]`, filling missing parts from `today`. Returns the day
/// and the bytes consumed.
fn absolute(s: &str, today: NaiveDate) -> Result<(NaiveDate, usize), String> {
    if s.len() >= 8 && s.as_bytes()[..8].iter().all(u8::is_ascii_digit) {
        let num = |from: usize, to: usize| s[from..to].parse::<u32>().unwrap_or(0);
        let (year, month, mday) = (num(0, 4), num(4, 6), num(6, 8));
        if !(1..=31).contains(&mday) {
            return Err(format!("Invalid day of month: {s}"));
        }
        if !(1..=12).contains(&month) {
            return Err(format!("Invalid month: {s}"));
        }
        let year = if year > 1900 { year } else { year + 1900 };
        return Ok((day(year as i32, month, mday), 8));
    }

    let field = |s: &str| -> (i64, usize) {
        match leading_int(s) {
            Some((n, len)) if !s.starts_with(['-', '+']) => (n, len),
            _ => (0, 0),
        }
    };
    let (mday, mut pos) = field(s);
    if !(1..=31).contains(&mday) {
        return Err(format!("Invalid day of month: {s}"));
    }
    let mday = mday as u32;
    if !s[pos..].starts_with('/') {
        return Ok((day(today.year(), today.month(), mday), pos));
    }
    pos += 1;
    let (month, len) = field(&s[pos..]);
    if !(1..=12).contains(&month) {
        return Err(format!("Invalid month: {}", &s[pos..]));
    }
    pos += len;
    let month = month as u32;
    if !s[pos..].starts_with('/') {
        return Ok((day(today.year(), month, mday), pos));
    }
    pos += 1;
    let (year, len) = field(&s[pos..]);
    pos += len;
    let year = match year {
        y if y < 70 => 2000 + y,
        y if y > 1900 => y,
        y => 1900 + y,
    };
    Ok((day(year as i32, month, mday), pos))
}

/// Which offsets a range tail has seen.
#[derive(Debug, Default)]
struct Seen {
    /// Any offset or date was parsed.
    any: bool,
    /// A `+` offset.
    plus: bool,
    /// A `*` window.
    window: bool,
}

/// Parse what follows the minimum date: `-date`, `-Nu`, `+Nu` and `*Nu`
/// terms.
fn tail(
    s: &str,
    min: &mut NaiveDateTime,
    max: &mut NaiveDateTime,
    have_min: bool,
    base_min: NaiveDateTime,
    today: NaiveDate,
) -> Result<(), String> {
    let bad = |at: &str| format!("Invalid relative date: {at}");
    let mut pos = 0;
    let mut seen = Seen::default();
    while let Some(ch) = s[pos..].chars().next() {
        let at = pos;
        pos += ch.len_utf8();
        pos += blanks(&s[pos..]);
        match ch {
            '-' => match offset(min, &s[pos..], -1) {
                Some(len) => {
                    pos += len;
                    if !seen.any && !have_min {
                        *max = with_date(*max, min.date());
                    }
                }
                None if !seen.any => {
                    let (date, _) = absolute(&s[pos..], today)?;
                    *max = with_date(*max, date);
                    if !have_min {
                        *min = base_min;
                    }
                    return Ok(());
                }
                None => return Err(bad(&s[at..])),
            },
            '+' => {
                pos += offset(max, &s[pos..], 1).ok_or_else(|| bad(&s[at..]))?;
                seen.plus = true;
            }
            '*' => {
                let len = offset(min, &s[pos..], -1).ok_or_else(|| bad(&s[at..]))?;
                let _ignored = offset(max, &s[pos..], 1);
                pos += len;
                seen.window = true;
            }
            _ => return Err(bad(&s[at..])),
        }
        if seen.plus && seen.window {
            return Err(format!("Cannot both extend and widen a date range: {s}"));
        }
        seen.any = true;
        pos += blanks(&s[pos..]);
    }
    Ok(())
}

/// Swap the days of `min` and `max` if they are reversed, widening to
/// whole days.
fn order(min: &mut NaiveDateTime, max: &mut NaiveDateTime) {
    if min.date() > max.date() {
        let (a, b) = (max.date(), min.date());
        *min = a.and_time(NaiveTime::MIN);
        *max = b.and_time(end_of_day());
    }
}

/// Resolve a date expression to a range of timestamps.
///
/// - `<Nu`, `>Nu`, `=Nu`: newer than, older than, exactly N units ago
/// - `DATE`: that whole day; `DATE-`: from that day on
/// - `DATE-DATE`, `-DATE`: between, or up to, absolute days
/// - `DATE-Nu`, `DATE+Nu`, `DATE*Nu`: ranges around an anchor day
///
/// Units are `y m w d H M S`.
pub fn resolve(s: &str, clock: &dyn Clock) -> Result<Range, String> {
    let tz = clock.local_offset();
    let now = clock.local_now().naive_local();
    let today = now.date();
    let mut min = floor();
    let mut max = ceiling();

    if let Some(sign) = s.chars().next().filter(|c| "<>=".contains(*c)) {
        let body = &s[1..];
        let (_, len) = leading_int(body).unwrap_or((0, 0));
        let unit = body[len..].chars().next();
        let mut t = now;
        if !matches!(unit, Some('H' | 'M' | 'S')) {
            t = today.and_time(end_of_day());
        }
        let _ignored = offset(&mut t, body, -1);
        match sign {
            '<' => min = t,
            '>' => max = t,
            _ => {
                max = t;
                min = t.date().and_time(NaiveTime::MIN);
            }
        }
    } else {
        let mut pos = 0;
        let mut have_min = false;
        let mut until_now = false;
        if s.starts_with(|c: char| c.is_ascii_digit()) {
            let (date, len) = absolute(s, today)?;
            min = date.and_time(NaiveTime::MIN);
            pos = len + blanks(&s[len..]);
            have_min = true;
            if let Some(rest) = s[pos..].strip_prefix('-') {
                until_now = rest.trim().is_empty();
            }
        }
        if !until_now {
            let base_min = min;
            if !have_min {
                min = today.and_time(NaiveTime::MIN);
            }
            max = with_date(max, min.date());
            tail(&s[pos..], &mut min, &mut max, have_min, base_min, today)?;
        }
    }

    order(&mut min, &mut max);
    let stamp = |t: NaiveDateTime| {
        tz.from_local_datetime(&t)
            .single()
            .map_or(0, |d| d.timestamp())
    };
    Ok(Range {
        min: stamp(min),
        max: stamp(max),
    })
}

#[cfg(test)]
mod tests {
    use maildata::FixedClock;

    use super::*;

    /// 2024-01-02T03:04:05Z, a Tuesday.
    const NOW: i64 = 1_704_164_645;

    fn ts(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    fn eval(s: &str) -> (i64, i64) {
        let r = resolve(s, &FixedClock::at(NOW)).unwrap();
        (r.min, r.max)
    }

    #[test]
    fn relative_to_now() {
        assert_eq!(eval("<1d"), (ts(2024, 1, 1, 23, 59, 59), ts(2030, 12, 31, 23, 59, 59)));
        assert_eq!(eval(">1w"), (ts(1970, 1, 2, 0, 0, 0), ts(2023, 12, 26, 23, 59, 59)));
        assert_eq!(eval("=2d"), (ts(2023, 12, 31, 0, 0, 0), ts(2023, 12, 31, 23, 59, 59)));
        assert_eq!(eval("<3H").0, NOW - 3 * 3600);
        assert_eq!(eval("<1m").0, ts(2023, 12, 2, 23, 59, 59));
    }

    #[test]
    fn absolute_days() {
        assert_eq!(eval("20210309"), (ts(2021, 3, 9, 0, 0, 0), ts(2021, 3, 9, 23, 59, 59)));
        assert_eq!(eval("9/3/21"), (ts(2021, 3, 9, 0, 0, 0), ts(2021, 3, 9, 23, 59, 59)));
        assert_eq!(eval("15"), (ts(2024, 1, 15, 0, 0, 0), ts(2024, 1, 15, 23, 59, 59)));
        assert_eq!(
            eval("01/01/2020-31/12/2023"),
            (ts(2020, 1, 1, 0, 0, 0), ts(2023, 12, 31, 23, 59, 59))
        );
        assert_eq!(eval("-31/12/1999"), (ts(1970, 1, 2, 0, 0, 0), ts(1999, 12, 31, 23, 59, 59)));
        assert_eq!(eval("01/06/2023-"), (ts(2023, 6, 1, 0, 0, 0), ts(2030, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn offsets_around_an_anchor() {
        assert_eq!(eval("01/01/2020+30d"), (ts(2020, 1, 1, 0, 0, 0), ts(2020, 1, 31, 23, 59, 59)));
        assert_eq!(eval("10/01/2020*2d"), (ts(2020, 1, 8, 0, 0, 0), ts(2020, 1, 12, 23, 59, 59)));
        assert_eq!(eval("10/01/2020-1w"), (ts(2020, 1, 3, 0, 0, 0), ts(2020, 1, 10, 23, 59, 59)));
        // Without an anchor the first offset picks a single day.
        assert_eq!(eval("-2d"), (ts(2023, 12, 31, 0, 0, 0), ts(2023, 12, 31, 23, 59, 59)));
        assert_eq!(eval("-3d+1d"), (ts(2023, 12, 30, 0, 0, 0), ts(2023, 12, 31, 23, 59, 59)));
    }

    #[test]
    fn reversed_days_are_swapped() {
        assert_eq!(
            eval("31/12/2023-01/01/2020"),
            (ts(2020, 1, 1, 0, 0, 0), ts(2023, 12, 31, 23, 59, 59))
        );
    }

    #[test]
    fn local_zone() {
        let clock = FixedClock::at(NOW).with_offset(3600);
        let r = resolve("20240102", &clock).unwrap();
        assert_eq!(r.min, ts(2024, 1, 2, 0, 0, 0) - 3600);
    }

    #[test]
    fn errors() {
        let clock = FixedClock::at(NOW);
        assert_eq!(resolve("32/01", &clock).unwrap_err(), "Invalid day of month: 32/01");
        assert_eq!(resolve("20201301", &clock).unwrap_err(), "Invalid month: 20201301");
        assert_eq!(resolve("01/13/2020", &clock).unwrap_err(), "Invalid month: 13/2020");
        assert_eq!(resolve("01/01/2020x", &clock).unwrap_err(), "Invalid relative date: x");
        assert_eq!(resolve("01/01/2020+1q", &clock).unwrap_err(), "Invalid relative date: +1q");
        assert!(
            resolve("01/01/2020+1d*1d", &clock)
                .unwrap_err()
                .starts_with("Cannot both extend and widen")
        );
    }
}
