//! Session-based sweep trigger times.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use tracing::warn;

/// Parse a comma separated list of `HH:MM` UTC times.
///
/// Invalid entries are skipped. The result is sorted without duplicates.
pub fn parse_session_times(raw: &str) -> Vec<NaiveTime> {
    let mut times: Vec<NaiveTime> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match NaiveTime::parse_from_str(s, "%H:%M") {
            Ok(t) => Some(t),
            Err(_) => {
                warn!("Ignoring invalid session time {:?}", s);
                None
            }
        })
        .collect();
    times.sort();
    times.dedup();
    times
}

/// Daily trigger times in UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSchedule {
    times: Vec<NaiveTime>,
}

impl SessionSchedule {
    pub fn new(mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        Self { times }
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// First trigger strictly after `now`. None when no times are configured.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        if let Some(t) = self
            .times
            .iter()
            .map(|t| today.and_time(*t).and_utc())
            .find(|candidate| *candidate > now)
        {
            return Some(t);
        }

        let first = self.times.first()?;
        let tomorrow = today.succ_opt()?;
        Some(tomorrow.and_time(*first).and_utc())
    }

    /// Time to wait from `now` until the next trigger.
    pub fn until_next(&self, now: DateTime<Utc>) -> Option<std::time::Duration> {
        let next = self.next_after(now)?;
        (next - now)
            .max(ChronoDuration::zero())
            .to_std()
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, h, m, s).unwrap()
    }

    fn schedule() -> SessionSchedule {
        SessionSchedule::new(parse_session_times("22:55, 06:55,12:55"))
    }

    #[test]
    fn test_parse_sorts_and_skips_invalid() {
        let times = parse_session_times("12:55,bad,06:55,,12:55,25:00");
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(6, 55, 0).unwrap(),
                NaiveTime::from_hms_opt(12, 55, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn test_next_same_day() {
        assert_eq!(schedule().next_after(at(7, 0, 0)), Some(at(12, 55, 0)));
        assert_eq!(schedule().next_after(at(0, 0, 0)), Some(at(6, 55, 0)));
    }

    #[test]
    fn test_exact_trigger_moves_to_next() {
        assert_eq!(schedule().next_after(at(12, 55, 0)), Some(at(22, 55, 0)));
    }

    #[test]
    fn test_wraps_to_tomorrow() {
        let next = schedule().next_after(at(23, 0, 0)).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 3, 16, 6, 55, 0).unwrap());
    }

    #[test]
    fn test_empty_schedule() {
        let empty = SessionSchedule::new(Vec::new());
        assert!(empty.next_after(at(1, 0, 0)).is_none());
        assert!(empty.until_next(at(1, 0, 0)).is_none());
    }

    #[test]
    fn test_until_next() {
        let wait = schedule().until_next(at(12, 50, 0)).unwrap();
        assert_eq!(wait, std::time::Duration::from_secs(300));
    }
}
