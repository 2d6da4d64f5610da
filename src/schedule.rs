//! Daily posting timetable.
//!
//! A [`Slot`] fires once per day when local wall-clock time reaches it and
//! triggers `posts` pipeline invocations back to back. Which slots fire is a
//! pure function of the previous and current check time ([`due_slots`]), so
//! the polling loop itself stays trivial. After missed checks (a long
//! publish, a suspended laptop) each overdue slot fires once, never once per
//! skipped day.

use crate::pipeline::{Pipeline, RunOutcome};
use chrono::{Local, NaiveDateTime, NaiveTime};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid slot time {0:?} (expected HH:MM)")]
    InvalidTime(String),
    #[error("slot {0} must post at least once")]
    ZeroPosts(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub at: NaiveTime,
    pub posts: u32,
}

impl Slot {
    pub fn parse(at: &str, posts: u32) -> Result<Self, ScheduleError> {
        let time = NaiveTime::parse_from_str(at.trim(), "%H:%M")
            .map_err(|_| ScheduleError::InvalidTime(at.to_string()))?;
        if posts == 0 {
            return Err(ScheduleError::ZeroPosts(at.to_string()));
        }
        Ok(Self { at: time, posts })
    }
}

/// Slots whose most recent occurrence falls in `(last, now]`, in firing order.
///
/// Each slot fires at most once per call, however long the gap: an overdue
/// slot runs once and then waits for its next occurrence, the way a missed
/// cron tick does. A clock that went backwards fires nothing.
pub fn due_slots(slots: &[Slot], last: NaiveDateTime, now: NaiveDateTime) -> Vec<Slot> {
    if now <= last {
        return Vec::new();
    }
    let mut due: Vec<(NaiveDateTime, Slot)> = slots
        .iter()
        .filter_map(|slot| {
            let occurrence = latest_occurrence(slot.at, now)?;
            (occurrence > last).then_some((occurrence, *slot))
        })
        .collect();
    due.sort_by_key(|(occurrence, _)| *occurrence);
    due.into_iter().map(|(_, slot)| slot).collect()
}

/// Latest `at` on or before `now`: today if already reached, else yesterday.
fn latest_occurrence(at: NaiveTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date().and_time(at);
    if today <= now {
        Some(today)
    } else {
        now.date().pred_opt().map(|day| day.and_time(at))
    }
}

/// Remembers the latest check time so slots are only fired once.
#[derive(Debug, Clone)]
pub struct SlotTracker {
    slots: Vec<Slot>,
    last: NaiveDateTime,
}

impl SlotTracker {
    pub fn new(slots: &[Slot], start: NaiveDateTime) -> Self {
        Self {
            slots: slots.to_vec(),
            last: start,
        }
    }

    /// Slots due since the previous check.
    ///
    /// The high-water mark never moves backwards, so an hour repeated by a
    /// DST change or a clock correction does not fire its slots twice.
    pub fn tick(&mut self, now: NaiveDateTime) -> Vec<Slot> {
        let due = due_slots(&self.slots, self.last, now);
        self.last = self.last.max(now);
        due
    }
}

/// Total invocations per day.
pub fn daily_posts(slots: &[Slot]) -> u32 {
    slots.iter().map(|s| s.posts).sum()
}

/// Poll the clock forever, running the pipeline for every due slot.
///
/// A ledger failure aborts that slot only; the next slot tries again.
pub fn run_forever(pipeline: &mut Pipeline, slots: &[Slot], poll: Duration) -> ! {
    tracing::info!(
        slots = slots.len(),
        daily_posts = daily_posts(slots),
        "scheduled posting times"
    );
    let mut tracker = SlotTracker::new(slots, Local::now().naive_local());
    loop {
        std::thread::sleep(poll);
        for slot in tracker.tick(Local::now().naive_local()) {
            tracing::info!(at = %slot.at.format("%H:%M"), posts = slot.posts, "slot due");
            run_slot(pipeline, slot);
        }
    }
}

fn run_slot(pipeline: &mut Pipeline, slot: Slot) {
    for _ in 0..slot.posts {
        match pipeline.run_once() {
            Ok(RunOutcome::NoCandidate) => {
                tracing::warn!("no candidate available for slot");
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(operation = "run_slot", %error, "pipeline failed, skipping rest of slot");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn slots(spec: &[(&str, u32)]) -> Vec<Slot> {
        spec.iter()
            .map(|(t, n)| Slot::parse(t, *n).unwrap())
            .collect()
    }

    #[test]
    fn parse_accepts_hh_mm() {
        let slot = Slot::parse("13:30", 2).unwrap();
        assert_eq!(slot.at, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
        assert_eq!(slot.posts, 2);
    }

    #[test]
    fn parse_rejects_bad_time_and_zero_posts() {
        assert!(matches!(
            Slot::parse("25:00", 1),
            Err(ScheduleError::InvalidTime(_))
        ));
        assert!(matches!(
            Slot::parse("noon", 1),
            Err(ScheduleError::InvalidTime(_))
        ));
        assert!(matches!(
            Slot::parse("12:00", 0),
            Err(ScheduleError::ZeroPosts(_))
        ));
    }

    #[test]
    fn slot_fires_when_crossed() {
        let s = slots(&[("11:00", 1)]);
        assert_eq!(due_slots(&s, at(1, 10, 59), at(1, 11, 0)).len(), 1);
        assert!(due_slots(&s, at(1, 11, 0), at(1, 11, 1)).is_empty());
        assert!(due_slots(&s, at(1, 10, 0), at(1, 10, 59)).is_empty());
    }

    #[test]
    fn multiple_slots_fire_in_time_order() {
        let s = slots(&[("14:00", 2), ("13:00", 1), ("13:30", 3)]);
        let due = due_slots(&s, at(1, 12, 0), at(1, 14, 0));
        let posts: Vec<u32> = due.iter().map(|s| s.posts).collect();
        assert_eq!(posts, vec![1, 3, 2]);
    }

    #[test]
    fn crossing_midnight_fires_next_day_slots() {
        let s = slots(&[("23:30", 1), ("00:15", 2)]);
        let due = due_slots(&s, at(1, 23, 0), at(2, 0, 30));
        let posts: Vec<u32> = due.iter().map(|s| s.posts).collect();
        assert_eq!(posts, vec![1, 2]);
    }

    #[test]
    fn long_gap_fires_each_slot_once() {
        let s = slots(&[("12:00", 1), ("13:30", 2), ("22:00", 1)]);
        let due = due_slots(&s, at(1, 23, 0), at(4, 23, 0));
        let times: Vec<String> = due.iter().map(|s| s.at.format("%H:%M").to_string()).collect();
        assert_eq!(times, vec!["12:00", "13:30", "22:00"]);
    }

    #[test]
    fn long_gap_posts_at_most_one_day() {
        let s = slots(&[
            ("11:00", 1),
            ("12:00", 1),
            ("13:00", 2),
            ("13:30", 2),
            ("14:00", 2),
            ("22:00", 1),
        ]);
        let due = due_slots(&s, at(1, 23, 0), at(4, 23, 0));
        assert_eq!(due.len(), s.len());
        assert_eq!(daily_posts(&due), daily_posts(&s));
    }

    // =========================================================================
    // SlotTracker tests
    // =========================================================================

    #[test]
    fn tracker_fires_slot_once() {
        let s = slots(&[("13:00", 1)]);
        let mut tracker = SlotTracker::new(&s, at(1, 12, 30));
        assert_eq!(tracker.tick(at(1, 13, 0)).len(), 1);
        assert!(tracker.tick(at(1, 13, 1)).is_empty());
    }

    #[test]
    fn tracker_ignores_repeated_hour_after_clock_moves_back() {
        let s = slots(&[("02:30", 1)]);
        let mut tracker = SlotTracker::new(&s, at(1, 2, 0));
        assert_eq!(tracker.tick(at(1, 2, 45)).len(), 1);
        // clock falls back an hour
        assert!(tracker.tick(at(1, 2, 5)).is_empty());
        assert!(tracker.tick(at(1, 2, 31)).is_empty());
        assert!(tracker.tick(at(1, 2, 59)).is_empty());
        // next day fires again
        assert_eq!(tracker.tick(at(2, 2, 30)).len(), 1);
    }

    #[test]
    fn clock_going_backwards_fires_nothing() {
        let s = slots(&[("12:00", 1)]);
        assert!(due_slots(&s, at(2, 13, 0), at(1, 11, 0)).is_empty());
    }

    #[test]
    fn daily_posts_sums_slots() {
        assert_eq!(daily_posts(&slots(&[("11:00", 1), ("13:00", 2)])), 3);
    }
}
