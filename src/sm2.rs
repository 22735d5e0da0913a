//! SM-2 scheduling restricted to the qualities Again (0), Hard (2), Good (3)
//! and Easy (5).
//!
//! Intervals grow as 1, 6, then `round(interval * ease_factor)` days while the
//! card keeps being recalled. A lapse resets the card to a one day interval.
//! Rounding is half away from zero (`f64::round`), which is "round half up"
//! for the positive products that occur here.

use crate::error::Error;
use crate::models::{Card, Quality, Schedule};
use chrono::{Days, NaiveDateTime};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
const DEFAULT_INTERVAL: u32 = 1;

/// Fills in missing or malformed scheduling columns of a card.
pub fn normalize(card: &Card, now: NaiveDateTime) -> Schedule {
    let ease_factor = match card.ease_factor {
        Some(ef) if ef.is_finite() => ef.max(MIN_EASE_FACTOR),
        _ => DEFAULT_EASE_FACTOR,
    };
    Schedule {
        repetitions: card.repetitions.unwrap_or(0),
        interval: card.interval.unwrap_or(DEFAULT_INTERVAL).max(1),
        ease_factor,
        due_date: card.due_date.unwrap_or(now),
    }
}

/// Computes the schedule that follows rating a card with the given quality.
pub fn next_schedule(
    current: &Schedule,
    quality: Quality,
    now: NaiveDateTime,
) -> Result<Schedule, Error> {
    let (repetitions, interval) = if quality.is_success() {
        let interval = match current.repetitions {
            0 => 1,
            1 => 6,
            // `as` saturates, so absurd products stay at u32::MAX
            _ => (f64::from(current.interval) * current.ease_factor).round() as u32,
        };
        (current.repetitions.saturating_add(1), interval.max(1))
    } else {
        (0, 1)
    };

    let q = f64::from(quality.value());
    let ease_factor = current.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    let ease_factor = if ease_factor < MIN_EASE_FACTOR {
        MIN_EASE_FACTOR
    } else {
        ease_factor
    };

    let due_date = now
        .checked_add_days(Days::new(u64::from(interval)))
        .ok_or(Error::DueDateOverflow { interval })?;

    Ok(Schedule {
        repetitions,
        interval,
        ease_factor,
        due_date,
    })
}

/// Normalizes the card and rates it in one step.
pub fn rate(card: &Card, quality: Quality, now: NaiveDateTime) -> Result<Schedule, Error> {
    next_schedule(&normalize(card, now), quality, now)
}

#[cfg(test)]
fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap()
}

#[cfg(test)]
fn scheduled(repetitions: u32, interval: u32, ease_factor: f64) -> Schedule {
    Schedule {
        repetitions,
        interval,
        ease_factor,
        due_date: at(2025, 5, 9),
    }
}

#[test]
fn test_first_success_schedules_one_day() {
    let now = at(2025, 5, 10);
    let mut card = Card::new("c1".into(), "deck".into(), "a".into(), "b".into());
    card.repetitions = Some(0);
    card.interval = Some(1);
    card.ease_factor = Some(2.5);
    card.due_date = Some(at(2025, 5, 9));

    let next = rate(&card, Quality::Easy, now).unwrap();

    assert_eq!(next.repetitions, 1);
    assert_eq!(next.interval, 1);
    assert!((next.ease_factor - 2.6).abs() < 1e-9);
    assert_eq!(next.due_date, at(2025, 5, 11));
}

#[test]
fn test_second_success_schedules_six_days() {
    let now = at(2025, 5, 10);
    let next = next_schedule(&scheduled(1, 6, 2.5), Quality::Good, now).unwrap();

    assert_eq!(next.repetitions, 2);
    assert_eq!(next.interval, 6);
    assert!((next.ease_factor - 2.36).abs() < 1e-9);
    assert_eq!(next.due_date, at(2025, 5, 16));
}

#[test]
fn test_later_success_multiplies_by_previous_ease() {
    let now = at(2025, 5, 10);
    let next = next_schedule(&scheduled(2, 6, 2.5), Quality::Good, now).unwrap();
    assert_eq!(next.repetitions, 3);
    assert_eq!(next.interval, 15);

    // 3 * 2.5 = 7.5 rounds up
    let next = next_schedule(&scheduled(4, 3, 2.5), Quality::Easy, now).unwrap();
    assert_eq!(next.interval, 8);
}

#[test]
fn test_lapse_resets_repetitions_and_interval() {
    let now = at(2025, 5, 10);
    for quality in [Quality::Again, Quality::Hard] {
        for prior in [scheduled(0, 1, 2.5), scheduled(7, 120, 2.9)] {
            let next = next_schedule(&prior, quality, now).unwrap();
            assert_eq!(next.repetitions, 0);
            assert_eq!(next.interval, 1);
            assert_eq!(next.due_date, at(2025, 5, 11));
        }
    }
}

#[test]
fn test_again_lowers_ease_by_formula() {
    let now = at(2025, 5, 10);
    let next = next_schedule(&scheduled(3, 15, 2.5), Quality::Again, now).unwrap();
    assert!((next.ease_factor - 1.7).abs() < 1e-9);

    let next = next_schedule(&scheduled(3, 15, 1.5), Quality::Again, now).unwrap();
    assert_eq!(next.ease_factor, MIN_EASE_FACTOR);
}

#[test]
fn test_ease_factor_never_below_floor() {
    let now = at(2025, 5, 10);
    for quality in Quality::ALL {
        let mut ef = MIN_EASE_FACTOR;
        while ef < 3.5 {
            for reps in 0..4 {
                let next = next_schedule(&scheduled(reps, 10, ef), quality, now).unwrap();
                assert!(next.ease_factor >= MIN_EASE_FACTOR);
                assert!(next.interval >= 1);
            }
            ef += 0.05;
        }
    }
}

#[test]
fn test_easy_never_decreases_ease() {
    let now = at(2025, 5, 10);
    let mut state = scheduled(0, 1, MIN_EASE_FACTOR);
    for _ in 0..20 {
        let next = next_schedule(&state, Quality::Easy, now).unwrap();
        assert!(next.ease_factor >= state.ease_factor);
        assert!(next.interval >= state.interval);
        state = next;
    }
}

#[test]
fn test_due_date_follows_calendar() {
    // Leap day and year rollover
    let next = next_schedule(&scheduled(1, 1, 2.5), Quality::Good, at(2024, 2, 26)).unwrap();
    assert_eq!(next.due_date, at(2024, 3, 3));
    let next = next_schedule(&scheduled(0, 1, 2.5), Quality::Good, at(2025, 12, 31)).unwrap();
    assert_eq!(next.due_date, at(2026, 1, 1));
}

#[test]
fn test_normalize_defaults_missing_fields() {
    let now = at(2025, 5, 10);
    let mut card = Card::new("c1".into(), "deck".into(), "a".into(), "b".into());
    assert_eq!(normalize(&card, now), scheduled(0, 1, 2.5).with_due(now));

    card.interval = Some(0);
    card.ease_factor = Some(f64::NAN);
    assert_eq!(normalize(&card, now).interval, 1);
    assert_eq!(normalize(&card, now).ease_factor, DEFAULT_EASE_FACTOR);

    card.ease_factor = Some(0.9);
    assert_eq!(normalize(&card, now).ease_factor, MIN_EASE_FACTOR);
}

#[cfg(test)]
impl Schedule {
    fn with_due(self, due_date: NaiveDateTime) -> Self {
        Schedule { due_date, ..self }
    }
}
