use crate::error::Error;
use crate::models::{Card, Quality, Schedule};
use crate::queue::{build_queue, QueuedCard};
use crate::sm2;
use chrono::NaiveDateTime;
use log::debug;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Cards for the deck have not been loaded yet.
    Loading,
    Active,
    Complete,
}

/// Outcome of rating the card under the cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct Rated {
    pub card_id: String,
    pub quality: Quality,
    pub schedule: Schedule,
}

/// One pass over a deck. Lives in memory only; restarting means building a new one.
#[derive(Debug, Clone)]
pub struct StudySession {
    queue: Vec<QueuedCard>,
    cursor: usize,
    total: usize,
    done: usize,
}

impl StudySession {
    pub fn build<R>(cards: Vec<Card>, now: NaiveDateTime, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let queue = build_queue(cards, now, rng);
        let total = queue.iter().filter(|q| q.due).count();
        debug!(
            "Built study queue of {} cards, {} due",
            queue.len(),
            total
        );
        StudySession {
            queue,
            cursor: 0,
            total,
            done: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.cursor < self.queue.len() {
            Phase::Active
        } else {
            Phase::Complete
        }
    }

    /// True if the deck had no cards at all, as opposed to all of them being done.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn current(&self) -> Option<&Card> {
        self.queue.get(self.cursor).map(|q| &q.card)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Number of cards that were due when the session started.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of initially due cards recalled successfully so far.
    pub fn done(&self) -> usize {
        self.done
    }

    /// Rates the card under the cursor and moves on to the next one, whatever the rating.
    pub fn rate(&mut self, quality: Quality, now: NaiveDateTime) -> Result<Rated, Error> {
        let len = self.queue.len();
        let entry = self
            .queue
            .get_mut(self.cursor)
            .ok_or(Error::SessionComplete {
                cursor: self.cursor,
                len,
            })?;
        let schedule = sm2::rate(&entry.card, quality, now)?;
        entry.card.apply(&schedule);
        // Only the cards due at session start count towards the goal
        if quality.is_success() && entry.due {
            self.done += 1;
        }
        let card_id = entry.card.id.clone();
        self.cursor += 1;
        debug!(
            "Rated card {} {}: interval {} days, ease {:.2}",
            card_id, quality, schedule.interval, schedule.ease_factor
        );
        Ok(Rated {
            card_id,
            quality,
            schedule,
        })
    }
}

#[cfg(test)]
fn noon() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn test_empty_deck_is_complete_but_empty() {
    let session = StudySession::build(Vec::new(), noon(), &mut rand::rng());
    assert_eq!(session.phase(), Phase::Complete);
    assert!(session.is_empty());
    assert_eq!(session.total(), 0);
    assert_eq!(session.done(), 0);
    assert!(session.current().is_none());
}

#[test]
fn test_finished_session_is_not_empty() {
    let now = noon();
    let cards = crate::queue::test_deck(now, 1, 0);
    let mut session = StudySession::build(cards, now, &mut rand::rng());
    session.rate(Quality::Good, now).unwrap();
    assert_eq!(session.phase(), Phase::Complete);
    assert!(!session.is_empty());
    assert_eq!(session.done(), session.total());
}

#[test]
fn test_only_due_successes_count_as_done() {
    let now = noon();
    let cards = crate::queue::test_deck(now, 2, 2);
    let mut session = StudySession::build(cards, now, &mut rand::rng());
    assert_eq!(session.total(), 2);
    assert_eq!(session.phase(), Phase::Active);

    // Due cards: one lapse, one success
    session.rate(Quality::Again, now).unwrap();
    assert_eq!(session.done(), 0);
    session.rate(Quality::Easy, now).unwrap();
    assert_eq!(session.done(), 1);

    // Not due cards never count
    session.rate(Quality::Good, now).unwrap();
    session.rate(Quality::Hard, now).unwrap();
    assert_eq!(session.done(), 1);
    assert_eq!(session.cursor(), 4);
    assert_eq!(session.phase(), Phase::Complete);
}

#[test]
fn test_rate_updates_card_in_queue() {
    let now = noon();
    let cards = crate::queue::test_deck(now, 1, 0);
    let mut session = StudySession::build(cards, now, &mut rand::rng());
    let rated = session.rate(Quality::Good, now).unwrap();
    assert_eq!(rated.card_id, "c0");
    assert_eq!(rated.schedule.repetitions, 1);
    let card = &session.queue[0].card;
    assert_eq!(card.repetitions, Some(1));
    assert_eq!(card.due_date, Some(now + chrono::TimeDelta::days(1)));
}

#[test]
fn test_rate_after_completion_is_rejected() {
    let now = noon();
    let cards = crate::queue::test_deck(now, 1, 0);
    let mut session = StudySession::build(cards, now, &mut rand::rng());
    session.rate(Quality::Again, now).unwrap();
    assert_eq!(
        session.rate(Quality::Good, now),
        Err(Error::SessionComplete { cursor: 1, len: 1 })
    );
    assert_eq!(session.cursor(), 1);
    assert_eq!(session.done(), 0);
}
