use crate::error::Error;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use struct_field_names_as_array::FieldNamesAsArray;

/// A flashcard as it is stored in the card box. Scheduling columns are empty
/// until the card is rated for the first time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, FieldNamesAsArray)]
pub struct Card {
    pub id: String,
    pub deck: String,
    pub front: String,
    pub back: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub repetitions: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub interval: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub ease_factor: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub due_date: Option<NaiveDateTime>,
}

impl Card {
    pub fn new(id: String, deck: String, front: String, back: String) -> Self {
        Card {
            id,
            deck,
            front,
            back,
            repetitions: None,
            interval: None,
            ease_factor: None,
            due_date: None,
        }
    }

    /// Cards that were never scheduled are due right away.
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.due_date.map_or(true, |due| due <= now)
    }

    pub fn apply(&mut self, schedule: &Schedule) {
        self.repetitions = Some(schedule.repetitions);
        self.interval = Some(schedule.interval);
        self.ease_factor = Some(schedule.ease_factor);
        self.due_date = Some(schedule.due_date);
    }
}

/// Fully populated scheduling state of a card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
    pub repetitions: u32,
    /// Days until the next review, at least 1.
    pub interval: u32,
    /// Never below 1.3.
    pub ease_factor: f64,
    pub due_date: NaiveDateTime,
}

/// How well the answer was recalled. Ratings of 3 and above are successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Again = 0,
    Hard = 2,
    Good = 3,
    Easy = 5,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Again, Quality::Hard, Quality::Good, Quality::Easy];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self.value() >= 3
    }
}

impl TryFrom<u8> for Quality {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Quality::Again),
            2 => Ok(Quality::Hard),
            3 => Ok(Quality::Good),
            5 => Ok(Quality::Easy),
            _ => Err(Error::InvalidQuality(value)),
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "a" | "again" | "0" => Ok(Quality::Again),
            "h" | "hard" | "2" => Ok(Quality::Hard),
            "g" | "good" | "3" => Ok(Quality::Good),
            "e" | "easy" | "5" => Ok(Quality::Easy),
            _ => Err(Error::InvalidRating(s.to_string())),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Quality::Again => "Again",
            Quality::Hard => "Hard",
            Quality::Good => "Good",
            Quality::Easy => "Easy",
        };
        write!(f, "{}", label)
    }
}

#[test]
fn test_quality_accepts_only_restricted_domain() {
    for q in Quality::ALL {
        assert_eq!(Quality::try_from(q.value()), Ok(q));
    }
    assert_eq!(Quality::try_from(1), Err(Error::InvalidQuality(1)));
    assert_eq!(Quality::try_from(4), Err(Error::InvalidQuality(4)));
    assert_eq!(Quality::try_from(6), Err(Error::InvalidQuality(6)));
}

#[test]
fn test_quality_parses_labels() {
    assert_eq!("a".parse::<Quality>(), Ok(Quality::Again));
    assert_eq!(" Hard ".parse::<Quality>(), Ok(Quality::Hard));
    assert_eq!("3".parse::<Quality>(), Ok(Quality::Good));
    assert_eq!("EASY".parse::<Quality>(), Ok(Quality::Easy));
    assert_eq!(
        "x".parse::<Quality>(),
        Err(Error::InvalidRating(String::from("x")))
    );
    assert!(!Quality::Hard.is_success());
    assert!(Quality::Good.is_success());
}

#[test]
fn test_unscheduled_card_is_due() {
    let now = chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let mut card = Card::new("1".into(), "d".into(), "a".into(), "b".into());
    assert!(card.is_due(now));
    card.due_date = Some(now);
    assert!(card.is_due(now));
    card.due_date = Some(now + chrono::TimeDelta::seconds(1));
    assert!(!card.is_due(now));
}
