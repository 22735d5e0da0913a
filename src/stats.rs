use crate::models::Card;
use crate::store::{CardStore, CsvCardBox};
use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::path::Path;

#[derive(Default, Debug, PartialEq)]
struct Counts {
    new: u64,
    day: u64,
    week: u64,
    month: u64,
    quarter: u64,
    year: u64,
    more: u64,
    due: u64,
}

impl Counts {
    fn from_cards(cards: &[Card], now: NaiveDateTime) -> Self {
        let mut counts = Counts::default();
        for card in cards {
            counts.increment_count(card.interval);
            if card.is_due(now) {
                counts.due += 1;
            }
        }
        counts
    }

    fn increment_count(&mut self, interval: Option<u32>) {
        match interval {
            None => self.new += 1,
            Some(0..=1) => self.day += 1,
            Some(2..7) => self.week += 1,
            Some(7..30) => self.month += 1,
            Some(30..90) => self.quarter += 1,
            Some(90..365) => self.year += 1,
            Some(_) => self.more += 1,
        }
    }

    fn total(&self) -> u64 {
        self.new + self.day + self.week + self.month + self.quarter + self.year + self.more
    }
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            concat!(
                "Current review intervals:\n",
                "  new      {}\n",
                "  =day     {}\n",
                "  <week    {}\n",
                "  <month   {}\n",
                "  <quarter {}\n",
                "  <year    {}\n",
                "  >=year   {}\n\n",
                "Due now: {}\n",
                "Total:   {}"
            ),
            self.new,
            self.day,
            self.week,
            self.month,
            self.quarter,
            self.year,
            self.more,
            self.due,
            self.total(),
        )
    }
}

pub fn stats(path: &Path, deck: &str) -> Result<()> {
    let card_box = CsvCardBox::open(path)?;
    let cards = card_box.load_cards_for_deck(deck)?;
    let counts = Counts::from_cards(&cards, Local::now().naive_local());
    println!("Deck {:?}\n{}", deck, counts);
    Ok(())
}

#[test]
fn test_counts_by_interval() {
    use chrono::{NaiveDate, TimeDelta};

    let now = NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let cards: Vec<Card> = [None, Some(1), Some(6), Some(15), Some(400)]
        .into_iter()
        .enumerate()
        .map(|(i, interval)| {
            let mut card = Card::new(i.to_string(), "d".into(), i.to_string(), "b".into());
            card.interval = interval;
            card.due_date = interval.map(|days| now + TimeDelta::days(days as i64 - 1));
            card
        })
        .collect();

    let counts = Counts::from_cards(&cards, now);

    assert_eq!(
        counts,
        Counts {
            new: 1,
            day: 1,
            week: 1,
            month: 1,
            quarter: 0,
            year: 0,
            more: 1,
            due: 2,
        }
    );
    assert_eq!(counts.total(), 5);
    assert!(counts.to_string().ends_with("Due now: 2\nTotal:   5"));
}
