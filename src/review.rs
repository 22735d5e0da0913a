use crate::models::Quality;
use crate::session::{Phase, Rated, StudySession};
use crate::store::{CardStore, CsvCardBox};
use crate::utils::{clear, plural, read_line};
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use rand::Rng;
use std::io::{stdin, stdout, BufRead, Write};
use std::path::Path;

/// A rated card together with whether its new schedule reached the store.
#[derive(Debug)]
pub struct Review {
    pub rated: Rated,
    pub saved: bool,
}

/// Drives study sessions for one deck on top of a card store.
pub struct Controller<S, G> {
    store: S,
    deck: String,
    rng: G,
    session: Option<StudySession>,
}

impl<S: CardStore, G: Rng> Controller<S, G> {
    pub fn new(store: S, deck: &str, rng: G) -> Self {
        Controller {
            store,
            deck: deck.to_string(),
            rng,
            session: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session
            .as_ref()
            .map_or(Phase::Loading, StudySession::phase)
    }

    pub fn session(&self) -> Option<&StudySession> {
        self.session.as_ref()
    }

    /// Loads the deck and starts a fresh session. Also used to restart a
    /// completed session.
    pub fn open(&mut self, now: NaiveDateTime) -> Result<&StudySession> {
        let cards = self.store.load_cards_for_deck(&self.deck)?;
        let session = StudySession::build(cards, now, &mut self.rng);
        info!(
            "Opened deck {:?}: {} cards, {} due",
            self.deck,
            session.len(),
            session.total()
        );
        Ok(&*self.session.insert(session))
    }

    /// Rates the current card. The session moves on even if the store
    /// rejects the update.
    pub fn rate(&mut self, quality: Quality, now: NaiveDateTime) -> Result<Review> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("Deck {:?} has not been opened yet", self.deck))?;
        let rated = session.rate(quality, now)?;
        let saved = match self.store.save_card_update(&rated.card_id, &rated.schedule) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not save card {}: {:#}", rated.card_id, e);
                false
            }
        };
        Ok(Review { rated, saved })
    }
}

/// Lets user study a deck until the session is complete.
pub fn review<G: Rng>(path: &Path, deck: &str, rng: G) -> Result<()> {
    let store = CsvCardBox::open(path)?;
    let mut controller = Controller::new(store, deck, rng);
    let mut stdout_lock = stdout().lock();
    let mut stdin_lock = stdin().lock();
    let now = Local::now().naive_local();
    study(&mut controller, now, &mut stdin_lock, &mut stdout_lock)
}

fn study<S, G, R, W>(
    controller: &mut Controller<S, G>,
    now: NaiveDateTime,
    stdin: &mut R,
    stdout: &mut W,
) -> Result<()>
where
    S: CardStore,
    G: Rng,
    R: BufRead,
    W: Write,
{
    loop {
        let (len, total) = {
            let session = controller.open(now)?;
            (session.len(), session.total())
        };
        if len == 0 {
            writeln!(stdout, "No cards in deck {:?}", controller.deck)?;
            return Ok(());
        }
        writeln!(
            stdout,
            "Deck {:?}: {} card{} due of {}\n",
            controller.deck,
            total,
            plural(total),
            len
        )?;

        while let Some((front, back)) = controller
            .session()
            .and_then(StudySession::current)
            .map(|card| (card.front.clone(), card.back.clone()))
        {
            let review = review_card(controller, &front, &back, now, stdin, stdout)?;
            if !review.saved {
                writeln!(stdout, "Warning: could not save this card, continuing.")?;
            }
            let interval = review.rated.schedule.interval;
            writeln!(
                stdout,
                "Next review in {} day{}.\n",
                interval,
                plural(interval as usize)
            )?;
            clear(stdout)?;
            stdout.flush()?;
        }

        if let Some(session) = controller.session() {
            writeln!(
                stdout,
                "{} of {} due card{} done. Session complete.",
                session.done(),
                session.total(),
                plural(session.total())
            )?;
        }
        write!(stdout, "Study again? [y/N] ")?;
        stdout.flush()?;
        let answer = read_line(&mut *stdin)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }
        writeln!(stdout)?;
    }
}

// Shows the card and asks for a rating until a valid one is given.
fn review_card<S, G, R, W>(
    controller: &mut Controller<S, G>,
    front: &str,
    back: &str,
    now: NaiveDateTime,
    stdin: &mut R,
    stdout: &mut W,
) -> Result<Review>
where
    S: CardStore,
    G: Rng,
    R: BufRead,
    W: Write,
{
    write!(stdout, "F: {}", front)?;
    stdout.flush()?;
    let _: String = read_line(&mut *stdin)?;
    writeln!(stdout, "B: {}", back)?;

    let quality = loop {
        write!(stdout, "Rating ([a]gain, [h]ard, [g]ood, [e]asy): ")?;
        stdout.flush()?;
        match read_line(&mut *stdin)?.parse::<Quality>() {
            Ok(quality) => break quality,
            Err(e) => writeln!(stdout, "{}", e)?,
        }
    };
    controller.rate(quality, now)
}

#[cfg(test)]
#[derive(Default)]
struct MemoryStore {
    cards: Vec<crate::models::Card>,
    saved: Vec<(String, crate::models::Schedule)>,
    fail_saves: bool,
}

#[cfg(test)]
impl CardStore for MemoryStore {
    fn load_cards_for_deck(&self, deck: &str) -> Result<Vec<crate::models::Card>> {
        Ok(self
            .cards
            .iter()
            .filter(|c| c.deck == deck)
            .cloned()
            .collect())
    }

    fn save_card_update(
        &mut self,
        card_id: &str,
        schedule: &crate::models::Schedule,
    ) -> Result<()> {
        if self.fail_saves {
            return Err(anyhow!("disk full"));
        }
        let card = self
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or_else(|| anyhow!("no card {}", card_id))?;
        card.apply(schedule);
        self.saved.push((card_id.to_string(), *schedule));
        Ok(())
    }
}

#[cfg(test)]
fn today() -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2025, 5, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

#[cfg(test)]
fn one_card_store() -> MemoryStore {
    use crate::models::Card;

    MemoryStore {
        cards: vec![
            Card::new("1".into(), "d".into(), "a".into(), "b".into()),
            Card::new("2".into(), "other".into(), "x".into(), "y".into()),
        ],
        ..Default::default()
    }
}

#[test]
fn test_controller_phases() {
    let mut controller = Controller::new(one_card_store(), "d", rand::rng());
    assert_eq!(controller.phase(), Phase::Loading);
    assert!(controller.rate(Quality::Good, today()).is_err());

    controller.open(today()).unwrap();
    assert_eq!(controller.phase(), Phase::Active);

    let review = controller.rate(Quality::Good, today()).unwrap();
    assert!(review.saved);
    assert_eq!(controller.phase(), Phase::Complete);
    assert_eq!(controller.store.saved.len(), 1);
    assert_eq!(controller.store.saved[0].0, "1");

    let err = controller.rate(Quality::Good, today()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<crate::error::Error>(),
        Some(&crate::error::Error::SessionComplete { cursor: 1, len: 1 })
    );
}

#[test]
fn test_restart_rebuilds_from_stored_cards() {
    let mut controller = Controller::new(one_card_store(), "d", rand::rng());
    controller.open(today()).unwrap();
    controller.rate(Quality::Good, today()).unwrap();

    // The card is now due tomorrow, so the new session has nothing due
    let session = controller.open(today()).unwrap();
    assert_eq!(session.len(), 1);
    assert_eq!(session.total(), 0);
    assert_eq!(controller.phase(), Phase::Active);
}

#[test]
fn test_failed_save_still_advances() {
    let store = MemoryStore {
        fail_saves: true,
        ..one_card_store()
    };
    let mut controller = Controller::new(store, "d", rand::rng());
    controller.open(today()).unwrap();

    let review = controller.rate(Quality::Easy, today()).unwrap();

    assert!(!review.saved);
    assert_eq!(review.rated.schedule.repetitions, 1);
    assert_eq!(controller.phase(), Phase::Complete);
    assert_eq!(controller.session().unwrap().done(), 1);
}

#[test]
fn test_study_prompts_and_reprompts_invalid_rating() {
    use std::io::Cursor;

    let mut controller = Controller::new(one_card_store(), "d", rand::rng());
    let mut stdout = Cursor::new(Vec::new());
    let mut stdin = Cursor::new(b"\nmaybe\ng\nn\n".to_vec());

    study(&mut controller, today(), &mut stdin, &mut stdout).unwrap();

    let stdout_vec = stdout.into_inner();
    assert_eq!(
        String::from_utf8_lossy(&stdout_vec),
        "Deck \"d\": 1 card due of 1\n\n\
        F: aB: b\n\
        Rating ([a]gain, [h]ard, [g]ood, [e]asy): \
        Unknown rating \"maybe\". Use [a]gain, [h]ard, [g]ood or [e]asy.\n\
        Rating ([a]gain, [h]ard, [g]ood, [e]asy): \
        Next review in 1 day.\n\n\
        \u{1b}[2J\u{1b}[1;1H\
        1 of 1 due card done. Session complete.\n\
        Study again? [y/N] "
    );
    assert_eq!(
        controller.store.cards[0].due_date,
        Some(today() + chrono::TimeDelta::days(1))
    );
    assert_eq!(controller.store.cards[1].due_date, None);
}

#[test]
fn test_study_empty_deck() {
    use std::io::Cursor;

    let mut controller = Controller::new(MemoryStore::default(), "d", rand::rng());
    let mut stdout = Cursor::new(Vec::new());
    let mut stdin = Cursor::new(Vec::new());

    study(&mut controller, today(), &mut stdin, &mut stdout).unwrap();

    let stdout_vec = stdout.into_inner();
    assert_eq!(
        String::from_utf8_lossy(&stdout_vec),
        "No cards in deck \"d\"\n"
    );
    assert_eq!(controller.phase(), Phase::Complete);
}

#[test]
fn test_study_restart_reviews_deck_again() {
    use std::io::Cursor;

    let mut controller = Controller::new(one_card_store(), "d", rand::rng());
    let mut stdout = Cursor::new(Vec::new());
    let mut stdin = Cursor::new(b"\na\ny\n\ne\n\n".to_vec());

    study(&mut controller, today(), &mut stdin, &mut stdout).unwrap();

    let output = String::from_utf8(stdout.into_inner()).unwrap();
    assert!(output.contains("0 of 1 due card done."));
    // Lapsed card is due tomorrow, so the second session has no due cards
    assert!(output.contains("Deck \"d\": 0 cards due of 1"));
    assert!(output.contains("0 of 0 due cards done."));
    assert_eq!(controller.store.saved.len(), 2);
    assert_eq!(controller.store.saved[1].1.repetitions, 1);
}
