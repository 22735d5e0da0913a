use crate::models::{Card, Schedule};
use crate::utils::{create_reader, create_writer};
use anyhow::{anyhow, Result};
use log::{debug, info};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use struct_field_names_as_array::FieldNamesAsArray;

/// Where cards come from and where rated schedules go.
pub trait CardStore {
    /// Cards of one deck in storage order.
    fn load_cards_for_deck(&self, deck: &str) -> Result<Vec<Card>>;

    fn save_card_update(&mut self, card_id: &str, schedule: &Schedule) -> Result<()>;
}

/// Card box kept as a `|`-delimited CSV file with a header row.
pub struct CsvCardBox {
    path: PathBuf,
}

impl CsvCardBox {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!(
                "File {:?} doesn't exist. Use `studydeck init` to create it. Aborting.",
                path
            ));
        }
        Ok(CsvCardBox {
            path: path.to_path_buf(),
        })
    }

    /// All cards of all decks.
    pub fn load_all(&self) -> Result<Vec<Card>> {
        let mut reader = create_reader(&self.path)?;
        let cards = reader
            .deserialize::<Card>()
            .collect::<Result<Vec<_>, csv::Error>>()?;
        Ok(cards)
    }

    /// Replaces the file contents, going through a sibling temp file.
    fn write_all(&self, cards: &[Card]) -> Result<()> {
        let tmp = self.path.with_extension("csv.tmp");
        {
            let mut writer = create_writer(File::create(&tmp)?);
            writer.write_record(Card::FIELD_NAMES_AS_ARRAY)?;
            for card in cards {
                writer.serialize(card)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!("Rewrote {:?} with {} cards", self.path, cards.len());
        Ok(())
    }
}

impl CardStore for CsvCardBox {
    fn load_cards_for_deck(&self, deck: &str) -> Result<Vec<Card>> {
        let cards: Vec<Card> = self
            .load_all()?
            .into_iter()
            .filter(|card| card.deck == deck)
            .collect();
        info!("Loaded {} cards of deck {:?} from {:?}", cards.len(), deck, self.path);
        Ok(cards)
    }

    fn save_card_update(&mut self, card_id: &str, schedule: &Schedule) -> Result<()> {
        let mut cards = self.load_all()?;
        let card = cards
            .iter_mut()
            .find(|card| card.id == card_id)
            .ok_or_else(|| anyhow!("Card {} not found in {:?}", card_id, self.path))?;
        card.apply(schedule);
        self.write_all(&cards)
    }
}

#[cfg(test)]
pub(crate) fn write_card_box(path: &Path, contents: &str) {
    let header = Card::FIELD_NAMES_AS_ARRAY.join("|");
    fs::write(path, format!("{}\n{}", header, contents)).unwrap();
}

#[test]
fn test_load_cards_for_deck_keeps_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");
    write_card_box(
        &path,
        "1|spanish|uno|one||||\n\
        2|german|eins|one||||\n\
        3|spanish|dos|two|2|6|2.36|2025-05-16T08:30:00\n",
    );
    let store = CsvCardBox::open(&path).unwrap();

    let cards = store.load_cards_for_deck("spanish").unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].id, "1");
    assert_eq!(cards[0].repetitions, None);
    assert_eq!(cards[0].due_date, None);
    assert_eq!(cards[1].id, "3");
    assert_eq!(cards[1].interval, Some(6));
    assert_eq!(cards[1].ease_factor, Some(2.36));
    assert!(store.load_cards_for_deck("french").unwrap().is_empty());
}

#[test]
fn test_malformed_schedule_columns_read_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");
    write_card_box(&path, "1|d|a|b|-3|many|x|yesterday\n");
    let store = CsvCardBox::open(&path).unwrap();

    let cards = store.load_cards_for_deck("d").unwrap();

    assert_eq!(cards[0].repetitions, None);
    assert_eq!(cards[0].interval, None);
    assert_eq!(cards[0].ease_factor, None);
    assert_eq!(cards[0].due_date, None);
}

#[test]
fn test_save_card_update_rewrites_only_that_card() {
    use chrono::NaiveDate;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");
    write_card_box(&path, "1|d|a|b||||\n2|d|c|d||||\n");
    let mut store = CsvCardBox::open(&path).unwrap();
    let due_date = NaiveDate::from_ymd_opt(2025, 5, 11)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();

    store
        .save_card_update(
            "2",
            &Schedule {
                repetitions: 1,
                interval: 1,
                ease_factor: 2.5,
                due_date,
            },
        )
        .unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "id|deck|front|back|repetitions|interval|ease_factor|due_date\n\
        1|d|a|b||||\n\
        2|d|c|d|1|1|2.5|2025-05-11T08:30:00\n"
    );
    assert!(!path.with_extension("csv.tmp").exists());
}

#[test]
fn test_save_unknown_card_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");
    write_card_box(&path, "1|d|a|b||||\n");
    let mut store = CsvCardBox::open(&path).unwrap();
    let schedule = Schedule {
        repetitions: 0,
        interval: 1,
        ease_factor: 2.5,
        due_date: chrono::NaiveDateTime::default(),
    };
    assert!(store.save_card_update("9", &schedule).is_err());
}

#[test]
fn test_open_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CsvCardBox::open(&dir.path().join("missing.csv")).is_err());
}
