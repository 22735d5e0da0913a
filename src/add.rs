use crate::models::Card;
use crate::store::CsvCardBox;
use crate::utils::{create_writer, read_line};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{stdin, stdout, BufRead, Write};
use std::path::Path;
use uuid::Uuid;

/// Fronts of a deck mapped to their line in the CSV file, plus the last line of the file.
struct LookupTable {
    fronts: HashMap<String, usize>,
    last_line: usize,
}

impl LookupTable {
    fn empty() -> Self {
        LookupTable {
            fronts: HashMap::new(),
            last_line: 1,
        }
    }
}

/// Lets user add as many new cards as they want to a deck of the given card box.
pub fn add(path: &Path, deck: &str) -> Result<()> {
    let card_box = CsvCardBox::open(path)?;
    let lookup = build_lookup_table(&card_box, deck)?;
    let mut stdout_lock = stdout().lock();
    let mut stdin_lock = stdin().lock();
    let file = OpenOptions::new().append(true).open(path)?;
    add_cards(
        deck,
        file,
        &mut stdin_lock,
        &mut stdout_lock,
        lookup,
        || Uuid::new_v4().to_string(),
    )
}

fn add_cards<F, R, W, I>(
    deck: &str,
    file: F,
    mut stdin: R,
    mut stdout: W,
    mut lookup: LookupTable,
    mut new_id: I,
) -> Result<()>
where
    F: Write,
    R: BufRead,
    W: Write,
    I: FnMut() -> String,
{
    let mut writer = create_writer(file);

    loop {
        stdout.write_all(b"Front: ")?;
        stdout.flush()?;
        let front: String = read_line(&mut stdin)?;
        // Exit on empty input
        if front.is_empty() {
            return Ok(());
        }

        if let Some(i) = lookup.fronts.get(&front) {
            return Err(anyhow!(
                "A card with this front side already exists. Please check line {} of your CSV file!",
                i
            ));
        }

        stdout.write_all(b"Back:  ")?;
        stdout.flush()?;
        let back: String = read_line(&mut stdin)?;
        if back.is_empty() {
            return Err(anyhow!("The back side must not be empty. Aborting."));
        }
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        writer.serialize(Card::new(new_id(), deck.to_string(), front.clone(), back))?;
        writer.flush()?;
        lookup.last_line += 1;
        lookup.fronts.insert(front, lookup.last_line);
    }
}

fn build_lookup_table(card_box: &CsvCardBox, deck: &str) -> Result<LookupTable> {
    let mut lookup = LookupTable::empty();
    for (i, card) in card_box.load_all()?.into_iter().enumerate() {
        let line = i + 2;
        lookup.last_line = line;
        if card.deck != deck {
            continue;
        }
        if let Some(j) = lookup.fronts.get(&card.front) {
            return Err(anyhow!(
                "The front side {} in line {} is a duplicate! Please check line {} of your CSV file!",
                &card.front, line, j,
            ));
        }
        lookup.fronts.insert(card.front, line);
    }
    Ok(lookup)
}

#[cfg(test)]
fn counter() -> impl FnMut() -> String {
    let mut n = 0;
    move || {
        n += 1;
        n.to_string()
    }
}

#[test]
fn test_add_cards_stops_at_empty_front() {
    use std::io::Cursor;

    let mut file = Cursor::new(Vec::new());
    let mut stdout = Cursor::new(Vec::new());
    let mut stdin = Cursor::new(
        b"a\nb\n\
    c\nd\n\
    \n",
    );
    let result = add_cards(
        "spanish",
        &mut file,
        &mut stdin,
        &mut stdout,
        LookupTable::empty(),
        counter(),
    );

    assert!(result.is_ok());

    // Check prompts
    let stdout_vec = stdout.into_inner();
    assert_eq!(
        String::from_utf8_lossy(&stdout_vec),
        "Front: Back:  \nFront: Back:  \nFront: "
    );

    // New cards have no schedule yet
    let output_vec = file.into_inner();
    let output = String::from_utf8_lossy(&output_vec);
    assert_eq!(output, "1|spanish|a|b||||\n2|spanish|c|d||||\n");
}

#[test]
fn test_cannot_add_duplicate_front_in_same_session() {
    use std::io::Cursor;

    let mut file = Cursor::new(Vec::new());
    let mut stdout = Cursor::new(Vec::new());
    let mut stdin = Cursor::new(
        b"a\nb\n\
    a\nc\n",
    );
    let result = add_cards(
        "spanish",
        &mut file,
        &mut stdin,
        &mut stdout,
        LookupTable::empty(),
        counter(),
    );

    // Check prompts
    let stdout_vec = stdout.into_inner();
    assert_eq!(
        String::from_utf8_lossy(&stdout_vec),
        "Front: Back:  \nFront: "
    );

    // Check result: error message with line number
    assert_eq!(
        result.unwrap_err().to_string(),
        "A card with this front side already exists. Please check line 2 of your CSV file!"
    );

    // Check output written to CSV file
    let output_vec = file.into_inner();
    let output = String::from_utf8_lossy(&output_vec);
    assert_eq!(output, "1|spanish|a|b||||\n");
}

#[test]
fn test_empty_back_is_rejected() {
    use std::io::Cursor;

    let mut file = Cursor::new(Vec::new());
    let mut stdout = Cursor::new(Vec::new());
    let mut stdin = Cursor::new(b"a\n\n");
    let result = add_cards(
        "spanish",
        &mut file,
        &mut stdin,
        &mut stdout,
        LookupTable::empty(),
        counter(),
    );

    assert_eq!(
        result.unwrap_err().to_string(),
        "The back side must not be empty. Aborting."
    );
    assert!(file.into_inner().is_empty());
}

#[test]
fn test_same_front_allowed_in_other_deck() {
    use crate::store::write_card_box;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");
    write_card_box(&path, "1|german|eins|one||||\n2|spanish|uno|one||||\n");
    let card_box = CsvCardBox::open(&path).unwrap();

    let lookup = build_lookup_table(&card_box, "german").unwrap();

    assert_eq!(lookup.last_line, 3);
    assert_eq!(lookup.fronts.get("eins"), Some(&2));
    assert_eq!(lookup.fronts.get("uno"), None);
}

#[test]
fn test_duplicate_front_in_file_is_reported() {
    use crate::store::write_card_box;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");
    write_card_box(&path, "1|d|a|b||||\n2|d|a|c||||\n");
    let card_box = CsvCardBox::open(&path).unwrap();

    assert_eq!(
        build_lookup_table(&card_box, "d").err().unwrap().to_string(),
        "The front side a in line 3 is a duplicate! Please check line 2 of your CSV file!"
    );
}
