use crate::add::add;
use crate::models::Card;
use crate::utils::create_writer;
use anyhow::{anyhow, Result};
use std::fs::File;
use std::path::Path;
use struct_field_names_as_array::FieldNamesAsArray;

/// Initializes a new CSV file and starts adding cards to the given deck.
pub fn init(path: &Path, deck: &str) -> Result<()> {
    create_card_box(path)?;
    println!("Created new card box {:?}\n", path);
    add(path, deck)
}

fn create_card_box(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(anyhow!(
            "File {:?} already exists! Use `studydeck add` to add new cards. Aborting.",
            path
        ));
    }
    let mut writer = create_writer(File::create(path)?);
    writer.write_record(Card::FIELD_NAMES_AS_ARRAY)?;
    writer.flush()?;
    Ok(())
}

#[test]
fn test_create_card_box_writes_header_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("box.csv");

    create_card_box(&path).unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "id|deck|front|back|repetitions|interval|ease_factor|due_date\n"
    );
    assert!(create_card_box(&path).is_err());
}
