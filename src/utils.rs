use anyhow::{anyhow, Result};
use csv::{Reader, Writer};
use std::fs::File;
use std::io;
use std::io::{BufRead, Write};
use std::path::Path;

pub fn clear<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    write!(out, "{esc}[2J{esc}[1;1H", esc = 27 as char)
}

/// Reads one line without its line ending. Fails at end of input.
pub fn read_line<R: BufRead>(mut input: R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(anyhow!("Unexpected end of input. Aborting."));
    }
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

pub fn create_reader(path: &Path) -> csv::Result<Reader<File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'|')
        .quote(b'#')
        .has_headers(true)
        .from_path(path)
}

pub fn create_writer<W: Write>(out: W) -> Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'|')
        .quote(b'#')
        .has_headers(false)
        .from_writer(out)
}

pub fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[test]
fn test_read_line_strips_line_ending() {
    use std::io::Cursor;

    let mut input = Cursor::new(b"front\r\nback\n".to_vec());
    assert_eq!(read_line(&mut input).unwrap(), "front");
    assert_eq!(read_line(&mut input).unwrap(), "back");
    assert!(read_line(&mut input).is_err());
}
