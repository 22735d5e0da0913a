use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use studydeck::add::add;
use studydeck::init::init;
use studydeck::review::review;
use studydeck::stats::stats;

#[derive(clap::ValueEnum, Clone, Debug)]
enum Command {
    Init,
    Add,
    Review,
    Stats,
}

/// Flashcard study with SM-2 scheduling.
#[derive(Parser)]
struct Cli {
    /// What to do
    command: Command,
    /// Path to card box (CSV file)
    path: PathBuf,
    /// Deck within the card box
    #[arg(short, long, default_value = "default")]
    deck: String,
    /// Seed for the order of due cards
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Cli::parse();

    match args.command {
        Command::Init => init(&args.path, &args.deck),
        Command::Add => add(&args.path, &args.deck),
        Command::Review => match args.seed {
            Some(seed) => review(&args.path, &args.deck, StdRng::seed_from_u64(seed)),
            None => review(&args.path, &args.deck, rand::rng()),
        },
        Command::Stats => stats(&args.path, &args.deck),
    }
}
