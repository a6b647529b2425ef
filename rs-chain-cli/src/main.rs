use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rs_chain_core::Session;

/// Trains a word chain on corpus files and prints generated messages.
#[derive(Parser, Debug)]
#[command(name = "rs-chain", version, about)]
struct Cli {
    /// Corpus files, one message per line (stdin when omitted)
    corpora: Vec<PathBuf>,

    /// Number of messages to generate
    #[arg(short, long, default_value_t = 10)]
    count: usize,

    /// Retries spent avoiding messages already in the corpus
    #[arg(long, default_value_t = 0)]
    nb_try: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    // Train from files, or from stdin if no file was given
    let mut session = Session::new();
    if cli.corpora.is_empty() {
        let lines = io::stdin().lock().lines().collect::<Result<Vec<_>, _>>()?;
        let report = session.add_lines(lines);
        info!("stdin: {} messages, {} empty lines skipped", report.ingested, report.skipped);
    } else {
        for path in &cli.corpora {
            session.load_corpus(path)?;
        }
    }

    let stats = session.stats();
    info!("graph ready: {} words, {} transitions", stats.nodes, stats.edges);

    // Without a seed, every run differs
    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    for _ in 0..cli.count {
        println!("{}", session.generate_with(&mut rng, cli.nb_try)?);
    }

    Ok(())
}
