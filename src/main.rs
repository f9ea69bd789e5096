//! Answers the queries of an input file against a Bayesian network.
//!
//! The first non-empty line of the input names the network file, relative to the input file. Every
//! other non-empty line is a query, answered on its own output line.

use anyhow::{Context, Result};
use bayesnet::{loader, Model, Query};
use clap::{ArgAction, Parser};
use tracing::{error, info, Level};

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};


#[derive(Parser)]
#[command(name = "bayesnet", version)]
#[command(about = "Answer independence and probability queries over a Bayesian network")]
struct Cli {
    /// Input file: the network path on the first line, then one query per line
    input: PathBuf,

    /// Write the answers to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Log more to stderr (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
}


fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let mut lines = text.lines().map(str::trim).filter(|l| ! l.is_empty());

    let network = lines
        .next()
        .with_context(|| format!("{} does not name a network", cli.input.display()))?;
    let network = cli.input.parent().unwrap_or_else(|| Path::new(".")).join(network);

    let model = loader::from_path(&network)
        .with_context(|| format!("failed to load network {}", network.display()))?;
    info!(network = %network.display(), variables = model.num_variables(), "network loaded");

    let mut out: Box<dyn Write> = match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    };

    for line in lines {
        match line.parse::<Query>().and_then(|q| q.answer(&model)) {
            Ok(answer) => writeln!(out, "{}", answer)?,
            Err(err) => error!(query = line, error = %err, "query failed"),
        }
    }

    out.flush()?;
    Ok(())
}
