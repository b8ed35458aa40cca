use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use rehum::{fingerprint_file, plot, Library};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rehum")]
#[command(version = "0.1.0")]
#[command(about = "Landmark audio fingerprinting: index recordings, identify snippets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint audio files into a library
    Index {
        /// Library file (created when missing)
        library: PathBuf,
        /// Audio files to index (mp3, wav, flac, ogg, ...)
        inputs: Vec<PathBuf>,
    },
    /// Identify a snippet against a library
    Identify {
        /// Library file
        library: PathBuf,
        /// Snippet to identify
        input: PathBuf,
        /// How many candidates to report
        #[arg(short, long, default_value = "3")]
        top: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render the peak constellation of an audio file
    Peaks {
        /// Audio file to analyze
        input: PathBuf,
        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,
        /// Plot title (defaults to the file name)
        #[arg(long)]
        title: Option<String>,
    },
    /// Show library statistics
    Info {
        /// Library file
        library: PathBuf,
        /// List indexed references
        #[arg(short, long)]
        references: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index { library, inputs } => index(&library, &inputs)?,
        Commands::Identify {
            library,
            input,
            top,
            json,
        } => identify(&library, &input, top, json)?,
        Commands::Peaks {
            input,
            output,
            title,
        } => peaks(&input, &output, title)?,
        Commands::Info {
            library,
            references,
        } => info(&library, references)?,
    }

    Ok(())
}

fn index(library_path: &Path, inputs: &[PathBuf]) -> Result<()> {
    if inputs.is_empty() {
        bail!("Nothing to index: give me at least one audio file");
    }

    let mut library = Library::open_or_new(library_path)?;

    for input in inputs {
        println!("Indexing {}...", input.display());
        let report = library.index_file(input, None)?;
        println!(
            "  {:.2}s, {} peaks, {} landmarks",
            report.seconds, report.peak_count, report.landmark_count
        );
    }

    library.save(library_path)?;

    let session = &library.session;
    println!("Done!");
    println!(
        "  Library: {} references, {} addresses, {} postings",
        session.reference_count(),
        session.address_count(),
        session.posting_count()
    );
    Ok(())
}

fn identify(library_path: &Path, input: &Path, top: usize, json: bool) -> Result<()> {
    let library = Library::open(library_path)?;
    let report = library.identify_file(input, top)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Query: {} ({:.2}s, {} peaks)",
        report.query, report.seconds, report.peak_count
    );

    match &report.matches {
        None => {
            println!("No match found. Make sure the recording is indexed and the snippet isn't silence.");
        }
        Some(matches) => {
            println!("Matches:");
            for (i, m) in matches.iter().enumerate() {
                println!(
                    "  {}. {:<40} score {:>5}  {}",
                    i + 1,
                    m.reference_id,
                    m.score,
                    score_bar(m.score)
                );
            }
        }
    }
    Ok(())
}

// Display only; 150 votes fills the bar
fn score_bar(score: u32) -> String {
    const WIDTH: usize = 20;
    const CAP: u32 = 150;
    let filled = (score.min(CAP) as usize) * WIDTH / CAP as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}

fn peaks(input: &Path, output: &Path, title: Option<String>) -> Result<()> {
    println!("Analyzing {}...", input.display());
    let constellation = fingerprint_file(input)?;

    let title = title.unwrap_or_else(|| {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Constellation".to_string())
    });
    plot::render_constellation(&constellation, &title, output)?;

    println!("Wrote {} ({} peaks)", output.display(), constellation.len());
    Ok(())
}

fn info(library_path: &Path, references: bool) -> Result<()> {
    let library = Library::open(library_path)?;
    let session = &library.session;

    println!("hum Fingerprint Library");
    println!("───────────────────────────────");
    println!("  References: {}", session.reference_count());
    println!("  Addresses:  {}", session.address_count());
    println!("  Postings:   {}", session.posting_count());

    if references {
        println!();
        for info in session.references() {
            println!(
                "  {:<40} {} peaks, {} landmarks [{}]",
                info.id,
                info.peak_count,
                info.landmark_count,
                info.digest_hex()
            );
            if let Some(ref stamp) = info.indexed_at {
                println!("      indexed {}", stamp);
            }
        }
    }
    Ok(())
}
