//! Example: build an in-memory library from one recording and identify a
//! snippet against it
//!
//! Run with: cargo run --example identify_demo reference.mp3 snippet.wav

use rehum::Library;
use std::env;
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <reference-audio> <snippet-audio>", args[0]);
        std::process::exit(1);
    }

    let mut library = Library::new();

    println!("Indexing {}...", args[1]);
    let report = library.index_file(Path::new(&args[1]), None)?;
    println!(
        "  {:.2}s, {} peaks, {} landmarks",
        report.seconds, report.peak_count, report.landmark_count
    );

    println!("Identifying {}...", args[2]);
    let result = library.identify_file(Path::new(&args[2]), 3)?;

    match result.matches {
        None => println!("No match found."),
        Some(matches) => {
            for (i, m) in matches.iter().enumerate() {
                println!("  {}. {} (score {})", i + 1, m.reference_id, m.score);
            }
        }
    }

    Ok(())
}
