use clap::{Parser, Subcommand};
use puzrs::{
    get_file_checksum, get_header_checksum, get_masked_checksum, is_correct, parse_binary,
    parse_text, print_binary, print_text, LineEnding, Puzzle, TextFormat,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "puz", about = "AcrossLite .puz and text crossword CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show puzzle metadata and checksums
    Info {
        input: PathBuf,
        /// Emit the full puzzle as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Convert between binary .puz and the text dialect
    ///
    /// The direction is picked from the output extension: `.puz` writes
    /// binary, anything else writes text.
    Convert {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Indent for text content lines (default: one tab)
        #[arg(long, default_value = "\t")]
        indent: String,
        /// Write Windows line endings in text output
        #[arg(long)]
        crlf: bool,
    },
    /// Check whether the player's fill solves the puzzle
    Check {
        input: PathBuf,
        /// Ignore rebus entries when checking
        #[arg(long)]
        ignore_rebus: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { input, json } => {
            let puzzle = load(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&puzzle)?);
                return Ok(());
            }
            println!("── Puzzle ───────────────────────────────────────────────");
            println!("  Path       {}", input.display());
            println!("  Version    {}", puzzle.file_version);
            println!("  Size       {}x{}", puzzle.width, puzzle.height);
            println!("  Title      {}", puzzle.title.as_deref().unwrap_or("—"));
            println!("  Author     {}", puzzle.author.as_deref().unwrap_or("—"));
            println!("  Copyright  {}", puzzle.copyright.as_deref().unwrap_or("—"));
            println!("  Clues      {}", puzzle.clues.len());
            println!("  Scrambled  {}", puzzle.is_scrambled);
            println!("  Rebus      {}", puzzle.rebus.is_some());
            if let Some(timer) = &puzzle.timer {
                println!(
                    "  Timer      {}s ({})",
                    timer.seconds_elapsed,
                    if timer.is_paused { "paused" } else { "running" }
                );
            }
            println!("  Header checksum {:#06x}", get_header_checksum(&puzzle));
            println!("  File checksum   {:#06x}", get_file_checksum(&puzzle)?);
            println!(
                "  Masked checksum {}",
                hex::encode(get_masked_checksum(&puzzle)?)
            );
        }

        // ── Convert ──────────────────────────────────────────────────────────
        Commands::Convert {
            input,
            output,
            indent,
            crlf,
        } => {
            let puzzle = load(&input)?;
            if is_binary_path(&output) {
                std::fs::write(&output, print_binary(&puzzle)?)?;
            } else {
                let format = TextFormat {
                    indent,
                    line_ending: if crlf {
                        LineEnding::Windows
                    } else {
                        LineEnding::Unix
                    },
                };
                std::fs::write(&output, print_text(&puzzle, &format)?)?;
            }
            println!("Wrote: {}", output.display());
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check {
            input,
            ignore_rebus,
        } => {
            let puzzle = load(&input)?;
            if is_correct(&puzzle, ignore_rebus)? {
                println!("solved");
            } else {
                println!("not solved");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn is_binary_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("puz"))
}

fn load(path: &Path) -> Result<Puzzle, Box<dyn std::error::Error>> {
    if is_binary_path(path) {
        Ok(parse_binary(&std::fs::read(path)?)?)
    } else {
        Ok(parse_text(&std::fs::read_to_string(path)?)?)
    }
}
