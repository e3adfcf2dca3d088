use clap::{Parser, Subcommand};
use minipack::archive::{self, UnpackOptions};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minipack", about = "Pack named blobs into a minipack archive")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack one or more files into an archive
    Pack {
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Unpack an archive into a directory
    Unpack {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,
    },
    /// List archive contents
    List {
        input: PathBuf,
        /// Print a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Check every entry hash without extracting
    Verify {
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {

        // ── Pack ─────────────────────────────────────────────────────────────
        Commands::Pack { output, input } => {
            let size = archive::pack_to_file(&input, &output)?;
            for path in &input {
                println!("  packed  {}", path.display());
            }
            println!("Created: {} ({} bytes)", output.display(), size);
        }

        // ── Unpack ───────────────────────────────────────────────────────────
        Commands::Unpack { input, output_dir, force } => {
            let bytes = std::fs::read(&input)?;
            let written = archive::unpack(&bytes, &output_dir, &UnpackOptions { overwrite: force })?;
            println!("Unpacked {} file(s) to: {}", written.len(), output_dir.display());
        }

        // ── List ─────────────────────────────────────────────────────────────
        Commands::List { input, json } => {
            let bytes = std::fs::read(&input)?;
            let infos = archive::list(&bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                println!("Archive: {}", input.display());
                println!("{:<32} {:>12}  SHA-256", "Name", "Size");
                for info in &infos {
                    println!("{:<32} {:>12}  {}", info.name, info.size, &info.sha256[..12]);
                }
            }
        }

        // ── Verify ───────────────────────────────────────────────────────────
        Commands::Verify { input } => {
            let bytes = std::fs::read(&input)?;
            let count = minipack::verify(&bytes)?;
            println!("OK: {} entr{} verified in {}", count, if count == 1 { "y" } else { "ies" }, input.display());
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
