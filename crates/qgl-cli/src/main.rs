mod config;
mod error;
mod logging;

use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use error::{CliError, Result};
use qgl_core::inversion::InversionEngine;
use qgl_core::normalizer::{fingerprint, normalize_program, serialize_canonical};
use qgl_core::parser::tokenizer::tokenize;
use qgl_core::{parse_source_with, AdmissibilityEngine, EngineConfig, Program};
use std::path::{Path, PathBuf};
use std::process;

/// QGL - structural description language CLI
///
/// Tokenize, parse, check, invert, and format QGL programs.
#[derive(Parser)]
#[command(name = "qgl", version, about, long_about = None)]
struct Cli {
    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML engine configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the token stream of a QGL file
    Tokenize {
        /// Path to .qgl file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the parsed program as JSON
    Parse {
        /// Path to .qgl file
        file: PathBuf,
    },

    /// Check a program for admissibility
    Check {
        /// Path to .qgl file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invert one boundary and print the resulting program
    Invert {
        /// Path to .qgl file
        file: PathBuf,
        /// Name of the boundary to invert
        #[arg(long, short)]
        boundary: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Format a program to canonical form
    Fmt {
        /// Path to .qgl file
        file: PathBuf,
    },

    /// Compute the structural fingerprint (SHA-256) of a program
    Hash {
        /// Path to .qgl file
        file: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::setup_logging(cli.verbose, cli.quiet) {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            2
        }
    };

    process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    let config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Tokenize { file, json } => cmd_tokenize(&file, json),
        Commands::Parse { file } => cmd_parse(&file, &config),
        Commands::Check { file, json } => cmd_check(&file, json, &config),
        Commands::Invert {
            file,
            boundary,
            json,
        } => cmd_invert(&file, &boundary, json, &config),
        Commands::Fmt { file } => cmd_fmt(&file, &config),
        Commands::Hash { file } => cmd_hash(&file, &config),
        Commands::Version => {
            println!("qgl {} (qgl-core {})", env!("CARGO_PKG_VERSION"), qgl_core::VERSION);
            Ok(0)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_program(path: &Path, config: &EngineConfig) -> Result<Program> {
    let source = read_source(path)?;
    Ok(parse_source_with(&source, &config.parser)?)
}

// ── Commands ──────────────────────────────────────────────

fn cmd_tokenize(file: &Path, json: bool) -> Result<i32> {
    let tokens = tokenize(&read_source(file)?)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for t in &tokens {
            println!("{}  {}", format!("{:>8}", t.span.to_string()).dimmed(), t.token);
        }
    }
    Ok(0)
}

fn cmd_parse(file: &Path, config: &EngineConfig) -> Result<i32> {
    let program = load_program(file, config)?;
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(0)
}

fn cmd_check(file: &Path, json: bool, config: &EngineConfig) -> Result<i32> {
    let program = load_program(file, config)?;
    let mut engine = AdmissibilityEngine::with_config(config.admissibility.clone());
    let verdict = engine.check(&program);

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "admissible": verdict.admissible,
            "reason": verdict.reason,
            "kind": verdict.kind,
            "fingerprint": fingerprint(&program),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if verdict.admissible {
        println!("{} {}: {}", "✓".green().bold(), file.display(), verdict.reason);
    } else {
        println!("{} {}: {}", "✗".red().bold(), file.display(), verdict.reason);
    }

    Ok(if verdict.admissible { 0 } else { 1 })
}

fn cmd_invert(file: &Path, boundary: &str, json: bool, config: &EngineConfig) -> Result<i32> {
    let program = load_program(file, config)?;
    let mut engine =
        InversionEngine::new(AdmissibilityEngine::with_config(config.admissibility.clone()));
    let outcome = engine.invert(program, boundary);
    let canonical = serialize_canonical(&normalize_program(outcome.program.clone()));

    if json {
        let report = serde_json::json!({
            "file": file.display().to_string(),
            "boundary": boundary,
            "success": outcome.success,
            "reason": outcome.reason,
            "program": canonical,
            "fingerprint": fingerprint(&outcome.program),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if outcome.success {
        eprintln!("{} {}", "✓".green().bold(), outcome.reason);
        print!("{}", canonical);
    } else {
        eprintln!("{} {}", "✗".red().bold(), outcome.reason);
    }

    Ok(if outcome.success { 0 } else { 1 })
}

fn cmd_fmt(file: &Path, config: &EngineConfig) -> Result<i32> {
    let program = load_program(file, config)?;
    print!("{}", serialize_canonical(&normalize_program(program)));
    Ok(0)
}

fn cmd_hash(file: &Path, config: &EngineConfig) -> Result<i32> {
    let program = load_program(file, config)?;
    println!("{}", fingerprint(&program));
    Ok(0)
}
