use anyhow::Result;
use byteseq_patcher::applicator::{check, ApplicationError, ApplyReport, PatchStatus};
use byteseq_patcher::file::{patch_file, read_target};
use byteseq_patcher::patch::{load_from_path, Patch};
use byteseq_patcher::{codec, Error};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Environment variable naming the default patch definition file.
const PATCH_ENV: &str = "BYTESEQ_PATCH";

#[derive(Parser)]
#[command(name = "byteseq-patcher")]
#[command(about = "Dual-anchor byte sequence patcher for binaries", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a patch to a binary and write the patched copy
    Apply {
        /// Binary to patch
        input: PathBuf,

        /// Where to write the patched binary (may equal INPUT)
        output: PathBuf,

        /// Patch definition file (defaults to $BYTESEQ_PATCH or ./patches/*.patch)
        patch: Option<PathBuf>,

        /// Dry run - report what would change without writing OUTPUT
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Print the apply report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether a patch would apply or is already applied
    Status {
        /// Binary to inspect
        input: PathBuf,

        /// Patch definition file (defaults to $BYTESEQ_PATCH or ./patches/*.patch)
        patch: Option<PathBuf>,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Verify that a binary has already been patched
    Verify {
        /// Binary to inspect
        input: PathBuf,

        /// Patch definition file (defaults to $BYTESEQ_PATCH or ./patches/*.patch)
        patch: Option<PathBuf>,
    },

    /// Show the anchors and offset of a patch definition
    Inspect {
        /// Patch definition file (defaults to $BYTESEQ_PATCH or ./patches/*.patch)
        patch: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Apply {
            input,
            output,
            patch,
            dry_run,
            json,
        } => cmd_apply(&input, &output, patch, dry_run, json),

        Commands::Status { input, patch, json } => cmd_status(&input, patch, json),

        Commands::Verify { input, patch } => cmd_verify(&input, patch),

        Commands::Inspect { patch } => cmd_inspect(patch),
    }
}

/// Log to stderr; `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the patch definition file.
///
/// Priority order:
/// 1. Explicit PATCH argument
/// 2. BYTESEQ_PATCH environment variable
/// 3. The single `.patch` file in `./patches`
fn resolve_patch_file(cli_patch: Option<PathBuf>) -> Result<PathBuf> {
    // 1. Explicit argument (highest priority)
    if let Some(path) = cli_patch {
        return Ok(path);
    }

    // 2. Environment variable
    if let Ok(env_path) = env::var(PATCH_ENV) {
        let path = PathBuf::from(&env_path);
        if path.is_file() {
            return Ok(path);
        }
        eprintln!(
            "{}",
            format!("Warning: {PATCH_ENV} is set but file doesn't exist: {env_path}").yellow()
        );
    }

    // 3. Discovery in ./patches
    let patches_dir = env::current_dir()?.join("patches");
    let files = discover_patch_files(&patches_dir)?;

    match files.as_slice() {
        [single] => {
            eprintln!(
                "{}",
                format!("Using patch file: {}", single.display()).dimmed()
            );
            Ok(single.clone())
        }
        [] => anyhow::bail!(
            "{}\n{}\n  {}\n  {}\n  {}",
            "No patch definition given.".red(),
            "Try one of:".bold(),
            "1. Pass it explicitly: byteseq-patcher apply <input> <output> <patch-file>",
            format!("2. Set environment variable: export {PATCH_ENV}=/path/to/file.patch"),
            "3. Place exactly one .patch file in ./patches"
        ),
        many => anyhow::bail!(
            "Found {} patch files in {}, pass one explicitly:\n  {}",
            many.len(),
            patches_dir.display(),
            many.iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join("\n  ")
        ),
    }
}

/// Helper: list `.patch` files directly inside `dir`, sorted.
fn discover_patch_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|s| s.to_str()) == Some("patch")
        {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Helper: resolve and parse the patch definition, printing parse warnings.
fn load_patch(cli_patch: Option<PathBuf>) -> Result<(PathBuf, Patch)> {
    let path = resolve_patch_file(cli_patch)?;

    let parsed = match load_from_path(&path) {
        Ok(parsed) => parsed,
        Err(e) => fail(Error::from(e)),
    };

    for warning in &parsed.warnings {
        eprintln!("{}", format!("Warning: {warning}").yellow());
    }

    Ok((path, parsed.patch))
}

/// Report a core failure with its kind and exit non-zero.
fn fail(err: Error) -> ! {
    eprintln!(
        "{} {}",
        "✗".red(),
        format!("error[{}]: {}", err.kind(), err).red()
    );

    // Provide helpful diagnostics
    match &err {
        Error::Application(ApplicationError::AmbiguousPattern { offsets, .. }) => {
            for pair in offsets {
                eprintln!("  - {pair}");
            }
            eprintln!("  Action: Lengthen an anchor or adjust the offset so the pattern is unique");
        }
        Error::Application(ApplicationError::PatternNotFound { .. }) => {
            eprintln!("  Possible causes:");
            eprintln!("    - The target was built from a different version");
            eprintln!("    - The target is already patched (see `status`)");
            eprintln!("    - The offset between the anchors is wrong");
        }
        _ => {}
    }

    eprintln!("{}", "Aborted: no output was written".red());
    std::process::exit(1);
}

fn print_report(report: &ApplyReport) {
    println!(
        "{} Pattern found: first anchor at {:#x} ({}), second anchor at {:#x} ({})",
        "✓".green(),
        report.matched.first_offset,
        report.matched.first_offset,
        report.matched.second_offset,
        report.matched.second_offset
    );
    for region in &report.regions {
        println!(
            "  {:#010x}: {} -> {}",
            region.offset,
            region.original.dimmed(),
            region.patched.green()
        );
    }
    println!(
        "  {} bytes, xxh3 {} -> {}",
        report.buffer_len, report.input_digest, report.output_digest
    );
}

fn cmd_apply(
    input: &Path,
    output: &Path,
    patch: Option<PathBuf>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    // 1. Load the patch definition
    let (patch_path, patch) = load_patch(patch)?;

    if !json {
        println!("Input: {}", input.display());
        println!("Output: {}", output.display());
        println!("Patch: {}", patch_path.display());
        println!();
    }

    // 2. Scan, apply and (unless dry run) write
    let destination = if dry_run { None } else { Some(output) };
    let report = match patch_file(input, destination, &patch) {
        Ok(report) => report,
        Err(e) => fail(e),
    };

    // 3. Report results
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    println!();

    if dry_run {
        println!("{}", "[DRY RUN - nothing written]".cyan());
        println!("Would write patched file to {}", output.display());
    } else {
        println!("Patched file written to {}", output.display());
        println!("{}", "Successfully patched target file".green().bold());
    }

    Ok(())
}

fn cmd_status(input: &Path, patch: Option<PathBuf>, json: bool) -> Result<()> {
    let (_, patch) = load_patch(patch)?;
    let buffer = match read_target(input) {
        Ok(buffer) => buffer,
        Err(e) => fail(Error::from(e)),
    };

    let status = check(&buffer, &patch);

    if json {
        let value = match &status {
            Ok(status) => serde_json::to_value(status)?,
            Err(ApplicationError::PatternNotFound { first_anchor_hits }) => serde_json::json!({
                "status": "not_found",
                "first_anchor_hits": first_anchor_hits,
            }),
            Err(ApplicationError::AmbiguousPattern { count, offsets }) => serde_json::json!({
                "status": "ambiguous",
                "count": count,
                "offsets": offsets,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Patch Status Report".bold());
    println!("Input: {}", input.display());
    println!();

    match status {
        Ok(PatchStatus::AlreadyApplied { matched }) => {
            println!("{} {} ({})", "✓".green(), "APPLIED".green().bold(), matched);
        }
        Ok(PatchStatus::WouldApply { matched }) => {
            println!("{} {} ({})", "⊙".yellow(), "NOT APPLIED".yellow().bold(), matched);
        }
        Err(ApplicationError::PatternNotFound { first_anchor_hits }) => {
            println!(
                "{} {} (first anchor occurs {} time(s) on its own)",
                "⊘".cyan(),
                "NOT FOUND".cyan().bold(),
                first_anchor_hits
            );
        }
        Err(ApplicationError::AmbiguousPattern { count, offsets }) => {
            println!(
                "{} {} ({} dual matches)",
                "✗".red(),
                "AMBIGUOUS".red().bold(),
                count
            );
            for pair in offsets {
                println!("  - {pair}");
            }
        }
    }

    Ok(())
}

fn cmd_verify(input: &Path, patch: Option<PathBuf>) -> Result<()> {
    let (_, patch) = load_patch(patch)?;
    let buffer = match read_target(input) {
        Ok(buffer) => buffer,
        Err(e) => fail(Error::from(e)),
    };

    println!("{}", "Verifying patch...".bold());
    println!("Input: {}", input.display());
    println!();

    match check(&buffer, &patch) {
        Ok(PatchStatus::AlreadyApplied { matched }) => {
            println!("{} Verified (already applied, {})", "✓".green(), matched);
            Ok(())
        }
        Ok(PatchStatus::WouldApply { matched }) => {
            eprintln!("{} MISMATCH", "✗".red());
            eprintln!("  Expected: patch already applied");
            eprintln!("  Found: patch not yet applied ({matched})");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{} MISMATCH", "✗".red());
            eprintln!("  Error: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_inspect(patch: Option<PathBuf>) -> Result<()> {
    let (path, patch) = load_patch(patch)?;

    println!("{}", format!("Patch: {}", path.display()).bold());
    for (name, pair) in [("First", patch.first()), ("Second", patch.second())] {
        println!("{name} anchor ({} bytes):", pair.len());
        println!("  original: {}", codec::encode(pair.original()));
        println!("  patched:  {}", codec::encode(pair.patched()).green());
    }
    println!("Relative offset: {}", patch.relative_offset());

    Ok(())
}
