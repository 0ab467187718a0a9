use clap::{ArgAction, Parser};
use mp4faststart::{FaststartOptions, FaststartOutcome, faststart_file};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Move the moov atom to the front of MP4 files (fast start)")]
struct Args {
    /// MP4/ISOBMFF file paths
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Appended to each input file name to name its output
    #[arg(long, default_value = ".faststart", value_parser = parse_suffix)]
    suffix: String,

    /// Report what would be done without writing anything
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,

    /// Stop at the first file that fails instead of processing the rest
    #[arg(long, action = ArgAction::SetTrue)]
    fail_fast: bool,

    /// Emit one JSON object per file instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let opts = FaststartOptions { suffix: args.suffix.clone(), dry_run: args.dry_run };
    let mut failures = Vec::new();

    let (present, missing): (Vec<&PathBuf>, Vec<&PathBuf>) = args.files.iter().partition(|p| p.exists());
    for path in &missing {
        eprintln!("{} not found", path.display());
        failures.push(format!("{}: not found", path.display()));
    }
    if args.fail_fast && !failures.is_empty() {
        anyhow::bail!("{} of {} path(s) not found, nothing processed", failures.len(), args.files.len());
    }

    for path in present {
        match faststart_file(path, &opts) {
            Ok(outcome) if args.json => println!("{}", serde_json::to_string(&outcome)?),
            Ok(outcome) => println!("{}", format_outcome(&outcome)),
            Err(e) => {
                eprintln!("{}: error: {e}", path.display());
                failures.push(format!("{}: {e}", path.display()));
                if args.fail_fast {
                    break;
                }
            }
        }
    }

    if !failures.is_empty() {
        anyhow::bail!("{} of {} file(s) failed:\n  {}", failures.len(), args.files.len(), failures.join("\n  "));
    }
    Ok(())
}

/// An empty suffix would name the output after its source.
fn parse_suffix(s: &str) -> Result<String, String> {
    if s.is_empty() {
        Err("suffix must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_mdat(offset: Option<u64>) -> String {
    offset.map_or_else(|| "absent".to_string(), |o| o.to_string())
}

fn format_outcome(outcome: &FaststartOutcome) -> String {
    match outcome {
        FaststartOutcome::AlreadyFastStart { source, moov_offset, mdat_offset } => format!(
            "{}: already faststart (moov@{} before mdat@{})",
            file_name(source),
            moov_offset,
            format_mdat(*mdat_offset)
        ),
        FaststartOutcome::Relocated(r) => format!(
            "{}: {} {} | old moov@{} -> new moov@{} | mdat@{}",
            file_name(&r.source),
            if r.written { "wrote" } else { "would write" },
            file_name(&r.output),
            r.old_moov_offset,
            r.new_moov_offset,
            format_mdat(r.mdat_offset)
        ),
    }
}
