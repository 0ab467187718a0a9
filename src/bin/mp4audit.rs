use clap::{ArgAction, Parser};
use mp4faststart::track::TrackEntry;
use mp4faststart::api::read_file;
use mp4faststart::{Audit, audit, tracks};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Approximate fps and keyframe interval of MP4 files, without a demuxer")]
struct Args {
    /// MP4/ISOBMFF file paths
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Emit JSON instead of one line per file
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Also list every track with its handler type
    #[arg(long, action = ArgAction::SetTrue)]
    all_tracks: bool,

    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct AuditRecord {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    audit: Option<Audit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tracks: Vec<TrackEntry>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut records = Vec::new();
    let mut failures = Vec::new();

    let (present, missing): (Vec<&PathBuf>, Vec<&PathBuf>) = args.files.iter().partition(|p| p.exists());
    for path in &missing {
        eprintln!("{} not found", path.display());
        failures.push(format!("{}: not found", path.display()));
        records.push(AuditRecord {
            file: display_name(path),
            audit: None,
            error: Some("not found".to_string()),
            tracks: Vec::new(),
        });
    }

    for path in present {
        let name = display_name(path);
        let mut record = AuditRecord { file: name.clone(), audit: None, error: None, tracks: Vec::new() };

        match read_file(path) {
            Ok(data) => {
                match audit(&data) {
                    Ok(a) => record.audit = Some(a),
                    Err(e) => record.error = Some(e.to_string()),
                }
                if args.all_tracks {
                    record.tracks = tracks(&data);
                }
            }
            Err(e) => record.error = Some(e.to_string()),
        }

        if !args.json {
            match (&record.audit, &record.error) {
                (Some(a), _) => println!("{}", format_audit(&name, a)),
                (None, Some(e)) => eprintln!("{name}: error: {e}"),
                (None, None) => {}
            }
            for (i, t) in record.tracks.iter().enumerate() {
                println!("  track {}: {} @{}", i + 1, format_handler(t), t.trak.start);
            }
        }
        if let Some(e) = &record.error {
            failures.push(format!("{name}: {e}"));
        }
        records.push(record);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    if !failures.is_empty() {
        anyhow::bail!("{} of {} file(s) failed:\n  {}", failures.len(), args.files.len(), failures.join("\n  "));
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_handler(t: &TrackEntry) -> String {
    match t.handler {
        Some(h) if t.is_video() => format!("{h} (video)"),
        Some(h) => h.to_string(),
        None => "no handler".to_string(),
    }
}

fn format_audit(name: &str, audit: &Audit) -> String {
    match audit {
        Audit::Stats(s) => format!(
            "{name}: duration={:.2}s, samples={}, keyframes={}, fps≈{:.2}, avg_keyframe_interval≈{:.2}s (≈{:.1} frames)",
            s.duration_seconds,
            s.sample_count,
            s.sync_sample_count,
            s.fps,
            s.avg_keyframe_interval_seconds,
            s.samples_per_keyframe,
        ),
        Audit::NoVideoTrack => format!("{name}: unable to locate video track"),
        Audit::InsufficientIndex { missing } => {
            format!("{name}: missing {missing} (insufficient index data to estimate fps)")
        }
    }
}
