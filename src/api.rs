use crate::faststart::{Relocation, RelocateError, RewriteSummary, relocate, scan_top_level};
use crate::stats::{Audit, StatsError, audit};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Relocate(#[from] RelocateError),
    #[error(transparent)]
    Stats(#[from] StatsError),
    #[error("{}: written output has no moov box", path.display())]
    VerifyFailed { path: PathBuf },
    #[error("{}: output would overwrite the source file", path.display())]
    OutputIsSource { path: PathBuf },
}

/// Reads a whole file, naming it in the error.
pub fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

/// Options for [`faststart_file`].
#[derive(Debug, Clone)]
pub struct FaststartOptions {
    /// Appended to the full source file name to name the output.
    pub suffix: String,
    /// Compute the relocation but write nothing.
    pub dry_run: bool,
}

impl Default for FaststartOptions {
    fn default() -> Self {
        FaststartOptions { suffix: ".faststart".to_string(), dry_run: false }
    }
}

/// `clip.mp4` + `.faststart` -> `clip.mp4.faststart`, in the same directory.
pub fn output_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

/// Also catches an output name that is a link back to the source.
fn is_same_file(source: &Path, output: &Path) -> bool {
    if source == output {
        return true;
    }
    match (fs::canonicalize(source), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// A relocation that was written (or would be, in a dry run).
#[derive(Debug, Clone, Serialize)]
pub struct FaststartReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub old_moov_offset: u64,
    pub new_moov_offset: u64,
    /// `mdat` offset in the output; `None` when there is no `mdat`.
    pub mdat_offset: Option<u64>,
    pub delta: u64,
    pub rewrite: RewriteSummary,
    pub written: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FaststartOutcome {
    AlreadyFastStart { source: PathBuf, moov_offset: u64, mdat_offset: Option<u64> },
    Relocated(FaststartReport),
}

/// Reads `path`, moves its `moov` in front of `mdat` and writes the result
/// next to it under [`output_path`]. The source file is never modified.
///
/// After writing, the output is read back and its top level re-scanned; the
/// reported offsets are the ones observed there.
pub fn faststart_file(path: impl AsRef<Path>, opts: &FaststartOptions) -> Result<FaststartOutcome, Error> {
    let path = path.as_ref();
    let output = output_path(path, &opts.suffix);
    if is_same_file(path, &output) {
        return Err(Error::OutputIsSource { path: output });
    }
    let data = read_file(path)?;

    let relocated = match relocate(&data)? {
        Relocation::AlreadyFastStart { moov_offset, mdat_offset } => {
            tracing::debug!(path = %path.display(), moov_offset, "already fast start");
            return Ok(FaststartOutcome::AlreadyFastStart { source: path.to_path_buf(), moov_offset, mdat_offset });
        }
        Relocation::Relocated(r) => r,
    };

    let mut report = FaststartReport {
        source: path.to_path_buf(),
        output: output.clone(),
        old_moov_offset: relocated.old_moov_offset,
        new_moov_offset: relocated.new_moov_offset,
        mdat_offset: relocated.mdat_offset,
        delta: relocated.delta,
        rewrite: relocated.rewrite,
        written: false,
    };
    if opts.dry_run {
        return Ok(FaststartOutcome::Relocated(report));
    }

    fs::write(&output, &relocated.bytes).map_err(|source| Error::Io { path: output.clone(), source })?;
    report.written = true;
    tracing::debug!(output = %output.display(), len = relocated.bytes.len(), "output written");

    let check = scan_top_level(&read_file(&output)?);
    let Some(moov) = check.moov else {
        return Err(Error::VerifyFailed { path: output });
    };
    if moov.start != relocated.new_moov_offset {
        tracing::warn!(expected = relocated.new_moov_offset, found = moov.start, "moov not where it was placed");
    }
    report.new_moov_offset = moov.start;
    report.mdat_offset = check.mdat.map(|h| h.start);
    tracing::debug!(moov = moov.start, mdat = ?report.mdat_offset, "output verified");

    Ok(FaststartOutcome::Relocated(report))
}

/// Audits the first video track of the file at `path`.
pub fn audit_file(path: impl AsRef<Path>) -> Result<Audit, Error> {
    let data = read_file(path.as_ref())?;
    Ok(audit(&data)?)
}
