//! Moving `moov` ahead of `mdat` ("fast start").
//!
//! Chunk offsets in `stco`/`co64` are absolute file positions, so inserting
//! `moov` (S bytes) in front of the media data pushes every chunk S bytes
//! later. The relocated copy of `moov` gets all of its tables shifted by S;
//! nothing else in the file is modified.

use crate::boxes::{BoxHeader, FourCC};
use crate::known_boxes::KnownBox;
use crate::parser::iter_boxes;
use crate::util::{be_u32, be_u64, put_be_u32, put_be_u64};
use serde::Serialize;
use std::ops::Range;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteError {
    #[error("{table} entry {index}: offset {value} shifted by {delta} is out of range")]
    OffsetOverflow { table: FourCC, index: u32, value: u64, delta: i64 },
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocateError {
    #[error("missing required top-level atoms (need ftyp + moov)")]
    MissingAtoms,
    #[error("invalid ftyp size; insert point {insert_at} outside file of {file_len} bytes")]
    InvalidInsertPoint { insert_at: u64, file_len: u64 },
    #[error("unexpected layout: moov@{moov} starts before insert point {insert_at} but after mdat@{mdat}")]
    InconsistentLayout { moov: u64, mdat: u64, insert_at: u64 },
    #[error("moov of {size} bytes declared as open-ended does not fit a 32-bit size")]
    MoovTooLarge { size: u64 },
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

/// What the offset rewriter touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub tables: usize,
    pub entries: u64,
}

/// Adds `delta` to every entry of every `stco`/`co64` reachable inside
/// `moov`, which must hold exactly one box (the whole `moov`, header
/// included). Tables whose declared length overruns their box are skipped.
///
/// On error `moov` is left exactly as it was passed in.
pub fn adjust_chunk_offsets(moov: &mut [u8], delta: i64) -> Result<RewriteSummary, RewriteError> {
    let mut summary = RewriteSummary::default();
    let mut scratch = moov.to_vec();
    let len = scratch.len();
    adjust_region(&mut scratch, 0..len, delta, &mut summary)?;
    moov.copy_from_slice(&scratch);
    Ok(summary)
}

fn adjust_region(
    buf: &mut [u8],
    region: Range<usize>,
    delta: i64,
    summary: &mut RewriteSummary,
) -> Result<(), RewriteError> {
    // Box bounds come from headers only, which patching never touches.
    let kids: Vec<BoxHeader> = iter_boxes(buf, region).collect();
    for h in kids {
        let kb = KnownBox::from(h.typ);
        if kb.is_container() {
            if let Some(children) = h.children_range() {
                adjust_region(buf, children, delta, summary)?;
            }
        } else if kb.is_chunk_offset_table() {
            let width = if kb == KnownBox::Co64 { 8 } else { 4 };
            if let Some(patched) = patch_table(buf, &h, width, delta)? {
                summary.tables += 1;
                summary.entries += patched;
            }
        }
    }
    Ok(())
}

/// Returns the number of entries patched, or `None` if the table was skipped.
fn patch_table(buf: &mut [u8], h: &BoxHeader, width: usize, delta: i64) -> Result<Option<u64>, RewriteError> {
    let data = h.data_range();
    // version/flags (4) + entry_count (4)
    let Some(count) = be_u32(h.payload(buf), 4) else {
        tracing::trace!(table = %h.typ, offset = h.start, "offset table too short, skipped");
        return Ok(None);
    };
    let table_start = data.start + 8;
    let table_len = count as u64 * width as u64;
    if table_start as u64 + table_len > data.end as u64 {
        tracing::trace!(table = %h.typ, offset = h.start, count, "offset table overruns its box, skipped");
        return Ok(None);
    }

    for index in 0..count {
        let at = table_start + index as usize * width;
        let overflow = |value: u64| RewriteError::OffsetOverflow { table: h.typ, index, value, delta };
        if width == 8 {
            let value = be_u64(buf, at).unwrap_or(0);
            let shifted = value.checked_add_signed(delta).ok_or_else(|| overflow(value))?;
            put_be_u64(buf, at, shifted);
        } else {
            let value = be_u32(buf, at).unwrap_or(0);
            let shifted = (value as i64)
                .checked_add(delta)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| overflow(value as u64))?;
            put_be_u32(buf, at, shifted);
        }
    }
    tracing::trace!(table = %h.typ, offset = h.start, count, delta, "offset table patched");
    Ok(Some(count as u64))
}

/// The top-level boxes that decide the layout. A repeated tag keeps its last occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TopLevel {
    pub ftyp: Option<BoxHeader>,
    pub moov: Option<BoxHeader>,
    pub mdat: Option<BoxHeader>,
    /// The walk stopped on bytes that were not a complete box.
    pub truncated: bool,
}

pub fn scan_top_level(buf: &[u8]) -> TopLevel {
    let mut top = TopLevel::default();
    let mut it = iter_boxes(buf, 0..buf.len());
    for h in it.by_ref() {
        match KnownBox::from(h.typ) {
            KnownBox::Ftyp => top.ftyp = Some(h),
            KnownBox::Moov => top.moov = Some(h),
            KnownBox::Mdat => top.mdat = Some(h),
            _ => {}
        }
    }
    if let Some(e) = it.truncation() {
        tracing::warn!(error = %e, "top-level walk truncated");
        top.truncated = true;
    }
    top
}

/// A relocated file, assembled in memory.
#[derive(Debug, Clone)]
pub struct Relocated {
    pub bytes: Vec<u8>,
    pub old_moov_offset: u64,
    pub new_moov_offset: u64,
    /// Where `mdat` lands in `bytes`; `None` when the file has no `mdat`.
    pub mdat_offset: Option<u64>,
    pub delta: u64,
    pub rewrite: RewriteSummary,
}

#[derive(Debug, Clone)]
pub enum Relocation {
    AlreadyFastStart { moov_offset: u64, mdat_offset: Option<u64> },
    Relocated(Relocated),
}

/// Builds the fast-start layout of `buf`:
/// `[..insert_at] + moov' + [insert_at..moov] + [moov_end..]`, where
/// `insert_at` is the end of `ftyp` and `moov'` has its chunk offsets
/// shifted by its own size.
///
/// Boxes between `ftyp` and the old `moov` are copied verbatim; any absolute
/// offsets they hold are not adjusted.
pub fn relocate(buf: &[u8]) -> Result<Relocation, RelocateError> {
    let top = scan_top_level(buf);
    let (Some(ftyp), Some(moov)) = (top.ftyp, top.moov) else {
        return Err(RelocateError::MissingAtoms);
    };
    let mdat = top.mdat;
    tracing::debug!(moov = moov.start, mdat = ?mdat.map(|h| h.start), "layout verified");

    match mdat {
        Some(m) if moov.start < m.start => {
            return Ok(Relocation::AlreadyFastStart { moov_offset: moov.start, mdat_offset: Some(m.start) });
        }
        None => {
            return Ok(Relocation::AlreadyFastStart { moov_offset: moov.start, mdat_offset: None });
        }
        Some(_) => {}
    }

    let file_len = buf.len() as u64;
    let insert_at = ftyp.end();
    if insert_at == 0 || insert_at > file_len {
        return Err(RelocateError::InvalidInsertPoint { insert_at, file_len });
    }
    if let Some(m) = mdat
        && moov.start < insert_at
    {
        return Err(RelocateError::InconsistentLayout { moov: moov.start, mdat: m.start, insert_at });
    }

    let mut moov_bytes = moov.bytes(buf).to_vec();
    if moov.header_size == 8 && be_u32(&moov_bytes, 0) == Some(0) {
        // open-ended moov would swallow everything after it once moved
        let size = u32::try_from(moov.size).map_err(|_| RelocateError::MoovTooLarge { size: moov.size })?;
        put_be_u32(&mut moov_bytes, 0, size);
    }
    let delta = moov.size;
    let rewrite = adjust_chunk_offsets(&mut moov_bytes, delta as i64)?;
    tracing::debug!(delta, tables = rewrite.tables, entries = rewrite.entries, "moov rewritten");

    let (insert, moov_start, moov_end) = (insert_at as usize, moov.start as usize, moov.end() as usize);
    let mut out = Vec::with_capacity(buf.len());
    out.extend_from_slice(&buf[..insert]);
    out.extend_from_slice(&moov_bytes);
    out.extend_from_slice(&buf[insert..moov_start]);
    out.extend_from_slice(&buf[moov_end..]);
    tracing::debug!(len = out.len(), "fast-start layout assembled");

    let mdat_offset = mdat.map(|m| {
        if m.start >= insert_at && m.start < moov.start { m.start + delta } else { m.start }
    });

    Ok(Relocation::Relocated(Relocated {
        bytes: out,
        old_moov_offset: moov.start,
        new_moov_offset: insert_at,
        mdat_offset,
        delta,
        rewrite,
    }))
}
