use crate::boxes::{BoxHeader, FourCC};
use byteorder::{BigEndian, ByteOrder};
use std::ops::Range;

/// Why a header could not be read. The walker treats all of these as the end
/// of the region, never as a failure of the caller.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated header at {pos}: {available} bytes left in region")]
    Truncated { pos: u64, available: u64 },
    #[error("invalid box size {size} at {pos} (header is {header_size} bytes)")]
    InvalidSize { pos: u64, size: u64, header_size: u64 },
    #[error("box at {pos} declares {size} bytes but only {available} remain in region")]
    Overrun { pos: u64, size: u64, available: u64 },
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Reads the box header at `pos`, requiring the whole box to fit before `end`.
///
/// `end` is clamped to the buffer length. A 32-bit size of 1 means a 64-bit
/// size follows the tag; a size of 0 means the box runs to `end`.
pub fn read_box_header(buf: &[u8], pos: usize, end: usize) -> Result<BoxHeader> {
    let end = end.min(buf.len());
    let available = end.saturating_sub(pos) as u64;
    if available < 8 {
        return Err(ParseError::Truncated { pos: pos as u64, available });
    }
    let size32 = BigEndian::read_u32(&buf[pos..pos + 4]);
    let mut typ = [0u8; 4];
    typ.copy_from_slice(&buf[pos + 4..pos + 8]);

    let (size, header_size) = match size32 {
        1 => {
            if available < 16 {
                return Err(ParseError::Truncated { pos: pos as u64, available });
            }
            (BigEndian::read_u64(&buf[pos + 8..pos + 16]), 16)
        }
        0 => (available, 8),
        n => (n as u64, 8),
    };

    if size < header_size {
        return Err(ParseError::InvalidSize { pos: pos as u64, size, header_size });
    }
    if size > available {
        return Err(ParseError::Overrun { pos: pos as u64, size, available });
    }

    Ok(BoxHeader { size, typ: FourCC(typ), header_size, start: pos as u64 })
}

/// Lazy walk over the sibling boxes of `[start, end)`, in file order.
///
/// Stops at the first header that does not fit; the reason is kept in
/// [`BoxIter::truncation`] so a cut-short walk is distinguishable from a
/// complete one.
#[derive(Debug, Clone)]
pub struct BoxIter<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
    truncation: Option<ParseError>,
}

impl<'a> BoxIter<'a> {
    pub fn new(buf: &'a [u8], region: Range<usize>) -> Self {
        BoxIter { buf, pos: region.start, end: region.end.min(buf.len()), truncation: None }
    }

    /// Set once the walk has stopped on bytes that were not a complete box.
    pub fn truncation(&self) -> Option<ParseError> {
        self.truncation
    }
}

impl Iterator for BoxIter<'_> {
    type Item = BoxHeader;

    fn next(&mut self) -> Option<BoxHeader> {
        if self.pos >= self.end {
            return None;
        }
        match read_box_header(self.buf, self.pos, self.end) {
            Ok(h) => {
                self.pos = h.end() as usize;
                Some(h)
            }
            Err(e) => {
                tracing::trace!(error = %e, "box walk stopped");
                self.truncation = Some(e);
                self.pos = self.end;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for BoxIter<'_> {}

pub fn iter_boxes(buf: &[u8], region: Range<usize>) -> BoxIter<'_> {
    BoxIter::new(buf, region)
}

/// Depth-first lookup of a nested box path such as `moov/trak/mdia/mdhd`.
///
/// At each level only the first sibling with the wanted tag is followed;
/// later siblings with the same tag are ignored. `meta` children are looked
/// up past its 4-byte version/flags field.
pub fn find_path(buf: &[u8], region: Range<usize>, path: &[&[u8; 4]]) -> Option<BoxHeader> {
    let (want, rest) = path.split_first()?;
    let found = iter_boxes(buf, region).find(|h| h.typ == **want)?;
    if rest.is_empty() {
        return Some(found);
    }
    find_path(buf, found.children_range()?, rest)
}
