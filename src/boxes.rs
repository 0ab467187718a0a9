use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn from_str(s: &str) -> Option<Self> {
        let b = s.as_bytes();
        if b.len() == 4 {
            Some(FourCC([b[0], b[1], b[2], b[3]]))
        } else { None }
    }
    /// Printable form of the tag; bytes outside printable ASCII become `.`.
    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

impl PartialEq<[u8; 4]> for FourCC {
    fn eq(&self, other: &[u8; 4]) -> bool { &self.0 == other }
}

/// One box as seen by the walker. Offsets are relative to the buffer that was walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxHeader {
    pub size: u64,          // total size including header; a 0 on disk is already resolved to the region end
    pub typ: FourCC,
    pub header_size: u64,   // 8, or 16 for the 64-bit size form
    pub start: u64,         // offset of header start
}

impl BoxHeader {
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn data_start(&self) -> u64 {
        self.start + self.header_size
    }

    /// Payload range, header excluded.
    pub fn data_range(&self) -> Range<usize> {
        self.data_start() as usize..self.end() as usize
    }

    /// Range holding this box's children. `meta` carries version/flags
    /// before its first child, so its children start 4 bytes later; `None`
    /// when a `meta` payload is too short to hold them.
    pub fn children_range(&self) -> Option<Range<usize>> {
        let data = self.data_range();
        if self.typ == *b"meta" {
            if data.start + 4 > data.end {
                return None;
            }
            return Some(data.start + 4..data.end);
        }
        Some(data)
    }

    /// Payload bytes within `buf`; empty if the header does not fit the buffer.
    pub fn payload<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        buf.get(self.data_range()).unwrap_or(&[])
    }

    /// All bytes of the box, header included.
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        buf.get(self.start as usize..self.end() as usize).unwrap_or(&[])
    }
}
