use crate::boxes::{BoxHeader, FourCC};
use crate::parser::{find_path, iter_boxes};
use serde::Serialize;

pub const VIDEO_HANDLER: FourCC = FourCC(*b"vide");
pub const SOUND_HANDLER: FourCC = FourCC(*b"soun");

/// A `trak` under `moov` and the handler its `mdia/hdlr` declares, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackEntry {
    pub trak: BoxHeader,
    pub handler: Option<FourCC>,
}

impl TrackEntry {
    pub fn is_video(&self) -> bool {
        self.handler == Some(VIDEO_HANDLER)
    }
}

/// Handler type from an `hdlr` box: version/flags (4), pre_defined (4), handler_type (4).
/// Compared as raw bytes; any byte values are accepted.
pub fn handler_type(buf: &[u8], hdlr: &BoxHeader) -> Option<FourCC> {
    let data = hdlr.payload(buf);
    let bytes: [u8; 4] = data.get(8..12)?.try_into().ok()?;
    Some(FourCC(bytes))
}

fn trak_handler(buf: &[u8], trak: &BoxHeader) -> Option<FourCC> {
    let hdlr = find_path(buf, trak.children_range()?, &[b"mdia", b"hdlr"])?;
    handler_type(buf, &hdlr)
}

/// Every `trak` of the first `moov`, in file order. Tracks lacking
/// `mdia/hdlr` are listed with no handler.
pub fn tracks(buf: &[u8]) -> Vec<TrackEntry> {
    let Some(moov) = find_path(buf, 0..buf.len(), &[b"moov"]) else {
        return Vec::new();
    };
    iter_boxes(buf, moov.data_range())
        .filter(|h| h.typ == *b"trak")
        .map(|trak| {
            let handler = trak_handler(buf, &trak);
            if handler.is_none() {
                tracing::warn!(offset = trak.start, "trak without mdia/hdlr skipped");
            }
            TrackEntry { trak, handler }
        })
        .collect()
}

/// First `trak` under `moov` whose handler equals `handler`.
pub fn find_trak_by_handler(buf: &[u8], handler: FourCC) -> Option<BoxHeader> {
    tracks(buf)
        .into_iter()
        .find(|t| t.handler == Some(handler))
        .map(|t| t.trak)
}

/// First video track in file order. Files with several video tracks are not
/// disambiguated further.
pub fn find_video_trak(buf: &[u8]) -> Option<BoxHeader> {
    find_trak_by_handler(buf, VIDEO_HANDLER)
}
