use crate::boxes::FourCC;

/// Typed view over the boxes this crate reads or rewrites.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)` and is
/// treated as an opaque leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level / top-level
    Ftyp,
    Moov,
    Mdat,
    Free,
    Skip,
    Wide,

    // moov children
    Mvhd,
    Trak,
    Udta,
    Meta,
    Ilst,

    // trak children
    Tkhd,
    Edts,
    Mdia,

    // mdia children
    Mdhd,
    Hdlr,
    Minf,

    // minf children
    Dinf,
    Stbl,

    // stbl children
    Stsd,
    Stts,
    Stsc,
    Stsz,
    Stco,
    Co64,
    Stss,

    // Anything else
    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownBox::Ftyp,
            b"moov" => KnownBox::Moov,
            b"mdat" => KnownBox::Mdat,
            b"free" => KnownBox::Free,
            b"skip" => KnownBox::Skip,
            b"wide" => KnownBox::Wide,

            b"mvhd" => KnownBox::Mvhd,
            b"trak" => KnownBox::Trak,
            b"udta" => KnownBox::Udta,
            b"meta" => KnownBox::Meta,
            b"ilst" => KnownBox::Ilst,

            b"tkhd" => KnownBox::Tkhd,
            b"edts" => KnownBox::Edts,
            b"mdia" => KnownBox::Mdia,

            b"mdhd" => KnownBox::Mdhd,
            b"hdlr" => KnownBox::Hdlr,
            b"minf" => KnownBox::Minf,

            b"dinf" => KnownBox::Dinf,
            b"stbl" => KnownBox::Stbl,

            b"stsd" => KnownBox::Stsd,
            b"stts" => KnownBox::Stts,
            b"stsc" => KnownBox::Stsc,
            b"stsz" => KnownBox::Stsz,
            b"stco" => KnownBox::Stco,
            b"co64" => KnownBox::Co64,
            b"stss" => KnownBox::Stss,

            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    /// Boxes whose payload is a sequence of child boxes that may hold
    /// chunk-offset tables. Everything else is a leaf and never descended into.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            KnownBox::Moov
                | KnownBox::Trak
                | KnownBox::Mdia
                | KnownBox::Minf
                | KnownBox::Stbl
                | KnownBox::Edts
                | KnownBox::Dinf
                | KnownBox::Udta
                | KnownBox::Meta
                | KnownBox::Ilst
        )
    }

    /// `stco` / `co64`: absolute file offsets that move with the media data.
    pub fn is_chunk_offset_table(&self) -> bool {
        matches!(self, KnownBox::Stco | KnownBox::Co64)
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Ftyp => "File Type Box",
            KnownBox::Moov => "Movie Box",
            KnownBox::Mdat => "Media Data Box",
            KnownBox::Free => "Free Space Box",
            KnownBox::Skip => "Skip Box",
            KnownBox::Wide => "Wide Box",
            KnownBox::Mvhd => "Movie Header Box",
            KnownBox::Trak => "Track Box",
            KnownBox::Udta => "User Data Box",
            KnownBox::Meta => "Meta Box",
            KnownBox::Ilst => "Item List Box",
            KnownBox::Tkhd => "Track Header Box",
            KnownBox::Edts => "Edit Box",
            KnownBox::Mdia => "Media Box",
            KnownBox::Mdhd => "Media Header Box",
            KnownBox::Hdlr => "Handler Reference Box",
            KnownBox::Minf => "Media Information Box",
            KnownBox::Dinf => "Data Information Box",
            KnownBox::Stbl => "Sample Table Box",
            KnownBox::Stsd => "Sample Description Box",
            KnownBox::Stts => "Decoding Time to Sample Box",
            KnownBox::Stsc => "Sample To Chunk Box",
            KnownBox::Stsz => "Sample Size Box",
            KnownBox::Stco => "Chunk Offset Box",
            KnownBox::Co64 => "Chunk Large Offset Box",
            KnownBox::Stss => "Sync Sample Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
