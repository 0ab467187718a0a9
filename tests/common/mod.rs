#![allow(dead_code)]

pub fn bx(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = ((8 + payload.len()) as u32).to_be_bytes().to_vec();
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

pub fn container(typ: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    bx(typ, &children.concat())
}

/// version/flags followed by `body`.
pub fn full_box(typ: &[u8; 4], version: u8, body: &[u8]) -> Vec<u8> {
    let mut payload = vec![version, 0, 0, 0];
    payload.extend_from_slice(body);
    bx(typ, &payload)
}

/// 24-byte ftyp: isom/512/[isom, mp41].
pub fn ftyp() -> Vec<u8> {
    let mut p = b"isom".to_vec();
    p.extend_from_slice(&512u32.to_be_bytes());
    p.extend_from_slice(b"isom");
    p.extend_from_slice(b"mp41");
    bx(b"ftyp", &p)
}

/// mdat of `total` bytes, header included; payload is a byte ramp so moved
/// data can be recognised.
pub fn mdat(total: usize) -> Vec<u8> {
    let payload: Vec<u8> = (0..total - 8).map(|i| (i % 251) as u8).collect();
    bx(b"mdat", &payload)
}

pub fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
    let mut body = vec![0u8; 4]; // pre_defined
    body.extend_from_slice(handler);
    body.extend_from_slice(&[0u8; 12]);
    body.extend_from_slice(b"handler\0");
    full_box(b"hdlr", 0, &body)
}

pub fn mdhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
    let mut body = vec![0u8; 8];
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&[0x55, 0xc4, 0, 0]);
    full_box(b"mdhd", 0, &body)
}

pub fn mdhd_v1(timescale: u32, duration: u64) -> Vec<u8> {
    let mut body = vec![0u8; 16];
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&duration.to_be_bytes());
    body.extend_from_slice(&[0x55, 0xc4, 0, 0]);
    full_box(b"mdhd", 1, &body)
}

pub fn stsz(sample_count: u32) -> Vec<u8> {
    let mut body = 1000u32.to_be_bytes().to_vec(); // uniform sample size
    body.extend_from_slice(&sample_count.to_be_bytes());
    full_box(b"stsz", 0, &body)
}

pub fn stss(entries: &[u32]) -> Vec<u8> {
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    for e in entries {
        body.extend_from_slice(&e.to_be_bytes());
    }
    full_box(b"stss", 0, &body)
}

pub fn stco(entries: &[u32]) -> Vec<u8> {
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    for e in entries {
        body.extend_from_slice(&e.to_be_bytes());
    }
    full_box(b"stco", 0, &body)
}

pub fn co64(entries: &[u64]) -> Vec<u8> {
    let mut body = (entries.len() as u32).to_be_bytes().to_vec();
    for e in entries {
        body.extend_from_slice(&e.to_be_bytes());
    }
    full_box(b"co64", 0, &body)
}

pub fn trak(handler: &[u8; 4], mdhd: Vec<u8>, stbl_children: &[Vec<u8>]) -> Vec<u8> {
    let stbl = container(b"stbl", stbl_children);
    let minf = container(b"minf", &[stbl]);
    let mdia = container(b"mdia", &[mdhd, hdlr(handler), minf]);
    container(b"trak", &[mdia])
}

/// Video track: 1000 Hz, 5000 ticks, 150 samples, 5 sync samples, given chunk offsets.
pub fn video_trak(chunk_offsets: &[u32]) -> Vec<u8> {
    trak(
        b"vide",
        mdhd_v0(1000, 5000),
        &[stsz(150), stss(&[1, 31, 61, 91, 121]), stco(chunk_offsets)],
    )
}

pub fn moov(traks: &[Vec<u8>]) -> Vec<u8> {
    let mut mvhd_body = vec![0u8; 96];
    mvhd_body[11] = 0x03; // timescale 1000
    let mut kids = vec![full_box(b"mvhd", 0, &mvhd_body)];
    kids.extend_from_slice(traks);
    container(b"moov", &kids)
}

/// ftyp (24) + mdat (1000) + moov, chunk offsets pointing into mdat's payload.
pub fn moov_at_end() -> Vec<u8> {
    [ftyp(), mdat(1000), moov(&[video_trak(&[32, 532])])].concat()
}

/// ftyp (24) + moov + mdat (1000), offsets already consistent.
pub fn moov_at_front() -> Vec<u8> {
    let probe = moov(&[video_trak(&[0, 0])]);
    let base = 24 + probe.len() as u32 + 8;
    [ftyp(), moov(&[video_trak(&[base, base + 500])]), mdat(1000)].concat()
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
