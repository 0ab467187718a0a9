use byteorder::{BigEndian, ByteOrder};

pub fn be_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    buf.get(offset..end).map(BigEndian::read_u32)
}

pub fn be_u64(buf: &[u8], offset: usize) -> Option<u64> {
    let end = offset.checked_add(8)?;
    buf.get(offset..end).map(BigEndian::read_u64)
}

/// Overwrites 4 bytes at `offset`. Returns false (and writes nothing) when out of bounds.
pub fn put_be_u32(buf: &mut [u8], offset: usize, v: u32) -> bool {
    match offset.checked_add(4).and_then(|end| buf.get_mut(offset..end)) {
        Some(dst) => {
            BigEndian::write_u32(dst, v);
            true
        }
        None => false,
    }
}

pub fn put_be_u64(buf: &mut [u8], offset: usize, v: u64) -> bool {
    match offset.checked_add(8).and_then(|end| buf.get_mut(offset..end)) {
        Some(dst) => {
            BigEndian::write_u64(dst, v);
            true
        }
        None => false,
    }
}
