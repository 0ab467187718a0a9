use mp4faststart::boxes::FourCC;
use mp4faststart::parser::{iter_boxes, read_box_header};

fn make_minimal_file() -> Vec<u8> {
    // [ftyp box]
    // size: 24 (0x18), type: "ftyp", payload: 16 bytes
    let mut v = Vec::new();

    // size = 24
    v.extend_from_slice(&24u32.to_be_bytes());
    v.extend_from_slice(b"ftyp");
    // major brand "isom"
    v.extend_from_slice(b"isom");
    // minor version
    v.extend_from_slice(&512u32.to_be_bytes());
    // one compatible brand "isom"
    v.extend_from_slice(b"isom");

    v
}

#[test]
fn read_single_ftyp_header() {
    let data = make_minimal_file();

    let hdr = read_box_header(&data, 0, data.len()).expect("read_box_header failed");

    assert_eq!(hdr.start, 0);
    assert_eq!(hdr.size, 24);
    assert_eq!(hdr.typ, FourCC(*b"ftyp"));
    assert_eq!(hdr.header_size, 8);
    assert_eq!(hdr.payload(&data).len(), 16);
}

#[test]
fn leaf_payload_is_not_a_box_sequence() {
    let data = make_minimal_file();
    let hdr = read_box_header(&data, 0, data.len()).expect("read_box_header failed");

    // "isom" + 512 reads as a box of size 0x69736f6d, far past the region
    let mut it = iter_boxes(&data, hdr.data_range());
    assert!(it.next().is_none());
    assert!(it.truncation().is_some());
}

#[test]
fn fourcc_lossy_display() {
    assert_eq!(FourCC(*b"moov").to_string(), "moov");
    assert_eq!(FourCC([0xa9, b'n', b'a', b'm']).to_string(), ".nam");
    assert_eq!(FourCC::from_str("trak"), Some(FourCC(*b"trak")));
    assert_eq!(FourCC::from_str("tra"), None);
}
