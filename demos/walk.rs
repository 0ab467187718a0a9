use mp4faststart::known_boxes::KnownBox;
use mp4faststart::{BoxHeader, iter_boxes};
use std::env;

// Print the box tree of an MP4 file, descending into the boxes the
// offset rewriter treats as containers.
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <file>", args[0]);
        std::process::exit(1);
    }

    let data = std::fs::read(&args[1])?;
    print_level(&data, 0..data.len(), 0);

    Ok(())
}

fn print_level(data: &[u8], region: std::ops::Range<usize>, depth: usize) {
    let mut it = iter_boxes(data, region);
    for h in it.by_ref() {
        print_box(&h, depth);
        let kb = KnownBox::from(h.typ);
        if kb.is_container()
            && let Some(children) = h.children_range()
        {
            print_level(data, children, depth + 1);
        }
    }
    if let Some(e) = it.truncation() {
        println!("{:indent$}(walk stopped: {e})", "", indent = depth * 2);
    }
}

fn print_box(h: &BoxHeader, depth: usize) {
    println!(
        "{:indent$}{} @{} size={} ({})",
        "",
        h.typ,
        h.start,
        h.size,
        KnownBox::from(h.typ).full_name(),
        indent = depth * 2
    );
}
