use mp4faststart::{Relocation, relocate};
use std::env;

// Relocate moov in memory and print where everything would land, without
// writing a file.
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <file>", args[0]);
        std::process::exit(1);
    }

    let data = std::fs::read(&args[1])?;
    match relocate(&data)? {
        Relocation::AlreadyFastStart { moov_offset, .. } => {
            println!("already fast start, moov@{moov_offset}");
        }
        Relocation::Relocated(r) => {
            println!("moov {} -> {} (delta {})", r.old_moov_offset, r.new_moov_offset, r.delta);
            println!("patched {} table(s), {} entries", r.rewrite.tables, r.rewrite.entries);
            println!("output would be {} bytes", r.bytes.len());
        }
    }

    Ok(())
}
