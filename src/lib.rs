pub mod api;
pub mod boxes;
pub mod faststart;
pub mod known_boxes;
pub mod parser;
pub mod stats;
pub mod track;
pub mod util;

pub use api::{FaststartOptions, FaststartOutcome, FaststartReport, audit_file, faststart_file, output_path};
pub use boxes::{BoxHeader, FourCC};
pub use faststart::{Relocation, adjust_chunk_offsets, relocate, scan_top_level};
pub use parser::{BoxIter, find_path, iter_boxes, read_box_header};
pub use stats::{Audit, TrackStats, audit};
pub use track::{find_video_trak, tracks};
