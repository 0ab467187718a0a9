use crate::boxes::BoxHeader;
use crate::parser::find_path;
use crate::track::find_video_trak;
use crate::util::{be_u32, be_u64};
use serde::Serialize;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    #[error("mdhd: unsupported version {0}")]
    UnsupportedVersion(u8),
    #[error("mdhd v{version}: {len} payload bytes, need {need}")]
    Truncated { version: u8, len: usize, need: usize },
}

/// Timing fields of a media header (`mdhd`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaHeader {
    pub version: u8,
    pub timescale: u32,
    pub duration: u64,
}

/// Decodes an `mdhd` payload (version/flags included).
///
/// v0: creation(4) modification(4) timescale(4) duration(4).
/// v1: creation(8) modification(8) timescale(4) duration(8).
pub fn decode_mdhd(data: &[u8]) -> Result<MediaHeader, StatsError> {
    let version = *data.first().ok_or(StatsError::Truncated { version: 0, len: 0, need: 4 })?;
    let (need, timescale, duration) = match version {
        0 => (20, be_u32(data, 12), be_u32(data, 16).map(u64::from)),
        1 => (32, be_u32(data, 20), be_u64(data, 24)),
        v => return Err(StatsError::UnsupportedVersion(v)),
    };
    match (timescale, duration) {
        (Some(timescale), Some(duration)) => Ok(MediaHeader { version, timescale, duration }),
        _ => Err(StatsError::Truncated { version, len: data.len(), need }),
    }
}

/// `stsz` sample_count: version/flags (4), sample_size (4), sample_count (4). 0 if short.
pub fn stsz_sample_count(data: &[u8]) -> u32 {
    be_u32(data, 8).unwrap_or(0)
}

/// `stss` entry_count: version/flags (4), entry_count (4). 0 if short.
pub fn stss_sync_count(data: &[u8]) -> u32 {
    be_u32(data, 4).unwrap_or(0)
}

/// Approximate playback figures for one track. Derived values are 0 when
/// their denominator is 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackStats {
    pub timescale: u32,
    pub duration: u64,
    pub duration_seconds: f64,
    pub sample_count: u32,
    pub sync_sample_count: u32,
    /// `false` when the track has no `stss`; `sync_sample_count` is then 0.
    pub has_sync_table: bool,
    pub fps: f64,
    pub avg_keyframe_interval_seconds: f64,
    pub samples_per_keyframe: f64,
}

impl TrackStats {
    pub fn derive(mdhd: MediaHeader, sample_count: u32, sync_count: Option<u32>) -> Self {
        let sync = sync_count.unwrap_or(0);
        let duration_seconds = if mdhd.timescale > 0 {
            mdhd.duration as f64 / mdhd.timescale as f64
        } else {
            0.0
        };
        let fps = if duration_seconds > 0.0 { sample_count as f64 / duration_seconds } else { 0.0 };
        let avg_keyframe_interval_seconds = if duration_seconds > 0.0 && sync > 0 {
            duration_seconds / sync as f64
        } else {
            0.0
        };
        let samples_per_keyframe = if sync > 0 { sample_count as f64 / sync as f64 } else { 0.0 };

        TrackStats {
            timescale: mdhd.timescale,
            duration: mdhd.duration,
            duration_seconds,
            sample_count,
            sync_sample_count: sync,
            has_sync_table: sync_count.is_some(),
            fps,
            avg_keyframe_interval_seconds,
            samples_per_keyframe,
        }
    }
}

/// Result of auditing one file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Audit {
    Stats(TrackStats),
    NoVideoTrack,
    /// The video track lacks the named box (`mdhd` or `stsz`).
    InsufficientIndex { missing: &'static str },
}

/// Stats for a selected track. A missing `mdhd`/`stsz` yields
/// `InsufficientIndex`; a present but undecodable `mdhd` is an error.
pub fn track_stats(buf: &[u8], trak: &BoxHeader) -> Result<Audit, StatsError> {
    let region = trak.data_range();
    let Some(mdhd) = find_path(buf, region.clone(), &[b"mdia", b"mdhd"]) else {
        return Ok(Audit::InsufficientIndex { missing: "mdhd" });
    };
    let Some(stbl) = find_path(buf, region, &[b"mdia", b"minf", b"stbl"]) else {
        return Ok(Audit::InsufficientIndex { missing: "stsz" });
    };
    let Some(stsz) = find_path(buf, stbl.data_range(), &[b"stsz"]) else {
        return Ok(Audit::InsufficientIndex { missing: "stsz" });
    };
    let stss = find_path(buf, stbl.data_range(), &[b"stss"]);

    let header = decode_mdhd(mdhd.payload(buf))?;
    let sample_count = stsz_sample_count(stsz.payload(buf));
    let sync_count = stss.map(|h| stss_sync_count(h.payload(buf)));
    tracing::debug!(
        timescale = header.timescale,
        duration = header.duration,
        sample_count,
        ?sync_count,
        "video track index decoded"
    );

    Ok(Audit::Stats(TrackStats::derive(header, sample_count, sync_count)))
}

/// Audits a whole in-memory file: first video track, then its stats.
pub fn audit(buf: &[u8]) -> Result<Audit, StatsError> {
    match find_video_trak(buf) {
        Some(trak) => track_stats(buf, &trak),
        None => Ok(Audit::NoVideoTrack),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
        let mut d = vec![0u8; 12];
        d.extend_from_slice(&timescale.to_be_bytes());
        d.extend_from_slice(&duration.to_be_bytes());
        d.extend_from_slice(&[0u8; 4]);
        d
    }

    #[test]
    fn decode_mdhd_v0() {
        let h = decode_mdhd(&mdhd_v0(1000, 5000)).unwrap();
        assert_eq!(h, MediaHeader { version: 0, timescale: 1000, duration: 5000 });
    }

    #[test]
    fn decode_mdhd_v1_wide_duration() {
        let mut d = vec![1u8, 0, 0, 0];
        d.extend_from_slice(&[0u8; 16]);
        d.extend_from_slice(&90_000u32.to_be_bytes());
        d.extend_from_slice(&(1u64 << 33).to_be_bytes());
        let h = decode_mdhd(&d).unwrap();
        assert_eq!(h.timescale, 90_000);
        assert_eq!(h.duration, 1 << 33);
    }

    #[test]
    fn decode_mdhd_rejects_unknown_version_and_short_payloads() {
        let mut d = mdhd_v0(1, 1);
        d[0] = 2;
        assert_eq!(decode_mdhd(&d), Err(StatsError::UnsupportedVersion(2)));
        assert!(matches!(decode_mdhd(&[0u8; 19]), Err(StatsError::Truncated { version: 0, need: 20, .. })));
        assert!(matches!(decode_mdhd(&[1u8; 31]), Err(StatsError::Truncated { version: 1, need: 32, .. })));
        assert!(decode_mdhd(&[]).is_err());
    }

    #[test]
    fn short_tables_count_as_zero() {
        assert_eq!(stsz_sample_count(&[0u8; 11]), 0);
        assert_eq!(stss_sync_count(&[0u8; 7]), 0);
        assert_eq!(stss_sync_count(&[0, 0, 0, 0, 0, 0, 0, 9]), 9);
    }

    #[test]
    fn derived_values_guard_zero_denominators() {
        let zero_ts = MediaHeader { version: 0, timescale: 0, duration: 100 };
        let s = TrackStats::derive(zero_ts, 10, Some(2));
        assert_eq!(s.duration_seconds, 0.0);
        assert_eq!(s.fps, 0.0);
        assert_eq!(s.avg_keyframe_interval_seconds, 0.0);
        assert_eq!(s.samples_per_keyframe, 5.0);

        let hdr = MediaHeader { version: 0, timescale: 1000, duration: 2000 };
        let s = TrackStats::derive(hdr, 60, None);
        assert_eq!(s.fps, 30.0);
        assert!(!s.has_sync_table);
        assert_eq!(s.avg_keyframe_interval_seconds, 0.0);
        assert_eq!(s.samples_per_keyframe, 0.0);
    }
}
