//! WAL segment filename codec.
//!
//! A segment name is 24 hex characters: an 8-character timeline id
//! followed by a 16-character segment number whose high 32 bits are the
//! log file id and low 32 bits the segment within that log file. Segments
//! are a fixed 16 MiB, so the start position is
//! `log_id * 2^32 + seg_id * 2^24`.
//!
//! Everything here is pure: no I/O and no database.

use crate::error::PitrError;

use super::Lsn;

/// Length of a WAL segment filename.
pub const WAL_FILENAME_LEN: usize = 24;

/// Length of the timeline prefix.
const TIMELINE_LEN: usize = 8;

/// Size of one WAL segment in bytes (16 MiB).
pub const WAL_SEGMENT_SIZE: u64 = 0x0100_0000;

/// Components of a valid WAL segment filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalFileName {
    /// Timeline id parsed from the first 8 characters.
    pub timeline_id: u32,
    /// The remaining 16 characters, verbatim.
    pub segment_hex: String,
}

/// Parses a WAL segment filename into timeline and segment components.
///
/// Returns `None` for anything that is not exactly 24 hex characters.
/// Callers treat that as "not a WAL file" (history files, backup labels,
/// stray files) rather than as an error.
#[must_use]
pub fn parse_wal_filename(name: &str) -> Option<WalFileName> {
    if name.len() != WAL_FILENAME_LEN || !name.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let (timeline, segment) = name.split_at_checked(TIMELINE_LEN)?;
    let timeline_id = u32::from_str_radix(timeline, 16).ok()?;
    Some(WalFileName {
        timeline_id,
        segment_hex: segment.to_string(),
    })
}

/// Computes the LSN at which the named segment starts.
///
/// The timeline prefix is ignored; only the segment suffix contributes.
///
/// # Errors
///
/// Returns [`PitrError::InvalidWalFilename`] if `name` is not 24 characters
/// long or its segment suffix is not hexadecimal.
pub fn compute_start_lsn(name: &str) -> Result<Lsn, PitrError> {
    let invalid = |reason: &str| PitrError::InvalidWalFilename(format!("{name}: {reason}"));
    if name.len() != WAL_FILENAME_LEN {
        return Err(invalid("expected 24 characters"));
    }
    let segment = name
        .get(TIMELINE_LEN..)
        .ok_or_else(|| invalid("expected ASCII characters"))?;
    if !segment.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("segment is not hexadecimal"));
    }
    let value = u64::from_str_radix(segment, 16).map_err(|e| invalid(&e.to_string()))?;

    let log_id = value >> 32;
    let seg_id = value & 0xFFFF_FFFF;
    // seg_id * 16 MiB can exceed 32 bits for out-of-range segment numbers.
    let offset = (log_id << 32).wrapping_add(seg_id.wrapping_mul(WAL_SEGMENT_SIZE));
    Ok(Lsn::new(offset))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_timeline_and_segment() {
        let Some(parsed) = parse_wal_filename("000000010000000000000001") else {
            panic!("valid name rejected");
        };
        assert_eq!(parsed.timeline_id, 1);
        assert_eq!(parsed.segment_hex, "0000000000000001");
    }

    #[test]
    fn parse_round_trips_components() {
        for name in [
            "000000010000000000000001",
            "0000000A00000003000000FF",
            "ffffffffFFFFFFFFffffffff",
        ] {
            let Some(parsed) = parse_wal_filename(name) else {
                panic!("valid name rejected: {name}");
            };
            let rebuilt = format!("{:08X}{}", parsed.timeline_id, parsed.segment_hex);
            assert_eq!(rebuilt.to_ascii_uppercase(), name.to_ascii_uppercase());
        }
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(parse_wal_filename("").is_none());
        assert!(parse_wal_filename("00000001000000000000001").is_none());
        assert!(parse_wal_filename("0000000100000000000000011").is_none());
    }

    #[test]
    fn parse_rejects_non_wal_names() {
        assert!(parse_wal_filename("00000002.history").is_none());
        assert!(parse_wal_filename("000000010000000000000002.00000028.backup").is_none());
        assert!(parse_wal_filename("000000010000000000000001.partial").is_none());
        assert!(parse_wal_filename("00000001000000000000000G").is_none());
        // 24 bytes but not 24 ASCII characters
        assert!(parse_wal_filename("0000000100000000000000é").is_none());
    }

    #[test]
    fn start_lsn_of_known_fixtures() {
        let cases = [
            ("000000010000000000000001", "0/1000000"),
            ("000000010000000000000003", "0/3000000"),
            ("000000010000000000000000", "0/0"),
            ("0000000100000001000000A0", "1/A0000000"),
            ("00000002000000000000000F", "0/F000000"),
        ];
        for (name, expected) in cases {
            let Ok(lsn) = compute_start_lsn(name) else {
                panic!("failed on {name}");
            };
            assert_eq!(lsn.to_string(), expected, "for {name}");
        }
    }

    #[test]
    fn start_lsn_ignores_timeline() {
        let a = compute_start_lsn("000000010000000000000005");
        let b = compute_start_lsn("000000090000000000000005");
        let (Ok(a), Ok(b)) = (a, b) else {
            panic!("computation failed");
        };
        assert_eq!(a, b);
    }

    #[test]
    fn start_lsn_is_deterministic() {
        let name = "00000001000000020000003C";
        let first = compute_start_lsn(name).map(|l| l.to_string()).ok();
        let second = compute_start_lsn(name).map(|l| l.to_string()).ok();
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("2/3C000000"));
    }

    #[test]
    fn start_lsn_rejects_bad_input() {
        assert!(matches!(
            compute_start_lsn("0001"),
            Err(PitrError::InvalidWalFilename(_))
        ));
        assert!(matches!(
            compute_start_lsn("0000000100000000000000ZZ"),
            Err(PitrError::InvalidWalFilename(_))
        ));
    }

    #[test]
    fn ascending_names_have_ascending_lsns() {
        let names = [
            "000000010000000000000001",
            "000000010000000000000002",
            "0000000100000000000000FF",
            "000000010000000100000000",
        ];
        let lsns: Vec<Lsn> = names
            .iter()
            .filter_map(|n| compute_start_lsn(n).ok())
            .collect();
        assert_eq!(lsns.len(), names.len());
        assert!(lsns.windows(2).all(|w| matches!(w, [a, b] if a < b)));
    }
}
