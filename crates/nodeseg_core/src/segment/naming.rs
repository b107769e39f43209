//! Segment file naming.
//!
//! ```text
//! ordered:    {min:08}.pb.gz               all records at one height
//!             {min:08}-{max:08}.pb.gz      records spanning min..=max
//!             {min:08}-{max:08}-{seq:08}.pb.gz
//!                                          fallback if the above exists
//! unordered:  {worker:02}-{seq:08}.pb.gz
//! ```
//!
//! The fallback always spells out both heights, even when they are equal.
//! A two-part name is then always a range, and [`segment_order`] can
//! recover write order from names alone.

use crate::error::{CoreError, CoreResult};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Extension shared by all segment files.
pub const SEGMENT_EXTENSION: &str = "pb.gz";

/// Base name for an ordered segment covering `min..=max`.
#[must_use]
pub fn ordered_base(min_block: i64, max_block: i64) -> String {
    if min_block == max_block {
        format!("{min_block:08}")
    } else {
        format!("{min_block:08}-{max_block:08}")
    }
}

/// File name for an unordered segment.
#[must_use]
pub fn unordered_name(worker_id: u32, seq: u64) -> String {
    format!("{worker_id:02}-{seq:08}.{SEGMENT_EXTENSION}")
}

/// Picks the path for an ordered segment without overwriting anything.
///
/// Tries the block-range name first, then `{min}-{max}-{seq}`.
///
/// # Errors
///
/// Returns [`CoreError::FileExists`] if both names are taken.
pub fn ordered_path(dir: &Path, min_block: i64, max_block: i64, seq: u64) -> CoreResult<PathBuf> {
    let base = ordered_base(min_block, max_block);
    let path = dir.join(format!("{base}.{SEGMENT_EXTENSION}"));
    if !path.exists() {
        return Ok(path);
    }

    let fallback = dir.join(format!(
        "{min_block:08}-{max_block:08}-{seq:08}.{SEGMENT_EXTENSION}"
    ));
    if fallback.exists() {
        error!(path = %fallback.display(), "segment file already exists");
        return Err(CoreError::FileExists { path: fallback });
    }
    warn!(
        taken = %path.display(),
        path = %fallback.display(),
        "segment name taken, using sequence suffix"
    );
    Ok(fallback)
}

/// Path for an unordered segment.
#[must_use]
pub fn unordered_path(dir: &Path, worker_id: u32, seq: u64) -> PathBuf {
    dir.join(unordered_name(worker_id, seq))
}

/// Sort key that puts the files of a segment directory in read order.
///
/// Ordered segments sort by min height, then max height, then unsuffixed
/// before fallback, then sequence. Unordered names sort by worker and then
/// sequence. Names that do not parse sort after all segments, by name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SegmentOrder {
    /// A parsed segment name.
    Segment {
        min: i64,
        max: i64,
        fallback: bool,
        seq: u64,
    },
    /// Anything else.
    Other(OsString),
}

/// Computes the [`SegmentOrder`] of a file name.
#[must_use]
pub fn segment_order(name: &OsStr) -> SegmentOrder {
    let fields = name
        .to_str()
        .and_then(|name| name.strip_suffix(SEGMENT_EXTENSION))
        .and_then(|stem| stem.strip_suffix('.'))
        .and_then(parse_fields);

    match fields.as_deref() {
        Some(&[min]) => SegmentOrder::Segment {
            min,
            max: min,
            fallback: false,
            seq: 0,
        },
        Some(&[min, max]) => SegmentOrder::Segment {
            min,
            max,
            fallback: false,
            seq: 0,
        },
        Some(&[min, max, seq]) => match u64::try_from(seq) {
            Ok(seq) => SegmentOrder::Segment {
                min,
                max,
                fallback: true,
                seq,
            },
            Err(_) => SegmentOrder::Other(name.to_os_string()),
        },
        _ => SegmentOrder::Other(name.to_os_string()),
    }
}

/// Splits `-`-separated integers, each of which may carry its own sign.
fn parse_fields(stem: &str) -> Option<Vec<i64>> {
    let bytes = stem.as_bytes();
    let mut fields = Vec::new();
    let mut start = 0;
    loop {
        let digits = if bytes.get(start) == Some(&b'-') {
            start + 1
        } else {
            start
        };
        let end = bytes[digits..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |offset| digits + offset);
        if end == digits {
            return None;
        }
        fields.push(stem[start..end].parse().ok()?);
        if end == bytes.len() {
            return Some(fields);
        }
        if bytes[end] != b'-' {
            return None;
        }
        start = end + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn single_height_name() {
        assert_eq!(ordered_base(5, 5), "00000005");
    }

    #[test]
    fn range_name() {
        assert_eq!(ordered_base(5, 9), "00000005-00000009");
        assert_eq!(ordered_base(0, 123_456_789), "00000000-123456789");
    }

    #[test]
    fn negative_heights_keep_sign() {
        assert_eq!(ordered_base(-5, -5), "-0000005");
    }

    #[test]
    fn unordered_names() {
        assert_eq!(unordered_name(3, 17), "03-00000017.pb.gz");
        assert_eq!(unordered_name(12, 0), "12-00000000.pb.gz");
    }

    #[test]
    fn ordered_path_falls_back_then_fails() {
        let dir = tempdir().unwrap();

        let first = ordered_path(dir.path(), 1, 4, 0).unwrap();
        assert_eq!(first, dir.path().join("00000001-00000004.pb.gz"));
        std::fs::write(&first, b"x").unwrap();

        let second = ordered_path(dir.path(), 1, 4, 7).unwrap();
        assert_eq!(second, dir.path().join("00000001-00000004-00000007.pb.gz"));
        std::fs::write(&second, b"x").unwrap();

        let err = ordered_path(dir.path(), 1, 4, 7).unwrap_err();
        assert!(matches!(err, CoreError::FileExists { path } if path == second));
    }

    #[test]
    fn single_height_fallback_names_both_heights() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("00000005.pb.gz"), b"x").unwrap();

        let path = ordered_path(dir.path(), 5, 5, 1).unwrap();
        assert_eq!(path, dir.path().join("00000005-00000005-00000001.pb.gz"));
    }

    fn order(name: &str) -> SegmentOrder {
        segment_order(OsStr::new(name))
    }

    fn segment(min: i64, max: i64, fallback: bool, seq: u64) -> SegmentOrder {
        SegmentOrder::Segment {
            min,
            max,
            fallback,
            seq,
        }
    }

    #[test]
    fn parses_segment_names() {
        assert_eq!(order("00000005.pb.gz"), segment(5, 5, false, 0));
        assert_eq!(order("00000005-00000009.pb.gz"), segment(5, 9, false, 0));
        assert_eq!(order("00000005-00000005-00000003.pb.gz"), segment(5, 5, true, 3));
        assert_eq!(order("-0000005--0000002.pb.gz"), segment(-5, -2, false, 0));
    }

    #[test]
    fn unparseable_names_sort_last() {
        for name in ["notes.txt", "00000005.pb", "5-.pb.gz", "a-00000001.pb.gz", ".pb.gz"] {
            assert_eq!(order(name), SegmentOrder::Other(name.into()), "{name}");
        }
        assert!(order("99999999.pb.gz") < order("00000001.txt"));
    }

    #[test]
    fn fallbacks_sort_between_base_and_range() {
        let mut names = vec![
            "00000005-00000006.pb.gz",
            "00000005-00000005-00000010.pb.gz",
            "00000006.pb.gz",
            "00000005-00000005-00000002.pb.gz",
            "00000005.pb.gz",
            "00000004-00000005.pb.gz",
        ];
        names.sort_by_key(|name| order(name));
        assert_eq!(
            names,
            vec![
                "00000004-00000005.pb.gz",
                "00000005.pb.gz",
                "00000005-00000005-00000002.pb.gz",
                "00000005-00000005-00000010.pb.gz",
                "00000005-00000006.pb.gz",
                "00000006.pb.gz",
            ]
        );
    }

    #[test]
    fn negative_heights_sort_numerically() {
        assert!(order("-0000002.pb.gz") < order("-0000001.pb.gz"));
        assert!(order("-0000001.pb.gz") < order("00000000.pb.gz"));
    }

    #[test]
    fn unordered_names_sort_by_worker_then_seq() {
        assert!(order("01-00000009.pb.gz") < order("01-00000010.pb.gz"));
        assert!(order("01-00000010.pb.gz") < order("02-00000000.pb.gz"));
    }
}
