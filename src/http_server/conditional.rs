//! Conditional and range request handling for downloads
//!
//! Supports `If-None-Match`, `If-Range` and a single byte range in one of
//! the forms `bytes=start-end`, `bytes=start-` or `bytes=-suffix`.
//! Multi-range and malformed headers are ignored and the full body is served.

/// Outcome of evaluating a `Range` header against a payload length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// Serve the whole payload
    Full,
    /// Serve `start..end` (end exclusive)
    Partial { start: u64, end: u64 },
    /// Range lies entirely past the payload
    Unsatisfiable,
}

/// Parse a `Range` header for a payload of `total` bytes.
pub fn parse_range(range_header: &str, total: u64) -> RangeRequest {
    let Some(ranges) = range_header.trim().strip_prefix("bytes=") else {
        return RangeRequest::Full;
    };
    if ranges.contains(',') {
        return RangeRequest::Full;
    }

    let Some((first, last)) = ranges.trim().split_once('-') else {
        return RangeRequest::Full;
    };

    if first.is_empty() {
        // Suffix range: bytes=-500 means last 500 bytes
        let Ok(suffix) = last.parse::<u64>() else {
            return RangeRequest::Full;
        };
        if suffix == 0 || total == 0 {
            return RangeRequest::Unsatisfiable;
        }
        return RangeRequest::Partial {
            start: total.saturating_sub(suffix),
            end: total,
        };
    }

    let Ok(start) = first.parse::<u64>() else {
        return RangeRequest::Full;
    };

    let end = if last.is_empty() {
        total
    } else {
        let Ok(last) = last.parse::<u64>() else {
            return RangeRequest::Full;
        };
        if last < start {
            return RangeRequest::Full;
        }
        // HTTP end is inclusive; clamp to the payload
        last.saturating_add(1).min(total)
    };

    if start >= total {
        return RangeRequest::Unsatisfiable;
    }
    RangeRequest::Partial { start, end }
}

/// True if an `If-None-Match` (or `If-Range`) value names `etag`.
///
/// Weak validators compare equal to their strong form.
pub fn etag_matches(header_value: &str, etag: &str) -> bool {
    header_value.split(',').map(str::trim).any(|candidate| {
        candidate == "*" || candidate.strip_prefix("W/").unwrap_or(candidate) == etag
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let total = 1000;

        assert_eq!(parse_range("bytes=0-499", total), RangeRequest::Partial { start: 0, end: 500 });
        assert_eq!(parse_range("bytes=500-", total), RangeRequest::Partial { start: 500, end: 1000 });
        assert_eq!(parse_range("bytes=-200", total), RangeRequest::Partial { start: 800, end: 1000 });
        assert_eq!(parse_range("bytes=900-5000", total), RangeRequest::Partial { start: 900, end: 1000 });
        assert_eq!(parse_range("bytes=-5000", total), RangeRequest::Partial { start: 0, end: 1000 });
    }

    #[test]
    fn test_parse_range_edge_cases() {
        assert_eq!(parse_range("bytes=0-0", 100), RangeRequest::Partial { start: 0, end: 1 });
        assert_eq!(parse_range("bytes=99-99", 100), RangeRequest::Partial { start: 99, end: 100 });

        assert_eq!(parse_range("bytes=100-", 100), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=100-200", 100), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=-0", 100), RangeRequest::Unsatisfiable);
        assert_eq!(parse_range("bytes=0-", 0), RangeRequest::Unsatisfiable);
    }

    #[test]
    fn test_parse_range_ignored() {
        assert_eq!(parse_range("invalid", 100), RangeRequest::Full);
        assert_eq!(parse_range("items=0-1", 100), RangeRequest::Full);
        assert_eq!(parse_range("bytes=5-2", 100), RangeRequest::Full);
        assert_eq!(parse_range("bytes=a-b", 100), RangeRequest::Full);
        assert_eq!(parse_range("bytes=0-1,4-5", 100), RangeRequest::Full);
    }

    #[test]
    fn test_etag_matches() {
        let etag = "\"abc\"";
        assert!(etag_matches("\"abc\"", etag));
        assert!(etag_matches("W/\"abc\"", etag));
        assert!(etag_matches("\"xyz\", \"abc\"", etag));
        assert!(etag_matches("*", etag));
        assert!(!etag_matches("\"xyz\"", etag));
        assert!(!etag_matches("abc", etag));
    }
}
