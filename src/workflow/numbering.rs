/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Number generation for requests and qualifications.
//!
//! WCR numbers follow `<PREFIX>-<YEAR>-<SEQ>` with a zero-padded,
//! strictly-increasing sequence per `(prefix, year)`. Zero-padding keeps
//! lexicographic and numeric order aligned, so the successor can be derived
//! from the lexicographically greatest existing number.
//!
//! WPQ numbers are `<stamp>-<procedure_ref>` when the coupon carries a
//! procedure reference, with deterministic `-2`, `-3`, ... suffixes on
//! collision; otherwise `<stamp>-<wcr_number>-C<coupon>-<process>`.

/// Width of the zero-padded WCR sequence component.
pub const WCR_SEQ_WIDTH: usize = 4;

/// Formats a WCR number from its components.
pub fn format_wcr_number(prefix: &str, year: i32, seq: u32) -> String {
    format!("{}-{}-{:0width$}", prefix, year, seq, width = WCR_SEQ_WIDTH)
}

/// Extracts the sequence component of a WCR number, if it belongs to the
/// given `(prefix, year)` series.
pub fn parse_wcr_seq(number: &str, prefix: &str, year: i32) -> Option<u32> {
    let series = format!("{}-{}-", prefix, year);
    number.strip_prefix(&series)?.parse().ok()
}

/// Computes the next WCR number given the greatest existing number in the
/// series, or starts the series at 1.
pub fn next_wcr_number(latest: Option<&str>, prefix: &str, year: i32) -> String {
    let next_seq = latest
        .and_then(|n| parse_wcr_seq(n, prefix, year))
        .map_or(1, |seq| seq + 1);
    format_wcr_number(prefix, year, next_seq)
}

/// Builds the base qualification number for a coupon.
pub fn wpq_base_number(
    stamp: &str,
    procedure_ref: Option<&str>,
    wcr_number: &str,
    coupon_number: i32,
    process: &str,
) -> String {
    match procedure_ref {
        Some(proc_ref) => format!("{}-{}", stamp, proc_ref),
        None => format!("{}-{}-C{}-{}", stamp, wcr_number, coupon_number, process),
    }
}

/// The nth candidate for a qualification number: the base itself, then
/// `base-2`, `base-3`, ...
pub fn wpq_candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_wcr_number("WCR", 2026, 1), "WCR-2026-0001");
        assert_eq!(format_wcr_number("WCR", 2026, 42), "WCR-2026-0042");
        assert_eq!(format_wcr_number("QA", 2026, 12345), "QA-2026-12345");
    }

    #[test]
    fn parses_only_matching_series() {
        assert_eq!(parse_wcr_seq("WCR-2026-0007", "WCR", 2026), Some(7));
        assert_eq!(parse_wcr_seq("WCR-2025-0007", "WCR", 2026), None);
        assert_eq!(parse_wcr_seq("QA-2026-0007", "WCR", 2026), None);
        assert_eq!(parse_wcr_seq("WCR-2026-xyz", "WCR", 2026), None);
    }

    #[test]
    fn next_number_increments_or_starts_at_one() {
        assert_eq!(next_wcr_number(None, "WCR", 2026), "WCR-2026-0001");
        assert_eq!(
            next_wcr_number(Some("WCR-2026-0009"), "WCR", 2026),
            "WCR-2026-0010"
        );
        // A stale number from another year restarts the sequence.
        assert_eq!(
            next_wcr_number(Some("WCR-2025-0400"), "WCR", 2026),
            "WCR-2026-0001"
        );
    }

    #[test]
    fn wpq_number_prefers_procedure_ref() {
        assert_eq!(
            wpq_base_number("JD1", Some("WPS-104"), "WCR-2026-0001", 1, "SMAW"),
            "JD1-WPS-104"
        );
        assert_eq!(
            wpq_base_number("JD1", None, "WCR-2026-0001", 2, "GTAW"),
            "JD1-WCR-2026-0001-C2-GTAW"
        );
    }

    #[test]
    fn wpq_candidates_are_deterministic() {
        assert_eq!(wpq_candidate("JD1-WPS-104", 1), "JD1-WPS-104");
        assert_eq!(wpq_candidate("JD1-WPS-104", 2), "JD1-WPS-104-2");
        assert_eq!(wpq_candidate("JD1-WPS-104", 3), "JD1-WPS-104-3");
    }
}
