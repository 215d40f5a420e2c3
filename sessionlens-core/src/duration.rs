//! Break-aware active-duration calculation
//!
//! Wall-clock span overstates how long someone worked when a session sat
//! idle over lunch or overnight. The calculator walks the sorted timestamps
//! and splits them into active segments wherever two consecutive entries are
//! further apart than `max_gap_minutes`. Gaps are reported, segments shorter
//! than `min_active_seconds` are discarded, and the kept segments are summed.
//!
//! ```text
//! t:  0   0   5 ............ 45        (minutes, max_gap = 30)
//!     [segment 1: 5 min, 3 msgs]  gap 40 min  [segment 2: 0 min, 1 msg]
//! ```
//!
//! The confidence label is a heuristic, not a statistical guarantee.

use crate::config::DurationConfig;
use crate::error::Result;
use crate::types::{ActiveSegment, Confidence, ConversationEntry, DurationAnalysis, ExcludedGap};
use chrono::{DateTime, Duration, Utc};

/// Sessions longer than this with no detected gap are suspicious.
const UNBROKEN_SESSION_SECONDS: i64 = 60 * 60;

/// Active/raw ratio below which filtering is considered aggressive.
const AGGRESSIVE_FILTER_RATIO: f64 = 0.2;

/// Fewer timestamped entries than this give weak statistical support.
const MIN_SUPPORTED_ENTRIES: usize = 10;

/// Compute a fresh [`DurationAnalysis`] for the given entries.
///
/// Entries without a timestamp are ignored. Fails only when `config` is
/// unusable; callers fall back to the raw span in that case.
pub fn calculate_active_duration(
    entries: &[ConversationEntry],
    config: &DurationConfig,
) -> Result<DurationAnalysis> {
    let timestamps: Vec<DateTime<Utc>> = entries.iter().filter_map(|e| e.timestamp).collect();
    calculate_from_timestamps(timestamps, entries.len(), config)
}

/// Same as [`calculate_active_duration`] over bare timestamps.
pub fn calculate_from_timestamps(
    mut timestamps: Vec<DateTime<Utc>>,
    total_entries: usize,
    config: &DurationConfig,
) -> Result<DurationAnalysis> {
    config.validate()?;
    timestamps.sort();

    let (first, last) = match (timestamps.first(), timestamps.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Ok(DurationAnalysis {
                active_duration_seconds: 0,
                active_segments: vec![],
                excluded_gaps: vec![],
                confidence: Confidence::Low,
                metadata: serde_json::json!({
                    "total_entries": total_entries,
                    "timestamped_entries": 0,
                    "raw_duration_seconds": 0,
                    "reasons": ["no timestamped entries"],
                }),
            });
        }
    };

    let raw_seconds = (last - first).num_seconds();
    let max_gap = Duration::milliseconds((config.max_gap_minutes * 60_000.0) as i64);

    let mut segments = Vec::new();
    let mut gaps = Vec::new();
    let mut segment_start = first;
    let mut segment_count = 1usize;
    let mut prev = first;

    for &ts in &timestamps[1..] {
        let gap = ts - prev;
        if gap > max_gap {
            close_segment(&mut segments, segment_start, prev, segment_count, config);

            let gap_minutes = gap.num_milliseconds() as f64 / 60_000.0;
            let reason = if gap_minutes > config.break_threshold_minutes {
                "likely break/overnight"
            } else {
                "extended pause"
            };
            gaps.push(ExcludedGap {
                start: prev,
                end: ts,
                duration_minutes: gap_minutes,
                reason: reason.to_string(),
            });

            segment_start = ts;
            segment_count = 1;
        } else {
            segment_count += 1;
        }
        prev = ts;
    }
    close_segment(&mut segments, segment_start, prev, segment_count, config);

    let active_seconds = segments
        .iter()
        .map(|s: &ActiveSegment| s.duration_seconds)
        .sum::<i64>()
        .min(raw_seconds);

    let active_ratio = if raw_seconds > 0 {
        active_seconds as f64 / raw_seconds as f64
    } else {
        1.0
    };

    let mut reasons: Vec<&str> = Vec::new();
    if raw_seconds > UNBROKEN_SESSION_SECONDS && gaps.is_empty() {
        reasons.push("over an hour with no detected gap");
    }
    if raw_seconds > 0 && active_ratio < AGGRESSIVE_FILTER_RATIO {
        reasons.push("active time below 20% of raw span");
    }
    if timestamps.len() < MIN_SUPPORTED_ENTRIES {
        reasons.push("fewer than 10 timestamped entries");
    }

    let confidence = if timestamps.len() < 2 {
        Confidence::Low
    } else if reasons.is_empty() {
        Confidence::High
    } else {
        Confidence::Medium
    };

    tracing::debug!(
        raw_seconds,
        active_seconds,
        segments = segments.len(),
        gaps = gaps.len(),
        confidence = confidence.as_str(),
        "Computed active duration"
    );

    Ok(DurationAnalysis {
        active_duration_seconds: active_seconds,
        active_segments: segments,
        excluded_gaps: gaps,
        confidence,
        metadata: serde_json::json!({
            "total_entries": total_entries,
            "timestamped_entries": timestamps.len(),
            "raw_duration_seconds": raw_seconds,
            "active_ratio": active_ratio,
            "max_gap_minutes": config.max_gap_minutes,
            "min_active_seconds": config.min_active_seconds,
            "reasons": reasons,
        }),
    })
}

fn close_segment(
    segments: &mut Vec<ActiveSegment>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    message_count: usize,
    config: &DurationConfig,
) {
    let duration_seconds = (end - start).num_seconds();
    if duration_seconds > config.min_active_seconds {
        segments.push(ActiveSegment {
            start,
            end,
            duration_seconds,
            message_count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_minutes(offsets: &[i64]) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        offsets
            .iter()
            .map(|m| base + Duration::minutes(*m))
            .collect()
    }

    fn config(max_gap_minutes: f64, min_active_seconds: i64) -> DurationConfig {
        DurationConfig {
            max_gap_minutes,
            min_active_seconds,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_gap_is_excluded() {
        // Gaps between entries: 0, 5, 40 minutes
        let stamps = at_minutes(&[0, 0, 5, 45]);
        let analysis = calculate_from_timestamps(stamps, 4, &config(30.0, 0)).unwrap();

        assert_eq!(analysis.excluded_gaps.len(), 1);
        let gap = &analysis.excluded_gaps[0];
        assert!((gap.duration_minutes - 40.0).abs() < 1e-9);
        assert_eq!(gap.reason, "extended pause");

        // Trailing single-entry segment lasts 0s and is not above the minimum
        assert_eq!(analysis.active_segments.len(), 1);
        assert_eq!(analysis.active_segments[0].duration_seconds, 300);
        assert_eq!(analysis.active_segments[0].message_count, 3);
        assert_eq!(analysis.active_duration_seconds, 300);
    }

    #[test]
    fn test_segments_evaluated_independently() {
        // 5 minute segment, 40 minute gap, 2 minute segment
        let stamps = at_minutes(&[0, 0, 5, 45, 47]);

        let analysis = calculate_from_timestamps(stamps.clone(), 5, &config(30.0, 200)).unwrap();
        assert_eq!(analysis.active_segments.len(), 1);
        assert_eq!(analysis.active_duration_seconds, 300);

        let analysis = calculate_from_timestamps(stamps, 5, &config(30.0, 60)).unwrap();
        assert_eq!(analysis.active_segments.len(), 2);
        assert_eq!(analysis.active_duration_seconds, 420);
    }

    #[test]
    fn test_long_gap_is_break() {
        let stamps = at_minutes(&[0, 10, 200, 210]);
        let analysis = calculate_from_timestamps(stamps, 4, &config(30.0, 0)).unwrap();
        assert_eq!(analysis.excluded_gaps[0].reason, "likely break/overnight");
        assert_eq!(analysis.active_duration_seconds, 1200);
    }

    #[test]
    fn test_active_never_exceeds_raw() {
        let stamps = at_minutes(&[0, 1, 2, 3, 50, 51, 120, 500]);
        let analysis = calculate_from_timestamps(stamps, 8, &config(30.0, 0)).unwrap();
        let raw = analysis.metadata["raw_duration_seconds"].as_i64().unwrap();
        assert!(analysis.active_duration_seconds <= raw);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let stamps = at_minutes(&[5, 0, 45, 0]);
        let analysis = calculate_from_timestamps(stamps, 4, &config(30.0, 0)).unwrap();
        assert_eq!(analysis.excluded_gaps.len(), 1);
        assert_eq!(analysis.active_duration_seconds, 300);
    }

    #[test]
    fn test_confidence_high_with_dense_entries() {
        let offsets: Vec<i64> = (0..20).map(|i| i * 2).collect();
        let analysis =
            calculate_from_timestamps(at_minutes(&offsets), 20, &config(30.0, 0)).unwrap();
        assert_eq!(analysis.confidence, Confidence::High);
    }

    #[test]
    fn test_confidence_medium_when_few_entries() {
        let analysis =
            calculate_from_timestamps(at_minutes(&[0, 1, 2]), 3, &config(30.0, 0)).unwrap();
        assert_eq!(analysis.confidence, Confidence::Medium);
    }

    #[test]
    fn test_confidence_medium_for_unbroken_long_session() {
        // 25 entries, 3 minutes apart: 72 minutes, no gaps
        let offsets: Vec<i64> = (0..25).map(|i| i * 3).collect();
        let analysis =
            calculate_from_timestamps(at_minutes(&offsets), 25, &config(30.0, 0)).unwrap();
        assert!(analysis.excluded_gaps.is_empty());
        assert_eq!(analysis.confidence, Confidence::Medium);
    }

    #[test]
    fn test_confidence_medium_for_aggressive_filtering() {
        let mut offsets: Vec<i64> = (0..12).collect();
        offsets.push(1000);
        let analysis =
            calculate_from_timestamps(at_minutes(&offsets), 13, &config(30.0, 0)).unwrap();
        assert_eq!(analysis.confidence, Confidence::Medium);
        assert!(analysis.metadata["active_ratio"].as_f64().unwrap() < 0.2);
    }

    #[test]
    fn test_no_timestamps_is_low_confidence() {
        let analysis = calculate_from_timestamps(vec![], 3, &config(30.0, 0)).unwrap();
        assert_eq!(analysis.active_duration_seconds, 0);
        assert_eq!(analysis.confidence, Confidence::Low);
    }

    #[test]
    fn test_invalid_config_fails() {
        let result = calculate_from_timestamps(at_minutes(&[0, 1]), 2, &config(0.0, 0));
        assert!(result.is_err());
    }
}
