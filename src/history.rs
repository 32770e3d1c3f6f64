//! Historical series normalization: gap filling, scale classification and
//! uptime summary derivation

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const SECONDS_PER_DAY: i64 = 86_400;

/// Downtime budget below which a day still counts as fully operational.
const OPERATIONAL_DOWNTIME_MINUTES: i64 = 5;

/// Health ratio at or above which a non-operational day is merely degraded.
const DEGRADED_RATIO: f64 = 0.9;

/// Requested history window in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Days7,
    Days15,
    Days30,
}

impl Window {
    /// Parse a `range` query parameter; anything unrecognized falls back to 30 days.
    pub fn from_range_param(range: &str) -> Self {
        match range {
            "7d" => Window::Days7,
            "15d" => Window::Days15,
            _ => Window::Days30,
        }
    }

    /// Number of calendar-day buckets in the window.
    pub fn days(self) -> i64 {
        match self {
            Window::Days7 => 7,
            Window::Days15 => 15,
            Window::Days30 => 30,
        }
    }

    /// UTC midnight opening the window that closes today.
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let start_secs = day_floor(now.timestamp()) - (self.days() - 1) * SECONDS_PER_DAY;
        DateTime::from_timestamp(start_secs, 0).unwrap_or(now)
    }
}

/// A raw (timestamp, value) pair drawn from the metric source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub value: String,
}

/// Health reading for one calendar day.
///
/// A day the source skipped is `Missing`, never a zero ratio, so a genuine
/// zero-health reading stays distinguishable from absent data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DayHealth {
    Real(f64),
    Missing,
}

/// One calendar-day bucket of a normalized window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    /// UTC day boundary, seconds since the Unix epoch
    pub timestamp: i64,
    pub health: DayHealth,
}

impl DailyPoint {
    pub fn has_data(&self) -> bool {
        matches!(self.health, DayHealth::Real(_))
    }
}

/// Overall uptime across the data-bearing days of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UptimeSummary {
    /// Percentage in 0-100, rounded to three decimal places
    Available(f64),
    /// No day in the window carried data
    NotAvailable,
}

impl UptimeSummary {
    pub fn percent(&self) -> Option<f64> {
        match self {
            UptimeSummary::Available(percent) => Some(*percent),
            UptimeSummary::NotAvailable => None,
        }
    }
}

impl fmt::Display for UptimeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UptimeSummary::Available(percent) => write!(f, "{:.3}%", percent),
            UptimeSummary::NotAvailable => write!(f, "N/A"),
        }
    }
}

/// Severity bucket for a single day of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Operational,
    Degraded,
    Outage,
}

/// Collapse a raw metric value onto a 0-1 health ratio.
///
/// Metrics arrive on three scales: a ratio (0-1), a percentage (0-100), or an
/// unbounded magnitude such as a block height, where any positive reading
/// means healthy. The three-tier thresholds are a fixed heuristic, not
/// per-metric metadata.
pub fn scale_ratio(value: f64) -> f64 {
    if value <= 1.0 {
        value
    } else if value <= 100.0 {
        value / 100.0
    } else {
        // Above 100 the value is necessarily positive.
        1.0
    }
}

/// Estimated downtime minutes for a day at the given health ratio.
pub fn downtime_minutes(ratio: f64) -> i64 {
    ((1.0 - ratio) * 24.0 * 60.0).round() as i64
}

/// Classify a day from its raw metric value.
pub fn classify_day(raw_value: f64) -> DayStatus {
    let ratio = scale_ratio(raw_value);
    if downtime_minutes(ratio) < OPERATIONAL_DOWNTIME_MINUTES {
        DayStatus::Operational
    } else if ratio >= DEGRADED_RATIO {
        DayStatus::Degraded
    } else {
        DayStatus::Outage
    }
}

/// Normalize a raw series into exactly one point per calendar day of the
/// window, oldest first, with `Missing` points for days the source skipped.
///
/// `now` is passed in by the caller so the window is reproducible under test.
/// Samples are merge-joined against the day buckets: stale samples from days
/// already behind the cursor are skipped, the first sample of a day wins and
/// later same-day duplicates are dropped. A sample whose value does not parse
/// as a number counts as missing data for its day.
pub fn normalize(
    mut samples: Vec<Sample>,
    window: Window,
    now: DateTime<Utc>,
) -> (Vec<DailyPoint>, UptimeSummary) {
    samples.sort_by_key(|sample| sample.timestamp);

    let today = day_floor(now.timestamp());
    let start = today - (window.days() - 1) * SECONDS_PER_DAY;

    let mut points = Vec::with_capacity(window.days() as usize);
    let mut index = 0;

    for day_offset in 0..window.days() {
        let day = start + day_offset * SECONDS_PER_DAY;

        // Skip samples from days already behind the window cursor.
        while index < samples.len() && day_floor(samples[index].timestamp) < day {
            index += 1;
        }

        let health = if index < samples.len() && day_floor(samples[index].timestamp) == day {
            let sample = &samples[index];
            index += 1;
            match sample.value.trim().parse::<f64>() {
                Ok(value) => DayHealth::Real(value),
                Err(_) => DayHealth::Missing,
            }
        } else {
            DayHealth::Missing
        };

        points.push(DailyPoint {
            timestamp: day,
            health,
        });
    }

    let summary = summarize(&points);
    (points, summary)
}

/// Average the scale-normalized ratios of the data-bearing days only.
fn summarize(points: &[DailyPoint]) -> UptimeSummary {
    let ratios: Vec<f64> = points
        .iter()
        .filter_map(|point| match point.health {
            DayHealth::Real(value) => Some(scale_ratio(value)),
            DayHealth::Missing => None,
        })
        .collect();

    if ratios.is_empty() {
        return UptimeSummary::NotAvailable;
    }

    let percent = ratios.iter().sum::<f64>() / ratios.len() as f64 * 100.0;
    UptimeSummary::Available((percent * 1000.0).round() / 1000.0)
}

/// Floor a unix timestamp to its UTC day boundary.
fn day_floor(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(SECONDS_PER_DAY)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = SECONDS_PER_DAY;

    // 2024-03-15 17:45:00 UTC
    fn fixed_now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_710_524_700, 0).unwrap()
    }

    // Midnight of the fixed "today"
    const TODAY: i64 = 1_710_460_800;

    fn sample(timestamp: i64, value: &str) -> Sample {
        Sample {
            timestamp,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_empty_series_is_all_synthetic() {
        let (points, summary) = normalize(Vec::new(), Window::Days7, fixed_now());

        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|p| p.health == DayHealth::Missing));
        assert_eq!(summary, UptimeSummary::NotAvailable);
    }

    #[test]
    fn test_points_are_day_aligned_and_oldest_first() {
        let (points, _) = normalize(Vec::new(), Window::Days7, fixed_now());

        assert_eq!(points[0].timestamp, TODAY - 6 * DAY);
        assert_eq!(points[6].timestamp, TODAY);
        for pair in points.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, DAY);
        }
    }

    #[test]
    fn test_mid_day_sample_lands_in_its_day_bucket() {
        let samples = vec![sample(TODAY + 3_600, "0.75")];
        let (points, _) = normalize(samples, Window::Days7, fixed_now());

        assert_eq!(points[6].timestamp, TODAY);
        assert_eq!(points[6].health, DayHealth::Real(0.75));
        assert!(points[..6].iter().all(|p| p.health == DayHealth::Missing));
    }

    #[test]
    fn test_stale_samples_before_the_window_are_skipped() {
        let samples = vec![
            sample(TODAY - 40 * DAY, "1"),
            sample(TODAY - 35 * DAY, "1"),
            sample(TODAY, "1"),
        ];
        let (points, _) = normalize(samples, Window::Days7, fixed_now());

        assert_eq!(points.len(), 7);
        assert_eq!(points[6].health, DayHealth::Real(1.0));
        assert_eq!(points.iter().filter(|p| p.has_data()).count(), 1);
    }

    #[test]
    fn test_first_same_day_sample_wins() {
        let samples = vec![
            sample(TODAY + 100, "0.5"),
            sample(TODAY + 200, "1"),
        ];
        let (points, _) = normalize(samples, Window::Days7, fixed_now());

        assert_eq!(points[6].health, DayHealth::Real(0.5));
    }

    #[test]
    fn test_unsorted_input_is_handled() {
        let samples = vec![
            sample(TODAY, "1"),
            sample(TODAY - 2 * DAY, "0.5"),
            sample(TODAY - DAY, "0.25"),
        ];
        let (points, _) = normalize(samples, Window::Days7, fixed_now());

        assert_eq!(points[4].health, DayHealth::Real(0.5));
        assert_eq!(points[5].health, DayHealth::Real(0.25));
        assert_eq!(points[6].health, DayHealth::Real(1.0));
    }

    #[test]
    fn test_more_samples_than_days_still_yields_window_length() {
        let mut samples = Vec::new();
        for offset in 0..60 {
            samples.push(sample(TODAY - offset * DAY, "1"));
            samples.push(sample(TODAY - offset * DAY + 30, "0"));
        }
        let (points, _) = normalize(samples, Window::Days15, fixed_now());

        assert_eq!(points.len(), 15);
        assert!(points.iter().all(|p| p.health == DayHealth::Real(1.0)));
    }

    #[test]
    fn test_non_numeric_value_counts_as_missing() {
        let samples = vec![sample(TODAY, "not-a-number")];
        let (points, summary) = normalize(samples, Window::Days7, fixed_now());

        assert_eq!(points[6].health, DayHealth::Missing);
        assert_eq!(summary, UptimeSummary::NotAvailable);
    }

    #[test]
    fn test_idempotent_for_a_frozen_now() {
        let samples = vec![
            sample(TODAY - 3 * DAY, "0.5"),
            sample(TODAY, "1"),
        ];
        let first = normalize(samples.clone(), Window::Days30, fixed_now());
        let second = normalize(samples, Window::Days30, fixed_now());

        assert_eq!(first, second);
    }

    #[test]
    fn test_summary_averages_data_bearing_days_only() {
        let samples = vec![
            sample(TODAY - 2 * DAY, "1"),
            sample(TODAY - DAY, "0.5"),
            sample(TODAY, "0"),
        ];
        let (points, summary) = normalize(samples, Window::Days30, fixed_now());

        assert_eq!(points.len(), 30);
        assert_eq!(points.iter().filter(|p| p.has_data()).count(), 3);
        assert_eq!(summary, UptimeSummary::Available(50.0));
        assert_eq!(summary.to_string(), "50.000%");
    }

    #[test]
    fn test_summary_is_scale_aware_per_value() {
        // Percentage-scaled and magnitude-scaled days mixed into one window.
        let samples = vec![
            sample(TODAY - 2 * DAY, "99.8"),
            sample(TODAY - DAY, "15000000"),
            sample(TODAY, "0.998"),
        ];
        let (_, summary) = normalize(samples, Window::Days30, fixed_now());

        let percent = summary.percent().unwrap();
        assert!((percent - 99.867).abs() < 0.001);
    }

    #[test]
    fn test_scale_ratio_three_tiers() {
        assert_eq!(scale_ratio(0.0), 0.0);
        assert_eq!(scale_ratio(0.995), 0.995);
        assert_eq!(scale_ratio(1.0), 1.0);
        assert_eq!(scale_ratio(99.5), 0.995);
        assert_eq!(scale_ratio(100.0), 1.0);
        assert_eq!(scale_ratio(15_000_000.0), 1.0);
    }

    #[test]
    fn test_scales_classify_consistently() {
        // The same health expressed as a ratio, a percentage and a magnitude.
        assert_eq!(classify_day(0.998), DayStatus::Operational);
        assert_eq!(classify_day(99.8), DayStatus::Operational);
        assert_eq!(classify_day(15_000_000.0), DayStatus::Operational);

        assert_eq!(classify_day(0.995), classify_day(99.5));
    }

    #[test]
    fn test_day_classification_thresholds() {
        // 0.995 is 7.2 downtime minutes, past the 5-minute operational budget.
        assert_eq!(classify_day(0.995), DayStatus::Degraded);
        assert_eq!(classify_day(0.95), DayStatus::Degraded);
        assert_eq!(classify_day(0.5), DayStatus::Outage);
        assert_eq!(classify_day(0.0), DayStatus::Outage);
    }

    #[test]
    fn test_downtime_minutes() {
        assert_eq!(downtime_minutes(1.0), 0);
        assert_eq!(downtime_minutes(0.995), 7);
        assert_eq!(downtime_minutes(0.0), 1_440);
    }

    #[test]
    fn test_range_param_parsing_defaults_to_30d() {
        assert_eq!(Window::from_range_param("7d").days(), 7);
        assert_eq!(Window::from_range_param("15d").days(), 15);
        assert_eq!(Window::from_range_param("30d").days(), 30);
        assert_eq!(Window::from_range_param("90d").days(), 30);
        assert_eq!(Window::from_range_param("junk").days(), 30);
    }

    #[test]
    fn test_window_start_is_utc_midnight() {
        let start = Window::Days7.start(fixed_now());
        assert_eq!(start.timestamp(), TODAY - 6 * DAY);
        assert_eq!(start.timestamp() % DAY, 0);
    }
}
