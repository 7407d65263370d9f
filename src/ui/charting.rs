use typemaster::history::TypingRecord;

/// Chart points `(test number, wpm)`, oldest test first.
///
/// `records` is expected newest first, as returned by the history loader.
pub fn wpm_points(records: &[TypingRecord]) -> Vec<(f64, f64)> {
    records
        .iter()
        .rev()
        .enumerate()
        .map(|(i, r)| ((i + 1) as f64, r.wpm as f64))
        .collect()
}

/// Compute X (test number) and Y (WPM) bounds for the history chart
pub fn compute_chart_params(points: &[(f64, f64)]) -> (f64, f64) {
    let mut highest_wpm = 0.0;
    for &(_, wpm) in points {
        if wpm > highest_wpm {
            highest_wpm = wpm;
        }
    }

    let mut tests = points.last().map(|p| p.0).unwrap_or(1.0);
    if tests < 1.0 {
        tests = 1.0;
    }

    (tests, highest_wpm.round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(day: u32, wpm: u32) -> TypingRecord {
        TypingRecord {
            username: "a".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, day)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            wpm,
            accuracy: 100.0,
            duration_secs: 30,
            difficulty_level: 1,
        }
    }

    #[test]
    fn test_wpm_points_oldest_first() {
        let records = vec![record(3, 70), record(2, 60), record(1, 50)];
        assert_eq!(
            wpm_points(&records),
            vec![(1.0, 50.0), (2.0, 60.0), (3.0, 70.0)]
        );
    }

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&[]);
        assert_eq!(x, 1.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_compute_chart_params() {
        let (x, y) = compute_chart_params(&[(1.0, 40.0), (2.0, 62.4), (3.0, 55.0)]);
        assert_eq!(x, 3.0);
        assert_eq!(y, 62.0);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
