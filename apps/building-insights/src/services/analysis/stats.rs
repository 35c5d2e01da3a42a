use statrs::statistics::Statistics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; `None` below two readings.
    pub std_dev: Option<f64>,
}

pub fn summarize(values: &[f64]) -> Option<Summary> {
    if values.is_empty() {
        return None;
    }
    let mean = values.iter().mean();
    let median = median(values)?;
    let min = Statistics::min(values.iter());
    let max = Statistics::max(values.iter());
    let std_dev = if values.len() >= 2 {
        finite(values.iter().std_dev())
    } else {
        None
    };
    if !mean.is_finite() || !min.is_finite() || !max.is_finite() {
        return None;
    }
    Some(Summary {
        count: values.len(),
        mean,
        median,
        min,
        max,
        std_dev,
    })
}

pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `count / total` as a percentage rounded to one decimal; zero when `total` is zero.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(count as f64 / total as f64 * 100.0, 1)
}

pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_with_sample_std_dev() {
        let summary = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).expect("summary");
        assert_eq!(summary.count, 8);
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.median, 4.5);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        let std = summary.std_dev.expect("std");
        assert!((std - 2.138_089_935).abs() < 1e-6);
    }

    #[test]
    fn single_reading_has_no_std_dev() {
        let summary = summarize(&[420.0]).expect("summary");
        assert_eq!(summary.median, 420.0);
        assert_eq!(summary.std_dev, None);
        assert!(summarize(&[]).is_none());
    }

    #[test]
    fn rounds_and_percentages() {
        assert_eq!(round_to(651.276, 2), 651.28);
        assert_eq!(round_to(72.46, 1), 72.5);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(0, 0), 0.0);
    }
}
