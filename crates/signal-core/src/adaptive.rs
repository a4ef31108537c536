//! Adaptive threshold utilities for data-driven signal generation.
//!
//! Instead of hardcoded thresholds (e.g., "RSI > 70 = overbought"), these
//! functions derive thresholds from the data's own distribution using
//! percentile ranks and z-scores. The rule-based Predictor agent builds its
//! raw score from these primitives rather than a fixed lookup table.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Compute sample standard deviation.
pub fn std_dev(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    variance.sqrt()
}

/// Percentile rank of `value` within `data`, in [0, 1]. Ties count as half.
pub fn percentile_rank(value: f64, data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.5;
    }
    let count_below = data.iter().filter(|&&x| x < value).count();
    let count_equal = data
        .iter()
        .filter(|&&x| (x - value).abs() < f64::EPSILON)
        .count();
    (count_below as f64 + 0.5 * count_equal as f64) / data.len() as f64
}

/// Z-score of `value` relative to `data`. Zero if data has no variance.
pub fn z_score_of(value: f64, data: &[f64]) -> f64 {
    let sd = std_dev(data);
    if sd < f64::EPSILON {
        return 0.0;
    }
    (value - mean(data)) / sd
}

/// Convert a percentile (0-1) to a signal score in [-100, 100].
///
/// Values inside `[neutral_low, neutral_high]` map to 0 (dead zone); values
/// above/below scale linearly out to +/-100. `invert` flips the sign.
pub fn percentile_to_signal(percentile: f64, neutral_low: f64, neutral_high: f64, invert: bool) -> f64 {
    let raw = if percentile > neutral_high {
        ((percentile - neutral_high) / (1.0 - neutral_high)) * 100.0
    } else if percentile < neutral_low {
        -((neutral_low - percentile) / neutral_low) * 100.0
    } else {
        0.0
    };
    if invert {
        -raw
    } else {
        raw
    }
}

/// Convert a z-score to a signal weight (1-4): larger deviations get more
/// weight.
pub fn z_score_to_weight(z: f64) -> i32 {
    let abs_z = z.abs();
    if abs_z > 2.5 {
        4
    } else if abs_z > 1.5 {
        3
    } else if abs_z > 1.0 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_rank() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile_rank(3.0, &data) - 0.5).abs() < 0.01);
        assert!(percentile_rank(5.0, &data) > 0.8);
        assert!(percentile_rank(1.0, &data) < 0.2);
    }

    #[test]
    fn test_z_score() {
        let data = vec![10.0, 20.0, 30.0, 40.0, 50.0];
        let z = z_score_of(30.0, &data);
        assert!(z.abs() < 0.01);
    }

    #[test]
    fn test_percentile_to_signal() {
        assert!(percentile_to_signal(0.9, 0.25, 0.75, false) > 0.0);
        assert!(percentile_to_signal(0.1, 0.25, 0.75, false) < 0.0);
        assert!(percentile_to_signal(0.5, 0.25, 0.75, false).abs() < 0.01);
        assert!(percentile_to_signal(0.9, 0.25, 0.75, true) < 0.0);
    }
}
