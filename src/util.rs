pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Clamp that tolerates an inverted range by collapsing it onto `min`.
pub fn clamp_f32(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        return min;
    }
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_mean_mixed_values() {
        assert_eq!(mean(&[-10.0, 0.0, 10.0]), Some(0.0));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(93.756, 2), 93.76);
        assert_eq!(round_to(90.0, 2), 90.0);
        assert_eq!(round_to(33.333333, 1), 33.3);
    }

    #[test]
    fn test_clamp_f32() {
        assert_eq!(clamp_f32(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_f32(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_f32(11.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp_f32(3.0, 0.0, -2.0), 0.0);
    }
}
