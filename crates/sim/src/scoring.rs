use skijump_shared::*;

/// Points per metre for a hill, from the FIS table by K-point.
pub fn meter_value(k: f64, scoring: &ScoringConfig) -> f64 {
    if let Some(v) = scoring.meter_value {
        return v;
    }
    METER_VALUES
        .iter()
        .find(|(upper, _)| k <= *upper)
        .map(|(_, v)| *v)
        .unwrap_or(METER_VALUE_FLYING)
}

/// Rounds to the nearest multiple of `step`; a zero step leaves the value alone.
pub fn round_to(value: f64, step: f64) -> f64 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

pub fn round_distance(distance: f64, scoring: &ScoringConfig) -> f64 {
    round_to(distance, scoring.distance_rounding)
}

/// Linear in distance, `k_point_points` at K.
pub fn distance_points(distance: f64, k: f64, scoring: &ScoringConfig) -> f64 {
    scoring.k_point_points + (distance - k) * meter_value(k, scoring)
}

/// Sum of the judge marks without the single highest and single lowest.
pub fn style_points(marks: &[f64]) -> f64 {
    if marks.len() < 3 {
        return marks.iter().sum();
    }
    let mut sorted = marks.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted[1..sorted.len() - 1].iter().sum()
}

/// Point components of a single jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCard {
    pub distance_points: f64,
    pub style_points: f64,
    pub gate_points: f64,
    pub wind_points: f64,
}

impl ScoreCard {
    pub fn total(&self) -> f64 {
        let raw = self.distance_points + self.style_points + self.gate_points + self.wind_points;
        // Published totals carry one decimal.
        round_to(raw, 0.1).max(0.0)
    }
}

/// Entry indices ordered by total, best first. Equal totals keep their input order.
pub fn ranking_order(totals: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|&a, &b| totals[b].total_cmp(&totals[a]));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_k_point_is_sixty() {
        let scoring = ScoringConfig::default();
        for k in [90.0, 120.0, 200.0] {
            assert_eq!(distance_points(k, k, &scoring), 60.0);
        }
    }

    #[test]
    fn test_distance_points_linear() {
        let scoring = ScoringConfig::default();
        assert_eq!(meter_value(120.0, &scoring), 1.8);
        assert_eq!(meter_value(90.0, &scoring), 2.0);
        assert_eq!(meter_value(200.0, &scoring), 1.2);
        assert!((distance_points(130.0, 120.0, &scoring) - 78.0).abs() < 1e-9);
        assert!((distance_points(110.0, 120.0, &scoring) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_style_points_drop_extremes() {
        assert_eq!(style_points(&[18.5; 5]), 55.5);
        assert_eq!(style_points(&[20.0, 17.0, 18.0, 18.5, 19.0]), 55.5);
    }

    #[test]
    fn test_round_distance_half_metre() {
        let scoring = ScoringConfig::default();
        assert_eq!(round_distance(120.26, &scoring), 120.5);
        assert_eq!(round_distance(120.24, &scoring), 120.0);
    }

    #[test]
    fn test_ranking_is_stable() {
        let order = ranking_order(&[100.0, 120.0, 100.0, 130.0]);
        assert_eq!(order, vec![3, 1, 0, 2]);
    }

    proptest! {
        #[test]
        fn style_points_stay_in_bounds(marks in proptest::array::uniform5(0.0f64..=20.0)) {
            let points = style_points(&marks);
            prop_assert!((0.0..=60.0).contains(&points));
            let mut sorted = marks;
            sorted.sort_by(|a, b| a.total_cmp(b));
            prop_assert!(points >= 3.0 * sorted[0] - 1e-9);
            prop_assert!(points <= 3.0 * sorted[4] + 1e-9);
        }
    }
}
