use rand::Rng;
use rand_distr::{Distribution, Normal};
use skijump_shared::*;

/// Standard deviation of the push timing error in seconds for a timing skill of 0-100.
pub fn timing_sigma(timing_skill: f64, cfg: &TimingConfig) -> f64 {
    ((cfg.sigma_at_zero_ms - cfg.sigma_slope_ms * timing_skill.clamp(0.0, 100.0)) / 1000.0).max(0.0)
}

/// Draws a signed timing error (s), negative meaning the push came early.
pub fn sample_timing_error<R: Rng + ?Sized>(timing_skill: f64, rng: &mut R, cfg: &TimingConfig) -> f64 {
    let sigma = timing_sigma(timing_skill, cfg);
    let error = Normal::new(0.0, sigma)
        .map(|dist| dist.sample(rng))
        .unwrap_or(0.0);
    error.clamp(-cfg.error_limit_s, cfg.error_limit_s)
}

/// Consequences of a timing error for a jumper reaching the edge at `takeoff_speed`.
pub fn takeoff_timing(error_s: f64, takeoff_speed: f64, cfg: &TimingConfig) -> TakeoffTiming {
    let arc_error_m = takeoff_speed * error_s;
    let early_shift_m = (-arc_error_m).clamp(0.0, cfg.max_early_shift_m);

    let magnitude_ratio = if cfg.magnitude_saturation_s > 0.0 {
        (error_s.abs() / cfg.magnitude_saturation_s).min(1.0)
    } else {
        1.0
    };
    let magnitude_scale = 1.0 - cfg.magnitude_max_loss * magnitude_ratio.powf(1.2);
    let vertical_efficiency =
        (1.0 - cfg.vertical_max_loss * arc_error_m.abs().min(1.0)).max(cfg.vertical_floor);

    let class = if error_s.abs() < cfg.perfect_window_s {
        TimingClass::Perfect
    } else if error_s < 0.0 {
        TimingClass::Early
    } else {
        TimingClass::Late
    };

    TakeoffTiming {
        error_s,
        arc_error_m,
        early_shift_m,
        magnitude_scale,
        vertical_efficiency,
        class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_zero_error_is_perfect() {
        let t = takeoff_timing(0.0, 25.0, &TimingConfig::default());
        assert_eq!(t, TakeoffTiming::perfect());
    }

    #[test]
    fn test_early_push_widens_takeoff_zone() {
        let cfg = TimingConfig::default();
        let t = takeoff_timing(-0.02, 25.0, &cfg);
        assert_eq!(t.class, TimingClass::Early);
        assert!((t.early_shift_m - 0.5).abs() < 1e-12);
        assert!(t.magnitude_scale < 1.0 && t.magnitude_scale > 0.75);
        assert!((t.vertical_efficiency - 0.875).abs() < 1e-12);

        let late = takeoff_timing(0.1, 25.0, &cfg);
        assert_eq!(late.class, TimingClass::Late);
        assert_eq!(late.early_shift_m, 0.0);
        assert!((late.magnitude_scale - 0.75).abs() < 1e-12);
        assert!((late.vertical_efficiency - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_skill_narrows_error() {
        let cfg = TimingConfig::default();
        assert!((timing_sigma(0.0, &cfg) - 0.06).abs() < 1e-12);
        assert!((timing_sigma(100.0, &cfg) - 0.01).abs() < 1e-12);

        let spread = |skill: f64| {
            let mut rng = Pcg64::seed_from_u64(7);
            (0..2000)
                .map(|_| sample_timing_error(skill, &mut rng, &cfg).abs())
                .sum::<f64>()
                / 2000.0
        };
        assert!(spread(100.0) < spread(0.0));
    }

    #[test]
    fn test_error_is_clamped() {
        let cfg = TimingConfig {
            sigma_at_zero_ms: 5000.0,
            ..Default::default()
        };
        let mut rng = Pcg64::seed_from_u64(1);
        for _ in 0..200 {
            let e = sample_timing_error(0.0, &mut rng, &cfg);
            assert!(e.abs() <= cfg.error_limit_s);
        }
    }
}
