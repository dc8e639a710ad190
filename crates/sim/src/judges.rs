use rand::Rng;
use skijump_shared::*;

use crate::scoring::round_to;

/// What the judges see of a jump.
#[derive(Debug, Clone, Copy)]
pub struct LandingView {
    pub distance: f64,
    pub k: f64,
    pub hill_size: f64,
    pub telemark_skill: f64,
    pub timing_error_s: f64,
}

/// Probability of a clean telemark; deep landings are harder to hold.
pub fn telemark_probability(view: &LandingView) -> f64 {
    let base = (view.telemark_skill / 100.0).clamp(0.0, 1.0);
    let hs = view.hill_size;
    let factor = if view.distance > 0.95 * hs {
        0.7
    } else if view.distance > 0.9 * hs {
        0.85
    } else {
        1.0
    };
    base * factor
}

/// Five seeded judge marks on the 0.5 grid.
pub fn judge_marks<R: Rng + ?Sized>(view: &LandingView, rng: &mut R, scoring: &ScoringConfig) -> JudgeMarks {
    let telemark = rng.gen_bool(telemark_probability(view));
    let mut marks = [0.0; JUDGE_COUNT];
    for mark in marks.iter_mut() {
        let mut m = if scoring.judge_base_max > scoring.judge_base_min {
            rng.gen_range(scoring.judge_base_min..=scoring.judge_base_max)
        } else {
            scoring.judge_base_min
        };
        if telemark {
            m += 0.5 * rng.gen_range(0.7..=1.0);
        }
        if view.timing_error_s.abs() > 0.05 {
            m -= (5.0 * view.timing_error_s.abs()).min(0.5) * rng.gen_range(0.5..=1.0);
        }
        if view.distance > 1.1 * view.k {
            m += rng.gen_range(0.1..=0.3);
        } else if view.distance < 0.9 * view.k {
            m -= rng.gen_range(0.1..=0.3);
        }
        *mark = round_to(m, 0.5).clamp(0.0, scoring.max_judge_mark);
    }
    JudgeMarks { marks, telemark }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn view(distance: f64) -> LandingView {
        LandingView {
            distance,
            k: 120.0,
            hill_size: 134.0,
            telemark_skill: 50.0,
            timing_error_s: 0.0,
        }
    }

    #[test]
    fn test_marks_on_half_point_grid() {
        let scoring = ScoringConfig::default();
        let mut rng = Pcg64::seed_from_u64(3);
        for d in [90.0, 120.0, 140.0] {
            let j = judge_marks(&view(d), &mut rng, &scoring);
            for m in j.marks {
                assert!((0.0..=20.0).contains(&m), "mark {}", m);
                assert_eq!((m * 2.0).fract(), 0.0, "mark {}", m);
            }
        }
    }

    #[test]
    fn test_seeded_marks_repeat() {
        let scoring = ScoringConfig::default();
        let a = judge_marks(&view(121.0), &mut Pcg64::seed_from_u64(11), &scoring);
        let b = judge_marks(&view(121.0), &mut Pcg64::seed_from_u64(11), &scoring);
        assert_eq!(a, b);
    }

    #[test]
    fn test_telemark_harder_near_hill_size() {
        let near_k = telemark_probability(&view(120.0));
        let deep = telemark_probability(&view(124.0));
        let deeper = telemark_probability(&view(130.0));
        assert_eq!(near_k, 0.5);
        assert!(deep < near_k);
        assert!(deeper < deep);
    }
}
