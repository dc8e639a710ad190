use std::sync::atomic::AtomicBool;
use std::sync::mpsc;

use proptest::prelude::*;
use skijump_shared::catalog;
use skijump_shared::*;
use skijump_sim::{run_jump, Competition, CompetitionSettings, NullSink};

fn sparse() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.physics.record_trajectory = false;
    config
}

fn default_jumper() -> Jumper {
    Jumper::new("Default", "JUMPER")
}

#[test]
fn test_higher_gate_is_faster_and_longer() {
    let hill = catalog::large_hill();
    let jumper = default_jumper();
    let config = sparse();
    let mut prev: Option<JumpResult> = None;
    for gate in 1..=hill.gates {
        let r = run_jump(&jumper, &hill, gate, &JumpConditions::perfect(), &config).unwrap();
        if let Some(p) = &prev {
            assert!(
                r.takeoff_speed > p.takeoff_speed,
                "gate {} speed {} not above {}",
                gate,
                r.takeoff_speed,
                p.takeoff_speed
            );
            assert!(
                r.touchdown.distance > p.touchdown.distance,
                "gate {} distance {} not above {}",
                gate,
                r.touchdown.distance,
                p.touchdown.distance
            );
        }
        prev = Some(r);
    }
}

#[test]
fn test_mid_gate_lands_near_k_point() {
    let hill = catalog::large_hill();
    let result = run_jump(
        &default_jumper(),
        &hill,
        hill.middle_gate(),
        &JumpConditions::perfect(),
        &EngineConfig::default(),
    )
    .unwrap();
    assert!(
        (110.0..=130.0).contains(&result.distance),
        "landed at {} m",
        result.distance
    );
    assert_eq!(result.gate_points, 0.0);
    assert_eq!(result.wind_points, 0.0);
    // Around 60 distance points plus a near-60 style score.
    assert!(
        result.total > 95.0 && result.total < 140.0,
        "total {} (distance {}, style {})",
        result.total,
        result.distance_points,
        result.style_points
    );
}

#[test]
fn test_every_hill_lands_near_k_from_middle_gate() {
    for hill in catalog::hills() {
        let r = run_jump(&default_jumper(), &hill, hill.middle_gate(), &JumpConditions::perfect(), &sparse())
            .unwrap();
        let ratio = r.touchdown.distance / hill.k;
        assert!(ratio > 0.9 && ratio < 1.1, "{}: {} m", hill, r.touchdown.distance);
        assert!(r.touchdown.distance < hill.hill_size() * 1.05, "{}: {} m", hill, r.touchdown.distance);
    }
}

#[test]
fn test_halving_time_step_converges() {
    let hill = catalog::large_hill();
    let jumper = default_jumper();
    let mut coarse = sparse();
    coarse.physics.time_step = 0.005;
    let mut fine = sparse();
    fine.physics.time_step = 0.0025;
    let gate = hill.middle_gate();
    let a = run_jump(&jumper, &hill, gate, &JumpConditions::perfect(), &coarse).unwrap();
    let b = run_jump(&jumper, &hill, gate, &JumpConditions::perfect(), &fine).unwrap();
    let diff = (a.touchdown.distance - b.touchdown.distance).abs();
    assert!(diff < 0.1, "dt halving moved the landing by {} m", diff);
    assert!((a.takeoff_speed - b.takeoff_speed).abs() < 1e-3);
}

#[test]
fn test_zero_lift_lands_shorter() {
    let hill = catalog::large_hill();
    let mut glider = default_jumper();
    glider.flight.lift = 0.6;
    let mut brick = default_jumper();
    brick.flight.lift = 0.0;

    let mut config = sparse();
    config.lift.max_bonus = 0.0;
    let gate = hill.middle_gate();
    let a = run_jump(&glider, &hill, gate, &JumpConditions::perfect(), &config).unwrap();
    let b = run_jump(&brick, &hill, gate, &JumpConditions::perfect(), &config).unwrap();
    assert!(b.touchdown.distance < a.touchdown.distance);
}

#[test]
fn test_out_of_range_gate_rejected() {
    let hill = catalog::normal_hill();
    for gate in [0, hill.gates + 1] {
        let err = run_jump(&default_jumper(), &hill, gate, &JumpConditions::perfect(), &EngineConfig::default())
            .unwrap_err();
        match err {
            SimulationError::InvalidConfiguration { context, reason } => {
                assert_eq!(context.jumper, "Default JUMPER");
                assert!(context.hill.contains("K-90"));
                assert!(reason.contains("gate"), "{}", reason);
            }
            other => panic!("expected invalid configuration, got {}", other),
        }
    }
}

#[test]
fn test_same_seed_same_jump() {
    let hill = catalog::normal_hill();
    let jumper = catalog::jumpers().remove(1);
    let conditions = JumpConditions {
        wind: 0.7,
        perfect_timing: false,
        seed: 1234,
    };
    let a = run_jump(&jumper, &hill, 9, &conditions, &EngineConfig::default()).unwrap();
    let b = run_jump(&jumper, &hill, 9, &conditions, &EngineConfig::default()).unwrap();
    assert_eq!(a.touchdown, b.touchdown);
    assert_eq!(a.judges, b.judges);
    assert_eq!(a.total, b.total);
    assert_eq!(a.trajectory, b.trajectory);
}

#[test]
fn test_timing_errors_spread_results() {
    let hill = catalog::normal_hill();
    let jumper = default_jumper();
    let distances: Vec<f64> = (0..8)
        .map(|seed| {
            run_jump(&jumper, &hill, 9, &JumpConditions::calm(seed), &sparse())
                .unwrap()
                .touchdown
                .distance
        })
        .collect();
    let min = distances.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = distances.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(max > min, "{:?}", distances);
}

#[test]
fn test_jump_result_serde_roundtrip() {
    let hill = catalog::normal_hill();
    let result = run_jump(&default_jumper(), &hill, 3, &JumpConditions::calm(2), &sparse()).unwrap();
    let json = serde_json::to_string(&result).unwrap();
    let back: JumpResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.distance, result.distance);
    assert_eq!(back.judges, result.judges);
    assert_eq!(back.timing.class, result.timing.class);
    assert!((back.total - result.total).abs() < 1e-9);
    assert_eq!(back.trajectory.len(), result.trajectory.len());
    assert_eq!(back.trajectory.last().map(|s| s.phase), Some(Phase::Stopped));
}

fn field(n: usize) -> Vec<Jumper> {
    let base = catalog::jumpers();
    (0..n)
        .map(|i| {
            let mut j = base[i % base.len()].clone();
            j.name = format!("{}{}", j.name, i);
            j
        })
        .collect()
}

#[test]
fn test_forty_five_entrants_thirty_advance() {
    let hill = catalog::normal_hill();
    let settings = CompetitionSettings {
        gate: hill.middle_gate(),
        seed: 99,
        ..Default::default()
    };
    let mut c = Competition::new(&hill, field(45), settings, sparse()).unwrap();
    while c.phase() != CompetitionPhase::Round1Complete {
        c.step(&mut NullSink).unwrap();
    }

    let advancing = c.advancing().to_vec();
    assert_eq!(advancing.len(), 30);
    let r1 = |i: usize| c.results(1)[i].as_ref().unwrap().total;
    for pair in advancing.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(r1(a) > r1(b) || (r1(a) == r1(b) && a < b), "{} before {}", a, b);
    }
    let cutoff = r1(advancing[29]);
    for i in (0..45).filter(|i| !advancing.contains(i)) {
        assert!(r1(i) < cutoff || (r1(i) == cutoff && i > advancing[29]));
    }

    c.run(&mut NullSink, &AtomicBool::new(false)).unwrap();
    assert_eq!(c.phase(), CompetitionPhase::Completed);
    let finalists = c.results(2).iter().filter(|r| r.is_some()).count();
    assert_eq!(finalists, 30);

    let ranking = c.final_ranking();
    assert_eq!(ranking.len(), 45);
    for pair in ranking[..30].windows(2) {
        assert!(c.total(pair[0]) >= c.total(pair[1]));
    }
    // Finalists always rank ahead of those cut after round 1.
    assert!(ranking[..30].iter().all(|i| advancing.contains(i)));
}

#[test]
fn test_parallel_round_matches_sequential() {
    let hill = catalog::normal_hill();
    let settings = CompetitionSettings {
        gate: 7,
        wind: 0.5,
        wind_variation: 1.0,
        seed: 3,
        ..Default::default()
    };
    let mut sequential = Competition::new(&hill, field(12), settings.clone(), sparse()).unwrap();
    sequential.run(&mut NullSink, &AtomicBool::new(false)).unwrap();

    let mut config = sparse();
    config.competition.parallel = true;
    let mut parallel = Competition::new(&hill, field(12), settings, config).unwrap();
    parallel.run(&mut NullSink, &AtomicBool::new(false)).unwrap();

    assert_eq!(sequential.final_ranking(), parallel.final_ranking());
    for i in 0..12 {
        assert_eq!(sequential.total(i), parallel.total(i));
    }
}

#[test]
fn test_standings_stream_over_channel() {
    let hill = catalog::normal_hill();
    let settings = CompetitionSettings {
        gate: hill.middle_gate(),
        ..Default::default()
    };
    let (mut tx, rx) = mpsc::channel::<Standings>();
    let mut c = Competition::new(&hill, field(4), settings, sparse()).unwrap();
    c.run(&mut tx, &AtomicBool::new(false)).unwrap();
    drop(tx);

    let snapshots: Vec<Standings> = rx.iter().collect();
    assert_eq!(snapshots.len(), 4 + 1 + 4);
    let last = snapshots.last().unwrap();
    assert_eq!(last.phase, CompetitionPhase::Completed);
    assert_eq!(last.jumps_completed, 8);
    for pair in last.entries.windows(2) {
        assert!(pair[0].total >= pair[1].total);
    }
    assert_eq!(last.entries[0].rank, Some(1));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn takeoff_speed_grows_with_gate(hill_idx in 0usize..3, a in 1u32..=18, b in 1u32..=18) {
        prop_assume!(a != b);
        let hill = catalog::hills().remove(hill_idx);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let jumper = default_jumper();
        let config = sparse();
        let slow = run_jump(&jumper, &hill, lo, &JumpConditions::perfect(), &config).unwrap();
        let fast = run_jump(&jumper, &hill, hi, &JumpConditions::perfect(), &config).unwrap();
        prop_assert!(fast.takeoff_speed > slow.takeoff_speed);
        prop_assert!(fast.touchdown.distance > slow.touchdown.distance);
        prop_assert!(fast.gate_points < slow.gate_points);
    }
}
