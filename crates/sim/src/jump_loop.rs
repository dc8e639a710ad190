use rand::SeedableRng;
use rand_pcg::Pcg64;
use skijump_shared::*;
use tracing::debug;

use crate::compensation::compensate;
use crate::hill_profile::HillProfile;
use crate::judges::{judge_marks, LandingView};
use crate::physics::JumpState;
use crate::scoring::{distance_points, round_distance, style_points, ScoreCard};
use crate::timing::{sample_timing_error, takeoff_timing};

/// Physical outcome of a jump before scoring.
#[derive(Debug, Clone)]
pub struct FlightOutcome {
    pub takeoff_speed: f64,
    pub flight_lift: f64,
    pub touchdown: Touchdown,
    /// Where the jumper came to rest (or left the end of the outrun).
    pub stop: TrajectorySample,
    pub steps: u32,
    pub trajectory: Vec<TrajectorySample>,
}

fn check_finite_range(
    value: f64,
    min: f64,
    name: &str,
    context: &JumpContext,
) -> Result<(), SimulationError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(SimulationError::invalid(
            context.clone(),
            format!("jumper {} must be a finite number >= {}", name, min),
        ))
    }
}

/// Rejects jumper records the integrator cannot use.
pub fn validate_jumper(jumper: &Jumper, context: &JumpContext) -> Result<(), SimulationError> {
    if !(jumper.mass.is_finite() && jumper.mass > 0.0) {
        return Err(SimulationError::invalid(context.clone(), "jumper mass must be positive"));
    }
    check_finite_range(jumper.height, 0.0, "height", context)?;
    for (phase, c) in [
        ("inrun", &jumper.inrun),
        ("takeoff", &jumper.takeoff),
        ("flight", &jumper.flight),
        ("landing", &jumper.landing),
    ] {
        check_finite_range(c.drag, 0.0, &format!("{} drag", phase), context)?;
        check_finite_range(c.frontal_area, 0.0, &format!("{} frontal area", phase), context)?;
        if !c.lift.is_finite() {
            return Err(SimulationError::invalid(
                context.clone(),
                format!("jumper {} lift is not a finite number", phase),
            ));
        }
    }
    check_finite_range(jumper.takeoff_force, 0.0, "takeoff force", context)?;
    check_finite_range(jumper.telemark, 0.0, "telemark", context)?;
    check_finite_range(jumper.timing, 0.0, "timing", context)?;
    Ok(())
}

/// Speed at the table edge with a perfectly timed push; seeds the timing model.
pub fn estimate_takeoff_speed(
    profile: &HillProfile,
    jumper: &Jumper,
    start_distance: f64,
    config: &EngineConfig,
    context: &JumpContext,
) -> Result<f64, SimulationError> {
    let mut state = JumpState::new(
        profile,
        jumper,
        start_distance,
        TakeoffTiming::perfect(),
        0.0,
        config,
        context.clone(),
    )?;
    state.run_until(Phase::Flight)?;
    Ok(state.takeoff_speed.unwrap_or_default())
}

/// Integrates a jump from the start gate until the jumper stops.
pub fn simulate_flight(
    profile: &HillProfile,
    jumper: &Jumper,
    start_distance: f64,
    timing: TakeoffTiming,
    wind: f64,
    config: &EngineConfig,
    context: &JumpContext,
) -> Result<FlightOutcome, SimulationError> {
    let mut state = JumpState::new(profile, jumper, start_distance, timing, wind, config, context.clone())?;
    let record = config.physics.record_trajectory;
    let mut trajectory = vec![state.snapshot()];

    while !state.is_terminal() {
        let before = state.phase;
        state.step()?;
        if record || state.phase != before {
            trajectory.push(state.snapshot());
        }
    }

    // A jump that stops has passed the edge and touched down.
    let (takeoff_speed, touchdown) = match (state.takeoff_speed, state.touchdown) {
        (Some(v), Some(t)) => (v, t),
        _ => {
            return Err(SimulationError::NonConvergence {
                context: context.clone(),
                phase: state.phase,
                steps: state.steps,
            })
        }
    };

    Ok(FlightOutcome {
        takeoff_speed,
        flight_lift: state.flight_lift(),
        touchdown,
        stop: state.snapshot(),
        steps: state.steps,
        trajectory,
    })
}

/// Simulates and scores one jump on `hill`.
pub fn run_jump(
    jumper: &Jumper,
    hill: &Hill,
    gate: u32,
    conditions: &JumpConditions,
    config: &EngineConfig,
) -> Result<JumpResult, SimulationError> {
    let context = JumpContext::new(jumper, hill);
    let profile = HillProfile::new(hill, &context)?;
    run_jump_on(&profile, jumper, gate, conditions, config)
}

/// Same as [`run_jump`] with the hill geometry already built, for repeated jumps.
pub fn run_jump_on(
    profile: &HillProfile,
    jumper: &Jumper,
    gate: u32,
    conditions: &JumpConditions,
    config: &EngineConfig,
) -> Result<JumpResult, SimulationError> {
    let hill = profile.hill();
    let context = JumpContext::new(jumper, hill);
    validate_jumper(jumper, &context)?;
    let comp = compensate(hill, gate, conditions.wind, config, &context)?;
    let start = comp.setting.start_distance;

    let mut rng = Pcg64::seed_from_u64(conditions.seed);
    let timing = if conditions.perfect_timing {
        TakeoffTiming::perfect()
    } else {
        let error = sample_timing_error(jumper.timing, &mut rng, &config.timing);
        let estimate = estimate_takeoff_speed(profile, jumper, start, config, &context)?;
        takeoff_timing(error, estimate, &config.timing)
    };

    let flight = simulate_flight(profile, jumper, start, timing, conditions.wind, config, &context)?;

    let distance = round_distance(flight.touchdown.distance, &config.scoring);
    let judges = judge_marks(
        &LandingView {
            distance,
            k: hill.k,
            hill_size: hill.hill_size(),
            telemark_skill: jumper.telemark,
            timing_error_s: timing.error_s,
        },
        &mut rng,
        &config.scoring,
    );
    let card = ScoreCard {
        distance_points: distance_points(distance, hill.k, &config.scoring),
        style_points: style_points(&judges.marks),
        gate_points: comp.gate_points,
        wind_points: comp.wind_points,
    };

    debug!(
        jumper = %context.jumper,
        hill = %context.hill,
        gate,
        speed_kmh = flight.takeoff_speed * 3.6,
        distance,
        total = card.total(),
        timing = ?timing.class,
        "jump resolved"
    );

    Ok(JumpResult {
        jumper: context.jumper,
        hill: context.hill,
        gate,
        wind: conditions.wind,
        takeoff_speed: flight.takeoff_speed,
        timing,
        touchdown: flight.touchdown,
        distance,
        distance_points: card.distance_points,
        judges,
        style_points: card.style_points,
        gate_points: card.gate_points,
        wind_points: card.wind_points,
        total: card.total(),
        trajectory: flight.trajectory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use skijump_shared::catalog;

    #[test]
    fn test_jump_completes() {
        let hill = catalog::large_hill();
        let jumper = Jumper::new("Test", "JUMPER");
        let result = run_jump(&jumper, &hill, hill.middle_gate(), &JumpConditions::perfect(), &EngineConfig::default())
            .unwrap();
        assert!(result.distance > 0.0);
        assert!(!result.trajectory.is_empty());
        assert_eq!(result.trajectory[0].phase, Phase::Inrun);
        assert_eq!(result.trajectory.last().unwrap().phase, Phase::Stopped);
        assert_eq!(result.jumper, "Test JUMPER");
        assert_eq!(result.hill, "Large Hill K-120 HS134");
    }

    #[test]
    fn test_trajectory_time_increases() {
        let hill = catalog::normal_hill();
        let jumper = Jumper::new("Test", "JUMPER");
        let result = run_jump(&jumper, &hill, 5, &JumpConditions::calm(9), &EngineConfig::default()).unwrap();
        for pair in result.trajectory.windows(2) {
            assert!(pair[1].t >= pair[0].t);
        }
    }

    #[test]
    fn test_sparse_trajectory_keeps_phase_changes() {
        let hill = catalog::normal_hill();
        let jumper = Jumper::new("Test", "JUMPER");
        let mut config = EngineConfig::default();
        config.physics.record_trajectory = false;
        let result = run_jump(&jumper, &hill, 5, &JumpConditions::perfect(), &config).unwrap();
        let phases: Vec<Phase> = result.trajectory.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![Phase::Inrun, Phase::Takeoff, Phase::Flight, Phase::Landing, Phase::Stopped]
        );
    }

    #[test]
    fn test_invalid_jumper_rejected() {
        let hill = catalog::normal_hill();
        let mut jumper = Jumper::new("Test", "JUMPER");
        jumper.mass = -1.0;
        let err = run_jump(&jumper, &hill, 5, &JumpConditions::perfect(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidConfiguration { .. }));
        assert_eq!(err.context().jumper, "Test JUMPER");
    }
}
