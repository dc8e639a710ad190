use skijump_shared::*;

use crate::hill_profile::HillProfile;

/// Metrics describing the shape of one jump.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightMetrics {
    /// Seconds from the gate to the table edge.
    pub inrun_time: f64,
    /// Seconds between leaving the table and touchdown.
    pub flight_time: f64,
    pub takeoff_speed: f64,
    /// Greatest height above the landing profile during flight.
    pub max_height: f64,
    /// Distance (m) at which the greatest height was reached.
    pub max_height_distance: f64,
    pub max_speed: f64,
    pub landing_speed: f64,
    /// Profile distance covered between touchdown and rest.
    pub outrun_distance: f64,
}

/// Analyze a jump result and compute flight metrics.
///
/// Works on sparse trajectories too; the apex is then only as good as the samples.
pub fn analyze(profile: &HillProfile, result: &JumpResult) -> FlightMetrics {
    let samples = &result.trajectory;
    let edge_time = samples
        .iter()
        .find(|s| s.phase == Phase::Flight)
        .map(|s| s.t)
        .unwrap_or(0.0);

    let mut max_height = 0.0f64;
    let mut max_height_x = 0.0f64;
    let mut max_speed = 0.0f64;
    for s in samples {
        max_speed = max_speed.max(s.speed());
        if s.phase == Phase::Flight {
            let clearance = s.y - profile.height(s.x);
            if clearance > max_height {
                max_height = clearance;
                max_height_x = s.x;
            }
        }
    }

    let stop_x = samples
        .last()
        .filter(|s| s.phase == Phase::Stopped)
        .map(|s| s.x)
        .unwrap_or(result.touchdown.x);

    FlightMetrics {
        inrun_time: edge_time,
        flight_time: (result.touchdown.time - edge_time).max(0.0),
        takeoff_speed: result.takeoff_speed,
        max_height,
        max_height_distance: if max_height > 0.0 {
            profile.distance(max_height_x)
        } else {
            0.0
        },
        max_speed,
        landing_speed: result.touchdown.speed,
        outrun_distance: (profile.distance(stop_x) - result.touchdown.distance).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jump_loop::run_jump_on;
    use skijump_shared::catalog;

    #[test]
    fn test_metrics_plausible() {
        let hill = catalog::large_hill();
        let profile = HillProfile::new(&hill, &JumpContext::for_hill(&hill)).unwrap();
        let jumper = Jumper::new("Test", "JUMPER");
        let result = run_jump_on(
            &profile,
            &jumper,
            hill.middle_gate(),
            &JumpConditions::perfect(),
            &EngineConfig::default(),
        )
        .unwrap();
        let m = analyze(&profile, &result);
        assert!(m.inrun_time > 3.0, "inrun {}", m.inrun_time);
        assert!(m.flight_time > 3.0 && m.flight_time < 8.0, "flight {}", m.flight_time);
        assert!(m.max_height > 1.0 && m.max_height < 10.0, "height {}", m.max_height);
        assert!(m.max_height_distance < result.touchdown.distance);
        assert!(m.landing_speed > m.takeoff_speed);
        assert!(m.outrun_distance > 0.0);
    }
}
