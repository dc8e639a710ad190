use glam::DVec2;
use skijump_shared::*;
use tracing::debug;

use crate::aero::{aero_acceleration, drag_deceleration, effective_lift_coefficient, lift_acceleration};
use crate::hill_profile::HillProfile;
use crate::landing;

/// Full integrator state for one jump.
///
/// On the inrun and on the landing slope the jumper is bound to the snow and moves
/// in one dimension (`track`, `speed`); in the air position and velocity are free.
#[derive(Debug, Clone)]
pub struct JumpState<'a> {
    profile: &'a HillProfile,
    jumper: &'a Jumper,
    physics: PhysicsConfig,
    lift: LiftConfig,
    timing: TakeoffTiming,
    context: JumpContext,
    wind: f64,
    takeoff_zone_start: f64,
    flight_lift: f64,
    pub phase: Phase,
    pub time: f64,
    pub steps: u32,
    /// Metres left to the edge on the inrun, profile x on the landing slope.
    track: f64,
    speed: f64,
    position: DVec2,
    velocity: DVec2,
    pub takeoff_speed: Option<f64>,
    pub touchdown: Option<Touchdown>,
}

impl<'a> JumpState<'a> {
    pub fn new(
        profile: &'a HillProfile,
        jumper: &'a Jumper,
        start_distance: f64,
        timing: TakeoffTiming,
        wind: f64,
        config: &EngineConfig,
        context: JumpContext,
    ) -> Result<Self, SimulationError> {
        let physics = config.physics;
        if !(physics.time_step > 0.0 && physics.time_step.is_finite()) {
            return Err(SimulationError::invalid(context, "time step must be positive"));
        }
        if !(start_distance > 0.0 && start_distance.is_finite()) {
            return Err(SimulationError::invalid(context, "start must lie above the table edge"));
        }
        let takeoff_zone_start = physics.takeoff_zone.max(0.0) + timing.early_shift_m;
        let phase = if start_distance > takeoff_zone_start {
            Phase::Inrun
        } else {
            Phase::Takeoff
        };
        let mut state = Self {
            profile,
            jumper,
            physics,
            lift: config.lift,
            timing,
            context,
            wind,
            takeoff_zone_start,
            flight_lift: jumper.flight.lift,
            phase,
            time: 0.0,
            steps: 0,
            track: start_distance,
            speed: 0.0,
            position: DVec2::ZERO,
            velocity: DVec2::ZERO,
            takeoff_speed: None,
            touchdown: None,
        };
        state.sync_inrun_position();
        Ok(state)
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == Phase::Stopped
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Flight lift coefficient after the takeoff-speed adjustment.
    pub fn flight_lift(&self) -> f64 {
        self.flight_lift
    }

    pub fn snapshot(&self) -> TrajectorySample {
        TrajectorySample {
            t: self.time,
            x: self.position.x,
            y: self.position.y,
            vx: self.velocity.x,
            vy: self.velocity.y,
            phase: self.phase,
        }
    }

    /// Advance one integrator step.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        if self.is_terminal() {
            return Ok(());
        }
        if self.steps >= self.physics.max_steps {
            return Err(SimulationError::NonConvergence {
                context: self.context.clone(),
                phase: self.phase,
                steps: self.steps,
            });
        }
        self.steps += 1;
        let phase = self.phase;
        match phase {
            Phase::Inrun | Phase::Takeoff => self.step_inrun(phase),
            Phase::Flight => self.step_flight(),
            Phase::Landing => self.step_landing(),
            Phase::Stopped => {}
        }
        self.check_finite(phase)?;
        if self.phase != phase {
            debug!(
                jumper = %self.context.jumper,
                from = %phase,
                to = %self.phase,
                t = self.time,
                x = self.position.x,
                speed = self.velocity.length(),
                "phase transition"
            );
        }
        Ok(())
    }

    /// Steps until the jump reaches `phase` (or a later one).
    pub fn run_until(&mut self, phase: Phase) -> Result<(), SimulationError> {
        while self.phase < phase {
            self.step()?;
        }
        Ok(())
    }

    fn check_finite(&self, phase: Phase) -> Result<(), SimulationError> {
        let finite = self.position.is_finite()
            && self.velocity.is_finite()
            && self.track.is_finite()
            && self.speed.is_finite()
            && self.time.is_finite();
        if finite {
            Ok(())
        } else {
            Err(SimulationError::NumericalInstability {
                context: self.context.clone(),
                phase,
                time: self.time,
            })
        }
    }

    /// Body posture for a phase. Flight uses the speed-adjusted lift coefficient.
    fn posture(&self, phase: Phase) -> AeroCoefficients {
        match phase {
            Phase::Inrun => self.jumper.inrun,
            Phase::Takeoff => self.jumper.takeoff,
            Phase::Flight => AeroCoefficients {
                lift: self.flight_lift,
                ..self.jumper.flight
            },
            Phase::Landing | Phase::Stopped => self.jumper.landing,
        }
    }

    /// Acceleration along a snow surface inclined `angle` below horizontal with
    /// curvature `curvature` (positive where the surface is concave).
    fn surface_acceleration(&self, phase: Phase, angle: f64, curvature: f64, speed: f64) -> f64 {
        let g = self.physics.gravity;
        let rho = self.physics.air_density;
        let m = self.jumper.mass;
        let posture = self.posture(phase);
        let normal = g * angle.cos() + speed * speed * curvature
            - lift_acceleration(&posture, speed, m, rho);
        g * angle.sin()
            - self.profile.hill().inrun_friction_coefficient * normal.max(0.0)
            - drag_deceleration(&posture, speed, m, rho)
    }

    /// Acceleration in the air; wind is horizontal, positive blowing up the hill.
    fn flight_acceleration(&self, velocity: DVec2) -> DVec2 {
        let air = DVec2::new(-self.wind, 0.0);
        let posture = self.posture(Phase::Flight);
        DVec2::new(0.0, -self.physics.gravity)
            + aero_acceleration(&posture, velocity - air, self.jumper.mass, self.physics.air_density)
    }

    fn inrun_derivative(&self, phase: Phase, d: f64, v: f64) -> (f64, f64) {
        let angle = self.profile.inrun_angle(d);
        let curvature = self.profile.inrun_curvature(d);
        (-v, self.surface_acceleration(phase, angle, curvature, v))
    }

    fn step_inrun(&mut self, phase: Phase) {
        let dt = self.physics.time_step;
        let target = if phase == Phase::Inrun {
            self.takeoff_zone_start
        } else {
            0.0
        };
        let f = |d: f64, v: f64| self.inrun_derivative(phase, d, v);
        let (d1, v1) = rk4_surface(f, self.track, self.speed, dt);
        if d1 <= target {
            // Land exactly on the boundary so the posture switch does not depend on dt.
            let fraction = ((self.track - target) / (self.track - d1)).clamp(0.0, 1.0);
            let (_, v) = rk4_surface(f, self.track, self.speed, fraction * dt);
            self.track = target;
            self.speed = v;
            self.time += fraction * dt;
            if phase == Phase::Inrun {
                self.phase = Phase::Takeoff;
                self.sync_inrun_position();
            } else {
                self.leave_table();
            }
        } else {
            self.track = d1;
            self.speed = v1;
            self.time += dt;
            self.sync_inrun_position();
        }
    }

    fn sync_inrun_position(&mut self) {
        let theta = self.profile.inrun_angle(self.track);
        self.position = self.profile.inrun_point(self.track);
        self.velocity = self.speed * DVec2::new(theta.cos(), -theta.sin());
    }

    /// Table edge: the push adds an impulse along the table normal.
    fn leave_table(&mut self) {
        let v0 = self.speed;
        self.takeoff_speed = Some(v0);
        self.flight_lift = effective_lift_coefficient(self.jumper.flight.lift, v0, &self.lift);

        let impulse = self.jumper.takeoff_force * self.physics.takeoff_contact_time / self.jumper.mass
            * self.timing.magnitude_scale;
        let normal = self.profile.table_normal();
        let push = DVec2::new(normal.x, normal.y * self.timing.vertical_efficiency) * impulse;
        self.position = DVec2::ZERO;
        self.velocity = self.profile.table_direction() * v0 + push;
        self.phase = Phase::Flight;
    }

    fn step_flight(&mut self) {
        let dt = self.physics.time_step;
        let (p1, v1) = rk4_flight(|v| self.flight_acceleration(v), self.position, self.velocity, dt);
        match landing::detect_contact(self.profile, (self.position, self.velocity), (p1, v1)) {
            Some(contact) => {
                self.time += contact.fraction * dt;
                self.touchdown = Some(landing::touchdown(self.profile, self.time, &contact));
                self.track = contact.position.x;
                self.speed = landing::tangential_speed(self.profile, self.track, contact.velocity);
                self.phase = Phase::Landing;
                self.sync_landing_position();
            }
            None => {
                self.position = p1;
                self.velocity = v1;
                self.time += dt;
            }
        }
    }

    fn landing_derivative(&self, x: f64, v: f64) -> (f64, f64) {
        let slope = self.profile.slope(x);
        let cos = 1.0 / (1.0 + slope * slope).sqrt();
        let angle = (-slope).atan();
        let curvature = self.profile.second_derivative(x) * cos * cos * cos;
        (v * cos, self.surface_acceleration(Phase::Landing, angle, curvature, v))
    }

    fn step_landing(&mut self) {
        let dt = self.physics.time_step;
        let (x1, v1) = rk4_surface(|x, v| self.landing_derivative(x, v), self.track, self.speed, dt);
        self.time += dt;
        let end = self.profile.end_x();
        if v1 <= self.physics.stop_speed || x1 >= end {
            self.track = x1.min(end);
            self.speed = v1.max(0.0);
            self.phase = Phase::Stopped;
        } else {
            self.track = x1;
            self.speed = v1;
        }
        self.sync_landing_position();
    }

    fn sync_landing_position(&mut self) {
        let x = self.track;
        self.position = DVec2::new(x, self.profile.height(x));
        self.velocity = self.profile.tangent(x) * self.speed;
    }
}

/// Classic RK4 for a one-dimensional track coordinate and speed.
fn rk4_surface(f: impl Fn(f64, f64) -> (f64, f64), s: f64, v: f64, dt: f64) -> (f64, f64) {
    let (ds1, dv1) = f(s, v);
    let (ds2, dv2) = f(s + 0.5 * dt * ds1, v + 0.5 * dt * dv1);
    let (ds3, dv3) = f(s + 0.5 * dt * ds2, v + 0.5 * dt * dv2);
    let (ds4, dv4) = f(s + dt * ds3, v + dt * dv3);
    (
        s + dt / 6.0 * (ds1 + 2.0 * ds2 + 2.0 * ds3 + ds4),
        v + dt / 6.0 * (dv1 + 2.0 * dv2 + 2.0 * dv3 + dv4),
    )
}

/// RK4 for free flight where acceleration depends on velocity only.
fn rk4_flight(accel: impl Fn(DVec2) -> DVec2, p: DVec2, v: DVec2, dt: f64) -> (DVec2, DVec2) {
    let a1 = accel(v);
    let v2 = v + 0.5 * dt * a1;
    let a2 = accel(v2);
    let v3 = v + 0.5 * dt * a2;
    let a3 = accel(v3);
    let v4 = v + dt * a3;
    let a4 = accel(v4);
    (
        p + dt / 6.0 * (v + 2.0 * v2 + 2.0 * v3 + v4),
        v + dt / 6.0 * (a1 + 2.0 * a2 + 2.0 * a3 + a4),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use skijump_shared::catalog;

    fn profile(hill: &Hill) -> HillProfile {
        HillProfile::new(hill, &JumpContext::for_hill(hill)).unwrap()
    }

    fn state<'a>(p: &'a HillProfile, j: &'a Jumper, config: &EngineConfig) -> JumpState<'a> {
        let start = p.hill().gate_start(p.hill().middle_gate());
        JumpState::new(p, j, start, TakeoffTiming::perfect(), 0.0, config, JumpContext::new(j, p.hill()))
            .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let hill = catalog::large_hill();
        let p = profile(&hill);
        let j = Jumper::new("Test", "JUMPER");
        let s = state(&p, &j, &EngineConfig::default());
        assert_eq!(s.phase, Phase::Inrun);
        assert_eq!(s.steps, 0);
        assert!(s.position().x < 0.0 && s.position().y > 0.0);
        assert_eq!(s.velocity(), DVec2::ZERO);
    }

    #[test]
    fn test_phases_run_in_order() {
        let hill = catalog::large_hill();
        let p = profile(&hill);
        let j = Jumper::new("Test", "JUMPER");
        let mut s = state(&p, &j, &EngineConfig::default());
        let mut seen = vec![s.phase];
        while !s.is_terminal() {
            s.step().unwrap();
            if *seen.last().unwrap() != s.phase {
                seen.push(s.phase);
            }
        }
        assert_eq!(
            seen,
            vec![Phase::Inrun, Phase::Takeoff, Phase::Flight, Phase::Landing, Phase::Stopped]
        );
        assert!(s.takeoff_speed.is_some());
        assert!(s.touchdown.is_some());
    }

    #[test]
    fn test_takeoff_speed_realistic() {
        let hill = catalog::large_hill();
        let p = profile(&hill);
        let j = Jumper::new("Test", "JUMPER");
        let mut s = state(&p, &j, &EngineConfig::default());
        s.run_until(Phase::Flight).unwrap();
        let kmh = s.takeoff_speed.unwrap() * 3.6;
        assert!(kmh > 88.0 && kmh < 98.0, "takeoff at {} km/h", kmh);
        assert!(s.position() == DVec2::ZERO);
        assert!(s.velocity().y > -s.takeoff_speed.unwrap() * p.table_angle().sin());
        assert!(s.flight_lift() > j.flight.lift);
    }

    #[test]
    fn test_step_bound_reports_non_convergence() {
        let hill = catalog::large_hill();
        let p = profile(&hill);
        let j = Jumper::new("Test", "JUMPER");
        let mut config = EngineConfig::default();
        config.physics.max_steps = 100;
        let mut s = state(&p, &j, &config);
        let err = s.run_until(Phase::Stopped).unwrap_err();
        assert!(
            matches!(err, SimulationError::NonConvergence { phase: Phase::Inrun, steps: 100, .. }),
            "{}",
            err
        );
    }

    #[test]
    fn test_non_finite_state_is_instability() {
        let hill = catalog::large_hill();
        let p = profile(&hill);
        let mut j = Jumper::new("Test", "JUMPER");
        j.mass = 0.0;
        let mut s = state(&p, &j, &EngineConfig::default());
        let err = s.run_until(Phase::Stopped).unwrap_err();
        assert!(matches!(err, SimulationError::NumericalInstability { .. }), "{}", err);
    }

    #[test]
    fn test_headwind_carries_further() {
        let hill = catalog::large_hill();
        let p = profile(&hill);
        let j = Jumper::new("Test", "JUMPER");
        let config = EngineConfig::default();
        let start = hill.gate_start(hill.middle_gate());
        let fly = |wind: f64| {
            let mut s = JumpState::new(&p, &j, start, TakeoffTiming::perfect(), wind, &config, JumpContext::default())
                .unwrap();
            s.run_until(Phase::Landing).unwrap();
            s.touchdown.unwrap().distance
        };
        assert!(fly(2.0) > fly(0.0));
        assert!(fly(-2.0) < fly(0.0));
    }
}
