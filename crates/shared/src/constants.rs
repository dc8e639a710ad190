// Physics
pub const GRAVITY: f64 = 9.81;
pub const AIR_DENSITY: f64 = 1.225;

// Integration
pub const TIME_STEP: f64 = 0.005;
pub const MAX_STEPS: u32 = 400_000;
/// Metres before the table edge where the jumper switches to the takeoff posture.
pub const TAKEOFF_ZONE: f64 = 3.0;
/// Duration of the takeoff push, used to turn the takeoff force into an impulse.
pub const TAKEOFF_CONTACT_TIME: f64 = 0.1;
/// Below this speed on the outrun the jumper is considered stopped.
pub const STOP_SPEED: f64 = 0.5;

// Jumper defaults
pub const DEFAULT_MASS: f64 = 60.0;
pub const DEFAULT_HEIGHT: f64 = 1.7;
pub const DEFAULT_TAKEOFF_FORCE: f64 = 1500.0;
pub const DEFAULT_TELEMARK: f64 = 50.0;
pub const DEFAULT_TIMING: f64 = 50.0;

pub const DEFAULT_INRUN_DRAG: f64 = 0.46;
pub const DEFAULT_INRUN_AREA: f64 = 0.42;
pub const DEFAULT_INRUN_LIFT: f64 = 0.0;

pub const DEFAULT_TAKEOFF_DRAG: f64 = 1.0;
pub const DEFAULT_TAKEOFF_AREA: f64 = 0.8;
pub const DEFAULT_TAKEOFF_LIFT: f64 = 0.0;

pub const DEFAULT_FLIGHT_DRAG: f64 = 0.5;
pub const DEFAULT_FLIGHT_AREA: f64 = 0.5;
pub const DEFAULT_FLIGHT_LIFT: f64 = 0.8;

pub const DEFAULT_LANDING_DRAG: f64 = 3.0;
pub const DEFAULT_LANDING_AREA: f64 = 1.0;
pub const DEFAULT_LANDING_LIFT: f64 = 0.0;

// Hill defaults
pub const DEFAULT_INRUN_FRICTION: f64 = 0.02;
pub const DEFAULT_OUTRUN_LENGTH: f64 = 100.0;

// Dynamic lift: the flight lift coefficient gains up to LIFT_BONUS_MAX
// as takeoff speed rises from LIFT_BONUS_LOW_SPEED to LIFT_BONUS_HIGH_SPEED (m/s).
pub const LIFT_BONUS_LOW_SPEED: f64 = 23.0;
pub const LIFT_BONUS_HIGH_SPEED: f64 = 26.0;
pub const LIFT_BONUS_MAX: f64 = 0.125;

// Takeoff timing
pub const TIMING_SIGMA_AT_ZERO_MS: f64 = 60.0;
pub const TIMING_SIGMA_SLOPE_MS: f64 = 0.5;
pub const TIMING_ERROR_LIMIT_S: f64 = 0.12;
pub const TIMING_PERFECT_WINDOW_S: f64 = 0.01;
pub const TIMING_MAX_EARLY_SHIFT_M: f64 = 1.0;

// Scoring
pub const K_POINT_POINTS: f64 = 60.0;
pub const JUDGE_COUNT: usize = 5;
pub const MAX_JUDGE_MARK: f64 = 20.0;
pub const FINAL_ROUND_SIZE: usize = 30;
pub const QUALIFICATION_LIMIT: usize = 50;
pub const QUALIFICATION_LIMIT_FLYING: usize = 40;
/// K-points at or above this are ski flying hills.
pub const FLYING_HILL_K: f64 = 170.0;

// Compensation
/// Metres of distance per metre of inrun length, per metre of K.
pub const GATE_FACTOR_PER_K: f64 = 0.035;
/// Tailwind is compensated this much more generously than headwind.
pub const TAILWIND_FACTOR_RATIO: f64 = 1.5;

/// FIS meter values: (upper K bound inclusive, points per metre).
pub const METER_VALUES: &[(f64, f64)] = &[
    (24.0, 4.8),
    (29.0, 4.4),
    (34.0, 4.0),
    (39.0, 3.6),
    (49.0, 3.2),
    (59.0, 2.8),
    (69.0, 2.4),
    (79.0, 2.2),
    (99.0, 2.0),
    (169.0, 1.8),
];
pub const METER_VALUE_FLYING: f64 = 1.2;
