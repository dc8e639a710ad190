use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Drag, frontal area and lift for one body posture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AeroCoefficients {
    pub drag: f64,
    pub frontal_area: f64,
    pub lift: f64,
}

impl AeroCoefficients {
    pub fn inrun() -> Self {
        Self {
            drag: DEFAULT_INRUN_DRAG,
            frontal_area: DEFAULT_INRUN_AREA,
            lift: DEFAULT_INRUN_LIFT,
        }
    }

    pub fn takeoff() -> Self {
        Self {
            drag: DEFAULT_TAKEOFF_DRAG,
            frontal_area: DEFAULT_TAKEOFF_AREA,
            lift: DEFAULT_TAKEOFF_LIFT,
        }
    }

    pub fn flight() -> Self {
        Self {
            drag: DEFAULT_FLIGHT_DRAG,
            frontal_area: DEFAULT_FLIGHT_AREA,
            lift: DEFAULT_FLIGHT_LIFT,
        }
    }

    pub fn landing() -> Self {
        Self {
            drag: DEFAULT_LANDING_DRAG,
            frontal_area: DEFAULT_LANDING_AREA,
            lift: DEFAULT_LANDING_LIFT,
        }
    }

    /// Cd * A in m^2.
    pub fn drag_area(&self) -> f64 {
        self.drag * self.frontal_area
    }

    /// Cl * A in m^2.
    pub fn lift_area(&self) -> f64 {
        self.lift * self.frontal_area
    }
}

/// Immutable per-run snapshot of a jumper.
///
/// Deserializes from the flat catalog record; every coefficient left out of the record
/// resolves to its default from [`crate::constants`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JumperRecord", into = "JumperRecord")]
pub struct Jumper {
    pub name: String,
    pub surname: String,
    pub nationality: Option<String>,
    pub mass: f64,
    pub height: f64,
    pub inrun: AeroCoefficients,
    pub takeoff: AeroCoefficients,
    pub flight: AeroCoefficients,
    pub landing: AeroCoefficients,
    /// Takeoff push in newtons.
    pub takeoff_force: f64,
    /// Telemark landing skill, 0-100.
    pub telemark: f64,
    /// Takeoff timing precision, 0-100.
    pub timing: f64,
}

impl Jumper {
    pub fn new(name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            nationality: None,
            mass: DEFAULT_MASS,
            height: DEFAULT_HEIGHT,
            inrun: AeroCoefficients::inrun(),
            takeoff: AeroCoefficients::takeoff(),
            flight: AeroCoefficients::flight(),
            landing: AeroCoefficients::landing(),
            takeoff_force: DEFAULT_TAKEOFF_FORCE,
            telemark: DEFAULT_TELEMARK,
            timing: DEFAULT_TIMING,
        }
    }

    pub fn with_nationality(mut self, code: impl Into<String>) -> Self {
        self.nationality = Some(code.into());
        self
    }

    /// Identifier used in error messages and standings.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Jumper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.surname)
    }
}

/// Flat catalog layout of a jumper with optional coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JumperRecord {
    name: String,
    #[serde(alias = "last_name")]
    surname: String,
    #[serde(default)]
    nationality: Option<String>,
    #[serde(default)]
    mass: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
    #[serde(default)]
    inrun_drag_coefficient: Option<f64>,
    #[serde(default)]
    inrun_frontal_area: Option<f64>,
    #[serde(default)]
    inrun_lift_coefficient: Option<f64>,
    #[serde(default)]
    takeoff_drag_coefficient: Option<f64>,
    #[serde(default)]
    takeoff_frontal_area: Option<f64>,
    #[serde(default)]
    takeoff_lift_coefficient: Option<f64>,
    #[serde(default, alias = "jump_force")]
    takeoff_force: Option<f64>,
    #[serde(default)]
    flight_drag_coefficient: Option<f64>,
    #[serde(default)]
    flight_frontal_area: Option<f64>,
    #[serde(default)]
    flight_lift_coefficient: Option<f64>,
    #[serde(default)]
    landing_drag_coefficient: Option<f64>,
    #[serde(default)]
    landing_frontal_area: Option<f64>,
    #[serde(default)]
    landing_lift_coefficient: Option<f64>,
    #[serde(default)]
    telemark: Option<f64>,
    #[serde(default)]
    timing: Option<f64>,
}

fn resolve(
    drag: Option<f64>,
    area: Option<f64>,
    lift: Option<f64>,
    defaults: AeroCoefficients,
) -> AeroCoefficients {
    AeroCoefficients {
        drag: drag.unwrap_or(defaults.drag),
        frontal_area: area.unwrap_or(defaults.frontal_area),
        lift: lift.unwrap_or(defaults.lift),
    }
}

impl From<JumperRecord> for Jumper {
    fn from(r: JumperRecord) -> Self {
        Self {
            name: r.name,
            surname: r.surname,
            nationality: r.nationality,
            mass: r.mass.unwrap_or(DEFAULT_MASS),
            height: r.height.unwrap_or(DEFAULT_HEIGHT),
            inrun: resolve(
                r.inrun_drag_coefficient,
                r.inrun_frontal_area,
                r.inrun_lift_coefficient,
                AeroCoefficients::inrun(),
            ),
            takeoff: resolve(
                r.takeoff_drag_coefficient,
                r.takeoff_frontal_area,
                r.takeoff_lift_coefficient,
                AeroCoefficients::takeoff(),
            ),
            flight: resolve(
                r.flight_drag_coefficient,
                r.flight_frontal_area,
                r.flight_lift_coefficient,
                AeroCoefficients::flight(),
            ),
            landing: resolve(
                r.landing_drag_coefficient,
                r.landing_frontal_area,
                r.landing_lift_coefficient,
                AeroCoefficients::landing(),
            ),
            takeoff_force: r.takeoff_force.unwrap_or(DEFAULT_TAKEOFF_FORCE),
            telemark: r.telemark.unwrap_or(DEFAULT_TELEMARK),
            timing: r.timing.unwrap_or(DEFAULT_TIMING),
        }
    }
}

impl From<Jumper> for JumperRecord {
    fn from(j: Jumper) -> Self {
        Self {
            name: j.name,
            surname: j.surname,
            nationality: j.nationality,
            mass: Some(j.mass),
            height: Some(j.height),
            inrun_drag_coefficient: Some(j.inrun.drag),
            inrun_frontal_area: Some(j.inrun.frontal_area),
            inrun_lift_coefficient: Some(j.inrun.lift),
            takeoff_drag_coefficient: Some(j.takeoff.drag),
            takeoff_frontal_area: Some(j.takeoff.frontal_area),
            takeoff_lift_coefficient: Some(j.takeoff.lift),
            takeoff_force: Some(j.takeoff_force),
            flight_drag_coefficient: Some(j.flight.drag),
            flight_frontal_area: Some(j.flight.frontal_area),
            flight_lift_coefficient: Some(j.flight.lift),
            landing_drag_coefficient: Some(j.landing.drag),
            landing_frontal_area: Some(j.landing.frontal_area),
            landing_lift_coefficient: Some(j.landing.lift),
            telemark: Some(j.telemark),
            timing: Some(j.timing),
        }
    }
}

fn default_inrun_friction() -> f64 {
    DEFAULT_INRUN_FRICTION
}

fn default_outrun_length() -> f64 {
    DEFAULT_OUTRUN_LENGTH
}

/// Hill record following FIS construction-norm naming.
///
/// Inrun distances are measured along the inrun from the table edge; landing profile
/// coordinates put the table edge at the origin with y pointing up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hill {
    pub name: String,
    pub country: String,
    /// Inrun length from the highest gate to the table edge.
    pub e1: f64,
    /// Inrun length from the lowest gate to the table edge.
    pub e2: f64,
    pub gates: u32,
    /// Table length.
    pub t: f64,
    pub gamma_deg: f64,
    pub alpha_deg: f64,
    /// Radius of the inrun transition.
    pub r1: f64,
    /// Height difference between table edge and K-point.
    pub h: f64,
    /// Horizontal distance between table edge and K-point.
    pub n: f64,
    /// Table height above the knoll.
    pub s: f64,
    #[serde(rename = "betaP_deg")]
    pub beta_p_deg: f64,
    pub beta_deg: f64,
    #[serde(rename = "betaL_deg")]
    pub beta_l_deg: f64,
    /// Radius of the landing arc through P, K and L.
    pub rl: f64,
    #[serde(rename = "P")]
    pub p: f64,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(rename = "L")]
    pub l: f64,
    /// Height difference between table edge and the outrun floor.
    #[serde(rename = "Zu")]
    pub zu: f64,
    #[serde(default = "default_inrun_friction")]
    pub inrun_friction_coefficient: f64,
    /// Flat outrun length after the landing transition.
    #[serde(default = "default_outrun_length")]
    pub a_finish: f64,
}

impl Hill {
    /// HS, the L-point distance.
    pub fn hill_size(&self) -> f64 {
        self.l
    }

    pub fn is_flying_hill(&self) -> bool {
        self.k >= FLYING_HILL_K
    }

    /// Metres of inrun between neighbouring gates.
    pub fn gate_spacing(&self) -> f64 {
        if self.gates > 1 {
            (self.e1 - self.e2).abs() / (self.gates - 1) as f64
        } else {
            0.0
        }
    }

    /// Inrun length from `gate` to the table edge. Gate 1 is the lowest start.
    pub fn gate_start(&self, gate: u32) -> f64 {
        self.e2 + gate.saturating_sub(1) as f64 * self.gate_spacing()
    }

    /// Gate in the middle of the range, rounded down.
    pub fn middle_gate(&self) -> u32 {
        (self.gates + 1) / 2
    }

    pub fn id(&self) -> String {
        self.to_string()
    }
}

fn trim_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

impl fmt::Display for Hill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} K-{} HS{}",
            self.name,
            trim_number(self.k),
            trim_number(self.l)
        )
    }
}

/// Integrator phases in the order a jump passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Inrun,
    Takeoff,
    Flight,
    Landing,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Inrun => "inrun",
            Phase::Takeoff => "takeoff",
            Phase::Flight => "flight",
            Phase::Landing => "landing",
            Phase::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// One integrator step, in landing-profile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub phase: Phase,
}

impl TrajectorySample {
    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

/// External perturbations for a single jump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpConditions {
    /// Horizontal wind in m/s; positive blows up the hill (headwind).
    pub wind: f64,
    /// Disables the stochastic takeoff timing error.
    pub perfect_timing: bool,
    pub seed: u64,
}

impl Default for JumpConditions {
    fn default() -> Self {
        Self {
            wind: 0.0,
            perfect_timing: false,
            seed: 0,
        }
    }
}

impl JumpConditions {
    pub fn calm(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn perfect() -> Self {
        Self {
            perfect_timing: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingClass {
    Perfect,
    Early,
    Late,
}

/// How well the takeoff push was timed against the table edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TakeoffTiming {
    /// Signed timing error in seconds; negative is early.
    pub error_s: f64,
    /// Timing error expressed along the table, in metres.
    pub arc_error_m: f64,
    /// Extra metres of takeoff posture caused by an early push.
    pub early_shift_m: f64,
    pub magnitude_scale: f64,
    pub vertical_efficiency: f64,
    pub class: TimingClass,
}

impl TakeoffTiming {
    pub fn perfect() -> Self {
        Self {
            error_s: 0.0,
            arc_error_m: 0.0,
            early_shift_m: 0.0,
            magnitude_scale: 1.0,
            vertical_efficiency: 1.0,
            class: TimingClass::Perfect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgeMarks {
    pub marks: [f64; JUDGE_COUNT],
    pub telemark: bool,
}

/// Exact touchdown resolved between two integrator steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touchdown {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    /// Distance along the landing profile from the table edge.
    pub distance: f64,
}

/// Immutable outcome of one simulated jump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JumpResult {
    pub jumper: String,
    pub hill: String,
    pub gate: u32,
    pub wind: f64,
    pub takeoff_speed: f64,
    pub timing: TakeoffTiming,
    pub touchdown: Touchdown,
    /// Scored distance, rounded to the half metre.
    pub distance: f64,
    pub distance_points: f64,
    pub judges: JudgeMarks,
    pub style_points: f64,
    pub gate_points: f64,
    pub wind_points: f64,
    pub total: f64,
    pub trajectory: Vec<TrajectorySample>,
}

impl JumpResult {
    pub fn compensation_points(&self) -> f64 {
        self.gate_points + self.wind_points
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionMode {
    /// Two rounds; the best of round one advance to the final round.
    Individual,
    /// One round; the best advance to the main competition.
    Qualification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitionPhase {
    NotStarted,
    Round1InProgress,
    Round1Complete,
    Round2InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundScore {
    pub distance: f64,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    /// None for disqualified jumpers.
    pub rank: Option<usize>,
    /// Index into the entry list.
    pub entrant: usize,
    pub jumper: String,
    pub rounds: [Option<RoundScore>; 2],
    pub total: f64,
    pub disqualified: bool,
    /// Qualified for the final round (or, in qualification, for the main competition).
    pub advanced: bool,
}

/// Ranking snapshot emitted after every resolved jump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standings {
    pub phase: CompetitionPhase,
    pub round: u8,
    pub jumps_completed: usize,
    pub entries: Vec<StandingEntry>,
}
