use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Everything the engine reads besides the jumper, hill and conditions.
///
/// Passed by reference into every entry point so that competitions with different
/// settings can run side by side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub lift: LiftConfig,
    pub timing: TimingConfig,
    pub compensation: CompensationConfig,
    pub scoring: ScoringConfig,
    pub competition: CompetitionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f64,
    pub air_density: f64,
    pub time_step: f64,
    pub max_steps: u32,
    pub takeoff_zone: f64,
    pub takeoff_contact_time: f64,
    pub stop_speed: f64,
    /// Keep every integrator step in the result. Off for batch runs.
    pub record_trajectory: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            air_density: AIR_DENSITY,
            time_step: TIME_STEP,
            max_steps: MAX_STEPS,
            takeoff_zone: TAKEOFF_ZONE,
            takeoff_contact_time: TAKEOFF_CONTACT_TIME,
            stop_speed: STOP_SPEED,
            record_trajectory: true,
        }
    }
}

/// Linear ramp of extra flight lift over edge speed (m/s).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiftConfig {
    pub low_speed: f64,
    pub high_speed: f64,
    pub max_bonus: f64,
}

impl Default for LiftConfig {
    fn default() -> Self {
        Self {
            low_speed: LIFT_BONUS_LOW_SPEED,
            high_speed: LIFT_BONUS_HIGH_SPEED,
            max_bonus: LIFT_BONUS_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub sigma_at_zero_ms: f64,
    pub sigma_slope_ms: f64,
    pub error_limit_s: f64,
    pub perfect_window_s: f64,
    pub max_early_shift_m: f64,
    /// Timing error (s) at which the push loses its full magnitude penalty.
    pub magnitude_saturation_s: f64,
    pub magnitude_max_loss: f64,
    pub vertical_max_loss: f64,
    pub vertical_floor: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            sigma_at_zero_ms: TIMING_SIGMA_AT_ZERO_MS,
            sigma_slope_ms: TIMING_SIGMA_SLOPE_MS,
            error_limit_s: TIMING_ERROR_LIMIT_S,
            perfect_window_s: TIMING_PERFECT_WINDOW_S,
            max_early_shift_m: TIMING_MAX_EARLY_SHIFT_M,
            magnitude_saturation_s: 0.08,
            magnitude_max_loss: 0.25,
            vertical_max_loss: 0.25,
            vertical_floor: 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompensationConfig {
    /// Gate all compensation is measured against; the middle gate when unset.
    pub reference_gate: Option<u32>,
    /// Metres of distance per metre of inrun, per metre of K.
    pub gate_factor_per_k: f64,
    /// Headwind factor is `(K - wind_k_offset) / wind_k_divisor` metres per m/s.
    pub wind_k_offset: f64,
    pub wind_k_divisor: f64,
    pub tailwind_ratio: f64,
}

impl Default for CompensationConfig {
    fn default() -> Self {
        Self {
            reference_gate: None,
            gate_factor_per_k: GATE_FACTOR_PER_K,
            wind_k_offset: 36.0,
            wind_k_divisor: 20.0,
            tailwind_ratio: TAILWIND_FACTOR_RATIO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub k_point_points: f64,
    /// Scored distances snap to multiples of this (m).
    pub distance_rounding: f64,
    /// Replaces the FIS meter value table when set.
    pub meter_value: Option<f64>,
    pub judge_base_min: f64,
    pub judge_base_max: f64,
    pub max_judge_mark: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            k_point_points: K_POINT_POINTS,
            distance_rounding: 0.5,
            meter_value: None,
            judge_base_min: 16.5,
            judge_base_max: 19.0,
            max_judge_mark: MAX_JUDGE_MARK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitionConfig {
    pub final_round_size: usize,
    pub qualification_limit: usize,
    pub qualification_limit_flying: usize,
    /// Run each round through the parallel evaluator.
    pub parallel: bool,
}

impl Default for CompetitionConfig {
    fn default() -> Self {
        Self {
            final_round_size: FINAL_ROUND_SIZE,
            qualification_limit: QUALIFICATION_LIMIT,
            qualification_limit_flying: QUALIFICATION_LIMIT_FLYING,
            parallel: false,
        }
    }
}
