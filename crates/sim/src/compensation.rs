use skijump_shared::*;

use crate::scoring::meter_value;

/// Start position resolved from a gate number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateSetting {
    pub gate: u32,
    pub reference_gate: u32,
    /// Inrun length from the gate to the table edge (m).
    pub start_distance: f64,
    /// Extra inrun relative to the reference gate (m); negative when shorter.
    pub inrun_offset: f64,
}

impl GateSetting {
    /// Relative change of inrun length against the reference gate.
    pub fn inrun_ratio(&self) -> f64 {
        let reference = self.start_distance - self.inrun_offset;
        if reference > 0.0 {
            self.start_distance / reference
        } else {
            1.0
        }
    }
}

fn check_gate(hill: &Hill, gate: u32, context: &JumpContext, what: &str) -> Result<(), SimulationError> {
    if gate == 0 || gate > hill.gates {
        return Err(SimulationError::invalid(
            context.clone(),
            format!("{} {} outside 1..={}", what, gate, hill.gates),
        ));
    }
    Ok(())
}

pub fn reference_gate(
    hill: &Hill,
    config: &CompensationConfig,
    context: &JumpContext,
) -> Result<u32, SimulationError> {
    let gate = config.reference_gate.unwrap_or_else(|| hill.middle_gate());
    check_gate(hill, gate, context, "reference gate")?;
    Ok(gate)
}

/// Validates `gate` and resolves it into an inrun length. Never clamps.
pub fn resolve_gate(
    hill: &Hill,
    gate: u32,
    config: &CompensationConfig,
    context: &JumpContext,
) -> Result<GateSetting, SimulationError> {
    check_gate(hill, gate, context, "gate")?;
    let reference = reference_gate(hill, config, context)?;
    let start_distance = hill.gate_start(gate);
    Ok(GateSetting {
        gate,
        reference_gate: reference,
        start_distance,
        inrun_offset: start_distance - hill.gate_start(reference),
    })
}

/// Metres of distance gained per metre of extra inrun.
pub fn gate_factor(hill: &Hill, config: &CompensationConfig) -> f64 {
    config.gate_factor_per_k * hill.k
}

/// Metres of distance gained per m/s of headwind.
pub fn headwind_factor(hill: &Hill, config: &CompensationConfig) -> f64 {
    if config.wind_k_divisor > 0.0 {
        ((hill.k - config.wind_k_offset) / config.wind_k_divisor).max(0.0)
    } else {
        0.0
    }
}

/// Points for starting off the reference gate: a shorter inrun earns points back.
pub fn gate_points(hill: &Hill, setting: &GateSetting, config: &EngineConfig) -> f64 {
    -setting.inrun_offset * gate_factor(hill, &config.compensation) * meter_value(hill.k, &config.scoring)
}

/// Points for wind: headwind (positive) is deducted, tailwind is added more generously.
pub fn wind_points(hill: &Hill, wind: f64, config: &EngineConfig) -> f64 {
    let factor = headwind_factor(hill, &config.compensation);
    let factor = if wind < 0.0 {
        factor * config.compensation.tailwind_ratio
    } else {
        factor
    };
    -wind * factor * meter_value(hill.k, &config.scoring)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compensation {
    pub setting: GateSetting,
    pub gate_points: f64,
    pub wind_points: f64,
}

impl Compensation {
    pub fn total(&self) -> f64 {
        self.gate_points + self.wind_points
    }
}

pub fn compensate(
    hill: &Hill,
    gate: u32,
    wind: f64,
    config: &EngineConfig,
    context: &JumpContext,
) -> Result<Compensation, SimulationError> {
    if !wind.is_finite() {
        return Err(SimulationError::invalid(context.clone(), "wind is not a finite number"));
    }
    let setting = resolve_gate(hill, gate, &config.compensation, context)?;
    Ok(Compensation {
        setting,
        gate_points: gate_points(hill, &setting, config),
        wind_points: wind_points(hill, wind, config),
    })
}
