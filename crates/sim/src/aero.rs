use glam::DVec2;
use skijump_shared::*;

/// Flight lift coefficient for a jumper leaving the table at `takeoff_speed` (m/s).
///
/// Rises linearly from `base` at `lift.low_speed` to `base + lift.max_bonus` at
/// `lift.high_speed` and is flat outside that range. Faster tables on bigger hills
/// therefore fly with a flatter glide.
pub fn effective_lift_coefficient(base: f64, takeoff_speed: f64, lift: &LiftConfig) -> f64 {
    let span = lift.high_speed - lift.low_speed;
    let ramp = if span > 0.0 {
        ((takeoff_speed - lift.low_speed) / span).clamp(0.0, 1.0)
    } else if takeoff_speed >= lift.high_speed {
        1.0
    } else {
        0.0
    };
    base + lift.max_bonus * ramp
}

/// Aerodynamic acceleration for air flowing past the body at `relative` velocity.
///
/// Drag opposes the relative velocity, lift acts perpendicular to it (rotated
/// counter-clockwise, i.e. upward for a jumper moving downhill).
pub fn aero_acceleration(
    coeffs: &AeroCoefficients,
    relative: DVec2,
    mass: f64,
    air_density: f64,
) -> DVec2 {
    let k = 0.5 * air_density * coeffs.frontal_area * relative.length() / mass;
    -k * coeffs.drag * relative + k * coeffs.lift * relative.perp()
}

/// Drag deceleration magnitude for motion along a surface. Signed with `speed`.
pub fn drag_deceleration(coeffs: &AeroCoefficients, speed: f64, mass: f64, air_density: f64) -> f64 {
    0.5 * air_density * coeffs.drag_area() * speed * speed.abs() / mass
}

/// Lift acceleration magnitude for motion along a surface, relieving the normal force.
pub fn lift_acceleration(coeffs: &AeroCoefficients, speed: f64, mass: f64, air_density: f64) -> f64 {
    0.5 * air_density * coeffs.lift_area() * speed * speed / mass
}
