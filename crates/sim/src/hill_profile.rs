use glam::DVec2;
use skijump_shared::*;

/// Horizontal resolution of the landing-profile arc-length table (m).
const ARC_STEP: f64 = 0.01;
/// Resolution of the inrun centreline table (m along the inrun).
const INRUN_STEP: f64 = 0.05;

/// Hill geometry resolved into the curves the integrator needs.
///
/// Coordinates put the table edge at the origin, x downhill and y up. The inrun is
/// addressed by the distance still to go to the table edge; the landing profile by x.
#[derive(Debug, Clone)]
pub struct HillProfile {
    hill: Hill,
    alpha: f64,
    gamma: f64,
    transition_length: f64,
    clothoid_a2: f64,
    knoll_c2: f64,
    knoll_c3: f64,
    p: DVec2,
    l: DVec2,
    center: DVec2,
    tan_beta_l: f64,
    outrun_qa: f64,
    outrun_start_x: f64,
    end_x: f64,
    arc: Vec<f64>,
    scale: f64,
    inrun: Vec<DVec2>,
}

fn check(ok: bool, context: &JumpContext, reason: &str) -> Result<(), SimulationError> {
    if ok {
        Ok(())
    } else {
        Err(SimulationError::invalid(context.clone(), reason))
    }
}

/// Rejects hills whose geometry cannot be built into a profile.
pub fn validate_hill(hill: &Hill, context: &JumpContext) -> Result<(), SimulationError> {
    let fields = [
        ("e1", hill.e1),
        ("e2", hill.e2),
        ("t", hill.t),
        ("gamma_deg", hill.gamma_deg),
        ("alpha_deg", hill.alpha_deg),
        ("r1", hill.r1),
        ("h", hill.h),
        ("n", hill.n),
        ("s", hill.s),
        ("betaP_deg", hill.beta_p_deg),
        ("beta_deg", hill.beta_deg),
        ("betaL_deg", hill.beta_l_deg),
        ("rl", hill.rl),
        ("P", hill.p),
        ("K", hill.k),
        ("L", hill.l),
        ("Zu", hill.zu),
        ("inrun_friction_coefficient", hill.inrun_friction_coefficient),
        ("a_finish", hill.a_finish),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(SimulationError::invalid(
                context.clone(),
                format!("hill field {} is not a finite number", name),
            ));
        }
    }

    check(hill.gates >= 1, context, "hill has no gates")?;
    check(hill.e2 > 0.0, context, "lowest gate must be above the table edge")?;
    check(hill.e1 >= hill.e2, context, "e1 must not be shorter than e2")?;
    check(
        hill.gates == 1 || hill.e1 > hill.e2,
        context,
        "gates must be spaced apart: e1 must exceed e2 when there is more than one gate",
    )?;
    check(hill.t >= 0.0, context, "table length must not be negative")?;
    check(
        0.0 <= hill.alpha_deg && hill.alpha_deg <= hill.gamma_deg && hill.gamma_deg < 90.0,
        context,
        "inrun angles must satisfy 0 <= alpha <= gamma < 90",
    )?;
    check(hill.r1 > 0.0 && hill.rl > 0.0, context, "radii must be positive")?;
    check(hill.h > 0.0 && hill.n > 0.0, context, "K-point must lie below and beyond the edge")?;
    check(hill.s >= 0.0, context, "table height must not be negative")?;
    check(
        0.0 < hill.beta_l_deg && hill.beta_l_deg <= hill.beta_deg && hill.beta_deg <= hill.beta_p_deg
            && hill.beta_p_deg < 90.0,
        context,
        "landing angles must satisfy 0 < betaL <= beta <= betaP < 90",
    )?;
    check(
        0.0 < hill.p && hill.p < hill.k && hill.k <= hill.l,
        context,
        "control points must satisfy 0 < P < K <= L",
    )?;
    check(hill.inrun_friction_coefficient >= 0.0, context, "friction must not be negative")?;
    check(hill.a_finish >= 0.0, context, "outrun length must not be negative")?;
    Ok(())
}

impl HillProfile {
    pub fn new(hill: &Hill, context: &JumpContext) -> Result<Self, SimulationError> {
        validate_hill(hill, context)?;

        let alpha = hill.alpha_deg.to_radians();
        let gamma = hill.gamma_deg.to_radians();
        let r1_min = hill.r1 / 2.0;
        let turn = (gamma - alpha).abs();
        let transition_length = 2.0 * r1_min * turn;
        let clothoid_a2 = r1_min * r1_min * 2.0 * turn;

        let beta = hill.beta_deg.to_radians();
        let beta_p = hill.beta_p_deg.to_radians();
        let beta_l = hill.beta_l_deg.to_radians();
        let k_point = DVec2::new(hill.n, -hill.h);
        let center = k_point + hill.rl * DVec2::new(beta.sin(), beta.cos());
        let on_arc = |phi: f64| center - hill.rl * DVec2::new(phi.sin(), phi.cos());
        let p = on_arc(beta_p);
        let l = on_arc(beta_l);
        check(p.x > 0.0, context, "P lies behind the table edge")?;
        check(p.y < -hill.s, context, "P lies above the knoll start")?;

        // Cubic knoll from (0, -s) with zero slope to P with the landing arc's slope.
        let drop = p.y + hill.s;
        let slope_p = -beta_p.tan();
        let knoll_c3 = (slope_p * p.x - 2.0 * drop) / p.x.powi(3);
        let knoll_c2 = (drop - knoll_c3 * p.x.powi(3)) / (p.x * p.x);

        let tan_beta_l = beta_l.tan();
        let outrun_depth = hill.zu + l.y;
        check(outrun_depth > 0.0, context, "outrun floor lies above L")?;
        let outrun_qa = tan_beta_l * tan_beta_l / (4.0 * outrun_depth);
        let outrun_start_x = l.x + tan_beta_l / (2.0 * outrun_qa);
        let end_x = outrun_start_x + hill.a_finish;

        let mut profile = Self {
            hill: hill.clone(),
            alpha,
            gamma,
            transition_length,
            clothoid_a2,
            knoll_c2,
            knoll_c3,
            p,
            l,
            center,
            tan_beta_l,
            outrun_qa,
            outrun_start_x,
            end_x,
            arc: Vec::new(),
            scale: 1.0,
            inrun: Vec::new(),
        };
        profile.build_arc_table();
        profile.build_inrun_table();

        let arc_k = profile.arc_length(hill.n);
        check(arc_k > 0.0, context, "K-point arc length is zero")?;
        profile.scale = hill.k / arc_k;
        Ok(profile)
    }

    fn build_arc_table(&mut self) {
        let n = (self.end_x / ARC_STEP).ceil() as usize + 1;
        let mut arc = Vec::with_capacity(n + 1);
        arc.push(0.0);
        let mut prev = self.height(0.0);
        let mut acc = 0.0;
        for i in 1..=n {
            let y = self.height(i as f64 * ARC_STEP);
            acc += ARC_STEP.hypot(y - prev);
            arc.push(acc);
            prev = y;
        }
        self.arc = arc;
    }

    fn build_inrun_table(&mut self) {
        let n = (self.hill.e1 / INRUN_STEP).ceil() as usize + 1;
        let mut points = Vec::with_capacity(n + 1);
        let mut point = DVec2::ZERO;
        points.push(point);
        for i in 1..=n {
            let mid = (i as f64 - 0.5) * INRUN_STEP;
            let theta = self.inrun_angle(mid);
            point += INRUN_STEP * DVec2::new(-theta.cos(), theta.sin());
            points.push(point);
        }
        self.inrun = points;
    }

    pub fn hill(&self) -> &Hill {
        &self.hill
    }

    pub fn context(&self) -> JumpContext {
        JumpContext::for_hill(&self.hill)
    }

    /// Table angle alpha in radians.
    pub fn table_angle(&self) -> f64 {
        self.alpha
    }

    /// Unit vector along the table, pointing downhill.
    pub fn table_direction(&self) -> DVec2 {
        DVec2::new(self.alpha.cos(), -self.alpha.sin())
    }

    /// Unit vector normal to the table, pointing away from the snow.
    pub fn table_normal(&self) -> DVec2 {
        DVec2::new(self.alpha.sin(), self.alpha.cos())
    }

    pub fn end_x(&self) -> f64 {
        self.end_x
    }

    /// Inrun inclination (radians below horizontal) at `d` metres before the edge.
    pub fn inrun_angle(&self, d: f64) -> f64 {
        let t = self.hill.t;
        if d <= t {
            self.alpha
        } else if d < t + self.transition_length {
            let rest = t + self.transition_length - d;
            self.gamma - rest * rest / (2.0 * self.clothoid_a2)
        } else {
            self.gamma
        }
    }

    /// Curvature (1/m) of the inrun centreline at `d` metres before the edge.
    pub fn inrun_curvature(&self, d: f64) -> f64 {
        let t = self.hill.t;
        if d > t && d < t + self.transition_length {
            (t + self.transition_length - d) / self.clothoid_a2
        } else {
            0.0
        }
    }

    /// Inrun centreline point `d` metres before the edge.
    pub fn inrun_point(&self, d: f64) -> DVec2 {
        let pos = (d / INRUN_STEP).max(0.0);
        let last = self.inrun.len() - 1;
        let i = (pos.floor() as usize).min(last.saturating_sub(1));
        let frac = (pos - i as f64).clamp(0.0, 1.0);
        let a = self.inrun[i];
        let b = self.inrun[(i + 1).min(last)];
        a + (b - a) * frac
    }

    /// Landing-profile height at `x`.
    pub fn height(&self, x: f64) -> f64 {
        let h = &self.hill;
        if x <= 0.0 {
            -h.s
        } else if x <= self.p.x {
            -h.s + self.knoll_c2 * x * x + self.knoll_c3 * x * x * x
        } else if x <= self.l.x {
            let dx = x - self.center.x;
            self.center.y - (h.rl * h.rl - dx * dx).max(0.0).sqrt()
        } else if x <= self.outrun_start_x {
            let dx = x - self.l.x;
            self.l.y - self.tan_beta_l * dx + self.outrun_qa * dx * dx
        } else {
            -h.zu
        }
    }

    /// dy/dx of the landing profile.
    pub fn slope(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else if x <= self.p.x {
            2.0 * self.knoll_c2 * x + 3.0 * self.knoll_c3 * x * x
        } else if x <= self.l.x {
            let dx = x - self.center.x;
            dx / (self.hill.rl * self.hill.rl - dx * dx).max(f64::EPSILON).sqrt()
        } else if x <= self.outrun_start_x {
            -self.tan_beta_l + 2.0 * self.outrun_qa * (x - self.l.x)
        } else {
            0.0
        }
    }

    /// d2y/dx2 of the landing profile.
    pub fn second_derivative(&self, x: f64) -> f64 {
        if x <= 0.0 {
            0.0
        } else if x <= self.p.x {
            2.0 * self.knoll_c2 + 6.0 * self.knoll_c3 * x
        } else if x <= self.l.x {
            let dx = x - self.center.x;
            let q = (self.hill.rl * self.hill.rl - dx * dx).max(f64::EPSILON);
            self.hill.rl * self.hill.rl / q.powf(1.5)
        } else if x <= self.outrun_start_x {
            2.0 * self.outrun_qa
        } else {
            0.0
        }
    }

    /// Unit tangent of the landing profile at `x`, pointing downhill.
    pub fn tangent(&self, x: f64) -> DVec2 {
        DVec2::new(1.0, self.slope(x)).normalize()
    }

    /// Raw arc length of the landing profile from the table foot to `x`.
    pub fn arc_length(&self, x: f64) -> f64 {
        let pos = (x.clamp(0.0, self.end_x)) / ARC_STEP;
        let last = self.arc.len() - 1;
        let i = (pos.floor() as usize).min(last.saturating_sub(1));
        let frac = (pos - i as f64).clamp(0.0, 1.0);
        self.arc[i] + (self.arc[(i + 1).min(last)] - self.arc[i]) * frac
    }

    /// Measured distance for a touchdown at `x`, scaled so the K-point reads exactly K.
    pub fn distance(&self, x: f64) -> f64 {
        self.arc_length(x) * self.scale
    }

    /// Height of `point` above the landing profile.
    pub fn clearance(&self, point: DVec2) -> f64 {
        point.y - self.height(point.x)
    }
}
