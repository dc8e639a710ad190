use glam::DVec2;
use skijump_shared::*;

use crate::hill_profile::HillProfile;

/// Ground contact found between two flight samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Share of the step taken before contact, in [0, 1].
    pub fraction: f64,
    pub position: DVec2,
    pub velocity: DVec2,
}

/// Tests the step `from -> to` against the landing profile.
///
/// The height above ground is interpolated linearly across the step, so the
/// touchdown lands between the two integrator samples instead of on the later one.
pub fn detect_contact(
    profile: &HillProfile,
    from: (DVec2, DVec2),
    to: (DVec2, DVec2),
) -> Option<Contact> {
    let g0 = profile.clearance(from.0);
    let g1 = profile.clearance(to.0);
    if g1 > 0.0 {
        return None;
    }
    let fraction = if g0 > g1 {
        (g0 / (g0 - g1)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    Some(Contact {
        fraction,
        position: from.0.lerp(to.0, fraction),
        velocity: from.1.lerp(to.1, fraction),
    })
}

/// Speed kept along the slope once the skis meet the snow; the normal part is absorbed.
pub fn tangential_speed(profile: &HillProfile, x: f64, velocity: DVec2) -> f64 {
    velocity.dot(profile.tangent(x)).max(0.0)
}

pub fn touchdown(profile: &HillProfile, time: f64, contact: &Contact) -> Touchdown {
    Touchdown {
        time,
        x: contact.position.x,
        y: contact.position.y,
        speed: contact.velocity.length(),
        distance: profile.distance(contact.position.x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skijump_shared::catalog;

    fn profile() -> HillProfile {
        let hill = catalog::large_hill();
        HillProfile::new(&hill, &JumpContext::for_hill(&hill)).unwrap()
    }

    #[test]
    fn test_no_contact_above_ground() {
        let p = profile();
        let v = DVec2::new(25.0, -10.0);
        let a = DVec2::new(50.0, -10.0);
        let b = DVec2::new(50.2, -10.1);
        assert!(detect_contact(&p, (a, v), (b, v)).is_none());
    }

    #[test]
    fn test_contact_interpolates_inside_step() {
        let p = profile();
        let x = 103.0;
        let ground = p.height(x);
        let v = DVec2::new(25.0, -20.0);
        let a = DVec2::new(x, ground + 0.1);
        let b = DVec2::new(x + 0.1, ground - 0.3);
        let c = detect_contact(&p, (a, v), (b, v)).unwrap();
        assert!(c.fraction > 0.0 && c.fraction < 1.0);
        assert!(p.clearance(c.position).abs() < 0.01);
        let t = touchdown(&p, 5.0, &c);
        assert!((t.distance - 120.0).abs() < 0.5, "{}", t.distance);
    }

    #[test]
    fn test_tangential_speed_drops_normal_part() {
        let p = profile();
        let x = 103.0;
        let along = p.tangent(x) * 20.0;
        let into_snow = DVec2::new(-along.y, along.x).normalize() * -3.0;
        let s = tangential_speed(&p, x, along + into_snow);
        assert!((s - 20.0).abs() < 1e-9);
    }
}
