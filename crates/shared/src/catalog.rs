//! Reference hills and jumpers used by the CLI and the test suites.

use crate::types::{AeroCoefficients, Hill, Jumper};

pub fn normal_hill() -> Hill {
    Hill {
        name: "Normal Hill".into(),
        country: "NOR".into(),
        e1: 87.5,
        e2: 75.5,
        gates: 18,
        t: 6.3,
        gamma_deg: 35.0,
        alpha_deg: 11.0,
        r1: 85.0,
        h: 42.5,
        n: 78.5,
        s: 2.4,
        beta_p_deg: 36.5,
        beta_deg: 34.5,
        beta_l_deg: 32.5,
        rl: 280.0,
        p: 75.0,
        k: 90.0,
        l: 102.0,
        zu: 60.0,
        inrun_friction_coefficient: 0.02,
        a_finish: 100.0,
    }
}

pub fn large_hill() -> Hill {
    Hill {
        name: "Large Hill".into(),
        country: "POL".into(),
        e1: 99.5,
        e2: 87.5,
        gates: 24,
        t: 6.5,
        gamma_deg: 35.0,
        alpha_deg: 11.0,
        r1: 100.0,
        h: 58.0,
        n: 103.0,
        s: 3.0,
        beta_p_deg: 37.0,
        beta_deg: 35.0,
        beta_l_deg: 33.0,
        rl: 350.0,
        p: 100.0,
        k: 120.0,
        l: 134.0,
        zu: 110.0,
        inrun_friction_coefficient: 0.02,
        a_finish: 100.0,
    }
}

pub fn flying_hill() -> Hill {
    Hill {
        name: "Flying Hill".into(),
        country: "SLO".into(),
        e1: 109.0,
        e2: 89.0,
        gates: 30,
        t: 7.0,
        gamma_deg: 36.0,
        alpha_deg: 11.0,
        r1: 120.0,
        h: 112.0,
        n: 166.0,
        s: 3.4,
        beta_p_deg: 36.5,
        beta_deg: 34.0,
        beta_l_deg: 31.0,
        rl: 480.0,
        p: 170.0,
        k: 200.0,
        l: 240.0,
        zu: 140.0,
        inrun_friction_coefficient: 0.02,
        a_finish: 120.0,
    }
}

pub fn hills() -> Vec<Hill> {
    vec![normal_hill(), large_hill(), flying_hill()]
}

/// Looks a hill up by name or by K-point, case-insensitively.
pub fn find_hill(query: &str) -> Option<Hill> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    hills().into_iter().find(|h| {
        h.name.to_lowercase() == q
            || h.name.to_lowercase().starts_with(&q)
            || format!("k{}", h.k) == q
            || format!("k-{}", h.k) == q
            || format!("hs{}", h.l) == q
    })
}

fn jumper(
    name: &str,
    surname: &str,
    nation: &str,
    mass: f64,
    flight_lift: f64,
    telemark: f64,
    timing: f64,
) -> Jumper {
    let mut j = Jumper::new(name, surname).with_nationality(nation);
    j.mass = mass;
    j.flight = AeroCoefficients {
        lift: flight_lift,
        ..AeroCoefficients::flight()
    };
    j.telemark = telemark;
    j.timing = timing;
    j
}

pub fn jumpers() -> Vec<Jumper> {
    vec![
        jumper("Jan", "KOWALSKI", "POL", 60.0, 0.80, 50.0, 50.0),
        jumper("Ola", "NORDMANN", "NOR", 58.0, 0.83, 70.0, 75.0),
        jumper("Franz", "HUBER", "AUT", 62.0, 0.79, 60.0, 65.0),
        jumper("Ziga", "NOVAK", "SLO", 59.0, 0.82, 55.0, 80.0),
        jumper("Taro", "SATO", "JPN", 57.0, 0.81, 80.0, 60.0),
        jumper("Hans", "MUELLER", "GER", 63.0, 0.78, 40.0, 55.0),
        jumper("Matti", "VIRTANEN", "FIN", 61.0, 0.80, 45.0, 40.0),
        jumper("Pavel", "NOVOTNY", "CZE", 60.0, 0.77, 35.0, 45.0),
        jumper("Luca", "ROSSI", "ITA", 64.0, 0.76, 50.0, 35.0),
        jumper("Jonas", "MEIER", "SUI", 59.0, 0.79, 65.0, 70.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_hills_are_ordered_by_size() {
        let hills = hills();
        assert_eq!(hills.len(), 3);
        for pair in hills.windows(2) {
            assert!(pair[0].k < pair[1].k);
        }
        for hill in &hills {
            assert!(hill.p < hill.k && hill.k < hill.l, "{}", hill);
            assert!(hill.e1 > hill.e2, "{}", hill);
        }
    }

    #[test]
    fn test_find_hill() {
        assert_eq!(find_hill("large").map(|h| h.k), Some(120.0));
        assert_eq!(find_hill("K200").map(|h| h.k), Some(200.0));
        assert_eq!(find_hill("hs102").map(|h| h.k), Some(90.0));
        assert!(find_hill("moon").is_none());
        assert!(find_hill("").is_none());
        assert!(find_hill("   ").is_none());
    }
}
