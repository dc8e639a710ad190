use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;

use skijump_shared::*;
use skijump_sim::{analyze, run_jump_on, HillProfile};

/// Outcome of a perfectly timed, windless jump from one gate.
struct GateRow {
    gate: u32,
    start_distance: f64,
    takeoff_kmh: f64,
    distance: f64,
    flight_time: f64,
    gate_points: f64,
}

struct HillSweep {
    hill: Hill,
    rows: Vec<GateRow>,
}

impl HillSweep {
    /// Index of the gate whose jump lands closest to K.
    fn closest_to_k(&self) -> Option<usize> {
        let k = self.hill.k;
        self.rows
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (a.distance - k).abs().total_cmp(&(b.distance - k).abs()))
            .map(|(i, _)| i)
    }
}

fn sweep_hill(hill: &Hill, jumper: &Jumper, config: &EngineConfig) -> Result<HillSweep> {
    let profile = HillProfile::new(hill, &JumpContext::new(jumper, hill))?;
    let mut config = config.clone();
    config.physics.record_trajectory = false;

    let rows: Vec<Result<GateRow, SimulationError>> = (1..=hill.gates)
        .into_par_iter()
        .map(|gate| {
            let result = run_jump_on(&profile, jumper, gate, &JumpConditions::perfect(), &config)?;
            let metrics = analyze(&profile, &result);
            Ok(GateRow {
                gate,
                start_distance: hill.gate_start(gate),
                takeoff_kmh: result.takeoff_speed * 3.6,
                distance: result.touchdown.distance,
                flight_time: metrics.flight_time,
                gate_points: result.gate_points,
            })
        })
        .collect();

    Ok(HillSweep {
        hill: hill.clone(),
        rows: rows.into_iter().collect::<Result<_, _>>()?,
    })
}

fn print_sweep(sweep: &HillSweep) {
    println!("\n--- {} ---", sweep.hill);
    println!(
        "{:>5} {:>9} {:>10} {:>9} {:>8} {:>8}",
        "gate", "start m", "km/h", "dist m", "flight s", "gate pts"
    );
    println!("{:-<55}", "");

    let marked = sweep.closest_to_k();
    for (i, r) in sweep.rows.iter().enumerate() {
        let marker = if Some(i) == marked { " *" } else { "" };
        println!(
            "{:>5} {:>9.2} {:>10.2} {:>9.2} {:>8.2} {:>+8.1}{}",
            r.gate, r.start_distance, r.takeoff_kmh, r.distance, r.flight_time, r.gate_points, marker,
        );
    }
}

fn write_csv(path: &Path, sweeps: &[HillSweep]) -> Result<()> {
    let mut file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "hill,k,gate,start_distance,takeoff_kmh,distance,flight_time,gate_points")?;
    for sweep in sweeps {
        for r in &sweep.rows {
            writeln!(
                file,
                "{},{},{},{:.3},{:.3},{:.3},{:.3},{:.1}",
                sweep.hill.name, sweep.hill.k, r.gate, r.start_distance, r.takeoff_kmh, r.distance, r.flight_time, r.gate_points,
            )?;
        }
    }
    println!("\nCSV written to {}", path.display());
    Ok(())
}

pub fn cmd_calibrate(hills: &[Hill], jumper: &Jumper, config: &EngineConfig, csv: Option<&Path>) -> Result<()> {
    println!(
        "=== Gate Calibration ===\nJumper: {} | Hills: {} | dt: {} s",
        jumper,
        hills.len(),
        config.physics.time_step
    );
    let start = std::time::Instant::now();

    let sweeps = hills
        .iter()
        .map(|hill| sweep_hill(hill, jumper, config))
        .collect::<Result<Vec<_>>>()?;
    for sweep in &sweeps {
        print_sweep(sweep);
    }

    println!("\n=== Summary ({:.1}s) ===", start.elapsed().as_secs_f32());
    println!("{:<28} {:>6} {:>8} {:>10}", "Hill", "K", "K gate", "distance");
    println!("{:-<55}", "");
    for sweep in &sweeps {
        if let Some(i) = sweep.closest_to_k() {
            let r = &sweep.rows[i];
            println!(
                "{:<28} {:>6.0} {:>8} {:>10.2}",
                sweep.hill.to_string(),
                sweep.hill.k,
                r.gate,
                r.distance
            );
        }
    }

    if let Some(path) = csv {
        write_csv(path, &sweeps)?;
    }
    Ok(())
}
