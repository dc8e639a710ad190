mod calibrate;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use skijump_shared::catalog;
use skijump_shared::*;
use skijump_sim::{analyze, run_jump_on, Competition, CompetitionSettings, HillProfile};

#[derive(Parser)]
#[command(name = "skijump", about = "Ski jumping physics and scoring engine")]
struct Cli {
    /// Engine configuration as JSON; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct HillArgs {
    /// Hill name or K-point (k90, k-120, hs240, "large")
    #[arg(long, default_value = "k120")]
    hill: String,

    /// Hill definition as JSON, overrides --hill
    #[arg(long)]
    hill_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate and score a single jump
    Jump {
        #[command(flatten)]
        hill: HillArgs,

        /// Catalog jumper by index or surname
        #[arg(long, default_value = "0")]
        jumper: String,

        /// Start gate, defaults to the middle gate
        #[arg(long)]
        gate: Option<u32>,

        /// Wind speed in m/s, positive is headwind
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        wind: f64,

        /// Random seed for takeoff timing and judges
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Take off with a perfectly timed push
        #[arg(long)]
        perfect: bool,

        /// Output path for the full result JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run a two-round competition (or a qualification round)
    Competition {
        #[command(flatten)]
        hill: HillArgs,

        /// Jumpers as a JSON array; the catalog field is used otherwise
        #[arg(long)]
        jumpers: Option<PathBuf>,

        /// Field size when drawing from the catalog
        #[arg(long, default_value_t = 10)]
        entrants: usize,

        #[arg(long)]
        gate: Option<u32>,

        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        wind: f64,

        /// Per-jump wind drawn within wind +/- this value
        #[arg(long, default_value_t = 0.0)]
        wind_variation: f64,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        #[arg(long)]
        qualification: bool,

        /// Simulate each round in parallel
        #[arg(long)]
        parallel: bool,

        /// Output path for the final standings JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Sweep every gate and report takeoff speed and distance
    Calibrate {
        /// Only this hill; all catalog hills otherwise
        #[arg(long)]
        hill: Option<String>,

        #[arg(long, default_value = "0")]
        jumper: String,

        /// Write the sweep as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// List the built-in hills
    Hills,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Jump {
            hill,
            jumper,
            gate,
            wind,
            seed,
            perfect,
            output,
        } => {
            let hill = resolve_hill(&hill)?;
            let jumper = resolve_jumper(&jumper)?;
            let conditions = JumpConditions {
                wind,
                perfect_timing: perfect,
                seed,
            };
            cmd_jump(&hill, &jumper, gate, &conditions, &config, output.as_deref())
        }

        Commands::Competition {
            hill,
            jumpers,
            entrants,
            gate,
            wind,
            wind_variation,
            seed,
            qualification,
            parallel,
            output,
        } => {
            let hill = resolve_hill(&hill)?;
            let field = match jumpers {
                Some(path) => read_json::<Vec<Jumper>>(&path)?,
                None => catalog_field(entrants),
            };
            let settings = CompetitionSettings {
                mode: if qualification {
                    CompetitionMode::Qualification
                } else {
                    CompetitionMode::Individual
                },
                gate: gate.unwrap_or_else(|| hill.middle_gate()),
                wind,
                wind_variation,
                perfect_timing: false,
                seed,
            };
            let mut config = config;
            config.competition.parallel |= parallel;
            cmd_competition(&hill, field, settings, config, output.as_deref())
        }

        Commands::Calibrate { hill, jumper, csv } => {
            let hills = match hill {
                Some(query) => vec![catalog::find_hill(&query).ok_or_else(|| unknown_hill(&query))?],
                None => catalog::hills(),
            };
            let jumper = resolve_jumper(&jumper)?;
            calibrate::cmd_calibrate(&hills, &jumper, &config, csv.as_deref())
        }

        Commands::Hills => {
            cmd_hills();
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => read_json(path),
        None => Ok(EngineConfig::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    println!("\nWritten to {}", path.display());
    Ok(())
}

fn unknown_hill(query: &str) -> anyhow::Error {
    let names: Vec<String> = catalog::hills().iter().map(|h| h.to_string()).collect();
    anyhow!("unknown hill '{}'. Available: {}", query, names.join(", "))
}

fn resolve_hill(args: &HillArgs) -> Result<Hill> {
    match &args.hill_file {
        Some(path) => read_json(path),
        None => catalog::find_hill(&args.hill).ok_or_else(|| unknown_hill(&args.hill)),
    }
}

/// Catalog jumper by index, or by case-insensitive surname.
fn resolve_jumper(query: &str) -> Result<Jumper> {
    let jumpers = catalog::jumpers();
    if let Ok(idx) = query.parse::<usize>() {
        return jumpers
            .get(idx)
            .cloned()
            .ok_or_else(|| anyhow!("jumper index {} out of range 0..{}", idx, jumpers.len()));
    }
    let q = query.to_lowercase();
    jumpers
        .iter()
        .find(|j| j.surname.to_lowercase() == q)
        .cloned()
        .ok_or_else(|| anyhow!("unknown jumper '{}'", query))
}

/// Cycles through the catalog, numbering repeated names.
fn catalog_field(n: usize) -> Vec<Jumper> {
    let base = catalog::jumpers();
    (0..n)
        .map(|i| {
            let mut j = base[i % base.len()].clone();
            if i >= base.len() {
                j.surname = format!("{} {}", j.surname, i / base.len() + 1);
            }
            j
        })
        .collect()
}

fn cmd_jump(
    hill: &Hill,
    jumper: &Jumper,
    gate: Option<u32>,
    conditions: &JumpConditions,
    config: &EngineConfig,
    output: Option<&Path>,
) -> Result<()> {
    let gate = gate.unwrap_or_else(|| hill.middle_gate());
    let profile = HillProfile::new(hill, &JumpContext::new(jumper, hill))?;
    println!(
        "Jump: {} on {} (gate {}, wind {:+.1} m/s, seed {})",
        jumper, hill, gate, conditions.wind, conditions.seed
    );

    let result = run_jump_on(&profile, jumper, gate, conditions, config)?;
    let metrics = analyze(&profile, &result);

    println!();
    println!("=== Jump Result ===");
    println!("Takeoff:    {:.1} km/h ({:?}, {:+.0} ms)", result.takeoff_speed * 3.6, result.timing.class, result.timing.error_s * 1000.0);
    println!("Distance:   {:.1} m ({:.2} m measured)", result.distance, result.touchdown.distance);
    println!("Flight:     {:.2} s, apex {:.1} m at {:.1} m", metrics.flight_time, metrics.max_height, metrics.max_height_distance);
    println!("Landing:    {:.1} km/h, outrun {:.1} m", metrics.landing_speed * 3.6, metrics.outrun_distance);
    println!();
    println!("--- Points ---");
    println!("  Distance:  {:>6.1}", result.distance_points);
    let marks: Vec<String> = result.judges.marks.iter().map(|m| format!("{:.1}", m)).collect();
    println!(
        "  Style:     {:>6.1}  [{}]{}",
        result.style_points,
        marks.join(" "),
        if result.judges.telemark { " telemark" } else { "" }
    );
    println!("  Gate:      {:>+6.1}", result.gate_points);
    println!("  Wind:      {:>+6.1}", result.wind_points);
    println!("  Total:     {:>6.1}", result.total);

    if let Some(path) = output {
        write_json(path, &result)?;
    }
    Ok(())
}

fn cmd_competition(
    hill: &Hill,
    field: Vec<Jumper>,
    settings: CompetitionSettings,
    config: EngineConfig,
    output: Option<&Path>,
) -> Result<()> {
    println!(
        "Competition: {} jumpers on {} ({:?}, gate {}, seed {})",
        field.len(),
        hill,
        settings.mode,
        settings.gate,
        settings.seed
    );

    let mut competition = Competition::new(hill, field, settings, config)?;

    // Standings stream to a watcher thread that logs the current leader.
    let (mut tx, rx) = mpsc::channel::<Standings>();
    let watcher = thread::spawn(move || {
        for standings in rx {
            if let Some(leader) = standings.entries.first() {
                debug!(
                    round = standings.round,
                    jumps = standings.jumps_completed,
                    leader = %leader.jumper,
                    total = leader.total,
                    "standings"
                );
            }
        }
    });

    let cancel = cancel_on_ctrl_c();
    let outcome = competition.run_disqualifying_failures(&mut tx, &cancel);
    drop(tx);
    if watcher.join().is_err() {
        bail!("standings watcher panicked");
    }
    let phase = outcome?;
    if phase == CompetitionPhase::Completed {
        info!(?phase, "competition finished");
    } else {
        warn!(?phase, "competition interrupted, standings are partial");
    }

    let standings = competition.standings();
    print_standings(&standings);

    if let Some(path) = output {
        write_json(path, &standings)?;
    }
    Ok(())
}

/// Flag raised by Ctrl-C; the competition stops after the jump in progress.
fn cancel_on_ctrl_c() -> Arc<AtomicBool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "Ctrl-C handler unavailable");
                return;
            }
        };
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping after the current jump");
                flag.store(true, Ordering::Relaxed);
            }
        });
    });
    cancel
}

fn print_standings(standings: &Standings) {
    println!();
    println!("=== Standings ===");
    println!(
        "{:>4} {:<24} {:>7} {:>7} {:>7} {:>7} {:>8}",
        "Rank", "Jumper", "R1 m", "R1 pts", "R2 m", "R2 pts", "Total"
    );
    println!("{:-<70}", "");

    for e in &standings.entries {
        let rank = match e.rank {
            Some(r) => r.to_string(),
            None => "DSQ".to_string(),
        };
        let round = |i: usize| match e.rounds[i] {
            Some(s) => (format!("{:.1}", s.distance), format!("{:.1}", s.points)),
            None => ("-".to_string(), "-".to_string()),
        };
        let (d1, p1) = round(0);
        let (d2, p2) = round(1);
        let marker = if e.advanced { " *" } else { "" };
        println!(
            "{:>4} {:<24} {:>7} {:>7} {:>7} {:>7} {:>8.1}{}",
            rank, e.jumper, d1, p1, d2, p2, e.total, marker
        );
    }
}

fn cmd_hills() {
    println!(
        "{:<14} {:>4} {:>6} {:>6} {:>6} {:>6} {:>10}",
        "Hill", "Ctry", "K", "HS", "Gates", "Mid", "Meter val"
    );
    println!("{:-<60}", "");
    let scoring = ScoringConfig::default();
    for hill in catalog::hills() {
        println!(
            "{:<14} {:>4} {:>6.0} {:>6.0} {:>6} {:>6} {:>10.1}",
            hill.name,
            hill.country,
            hill.k,
            hill.hill_size(),
            hill.gates,
            hill.middle_gate(),
            skijump_sim::scoring::meter_value(hill.k, &scoring),
        );
    }
}
