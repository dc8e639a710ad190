use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skijump_shared::*;
use tracing::{info, warn};

use crate::compensation::resolve_gate;
use crate::hill_profile::HillProfile;
use crate::jump_loop::run_jump_on;
use crate::scoring::ranking_order;

/// Receives a ranking snapshot after every resolved jump.
pub trait StandingsSink {
    fn publish(&mut self, standings: &Standings);
}

/// Unbounded channel: sending never blocks the competition.
impl StandingsSink for mpsc::Sender<Standings> {
    fn publish(&mut self, standings: &Standings) {
        // A dropped receiver only means nobody is watching.
        let _ = self.send(standings.clone());
    }
}

/// Bounded channel: snapshots are dropped while the consumer lags behind.
impl StandingsSink for mpsc::SyncSender<Standings> {
    fn publish(&mut self, standings: &Standings) {
        let _ = self.try_send(standings.clone());
    }
}

impl StandingsSink for Vec<Standings> {
    fn publish(&mut self, standings: &Standings) {
        self.push(standings.clone());
    }
}

/// Discards every snapshot.
pub struct NullSink;

impl StandingsSink for NullSink {
    fn publish(&mut self, _standings: &Standings) {}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionSettings {
    pub mode: CompetitionMode,
    pub gate: u32,
    /// Mean wind (m/s, positive headwind).
    pub wind: f64,
    /// Each jump draws its wind uniformly within `wind ± wind_variation`.
    pub wind_variation: f64,
    pub perfect_timing: bool,
    pub seed: u64,
}

impl Default for CompetitionSettings {
    fn default() -> Self {
        Self {
            mode: CompetitionMode::Individual,
            gate: 1,
            wind: 0.0,
            wind_variation: 0.0,
            perfect_timing: false,
            seed: 0,
        }
    }
}

/// What a call to [`Competition::step`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepEvent {
    Jumped { round: u8, entrant: usize, total: f64 },
    RoundStarted(u8),
}

/// Seed for one jump, derived from the competition seed, round and start.
pub fn jump_seed(seed: u64, round: u8, entrant: usize) -> u64 {
    let slot = ((round as u64) << 32) | entrant as u64;
    seed ^ slot.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Two-round individual competition (or one-round qualification) on one hill.
#[derive(Debug, Clone)]
pub struct Competition {
    profile: HillProfile,
    entrants: Vec<Jumper>,
    settings: CompetitionSettings,
    config: EngineConfig,
    phase: CompetitionPhase,
    start_list: Vec<usize>,
    cursor: usize,
    results: [Vec<Option<JumpResult>>; 2],
    disqualified: Vec<bool>,
    advancing: Vec<usize>,
    jumps_completed: usize,
}

impl Competition {
    pub fn new(
        hill: &Hill,
        entrants: Vec<Jumper>,
        settings: CompetitionSettings,
        config: EngineConfig,
    ) -> Result<Self, CompetitionError> {
        if entrants.is_empty() {
            return Err(CompetitionError::NoEntrants);
        }
        let context = JumpContext::for_hill(hill);
        let profile = HillProfile::new(hill, &context).map_err(CompetitionError::Setup)?;
        resolve_gate(hill, settings.gate, &config.compensation, &context)
            .map_err(CompetitionError::Setup)?;
        if !settings.wind.is_finite() {
            return Err(CompetitionError::Setup(SimulationError::invalid(
                context,
                "mean wind is not a finite number",
            )));
        }
        // The per-jump draw spans 2 * wind_variation, which must stay finite.
        if !(settings.wind_variation >= 0.0 && (2.0 * settings.wind_variation).is_finite()) {
            return Err(CompetitionError::Setup(SimulationError::invalid(
                context,
                "wind variation must be a finite number >= 0",
            )));
        }
        let n = entrants.len();
        Ok(Self {
            profile,
            entrants,
            settings,
            config,
            phase: CompetitionPhase::NotStarted,
            start_list: Vec::new(),
            cursor: 0,
            results: [vec![None; n], vec![None; n]],
            disqualified: vec![false; n],
            advancing: Vec::new(),
            jumps_completed: 0,
        })
    }

    pub fn phase(&self) -> CompetitionPhase {
        self.phase
    }

    pub fn hill(&self) -> &Hill {
        self.profile.hill()
    }

    pub fn profile(&self) -> &HillProfile {
        &self.profile
    }

    pub fn entrants(&self) -> &[Jumper] {
        &self.entrants
    }

    /// Current round, 1 or 2; 0 before the start.
    pub fn round(&self) -> u8 {
        match self.phase {
            CompetitionPhase::NotStarted => 0,
            CompetitionPhase::Round1InProgress | CompetitionPhase::Round1Complete => 1,
            CompetitionPhase::Round2InProgress => 2,
            CompetitionPhase::Completed => match self.settings.mode {
                CompetitionMode::Individual => 2,
                CompetitionMode::Qualification => 1,
            },
        }
    }

    pub fn start_list(&self) -> &[usize] {
        &self.start_list
    }

    /// Entrant due to jump next, if a round is in progress.
    pub fn current_entrant(&self) -> Option<usize> {
        match self.phase {
            CompetitionPhase::Round1InProgress | CompetitionPhase::Round2InProgress => {
                self.start_list.get(self.cursor).copied()
            }
            _ => None,
        }
    }

    /// Results of `round` (1 or 2), indexed by entrant.
    pub fn results(&self, round: u8) -> &[Option<JumpResult>] {
        let i = if round >= 2 { 1 } else { 0 };
        &self.results[i]
    }

    /// Entrants that made the cut, in round-1 ranking order.
    pub fn advancing(&self) -> &[usize] {
        &self.advancing
    }

    pub fn is_disqualified(&self, entrant: usize) -> bool {
        self.disqualified.get(entrant).copied().unwrap_or(false)
    }

    pub fn total(&self, entrant: usize) -> f64 {
        self.results
            .iter()
            .filter_map(|r| r[entrant].as_ref())
            .map(|r| r.total)
            .sum()
    }

    /// How many jumpers go through after round 1.
    pub fn cut_size(&self) -> usize {
        let c = &self.config.competition;
        match self.settings.mode {
            CompetitionMode::Individual => c.final_round_size,
            CompetitionMode::Qualification if self.hill().is_flying_hill() => c.qualification_limit_flying,
            CompetitionMode::Qualification => c.qualification_limit,
        }
    }

    pub fn conditions_for(&self, round: u8, entrant: usize) -> JumpConditions {
        let seed = jump_seed(self.settings.seed, round, entrant);
        let mut wind = self.settings.wind;
        if self.settings.wind_variation > 0.0 {
            let mut rng = Pcg64::seed_from_u64(seed.rotate_left(29));
            let v = self.settings.wind_variation;
            wind += rng.gen_range(-v..=v);
        }
        JumpConditions {
            wind,
            perfect_timing: self.settings.perfect_timing,
            seed,
        }
    }

    fn simulate(&self, round: u8, entrant: usize) -> Result<JumpResult, SimulationError> {
        let conditions = self.conditions_for(round, entrant);
        run_jump_on(
            &self.profile,
            &self.entrants[entrant],
            self.settings.gate,
            &conditions,
            &self.config,
        )
    }

    fn start(&mut self) {
        self.start_list = (0..self.entrants.len()).collect();
        self.cursor = 0;
        self.phase = CompetitionPhase::Round1InProgress;
        info!(
            hill = %self.hill(),
            entrants = self.entrants.len(),
            gate = self.settings.gate,
            "round 1 started"
        );
    }

    /// Performs one jump, or opens round 2 once round 1 is complete.
    ///
    /// A failed jump leaves the competition untouched; call
    /// [`disqualify_current`](Self::disqualify_current) to move past it.
    pub fn step(&mut self, sink: &mut dyn StandingsSink) -> Result<StepEvent, CompetitionError> {
        match self.phase {
            CompetitionPhase::Completed => Err(CompetitionError::AlreadyCompleted),
            CompetitionPhase::Round1Complete => {
                self.start_round_two();
                sink.publish(&self.standings());
                Ok(StepEvent::RoundStarted(2))
            }
            CompetitionPhase::NotStarted => {
                self.start();
                self.jump_next(sink)
            }
            CompetitionPhase::Round1InProgress | CompetitionPhase::Round2InProgress => {
                self.jump_next(sink)
            }
        }
    }

    fn jump_next(&mut self, sink: &mut dyn StandingsSink) -> Result<StepEvent, CompetitionError> {
        let round = self.round();
        let entrant = self.start_list[self.cursor];
        let result = self.simulate(round, entrant).map_err(|source| CompetitionError::Jump {
            round,
            entrant,
            source,
        })?;
        let total = result.total;
        self.record(round, entrant, result, sink);
        Ok(StepEvent::Jumped {
            round,
            entrant,
            total,
        })
    }

    fn record(&mut self, round: u8, entrant: usize, result: JumpResult, sink: &mut dyn StandingsSink) {
        self.results[(round - 1) as usize][entrant] = Some(result);
        self.jumps_completed += 1;
        self.advance_cursor();
        sink.publish(&self.standings());
    }

    fn advance_cursor(&mut self) {
        self.cursor += 1;
        if self.cursor >= self.start_list.len() {
            self.finish_round();
        }
    }

    /// Disqualifies the jumper whose jump just failed (or is next) and moves on.
    pub fn disqualify_current(&mut self, sink: &mut dyn StandingsSink) -> Result<usize, CompetitionError> {
        let entrant = self
            .current_entrant()
            .ok_or(CompetitionError::NothingToDisqualify)?;
        warn!(
            jumper = %self.entrants[entrant],
            round = self.round(),
            "jumper disqualified"
        );
        self.disqualified[entrant] = true;
        self.advance_cursor();
        sink.publish(&self.standings());
        Ok(entrant)
    }

    fn finish_round(&mut self) {
        match self.phase {
            CompetitionPhase::Round1InProgress => {
                let order = self.round_one_order();
                let cut = self.cut_size().min(order.len());
                self.advancing = order[..cut].to_vec();
                info!(
                    jumped = order.len(),
                    advancing = self.advancing.len(),
                    "round 1 complete"
                );
                self.phase = match self.settings.mode {
                    CompetitionMode::Individual => CompetitionPhase::Round1Complete,
                    CompetitionMode::Qualification => CompetitionPhase::Completed,
                };
            }
            CompetitionPhase::Round2InProgress => {
                info!("final round complete");
                self.phase = CompetitionPhase::Completed;
            }
            _ => {}
        }
    }

    /// Scored entrants of round 1, best first; ties keep the entry order.
    fn round_one_order(&self) -> Vec<usize> {
        let scored: Vec<usize> = (0..self.entrants.len())
            .filter(|&i| !self.disqualified[i] && self.results[0][i].is_some())
            .collect();
        let totals: Vec<f64> = scored.iter().map(|&i| self.total(i)).collect();
        ranking_order(&totals).into_iter().map(|k| scored[k]).collect()
    }

    fn start_round_two(&mut self) {
        // Best of round 1 jumps last.
        self.start_list = self.advancing.iter().rev().copied().collect();
        self.cursor = 0;
        if self.start_list.is_empty() {
            self.phase = CompetitionPhase::Completed;
            return;
        }
        self.phase = CompetitionPhase::Round2InProgress;
        info!(finalists = self.start_list.len(), "round 2 started");
    }

    /// Drives the competition to the end, checking `cancel` between jumps.
    ///
    /// Returns the phase reached; a failed jump stops the run with its error.
    pub fn run(
        &mut self,
        sink: &mut dyn StandingsSink,
        cancel: &AtomicBool,
    ) -> Result<CompetitionPhase, CompetitionError> {
        while self.phase != CompetitionPhase::Completed {
            if cancel.load(Ordering::Relaxed) {
                info!(phase = ?self.phase, "competition cancelled");
                break;
            }
            if self.config.competition.parallel
                && matches!(
                    self.phase,
                    CompetitionPhase::Round1InProgress | CompetitionPhase::Round2InProgress
                )
            {
                self.run_round_parallel(sink)?;
            } else {
                self.step(sink)?;
            }
        }
        Ok(self.phase)
    }

    /// Like [`run`](Self::run), but a failed jump disqualifies that jumper and the
    /// competition carries on. Any other error is returned.
    pub fn run_disqualifying_failures(
        &mut self,
        sink: &mut dyn StandingsSink,
        cancel: &AtomicBool,
    ) -> Result<CompetitionPhase, CompetitionError> {
        loop {
            match self.run(sink, cancel) {
                Err(CompetitionError::Jump {
                    round,
                    entrant,
                    source,
                }) => {
                    warn!(round, entrant, error = %source, "jump failed");
                    self.disqualify_current(sink)?;
                }
                outcome => return outcome,
            }
        }
    }

    /// Simulates the rest of the current round's start list in parallel.
    ///
    /// Results come back in start order and match what sequential steps would produce.
    pub fn simulate_round_parallel(&self) -> Vec<(usize, Result<JumpResult, SimulationError>)> {
        let round = self.round();
        let pending: &[usize] = match self.phase {
            CompetitionPhase::Round1InProgress | CompetitionPhase::Round2InProgress => {
                &self.start_list[self.cursor..]
            }
            _ => &[],
        };
        pending
            .par_iter()
            .map(|&entrant| (entrant, self.simulate(round, entrant)))
            .collect()
    }

    /// Applies [`simulate_round_parallel`](Self::simulate_round_parallel) in start order,
    /// stopping at the first failed jump.
    pub fn run_round_parallel(&mut self, sink: &mut dyn StandingsSink) -> Result<(), CompetitionError> {
        if self.phase == CompetitionPhase::NotStarted {
            self.start();
        }
        let round = self.round();
        for (entrant, outcome) in self.simulate_round_parallel() {
            match outcome {
                Ok(result) => self.record(round, entrant, result, sink),
                Err(source) => {
                    return Err(CompetitionError::Jump {
                        round,
                        entrant,
                        source,
                    })
                }
            }
        }
        Ok(())
    }

    /// Current ranking by cumulative total; finalists rank ahead of the rest.
    pub fn standings(&self) -> Standings {
        let in_final = |i: usize| self.advancing.contains(&i) && self.settings.mode == CompetitionMode::Individual;
        let mut shown: Vec<usize> = (0..self.entrants.len())
            .filter(|&i| self.disqualified[i] || self.results.iter().any(|r| r[i].is_some()))
            .collect();
        shown.sort_by(|&a, &b| {
            self.disqualified[a]
                .cmp(&self.disqualified[b])
                .then(in_final(b).cmp(&in_final(a)))
                .then(self.total(b).total_cmp(&self.total(a)))
        });

        let mut entries: Vec<StandingEntry> = Vec::with_capacity(shown.len());
        for (pos, &i) in shown.iter().enumerate() {
            let rank = if self.disqualified[i] {
                None
            } else {
                match entries.last() {
                    Some(prev)
                        if !prev.disqualified
                            && in_final(prev.entrant) == in_final(i)
                            && (prev.total - self.total(i)).abs() < 1e-9 =>
                    {
                        prev.rank
                    }
                    _ => Some(pos + 1),
                }
            };
            entries.push(StandingEntry {
                rank,
                entrant: i,
                jumper: self.entrants[i].id(),
                rounds: [0, 1].map(|r| {
                    self.results[r][i].as_ref().map(|j| RoundScore {
                        distance: j.distance,
                        points: j.total,
                    })
                }),
                total: self.total(i),
                disqualified: self.disqualified[i],
                advanced: self.advancing.contains(&i),
            });
        }

        Standings {
            phase: self.phase,
            round: self.round(),
            jumps_completed: self.jumps_completed,
            entries,
        }
    }

    /// Entrant indices in final order. Meaningful once completed.
    pub fn final_ranking(&self) -> Vec<usize> {
        self.standings()
            .entries
            .into_iter()
            .filter(|e| !e.disqualified)
            .map(|e| e.entrant)
            .collect()
    }
}
