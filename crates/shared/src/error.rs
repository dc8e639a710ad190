use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Hill, Jumper, Phase};

/// Who was jumping where, attached to every engine error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpContext {
    pub jumper: String,
    pub hill: String,
}

impl JumpContext {
    pub fn new(jumper: &Jumper, hill: &Hill) -> Self {
        Self {
            jumper: jumper.id(),
            hill: hill.id(),
        }
    }

    pub fn for_hill(hill: &Hill) -> Self {
        Self {
            jumper: String::new(),
            hill: hill.id(),
        }
    }
}

impl fmt::Display for JumpContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.jumper.is_empty() {
            write!(f, "{}", self.hill)
        } else {
            write!(f, "{} on {}", self.jumper, self.hill)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid configuration for {context}: {reason}")]
    InvalidConfiguration { context: JumpContext, reason: String },

    #[error("{phase} phase did not finish within {steps} steps ({context})")]
    NonConvergence {
        context: JumpContext,
        phase: Phase,
        steps: u32,
    },

    #[error("non-finite state in {phase} phase at t={time:.3}s ({context})")]
    NumericalInstability {
        context: JumpContext,
        phase: Phase,
        time: f64,
    },
}

impl SimulationError {
    pub fn invalid(context: JumpContext, reason: impl Into<String>) -> Self {
        SimulationError::InvalidConfiguration {
            context,
            reason: reason.into(),
        }
    }

    pub fn context(&self) -> &JumpContext {
        match self {
            SimulationError::InvalidConfiguration { context, .. }
            | SimulationError::NonConvergence { context, .. }
            | SimulationError::NumericalInstability { context, .. } => context,
        }
    }

    /// Phase the integrator was in, if integration had started.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            SimulationError::InvalidConfiguration { .. } => None,
            SimulationError::NonConvergence { phase, .. }
            | SimulationError::NumericalInstability { phase, .. } => Some(*phase),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompetitionError {
    #[error("round {round}, start {entrant}: {source}")]
    Jump {
        round: u8,
        entrant: usize,
        #[source]
        source: SimulationError,
    },

    #[error("competition setup rejected: {0}")]
    Setup(#[source] SimulationError),

    #[error("competition is already completed")]
    AlreadyCompleted,

    #[error("competition has no entrants")]
    NoEntrants,

    #[error("no jump is waiting to be resolved")]
    NothingToDisqualify,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_names_jumper_and_hill() {
        let err = SimulationError::NonConvergence {
            context: JumpContext {
                jumper: "Jan KOWALSKI".into(),
                hill: "Large Hill K-120 HS134".into(),
            },
            phase: Phase::Flight,
            steps: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("flight"), "{}", msg);
        assert!(msg.contains("Jan KOWALSKI on Large Hill K-120 HS134"), "{}", msg);
        assert_eq!(err.phase(), Some(Phase::Flight));
    }
}
