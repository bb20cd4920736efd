//! Worker lifecycle states.
//!
//! ```text
//! installing ─┬─> waiting ──┬─> activating ─> active ─> superseded
//!             │             └─> superseded
//!             └─> activating
//! ```
//!
//! A worker goes straight from `installing` to `activating` when activation is
//! automatic, and parks in `waiting` when activation is gated on the page.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Lifecycle state of one worker (and therefore of its cache generation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Seed assets are being fetched into the new generation.
    Installing,
    /// Installed, waiting for an explicit activate-now command.
    Waiting,
    /// Old generations are being removed and control claimed.
    Activating,
    /// Controls pages; its generation is the only one in storage.
    Active,
    /// Replaced by a newer worker.
    Superseded,
}

impl WorkerState {
    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        matches!(
            (self, next),
            (Installing, Waiting)
                | (Installing, Activating)
                | (Waiting, Activating)
                | (Waiting, Superseded)
                | (Activating, Active)
                | (Active, Superseded)
        )
    }

    /// Validate a transition, returning the new state.
    pub fn transition(self, next: WorkerState) -> Result<WorkerState, Error> {
        if self.can_transition_to(next) { Ok(next) } else { Err(Error::InvalidTransition { from: self, to: next }) }
    }

    /// Whether a worker in this state serves intercepted fetches.
    ///
    /// An activating worker already owns the active slot and its generation is
    /// fully seeded.
    pub fn can_intercept_fetch(self) -> bool {
        matches!(self, WorkerState::Activating | WorkerState::Active)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Superseded => "superseded",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerState::*;
    use super::*;

    #[test]
    fn test_gated_path() {
        let state = Installing.transition(Waiting).unwrap();
        let state = state.transition(Activating).unwrap();
        let state = state.transition(Active).unwrap();
        assert_eq!(state.transition(Superseded).unwrap(), Superseded);
    }

    #[test]
    fn test_auto_path_skips_waiting() {
        assert!(Installing.can_transition_to(Activating));
    }

    #[test]
    fn test_illegal_transitions() {
        let illegal = [
            (Installing, Active),
            (Waiting, Active),
            (Active, Waiting),
            (Active, Activating),
            (Superseded, Active),
            (Superseded, Installing),
            (Activating, Superseded),
        ];
        for (from, to) in illegal {
            assert!(!from.can_transition_to(to), "{from} -> {to} should be rejected");
            assert!(matches!(from.transition(to), Err(Error::InvalidTransition { .. })));
        }
    }

    #[test]
    fn test_intercepting_states() {
        for state in [Installing, Waiting, Superseded] {
            assert!(!state.can_intercept_fetch());
        }
        assert!(Activating.can_intercept_fetch());
        assert!(Active.can_intercept_fetch());
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Waiting).unwrap(), "\"waiting\"");
    }
}
