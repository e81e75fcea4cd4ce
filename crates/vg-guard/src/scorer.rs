// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Suspicion scoring policy
//!
//! Pure aggregation, no I/O. Weights from the registry check, the phase
//! validators and the detector sweep are folded into the guardian state;
//! the escalation decision is a function of the accumulated score and the
//! critical-condition flags. Suspicion never decays within an attempt —
//! a deliberate fail-closed bias.

use vg_common::types::Weight;

use crate::state::GuardianState;

/// Why the guardian escalated to recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationCause {
    /// Accumulated low-grade suspicion crossed the threshold
    ThresholdExceeded,
    /// A critical registry target mismatched
    CriticalMismatch,
    /// A container/fake-environment trap indicator fired
    ContainerTrap,
    /// The phase sequence was bypassed
    PhaseBypass,
}

impl EscalationCause {
    /// Human-readable cause for the recovery notice
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdExceeded => "accumulated suspicion over threshold",
            Self::CriticalMismatch => "critical boot target mismatch",
            Self::ContainerTrap => "container trap detected",
            Self::PhaseBypass => "boot phase sequence bypassed",
        }
    }
}

/// Escalation decision after folding one phase's findings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationDecision {
    /// Keep validating
    Continue,
    /// Transfer control to the recovery orchestrator
    Escalate(EscalationCause),
}

/// Suspicion scorer
#[derive(Debug, Clone, Copy)]
pub struct SuspicionScorer {
    threshold: u32,
}

impl SuspicionScorer {
    /// Create a scorer with the configured escalation threshold
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Get the escalation threshold
    #[must_use]
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Fold a weight into the state
    pub fn apply(&self, state: &mut GuardianState, weight: Weight) {
        state.add_suspicion(weight);
    }

    /// Decide whether to escalate
    ///
    /// Priority order matters only for the reported cause: any critical
    /// condition escalates regardless of the running score, and the score
    /// threshold escalates regardless of critical conditions.
    #[must_use]
    pub fn decide(
        &self,
        state: &GuardianState,
        critical_mismatch: bool,
        trap_detected: bool,
        phase_bypass: bool,
    ) -> EscalationDecision {
        if critical_mismatch {
            return EscalationDecision::Escalate(EscalationCause::CriticalMismatch);
        }
        if trap_detected {
            return EscalationDecision::Escalate(EscalationCause::ContainerTrap);
        }
        if phase_bypass {
            return EscalationDecision::Escalate(EscalationCause::PhaseBypass);
        }
        if state.suspicion_score.exceeds(self.threshold) {
            return EscalationDecision::Escalate(EscalationCause::ThresholdExceeded);
        }
        EscalationDecision::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_common::time::Ticks;

    fn fresh_state() -> GuardianState {
        GuardianState::new(Ticks::new(0), true)
    }

    #[test]
    fn test_score_accumulates_monotonically() {
        let scorer = SuspicionScorer::new(1000);
        let mut state = fresh_state();

        let mut previous = 0;
        for weight in [100, 0, 250, 400] {
            scorer.apply(&mut state, Weight::new(weight));
            assert!(state.suspicion_score.value() >= previous);
            previous = state.suspicion_score.value();
        }
        assert_eq!(state.suspicion_score.value(), 750);
    }

    #[test]
    fn test_critical_mismatch_escalates_at_score_zero() {
        let scorer = SuspicionScorer::new(1000);
        let state = fresh_state();

        assert_eq!(
            scorer.decide(&state, true, false, false),
            EscalationDecision::Escalate(EscalationCause::CriticalMismatch)
        );
    }

    #[test]
    fn test_trap_escalates_regardless_of_score() {
        let scorer = SuspicionScorer::new(1000);
        let state = fresh_state();

        assert_eq!(
            scorer.decide(&state, false, true, false),
            EscalationDecision::Escalate(EscalationCause::ContainerTrap)
        );
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let scorer = SuspicionScorer::new(1000);
        let mut state = fresh_state();

        scorer.apply(&mut state, Weight::new(1000));
        assert_eq!(
            scorer.decide(&state, false, false, false),
            EscalationDecision::Continue
        );

        scorer.apply(&mut state, Weight::new(1));
        assert_eq!(
            scorer.decide(&state, false, false, false),
            EscalationDecision::Escalate(EscalationCause::ThresholdExceeded)
        );
    }

    #[test]
    fn test_phase_bypass_escalates() {
        let scorer = SuspicionScorer::new(1000);
        let state = fresh_state();

        assert_eq!(
            scorer.decide(&state, false, false, true),
            EscalationDecision::Escalate(EscalationCause::PhaseBypass)
        );
    }

    #[test]
    fn test_soft_weights_sum_to_escalation() {
        let scorer = SuspicionScorer::new(1000);
        let mut state = fresh_state();

        // Three soft mismatches at 400 each: no single critical failure
        for _ in 0..3 {
            scorer.apply(&mut state, Weight::new(400));
        }
        assert_eq!(
            scorer.decide(&state, false, false, false),
            EscalationDecision::Escalate(EscalationCause::ThresholdExceeded)
        );
    }
}
