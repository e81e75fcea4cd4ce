// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Guardian state
//!
//! One [`GuardianState`] exists per boot attempt. It is an explicit context
//! object owned by the phase controller — never a process-wide global — and
//! is created zeroed at initialization and discarded with the attempt.
//! Nothing here persists across boots: every attempt starts at `PreBoot`
//! with score zero.

use vg_common::time::Ticks;
use vg_common::types::{SuspicionScore, Weight};
use vg_common::BootPhase;

/// Mutable guardian state for one boot attempt
#[derive(Debug, Clone)]
pub struct GuardianState {
    /// Current boot phase
    pub current_phase: BootPhase,
    /// Cumulative suspicion score (monotonically non-decreasing)
    pub suspicion_score: SuspicionScore,
    /// Switcheroo detected (sticky for the attempt)
    pub switcheroo_detected: bool,
    /// Number of boot-path redirections observed
    pub redirection_count: u32,
    /// Timestamp of initialization
    pub boot_start_time: Ticks,
    /// Timestamp of the most recent phase validation
    pub last_phase_time: Ticks,
    /// Most recent phase verdict
    pub integrity_valid: bool,
    /// Recovery is enabled for this attempt
    pub recovery_enabled: bool,
    /// Authorized immutable recovery media detected at initialization
    pub immutable_media_present: bool,
    /// Guardian entered fail-secure halt
    pub halted: bool,
    /// Bitmask of phase ordinals that have been validated
    validated_phases: u8,
    /// A critical mismatch occurred during this attempt
    critical_failure: bool,
}

impl GuardianState {
    /// Create a fresh state for a new boot attempt
    #[must_use]
    pub const fn new(boot_start_time: Ticks, recovery_enabled: bool) -> Self {
        Self {
            current_phase: BootPhase::PreBoot,
            suspicion_score: SuspicionScore::ZERO,
            switcheroo_detected: false,
            redirection_count: 0,
            boot_start_time,
            last_phase_time: boot_start_time,
            integrity_valid: false,
            recovery_enabled,
            immutable_media_present: false,
            halted: false,
            validated_phases: 0,
            critical_failure: false,
        }
    }

    /// Add an anomaly weight to the suspicion score
    ///
    /// The score only ever grows; there is no decay within an attempt.
    pub fn add_suspicion(&mut self, weight: Weight) {
        self.suspicion_score.add(weight);
    }

    /// Mark a switcheroo as detected (sticky)
    pub fn mark_switcheroo(&mut self) {
        self.switcheroo_detected = true;
    }

    /// Record a boot-path redirection
    pub fn record_redirection(&mut self) {
        self.redirection_count = self.redirection_count.saturating_add(1);
        self.mark_switcheroo();
    }

    /// Record a critical integrity failure (sticky)
    pub fn record_critical_failure(&mut self) {
        self.critical_failure = true;
    }

    /// Check whether a critical failure occurred during this attempt
    #[must_use]
    pub const fn has_critical_failure(&self) -> bool {
        self.critical_failure
    }

    /// Mark a phase as validated (visited)
    pub fn mark_phase_validated(&mut self, phase: BootPhase) {
        self.validated_phases |= 1 << phase.ordinal();
    }

    /// Check whether a phase has been validated this attempt
    #[must_use]
    pub const fn phase_validated(&self, phase: BootPhase) -> bool {
        self.validated_phases & (1 << phase.ordinal()) != 0
    }

    /// Count phases before `Complete` that were never validated
    #[must_use]
    pub fn unvalidated_phase_count(&self) -> u32 {
        let prior_mask = (1u8 << BootPhase::Complete.ordinal()) - 1;
        (!self.validated_phases & prior_mask).count_ones()
    }

    /// Enter the fail-secure halt state
    pub fn halt(&mut self) {
        self.halted = true;
        self.integrity_valid = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_starts_clean() {
        let state = GuardianState::new(Ticks::new(42), true);
        assert_eq!(state.current_phase, BootPhase::PreBoot);
        assert_eq!(state.suspicion_score, SuspicionScore::ZERO);
        assert!(!state.switcheroo_detected);
        assert!(!state.halted);
        assert_eq!(state.unvalidated_phase_count(), 5);
    }

    #[test]
    fn test_switcheroo_flag_is_sticky() {
        let mut state = GuardianState::new(Ticks::new(0), true);
        state.mark_switcheroo();
        assert!(state.switcheroo_detected);
        // No API exists to clear it short of a new attempt
        state.add_suspicion(Weight::ZERO);
        assert!(state.switcheroo_detected);
    }

    #[test]
    fn test_phase_validation_tracking() {
        let mut state = GuardianState::new(Ticks::new(0), true);
        state.mark_phase_validated(BootPhase::PreBoot);
        state.mark_phase_validated(BootPhase::Bootloader);

        assert!(state.phase_validated(BootPhase::PreBoot));
        assert!(!state.phase_validated(BootPhase::Kernel));
        assert_eq!(state.unvalidated_phase_count(), 3);

        for phase in [
            BootPhase::Initramfs,
            BootPhase::Kernel,
            BootPhase::Filesystem,
        ] {
            state.mark_phase_validated(phase);
        }
        assert_eq!(state.unvalidated_phase_count(), 0);
    }

    #[test]
    fn test_redirection_sets_switcheroo() {
        let mut state = GuardianState::new(Ticks::new(0), true);
        state.record_redirection();
        assert_eq!(state.redirection_count, 1);
        assert!(state.switcheroo_detected);
    }
}
