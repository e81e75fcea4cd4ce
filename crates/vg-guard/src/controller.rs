// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Phase controller
//!
//! The central state machine. The hosting boot environment calls
//! [`Guardian::validate_phase`] at fixed points in the boot sequence; each
//! call runs the phase-specific validator, the boot-path check against the
//! registry, and the detector sweep, folds every finding into the suspicion
//! score, and transfers control to the recovery orchestrator when policy
//! thresholds are crossed.
//!
//! Phase ordering is enforced: ordinals never regress within an attempt and
//! `Complete` is terminal. An out-of-order request is itself treated as a
//! bypass attempt — scored and refused.

use heapless::Vec;

use vg_common::constants::MAX_AUTHORIZED_MEDIA;
use vg_common::log::LogBuffer;
use vg_common::time::Ticks;
use vg_common::types::Weight;
use vg_common::{log_debug, log_error, log_info, log_warn};
use vg_common::{BootPhase, Error, GuardianConfig, Result};
use vg_platform::{
    Clock, Console, DigestOracle, EnvProbe, FsProbe, MediaEnumerator, RecoveryFetch,
    RecoveryLoader, SignatureVerifier,
};
use vg_recover::{authenticate, PhysicalMediaId, RecoveryIo, RecoveryOrchestrator};

use crate::detector::{DetectContext, DetectorSet};
use crate::registry::{BootTarget, CheckOutcome, TargetRegistry};
use crate::scorer::{EscalationCause, EscalationDecision, SuspicionScorer};
use crate::state::GuardianState;
use crate::status::StatusSnapshot;

const MODULE: &str = "controller";

/// Platform capabilities borrowed by the guardian for one boot attempt
pub struct Platform<'p> {
    /// Digest computation
    pub oracle: &'p dyn DigestOracle,
    /// Filesystem queries and boot-path resolution
    pub fs: &'p dyn FsProbe,
    /// Pre-boot environment checks
    pub env: &'p dyn EnvProbe,
    /// Removable media enumeration
    pub media: &'p dyn MediaEnumerator,
    /// Network recovery delivery
    pub fetch: &'p mut dyn RecoveryFetch,
    /// Recovery environment handoff
    pub loader: &'p mut dyn RecoveryLoader,
    /// Detached-signature verification
    pub verifier: &'p dyn SignatureVerifier,
    /// Operator console
    pub console: &'p mut dyn Console,
    /// Monotonic clock
    pub clock: &'p mut dyn Clock,
}

/// Integrity verdict for one `validate_phase` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseVerdict {
    /// Phase passed validation
    pub valid: bool,
    /// Score contributed by this call
    pub score_delta: Weight,
    /// Escalation occurred and a recovery tier accepted the handoff
    pub recovered: bool,
}

/// The boot-chain integrity guardian
///
/// Owns all mutable state for one boot attempt. There is no process-wide
/// instance: the hosting environment creates a guardian at the firmware
/// handoff and discards it with the attempt.
pub struct Guardian<'p> {
    config: GuardianConfig,
    state: GuardianState,
    scorer: SuspicionScorer,
    registry: TargetRegistry,
    detectors: DetectorSet<'p>,
    authorized_media: Vec<PhysicalMediaId, MAX_AUTHORIZED_MEDIA>,
    log: LogBuffer,
    platform: Platform<'p>,
}

impl<'p> Guardian<'p> {
    /// Initialize the guardian for a new boot attempt
    ///
    /// Loads the boot target registry and the authorized-media whitelist
    /// from trusted configuration, probes for immutable recovery media, and
    /// allocates zeroed state.
    ///
    /// # Errors
    /// `NotInitialized` when the registry or media configuration cannot be
    /// loaded (duplicate paths, table overflow).
    pub fn initialize(
        config: GuardianConfig,
        targets: &[BootTarget],
        authorized_media: &[PhysicalMediaId],
        detectors: DetectorSet<'p>,
        platform: Platform<'p>,
    ) -> Result<Self> {
        let registry = TargetRegistry::load(targets).map_err(|_| Error::NotInitialized)?;

        let mut media_list: Vec<PhysicalMediaId, MAX_AUTHORIZED_MEDIA> = Vec::new();
        for id in authorized_media {
            media_list.push(*id).map_err(|_| Error::NotInitialized)?;
        }

        let now = platform.clock.now();
        let mut state = GuardianState::new(now, config.recovery.enabled);

        // Probe for authorized immutable recovery media up front so the
        // status snapshot can answer "would tier 1 have a candidate".
        state.immutable_media_present = platform.media.removable_media().iter().any(|candidate| {
            authenticate(candidate, &media_list, config.recovery.require_immutable_media).is_ok()
        });

        let mut log = LogBuffer::new();
        log_info!(
            log,
            now,
            BootPhase::PreBoot,
            MODULE,
            "initialized: {} targets, {} media, immutable media {}",
            registry.len(),
            media_list.len(),
            state.immutable_media_present
        );

        Ok(Self {
            config,
            state,
            scorer: SuspicionScorer::new(config.escalation_threshold),
            registry,
            detectors,
            authorized_media: media_list,
            log,
            platform,
        })
    }

    /// Validate one boot phase
    ///
    /// May trigger recovery synchronously before returning. After any
    /// escalation the guardian halts normal progression: later calls return
    /// `GuardianHalted`.
    pub fn validate_phase(&mut self, phase: BootPhase) -> Result<PhaseVerdict> {
        if self.state.halted {
            return Err(Error::GuardianHalted);
        }

        let now = self.platform.clock.now();

        // Ordering policy: Complete is terminal and ordinals never regress.
        // A violating request is scored as a bypass attempt and refused.
        if self.state.phase_validated(BootPhase::Complete)
            || phase.ordinal() < self.state.current_phase.ordinal()
        {
            self.scorer
                .apply(&mut self.state, Weight::new(self.config.weights.phase_bypass));
            self.state.mark_switcheroo();
            log_error!(
                self.log,
                now,
                phase,
                MODULE,
                "phase transition {} -> {} refused",
                self.state.current_phase,
                phase
            );
            return Err(Error::UnauthorizedPhaseTransition);
        }

        self.state.current_phase = phase;
        self.state.last_phase_time = now;

        let score_before = self.state.suspicion_score;
        let mut phase_valid = true;
        let mut critical = false;
        let mut bypass = false;

        // Detector sweep first: the Complete validator must see the final
        // score, including pattern and trap contributions from this call.
        let report = self.detectors.scan(&DetectContext {
            phase,
            fs: self.platform.fs,
            env: self.platform.env,
        });
        for finding in &report.findings {
            log_warn!(
                self.log,
                now,
                phase,
                "detector",
                "indicator {} (+{})",
                finding.indicator,
                finding.weight.value()
            );
        }
        if report.score_delta > Weight::ZERO {
            self.scorer.apply(&mut self.state, report.score_delta);
            phase_valid = false;
        }
        let trap = report.trap_detected;
        if trap {
            self.state.mark_switcheroo();
        }

        match phase {
            BootPhase::PreBoot => self.validate_preboot(now, &mut phase_valid),
            BootPhase::Bootloader
            | BootPhase::Initramfs
            | BootPhase::Kernel
            | BootPhase::Filesystem => {
                self.validate_artifact_phase(phase, now, &mut phase_valid, &mut critical);
            }
            BootPhase::Complete => self.validate_complete(now, &mut phase_valid, &mut bypass),
        }

        self.state.mark_phase_validated(phase);
        if critical {
            self.state.record_critical_failure();
        }

        let score_delta = Weight::new(
            self.state
                .suspicion_score
                .value()
                .saturating_sub(score_before.value()),
        );

        match self.scorer.decide(&self.state, critical, trap, bypass) {
            EscalationDecision::Continue => {
                self.state.integrity_valid = phase_valid;
                log_debug!(
                    self.log,
                    now,
                    phase,
                    MODULE,
                    "phase {} done: valid {}, +{}",
                    phase,
                    phase_valid,
                    score_delta.value()
                );
                Ok(PhaseVerdict {
                    valid: phase_valid,
                    score_delta,
                    recovered: false,
                })
            }
            EscalationDecision::Escalate(cause) => self.escalate(cause, now, score_delta),
        }
    }

    /// Read-only status projection
    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            phase: self.state.current_phase,
            integrity_valid: self.state.integrity_valid,
            switcheroo_detected: self.state.switcheroo_detected,
            score: self.state.suspicion_score,
            redirection_count: self.state.redirection_count,
            registry_targets: self.registry.len(),
            recovery_enabled: self.state.recovery_enabled,
            immutable_media_present: self.state.immutable_media_present,
            halted: self.state.halted,
        }
    }

    /// Write the status snapshot to the operator console and return it
    pub fn print_status(&mut self) -> StatusSnapshot {
        let snapshot = self.status();
        let mut buf = heapless::String::<512>::new();
        if core::fmt::write(&mut buf, format_args!("{snapshot}")).is_ok() {
            for line in buf.lines() {
                self.platform.console.write_line(line);
            }
        }
        snapshot
    }

    /// Diagnostic log access
    #[must_use]
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    // ========================================================================
    // Phase validators
    // ========================================================================

    /// Pre-boot: validate the guardian's own execution environment
    ///
    /// Tamper in the calling environment is scored like any other anomaly;
    /// none of these checks is individually critical, but together they can
    /// cross the threshold before a single artifact is measured.
    fn validate_preboot(&mut self, now: Ticks, phase_valid: &mut bool) {
        let weights = self.config.weights;

        if self.platform.env.virtualization_detected() {
            self.scorer
                .apply(&mut self.state, Weight::new(weights.virtualization));
            *phase_valid = false;
            log_warn!(
                self.log,
                now,
                BootPhase::PreBoot,
                MODULE,
                "virtualization underneath guardian (+{})",
                weights.virtualization
            );
        }

        if !self.platform.env.memory_layout_intact() {
            self.scorer
                .apply(&mut self.state, Weight::new(weights.memory_tamper));
            *phase_valid = false;
            log_error!(
                self.log,
                now,
                BootPhase::PreBoot,
                MODULE,
                "memory layout deviates from baseline (+{})",
                weights.memory_tamper
            );
        }

        if !self.platform.env.boot_services_intact() {
            self.scorer
                .apply(&mut self.state, Weight::new(weights.boot_services_tamper));
            *phase_valid = false;
            log_error!(
                self.log,
                now,
                BootPhase::PreBoot,
                MODULE,
                "boot services deviate from baseline (+{})",
                weights.boot_services_tamper
            );
        }
    }

    /// Artifact phases: resolve the active boot path and check it against
    /// the registry
    fn validate_artifact_phase(
        &mut self,
        phase: BootPhase,
        now: Ticks,
        phase_valid: &mut bool,
        critical: &mut bool,
    ) {
        let weights = self.config.weights;

        let Some(path) = self.platform.fs.active_boot_path(phase) else {
            self.scorer
                .apply(&mut self.state, Weight::new(weights.boot_path_failure));
            *phase_valid = false;
            log_error!(
                self.log,
                now,
                phase,
                MODULE,
                "active boot path unresolvable (+{})",
                weights.boot_path_failure
            );
            return;
        };

        let Some(target) = self.registry.resolve(&path).cloned() else {
            // A path outside the registry is a strong anomaly, not a pass
            self.scorer
                .apply(&mut self.state, Weight::new(weights.unknown_boot_path));
            self.state.record_redirection();
            *phase_valid = false;
            log_error!(
                self.log,
                now,
                phase,
                MODULE,
                "unregistered boot path {} (+{})",
                path,
                weights.unknown_boot_path
            );
            return;
        };

        let (digest, size) = match self.platform.oracle.digest(&path) {
            Ok(measurement) => measurement,
            Err(_) => {
                self.scorer
                    .apply(&mut self.state, Weight::new(weights.boot_path_failure));
                *phase_valid = false;
                log_error!(
                    self.log,
                    now,
                    phase,
                    MODULE,
                    "digest oracle failed for {} (+{})",
                    path,
                    weights.boot_path_failure
                );
                return;
            }
        };

        match self.registry.check(&target, &digest, size) {
            CheckOutcome::Match => {
                log_debug!(self.log, now, phase, MODULE, "{} verified", path);
            }
            CheckOutcome::MismatchCritical => {
                // Scored like any mismatch, but escalation is independent
                // of the running score
                self.scorer
                    .apply(&mut self.state, Weight::new(weights.digest_mismatch));
                *critical = true;
                *phase_valid = false;
                log_error!(
                    self.log,
                    now,
                    phase,
                    MODULE,
                    "CRITICAL mismatch on {} (+{})",
                    path,
                    weights.digest_mismatch
                );
            }
            CheckOutcome::MismatchSoft(weight) => {
                self.scorer.apply(&mut self.state, weight);
                *phase_valid = false;
                log_warn!(
                    self.log,
                    now,
                    phase,
                    MODULE,
                    "soft mismatch on {} (+{})",
                    path,
                    weight.value()
                );
            }
        }
    }

    /// Complete: confirm no unresolved anomalies remain
    ///
    /// Every prior phase must have been visited; each skipped phase is an
    /// unresolved anomaly scored with the bypass weight. Invoking `Complete`
    /// directly is therefore an escalation, not a shortcut.
    fn validate_complete(&mut self, now: Ticks, phase_valid: &mut bool, bypass: &mut bool) {
        let missing = self.state.unvalidated_phase_count();
        if missing > 0 {
            let weight = Weight::new(
                self.config
                    .weights
                    .phase_bypass
                    .saturating_mul(missing),
            );
            self.scorer.apply(&mut self.state, weight);
            self.state.mark_switcheroo();
            *phase_valid = false;
            *bypass = true;
            log_error!(
                self.log,
                now,
                BootPhase::Complete,
                MODULE,
                "{} phases skipped (+{})",
                missing,
                weight.value()
            );
            return;
        }

        if self.state.has_critical_failure()
            || self
                .state
                .suspicion_score
                .exceeds(self.scorer.threshold())
        {
            *phase_valid = false;
            return;
        }

        log_info!(
            self.log,
            now,
            BootPhase::Complete,
            MODULE,
            "boot attempt accepted, score {}",
            self.state.suspicion_score
        );
    }

    // ========================================================================
    // Escalation
    // ========================================================================

    /// Transfer control to the recovery orchestrator
    ///
    /// Normal progression halts regardless of the recovery outcome: a
    /// successful handoff means the recovery environment owns the machine,
    /// and exhaustion means fail-secure.
    fn escalate(
        &mut self,
        cause: EscalationCause,
        now: Ticks,
        score_delta: Weight,
    ) -> Result<PhaseVerdict> {
        self.state.integrity_valid = false;
        let phase = self.state.current_phase;

        log_error!(
            self.log,
            now,
            phase,
            MODULE,
            "escalating: {} (score {})",
            cause.as_str(),
            self.state.suspicion_score
        );

        self.state.halt();

        if !self.config.recovery.enabled {
            self.platform
                .console
                .write_line("recovery disabled; halting fail-secure");
            return Err(match cause {
                EscalationCause::CriticalMismatch => Error::IntegrityMismatch,
                EscalationCause::ContainerTrap => Error::ContainerTrapDetected,
                EscalationCause::PhaseBypass => Error::UnauthorizedPhaseTransition,
                EscalationCause::ThresholdExceeded => Error::IntegrityMismatch,
            });
        }

        let orchestrator =
            RecoveryOrchestrator::new(self.config.recovery, &self.authorized_media);
        let mut io = RecoveryIo {
            media: self.platform.media,
            fetch: &mut *self.platform.fetch,
            loader: &mut *self.platform.loader,
            verifier: self.platform.verifier,
            console: &mut *self.platform.console,
            clock: &mut *self.platform.clock,
        };

        match orchestrator.run(cause.as_str(), self.state.suspicion_score, &mut io) {
            Ok(outcome) => {
                log_info!(
                    self.log,
                    now,
                    phase,
                    MODULE,
                    "recovered via {} after {} tiers",
                    outcome.method.as_str(),
                    outcome.tiers_attempted
                );
                Ok(PhaseVerdict {
                    valid: false,
                    score_delta,
                    recovered: true,
                })
            }
            Err(e) => {
                log_error!(
                    self.log,
                    now,
                    phase,
                    MODULE,
                    "recovery exhausted: {}",
                    e
                );
                Err(e)
            }
        }
    }
}
