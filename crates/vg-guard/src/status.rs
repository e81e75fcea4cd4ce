// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Status reporting
//!
//! Read-only projection of the guardian state for diagnostics and logging.
//! The snapshot is a plain copy: holding one never blocks or observes
//! later mutation.

use core::fmt;

use vg_common::types::SuspicionScore;
use vg_common::BootPhase;

/// Read-only guardian status snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Current boot phase
    pub phase: BootPhase,
    /// Most recent phase verdict
    pub integrity_valid: bool,
    /// Switcheroo detected this attempt
    pub switcheroo_detected: bool,
    /// Cumulative suspicion score
    pub score: SuspicionScore,
    /// Boot-path redirections observed
    pub redirection_count: u32,
    /// Number of registered boot targets
    pub registry_targets: usize,
    /// Recovery enabled
    pub recovery_enabled: bool,
    /// Authorized immutable media present
    pub immutable_media_present: bool,
    /// Guardian is in fail-secure halt
    pub halted: bool,
}

impl fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "guardian status:")?;
        writeln!(f, "  phase:            {}", self.phase)?;
        writeln!(f, "  integrity valid:  {}", yes_no(self.integrity_valid))?;
        writeln!(f, "  switcheroo:       {}", yes_no(self.switcheroo_detected))?;
        writeln!(f, "  suspicion score:  {}", self.score)?;
        writeln!(f, "  redirections:     {}", self.redirection_count)?;
        writeln!(f, "  boot targets:     {}", self.registry_targets)?;
        writeln!(f, "  recovery enabled: {}", yes_no(self.recovery_enabled))?;
        writeln!(
            f,
            "  immutable media:  {}",
            yes_no(self.immutable_media_present)
        )?;
        write!(f, "  halted:           {}", yes_no(self.halted))
    }
}

const fn yes_no(v: bool) -> &'static str {
    if v {
        "yes"
    } else {
        "no"
    }
}
