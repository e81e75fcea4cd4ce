// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Guardian configuration
//!
//! Configuration is loaded once from a trusted store at initialization and
//! is immutable afterwards — no runtime changes are allowed. Weight tables
//! live here rather than in code so that trust decisions ship as signed
//! configuration, not as recompiles.

use crate::constants::{
    ESCALATION_THRESHOLD, RECOVERY_COUNTDOWN_SECS, WEIGHT_BOOT_PATH_FAILURE,
    WEIGHT_BOOT_SERVICES_TAMPER, WEIGHT_DIGEST_MISMATCH, WEIGHT_MEMORY_TAMPER,
    WEIGHT_PHASE_BYPASS, WEIGHT_UNKNOWN_BOOT_PATH, WEIGHT_VIRTUALIZATION,
};

/// Recovery method preference
///
/// The orchestrator always tries tiers in fixed priority order; the
/// preference only selects which tier is announced first in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecoveryMethod {
    /// Read-only removable media (highest trust)
    ImmutableMedia = 0,
    /// Network-delivered image
    Network = 1,
    /// Embedded fallback image in protected storage
    Embedded = 2,
    /// Minimal safe-mode boot (last resort)
    SafeMode = 3,
}

impl RecoveryMethod {
    /// All methods in fixed priority order
    pub const PRIORITY_ORDER: [Self; 4] = [
        Self::ImmutableMedia,
        Self::Network,
        Self::Embedded,
        Self::SafeMode,
    ];

    /// Get the method name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ImmutableMedia => "immutable-media",
            Self::Network => "network",
            Self::Embedded => "embedded",
            Self::SafeMode => "safe-mode",
        }
    }
}

impl From<u8> for RecoveryMethod {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Network,
            2 => Self::Embedded,
            3 => Self::SafeMode,
            _ => Self::ImmutableMedia,
        }
    }
}

/// Weight table for anomaly scoring
///
/// Every scored condition outside the per-target and per-pattern weights is
/// configured here.
#[derive(Debug, Clone, Copy)]
pub struct WeightTable {
    /// Digest mismatch on a non-critical registry target
    pub digest_mismatch: u32,
    /// Active boot path absent from the registry
    pub unknown_boot_path: u32,
    /// Boot path could not be resolved at all
    pub boot_path_failure: u32,
    /// Out-of-order or skipping phase transition
    pub phase_bypass: u32,
    /// Virtualization detected underneath the guardian
    pub virtualization: u32,
    /// Memory layout deviates from baseline
    pub memory_tamper: u32,
    /// Boot-service entry points deviate from baseline
    pub boot_services_tamper: u32,
}

impl WeightTable {
    /// Provisioning default weights
    pub const DEFAULT: Self = Self {
        digest_mismatch: WEIGHT_DIGEST_MISMATCH,
        unknown_boot_path: WEIGHT_UNKNOWN_BOOT_PATH,
        boot_path_failure: WEIGHT_BOOT_PATH_FAILURE,
        phase_bypass: WEIGHT_PHASE_BYPASS,
        virtualization: WEIGHT_VIRTUALIZATION,
        memory_tamper: WEIGHT_MEMORY_TAMPER,
        boot_services_tamper: WEIGHT_BOOT_SERVICES_TAMPER,
    };
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Recovery configuration
#[derive(Debug, Clone, Copy)]
pub struct RecoveryConfig {
    /// Recovery is enabled; when false, escalation halts instead
    pub enabled: bool,
    /// Announced recovery method preference
    pub preferred_method: RecoveryMethod,
    /// Require immutable (read-only) media for the media tier
    pub require_immutable_media: bool,
    /// Accept recovery packages without a detached signature
    ///
    /// Deliberately conservative default: unsigned packages are refused
    /// unless a deployment explicitly opts in.
    pub allow_unsigned_packages: bool,
    /// Fixed, non-cancelable countdown before recovery acts, in seconds
    pub countdown_secs: u32,
    /// URL of the network-delivered recovery package
    pub artifact_url: &'static str,
    /// Path of the on-media recovery artifact
    pub artifact_path: &'static str,
}

impl RecoveryConfig {
    /// Default recovery configuration
    pub const DEFAULT: Self = Self {
        enabled: true,
        preferred_method: RecoveryMethod::ImmutableMedia,
        require_immutable_media: true,
        allow_unsigned_packages: false,
        countdown_secs: RECOVERY_COUNTDOWN_SECS,
        artifact_url: "https://recovery.vigil-systems.io/bootguard/latest.pkg",
        artifact_path: "\\EFI\\vigil\\recovery.pkg",
    };
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Top-level guardian configuration
#[derive(Debug, Clone, Copy)]
pub struct GuardianConfig {
    /// Escalate to recovery when the score exceeds this value
    pub escalation_threshold: u32,
    /// Anomaly weight table
    pub weights: WeightTable,
    /// Recovery configuration
    pub recovery: RecoveryConfig,
}

impl GuardianConfig {
    /// Default configuration
    pub const DEFAULT: Self = Self {
        escalation_threshold: ESCALATION_THRESHOLD,
        weights: WeightTable::DEFAULT,
        recovery: RecoveryConfig::DEFAULT,
    };
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
