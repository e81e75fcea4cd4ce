// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! System-wide constants for Vigil BootGuard
//!
//! Capacities are fixed at compile time for embedded constraints; the weight
//! and threshold defaults here are the provisioning baseline and can be
//! overridden through [`crate::config::GuardianConfig`].

// =============================================================================
// Measurement Sizes
// =============================================================================

/// Digest size in bytes (SHA3-256 output)
pub const DIGEST_SIZE: usize = 32;

/// Maximum boot target path length in bytes
pub const MAX_PATH_LEN: usize = 128;

/// Physical media serial number size in bytes
pub const MEDIA_SERIAL_SIZE: usize = 32;

/// Partition UUID size in bytes
pub const PARTITION_UUID_SIZE: usize = 16;

// =============================================================================
// Table Capacities
// =============================================================================

/// Maximum boot targets in the registry
pub const MAX_BOOT_TARGETS: usize = 100;

/// Maximum authorized recovery media identities
pub const MAX_AUTHORIZED_MEDIA: usize = 10;

/// Maximum registered switcheroo patterns
pub const MAX_PATTERNS: usize = 32;

/// Maximum findings reported by a single detector scan
pub const MAX_FINDINGS: usize = 16;

/// Maximum removable media candidates per enumeration
pub const MAX_MEDIA_CANDIDATES: usize = 8;

// =============================================================================
// Scoring Policy Defaults
// =============================================================================

/// Escalation threshold: recovery triggers when the score EXCEEDS this
pub const ESCALATION_THRESHOLD: u32 = 1000;

/// Weight for a digest mismatch on a non-critical registry target
pub const WEIGHT_DIGEST_MISMATCH: u32 = 400;

/// Weight for an active boot path absent from the registry
pub const WEIGHT_UNKNOWN_BOOT_PATH: u32 = 350;

/// Weight for a failed boot-path resolution
pub const WEIGHT_BOOT_PATH_FAILURE: u32 = 200;

/// Weight for an out-of-order or skipping phase transition
pub const WEIGHT_PHASE_BYPASS: u32 = 300;

/// Weight for virtualization detected underneath the guardian
pub const WEIGHT_VIRTUALIZATION: u32 = 100;

/// Weight for memory layout tampering in the pre-boot environment
pub const WEIGHT_MEMORY_TAMPER: u32 = 300;

/// Weight for boot-services tampering in the pre-boot environment
pub const WEIGHT_BOOT_SERVICES_TAMPER: u32 = 250;

// =============================================================================
// Recovery Policy Defaults
// =============================================================================

/// Fixed recovery countdown before the orchestrator acts, in seconds
pub const RECOVERY_COUNTDOWN_SECS: u32 = 30;

/// Number of recovery tiers in the fallback chain
pub const RECOVERY_TIER_COUNT: usize = 4;

/// Maximum recovery artifact size accepted from any tier (16 MB)
pub const MAX_RECOVERY_IMAGE_SIZE: usize = 16 * 1024 * 1024;

/// Recovery package detached signature size in bytes
pub const PACKAGE_SIGNATURE_SIZE: usize = 64;
