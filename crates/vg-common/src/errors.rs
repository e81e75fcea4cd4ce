// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Error types for Vigil BootGuard
//!
//! This module defines the unified error type used throughout the guardian.
//! All errors are no_std compatible and carry no heap-allocated context.
//!
//! Soft anomalies (pattern hits, soft mismatches) are never surfaced as
//! errors — they fold into the suspicion score. Errors here are reserved
//! for conditions that block an operation or terminate the boot attempt.

use core::fmt;

/// Result type alias for Vigil BootGuard operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for Vigil BootGuard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Lifecycle Errors (0x01xx)
    // =========================================================================
    /// Operation invoked before the guardian was initialized
    NotInitialized,
    /// Guardian entered fail-secure halt; no further operations permitted
    GuardianHalted,
    /// Phase argument regressed or advanced past the terminal phase
    UnauthorizedPhaseTransition,

    // =========================================================================
    // Integrity Errors (0x02xx)
    // =========================================================================
    /// Digest or size mismatch against a registry entry
    IntegrityMismatch,
    /// Active boot artifact path is absent from the registry
    UnauthorizedBootPath,
    /// Container, chroot or fake-filesystem trap indicator found
    ContainerTrapDetected,
    /// Pre-boot memory layout deviates from the expected baseline
    MemoryLayoutTamper,
    /// Boot-service entry points deviate from the expected baseline
    BootServicesTamper,
    /// Guardian itself is running under unexpected virtualization
    VirtualizedEnvironment,

    // =========================================================================
    // Recovery Errors (0x03xx)
    // =========================================================================
    /// Recovery candidate failed authenticity validation
    RecoveryMediaInvalid,
    /// Recovery package carries no signature and unsigned packages are refused
    RecoveryPackageUnsigned,
    /// Recovery package signature did not verify against the trusted keyring
    RecoveryPackageBadSignature,
    /// No recovery tier succeeded; boot attempt is terminal
    RecoveryExhausted,

    // =========================================================================
    // Platform Errors (0x04xx)
    // =========================================================================
    /// A platform probe (digest, filesystem, environment) failed
    ProbeFailed,
    /// Network fetch of a recovery image failed
    FetchFailed,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Invalid parameter provided
    InvalidParameter,
    /// Buffer or fixed-capacity table is too small
    BufferTooSmall,
    /// Internal error (should not occur)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Lifecycle errors
    /// - 0x02xx: Integrity errors
    /// - 0x03xx: Recovery errors
    /// - 0x04xx: Platform errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::NotInitialized => 0x0101,
            Self::GuardianHalted => 0x0102,
            Self::UnauthorizedPhaseTransition => 0x0103,

            Self::IntegrityMismatch => 0x0201,
            Self::UnauthorizedBootPath => 0x0202,
            Self::ContainerTrapDetected => 0x0203,
            Self::MemoryLayoutTamper => 0x0204,
            Self::BootServicesTamper => 0x0205,
            Self::VirtualizedEnvironment => 0x0206,

            Self::RecoveryMediaInvalid => 0x0301,
            Self::RecoveryPackageUnsigned => 0x0302,
            Self::RecoveryPackageBadSignature => 0x0303,
            Self::RecoveryExhausted => 0x0304,

            Self::ProbeFailed => 0x0401,
            Self::FetchFailed => 0x0402,

            Self::InvalidParameter => 0xFF01,
            Self::BufferTooSmall => 0xFF02,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-critical error
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::IntegrityMismatch
                | Self::UnauthorizedBootPath
                | Self::UnauthorizedPhaseTransition
                | Self::ContainerTrapDetected
                | Self::MemoryLayoutTamper
                | Self::BootServicesTamper
                | Self::VirtualizedEnvironment
                | Self::RecoveryMediaInvalid
                | Self::RecoveryPackageBadSignature
                | Self::RecoveryExhausted
        )
    }

    /// Check if this error terminates the boot attempt
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::RecoveryExhausted | Self::GuardianHalted)
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::NotInitialized => "guardian not initialized",
            Self::GuardianHalted => "guardian halted fail-secure",
            Self::UnauthorizedPhaseTransition => "unauthorized phase transition",
            Self::IntegrityMismatch => "integrity mismatch",
            Self::UnauthorizedBootPath => "unauthorized boot path",
            Self::ContainerTrapDetected => "container trap detected",
            Self::MemoryLayoutTamper => "memory layout tamper",
            Self::BootServicesTamper => "boot services tamper",
            Self::VirtualizedEnvironment => "unexpected virtualization",
            Self::RecoveryMediaInvalid => "recovery media invalid",
            Self::RecoveryPackageUnsigned => "recovery package unsigned",
            Self::RecoveryPackageBadSignature => "recovery package signature invalid",
            Self::RecoveryExhausted => "all recovery tiers exhausted",
            Self::ProbeFailed => "platform probe failed",
            Self::FetchFailed => "recovery image fetch failed",
            Self::InvalidParameter => "invalid parameter",
            Self::BufferTooSmall => "buffer too small",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}
