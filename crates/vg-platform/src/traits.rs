// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Platform trait definitions
//!
//! These traits are the external boundary of the guardian. The core never
//! performs I/O, computes digests, or verifies signatures itself — it
//! consumes the results of these operations and reasons about them.

use heapless::Vec;
use vg_common::constants::MAX_MEDIA_CANDIDATES;
use vg_common::time::Ticks;
use vg_common::types::{Digest, MediaSerial, PartitionUuid, TargetPath};
use vg_common::{BootPhase, Result};

/// Cryptographic digest oracle
///
/// Computes a digest and size for a boot artifact. The guardian treats the
/// oracle as correct; a failed computation is reported as `ProbeFailed` and
/// scored by the caller, never silently ignored.
pub trait DigestOracle {
    /// Compute the digest and byte size of the artifact at `path`
    fn digest(&self, path: &TargetPath) -> Result<(Digest, u64)>;
}

/// Filesystem-query primitives
///
/// Supplied by the hosting firmware/OS environment. Only existence checks
/// and boot-path resolution are required — the guardian needs no general
/// filesystem driver.
pub trait FsProbe {
    /// Check whether a path exists in the currently visible filesystem
    fn exists(&self, path: &str) -> bool;

    /// Resolve the boot artifact path the environment is actually about to
    /// use for the given phase
    ///
    /// Returns `None` when the environment cannot name an active artifact
    /// for the phase (itself a scored anomaly for artifact-bearing phases).
    fn active_boot_path(&self, phase: BootPhase) -> Option<TargetPath>;
}

/// Pre-boot environment baseline checks
///
/// The guardian validates its own execution environment before trusting any
/// downstream measurement: an attacker who virtualizes or patches the
/// calling environment controls everything the guardian sees afterwards.
pub trait EnvProbe {
    /// Check whether the guardian is running under unexpected virtualization
    fn virtualization_detected(&self) -> bool;

    /// Check whether the memory layout matches the expected baseline
    fn memory_layout_intact(&self) -> bool;

    /// Check whether boot-service entry points match the expected baseline
    fn boot_services_intact(&self) -> bool;
}

/// Identity and geometry of one removable media candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    /// Media serial number
    pub serial: MediaSerial,
    /// Partition identity
    pub partition_uuid: PartitionUuid,
    /// Sector size in bytes
    pub sector_size: u32,
    /// Total sector count
    pub total_sectors: u64,
    /// Media reports itself read-only
    pub read_only: bool,
    /// Media is removable
    pub removable: bool,
}

/// Removable media enumeration
pub trait MediaEnumerator {
    /// Enumerate currently attached removable media
    fn removable_media(&self) -> Vec<MediaInfo, MAX_MEDIA_CANDIDATES>;
}

/// Network delivery of recovery images
///
/// A data source only: the orchestrator validates whatever arrives before
/// trusting it.
pub trait RecoveryFetch {
    /// Fetch the recovery image at `url` into `buf`, returning the byte count
    fn fetch(&mut self, url: &str, buf: &mut [u8]) -> Result<usize>;
}

/// Handoff into a recovery environment
///
/// Each method loads and transfers control to a recovery environment from
/// one tier's source. A successful return means the environment accepted
/// the handoff; the caller stops trying further tiers.
pub trait RecoveryLoader {
    /// Load and hand off to the recovery environment on validated media
    fn load_from_media(&mut self, media: &MediaInfo) -> Result<()>;

    /// Load and hand off to a fetched recovery image
    fn load_image(&mut self, image: &[u8]) -> Result<()>;

    /// Read the embedded fallback package into `buf`, returning its size
    ///
    /// The orchestrator validates the package before asking for the handoff;
    /// the embedded copy is trusted no more than any other tier.
    fn embedded_package(&self, buf: &mut [u8]) -> Result<usize>;

    /// Load and hand off to the embedded fallback image
    fn load_embedded(&mut self) -> Result<()>;

    /// Request a minimal safe-mode boot
    fn enter_safe_mode(&mut self) -> Result<()>;
}

/// Detached-signature verification against a trusted keyring
///
/// The signing toolchain and keyring management are external; the guardian
/// only consumes a verdict.
pub trait SignatureVerifier {
    /// Verify `signature` over `payload`
    ///
    /// Returns `Ok(true)` for a valid signature, `Ok(false)` for an invalid
    /// one, and an error if verification could not be attempted at all.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<bool>;
}

/// Operator-visible console output
///
/// Used for the mandatory pre-recovery notice. Recovery is never silent.
pub trait Console {
    /// Write one line of output
    fn write_line(&mut self, line: &str);
}

/// Monotonic clock and busy-wait delays
pub trait Clock {
    /// Current monotonic tick count
    fn now(&self) -> Ticks;

    /// Busy-wait for the given number of milliseconds
    ///
    /// There is no cancellation: a compromised caller must not be able to
    /// shorten the recovery countdown.
    fn busy_wait_ms(&mut self, ms: u32);
}
