// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Host simulation of the platform traits
//!
//! In-memory implementations used by host-side tests and integration tests.
//! Each simulator is scripted up front and then handed to the guardian by
//! reference; the recording types (console, loader) capture what the core
//! did for later assertions.

use core::cell::Cell;
use heapless::{String, Vec};
use sha3::{Digest as Sha3Digest, Sha3_256};

use vg_common::constants::MAX_MEDIA_CANDIDATES;
use vg_common::time::Ticks;
use vg_common::types::{Digest, TargetPath};
use vg_common::{BootPhase, Error, Result};

use crate::traits::{
    Clock, Console, DigestOracle, EnvProbe, FsProbe, MediaEnumerator, MediaInfo, RecoveryFetch,
    RecoveryLoader, SignatureVerifier,
};

/// Maximum artifacts in the simulated measurement table
pub const SIM_MAX_ARTIFACTS: usize = 16;

/// Maximum paths in the simulated filesystem
pub const SIM_MAX_PATHS: usize = 32;

/// Maximum lines captured by the recording console
pub const SIM_MAX_CONSOLE_LINES: usize = 64;

/// Compute the SHA3-256 digest of a byte slice
///
/// Convenience for tests that provision expected registry digests from
/// artifact content.
#[must_use]
pub fn sha3_digest(content: &[u8]) -> Digest {
    let mut hasher = Sha3_256::new();
    hasher.update(content);
    let out = hasher.finalize();
    Digest::from_slice(&out).unwrap_or_default()
}

// ============================================================================
// Digest Oracle
// ============================================================================

/// Simulated digest oracle over a scripted measurement table
#[derive(Default)]
pub struct SimDigestOracle {
    entries: Vec<(TargetPath, Digest, u64), SIM_MAX_ARTIFACTS>,
}

impl SimDigestOracle {
    /// Create an empty oracle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an artifact by content; the oracle will report its SHA3-256
    /// digest and byte size
    pub fn insert_artifact(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let path = TargetPath::new(path)?;
        let digest = sha3_digest(content);
        self.entries
            .push((path, digest, content.len() as u64))
            .map_err(|_| Error::BufferTooSmall)
    }

    /// Register a raw measurement (digest and size) for a path
    pub fn insert_measurement(&mut self, path: &str, digest: Digest, size: u64) -> Result<()> {
        let path = TargetPath::new(path)?;
        self.entries
            .push((path, digest, size))
            .map_err(|_| Error::BufferTooSmall)
    }
}

impl DigestOracle for SimDigestOracle {
    fn digest(&self, path: &TargetPath) -> Result<(Digest, u64)> {
        self.entries
            .iter()
            .find(|(p, _, _)| p == path)
            .map(|(_, d, s)| (*d, *s))
            .ok_or(Error::ProbeFailed)
    }
}

// ============================================================================
// Filesystem Probe
// ============================================================================

/// Simulated filesystem probe
#[derive(Default)]
pub struct SimFsProbe {
    present: Vec<String<128>, SIM_MAX_PATHS>,
    active: Vec<(BootPhase, TargetPath), 8>,
}

impl SimFsProbe {
    /// Create an empty probe (no paths present)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a path as present in the visible filesystem
    pub fn add_path(&mut self, path: &str) -> Result<()> {
        let mut s = String::new();
        s.push_str(path).map_err(|()| Error::BufferTooSmall)?;
        self.present.push(s).map_err(|_| Error::BufferTooSmall)
    }

    /// Script the active boot path resolved for a phase
    pub fn set_active_boot_path(&mut self, phase: BootPhase, path: &str) -> Result<()> {
        let path = TargetPath::new(path)?;
        self.active
            .push((phase, path))
            .map_err(|_| Error::BufferTooSmall)
    }
}

impl FsProbe for SimFsProbe {
    fn exists(&self, path: &str) -> bool {
        self.present.iter().any(|p| p.as_str() == path)
    }

    fn active_boot_path(&self, phase: BootPhase) -> Option<TargetPath> {
        self.active
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, path)| path.clone())
    }
}

// ============================================================================
// Environment Probe
// ============================================================================

/// Simulated pre-boot environment probe
#[derive(Debug, Clone, Copy)]
pub struct SimEnvProbe {
    /// Report virtualization underneath the guardian
    pub virtualized: bool,
    /// Report the memory layout as intact
    pub memory_intact: bool,
    /// Report boot services as intact
    pub boot_services_intact: bool,
}

impl SimEnvProbe {
    /// A clean pre-boot environment
    #[must_use]
    pub const fn clean() -> Self {
        Self {
            virtualized: false,
            memory_intact: true,
            boot_services_intact: true,
        }
    }
}

impl Default for SimEnvProbe {
    fn default() -> Self {
        Self::clean()
    }
}

impl EnvProbe for SimEnvProbe {
    fn virtualization_detected(&self) -> bool {
        self.virtualized
    }

    fn memory_layout_intact(&self) -> bool {
        self.memory_intact
    }

    fn boot_services_intact(&self) -> bool {
        self.boot_services_intact
    }
}

// ============================================================================
// Media Enumerator
// ============================================================================

/// Simulated removable media enumerator
#[derive(Default)]
pub struct SimMediaEnumerator {
    media: Vec<MediaInfo, MAX_MEDIA_CANDIDATES>,
}

impl SimMediaEnumerator {
    /// Create an enumerator with no attached media
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a media candidate
    pub fn attach(&mut self, media: MediaInfo) -> Result<()> {
        self.media.push(media).map_err(|_| Error::BufferTooSmall)
    }
}

impl MediaEnumerator for SimMediaEnumerator {
    fn removable_media(&self) -> Vec<MediaInfo, MAX_MEDIA_CANDIDATES> {
        self.media.clone()
    }
}

// ============================================================================
// Recovery Fetch
// ============================================================================

/// Simulated network fetch
pub struct SimRecoveryFetch {
    payload: Option<Vec<u8, 4096>>,
    /// Number of fetch attempts observed
    pub attempts: u32,
}

impl SimRecoveryFetch {
    /// A fetch source that always fails (no network)
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            payload: None,
            attempts: 0,
        }
    }

    /// A fetch source that delivers `payload`
    pub fn with_payload(payload: &[u8]) -> Result<Self> {
        let mut buf = Vec::new();
        buf.extend_from_slice(payload)
            .map_err(|()| Error::BufferTooSmall)?;
        Ok(Self {
            payload: Some(buf),
            attempts: 0,
        })
    }
}

impl RecoveryFetch for SimRecoveryFetch {
    fn fetch(&mut self, _url: &str, buf: &mut [u8]) -> Result<usize> {
        self.attempts += 1;
        match &self.payload {
            Some(payload) => {
                if buf.len() < payload.len() {
                    return Err(Error::BufferTooSmall);
                }
                buf[..payload.len()].copy_from_slice(payload);
                Ok(payload.len())
            }
            None => Err(Error::FetchFailed),
        }
    }
}

// ============================================================================
// Recovery Loader
// ============================================================================

/// Outcome scripted for each loader method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLoaderScript {
    /// `load_from_media` succeeds
    pub media_ok: bool,
    /// `load_image` succeeds
    pub image_ok: bool,
    /// `load_embedded` succeeds
    pub embedded_ok: bool,
    /// `enter_safe_mode` succeeds
    pub safe_mode_ok: bool,
}

impl SimLoaderScript {
    /// Every method succeeds
    #[must_use]
    pub const fn all_ok() -> Self {
        Self {
            media_ok: true,
            image_ok: true,
            embedded_ok: true,
            safe_mode_ok: true,
        }
    }

    /// Every method fails
    #[must_use]
    pub const fn all_fail() -> Self {
        Self {
            media_ok: false,
            image_ok: false,
            embedded_ok: false,
            safe_mode_ok: false,
        }
    }
}

/// Recording recovery loader
pub struct SimRecoveryLoader {
    script: SimLoaderScript,
    embedded: Option<Vec<u8, 4096>>,
    /// Methods attempted, in order
    pub attempted: Vec<&'static str, 8>,
}

impl SimRecoveryLoader {
    /// Create a loader with the given script and no embedded package
    #[must_use]
    pub fn new(script: SimLoaderScript) -> Self {
        Self {
            script,
            embedded: None,
            attempted: Vec::new(),
        }
    }

    /// Provision the embedded fallback package
    pub fn set_embedded_package(&mut self, bytes: &[u8]) -> Result<()> {
        let mut buf = Vec::new();
        buf.extend_from_slice(bytes)
            .map_err(|()| Error::BufferTooSmall)?;
        self.embedded = Some(buf);
        Ok(())
    }

    fn record(&mut self, method: &'static str, ok: bool) -> Result<()> {
        let _ = self.attempted.push(method);
        if ok {
            Ok(())
        } else {
            Err(Error::ProbeFailed)
        }
    }
}

impl RecoveryLoader for SimRecoveryLoader {
    fn load_from_media(&mut self, _media: &MediaInfo) -> Result<()> {
        let ok = self.script.media_ok;
        self.record("media", ok)
    }

    fn load_image(&mut self, _image: &[u8]) -> Result<()> {
        let ok = self.script.image_ok;
        self.record("image", ok)
    }

    fn embedded_package(&self, buf: &mut [u8]) -> Result<usize> {
        match &self.embedded {
            Some(pkg) => {
                if buf.len() < pkg.len() {
                    return Err(Error::BufferTooSmall);
                }
                buf[..pkg.len()].copy_from_slice(pkg);
                Ok(pkg.len())
            }
            None => Err(Error::ProbeFailed),
        }
    }

    fn load_embedded(&mut self) -> Result<()> {
        let ok = self.script.embedded_ok;
        self.record("embedded", ok)
    }

    fn enter_safe_mode(&mut self) -> Result<()> {
        let ok = self.script.safe_mode_ok;
        self.record("safe-mode", ok)
    }
}

// ============================================================================
// Signature Verifier
// ============================================================================

/// Simulated detached-signature verifier
///
/// The simulation accepts a signature iff it equals the SHA3-256 digest of
/// the payload repeated twice (64 bytes). `sign` produces matching
/// signatures for tests. Real deployments supply a verifier backed by the
/// module-signing toolchain's keyring.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimSignatureVerifier;

impl SimSignatureVerifier {
    /// Produce a signature that this verifier accepts
    #[must_use]
    pub fn sign(payload: &[u8]) -> [u8; 64] {
        let digest = sha3_digest(payload);
        let mut sig = [0u8; 64];
        sig[..32].copy_from_slice(digest.as_bytes());
        sig[32..].copy_from_slice(digest.as_bytes());
        sig
    }
}

impl SignatureVerifier for SimSignatureVerifier {
    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.len() != 64 {
            return Err(Error::InvalidParameter);
        }
        let expected = Self::sign(payload);
        let mut diff = 0u8;
        for (a, b) in expected.iter().zip(signature.iter()) {
            diff |= a ^ b;
        }
        Ok(diff == 0)
    }
}

// ============================================================================
// Console
// ============================================================================

/// Recording console
#[derive(Default)]
pub struct SimConsole {
    /// Captured lines, in order
    pub lines: Vec<String<128>, SIM_MAX_CONSOLE_LINES>,
}

impl SimConsole {
    /// Create an empty console
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether any captured line contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Console for SimConsole {
    fn write_line(&mut self, line: &str) {
        let mut s = String::new();
        let mut take = line.len().min(127);
        while take > 0 && !line.is_char_boundary(take) {
            take -= 1;
        }
        let _ = s.push_str(&line[..take]);
        let _ = self.lines.push(s);
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Simulated monotonic clock
///
/// `busy_wait_ms` advances the tick counter by the requested amount (1 tick
/// per millisecond) and records the total time waited so tests can assert
/// the countdown actually ran.
pub struct SimClock {
    ticks: Cell<u64>,
    /// Total milliseconds spent in busy-waits
    pub waited_ms: u32,
}

impl SimClock {
    /// Create a clock starting at the given tick count
    #[must_use]
    pub fn new(start: u64) -> Self {
        Self {
            ticks: Cell::new(start),
            waited_ms: 0,
        }
    }

    /// Manually advance the clock
    pub fn advance(&self, ticks: u64) {
        self.ticks.set(self.ticks.get().saturating_add(ticks));
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for SimClock {
    fn now(&self) -> Ticks {
        Ticks::new(self.ticks.get())
    }

    fn busy_wait_ms(&mut self, ms: u32) {
        self.waited_ms = self.waited_ms.saturating_add(ms);
        self.advance(u64::from(ms));
    }
}
