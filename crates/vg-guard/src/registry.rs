// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Boot target registry
//!
//! A static table of expected boot artifacts loaded once from trusted
//! configuration. Lookups are exact-match on the path identity: an active
//! artifact that resolves to a path missing from this table is itself a
//! scored anomaly, never a silent pass.

use core::fmt;
use heapless::{String, Vec};

use vg_common::constants::MAX_BOOT_TARGETS;
use vg_common::types::{Digest, TargetPath, Weight};
use vg_common::{Error, Result};

/// Maximum description length for a boot target
pub const MAX_DESCRIPTION_LEN: usize = 48;

/// One expected boot artifact
///
/// Immutable after load. For `critical` targets any digest or size mismatch
/// is a hard failure; for others a mismatch contributes `weight` to the
/// suspicion score.
#[derive(Clone)]
pub struct BootTarget {
    /// Exact path identity
    pub path: TargetPath,
    /// Expected digest
    pub expected_digest: Digest,
    /// Expected size in bytes
    pub expected_size: u64,
    /// Mismatch is a hard failure
    pub critical: bool,
    /// Score contribution of a soft mismatch
    pub weight: Weight,
    /// Human-readable description
    pub description: String<MAX_DESCRIPTION_LEN>,
}

impl BootTarget {
    /// Create a boot target
    ///
    /// The description is truncated to [`MAX_DESCRIPTION_LEN`] bytes.
    pub fn new(
        path: &str,
        expected_digest: Digest,
        expected_size: u64,
        critical: bool,
        weight: Weight,
        description: &str,
    ) -> Result<Self> {
        let path = TargetPath::new(path)?;
        let mut desc = String::new();
        let mut take = description.len().min(MAX_DESCRIPTION_LEN);
        while take > 0 && !description.is_char_boundary(take) {
            take -= 1;
        }
        let _ = desc.push_str(&description[..take]);

        Ok(Self {
            path,
            expected_digest,
            expected_size,
            critical,
            weight,
            description: desc,
        })
    }
}

impl fmt::Debug for BootTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootTarget")
            .field("path", &self.path.as_str())
            .field("critical", &self.critical)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Outcome of checking an actual measurement against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Digest and size both match
    Match,
    /// Mismatch on a critical target — immediate escalation trigger
    MismatchCritical,
    /// Mismatch on a non-critical target; contributes the given weight
    MismatchSoft(Weight),
}

/// The boot target registry
#[derive(Default)]
pub struct TargetRegistry {
    targets: Vec<BootTarget, MAX_BOOT_TARGETS>,
}

impl TargetRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from configured targets
    ///
    /// Duplicate paths are rejected: two entries for one identity would make
    /// the expected measurement ambiguous.
    pub fn load(targets: &[BootTarget]) -> Result<Self> {
        let mut registry = Self::new();
        for target in targets {
            registry.insert(target.clone())?;
        }
        Ok(registry)
    }

    /// Insert a target, rejecting duplicates
    pub fn insert(&mut self, target: BootTarget) -> Result<()> {
        if self.resolve(&target.path).is_some() {
            return Err(Error::InvalidParameter);
        }
        self.targets.push(target).map_err(|_| Error::BufferTooSmall)
    }

    /// Exact-match lookup by path identity
    #[must_use]
    pub fn resolve(&self, path: &TargetPath) -> Option<&BootTarget> {
        self.targets.iter().find(|t| &t.path == path)
    }

    /// Check an actual measurement against a resolved target
    ///
    /// Digest comparison is constant-time. Size is checked as well: a
    /// padded or truncated artifact with a colliding digest source is still
    /// a mismatch.
    #[must_use]
    pub fn check(
        &self,
        target: &BootTarget,
        actual_digest: &Digest,
        actual_size: u64,
    ) -> CheckOutcome {
        let digest_ok = target.expected_digest.ct_eq(actual_digest);
        let size_ok = target.expected_size == actual_size;

        if digest_ok && size_ok {
            CheckOutcome::Match
        } else if target.critical {
            CheckOutcome::MismatchCritical
        } else {
            CheckOutcome::MismatchSoft(target.weight)
        }
    }

    /// Number of registered targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
