// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Recovery media authentication
//!
//! Recovery media is never assumed benign: before any content on a
//! candidate is trusted, its physical identity must match an entry in the
//! authorized-media whitelist loaded from trusted configuration. A forged
//! "rescue" stick with the right filesystem layout but the wrong serial is
//! rejected before a single byte is read from it.

use vg_common::types::{MediaSerial, PartitionUuid};
use vg_common::{Error, Result};
use vg_platform::MediaInfo;

/// Identity of one authorized physical recovery medium
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalMediaId {
    /// Expected media serial number
    pub serial: MediaSerial,
    /// Expected partition identity
    pub partition_uuid: PartitionUuid,
    /// Expected sector size in bytes
    pub sector_size: u32,
    /// Expected total sector count
    pub total_sectors: u64,
    /// Medium must report itself read-only
    pub require_immutable: bool,
}

impl PhysicalMediaId {
    /// Check a candidate against this identity
    ///
    /// All fields must match; geometry mismatches indicate a cloned or
    /// resized impostor even when the serial was successfully spoofed.
    #[must_use]
    pub fn matches(&self, candidate: &MediaInfo) -> bool {
        if candidate.serial != self.serial {
            return false;
        }
        if candidate.partition_uuid != self.partition_uuid {
            return false;
        }
        if candidate.sector_size != self.sector_size
            || candidate.total_sectors != self.total_sectors
        {
            return false;
        }
        if self.require_immutable && !candidate.read_only {
            return false;
        }
        true
    }
}

/// Authenticate a media candidate against the authorized whitelist
///
/// # Arguments
/// * `candidate` - enumerated media identity and geometry
/// * `authorized` - whitelist loaded from trusted configuration
/// * `require_immutable` - deployment-wide immutability requirement; applied
///   on top of the per-entry requirement
///
/// # Errors
/// `RecoveryMediaInvalid` if the candidate is not removable, is writable
/// while immutability is required, or matches no whitelist entry.
pub fn authenticate(
    candidate: &MediaInfo,
    authorized: &[PhysicalMediaId],
    require_immutable: bool,
) -> Result<()> {
    if !candidate.removable {
        return Err(Error::RecoveryMediaInvalid);
    }

    if require_immutable && !candidate.read_only {
        return Err(Error::RecoveryMediaInvalid);
    }

    if authorized.iter().any(|id| id.matches(candidate)) {
        Ok(())
    } else {
        Err(Error::RecoveryMediaInvalid)
    }
}
