// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Signed recovery packages
//!
//! Recovery environments delivered over the network or stored as embedded
//! fallbacks are wrapped in a small signed package. The payload digest is
//! always recomputed and compared; the detached signature is verified
//! against the trusted keyring through the [`SignatureVerifier`] seam.
//! Packages without a signature are refused unless the deployment has
//! explicitly opted into unsigned recovery.
//!
//! # Package Layout
//!
//! ```text
//! Offset  Size   Field
//! 0x00    4      Magic "VGRP"
//! 0x04    2      Format version (LE)
//! 0x06    1      Flags (bit 0: signed)
//! 0x07    1      Reserved
//! 0x08    4      Payload length (LE)
//! 0x0C    32     Payload SHA3-256 digest
//! 0x2C    64     Detached signature (zeroed when unsigned)
//! 0x6C    N      Payload
//! ```
//!
//! The signature covers the header with the signature field zeroed,
//! followed by the payload.

use sha3::{Digest as Sha3Digest, Sha3_256};

use vg_common::constants::PACKAGE_SIGNATURE_SIZE;
use vg_common::types::Digest;
use vg_common::{Error, Result};
use vg_platform::SignatureVerifier;

/// Package magic: "VGRP"
pub const PACKAGE_MAGIC: u32 = 0x5052_4756;

/// Current package format version
pub const PACKAGE_FORMAT_VERSION: u16 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 0x6C;

/// Package flags
pub mod flags {
    /// Package carries a detached signature
    pub const SIGNED: u8 = 1 << 0;
}

/// A parsed recovery package, borrowing the underlying buffer
#[derive(Debug, Clone, Copy)]
pub struct RecoveryPackage<'a> {
    /// Format version
    pub version: u16,
    /// Flags byte
    pub flags: u8,
    /// Declared payload digest
    pub payload_digest: Digest,
    /// Detached signature bytes
    pub signature: &'a [u8],
    /// Payload bytes
    pub payload: &'a [u8],
}

impl<'a> RecoveryPackage<'a> {
    /// Parse a package from a raw buffer
    ///
    /// Validates structure only — magic, version, declared length. Content
    /// trust is established separately by [`verify`].
    pub fn parse(buf: &'a [u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::InvalidParameter);
        }

        let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        if magic != PACKAGE_MAGIC {
            return Err(Error::InvalidParameter);
        }

        let version = u16::from_le_bytes([buf[4], buf[5]]);
        if version > PACKAGE_FORMAT_VERSION {
            return Err(Error::InvalidParameter);
        }

        let flags = buf[6];

        let payload_len = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]) as usize;
        let total = HEADER_SIZE
            .checked_add(payload_len)
            .ok_or(Error::InvalidParameter)?;
        if buf.len() < total {
            return Err(Error::InvalidParameter);
        }

        let payload_digest =
            Digest::from_slice(&buf[0x0C..0x2C]).ok_or(Error::InternalError)?;

        Ok(Self {
            version,
            flags,
            payload_digest,
            signature: &buf[0x2C..0x2C + PACKAGE_SIGNATURE_SIZE],
            payload: &buf[HEADER_SIZE..total],
        })
    }

    /// Check whether the package declares a signature
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.flags & flags::SIGNED != 0
    }
}

/// Verify a recovery package before trusting its payload
///
/// The payload digest is always recomputed; a package with a correct
/// signature over a stale digest still fails. Signature policy:
///
/// - signed and valid: accepted
/// - signed and invalid: `RecoveryPackageBadSignature`
/// - unsigned: `RecoveryPackageUnsigned` unless `allow_unsigned`
pub fn verify(
    buf: &[u8],
    verifier: &dyn SignatureVerifier,
    allow_unsigned: bool,
) -> Result<()> {
    let package = RecoveryPackage::parse(buf)?;

    let mut hasher = Sha3_256::new();
    hasher.update(package.payload);
    let computed = hasher.finalize();
    let computed = Digest::from_slice(&computed).ok_or(Error::InternalError)?;

    if !computed.ct_eq(&package.payload_digest) {
        return Err(Error::IntegrityMismatch);
    }

    if package.is_signed() {
        // Signature covers the header with the signature field zeroed,
        // followed by the payload.
        let mut scratch = [0u8; HEADER_SIZE];
        scratch.copy_from_slice(&buf[..HEADER_SIZE]);
        scratch[0x2C..0x2C + PACKAGE_SIGNATURE_SIZE].fill(0);

        if !verify_split(verifier, &scratch, package.payload, package.signature)? {
            return Err(Error::RecoveryPackageBadSignature);
        }
        return Ok(());
    }

    if allow_unsigned {
        Ok(())
    } else {
        Err(Error::RecoveryPackageUnsigned)
    }
}

/// Verify a signature over a two-part message
///
/// The platform verifier takes a single contiguous payload; concatenate the
/// two parts in a bounded buffer. Packages whose header+payload exceed the
/// buffer are rejected as oversized rather than partially verified.
fn verify_split(
    verifier: &dyn SignatureVerifier,
    head: &[u8],
    tail: &[u8],
    signature: &[u8],
) -> Result<bool> {
    const MAX_SIGNED_REGION: usize = 4096;

    let total = head.len() + tail.len();
    if total > MAX_SIGNED_REGION {
        return Err(Error::BufferTooSmall);
    }

    let mut region = [0u8; MAX_SIGNED_REGION];
    region[..head.len()].copy_from_slice(head);
    region[head.len()..total].copy_from_slice(tail);

    verifier.verify(&region[..total], signature)
}

/// Build a package in `out`, returning the total byte count
///
/// Provisioning-side helper used by tests and tooling; the guardian itself
/// only ever parses and verifies.
pub fn build(
    payload: &[u8],
    signature: Option<&[u8; PACKAGE_SIGNATURE_SIZE]>,
    out: &mut [u8],
) -> Result<usize> {
    let total = HEADER_SIZE + payload.len();
    if out.len() < total {
        return Err(Error::BufferTooSmall);
    }

    out[..total].fill(0);
    out[0..4].copy_from_slice(&PACKAGE_MAGIC.to_le_bytes());
    out[4..6].copy_from_slice(&PACKAGE_FORMAT_VERSION.to_le_bytes());
    out[6] = if signature.is_some() { flags::SIGNED } else { 0 };
    out[8..12].copy_from_slice(&(payload.len() as u32).to_le_bytes());

    let mut hasher = Sha3_256::new();
    hasher.update(payload);
    let digest = hasher.finalize();
    out[0x0C..0x2C].copy_from_slice(&digest);

    if let Some(sig) = signature {
        out[0x2C..0x2C + PACKAGE_SIGNATURE_SIZE].copy_from_slice(sig);
    }

    out[HEADER_SIZE..total].copy_from_slice(payload);
    Ok(total)
}

/// Bytes a signer must sign for the given payload
///
/// Provisioning-side helper: header with zeroed signature, then payload.
pub fn signing_region(payload: &[u8], out: &mut [u8]) -> Result<usize> {
    let total = build(payload, None, out)?;
    // The unsigned build has flags bit 0 clear; signers sign the SIGNED form
    out[6] = flags::SIGNED;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_platform::sim::SimSignatureVerifier;

    fn signed_package(payload: &[u8], buf: &mut [u8]) -> usize {
        let mut region = [0u8; 1024];
        let region_len = signing_region(payload, &mut region).unwrap();
        let sig = SimSignatureVerifier::sign(&region[..region_len]);
        build(payload, Some(&sig), buf).unwrap()
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut buf = [0u8; 256];
        let len = build(b"payload", None, &mut buf).unwrap();
        buf[0] = 0xFF;
        assert_eq!(
            RecoveryPackage::parse(&buf[..len]).err(),
            Some(Error::InvalidParameter)
        );
    }

    #[test]
    fn test_parse_rejects_truncated_payload() {
        let mut buf = [0u8; 256];
        let len = build(b"payload", None, &mut buf).unwrap();
        assert!(RecoveryPackage::parse(&buf[..len - 3]).is_err());
    }

    #[test]
    fn test_signed_package_verifies() {
        let mut buf = [0u8; 512];
        let len = signed_package(b"recovery-env", &mut buf);
        let verifier = SimSignatureVerifier;
        assert_eq!(verify(&buf[..len], &verifier, false), Ok(()));
    }

    #[test]
    fn test_payload_tamper_detected() {
        let mut buf = [0u8; 512];
        let len = signed_package(b"recovery-env", &mut buf);
        buf[HEADER_SIZE] ^= 0x01;
        let verifier = SimSignatureVerifier;
        assert_eq!(
            verify(&buf[..len], &verifier, false),
            Err(Error::IntegrityMismatch)
        );
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut buf = [0u8; 512];
        let len = signed_package(b"recovery-env", &mut buf);
        buf[0x2C] ^= 0xFF;
        let verifier = SimSignatureVerifier;
        assert_eq!(
            verify(&buf[..len], &verifier, false),
            Err(Error::RecoveryPackageBadSignature)
        );
    }

    #[test]
    fn test_unsigned_refused_by_default() {
        let mut buf = [0u8; 512];
        let len = build(b"recovery-env", None, &mut buf).unwrap();
        let verifier = SimSignatureVerifier;
        assert_eq!(
            verify(&buf[..len], &verifier, false),
            Err(Error::RecoveryPackageUnsigned)
        );
    }

    #[test]
    fn test_unsigned_accepted_when_explicitly_allowed() {
        let mut buf = [0u8; 512];
        let len = build(b"recovery-env", None, &mut buf).unwrap();
        let verifier = SimSignatureVerifier;
        assert_eq!(verify(&buf[..len], &verifier, true), Ok(()));
    }

    #[test]
    fn test_unsigned_with_wrong_digest_still_fails() {
        let mut buf = [0u8; 512];
        let len = build(b"recovery-env", None, &mut buf).unwrap();
        // Corrupt the declared digest
        buf[0x0C] ^= 0x01;
        let verifier = SimSignatureVerifier;
        assert_eq!(
            verify(&buf[..len], &verifier, true),
            Err(Error::IntegrityMismatch)
        );
    }
}
