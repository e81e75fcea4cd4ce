// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Vigil BootGuard Platform Abstraction
//!
//! This crate defines the trait seams between the guardian core and its
//! hosting boot environment. Everything the guardian treats as an external
//! collaborator lives behind a trait here:
//!
//! - **DigestOracle**: cryptographic digest computation (black box)
//! - **FsProbe**: filesystem-query primitives and boot-path resolution
//! - **EnvProbe**: pre-boot environment baseline checks
//! - **MediaEnumerator**: removable media enumeration
//! - **RecoveryFetch**: network delivery of recovery images
//! - **RecoveryLoader**: handoff into a recovery environment
//! - **SignatureVerifier**: detached-signature verification (black box)
//! - **Console**: operator-visible notices
//! - **Clock**: monotonic time and non-cancelable busy-wait delays
//!
//! The `sim` module provides in-memory implementations of every trait for
//! host-side tests.

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod sim;
pub mod traits;

pub use traits::{
    Clock, Console, DigestOracle, EnvProbe, FsProbe, MediaEnumerator, MediaInfo, RecoveryFetch,
    RecoveryLoader, SignatureVerifier,
};
