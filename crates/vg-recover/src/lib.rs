// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Vigil BootGuard Recovery
//!
//! This crate implements the tiered, self-validating recovery chain invoked
//! when the phase controller escalates:
//!
//! - **Media**: physical recovery-media authentication (serial whitelist,
//!   read-only attribute, partition identity, geometry)
//! - **Package**: signed recovery-package parsing and verification
//! - **Orchestrator**: the fixed-priority fallback chain with the mandatory
//!   notice and non-cancelable countdown, failing secure on exhaustion

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod media;
pub mod orchestrator;
pub mod package;

pub use media::{authenticate, PhysicalMediaId};
pub use orchestrator::{RecoveryIo, RecoveryOrchestrator, RecoveryOutcome};
pub use package::RecoveryPackage;
