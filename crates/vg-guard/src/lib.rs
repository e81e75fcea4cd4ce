// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Vigil BootGuard Core
//!
//! Phase-gated boot-chain integrity guardian:
//!
//! - **Registry**: expected boot artifacts (path, digest, size, criticality)
//! - **Detector**: switcheroo patterns and container-trap heuristics
//! - **Scorer**: additive, non-decaying suspicion score with escalation policy
//! - **Controller**: the ordered phase state machine driving it all
//! - **Status**: read-only diagnostics projection
//!
//! # Usage
//!
//! The hosting boot environment initializes a [`Guardian`] at the firmware
//! handoff and calls [`Guardian::validate_phase`] at each stage of the boot
//! sequence. Escalation to the recovery chain happens synchronously inside
//! `validate_phase`; after an escalation the guardian refuses all further
//! work for the attempt.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod controller;
pub mod detector;
pub mod registry;
pub mod scorer;
pub mod state;
pub mod status;

pub use controller::{Guardian, PhaseVerdict, Platform};
pub use detector::{Detect, DetectContext, DetectorSet, Finding, SwitcherooPattern};
pub use registry::{BootTarget, CheckOutcome, TargetRegistry};
pub use scorer::{EscalationCause, EscalationDecision, SuspicionScorer};
pub use state::GuardianState;
pub use status::StatusSnapshot;

// The phase enum lives in vg-common so the log buffer can tag entries; it
// is re-exported here because callers treat it as part of the guardian API.
pub use vg_common::BootPhase;
