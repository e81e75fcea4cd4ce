// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Vigil BootGuard Common Library
//!
//! This crate provides the types, error definitions, configuration
//! structures, logging and time utilities shared across all Vigil BootGuard
//! components.
//!
//! # Features
//!
//! - `std`: Enable standard library support (disabled by default)
//! - `defmt`: Enable defmt logging support for embedded debugging
//!
//! # Design
//!
//! No heap allocations are performed — all buffers use fixed-size arrays or
//! heapless collections. Suspicion-score arithmetic saturates and digest
//! comparison is constant-time.

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod constants;
pub mod errors;
pub mod log;
pub mod phase;
pub mod time;
pub mod types;

// Re-export commonly used items
pub use config::{GuardianConfig, RecoveryConfig, RecoveryMethod, WeightTable};
pub use errors::{Error, Result};
pub use phase::BootPhase;
pub use types::{Digest, MediaSerial, PartitionUuid, SuspicionScore, TargetPath, Weight};
