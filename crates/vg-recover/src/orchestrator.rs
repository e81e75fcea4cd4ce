// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Tiered recovery orchestration
//!
//! Invoked once the phase controller escalates. The orchestrator first
//! presents a fixed-duration notice summarizing the suspicion cause and
//! score — recovery is never silent, and the countdown cannot be canceled —
//! then works through the fallback chain in fixed priority order:
//!
//! 1. Immutable removable media (authenticated against the whitelist)
//! 2. Network-delivered signed package
//! 3. Embedded fallback package
//! 4. Minimal safe-mode boot
//!
//! Every tier validates its candidate before trusting it. If all four
//! tiers fail the orchestrator returns [`Error::RecoveryExhausted`]; the
//! caller must treat that as a fail-secure halt and never resume a normal
//! boot.

use core::fmt::Write;
use heapless::String;
use zeroize::Zeroize;

use vg_common::types::SuspicionScore;
use vg_common::{Error, RecoveryConfig, RecoveryMethod, Result};
use vg_platform::{
    Clock, Console, MediaEnumerator, RecoveryFetch, RecoveryLoader, SignatureVerifier,
};

use crate::media::{authenticate, PhysicalMediaId};
use crate::package::{self, RecoveryPackage};

/// Maximum recovery package size accepted from the network or embedded tier
pub const MAX_PACKAGE_SIZE: usize = 4096;

/// Platform capabilities the orchestrator drives
pub struct RecoveryIo<'a> {
    /// Removable media enumeration
    pub media: &'a dyn MediaEnumerator,
    /// Network image delivery
    pub fetch: &'a mut dyn RecoveryFetch,
    /// Recovery environment handoff
    pub loader: &'a mut dyn RecoveryLoader,
    /// Detached-signature verification
    pub verifier: &'a dyn SignatureVerifier,
    /// Operator-visible console
    pub console: &'a mut dyn Console,
    /// Monotonic clock for the countdown
    pub clock: &'a mut dyn Clock,
}

/// Result of a successful recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Tier that accepted the handoff
    pub method: RecoveryMethod,
    /// Number of tiers attempted, including the successful one
    pub tiers_attempted: u8,
}

/// Tiered recovery orchestrator
pub struct RecoveryOrchestrator<'a> {
    config: RecoveryConfig,
    authorized: &'a [PhysicalMediaId],
}

impl<'a> RecoveryOrchestrator<'a> {
    /// Create an orchestrator over the authorized-media whitelist
    #[must_use]
    pub const fn new(config: RecoveryConfig, authorized: &'a [PhysicalMediaId]) -> Self {
        Self { config, authorized }
    }

    /// Run the fallback chain
    ///
    /// # Arguments
    /// * `cause` - human-readable suspicion cause for the notice
    /// * `score` - suspicion score at escalation time
    /// * `io` - platform capabilities
    ///
    /// # Errors
    /// `RecoveryExhausted` when every tier failed. Individual tier errors
    /// are reported on the console and do not abort the chain.
    pub fn run(
        &self,
        cause: &str,
        score: SuspicionScore,
        io: &mut RecoveryIo<'_>,
    ) -> Result<RecoveryOutcome> {
        self.announce(cause, score, io);
        self.countdown(io);

        let mut tiers_attempted = 0u8;

        for method in RecoveryMethod::PRIORITY_ORDER {
            tiers_attempted += 1;
            write_line(io.console, format_args!("attempting {} recovery", method.as_str()));

            let result = match method {
                RecoveryMethod::ImmutableMedia => self.try_immutable_media(io),
                RecoveryMethod::Network => self.try_network(io),
                RecoveryMethod::Embedded => self.try_embedded(io),
                RecoveryMethod::SafeMode => io.loader.enter_safe_mode(),
            };

            match result {
                Ok(()) => {
                    write_line(
                        io.console,
                        format_args!("{} recovery succeeded", method.as_str()),
                    );
                    return Ok(RecoveryOutcome {
                        method,
                        tiers_attempted,
                    });
                }
                Err(e) => {
                    write_line(
                        io.console,
                        format_args!("{} recovery failed: {}", method.as_str(), e),
                    );
                }
            }
        }

        io.console.write_line("all recovery tiers failed");
        io.console.write_line("system halting; boot from trusted external media");
        Err(Error::RecoveryExhausted)
    }

    /// Display the mandatory pre-recovery notice
    fn announce(&self, cause: &str, score: SuspicionScore, io: &mut RecoveryIo<'_>) {
        io.console.write_line("==============================================");
        io.console.write_line("        BOOT CHAIN INTEGRITY FAILURE");
        io.console.write_line("==============================================");
        write_line(io.console, format_args!("suspected cause: {cause}"));
        write_line(io.console, format_args!("suspicion score: {score}"));
        write_line(
            io.console,
            format_args!("preferred method: {}", self.config.preferred_method.as_str()),
        );
        io.console.write_line("a clean boot environment will be loaded");
    }

    /// Hold the fixed, non-cancelable countdown
    fn countdown(&self, io: &mut RecoveryIo<'_>) {
        for remaining in (1..=self.config.countdown_secs).rev() {
            write_line(
                io.console,
                format_args!("recovery starting in {remaining} s"),
            );
            io.clock.busy_wait_ms(1000);
        }
    }

    /// Tier 1: authenticated immutable removable media
    fn try_immutable_media(&self, io: &mut RecoveryIo<'_>) -> Result<()> {
        let candidates = io.media.removable_media();
        if candidates.is_empty() {
            return Err(Error::RecoveryMediaInvalid);
        }

        let mut last_err = Error::RecoveryMediaInvalid;
        for candidate in &candidates {
            match authenticate(candidate, self.authorized, self.config.require_immutable_media)
            {
                Ok(()) => match io.loader.load_from_media(candidate) {
                    Ok(()) => return Ok(()),
                    Err(e) => last_err = e,
                },
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }

    /// Tier 2: network-delivered signed package
    fn try_network(&self, io: &mut RecoveryIo<'_>) -> Result<()> {
        let mut buf = [0u8; MAX_PACKAGE_SIZE];
        let result = (|| {
            let len = io.fetch.fetch(self.config.artifact_url, &mut buf)?;
            package::verify(&buf[..len], io.verifier, self.config.allow_unsigned_packages)?;
            let pkg = RecoveryPackage::parse(&buf[..len])?;
            io.loader.load_image(pkg.payload)
        })();
        buf.zeroize();
        result
    }

    /// Tier 3: embedded fallback package
    fn try_embedded(&self, io: &mut RecoveryIo<'_>) -> Result<()> {
        let mut buf = [0u8; MAX_PACKAGE_SIZE];
        let result = (|| {
            let len = io.loader.embedded_package(&mut buf)?;
            package::verify(&buf[..len], io.verifier, self.config.allow_unsigned_packages)?;
            io.loader.load_embedded()
        })();
        buf.zeroize();
        result
    }
}

/// Write a formatted line to the console
fn write_line(console: &mut dyn Console, args: core::fmt::Arguments<'_>) {
    let mut line = String::<128>::new();
    let _ = line.write_fmt(args);
    console.write_line(&line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_common::types::{MediaSerial, PartitionUuid};
    use vg_platform::sim::{
        SimClock, SimConsole, SimLoaderScript, SimMediaEnumerator, SimRecoveryFetch,
        SimRecoveryLoader, SimSignatureVerifier,
    };
    use vg_platform::MediaInfo;

    fn rescue_id() -> PhysicalMediaId {
        PhysicalMediaId {
            serial: MediaSerial::from_str_padded("VIGIL-RESCUE-001").unwrap(),
            partition_uuid: PartitionUuid::new([0xAA; 16]),
            sector_size: 2048,
            total_sectors: 350_000,
            require_immutable: true,
        }
    }

    fn rescue_media() -> MediaInfo {
        MediaInfo {
            serial: MediaSerial::from_str_padded("VIGIL-RESCUE-001").unwrap(),
            partition_uuid: PartitionUuid::new([0xAA; 16]),
            sector_size: 2048,
            total_sectors: 350_000,
            read_only: true,
            removable: true,
        }
    }

    fn test_config() -> RecoveryConfig {
        RecoveryConfig {
            countdown_secs: 3,
            ..RecoveryConfig::DEFAULT
        }
    }

    struct Fixture {
        media: SimMediaEnumerator,
        fetch: SimRecoveryFetch,
        loader: SimRecoveryLoader,
        verifier: SimSignatureVerifier,
        console: SimConsole,
        clock: SimClock,
    }

    impl Fixture {
        fn new(loader_script: SimLoaderScript) -> Self {
            Self {
                media: SimMediaEnumerator::new(),
                fetch: SimRecoveryFetch::unavailable(),
                loader: SimRecoveryLoader::new(loader_script),
                verifier: SimSignatureVerifier,
                console: SimConsole::new(),
                clock: SimClock::new(0),
            }
        }

        fn io(&mut self) -> RecoveryIo<'_> {
            RecoveryIo {
                media: &self.media,
                fetch: &mut self.fetch,
                loader: &mut self.loader,
                verifier: &self.verifier,
                console: &mut self.console,
                clock: &mut self.clock,
            }
        }
    }

    fn signed_package(payload: &[u8], buf: &mut [u8]) -> usize {
        let mut region = [0u8; 1024];
        let region_len = package::signing_region(payload, &mut region).unwrap();
        let sig = SimSignatureVerifier::sign(&region[..region_len]);
        package::build(payload, Some(&sig), buf).unwrap()
    }

    #[test]
    fn test_valid_media_short_circuits_remaining_tiers() {
        let authorized = [rescue_id()];
        let mut fx = Fixture::new(SimLoaderScript::all_ok());
        fx.media.attach(rescue_media()).unwrap();

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        let outcome = orchestrator
            .run("critical mismatch", SuspicionScore::new(400), &mut fx.io())
            .unwrap();

        assert_eq!(outcome.method, RecoveryMethod::ImmutableMedia);
        assert_eq!(outcome.tiers_attempted, 1);
        assert_eq!(fx.loader.attempted.as_slice(), ["media"]);
    }

    #[test]
    fn test_notice_and_countdown_precede_recovery() {
        let authorized = [rescue_id()];
        let mut fx = Fixture::new(SimLoaderScript::all_ok());
        fx.media.attach(rescue_media()).unwrap();

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        orchestrator
            .run("threshold exceeded", SuspicionScore::new(1200), &mut fx.io())
            .unwrap();

        assert!(fx.console.contains("BOOT CHAIN INTEGRITY FAILURE"));
        assert!(fx.console.contains("threshold exceeded"));
        assert!(fx.console.contains("suspicion score: 1200"));
        // 3-second scripted countdown was actually held
        assert_eq!(fx.clock.waited_ms, 3000);
    }

    #[test]
    fn test_forged_serial_falls_through_to_next_tier() {
        let authorized = [rescue_id()];
        let mut fx = Fixture::new(SimLoaderScript {
            media_ok: true,
            image_ok: false,
            embedded_ok: false,
            safe_mode_ok: true,
        });

        let mut forged = rescue_media();
        forged.serial = MediaSerial::from_str_padded("EVIL-STICK-666").unwrap();
        fx.media.attach(forged).unwrap();

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        let outcome = orchestrator
            .run("critical mismatch", SuspicionScore::new(0), &mut fx.io())
            .unwrap();

        // Media tier rejected the impostor without loading from it
        assert!(!fx.loader.attempted.contains(&"media"));
        assert_eq!(outcome.method, RecoveryMethod::SafeMode);
        assert_eq!(outcome.tiers_attempted, 4);
    }

    #[test]
    fn test_network_tier_verifies_package_before_handoff() {
        let authorized = [rescue_id()];
        let mut pkg_buf = [0u8; 512];
        let len = signed_package(b"network-recovery-env", &mut pkg_buf);

        let mut fx = Fixture::new(SimLoaderScript::all_ok());
        fx.fetch = SimRecoveryFetch::with_payload(&pkg_buf[..len]).unwrap();
        // No media attached: tier 1 fails, tier 2 succeeds

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        let outcome = orchestrator
            .run("threshold exceeded", SuspicionScore::new(1100), &mut fx.io())
            .unwrap();

        assert_eq!(outcome.method, RecoveryMethod::Network);
        assert_eq!(outcome.tiers_attempted, 2);
        assert_eq!(fx.loader.attempted.as_slice(), ["image"]);
    }

    #[test]
    fn test_unsigned_network_package_rejected() {
        let authorized = [rescue_id()];
        let mut pkg_buf = [0u8; 512];
        let len = package::build(b"unsigned-env", None, &mut pkg_buf).unwrap();

        let mut fx = Fixture::new(SimLoaderScript {
            media_ok: false,
            image_ok: true,
            embedded_ok: false,
            safe_mode_ok: true,
        });
        fx.fetch = SimRecoveryFetch::with_payload(&pkg_buf[..len]).unwrap();

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        let outcome = orchestrator
            .run("threshold exceeded", SuspicionScore::new(1100), &mut fx.io())
            .unwrap();

        // Unsigned package never reached the loader; chain fell to safe mode
        assert!(!fx.loader.attempted.contains(&"image"));
        assert_eq!(outcome.method, RecoveryMethod::SafeMode);
    }

    #[test]
    fn test_embedded_tier_validates_fallback_package() {
        let authorized = [rescue_id()];
        let mut pkg_buf = [0u8; 512];
        let len = signed_package(b"embedded-fallback-env", &mut pkg_buf);

        let mut fx = Fixture::new(SimLoaderScript {
            media_ok: false,
            image_ok: false,
            embedded_ok: true,
            safe_mode_ok: true,
        });
        fx.loader.set_embedded_package(&pkg_buf[..len]).unwrap();

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        let outcome = orchestrator
            .run("container trap", SuspicionScore::new(500), &mut fx.io())
            .unwrap();

        assert_eq!(outcome.method, RecoveryMethod::Embedded);
        assert_eq!(outcome.tiers_attempted, 3);
        assert_eq!(fx.loader.attempted.as_slice(), ["embedded"]);
    }

    #[test]
    fn test_all_tiers_exhausted_fails_secure() {
        let authorized = [rescue_id()];
        let mut fx = Fixture::new(SimLoaderScript::all_fail());

        let orchestrator = RecoveryOrchestrator::new(test_config(), &authorized);
        let result = orchestrator.run("critical mismatch", SuspicionScore::new(0), &mut fx.io());

        assert_eq!(result, Err(Error::RecoveryExhausted));
        assert!(fx.console.contains("all recovery tiers failed"));
        // Safe mode was the last thing tried
        assert_eq!(fx.loader.attempted.last(), Some(&"safe-mode"));
    }
}
