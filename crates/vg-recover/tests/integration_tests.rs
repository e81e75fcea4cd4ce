// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Integration tests for vg-recover
//!
//! Full fallback-chain runs against scripted media, network and loader
//! simulators, exercising tier ordering, per-tier validation and the
//! fail-secure exhaustion path.

use vg_common::types::{MediaSerial, PartitionUuid, SuspicionScore};
use vg_common::{Error, RecoveryConfig, RecoveryMethod};
use vg_platform::sim::{
    SimClock, SimConsole, SimLoaderScript, SimMediaEnumerator, SimRecoveryFetch,
    SimRecoveryLoader, SimSignatureVerifier,
};
use vg_platform::MediaInfo;
use vg_recover::{package, PhysicalMediaId, RecoveryIo, RecoveryOrchestrator};

fn rescue_id(serial: &str) -> PhysicalMediaId {
    PhysicalMediaId {
        serial: MediaSerial::from_str_padded(serial).unwrap(),
        partition_uuid: PartitionUuid::new([0xAA; 16]),
        sector_size: 2048,
        total_sectors: 350_000,
        require_immutable: true,
    }
}

fn media(serial: &str, read_only: bool) -> MediaInfo {
    MediaInfo {
        serial: MediaSerial::from_str_padded(serial).unwrap(),
        partition_uuid: PartitionUuid::new([0xAA; 16]),
        sector_size: 2048,
        total_sectors: 350_000,
        read_only,
        removable: true,
    }
}

fn config() -> RecoveryConfig {
    RecoveryConfig {
        countdown_secs: 1,
        ..RecoveryConfig::DEFAULT
    }
}

fn signed_package(payload: &[u8], buf: &mut [u8]) -> usize {
    let mut region = [0u8; 1024];
    let region_len = package::signing_region(payload, &mut region).unwrap();
    let sig = SimSignatureVerifier::sign(&region[..region_len]);
    package::build(payload, Some(&sig), buf).unwrap()
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
    fn new(script: SimLoaderScript) -> Self {
        Self {
            media: SimMediaEnumerator::new(),
            fetch: SimRecoveryFetch::unavailable(),
            loader: SimRecoveryLoader::new(script),
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

    fn lines_index(&self, needle: &str) -> Option<usize> {
        self.console.lines.iter().position(|l| l.contains(needle))
    }
}

#[test]
fn test_second_candidate_authenticates_when_first_is_forged() {
    let authorized = [rescue_id("VIGIL-RESCUE-001")];
    let mut fx = Fixture::new(SimLoaderScript::all_ok());
    fx.media.attach(media("EVIL-STICK-666", true)).unwrap();
    fx.media.attach(media("VIGIL-RESCUE-001", true)).unwrap();

    let orchestrator = RecoveryOrchestrator::new(config(), &authorized);
    let outcome = orchestrator
        .run("critical boot target mismatch", SuspicionScore::new(400), &mut fx.io())
        .unwrap();

    assert_eq!(outcome.method, RecoveryMethod::ImmutableMedia);
    assert_eq!(outcome.tiers_attempted, 1);
    // The forged stick was never loaded from
    assert_eq!(fx.loader.attempted.as_slice(), ["media"]);
}

#[test]
fn test_writable_copy_of_authorized_media_is_refused() {
    let authorized = [rescue_id("VIGIL-RESCUE-001")];
    let mut fx = Fixture::new(SimLoaderScript {
        media_ok: true,
        image_ok: false,
        embedded_ok: false,
        safe_mode_ok: true,
    });
    // Right serial and geometry, but writable: an imaged copy on a USB stick
    fx.media.attach(media("VIGIL-RESCUE-001", false)).unwrap();

    let orchestrator = RecoveryOrchestrator::new(config(), &authorized);
    let outcome = orchestrator
        .run("container trap detected", SuspicionScore::new(500), &mut fx.io())
        .unwrap();

    assert!(!fx.loader.attempted.contains(&"media"));
    assert_eq!(outcome.method, RecoveryMethod::SafeMode);
}

#[test]
fn test_bad_network_signature_falls_through_to_embedded() {
    let authorized = [rescue_id("VIGIL-RESCUE-001")];

    // Network package with a corrupted signature
    let mut net_pkg = [0u8; 512];
    let net_len = signed_package(b"network-env", &mut net_pkg);
    net_pkg[0x2C] ^= 0xFF;

    // Valid embedded fallback
    let mut emb_pkg = [0u8; 512];
    let emb_len = signed_package(b"embedded-env", &mut emb_pkg);

    let mut fx = Fixture::new(SimLoaderScript::all_ok());
    fx.fetch = SimRecoveryFetch::with_payload(&net_pkg[..net_len]).unwrap();
    fx.loader.set_embedded_package(&emb_pkg[..emb_len]).unwrap();

    let orchestrator = RecoveryOrchestrator::new(config(), &authorized);
    let outcome = orchestrator
        .run("accumulated suspicion over threshold", SuspicionScore::new(1100), &mut fx.io())
        .unwrap();

    assert_eq!(outcome.method, RecoveryMethod::Embedded);
    assert_eq!(outcome.tiers_attempted, 3);
    // The tampered network image never reached the loader
    assert_eq!(fx.loader.attempted.as_slice(), ["embedded"]);
    assert!(fx.console.contains("network recovery failed"));
}

#[test]
fn test_exhaustion_reports_every_tier_in_order() {
    let authorized = [rescue_id("VIGIL-RESCUE-001")];
    let mut fx = Fixture::new(SimLoaderScript::all_fail());

    let orchestrator = RecoveryOrchestrator::new(config(), &authorized);
    let result = orchestrator.run(
        "critical boot target mismatch",
        SuspicionScore::new(400),
        &mut fx.io(),
    );

    assert_eq!(result, Err(Error::RecoveryExhausted));
    for tier in ["immutable-media", "network", "embedded", "safe-mode"] {
        assert!(
            fx.console.contains(tier),
            "tier {tier} missing from console transcript"
        );
    }
}

#[test]
fn test_notice_always_precedes_any_tier() {
    let authorized = [rescue_id("VIGIL-RESCUE-001")];
    let mut fx = Fixture::new(SimLoaderScript::all_fail());

    let orchestrator = RecoveryOrchestrator::new(config(), &authorized);
    let _ = orchestrator.run("container trap detected", SuspicionScore::new(950), &mut fx.io());

    let banner_index = fx
        .lines_index("BOOT CHAIN INTEGRITY FAILURE")
        .expect("banner missing");
    let first_tier_index = fx
        .lines_index("attempting immutable-media recovery")
        .expect("tier line missing");
    assert!(banner_index < first_tier_index);
    assert!(fx.console.contains("suspicion score: 950"));
}

#[test]
fn test_unsigned_embedded_accepted_only_with_explicit_opt_in() {
    let authorized = [rescue_id("VIGIL-RESCUE-001")];

    let mut pkg = [0u8; 512];
    let len = package::build(b"unsigned-embedded-env", None, &mut pkg).unwrap();

    // Default policy: refused
    let mut fx = Fixture::new(SimLoaderScript::all_fail());
    fx.loader = SimRecoveryLoader::new(SimLoaderScript {
        media_ok: false,
        image_ok: false,
        embedded_ok: true,
        safe_mode_ok: false,
    });
    fx.loader.set_embedded_package(&pkg[..len]).unwrap();

    let orchestrator = RecoveryOrchestrator::new(config(), &authorized);
    let result = orchestrator.run("cause", SuspicionScore::new(0), &mut fx.io());
    assert_eq!(result, Err(Error::RecoveryExhausted));

    // Explicit opt-in: accepted
    let mut fx = Fixture::new(SimLoaderScript {
        media_ok: false,
        image_ok: false,
        embedded_ok: true,
        safe_mode_ok: false,
    });
    fx.loader.set_embedded_package(&pkg[..len]).unwrap();

    let lenient = RecoveryConfig {
        allow_unsigned_packages: true,
        ..config()
    };
    let orchestrator = RecoveryOrchestrator::new(lenient, &authorized);
    let outcome = orchestrator
        .run("cause", SuspicionScore::new(0), &mut fx.io())
        .unwrap();
    assert_eq!(outcome.method, RecoveryMethod::Embedded);
}
