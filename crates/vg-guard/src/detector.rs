// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Vigil Systems Inc.

//! Switcheroo and container-trap detection
//!
//! Detectors are registered values polymorphic over the [`Detect`]
//! capability — adding a detector means registering it, not editing a
//! dispatch table. Two built-in families ship by default:
//!
//! - [`SwitcherooPattern`]: phase-scoped drop-site indicators. During the
//!   boot-services phases the guardian sees the ESP; OS-style artifacts
//!   materializing at unmeasured ESP locations are staging grounds for a
//!   last-stage substitution.
//! - Container-trap indicators (markers, chroot heuristic, filesystem
//!   shape), active from the `Filesystem` phase onward: the phase where an
//!   attacker most plausibly substitutes the entire execution context.
//!
//! Trap detection is OR-semantics for the boolean flag, but every firing
//! indicator contributes its own weight — multiple indicators compound the
//! score, they are not capped per phase.

use heapless::Vec;

use vg_common::constants::{MAX_FINDINGS, MAX_PATTERNS};
use vg_common::types::Weight;
use vg_common::BootPhase;
use vg_platform::{EnvProbe, FsProbe};

/// Context handed to each detector
pub struct DetectContext<'a> {
    /// Phase being validated
    pub phase: BootPhase,
    /// Filesystem-query primitives
    pub fs: &'a dyn FsProbe,
    /// Environment baseline checks
    pub env: &'a dyn EnvProbe,
}

/// One weighted finding from a detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finding {
    /// Indicator that fired
    pub indicator: &'static str,
    /// Score contribution
    pub weight: Weight,
    /// Finding is a container/fake-environment trap
    pub trap: bool,
}

/// Detection capability
///
/// A detector inspects the context and reports at most one finding per
/// scan. Detectors must be side-effect free: scoring and state updates
/// belong to the phase controller.
pub trait Detect {
    /// Run the detector against the current context
    fn detect(&self, cx: &DetectContext<'_>) -> Option<Finding>;

    /// Detector name for diagnostics
    fn name(&self) -> &'static str;
}

/// Aggregated result of one detector sweep
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Individual findings
    pub findings: Vec<Finding, MAX_FINDINGS>,
    /// At least one trap-class indicator fired
    pub trap_detected: bool,
    /// Sum of all finding weights
    pub score_delta: Weight,
}

// ============================================================================
// Built-in: switcheroo patterns
// ============================================================================

/// Phase-scoped drop-site indicator
///
/// Fires when the indicator path exists in the currently visible filesystem
/// during its associated phase.
#[derive(Debug, Clone, Copy)]
pub struct SwitcherooPattern {
    /// Phase this pattern applies to
    pub phase: BootPhase,
    /// Suspicious path
    pub indicator: &'static str,
    /// Score contribution when present
    pub weight: u32,
}

impl SwitcherooPattern {
    /// Create a pattern
    #[must_use]
    pub const fn new(phase: BootPhase, indicator: &'static str, weight: u32) -> Self {
        Self {
            phase,
            indicator,
            weight,
        }
    }
}

impl Detect for SwitcherooPattern {
    fn detect(&self, cx: &DetectContext<'_>) -> Option<Finding> {
        if cx.phase != self.phase {
            return None;
        }
        if cx.fs.exists(self.indicator) {
            Some(Finding {
                indicator: self.indicator,
                weight: Weight::new(self.weight),
                trap: false,
            })
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "switcheroo-pattern"
    }
}

/// Default drop-site patterns
///
/// Weights reflect how late in the chain the substitution would land: the
/// closer to the running kernel, the heavier the hit.
pub static DEFAULT_PATTERNS: [SwitcherooPattern; 4] = [
    SwitcherooPattern::new(BootPhase::Bootloader, "\\EFI\\Boot\\bootx64.efi", 300),
    SwitcherooPattern::new(BootPhase::Bootloader, "\\boot\\grub\\grub.cfg", 250),
    SwitcherooPattern::new(BootPhase::Initramfs, "\\initrd.img", 400),
    SwitcherooPattern::new(BootPhase::Kernel, "\\vmlinuz", 450),
];

// ============================================================================
// Built-in: container trap indicators
// ============================================================================

/// Well-known container runtime marker
///
/// Active at `Filesystem` and later; fires when the marker path exists in
/// the mounted root.
#[derive(Debug, Clone, Copy)]
pub struct ContainerMarker {
    /// Marker path
    pub marker: &'static str,
    /// Score contribution when present
    pub weight: u32,
}

impl ContainerMarker {
    /// Create a marker indicator
    #[must_use]
    pub const fn new(marker: &'static str, weight: u32) -> Self {
        Self { marker, weight }
    }
}

impl Detect for ContainerMarker {
    fn detect(&self, cx: &DetectContext<'_>) -> Option<Finding> {
        if cx.phase < BootPhase::Filesystem {
            return None;
        }
        if cx.fs.exists(self.marker) {
            Some(Finding {
                indicator: self.marker,
                weight: Weight::new(self.weight),
                trap: true,
            })
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "container-marker"
    }
}

/// Default container runtime markers
pub static CONTAINER_MARKERS: [ContainerMarker; 5] = [
    ContainerMarker::new("/proc/1/cgroup", 500),
    ContainerMarker::new("/.dockerenv", 500),
    ContainerMarker::new("/var/run/docker.sock", 450),
    ContainerMarker::new("/run/lxc", 450),
    ContainerMarker::new("/var/lib/lxd", 450),
];

/// Chroot / PID-namespace heuristic
///
/// In a full system the guardian can see its own proc entry and PID 1's.
/// Seeing `/proc/self` without `/proc/1` means init is hidden — a PID
/// namespace or a chroot jail with a partial proc mount.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChrootHeuristic;

impl Detect for ChrootHeuristic {
    fn detect(&self, cx: &DetectContext<'_>) -> Option<Finding> {
        if cx.phase < BootPhase::Filesystem {
            return None;
        }
        if cx.fs.exists("/proc/self") && !cx.fs.exists("/proc/1") {
            Some(Finding {
                indicator: "chroot: /proc/1 hidden",
                weight: Weight::new(400),
                trap: true,
            })
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "chroot-heuristic"
    }
}

/// Filesystem-shape heuristic
///
/// A freshly mounted real root carries the standard skeleton. A sparse
/// fake assembled just to satisfy the guardian usually does not: three or
/// more missing skeleton directories marks the root as fabricated.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsShapeHeuristic;

impl FsShapeHeuristic {
    const SKELETON: [&'static str; 4] = ["/boot", "/etc", "/dev", "/sys"];
}

impl Detect for FsShapeHeuristic {
    fn detect(&self, cx: &DetectContext<'_>) -> Option<Finding> {
        if cx.phase < BootPhase::Filesystem {
            return None;
        }
        let missing = Self::SKELETON
            .iter()
            .filter(|path| !cx.fs.exists(path))
            .count();
        if missing >= 3 {
            Some(Finding {
                indicator: "fake filesystem shape",
                weight: Weight::new(350),
                trap: true,
            })
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        "fs-shape-heuristic"
    }
}

// ============================================================================
// Detector set
// ============================================================================

/// Registered detector collection
#[derive(Default)]
pub struct DetectorSet<'d> {
    detectors: Vec<&'d dyn Detect, MAX_PATTERNS>,
}

impl<'d> DetectorSet<'d> {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Create a set with all built-in detectors registered
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        for pattern in &DEFAULT_PATTERNS {
            let _ = set.register(pattern);
        }
        for marker in &CONTAINER_MARKERS {
            let _ = set.register(marker);
        }
        static CHROOT: ChrootHeuristic = ChrootHeuristic;
        static FS_SHAPE: FsShapeHeuristic = FsShapeHeuristic;
        let _ = set.register(&CHROOT);
        let _ = set.register(&FS_SHAPE);
        set
    }

    /// Register a detector
    pub fn register(&mut self, detector: &'d dyn Detect) -> vg_common::Result<()> {
        self.detectors
            .push(detector)
            .map_err(|_| vg_common::Error::BufferTooSmall)
    }

    /// Number of registered detectors
    #[must_use]
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// Check if the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every registered detector against the context
    ///
    /// Additive semantics: each firing detector contributes its weight.
    /// Findings past [`MAX_FINDINGS`] still contribute weight and the trap
    /// flag; only their detail records are dropped.
    #[must_use]
    pub fn scan(&self, cx: &DetectContext<'_>) -> ScanReport {
        let mut report = ScanReport::default();
        for detector in &self.detectors {
            if let Some(finding) = detector.detect(cx) {
                report.score_delta = report.score_delta.saturating_add(finding.weight);
                report.trap_detected |= finding.trap;
                let _ = report.findings.push(finding);
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vg_platform::sim::{SimEnvProbe, SimFsProbe};

    fn scan_phase(set: &DetectorSet<'_>, fs: &SimFsProbe, phase: BootPhase) -> ScanReport {
        let env = SimEnvProbe::clean();
        set.scan(&DetectContext {
            phase,
            fs,
            env: &env,
        })
    }

    #[test]
    fn test_pattern_fires_only_in_its_phase() {
        let set = DetectorSet::with_defaults();
        let mut fs = SimFsProbe::new();
        fs.add_path("\\vmlinuz").unwrap();

        let at_kernel = scan_phase(&set, &fs, BootPhase::Kernel);
        assert_eq!(at_kernel.score_delta, Weight::new(450));
        assert!(!at_kernel.trap_detected);

        let at_bootloader = scan_phase(&set, &fs, BootPhase::Bootloader);
        assert_eq!(at_bootloader.score_delta, Weight::ZERO);
    }

    #[test]
    fn test_container_markers_inactive_before_filesystem() {
        let set = DetectorSet::with_defaults();
        let mut fs = SimFsProbe::new();
        fs.add_path("/.dockerenv").unwrap();

        let early = scan_phase(&set, &fs, BootPhase::Kernel);
        assert!(!early.trap_detected);

        let late = scan_phase(&set, &fs, BootPhase::Filesystem);
        assert!(late.trap_detected);
        assert_eq!(late.score_delta, Weight::new(500));
    }

    #[test]
    fn test_multiple_indicators_compound() {
        let set = DetectorSet::with_defaults();
        let mut fs = SimFsProbe::new();
        fs.add_path("/.dockerenv").unwrap();
        fs.add_path("/var/run/docker.sock").unwrap();
        // Full skeleton so the shape heuristic stays quiet
        for path in ["/boot", "/etc", "/dev", "/sys"] {
            fs.add_path(path).unwrap();
        }

        let report = scan_phase(&set, &fs, BootPhase::Filesystem);
        assert!(report.trap_detected);
        // 500 + 450, not a flat penalty
        assert_eq!(report.score_delta, Weight::new(950));
        assert_eq!(report.findings.len(), 2);
    }

    #[test]
    fn test_chroot_heuristic() {
        let set = DetectorSet::with_defaults();
        let mut fs = SimFsProbe::new();
        fs.add_path("/proc/self").unwrap();
        for path in ["/boot", "/etc", "/dev", "/sys"] {
            fs.add_path(path).unwrap();
        }

        let report = scan_phase(&set, &fs, BootPhase::Filesystem);
        assert!(report.trap_detected);
        assert_eq!(report.score_delta, Weight::new(400));

        // PID 1 visible: no trap
        let mut fs_ok = SimFsProbe::new();
        fs_ok.add_path("/proc/self").unwrap();
        fs_ok.add_path("/proc/1").unwrap();
        for path in ["/boot", "/etc", "/dev", "/sys"] {
            fs_ok.add_path(path).unwrap();
        }
        let report = scan_phase(&set, &fs_ok, BootPhase::Filesystem);
        assert!(!report.trap_detected);
    }

    #[test]
    fn test_fs_shape_heuristic_on_sparse_root() {
        let set = DetectorSet::with_defaults();
        let mut fs = SimFsProbe::new();
        // Only /etc present; three skeleton dirs missing
        fs.add_path("/etc").unwrap();

        let report = scan_phase(&set, &fs, BootPhase::Filesystem);
        assert!(report.trap_detected);
        assert_eq!(report.score_delta, Weight::new(350));
    }

    #[test]
    fn test_custom_detector_registration() {
        struct AlwaysFires;
        impl Detect for AlwaysFires {
            fn detect(&self, _cx: &DetectContext<'_>) -> Option<Finding> {
                Some(Finding {
                    indicator: "custom",
                    weight: Weight::new(123),
                    trap: false,
                })
            }
            fn name(&self) -> &'static str {
                "always-fires"
            }
        }

        let custom = AlwaysFires;
        let mut set = DetectorSet::new();
        set.register(&custom).unwrap();

        let fs = SimFsProbe::new();
        let report = scan_phase(&set, &fs, BootPhase::PreBoot);
        assert_eq!(report.score_delta, Weight::new(123));
        assert_eq!(report.findings[0].indicator, "custom");
    }
}
