//! Overlap/cut computation along a single movement axis
//!
//! Pure geometry: given where the layer below sits and where the moving layer
//! was stopped, decide how much of the box survives and what falls off.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::PERFECT_EPSILON;
use crate::sign;

/// Horizontal axis a layer slides along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// The axis the next layer moves along
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }

    /// Component of `v` along this axis
    #[inline]
    pub fn get(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    #[inline]
    pub fn set(self, v: &mut Vec3, value: f32) {
        match self {
            Axis::X => v.x = value,
            Axis::Z => v.z = value,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Z => Vec3::Z,
        }
    }
}

/// A span along the movement axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub center: f32,
    pub size: f32,
}

/// Result of stopping a moving layer above the previous one
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CutOutcome {
    /// No shared footprint; the run is over
    Miss { overlap: f32 },
    /// The layer keeps `kept`; `overhang` (if any) falls off
    Cut {
        kept: Segment,
        overhang: Option<Segment>,
        delta: f32,
    },
}

impl CutOutcome {
    pub fn is_miss(&self) -> bool {
        matches!(self, CutOutcome::Miss { .. })
    }

    /// A cut close enough to zero that nothing visible falls off
    pub fn is_perfect(&self) -> bool {
        matches!(self, CutOutcome::Cut { overhang: None, .. })
    }
}

/// Length of the shared footprint: `size - |delta|` (non-positive means a miss)
#[inline]
pub fn overlap(delta: f32, size: f32) -> f32 {
    size - delta.abs()
}

/// Cut a layer of `size` centered at `current` against the layer below centered at `prev`
///
/// The kept part is recentered on the shared region (shifted by `-delta / 2`).
/// The overhang sits on the far side of the cut, in the direction of `delta`.
pub fn cut(prev: f32, current: f32, size: f32) -> CutOutcome {
    let delta = current - prev;
    let overhang_size = delta.abs();
    let overlap = overlap(delta, size);

    if overlap <= 0.0 {
        return CutOutcome::Miss { overlap };
    }

    let kept = Segment {
        center: current - delta / 2.0,
        size: overlap,
    };

    let overhang = (overhang_size >= PERFECT_EPSILON).then(|| Segment {
        center: kept.center + sign(delta) * (overlap / 2.0 + overhang_size / 2.0),
        size: overhang_size,
    });

    CutOutcome::Cut {
        kept,
        overhang,
        delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_perfect_stack_keeps_full_size() {
        let outcome = cut(0.0, 0.0, 3.0);
        match outcome {
            CutOutcome::Cut { kept, overhang, .. } => {
                assert!((kept.size - 3.0).abs() < 1e-6);
                assert!(kept.center.abs() < 1e-6);
                assert!(overhang.is_none());
            }
            CutOutcome::Miss { .. } => panic!("perfect stack reported as miss"),
        }
        assert!(outcome.is_perfect());
    }

    #[test]
    fn test_partial_overlap_trims_and_shifts() {
        // Size 2, previous at x=0, current drifted to x=0.5
        let CutOutcome::Cut { kept, overhang, delta } = cut(0.0, 0.5, 2.0) else {
            panic!("expected a cut");
        };
        assert!((delta - 0.5).abs() < 1e-6);
        assert!((kept.size - 1.5).abs() < 1e-6);
        // Offset of -delta/2 from the current position
        assert!((kept.center - 0.25).abs() < 1e-6);

        let overhang = overhang.expect("overhang should be spawned");
        assert!((overhang.size - 0.5).abs() < 1e-6);
        assert!((overhang.center - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_negative_drift_drops_overhang_on_the_near_side() {
        let CutOutcome::Cut { kept, overhang, .. } = cut(1.0, 0.0, 2.0) else {
            panic!("expected a cut");
        };
        assert!((kept.size - 1.0).abs() < 1e-6);
        assert!((kept.center - 0.5).abs() < 1e-6);
        let overhang = overhang.unwrap();
        assert!((overhang.center - -0.5).abs() < 1e-6);
    }

    #[test]
    fn test_full_miss() {
        let outcome = cut(0.0, 2.5, 2.0);
        assert!(outcome.is_miss());
        if let CutOutcome::Miss { overlap } = outcome {
            assert!(overlap < 0.0);
        }
    }

    #[test]
    fn test_exact_edge_is_a_miss() {
        assert!(cut(0.0, 2.0, 2.0).is_miss());
        assert!(cut(0.0, -2.0, 2.0).is_miss());
    }

    #[test]
    fn test_tiny_drift_spawns_no_overhang() {
        let outcome = cut(0.0, PERFECT_EPSILON / 2.0, 3.0);
        assert!(outcome.is_perfect());
    }

    #[test]
    fn test_axis_accessors() {
        let mut v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Axis::X.get(v), 1.0);
        assert_eq!(Axis::Z.get(v), 3.0);
        Axis::Z.set(&mut v, 7.0);
        assert_eq!(v, Vec3::new(1.0, 2.0, 7.0));
        assert_eq!(Axis::X.other(), Axis::Z);
        assert_eq!(Axis::Z.other().unit(), Vec3::X);
    }

    proptest! {
        #[test]
        fn prop_kept_size_is_size_minus_drift(
            prev in -5.0f32..5.0,
            drift in -2.9f32..2.9,
            size in 3.0f32..4.0,
        ) {
            let outcome = cut(prev, prev + drift, size);
            let CutOutcome::Cut { kept, .. } = outcome else {
                return Err(TestCaseError::fail("drift smaller than size must cut"));
            };
            prop_assert!((kept.size - (size - drift.abs())).abs() < 1e-3);
            prop_assert!((kept.center - (prev + drift / 2.0)).abs() < 1e-3);
        }

        #[test]
        fn prop_kept_and_overhang_tile_the_original_box(
            drift in -1.9f32..1.9,
            size in 2.0f32..3.0,
        ) {
            prop_assume!(drift.abs() >= PERFECT_EPSILON);
            let CutOutcome::Cut { kept, overhang: Some(overhang), .. } = cut(0.0, drift, size) else {
                return Err(TestCaseError::fail("expected a cut with an overhang"));
            };
            prop_assert!((kept.size + overhang.size - size).abs() < 1e-3);
            // Union of both pieces spans the original box
            let lo = (kept.center - kept.size / 2.0).min(overhang.center - overhang.size / 2.0);
            let hi = (kept.center + kept.size / 2.0).max(overhang.center + overhang.size / 2.0);
            prop_assert!((lo - (drift - size / 2.0)).abs() < 1e-3);
            prop_assert!((hi - (drift + size / 2.0)).abs() < 1e-3);
        }

        #[test]
        fn prop_drift_beyond_size_misses(
            drift in 2.0f32..20.0,
            negative in any::<bool>(),
        ) {
            let drift = if negative { -drift } else { drift };
            prop_assert!(cut(0.0, drift, 2.0).is_miss());
        }
    }
}
