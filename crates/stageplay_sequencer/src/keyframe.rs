// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframe definitions for recorded motion tracks.
//!
//! Recorded camera work stores its easing as a curve from (0,0) to (1,1) with
//! two control points inside the unit square, one curve per keyframe segment.

use serde::{Deserialize, Serialize};

/// Bisection steps used to invert the easing curve's x coordinate
const EASE_ITERATIONS: usize = 24;

/// How a segment moves from one keyframe to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterpolationMode {
    /// Hold the value until the next key (camera cuts)
    Constant,
    /// Straight blend
    #[default]
    Linear,
    /// Blend shaped by the keyframe's easing curve
    Bezier,
}

/// Keyed value of a channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KeyframeValue {
    /// Scalar channel (distance, FOV)
    Float(f32),
    /// Vector channel (position, euler rotation)
    Vec3([f32; 3]),
}

impl KeyframeValue {
    /// Blend towards `other` by already-eased progress `t`; `None` if the kinds differ
    pub fn interpolate(&self, other: &KeyframeValue, t: f32) -> Option<KeyframeValue> {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        match (*self, *other) {
            (Self::Float(a), Self::Float(b)) => Some(Self::Float(mix(a, b))),
            (Self::Vec3([ax, ay, az]), Self::Vec3([bx, by, bz])) => {
                Some(Self::Vec3([mix(ax, bx), mix(ay, by), mix(az, bz)]))
            }
            _ => None,
        }
    }

    /// Scalar payload
    pub fn scalar(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Vec3(_) => None,
        }
    }

    /// Vector payload
    pub fn vec3(&self) -> Option<[f32; 3]> {
        match *self {
            Self::Vec3(v) => Some(v),
            Self::Float(_) => None,
        }
    }
}

/// One key of a track channel, with the easing of the segment that follows it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds
    pub time: f32,
    /// Keyed value
    pub value: KeyframeValue,
    /// Segment mode towards the next key
    #[serde(default)]
    pub interpolation: InterpolationMode,
    /// Easing control points `[p1, p2]`, unit square
    #[serde(default)]
    pub easing: Option<[[f32; 2]; 2]>,
}

impl Keyframe {
    /// A linear key
    pub fn new(time: f32, value: KeyframeValue) -> Self {
        Self {
            time,
            value,
            interpolation: InterpolationMode::Linear,
            easing: None,
        }
    }

    /// Change the segment mode
    pub fn with_interpolation(mut self, mode: InterpolationMode) -> Self {
        self.interpolation = mode;
        self
    }

    /// Ease the following segment with control points `p1` and `p2`
    pub fn with_easing(mut self, p1: [f32; 2], p2: [f32; 2]) -> Self {
        self.easing = Some([p1, p2]);
        self.interpolation = InterpolationMode::Bezier;
        self
    }

    /// Map linear segment progress to eased progress
    pub fn ease(&self, t: f32) -> f32 {
        match self.interpolation {
            InterpolationMode::Constant => 0.0,
            InterpolationMode::Linear => t,
            InterpolationMode::Bezier => {
                let [p1, p2] = self.easing.unwrap_or([[0.0, 0.0], [1.0, 1.0]]);
                ease_curve(p1, p2, t)
            }
        }
    }
}

/// One coordinate of the cubic from 0 to 1 with inner control values `c1`, `c2`
fn unit_cubic(c1: f32, c2: f32, s: f32) -> f32 {
    let r = 1.0 - s;
    3.0 * r * r * s * c1 + 3.0 * r * s * s * c2 + s * s * s
}

/// Find the curve parameter whose x is `x` (x is monotonic inside the unit square), return its y
fn ease_curve(p1: [f32; 2], p2: [f32; 2], x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    let mut s = x;

    for _ in 0..EASE_ITERATIONS {
        let cx = unit_cubic(p1[0], p2[0], s);
        if (cx - x).abs() < 1e-5 {
            break;
        }
        if cx < x {
            lo = s;
        } else {
            hi = s;
        }
        s = 0.5 * (lo + hi);
    }

    unit_cubic(p1[1], p2[1], s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_ease_is_identity() {
        let kf = Keyframe::new(0.0, KeyframeValue::Float(1.0));
        assert!((kf.ease(0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bezier_ease_endpoints_and_shape() {
        let kf = Keyframe::new(0.0, KeyframeValue::Float(0.0))
            .with_easing([0.42, 0.0], [0.58, 1.0]);
        assert_eq!(kf.interpolation, InterpolationMode::Bezier);
        assert!(kf.ease(0.0).abs() < 1e-3);
        assert!((kf.ease(1.0) - 1.0).abs() < 1e-3);
        // symmetric curve
        assert!((kf.ease(0.5) - 0.5).abs() < 1e-2);
        assert!(kf.ease(0.2) < 0.2);
    }

    #[test]
    fn test_constant_holds_value() {
        let kf = Keyframe::new(0.0, KeyframeValue::Float(0.0))
            .with_interpolation(InterpolationMode::Constant);
        assert_eq!(kf.ease(0.9), 0.0);
    }

    #[test]
    fn test_mismatched_values_do_not_interpolate() {
        let a = KeyframeValue::Float(1.0);
        let b = KeyframeValue::Vec3([0.0; 3]);
        assert!(a.interpolate(&b, 0.5).is_none());
        let from = KeyframeValue::Vec3([0.0, 2.0, 4.0]);
        let to = KeyframeValue::Vec3([2.0, 2.0, 0.0]);
        assert_eq!(
            from.interpolate(&to, 0.5),
            Some(KeyframeValue::Vec3([1.0, 2.0, 2.0]))
        );
    }

    #[test]
    fn test_easing_from_ron() {
        let kf: Keyframe = ron::from_str(
            "(time: 1.5, value: Float(3.0), interpolation: Bezier, \
             easing: Some(((0.1, 0.0), (0.9, 1.0))))",
        )
        .unwrap();
        assert_eq!(kf.easing, Some([[0.1, 0.0], [0.9, 1.0]]));
        assert!(kf.ease(0.1) < 0.1);
    }
}
