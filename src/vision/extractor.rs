//! Hand landmark extraction boundary.

use crate::types::features::{
    FeatureVector, COORDS_PER_LANDMARK, HAND_DIM, HAND_SLOTS, LANDMARKS_PER_HAND,
};
use anyhow::Result;
use image::RgbImage;

/// Landmarks for one detected hand, in detector order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    pub points: [[f32; COORDS_PER_LANDMARK]; LANDMARKS_PER_HAND],
}

impl HandLandmarks {
    fn flatten(&self) -> [f32; HAND_DIM] {
        let mut flat = [0.0; HAND_DIM];
        for (i, point) in self.points.iter().enumerate() {
            flat[i * COORDS_PER_LANDMARK..(i + 1) * COORDS_PER_LANDMARK].copy_from_slice(point);
        }
        flat
    }
}

/// Detector seam: a pixel grid in, zero or more hands out.
///
/// Slot assignment downstream is positional (detection order within the
/// frame); nothing tracks a hand's identity across frames, so the two slots
/// can swap when both hands are visible.
pub trait HandTracker: Send + Sync {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<HandLandmarks>>;
}

/// Tracker used when no landmark model is wired in. Reports no hands, which
/// downstream encodes as an all-zero feature vector.
pub struct StubTracker;

impl HandTracker for StubTracker {
    fn detect(&self, _frame: &RgbImage) -> Result<Vec<HandLandmarks>> {
        Ok(Vec::new())
    }
}

/// Assemble the per-frame feature vector: slot 0 is the first detected
/// hand, slot 1 the second, absent slots stay zero, further hands are
/// dropped.
pub fn features_from_hands(hands: &[HandLandmarks]) -> FeatureVector {
    let mut features = FeatureVector::zeroed();
    for (slot, hand) in hands.iter().take(HAND_SLOTS).enumerate() {
        features.0[slot * HAND_DIM..(slot + 1) * HAND_DIM].copy_from_slice(&hand.flatten());
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::features::FEATURE_DIM;

    fn hand_filled_with(value: f32) -> HandLandmarks {
        HandLandmarks {
            points: [[value; COORDS_PER_LANDMARK]; LANDMARKS_PER_HAND],
        }
    }

    #[test]
    fn no_hands_is_all_zero() {
        let features = features_from_hands(&[]);
        assert_eq!(features.as_slice().len(), FEATURE_DIM);
        assert!(features.is_blank());
    }

    #[test]
    fn one_hand_fills_first_slot_only() {
        let features = features_from_hands(&[hand_filled_with(0.5)]);
        assert!(features.as_slice()[..HAND_DIM].iter().all(|v| *v == 0.5));
        assert!(features.as_slice()[HAND_DIM..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn slots_are_positional() {
        let features = features_from_hands(&[hand_filled_with(0.1), hand_filled_with(0.2)]);
        assert!(features.as_slice()[..HAND_DIM].iter().all(|v| *v == 0.1));
        assert!(features.as_slice()[HAND_DIM..].iter().all(|v| *v == 0.2));
    }

    #[test]
    fn extra_hands_are_dropped() {
        let hands = [
            hand_filled_with(0.1),
            hand_filled_with(0.2),
            hand_filled_with(0.9),
        ];
        let features = features_from_hands(&hands);
        assert!(features.as_slice().iter().all(|v| *v != 0.9));
    }

    #[test]
    fn flatten_interleaves_coordinates() {
        let mut hand = hand_filled_with(0.0);
        hand.points[0] = [1.0, 2.0, 3.0];
        hand.points[1] = [4.0, 5.0, 6.0];
        let features = features_from_hands(&[hand]);
        assert_eq!(&features.as_slice()[..6], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn stub_tracker_sees_nothing() {
        let frame = RgbImage::new(4, 4);
        let hands = StubTracker.detect(&frame).unwrap();
        assert!(hands.is_empty());
    }
}
