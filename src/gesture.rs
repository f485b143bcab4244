/// Gesture-to-intent classification over one hand's landmarks.
///
/// Two distance-ratio tests on the index finger decide the intent:
/// a curled finger (tip close to the DIP joint) is a trigger pull,
/// an extended finger (tip far from the PIP joint) points at a target.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{invalid, ConfigError, FrameGeometry};
use crate::entities::Intent;

// ── Landmarks ────────────────────────────────────────────────────────────────

/// One detector point in normalized image coordinates, (0,0) top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The detector's fixed 21-point hand indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// A full landmark set for one detected hand.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [LandmarkPoint; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// `None` unless exactly 21 points are supplied.
    pub fn from_slice(points: &[LandmarkPoint]) -> Option<Self> {
        let points: [LandmarkPoint; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn get(&self, landmark: HandLandmark) -> LandmarkPoint {
        self.points[landmark.index()]
    }

    pub fn set(&mut self, landmark: HandLandmark, point: LandmarkPoint) {
        self.points[landmark.index()] = point;
    }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }

    fn index_finger(&self) -> IndexFinger {
        IndexFinger {
            tip: self.get(HandLandmark::IndexTip),
            dip: self.get(HandLandmark::IndexDip),
            pip: self.get(HandLandmark::IndexPip),
            mcp: self.get(HandLandmark::IndexMcp),
        }
    }
}

/// The four joints the classifier reads.
struct IndexFinger {
    tip: LandmarkPoint,
    dip: LandmarkPoint,
    pip: LandmarkPoint,
    mcp: LandmarkPoint,
}

impl IndexFinger {
    fn is_finite(&self) -> bool {
        [self.tip, self.dip, self.pip, self.mcp]
            .iter()
            .all(LandmarkPoint::is_finite)
    }

    /// Never true when the DIP-PIP reference segment has collapsed.
    fn is_trigger(&self, ratio: f32) -> bool {
        let reference = self.dip.distance(&self.pip);
        reference > f32::EPSILON && self.tip.distance(&self.dip) < reference * ratio
    }

    /// Never true when the PIP-MCP reference segment has collapsed.
    fn is_straight(&self, ratio: f32) -> bool {
        let reference = self.pip.distance(&self.mcp);
        reference > f32::EPSILON && self.tip.distance(&self.pip) > reference * ratio
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Trigger when `d(tip, dip) < trigger_ratio * d(dip, pip)`.
    pub trigger_ratio: f32,
    /// Straight when `d(tip, pip) > straight_ratio * d(pip, mcp)`.
    pub straight_ratio: f32,
    /// Minimum seconds between two `Shoot` intents.
    pub shoot_cooldown: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            trigger_ratio: 0.5,
            straight_ratio: 0.8,
            shoot_cooldown: 0.5,
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.trigger_ratio.is_finite() && self.trigger_ratio > 0.0) {
            return Err(invalid("trigger_ratio must be positive"));
        }
        if !(self.straight_ratio.is_finite() && self.straight_ratio > 0.0) {
            return Err(invalid("straight_ratio must be positive"));
        }
        if !(self.shoot_cooldown.is_finite() && self.shoot_cooldown >= 0.0) {
            return Err(invalid("shoot_cooldown must be non-negative"));
        }
        Ok(())
    }
}

// ── Classifier ───────────────────────────────────────────────────────────────

/// Owns the shoot cooldown, the only state carried between frames.
#[derive(Clone, Debug)]
pub struct GestureClassifier {
    config: GestureConfig,
    frame: FrameGeometry,
    last_shoot: Option<f64>,
}

impl GestureClassifier {
    pub fn new(config: GestureConfig, frame: FrameGeometry) -> Self {
        Self {
            config,
            frame,
            last_shoot: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    /// Timestamp of the most recent `Shoot`, if any.
    pub fn last_shoot(&self) -> Option<f64> {
        self.last_shoot
    }

    /// Classify the first detected hand; an empty slice means no hand.
    pub fn classify(&mut self, hands: &[HandLandmarks], now: f64) -> Intent {
        match hands.first() {
            Some(hand) => self.classify_hand(hand, now),
            None => Intent::None,
        }
    }

    /// A trigger pose always wins over a straight pose.  While the cooldown
    /// is running a trigger pose yields `None` rather than a move.
    pub fn classify_hand(&mut self, hand: &HandLandmarks, now: f64) -> Intent {
        let finger = hand.index_finger();
        if !finger.is_finite() {
            trace!("non-finite index-finger landmarks");
            return Intent::None;
        }

        if finger.is_trigger(self.config.trigger_ratio) {
            if self.cooldown_elapsed(now) {
                self.last_shoot = Some(now);
                debug!(now, "trigger pose: shoot");
                return Intent::Shoot;
            }
            trace!(now, "trigger pose inside cooldown");
            return Intent::None;
        }

        if finger.is_straight(self.config.straight_ratio) {
            let intent = Intent::Move {
                x: finger.tip.x * self.frame.width,
                y: finger.tip.y * self.frame.height,
            };
            trace!(?intent, "straight pose");
            return intent;
        }

        Intent::None
    }

    fn cooldown_elapsed(&self, now: f64) -> bool {
        match self.last_shoot {
            Some(last) => now - last >= self.config.shoot_cooldown,
            None => true,
        }
    }
}
