/// Landmark sources: where per-frame hand skeletons come from.
///
/// A real deployment plugs a camera + hand-landmark detector in behind
/// [`LandmarkSource`].  Two sources ship with the crate:
///
/// * [`VirtualHand`]: a synthetic hand steered from the keyboard, producing
///   detector-shaped landmarks for a pointing or curled index finger.
/// * [`ReplaySource`]: a JSON-lines recording, one frame per line:
///   `null` for "no hand", otherwise 21 `[x, y]` pairs.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use thiserror::Error;

use crate::gesture::{HandLandmark, HandLandmarks, LandmarkPoint, LANDMARK_COUNT};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("read landmarks: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: expected 21 landmarks, found {found}")]
    LandmarkCount { line: usize, found: usize },
    #[error("landmark {index} is not finite")]
    NonFinite { index: usize },
    #[error("encode landmarks: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the detector saw in one camera frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Detection {
    NoHand,
    Hand(HandLandmarks),
}

impl Detection {
    /// Detected hands, first hand first, as the classifier expects them.
    pub fn hands(&self) -> &[HandLandmarks] {
        match self {
            Detection::NoHand => &[],
            Detection::Hand(hand) => std::slice::from_ref(hand),
        }
    }
}

pub trait LandmarkSource {
    /// Blocks until the next frame is available.  `Ok(None)` means the
    /// source has run dry.
    fn poll(&mut self) -> Result<Option<Detection>, SourceError>;
}

// ── Virtual hand ──────────────────────────────────────────────────────────────

/// Fingertip speed while a direction is held, in normalized units per second.
pub const VIRTUAL_HAND_SPEED: f32 = 0.8;

#[derive(Clone, Debug, PartialEq)]
pub struct VirtualHand {
    /// Normalized index-fingertip position of the pointing pose.
    pub x: f32,
    pub y: f32,
    pub curled: bool,
    pub visible: bool,
}

impl Default for VirtualHand {
    fn default() -> Self {
        Self {
            x: 0.5,
            y: 0.6,
            curled: false,
            visible: true,
        }
    }
}

impl VirtualHand {
    /// Shift the fingertip, staying inside the camera image.
    pub fn nudge(&mut self, dx: f32, dy: f32) {
        self.x = (self.x + dx).clamp(0.0, 1.0);
        self.y = (self.y + dy).clamp(0.0, 1.0);
    }

    /// An upright hand with the index finger either extended towards
    /// `(x, y)` or folded back onto its DIP joint.
    pub fn landmarks(&self) -> HandLandmarks {
        let (x, y) = (self.x, self.y);
        let p = LandmarkPoint::new;
        let mut points = [p(x, y + 0.30); LANDMARK_COUNT];
        let mut put = |landmark: HandLandmark, point: LandmarkPoint| {
            points[landmark.index()] = point;
        };

        put(HandLandmark::ThumbCmc, p(x - 0.05, y + 0.27));
        put(HandLandmark::ThumbMcp, p(x - 0.08, y + 0.23));
        put(HandLandmark::ThumbIp, p(x - 0.10, y + 0.19));
        put(HandLandmark::ThumbTip, p(x - 0.11, y + 0.16));

        put(HandLandmark::IndexMcp, p(x, y + 0.15));
        put(HandLandmark::IndexPip, p(x, y + 0.10));
        put(HandLandmark::IndexDip, p(x, y + 0.05));
        if self.curled {
            put(HandLandmark::IndexTip, p(x + 0.01, y + 0.06));
        } else {
            put(HandLandmark::IndexTip, p(x, y));
        }

        // Remaining fingers folded into the palm: MCP, PIP, DIP, TIP.
        let folded = [
            (HandLandmark::MiddleMcp, 0.02),
            (HandLandmark::RingMcp, 0.04),
            (HandLandmark::PinkyMcp, 0.06),
        ];
        for (mcp, offset) in folded {
            let base = mcp.index();
            let fx = x + offset;
            points[base..base + 4].copy_from_slice(&[
                p(fx, y + 0.16),
                p(fx, y + 0.12),
                p(fx + 0.01, y + 0.14),
                p(fx + 0.01, y + 0.17),
            ]);
        }
        HandLandmarks::new(points)
    }

    pub fn detection(&self) -> Detection {
        if self.visible {
            Detection::Hand(self.landmarks())
        } else {
            Detection::NoHand
        }
    }
}

impl LandmarkSource for VirtualHand {
    fn poll(&mut self) -> Result<Option<Detection>, SourceError> {
        Ok(Some(self.detection()))
    }
}

// ── Replay ────────────────────────────────────────────────────────────────────

pub struct ReplaySource<R> {
    lines: Lines<R>,
    line: usize,
}

impl ReplaySource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Ok(Self::from_reader(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead> LandmarkSource for ReplaySource<R> {
    fn poll(&mut self) -> Result<Option<Detection>, SourceError> {
        loop {
            let Some(text) = self.lines.next().transpose()? else {
                return Ok(None);
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            return parse_frame(&text, self.line).map(Some);
        }
    }
}

fn parse_frame(text: &str, line: usize) -> Result<Detection, SourceError> {
    let pairs: Option<Vec<[f32; 2]>> =
        serde_json::from_str(text).map_err(|source| SourceError::Parse { line, source })?;
    let Some(pairs) = pairs else {
        return Ok(Detection::NoHand);
    };
    let points: Vec<LandmarkPoint> = pairs.iter().map(|[x, y]| LandmarkPoint::new(*x, *y)).collect();
    HandLandmarks::from_slice(&points)
        .map(Detection::Hand)
        .ok_or(SourceError::LandmarkCount {
            line,
            found: points.len(),
        })
}

/// One replay line for `detection`, the inverse of what [`ReplaySource`]
/// reads.  JSON has no NaN or infinity, so non-finite points are refused.
pub fn encode_frame(detection: &Detection) -> Result<String, SourceError> {
    let Detection::Hand(hand) = detection else {
        return Ok("null".to_string());
    };
    if let Some(index) = hand
        .points()
        .iter()
        .position(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(SourceError::NonFinite { index });
    }
    let pairs: Vec<[f32; 2]> = hand.points().iter().map(|p| [p.x, p.y]).collect();
    Ok(serde_json::to_string(&pairs)?)
}
