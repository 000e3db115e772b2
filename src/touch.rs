//! Touch snapshots as delivered by the host's touch events.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One active touch point.
///
/// `target` is the id of the element the touch *started* on. The element
/// currently under the finger is re-located from the coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouchPoint {
    pub identifier: i64,
    pub client_x: f64,
    pub client_y: f64,
    #[serde(alias = "targetElementId", default)]
    pub target: String,
}

impl TouchPoint {
    pub fn new(identifier: i64, client_x: f64, client_y: f64, target: &str) -> Self {
        TouchPoint {
            identifier,
            client_x,
            client_y,
            target: target.to_string(),
        }
    }
}

/// Which touch event delivered the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPhase(pub String);

impl fmt::Display for UnknownPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown touch phase '{}'", self.0)
    }
}

impl std::error::Error for UnknownPhase {}

impl FromStr for TouchPhase {
    type Err = UnknownPhase;

    /// Accepts both the short names and the DOM event types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" | "touchstart" => Ok(TouchPhase::Start),
            "move" | "touchmove" => Ok(TouchPhase::Move),
            "end" | "touchend" => Ok(TouchPhase::End),
            "cancel" | "touchcancel" => Ok(TouchPhase::Cancel),
            other => Err(UnknownPhase(other.to_string())),
        }
    }
}

/// A touch event: its phase plus the complete set of touches still down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touches: Vec<TouchPoint>,
}
