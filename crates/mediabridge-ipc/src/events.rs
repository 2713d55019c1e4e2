//! Events sent from the media loop to the application.

use serde::{Deserialize, Serialize};

use crate::status::SessionStatus;
use crate::types::VideoFrame;

/// Which surface a frame is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    /// Local capture preview.
    Preview,

    /// Decoded remote output.
    Output,
}

/// Events that the media loop can post to the application endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// Worker status snapshot, produced after lifecycle transitions.
    Status(SessionStatus),

    /// A video frame for the application to paint.
    Frame { kind: FrameKind, frame: VideoFrame },

    /// Input audio intensity changed.
    AudioIntensity { value: i32 },
}

impl BridgeEvent {
    /// Returns the frame kind if this is a frame event.
    pub fn frame_kind(&self) -> Option<FrameKind> {
        match self {
            Self::Frame { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
