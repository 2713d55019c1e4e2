//! Worker status snapshots.

use serde::{Deserialize, Serialize};

use crate::types::{AudioParams, PayloadInfo, VideoParams};

/// Immutable readback of worker state, captured after a lifecycle event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSnapshot {
    pub local_audio_params: Vec<AudioParams>,
    pub local_video_params: Vec<VideoParams>,
    pub local_audio_payload_info: Vec<PayloadInfo>,
    pub local_video_payload_info: Vec<PayloadInfo>,
    pub remote_audio_payload_info: Vec<PayloadInfo>,
    pub remote_video_payload_info: Vec<PayloadInfo>,

    /// Whether the worker can currently transmit audio.
    pub can_transmit_audio: bool,

    /// Whether the worker can currently transmit video.
    pub can_transmit_video: bool,
}

/// Status delivered to the application.
///
/// The flags are set by the bridge at the site that produced the status,
/// never by the worker itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Worker state at the moment the status was produced.
    pub snapshot: WorkerSnapshot,

    /// The worker stopped in response to a stop command.
    pub stopped: bool,

    /// A file source finished playing.
    pub finished: bool,

    /// The worker reported an error.
    pub error: bool,

    /// Worker error code, present when `error` is set.
    pub error_code: Option<i32>,
}

impl SessionStatus {
    /// Wraps a snapshot with no flags set.
    pub fn from_snapshot(snapshot: WorkerSnapshot) -> Self {
        Self {
            snapshot,
            ..Default::default()
        }
    }
}
