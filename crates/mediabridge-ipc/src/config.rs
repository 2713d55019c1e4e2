//! Configuration carried by Start and Update commands.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::{AudioParams, PayloadInfo, VideoParams};

/// Device selection and volume configuration.
///
/// Applied to the worker unconditionally, field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Audio output device identifier.
    pub audio_out_id: String,

    /// Audio input device identifier.
    pub audio_in_id: String,

    /// Video input device identifier.
    pub video_in_id: String,

    /// File to play instead of live capture (empty for none).
    pub file_name_in: String,

    /// In-memory file source (empty for none).
    pub file_data_in: Bytes,

    /// Loop the file source when it ends.
    pub loop_file: bool,

    /// Output volume, 0-100.
    pub audio_out_volume: i32,

    /// Input volume, 0-100.
    pub audio_in_volume: i32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            audio_out_id: String::new(),
            audio_in_id: String::new(),
            video_in_id: String::new(),
            file_name_in: String::new(),
            file_data_in: Bytes::new(),
            loop_file: false,
            audio_out_volume: 100,
            audio_in_volume: 100,
        }
    }
}

/// Codec overrides.
///
/// A `None` field leaves the worker's current value untouched; only `Some`
/// fields are copied to the worker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub local_audio_params: Option<Vec<AudioParams>>,
    pub local_video_params: Option<Vec<VideoParams>>,
    pub local_audio_payload_info: Option<Vec<PayloadInfo>>,
    pub local_video_payload_info: Option<Vec<PayloadInfo>>,
    pub remote_audio_payload_info: Option<Vec<PayloadInfo>>,
    pub remote_video_payload_info: Option<Vec<PayloadInfo>>,
}

/// Which payloads to transmit.
///
/// `Some(index)` transmits the payload at `index`; `None` pauses that
/// stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransmitRequest {
    pub audio: Option<u32>,
    pub video: Option<u32>,
}
