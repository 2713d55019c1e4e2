//! Media value types carried across the bridge.
//!
//! The bridge copies these between the application and the worker without
//! inspecting their contents.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Audio capture/encode parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioParams {
    /// Codec name (e.g. "opus").
    pub codec: String,
    pub sample_rate: u32,
    pub sample_size: u32,
    pub channels: u32,
}

/// Video capture/encode parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoParams {
    /// Codec name (e.g. "vp8").
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// RTP payload mapping description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadInfo {
    /// Payload type id.
    pub id: i32,

    /// Encoding name.
    pub name: String,

    pub clockrate: u32,
    pub channels: u32,
    pub ptime: u32,
    pub max_ptime: u32,
}

/// A decoded video frame ready to paint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,

    /// Pixel data; the layout is an application/worker contract.
    pub data: Bytes,
}

/// An RTP packet, opaque to the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpPacket {
    /// Raw packet bytes.
    pub data: Bytes,

    /// Offset from the session's base port (0 = RTP, 1 = RTCP).
    pub port_offset: i32,
}
