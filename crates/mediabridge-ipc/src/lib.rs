//! Typed app<->media-loop messages for the bridge.
//!
//! This crate defines the message, configuration, and status types that
//! cross between the application-facing endpoint and the media-loop
//! endpoint owning the worker.

mod commands;
mod config;
mod events;
mod status;
mod types;

pub use commands::BridgeCommand;
pub use config::{CodecConfig, DeviceConfig, TransmitRequest};
pub use events::{BridgeEvent, FrameKind};
pub use status::{SessionStatus, WorkerSnapshot};
pub use types::{AudioParams, PayloadInfo, RtpPacket, VideoFrame, VideoParams};

/// Maximum queued frames of a single kind. At the cap, the oldest frame of
/// that kind is evicted before a new one is appended.
pub const FRAME_QUEUE_MAX: usize = 10;
