//! Commands sent from the application to the media loop.

use serde::{Deserialize, Serialize};

use crate::config::{CodecConfig, DeviceConfig, TransmitRequest};

/// Commands that the application endpoint can post to the media loop.
///
/// All commands are non-blocking for the caller. Start, Stop and the two
/// updates complete asynchronously; the worker's answer comes back as a
/// status event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeCommand {
    /// Apply device and codec configuration, then start the worker.
    Start {
        devices: DeviceConfig,
        codecs: CodecConfig,
    },

    /// Stop the worker.
    Stop,

    /// Apply a new device configuration to a running worker.
    UpdateDevices { devices: DeviceConfig },

    /// Apply new codec overrides to a running worker.
    UpdateCodecs { codecs: CodecConfig },

    /// Change which payloads are transmitted.
    Transmit(TransmitRequest),

    /// Enable or disable recording.
    Record { enabled: bool },
}

impl BridgeCommand {
    /// Returns a simple string representation of the command.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "Start",
            Self::Stop => "Stop",
            Self::UpdateDevices { .. } => "UpdateDevices",
            Self::UpdateCodecs { .. } => "UpdateCodecs",
            Self::Transmit(_) => "Transmit",
            Self::Record { .. } => "Record",
        }
    }
}
