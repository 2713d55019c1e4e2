//! The media worker interface consumed by the bridge.

use bytes::Bytes;

use mediabridge_ipc::{AudioParams, PayloadInfo, RtpPacket, VideoFrame, VideoParams, WorkerSnapshot};

/// Callback surface the worker drives.
///
/// The worker invokes every method on the media loop thread.
pub trait WorkerEvents: Send + Sync {
    /// The worker finished starting.
    fn started(&self);

    /// The worker finished applying an update.
    fn updated(&self);

    /// The worker stopped in response to a stop request.
    fn stopped(&self);

    /// A file source finished playing.
    fn finished(&self);

    /// The worker failed; [`MediaWorker::error_code`] holds the cause.
    fn error(&self);

    /// Input audio intensity changed.
    fn audio_intensity(&self, value: i32);

    /// A local preview frame is ready.
    fn preview_frame(&self, frame: VideoFrame);

    /// A decoded remote frame is ready.
    fn output_frame(&self, frame: VideoFrame);

    /// An encoded RTP audio packet is ready to send.
    fn rtp_audio_out(&self, packet: RtpPacket);

    /// An encoded RTP video packet is ready to send.
    fn rtp_video_out(&self, packet: RtpPacket);

    /// A chunk of recorded data is ready.
    fn record_data(&self, data: Bytes);
}

/// The media pipeline engine the bridge controls.
///
/// All methods take `&self`: the worker runs its own internal machinery and
/// is responsible for its own synchronization. `rtp_audio_in` and
/// `rtp_video_in` in particular are called from the application thread while
/// the media loop drives everything else, and must be safe to call
/// concurrently. Every other method is called on the media loop only.
///
/// `start`, `stop` and `update` are asynchronous: they return immediately
/// and signal completion through [`WorkerEvents`].
pub trait MediaWorker: Send + Sync {
    /// Registers the callback sink. Called once, on the media loop, before
    /// any other method.
    fn set_event_sink(&self, sink: Box<dyn WorkerEvents>);

    // Device configuration.
    fn set_audio_out(&self, id: String);
    fn set_audio_in(&self, id: String);
    fn set_video_in(&self, id: String);
    fn set_file_in(&self, name: String);
    fn set_data_in(&self, data: Bytes);
    fn set_loop_file(&self, enabled: bool);
    fn set_output_volume(&self, volume: i32);
    fn set_input_volume(&self, volume: i32);

    // Codec configuration.
    fn set_local_audio_params(&self, params: Vec<AudioParams>);
    fn set_local_video_params(&self, params: Vec<VideoParams>);
    fn set_local_audio_payload_info(&self, info: Vec<PayloadInfo>);
    fn set_local_video_payload_info(&self, info: Vec<PayloadInfo>);
    fn set_remote_audio_payload_info(&self, info: Vec<PayloadInfo>);
    fn set_remote_video_payload_info(&self, info: Vec<PayloadInfo>);

    // Lifecycle. Completion arrives through the event sink.
    fn start(&self);
    fn stop(&self);
    fn update(&self);

    // Transmission and recording. Synchronous, no completion event.
    fn transmit_audio(&self, index: u32);
    fn pause_audio(&self);
    fn transmit_video(&self, index: u32);
    fn pause_video(&self);
    fn record_start(&self);
    fn record_stop(&self);

    // RTP ingress; must be callable from any thread.
    fn rtp_audio_in(&self, packet: RtpPacket);
    fn rtp_video_in(&self, packet: RtpPacket);

    /// Captures the current worker state for a status report.
    fn snapshot(&self) -> WorkerSnapshot;

    /// Code of the most recent error, read after an `error` event.
    fn error_code(&self) -> i32;
}
