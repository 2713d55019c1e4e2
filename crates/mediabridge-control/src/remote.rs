//! Media-loop endpoint: owns the worker and serializes commands.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use mediabridge_ipc::{
    BridgeCommand, BridgeEvent, CodecConfig, DeviceConfig, FrameKind, RtpPacket, SessionStatus,
    VideoFrame,
};

use crate::event_loop::{MediaLoopHandle, TaskHandle};
use crate::local::LocalShared;
use crate::mailbox::Mailbox;
use crate::worker::{MediaWorker, WorkerEvents};

/// Whether the command loop keeps draining after a command.
enum Flow {
    /// Process the next queued command.
    Continue,
    /// Wait for the worker to signal completion.
    Suspend,
}

/// The media-loop peer of [`LocalEndpoint`](crate::LocalEndpoint).
///
/// Lives on the media loop, owns the worker, and holds a non-owning
/// back-reference to the local peer for posting events. Created after the
/// local peer and destroyed before it.
pub(crate) struct RemoteEndpoint {
    worker: Arc<dyn MediaWorker>,
    local: Weak<LocalShared>,
    media_loop: MediaLoopHandle,
    inbox: Mailbox<BridgeCommand>,
    /// The next terminal worker event should produce a status report.
    pending_status: AtomicBool,
    weak_self: Weak<RemoteEndpoint>,
}

impl RemoteEndpoint {
    /// Builds the endpoint and wires the worker's callbacks to it.
    ///
    /// Runs on the media loop.
    pub fn create(
        worker: Arc<dyn MediaWorker>,
        media_loop: MediaLoopHandle,
        local: Weak<LocalShared>,
    ) -> Arc<Self> {
        let remote = Arc::new_cyclic(|weak| Self {
            worker,
            local,
            media_loop,
            inbox: Mailbox::new(),
            pending_status: AtomicBool::new(false),
            weak_self: weak.clone(),
        });
        remote
            .worker
            .set_event_sink(Box::new(RemoteSink(Arc::downgrade(&remote))));
        remote
    }

    /// Enqueues a command. Called from the application thread.
    pub fn post_command(&self, cmd: BridgeCommand) {
        self.inbox.post(cmd, |_| {}, || self.schedule_drain());
    }

    /// Feeds an inbound RTP audio packet straight to the worker. Called
    /// from the application thread; the worker's ingress is thread-safe.
    pub fn rtp_audio_in(&self, packet: RtpPacket) {
        self.worker.rtp_audio_in(packet);
    }

    /// Feeds an inbound RTP video packet straight to the worker.
    pub fn rtp_video_in(&self, packet: RtpPacket) {
        self.worker.rtp_video_in(packet);
    }

    fn schedule_drain(&self) -> Option<TaskHandle> {
        let weak = self.weak_self.clone();
        let scheduled = self.media_loop.schedule(Box::new(move || {
            if let Some(remote) = weak.upgrade() {
                remote.drain();
            }
        }));
        match scheduled {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(%err, "failed to schedule command drain");
                None
            }
        }
    }

    /// Drains queued commands on the media loop, one at a time, until the
    /// queue empties or a command suspends the loop.
    fn drain(&self) {
        self.inbox.begin_drain();
        while let Some(cmd) = self.inbox.pop() {
            match self.process_command(cmd) {
                Flow::Continue => {}
                Flow::Suspend => {
                    self.inbox.suspend();
                    break;
                }
            }
        }
    }

    fn process_command(&self, cmd: BridgeCommand) -> Flow {
        debug!(command = cmd.name(), "processing command");

        match cmd {
            BridgeCommand::Start { devices, codecs } => {
                apply_devices(&*self.worker, &devices);
                apply_codecs(&*self.worker, &codecs);
                self.pending_status.store(true, Ordering::SeqCst);
                self.worker.start();
                Flow::Suspend
            }
            BridgeCommand::Stop => {
                self.pending_status.store(true, Ordering::SeqCst);
                self.worker.stop();
                Flow::Suspend
            }
            BridgeCommand::UpdateDevices { devices } => {
                apply_devices(&*self.worker, &devices);
                self.worker.update();
                Flow::Suspend
            }
            BridgeCommand::UpdateCodecs { codecs } => {
                apply_codecs(&*self.worker, &codecs);
                self.pending_status.store(true, Ordering::SeqCst);
                self.worker.update();
                Flow::Suspend
            }
            BridgeCommand::Transmit(transmit) => {
                match transmit.audio {
                    Some(index) => self.worker.transmit_audio(index),
                    None => self.worker.pause_audio(),
                }
                match transmit.video {
                    Some(index) => self.worker.transmit_video(index),
                    None => self.worker.pause_video(),
                }
                Flow::Continue
            }
            BridgeCommand::Record { enabled } => {
                if enabled {
                    self.worker.record_start();
                } else {
                    self.worker.record_stop();
                }
                Flow::Continue
            }
        }
    }

    /// Resumes the command loop after a worker completion event.
    fn resume(&self) {
        self.inbox.resume(|| self.schedule_drain());
    }

    fn post_event(&self, event: BridgeEvent) {
        if let Some(local) = self.local.upgrade() {
            local.post_event(event);
        }
    }

    fn post_status(&self, build: impl FnOnce(&mut SessionStatus)) {
        let mut status = SessionStatus::from_snapshot(self.worker.snapshot());
        build(&mut status);
        self.post_event(BridgeEvent::Status(status));
    }

    // Worker event handlers. All run on the media loop.

    fn worker_started(&self) {
        self.pending_status.store(false, Ordering::SeqCst);
        self.post_status(|_| {});
        self.resume();
    }

    fn worker_updated(&self) {
        // Device-only updates set no pending status and stay silent.
        if self.pending_status.swap(false, Ordering::SeqCst) {
            self.post_status(|_| {});
        }
        self.resume();
    }

    fn worker_stopped(&self) {
        // Terminal for the command stream: no resume until teardown.
        self.pending_status.store(false, Ordering::SeqCst);
        self.post_status(|status| status.stopped = true);
    }

    fn worker_finished(&self) {
        self.post_status(|status| status.finished = true);
    }

    fn worker_error(&self) {
        let code = self.worker.error_code();
        self.post_status(|status| {
            status.error = true;
            status.error_code = Some(code);
        });
        // Resume so the application can still issue a stop.
        self.resume();
    }

    fn worker_audio_intensity(&self, value: i32) {
        self.post_event(BridgeEvent::AudioIntensity { value });
    }

    fn worker_frame(&self, kind: FrameKind, frame: VideoFrame) {
        self.post_event(BridgeEvent::Frame { kind, frame });
    }
}

/// Adapter the worker calls back into.
///
/// Holds the endpoint weakly so callbacks arriving after teardown fall
/// through.
struct RemoteSink(Weak<RemoteEndpoint>);

impl RemoteSink {
    fn with(&self, f: impl FnOnce(&RemoteEndpoint)) {
        if let Some(remote) = self.0.upgrade() {
            f(&remote);
        }
    }
}

impl WorkerEvents for RemoteSink {
    fn started(&self) {
        self.with(|remote| remote.worker_started());
    }

    fn updated(&self) {
        self.with(|remote| remote.worker_updated());
    }

    fn stopped(&self) {
        self.with(|remote| remote.worker_stopped());
    }

    fn finished(&self) {
        self.with(|remote| remote.worker_finished());
    }

    fn error(&self) {
        self.with(|remote| remote.worker_error());
    }

    fn audio_intensity(&self, value: i32) {
        self.with(|remote| remote.worker_audio_intensity(value));
    }

    fn preview_frame(&self, frame: VideoFrame) {
        self.with(|remote| remote.worker_frame(FrameKind::Preview, frame));
    }

    fn output_frame(&self, frame: VideoFrame) {
        self.with(|remote| remote.worker_frame(FrameKind::Output, frame));
    }

    fn rtp_audio_out(&self, packet: RtpPacket) {
        self.with(|remote| {
            if let Some(local) = remote.local.upgrade() {
                local.forward_rtp_audio_out(packet);
            }
        });
    }

    fn rtp_video_out(&self, packet: RtpPacket) {
        self.with(|remote| {
            if let Some(local) = remote.local.upgrade() {
                local.forward_rtp_video_out(packet);
            }
        });
    }

    fn record_data(&self, data: bytes::Bytes) {
        self.with(|remote| {
            if let Some(local) = remote.local.upgrade() {
                local.forward_record_data(data);
            }
        });
    }
}

fn apply_devices(worker: &dyn MediaWorker, devices: &DeviceConfig) {
    worker.set_audio_out(devices.audio_out_id.clone());
    worker.set_audio_in(devices.audio_in_id.clone());
    worker.set_video_in(devices.video_in_id.clone());
    worker.set_file_in(devices.file_name_in.clone());
    worker.set_data_in(devices.file_data_in.clone());
    worker.set_loop_file(devices.loop_file);
    worker.set_output_volume(devices.audio_out_volume);
    worker.set_input_volume(devices.audio_in_volume);
}

fn apply_codecs(worker: &dyn MediaWorker, codecs: &CodecConfig) {
    if let Some(params) = &codecs.local_audio_params {
        worker.set_local_audio_params(params.clone());
    }
    if let Some(params) = &codecs.local_video_params {
        worker.set_local_video_params(params.clone());
    }
    if let Some(info) = &codecs.local_audio_payload_info {
        worker.set_local_audio_payload_info(info.clone());
    }
    if let Some(info) = &codecs.local_video_payload_info {
        worker.set_local_video_payload_info(info.clone());
    }
    if let Some(info) = &codecs.remote_audio_payload_info {
        worker.set_remote_audio_payload_info(info.clone());
    }
    if let Some(info) = &codecs.remote_video_payload_info {
        worker.set_remote_video_payload_info(info.clone());
    }
}
