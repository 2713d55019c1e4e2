//! Application-side endpoint.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{info, trace, warn};

use mediabridge_ipc::{
    BridgeCommand, BridgeEvent, CodecConfig, DeviceConfig, FrameKind, RtpPacket, SessionStatus,
    TransmitRequest, VideoFrame, FRAME_QUEUE_MAX,
};

use crate::error::BridgeError;
use crate::event_loop::{MediaLoopHandle, TaskHandle};
use crate::mailbox::Mailbox;
use crate::remote::RemoteEndpoint;
use crate::worker::MediaWorker;

/// Application-facing event surface.
///
/// Every method is invoked on the thread that calls
/// [`LocalEndpoint::process_messages`]. A handler may call
/// [`LocalEndpoint::close`]; the in-progress drain then stops emitting and
/// frees the rest of its snapshot.
pub trait BridgeObserver: Send + Sync {
    /// A local preview frame is ready to paint.
    fn preview_frame(&self, frame: VideoFrame) {
        let _ = frame;
    }

    /// A decoded remote frame is ready to paint.
    fn output_frame(&self, frame: VideoFrame) {
        let _ = frame;
    }

    /// Input audio intensity changed.
    fn audio_intensity_changed(&self, value: i32) {
        let _ = value;
    }

    /// A worker status snapshot arrived.
    fn status_ready(&self, status: SessionStatus) {
        let _ = status;
    }
}

type RtpOutFn = Arc<dyn Fn(RtpPacket) + Send + Sync>;
type RecordDataFn = Arc<dyn Fn(Bytes) + Send + Sync>;
type WakeFn = Box<dyn Fn() + Send + Sync>;

/// Raw callbacks invoked directly from the media thread, bypassing the
/// event mailbox. The application opts into that concurrency contract by
/// registering them.
#[derive(Default)]
struct RawCallbacks {
    rtp_audio_out: Option<RtpOutFn>,
    rtp_video_out: Option<RtpOutFn>,
    record_data: Option<RecordDataFn>,
}

/// State shared with the media-loop peer.
///
/// The peer holds this behind a `Weak`: events posted after the local
/// endpoint is gone fall through.
pub(crate) struct LocalShared {
    inbox: Mailbox<BridgeEvent>,
    waker: Mutex<Option<WakeFn>>,
    observer: Mutex<Option<Arc<dyn BridgeObserver>>>,
    callbacks: RwLock<RawCallbacks>,
    closed: AtomicBool,
}

impl LocalShared {
    fn new() -> Self {
        Self {
            inbox: Mailbox::new(),
            waker: Mutex::new(None),
            observer: Mutex::new(None),
            callbacks: RwLock::new(RawCallbacks::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Posts an event from the media thread.
    ///
    /// Frame overflow is coalesced here: at the cap, the oldest queued
    /// frame of the same kind is evicted before the append.
    pub(crate) fn post_event(&self, event: BridgeEvent) {
        let kind = event.frame_kind();
        self.inbox.post(
            event,
            |queue| {
                if let Some(kind) = kind {
                    evict_frame_overflow(queue, kind);
                }
            },
            || {
                if let Some(waker) = &*self.waker.lock() {
                    waker();
                }
                Some(TaskHandle::detached())
            },
        );
    }

    pub(crate) fn forward_rtp_audio_out(&self, packet: RtpPacket) {
        let callback = self.callbacks.read().rtp_audio_out.clone();
        if let Some(callback) = callback {
            callback(packet);
        }
    }

    pub(crate) fn forward_rtp_video_out(&self, packet: RtpPacket) {
        let callback = self.callbacks.read().rtp_video_out.clone();
        if let Some(callback) = callback {
            callback(packet);
        }
    }

    pub(crate) fn forward_record_data(&self, data: Bytes) {
        let callback = self.callbacks.read().record_data.clone();
        if let Some(callback) = callback {
            callback(data);
        }
    }

    fn process_messages(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }

        let mut list = self.inbox.take_all();
        let observer = self.observer.lock().clone();
        let Some(observer) = observer else {
            // Nobody listening; the snapshot is freed unseen.
            return;
        };

        // Only the latest preview frame matters; older ones would just be
        // painted over within the same drain.
        if let Some(frame) = take_latest_frame(&mut list, FrameKind::Preview) {
            observer.preview_frame(frame);
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
        }

        if let Some(frame) = take_latest_frame(&mut list, FrameKind::Output) {
            observer.output_frame(frame);
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
        }

        if let Some(value) = take_latest_intensity(&mut list) {
            observer.audio_intensity_changed(value);
            if self.closed.load(Ordering::SeqCst) {
                return;
            }
        }

        while let Some(event) = list.pop_front() {
            if let BridgeEvent::Status(status) = event {
                observer.status_ready(status);
                if self.closed.load(Ordering::SeqCst) {
                    return;
                }
            }
        }
    }
}

/// Application-side handle to the bridge.
///
/// Construction synchronously creates the media-loop peer; [`close`]
/// (or drop) synchronously tears it down. Command methods never block.
///
/// [`close`]: LocalEndpoint::close
pub struct LocalEndpoint {
    shared: Arc<LocalShared>,
    remote: RwLock<Option<Arc<RemoteEndpoint>>>,
    media_loop: MediaLoopHandle,
}

impl LocalEndpoint {
    /// Creates the bridge.
    ///
    /// Schedules construction of the media-loop peer (and the worker,
    /// through `worker_factory`) on the media loop, then blocks until the
    /// peer exists. Fails if the media loop is not running; there is no
    /// timeout on the wait itself.
    pub fn new<F>(media_loop: MediaLoopHandle, worker_factory: F) -> Result<Self, BridgeError>
    where
        F: FnOnce() -> Arc<dyn MediaWorker> + Send + 'static,
    {
        let shared = Arc::new(LocalShared::new());
        let rendezvous = Arc::new((Mutex::new(None), Condvar::new()));

        let task = {
            let rendezvous = rendezvous.clone();
            let local = Arc::downgrade(&shared);
            let media_loop = media_loop.clone();
            Box::new(move || {
                let worker = worker_factory();
                let remote = RemoteEndpoint::create(worker, media_loop, local);
                *rendezvous.0.lock() = Some(remote);
                rendezvous.1.notify_one();
            })
        };

        media_loop
            .schedule(task)
            .map_err(|_| BridgeError::MediaLoopUnavailable)?;

        let mut slot = rendezvous.0.lock();
        while slot.is_none() {
            rendezvous.1.wait(&mut slot);
        }
        let remote = slot.take();
        drop(slot);

        info!("bridge endpoint created");
        Ok(Self {
            shared,
            remote: RwLock::new(remote),
            media_loop,
        })
    }

    /// Registers the event observer.
    pub fn set_observer(&self, observer: Arc<dyn BridgeObserver>) {
        *self.shared.observer.lock() = Some(observer);
    }

    /// Registers the wake hook, invoked at most once per pending drain when
    /// inbound events arrive.
    ///
    /// The hook runs on the media thread and must not call back into the
    /// endpoint synchronously; post a wake to the application loop and call
    /// [`process_messages`](Self::process_messages) from there.
    pub fn set_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self.shared.waker.lock() = Some(Box::new(waker));
    }

    /// Registers the raw outbound RTP audio callback, invoked directly on
    /// the media thread.
    pub fn set_rtp_audio_out(&self, callback: impl Fn(RtpPacket) + Send + Sync + 'static) {
        self.shared.callbacks.write().rtp_audio_out = Some(Arc::new(callback));
    }

    /// Registers the raw outbound RTP video callback, invoked directly on
    /// the media thread.
    pub fn set_rtp_video_out(&self, callback: impl Fn(RtpPacket) + Send + Sync + 'static) {
        self.shared.callbacks.write().rtp_video_out = Some(Arc::new(callback));
    }

    /// Registers the raw recording-data callback, invoked directly on the
    /// media thread.
    pub fn set_record_data(&self, callback: impl Fn(Bytes) + Send + Sync + 'static) {
        self.shared.callbacks.write().record_data = Some(Arc::new(callback));
    }

    /// Applies configuration and starts the worker.
    pub fn start(&self, devices: DeviceConfig, codecs: CodecConfig) {
        self.post_command(BridgeCommand::Start { devices, codecs });
    }

    /// Stops the worker.
    ///
    /// Stop is terminal for the command stream: commands posted after this
    /// stay queued and are dropped at teardown.
    pub fn stop(&self) {
        self.post_command(BridgeCommand::Stop);
    }

    /// Applies a new device configuration to a running worker. Produces no
    /// status event.
    pub fn update_devices(&self, devices: DeviceConfig) {
        self.post_command(BridgeCommand::UpdateDevices { devices });
    }

    /// Applies codec overrides to a running worker. Produces one status
    /// event.
    pub fn update_codecs(&self, codecs: CodecConfig) {
        self.post_command(BridgeCommand::UpdateCodecs { codecs });
    }

    /// Changes which payloads are transmitted.
    pub fn set_transmit(&self, transmit: TransmitRequest) {
        self.post_command(BridgeCommand::Transmit(transmit));
    }

    /// Enables or disables recording.
    pub fn set_record(&self, enabled: bool) {
        self.post_command(BridgeCommand::Record { enabled });
    }

    fn post_command(&self, cmd: BridgeCommand) {
        match &*self.remote.read() {
            Some(remote) => remote.post_command(cmd),
            None => warn!(command = cmd.name(), "command posted after close, dropping"),
        }
    }

    /// Feeds an inbound RTP audio packet straight to the worker.
    ///
    /// Bypasses the command mailbox: this is the real-time path, unordered
    /// with respect to commands.
    pub fn rtp_audio_in(&self, packet: RtpPacket) {
        if let Some(remote) = &*self.remote.read() {
            remote.rtp_audio_in(packet);
        }
    }

    /// Feeds an inbound RTP video packet straight to the worker.
    pub fn rtp_video_in(&self, packet: RtpPacket) {
        if let Some(remote) = &*self.remote.read() {
            remote.rtp_video_in(packet);
        }
    }

    /// Drains inbound events. Call on the application thread, typically in
    /// response to the wake hook.
    ///
    /// Coalesces the snapshot to the latest Preview frame, latest Output
    /// frame and latest intensity, emits those in that order, then emits
    /// the remaining status events in arrival order.
    pub fn process_messages(&self) {
        self.shared.process_messages();
    }

    /// Tears down the media-loop peer and drops undelivered events.
    ///
    /// Blocks until the peer has been destroyed on the media loop. Safe to
    /// call from inside an observer callback. Idempotent; also run by drop.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(remote) = self.remote.write().take() {
            let done = Arc::new((Mutex::new(false), Condvar::new()));
            let task = {
                let done = done.clone();
                Box::new(move || {
                    drop(remote);
                    *done.0.lock() = true;
                    done.1.notify_one();
                })
            };
            match self.media_loop.schedule(task) {
                Ok(_) => {
                    let mut finished = done.0.lock();
                    while !*finished {
                        done.1.wait(&mut finished);
                    }
                }
                Err(err) => warn!(%err, "media loop gone before teardown"),
            }
        }

        self.shared.inbox.clear();
        info!("bridge endpoint closed");
    }
}

impl Drop for LocalEndpoint {
    fn drop(&mut self) {
        self.close();
    }
}

/// At the queue cap for `kind`, drops the oldest queued frame of that kind.
fn evict_frame_overflow(queue: &mut VecDeque<BridgeEvent>, kind: FrameKind) {
    let mut count = 0;
    let mut first = None;
    for (index, event) in queue.iter().enumerate() {
        if event.frame_kind() == Some(kind) {
            if first.is_none() {
                first = Some(index);
            }
            count += 1;
        }
    }
    if count >= FRAME_QUEUE_MAX {
        if let Some(index) = first {
            trace!(?kind, "frame queue full, dropping oldest");
            queue.remove(index);
        }
    }
}

/// Removes every frame of `kind` from `list`, returning the most recent.
fn take_latest_frame(list: &mut VecDeque<BridgeEvent>, kind: FrameKind) -> Option<VideoFrame> {
    let mut latest = None;
    let mut index = 0;
    while index < list.len() {
        if list[index].frame_kind() == Some(kind) {
            if let Some(BridgeEvent::Frame { frame, .. }) = list.remove(index) {
                latest = Some(frame);
            }
        } else {
            index += 1;
        }
    }
    latest
}

/// Removes every intensity event from `list`, returning the most recent
/// value.
fn take_latest_intensity(list: &mut VecDeque<BridgeEvent>) -> Option<i32> {
    let mut latest = None;
    let mut index = 0;
    while index < list.len() {
        if matches!(list[index], BridgeEvent::AudioIntensity { .. }) {
            if let Some(BridgeEvent::AudioIntensity { value }) = list.remove(index) {
                latest = Some(value);
            }
        } else {
            index += 1;
        }
    }
    latest
}
