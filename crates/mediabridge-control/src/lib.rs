//! Control bridge between an application thread and a media-pipeline worker.
//!
//! The worker (an RTP capture/encode/decode/render engine) runs exclusively
//! on a single media-thread event loop, while applications want a handle
//! they can drive from an arbitrary thread. The bridge provides that handle:
//! a [`LocalEndpoint`] on the application side, paired with a media-loop
//! peer that owns the worker. The two exchange ownership-transferred
//! messages through mutex-guarded mailboxes with frame coalescing, and the
//! media-loop side serializes commands through a suspend/resume loop around
//! asynchronous worker operations.

mod error;
mod event_loop;
mod local;
mod mailbox;
mod remote;
mod worker;

pub use error::BridgeError;
pub use event_loop::{EventLoop, MediaLoopHandle, MediaThread, ScheduleError, Task, TaskHandle};
pub use local::{BridgeObserver, LocalEndpoint};
pub use worker::{MediaWorker, WorkerEvents};
