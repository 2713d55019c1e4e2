//! One-shot task scheduling on the media thread.
//!
//! The bridge never owns the host event loop; it only needs to schedule
//! one-shot tasks on it, in FIFO order, with the ability to cancel a task
//! that has not run yet. [`MediaThread`] provides that capability on a
//! dedicated thread for hosts that do not bring their own loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, trace};

/// A one-shot task to run on the media loop.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Error scheduling a task.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The media loop is no longer running.
    #[error("media loop is not running")]
    Stopped,
}

/// Capability to schedule one-shot tasks on the media loop.
///
/// Tasks run on the loop thread in the order they were scheduled.
pub trait EventLoop: Send + Sync {
    fn schedule(&self, task: Task) -> Result<TaskHandle, ScheduleError>;
}

/// Shared handle to an event loop.
pub type MediaLoopHandle = Arc<dyn EventLoop>;

/// Handle to a scheduled task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
}

impl TaskHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle not backed by a cancellable task.
    pub(crate) fn detached() -> Self {
        Self::new()
    }

    /// Prevents the task from running if it has not started yet.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

enum LoopMessage {
    Run { task: Task, handle: TaskHandle },
    Stop,
}

/// A dedicated thread draining scheduled tasks in FIFO order.
pub struct MediaThread {
    shared: Arc<MediaThreadShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

struct MediaThreadShared {
    tx: Sender<LoopMessage>,
    running: AtomicBool,
}

impl EventLoop for MediaThreadShared {
    fn schedule(&self, task: Task) -> Result<TaskHandle, ScheduleError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(ScheduleError::Stopped);
        }
        let handle = TaskHandle::new();
        self.tx
            .send(LoopMessage::Run {
                task,
                handle: handle.clone(),
            })
            .map_err(|_| ScheduleError::Stopped)?;
        Ok(handle)
    }
}

impl MediaThread {
    /// Spawns the media thread.
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let shared = Arc::new(MediaThreadShared {
            tx,
            running: AtomicBool::new(true),
        });
        let thread = thread::spawn(move || run_loop(rx));
        Self {
            shared,
            thread: Mutex::new(Some(thread)),
        }
    }

    /// Returns a shareable scheduling handle.
    pub fn handle(&self) -> MediaLoopHandle {
        self.shared.clone()
    }

    /// Stops the loop and joins the thread.
    ///
    /// Tasks scheduled but not yet run are dropped. Scheduling afterwards
    /// fails with [`ScheduleError::Stopped`]. Idempotent.
    pub fn shutdown(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shared.tx.send(LoopMessage::Stop);
        if let Some(handle) = self.thread.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Default for MediaThread {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MediaThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop(rx: Receiver<LoopMessage>) {
    debug!("media loop starting");
    loop {
        match rx.recv() {
            Ok(LoopMessage::Run { task, handle }) => {
                if handle.is_cancelled() {
                    trace!("skipping cancelled task");
                    continue;
                }
                task();
            }
            Ok(LoopMessage::Stop) | Err(_) => break,
        }
    }
    debug!("media loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sync(media: &MediaThread) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        media
            .handle()
            .schedule(Box::new(move || {
                let _ = tx.send(());
            }))
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn test_tasks_run_in_fifo_order() {
        let media = MediaThread::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let log = log.clone();
            media
                .handle()
                .schedule(Box::new(move || log.lock().push(i)))
                .unwrap();
        }
        sync(&media);

        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_cancelled_task_does_not_run() {
        let media = MediaThread::new();
        let ran = Arc::new(AtomicBool::new(false));

        // Park the loop so the second task cannot start before the cancel.
        let (gate_tx, gate_rx) = crossbeam_channel::bounded::<()>(0);
        media
            .handle()
            .schedule(Box::new(move || {
                let _ = gate_rx.recv();
            }))
            .unwrap();

        let flag = ran.clone();
        let handle = media
            .handle()
            .schedule(Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        handle.cancel();

        gate_tx.send(()).unwrap();
        sync(&media);

        assert!(!ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_schedule_after_shutdown_fails() {
        let media = MediaThread::new();
        let handle = media.handle();
        media.shutdown();

        let result = handle.schedule(Box::new(|| {}));
        assert!(matches!(result, Err(ScheduleError::Stopped)));
    }
}
