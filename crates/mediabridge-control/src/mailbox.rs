//! Thread-safe message queues between the bridge endpoints.
//!
//! Each endpoint exclusively owns one inbound mailbox. A post appends under
//! the mailbox mutex and schedules a drain on the owner's loop iff none is
//! already pending and the owner is not blocking. The eviction and schedule
//! hooks run under the lock, so the pending state can never disagree with
//! the queue contents.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::event_loop::TaskHandle;

pub(crate) struct Mailbox<M> {
    state: Mutex<State<M>>,
}

struct State<M> {
    queue: VecDeque<M>,
    /// Handle of the scheduled drain, if one is pending.
    pending: Option<TaskHandle>,
    /// While set, posts enqueue without scheduling a drain.
    blocking: bool,
}

impl<M> Mailbox<M> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                pending: None,
                blocking: false,
            }),
        }
    }

    /// Appends a message.
    ///
    /// `evict` runs before the append and may drop queued messages.
    /// `schedule` runs iff no drain is pending and the owner is not
    /// blocking; returning `None` leaves the message queued with no drain
    /// scheduled (the owner's loop is gone).
    pub fn post(
        &self,
        msg: M,
        evict: impl FnOnce(&mut VecDeque<M>),
        schedule: impl FnOnce() -> Option<TaskHandle>,
    ) {
        let mut state = self.state.lock();
        evict(&mut state.queue);
        state.queue.push_back(msg);
        if state.pending.is_none() && !state.blocking {
            state.pending = schedule();
        }
    }

    /// Takes the whole queue and clears the pending drain.
    ///
    /// The local drain entry point: the caller then works on the snapshot
    /// without holding the lock.
    pub fn take_all(&self) -> VecDeque<M> {
        let mut state = self.state.lock();
        state.pending = None;
        std::mem::take(&mut state.queue)
    }

    /// Marks the scheduled drain as running. The remote drain entry point.
    pub fn begin_drain(&self) {
        self.state.lock().pending = None;
    }

    /// Dequeues one message.
    pub fn pop(&self) -> Option<M> {
        self.state.lock().queue.pop_front()
    }

    /// Enters the blocking state and cancels any pending drain.
    pub fn suspend(&self) {
        let mut state = self.state.lock();
        state.blocking = true;
        if let Some(handle) = state.pending.take() {
            handle.cancel();
        }
    }

    /// Leaves the blocking state; schedules a drain iff messages are queued
    /// and none is pending. No-op unless currently blocking.
    pub fn resume(&self, schedule: impl FnOnce() -> Option<TaskHandle>) {
        let mut state = self.state.lock();
        if !state.blocking {
            return;
        }
        state.blocking = false;
        if !state.queue.is_empty() && state.pending.is_none() {
            state.pending = schedule();
        }
    }

    /// Drops all queued messages.
    pub fn clear(&self) {
        self.state.lock().queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> Option<TaskHandle> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(TaskHandle::detached())
        }
    }

    #[test]
    fn test_post_schedules_at_most_one_drain() {
        let mailbox = Mailbox::new();
        let scheduled = Arc::new(AtomicUsize::new(0));

        mailbox.post(1, |_| {}, counting(&scheduled));
        mailbox.post(2, |_| {}, counting(&scheduled));
        mailbox.post(3, |_| {}, counting(&scheduled));

        assert_eq!(scheduled.load(Ordering::SeqCst), 1);
        let drained: Vec<i32> = mailbox.take_all().into_iter().collect();
        assert_eq!(drained, vec![1, 2, 3]);
    }

    #[test]
    fn test_take_all_clears_pending() {
        let mailbox = Mailbox::new();
        let scheduled = Arc::new(AtomicUsize::new(0));

        mailbox.post(1, |_| {}, counting(&scheduled));
        mailbox.take_all();
        mailbox.post(2, |_| {}, counting(&scheduled));

        assert_eq!(scheduled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_suspend_blocks_scheduling() {
        let mailbox = Mailbox::new();
        let scheduled = Arc::new(AtomicUsize::new(0));

        mailbox.suspend();
        mailbox.post(1, |_| {}, counting(&scheduled));
        mailbox.post(2, |_| {}, counting(&scheduled));

        assert_eq!(scheduled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_suspend_cancels_pending_drain() {
        let mailbox = Mailbox::new();
        let handle = TaskHandle::detached();

        let pending = handle.clone();
        mailbox.post(1, |_| {}, move || Some(pending));
        assert!(!handle.is_cancelled());

        mailbox.suspend();
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_resume_schedules_when_messages_queued() {
        let mailbox = Mailbox::new();
        let scheduled = Arc::new(AtomicUsize::new(0));

        mailbox.suspend();
        mailbox.post(1, |_| {}, counting(&scheduled));
        mailbox.resume(counting(&scheduled));

        assert_eq!(scheduled.load(Ordering::SeqCst), 1);
        assert_eq!(mailbox.pop(), Some(1));
    }

    #[test]
    fn test_resume_skips_empty_queue() {
        let mailbox: Mailbox<i32> = Mailbox::new();
        let scheduled = Arc::new(AtomicUsize::new(0));

        mailbox.suspend();
        mailbox.resume(counting(&scheduled));

        assert_eq!(scheduled.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_resume_is_noop_when_not_blocking() {
        let mailbox = Mailbox::new();
        let scheduled = Arc::new(AtomicUsize::new(0));

        mailbox.post(1, |_| {}, counting(&scheduled));
        mailbox.take_all();
        // Not blocking: a stray completion event must not schedule a drain.
        mailbox.post(2, |_| {}, counting(&scheduled));
        mailbox.take_all();
        mailbox.resume(counting(&scheduled));

        assert_eq!(scheduled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_evict_hook_runs_before_append() {
        let mailbox = Mailbox::new();

        mailbox.post(1, |_| {}, || Some(TaskHandle::detached()));
        mailbox.post(2, |_| {}, || None);
        mailbox.post(
            3,
            |queue| {
                queue.pop_front();
            },
            || None,
        );

        let drained: Vec<i32> = mailbox.take_all().into_iter().collect();
        assert_eq!(drained, vec![2, 3]);
    }
}
