//! UI event loop and cross-thread dispatch
//!
//! Background threads never touch UI state directly. They hand closures to a
//! [`Dispatcher`], and the UI thread runs them one at a time from its
//! [`EventLoop`], which serializes them with everything else it does.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{PlatformError, Result};

/// A unit of work to run on the UI context
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Control flow returned by [`EventLoop::run`] handlers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlFlow {
    /// Keep processing tasks
    #[default]
    Continue,
    /// Return from the loop
    Exit,
}

/// Schedules work onto the UI context
///
/// Implementations must run dispatched tasks in order, one at a time, on the
/// thread that owns UI state.
pub trait Dispatcher: Send + Sync {
    /// Queue `task` to run on the UI context
    fn dispatch(&self, task: Task) -> Result<()>;
}

/// Cloneable, thread-safe handle for posting tasks to an [`EventLoop`]
#[derive(Clone)]
pub struct EventLoopProxy {
    sender: Sender<Task>,
    /// Tasks posted through any clone of this proxy
    posted: Arc<AtomicU64>,
}

impl EventLoopProxy {
    /// Total number of tasks posted so far (for debugging)
    pub fn posted_count(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }
}

impl Dispatcher for EventLoopProxy {
    fn dispatch(&self, task: Task) -> Result<()> {
        self.sender
            .send(task)
            .map_err(|_| PlatformError::LoopClosed)?;
        self.posted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// A single-threaded task queue standing in for a UI main loop
///
/// The loop is owned by one thread; [`EventLoopProxy`] handles may be sent
/// anywhere. Dropping the loop makes every proxy return
/// [`PlatformError::LoopClosed`].
pub struct EventLoop {
    receiver: Receiver<Task>,
    proxy: EventLoopProxy,
}

impl EventLoop {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            proxy: EventLoopProxy {
                sender,
                posted: Arc::new(AtomicU64::new(0)),
            },
        }
    }

    /// Get a proxy for posting tasks from other threads
    pub fn proxy(&self) -> EventLoopProxy {
        self.proxy.clone()
    }

    /// Run every task queued right now without blocking
    ///
    /// Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Run tasks as they arrive until `done` returns true or `timeout` elapses
    ///
    /// `done` is checked before waiting and after every task. Returns the last
    /// value of `done`.
    pub fn run_until<F>(&self, timeout: Duration, mut done: F) -> bool
    where
        F: FnMut() -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if done() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            match self.receiver.recv_timeout(deadline - now) {
                Ok(task) => task(),
                Err(RecvTimeoutError::Timeout) => return done(),
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::warn!("EventLoop: all senders dropped");
                    return done();
                }
            }
        }
    }

    /// Run tasks until the handler asks to exit
    ///
    /// The handler is called after each task.
    pub fn run<F>(&self, mut handler: F)
    where
        F: FnMut() -> ControlFlow,
    {
        while let Ok(task) = self.receiver.recv() {
            task();
            if handler() == ControlFlow::Exit {
                return;
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    #[test]
    fn test_control_flow_default() {
        assert_eq!(ControlFlow::default(), ControlFlow::Continue);
    }

    #[test]
    fn test_tasks_run_in_order() {
        let event_loop = EventLoop::new();
        let proxy = event_loop.proxy();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..5 {
            let order = Arc::clone(&order);
            proxy
                .dispatch(Box::new(move || order.lock().unwrap().push(i)))
                .unwrap();
        }

        assert_eq!(event_loop.run_pending(), 5);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(proxy.posted_count(), 5);
        assert_eq!(event_loop.run_pending(), 0);
    }

    #[test]
    fn test_dispatch_after_drop_fails() {
        let event_loop = EventLoop::new();
        let proxy = event_loop.proxy();
        drop(event_loop);

        let result = proxy.dispatch(Box::new(|| {}));
        assert!(matches!(result, Err(PlatformError::LoopClosed)));
    }

    #[test]
    fn test_run_until_from_background_thread() {
        let event_loop = EventLoop::new();
        let proxy = event_loop.proxy();
        let seen = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&seen);
        let worker = thread::spawn(move || {
            for _ in 0..3 {
                let counter = Arc::clone(&counter);
                proxy
                    .dispatch(Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
                thread::sleep(Duration::from_millis(2));
            }
        });

        let finished = event_loop.run_until(Duration::from_secs(5), || {
            seen.load(Ordering::SeqCst) == 3
        });
        worker.join().unwrap();

        assert!(finished);
    }

    #[test]
    fn test_run_until_times_out() {
        let event_loop = EventLoop::new();
        let finished = event_loop.run_until(Duration::from_millis(10), || false);
        assert!(!finished);
    }

    #[test]
    fn test_run_exits_on_request() {
        let event_loop = EventLoop::new();
        let proxy = event_loop.proxy();
        for _ in 0..3 {
            proxy.dispatch(Box::new(|| {})).unwrap();
        }

        let mut handled = 0;
        event_loop.run(|| {
            handled += 1;
            if handled == 2 {
                ControlFlow::Exit
            } else {
                ControlFlow::Continue
            }
        });

        assert_eq!(handled, 2);
        assert_eq!(event_loop.run_pending(), 1);
    }
}
