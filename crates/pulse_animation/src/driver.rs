//! Background tick driver
//!
//! A [`TickDriver`] owns one named thread for the length of a session. The
//! thread never touches engine state itself: every iteration it asks the
//! engine whether it is still running and, if so, posts one tick through the
//! [`Dispatcher`] so the update runs on the UI context. When the engine stops
//! running the thread posts the finished callback and exits.
//!
//! Cancellation is cooperative. [`TickDriver::cancel`] only sets a flag; the
//! thread notices it within one interval, and ticks or finish callbacks that
//! were already queued check the same flag before they run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pulse_platform::Dispatcher;

use crate::error::{PulseError, Result};

/// Work the driver paces
pub trait Tick: Send + Sync + 'static {
    /// Whether another tick should be scheduled
    ///
    /// Called from the driver thread.
    fn is_running(&self) -> bool;

    /// Advance one step; always called on the UI context
    fn tick(&self);
}

/// Handle to a running tick thread
///
/// Dropping the handle cancels the driver; the thread is never joined.
pub struct TickDriver {
    canceled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickDriver {
    /// Start ticking `target` every `interval`
    ///
    /// `on_finished` is posted to the dispatcher once `target` reports it is
    /// no longer running, and only runs if the driver has not been canceled
    /// by then. If the target is dropped or the dispatcher closes, the thread
    /// exits without calling it.
    pub fn spawn<T, F>(
        target: Weak<T>,
        dispatcher: Arc<dyn Dispatcher>,
        interval: Duration,
        on_finished: F,
    ) -> Result<Self>
    where
        T: Tick,
        F: FnOnce() + Send + 'static,
    {
        let canceled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&canceled);
        let interval = interval.max(Duration::from_millis(1));

        let handle = thread::Builder::new()
            .name("pulse-tick".to_string())
            .spawn(move || run(target, dispatcher, interval, flag, on_finished))
            .map_err(PulseError::DriverSpawn)?;

        Ok(Self {
            canceled,
            handle: Some(handle),
        })
    }

    /// Stop the driver without running its finished callback
    ///
    /// Returns immediately; the thread exits within one interval.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Whether the driver thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for TickDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickDriver")
            .field("canceled", &self.is_canceled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

fn run<T, F>(
    target: Weak<T>,
    dispatcher: Arc<dyn Dispatcher>,
    interval: Duration,
    canceled: Arc<AtomicBool>,
    on_finished: F,
) where
    T: Tick,
    F: FnOnce() + Send + 'static,
{
    let mut posted: u64 = 0;

    loop {
        if canceled.load(Ordering::Acquire) {
            tracing::trace!("TickDriver: canceled after {} ticks", posted);
            return;
        }

        // Only hold the target for the running check, never across a sleep
        let running = match target.upgrade() {
            Some(strong) => strong.is_running(),
            None => {
                tracing::trace!("TickDriver: target dropped");
                return;
            }
        };
        if !running {
            break;
        }

        let tick_target = Weak::clone(&target);
        let tick_canceled = Arc::clone(&canceled);
        let task = Box::new(move || {
            if tick_canceled.load(Ordering::Acquire) {
                return;
            }
            let Some(target) = tick_target.upgrade() else {
                return;
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| target.tick())) {
                tracing::error!("TickDriver: tick panicked: {}", panic_message(&*payload));
            }
        });

        if dispatcher.dispatch(task).is_err() {
            tracing::debug!("TickDriver: dispatcher closed, stopping");
            return;
        }
        posted += 1;

        thread::sleep(interval);
    }

    tracing::trace!("TickDriver: target finished after {} ticks", posted);

    let finish_canceled = Arc::clone(&canceled);
    let finish = Box::new(move || {
        if !finish_canceled.load(Ordering::Acquire) {
            on_finished();
        }
    });
    if let Err(e) = dispatcher.dispatch(finish) {
        tracing::warn!("TickDriver: could not post finish callback: {}", e);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_platform::EventLoop;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Runs for a fixed number of ticks
    struct Countdown {
        limit: usize,
        ticks: AtomicUsize,
        tick_threads: Mutex<Vec<thread::ThreadId>>,
        panic_on_first: bool,
    }

    impl Countdown {
        fn new(limit: usize) -> Arc<Self> {
            Arc::new(Self {
                limit,
                ticks: AtomicUsize::new(0),
                tick_threads: Mutex::new(Vec::new()),
                panic_on_first: false,
            })
        }

        fn panicking(limit: usize) -> Arc<Self> {
            Arc::new(Self {
                limit,
                ticks: AtomicUsize::new(0),
                tick_threads: Mutex::new(Vec::new()),
                panic_on_first: true,
            })
        }

        fn ticks(&self) -> usize {
            self.ticks.load(Ordering::SeqCst)
        }
    }

    impl Tick for Countdown {
        fn is_running(&self) -> bool {
            self.ticks() < self.limit
        }

        fn tick(&self) {
            self.tick_threads.lock().unwrap().push(thread::current().id());
            let previous = self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.panic_on_first && previous == 0 {
                panic!("first tick fails");
            }
        }
    }

    fn flag() -> (Arc<AtomicBool>, impl FnOnce() + Send + 'static) {
        let finished = Arc::new(AtomicBool::new(false));
        let setter = Arc::clone(&finished);
        (finished, move || setter.store(true, Ordering::SeqCst))
    }

    #[test]
    fn test_ticks_run_on_ui_thread_then_finish() {
        let event_loop = EventLoop::new();
        let target = Countdown::new(3);
        let (finished, on_finished) = flag();

        let _driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(event_loop.proxy()),
            Duration::from_millis(2),
            on_finished,
        )
        .unwrap();

        assert!(event_loop.run_until(Duration::from_secs(5), || finished.load(Ordering::SeqCst)));
        assert!(target.ticks() >= 3);

        let ui_thread = thread::current().id();
        assert!(target
            .tick_threads
            .lock()
            .unwrap()
            .iter()
            .all(|id| *id == ui_thread));
    }

    #[test]
    fn test_cancel_suppresses_finish() {
        let event_loop = EventLoop::new();
        let target = Countdown::new(usize::MAX);
        let (finished, on_finished) = flag();

        let driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(event_loop.proxy()),
            Duration::from_millis(1),
            on_finished,
        )
        .unwrap();

        assert!(event_loop.run_until(Duration::from_secs(5), || target.ticks() >= 2));
        driver.cancel();
        assert!(driver.is_canceled());

        // Anything already queued is dropped on the floor
        let ticks = target.ticks();
        event_loop.run_until(Duration::from_millis(50), || false);
        assert_eq!(target.ticks(), ticks);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_cancels() {
        let event_loop = EventLoop::new();
        let target = Countdown::new(2);
        let (finished, on_finished) = flag();

        let driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(event_loop.proxy()),
            Duration::from_millis(1),
            on_finished,
        )
        .unwrap();
        drop(driver);

        event_loop.run_until(Duration::from_millis(50), || false);
        assert_eq!(target.ticks(), 0);
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_dropped_target_exits_silently() {
        let event_loop = EventLoop::new();
        let target = Countdown::new(usize::MAX);
        let (finished, on_finished) = flag();

        let driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(event_loop.proxy()),
            Duration::from_millis(1),
            on_finished,
        )
        .unwrap();
        drop(target);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !driver.is_finished() && Instant::now() < deadline {
            event_loop.run_pending();
            thread::sleep(Duration::from_millis(1));
        }
        event_loop.run_pending();

        assert!(driver.is_finished());
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_closed_dispatcher_exits() {
        let event_loop = EventLoop::new();
        let proxy = event_loop.proxy();
        drop(event_loop);

        let target = Countdown::new(usize::MAX);
        let (finished, on_finished) = flag();
        let driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(proxy),
            Duration::from_millis(1),
            on_finished,
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !driver.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(driver.is_finished());
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_tick_panic_is_contained() {
        let event_loop = EventLoop::new();
        let target = Countdown::panicking(3);
        let (finished, on_finished) = flag();

        let _driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(event_loop.proxy()),
            Duration::from_millis(1),
            on_finished,
        )
        .unwrap();

        assert!(event_loop.run_until(Duration::from_secs(5), || finished.load(Ordering::SeqCst)));
        assert!(target.ticks() >= 3);
    }

    #[test]
    fn test_not_running_finishes_immediately() {
        let event_loop = EventLoop::new();
        let target = Countdown::new(0);
        let (finished, on_finished) = flag();

        let _driver = TickDriver::spawn(
            Arc::downgrade(&target),
            Arc::new(event_loop.proxy()),
            Duration::from_millis(1),
            on_finished,
        )
        .unwrap();

        assert!(event_loop.run_until(Duration::from_secs(5), || finished.load(Ordering::SeqCst)));
        assert_eq!(target.ticks(), 0);
    }
}
