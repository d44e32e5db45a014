//! Pulse Platform Layer
//!
//! The UI execution context that pulse engines mutate from. Hosts either run
//! the bundled [`EventLoop`] or implement [`Dispatcher`] over their own
//! main-thread scheduler.
//!
//! # Example
//!
//! ```
//! use pulse_platform::{Dispatcher, EventLoop};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let event_loop = EventLoop::new();
//! let proxy = event_loop.proxy();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&hits);
//! std::thread::spawn(move || {
//!     proxy
//!         .dispatch(Box::new(move || {
//!             counter.fetch_add(1, Ordering::SeqCst);
//!         }))
//!         .unwrap();
//! })
//! .join()
//! .unwrap();
//!
//! assert_eq!(event_loop.run_pending(), 1);
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

mod error;
mod event;

pub use error::{PlatformError, Result};
pub use event::{ControlFlow, Dispatcher, EventLoop, EventLoopProxy, Task};
