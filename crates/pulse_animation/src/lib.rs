//! Pulse Animation System
//!
//! Expanding, fading outlines drawn behind a target to draw attention to it.
//!
//! # Features
//!
//! - **Pulse**: a single circle or rectangle outline with a fixed lifetime,
//!   eased opacity and eased scale about its center
//! - **PulseEngine**: spawns pulses at a bounded rate for the length of a
//!   session, advances and prunes them, and notifies a listener when the
//!   session runs out
//! - **TickDriver**: background thread pacing engine updates onto the UI
//!   context through a [`pulse_platform::Dispatcher`]
//! - **PulseConfig**: TOML-loadable timing, color, shape and easing settings
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pulse_animation::{PulseConfig, PulseEngine, PulseListener, PulseTarget, StaticTarget};
//! use pulse_core::Rect;
//! use pulse_platform::EventLoop;
//!
//! let event_loop = EventLoop::new();
//! let config = PulseConfig {
//!     duration_ms: 40,
//!     lifetime_ms: 30,
//!     spawn_interval_ms: 10,
//!     ..Default::default()
//! };
//! let engine = PulseEngine::builder(Arc::new(event_loop.proxy()))
//!     .config(config)
//!     .build()
//!     .unwrap();
//!
//! let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
//! let flag = Arc::clone(&done);
//! let listener: Arc<dyn PulseListener> = Arc::new(move |_target: Option<Arc<dyn PulseTarget>>| {
//!     flag.store(true, std::sync::atomic::Ordering::SeqCst);
//! });
//! engine.set_finished_listener(&listener);
//!
//! let target: Arc<dyn PulseTarget> = Arc::new(StaticTarget::new(Rect::new(0.0, 0.0, 64.0, 64.0)));
//! engine.attach(&target).unwrap();
//!
//! assert!(event_loop.run_until(Duration::from_secs(5), || {
//!     done.load(std::sync::atomic::Ordering::SeqCst)
//! }));
//! ```

pub mod clock;
pub mod config;
pub mod driver;
pub mod easing;
pub mod engine;
pub mod error;
pub mod host;
pub mod pulse;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::PulseConfig;
pub use driver::{Tick, TickDriver};
pub use easing::Easing;
pub use engine::{PulseEngine, PulseEngineBuilder, SessionId, SessionPhase};
pub use error::{PulseError, Result};
pub use host::{PulseHost, PulseListener, PulseTarget, StaticTarget};
pub use pulse::{default_stroke_width, Pulse, PulseShape};
