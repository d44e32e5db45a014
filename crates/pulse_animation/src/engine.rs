//! Pulse engine
//!
//! Owns the live pulses for one host surface and runs attach sessions.
//!
//! # Session lifecycle
//!
//! ```text
//! Idle ──attach──▶ Attaching ──▶ Running ──suspend──▶ Draining
//!  ▲                                 │                    │
//!  │                                 └──── expired ───────┴──▶ Finished
//!  └──────────── stop (from any phase, no completion) ◀───────────┘
//! ```
//!
//! While a session is active a [`TickDriver`] posts [`PulseEngine::update`]
//! onto the UI context every tick interval. Each update may spawn one pulse,
//! advances every live pulse, prunes the dead ones and asks the host for a
//! redraw. A session expires once its duration has elapsed and every pulse
//! has died; the engine then notifies the finished listener.
//!
//! All state sits behind one mutex. Host and listener callbacks always run
//! with the lock released, so a listener may re-attach from its callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use pulse_core::{Color, DrawContext, ImageId, ImageOptions, Rect};
use pulse_platform::Dispatcher;
use smallvec::SmallVec;

use crate::clock::{Clock, SystemClock};
use crate::config::PulseConfig;
use crate::driver::{Tick, TickDriver};
use crate::easing::Easing;
use crate::error::{PulseError, Result};
use crate::host::{PulseHost, PulseListener, PulseTarget};
use crate::pulse::{default_stroke_width, Pulse, PulseShape};

// ============================================================================
// Session types
// ============================================================================

/// Identifies one attach session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the engine is in its session lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session; the initial phase and the phase after `stop`
    #[default]
    Idle,
    /// Session state reset, driver starting
    Attaching,
    /// Spawning and animating
    Running,
    /// Spawning suspended, live pulses finishing
    Draining,
    /// Session expired and the listener was notified
    Finished,
}

impl SessionPhase {
    /// Whether a session is in progress
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionPhase::Attaching | SessionPhase::Running | SessionPhase::Draining
        )
    }
}

// ============================================================================
// Engine state
// ============================================================================

/// Live pulses; a session rarely has more than a handful alive at once
type PulseList = SmallVec<[Pulse; 8]>;

struct EngineState {
    config: PulseConfig,
    pulses: PulseList,
    phase: SessionPhase,
    session: Option<SessionId>,
    session_start_ms: u64,
    /// `None` until the first spawn of a session
    last_spawn_ms: Option<u64>,
    spawning_enabled: bool,
    spawned: usize,
    bounds: Option<Rect>,
    snapshot: Option<ImageId>,
    target: Option<Weak<dyn PulseTarget>>,
    host: Option<Weak<dyn PulseHost>>,
    listener: Option<Weak<dyn PulseListener>>,
    driver: Option<TickDriver>,
}

impl EngineState {
    fn new(config: PulseConfig, host: Option<Weak<dyn PulseHost>>) -> Self {
        Self {
            config,
            pulses: SmallVec::new(),
            phase: SessionPhase::Idle,
            session: None,
            session_start_ms: 0,
            last_spawn_ms: None,
            spawning_enabled: true,
            spawned: 0,
            bounds: None,
            snapshot: None,
            target: None,
            host,
            listener: None,
            driver: None,
        }
    }

    fn is_running(&self, now_ms: u64) -> bool {
        self.phase.is_active() && (self.within_duration(now_ms) || !self.pulses.is_empty())
    }

    fn within_duration(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.session_start_ms) < self.config.duration_ms
    }

    fn should_spawn(&self, now_ms: u64) -> bool {
        self.spawning_enabled
            && self.within_duration(now_ms)
            && self.last_spawn_ms.map_or(true, |last| {
                now_ms.saturating_sub(last) > self.config.spawn_interval_ms
            })
    }

    fn spawn(&mut self, bounds: Rect, now_ms: u64) {
        let config = &self.config;
        let stroke_width = config
            .stroke_width
            .unwrap_or_else(|| default_stroke_width(bounds.width()));

        let pulse = Pulse::new(bounds, config.shape, now_ms)
            .with_lifetime(config.lifetime_ms)
            .with_max_scale(config.max_scale)
            .with_color(config.color())
            .with_stroke_width(stroke_width)
            .with_alpha_easing(config.alpha_easing)
            .with_scale_easing(config.scale_easing);

        self.pulses.push(pulse);
        self.last_spawn_ms = Some(now_ms);
        self.spawned += 1;

        tracing::trace!(
            "PulseEngine: spawned pulse {} at {}ms ({} live)",
            self.spawned,
            now_ms.saturating_sub(self.session_start_ms),
            self.pulses.len()
        );
    }

    /// One animation step: spawn, advance, prune
    fn advance(&mut self, now_ms: u64) {
        if let Some(bounds) = self.bounds {
            if self.should_spawn(now_ms) {
                self.spawn(bounds, now_ms);
            }
        }

        for pulse in self.pulses.iter_mut() {
            pulse.update(now_ms);
        }

        // Back to front so removal never skips an element
        for index in (0..self.pulses.len()).rev() {
            if !self.pulses[index].is_alive(now_ms) {
                self.pulses.remove(index);
            }
        }
    }

    /// Drop everything tied to the current target
    fn clear_session(&mut self) {
        self.pulses.clear();
        self.target = None;
        self.snapshot = None;
        self.bounds = None;
        self.last_spawn_ms = None;
    }

    fn host(&self) -> Option<Arc<dyn PulseHost>> {
        self.host.as_ref().and_then(Weak::upgrade)
    }
}

struct EngineShared {
    clock: Arc<dyn Clock>,
    dispatcher: Arc<dyn Dispatcher>,
    state: Mutex<EngineState>,
}

impl EngineShared {
    /// Lock the state, recovering it if a previous holder panicked
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, now_ms: u64) {
        let host = {
            let mut state = self.lock();
            if !state.is_running(now_ms) {
                return;
            }
            state.advance(now_ms);
            state.host()
        };

        if let Some(host) = host {
            host.request_redraw();
        }
    }

    fn finish_session(&self, session: SessionId) {
        let (listener, target, host) = {
            let mut state = self.lock();
            if state.session != Some(session) || !state.phase.is_active() {
                tracing::trace!("PulseEngine: ignoring finish for stale session {}", session);
                return;
            }

            state.driver = None;
            let target = state.target.take();
            state.clear_session();
            state.phase = SessionPhase::Finished;

            tracing::debug!(
                "PulseEngine: session {} finished after {} pulses",
                session,
                state.spawned
            );

            (
                state.listener.as_ref().and_then(Weak::upgrade),
                target.and_then(|target| target.upgrade()),
                state.host(),
            )
        };

        if let Some(listener) = listener {
            listener.on_pulse_finished(target);
        }
        if let Some(host) = host {
            host.request_redraw();
        }
    }
}

impl Tick for EngineShared {
    fn is_running(&self) -> bool {
        let now = self.clock.now_ms();
        self.lock().is_running(now)
    }

    fn tick(&self) {
        self.update(self.clock.now_ms());
    }
}

impl Drop for EngineShared {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(driver) = state.driver.take() {
            driver.cancel();
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Spawns and animates pulses around an attached target
///
/// Cloning yields another handle to the same engine. The engine stops its
/// driver when the last handle is dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pulse_animation::{PulseEngine, PulseTarget, StaticTarget};
/// use pulse_core::Rect;
/// use pulse_platform::EventLoop;
///
/// let event_loop = EventLoop::new();
/// let engine = PulseEngine::new(Arc::new(event_loop.proxy()));
///
/// let target: Arc<dyn PulseTarget> = Arc::new(StaticTarget::new(Rect::new(10.0, 10.0, 48.0, 48.0)));
/// let session = engine.attach(&target).unwrap();
/// assert_eq!(engine.session(), Some(session));
///
/// engine.stop();
/// assert_eq!(engine.live_pulse_count(), 0);
/// ```
#[derive(Clone)]
pub struct PulseEngine {
    shared: Arc<EngineShared>,
}

impl PulseEngine {
    /// Engine with the default configuration and the system clock
    pub fn new(dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self::from_parts(
            dispatcher,
            Arc::new(SystemClock::new()),
            PulseConfig::default(),
            None,
        )
    }

    pub fn builder(dispatcher: Arc<dyn Dispatcher>) -> PulseEngineBuilder {
        PulseEngineBuilder {
            dispatcher,
            clock: None,
            config: PulseConfig::default(),
            host: None,
        }
    }

    fn from_parts(
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn Clock>,
        config: PulseConfig,
        host: Option<Weak<dyn PulseHost>>,
    ) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                clock,
                dispatcher,
                state: Mutex::new(EngineState::new(config, host)),
            }),
        }
    }

    // =========================================================================
    // Session control
    // =========================================================================

    /// Start a session on `target`
    ///
    /// Any session already in progress is replaced; its finished listener
    /// call is discarded. Fails without touching the current session if the
    /// target bounds have no positive, finite area.
    pub fn attach(&self, target: &Arc<dyn PulseTarget>) -> Result<SessionId> {
        let bounds = target.bounds();
        if bounds.is_empty() {
            return Err(PulseError::InvalidTarget {
                width: bounds.width(),
                height: bounds.height(),
            });
        }
        let snapshot = target.snapshot();
        let now = self.shared.clock.now_ms();

        let (session, interval) = {
            let mut state = self.shared.lock();
            if let Some(previous) = state.driver.take() {
                previous.cancel();
                tracing::debug!(
                    "PulseEngine: session {:?} superseded by re-attach",
                    state.session
                );
            }

            let session = SessionId(state.session.map_or(1, |s| s.0 + 1));
            state.clear_session();
            state.session = Some(session);
            state.session_start_ms = now;
            state.spawning_enabled = true;
            state.spawned = 0;
            state.bounds = Some(bounds);
            state.snapshot = snapshot;
            state.target = Some(Arc::downgrade(target));
            state.phase = SessionPhase::Attaching;

            (session, Duration::from_millis(state.config.tick_interval_ms))
        };

        let weak = Arc::downgrade(&self.shared);
        let driver = TickDriver::spawn(
            Weak::clone(&weak),
            Arc::clone(&self.shared.dispatcher),
            interval,
            move || {
                if let Some(shared) = weak.upgrade() {
                    shared.finish_session(session);
                }
            },
        );

        let mut state = self.shared.lock();
        if state.session != Some(session) {
            // A listener or another handle re-attached while we were unlocked
            return Ok(session);
        }
        match driver {
            Ok(driver) => {
                state.driver = Some(driver);
                if state.phase == SessionPhase::Attaching {
                    state.phase = SessionPhase::Running;
                }
                tracing::debug!(
                    "PulseEngine: attached session {} to {:?} at {}ms",
                    session,
                    bounds,
                    now
                );
                Ok(session)
            }
            Err(e) => {
                state.clear_session();
                state.phase = SessionPhase::Idle;
                Err(e)
            }
        }
    }

    /// Advance the session to `now_ms`
    ///
    /// The driver calls this every tick; hosts with their own frame clock may
    /// call it directly. No-op when no session is running.
    pub fn update(&self, now_ms: u64) {
        self.shared.update(now_ms);
    }

    /// Whether the session is still within its duration or has live pulses
    pub fn is_running(&self, now_ms: u64) -> bool {
        self.shared.lock().is_running(now_ms)
    }

    /// Stop spawning; live pulses run out and the session completes normally
    pub fn suspend_spawning(&self) {
        let mut state = self.shared.lock();
        state.spawning_enabled = false;
        if state.phase == SessionPhase::Running || state.phase == SessionPhase::Attaching {
            state.phase = SessionPhase::Draining;
        }
        tracing::debug!(
            "PulseEngine: spawning suspended, {} pulses draining",
            state.pulses.len()
        );
    }

    /// End the session now without notifying the finished listener
    pub fn stop(&self) {
        let host = {
            let mut state = self.shared.lock();
            if let Some(driver) = state.driver.take() {
                driver.cancel();
            }
            state.clear_session();
            state.phase = SessionPhase::Idle;
            tracing::debug!("PulseEngine: stopped session {:?}", state.session);
            state.host()
        };

        if let Some(host) = host {
            host.request_redraw();
        }
    }

    /// Draw every live pulse in spawn order, then the target snapshot on top
    ///
    /// The pulses are copied out first, so `ctx` may call back into the
    /// engine while drawing.
    pub fn draw(&self, ctx: &mut dyn DrawContext) {
        let (pulses, snapshot) = {
            let state = self.shared.lock();
            (state.pulses.clone(), state.snapshot.zip(state.bounds))
        };

        for pulse in &pulses {
            pulse.draw(ctx);
        }
        if let Some((image, bounds)) = snapshot {
            ctx.draw_image(image, bounds, &ImageOptions::new());
        }
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    /// Set the redraw sink (held weakly)
    pub fn set_host(&self, host: &Arc<dyn PulseHost>) {
        self.shared.lock().host = Some(Arc::downgrade(host));
    }

    /// Set the listener notified when a session expires (held weakly)
    pub fn set_finished_listener(&self, listener: &Arc<dyn PulseListener>) {
        self.shared.lock().listener = Some(Arc::downgrade(listener));
    }

    pub fn clear_finished_listener(&self) {
        self.shared.lock().listener = None;
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn config(&self) -> PulseConfig {
        self.shared.lock().config.clone()
    }

    /// Replace the whole configuration after validating it
    ///
    /// Pulses already alive keep their settings; the tick interval applies
    /// from the next attach.
    pub fn set_config(&self, config: PulseConfig) -> Result<()> {
        config.validate()?;
        self.shared.lock().config = config;
        Ok(())
    }

    /// Apply one change and keep it only if the result still validates
    fn configure(&self, apply: impl FnOnce(&mut PulseConfig)) -> Result<()> {
        let mut state = self.shared.lock();
        let mut config = state.config.clone();
        apply(&mut config);
        config.validate()?;
        state.config = config;
        Ok(())
    }

    pub fn set_duration(&self, duration_ms: u64) -> Result<()> {
        self.configure(|c| c.duration_ms = duration_ms)
    }

    pub fn set_lifetime(&self, lifetime_ms: u64) -> Result<()> {
        self.configure(|c| c.lifetime_ms = lifetime_ms)
    }

    pub fn set_spawn_interval(&self, interval_ms: u64) -> Result<()> {
        self.configure(|c| c.spawn_interval_ms = interval_ms)
    }

    pub fn set_max_scale(&self, max_scale: f32) -> Result<()> {
        self.configure(|c| c.max_scale = max_scale)
    }

    /// Stroke color; the alpha channel is replaced by the pulse opacity
    pub fn set_color(&self, color: Color) -> Result<()> {
        self.configure(|c| c.color = color.to_argb())
    }

    /// Fixed stroke width, or `None` to derive it from the target width
    pub fn set_stroke_width(&self, width: Option<f32>) -> Result<()> {
        self.configure(|c| c.stroke_width = width)
    }

    pub fn set_shape(&self, shape: PulseShape) -> Result<()> {
        self.configure(|c| c.shape = shape)
    }

    pub fn set_alpha_easing(&self, easing: Easing) -> Result<()> {
        self.configure(|c| c.alpha_easing = easing)
    }

    pub fn set_scale_easing(&self, easing: Easing) -> Result<()> {
        self.configure(|c| c.scale_easing = easing)
    }

    pub fn set_tick_interval(&self, interval_ms: u64) -> Result<()> {
        self.configure(|c| c.tick_interval_ms = interval_ms)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn phase(&self) -> SessionPhase {
        self.shared.lock().phase
    }

    /// Latest session started by `attach`
    pub fn session(&self) -> Option<SessionId> {
        self.shared.lock().session
    }

    pub fn live_pulse_count(&self) -> usize {
        self.shared.lock().pulses.len()
    }

    /// Pulses spawned so far in the current session
    pub fn spawned_count(&self) -> usize {
        self.shared.lock().spawned
    }

    /// Bounds of the attached target, if a session holds one
    pub fn target_bounds(&self) -> Option<Rect> {
        self.shared.lock().bounds
    }

    pub fn now_ms(&self) -> u64 {
        self.shared.clock.now_ms()
    }
}

impl std::fmt::Debug for PulseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("PulseEngine")
            .field("phase", &state.phase)
            .field("session", &state.session)
            .field("live_pulses", &state.pulses.len())
            .field("spawned", &state.spawned)
            .finish()
    }
}

/// Builder for [`PulseEngine`]
pub struct PulseEngineBuilder {
    dispatcher: Arc<dyn Dispatcher>,
    clock: Option<Arc<dyn Clock>>,
    config: PulseConfig,
    host: Option<Weak<dyn PulseHost>>,
}

impl PulseEngineBuilder {
    pub fn config(mut self, config: PulseConfig) -> Self {
        self.config = config;
        self
    }

    /// Time source; defaults to [`SystemClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn host(mut self, host: &Arc<dyn PulseHost>) -> Self {
        self.host = Some(Arc::downgrade(host));
        self
    }

    /// Validate the configuration and build the engine
    pub fn build(self) -> Result<PulseEngine> {
        self.config.validate()?;
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        Ok(PulseEngine::from_parts(
            self.dispatcher,
            clock,
            self.config,
            self.host,
        ))
    }
}
