//! Collaborators supplied by the host
//!
//! The engine holds every collaborator weakly. A target, host or listener
//! that has been dropped turns the corresponding call into a no-op.

use std::sync::Arc;

use pulse_core::{ImageId, Rect};

/// The region a pulse session highlights
pub trait PulseTarget: Send + Sync {
    /// Target bounds in the drawing parent's local coordinates
    ///
    /// Use [`pulse_core::bounds_in_parent`] to derive these from window-space
    /// rects.
    fn bounds(&self) -> Rect;

    /// Snapshot of the target drawn on top of the pulses
    fn snapshot(&self) -> Option<ImageId> {
        None
    }
}

/// Redraw sink for the surface the engine draws into
pub trait PulseHost: Send + Sync {
    /// Schedule a render pass that calls [`PulseEngine::draw`](crate::PulseEngine::draw)
    fn request_redraw(&self);
}

/// Completion listener
pub trait PulseListener: Send + Sync {
    /// Called on the UI context once a session ends naturally
    ///
    /// `target` is the target passed to `attach`, if it is still alive.
    fn on_pulse_finished(&self, target: Option<Arc<dyn PulseTarget>>);
}

impl<F> PulseListener for F
where
    F: Fn(Option<Arc<dyn PulseTarget>>) + Send + Sync,
{
    fn on_pulse_finished(&self, target: Option<Arc<dyn PulseTarget>>) {
        self(target)
    }
}

/// A target with fixed bounds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticTarget {
    pub bounds: Rect,
    pub snapshot: Option<ImageId>,
}

impl StaticTarget {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, image: ImageId) -> Self {
        self.snapshot = Some(image);
        self
    }
}

impl PulseTarget for StaticTarget {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn snapshot(&self) -> Option<ImageId> {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_listener() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let listener: Arc<dyn PulseListener> =
            Arc::new(move |target: Option<Arc<dyn PulseTarget>>| {
                assert!(target.is_some());
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let target: Arc<dyn PulseTarget> = Arc::new(StaticTarget::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        listener.on_pulse_finished(Some(target));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_static_target() {
        let target = StaticTarget::new(Rect::new(1.0, 2.0, 3.0, 4.0)).with_snapshot(ImageId(7));
        assert_eq!(target.bounds(), Rect::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(PulseTarget::snapshot(&target), Some(ImageId(7)));
    }
}
