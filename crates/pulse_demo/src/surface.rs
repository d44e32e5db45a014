//! Recording surface standing in for a host view

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use pulse_animation::PulseHost;
use pulse_core::DrawCommand;

/// Redraw sink that marks itself dirty until the next render pass
#[derive(Debug, Default)]
pub struct RecordingSurface {
    dirty: AtomicBool,
    requests: AtomicU64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the dirty flag, returning whether a redraw was pending
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    pub fn redraw_requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

impl PulseHost for RecordingSurface {
    fn request_redraw(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.dirty.store(true, Ordering::Release);
    }
}

/// Aggregate statistics over rendered frames
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub frames: u64,
    /// Frames that drew nothing (the redraw after a session ends)
    pub empty_frames: u64,
    pub strokes: u64,
    pub peak_pulses: usize,
    pub snapshot_draws: u64,
    /// Lowest stroke alpha seen, 0.0 to 1.0
    pub min_alpha: Option<f32>,
}

impl FrameStats {
    /// Fold one frame's commands into the totals
    pub fn record(&mut self, commands: &[DrawCommand]) {
        self.frames += 1;
        if commands.is_empty() {
            self.empty_frames += 1;
            return;
        }

        let mut pulses = 0;
        for command in commands {
            match command {
                DrawCommand::StrokePath { color, .. } => {
                    pulses += 1;
                    self.min_alpha = Some(self.min_alpha.map_or(color.a, |a| a.min(color.a)));
                }
                DrawCommand::DrawImage { .. } => self.snapshot_draws += 1,
                DrawCommand::PushTransform(_) | DrawCommand::PopTransform => {}
            }
        }

        self.strokes += pulses as u64;
        self.peak_pulses = self.peak_pulses.max(pulses);

        tracing::trace!("frame {}: {} pulses", self.frames, pulses);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{Color, ImageId, ImageOptions, Path, Point, Rect, Stroke, Transform};

    fn stroke(alpha: f32) -> DrawCommand {
        DrawCommand::StrokePath {
            path: Path::circle(Point::new(0.0, 0.0), 4.0),
            stroke: Stroke::new(5.0),
            color: Color::WHITE.with_alpha(alpha),
        }
    }

    #[test]
    fn test_take_dirty() {
        let surface = RecordingSurface::new();
        assert!(!surface.take_dirty());

        surface.request_redraw();
        surface.request_redraw();
        assert!(surface.take_dirty());
        assert!(!surface.take_dirty());
        assert_eq!(surface.redraw_requests(), 2);
    }

    #[test]
    fn test_record_frames() {
        let mut stats = FrameStats::default();

        stats.record(&[
            DrawCommand::PushTransform(Transform::scale(2.0, 2.0)),
            stroke(0.5),
            DrawCommand::PopTransform,
            stroke(0.9),
            DrawCommand::DrawImage {
                image: ImageId(1),
                rect: Rect::new(0.0, 0.0, 8.0, 8.0),
                options: ImageOptions::new(),
            },
        ]);
        stats.record(&[stroke(0.25)]);
        stats.record(&[]);

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.empty_frames, 1);
        assert_eq!(stats.strokes, 3);
        assert_eq!(stats.peak_pulses, 2);
        assert_eq!(stats.snapshot_draws, 1);
        assert_eq!(stats.min_alpha, Some(0.25));
    }
}
